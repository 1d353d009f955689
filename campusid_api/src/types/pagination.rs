use serde::{Deserialize, Serialize};

/// One entry of the `links` array of a paginated response.
///
/// `url` is null for disabled links (e.g. "Previous" on the first page).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PageLink {
    pub url: Option<String>,
    pub label: String,
    pub active: bool,
}

/// Paginated envelope returned by the listing endpoint.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub links: Vec<PageLink>,
    pub from: Option<i64>,
    pub to: Option<i64>,
    pub total: i64,
    #[serde(default)]
    pub current_page: Option<i64>,
    #[serde(default)]
    pub last_page: Option<i64>,
    #[serde(default)]
    pub per_page: Option<i64>,
}

impl<T> Paginated<T> {
    /// The link flagged as the current page, if any.
    pub fn active_link(&self) -> Option<&PageLink> {
        self.links.iter().find(|l| l.active)
    }
}
