//! Admin listing: filter state, query building and sequenced fetches.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use campusid_api::types::{IdType, PageLink, Paginated, Student};
use campusid_api::{page_from_link, Query, SortDirection, StudentQuery, StudentSortBy};
use chrono::NaiveDate;

use crate::error::CampusIdError;

pub const DEFAULT_PER_PAGE: u32 = 10;

/// Filter state of one listing view.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentFilter {
    pub campus: Option<String>,
    pub search: Option<String>,
    pub colleges: Vec<String>,
    pub year_levels: Vec<u8>,
    pub id_types: Vec<IdType>,
    pub exported: Option<bool>,
    pub completed: Option<bool>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub sort_by: Option<StudentSortBy>,
    pub sort_direction: SortDirection,
    pub page: u32,
    pub per_page: u32,
}

impl Default for StudentFilter {
    fn default() -> Self {
        Self {
            campus: None,
            search: None,
            colleges: Vec::new(),
            year_levels: Vec::new(),
            id_types: Vec::new(),
            exported: None,
            completed: None,
            from: None,
            to: None,
            sort_by: None,
            sort_direction: SortDirection::Desc,
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

/// A single edit of the filter.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterChange {
    Campus(Option<String>),
    Search(Option<String>),
    Colleges(Vec<String>),
    YearLevels(Vec<u8>),
    IdTypes(Vec<IdType>),
    Exported(Option<bool>),
    Completed(Option<bool>),
    From(Option<NaiveDate>),
    To(Option<NaiveDate>),
    SortBy(Option<StudentSortBy>),
    SortDirection(SortDirection),
    PerPage(u32),
    Page(u32),
}

impl StudentFilter {
    pub fn for_campus(campus: &str) -> Self {
        Self {
            campus: Some(campus.to_string()),
            ..Self::default()
        }
    }

    /// Applies one change. Anything but a page change goes back to page 1.
    pub fn apply(&mut self, change: FilterChange) {
        if !matches!(change, FilterChange::Page(_)) {
            self.page = 1;
        }
        match change {
            FilterChange::Campus(campus) => self.campus = non_blank(campus),
            FilterChange::Search(search) => self.search = non_blank(search),
            FilterChange::Colleges(colleges) => self.colleges = colleges,
            FilterChange::YearLevels(levels) => self.year_levels = levels,
            FilterChange::IdTypes(types) => self.id_types = types,
            FilterChange::Exported(exported) => self.exported = exported,
            FilterChange::Completed(completed) => self.completed = completed,
            FilterChange::From(from) => self.from = from,
            FilterChange::To(to) => self.to = to,
            FilterChange::SortBy(sort_by) => self.sort_by = sort_by,
            FilterChange::SortDirection(direction) => self.sort_direction = direction,
            FilterChange::PerPage(per_page) => self.per_page = per_page.max(1),
            FilterChange::Page(page) => self.page = page.max(1),
        }
    }

    pub fn to_query(&self) -> StudentQuery {
        let mut query = StudentQuery::default()
            .with_page(self.page)
            .with_per_page(self.per_page)
            .with_sort_direction(self.sort_direction)
            .with_id_types(&self.id_types)
            .with_colleges(&self.colleges)
            .with_year_levels(&self.year_levels);
        if let Some(campus) = &self.campus {
            query = query.with_campus(campus);
        }
        if let Some(search) = &self.search {
            query = query.with_search(search);
        }
        if let Some(exported) = self.exported {
            query = query.with_exported(exported);
        }
        if let Some(completed) = self.completed {
            query = query.with_completed(completed);
        }
        if let Some(from) = self.from {
            query = query.with_from(from);
        }
        if let Some(to) = self.to {
            query = query.with_to(to);
        }
        if let Some(sort_by) = self.sort_by {
            query = query.with_sort_by(sort_by);
        }
        query
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Identifies one listing request; larger tokens are newer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RequestToken(u64);

#[derive(Debug, Default)]
pub struct RequestSequencer {
    latest: AtomicU64,
}

impl RequestSequencer {
    pub fn issue(&self) -> RequestToken {
        RequestToken(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, token: RequestToken) -> bool {
        self.latest.load(Ordering::SeqCst) == token.0
    }
}

/// Where listing pages come from.
#[async_trait]
pub trait StudentSource: Send + Sync {
    async fn fetch_students(
        &self,
        query: &StudentQuery,
    ) -> Result<Paginated<Student>, CampusIdError>;
}

#[async_trait]
impl StudentSource for campusid_api::Client {
    async fn fetch_students(
        &self,
        query: &StudentQuery,
    ) -> Result<Paginated<Student>, CampusIdError> {
        Ok(self.get_students(query).await?)
    }
}

#[async_trait]
impl StudentSource for crate::client::CachedClient {
    async fn fetch_students(
        &self,
        query: &StudentQuery,
    ) -> Result<Paginated<Student>, CampusIdError> {
        self.get_students(query).await
    }
}

#[async_trait]
impl<T: StudentSource + ?Sized> StudentSource for std::sync::Arc<T> {
    async fn fetch_students(
        &self,
        query: &StudentQuery,
    ) -> Result<Paginated<Student>, CampusIdError> {
        (**self).fetch_students(query).await
    }
}

#[async_trait]
impl<'a, T: StudentSource + ?Sized> StudentSource for &'a T {
    async fn fetch_students(
        &self,
        query: &StudentQuery,
    ) -> Result<Paginated<Student>, CampusIdError> {
        (**self).fetch_students(query).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The response was the latest one and is now the current result.
    Applied,
    /// A newer request was issued while this one was in flight.
    Stale,
    /// Nothing was fetched (e.g. a disabled pagination link).
    Ignored,
}

struct ListingState {
    filter: StudentFilter,
    results: Option<Paginated<Student>>,
}

/// Owns the filter state of a listing view and keeps the displayed page in
/// sync with it.
pub struct ListingController<S> {
    source: S,
    sequencer: RequestSequencer,
    state: Mutex<ListingState>,
}

impl<S: StudentSource> ListingController<S> {
    pub fn new(source: S, filter: StudentFilter) -> Self {
        Self {
            source,
            sequencer: RequestSequencer::default(),
            state: Mutex::new(ListingState {
                filter,
                results: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ListingState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn filter(&self) -> StudentFilter {
        self.lock().filter.clone()
    }

    pub fn results(&self) -> Option<Paginated<Student>> {
        self.lock().results.clone()
    }

    /// Fetches the page for the current filter.
    pub async fn refresh(&self) -> Result<Outcome, CampusIdError> {
        let (token, query) = {
            let state = self.lock();
            (self.sequencer.issue(), state.filter.to_query())
        };
        self.fetch(token, query).await
    }

    /// Applies one filter change and fetches once.
    pub async fn apply(&self, change: FilterChange) -> Result<Outcome, CampusIdError> {
        // The token is issued under the same guard as the change, so the
        // newest token always carries every change made before it.
        let (token, query) = {
            let mut state = self.lock();
            state.filter.apply(change);
            (self.sequencer.issue(), state.filter.to_query())
        };
        self.fetch(token, query).await
    }

    /// Navigates to the page a pagination link points to.
    pub async fn follow_link(&self, link: &PageLink) -> Result<Outcome, CampusIdError> {
        let Some(page) = link.url.as_deref().and_then(page_from_link) else {
            return Ok(Outcome::Ignored);
        };
        self.apply(FilterChange::Page(page)).await
    }

    async fn fetch(
        &self,
        token: RequestToken,
        query: StudentQuery,
    ) -> Result<Outcome, CampusIdError> {
        let result = self.source.fetch_students(&query).await;

        let mut state = self.lock();
        if !self.sequencer.is_current(token) {
            tracing::debug!("Discarding stale listing response {:?}", token);
            return Ok(Outcome::Stale);
        }

        match result {
            Ok(page) => {
                state.results = Some(page);
                Ok(Outcome::Applied)
            }
            Err(e) => {
                drop(state);
                tracing::error!("Failed to load students: {}", e);
                Err(e)
            }
        }
    }
}

/// "Showing 1 to 10 of 57 results", or "No results".
pub fn page_summary<T>(page: &Paginated<T>) -> String {
    match (page.from, page.to) {
        (Some(from), Some(to)) if page.total > 0 => {
            format!("Showing {} to {} of {} results", from, to, page.total)
        }
        _ => "No results".to_string(),
    }
}
