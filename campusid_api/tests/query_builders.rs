use campusid_api::types::IdType;
use campusid_api::{page_from_link, Query, SortDirection, StudentQuery, StudentSortBy};
use chrono::NaiveDate;
use url::Url;

fn base_url() -> Url {
    Url::parse("https://example.com/api/student/filterPaginate").unwrap()
}

fn pairs(url: &Url) -> Vec<(String, String)> {
    url.query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

#[test]
fn student_query_defaults() {
    let url = StudentQuery::default().add_to_url(&base_url());
    assert_eq!(pairs(&url), vec![("page".to_string(), "1".to_string())]);
}

#[test]
fn dashboard_filters_are_sent_verbatim() {
    let url = StudentQuery::default()
        .with_search("DELA CRUZ")
        .with_college("CCS")
        .with_per_page(25)
        .with_sort_by(StudentSortBy::UpdatedAt)
        .with_sort_direction(SortDirection::Desc)
        .add_to_url(&base_url());
    let pairs = pairs(&url);
    assert!(pairs.contains(&("search".to_string(), "DELA CRUZ".to_string())));
    assert!(pairs.contains(&("college[]".to_string(), "CCS".to_string())));
    assert!(pairs.contains(&("perPage".to_string(), "25".to_string())));
    assert!(pairs.contains(&("sort".to_string(), "updated_at".to_string())));
    assert!(pairs.contains(&("order".to_string(), "desc".to_string())));
    for unset in ["from", "to", "is_exported", "is_completed", "type", "year_level[]", "campus"] {
        assert!(!pairs.iter().any(|(k, _)| k == unset), "{} should be omitted", unset);
    }
}

#[test]
fn multi_valued_filters_repeat() {
    let url = StudentQuery::default()
        .with_colleges(&["CCS".to_string(), "CTE".to_string()])
        .with_year_levels(&[1, 2])
        .add_to_url(&base_url());
    let pairs = pairs(&url);
    let colleges: Vec<&str> = pairs
        .iter()
        .filter(|(k, _)| k == "college[]")
        .map(|(_, v)| v.as_str())
        .collect();
    assert_eq!(colleges, vec!["CCS", "CTE"]);
    assert_eq!(pairs.iter().filter(|(k, _)| k == "year_level[]").count(), 2);
}

#[test]
fn flags_and_single_type() {
    let url = StudentQuery::default()
        .with_id_type(IdType::New)
        .with_exported(true)
        .with_completed(false)
        .add_to_url(&base_url());
    let pairs = pairs(&url);
    assert!(pairs.contains(&("type".to_string(), "new".to_string())));
    assert!(pairs.contains(&("is_exported".to_string(), "true".to_string())));
    assert!(pairs.contains(&("is_completed".to_string(), "false".to_string())));
}

#[test]
fn date_range_bounds() {
    let url = StudentQuery::default()
        .with_from(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap())
        .add_to_url(&base_url());
    let pairs = pairs(&url);
    assert!(pairs.contains(&("from".to_string(), "2024-01-15T00:00:00.000Z".to_string())));
    assert!(!pairs.iter().any(|(k, _)| k == "to"));
}

#[test]
fn sort_parsing() {
    assert_eq!("updated_at".parse::<StudentSortBy>(), Ok(StudentSortBy::UpdatedAt));
    assert_eq!("last-name".parse::<StudentSortBy>(), Ok(StudentSortBy::LastName));
    assert!("volume".parse::<StudentSortBy>().is_err());
    assert_eq!("ASC".parse::<SortDirection>(), Ok(SortDirection::Asc));
}

#[test]
fn following_a_link_only_changes_page() {
    let query = StudentQuery::default()
        .with_search("REYES")
        .with_per_page(25);
    let page = page_from_link("https://ids.example.edu/api/student/filterPaginate?page=3").unwrap();
    let next = query.clone().with_page(page);

    let before = pairs(&query.add_to_url(&base_url()));
    let after = pairs(&next.add_to_url(&base_url()));
    let changed: Vec<_> = after.iter().filter(|p| !before.contains(p)).collect();
    assert_eq!(changed, vec![&("page".to_string(), "3".to_string())]);
    assert_eq!(before.len(), after.len());
}
