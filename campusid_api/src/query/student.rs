use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime, SecondsFormat};
use url::Url;

use crate::types::IdType;

use super::common::{Query, QueryCommon};

/// Filters for the student listing and export endpoints.
#[derive(Default, Clone, Debug, PartialEq)]
pub struct StudentQuery {
    pub common: QueryCommon,
    pub campus: Option<String>,
    pub search: Option<String>,
    pub id_types: Vec<IdType>,
    pub colleges: Vec<String>,
    pub year_levels: Vec<u8>,
    pub is_exported: Option<bool>,
    pub is_completed: Option<bool>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub sort_by: Option<StudentSortBy>,
}

impl Query for StudentQuery {
    fn get_common(&mut self) -> &mut QueryCommon {
        &mut self.common
    }
    fn add_to_url(&self, url: &Url) -> Url {
        let mut url = self.common.add_to_url(url);
        if let Some(search) = &self.search {
            url.query_pairs_mut().append_pair("search", search.as_str());
        }
        // Selecting both types is the same as not filtering by type.
        if let [id_type] = self.id_types.as_slice() {
            url.query_pairs_mut()
                .append_pair("type", id_type.to_string().as_str());
        }
        for college in self.colleges.iter() {
            url.query_pairs_mut()
                .append_pair("college[]", college.as_str());
        }
        for year_level in self.year_levels.iter() {
            url.query_pairs_mut()
                .append_pair("year_level[]", &year_level.to_string());
        }
        if let Some(exported) = self.is_exported {
            url.query_pairs_mut()
                .append_pair("is_exported", &exported.to_string());
        }
        if let Some(completed) = self.is_completed {
            url.query_pairs_mut()
                .append_pair("is_completed", &completed.to_string());
        }
        if let Some(from) = self.from {
            url.query_pairs_mut()
                .append_pair("from", start_of_day(from).as_str());
        }
        if let Some(to) = self.to {
            url.query_pairs_mut()
                .append_pair("to", end_of_day(to).as_str());
        }
        if let Some(sort_by) = self.sort_by {
            url.query_pairs_mut()
                .append_pair("sort", sort_by.to_string().as_str())
                .append_pair("order", self.common.sort_direction.to_string().as_str());
        }
        if let Some(campus) = &self.campus {
            url.query_pairs_mut().append_pair("campus", campus.as_str());
        }

        url
    }
}

impl StudentQuery {
    pub fn with_campus(mut self, campus: &str) -> Self {
        self.campus = Some(campus.to_string());
        self
    }

    pub fn with_search(mut self, search: &str) -> Self {
        self.search = Some(search.to_string());
        self
    }

    pub fn with_id_type(mut self, id_type: IdType) -> Self {
        if !self.id_types.contains(&id_type) {
            self.id_types.push(id_type);
        }
        self
    }
    pub fn with_id_types(mut self, id_types: &[IdType]) -> Self {
        for id_type in id_types {
            self = self.with_id_type(*id_type);
        }
        self
    }

    pub fn with_college(mut self, college: &str) -> Self {
        self.colleges.push(college.to_string());
        self
    }
    pub fn with_colleges(mut self, colleges: &[String]) -> Self {
        self.colleges.extend_from_slice(colleges);
        self
    }

    pub fn with_year_level(mut self, year_level: u8) -> Self {
        self.year_levels.push(year_level);
        self
    }
    pub fn with_year_levels(mut self, year_levels: &[u8]) -> Self {
        self.year_levels.extend_from_slice(year_levels);
        self
    }

    pub fn with_exported(mut self, exported: bool) -> Self {
        self.is_exported = Some(exported);
        self
    }

    pub fn with_completed(mut self, completed: bool) -> Self {
        self.is_completed = Some(completed);
        self
    }

    pub fn with_from(mut self, from: NaiveDate) -> Self {
        self.from = Some(from);
        self
    }

    pub fn with_to(mut self, to: NaiveDate) -> Self {
        self.to = Some(to);
        self
    }

    pub fn with_sort_by(mut self, sort_by: StudentSortBy) -> Self {
        self.sort_by = Some(sort_by);
        self
    }
}

/// `YYYY-MM-DDT00:00:00.000Z` for the first instant of `date`.
pub fn start_of_day(date: NaiveDate) -> String {
    date.and_time(NaiveTime::MIN)
        .and_utc()
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// `YYYY-MM-DDT23:59:59.999Z` for the last millisecond of `date`.
pub fn end_of_day(date: NaiveDate) -> String {
    let last = NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN);
    date.and_time(last)
        .and_utc()
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Sortable columns of the student table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StudentSortBy {
    UpdatedAt,
    CreatedAt,
    LastName,
    IdNumber,
    College,
    YearLevel,
}

impl std::fmt::Display for StudentSortBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                StudentSortBy::UpdatedAt => "updated_at",
                StudentSortBy::CreatedAt => "created_at",
                StudentSortBy::LastName => "last_name",
                StudentSortBy::IdNumber => "id_number",
                StudentSortBy::College => "college",
                StudentSortBy::YearLevel => "year_level",
            }
        )?;
        Ok(())
    }
}

impl FromStr for StudentSortBy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.replace('-', "_").as_str() {
            "updated_at" => Ok(StudentSortBy::UpdatedAt),
            "created_at" => Ok(StudentSortBy::CreatedAt),
            "last_name" | "name" => Ok(StudentSortBy::LastName),
            "id_number" => Ok(StudentSortBy::IdNumber),
            "college" => Ok(StudentSortBy::College),
            "year_level" => Ok(StudentSortBy::YearLevel),
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use url::Url;

    use crate::{
        query::{common::SortDirection, student::StudentSortBy, Query, StudentQuery},
        types::IdType,
    };

    #[test]
    fn test_student_query() {
        let url = Url::parse("https://example.com/api/student/filterPaginate").unwrap();

        insta::assert_snapshot!(
            StudentQuery::default().add_to_url(&url).to_string(),
            @"https://example.com/api/student/filterPaginate?page=1"
        );

        insta::assert_snapshot!(
            StudentQuery::default()
                .with_search("DELA CRUZ")
                .with_college("CCS")
                .with_per_page(25)
                .with_sort_by(StudentSortBy::UpdatedAt)
                .with_sort_direction(SortDirection::Desc)
                .add_to_url(&url)
                .to_string(),
            @"https://example.com/api/student/filterPaginate?page=1&perPage=25&search=DELA+CRUZ&college%5B%5D=CCS&sort=updated_at&order=desc"
        );

        insta::assert_snapshot!(
            StudentQuery::default()
                .with_id_type(IdType::Replacement)
                .with_year_levels(&[1, 3])
                .with_exported(false)
                .with_completed(true)
                .with_campus("Main")
                .with_page(2)
                .add_to_url(&url)
                .to_string(),
            @"https://example.com/api/student/filterPaginate?page=2&type=replacement&year_level%5B%5D=1&year_level%5B%5D=3&is_exported=false&is_completed=true&campus=Main"
        );
    }

    #[test]
    fn date_range_is_normalized_to_day_bounds() {
        let url = Url::parse("https://example.com/").unwrap();
        let url = StudentQuery::default()
            .with_from(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap())
            .with_to(NaiveDate::from_ymd_opt(2024, 6, 30).unwrap())
            .add_to_url(&url);
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert!(pairs.contains(&("from".to_string(), "2024-06-01T00:00:00.000Z".to_string())));
        assert!(pairs.contains(&("to".to_string(), "2024-06-30T23:59:59.999Z".to_string())));
    }

    #[test]
    fn both_id_types_means_no_type_filter() {
        let url = Url::parse("https://example.com/").unwrap();
        let url = StudentQuery::default()
            .with_id_types(&[IdType::New, IdType::Replacement])
            .add_to_url(&url);
        assert!(!url.query().unwrap().contains("type="));
    }
}
