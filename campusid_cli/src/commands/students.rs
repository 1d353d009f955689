use anyhow::{bail, Result};
use campusid_lib::listing::{page_summary, ListingController, StudentFilter};
use campusid_lib::types::IdType;
use campusid_lib::validation;
use campusid_lib::{CachedClient, CampusDirectory, Settings, SortDirection, StudentSortBy};
use clap::Args;

use crate::output::{print_students, OutputFormat};

/// Filters shared by `students` and `export`.
#[derive(Args)]
pub struct FilterArgs {
    /// Campus whose students are listed (e.g. Main)
    #[arg(long)]
    pub campus: Option<String>,

    /// Search by name or ID number
    #[arg(long)]
    pub search: Option<String>,

    /// Filter by college code or name (comma-separated, fuzzy names allowed)
    #[arg(long, value_delimiter = ',')]
    pub college: Vec<String>,

    /// Filter by year level (comma-separated, e.g. 1,2)
    #[arg(long, value_delimiter = ',')]
    pub year_level: Vec<u8>,

    /// Filter by ID type: new, replacement
    #[arg(long, value_delimiter = ',')]
    pub id_type: Vec<String>,

    /// Only exported (true) or not yet exported (false) records
    #[arg(long)]
    pub exported: Option<bool>,

    /// Only completed (true) or incomplete (false) records
    #[arg(long)]
    pub completed: Option<bool>,

    /// Updated on or after this date (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<String>,

    /// Updated on or before this date (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<String>,

    /// Sort field: updated-at, created-at, name, id-number, college, year-level
    #[arg(long)]
    pub sort_by: Option<String>,

    /// Sort ascending instead of descending
    #[arg(long)]
    pub asc: bool,
}

impl FilterArgs {
    pub fn to_filter(&self, directory: &CampusDirectory) -> Result<StudentFilter> {
        let mut filter = StudentFilter::default();

        if let Some(ref campus) = self.campus {
            if directory.campus(campus.trim()).is_none() {
                bail!("unknown campus '{}'", campus);
            }
            filter.campus = Some(campus.trim().to_string());
        }

        if let Some(ref search) = self.search {
            filter.search = Some(validation::validate_search(search)?);
        }

        for college in &self.college {
            let resolved = validation::resolve_college(college, directory)?;
            if !filter.colleges.contains(&resolved.code) {
                filter.colleges.push(resolved.code.clone());
            }
        }

        for level in &self.year_level {
            filter.year_levels.push(validation::validate_year_level(*level)?);
        }

        for id_type in &self.id_type {
            match id_type.parse::<IdType>() {
                Ok(t) => filter.id_types.push(t),
                Err(()) => bail!("unknown ID type '{}'. Valid values: new, replacement", id_type),
            }
        }

        filter.exported = self.exported;
        filter.completed = self.completed;

        if let Some(ref from) = self.from {
            filter.from = Some(validation::validate_date(from)?);
        }
        if let Some(ref to) = self.to {
            filter.to = Some(validation::validate_date(to)?);
        }
        validation::validate_date_range(filter.from, filter.to)?;

        if let Some(ref sort_by) = self.sort_by {
            match sort_by.parse::<StudentSortBy>() {
                Ok(s) => filter.sort_by = Some(s),
                Err(()) => bail!(
                    "unknown sort field '{}'. Valid values: updated-at, created-at, name, id-number, college, year-level",
                    sort_by
                ),
            }
        }
        if self.asc {
            filter.sort_direction = SortDirection::Asc;
        }

        Ok(filter)
    }
}

#[derive(Args)]
pub struct StudentsArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Page number
    #[arg(long, default_value = "1")]
    pub page: u32,

    /// Results per page (defaults to the configured page size)
    #[arg(long)]
    pub per_page: Option<u32>,
}

pub async fn run(
    args: &StudentsArgs,
    client: &CachedClient,
    settings: &Settings,
    format: &OutputFormat,
) -> Result<()> {
    let directory = CampusDirectory::embedded()?;
    let mut filter = args.filter.to_filter(&directory)?;
    filter.page = args.page.max(1);
    filter.per_page = validation::validate_per_page(args.per_page.unwrap_or(settings.default_per_page))?;

    let controller = ListingController::new(client, filter);
    controller.refresh().await?;
    let Some(resp) = controller.results() else {
        bail!("no results were loaded");
    };

    eprintln!(
        "Page {}/{} - {}",
        resp.current_page.unwrap_or(i64::from(args.page)),
        resp.last_page.unwrap_or(1),
        page_summary(&resp)
    );

    print_students(&resp.data, format)
}
