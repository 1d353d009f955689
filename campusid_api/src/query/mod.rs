mod common;
pub use self::common::{page_from_link, Query, SortDirection};

mod student;
pub use self::student::{end_of_day, start_of_day, StudentQuery, StudentSortBy};
