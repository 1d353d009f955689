mod client;
mod csrf;
mod errors;
mod multipart;
mod query;
pub mod types;
pub use self::client::Client;
pub use self::csrf::extract_csrf_token;
pub use self::errors::Error;
pub use self::query::{
    end_of_day, page_from_link, start_of_day, Query, SortDirection, StudentQuery, StudentSortBy,
};
