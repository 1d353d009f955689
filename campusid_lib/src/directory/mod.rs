//! Read-only lookup tables behind the cascading selectors: the campus
//! directory (campus → college → program → majors) and the location
//! directory (province → city/municipality → barangay).

mod campus;
mod location;

pub use campus::{Campus, CampusDirectory, College, Program};
pub use location::LocationDirectory;
