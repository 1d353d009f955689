//! Library layer for the campus ID client: lookup directories, cascading
//! selection, the listing controller, the registration wizard, ID photo and
//! signature preparation, and a cached API client.
//!
//! Wraps the `campusid_api` crate with an in-memory TTL cache for static
//! assets, local validation, and user-facing notifications.

pub mod cache;
pub mod cascade;
pub mod client;
pub mod config;
pub mod directory;
pub mod error;
pub mod imaging;
pub mod listing;
pub mod notify;
pub mod validation;
pub mod wizard;

pub use campusid_api;
pub use campusid_api::types;
pub use campusid_api::{Query, SortDirection, StudentQuery, StudentSortBy};

pub use cascade::{AcademicSelection, AddressSelection, SelectOption};
pub use client::CachedClient;
pub use config::Settings;
pub use directory::{CampusDirectory, LocationDirectory};
pub use error::CampusIdError;
pub use imaging::{ImagingError, PhotoPipeline, PhotoSlot, PreparedImage, SignaturePad};
pub use listing::{FilterChange, ListingController, Outcome, StudentFilter, StudentSource};
pub use notify::{Level, Notification};
pub use wizard::{RegistrationBackend, RegistrationForm, StepOutcome, Wizard, WizardStep};
