//! Caching wrapper around the API client.

use std::sync::Arc;
use std::time::Duration;

use campusid_api::types::{NamedImage, Paginated, Student, StudentDetails, StudentId};
use campusid_api::{Client, StudentQuery};

use crate::cache::MemoryCache;
use crate::config::Settings;
use crate::directory::LocationDirectory;
use crate::error::CampusIdError;

const TREE_KEY: &str = "locations:tree";
const TABLES_KEY: &str = "locations:tables";

/// API client wrapper that keeps the static location assets in memory.
///
/// The location tree is several megabytes and never changes during a
/// session, so it is fetched once per cache TTL. Listing and write calls
/// always go to the network.
pub struct CachedClient {
    inner: Client,
    locations: MemoryCache<LocationDirectory>,
}

impl CachedClient {
    /// Creates a client from settings, attaching the configured CSRF token.
    pub fn new(settings: &Settings) -> Result<Self, CampusIdError> {
        let inner = Client::with_timeout(&settings.base_url, settings.request_timeout())?;
        if let Some(token) = &settings.csrf_token {
            inner.set_csrf_token(token);
        }
        Ok(Self {
            inner,
            locations: MemoryCache::new(settings.cache_ttl()),
        })
    }

    /// Creates a cached client with a custom base URL. Used for testing.
    pub fn with_base_url(base_url: &str, ttl: Duration) -> Result<Self, CampusIdError> {
        Ok(Self {
            inner: Client::with_base_url(base_url)?,
            locations: MemoryCache::new(ttl),
        })
    }

    pub fn inner(&self) -> &Client {
        &self.inner
    }

    /// Makes sure a CSRF token is attached, loading the page shell if needed.
    pub async fn ensure_csrf_token(&self) -> Result<String, CampusIdError> {
        if let Some(token) = self.inner.csrf_token() {
            return Ok(token);
        }
        tracing::info!("Fetching CSRF token");
        Ok(self.inner.refresh_csrf_token().await?)
    }

    /// The location directory built from `/ph-location.json`.
    pub async fn location_directory(&self) -> Result<Arc<LocationDirectory>, CampusIdError> {
        if let Some(cached) = self.locations.get(TREE_KEY) {
            return Ok(cached);
        }
        let tree = self.inner.get_location_tree().await?;
        let directory = LocationDirectory::from_tree(&tree);
        if directory.is_empty() {
            tracing::warn!("Location tree is empty");
        }
        Ok(self.locations.set(TREE_KEY.to_string(), directory))
    }

    /// The location directory assembled from the three flat tables.
    pub async fn location_directory_from_tables(
        &self,
    ) -> Result<Arc<LocationDirectory>, CampusIdError> {
        if let Some(cached) = self.locations.get(TABLES_KEY) {
            return Ok(cached);
        }
        let (provinces, municipalities, barangays) = tokio::try_join!(
            self.inner.get_province_table(),
            self.inner.get_municipality_table(),
            self.inner.get_barangay_table(),
        )?;
        let directory = LocationDirectory::from_tables(&provinces, &municipalities, &barangays);
        Ok(self.locations.set(TABLES_KEY.to_string(), directory))
    }

    /// Fetches one page of the listing. Never cached.
    pub async fn get_students(
        &self,
        query: &StudentQuery,
    ) -> Result<Paginated<Student>, CampusIdError> {
        Ok(self.inner.get_students(query).await?)
    }

    /// Fetches the flat export list. Never cached.
    pub async fn export_students(&self, query: &StudentQuery) -> Result<Vec<Student>, CampusIdError> {
        Ok(self.inner.export_students(query).await?)
    }

    pub async fn update_student(
        &self,
        id: StudentId,
        details: &StudentDetails,
    ) -> Result<(), CampusIdError> {
        Ok(self.inner.update_student(id, details).await?)
    }

    pub async fn update_incomplete_student(
        &self,
        id: StudentId,
        details: &StudentDetails,
    ) -> Result<(), CampusIdError> {
        Ok(self.inner.update_incomplete_student(id, details).await?)
    }

    pub async fn update_student_picture(
        &self,
        id: StudentId,
        picture: &NamedImage,
    ) -> Result<(), CampusIdError> {
        Ok(self.inner.update_student_picture(id, picture).await?)
    }

    /// Removes all entries from the cache.
    pub fn clear_cache(&self) {
        self.locations.clear();
    }
}
