//! Runtime settings: an optional TOML file, overridden by `CAMPUSID_*`
//! environment variables.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::error::CampusIdError;
use crate::imaging::{
    AlphaPassthrough, BackgroundRemover, FaceDetector, NoFaceDetector, PhotoPipeline,
    RemoteBackgroundRemover, RemoteFaceDetector,
};
use crate::listing::DEFAULT_PER_PAGE;
use crate::validation::validate_per_page;

pub const ENV_PREFIX: &str = "CAMPUSID_";

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub base_url: String,
    pub csrf_token: Option<String>,
    pub background_removal_url: Option<String>,
    pub face_detection_url: Option<String>,
    pub request_timeout_secs: u64,
    pub cache_ttl_secs: u64,
    pub default_per_page: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            csrf_token: None,
            background_removal_url: None,
            face_detection_url: None,
            request_timeout_secs: 30,
            cache_ttl_secs: 300,
            default_per_page: DEFAULT_PER_PAGE,
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, CampusIdError> {
    raw.trim().parse::<T>().map_err(|_| {
        CampusIdError::Config(format!("{}{} has an invalid value '{}'", ENV_PREFIX, key, raw))
    })
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

impl Settings {
    pub fn from_toml(content: &str) -> Result<Self, CampusIdError> {
        let settings: Settings =
            toml::from_str(content).map_err(|e| CampusIdError::Config(e.to_string()))?;
        settings.validated()
    }

    /// Reads `path` when given, then applies the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, CampusIdError> {
        let settings = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path).map_err(|e| {
                    CampusIdError::Config(format!("cannot read {}: {}", path.display(), e))
                })?;
                Self::from_toml(&content)?
            }
            None => Self::default(),
        };
        settings.with_overrides(|key| std::env::var(format!("{}{}", ENV_PREFIX, key)).ok())
    }

    /// Applies overrides from `lookup`, which receives keys without the
    /// `CAMPUSID_` prefix (`BASE_URL`, `PER_PAGE`, ...).
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, CampusIdError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("BASE_URL").and_then(non_empty) {
            self.base_url = url;
        }
        if let Some(token) = lookup("CSRF_TOKEN").and_then(non_empty) {
            self.csrf_token = Some(token);
        }
        if let Some(url) = lookup("BACKGROUND_REMOVAL_URL").and_then(non_empty) {
            self.background_removal_url = Some(url);
        }
        if let Some(url) = lookup("FACE_DETECTION_URL").and_then(non_empty) {
            self.face_detection_url = Some(url);
        }
        if let Some(raw) = lookup("REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = parse_env("REQUEST_TIMEOUT_SECS", &raw)?;
        }
        if let Some(raw) = lookup("CACHE_TTL_SECS") {
            self.cache_ttl_secs = parse_env("CACHE_TTL_SECS", &raw)?;
        }
        if let Some(raw) = lookup("PER_PAGE") {
            self.default_per_page = parse_env("PER_PAGE", &raw)?;
        }
        self.validated()
    }

    fn validated(self) -> Result<Self, CampusIdError> {
        if url::Url::parse(&self.base_url).is_err() {
            return Err(CampusIdError::Config(format!(
                "base_url '{}' is not a valid URL",
                self.base_url
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(CampusIdError::Config(
                "request_timeout_secs must be at least 1".to_string(),
            ));
        }
        validate_per_page(self.default_per_page)
            .map_err(|e| CampusIdError::Config(e.to_string()))?;
        Ok(self)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Photo pipeline wired to the configured services. Without a service
    /// URL the local fallback is used for that stage.
    pub fn photo_pipeline(&self) -> Result<PhotoPipeline, CampusIdError> {
        let remover: Arc<dyn BackgroundRemover> = match &self.background_removal_url {
            Some(url) => Arc::new(RemoteBackgroundRemover::new(url)?),
            None => Arc::new(AlphaPassthrough),
        };
        let detector: Arc<dyn FaceDetector> = match &self.face_detection_url {
            Some(url) => Arc::new(RemoteFaceDetector::new(url)?),
            None => Arc::new(NoFaceDetector),
        };
        Ok(PhotoPipeline::new(remover, detector))
    }
}
