//! HTTP client for the student-records backend.

use std::sync::Mutex;
use std::time::Duration;

use reqwest::multipart::Form;
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use url::Url;

use crate::{
    csrf::extract_csrf_token,
    multipart::{form_from_fields, image_part, text_fields},
    query::{Query, StudentQuery},
    types::{
        BarangayRow, LocationTree, MediaPayload, MunicipalityRow, NamedImage, Paginated,
        ProvinceRow, Student, StudentDetails, StudentId, ValidationErrors,
    },
    Error,
};

/// Default request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for the student-records backend.
///
/// Keeps one `reqwest::Client` with a cookie store so the session cookie
/// that the CSRF token is bound to survives across requests. Every request
/// carries `X-CSRF-TOKEN` once a token is known.
pub struct Client {
    base_api_url: String,
    http: reqwest::Client,
    csrf_token: Mutex<Option<String>>,
}

impl Client {
    /// Creates a client for the backend at `base_url` with the default timeout.
    pub fn with_base_url(base_url: &str) -> Result<Self, Error> {
        Self::with_timeout(base_url, REQUEST_TIMEOUT)
    }

    /// Creates a client with a custom request timeout.
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .build()
            .map_err(|e| {
                tracing::error!("Failed to build HTTP client: {}", e);
                Error::RequestFailed
            })?;
        Ok(Self {
            base_api_url: base_url.trim_end_matches('/').to_string(),
            http,
            csrf_token: Mutex::new(None),
        })
    }

    /// Sets the CSRF token sent with every request.
    pub fn set_csrf_token(&self, token: &str) {
        *self.csrf_token.lock().unwrap_or_else(|e| e.into_inner()) = Some(token.to_string());
    }

    /// The CSRF token currently attached to requests.
    pub fn csrf_token(&self) -> Option<String> {
        self.csrf_token
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Loads the page shell, reads the `csrf-token` meta tag and stores it.
    pub async fn refresh_csrf_token(&self) -> Result<String, Error> {
        let url = self.get_url("/", None::<&StudentQuery>)?;
        let body = self
            .execute(self.http.get(url))
            .await?;
        let token = extract_csrf_token(&body).ok_or_else(|| {
            tracing::error!("Page did not contain a csrf-token meta tag");
            Error::RequestFailed
        })?;
        self.set_csrf_token(&token);
        Ok(token)
    }

    fn get_url(&self, path: &str, query: Option<&impl Query>) -> Result<Url, Error> {
        let url = Url::parse(format!("{}{}", &self.base_api_url, path).as_str()).map_err(|e| {
            tracing::error!("Invalid URL constructed: {}", e);
            Error::InvalidUrl(e.to_string())
        })?;
        Ok(match query {
            Some(query) => query.add_to_url(&url),
            None => url,
        })
    }

    fn decorate(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request
            .header("x-requested-with", "XMLHttpRequest")
            .header("accept", "application/json, text/plain, */*");
        match self.csrf_token() {
            Some(token) => request.header("x-csrf-token", token),
            None => request,
        }
    }

    /// Sends the request and returns the body of a successful response.
    async fn execute(&self, request: RequestBuilder) -> Result<String, Error> {
        let resp = self.decorate(request).send().await.map_err(|e| {
            tracing::error!("Failed to send request: {}", e);
            Error::RequestFailed
        })?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| {
            tracing::error!("Failed to read response body: {}", e);
            Error::RequestFailed
        })?;

        if status == reqwest::StatusCode::UNPROCESSABLE_ENTITY {
            let errors = serde_json::from_str::<ValidationErrors>(&body).map_err(|e| {
                tracing::error!(
                    "Failed to parse validation errors: {} | body: {}",
                    e,
                    truncate_body(&body)
                );
                Error::HttpStatus {
                    status: status.as_u16(),
                    body: truncate_body(&body),
                }
            })?;
            tracing::warn!("Submission rejected: {}", errors);
            return Err(Error::Validation(errors));
        }

        if !status.is_success() {
            let snippet = truncate_body(&body);
            tracing::error!("Request failed with status {}: {}", status, snippet);
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                body: snippet,
            });
        }

        Ok(body)
    }

    async fn get<T, Q>(&self, path: &str, query: Option<&Q>) -> Result<T, Error>
    where
        T: DeserializeOwned,
        Q: Query,
    {
        let url = self.get_url(path, query)?;
        let body = self.execute(self.http.get(url)).await?;

        let parsed = serde_json::from_str::<T>(&body).map_err(|e| {
            let snippet = truncate_body(&body);
            tracing::error!("Failed to parse resource: {} | body: {}", e, snippet);
            Error::RequestFailed
        })?;

        Ok(parsed)
    }

    async fn post_form(&self, path: &str, form: Form) -> Result<(), Error> {
        let url = self.get_url(path, None::<&StudentQuery>)?;
        self.execute(self.http.post(url).multipart(form)).await?;
        Ok(())
    }

    async fn post_json<B: serde::Serialize>(&self, path: &str, body: &B) -> Result<(), Error> {
        let url = self.get_url(path, None::<&StudentQuery>)?;
        self.execute(self.http.post(url).json(body)).await?;
        Ok(())
    }

    /// Fetches one page of students matching the given filters.
    pub async fn get_students(&self, query: &StudentQuery) -> Result<Paginated<Student>, Error> {
        self.get::<Paginated<Student>, StudentQuery>("/api/student/filterPaginate", Some(query))
            .await
    }

    /// Fetches every student matching the filters as a flat list (export variant).
    pub async fn export_students(&self, query: &StudentQuery) -> Result<Vec<Student>, Error> {
        self.get::<Vec<Student>, StudentQuery>("/api/student/filter", Some(query))
            .await
    }

    /// Server-side validation of the first registration step.
    pub async fn validate_step_one(&self, details: &StudentDetails) -> Result<(), Error> {
        let form = form_from_fields(text_fields(details)?);
        self.post_form("/register/validate-step-one", form).await
    }

    /// Server-side validation of the media step.
    pub async fn validate_step_two(&self, media: &MediaPayload) -> Result<(), Error> {
        let form = media_form(Form::new(), media)?;
        self.post_form("/register/validate-step-two", form).await
    }

    /// Final submission: creates the student record.
    pub async fn register_student(
        &self,
        details: &StudentDetails,
        media: &MediaPayload,
    ) -> Result<(), Error> {
        let mut fields = text_fields(details)?;
        fields.retain(|(key, _)| key != "id_number");
        let form = media_form(form_from_fields(fields), media)?;
        self.post_form("/register", form).await
    }

    /// Admin edit of an existing record.
    pub async fn update_student(&self, id: StudentId, details: &StudentDetails) -> Result<(), Error> {
        self.post_json(&format!("/students/{}/update", id), details)
            .await
    }

    /// Completes a record that was flagged incomplete.
    pub async fn update_incomplete_student(
        &self,
        id: StudentId,
        details: &StudentDetails,
    ) -> Result<(), Error> {
        self.post_json(&format!("/students/{}/update-incomplete", id), details)
            .await
    }

    /// Replaces the picture of an existing record.
    pub async fn update_student_picture(
        &self,
        id: StudentId,
        picture: &NamedImage,
    ) -> Result<(), Error> {
        let form = Form::new().part("picture", image_part(picture)?);
        self.post_form(&format!("/students/{}/picture", id), form)
            .await
    }

    /// Fetches the nested region/province/municipality/barangay tree.
    pub async fn get_location_tree(&self) -> Result<LocationTree, Error> {
        self.get::<LocationTree, StudentQuery>("/ph-location.json", None)
            .await
    }

    pub async fn get_province_table(&self) -> Result<Vec<ProvinceRow>, Error> {
        self.get::<Vec<ProvinceRow>, StudentQuery>("/table_province.json", None)
            .await
    }

    pub async fn get_municipality_table(&self) -> Result<Vec<MunicipalityRow>, Error> {
        self.get::<Vec<MunicipalityRow>, StudentQuery>("/table_municipality.json", None)
            .await
    }

    pub async fn get_barangay_table(&self) -> Result<Vec<BarangayRow>, Error> {
        self.get::<Vec<BarangayRow>, StudentQuery>("/table_barangay.json", None)
            .await
    }
}

fn media_form(form: Form, media: &MediaPayload) -> Result<Form, Error> {
    Ok(form
        .text("id_number", media.id_number.clone())
        .part("picture", image_part(&media.picture)?)
        .part("signature", image_part(&media.signature)?))
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 2000;
    if body.len() <= MAX {
        body.to_string()
    } else {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...[truncated]", &body[..end])
    }
}
