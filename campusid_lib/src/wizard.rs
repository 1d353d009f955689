//! Three-step registration wizard gated on server-side validation.

use std::sync::Arc;

use async_trait::async_trait;
use campusid_api::types::{IdType, MediaPayload, NamedImage, StudentDetails, ValidationErrors};
use campusid_api::Client;

use crate::cascade::{AcademicSelection, AddressSelection};
use crate::client::CachedClient;
use crate::directory::{CampusDirectory, LocationDirectory};
use crate::error::CampusIdError;
use crate::imaging::{ImagingError, PhotoSlot, SignaturePad};
use crate::notify::Notification;
use crate::validation::{validate_details, validate_media};

const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WizardStep {
    PersonalInfo,
    MediaUpload,
    PreviewConfirm,
    Submitted,
}

impl WizardStep {
    /// 1-based position shown in the progress indicator.
    pub fn number(self) -> u8 {
        match self {
            WizardStep::PersonalInfo => 1,
            WizardStep::MediaUpload => 2,
            WizardStep::PreviewConfirm => 3,
            WizardStep::Submitted => 4,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            WizardStep::PersonalInfo => "Personal Information",
            WizardStep::MediaUpload => "Photo & Signature",
            WizardStep::PreviewConfirm => "Preview & Confirm",
            WizardStep::Submitted => "Submitted",
        }
    }

    fn next(self) -> Self {
        match self {
            WizardStep::PersonalInfo => WizardStep::MediaUpload,
            WizardStep::MediaUpload => WizardStep::PreviewConfirm,
            WizardStep::PreviewConfirm | WizardStep::Submitted => WizardStep::Submitted,
        }
    }

    fn previous(self) -> Self {
        match self {
            WizardStep::MediaUpload => WizardStep::PersonalInfo,
            WizardStep::PreviewConfirm => WizardStep::MediaUpload,
            other => other,
        }
    }
}

/// Identity and placement fields typed directly by the student.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersonalInfo {
    pub id_number: String,
    pub id_type: Option<IdType>,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub suffix: Option<String>,
    pub year_level: Option<u8>,
    pub section: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmergencyContact {
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub relationship: Option<String>,
    pub number: Option<String>,
}

fn trimmed(value: &str) -> String {
    value.trim().to_string()
}

fn trimmed_opt(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

/// Everything entered across the wizard steps.
pub struct RegistrationForm {
    personal: PersonalInfo,
    contact: EmergencyContact,
    academic: AcademicSelection,
    address: AddressSelection,
    picture: Option<NamedImage>,
    signature: Option<NamedImage>,
}

impl RegistrationForm {
    pub fn new(campuses: Arc<CampusDirectory>, locations: Arc<LocationDirectory>) -> Self {
        Self {
            personal: PersonalInfo::default(),
            contact: EmergencyContact::default(),
            academic: AcademicSelection::new(campuses),
            address: AddressSelection::new(locations),
            picture: None,
            signature: None,
        }
    }

    pub fn personal(&self) -> &PersonalInfo {
        &self.personal
    }

    pub fn set_personal(&mut self, personal: PersonalInfo) {
        self.personal = personal;
    }

    pub fn contact(&self) -> &EmergencyContact {
        &self.contact
    }

    pub fn set_contact(&mut self, contact: EmergencyContact) {
        self.contact = contact;
    }

    pub fn academic(&self) -> &AcademicSelection {
        &self.academic
    }

    pub fn academic_mut(&mut self) -> &mut AcademicSelection {
        &mut self.academic
    }

    pub fn address(&self) -> &AddressSelection {
        &self.address
    }

    pub fn address_mut(&mut self) -> &mut AddressSelection {
        &mut self.address
    }

    pub fn picture(&self) -> Option<&NamedImage> {
        self.picture.as_ref()
    }

    pub fn set_picture(&mut self, picture: Option<NamedImage>) {
        self.picture = picture;
    }

    pub fn signature(&self) -> Option<&NamedImage> {
        self.signature.as_ref()
    }

    pub fn set_signature(&mut self, signature: Option<NamedImage>) {
        self.signature = signature;
    }

    /// Runs the photo pipeline for this form's ID number. The form's picture
    /// follows the slot: cleared on failure, replaced on success.
    pub async fn prepare_picture(&mut self, slot: &mut PhotoSlot, bytes: &[u8]) -> Notification {
        let id_number = trimmed_opt(Some(&self.personal.id_number));
        let notification = slot.select(bytes, id_number.as_deref()).await;
        self.picture = slot.take().map(|prepared| prepared.image);
        notification
    }

    /// Exports the pad as this form's signature.
    pub fn capture_signature(&mut self, pad: &SignaturePad) -> Result<(), ImagingError> {
        let id_number = self.personal.id_number.trim();
        pad.save(Some(id_number), |image| self.signature = Some(image))
    }

    /// Snapshot of the text fields as submitted to the backend.
    pub fn details(&self) -> StudentDetails {
        let p = &self.personal;
        let c = &self.contact;
        StudentDetails {
            id_number: trimmed(&p.id_number),
            id_type: p.id_type,
            first_name: trimmed(&p.first_name),
            middle_name: trimmed_opt(p.middle_name.as_deref()),
            last_name: trimmed(&p.last_name),
            suffix: trimmed_opt(p.suffix.as_deref()),
            campus: self.academic.campus().map(str::to_string),
            college: self.academic.college().map(str::to_string),
            program: self.academic.program().map(str::to_string),
            major: self.academic.major().map(str::to_string),
            year_level: p.year_level,
            section: trimmed_opt(p.section.as_deref()).map(|s| s.to_uppercase()),
            contact_first_name: trimmed_opt(c.first_name.as_deref()),
            contact_middle_name: trimmed_opt(c.middle_name.as_deref()),
            contact_last_name: trimmed_opt(c.last_name.as_deref()),
            contact_relationship: trimmed_opt(c.relationship.as_deref()),
            contact_number: trimmed_opt(c.number.as_deref()),
            province: self.address.province().map(str::to_string),
            city: self.address.city().map(str::to_string),
            barangay: self.address.barangay().map(str::to_string),
            zip_code: trimmed_opt(self.address.zip_code()),
        }
    }

    /// Snapshot of the media slice. Missing images are sent as empty files so
    /// validation reports them.
    pub fn media(&self) -> MediaPayload {
        let id_number = trimmed(&self.personal.id_number);
        MediaPayload {
            picture: self
                .picture
                .clone()
                .unwrap_or_else(|| NamedImage::jpeg(format!("{}.jpg", id_number), Vec::new())),
            signature: self.signature.clone().unwrap_or_else(|| {
                NamedImage::jpeg(format!("{}_signature.jpg", id_number), Vec::new())
            }),
            id_number,
        }
    }

    pub fn reset(&mut self) {
        self.personal = PersonalInfo::default();
        self.contact = EmergencyContact::default();
        self.academic.clear();
        self.address.clear();
        self.picture = None;
        self.signature = None;
    }
}

/// Read-only summary shown on the confirmation step.
#[derive(Debug, Clone, PartialEq)]
pub struct Preview {
    pub details: StudentDetails,
    pub college_name: Option<String>,
    pub picture: Option<String>,
    pub signature: Option<String>,
}

impl Preview {
    /// Label/value pairs in display order; unset values are shown as "-".
    pub fn lines(&self) -> Vec<(&'static str, String)> {
        let d = &self.details;
        let show = |v: Option<&str>| v.unwrap_or("-").to_string();
        let mut name = format!("{}, {}", d.last_name, d.first_name);
        for part in [d.middle_name.as_deref(), d.suffix.as_deref()].into_iter().flatten() {
            name.push(' ');
            name.push_str(part);
        }
        vec![
            ("ID Number", d.id_number.clone()),
            ("ID Type", d.id_type.map(|t| t.to_string()).unwrap_or_else(|| "-".to_string())),
            ("Name", name),
            ("Campus", show(d.campus.as_deref())),
            ("College", show(self.college_name.as_deref().or(d.college.as_deref()))),
            ("Program", show(d.program.as_deref())),
            ("Major", show(d.major.as_deref())),
            ("Year Level", d.year_level.map(|y| y.to_string()).unwrap_or_else(|| "-".to_string())),
            ("Section", show(d.section.as_deref())),
            ("Emergency Contact", {
                let parts: Vec<&str> = [
                    d.contact_first_name.as_deref(),
                    d.contact_middle_name.as_deref(),
                    d.contact_last_name.as_deref(),
                ]
                .into_iter()
                .flatten()
                .collect();
                if parts.is_empty() {
                    "-".to_string()
                } else {
                    parts.join(" ")
                }
            }),
            ("Relationship", show(d.contact_relationship.as_deref())),
            ("Contact Number", show(d.contact_number.as_deref())),
            ("Address", {
                let parts: Vec<&str> = [d.barangay.as_deref(), d.city.as_deref(), d.province.as_deref()]
                    .into_iter()
                    .flatten()
                    .collect();
                if parts.is_empty() {
                    "-".to_string()
                } else {
                    parts.join(", ")
                }
            }),
            ("Zip Code", show(d.zip_code.as_deref())),
            ("Photo", show(self.picture.as_deref())),
            ("Signature", show(self.signature.as_deref())),
        ]
    }
}

/// Server endpoints the wizard talks to.
#[async_trait]
pub trait RegistrationBackend: Send + Sync {
    async fn validate_step_one(&self, details: &StudentDetails) -> Result<(), CampusIdError>;
    async fn validate_step_two(&self, media: &MediaPayload) -> Result<(), CampusIdError>;
    async fn register(
        &self,
        details: &StudentDetails,
        media: &MediaPayload,
    ) -> Result<(), CampusIdError>;
}

#[async_trait]
impl RegistrationBackend for Client {
    async fn validate_step_one(&self, details: &StudentDetails) -> Result<(), CampusIdError> {
        Ok(Client::validate_step_one(self, details).await?)
    }

    async fn validate_step_two(&self, media: &MediaPayload) -> Result<(), CampusIdError> {
        Ok(Client::validate_step_two(self, media).await?)
    }

    async fn register(
        &self,
        details: &StudentDetails,
        media: &MediaPayload,
    ) -> Result<(), CampusIdError> {
        Ok(self.register_student(details, media).await?)
    }
}

#[async_trait]
impl RegistrationBackend for CachedClient {
    async fn validate_step_one(&self, details: &StudentDetails) -> Result<(), CampusIdError> {
        RegistrationBackend::validate_step_one(self.inner(), details).await
    }

    async fn validate_step_two(&self, media: &MediaPayload) -> Result<(), CampusIdError> {
        RegistrationBackend::validate_step_two(self.inner(), media).await
    }

    async fn register(
        &self,
        details: &StudentDetails,
        media: &MediaPayload,
    ) -> Result<(), CampusIdError> {
        RegistrationBackend::register(self.inner(), details, media).await
    }
}

/// Result of one `advance` call.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub step: WizardStep,
    pub advanced: bool,
    pub notifications: Vec<Notification>,
}

pub struct Wizard {
    step: WizardStep,
    form: RegistrationForm,
    errors: ValidationErrors,
}

impl Wizard {
    pub fn new(form: RegistrationForm) -> Self {
        Self {
            step: WizardStep::PersonalInfo,
            form,
            errors: ValidationErrors::new(),
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn form(&self) -> &RegistrationForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut RegistrationForm {
        &mut self.form
    }

    /// Field errors from the last rejected step.
    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn preview(&self) -> Preview {
        let details = self.form.details();
        let college_name = details.college.as_deref().and_then(|code| {
            let campus = details.campus.as_deref()?;
            self.form
                .academic()
                .directory()
                .college(campus, code)
                .map(|c| c.name.clone())
        });
        Preview {
            details,
            college_name,
            picture: self.form.picture().map(|p| p.file_name.clone()),
            signature: self.form.signature().map(|s| s.file_name.clone()),
        }
    }

    /// Goes one step back without validation. Returns whether the step changed.
    pub fn back(&mut self) -> bool {
        let previous = self.step.previous();
        let changed = previous != self.step;
        self.step = previous;
        changed
    }

    /// Validates the current step locally, then on the server, and moves on
    /// when both accept it. The confirmation step submits the registration.
    pub async fn advance<B>(&mut self, backend: &B) -> StepOutcome
    where
        B: RegistrationBackend + ?Sized,
    {
        let step = self.step;
        let result = match step {
            WizardStep::PersonalInfo => {
                let details = self.form.details();
                let local = validate_details(&details, self.form.academic().directory());
                if local.is_empty() {
                    backend.validate_step_one(&details).await
                } else {
                    return self.reject(local);
                }
            }
            WizardStep::MediaUpload => {
                let media = self.form.media();
                let local = validate_media(&media);
                if local.is_empty() {
                    backend.validate_step_two(&media).await
                } else {
                    return self.reject(local);
                }
            }
            WizardStep::PreviewConfirm => {
                backend
                    .register(&self.form.details(), &self.form.media())
                    .await
            }
            WizardStep::Submitted => {
                return self.outcome(false, Vec::new());
            }
        };

        match result {
            Ok(()) => {
                self.errors = ValidationErrors::new();
                self.step = step.next();
                if self.step == WizardStep::Submitted {
                    self.form.reset();
                    tracing::info!("Registration submitted");
                    self.outcome(
                        true,
                        vec![Notification::success("Registration submitted successfully.")],
                    )
                } else {
                    self.outcome(true, Vec::new())
                }
            }
            Err(e) => match e.validation() {
                Some(errors) => self.reject(errors.clone()),
                None => {
                    tracing::error!("Step {} failed: {}", step.number(), e);
                    self.outcome(false, vec![Notification::error(GENERIC_FAILURE)])
                }
            },
        }
    }

    fn reject(&mut self, errors: ValidationErrors) -> StepOutcome {
        tracing::warn!(
            "Step {} rejected: {}",
            self.step.number(),
            errors
        );
        let notifications = Notification::from_validation(&errors);
        self.errors = errors;
        self.outcome(false, notifications)
    }

    fn outcome(&self, advanced: bool, notifications: Vec<Notification>) -> StepOutcome {
        StepOutcome {
            step: self.step,
            advanced,
            notifications,
        }
    }
}
