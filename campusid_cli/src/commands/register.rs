//! Headless registration: drives the wizard from a TOML form file.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use campusid_lib::imaging::{normalize_signature, transform, PhotoSlot};
use campusid_lib::types::IdType;
use campusid_lib::validation::resolve_college;
use campusid_lib::wizard::{EmergencyContact, PersonalInfo, StepOutcome};
use campusid_lib::{
    CachedClient, CampusDirectory, Level, RegistrationForm, Settings, Wizard, WizardStep,
};
use clap::Args;
use serde::Deserialize;

use crate::output::{print_json, print_notifications, OutputFormat};

#[derive(Args)]
pub struct RegisterArgs {
    /// TOML file with the form fields
    pub form: PathBuf,

    /// Student photo (JPEG or PNG)
    #[arg(long)]
    pub photo: PathBuf,

    /// Signature image
    #[arg(long)]
    pub signature: PathBuf,

    /// Build the address lookup from the flat province/municipality/barangay tables
    #[arg(long)]
    pub tables: bool,

    /// Validate every step but stop before the final submission
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Deserialize, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
struct RegistrationFile {
    id_number: String,
    id_type: IdType,
    first_name: String,
    middle_name: Option<String>,
    last_name: String,
    suffix: Option<String>,
    academic: AcademicFields,
    contact: ContactFields,
    address: AddressFields,
}

#[derive(Deserialize, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
struct AcademicFields {
    campus: String,
    college: String,
    program: String,
    major: Option<String>,
    year_level: u8,
    section: String,
}

#[derive(Deserialize, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
struct ContactFields {
    first_name: String,
    middle_name: Option<String>,
    last_name: String,
    relationship: String,
    number: String,
}

#[derive(Deserialize, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
struct AddressFields {
    province: String,
    city: String,
    barangay: String,
    zip_code: String,
}

impl RegistrationFile {
    fn apply(&self, form: &mut RegistrationForm, campuses: &CampusDirectory) -> Result<()> {
        form.set_personal(PersonalInfo {
            id_number: self.id_number.clone(),
            id_type: Some(self.id_type),
            first_name: self.first_name.clone(),
            middle_name: self.middle_name.clone(),
            last_name: self.last_name.clone(),
            suffix: self.suffix.clone(),
            year_level: Some(self.academic.year_level),
            section: Some(self.academic.section.clone()),
        });
        form.set_contact(EmergencyContact {
            first_name: Some(self.contact.first_name.clone()),
            middle_name: self.contact.middle_name.clone(),
            last_name: Some(self.contact.last_name.clone()),
            relationship: Some(self.contact.relationship.clone()),
            number: Some(self.contact.number.clone()),
        });

        let college = resolve_college(&self.academic.college, campuses)?;
        let academic = form.academic_mut();
        academic.select_campus(&self.academic.campus)?;
        academic.select_college(&college.code)?;
        academic.select_program(&self.academic.program)?;
        if let Some(ref major) = self.academic.major {
            academic.select_major(major)?;
        }

        let address = form.address_mut();
        address.select_province(&self.address.province)?;
        address.select_city(&self.address.city)?;
        address.select_barangay(&self.address.barangay)?;
        address.set_zip_code(Some(self.address.zip_code.clone()));
        Ok(())
    }
}

fn check(outcome: StepOutcome, step: WizardStep) -> Result<()> {
    print_notifications(&outcome.notifications);
    if !outcome.advanced {
        bail!("step {} ({}) was rejected", step.number(), step.title());
    }
    Ok(())
}

pub async fn run(
    args: &RegisterArgs,
    client: &CachedClient,
    settings: &Settings,
    format: &OutputFormat,
) -> Result<()> {
    let content = std::fs::read_to_string(&args.form)
        .with_context(|| format!("cannot read {}", args.form.display()))?;
    let file: RegistrationFile = toml::from_str(&content)
        .with_context(|| format!("invalid form file {}", args.form.display()))?;

    let campuses = Arc::new(CampusDirectory::embedded()?);
    let locations = if args.tables {
        client.location_directory_from_tables().await?
    } else {
        client.location_directory().await?
    };
    let mut form = RegistrationForm::new(Arc::clone(&campuses), locations);
    file.apply(&mut form, &campuses)?;

    client.ensure_csrf_token().await?;
    let mut wizard = Wizard::new(form);

    check(wizard.advance(client).await, WizardStep::PersonalInfo)?;

    let photo = std::fs::read(&args.photo)
        .with_context(|| format!("cannot read {}", args.photo.display()))?;
    let mut slot = PhotoSlot::new(settings.photo_pipeline()?);
    let note = wizard.form_mut().prepare_picture(&mut slot, &photo).await;
    print_notifications(std::slice::from_ref(&note));
    if note.level == Level::Error {
        bail!("photo could not be prepared");
    }

    let signature = std::fs::read(&args.signature)
        .with_context(|| format!("cannot read {}", args.signature.display()))?;
    let signature = normalize_signature(&transform::decode(&signature)?, &file.id_number)?;
    wizard.form_mut().set_signature(Some(signature));

    check(wizard.advance(client).await, WizardStep::MediaUpload)?;

    let preview = wizard.preview();
    match format {
        OutputFormat::Json => print_json(&preview.details),
        _ => {
            for (label, value) in preview.lines() {
                println!("{:<18} {}", label, value);
            }
        }
    }

    if args.dry_run {
        eprintln!("Dry run: registration was not submitted");
        return Ok(());
    }
    check(wizard.advance(client).await, WizardStep::PreviewConfirm)?;
    Ok(())
}
