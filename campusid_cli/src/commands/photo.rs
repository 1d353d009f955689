use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use campusid_lib::types::StudentId;
use campusid_lib::{CachedClient, PreparedImage, Settings};
use clap::Args;
use serde::Serialize;

use crate::output::{print_json, OutputFormat};

#[derive(Args)]
pub struct PhotoArgs {
    /// Source photo (JPEG or PNG)
    pub input: PathBuf,

    /// Student ID number; the output is named <id-number>.jpg
    #[arg(long)]
    pub id_number: String,

    /// Directory the prepared photo is written to
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,

    /// Replace the picture of this student record after preparing it
    #[arg(long)]
    pub upload: Option<StudentId>,
}

#[derive(Serialize)]
struct PhotoReport {
    file: String,
    width: u32,
    height: u32,
    quality: u8,
    bytes: usize,
    face_detected: bool,
    uploaded_to: Option<StudentId>,
}

pub(crate) fn write_image(out_dir: &Path, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("cannot create {}", out_dir.display()))?;
    let path = out_dir.join(file_name);
    std::fs::write(&path, bytes).with_context(|| format!("cannot write {}", path.display()))?;
    Ok(path)
}

pub async fn run(
    args: &PhotoArgs,
    client: &CachedClient,
    settings: &Settings,
    format: &OutputFormat,
) -> Result<()> {
    let source = std::fs::read(&args.input)
        .with_context(|| format!("cannot read {}", args.input.display()))?;
    let pipeline = settings.photo_pipeline()?;
    let prepared: PreparedImage = pipeline.prepare(&source, Some(&args.id_number)).await?;
    let path = write_image(&args.out_dir, &prepared.image.file_name, &prepared.image.bytes)?;

    if let Some(id) = args.upload {
        client.ensure_csrf_token().await?;
        client.update_student_picture(id, &prepared.image).await?;
        eprintln!("Replaced picture of student {}", id);
    }

    let report = PhotoReport {
        file: path.display().to_string(),
        width: prepared.width,
        height: prepared.height,
        quality: prepared.quality,
        bytes: prepared.image.len(),
        face_detected: prepared.face.is_some(),
        uploaded_to: args.upload,
    };
    match format {
        OutputFormat::Json => print_json(&report),
        _ => println!(
            "{} ({}x{}, quality {}, {} bytes{})",
            report.file,
            report.width,
            report.height,
            report.quality,
            report.bytes,
            if report.face_detected { ", face-centered" } else { "" }
        ),
    }
    Ok(())
}
