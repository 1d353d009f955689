use std::path::PathBuf;

use anyhow::{Context, Result};
use campusid_lib::imaging::{normalize_signature, transform};
use clap::Args;

use super::photo::write_image;

#[derive(Args)]
pub struct SignatureArgs {
    /// Signature image (a scan or a pad export, PNG with transparency works best)
    pub input: PathBuf,

    /// Student ID number; the output is named <id-number>_signature.jpg
    #[arg(long)]
    pub id_number: String,

    /// Directory the normalized signature is written to
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,
}

pub fn run(args: &SignatureArgs) -> Result<()> {
    let bytes = std::fs::read(&args.input)
        .with_context(|| format!("cannot read {}", args.input.display()))?;
    let image = transform::decode(&bytes)?;
    let normalized = normalize_signature(&image, &args.id_number)?;
    let path = write_image(&args.out_dir, &normalized.file_name, &normalized.bytes)?;
    println!("{}", path.display());
    Ok(())
}
