use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use campusid_lib::{CachedClient, CampusDirectory};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};

use crate::commands::students::FilterArgs;
use crate::output::write_export_csv;

#[derive(Args)]
pub struct ExportArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Write the CSV here instead of stdout
    #[arg(long, short)]
    pub out: Option<PathBuf>,
}

pub async fn run(args: &ExportArgs, client: &CachedClient) -> Result<()> {
    let directory = CampusDirectory::embedded()?;
    let query = args.filter.to_filter(&directory)?.to_query();

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
    pb.set_message("fetching students...");
    pb.enable_steady_tick(Duration::from_millis(120));
    let students = client.export_students(&query).await;
    pb.finish_and_clear();
    let students = students?;

    match &args.out {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("cannot create {}", path.display()))?;
            write_export_csv(&students, BufWriter::new(file))?;
            eprintln!("Exported {} students to {}", students.len(), path.display());
        }
        None => {
            write_export_csv(&students, std::io::stdout())?;
            eprintln!("Exported {} students", students.len());
        }
    }
    Ok(())
}
