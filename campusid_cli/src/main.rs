mod commands;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use campusid_lib::{CachedClient, Settings};
use clap::{Parser, Subcommand};

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "campusid")]
#[command(about = "Campus ID issuance: student listing, export, photo preparation and registration")]
struct Cli {
    /// Output format: table, json, csv or markdown
    #[arg(long, default_value = "table", global = true)]
    output: String,

    /// Settings file (TOML); CAMPUSID_* environment variables override it
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List students of a campus with filters and pagination
    Students(commands::students::StudentsArgs),
    /// Export matching students as CSV
    Export(commands::export::ExportArgs),
    /// Prepare an ID photo (background removal, face-centered crop, compression)
    Photo(commands::photo::PhotoArgs),
    /// Normalize a signature image to the ID card frame
    Signature(commands::signature::SignatureArgs),
    /// Submit a registration from a form file, photo and signature
    Register(commands::register::RegisterArgs),
    /// Browse campuses, colleges, programs and majors
    Directory(commands::directory::DirectoryArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("campusid=info".parse()?),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let format = OutputFormat::parse(&cli.output);
    let settings = Settings::load(cli.config.as_deref())?;
    let client = CachedClient::new(&settings)?;

    match &cli.command {
        Commands::Students(args) => {
            commands::students::run(args, &client, &settings, &format).await?
        }
        Commands::Export(args) => commands::export::run(args, &client).await?,
        Commands::Photo(args) => commands::photo::run(args, &client, &settings, &format).await?,
        Commands::Signature(args) => commands::signature::run(args)?,
        Commands::Register(args) => {
            commands::register::run(args, &client, &settings, &format).await?
        }
        Commands::Directory(args) => commands::directory::run(args, &format)?,
    }

    Ok(())
}
