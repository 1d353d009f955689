use anyhow::{bail, Result};
use campusid_lib::validation::resolve_college;
use campusid_lib::CampusDirectory;
use clap::Args;

use crate::output::{print_colleges, print_programs, OutputFormat};

#[derive(Args)]
pub struct DirectoryArgs {
    /// Only this campus
    #[arg(long)]
    pub campus: Option<String>,

    /// Show the programs and majors of a college (code or name, fuzzy)
    #[arg(long)]
    pub college: Option<String>,
}

pub fn run(args: &DirectoryArgs, format: &OutputFormat) -> Result<()> {
    let directory = CampusDirectory::embedded()?;

    let campuses: Vec<_> = match &args.campus {
        Some(name) => match directory.campus(name.trim()) {
            Some(campus) => vec![campus],
            None => bail!("unknown campus '{}'", name),
        },
        None => directory.campuses().iter().collect(),
    };

    match &args.college {
        None => {
            for campus in campuses {
                print_colleges(&campus.name, &campus.colleges, format)?;
            }
        }
        Some(input) => {
            let code = resolve_college(input, &directory)?.code.clone();
            let mut found = false;
            for campus in campuses {
                if let Some(college) = campus.college(&code) {
                    eprintln!("{} - {} ({})", campus.name, college.name, college.code);
                    print_programs(&college.programs, format)?;
                    found = true;
                }
            }
            if !found {
                bail!("college '{}' is not offered on the selected campus", code);
            }
        }
    }
    Ok(())
}
