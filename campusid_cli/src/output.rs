use std::io::Write;

use anyhow::Result;
use campusid_lib::directory::{College, Program};
use campusid_lib::types::Student;
use campusid_lib::Notification;
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Clone, Debug, PartialEq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
    Markdown,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Self {
        match value {
            "json" => OutputFormat::Json,
            "csv" => OutputFormat::Csv,
            "markdown" | "md" => OutputFormat::Markdown,
            _ => OutputFormat::Table,
        }
    }
}

#[derive(Tabled, Serialize)]
struct StudentRow {
    #[tabled(rename = "ID Number")]
    #[serde(rename = "ID Number")]
    id_number: String,
    #[tabled(rename = "Name")]
    #[serde(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    #[serde(rename = "Type")]
    id_type: String,
    #[tabled(rename = "College")]
    #[serde(rename = "College")]
    college: String,
    #[tabled(rename = "Program")]
    #[serde(rename = "Program")]
    program: String,
    #[tabled(rename = "Year/Sec")]
    #[serde(rename = "Year/Sec")]
    year_section: String,
    #[tabled(rename = "Completed")]
    #[serde(rename = "Completed")]
    completed: String,
    #[tabled(rename = "Exported")]
    #[serde(rename = "Exported")]
    exported: String,
    #[tabled(rename = "Updated")]
    #[serde(rename = "Updated")]
    updated: String,
}

/// Column layout of the card-printing export.
#[derive(Serialize)]
struct ExportRow<'a> {
    id_number: &'a str,
    id_type: String,
    last_name: &'a str,
    first_name: &'a str,
    middle_name: &'a str,
    suffix: &'a str,
    campus: &'a str,
    college: &'a str,
    program: &'a str,
    major: &'a str,
    year_level: String,
    section: &'a str,
    contact_name: String,
    contact_relationship: &'a str,
    contact_number: &'a str,
    address: String,
    zip_code: &'a str,
    picture: &'a str,
    signature: &'a str,
}

#[derive(Tabled, Serialize)]
struct CollegeRow {
    #[tabled(rename = "Campus")]
    #[serde(rename = "Campus")]
    campus: String,
    #[tabled(rename = "Code")]
    #[serde(rename = "Code")]
    code: String,
    #[tabled(rename = "College")]
    #[serde(rename = "College")]
    name: String,
    #[tabled(rename = "Section Length")]
    #[serde(rename = "Section Length")]
    section_length: usize,
    #[tabled(rename = "Programs")]
    #[serde(rename = "Programs")]
    programs: usize,
}

#[derive(Tabled, Serialize)]
struct ProgramRow {
    #[tabled(rename = "Program")]
    #[serde(rename = "Program")]
    name: String,
    #[tabled(rename = "Majors")]
    #[serde(rename = "Majors")]
    majors: String,
}

// -- Row builders --

fn yes_no(value: bool) -> String {
    let text = if value { "yes" } else { "no" };
    text.to_string()
}

fn build_student_rows(students: &[Student]) -> Vec<StudentRow> {
    students
        .iter()
        .map(|s| StudentRow {
            id_number: s.id_number.clone(),
            name: s.display_name(),
            id_type: s.id_type.map(|t| t.to_string()).unwrap_or_default(),
            college: s.college.clone().unwrap_or_default(),
            program: s.program.clone().unwrap_or_default(),
            year_section: format!(
                "{}-{}",
                s.year_level.map(|y| y.to_string()).unwrap_or_default(),
                s.section.as_deref().unwrap_or_default()
            ),
            completed: yes_no(s.is_completed),
            exported: yes_no(s.is_exported),
            updated: s
                .updated_at
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
        })
        .collect()
}

fn join_present(parts: &[Option<&str>], sep: &str) -> String {
    parts
        .iter()
        .flatten()
        .filter(|p| !p.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(sep)
}

fn build_export_rows(students: &[Student]) -> Vec<ExportRow<'_>> {
    students
        .iter()
        .map(|s| ExportRow {
            id_number: &s.id_number,
            id_type: s.id_type.map(|t| t.to_string()).unwrap_or_default(),
            last_name: &s.last_name,
            first_name: &s.first_name,
            middle_name: s.middle_name.as_deref().unwrap_or_default(),
            suffix: s.suffix.as_deref().unwrap_or_default(),
            campus: s.campus.as_deref().unwrap_or_default(),
            college: s.college.as_deref().unwrap_or_default(),
            program: s.program.as_deref().unwrap_or_default(),
            major: s.major.as_deref().unwrap_or_default(),
            year_level: s.year_level.map(|y| y.to_string()).unwrap_or_default(),
            section: s.section.as_deref().unwrap_or_default(),
            contact_name: join_present(
                &[
                    s.contact_first_name.as_deref(),
                    s.contact_middle_name.as_deref(),
                    s.contact_last_name.as_deref(),
                ],
                " ",
            ),
            contact_relationship: s.contact_relationship.as_deref().unwrap_or_default(),
            contact_number: s.contact_number.as_deref().unwrap_or_default(),
            address: join_present(
                &[s.barangay.as_deref(), s.city.as_deref(), s.province.as_deref()],
                ", ",
            ),
            zip_code: s.zip_code.as_deref().unwrap_or_default(),
            picture: s.picture.as_deref().unwrap_or_default(),
            signature: s.signature.as_deref().unwrap_or_default(),
        })
        .collect()
}

fn build_college_rows(campus: &str, colleges: &[College]) -> Vec<CollegeRow> {
    colleges
        .iter()
        .map(|c| CollegeRow {
            campus: campus.to_string(),
            code: c.code.clone(),
            name: c.name.clone(),
            section_length: c.section_length,
            programs: c.programs.len(),
        })
        .collect()
}

fn build_program_rows(programs: &[Program]) -> Vec<ProgramRow> {
    programs
        .iter()
        .map(|p| ProgramRow {
            name: p.name.clone(),
            majors: if p.has_majors() {
                p.majors.join(", ")
            } else {
                "-".to_string()
            },
        })
        .collect()
}

// -- Generic rendering --

fn render<R: Tabled + Serialize>(rows: Vec<R>, format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", Table::new(rows)),
        OutputFormat::Markdown => {
            let mut table = Table::new(rows);
            table.with(Style::markdown());
            println!("{}", table);
        }
        OutputFormat::Csv => write_csv(&rows, std::io::stdout())?,
        OutputFormat::Json => print_json(&rows),
    }
    Ok(())
}

fn write_csv<R: Serialize, W: Write>(rows: &[R], writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn print_students(students: &[Student], format: &OutputFormat) -> Result<()> {
    match format {
        // full records, not the condensed table rows
        OutputFormat::Json => {
            print_json(&students);
            Ok(())
        }
        _ => render(build_student_rows(students), format),
    }
}

pub fn print_colleges(campus: &str, colleges: &[College], format: &OutputFormat) -> Result<()> {
    render(build_college_rows(campus, colleges), format)
}

pub fn print_programs(programs: &[Program], format: &OutputFormat) -> Result<()> {
    render(build_program_rows(programs), format)
}

/// Writes the export layout as CSV.
pub fn write_export_csv<W: Write>(students: &[Student], writer: W) -> Result<()> {
    write_csv(&build_export_rows(students), writer)
}

pub fn print_notifications(notifications: &[Notification]) {
    for n in notifications {
        eprintln!("{}", n);
    }
}

// -- JSON output --

pub fn print_json<T: serde::Serialize>(data: &T) {
    match serde_json::to_string_pretty(data) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize to JSON: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campusid_lib::CampusDirectory;

    fn load_students_fixture() -> Vec<Student> {
        let json_str = include_str!("../../campusid_api/tests/fixtures/students_page.json");
        let resp: serde_json::Value = serde_json::from_str(json_str).unwrap();
        serde_json::from_value(resp["data"].clone()).unwrap()
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!(OutputFormat::parse("json"), OutputFormat::Json);
        assert_eq!(OutputFormat::parse("md"), OutputFormat::Markdown);
        assert_eq!(OutputFormat::parse("anything"), OutputFormat::Table);
    }

    #[test]
    fn test_build_student_rows_mapping() {
        let students = load_students_fixture();
        let rows = build_student_rows(&students);
        assert_eq!(rows.len(), 2);

        let row = &rows[0];
        assert_eq!(row.id_number, "21-00123");
        assert_eq!(row.name, "Dela Cruz, Juan Santos");
        assert_eq!(row.id_type, "new");
        assert_eq!(row.year_section, "3-A");
        assert_eq!(row.completed, "yes");
        assert_eq!(row.exported, "no");
        assert_eq!(row.updated, "2024-06-05");

        assert_eq!(rows[1].id_type, "replacement");
        assert_eq!(rows[1].exported, "yes");
    }

    #[test]
    fn test_export_csv_layout() {
        let students = load_students_fixture();
        let mut buf = Vec::new();
        write_export_csv(&students, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("id_number,id_type,last_name,first_name"));
        let first = lines.next().unwrap();
        assert!(first.contains("Maria Dela Cruz"));
        assert!(first.contains("\"BGY. NO. 1, SAN LORENZO, LAOAG CITY, ILOCOS NORTE\""));
        assert_eq!(lines.count(), 1);
    }

    #[test]
    fn test_program_rows_mark_missing_majors() {
        let dir = CampusDirectory::embedded().unwrap();
        let cte = dir.college("Main", "CTE").unwrap();
        let rows = build_program_rows(&cte.programs);
        assert!(rows.iter().any(|r| r.majors == "-"));
        assert!(rows.iter().any(|r| r.majors.contains("Mathematics")));
    }

    #[test]
    fn test_college_rows_carry_section_length() {
        let dir = CampusDirectory::embedded().unwrap();
        let main = dir.campus("Main").unwrap();
        let rows = build_college_rows("Main", &main.colleges);
        let ccs = rows.iter().find(|r| r.code == "CCS").unwrap();
        assert_eq!(ccs.section_length, 2);
        assert_eq!(ccs.campus, "Main");
    }
}
