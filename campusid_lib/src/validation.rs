use std::sync::OnceLock;

use campusid_api::types::{MediaPayload, StudentDetails, ValidationErrors};
use chrono::NaiveDate;
use regex::Regex;

use crate::directory::{CampusDirectory, College};
use crate::error::CampusIdError;

pub const MAX_SEARCH_LENGTH: usize = 100;
pub const MAX_NAME_LENGTH: usize = 60;
pub const MAX_PER_PAGE: u32 = 100;
pub const MAX_YEAR_LEVEL: u8 = 5;

/// Minimum Jaro-Winkler similarity for a fuzzy college match.
const COLLEGE_MATCH_THRESHOLD: f64 = 0.85;

fn cached(cell: &'static OnceLock<Option<Regex>>, pattern: &str) -> Option<&'static Regex> {
    cell.get_or_init(|| Regex::new(pattern).ok()).as_ref()
}

fn id_number_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    cached(&RE, r"^[0-9A-Za-z][0-9A-Za-z-]{0,19}$")
}

fn mobile_number_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    cached(&RE, r"^(09|\+639)\d{9}$")
}

fn zip_code_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    cached(&RE, r"^\d{4}$")
}

fn is_match(re: Option<&Regex>, input: &str) -> bool {
    re.is_some_and(|re| re.is_match(input))
}

/// Strip ASCII control characters (0x00-0x1F except space 0x20), trim whitespace,
/// and enforce a byte-length limit.
pub fn sanitize_text(input: &str, max_len: usize) -> Result<String, CampusIdError> {
    if input.len() > max_len {
        return Err(CampusIdError::InvalidInput(format!(
            "input exceeds maximum length of {} bytes",
            max_len
        )));
    }
    let sanitized: String = input
        .chars()
        .filter(|c| !c.is_ascii_control() || *c == ' ')
        .collect::<String>()
        .trim()
        .to_string();
    if sanitized.is_empty() {
        return Err(CampusIdError::InvalidInput(
            "input is empty after sanitization".to_string(),
        ));
    }
    Ok(sanitized)
}

/// Validate a search string: enforce length, strip control chars, trim.
pub fn validate_search(input: &str) -> Result<String, CampusIdError> {
    sanitize_text(input, MAX_SEARCH_LENGTH)
}

/// Validate a YYYY-MM-DD date string.
pub fn validate_date(input: &str) -> Result<NaiveDate, CampusIdError> {
    let trimmed = input.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").map_err(|_| {
        CampusIdError::InvalidInput(format!(
            "invalid date '{}'. Expected format: YYYY-MM-DD (e.g., 2024-06-01)",
            trimmed
        ))
    })
}

/// Both ends set and `from` after `to` is rejected.
pub fn validate_date_range(
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<(), CampusIdError> {
    match (from, to) {
        (Some(from), Some(to)) if from > to => Err(CampusIdError::InvalidInput(format!(
            "start date {} is after end date {}",
            from, to
        ))),
        _ => Ok(()),
    }
}

/// Validate page size (must be 1..=100).
pub fn validate_per_page(per_page: u32) -> Result<u32, CampusIdError> {
    if !(1..=MAX_PER_PAGE).contains(&per_page) {
        return Err(CampusIdError::InvalidInput(format!(
            "per_page must be between 1 and {}",
            MAX_PER_PAGE
        )));
    }
    Ok(per_page)
}

pub fn validate_year_level(year_level: u8) -> Result<u8, CampusIdError> {
    if !(1..=MAX_YEAR_LEVEL).contains(&year_level) {
        return Err(CampusIdError::InvalidInput(format!(
            "year level must be between 1 and {}, got {}",
            MAX_YEAR_LEVEL, year_level
        )));
    }
    Ok(year_level)
}

/// Resolve a college from its code or full name, case-insensitive, falling
/// back to the closest name by Jaro-Winkler similarity.
pub fn resolve_college<'a>(
    input: &str,
    directory: &'a CampusDirectory,
) -> Result<&'a College, CampusIdError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(CampusIdError::InvalidInput(
            "college name is empty".to_string(),
        ));
    }
    let lower = trimmed.to_lowercase();
    let colleges = directory.all_colleges();

    if let Some(college) = colleges.iter().find(|c| c.code.to_lowercase() == lower) {
        return Ok(college);
    }
    if let Some(college) = colleges.iter().find(|c| c.name.to_lowercase() == lower) {
        return Ok(college);
    }

    let best = colleges
        .iter()
        .map(|c| (c, strsim::jaro_winkler(&c.name.to_lowercase(), &lower)))
        .max_by(|a, b| a.1.total_cmp(&b.1));
    if let Some((college, score)) = best {
        if score >= COLLEGE_MATCH_THRESHOLD {
            return Ok(college);
        }
    }

    let codes: Vec<&str> = colleges.iter().map(|c| c.code.as_str()).collect();
    Err(CampusIdError::InvalidInput(format!(
        "unknown college '{}'. Valid codes: {}",
        trimmed,
        codes.join(", ")
    )))
}

fn blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

fn require(errors: &mut ValidationErrors, field: &str, value: Option<&str>, label: &str) {
    if blank(value) {
        errors.add(field, format!("The {} field is required.", label));
    }
}

fn check_length(errors: &mut ValidationErrors, field: &str, value: Option<&str>, label: &str) {
    if let Some(value) = value {
        if value.chars().count() > MAX_NAME_LENGTH {
            errors.add(
                field,
                format!(
                    "The {} must not be greater than {} characters.",
                    label, MAX_NAME_LENGTH
                ),
            );
        }
    }
}

/// Local checks for the details slice (wizard step one), mirroring the
/// backend's rules so obvious mistakes never leave the machine.
pub fn validate_details(details: &StudentDetails, directory: &CampusDirectory) -> ValidationErrors {
    let mut errors = ValidationErrors::new();

    require(&mut errors, "id_number", Some(&details.id_number), "ID number");
    if !blank(Some(&details.id_number)) && !is_match(id_number_re(), details.id_number.trim()) {
        errors.add("id_number", "The ID number format is invalid.");
    }
    if details.id_type.is_none() {
        errors.add("id_type", "The ID type field is required.");
    }

    require(&mut errors, "first_name", Some(&details.first_name), "first name");
    require(&mut errors, "last_name", Some(&details.last_name), "last name");
    check_length(&mut errors, "first_name", Some(&details.first_name), "first name");
    check_length(&mut errors, "middle_name", details.middle_name.as_deref(), "middle name");
    check_length(&mut errors, "last_name", Some(&details.last_name), "last name");

    validate_academic(details, directory, &mut errors);

    require(&mut errors, "contact_first_name", details.contact_first_name.as_deref(), "contact first name");
    require(&mut errors, "contact_last_name", details.contact_last_name.as_deref(), "contact last name");
    require(&mut errors, "contact_relationship", details.contact_relationship.as_deref(), "relationship");
    match details.contact_number.as_deref().map(str::trim) {
        Some(number) if !number.is_empty() => {
            if !is_match(mobile_number_re(), number) {
                errors.add(
                    "contact_number",
                    "The contact number must be a mobile number like 09171234567.",
                );
            }
        }
        _ => errors.add("contact_number", "The contact number field is required."),
    }

    require(&mut errors, "province", details.province.as_deref(), "province");
    require(&mut errors, "city", details.city.as_deref(), "city");
    require(&mut errors, "barangay", details.barangay.as_deref(), "barangay");
    match details.zip_code.as_deref().map(str::trim) {
        Some(zip) if !zip.is_empty() => {
            if !is_match(zip_code_re(), zip) {
                errors.add("zip_code", "The zip code must be 4 digits.");
            }
        }
        _ => errors.add("zip_code", "The zip code field is required."),
    }

    errors
}

fn validate_academic(
    details: &StudentDetails,
    directory: &CampusDirectory,
    errors: &mut ValidationErrors,
) {
    match details.year_level {
        None => errors.add("year_level", "The year level field is required."),
        Some(level) if validate_year_level(level).is_err() => errors.add(
            "year_level",
            format!("The year level must be between 1 and {}.", MAX_YEAR_LEVEL),
        ),
        Some(_) => {}
    }

    let (Some(campus), Some(college), Some(program)) = (
        details.campus.as_deref().filter(|v| !v.trim().is_empty()),
        details.college.as_deref().filter(|v| !v.trim().is_empty()),
        details.program.as_deref().filter(|v| !v.trim().is_empty()),
    ) else {
        require(errors, "campus", details.campus.as_deref(), "campus");
        require(errors, "college", details.college.as_deref(), "college");
        require(errors, "program", details.program.as_deref(), "program");
        require(errors, "section", details.section.as_deref(), "section");
        return;
    };

    let Some(college_entry) = directory.college(campus, college) else {
        errors.add("college", "The selected college is invalid.");
        return;
    };

    match college_entry.program(program) {
        None => errors.add("program", "The selected program is invalid."),
        Some(entry) if entry.has_majors() => match details.major.as_deref() {
            Some(major) if entry.majors.iter().any(|m| m == major) => {}
            Some(major) if !major.trim().is_empty() => {
                errors.add("major", "The selected major is invalid.")
            }
            _ => errors.add("major", "The major field is required."),
        },
        Some(_) => {
            if !blank(details.major.as_deref()) {
                errors.add("major", "The selected program has no majors.");
            }
        }
    }

    match details.section.as_deref().map(str::trim) {
        Some(section) if !section.is_empty() => {
            let expected = college_entry.section_length;
            let valid = section.chars().count() == expected
                && section.chars().all(|c| c.is_ascii_alphanumeric());
            if !valid {
                errors.add(
                    "section",
                    format!("The section must be {} character(s).", expected),
                );
            }
        }
        _ => errors.add("section", "The section field is required."),
    }
}

/// Local checks for the media slice (wizard step two).
pub fn validate_media(media: &MediaPayload) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    require(&mut errors, "id_number", Some(&media.id_number), "ID number");
    if media.picture.is_empty() {
        errors.add("picture", "The picture field is required.");
    }
    if media.signature.is_empty() {
        errors.add("signature", "The signature field is required.");
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use campusid_api::types::{IdType, NamedImage};

    fn directory() -> CampusDirectory {
        CampusDirectory::embedded().unwrap()
    }

    fn valid_details() -> StudentDetails {
        StudentDetails {
            id_number: "21-00123".to_string(),
            id_type: Some(IdType::New),
            first_name: "Juan".to_string(),
            middle_name: Some("Santos".to_string()),
            last_name: "Dela Cruz".to_string(),
            campus: Some("Main".to_string()),
            college: Some("CCS".to_string()),
            program: Some("Bachelor of Science in Information Technology".to_string()),
            year_level: Some(3),
            section: Some("3A".to_string()),
            contact_first_name: Some("Maria".to_string()),
            contact_last_name: Some("Dela Cruz".to_string()),
            contact_relationship: Some("Mother".to_string()),
            contact_number: Some("09171234567".to_string()),
            province: Some("ILOCOS NORTE".to_string()),
            city: Some("LAOAG CITY".to_string()),
            barangay: Some("BGY. NO. 1, SAN LORENZO".to_string()),
            zip_code: Some("2900".to_string()),
            ..StudentDetails::default()
        }
    }

    // -- Text --

    #[test]
    fn sanitize_strips_control_chars() {
        assert_eq!(sanitize_text("  dela\u{7}cruz \n", 100).unwrap(), "delacruz");
    }

    #[test]
    fn sanitize_rejects_empty_and_long() {
        assert!(sanitize_text("   ", 100).is_err());
        assert!(validate_search(&"x".repeat(MAX_SEARCH_LENGTH + 1)).is_err());
    }

    // -- Dates and paging --

    #[test]
    fn date_parsing() {
        assert_eq!(
            validate_date("2024-06-01").unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
        );
        assert!(validate_date("06/01/2024").is_err());
    }

    #[test]
    fn reversed_date_range_is_rejected() {
        let a = NaiveDate::from_ymd_opt(2024, 6, 1);
        let b = NaiveDate::from_ymd_opt(2024, 6, 30);
        assert!(validate_date_range(a, b).is_ok());
        assert!(validate_date_range(b, a).is_err());
        assert!(validate_date_range(None, a).is_ok());
    }

    #[test]
    fn per_page_bounds() {
        assert!(validate_per_page(0).is_err());
        assert_eq!(validate_per_page(25).unwrap(), 25);
        assert!(validate_per_page(101).is_err());
    }

    // -- College resolution --

    #[test]
    fn college_by_code_or_name() {
        let dir = directory();
        assert_eq!(resolve_college("ccs", &dir).unwrap().code, "CCS");
        assert_eq!(
            resolve_college("college of teacher education", &dir).unwrap().code,
            "CTE"
        );
    }

    #[test]
    fn college_fuzzy_match() {
        let dir = directory();
        assert_eq!(
            resolve_college("College of Computng Studies", &dir).unwrap().code,
            "CCS"
        );
    }

    #[test]
    fn college_unknown() {
        let err = resolve_college("xyz", &directory()).unwrap_err();
        assert!(err.to_string().contains("Valid codes"));
    }

    // -- Details --

    #[test]
    fn valid_details_pass() {
        let errors = validate_details(&valid_details(), &directory());
        assert!(errors.is_empty(), "{:?}", errors);
    }

    #[test]
    fn major_required_iff_program_has_majors() {
        let dir = directory();
        let mut details = valid_details();
        details.college = Some("CTE".to_string());
        details.section = Some("B".to_string());
        details.program = Some("Bachelor of Secondary Education".to_string());
        assert_eq!(
            validate_details(&details, &dir).field("major"),
            ["The major field is required."]
        );

        details.major = Some("Mathematics".to_string());
        assert!(validate_details(&details, &dir).is_empty());

        details.program = Some("Bachelor of Elementary Education".to_string());
        assert!(!validate_details(&details, &dir).field("major").is_empty());
        details.major = None;
        assert!(validate_details(&details, &dir).is_empty());
    }

    #[test]
    fn section_length_depends_on_college() {
        let dir = directory();
        let mut details = valid_details();
        details.section = Some("A".to_string());
        assert_eq!(
            validate_details(&details, &dir).field("section"),
            ["The section must be 2 character(s)."]
        );

        details.college = Some("CBA".to_string());
        details.program = dir
            .college("Main", "CBA")
            .and_then(|c| c.programs.first())
            .map(|p| p.name.clone());
        assert!(validate_details(&details, &dir).field("section").is_empty());
        details.section = Some("AB".to_string());
        assert!(!validate_details(&details, &dir).field("section").is_empty());
    }

    #[test]
    fn contact_and_address_formats() {
        let dir = directory();
        let mut details = valid_details();
        details.contact_number = Some("+639171234567".to_string());
        assert!(validate_details(&details, &dir).is_empty());

        details.contact_number = Some("1234".to_string());
        details.zip_code = Some("29000".to_string());
        let errors = validate_details(&details, &dir);
        assert_eq!(errors.field("contact_number").len(), 1);
        assert_eq!(errors.field("zip_code"), ["The zip code must be 4 digits."]);
    }

    #[test]
    fn empty_form_reports_every_required_field() {
        let errors = validate_details(&StudentDetails::default(), &directory());
        for field in [
            "id_number",
            "id_type",
            "first_name",
            "last_name",
            "campus",
            "college",
            "program",
            "year_level",
            "section",
            "contact_number",
            "province",
            "zip_code",
        ] {
            assert!(!errors.field(field).is_empty(), "missing error for {}", field);
        }
    }

    #[test]
    fn year_level_range() {
        let mut details = valid_details();
        details.year_level = Some(7);
        assert!(!validate_details(&details, &directory()).field("year_level").is_empty());
    }

    // -- Media --

    #[test]
    fn media_requires_both_images() {
        let media = MediaPayload {
            id_number: "21-00123".to_string(),
            picture: NamedImage::jpeg("21-00123.jpg", vec![1, 2, 3]),
            signature: NamedImage::jpeg("21-00123_signature.jpg", Vec::new()),
        };
        let errors = validate_media(&media);
        assert!(errors.field("picture").is_empty());
        assert_eq!(errors.field("signature"), ["The signature field is required."]);
    }
}
