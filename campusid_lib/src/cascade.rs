//! Cascading selectors: campus → college → program → major and
//! province → city → barangay.
//!
//! Choosing a value at one level clears every level below it. A level's
//! options are empty (the control is disabled) until its parent is chosen.

use std::sync::Arc;

use serde::Serialize;

use crate::directory::{CampusDirectory, LocationDirectory, Program};
use crate::error::CampusIdError;

/// One entry of a dropdown: the submitted value and what the user sees.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }

    /// An option whose label is its value.
    pub fn plain(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            label: value.clone(),
            value,
        }
    }
}

fn ensure_option(options: &[SelectOption], value: &str, level: &str) -> Result<(), CampusIdError> {
    if options.iter().any(|o| o.value == value) {
        Ok(())
    } else {
        Err(CampusIdError::InvalidInput(format!(
            "'{}' is not an available {}",
            value, level
        )))
    }
}

/// Campus → college → program → major selection state.
#[derive(Debug, Clone)]
pub struct AcademicSelection {
    directory: Arc<CampusDirectory>,
    campus: Option<String>,
    college: Option<String>,
    program: Option<String>,
    major: Option<String>,
    has_major: bool,
}

impl AcademicSelection {
    pub fn new(directory: Arc<CampusDirectory>) -> Self {
        Self {
            directory,
            campus: None,
            college: None,
            program: None,
            major: None,
            has_major: false,
        }
    }

    pub fn directory(&self) -> &CampusDirectory {
        &self.directory
    }

    pub fn campus(&self) -> Option<&str> {
        self.campus.as_deref()
    }

    pub fn college(&self) -> Option<&str> {
        self.college.as_deref()
    }

    pub fn program(&self) -> Option<&str> {
        self.program.as_deref()
    }

    pub fn major(&self) -> Option<&str> {
        self.major.as_deref()
    }

    pub fn campus_options(&self) -> Vec<SelectOption> {
        self.directory
            .campuses()
            .iter()
            .map(|c| SelectOption::plain(c.name.clone()))
            .collect()
    }

    pub fn college_options(&self) -> Vec<SelectOption> {
        self.campus
            .as_deref()
            .and_then(|campus| self.directory.campus(campus))
            .map(|campus| {
                campus
                    .colleges
                    .iter()
                    .map(|c| SelectOption::new(c.code.clone(), c.name.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn program_options(&self) -> Vec<SelectOption> {
        match (self.campus.as_deref(), self.college.as_deref()) {
            (Some(campus), Some(college)) => self
                .directory
                .college(campus, college)
                .map(|c| {
                    c.programs
                        .iter()
                        .map(|p| SelectOption::plain(p.name.clone()))
                        .collect()
                })
                .unwrap_or_default(),
            _ => Vec::new(),
        }
    }

    pub fn major_options(&self) -> Vec<SelectOption> {
        self.selected_program()
            .map(|p| p.majors.iter().cloned().map(SelectOption::plain).collect())
            .unwrap_or_default()
    }

    fn selected_program(&self) -> Option<&Program> {
        self.directory.program(
            self.campus.as_deref()?,
            self.college.as_deref()?,
            self.program.as_deref()?,
        )
    }

    /// Chooses a campus and clears college, program and major.
    pub fn select_campus(&mut self, campus: &str) -> Result<(), CampusIdError> {
        ensure_option(&self.campus_options(), campus, "campus")?;
        self.campus = Some(campus.to_string());
        self.college = None;
        self.clear_program();
        Ok(())
    }

    /// Chooses a college (by code) and clears program and major.
    pub fn select_college(&mut self, college: &str) -> Result<(), CampusIdError> {
        ensure_option(&self.college_options(), college, "college")?;
        self.college = Some(college.to_string());
        self.clear_program();
        Ok(())
    }

    /// Chooses a program, clears the major and recomputes `has_major`.
    pub fn select_program(&mut self, program: &str) -> Result<(), CampusIdError> {
        ensure_option(&self.program_options(), program, "program")?;
        self.program = Some(program.to_string());
        self.major = None;
        self.has_major = self.selected_program().is_some_and(Program::has_majors);
        Ok(())
    }

    pub fn select_major(&mut self, major: &str) -> Result<(), CampusIdError> {
        ensure_option(&self.major_options(), major, "major")?;
        self.major = Some(major.to_string());
        Ok(())
    }

    fn clear_program(&mut self) {
        self.program = None;
        self.major = None;
        self.has_major = false;
    }

    pub fn clear(&mut self) {
        self.campus = None;
        self.college = None;
        self.clear_program();
    }

    /// True iff the selected program has a non-empty majors list.
    pub fn has_major(&self) -> bool {
        self.has_major
    }

    pub fn college_enabled(&self) -> bool {
        self.campus.is_some()
    }

    pub fn program_enabled(&self) -> bool {
        self.college.is_some()
    }

    pub fn major_enabled(&self) -> bool {
        self.has_major
    }

    pub fn major_required(&self) -> bool {
        self.has_major
    }

    /// Required section code length for the selected college.
    pub fn section_length(&self) -> usize {
        match (self.campus.as_deref(), self.college.as_deref()) {
            (Some(campus), Some(college)) => self
                .directory
                .college(campus, college)
                .map(|c| c.section_length)
                .unwrap_or(1),
            _ => 1,
        }
    }
}

/// Province → city → barangay selection state, plus the free-text zip code.
#[derive(Debug, Clone)]
pub struct AddressSelection {
    directory: Arc<LocationDirectory>,
    province: Option<String>,
    city: Option<String>,
    barangay: Option<String>,
    zip_code: Option<String>,
}

impl AddressSelection {
    pub fn new(directory: Arc<LocationDirectory>) -> Self {
        Self {
            directory,
            province: None,
            city: None,
            barangay: None,
            zip_code: None,
        }
    }

    pub fn province(&self) -> Option<&str> {
        self.province.as_deref()
    }

    pub fn city(&self) -> Option<&str> {
        self.city.as_deref()
    }

    pub fn barangay(&self) -> Option<&str> {
        self.barangay.as_deref()
    }

    pub fn zip_code(&self) -> Option<&str> {
        self.zip_code.as_deref()
    }

    pub fn province_options(&self) -> Vec<SelectOption> {
        self.directory
            .provinces()
            .into_iter()
            .map(SelectOption::plain)
            .collect()
    }

    pub fn city_options(&self) -> Vec<SelectOption> {
        self.province
            .as_deref()
            .and_then(|p| self.directory.cities(p))
            .map(|cities| cities.into_iter().map(SelectOption::plain).collect())
            .unwrap_or_default()
    }

    pub fn barangay_options(&self) -> Vec<SelectOption> {
        match (self.province.as_deref(), self.city.as_deref()) {
            (Some(province), Some(city)) => self
                .directory
                .barangays(province, city)
                .map(|list| list.iter().cloned().map(SelectOption::plain).collect())
                .unwrap_or_default(),
            _ => Vec::new(),
        }
    }

    /// Chooses a province and clears city and barangay.
    pub fn select_province(&mut self, province: &str) -> Result<(), CampusIdError> {
        ensure_option(&self.province_options(), province, "province")?;
        self.province = Some(province.to_string());
        self.city = None;
        self.barangay = None;
        Ok(())
    }

    /// Chooses a city/municipality and clears the barangay.
    pub fn select_city(&mut self, city: &str) -> Result<(), CampusIdError> {
        ensure_option(&self.city_options(), city, "city/municipality")?;
        self.city = Some(city.to_string());
        self.barangay = None;
        Ok(())
    }

    pub fn select_barangay(&mut self, barangay: &str) -> Result<(), CampusIdError> {
        ensure_option(&self.barangay_options(), barangay, "barangay")?;
        self.barangay = Some(barangay.to_string());
        Ok(())
    }

    pub fn set_zip_code(&mut self, zip_code: Option<String>) {
        self.zip_code = zip_code.filter(|z| !z.trim().is_empty());
    }

    pub fn city_enabled(&self) -> bool {
        self.province.is_some()
    }

    pub fn barangay_enabled(&self) -> bool {
        self.city.is_some()
    }

    pub fn clear(&mut self) {
        self.province = None;
        self.city = None;
        self.barangay = None;
        self.zip_code = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campusid_api::types::{BarangayRow, MunicipalityRow, ProvinceRow};

    const BSED: &str = "Bachelor of Secondary Education";
    const BSIT: &str = "Bachelor of Science in Information Technology";

    fn academic() -> AcademicSelection {
        AcademicSelection::new(Arc::new(CampusDirectory::embedded().unwrap()))
    }

    fn locations() -> Arc<LocationDirectory> {
        let provinces = vec![
            ProvinceRow {
                province_id: 1,
                region_id: 1,
                province_name: "ILOCOS NORTE".to_string(),
            },
            ProvinceRow {
                province_id: 2,
                region_id: 14,
                province_name: "ABRA".to_string(),
            },
        ];
        let municipalities = vec![
            MunicipalityRow {
                municipality_id: 10,
                province_id: 1,
                municipality_name: "LAOAG CITY".to_string(),
            },
            MunicipalityRow {
                municipality_id: 20,
                province_id: 2,
                municipality_name: "BANGUED".to_string(),
            },
        ];
        let barangays = vec![
            BarangayRow {
                barangay_id: 100,
                municipality_id: 10,
                barangay_name: "BGY. NO. 1, SAN LORENZO".to_string(),
            },
            BarangayRow {
                barangay_id: 200,
                municipality_id: 20,
                barangay_name: "AGTANGAO".to_string(),
            },
        ];
        Arc::new(LocationDirectory::from_tables(
            &provinces,
            &municipalities,
            &barangays,
        ))
    }

    #[test]
    fn lower_levels_start_disabled() {
        let sel = academic();
        assert!(!sel.campus_options().is_empty());
        assert!(sel.college_options().is_empty());
        assert!(!sel.college_enabled());
        assert!(!sel.program_enabled());
        assert!(!sel.major_enabled());
    }

    #[test]
    fn college_options_carry_code_and_name() {
        let mut sel = academic();
        sel.select_campus("Main").unwrap();
        let ccs = sel
            .college_options()
            .into_iter()
            .find(|o| o.value == "CCS")
            .unwrap();
        assert_eq!(ccs.label, "College of Computing Studies");
    }

    #[test]
    fn program_without_majors_disables_major() {
        let mut sel = academic();
        sel.select_campus("Main").unwrap();
        sel.select_college("CCS").unwrap();
        sel.select_program(BSIT).unwrap();
        assert!(!sel.has_major());
        assert!(!sel.major_enabled());
        assert!(!sel.major_required());
        assert!(sel.major_options().is_empty());
        assert!(sel.select_major("Mathematics").is_err());
    }

    #[test]
    fn program_with_majors_requires_major() {
        let mut sel = academic();
        sel.select_campus("Main").unwrap();
        sel.select_college("CTE").unwrap();
        sel.select_program(BSED).unwrap();
        assert!(sel.has_major());
        assert!(sel.major_required());
        sel.select_major("Mathematics").unwrap();
        assert_eq!(sel.major(), Some("Mathematics"));
    }

    #[test]
    fn changing_campus_resets_everything_below() {
        let mut sel = academic();
        sel.select_campus("Main").unwrap();
        sel.select_college("CTE").unwrap();
        sel.select_program(BSED).unwrap();
        sel.select_major("English").unwrap();

        sel.select_campus("Extension").unwrap();
        assert_eq!(sel.campus(), Some("Extension"));
        assert_eq!(sel.college(), None);
        assert_eq!(sel.program(), None);
        assert_eq!(sel.major(), None);
        assert!(!sel.program_enabled());
        assert!(!sel.major_enabled());
        assert!(sel.program_options().is_empty());
    }

    #[test]
    fn reselecting_program_keeps_upper_levels_and_clears_major() {
        let mut sel = academic();
        sel.select_campus("Main").unwrap();
        sel.select_college("CTE").unwrap();
        sel.select_program(BSED).unwrap();
        sel.select_major("Science").unwrap();

        sel.select_program(BSED).unwrap();
        assert_eq!(sel.campus(), Some("Main"));
        assert_eq!(sel.college(), Some("CTE"));
        assert_eq!(sel.program(), Some(BSED));
        assert_eq!(sel.major(), None);
        assert!(sel.has_major());
    }

    #[test]
    fn unknown_value_leaves_state_untouched() {
        let mut sel = academic();
        sel.select_campus("Main").unwrap();
        sel.select_college("CCS").unwrap();
        assert!(sel.select_college("NOPE").is_err());
        assert_eq!(sel.college(), Some("CCS"));
    }

    #[test]
    fn section_length_follows_college() {
        let mut sel = academic();
        assert_eq!(sel.section_length(), 1);
        sel.select_campus("Main").unwrap();
        sel.select_college("CCS").unwrap();
        assert_eq!(sel.section_length(), 2);
        sel.select_college("CAS").unwrap();
        assert_eq!(sel.section_length(), 1);
    }

    #[test]
    fn changing_province_resets_city_and_barangay() {
        let mut addr = AddressSelection::new(locations());
        assert!(!addr.city_enabled());
        addr.select_province("ILOCOS NORTE").unwrap();
        addr.select_city("LAOAG CITY").unwrap();
        addr.select_barangay("BGY. NO. 1, SAN LORENZO").unwrap();

        addr.select_province("ABRA").unwrap();
        assert_eq!(addr.city(), None);
        assert_eq!(addr.barangay(), None);
        assert!(addr.city_enabled());
        assert!(!addr.barangay_enabled());
        assert!(addr.barangay_options().is_empty());
        assert_eq!(addr.city_options(), vec![SelectOption::plain("BANGUED")]);
    }

    #[test]
    fn barangay_must_belong_to_city() {
        let mut addr = AddressSelection::new(locations());
        addr.select_province("ABRA").unwrap();
        addr.select_city("BANGUED").unwrap();
        assert!(addr.select_barangay("BGY. NO. 1, SAN LORENZO").is_err());
        addr.select_barangay("AGTANGAO").unwrap();
        addr.set_zip_code(Some("2800".to_string()));
        assert_eq!(addr.zip_code(), Some("2800"));
        addr.set_zip_code(Some("  ".to_string()));
        assert_eq!(addr.zip_code(), None);
    }
}
