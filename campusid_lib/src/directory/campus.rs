use serde::Deserialize;

use crate::error::CampusIdError;

fn default_section_length() -> usize {
    1
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Program {
    pub name: String,
    #[serde(default)]
    pub majors: Vec<String>,
}

impl Program {
    pub fn has_majors(&self) -> bool {
        !self.majors.is_empty()
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct College {
    pub code: String,
    pub name: String,
    #[serde(default = "default_section_length")]
    pub section_length: usize,
    #[serde(default, rename = "program")]
    pub programs: Vec<Program>,
}

impl College {
    pub fn program(&self, name: &str) -> Option<&Program> {
        self.programs.iter().find(|p| p.name == name)
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Campus {
    pub name: String,
    #[serde(default, rename = "college")]
    pub colleges: Vec<College>,
}

impl Campus {
    pub fn college(&self, code: &str) -> Option<&College> {
        self.colleges.iter().find(|c| c.code == code)
    }
}

/// Static campus → college → program → majors tree.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct CampusDirectory {
    #[serde(rename = "campus")]
    campuses: Vec<Campus>,
}

impl CampusDirectory {
    /// Load the directory shipped with the crate.
    ///
    /// The TOML file is included at compile time via include_str!.
    pub fn embedded() -> Result<Self, CampusIdError> {
        Self::from_toml(include_str!("../../../seed_data/campuses.toml"))
    }

    pub fn from_toml(content: &str) -> Result<Self, CampusIdError> {
        let directory: CampusDirectory = toml::from_str(content)?;
        Ok(directory)
    }

    pub fn campuses(&self) -> &[Campus] {
        &self.campuses
    }

    pub fn campus(&self, name: &str) -> Option<&Campus> {
        self.campuses.iter().find(|c| c.name == name)
    }

    pub fn college(&self, campus: &str, code: &str) -> Option<&College> {
        self.campus(campus)?.college(code)
    }

    pub fn program(&self, campus: &str, college: &str, program: &str) -> Option<&Program> {
        self.college(campus, college)?.program(program)
    }

    /// Every distinct college across campuses, first occurrence wins.
    pub fn all_colleges(&self) -> Vec<&College> {
        let mut seen: Vec<&College> = Vec::new();
        for college in self.campuses.iter().flat_map(|c| c.colleges.iter()) {
            if !seen.iter().any(|s| s.code == college.code) {
                seen.push(college);
            }
        }
        seen
    }

    /// Section code length for a college code (1 when unknown).
    pub fn section_length(&self, college_code: &str) -> usize {
        self.all_colleges()
            .into_iter()
            .find(|c| c.code == college_code)
            .map(|c| c.section_length)
            .unwrap_or_else(default_section_length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_directory_parses() {
        let dir = CampusDirectory::embedded().unwrap();
        assert!(dir.campuses().len() >= 2);
        assert!(dir.campus("Main").is_some());
    }

    #[test]
    fn programs_with_and_without_majors() {
        let dir = CampusDirectory::embedded().unwrap();
        let bsed = dir
            .program("Main", "CTE", "Bachelor of Secondary Education")
            .unwrap();
        assert!(bsed.has_majors());
        assert_eq!(bsed.majors[0], "English");
        let bsit = dir
            .program("Main", "CCS", "Bachelor of Science in Information Technology")
            .unwrap();
        assert!(!bsit.has_majors());
    }

    #[test]
    fn section_length_depends_on_college() {
        let dir = CampusDirectory::embedded().unwrap();
        assert_eq!(dir.section_length("CCS"), 2);
        assert_eq!(dir.section_length("CTE"), 1);
        assert_eq!(dir.section_length("XYZ"), 1);
    }

    #[test]
    fn colleges_are_deduplicated_across_campuses() {
        let dir = CampusDirectory::embedded().unwrap();
        let codes: Vec<&str> = dir.all_colleges().iter().map(|c| c.code.as_str()).collect();
        assert_eq!(codes.iter().filter(|c| **c == "CTE").count(), 1);
        assert!(codes.contains(&"CAF"));
    }

    #[test]
    fn custom_directory_from_toml() {
        let dir = CampusDirectory::from_toml(
            r#"
            [[campus]]
            name = "Annex"
            [[campus.college]]
            code = "CN"
            name = "College of Nursing"
            [[campus.college.program]]
            name = "Bachelor of Science in Nursing"
            "#,
        )
        .unwrap();
        let program = dir.program("Annex", "CN", "Bachelor of Science in Nursing").unwrap();
        assert!(program.majors.is_empty());
        assert_eq!(dir.section_length("CN"), 1);
    }
}
