use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};

/// Semester rank: First < Second < Summer. The derived `Ord` is the
/// ordering used everywhere subjects are listed or grouped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Semester {
    First,
    Second,
    Summer,
}

impl Semester {
    pub fn storage_label(self) -> &'static str {
        match self {
            Semester::First => "FirstSem",
            Semester::Second => "SecondSem",
            Semester::Summer => "Summer",
        }
    }

    pub fn from_storage(label: &str) -> CoreResult<Self> {
        match label {
            "FirstSem" => Ok(Semester::First),
            "SecondSem" => Ok(Semester::Second),
            "Summer" => Ok(Semester::Summer),
            other => Err(CoreError::validation("semester", other)),
        }
    }
}

impl fmt::Display for Semester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Semester::First => write!(f, "First Semester"),
            Semester::Second => write!(f, "Second Semester"),
            Semester::Summer => write!(f, "Summer"),
        }
    }
}

impl FromStr for Semester {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "first" => Ok(Semester::First),
            "second" => Ok(Semester::Second),
            "summer" => Ok(Semester::Summer),
            other => Err(CoreError::validation("semester", other)),
        }
    }
}

pub fn validate_year(year: i16) -> CoreResult<i16> {
    if (1..=4).contains(&year) {
        Ok(year)
    } else {
        Err(CoreError::validation("year", year.to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct CatalogSubject {
    pub code: String,
    pub description: String,
    pub units: i32,
}

#[derive(Debug, Clone)]
pub struct CatalogRow {
    pub year: i16,
    pub semester: Semester,
    pub subject: CatalogSubject,
}

#[derive(Debug, Clone)]
pub struct Student {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub course: String,
    pub year_level: i16,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProspectusSubject {
    pub student_id: String,
    pub program: String,
    pub year: i16,
    pub semester: Semester,
    pub code: String,
    pub description: String,
    pub units: i32,
    pub passed: bool,
}

/// One course as produced by the external extraction/evaluation step.
/// Fields the extractor could not fill deserialize to their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseRecord {
    pub code: String,
    pub description: String,
    #[serde(default)]
    pub credits: f64,
    #[serde(default)]
    pub grade: String,
    #[serde(default)]
    pub passed: bool,
    #[serde(default)]
    pub remarks: String,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Clone)]
pub struct EvaluationRecord {
    pub id: Uuid,
    pub student_id: String,
    pub student_name: String,
    pub email: String,
    pub course: String,
    pub year_level: i16,
    pub evaluation_date: DateTime<Utc>,
    pub evaluator_name: String,
    pub courses: Vec<CourseRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionStats {
    pub passed_count: usize,
    pub total: usize,
    pub percentage: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_mapping_is_total_both_ways() {
        for semester in [Semester::First, Semester::Second, Semester::Summer] {
            let label = semester.storage_label();
            assert_eq!(Semester::from_storage(label).unwrap(), semester);
        }
    }

    #[test]
    fn unknown_storage_label_is_rejected() {
        let err = Semester::from_storage("ThirdSem").unwrap_err();
        assert!(matches!(err, CoreError::Validation { field: "semester", .. }));
    }

    #[test]
    fn semester_rank_orders_first_second_summer() {
        assert!(Semester::First < Semester::Second);
        assert!(Semester::Second < Semester::Summer);
    }

    #[test]
    fn cli_names_parse_case_insensitively() {
        assert_eq!("FIRST".parse::<Semester>().unwrap(), Semester::First);
        assert_eq!("summer".parse::<Semester>().unwrap(), Semester::Summer);
        assert!("midyear".parse::<Semester>().is_err());
    }

    #[test]
    fn year_levels_outside_one_to_four_are_rejected() {
        assert!(validate_year(1).is_ok());
        assert!(validate_year(4).is_ok());
        assert!(validate_year(0).is_err());
        assert!(validate_year(5).is_err());
    }

    #[test]
    fn course_record_defaults_missing_fields_to_empty() {
        let record: CourseRecord =
            serde_json::from_str(r#"{"code": "CS101", "description": "Intro"}"#).unwrap();
        assert_eq!(record.remarks, "");
        assert_eq!(record.status, "");
        assert!(!record.passed);
    }
}
