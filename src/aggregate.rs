use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::error::CoreError;
use crate::models::{CompletionStats, EvaluationRecord, ProspectusSubject, Semester};

pub fn compute_completion(subjects: &[ProspectusSubject]) -> CompletionStats {
    let total = subjects.len();
    let passed_count = subjects.iter().filter(|s| s.passed).count();
    let percentage = if total == 0 {
        0
    } else {
        ((passed_count as f64 / total as f64) * 100.0).round() as u32
    };

    CompletionStats {
        passed_count,
        total,
        percentage,
    }
}

#[derive(Debug, Clone)]
pub struct SemesterGroup {
    pub semester: Semester,
    pub subjects: Vec<ProspectusSubject>,
}

#[derive(Debug, Clone)]
pub struct YearGroup {
    pub year: i16,
    pub semesters: Vec<SemesterGroup>,
}

/// Nested grouping ordered by year then semester rank. Groups with no
/// subjects never appear.
pub fn group_by_year_then_semester(subjects: &[ProspectusSubject]) -> Vec<YearGroup> {
    let mut years: BTreeMap<i16, BTreeMap<Semester, Vec<ProspectusSubject>>> = BTreeMap::new();

    for subject in subjects {
        years
            .entry(subject.year)
            .or_default()
            .entry(subject.semester)
            .or_default()
            .push(subject.clone());
    }

    years
        .into_iter()
        .map(|(year, semesters)| YearGroup {
            year,
            semesters: semesters
                .into_iter()
                .map(|(semester, subjects)| SemesterGroup { semester, subjects })
                .collect(),
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    StudentName,
    Email,
    Course,
    YearLevel,
    EvaluationDate,
    EvaluatorName,
}

impl FromStr for SortField {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "student-name" | "name" => Ok(SortField::StudentName),
            "email" => Ok(SortField::Email),
            "course" => Ok(SortField::Course),
            "year-level" | "year" => Ok(SortField::YearLevel),
            "evaluation-date" | "date" => Ok(SortField::EvaluationDate),
            "evaluator-name" | "evaluator" => Ok(SortField::EvaluatorName),
            other => Err(CoreError::validation("sort field", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    fn flipped(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

/// Sort state over evaluation listings: repeating a field flips the
/// direction, switching fields resets to ascending.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationSort {
    field: SortField,
    direction: SortDirection,
}

impl EvaluationSort {
    pub fn new(field: SortField) -> Self {
        EvaluationSort {
            field,
            direction: SortDirection::Ascending,
        }
    }

    pub fn field(&self) -> SortField {
        self.field
    }

    pub fn direction(&self) -> SortDirection {
        self.direction
    }

    pub fn toggle(&mut self, field: SortField) {
        if self.field == field {
            self.direction = self.direction.flipped();
        } else {
            self.field = field;
            self.direction = SortDirection::Ascending;
        }
    }

    pub fn sort(&self, records: &mut [EvaluationRecord]) {
        records.sort_by(|a, b| self.compare(a, b));
    }

    fn compare(&self, a: &EvaluationRecord, b: &EvaluationRecord) -> Ordering {
        let ordering = match self.field {
            SortField::StudentName => a.student_name.cmp(&b.student_name),
            SortField::Email => a.email.cmp(&b.email),
            SortField::Course => a.course.cmp(&b.course),
            SortField::YearLevel => a.year_level.cmp(&b.year_level),
            SortField::EvaluationDate => a.evaluation_date.cmp(&b.evaluation_date),
            SortField::EvaluatorName => a.evaluator_name.cmp(&b.evaluator_name),
        };
        match self.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn subject(year: i16, semester: Semester, code: &str, passed: bool) -> ProspectusSubject {
        ProspectusSubject {
            student_id: "2023-0415".to_string(),
            program: "BSCS".to_string(),
            year,
            semester,
            code: code.to_string(),
            description: "Sample Subject".to_string(),
            units: 3,
            passed,
        }
    }

    fn evaluation(name: &str, year_level: i16, day: u32) -> EvaluationRecord {
        EvaluationRecord {
            id: Uuid::new_v4(),
            student_id: "2023-0415".to_string(),
            student_name: name.to_string(),
            email: format!("{}@univ.edu", name.to_ascii_lowercase()),
            course: "BS Computer Science".to_string(),
            year_level,
            evaluation_date: Utc.with_ymd_and_hms(2026, 3, day, 9, 0, 0).unwrap(),
            evaluator_name: "R. Salazar".to_string(),
            courses: Vec::new(),
        }
    }

    #[test]
    fn completion_of_empty_input_is_all_zero() {
        let stats = compute_completion(&[]);
        assert_eq!(
            stats,
            CompletionStats {
                passed_count: 0,
                total: 0,
                percentage: 0
            }
        );
    }

    #[test]
    fn three_of_four_rounds_to_seventy_five() {
        let subjects = vec![
            subject(1, Semester::First, "CS101", true),
            subject(1, Semester::First, "CS102", true),
            subject(1, Semester::First, "CS103", true),
            subject(1, Semester::First, "CS104", false),
        ];
        let stats = compute_completion(&subjects);
        assert_eq!(stats.passed_count, 3);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.percentage, 75);
    }

    #[test]
    fn five_of_seven_rounds_to_seventy_one() {
        let subjects: Vec<ProspectusSubject> = (0..7)
            .map(|i| subject(1, Semester::First, &format!("CS10{i}"), i < 5))
            .collect();
        assert_eq!(compute_completion(&subjects).percentage, 71);
    }

    #[test]
    fn grouping_orders_years_then_semester_rank() {
        let subjects = vec![
            subject(2, Semester::Summer, "CS210", false),
            subject(1, Semester::Second, "CS103", false),
            subject(2, Semester::First, "CS201", false),
            subject(1, Semester::First, "CS101", true),
        ];
        let groups = group_by_year_then_semester(&subjects);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].year, 1);
        assert_eq!(groups[0].semesters[0].semester, Semester::First);
        assert_eq!(groups[0].semesters[1].semester, Semester::Second);
        assert_eq!(groups[1].year, 2);
        assert_eq!(groups[1].semesters[0].semester, Semester::First);
        assert_eq!(groups[1].semesters[1].semester, Semester::Summer);
    }

    #[test]
    fn empty_groups_are_omitted() {
        let subjects = vec![subject(3, Semester::Summer, "CS310", false)];
        let groups = group_by_year_then_semester(&subjects);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].year, 3);
        assert_eq!(groups[0].semesters.len(), 1);
        assert_eq!(groups[0].semesters[0].semester, Semester::Summer);
    }

    #[test]
    fn repeating_a_field_flips_direction() {
        let mut order = EvaluationSort::new(SortField::StudentName);
        assert_eq!(order.direction(), SortDirection::Ascending);

        order.toggle(SortField::StudentName);
        assert_eq!(order.direction(), SortDirection::Descending);

        order.toggle(SortField::StudentName);
        assert_eq!(order.direction(), SortDirection::Ascending);
    }

    #[test]
    fn switching_fields_resets_to_ascending() {
        let mut order = EvaluationSort::new(SortField::StudentName);
        order.toggle(SortField::StudentName);
        assert_eq!(order.direction(), SortDirection::Descending);

        order.toggle(SortField::YearLevel);
        assert_eq!(order.field(), SortField::YearLevel);
        assert_eq!(order.direction(), SortDirection::Ascending);
    }

    #[test]
    fn year_level_sorts_numerically() {
        let mut records = vec![
            evaluation("Rhea", 4, 1),
            evaluation("Caleb", 1, 2),
            evaluation("Mara", 2, 3),
        ];
        EvaluationSort::new(SortField::YearLevel).sort(&mut records);
        let levels: Vec<i16> = records.iter().map(|r| r.year_level).collect();
        assert_eq!(levels, vec![1, 2, 4]);
    }

    #[test]
    fn evaluation_date_sorts_by_instant() {
        let mut records = vec![
            evaluation("Rhea", 1, 20),
            evaluation("Caleb", 1, 5),
            evaluation("Mara", 1, 12),
        ];
        let mut order = EvaluationSort::new(SortField::EvaluationDate);
        order.toggle(SortField::EvaluationDate);
        order.sort(&mut records);
        let days: Vec<u32> = records
            .iter()
            .map(|r| {
                use chrono::Datelike;
                r.evaluation_date.day()
            })
            .collect();
        assert_eq!(days, vec![20, 12, 5]);
    }

    #[test]
    fn string_fields_sort_case_respecting() {
        let mut records = vec![
            evaluation("mara", 1, 1),
            evaluation("Caleb", 1, 2),
            evaluation("Rhea", 1, 3),
        ];
        EvaluationSort::new(SortField::StudentName).sort(&mut records);
        let names: Vec<&str> = records.iter().map(|r| r.student_name.as_str()).collect();
        assert_eq!(names, vec!["Caleb", "Rhea", "mara"]);
    }
}
