use std::fmt::Write;

use crate::classify::{outcome, Outcome};
use crate::models::EvaluationRecord;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutcomeSummary {
    pub passed: usize,
    pub failed: usize,
    pub not_credited: usize,
}

impl OutcomeSummary {
    pub fn total(&self) -> usize {
        self.passed + self.failed + self.not_credited
    }
}

/// Outcome badges are never stored; they are recomputed from the
/// course list every time a record is read.
pub fn summarize_outcomes(records: &[EvaluationRecord]) -> OutcomeSummary {
    let mut summary = OutcomeSummary::default();
    for record in records {
        for course in &record.courses {
            match outcome(course) {
                Outcome::Passed => summary.passed += 1,
                Outcome::Failed => summary.failed += 1,
                Outcome::NotCredited => summary.not_credited += 1,
            }
        }
    }
    summary
}

pub fn build_report(scope: Option<&str>, records: &[EvaluationRecord]) -> String {
    let summary = summarize_outcomes(records);

    let mut output = String::new();
    let scope_label = scope.unwrap_or("all students");

    let _ = writeln!(output, "# Course Evaluation Report");
    let _ = writeln!(
        output,
        "Generated for {} ({} evaluation(s) on record)",
        scope_label,
        records.len()
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Outcome Mix");

    if summary.total() == 0 {
        let _ = writeln!(output, "No evaluated courses on record.");
    } else {
        let _ = writeln!(output, "- credited (passed): {} courses", summary.passed);
        let _ = writeln!(output, "- failed: {} courses", summary.failed);
        let _ = writeln!(output, "- not credited: {} courses", summary.not_credited);
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Evaluations");

    if records.is_empty() {
        let _ = writeln!(output, "No evaluations on record.");
    } else {
        for record in records {
            let per_record = summarize_outcomes(std::slice::from_ref(record));
            let _ = writeln!(
                output,
                "- {} ({}, year {}) evaluated by {} on {}: {} passed / {} failed / {} not credited",
                record.student_name,
                record.email,
                record.year_level,
                record.evaluator_name,
                record.evaluation_date.format("%Y-%m-%d"),
                per_record.passed,
                per_record.failed,
                per_record.not_credited
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Not-Credited Courses");

    let mut any_not_credited = false;
    for record in records {
        for course in &record.courses {
            if outcome(course) == Outcome::NotCredited {
                any_not_credited = true;
                let remark = if course.remarks.is_empty() {
                    course.status.as_str()
                } else {
                    course.remarks.as_str()
                };
                let _ = writeln!(
                    output,
                    "- {} {} ({}): {}",
                    course.code, course.description, record.student_name, remark
                );
            }
        }
    }
    if !any_not_credited {
        let _ = writeln!(output, "No courses flagged as not credited.");
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CourseRecord;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn course(code: &str, passed: bool, remarks: &str) -> CourseRecord {
        CourseRecord {
            code: code.to_string(),
            description: "Sample Course".to_string(),
            credits: 3.0,
            grade: "2.0".to_string(),
            passed,
            remarks: remarks.to_string(),
            status: String::new(),
        }
    }

    fn record(courses: Vec<CourseRecord>) -> EvaluationRecord {
        EvaluationRecord {
            id: Uuid::new_v4(),
            student_id: "2023-0415".to_string(),
            student_name: "Rhea Dominguez".to_string(),
            email: "rhea.dominguez@univ.edu".to_string(),
            course: "BS Computer Science".to_string(),
            year_level: 2,
            evaluation_date: Utc.with_ymd_and_hms(2026, 3, 14, 10, 0, 0).unwrap(),
            evaluator_name: "R. Salazar".to_string(),
            courses,
        }
    }

    #[test]
    fn summary_recomputes_outcomes_from_stored_courses() {
        let records = vec![record(vec![
            course("CS101", true, ""),
            course("CS102", false, ""),
            course("CS999", false, "No credits found for CS999"),
        ])];
        let summary = summarize_outcomes(&records);

        assert_eq!(summary.passed, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.not_credited, 1);
        assert_eq!(summary.total(), 3);
    }

    #[test]
    fn report_lists_not_credited_courses_with_remarks() {
        let records = vec![record(vec![course(
            "CS999",
            false,
            "No credits found for CS999",
        )])];
        let report = build_report(Some("rhea.dominguez@univ.edu"), &records);

        assert!(report.contains("# Course Evaluation Report"));
        assert!(report.contains("rhea.dominguez@univ.edu"));
        assert!(report.contains("CS999"));
        assert!(report.contains("No credits found for CS999"));
    }

    #[test]
    fn empty_history_falls_back_to_placeholder_lines() {
        let report = build_report(None, &[]);
        assert!(report.contains("all students"));
        assert!(report.contains("No evaluations on record."));
        assert!(report.contains("No evaluated courses on record."));
    }
}
