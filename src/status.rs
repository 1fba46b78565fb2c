use sqlx::PgPool;
use tracing::info;

use crate::batch::{BatchWriter, FlushSummary, StagedWrite};
use crate::error::CoreResult;
use crate::models::{ProspectusSubject, Semester};

#[derive(Debug, Clone)]
pub struct StatusToggle {
    pub year: i16,
    pub semester: Semester,
    pub code: String,
    pub passed: bool,
}

/// The in-memory phase of the two-phase edit flow: toggles mutate the
/// local collection only, nothing persists until `save_all`.
pub fn apply_toggles(
    mut subjects: Vec<ProspectusSubject>,
    toggles: &[StatusToggle],
) -> Vec<ProspectusSubject> {
    for toggle in toggles {
        for subject in subjects.iter_mut() {
            if subject.year == toggle.year
                && subject.semester == toggle.semester
                && subject.code == toggle.code
            {
                subject.passed = toggle.passed;
            }
        }
    }
    subjects
}

pub fn stage_save_all(writer: &mut BatchWriter, student_id: &str, subjects: &[ProspectusSubject]) {
    for subject in subjects {
        writer.stage(StagedWrite::SetPassed {
            student_id: student_id.to_string(),
            program: subject.program.clone(),
            year: subject.year,
            semester: subject.semester,
            code: subject.code.clone(),
            passed: subject.passed,
        });
    }
}

pub fn stage_reset_all(writer: &mut BatchWriter, student_id: &str, subjects: &[ProspectusSubject]) {
    for subject in subjects {
        writer.stage(StagedWrite::SetPassed {
            student_id: student_id.to_string(),
            program: subject.program.clone(),
            year: subject.year,
            semester: subject.semester,
            code: subject.code.clone(),
            passed: false,
        });
    }
}

pub async fn save_all(
    pool: &PgPool,
    student_id: &str,
    subjects: &[ProspectusSubject],
) -> CoreResult<FlushSummary> {
    let mut writer = BatchWriter::new();
    stage_save_all(&mut writer, student_id, subjects);
    let summary = writer.flush(pool).await?;
    info!(student_id, ops = summary.ops, chunks = summary.chunks, "statuses saved");
    Ok(summary)
}

pub async fn reset_all(
    pool: &PgPool,
    student_id: &str,
    subjects: &[ProspectusSubject],
) -> CoreResult<FlushSummary> {
    let mut writer = BatchWriter::new();
    stage_reset_all(&mut writer, student_id, subjects);
    let summary = writer.flush(pool).await?;
    info!(student_id, ops = summary.ops, chunks = summary.chunks, "statuses reset");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subject(code: &str, passed: bool) -> ProspectusSubject {
        ProspectusSubject {
            student_id: "2023-0415".to_string(),
            program: "BSCS".to_string(),
            year: 1,
            semester: Semester::First,
            code: code.to_string(),
            description: "Sample Subject".to_string(),
            units: 3,
            passed,
        }
    }

    fn staged_statuses(writer: &BatchWriter) -> Vec<(String, bool)> {
        writer
            .staged_writes()
            .iter()
            .map(|w| match w {
                StagedWrite::SetPassed { code, passed, .. } => (code.clone(), *passed),
                _ => panic!("expected SetPassed"),
            })
            .collect()
    }

    #[test]
    fn toggles_touch_only_matching_subjects() {
        let subjects = vec![subject("CS101", false), subject("CS102", false)];
        let toggles = vec![StatusToggle {
            year: 1,
            semester: Semester::First,
            code: "CS101".to_string(),
            passed: true,
        }];

        let edited = apply_toggles(subjects, &toggles);
        assert!(edited[0].passed);
        assert!(!edited[1].passed);
    }

    #[test]
    fn toggles_against_other_semesters_change_nothing() {
        let subjects = vec![subject("CS101", false)];
        let toggles = vec![StatusToggle {
            year: 1,
            semester: Semester::Second,
            code: "CS101".to_string(),
            passed: true,
        }];

        let edited = apply_toggles(subjects, &toggles);
        assert!(!edited[0].passed);
    }

    #[test]
    fn save_all_stages_the_local_status_of_every_subject() {
        let subjects = vec![
            subject("CS101", true),
            subject("CS102", false),
            subject("CS103", true),
        ];
        let mut writer = BatchWriter::new();
        stage_save_all(&mut writer, "2023-0415", &subjects);

        assert_eq!(
            staged_statuses(&writer),
            vec![
                ("CS101".to_string(), true),
                ("CS102".to_string(), false),
                ("CS103".to_string(), true),
            ]
        );
    }

    #[test]
    fn reset_all_stages_false_for_every_subject() {
        let subjects = vec![subject("CS101", true), subject("CS102", true)];
        let mut writer = BatchWriter::new();
        stage_reset_all(&mut writer, "2023-0415", &subjects);

        assert!(staged_statuses(&writer).iter().all(|(_, passed)| !passed));
        assert_eq!(writer.staged(), 2);
    }
}
