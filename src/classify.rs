use crate::models::CourseRecord;

pub const NOT_CREDITED_STATUS: &str = "not-credited";
const NO_CREDITS_SIGNAL: &str = "no credits found";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Passed,
    Failed,
    NotCredited,
}

/// Precedence: the not-credited signals are checked before the
/// passed/failed split, so a course lacking a credit match is never
/// counted as failed.
pub fn outcome(record: &CourseRecord) -> Outcome {
    if record.status == NOT_CREDITED_STATUS
        || record.remarks.to_ascii_lowercase().contains(NO_CREDITS_SIGNAL)
    {
        Outcome::NotCredited
    } else if record.passed {
        Outcome::Passed
    } else {
        Outcome::Failed
    }
}

#[derive(Debug, Clone, Default)]
pub struct Classification {
    pub passed: Vec<CourseRecord>,
    pub failed: Vec<CourseRecord>,
    pub not_credited: Vec<CourseRecord>,
}

impl Classification {
    pub fn len(&self) -> usize {
        self.passed.len() + self.failed.len() + self.not_credited.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Partitions the input by move: every record lands in exactly one of
/// the three output sets.
pub fn classify(records: Vec<CourseRecord>) -> Classification {
    let mut result = Classification::default();
    for record in records {
        match outcome(&record) {
            Outcome::Passed => result.passed.push(record),
            Outcome::Failed => result.failed.push(record),
            Outcome::NotCredited => result.not_credited.push(record),
        }
    }
    result
}
