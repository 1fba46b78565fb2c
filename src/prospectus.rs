use sqlx::PgPool;
use tracing::{debug, info};

use crate::batch::{BatchWriter, FlushSummary, StagedWrite};
use crate::db;
use crate::error::CoreResult;
use crate::models::CatalogRow;

/// Copies a program's catalog subtree into the student's namespace and
/// marks the prospectus root, all through one flush.
///
/// Every subject row is an unconditional overwrite with `passed = false`:
/// re-running enrollment keeps the code set stable but resets any
/// recorded progress. Partial failure can leave a subset of years or
/// semesters populated; callers see that as a `PartialCommit`.
pub async fn initialize(
    pool: &PgPool,
    program: &str,
    student_id: &str,
) -> CoreResult<FlushSummary> {
    db::get_student(pool, student_id).await?;
    let catalog = db::fetch_catalog(pool, program).await?;

    let mut writer = BatchWriter::new();
    stage_initialization(&mut writer, program, student_id, &catalog);
    debug!(
        staged = writer.staged(),
        planned_chunks = writer.chunk_sizes().len(),
        "initialization staged"
    );

    let summary = writer.flush(pool).await?;
    info!(
        student_id,
        program,
        subjects = catalog.len(),
        chunks = summary.chunks,
        "prospectus initialized"
    );
    Ok(summary)
}

pub fn stage_initialization(
    writer: &mut BatchWriter,
    program: &str,
    student_id: &str,
    catalog: &[CatalogRow],
) {
    for row in catalog {
        writer.stage(StagedWrite::PutSubject {
            student_id: student_id.to_string(),
            program: program.to_string(),
            year: row.year,
            semester: row.semester,
            code: row.subject.code.clone(),
            description: row.subject.description.clone(),
            units: row.subject.units,
            passed: false,
        });
    }
    writer.stage(StagedWrite::MarkInitialized {
        student_id: student_id.to_string(),
        program: program.to_string(),
    });
}
