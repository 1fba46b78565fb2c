use sqlx::PgPool;
use tracing::debug;

use crate::error::{CoreError, CoreResult};
use crate::models::Semester;

/// Hard per-transaction operation ceiling of the underlying store.
pub const STORE_TX_CEILING: usize = 500;
/// Chunk cap used by default; kept strictly below `STORE_TX_CEILING`.
pub const MAX_OPS_PER_COMMIT: usize = 450;

#[derive(Debug, Clone)]
pub enum StagedWrite {
    /// Unconditional overwrite of a prospectus subject row.
    PutSubject {
        student_id: String,
        program: String,
        year: i16,
        semester: Semester,
        code: String,
        description: String,
        units: i32,
        passed: bool,
    },
    /// Non-destructive marker on the prospectus root (merge semantics).
    MarkInitialized { student_id: String, program: String },
    /// Status update on an existing subject row.
    SetPassed {
        student_id: String,
        program: String,
        year: i16,
        semester: Semester,
        code: String,
        passed: bool,
    },
}

#[derive(Debug, Clone, Copy)]
pub struct FlushSummary {
    pub chunks: usize,
    pub ops: usize,
}

/// Stages logical writes and commits them as sequential chunked
/// transactions, each chunk at most `max_ops_per_commit` operations,
/// in staging order. A failed chunk stops the sequence; the writer is
/// consumed by `flush` and cannot be retried.
#[derive(Debug)]
pub struct BatchWriter {
    max_ops_per_commit: usize,
    pending: Vec<StagedWrite>,
}

impl BatchWriter {
    pub fn new() -> Self {
        Self::with_chunk_cap(MAX_OPS_PER_COMMIT)
    }

    pub fn with_chunk_cap(max_ops_per_commit: usize) -> Self {
        assert!(
            max_ops_per_commit >= 1 && max_ops_per_commit < STORE_TX_CEILING,
            "chunk cap must stay below the store transaction ceiling"
        );
        BatchWriter {
            max_ops_per_commit,
            pending: Vec::new(),
        }
    }

    pub fn stage(&mut self, write: StagedWrite) {
        self.pending.push(write);
    }

    pub fn staged(&self) -> usize {
        self.pending.len()
    }

    pub fn staged_writes(&self) -> &[StagedWrite] {
        &self.pending
    }

    pub fn chunk_sizes(&self) -> Vec<usize> {
        self.staged_writes()
            .chunks(self.max_ops_per_commit)
            .map(<[StagedWrite]>::len)
            .collect()
    }

    pub async fn flush(self, pool: &PgPool) -> CoreResult<FlushSummary> {
        let mut committed_chunks = 0usize;
        let mut committed_ops = 0usize;

        for chunk in self.pending.chunks(self.max_ops_per_commit) {
            match commit_chunk(pool, chunk).await {
                Ok(()) => {
                    committed_chunks += 1;
                    committed_ops += chunk.len();
                    debug!(chunk = committed_chunks, ops = chunk.len(), "chunk committed");
                }
                Err(source) => {
                    return Err(if committed_chunks > 0 {
                        CoreError::PartialCommit {
                            committed_chunks,
                            committed_ops,
                            source,
                        }
                    } else {
                        CoreError::Persistence(source)
                    });
                }
            }
        }

        Ok(FlushSummary {
            chunks: committed_chunks,
            ops: committed_ops,
        })
    }
}

impl Default for BatchWriter {
    fn default() -> Self {
        Self::new()
    }
}

async fn commit_chunk(pool: &PgPool, chunk: &[StagedWrite]) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    for write in chunk {
        match write {
            StagedWrite::PutSubject {
                student_id,
                program,
                year,
                semester,
                code,
                description,
                units,
                passed,
            } => {
                sqlx::query(
                    r#"
                    INSERT INTO prospectus.prospectus_subjects
                    (student_id, program, year, semester, code, description, units, passed)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                    ON CONFLICT (student_id, program, year, semester, code)
                    DO UPDATE SET description = EXCLUDED.description,
                                  units = EXCLUDED.units,
                                  passed = EXCLUDED.passed
                    "#,
                )
                .bind(student_id)
                .bind(program)
                .bind(year)
                .bind(semester.storage_label())
                .bind(code)
                .bind(description)
                .bind(units)
                .bind(passed)
                .execute(&mut *tx)
                .await?;
            }
            StagedWrite::MarkInitialized {
                student_id,
                program,
            } => {
                sqlx::query(
                    r#"
                    INSERT INTO prospectus.prospectus_roots (student_id, program)
                    VALUES ($1, $2)
                    ON CONFLICT (student_id, program)
                    DO UPDATE SET initialized_at = now()
                    "#,
                )
                .bind(student_id)
                .bind(program)
                .execute(&mut *tx)
                .await?;
            }
            StagedWrite::SetPassed {
                student_id,
                program,
                year,
                semester,
                code,
                passed,
            } => {
                sqlx::query(
                    r#"
                    UPDATE prospectus.prospectus_subjects
                    SET passed = $6
                    WHERE student_id = $1 AND program = $2
                      AND year = $3 AND semester = $4 AND code = $5
                    "#,
                )
                .bind(student_id)
                .bind(program)
                .bind(year)
                .bind(semester.storage_label())
                .bind(code)
                .bind(passed)
                .execute(&mut *tx)
                .await?;
            }
        }
    }

    tx.commit().await?;
    Ok(())
}
