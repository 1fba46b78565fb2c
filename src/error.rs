use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid {field}: {value:?}")]
    Validation { field: &'static str, value: String },

    #[error("persistence failure: {0}")]
    Persistence(#[from] sqlx::Error),

    /// A chunk sequence failed after at least one chunk had already
    /// committed; the affected record is in a known-inconsistent
    /// intermediate state.
    #[error("partial commit: {committed_chunks} chunk(s) covering {committed_ops} operation(s) committed before the failure")]
    PartialCommit {
        committed_chunks: usize,
        committed_ops: usize,
        #[source]
        source: sqlx::Error,
    },
}

impl CoreError {
    pub fn not_found(what: impl Into<String>) -> Self {
        CoreError::NotFound(what.into())
    }

    pub fn validation(field: &'static str, value: impl Into<String>) -> Self {
        CoreError::Validation {
            field,
            value: value.into(),
        }
    }
}
