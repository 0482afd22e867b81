//! Fatal pipeline errors.
//!
//! Anything that should only drop a single record is a
//! [`SkipReason`](crate::models::SkipReason) instead.

use crate::models::InputKind;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// An input path does not exist.
    #[error("{input} file not found: {}", path.display())]
    SourceNotFound { input: InputKind, path: PathBuf },

    /// An input exists but does not have the expected shape.
    #[error("{input} schema error: {detail}")]
    Schema { input: InputKind, detail: String },

    /// Opening or reading an input failed for another reason.
    #[error("failed to read {input}: {source}")]
    Io {
        input: InputKind,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    pub fn schema(input: InputKind, detail: impl Into<String>) -> Self {
        PipelineError::Schema {
            input,
            detail: detail.into(),
        }
    }
}
