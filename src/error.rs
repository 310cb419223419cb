//! Service error taxonomy.
//!
//! Each variant corresponds to one failure class of the pipeline. Nothing
//! here is retried automatically: a single failed attempt surfaces to the
//! caller with its kind and a human-readable detail. Clause identification
//! is the one deliberately non-fatal class — callers degrade it to an
//! empty clause list instead of propagating.

use thiserror::Error;

/// One extraction strategy's failure, retained for diagnostics when the
/// whole cascade is exhausted.
#[derive(Debug, Clone)]
pub struct StrategyFailure {
    pub strategy: &'static str,
    pub reason: String,
}

impl std::fmt::Display for StrategyFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.strategy, self.reason)
    }
}

#[derive(Error, Debug)]
pub enum ServiceError {
    /// Uploaded bytes could not be persisted to the temp directory.
    #[error("failed to save upload: {0}")]
    Save(String),

    /// Every extraction strategy was exhausted without producing text.
    #[error("no text could be extracted from the file ({})", format_attempts(.0))]
    Extraction(Vec<StrategyFailure>),

    /// Extraction succeeded, but nothing readable survived cleaning.
    #[error("document contained no readable text after cleaning")]
    ContentEmpty,

    /// Clause mining failed. Non-fatal: uploads degrade to an empty
    /// clause list instead of propagating this.
    #[error("clause identification failed: {0}")]
    ClauseIdentification(String),

    /// Embedding or index insertion failed.
    #[error("indexing failed: {0}")]
    Index(String),

    /// A query arrived before any successful upload.
    #[error("no document has been uploaded and processed yet")]
    NoActiveIndex,

    /// The generation capability call failed.
    #[error("answer generation failed: {0}")]
    Generation(String),

    /// Either side of a comparison failed to extract.
    #[error("comparison failed: {0}")]
    Comparison(String),
}

fn format_attempts(attempts: &[StrategyFailure]) -> String {
    if attempts.is_empty() {
        return "no strategies were applicable".to_string();
    }
    attempts
        .iter()
        .map(|a| a.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
