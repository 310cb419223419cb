//! Core data models used throughout Nyay Saarthi.
//!
//! These types represent the pages, chunks, and answers that flow through
//! the extraction, indexing, and retrieval pipeline. Pages and chunks are
//! transient — they live for the duration of one upload request. The only
//! process-wide state is the active index generation in [`crate::index`].

use serde::Serialize;

/// One page of raw text produced by an extraction strategy.
#[derive(Debug, Clone)]
pub struct Page {
    /// Base filename of the uploaded document.
    pub source: String,
    /// 1-based page number within the document.
    pub number: u32,
    /// Raw extracted text, not yet cleaned.
    pub text: String,
}

/// A page after normalization. Its text contains no control characters
/// outside tab/newline, no whitespace run longer than one character, and
/// is non-empty.
#[derive(Debug, Clone)]
pub struct NormalizedPage {
    pub source: String,
    pub number: u32,
    pub text: String,
}

/// A bounded, overlapping segment of normalized page text used as the
/// retrieval unit. Belongs to exactly one upload generation.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub text: String,
    pub source: String,
    /// Page the chunk was cut from.
    pub page: u32,
    /// Position within the whole document's chunk sequence.
    pub chunk_index: usize,
}

/// A retrieved chunk surfaced as a source for an answer.
#[derive(Debug, Clone, Serialize)]
pub struct SourceRef {
    pub content: String,
    pub page: u32,
}

/// The result of one grounded question-answer call.
#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    pub answer: String,
    pub sources: Vec<SourceRef>,
}
