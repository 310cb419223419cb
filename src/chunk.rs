//! Sliding-window text chunker.
//!
//! Splits each normalized page's text into fixed-size segments with a
//! fixed overlap, preserving source and page provenance on every chunk.
//! Sizes are measured in characters so Devanagari text is never cut
//! inside a code point.

use crate::config::ChunkingConfig;
use crate::models::{Chunk, NormalizedPage};

/// Split a set of normalized pages into overlapping chunks.
///
/// Chunk order follows page order; indices are contiguous across the
/// whole document, starting at 0. Consecutive chunks within a page
/// overlap by exactly `overlap` characters, except the final chunk of a
/// page, which may be shorter.
pub fn chunk_pages(pages: &[NormalizedPage], cfg: &ChunkingConfig) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut index = 0usize;
    for page in pages {
        for text in split_windows(&page.text, cfg.chunk_size, cfg.overlap) {
            chunks.push(Chunk {
                text,
                source: page.source.clone(),
                page: page.number,
                chunk_index: index,
            });
            index += 1;
        }
    }
    chunks
}

/// Deterministic window split: windows of `size` characters advancing by
/// `size - overlap`. `overlap` must be < `size` (enforced at config load).
fn split_windows(text: &str, size: usize, overlap: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return Vec::new();
    }
    if chars.len() <= size {
        return vec![text.to_string()];
    }
    let step = size - overlap;
    let mut out = Vec::new();
    let mut start = 0usize;
    loop {
        let end = (start + size).min(chars.len());
        out.push(chars[start..end].iter().collect());
        if end == chars.len() {
            break;
        }
        start += step;
    }
    out
}
