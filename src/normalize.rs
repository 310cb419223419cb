//! Raw page text cleaning and binary-garbage rejection.
//!
//! Extraction strategies hand over whatever they found, including pages
//! that are really undecoded binary innards of a PDF container. This
//! module cleans each page (strip control characters, collapse whitespace,
//! trim) and drops the ones that fail a binary-content heuristic or end up
//! empty. If nothing survives, the upload fails with
//! [`ServiceError::ContentEmpty`] — distinct from extraction failure,
//! because extraction did return something.

use tracing::debug;

use crate::error::ServiceError;
use crate::models::{NormalizedPage, Page};

/// Residual non-printable density threshold: a cleaned page is dropped
/// when its leftover control-character count exceeds `max(5, len / 50)`.
const NOISE_FLOOR: usize = 5;
const NOISE_DIVISOR: usize = 50;

/// Normalize a batch of extracted pages, dropping garbage and empties.
pub fn normalize_pages(pages: Vec<Page>) -> Result<Vec<NormalizedPage>, ServiceError> {
    let mut out = Vec::with_capacity(pages.len());
    for page in pages {
        if looks_binary(&page.text) {
            debug!(source = %page.source, page = page.number, "dropping binary-looking page");
            continue;
        }
        let cleaned = clean_text(&page.text);
        if cleaned.is_empty() {
            continue;
        }
        out.push(NormalizedPage {
            source: page.source,
            number: page.number,
            text: cleaned,
        });
    }
    if out.is_empty() {
        return Err(ServiceError::ContentEmpty);
    }
    Ok(out)
}

/// Clean one page of text: drop control characters (keeping tab/newline),
/// collapse every whitespace run to a single character, trim the ends.
///
/// A run that contains a newline collapses to one `'\n'` so that the
/// line structure survives for the differencer; any other run collapses
/// to one `' '`.
pub fn clean_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_ws: Option<char> = None;

    for c in raw.chars() {
        if c.is_whitespace() {
            // '\r' and other exotic line separators count as newlines.
            let is_newline = matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}');
            pending_ws = match (pending_ws, is_newline) {
                (Some('\n'), _) | (_, true) => Some('\n'),
                _ => Some(' '),
            };
        } else if c.is_control() {
            // Non-whitespace control character: drop it.
        } else {
            if let Some(ws) = pending_ws.take() {
                if !out.is_empty() {
                    out.push(ws);
                }
            }
            out.push(c);
        }
    }
    out
}

/// Heuristic for pages that are really a binary container, not text.
///
/// Flags a page when it contains a null byte, when it carries the PDF
/// header token together with stream/endstream markers (an undecoded PDF
/// body dumped as "text"), or when its density of non-printable
/// characters exceeds the noise threshold.
pub fn looks_binary(text: &str) -> bool {
    if text.contains('\0') {
        return true;
    }
    if text.contains("%PDF") && text.contains("stream") && text.contains("endstream") {
        return true;
    }
    let noise = text
        .chars()
        .filter(|c| c.is_control() && !matches!(c, '\t' | '\n' | '\r'))
        .count();
    noise > NOISE_FLOOR.max(text.len() / NOISE_DIVISOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(text: &str) -> Page {
        Page {
            source: "contract.pdf".to_string(),
            number: 1,
            text: text.to_string(),
        }
    }

    #[test]
    fn strips_control_characters() {
        let cleaned = clean_text("a\u{1}b\u{7}c");
        assert_eq!(cleaned, "abc");
    }

    #[test]
    fn collapses_whitespace_runs() {
        let cleaned = clean_text("a   b\t\t c");
        assert_eq!(cleaned, "a b c");
    }

    #[test]
    fn newline_wins_inside_a_mixed_run() {
        let cleaned = clean_text("line one  \n\n  line two");
        assert_eq!(cleaned, "line one\nline two");
    }

    #[test]
    fn trims_both_ends() {
        assert_eq!(clean_text("  hello  "), "hello");
        assert_eq!(clean_text("\n\nhello\n"), "hello");
    }

    #[test]
    fn output_has_no_long_whitespace_runs_or_stray_controls() {
        let cleaned = clean_text("x\u{0b}  y\r\n\r\n z\u{8} ");
        let mut prev_ws = false;
        for c in cleaned.chars() {
            assert!(!c.is_control() || c == '\t' || c == '\n');
            if c.is_whitespace() {
                assert!(!prev_ws, "whitespace run longer than one char");
                prev_ws = true;
            } else {
                prev_ws = false;
            }
        }
    }

    #[test]
    fn null_byte_flags_binary() {
        assert!(looks_binary("abc\0def"));
    }

    #[test]
    fn pdf_container_markers_flag_binary() {
        assert!(looks_binary("%PDF-1.7 xref stream ...binary... endstream"));
        assert!(!looks_binary("This page mentions %PDF in passing."));
    }

    #[test]
    fn control_density_flags_binary() {
        let noisy: String = "\u{1}\u{2}\u{3}".repeat(10);
        assert!(looks_binary(&noisy));
        let mostly_clean = format!("{}{}", "a".repeat(1000), "\u{1}".repeat(6));
        assert!(!mostly_clean.contains('\0'));
        assert!(!looks_binary(&mostly_clean));
    }

    #[test]
    fn empty_survivor_set_is_content_empty() {
        let err = normalize_pages(vec![page("\u{1}\u{2}"), page("   ")]).unwrap_err();
        assert!(matches!(err, ServiceError::ContentEmpty));
    }

    #[test]
    fn surviving_pages_keep_provenance() {
        let pages = vec![
            Page {
                source: "a.pdf".into(),
                number: 1,
                text: "\0garbage".into(),
            },
            Page {
                source: "a.pdf".into(),
                number: 2,
                text: "  real   text  ".into(),
            },
        ];
        let normalized = normalize_pages(pages).unwrap();
        assert_eq!(normalized.len(), 1);
        assert_eq!(normalized[0].number, 2);
        assert_eq!(normalized[0].text, "real text");
    }
}
