//! Line-level comparison of two documents.
//!
//! Both documents go through the same extraction and normalization path
//! as an upload, then their full texts are diffed line by line. Output
//! is the familiar unified format: file headers, `@@` hunk headers with
//! three lines of surrounding context, and `+`/`-`/` ` prefixed lines.
//! Identical documents produce no lines at all.

use similar::{ChangeTag, TextDiff};

use crate::models::NormalizedPage;

const CONTEXT_RADIUS: usize = 3;

/// Join normalized pages into the single text a document diffs as.
pub fn document_text(pages: &[NormalizedPage]) -> String {
    pages
        .iter()
        .map(|p| p.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Unified diff between two document texts. An empty result means the
/// texts are identical.
pub fn diff_lines(old_name: &str, old: &str, new_name: &str, new: &str) -> Vec<String> {
    let diff = TextDiff::from_lines(old, new);
    let groups = diff.grouped_ops(CONTEXT_RADIUS);
    if groups.is_empty() {
        return Vec::new();
    }

    let mut lines = Vec::new();
    lines.push(format!("--- {}", old_name));
    lines.push(format!("+++ {}", new_name));

    for group in &groups {
        let (Some(first), Some(last)) = (group.first(), group.last()) else {
            continue;
        };
        let old_range = first.old_range().start..last.old_range().end;
        let new_range = first.new_range().start..last.new_range().end;
        lines.push(format!(
            "@@ -{} +{} @@",
            format_range(old_range.start, old_range.len()),
            format_range(new_range.start, new_range.len()),
        ));
        for op in group {
            for change in diff.iter_changes(op) {
                let sign = match change.tag() {
                    ChangeTag::Delete => '-',
                    ChangeTag::Insert => '+',
                    ChangeTag::Equal => ' ',
                };
                let value = change.value();
                lines.push(format!("{}{}", sign, value.strip_suffix('\n').unwrap_or(value)));
            }
        }
    }
    lines
}

/// Unified-diff range: 1-based start with a count, except an empty range,
/// which prints the 0-based position it sits after (`0,0` at the top).
fn format_range(start: usize, len: usize) -> String {
    if len == 0 {
        format!("{},0", start)
    } else {
        format!("{},{}", start + 1, len)
    }
}
