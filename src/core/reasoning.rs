//! Removal of `<think>...</think>` reasoning spans from a finished reply.
//!
//! Filtering runs on the fully accumulated response, never on individual
//! chunks, so a marker split across two network chunks is still matched.

pub const THINK_OPEN: &str = "<think>";
pub const THINK_CLOSE: &str = "</think>";

/// Strip every reasoning span from `accumulated` and trim the remainder.
///
/// Markers are matched case-sensitively and the span may cover several lines.
/// An opening marker without a later closing marker is left as plain text.
pub fn strip_reasoning(accumulated: &str) -> String {
    let mut current = remove_spans(accumulated);
    // Removing a span can splice two marker halves into a new pair; repeat until stable.
    while let Some(next) = current.as_ref().and_then(|text| remove_spans(text)) {
        current = Some(next);
    }
    match current {
        Some(text) => text.trim().to_string(),
        None => accumulated.trim().to_string(),
    }
}

/// One left-to-right pass. Returns `None` when no complete span was found.
fn remove_spans(text: &str) -> Option<String> {
    let mut output = String::with_capacity(text.len());
    let mut rest = text;
    let mut removed_any = false;

    while let Some(open) = rest.find(THINK_OPEN) {
        let after_open = &rest[open + THINK_OPEN.len()..];
        let Some(close) = after_open.find(THINK_CLOSE) else {
            break;
        };
        output.push_str(&rest[..open]);
        rest = &after_open[close + THINK_CLOSE.len()..];
        removed_any = true;
    }

    if !removed_any {
        return None;
    }
    output.push_str(rest);
    Some(output)
}
