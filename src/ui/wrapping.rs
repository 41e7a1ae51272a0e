//! Word wrapping for styled conversation lines.
//!
//! Lines are broken into rows here and drawn by `Paragraph` without `Wrap`, so
//! the row count used for scrolling is exactly what reaches the screen.

use ratatui::style::Style;
use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthChar;

struct StyledChar {
    ch: char,
    style: Style,
    width: usize,
}

/// Break `line` into rows no wider than `width` display columns.
///
/// Words move to the next row whole; a word wider than a row is split. Spaces
/// at a break are dropped. An empty line still yields one row.
pub fn wrap_line(line: &Line<'_>, width: usize) -> Vec<Line<'static>> {
    let width = width.max(1);
    let chars: Vec<StyledChar> = line
        .spans
        .iter()
        .flat_map(|span| {
            let style = line.style.patch(span.style);
            span.content.chars().map(move |ch| StyledChar {
                ch,
                style,
                width: ch.width().unwrap_or(0),
            })
        })
        .collect();

    let mut rows: Vec<Vec<&StyledChar>> = vec![Vec::new()];
    let mut row_width = 0usize;

    for token in tokens(&chars) {
        let token_width: usize = token.iter().map(|c| c.width).sum();
        let is_space = token.iter().all(|c| c.ch.is_whitespace());

        if row_width + token_width <= width {
            extend_row(&mut rows, token);
            row_width += token_width;
            continue;
        }
        if is_space {
            if row_width > 0 {
                break_row(&mut rows);
                row_width = 0;
            }
            continue;
        }
        if token_width <= width {
            break_row(&mut rows);
            extend_row(&mut rows, token);
            row_width = token_width;
            continue;
        }
        // Longer than a row: fill character by character
        for c in token {
            if row_width + c.width > width && row_width > 0 {
                break_row(&mut rows);
                row_width = 0;
            }
            extend_row(&mut rows, std::slice::from_ref(c));
            row_width += c.width;
        }
    }

    rows.into_iter().map(|row| build_row(&row)).collect()
}

pub fn wrap_lines(lines: &[Line<'_>], width: usize) -> Vec<Line<'static>> {
    lines.iter().flat_map(|line| wrap_line(line, width)).collect()
}

/// Split into alternating runs of whitespace and non-whitespace characters.
fn tokens(chars: &[StyledChar]) -> impl Iterator<Item = &[StyledChar]> {
    let mut start = 0;
    std::iter::from_fn(move || {
        if start >= chars.len() {
            return None;
        }
        let space = chars[start].ch.is_whitespace();
        let len = chars[start..]
            .iter()
            .take_while(|c| c.ch.is_whitespace() == space)
            .count();
        let token = &chars[start..start + len];
        start += len;
        Some(token)
    })
}

/// Start a new row, dropping spaces left at the end of the current one.
fn break_row(rows: &mut Vec<Vec<&StyledChar>>) {
    if let Some(row) = rows.last_mut() {
        while row.last().is_some_and(|c| c.ch.is_whitespace()) {
            row.pop();
        }
    }
    rows.push(Vec::new());
}

fn extend_row<'a>(rows: &mut [Vec<&'a StyledChar>], token: &'a [StyledChar]) {
    if let Some(row) = rows.last_mut() {
        row.extend(token.iter());
    }
}

fn build_row(row: &[&StyledChar]) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut text = String::new();
    let mut style = None;

    for c in row {
        if style.is_some_and(|s| s != c.style) {
            spans.push(Span::styled(std::mem::take(&mut text), style.unwrap_or_default()));
        }
        style = Some(c.style);
        text.push(c.ch);
    }
    if let Some(style) = style {
        spans.push(Span::styled(text, style));
    }
    Line::from(spans)
}
