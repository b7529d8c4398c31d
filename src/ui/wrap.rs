//! Display-width-aware line wrapping.

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Wrap `text` into lines of at most `width` terminal cells, breaking at
/// whitespace runs. Whitespace at a break point is dropped, interior
/// whitespace that fits is kept verbatim, and a single word wider than a
/// whole line is split mid-word. Lines carry no trailing whitespace, and
/// `width == 0` yields no lines at all.
pub fn wrap_by_width(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return Vec::new();
    }

    let mut lines = Vec::new();
    let mut line = String::new();
    let mut line_width = 0;

    for token in tokens(text) {
        let token_width = token.width();

        if line_width + token_width <= width {
            line.push_str(token);
            line_width += token_width;
            continue;
        }

        let is_space = token.chars().all(char::is_whitespace);
        if is_space {
            push_line(&mut lines, &mut line, &mut line_width);
            continue;
        }

        push_line(&mut lines, &mut line, &mut line_width);
        if token_width <= width {
            line.push_str(token);
            line_width = token_width;
            continue;
        }

        for ch in token.chars() {
            let ch_width = ch.width().unwrap_or(0);
            if line_width + ch_width > width {
                push_line(&mut lines, &mut line, &mut line_width);
            }
            line.push(ch);
            line_width += ch_width;
        }
    }
    push_line(&mut lines, &mut line, &mut line_width);
    lines
}

/// Alternating runs of whitespace and non-whitespace, in order.
fn tokens(text: &str) -> impl Iterator<Item = &str> {
    let mut rest = text;
    std::iter::from_fn(move || {
        let first = rest.chars().next()?;
        let run_is_space = first.is_whitespace();
        let end = rest
            .char_indices()
            .find(|(_, c)| c.is_whitespace() != run_is_space)
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        let (token, tail) = rest.split_at(end);
        rest = tail;
        Some(token)
    })
}

fn push_line(lines: &mut Vec<String>, line: &mut String, line_width: &mut usize) {
    let trimmed = line.trim_end();
    if !trimmed.is_empty() {
        lines.push(trimmed.to_string());
    }
    line.clear();
    *line_width = 0;
}
