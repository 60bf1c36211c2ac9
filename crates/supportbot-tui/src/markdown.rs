//! Minimal markdown to ratatui text conversion for chat bubbles
//!
//! Block level: headings, bullet and numbered lists, block quotes, fenced
//! code and horizontal rules. Inline: `**bold**`, `*italic*` and `` `code` ``.
//! Anything unclosed is shown literally.

use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span},
};

/// Convert a whole message into styled lines, one per source line
pub fn render_markdown(text: &str, base: Style) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let mut in_code_block = false;

    for raw in text.lines() {
        let trimmed = raw.trim_start();

        if trimmed.starts_with("```") {
            in_code_block = !in_code_block;
            continue;
        }

        if in_code_block {
            lines.push(Line::from(Span::styled(raw.to_string(), code_style(base))));
            continue;
        }

        lines.push(render_block_line(raw, base));
    }

    // Streaming replies end mid-line; keep the trailing empty line visible
    if text.ends_with('\n') {
        lines.push(Line::default());
    }

    lines
}

fn render_block_line(raw: &str, base: Style) -> Line<'static> {
    let trimmed = raw.trim_start();
    let indent = &raw[..raw.len() - trimmed.len()];

    if let Some((level, heading)) = parse_heading(trimmed) {
        let mut style = base.add_modifier(Modifier::BOLD);
        if level == 1 {
            style = style.add_modifier(Modifier::UNDERLINED);
        }
        return Line::from(parse_markdown_spans(heading, style));
    }

    if is_horizontal_rule(trimmed) {
        return Line::from(Span::styled("─".repeat(16), base.add_modifier(Modifier::DIM)));
    }

    if let Some(item) = trimmed
        .strip_prefix("- ")
        .or_else(|| trimmed.strip_prefix("* "))
        .or_else(|| trimmed.strip_prefix("+ "))
    {
        return prefixed_line(format!("{}• ", indent), item, base);
    }

    if let Some((number, item)) = parse_numbered_item(trimmed) {
        return prefixed_line(format!("{}{}. ", indent, number), item, base);
    }

    if let Some(quote) = trimmed.strip_prefix('>') {
        let quote = quote.strip_prefix(' ').unwrap_or(quote);
        return prefixed_line(
            format!("{}│ ", indent),
            quote,
            base.add_modifier(Modifier::ITALIC),
        );
    }

    Line::from(parse_markdown_spans(raw, base))
}

fn prefixed_line(prefix: String, rest: &str, base: Style) -> Line<'static> {
    let mut spans = vec![Span::styled(prefix, base)];
    spans.extend(parse_markdown_spans(rest, base));
    Line::from(spans)
}

fn parse_heading(line: &str) -> Option<(usize, &str)> {
    let level = line.chars().take_while(|c| *c == '#').count();
    if level == 0 || level > 6 {
        return None;
    }
    line[level..].strip_prefix(' ').map(|rest| (level, rest.trim()))
}

fn parse_numbered_item(line: &str) -> Option<(&str, &str)> {
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }
    let rest = line[digits..].strip_prefix(". ")?;
    Some((&line[..digits], rest))
}

fn is_horizontal_rule(line: &str) -> bool {
    let line = line.trim_end();
    line.len() >= 3 && ['-', '*', '_'].iter().any(|&c| line.chars().all(|ch| ch == c))
}

fn code_style(base: Style) -> Style {
    base.add_modifier(Modifier::REVERSED)
}

/// Parse `**bold**`, `*italic*` and `` `code` `` into styled spans
pub fn parse_markdown_spans(text: &str, base: Style) -> Vec<Span<'static>> {
    let chars: Vec<char> = text.chars().collect();
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut current_text = String::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();

        let marker: Option<(&[char], Style)> = match c {
            '`' => Some((&['`'][..], code_style(base))),
            '*' if next == Some('*') => Some((&['*', '*'][..], base.add_modifier(Modifier::BOLD))),
            // `2 * 3` is not emphasis
            '*' if next.is_some_and(|n| !n.is_whitespace()) => {
                Some((&['*'][..], base.add_modifier(Modifier::ITALIC)))
            }
            _ => None,
        };

        if let Some((delim, style)) = marker {
            let start = i + delim.len();
            if let Some(end) = find_closing(&chars, start, delim) {
                if end > start {
                    // Push any accumulated plain text
                    if !current_text.is_empty() {
                        spans.push(Span::styled(std::mem::take(&mut current_text), base));
                    }
                    let inner: String = chars[start..end].iter().collect();
                    spans.push(Span::styled(inner, style));
                    i = end + delim.len();
                    continue;
                }
            }
            // No closing marker, keep it literal
            current_text.extend(delim.iter());
            i = start;
            continue;
        }

        current_text.push(c);
        i += 1;
    }

    if !current_text.is_empty() {
        spans.push(Span::styled(current_text, base));
    }

    spans
}

fn find_closing(chars: &[char], from: usize, delim: &[char]) -> Option<usize> {
    (from..chars.len()).find(|&j| chars[j..].starts_with(delim))
}

/// Word-wrap a styled line to `width` columns, keeping span styles.
/// Words wider than a whole line are split hard.
pub fn wrap_line(line: Line<'static>, width: usize) -> Vec<Line<'static>> {
    if width == 0 {
        return vec![line];
    }

    let mut lines = Vec::new();
    let mut current: Vec<Span<'static>> = Vec::new();
    let mut current_len = 0;

    for span in line.spans {
        let style = span.style;
        for word in span.content.split_inclusive(' ') {
            let word_len = word.trim_end_matches(' ').chars().count();

            if current_len > 0 && current_len + word_len > width {
                lines.push(finish_line(std::mem::take(&mut current)));
                current_len = 0;
            }

            let mut rest = word;
            while rest.trim_end_matches(' ').chars().count() > width - current_len {
                let split = char_to_byte_index(rest, width - current_len);
                current.push(Span::styled(rest[..split].to_string(), style));
                lines.push(finish_line(std::mem::take(&mut current)));
                current_len = 0;
                rest = &rest[split..];
            }

            if !rest.is_empty() {
                current_len += rest.chars().count();
                current.push(Span::styled(rest.to_string(), style));
            }
        }
    }

    if !current.is_empty() {
        lines.push(finish_line(current));
    }
    if lines.is_empty() {
        lines.push(Line::default());
    }

    lines
}

fn finish_line(mut spans: Vec<Span<'static>>) -> Line<'static> {
    // Trailing spaces at a wrap point would widen the bubble
    if let Some(last) = spans.last_mut() {
        let trimmed = last.content.trim_end_matches(' ');
        if trimmed.len() != last.content.len() {
            last.content = trimmed.to_string().into();
        }
    }
    spans.retain(|s| !s.content.is_empty());
    Line::from(spans)
}

/// Convert a character index to a byte index for UTF-8 safe slicing
pub fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}
