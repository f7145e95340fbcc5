//! # Text Layout
//!
//! Greedy line breaking over styled spans. Break opportunities come from
//! UAX#14; widths come from whatever measure function the caller supplies,
//! which in practice is the renderer's font metrics.

pub mod markup;

pub use markup::{parse_markup, Inline, RichText, Span};

use unicode_linebreak::{linebreaks, BreakOpportunity};

/// A contiguous piece of one span on one line.
#[derive(Debug, Clone, PartialEq)]
pub struct LineSegment {
    /// Index into the span list the line was broken from.
    pub span: usize,
    pub text: String,
    /// X offset from the start of the line.
    pub x: f64,
    pub width: f64,
}

/// A line of styled text after line breaking.
#[derive(Debug, Clone, PartialEq)]
pub struct BrokenLine {
    pub segments: Vec<LineSegment>,
    /// Width excluding trailing spaces.
    pub width: f64,
}

impl BrokenLine {
    pub fn text(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }
}

/// Compute UAX#14 break opportunities indexed by char position.
///
/// Each entry is the break opportunity *before* that character. Index 0 is
/// always `None`.
fn compute_break_opportunities(text: &str) -> Vec<Option<BreakOpportunity>> {
    let char_count = text.chars().count();
    let mut result = vec![None; char_count];

    let mut byte_to_char = vec![0usize; text.len() + 1];
    for (char_idx, (byte_idx, _)) in text.char_indices().enumerate() {
        byte_to_char[byte_idx] = char_idx;
    }
    byte_to_char[text.len()] = char_count;

    for (byte_offset, opp) in linebreaks(text) {
        let char_idx = byte_to_char[byte_offset];
        if char_idx < char_count {
            result[char_idx] = Some(opp);
        }
    }

    result
}

fn is_newline(ch: char) -> bool {
    matches!(ch, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

/// Break styled spans into lines no wider than `max_width`.
///
/// `char_width(ch, span_index)` returns the advance of a character in the
/// style of the given span. Empty input produces no lines; explicit newlines
/// always break, and consecutive newlines produce empty lines.
pub fn break_spans<F>(spans: &[Span], max_width: f64, char_width: F) -> Vec<BrokenLine>
where
    F: Fn(char, usize) -> f64,
{
    let mut text = String::new();
    let mut owners = Vec::new();
    for (idx, span) in spans.iter().enumerate() {
        text.push_str(&span.text);
        owners.extend(std::iter::repeat(idx).take(span.text.chars().count()));
    }
    if text.is_empty() {
        return Vec::new();
    }

    let chars: Vec<char> = text.chars().collect();
    let widths: Vec<f64> = chars
        .iter()
        .zip(&owners)
        .map(|(&ch, &owner)| if is_newline(ch) { 0.0 } else { char_width(ch, owner) })
        .collect();
    let break_opps = compute_break_opportunities(&text);

    let mut lines = Vec::new();
    let mut line_start = 0;
    let mut line_width = 0.0;
    let mut last_break_point: Option<usize> = None;

    for (i, &ch) in chars.iter().enumerate() {
        if i > 0 {
            match break_opps[i] {
                Some(BreakOpportunity::Mandatory) => {
                    let end = if is_newline(chars[i - 1]) { i - 1 } else { i };
                    lines.push(make_line(
                        &chars[line_start..end],
                        &owners[line_start..end],
                        &widths[line_start..end],
                    ));
                    line_start = i;
                    line_width = 0.0;
                    last_break_point = None;
                }
                Some(BreakOpportunity::Allowed) => {
                    last_break_point = Some(i - 1);
                }
                None => {}
            }
        }

        if is_newline(ch) {
            continue;
        }

        let w = widths[i];
        if line_width + w > max_width && line_start < i {
            match last_break_point {
                Some(bp) if bp >= line_start => {
                    let break_at = bp + 1;
                    lines.push(make_line(
                        &chars[line_start..break_at],
                        &owners[line_start..break_at],
                        &widths[line_start..break_at],
                    ));
                    line_start = break_at;
                    line_width = widths[line_start..=i].iter().sum();
                }
                _ => {
                    // No break opportunity on this line; force a break here.
                    lines.push(make_line(
                        &chars[line_start..i],
                        &owners[line_start..i],
                        &widths[line_start..i],
                    ));
                    line_start = i;
                    line_width = w;
                }
            }
            last_break_point = None;
            continue;
        }

        line_width += w;
    }

    if line_start < chars.len() {
        let end = if is_newline(chars[chars.len() - 1]) {
            chars.len() - 1
        } else {
            chars.len()
        };
        lines.push(make_line(
            &chars[line_start..end],
            &owners[line_start..end],
            &widths[line_start..end],
        ));
    }

    lines
}

/// Group characters into per-span segments and measure the line.
fn make_line(chars: &[char], owners: &[usize], widths: &[f64]) -> BrokenLine {
    let mut segments: Vec<LineSegment> = Vec::new();
    let mut x = 0.0;
    for ((&ch, &owner), &w) in chars.iter().zip(owners).zip(widths) {
        match segments.last_mut() {
            Some(seg) if seg.span == owner => {
                seg.text.push(ch);
                seg.width += w;
            }
            _ => segments.push(LineSegment {
                span: owner,
                text: ch.to_string(),
                x,
                width: w,
            }),
        }
        x += w;
    }

    // Trailing spaces don't count toward the line width.
    let trailing: f64 = chars
        .iter()
        .zip(widths)
        .rev()
        .take_while(|(c, _)| **c == ' ')
        .map(|(_, w)| w)
        .sum();

    BrokenLine {
        segments,
        width: x - trailing,
    }
}
