mod table;

pub use table::render_table;

use crate::chain::CompiledChain;
use crate::matcher::Matcher;
use nu_ansi_term::{Color as AnsiColor, Style};
use serde::{Deserialize, Serialize};
use std::io::{self, IsTerminal};
use std::ops::Range;

/// How a piece of the preview relates to the pending rename.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mark {
    Kept,
    Removed,
    Added,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub text: String,
    pub mark: Mark,
}

impl Span {
    pub fn new(text: impl Into<String>, mark: Mark) -> Self {
        Self {
            text: text.into(),
            mark,
        }
    }

    pub fn kept(text: impl Into<String>) -> Self {
        Self::new(text, Mark::Kept)
    }

    pub fn removed(text: impl Into<String>) -> Self {
        Self::new(text, Mark::Removed)
    }

    pub fn added(text: impl Into<String>) -> Self {
        Self::new(text, Mark::Added)
    }
}

/// Annotate `text` with what the chain would remove and add.
///
/// Mirrors `CompiledChain::apply` stage by stage, so the kept and added
/// spans always concatenate to the applied result.
pub fn annotate(text: &str, chain: &CompiledChain<'_>) -> Vec<Span> {
    let params = chain.chain();
    if params.is_identity() {
        return normalize(vec![Span::kept(text)]);
    }

    let len = text.chars().count();
    let trim = params.trim_plan(len);
    if trim.removes_everything {
        return normalize(vec![Span::removed(text)]);
    }

    let head_end = char_offset(text, trim.begin);
    let tail_start = char_offset(text, len - trim.end);
    let mut spans = vec![
        Span::removed(&text[..head_end]),
        Span::kept(&text[head_end..tail_start]),
        Span::removed(&text[tail_start..]),
    ];

    if !params.prefix.is_empty() {
        spans.insert(0, Span::added(&params.prefix));
    }
    if !params.suffix.is_empty() {
        spans.push(Span::added(&params.suffix));
    }
    if let Some(matcher) = chain.matcher() {
        spans = annotate_replacements(spans, matcher, &params.replace);
    }

    normalize(spans)
}

/// Mark every search match in the visible text as removed and follow it
/// with the replacement.
///
/// Matches are found on the text as it stands at this stage (removed spans
/// excluded) and their offsets are mapped back onto the span list.
fn annotate_replacements(spans: Vec<Span>, matcher: &Matcher, replacement: &str) -> Vec<Span> {
    let visible = spans_result(&spans);
    let matches = matcher.find_matches(&visible);
    if matches.is_empty() {
        return spans;
    }

    let mut out = Vec::with_capacity(spans.len() + matches.len() * 2);
    let mut pending = matches.iter().peekable();
    let mut offset = 0;

    for span in spans {
        if span.mark == Mark::Removed {
            out.push(span);
            continue;
        }
        let end = offset + span.text.len();
        let mut pos = offset;
        while pos < end {
            match pending.peek() {
                Some(m) if m.start <= pos => {
                    let stop = m.end.min(end);
                    out.push(Span::removed(&visible[pos..stop]));
                    pos = stop;
                    if stop == m.end {
                        out.push(Span::added(replacement));
                        pending.next();
                    }
                },
                Some(Range { start, .. }) => {
                    let stop = (*start).min(end);
                    out.push(Span::new(&visible[pos..stop], span.mark));
                    pos = stop;
                },
                None => {
                    out.push(Span::new(&visible[pos..end], span.mark));
                    pos = end;
                },
            }
        }
        offset = end;
    }

    // Empty matches at the very end of the text
    for _ in pending {
        out.push(Span::added(replacement));
    }

    out
}

/// Drop empty spans and merge neighbours with the same mark.
fn normalize(spans: Vec<Span>) -> Vec<Span> {
    let mut out: Vec<Span> = Vec::with_capacity(spans.len());
    for span in spans {
        if span.text.is_empty() {
            continue;
        }
        match out.last_mut() {
            Some(last) if last.mark == span.mark => last.text.push_str(&span.text),
            _ => out.push(span),
        }
    }
    out
}

fn char_offset(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map_or(text.len(), |(offset, _)| offset)
}

/// The name the annotated spans stand for once applied.
pub fn spans_result(spans: &[Span]) -> String {
    spans
        .iter()
        .filter(|s| s.mark != Mark::Removed)
        .map(|s| s.text.as_str())
        .collect()
}

/// Render spans with `<r>removed</>` and `<a>added</>` markers.
pub fn render_markup(spans: &[Span]) -> String {
    let mut output = String::new();
    for span in spans {
        match span.mark {
            Mark::Kept => output.push_str(&span.text),
            Mark::Removed => {
                output.push_str("<r>");
                output.push_str(&span.text);
                output.push_str("</>");
            },
            Mark::Added => {
                output.push_str("<a>");
                output.push_str(&span.text);
                output.push_str("</>");
            },
        }
    }
    output
}

/// Render spans for a terminal; falls back to markup without colors.
pub fn render_ansi(spans: &[Span], use_color: bool) -> String {
    if !use_color {
        return render_markup(spans);
    }

    let removed = Style::new()
        .on(AnsiColor::Rgb(0xC0, 0x52, 0x6A))
        .fg(AnsiColor::Rgb(0xFF, 0xFF, 0xFF))
        .strikethrough();
    let added = Style::new()
        .on(AnsiColor::Rgb(0x00, 0xA9, 0x58))
        .fg(AnsiColor::Rgb(0xFF, 0xFF, 0xFF));

    spans
        .iter()
        .map(|span| match span.mark {
            Mark::Kept => span.text.clone(),
            Mark::Removed => removed.paint(span.text.as_str()).to_string(),
            Mark::Added => added.paint(span.text.as_str()).to_string(),
        })
        .collect()
}

/// Determine whether to use colors based on explicit preference or terminal detection
pub fn should_use_color(use_color: Option<bool>) -> bool {
    match use_color {
        Some(explicit_color) => explicit_color,
        None => io::stdout().is_terminal(),
    }
}
