//! Transcript Display
//!
//! Turns the controller's transcript into styled, width-wrapped lines for the
//! transcript view.
//!
//! Each message becomes a speaker label followed by its body. Citation
//! markers in the body are drawn as superscript digits on a light pill and
//! stay glued to the word before them, so `Paris[1]` wraps as one unit.
//! Messages are separated by a blank line.

use ratatui::style::Style;
use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthChar;

use delphi_core::{annotate, Message, Segment, Sender};

use crate::theme;

/// Speaker label for user messages
pub const USER_LABEL: &str = "You:";

/// Speaker label for clone replies
pub const CLONE_LABEL: &str = "Delphi:";

const SUPERSCRIPT_DIGITS: [char; 10] = ['⁰', '¹', '²', '³', '⁴', '⁵', '⁶', '⁷', '⁸', '⁹'];

/// Superscript form of a digit label
#[must_use]
pub fn superscript(label: &str) -> String {
    label
        .chars()
        .map(|c| match c.to_digit(10) {
            Some(d) => SUPERSCRIPT_DIGITS[d as usize],
            None => c,
        })
        .collect()
}

/// A styled character, the unit the wrapper works on
type Cell = (char, Style);

enum Piece {
    Word(Vec<Cell>),
    Newline,
}

/// Split a message into words and hard line breaks
fn pieces(message: &Message) -> Vec<Piece> {
    let (label, label_style, body_style) = match message.sender {
        _ if message.is_placeholder() => (CLONE_LABEL, theme::clone_label(), theme::placeholder()),
        Sender::User => (USER_LABEL, theme::user_label(), theme::user_text()),
        Sender::Clone => (CLONE_LABEL, theme::clone_label(), theme::clone_text()),
    };

    let mut out = vec![Piece::Word(label.chars().map(|c| (c, label_style)).collect())];
    let mut word: Vec<Cell> = Vec::new();

    for segment in annotate(&message.text) {
        match segment {
            Segment::Text(text) => {
                for c in text.chars() {
                    if c == '\n' {
                        flush(&mut out, &mut word);
                        out.push(Piece::Newline);
                    } else if c.is_whitespace() {
                        flush(&mut out, &mut word);
                    } else {
                        word.push((c, body_style));
                    }
                }
            }
            Segment::Callout(label) => {
                let style = theme::callout();
                word.extend(superscript(label).chars().map(|c| (c, style)));
            }
        }
    }
    flush(&mut out, &mut word);
    out
}

fn flush(out: &mut Vec<Piece>, word: &mut Vec<Cell>) {
    if !word.is_empty() {
        out.push(Piece::Word(std::mem::take(word)));
    }
}

fn cell_width(cell: &Cell) -> usize {
    cell.0.width().unwrap_or(0)
}

/// Collapse runs of equally styled cells into spans
fn to_line(cells: &[Cell]) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut run = String::new();
    let mut run_style: Option<Style> = None;

    for &(c, style) in cells {
        if run_style != Some(style) {
            if let Some(prev) = run_style {
                spans.push(Span::styled(std::mem::take(&mut run), prev));
            }
            run_style = Some(style);
        }
        run.push(c);
    }
    if let Some(style) = run_style {
        spans.push(Span::styled(run, style));
    }
    Line::from(spans)
}

/// Greedy word wrap over styled cells
fn wrap_pieces(pieces: Vec<Piece>, width: usize) -> Vec<Line<'static>> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut current: Vec<Cell> = Vec::new();
    let mut current_width = 0usize;

    for piece in pieces {
        match piece {
            Piece::Newline => {
                lines.push(to_line(&current));
                current.clear();
                current_width = 0;
            }
            Piece::Word(word) => {
                let word_width: usize = word.iter().map(cell_width).sum();

                if current_width > 0 && current_width + 1 + word_width > width {
                    lines.push(to_line(&current));
                    current.clear();
                    current_width = 0;
                }
                if current_width > 0 {
                    current.push((' ', Style::default()));
                    current_width += 1;
                }

                if word_width <= width {
                    current.extend(word);
                    current_width += word_width;
                    continue;
                }

                // Longer than a whole line: hard break
                for cell in word {
                    let w = cell_width(&cell);
                    if current_width + w > width && current_width > 0 {
                        lines.push(to_line(&current));
                        current.clear();
                        current_width = 0;
                    }
                    current.push(cell);
                    current_width += w;
                }
            }
        }
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(to_line(&current));
    }
    lines
}

/// Wrapped lines of one message
#[must_use]
pub fn message_lines(message: &Message, width: usize) -> Vec<Line<'static>> {
    wrap_pieces(pieces(message), width)
}

/// Wrapped lines of a whole transcript, a blank line after each message
#[must_use]
pub fn transcript_lines(messages: &[Message], width: usize) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for message in messages {
        lines.extend(message_lines(message, width));
        lines.push(Line::default());
    }
    lines
}
