//! Theme and Colors
//!
//! The Delphi widget palette: an orange accent for the user's side of the
//! conversation, a light grey pill behind citation callouts, and muted greys
//! for everything that is not content.

use ratatui::style::{Color, Modifier, Style};

// ============================================================================
// Palette
// ============================================================================

/// User messages and the input line
pub const USER_ORANGE: Color = Color::Rgb(255, 87, 34); // #ff5722

/// Light text on orange
pub const LIGHT: Color = Color::Rgb(245, 245, 245); // #f5f5f5

/// Callout pill background
pub const CALLOUT_BG: Color = Color::Rgb(224, 224, 224); // #e0e0e0

/// Callout digits
pub const CALLOUT_FG: Color = Color::Rgb(60, 60, 60);

/// Upgrade prompt and errors
pub const ERROR_RED: Color = Color::Rgb(255, 80, 80);

/// Placeholders, hints, separators
pub const DIM_GRAY: Color = Color::Rgb(100, 100, 100);

// ============================================================================
// Styles
// ============================================================================

/// Body text of a user message
#[must_use]
pub fn user_text() -> Style {
    Style::default().fg(USER_ORANGE)
}

/// Speaker label of a user message
#[must_use]
pub fn user_label() -> Style {
    user_text().add_modifier(Modifier::BOLD)
}

/// Body text of a clone reply
#[must_use]
pub fn clone_text() -> Style {
    Style::default()
}

/// Speaker label of a clone reply
#[must_use]
pub fn clone_label() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

/// Superscript citation
#[must_use]
pub fn callout() -> Style {
    Style::default().fg(CALLOUT_FG).bg(CALLOUT_BG)
}

/// "please wait..." placeholder
#[must_use]
pub fn placeholder() -> Style {
    Style::default().fg(DIM_GRAY).add_modifier(Modifier::ITALIC)
}

/// Upgrade prompt in the header
#[must_use]
pub fn upgrade_prompt() -> Style {
    Style::default().fg(ERROR_RED).add_modifier(Modifier::BOLD)
}

/// Hints, separators, the status line
#[must_use]
pub fn dim() -> Style {
    Style::default().fg(DIM_GRAY)
}

/// Highlighted roster entry
#[must_use]
pub fn selected_user() -> Style {
    Style::default()
        .fg(LIGHT)
        .bg(USER_ORANGE)
        .add_modifier(Modifier::BOLD)
}
