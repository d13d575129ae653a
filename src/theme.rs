//! Palette for the chat UI.
//!
//! Colors follow the product palette: a dark blue primary for chrome, a
//! light blue accent for the user's bubbles and a pink accent for the AI's.

use ratatui::style::{Color, Modifier, Style};

/// Header / chrome accent (#1976d2).
pub const PRIMARY: Color = Color::Rgb(0x19, 0x76, 0xd2);

/// User message accent (#2196f3).
pub const USER_ACCENT: Color = Color::Rgb(0x21, 0x96, 0xf3);

/// AI message accent (#dc004e).
pub const AI_ACCENT: Color = Color::Rgb(0xdc, 0x00, 0x4e);

/// Divider / inactive border color (#e0e0e0 in the product palette;
/// DarkGray reads better on both light and dark terminals).
pub const DIVIDER: Color = Color::DarkGray;

/// Active border color for the focused input or dialog field.
pub const ACTIVE_BORDER: Color = Color::Yellow;

pub fn user_label() -> Style {
    Style::default().fg(USER_ACCENT).add_modifier(Modifier::BOLD)
}

pub fn ai_label() -> Style {
    Style::default().fg(AI_ACCENT).add_modifier(Modifier::BOLD)
}

pub fn dim() -> Style {
    Style::default().fg(Color::DarkGray)
}
