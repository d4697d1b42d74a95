//! Theme and Colors
//!
//! Dark chat palette: each message sits in its own bordered block whose
//! background depends on who wrote it.

use ratatui::style::{Color, Modifier, Style};

use chat_conductor::NotifyLevel;

// ============================================================================
// Message Blocks
// ============================================================================

/// User message background (#313131)
pub const USER_BG: Color = Color::Rgb(49, 49, 49);

/// Assistant message background (#1e1e1e)
pub const ASSISTANT_BG: Color = Color::Rgb(30, 30, 30);

/// Block border (#3f3f3f)
pub const BORDER: Color = Color::Rgb(63, 63, 63);

/// Message body text
pub const TEXT: Color = Color::Rgb(230, 230, 230);

// ============================================================================
// UI Colors
// ============================================================================

/// Title bar and focused widgets
pub const ACCENT: Color = Color::Rgb(120, 170, 255);

/// Role labels and hints
pub const DIM_GRAY: Color = Color::Rgb(110, 110, 110);

/// Error red
pub const ERROR_RED: Color = Color::Rgb(255, 80, 80);

/// Warning yellow
pub const WARNING_YELLOW: Color = Color::Rgb(240, 200, 90);

/// Success green
pub const SUCCESS_GREEN: Color = Color::Rgb(120, 230, 120);

/// Style for a notice line
pub fn notice_style(level: NotifyLevel) -> Style {
    let fg = match level {
        NotifyLevel::Info => ACCENT,
        NotifyLevel::Warning => WARNING_YELLOW,
        NotifyLevel::Error => ERROR_RED,
        NotifyLevel::Success => SUCCESS_GREEN,
    };
    Style::default().fg(fg)
}

/// Style for the title bar
pub fn title_style() -> Style {
    Style::default()
        .fg(TEXT)
        .bg(BORDER)
        .add_modifier(Modifier::BOLD)
}
