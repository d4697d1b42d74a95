//! ChatLog Widget
//!
//! A borderless, scrollable column of bordered message blocks.
//!
//! Each message becomes a box drawn with its role's background:
//!
//! ```text
//! ┌─ You ──────────────────────┐
//! │ Hello                      │
//! └────────────────────────────┘
//! ```
//!
//! Scrolling counts lines up from the bottom, so new output stays in view
//! unless the user has scrolled back.

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::widgets::StatefulWidget;
use textwrap::wrap;
use unicode_width::UnicodeWidthStr;

use crate::display::{DisplayMessage, DisplayRole};
use crate::theme::{ASSISTANT_BG, BORDER, DIM_GRAY, ERROR_RED, TEXT, USER_BG};

/// Drawn after the text of the block still being streamed
pub const STREAMING_CURSOR: &str = "▌";

/// Block widths below this are not drawn
const MIN_WIDTH: u16 = 8;

/// State for the chat log
#[derive(Debug, Default)]
pub struct ChatLogState {
    /// Scroll offset (lines up from the bottom, 0 = latest)
    pub scroll_offset: usize,
    /// Total content lines at the last render
    pub total_lines: usize,
    /// Visible height at the last render
    pub viewport: usize,
}

impl ChatLogState {
    /// Scroll towards older messages
    pub fn scroll_up(&mut self, lines: usize) {
        let max = self.total_lines.saturating_sub(self.viewport);
        self.scroll_offset = (self.scroll_offset + lines).min(max);
    }

    /// Scroll towards newer messages
    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(lines);
    }

    /// Jump to the latest message
    pub fn scroll_to_bottom(&mut self) {
        self.scroll_offset = 0;
    }

    /// Half a page, at least one line
    pub fn page(&self) -> usize {
        (self.viewport / 2).max(1)
    }
}

/// One rendered row of the log
#[derive(Clone, Debug, PartialEq)]
pub struct LogRow {
    /// Row text, already padded to the block width
    pub text: String,
    /// Row style (background fills the block)
    pub style: Style,
}

/// The conversation as a column of message blocks
pub struct ChatLog<'a> {
    messages: &'a [DisplayMessage],
}

impl<'a> ChatLog<'a> {
    /// Log over the given messages
    pub fn new(messages: &'a [DisplayMessage]) -> Self {
        Self { messages }
    }

    /// Lay out every message block for a given width
    pub fn rows(&self, width: u16) -> Vec<LogRow> {
        let mut rows = Vec::new();
        if width < MIN_WIDTH {
            return rows;
        }

        for msg in self.messages {
            message_rows(msg, width as usize, &mut rows);
            rows.push(LogRow {
                text: String::new(),
                style: Style::default(),
            });
        }
        rows
    }
}

fn message_rows(msg: &DisplayMessage, width: usize, rows: &mut Vec<LogRow>) {
    let bg = match msg.role {
        DisplayRole::User => USER_BG,
        DisplayRole::Assistant => ASSISTANT_BG,
    };
    let border = Style::default().fg(BORDER).bg(bg);
    let body = Style::default().fg(TEXT).bg(bg);
    let inner = width - 4;

    // ┌─ Label ───┐
    let label = format!("─ {} ", msg.role.label());
    let fill = width
        .saturating_sub(2)
        .saturating_sub(label.width());
    rows.push(LogRow {
        text: format!("┌{label}{}┐", "─".repeat(fill)),
        style: border.add_modifier(Modifier::BOLD),
    });

    let mut content = msg.content.clone();
    if msg.streaming {
        content.push_str(STREAMING_CURSOR);
    }

    for line in content.lines() {
        if line.is_empty() {
            rows.push(boxed("", inner, body));
            continue;
        }
        for piece in wrap(line, inner) {
            rows.push(boxed(&piece, inner, body));
        }
    }
    if content.is_empty() {
        rows.push(boxed("", inner, body));
    }

    if let Some(ref error) = msg.error {
        for piece in wrap(error, inner) {
            rows.push(boxed(&piece, inner, Style::default().fg(ERROR_RED).bg(bg)));
        }
    }

    rows.push(LogRow {
        text: format!("└{}┘", "─".repeat(width - 2)),
        style: border,
    });
}

fn boxed(text: &str, inner: usize, style: Style) -> LogRow {
    let pad = inner.saturating_sub(text.width());
    LogRow {
        text: format!("│ {text}{} │", " ".repeat(pad)),
        style,
    }
}

impl<'a> StatefulWidget for ChatLog<'a> {
    type State = ChatLogState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let rows = self.rows(area.width);
        let height = area.height as usize;

        state.total_lines = rows.len();
        state.viewport = height;

        // Clamp scroll
        let max_scroll = state.total_lines.saturating_sub(height);
        state.scroll_offset = state.scroll_offset.min(max_scroll);

        let end = state.total_lines.saturating_sub(state.scroll_offset);
        let start = end.saturating_sub(height);

        if rows.is_empty() {
            buf.set_stringn(
                area.x,
                area.y,
                "No messages yet. Say hello!",
                area.width as usize,
                Style::default().fg(DIM_GRAY),
            );
            return;
        }

        for (i, row) in rows[start..end].iter().enumerate() {
            let y = area.y + i as u16;
            buf.set_stringn(area.x, y, &row.text, area.width as usize, row.style);
        }
    }
}
