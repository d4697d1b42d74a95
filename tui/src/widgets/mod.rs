//! Widgets
//!
//! Custom ratatui widgets. Everything else is drawn with the stock
//! `Block`/`List`/`Paragraph` widgets.

pub mod chat_log;

pub use chat_log::{ChatLog, ChatLogState, LogRow, STREAMING_CURSOR};
