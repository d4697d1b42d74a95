//! Main Application
//!
//! The App struct manages the TUI lifecycle as a thin display client:
//! - Event loop (keyboard, resize, conductor messages)
//! - ConductorClient for orchestration
//! - DisplayState for rendering
//!
//! The App:
//! 1. Converts terminal events to SurfaceEvents
//! 2. Sends events to the Conductor task via ConductorClient
//! 3. Receives ConductorMessages and updates DisplayState
//! 4. Renders based on DisplayState
//!
//! # Layout
//!
//! ```text
//! ┌──────────────── Ollama Chat Interface ────────────────┐
//! │ Model Selection │ message blocks ...                  │
//! │ ● gemma3:12b    │                                     │
//! │   mistral:...   │ notices                             │
//! │                 │ [ Type your message... ]            │
//! │ status bar                                            │
//! └───────────────────────────────────────────────────────┘
//! ```

use std::time::Duration;

use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::StreamExt;
use ratatui::backend::Backend;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use ratatui::{Frame, Terminal};
use unicode_width::UnicodeWidthStr;

use chat_conductor::{ConductorMessage, ConductorState};

use crate::conductor_client::ConductorClient;
use crate::display::DisplayState;
use crate::theme::{self, ACCENT, BORDER, DIM_GRAY, TEXT};
use crate::widgets::{ChatLog, ChatLogState};

/// Redraw interval when nothing else happens (keeps the status fresh)
const TICK: Duration = Duration::from_millis(250);

/// Sidebar width (columns)
const SIDEBAR_WIDTH: u16 = 26;

/// Input box height (lines, including borders)
const INPUT_HEIGHT: u16 = 3;

/// Shown in the empty input box
const PLACEHOLDER: &str = "Type your message...";

/// Which widget receives keys
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Focus {
    /// The message input box
    Input,
    /// The model selection sidebar
    Sidebar,
}

/// Main application state
pub struct App {
    // === Core State ===
    /// Is the app still running?
    running: bool,

    // === Conductor Integration ===
    /// Client for communicating with the Conductor task
    conductor: ConductorClient,
    /// Display state derived from ConductorMessages
    display: DisplayState,

    // === Input State ===
    /// User input buffer
    input_buffer: String,
    /// Focused widget
    focus: Focus,
    /// Sidebar cursor
    sidebar: ListState,
    /// Conversation scroll
    chat_log: ChatLogState,
}

impl App {
    /// Create a new App around a running Conductor
    pub fn new(conductor: ConductorClient) -> Self {
        Self {
            running: true,
            conductor,
            display: DisplayState::new(),
            input_buffer: String::new(),
            focus: Focus::Input,
            sidebar: ListState::default(),
            chat_log: ChatLogState::default(),
        }
    }

    /// Main event loop
    pub async fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> anyhow::Result<()> {
        let mut event_stream = EventStream::new();
        let mut tick = tokio::time::interval(TICK);

        self.conductor.connect().await?;

        // Render initial frame immediately so user sees UI
        self.render(terminal)?;

        while self.running {
            tokio::select! {
                biased;

                // Terminal events first so typing stays responsive during a turn
                maybe_event = event_stream.next() => match maybe_event {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        self.handle_key(key).await;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "Terminal event error");
                    }
                    None => self.running = false,
                },

                msg = self.conductor.recv() => match msg {
                    Some(msg) => {
                        self.apply(msg);
                        self.process_conductor_messages();
                    }
                    None => {
                        tracing::info!("Conductor channel closed");
                        self.running = false;
                    }
                },

                _ = tick.tick() => {}
            }

            self.render(terminal)?;
        }

        Ok(())
    }

    /// Apply all pending messages from the Conductor
    pub fn process_conductor_messages(&mut self) {
        for msg in self.conductor.recv_all() {
            self.apply(msg);
        }
    }

    /// Wait for one Conductor message and apply it
    ///
    /// Returns `false` once the Conductor has stopped.
    pub async fn process_next_message(&mut self) -> bool {
        match self.conductor.recv().await {
            Some(msg) => {
                self.apply(msg);
                true
            }
            None => false,
        }
    }

    fn apply(&mut self, msg: ConductorMessage) {
        let moves_selection = matches!(
            msg,
            ConductorMessage::SessionInfo { .. } | ConductorMessage::ModelSelected { .. }
        );

        self.display.apply_message(msg);

        if moves_selection {
            let position = self
                .display
                .available_models
                .iter()
                .position(|m| *m == self.display.session_model);
            self.sidebar.select(position);
        }
        if self.display.quit_requested {
            self.running = false;
        }
    }

    /// Handle keyboard input
    pub async fn handle_key(&mut self, key: KeyEvent) {
        match key.code {
            // Quit
            KeyCode::Esc => self.quit().await,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.quit().await;
            }

            KeyCode::Tab | KeyCode::BackTab => {
                self.focus = match self.focus {
                    Focus::Input => Focus::Sidebar,
                    Focus::Sidebar => Focus::Input,
                };
            }

            // Conversation scrolling
            KeyCode::PageUp => {
                let page = self.chat_log.page();
                self.chat_log.scroll_up(page);
            }
            KeyCode::PageDown => {
                let page = self.chat_log.page();
                self.chat_log.scroll_down(page);
            }

            _ => match self.focus {
                Focus::Input => self.handle_input_key(key).await,
                Focus::Sidebar => self.handle_sidebar_key(key).await,
            },
        }
    }

    async fn handle_input_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => self.submit().await,
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.input_buffer.push(c);
            }
            KeyCode::Backspace => {
                self.input_buffer.pop();
            }
            _ => {}
        }
    }

    async fn handle_sidebar_key(&mut self, key: KeyEvent) {
        let count = self.display.available_models.len();
        if count == 0 {
            return;
        }

        match key.code {
            KeyCode::Up => {
                let i = self.sidebar.selected().map_or(0, |i| i.saturating_sub(1));
                self.sidebar.select(Some(i));
            }
            KeyCode::Down => {
                let i = self.sidebar.selected().map_or(0, |i| (i + 1).min(count - 1));
                self.sidebar.select(Some(i));
            }
            KeyCode::Enter => self.choose_model().await,
            _ => {}
        }
    }

    /// Select the model under the sidebar cursor, unless a turn is in flight
    async fn choose_model(&mut self) {
        if !self.display.accepts_input() {
            tracing::debug!(state = ?self.display.conductor_state, "Selection refused while busy");
            return;
        }

        let chosen = self
            .sidebar
            .selected()
            .and_then(|i| self.display.available_models.get(i))
            .cloned();
        let Some(model) = chosen else {
            return;
        };
        if model == self.display.session_model {
            return;
        }

        if let Err(e) = self.conductor.select_model(model).await {
            tracing::warn!(error = %e, "Failed to send model selection");
        }
    }

    /// Send the input buffer, unless a turn is still in flight
    async fn submit(&mut self) {
        if self.input_buffer.trim().is_empty() {
            return;
        }
        if !self.display.accepts_input() {
            tracing::debug!(state = ?self.display.conductor_state, "Input refused while busy");
            return;
        }

        let text = std::mem::take(&mut self.input_buffer);
        self.display.clear_notifications();
        self.chat_log.scroll_to_bottom();

        if let Err(e) = self.conductor.send_input(text).await {
            tracing::warn!(error = %e, "Failed to send input");
            self.running = false;
        }
    }

    async fn quit(&mut self) {
        if let Err(e) = self.conductor.request_quit().await {
            tracing::debug!(error = %e, "Conductor already gone");
        }
        self.running = false;
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    /// Draw one frame
    pub fn render<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> anyhow::Result<()> {
        terminal.draw(|frame| self.draw(frame))?;
        Ok(())
    }

    fn draw(&mut self, frame: &mut Frame) {
        let [title, body, status] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .areas(frame.area());

        let [sidebar, main] =
            Layout::horizontal([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(10)])
                .areas(body);

        let notice_height = self.display.notifications.len() as u16;
        let [log, notices, input] = Layout::vertical([
            Constraint::Min(1),
            Constraint::Length(notice_height),
            Constraint::Length(INPUT_HEIGHT),
        ])
        .areas(main);

        self.draw_title(frame, title);
        self.draw_sidebar(frame, sidebar);
        frame.render_stateful_widget(ChatLog::new(&self.display.messages), log, &mut self.chat_log);
        self.draw_notices(frame, notices);
        self.draw_input(frame, input);
        self.draw_status(frame, status);
    }

    fn draw_title(&self, frame: &mut Frame, area: Rect) {
        let title = Paragraph::new(self.display.title.as_str())
            .alignment(Alignment::Center)
            .style(theme::title_style());
        frame.render_widget(title, area);
    }

    fn draw_sidebar(&mut self, frame: &mut Frame, area: Rect) {
        let focused = self.focus == Focus::Sidebar;
        let items: Vec<ListItem> = self
            .display
            .available_models
            .iter()
            .map(|model| {
                let marker = if *model == self.display.session_model {
                    "● "
                } else {
                    "  "
                };
                ListItem::new(format!("{marker}{model}"))
            })
            .collect();

        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Model Selection ")
            .border_style(Style::default().fg(if focused { ACCENT } else { BORDER }));

        let highlight = if focused {
            Style::default().fg(ACCENT).add_modifier(Modifier::REVERSED)
        } else {
            Style::default()
        };

        let list = List::new(items)
            .block(block)
            .style(Style::default().fg(TEXT))
            .highlight_style(highlight);
        frame.render_stateful_widget(list, area, &mut self.sidebar);
    }

    fn draw_notices(&self, frame: &mut Frame, area: Rect) {
        let lines: Vec<Line> = self
            .display
            .notifications
            .iter()
            .map(|n| Line::styled(n.message.clone(), theme::notice_style(n.level)))
            .collect();
        frame.render_widget(Paragraph::new(lines), area);
    }

    fn draw_input(&self, frame: &mut Frame, area: Rect) {
        let focused = self.focus == Focus::Input;
        let busy = !self.display.accepts_input();

        let title = if busy {
            format!(" {} ", self.display.status_text())
        } else {
            " Message ".to_string()
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(Style::default().fg(if focused && !busy { ACCENT } else { BORDER }));

        let inner_width = area.width.saturating_sub(2) as usize;
        let line = if self.input_buffer.is_empty() {
            Line::from(Span::styled(PLACEHOLDER, Style::default().fg(DIM_GRAY)))
        } else {
            let cursor = if focused { "_" } else { "" };
            let shown = tail_fitting(&self.input_buffer, inner_width.saturating_sub(1));
            Line::from(Span::styled(format!("{shown}{cursor}"), Style::default().fg(TEXT)))
        };

        frame.render_widget(Paragraph::new(line).block(block), area);
    }

    fn draw_status(&self, frame: &mut Frame, area: Rect) {
        let scroll_info = if self.chat_log.scroll_offset > 0 {
            format!(" [^{} lines]", self.chat_log.scroll_offset)
        } else {
            String::new()
        };

        let status = format!(
            " {} | {} | Tab: models | PgUp/PgDn scroll | Esc to quit{}",
            self.display.status_text(),
            self.display.session_model,
            scroll_info
        );

        let style = match self.display.conductor_state {
            ConductorState::ProcessingTurn | ConductorState::PullingModel => {
                Style::default().fg(ACCENT)
            }
            _ => Style::default().fg(DIM_GRAY),
        };
        frame.render_widget(Paragraph::new(status).style(style), area);
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Display state
    pub fn display(&self) -> &DisplayState {
        &self.display
    }

    /// Current input buffer
    pub fn input(&self) -> &str {
        &self.input_buffer
    }

    /// Focused widget
    pub fn focus(&self) -> Focus {
        self.focus
    }

    /// Sidebar cursor position
    pub fn sidebar_cursor(&self) -> Option<usize> {
        self.sidebar.selected()
    }

    /// Is the app still running?
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Goodbye message for display after the TUI closes
    pub fn goodbye(&self) -> &str {
        self.display.quit_message.as_deref().unwrap_or("Goodbye!")
    }
}

/// Longest suffix of `text` that fits in `width` columns
fn tail_fitting(text: &str, width: usize) -> &str {
    if text.width() <= width {
        return text;
    }
    let mut start = text.len();
    let mut used = 0;
    for (i, c) in text.char_indices().rev() {
        let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w > width {
            break;
        }
        used += w;
        start = i;
    }
    &text[start..]
}
