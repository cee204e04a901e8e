//! Main Application
//!
//! The App struct manages the TUI lifecycle as a thin display client:
//! - Event loop (keyboard, resize, job outcomes)
//! - SessionClient for the chat session
//! - Layout and rendering
//!
//! # Layout
//!
//! ```text
//! ┌ header: clone name  clone title    please upgrade your plan ┐
//! │ transcript (~70%)                  │ users (~30%)           │
//! │                                    │                        │
//! ├ input (hidden when unselected or locked) ───────────────────┤
//! └ status ─────────────────────────────────────────────────────┘
//! ```

use std::time::Duration;

use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::StreamExt;
use ratatui::backend::Backend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::{Frame, Terminal};

use delphi_core::controller::SessionState;
use delphi_core::ChatConfig;

use crate::display::transcript_lines;
use crate::session_client::SessionClient;
use crate::theme;
use crate::widgets::{TextBlock, TextBlockState, UserPanel};

/// Input box height (lines), separator included
const INPUT_HEIGHT: u16 = 3;

/// Frame tick for the busy spinner
const FRAME_DURATION: Duration = Duration::from_millis(100);

const SPINNER: &[char] = &['|', '/', '-', '\\'];

/// Main application state
pub struct App {
    // === Core State ===
    /// Is the app still running?
    running: bool,
    /// Clone identity shown in the header
    clone_name: String,
    clone_title: String,

    // === Session Integration ===
    /// Client for the embedded session controller
    session: SessionClient,

    // === View State ===
    /// Transcript scroll state
    transcript: TextBlockState,
    /// Frames rendered while a job was in flight
    spinner_frame: usize,
}

impl App {
    /// Create a new App instance
    pub fn new(session: SessionClient, config: &ChatConfig) -> Self {
        Self {
            running: true,
            clone_name: config.clone_name.clone(),
            clone_title: config.clone_title.clone(),
            session,
            transcript: TextBlockState::default(),
            spinner_frame: 0,
        }
    }

    /// The session being displayed
    pub fn session(&self) -> &SessionClient {
        &self.session
    }

    /// Mutable session access (pre-selection, tests)
    pub fn session_mut(&mut self) -> &mut SessionClient {
        &mut self.session
    }

    /// Whether the event loop should keep going
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Main event loop
    pub async fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> anyhow::Result<()> {
        // Create async event stream for non-blocking terminal events
        let mut event_stream = EventStream::new();
        let mut ticker = tokio::time::interval(FRAME_DURATION);

        // Render initial frame immediately so user sees UI
        terminal.draw(|frame| self.draw(frame))?;

        while self.running {
            tokio::select! {
                biased;

                // Terminal events - highest priority
                maybe_event = event_stream.next() => match maybe_event {
                    // Only handle Press events (not Release or Repeat)
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        self.handle_key(key);
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::error!(error = %e, "terminal event stream failed");
                        self.running = false;
                    }
                    None => self.running = false,
                },

                // Finished network jobs
                Some(outcome) = self.session.next_outcome() => {
                    if self.session.apply(outcome) {
                        self.transcript.scroll_to_bottom();
                    }
                }

                // Frame tick
                _ = ticker.tick() => {
                    if self.session.controller().is_send_disabled() {
                        self.spinner_frame = self.spinner_frame.wrapping_add(1);
                    }
                }
            }

            terminal.draw(|frame| self.draw(frame))?;
        }

        Ok(())
    }

    /// Handle keyboard input
    pub fn handle_key(&mut self, key: KeyEvent) {
        match key.code {
            // Quit
            KeyCode::Esc => self.running = false,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.running = false;
            }

            // Roster cursor
            KeyCode::Tab => self.session.cycle_highlight(true),
            KeyCode::BackTab => self.session.cycle_highlight(false),

            // Pick the highlighted user, or submit the message
            KeyCode::Enter => {
                if self.session.controller().is_highlight_pending() {
                    self.session.commit_highlight();
                } else {
                    self.session.submit();
                }
                self.transcript.scroll_to_bottom();
            }

            // Typing
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                if self.session.controller().is_input_visible() {
                    self.session.push_input(c);
                }
            }
            KeyCode::Backspace => self.session.backspace(),

            // Conversation scrolling
            KeyCode::PageUp => {
                let page = self.transcript.page();
                self.transcript.scroll_up(page);
            }
            KeyCode::PageDown => {
                let page = self.transcript.page();
                self.transcript.scroll_down(page);
            }

            _ => {}
        }
    }

    /// Render the UI
    pub fn draw(&mut self, frame: &mut Frame<'_>) {
        let input_height = if self.session.controller().is_input_visible() {
            INPUT_HEIGHT
        } else {
            0
        };

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(1),
                Constraint::Length(input_height),
                Constraint::Length(1),
            ])
            .split(frame.area());

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
            .split(rows[1]);

        self.render_header(frame, rows[0]);
        self.render_transcript(frame, body[0]);

        let controller = self.session.controller();
        frame.render_widget(
            UserPanel::new(controller.users(), controller.selected_index())
                .highlighted(controller.highlighted_index()),
            body[1],
        );

        if input_height > 0 {
            self.render_input(frame, rows[2]);
        }
        self.render_status(frame, rows[3]);
    }

    /// Header with the upgrade prompt on the right when locked
    fn render_header(&self, frame: &mut Frame<'_>, area: Rect) {
        let controller = self.session.controller();
        let mut spans = vec![Span::styled(
            format!(" {}", self.clone_name),
            theme::clone_label(),
        )];
        if !self.clone_title.is_empty() {
            spans.push(Span::styled(format!("  {}", self.clone_title), theme::dim()));
        }
        let buf = frame.buffer_mut();
        buf.set_line(area.x, area.y, &Line::from(spans), area.width);

        if controller.is_input_locked() {
            if let Some(prompt) = controller.prompt() {
                let width = prompt.chars().count() as u16 + 1;
                let x = area.x + area.width.saturating_sub(width);
                buf.set_stringn(x, area.y, prompt, area.width as usize, theme::upgrade_prompt());
            }
        }
    }

    /// Render the conversation transcript
    fn render_transcript(&mut self, frame: &mut Frame<'_>, area: Rect) {
        let controller = self.session.controller();
        let inner = Rect {
            x: area.x + 1,
            width: area.width.saturating_sub(2),
            ..area
        };

        if matches!(controller.state(), SessionState::Unselected) {
            let prompt = controller.prompt().unwrap_or_default();
            let hint = Line::from(vec![
                Span::styled(prompt, theme::dim()),
                Span::styled("  (Tab to choose, Enter to select)", theme::dim()),
            ]);
            frame.buffer_mut().set_line(inner.x, inner.y, &hint, inner.width);
            return;
        }

        let lines = transcript_lines(controller.messages(), inner.width as usize);
        frame.render_stateful_widget(TextBlock::new(&lines), inner, &mut self.transcript);
    }

    /// Render the input line
    fn render_input(&self, frame: &mut Frame<'_>, area: Rect) {
        let controller = self.session.controller();
        let buf = frame.buffer_mut();

        let separator = "-".repeat(area.width as usize);
        buf.set_string(area.x, area.y, &separator, theme::dim());

        let text_height = area.height.saturating_sub(1) as usize;
        let text_width = area.width.saturating_sub(2) as usize;
        if text_width < 5 || text_height < 1 {
            return;
        }

        let style = if controller.is_send_disabled() {
            theme::dim()
        } else {
            theme::user_text()
        };

        let full_input = format!("> {}_", controller.input());
        let wrapped = textwrap::wrap(&full_input, text_width);
        let skip = wrapped.len().saturating_sub(text_height);

        for (i, line) in wrapped.iter().skip(skip).enumerate() {
            let y = area.y + 1 + i as u16;
            buf.set_string(area.x + 1, y, line, style);
        }
    }

    /// Render status bar
    fn render_status(&self, frame: &mut Frame<'_>, area: Rect) {
        let controller = self.session.controller();

        let (state_str, state_style) = if let Some(error) = controller.last_error() {
            (format!("error: {error}"), Style::default().fg(theme::ERROR_RED))
        } else if controller.is_send_disabled() {
            let spin = SPINNER[self.spinner_frame % SPINNER.len()];
            (format!("{spin} waiting for Delphi"), theme::dim())
        } else {
            (controller.state().name().to_string(), theme::dim())
        };

        let scroll_info = if self.transcript.scroll_offset > 0 {
            format!(" [^{} lines]", self.transcript.scroll_offset)
        } else {
            String::new()
        };

        let status = format!(
            " {state_str} | Tab user | Enter select/send | PgUp/PgDn scroll | Esc quit{scroll_info}"
        );
        frame
            .buffer_mut()
            .set_stringn(area.x, area.y, &status, area.width as usize, state_style);
    }
}
