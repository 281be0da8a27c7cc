// src/app.rs
//
// Terminal UI for the HC-05 console.
//
// Single event loop on the tokio runtime: crossterm's EventStream for key
// input, the session's link events for inbound records, and a redraw tick.
// Three panes scroll the temperature, distance and LDR logs pinned to the
// newest line; a form at the bottom edits the two LCD rows.

use std::time::Duration;

use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::StreamExt;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph};
use ratatui::{DefaultTerminal, Frame};

use crate::classify::Channel;
use crate::command::Command;
use crate::io::{LinkConfig, LinkEvent};
use crate::lcd::LCD_WIDTH;
use crate::session::{Session, SessionStatus};

const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Resolved runtime options (settings file merged with CLI flags).
#[derive(Clone, Debug)]
pub struct AppOptions {
    pub port: Option<String>,
    pub baud_rate: u32,
    pub log_limit: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    Normal,
    /// Editing the LCD form; keystrokes go to the focused input row.
    LcdEntry,
}

/// Status line message, error or informational.
struct Notice {
    text: String,
    is_error: bool,
}

impl Notice {
    fn info(text: impl Into<String>) -> Self {
        Notice {
            text: text.into(),
            is_error: false,
        }
    }

    fn error(text: impl Into<String>) -> Self {
        Notice {
            text: text.into(),
            is_error: true,
        }
    }
}

pub struct App {
    options: AppOptions,
    session: Option<Session>,
    mode: Mode,
    lcd_lines: [String; 2],
    lcd_focus: usize,
    notice: Option<Notice>,
    should_quit: bool,
}

/// Run the TUI until the user quits. Terminal state is restored on the way
/// out, including on error.
pub async fn run(options: AppOptions) -> Result<(), String> {
    let mut terminal = ratatui::init();
    let result = App::new(options).run(&mut terminal).await;
    ratatui::restore();
    result
}

impl App {
    pub fn new(options: AppOptions) -> Self {
        App {
            options,
            session: None,
            mode: Mode::Normal,
            lcd_lines: [String::new(), String::new()],
            lcd_focus: 0,
            notice: None,
            should_quit: false,
        }
    }

    async fn run(&mut self, terminal: &mut DefaultTerminal) -> Result<(), String> {
        let mut events = EventStream::new();
        let mut tick = tokio::time::interval(TICK_INTERVAL);

        // Connect straight away when a port is configured
        if self.options.port.is_some() {
            self.connect();
        }

        while !self.should_quit {
            terminal
                .draw(|frame| self.draw(frame))
                .map_err(|e| format!("Failed to draw terminal: {}", e))?;

            tokio::select! {
                maybe_event = events.next() => match maybe_event {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        self.on_key(key).await;
                    }
                    Some(Ok(_)) => {} // resize etc. redraws on the next pass
                    Some(Err(e)) => return Err(format!("Terminal event error: {}", e)),
                    None => break,
                },
                event = Self::link_event(&mut self.session) => {
                    self.on_link_event(event);
                }
                _ = tick.tick() => {}
            }
        }

        if let Some(session) = self.session.take() {
            session.shutdown().await;
        }

        Ok(())
    }

    /// Next event from the active session, or pend forever when there is no
    /// live link (keeps the select arm quiet instead of spinning on a closed
    /// channel).
    async fn link_event(session: &mut Option<Session>) -> LinkEvent {
        match session {
            Some(s) if s.is_connected() => match s.next_event().await {
                Some(event) => event,
                None => LinkEvent::Ended("stopped".to_string()),
            },
            _ => std::future::pending().await,
        }
    }

    fn on_link_event(&mut self, event: LinkEvent) {
        let notice = match &mut self.session {
            Some(session) => session.apply(event),
            None => None,
        };
        if let Some(text) = notice {
            self.notice = Some(Notice::error(text));
        }
    }

    // ------------------------------------------------------------------
    // Key handling
    // ------------------------------------------------------------------

    async fn on_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        match self.mode {
            Mode::Normal => self.on_key_normal(key).await,
            Mode::LcdEntry => self.on_key_lcd(key),
        }
    }

    async fn on_key_normal(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('c') => self.connect(),
            KeyCode::Char('d') => self.disconnect().await,
            KeyCode::Char('1') => self.send(Command::LedOn),
            KeyCode::Char('2') => self.send(Command::LedOff),
            KeyCode::Char('3') => self.send(Command::ServoZero),
            KeyCode::Char('4') => self.send(Command::ServoNinety),
            KeyCode::Char('e') => {
                self.mode = Mode::LcdEntry;
                self.lcd_focus = 0;
            }
            _ => {}
        }
    }

    fn on_key_lcd(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.mode = Mode::Normal,
            KeyCode::Tab | KeyCode::Up | KeyCode::Down => {
                self.lcd_focus = 1 - self.lcd_focus;
            }
            KeyCode::Enter => {
                let command = Command::Lcd {
                    line1: self.lcd_lines[0].clone(),
                    line2: self.lcd_lines[1].clone(),
                };
                self.send(command);
                if self.notice.as_ref().map(|n| n.is_error) != Some(true) {
                    self.mode = Mode::Normal;
                }
            }
            KeyCode::Backspace => {
                self.lcd_lines[self.lcd_focus].pop();
            }
            KeyCode::Char(c) => {
                // Width cap at entry; charset validation happens on submit
                if self.lcd_lines[self.lcd_focus].chars().count() < LCD_WIDTH {
                    self.lcd_lines[self.lcd_focus].push(c);
                }
            }
            _ => {}
        }
    }

    // ------------------------------------------------------------------
    // Actions
    // ------------------------------------------------------------------

    fn connect(&mut self) {
        if self.session.as_ref().is_some_and(|s| s.is_connected()) {
            self.notice = Some(Notice::info("Already connected"));
            return;
        }

        let Some(port) = self.options.port.clone() else {
            self.notice = Some(Notice::error(
                "No port configured. Pass --port, or set default_port in settings (see `hc05-console list-ports`).",
            ));
            return;
        };

        let config = LinkConfig::new(port, self.options.baud_rate);
        match Session::connect(config, self.options.log_limit) {
            Ok(session) => {
                self.notice = Some(Notice::info(format!("Connected to {}", session.port_name())));
                self.session = Some(session);
            }
            Err(e) => {
                self.notice = Some(Notice::error(e));
                self.session = None;
            }
        }
    }

    async fn disconnect(&mut self) {
        match self.session.take() {
            Some(session) => {
                session.shutdown().await;
                self.notice = Some(Notice::info("Disconnected"));
            }
            None => self.notice = Some(Notice::info("Not connected")),
        }
    }

    fn send(&mut self, command: Command) {
        let label = command.label();
        let result = match &self.session {
            Some(session) => session.send(&command),
            None => Err("Not connected".to_string()),
        };
        self.notice = Some(match result {
            Ok(()) => Notice::info(format!("Sent: {}", label)),
            Err(e) => Notice::error(e),
        });
    }

    // ------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------

    fn draw(&self, frame: &mut Frame) {
        let [status_area, logs_area, lcd_area, help_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(5),
            Constraint::Length(4),
            Constraint::Length(1),
        ])
        .areas(frame.area());

        self.draw_status(frame, status_area);
        self.draw_logs(frame, logs_area);
        self.draw_lcd_form(frame, lcd_area);
        self.draw_help(frame, help_area);
    }

    fn draw_status(&self, frame: &mut Frame, area: Rect) {
        let state_span = match &self.session {
            Some(session) if session.is_connected() => Span::styled(
                format!(
                    " ● {} @ {} baud ",
                    session.port_name(),
                    self.options.baud_rate
                ),
                Style::default().fg(Color::Green),
            ),
            Some(session) => {
                let reason = match session.status() {
                    SessionStatus::Ended(reason) => reason.as_str(),
                    SessionStatus::Connected => "connected",
                };
                Span::styled(
                    format!(" ○ {} ({}) ", session.port_name(), reason),
                    Style::default().fg(Color::Yellow),
                )
            }
            None => Span::styled(" ○ not connected ", Style::default().fg(Color::DarkGray)),
        };

        let mut spans = vec![state_span];
        if let Some(notice) = &self.notice {
            let style = if notice.is_error {
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            spans.push(Span::styled(format!("— {}", notice.text), style));
        }

        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn draw_logs(&self, frame: &mut Frame, area: Rect) {
        let [temp_area, dist_area, ldr_area] = Layout::horizontal([
            Constraint::Percentage(33),
            Constraint::Percentage(34),
            Constraint::Percentage(33),
        ])
        .areas(area);

        self.draw_log_pane(frame, temp_area, "Temperature", Channel::Temperature, Color::Green);
        self.draw_log_pane(frame, dist_area, "Distance", Channel::Distance, Color::Cyan);
        self.draw_log_pane(frame, ldr_area, "LDR (kΩ)", Channel::Light, Color::Yellow);
    }

    fn draw_log_pane(
        &self,
        frame: &mut Frame,
        area: Rect,
        title: &str,
        channel: Channel,
        colour: Color,
    ) {
        let block = Block::bordered().title(title);
        let inner_height = area.height.saturating_sub(2) as usize;

        let lines: Vec<Line> = match &self.session {
            Some(session) => session
                .logs
                .get(channel)
                .tail(inner_height)
                .map(|l| Line::from(l.to_string()))
                .collect(),
            None => Vec::new(),
        };

        let paragraph = Paragraph::new(lines)
            .block(block)
            .style(Style::default().fg(colour));
        frame.render_widget(paragraph, area);
    }

    fn draw_lcd_form(&self, frame: &mut Frame, area: Rect) {
        let title = match self.mode {
            Mode::Normal => "LCD — press e to edit",
            Mode::LcdEntry => "LCD — Tab switch row · Enter send · Esc cancel",
        };
        let block = Block::bordered().title(title);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let rows: Vec<Line> = self
            .lcd_lines
            .iter()
            .enumerate()
            .map(|(idx, text)| {
                let focused = self.mode == Mode::LcdEntry && self.lcd_focus == idx;
                let marker = if focused { "> " } else { "  " };
                let style = if focused {
                    Style::default().add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                Line::from(vec![
                    Span::raw(marker),
                    Span::styled(format!("Line {}: ", idx + 1), style),
                    Span::styled(format!("[{:<16}]", text), style),
                    Span::styled(
                        format!(" {}/{}", text.chars().count(), LCD_WIDTH),
                        Style::default().fg(Color::DarkGray),
                    ),
                ])
            })
            .collect();

        frame.render_widget(Paragraph::new(rows), inner);
    }

    fn draw_help(&self, frame: &mut Frame, area: Rect) {
        let help = match self.mode {
            Mode::Normal => {
                " q quit · c connect · d disconnect · 1 LED on · 2 LED off · 3 servo 0° · 4 servo 90° · e LCD text"
            }
            Mode::LcdEntry => " type up to 16 characters per row — accents are rejected on send",
        };
        frame.render_widget(
            Paragraph::new(help).style(Style::default().fg(Color::DarkGray)),
            area,
        );
    }
}
