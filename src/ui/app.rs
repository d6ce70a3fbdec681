use crate::session::{ConfirmOutcome, ProposalOutcome, Session, SessionEvent, TranslationWorker};
use crate::ui::input::{InputMode, InputWidget};
use crate::ui::log_panel::{LogPanel, PanelState, RECENT_ENTRY_LIMIT};
use crate::ui::output::{CommandOutput, OutputDisplay};
use crate::ui::proposal_view::ProposalView;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    Frame, Terminal,
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph},
};
use std::io;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::mpsc::error::TryRecvError;
use tracing::{debug, warn};

/// Application state for UI flow
#[derive(Debug, Clone, Copy, PartialEq)]
enum AppState {
    Input,         // User typing a request
    Translating,   // Waiting for the translator
    Preview,       // Showing the proposed command
    Executing,     // Confirmed; runs after the next draw
    ShowingOutput, // Displaying the outcome
}

/// Full-screen front end over a `Session`
pub struct App {
    session: Session,
    worker: TranslationWorker,
    events: UnboundedReceiver<SessionEvent>,
    should_quit: bool,
    state: AppState,

    // Widgets
    input: InputWidget,
    preview: Option<ProposalView>,
    output: OutputDisplay,
    panel: PanelState,

    error_message: Option<String>,
}

impl App {
    pub fn new(
        session: Session,
        worker: TranslationWorker,
        events: UnboundedReceiver<SessionEvent>,
    ) -> Self {
        let mut input = InputWidget::new(Self::input_mode(&session));
        input.set_active(true); // Start with input focused

        let mut app = Self {
            session,
            worker,
            events,
            should_quit: false,
            state: AppState::Input,
            input,
            preview: None,
            output: OutputDisplay::new(),
            panel: PanelState::default(),
            error_message: None,
        };
        app.refresh_panel();
        app
    }

    /// Run the application event loop (async)
    pub async fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            // The "Executing" frame is on screen; run the command now
            if self.state == AppState::Executing {
                self.execute_confirmed();
                continue;
            }

            // Poll for events with 100ms timeout for refresh
            if event::poll(Duration::from_millis(100))?
                && let Event::Key(key) = event::read()?
            {
                self.handle_key_event(key);
            }

            self.drain_events();

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    /// Check if the app should quit
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    fn input_mode(session: &Session) -> InputMode {
        if session.options().dry_run {
            InputMode::DryRun
        } else {
            InputMode::Live
        }
    }

    /// Apply every translator reply that has arrived
    fn drain_events(&mut self) {
        loop {
            match self.events.try_recv() {
                Ok(event) => self.handle_session_event(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    warn!("translation channel closed");
                    break;
                }
            }
        }
    }

    fn handle_session_event(&mut self, event: SessionEvent) {
        let SessionEvent::TranslationReady { ticket, reply } = event;

        match self.session.receive_translation(ticket, reply) {
            ProposalOutcome::Ready(proposal) => {
                self.preview = Some(ProposalView::new(&proposal, self.session.options().dry_run));
                self.state = AppState::Preview;
            }
            ProposalOutcome::Failed(reason) => {
                self.output.set_output(CommandOutput::Notice(format!(
                    "Sorry, I couldn't generate a command for that.\n{}",
                    reason
                )));
                self.state = AppState::ShowingOutput;
            }
            ProposalOutcome::Stale => debug!(ticket = ticket.id(), "dropped stale reply"),
        }
    }

    /// Render the UI
    fn render(&self, frame: &mut Frame) {
        // Clear the entire frame to prevent artifacts
        frame.render_widget(ratatui::widgets::Clear, frame.area());

        let size = frame.area();

        let bottom_height = match self.state {
            AppState::Preview => 9,
            AppState::ShowingOutput => 15,
            _ => 3,
        };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),             // Title
                Constraint::Min(5),                // Session panel
                Constraint::Length(bottom_height), // Input/Preview/Output
                Constraint::Length(1),             // Status
            ])
            .split(size);

        let title = format!(
            "AskShell{}",
            if self.session.options().safe_mode {
                ""
            } else {
                " [SAFE MODE OFF]"
            }
        );
        let title_block = Block::default()
            .title(title)
            .title_alignment(ratatui::layout::Alignment::Left)
            .borders(Borders::ALL);
        frame.render_widget(title_block, chunks[0]);

        frame.render_widget(LogPanel::new(&self.panel), chunks[1]);

        match self.state {
            AppState::Input => {
                frame.render_widget(&self.input, chunks[2]);
            }
            AppState::Translating => {
                let loading = Paragraph::new("Asking the model for a command...")
                    .style(Style::default().fg(Color::Yellow))
                    .block(Block::default().borders(Borders::ALL));
                frame.render_widget(loading, chunks[2]);
            }
            AppState::Preview => {
                if let Some(ref preview) = self.preview {
                    frame.render_widget(preview, chunks[2]);
                }
            }
            AppState::Executing => {
                let executing = Paragraph::new("Executing command...")
                    .style(Style::default().fg(Color::Cyan))
                    .block(Block::default().borders(Borders::ALL));
                frame.render_widget(executing, chunks[2]);
            }
            AppState::ShowingOutput => {
                frame.render_widget(&self.output, chunks[2]);
            }
        }

        if let Some(ref error) = self.error_message {
            let error_text = format!("Error: {} | Press any key", error);
            frame.render_widget(
                Paragraph::new(error_text).style(Style::default().fg(Color::Red)),
                chunks[3],
            );
            return;
        }

        let status_text = match self.state {
            AppState::Input => "Enter: submit | Ctrl+S: safe mode | Ctrl+D: dry run | Esc: quit",
            AppState::Translating => "Please wait... | Esc: cancel",
            AppState::Preview => "Enter: confirm | d: dry run | Esc: cancel",
            AppState::Executing => "Please wait...",
            AppState::ShowingOutput => "↑/↓: scroll | any key to continue | q: quit",
        };
        frame.render_widget(Paragraph::new(status_text), chunks[3]);
    }

    /// Handle keyboard events
    fn handle_key_event(&mut self, key: KeyEvent) {
        // Only handle key press events (not release or repeat)
        if key.kind != KeyEventKind::Press {
            return;
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        // Clear error message on any key
        if self.error_message.is_some() {
            self.error_message = None;
            return;
        }

        match self.state {
            AppState::Input => self.handle_input_state(key),
            AppState::Translating => {
                if key.code == KeyCode::Esc {
                    self.session.cancel();
                    self.state = AppState::Input;
                }
            }
            AppState::Preview => self.handle_preview_state(key),
            AppState::ShowingOutput => self.handle_output_state(key),
            AppState::Executing => {}
        }
    }

    fn handle_input_state(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('s') => self.toggle_safe_mode(),
                KeyCode::Char('d') => self.toggle_dry_run(),
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Enter => {
                let query = self.input.get_input().trim().to_string();
                if query.is_empty() {
                    return;
                }

                match self.session.submit(&query) {
                    Ok(ticket) => {
                        self.input.clear();
                        self.worker.spawn(ticket, query);
                        self.state = AppState::Translating;
                    }
                    Err(e) => self.error_message = Some(e.to_string()),
                }
            }
            _ => {
                self.input.handle_key(key);
            }
        }
    }

    fn handle_preview_state(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('c') => {
                self.state = AppState::Executing;
            }
            KeyCode::Char('d') => match self.session.dry_run() {
                Ok(report) => {
                    self.output.set_output(CommandOutput::Simulated(report));
                    self.state = AppState::ShowingOutput;
                }
                Err(e) => self.error_message = Some(e.to_string()),
            },
            KeyCode::Esc | KeyCode::Char('n') => {
                self.session.cancel();
                self.preview = None;
                self.state = AppState::Input;
            }
            _ => {}
        }
    }

    fn execute_confirmed(&mut self) {
        let output = match self.session.confirm() {
            Ok(ConfirmOutcome::Executed(report)) => CommandOutput::executed(report),
            Ok(ConfirmOutcome::Blocked(decision)) => CommandOutput::blocked(&decision),
            Ok(ConfirmOutcome::Simulated(report)) => CommandOutput::Simulated(report),
            Err(e) => CommandOutput::Notice(e.to_string()),
        };

        self.output.set_output(output);
        self.preview = None;
        self.state = AppState::ShowingOutput;
        self.refresh_panel();
    }

    fn handle_output_state(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up => self.output.scroll_up(),
            KeyCode::Down => self.output.scroll_down(),
            KeyCode::Char('q') | KeyCode::Char('Q') => self.should_quit = true,
            _ => {
                self.output.clear();
                self.state = AppState::Input;
            }
        }
    }

    fn toggle_safe_mode(&mut self) {
        let enabled = !self.session.options().safe_mode;
        self.session.set_safe_mode(enabled);
        self.refresh_panel();
    }

    fn toggle_dry_run(&mut self) {
        let enabled = !self.session.options().dry_run;
        self.session.set_dry_run(enabled);
        self.input.set_mode(Self::input_mode(&self.session));
        self.refresh_panel();
    }

    /// Re-read toggles and the tail of the command log
    fn refresh_panel(&mut self) {
        self.panel.options = self.session.options();
        self.panel.interpreter = self.session.interpreter_name().to_string();
        self.panel.log_error = None;
        self.panel.recent.clear();

        let Some(logger) = self.session.audit_logger() else {
            self.panel.log_path = None;
            return;
        };
        self.panel.log_path = Some(logger.log_path().to_path_buf());

        match logger.recent_entries(RECENT_ENTRY_LIMIT) {
            Ok(entries) => self.panel.recent = entries,
            Err(e) => self.panel.log_error = Some(e.to_string()),
        }
    }
}
