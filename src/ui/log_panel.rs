use crate::audit::AuditEntry;
use crate::session::SessionOptions;
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};
use std::path::PathBuf;

/// Entries shown in the side panel
pub const RECENT_ENTRY_LIMIT: usize = 8;

/// Snapshot of session toggles and recent audit history
#[derive(Debug, Clone, Default)]
pub struct PanelState {
    pub options: SessionOptions,
    pub interpreter: String,
    pub log_path: Option<PathBuf>,
    pub recent: Vec<AuditEntry>,
    /// Set when the log exists but could not be read
    pub log_error: Option<String>,
}

/// Side panel showing the safety toggles and the tail of the command log
pub struct LogPanel<'a> {
    state: &'a PanelState,
}

impl<'a> LogPanel<'a> {
    pub fn new(state: &'a PanelState) -> Self {
        Self { state }
    }

    fn build_content(&self) -> Vec<Line<'a>> {
        let mut lines = Vec::new();

        lines.push(Line::from(Span::styled(
            "Session",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from("─".repeat(30)));

        self.add_toggles(&mut lines);
        lines.push(Line::from(""));

        self.add_history(&mut lines);

        lines
    }

    fn add_toggles(&self, lines: &mut Vec<Line<'a>>) {
        let options = self.state.options;

        let (safe_text, safe_color) = if options.safe_mode {
            ("ON", Color::Green)
        } else {
            ("OFF", Color::Red)
        };
        lines.push(Line::from(vec![
            Span::raw("Safe mode: "),
            Span::styled(safe_text, Style::default().fg(safe_color).add_modifier(Modifier::BOLD)),
            Span::styled("  (Ctrl+S)", Style::default().fg(Color::DarkGray)),
        ]));

        let (dry_text, dry_color) = if options.dry_run {
            ("ON", Color::Yellow)
        } else {
            ("OFF", Color::DarkGray)
        };
        lines.push(Line::from(vec![
            Span::raw("Dry run:   "),
            Span::styled(dry_text, Style::default().fg(dry_color)),
            Span::styled("  (Ctrl+D)", Style::default().fg(Color::DarkGray)),
        ]));

        lines.push(Line::from(vec![
            Span::raw("Shell:     "),
            Span::styled(self.state.interpreter.as_str(), Style::default().fg(Color::Gray)),
        ]));
    }

    fn add_history(&self, lines: &mut Vec<Line<'a>>) {
        let Some(ref path) = self.state.log_path else {
            lines.push(Line::from(Span::styled(
                "Command logging disabled",
                Style::default().fg(Color::DarkGray),
            )));
            return;
        };

        lines.push(Line::from(Span::styled(
            format!("Recent commands ({})", self.state.recent.len()),
            Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(Span::styled(
            path.display().to_string(),
            Style::default().fg(Color::DarkGray),
        )));

        if let Some(ref error) = self.state.log_error {
            lines.push(Line::from(Span::styled(
                error.as_str(),
                Style::default().fg(Color::Red),
            )));
            return;
        }

        // Newest first
        for entry in self.state.recent.iter().rev() {
            let color = if entry.status == "Success" {
                Color::Green
            } else {
                Color::Red
            };
            lines.push(Line::from(vec![
                Span::styled(
                    entry.timestamp.format("%H:%M:%S").to_string(),
                    Style::default().fg(Color::Yellow),
                ),
                Span::raw(" "),
                Span::styled(entry.command.as_str(), Style::default().fg(color)),
            ]));
        }
    }
}

impl<'a> Widget for LogPanel<'a> {
    fn render(self, area: ratatui::layout::Rect, buf: &mut ratatui::buffer::Buffer) {
        let content = self.build_content();
        let paragraph = Paragraph::new(content).block(Block::default().borders(Borders::ALL));
        paragraph.render(area, buf);
    }
}
