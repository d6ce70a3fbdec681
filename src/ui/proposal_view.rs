use crate::session::CommandProposal;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

/// Read-only view of the proposal awaiting confirmation
pub struct ProposalView {
    command: String,
    explanation: String,
    dry_run: bool,
}

impl ProposalView {
    pub fn new(proposal: &CommandProposal, dry_run: bool) -> Self {
        Self {
            command: proposal.raw_command().to_string(),
            explanation: proposal.explanation().to_string(),
            dry_run,
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    fn key_hint(&self) -> &'static str {
        if self.dry_run {
            "[Enter] simulate  [Esc] cancel"
        } else {
            "[Enter] run  [d] dry run  [Esc] cancel"
        }
    }
}

impl Widget for &ProposalView {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut lines = vec![
            Line::from(vec![Span::styled(
                "Proposed Command",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )]),
            Line::from(""),
            Line::from(vec![
                Span::styled("  ", Style::default()),
                Span::styled(&self.command, Style::default().fg(Color::Green)),
            ]),
            Line::from(""),
            Line::from(vec![
                Span::styled("Explanation: ", Style::default().fg(Color::DarkGray)),
                Span::styled(&self.explanation, Style::default().fg(Color::Gray)),
            ]),
        ];

        lines.push(Line::from(""));
        lines.push(Line::from(vec![Span::styled(
            self.key_hint(),
            Style::default().fg(Color::Yellow),
        )]));

        let title = if self.dry_run {
            "Command Preview (dry run)"
        } else {
            "Command Preview"
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(title);

        Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false })
            .render(area, buf);
    }
}
