use crate::security::SafetyDecision;
use crate::session::{DryRunReport, ExecutionReport};
use crate::shell::ExecutionResult;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

/// What the output pane is currently showing
#[derive(Debug, Clone)]
pub enum CommandOutput {
    Executed {
        command: String,
        result: ExecutionResult,
        audit_warning: Option<String>,
    },
    Simulated(DryRunReport),
    Blocked {
        reason: String,
    },
    /// Translation failures and other notices
    Notice(String),
}

impl CommandOutput {
    pub fn executed(report: ExecutionReport) -> Self {
        CommandOutput::Executed {
            command: report.command,
            result: report.result,
            audit_warning: report.audit_error.map(|e| e.to_string()),
        }
    }

    pub fn blocked(decision: &SafetyDecision) -> Self {
        let reason = decision
            .reason
            .clone()
            .unwrap_or_else(|| "matched a blocked keyword".to_string());
        CommandOutput::Blocked { reason }
    }

    pub fn is_success(&self) -> bool {
        match self {
            CommandOutput::Executed { result, .. } => result.is_success(),
            CommandOutput::Simulated(_) => true,
            CommandOutput::Blocked { .. } | CommandOutput::Notice(_) => false,
        }
    }

    fn lines(&self) -> Vec<Line<'_>> {
        let mut lines = Vec::new();

        match self {
            CommandOutput::Executed {
                command,
                result,
                audit_warning,
            } => {
                let (status_text, status_style) = if result.is_success() {
                    (
                        "✓ Success".to_string(),
                        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                    )
                } else if result.timed_out {
                    (
                        "✗ Timed out".to_string(),
                        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                    )
                } else {
                    (
                        format!("✗ Failed (exit code: {})", result.exit_code),
                        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                    )
                };

                lines.push(Line::from(vec![
                    Span::styled("Command: ", Style::default().fg(Color::Cyan)),
                    Span::styled(command.as_str(), Style::default().fg(Color::White)),
                ]));
                lines.push(Line::from(vec![
                    Span::styled("Status: ", Style::default().fg(Color::Cyan)),
                    Span::styled(status_text, status_style),
                ]));
                lines.push(Line::from(""));

                if !result.stdout.is_empty() {
                    lines.push(Line::from(Span::styled(
                        "Output:",
                        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                    )));
                    for line in result.stdout.lines() {
                        lines.push(Line::from(Span::styled(line, Style::default().fg(Color::White))));
                    }
                    lines.push(Line::from(""));
                }

                if !result.stderr.is_empty() {
                    lines.push(Line::from(Span::styled(
                        "Errors:",
                        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                    )));
                    for line in result.stderr.lines() {
                        lines.push(Line::from(Span::styled(line, Style::default().fg(Color::Red))));
                    }
                    lines.push(Line::from(""));
                }

                if let Some(warning) = audit_warning {
                    lines.push(Line::from(vec![
                        Span::styled("Not logged: ", Style::default().fg(Color::Yellow)),
                        Span::styled(warning.as_str(), Style::default().fg(Color::Yellow)),
                    ]));
                }
            }
            CommandOutput::Simulated(report) => {
                lines.push(Line::from(Span::styled(
                    "[DRY RUN] Command not executed",
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                )));
                lines.push(Line::from(""));
                lines.push(Line::from(vec![
                    Span::styled("Command: ", Style::default().fg(Color::Cyan)),
                    Span::styled(report.command.as_str(), Style::default().fg(Color::White)),
                ]));
                lines.push(Line::from(vec![
                    Span::styled("Explanation: ", Style::default().fg(Color::DarkGray)),
                    Span::styled(report.explanation.as_str(), Style::default().fg(Color::Gray)),
                ]));
            }
            CommandOutput::Blocked { reason } => {
                lines.push(Line::from(Span::styled(
                    "Blocked by safe mode",
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                )));
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled(
                    reason.as_str(),
                    Style::default().fg(Color::Red),
                )));
            }
            CommandOutput::Notice(message) => {
                lines.push(Line::from(Span::styled(
                    message.as_str(),
                    Style::default().fg(Color::Yellow),
                )));
            }
        }

        lines
    }
}

/// Output display widget for showing command execution results
pub struct OutputDisplay {
    output: Option<CommandOutput>,
    scroll: usize,
}

impl OutputDisplay {
    pub fn new() -> Self {
        Self {
            output: None,
            scroll: 0,
        }
    }

    /// Set the output to display
    pub fn set_output(&mut self, output: CommandOutput) {
        self.output = Some(output);
        self.scroll = 0;
    }

    pub fn output(&self) -> Option<&CommandOutput> {
        self.output.as_ref()
    }

    /// Clear the output
    pub fn clear(&mut self) {
        self.output = None;
        self.scroll = 0;
    }

    pub fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(1);
    }

    pub fn scroll_down(&mut self) {
        self.scroll += 1;
    }
}

impl Default for OutputDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl Widget for &OutputDisplay {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if let Some(ref output) = self.output {
            // Apply scrolling by skipping lines
            let visible_lines: Vec<_> = output.lines().into_iter().skip(self.scroll).collect();

            let border = if output.is_success() {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::Red)
            };

            let block = Block::default()
                .borders(Borders::ALL)
                .border_style(border)
                .title("Command Output");

            Paragraph::new(visible_lines)
                .block(block)
                .wrap(Wrap { trim: false })
                .render(area, buf);
        } else {
            let block = Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray))
                .title("Command Output");

            Paragraph::new("No command executed yet")
                .style(Style::default().fg(Color::DarkGray))
                .block(block)
                .render(area, buf);
        }
    }
}
