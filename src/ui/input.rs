use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph, Widget},
};

/// Input mode determines the prompt text
#[derive(Debug, Clone, PartialEq)]
pub enum InputMode {
    Live,   // Confirmed commands run
    DryRun, // Confirmed commands are only simulated
}

/// Single-line text input for natural-language requests
pub struct InputWidget {
    input: String,
    // Byte offset, always on a char boundary
    cursor_position: usize,
    mode: InputMode,
    active: bool,
}

impl InputWidget {
    pub fn new(mode: InputMode) -> Self {
        Self {
            input: String::new(),
            cursor_position: 0,
            mode,
            active: false,
        }
    }

    pub fn set_mode(&mut self, mode: InputMode) {
        self.mode = mode;
    }

    /// Set whether the input widget is active (focused)
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Handle keyboard input
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char(c) => {
                // Check for Ctrl+C (don't insert)
                if key.modifiers.contains(KeyModifiers::CONTROL) {
                    return false;
                }

                self.input.insert(self.cursor_position, c);
                self.cursor_position += c.len_utf8();
                true
            }
            KeyCode::Backspace => {
                if let Some((index, _)) = self.input[..self.cursor_position].char_indices().last() {
                    self.input.remove(index);
                    self.cursor_position = index;
                }
                true
            }
            KeyCode::Delete => {
                if self.cursor_position < self.input.len() {
                    self.input.remove(self.cursor_position);
                }
                true
            }
            KeyCode::Left => {
                if let Some((index, _)) = self.input[..self.cursor_position].char_indices().last() {
                    self.cursor_position = index;
                }
                true
            }
            KeyCode::Right => {
                if let Some(c) = self.input[self.cursor_position..].chars().next() {
                    self.cursor_position += c.len_utf8();
                }
                true
            }
            KeyCode::Home => {
                self.cursor_position = 0;
                true
            }
            KeyCode::End => {
                self.cursor_position = self.input.len();
                true
            }
            _ => false,
        }
    }

    /// Take the current input and clear the widget
    pub fn take_input(&mut self) -> String {
        self.cursor_position = 0;
        std::mem::take(&mut self.input)
    }

    /// Get the current input (without clearing)
    pub fn get_input(&self) -> &str {
        &self.input
    }

    /// Clear the input
    pub fn clear(&mut self) {
        self.input.clear();
        self.cursor_position = 0;
    }

    /// Get prompt text based on mode
    fn get_prompt(&self) -> &str {
        match self.mode {
            InputMode::Live => "What do you want your PC to do?",
            InputMode::DryRun => "What do you want your PC to do? [dry run]",
        }
    }
}

impl Widget for &InputWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let prompt = self.get_prompt();

        // Create display text with cursor
        let display_text = if self.active {
            let before = &self.input[..self.cursor_position];
            let after = &self.input[self.cursor_position..];
            format!("{} {}▊{}", prompt, before, after)
        } else {
            format!("{} {}", prompt, self.input)
        };

        let style = if self.active {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        let block = Block::default().borders(Borders::ALL).border_style(style);

        Paragraph::new(display_text)
            .style(style)
            .block(block)
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(widget: &mut InputWidget, code: KeyCode) -> bool {
        widget.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn test_input_widget_creation() {
        let widget = InputWidget::new(InputMode::Live);
        assert_eq!(widget.get_input(), "");
        assert_eq!(widget.cursor_position, 0);
    }

    #[test]
    fn test_input_char() {
        let mut widget = InputWidget::new(InputMode::Live);

        assert!(press(&mut widget, KeyCode::Char('a')));
        assert_eq!(widget.get_input(), "a");
        assert_eq!(widget.cursor_position, 1);
    }

    #[test]
    fn test_ctrl_chars_not_inserted() {
        let mut widget = InputWidget::new(InputMode::Live);
        let key = KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL);

        assert!(!widget.handle_key(key));
        assert_eq!(widget.get_input(), "");
    }

    #[test]
    fn test_input_backspace() {
        let mut widget = InputWidget::new(InputMode::Live);
        press(&mut widget, KeyCode::Char('a'));
        press(&mut widget, KeyCode::Char('b'));

        press(&mut widget, KeyCode::Backspace);
        assert_eq!(widget.get_input(), "a");
        assert_eq!(widget.cursor_position, 1);
    }

    #[test]
    fn test_multibyte_editing() {
        let mut widget = InputWidget::new(InputMode::Live);
        for c in "café".chars() {
            press(&mut widget, KeyCode::Char(c));
        }
        assert_eq!(widget.cursor_position, "café".len());

        press(&mut widget, KeyCode::Left);
        press(&mut widget, KeyCode::Char('x'));
        assert_eq!(widget.get_input(), "cafxé");

        press(&mut widget, KeyCode::End);
        press(&mut widget, KeyCode::Backspace);
        assert_eq!(widget.get_input(), "cafx");
    }

    #[test]
    fn test_input_cursor_movement() {
        let mut widget = InputWidget::new(InputMode::Live);
        press(&mut widget, KeyCode::Char('a'));
        press(&mut widget, KeyCode::Char('b'));
        press(&mut widget, KeyCode::Char('c'));
        assert_eq!(widget.cursor_position, 3);

        press(&mut widget, KeyCode::Left);
        assert_eq!(widget.cursor_position, 2);

        press(&mut widget, KeyCode::Home);
        assert_eq!(widget.cursor_position, 0);

        press(&mut widget, KeyCode::End);
        assert_eq!(widget.cursor_position, 3);
    }

    #[test]
    fn test_take_input() {
        let mut widget = InputWidget::new(InputMode::Live);
        for c in "test".chars() {
            press(&mut widget, KeyCode::Char(c));
        }

        let input = widget.take_input();
        assert_eq!(input, "test");
        assert_eq!(widget.get_input(), "");
        assert_eq!(widget.cursor_position, 0);
    }

    #[test]
    fn test_prompt_changes_with_mode() {
        let mut widget = InputWidget::new(InputMode::Live);
        assert_eq!(widget.get_prompt(), "What do you want your PC to do?");

        widget.set_mode(InputMode::DryRun);
        assert!(widget.get_prompt().contains("dry run"));
    }
}
