use crate::commands::{CommandEntry, matching_entries};
use crate::prompts::COMPOSER_PLACEHOLDER;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

/// Cursor and palette state for the draft editor.
///
/// The draft text itself belongs to the controller; the composer only edits
/// it in place. `cursor` counts chars, not bytes.
#[derive(Debug, Clone, Default)]
pub struct ConversationComposer {
    cursor: usize,
}

impl ConversationComposer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Handle an editing key. Enter is not handled here.
    pub fn handle_key(&mut self, key: KeyEvent, draft: &mut String) {
        self.clamp(draft);
        match key.code {
            KeyCode::Char(c) => self.insert_char(draft, c),
            KeyCode::Backspace => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    let at = byte_offset(draft, self.cursor);
                    draft.remove(at);
                }
            }
            KeyCode::Delete => {
                if self.cursor < draft.chars().count() {
                    let at = byte_offset(draft, self.cursor);
                    draft.remove(at);
                }
            }
            KeyCode::Left => {
                self.cursor = self.cursor.saturating_sub(1);
            }
            KeyCode::Right => {
                if self.cursor < draft.chars().count() {
                    self.cursor += 1;
                }
            }
            KeyCode::Home => {
                self.cursor = 0;
            }
            KeyCode::End => {
                self.move_to_end(draft);
            }
            _ => {}
        }
    }

    /// Insert a character at the cursor position
    pub fn insert_char(&mut self, draft: &mut String, c: char) {
        self.clamp(draft);
        let at = byte_offset(draft, self.cursor);
        draft.insert(at, c);
        self.cursor += 1;
    }

    pub fn insert_str(&mut self, draft: &mut String, text: &str) {
        self.clamp(draft);
        let at = byte_offset(draft, self.cursor);
        draft.insert_str(at, text);
        self.cursor += text.chars().count();
    }

    pub fn move_to_end(&mut self, draft: &str) {
        self.cursor = draft.chars().count();
    }

    /// Keep the cursor inside the draft after it changed elsewhere
    pub fn clamp(&mut self, draft: &str) {
        self.cursor = self.cursor.min(draft.chars().count());
    }

    /// Commands matching a draft that is still just `/word`
    pub fn palette(draft: &str) -> Vec<CommandEntry> {
        if draft.contains(char::is_whitespace) {
            return Vec::new();
        }
        matching_entries(draft)
    }

    /// Replace the draft with the first matching command. Returns whether
    /// anything was completed.
    pub fn complete_command(&mut self, draft: &mut String) -> bool {
        let Some(entry) = Self::palette(draft).into_iter().next() else {
            return false;
        };
        *draft = format!("/{}", entry.keyword);
        self.move_to_end(draft);
        true
    }
}

fn byte_offset(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

/// First line to draw so the tail of the draft shows, unless the cursor sits
/// above that window, in which case the window starts at the cursor line.
fn first_visible_line(total: usize, cursor_line: usize, height: usize) -> usize {
    total.saturating_sub(height).min(cursor_line)
}

/// Borrowed view used for rendering
pub struct ComposerView<'a> {
    pub draft: &'a str,
    pub cursor: usize,
    pub busy: bool,
}

impl Widget for ComposerView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let title = if self.busy {
            "✍ Ask EduMate (waiting for reply)"
        } else {
            "✍ Ask EduMate"
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .title(title)
            .style(Style::default().fg(Color::Blue));

        let inner_area = block.inner(area);
        block.render(area, buf);

        if self.draft.is_empty() {
            let placeholder_line = Line::from(vec![Span::styled(
                COMPOSER_PLACEHOLDER,
                Style::default().fg(Color::DarkGray),
            )]);
            buf.set_line(inner_area.x, inner_area.y, &placeholder_line, inner_area.width);
        } else {
            let mut content = self.draft.to_string();
            let cursor_at = byte_offset(&content, self.cursor);
            content.insert(cursor_at, '▌');
            let cursor_line = content[..cursor_at].matches('\n').count();

            let lines: Vec<&str> = content.split('\n').collect();
            let height = inner_area.height as usize;
            let start = first_visible_line(lines.len(), cursor_line, height);
            for (i, line_text) in lines[start..].iter().take(height).enumerate() {
                let line = Line::from(vec![Span::styled(
                    *line_text,
                    Style::default().fg(Color::White),
                )]);
                buf.set_line(inner_area.x, inner_area.y + i as u16, &line, inner_area.width);
            }
        }

        let palette = ConversationComposer::palette(self.draft);
        if !palette.is_empty() && area.y > 0 {
            let palette_height = (palette.len() as u16 + 2).min(area.y);
            let palette_area = Rect {
                x: inner_area.x,
                y: area.y - palette_height,
                width: inner_area.width,
                height: palette_height,
            };

            let block = Block::default()
                .borders(Borders::ALL)
                .title("Commands (Tab to complete)")
                .style(Style::default().fg(Color::Cyan));
            let inner = block.inner(palette_area);
            block.render(palette_area, buf);

            for (index, entry) in palette.iter().enumerate() {
                if index >= inner.height as usize {
                    break;
                }
                let style = if index == 0 {
                    Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::White)
                };
                let line = Line::from(vec![
                    Span::styled(format!("/{}", entry.keyword), style),
                    Span::styled("  ", Style::default()),
                    Span::styled(entry.description, Style::default().fg(Color::Gray)),
                ]);
                buf.set_line(inner.x, inner.y + index as u16, &line, inner.width);
            }
        }
    }
}
