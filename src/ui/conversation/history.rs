//! Transcript display component

use crate::message::{Message, Origin};
use crate::prompts::{EXAMPLE_QUESTIONS, WELCOME_SUBTITLE, WELCOME_TITLE};
use crate::ui::conversation::indicator::thinking_lines;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

/// Borrowed view over the transcript, anchored to its newest line
pub struct TranscriptView<'a> {
    pub messages: &'a [Message],
    pub pending: bool,
    /// Lines scrolled up from the bottom
    pub scroll: u16,
    /// Highlighted example question on the welcome panel
    pub selected_example: Option<usize>,
}

impl TranscriptView<'_> {
    fn block() -> Block<'static> {
        Block::default()
            .borders(Borders::ALL)
            .title("💬 Conversation")
    }

    fn lines(&self, width: u16) -> Vec<Line<'static>> {
        if self.messages.is_empty() && !self.pending {
            return welcome_lines(self.selected_example);
        }

        let mut all_lines = Vec::new();
        for message in self.messages {
            all_lines.extend(render_message(message, width));
            all_lines.push(Line::from(""));
        }
        if self.pending {
            all_lines.extend(thinking_lines());
        }
        all_lines
    }

    /// Furthest `scroll` that still moves the view when drawn into `area`
    pub fn max_scroll(&self, area: Rect) -> u16 {
        let inner_area = Self::block().inner(area);
        let total = self.lines(inner_area.width).len();
        let hidden = total.saturating_sub(inner_area.height as usize);
        u16::try_from(hidden).unwrap_or(u16::MAX)
    }
}

impl Widget for TranscriptView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Self::block();
        let inner_area = block.inner(area);
        block.render(area, buf);

        let all_lines = self.lines(inner_area.width);
        for (i, line) in visible_window(&all_lines, inner_area.height, self.scroll)
            .iter()
            .enumerate()
        {
            buf.set_line(inner_area.x, inner_area.y + i as u16, line, inner_area.width);
        }
    }
}

/// Slice of `lines` that fits `height`, `scroll` lines up from the bottom
pub fn visible_window<T>(lines: &[T], height: u16, scroll: u16) -> &[T] {
    let height = height as usize;
    let total = lines.len();
    let max_scroll = total.saturating_sub(height);
    let scroll = (scroll as usize).min(max_scroll);
    let end = total - scroll;
    let start = end.saturating_sub(height);
    &lines[start..end]
}

fn welcome_lines(selected: Option<usize>) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(Span::styled(
            WELCOME_TITLE,
            Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(WELCOME_SUBTITLE, Style::default().fg(Color::Gray))),
        Line::from(""),
    ];

    for (index, example) in EXAMPLE_QUESTIONS.iter().enumerate() {
        let style = if selected == Some(index) {
            Style::default().fg(Color::Black).bg(Color::Blue)
        } else {
            Style::default().fg(Color::Gray)
        };
        lines.push(Line::from(vec![
            Span::raw("  "),
            Span::styled(format!("\"{example}\""), style),
        ]));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Tab picks an example. Enter to send, Shift+Enter for new line.",
        Style::default().fg(Color::DarkGray),
    )));
    lines
}

fn render_message(message: &Message, width: u16) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    let origin = message.origin();
    let (icon, label_style) = match origin {
        Origin::User => ("👤", Style::default().fg(Color::Magenta)),
        Origin::Assistant => ("🤖", Style::default().fg(Color::Blue)),
    };
    let label = format!("{icon} {}", origin.display_name());
    let timestamp = message.created_at().format("%H:%M:%S").to_string();

    lines.push(Line::from(vec![
        Span::styled(label, label_style.add_modifier(Modifier::BOLD)),
        Span::styled(format!("  {timestamp}"), Style::default().fg(Color::DarkGray)),
    ]));

    let content_style = match message.origin() {
        Origin::User => Style::default().fg(Color::White),
        Origin::Assistant => Style::default().fg(Color::Gray),
    };
    for content_line in wrap_text(message.content(), width.saturating_sub(2) as usize) {
        lines.push(Line::from(vec![
            Span::raw("  "),
            Span::styled(content_line, content_style),
        ]));
    }

    lines
}

/// Wrap text to fit within the given width, keeping explicit line breaks
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut current_line = String::new();
        let mut current_len = 0;

        for word in paragraph.split_whitespace() {
            let word_len = word.chars().count();
            if current_len > 0 && current_len + 1 + word_len > width {
                lines.push(std::mem::take(&mut current_line));
                current_len = 0;
            }
            if current_len > 0 {
                current_line.push(' ');
                current_len += 1;
            }
            current_line.push_str(word);
            current_len += word_len;
        }

        lines.push(current_line);
    }

    lines
}
