use crate::commands::{SlashCommand, get_help_text, parse_slash_command};
use crate::controller::ConversationController;
use crate::prompts::{EXAMPLE_QUESTIONS, next_example};
use crate::ui::conversation::composer::{ComposerView, ConversationComposer};
use crate::ui::conversation::history::TranscriptView;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};
use tracing::debug;

const SCROLL_STEP: u16 = 5;

/// Actions the app loop must carry out on behalf of the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationAction {
    None,
    Exit,
}

/// Routes terminal input to the controller and draws the session
pub struct ConversationManager {
    controller: ConversationController,
    composer: ConversationComposer,
    scroll: u16,
    max_scroll: u16,
    seen_messages: usize,
    selected_example: Option<usize>,
    notice: Option<String>,
}

impl ConversationManager {
    pub fn new(controller: ConversationController) -> Self {
        Self {
            controller,
            composer: ConversationComposer::new(),
            scroll: 0,
            max_scroll: 0,
            seen_messages: 0,
            selected_example: None,
            notice: None,
        }
    }

    pub fn controller(&self) -> &ConversationController {
        &self.controller
    }

    pub fn scroll(&self) -> u16 {
        self.scroll
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Apply arrived replies; snaps the view to the newest entry when the
    /// transcript grew. Returns whether a redraw is needed.
    pub fn tick(&mut self) -> bool {
        let applied = self.controller.poll_replies();
        self.follow_transcript();
        applied > 0 || self.controller.is_pending()
    }

    fn follow_transcript(&mut self) {
        let len = self.controller.history().len();
        if len != self.seen_messages {
            self.seen_messages = len;
            self.scroll = 0;
        }
    }

    pub fn handle_paste(&mut self, text: &str) {
        let text = text.replace("\r\n", "\n");
        self.composer.insert_str(self.controller.draft_mut(), &text);
    }

    /// Handle key input
    pub fn handle_key(&mut self, key: KeyEvent) -> ConversationAction {
        if key.kind != KeyEventKind::Press {
            return ConversationAction::None;
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => return ConversationAction::Exit,
            KeyCode::Char('c') if ctrl => return ConversationAction::Exit,
            KeyCode::Char('l') if ctrl => {
                self.clear();
                return ConversationAction::None;
            }
            KeyCode::PageUp => {
                self.scroll = self.scroll.saturating_add(SCROLL_STEP).min(self.max_scroll);
                return ConversationAction::None;
            }
            KeyCode::PageDown => {
                self.scroll = self.scroll.saturating_sub(SCROLL_STEP);
                return ConversationAction::None;
            }
            _ => {}
        }

        self.notice = None;

        match key.code {
            KeyCode::Enter => self.handle_enter(key),
            KeyCode::Tab => {
                self.handle_tab();
                ConversationAction::None
            }
            _ => {
                self.composer.handle_key(key, self.controller.draft_mut());
                ConversationAction::None
            }
        }
    }

    fn handle_enter(&mut self, key: KeyEvent) -> ConversationAction {
        // Many terminals cannot report Shift+Enter, so Alt+Enter also inserts a newline
        let newline_held = key
            .modifiers
            .intersects(KeyModifiers::SHIFT | KeyModifiers::ALT);

        if !newline_held {
            if let Some(command) = parse_slash_command(self.controller.draft()) {
                self.controller.draft_mut().clear();
                self.composer.clamp("");
                return self.run_command(command);
            }
        }

        if self.controller.handle_submit_shortcut(key.code, newline_held) {
            self.composer.clamp(self.controller.draft());
            self.follow_transcript();
        } else {
            self.composer.insert_char(self.controller.draft_mut(), '\n');
        }
        ConversationAction::None
    }

    fn handle_tab(&mut self) {
        if self.composer.complete_command(self.controller.draft_mut()) {
            return;
        }
        if self.controller.history().is_empty() && !self.controller.is_pending() {
            let index = next_example(self.selected_example);
            self.selected_example = Some(index);
            self.controller.set_draft(EXAMPLE_QUESTIONS[index]);
            self.composer.move_to_end(self.controller.draft());
        }
    }

    fn run_command(&mut self, command: SlashCommand) -> ConversationAction {
        debug!(command = command.command(), "running slash command");
        match command {
            SlashCommand::Clear => {
                self.clear();
                ConversationAction::None
            }
            SlashCommand::Help => {
                self.notice = Some(get_help_text());
                ConversationAction::None
            }
            SlashCommand::Quit => ConversationAction::Exit,
        }
    }

    /// Clear conversation
    pub fn clear(&mut self) {
        self.controller.reset();
        self.selected_example = None;
        self.notice = None;
        self.follow_transcript();
    }

    /// Draw the session. Also records how far the transcript can scroll at
    /// the current size.
    pub fn render(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Min(6),    // Transcript
                Constraint::Length(5), // Composer
            ])
            .split(frame.size());

        self.render_header(frame, chunks[0]);

        let state = self.controller.state();
        let mut transcript = TranscriptView {
            messages: state.history(),
            pending: state.pending(),
            scroll: 0,
            selected_example: self.selected_example,
        };
        self.max_scroll = transcript.max_scroll(chunks[1]);
        self.scroll = self.scroll.min(self.max_scroll);
        transcript.scroll = self.scroll;
        frame.render_widget(transcript, chunks[1]);

        frame.render_widget(
            ComposerView {
                draft: state.draft(),
                cursor: self.composer.cursor(),
                busy: state.pending(),
            },
            chunks[2],
        );
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let subtitle = match &self.notice {
            Some(notice) => Span::styled(notice.clone(), Style::default().fg(Color::Yellow)),
            None => Span::styled(
                "Ask me anything about computer science, programming, or study topics!",
                Style::default().fg(Color::Gray),
            ),
        };

        let header = Paragraph::new(vec![
            Line::from(Span::styled(
                "📚 EduMate – Your AI Study Buddy",
                Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            )),
            Line::from(subtitle),
        ])
        .alignment(Alignment::Center);

        frame.render_widget(header, area);
    }
}
