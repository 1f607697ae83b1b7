use crate::controller::ConversationController;
use crate::events::{TuiEvent, next_event};
use crate::ui::{ConversationAction, ConversationManager};
use anyhow::{Context, Result};
use crossterm::{
    event::{DisableBracketedPaste, EnableBracketedPaste},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io::{self, Stdout};
use std::time::Duration;
use tracing::{info, warn};

const TICK: Duration = Duration::from_millis(100);

type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Restores the terminal when dropped, including on early return
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> Result<(Self, Tui)> {
        enable_raw_mode().context("Failed to enable raw mode")?;
        let guard = TerminalGuard;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)
            .context("Failed to enter alternate screen")?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))
            .context("Failed to create terminal")?;
        Ok((guard, terminal))
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if let Err(e) = disable_raw_mode() {
            warn!(error = %e, "failed to disable raw mode");
        }
        if let Err(e) = execute!(io::stdout(), DisableBracketedPaste, LeaveAlternateScreen) {
            warn!(error = %e, "failed to leave alternate screen");
        }
    }
}

/// Run an interactive session until the user quits.
///
/// Needs the multi-threaded runtime: input polling blocks this task between
/// ticks while request tasks keep running elsewhere.
pub async fn run(controller: ConversationController) -> Result<()> {
    let (_guard, mut terminal) = TerminalGuard::enter()?;
    let mut manager = ConversationManager::new(controller);
    info!("interactive session started");

    let mut dirty = true;
    loop {
        dirty |= manager.tick();

        if dirty {
            terminal
                .draw(|frame| manager.render(frame))
                .context("Failed to draw frame")?;
            dirty = false;
        }

        let event = tokio::task::block_in_place(|| next_event(TICK))?;
        match event {
            TuiEvent::Key(key) => {
                dirty = true;
                if manager.handle_key(key) == ConversationAction::Exit {
                    break;
                }
            }
            TuiEvent::Paste(text) => {
                dirty = true;
                manager.handle_paste(&text);
            }
            TuiEvent::Resize(_, _) => dirty = true,
            TuiEvent::Tick => {}
        }
    }

    info!(
        messages = manager.controller().history().len(),
        "interactive session ended"
    );
    Ok(())
}
