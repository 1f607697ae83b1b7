use std::str::FromStr;

use strum::{AsRefStr, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// Commands that can be invoked by starting a message with a leading slash.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, EnumIter, AsRefStr, IntoStaticStr,
)]
#[strum(serialize_all = "kebab-case")]
pub enum SlashCommand {
    /// Clear the conversation
    Clear,
    /// Show help
    Help,
    /// Exit the application
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandEntry {
    pub command: SlashCommand,
    pub keyword: &'static str,
    pub description: &'static str,
}

pub fn command_entries() -> Vec<CommandEntry> {
    SlashCommand::iter()
        .map(|command| CommandEntry {
            command,
            keyword: command.command(),
            description: command.description(),
        })
        .collect()
}

/// Entries whose keyword starts with whatever follows the leading slash
pub fn matching_entries(input: &str) -> Vec<CommandEntry> {
    let Some(query) = input.strip_prefix('/') else {
        return Vec::new();
    };
    let query = query.trim().to_lowercase();
    command_entries()
        .into_iter()
        .filter(|entry| entry.keyword.starts_with(&query))
        .collect()
}

impl SlashCommand {
    /// User-visible description shown in help.
    pub fn description(self) -> &'static str {
        match self {
            SlashCommand::Clear => "clear the conversation",
            SlashCommand::Help => "show available commands and keys",
            SlashCommand::Quit => "exit EduMate",
        }
    }

    /// Command string without the leading '/'.
    pub fn command(self) -> &'static str {
        self.into()
    }
}

/// Parse a slash command from user input. Only a lone `/keyword` counts;
/// anything else, including a known keyword followed by more text, is `None`
/// and is sent as ordinary text.
pub fn parse_slash_command(input: &str) -> Option<SlashCommand> {
    let keyword = input.trim().strip_prefix('/')?;
    if keyword.is_empty() || keyword.contains(char::is_whitespace) {
        return None;
    }
    let keyword = keyword.to_lowercase();

    SlashCommand::from_str(&keyword)
        .ok()
        .or_else(|| match keyword.as_str() {
            "reset" | "new" => Some(SlashCommand::Clear),
            "h" | "?" => Some(SlashCommand::Help),
            "q" | "exit" | "bye" => Some(SlashCommand::Quit),
            _ => None,
        })
}

/// Get help text for all available commands
pub fn get_help_text() -> String {
    let mut help = String::from("Commands: ");
    let commands: Vec<String> = SlashCommand::iter()
        .map(|c| format!("/{} ({})", c.command(), c.description()))
        .collect();
    help.push_str(&commands.join(", "));
    help.push_str(". Keys: Enter send, Shift+Enter newline, Ctrl+L clear, PgUp/PgDn scroll, Esc quit.");
    help
}
