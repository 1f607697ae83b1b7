use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};
use std::time::{SystemTime, UNIX_EPOCH};

fn dots(millis: u128) -> &'static str {
    match (millis / 300) % 4 {
        0 => ".",
        1 => "..",
        2 => "...",
        _ => "   ",
    }
}

/// "EduMate is thinking..." bubble shown while a reply is pending
pub fn thinking_lines() -> Vec<Line<'static>> {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();

    vec![
        Line::from(Span::styled(
            "🤖 EduMate",
            Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::raw("  "),
            Span::styled("Thinking", Style::default().fg(Color::Gray)),
            Span::styled(dots(millis), Style::default().fg(Color::Yellow)),
        ]),
    ]
}
