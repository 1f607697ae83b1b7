/// Persona preamble sent as the first turn of every completion request.
pub const SYSTEM_PROMPT: &str = "You are EduMate, a helpful and friendly study assistant for university students. You specialize in explaining computer science concepts, programming, mathematics, and other academic topics in simple, clear terms. Always be encouraging, patient, and provide examples when helpful. Keep your responses concise but comprehensive.";

/// Stands in for the assistant reply whenever the completion service is unavailable.
pub const FALLBACK_REPLY: &str = "Sorry, I'm having trouble connecting right now. Please check your internet connection and try again.";

/// Suggestions offered while the transcript is empty
pub const EXAMPLE_QUESTIONS: [&str; 4] = [
    "Explain binary search in simple terms",
    "What's the difference between arrays and linked lists?",
    "How does recursion work?",
    "What is Big O notation?",
];

pub const WELCOME_TITLE: &str = "Welcome to EduMate!";

pub const WELCOME_SUBTITLE: &str =
    "I'm here to help you understand complex topics. Try asking me about:";

pub const COMPOSER_PLACEHOLDER: &str = "Ask me anything about your studies...";

/// Returns the example question after `current`, wrapping around.
pub fn next_example(current: Option<usize>) -> usize {
    match current {
        Some(index) => (index + 1) % EXAMPLE_QUESTIONS.len(),
        None => 0,
    }
}
