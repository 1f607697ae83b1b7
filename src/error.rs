use thiserror::Error;

/// Why a completion could not be turned into an assistant reply.
///
/// Every variant is recovered the same way by the controller: the user sees
/// [`crate::prompts::FALLBACK_REPLY`]. The variants only exist so the cause
/// can be logged.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReplyUnavailable {
    #[error("network error: {0}")]
    Network(String),

    #[error("completion service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed completion response: {0}")]
    Malformed(String),

    #[error("no API key configured")]
    MissingCredential,
}

impl ReplyUnavailable {
    /// Short label for log fields
    pub fn kind(&self) -> &'static str {
        match self {
            ReplyUnavailable::Network(_) => "network",
            ReplyUnavailable::Status { .. } => "status",
            ReplyUnavailable::Malformed(_) => "malformed",
            ReplyUnavailable::MissingCredential => "credential",
        }
    }
}

impl From<reqwest::Error> for ReplyUnavailable {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ReplyUnavailable::Malformed(err.to_string())
        } else {
            ReplyUnavailable::Network(err.to_string())
        }
    }
}
