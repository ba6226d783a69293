use thiserror::Error;

/// Why a single chat-completion call failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// 401/403: the key is wrong, expired, or lacks permission or credit.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// 429: too many requests.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// Any other non-success status.
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Connection, timeout, or body transfer failure.
    #[error("request failed: {0}")]
    Transport(String),

    /// A success status whose body is not a usable completion.
    #[error("unusable response: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    /// Classifies a non-success HTTP status and its body.
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = error_message(body);
        match status {
            401 | 403 => Self::Authentication(message),
            429 => Self::RateLimited(message),
            _ => Self::Api { status, message },
        }
    }

    /// Short label used in retry status lines.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Authentication(_) => "Authentication failed",
            Self::RateLimited(_) => "Rate limited",
            Self::Api { .. } => "API error",
            Self::Transport(_) | Self::InvalidResponse(_) => "Request failed",
        }
    }
}

const MAX_MESSAGE_CHARS: usize = 300;

/// Pulls `error.message` out of an OpenAI-style error body, falling back to
/// the (truncated) body text.
fn error_message(body: &str) -> String {
    let from_json = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .or_else(|| v.get("message"))
                .and_then(serde_json::Value::as_str)
                .map(str::to_string)
        });

    from_json.unwrap_or_else(|| {
        let trimmed = body.trim();
        if trimmed.chars().count() > MAX_MESSAGE_CHARS {
            let cut: String = trimmed.chars().take(MAX_MESSAGE_CHARS).collect();
            format!("{cut}...")
        } else {
            trimmed.to_string()
        }
    })
}
