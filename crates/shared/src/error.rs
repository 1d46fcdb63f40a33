use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_ERROR_MESSAGE: &str = "Server response format error";

/// Body the game service sends alongside a non-success status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub error: String,
}

impl ApiErrorBody {
    /// Extracts the `error` field, or the default message when the body is not the expected shape.
    pub fn message_from_bytes(body: &[u8]) -> String {
        serde_json::from_slice::<ApiErrorBody>(body)
            .map(|parsed| parsed.error)
            .unwrap_or_else(|_| DEFAULT_ERROR_MESSAGE.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolViolation {
    #[error("unknown game mode '{0}'")]
    UnknownMode(String),
    #[error("question '{0}' has no options")]
    EmptyOptions(String),
    #[error("duplicate option '{0}'")]
    DuplicateOption(String),
    #[error("session must contain at least one question")]
    NoQuestions,
    #[error("game is not over but no next question was sent")]
    MissingNextQuestion,
    #[error("question {number} exceeds session length {total}")]
    QuestionOutOfRange { number: u32, total: u32 },
}
