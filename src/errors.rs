use uuid::Uuid;

/// Centralized error types for the quiz subsystem.
///
/// Multi-step remote operations abort at the failing step and never retry;
/// the variants carrying ids and counts exist so callers can report the
/// partial state a failure left behind instead of losing track of it.
#[derive(Debug, thiserror::Error)]
pub enum QuizError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Quiz service error: {0}")]
    Network(String),

    #[error("Quiz {quiz_id} was created with {persisted} of {total} questions: {message}")]
    PartialCreation {
        quiz_id: Uuid,
        persisted: usize,
        total: usize,
        message: String,
    },

    #[error("Attempt {attempt_id} was started but could not be submitted: {message}")]
    OrphanedAttempt { attempt_id: Uuid, message: String },

    #[error("Attempt limit reached: {used} of {limit} attempts used")]
    AttemptLimitReached { used: usize, limit: u32 },

    #[error("Time limit exceeded")]
    TimeExpired,
}

pub type Result<T> = std::result::Result<T, QuizError>;

impl QuizError {
    /// Message suitable for direct display. Network failures surface the
    /// server-provided message when one was extracted, otherwise callers
    /// already got the generic fallback baked in at construction time.
    pub fn user_message(&self) -> String {
        match self {
            QuizError::Validation(msg) => msg.clone(),
            QuizError::Network(msg) => msg.clone(),
            QuizError::PartialCreation {
                persisted, total, ..
            } => format!(
                "The quiz was only partially saved ({} of {} questions). Please retry.",
                persisted, total
            ),
            QuizError::OrphanedAttempt { .. } => {
                "Your attempt was started but the submission failed. Please contact support."
                    .to_string()
            }
            QuizError::AttemptLimitReached { limit, .. } => {
                format!("No attempts remaining (limit is {}).", limit)
            }
            QuizError::TimeExpired => "The time limit for this quiz has expired.".to_string(),
        }
    }
}

impl From<reqwest::Error> for QuizError {
    fn from(err: reqwest::Error) -> Self {
        QuizError::Network(err.to_string())
    }
}

/// Pull a human-readable message out of a service error body.
///
/// The quiz service reports failures as `{"error": "..."}` or
/// `{"message": "..."}`; anything else falls back to a generic message
/// carrying the status code.
pub fn service_error_message(status: reqwest::StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["error", "message"] {
            if let Some(msg) = value.get(key).and_then(|v| v.as_str()) {
                if !msg.is_empty() {
                    return msg.to_string();
                }
            }
        }
    }
    format!("Request failed with status {}", status.as_u16())
}
