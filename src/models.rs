use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Answers recorded during an attempt: question id -> selected option index.
pub type AnswerMap = HashMap<Uuid, usize>;

/// Discriminator selecting which body a lesson holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContentType {
    Text,
    Video,
    Pdf,
    Quiz,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LessonStatus {
    Draft,
    Published,
}

/// Quiz metadata as the remote service returns it (phase 1 of creation).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizMetadata {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub passing_score_percent: u8,
    pub time_limit_minutes: u32,
    pub attempt_limit: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionRecord {
    pub text: String,
    pub is_correct: bool,
}

/// A question as persisted by the remote service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRecord {
    pub id: Uuid,
    pub text: String,
    pub order: u32,
    pub options: Vec<OptionRecord>,
}

/// Merged aggregate of the two independent reads (metadata + questions).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizData {
    #[serde(flatten)]
    pub metadata: QuizMetadata,
    pub questions: Vec<QuestionRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuizRequest {
    pub title: String,
    pub description: String,
    pub passing_score_percent: u8,
    pub time_limit_minutes: u32,
    pub attempt_limit: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuestionRequest {
    pub text: String,
    pub order: u32,
    pub options: Vec<OptionRecord>,
}

/// One prior attempt in a learner's history for a quiz.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptSummary {
    pub id: Uuid,
    pub quiz_id: Uuid,
    pub user_id: Uuid,
    pub score: Option<u8>,
    pub passed: Option<bool>,
    pub started_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAttemptResponse {
    pub attempt_id: Uuid,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAttemptRequest {
    pub answers: AnswerMap,
}

/// Grading result returned by the remote service on submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradedAttempt {
    pub attempt_id: Uuid,
    pub score: u8,
    pub passed: bool,
    pub submitted_at: DateTime<Utc>,
}

/// Descriptor for a file accepted by the upload collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredObject {
    pub id: Uuid,
    pub file_url: String,
}

/// Exactly one body variant exists per persisted lesson; there is no room
/// for stale fields left over from a previously selected content type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LessonBody {
    Text { content: String },
    Video { url: String, content_id: Uuid },
    Pdf { url: String, content_id: Uuid },
    Quiz { quiz_id: Uuid },
}

impl LessonBody {
    pub fn content_type(&self) -> ContentType {
        match self {
            LessonBody::Text { .. } => ContentType::Text,
            LessonBody::Video { .. } => ContentType::Video,
            LessonBody::Pdf { .. } => ContentType::Pdf,
            LessonBody::Quiz { .. } => ContentType::Quiz,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub id: Uuid,
    pub title: String,
    pub order: u32,
    pub status: LessonStatus,
    pub body: LessonBody,
}

/// Save payload for the lesson persistence collaborator. Only the field
/// group matching `content_type` is populated; the rest serialize as null.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonSavePayload {
    pub title: String,
    pub content_type: ContentType,
    pub order: u32,
    pub status: LessonStatus,
    pub text_content: Option<String>,
    pub content_url: Option<String>,
    pub content_id: Option<Uuid>,
    pub quiz_id: Option<Uuid>,
}
