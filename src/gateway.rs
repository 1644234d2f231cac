use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::draft::QuizDraft;
use crate::errors::{service_error_message, QuizError, Result};
use crate::models::{
    AnswerMap, AttemptSummary, CreateAttemptResponse, CreateQuestionRequest, CreateQuizRequest,
    GradedAttempt, QuestionRecord, QuizData, QuizMetadata, SubmitAttemptRequest,
};

/// The remote quiz-service contract. The service is a black box that owns
/// every persisted quiz and attempt; the client only holds ids.
#[async_trait]
pub trait QuizService: Send + Sync {
    async fn create_quiz(&self, request: &CreateQuizRequest) -> Result<QuizMetadata>;
    async fn add_question(
        &self,
        quiz_id: Uuid,
        request: &CreateQuestionRequest,
    ) -> Result<QuestionRecord>;
    async fn get_quiz(&self, quiz_id: Uuid) -> Result<QuizMetadata>;
    async fn get_questions(&self, quiz_id: Uuid) -> Result<Vec<QuestionRecord>>;
    async fn delete_quiz(&self, quiz_id: Uuid) -> Result<()>;
    /// Prior attempts of the calling user (the bearer token identifies them).
    async fn list_attempts(&self, quiz_id: Uuid) -> Result<Vec<AttemptSummary>>;
    /// May be rejected server-side when the attempt limit is exhausted.
    async fn create_attempt(&self, quiz_id: Uuid) -> Result<CreateAttemptResponse>;
    async fn submit_attempt(&self, attempt_id: Uuid, answers: &AnswerMap) -> Result<GradedAttempt>;
}

/// HTTP implementation of [`QuizService`].
#[derive(Debug, Clone)]
pub struct HttpQuizService {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpQuizService {
    pub fn new(base_url: String, token: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = service_error_message(status, &body);
            error!(status = %status, error = %message, "Quiz service request failed");
            return Err(QuizError::Network(message));
        }
        Ok(response.json().await?)
    }

    async fn read_empty(response: reqwest::Response) -> Result<()> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = service_error_message(status, &body);
            error!(status = %status, error = %message, "Quiz service request failed");
            return Err(QuizError::Network(message));
        }
        Ok(())
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.request(self.client.get(self.url(path))).send().await?;
        Self::read_json(response).await
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let response = self
            .request(self.client.post(self.url(path)))
            .json(body)
            .send()
            .await?;
        Self::read_json(response).await
    }
}

#[async_trait]
impl QuizService for HttpQuizService {
    async fn create_quiz(&self, request: &CreateQuizRequest) -> Result<QuizMetadata> {
        self.post_json("/quizzes", request).await
    }

    async fn add_question(
        &self,
        quiz_id: Uuid,
        request: &CreateQuestionRequest,
    ) -> Result<QuestionRecord> {
        self.post_json(&format!("/quizzes/{}/questions", quiz_id), request)
            .await
    }

    async fn get_quiz(&self, quiz_id: Uuid) -> Result<QuizMetadata> {
        self.get_json(&format!("/quizzes/{}", quiz_id)).await
    }

    async fn get_questions(&self, quiz_id: Uuid) -> Result<Vec<QuestionRecord>> {
        self.get_json(&format!("/quizzes/{}/questions", quiz_id))
            .await
    }

    async fn delete_quiz(&self, quiz_id: Uuid) -> Result<()> {
        let response = self
            .request(self.client.delete(self.url(&format!("/quizzes/{}", quiz_id))))
            .send()
            .await?;
        Self::read_empty(response).await
    }

    async fn list_attempts(&self, quiz_id: Uuid) -> Result<Vec<AttemptSummary>> {
        self.get_json(&format!("/quizzes/{}/attempts", quiz_id))
            .await
    }

    async fn create_attempt(&self, quiz_id: Uuid) -> Result<CreateAttemptResponse> {
        self.post_json(&format!("/quizzes/{}/attempts", quiz_id), &serde_json::json!({}))
            .await
    }

    async fn submit_attempt(&self, attempt_id: Uuid, answers: &AnswerMap) -> Result<GradedAttempt> {
        let request = SubmitAttemptRequest {
            answers: answers.clone(),
        };
        self.post_json(&format!("/attempts/{}/submit", attempt_id), &request)
            .await
    }
}

/// Outcome of [`QuizGateway::replace_quiz`]. The old id is always reported
/// so a failed cleanup can be reconciled manually.
#[derive(Debug, Clone)]
pub struct ReplacedQuiz {
    pub quiz: QuizData,
    pub old_quiz_id: Uuid,
    pub old_quiz_deleted: bool,
}

/// Facade over the remote quiz service implementing the composite
/// persistence protocols: two-phase creation, fetch-merge reads, and
/// create-then-delete replacement.
#[derive(Clone)]
pub struct QuizGateway {
    service: Arc<dyn QuizService>,
}

impl QuizGateway {
    pub fn new(service: Arc<dyn QuizService>) -> Self {
        Self { service }
    }

    /// Two-phase creation: quiz metadata first, then each question
    /// individually and sequentially in authored order. The server has no
    /// other ordering signal, so the question calls are never concurrent.
    ///
    /// A phase-2 failure aborts the loop and reports the quiz id and the
    /// number of questions already persisted; [`Self::resume_question_upload`]
    /// re-enters the loop at the first unpersisted question.
    pub async fn create_complete_quiz(&self, draft: &QuizDraft) -> Result<QuizData> {
        draft.validate()?;

        let total = draft.questions().len();
        info!(question_count = total, "Creating quiz");

        let metadata = self.service.create_quiz(&draft.metadata_request()).await?;
        let questions = self
            .resume_question_upload(metadata.id, draft, 0)
            .await?;

        info!(quiz_id = %metadata.id, question_count = questions.len(), "Quiz created");
        Ok(QuizData {
            metadata,
            questions,
        })
    }

    /// Phase-2 loop entry point, restartable at `start_index` (0-based index
    /// into the authored question list). Questions before `start_index` are
    /// assumed persisted and are not re-sent.
    pub async fn resume_question_upload(
        &self,
        quiz_id: Uuid,
        draft: &QuizDraft,
        start_index: usize,
    ) -> Result<Vec<QuestionRecord>> {
        let requests = draft.question_requests();
        let total = requests.len();
        let mut persisted = Vec::new();

        for (index, request) in requests.iter().enumerate().skip(start_index) {
            match self.service.add_question(quiz_id, request).await {
                Ok(record) => persisted.push(record),
                Err(err) => {
                    error!(
                        quiz_id = %quiz_id,
                        question_index = index,
                        error = %err,
                        "Question upload aborted"
                    );
                    return Err(QuizError::PartialCreation {
                        quiz_id,
                        persisted: index,
                        total,
                        message: err.user_message(),
                    });
                }
            }
        }

        Ok(persisted)
    }

    /// Metadata and question list are two independent reads, merged into one
    /// aggregate. Used by the authoring UI in edit mode and by the attempt
    /// runtime in take mode.
    pub async fn fetch_quiz(&self, quiz_id: Uuid) -> Result<QuizData> {
        let metadata = self.service.get_quiz(quiz_id).await?;
        let questions = self.service.get_questions(quiz_id).await?;
        Ok(QuizData {
            metadata,
            questions,
        })
    }

    pub async fn delete_quiz(&self, quiz_id: Uuid) -> Result<()> {
        info!(quiz_id = %quiz_id, "Deleting quiz");
        self.service.delete_quiz(quiz_id).await
    }

    /// Replace an existing quiz with a new draft: create the new quiz first,
    /// then delete the old one best-effort. The new quiz is never lost to a
    /// cleanup failure; an undeleted old quiz is reported, not fatal.
    pub async fn replace_quiz(&self, old_quiz_id: Uuid, draft: &QuizDraft) -> Result<ReplacedQuiz> {
        let quiz = self.create_complete_quiz(draft).await?;

        let old_quiz_deleted = match self.service.delete_quiz(old_quiz_id).await {
            Ok(()) => true,
            Err(err) => {
                warn!(
                    old_quiz_id = %old_quiz_id,
                    new_quiz_id = %quiz.metadata.id,
                    error = %err,
                    "Superseded quiz could not be deleted"
                );
                false
            }
        };

        Ok(ReplacedQuiz {
            quiz,
            old_quiz_id,
            old_quiz_deleted,
        })
    }

    pub async fn list_attempts(&self, quiz_id: Uuid) -> Result<Vec<AttemptSummary>> {
        self.service.list_attempts(quiz_id).await
    }

    pub async fn create_attempt(&self, quiz_id: Uuid) -> Result<CreateAttemptResponse> {
        self.service.create_attempt(quiz_id).await
    }

    pub async fn submit_attempt(
        &self,
        attempt_id: Uuid,
        answers: &AnswerMap,
    ) -> Result<GradedAttempt> {
        self.service.submit_attempt(attempt_id, answers).await
    }
}
