use async_trait::async_trait;
use tracing::{info, warn};
use uuid::Uuid;

use crate::draft::QuizDraft;
use crate::errors::{QuizError, Result};
use crate::gateway::QuizGateway;
use crate::models::{
    ContentType, Lesson, LessonBody, LessonSavePayload, LessonStatus, StoredObject,
};
use crate::uploads::{FileStore, UploadKind};

/// Lesson persistence collaborator (external). Accepts the assembled save
/// payload and returns the saved lesson.
#[async_trait]
pub trait LessonStore: Send + Sync {
    async fn save_lesson(&self, payload: &LessonSavePayload) -> Result<Lesson>;
}

/// A file the instructor picked but that has not been uploaded yet.
#[derive(Debug, Clone)]
pub struct PendingFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// State machine over the four mutually exclusive lesson editors.
///
/// Selecting a different content type switches the active editor without
/// clearing what was entered under the others; only the fields matching the
/// active type end up in the save payload, everything else explicitly null.
pub struct LessonComposer {
    pub lesson_id: Option<Uuid>,
    pub title: String,
    pub order: u32,
    pub status: LessonStatus,
    active: ContentType,
    text_body: String,
    pending_video: Option<PendingFile>,
    stored_video: Option<StoredObject>,
    pending_pdf: Option<PendingFile>,
    stored_pdf: Option<StoredObject>,
    quiz_draft: QuizDraft,
    quiz_id: Option<Uuid>,
}

impl LessonComposer {
    pub fn new(title: String, order: u32) -> Self {
        Self {
            lesson_id: None,
            title,
            order,
            status: LessonStatus::Draft,
            active: ContentType::Text,
            text_body: String::new(),
            pending_video: None,
            stored_video: None,
            pending_pdf: None,
            stored_pdf: None,
            quiz_draft: QuizDraft::new(),
            quiz_id: None,
        }
    }

    /// Open an existing lesson for editing. A quiz lesson additionally needs
    /// its draft rebuilt via [`Self::load_quiz_draft`].
    pub fn for_existing(lesson: &Lesson) -> Self {
        let mut composer = Self::new(lesson.title.clone(), lesson.order);
        composer.lesson_id = Some(lesson.id);
        composer.status = lesson.status;
        composer.active = lesson.body.content_type();

        match &lesson.body {
            LessonBody::Text { content } => composer.text_body = content.clone(),
            LessonBody::Video { url, content_id } => {
                composer.stored_video = Some(StoredObject {
                    id: *content_id,
                    file_url: url.clone(),
                })
            }
            LessonBody::Pdf { url, content_id } => {
                composer.stored_pdf = Some(StoredObject {
                    id: *content_id,
                    file_url: url.clone(),
                })
            }
            LessonBody::Quiz { quiz_id } => composer.quiz_id = Some(*quiz_id),
        }
        composer
    }

    /// Fetch the referenced quiz and rebuild an editable draft from it.
    pub async fn load_quiz_draft(&mut self, gateway: &QuizGateway) -> Result<()> {
        let quiz_id = self
            .quiz_id
            .ok_or_else(|| QuizError::Validation("Lesson has no quiz to load".to_string()))?;
        let data = gateway.fetch_quiz(quiz_id).await?;
        self.quiz_draft = QuizDraft::from_persisted(&data);
        Ok(())
    }

    pub fn active_content_type(&self) -> ContentType {
        self.active
    }

    /// Switch the active editor. Data entered under other types is retained.
    pub fn select_content_type(&mut self, content_type: ContentType) {
        self.active = content_type;
    }

    pub fn set_text_body(&mut self, body: String) {
        self.text_body = body;
    }

    pub fn text_body(&self) -> &str {
        &self.text_body
    }

    pub fn choose_video_file(&mut self, name: String, bytes: Vec<u8>) {
        self.pending_video = Some(PendingFile { name, bytes });
    }

    pub fn choose_pdf_file(&mut self, name: String, bytes: Vec<u8>) {
        self.pending_pdf = Some(PendingFile { name, bytes });
    }

    pub fn stored_video(&self) -> Option<&StoredObject> {
        self.stored_video.as_ref()
    }

    pub fn stored_pdf(&self) -> Option<&StoredObject> {
        self.stored_pdf.as_ref()
    }

    pub fn quiz_id(&self) -> Option<Uuid> {
        self.quiz_id
    }

    pub fn quiz_draft(&self) -> &QuizDraft {
        &self.quiz_draft
    }

    pub fn quiz_draft_mut(&mut self) -> &mut QuizDraft {
        &mut self.quiz_draft
    }

    /// Save-time validation for the active type only. Refused before any
    /// network call is made.
    pub fn validate_for_save(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(QuizError::Validation("Lesson title is required".to_string()));
        }

        match self.active {
            ContentType::Text => {
                if self.text_body.trim().is_empty() {
                    return Err(QuizError::Validation(
                        "Text content is required".to_string(),
                    ));
                }
            }
            ContentType::Video => {
                if self.pending_video.is_none() && self.stored_video.is_none() {
                    return Err(QuizError::Validation(
                        "A video file must be selected".to_string(),
                    ));
                }
            }
            ContentType::Pdf => {
                if self.pending_pdf.is_none() && self.stored_pdf.is_none() {
                    return Err(QuizError::Validation(
                        "A PDF file must be selected".to_string(),
                    ));
                }
            }
            ContentType::Quiz => self.quiz_draft.validate()?,
        }

        Ok(())
    }

    /// Assemble the save payload from resolved state. Requires that any
    /// pending upload has completed and, for quiz lessons, that the quiz is
    /// persisted; [`Self::save`] establishes both before calling this.
    pub fn build_payload(&self) -> Result<LessonSavePayload> {
        let mut payload = LessonSavePayload {
            title: self.title.clone(),
            content_type: self.active,
            order: self.order,
            status: self.status,
            text_content: None,
            content_url: None,
            content_id: None,
            quiz_id: None,
        };

        match self.active {
            ContentType::Text => payload.text_content = Some(self.text_body.clone()),
            ContentType::Video => {
                let stored = self.stored_video.as_ref().ok_or_else(|| {
                    QuizError::Validation("Video upload has not completed".to_string())
                })?;
                payload.content_url = Some(stored.file_url.clone());
                payload.content_id = Some(stored.id);
            }
            ContentType::Pdf => {
                let stored = self.stored_pdf.as_ref().ok_or_else(|| {
                    QuizError::Validation("PDF upload has not completed".to_string())
                })?;
                payload.content_url = Some(stored.file_url.clone());
                payload.content_id = Some(stored.id);
            }
            ContentType::Quiz => {
                let quiz_id = self.quiz_id.ok_or_else(|| {
                    QuizError::Validation("Quiz has not been persisted".to_string())
                })?;
                payload.quiz_id = Some(quiz_id);
            }
        }

        Ok(payload)
    }

    /// Upload a newly chosen file for the given slot, deleting the
    /// superseded stored object best-effort.
    async fn resolve_upload(
        files: &dyn FileStore,
        kind: UploadKind,
        pending: &mut Option<PendingFile>,
        stored: &mut Option<StoredObject>,
    ) -> Result<()> {
        if let Some(file) = pending.take() {
            let uploaded = files.upload(&file.name, file.bytes, kind).await?;
            if let Some(old) = stored.replace(uploaded) {
                if let Err(err) = files.delete(old.id).await {
                    warn!(file_id = %old.id, error = %err, "Superseded file could not be deleted");
                }
            }
        }
        Ok(())
    }

    /// Save the lesson: resolve the active body (await a pending upload, or
    /// persist the quiz draft) before the lesson payload is submitted, so
    /// the payload always carries resolved values.
    pub async fn save(
        &mut self,
        gateway: &QuizGateway,
        files: &dyn FileStore,
        lessons: &dyn LessonStore,
    ) -> Result<Lesson> {
        self.validate_for_save()?;

        match self.active {
            ContentType::Text => {}
            ContentType::Video => {
                Self::resolve_upload(
                    files,
                    UploadKind::Video,
                    &mut self.pending_video,
                    &mut self.stored_video,
                )
                .await?
            }
            ContentType::Pdf => {
                Self::resolve_upload(
                    files,
                    UploadKind::Pdf,
                    &mut self.pending_pdf,
                    &mut self.stored_pdf,
                )
                .await?
            }
            ContentType::Quiz => {
                let quiz = match self.quiz_id {
                    Some(old_quiz_id) => {
                        let replaced = gateway.replace_quiz(old_quiz_id, &self.quiz_draft).await?;
                        replaced.quiz
                    }
                    None => gateway.create_complete_quiz(&self.quiz_draft).await?,
                };
                self.quiz_id = Some(quiz.metadata.id);
                self.quiz_draft = QuizDraft::from_persisted(&quiz);
            }
        }

        let payload = self.build_payload()?;
        let lesson = lessons.save_lesson(&payload).await?;
        self.lesson_id = Some(lesson.id);
        info!(lesson_id = %lesson.id, content_type = ?self.active, "Lesson saved");
        Ok(lesson)
    }
}
