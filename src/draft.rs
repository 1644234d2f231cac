use uuid::Uuid;

use crate::errors::{QuizError, Result};
use crate::models::{CreateQuestionRequest, CreateQuizRequest, OptionRecord};

/// Fixed option template size for newly added questions.
pub const DEFAULT_OPTION_COUNT: usize = 4;

#[derive(Debug, Clone, PartialEq)]
pub struct DraftOption {
    pub text: String,
    pub is_correct: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DraftQuestion {
    /// Client-generated id; replaced by a server id once persisted.
    pub id: Uuid,
    pub text: String,
    /// 1-based, contiguous. Renumbered on every insert, delete and move.
    pub order: u32,
    pub options: Vec<DraftOption>,
}

impl DraftQuestion {
    fn new(order: u32) -> Self {
        let mut options = vec![
            DraftOption {
                text: String::new(),
                is_correct: false,
            };
            DEFAULT_OPTION_COUNT
        ];
        // Authoring convenience only; the enforced rule is exactly-one-correct.
        options[0].is_correct = true;

        Self {
            id: Uuid::new_v4(),
            text: String::new(),
            order,
            options,
        }
    }

    /// Index of the single correct option.
    pub fn correct_index(&self) -> Option<usize> {
        self.options.iter().position(|o| o.is_correct)
    }
}

/// Client-local quiz under active authoring. Pure data: every operation is
/// a synchronous transformation, none perform I/O.
///
/// Invariants held after every operation:
/// - at least one question exists,
/// - each question has exactly one correct option,
/// - question orders form a contiguous 1..N sequence.
#[derive(Debug, Clone)]
pub struct QuizDraft {
    pub id: Option<Uuid>,
    pub title: String,
    pub description: String,
    pub passing_score_percent: u8,
    pub time_limit_minutes: u32,
    pub attempt_limit: u32,
    questions: Vec<DraftQuestion>,
}

impl Default for QuizDraft {
    fn default() -> Self {
        Self::new()
    }
}

impl QuizDraft {
    /// A fresh draft starts with a single templated question.
    pub fn new() -> Self {
        Self {
            id: None,
            title: String::new(),
            description: String::new(),
            passing_score_percent: 60,
            time_limit_minutes: 10,
            attempt_limit: 3,
            questions: vec![DraftQuestion::new(1)],
        }
    }

    /// Rebuild an editable draft from a persisted quiz (edit mode). The
    /// draft keeps the persisted question ids until it is re-persisted.
    pub fn from_persisted(data: &crate::models::QuizData) -> Self {
        let mut questions: Vec<DraftQuestion> = data
            .questions
            .iter()
            .map(|record| DraftQuestion {
                id: record.id,
                text: record.text.clone(),
                order: record.order,
                options: record
                    .options
                    .iter()
                    .map(|option| DraftOption {
                        text: option.text.clone(),
                        is_correct: option.is_correct,
                    })
                    .collect(),
            })
            .collect();
        questions.sort_by_key(|q| q.order);
        if questions.is_empty() {
            questions.push(DraftQuestion::new(1));
        }

        let mut draft = Self {
            id: Some(data.metadata.id),
            title: data.metadata.title.clone(),
            description: data.metadata.description.clone(),
            passing_score_percent: data.metadata.passing_score_percent,
            time_limit_minutes: data.metadata.time_limit_minutes,
            attempt_limit: data.metadata.attempt_limit,
            questions,
        };
        draft.renumber();
        draft
    }

    pub fn questions(&self) -> &[DraftQuestion] {
        &self.questions
    }

    pub fn question(&self, id: Uuid) -> Option<&DraftQuestion> {
        self.questions.iter().find(|q| q.id == id)
    }

    fn question_mut(&mut self, id: Uuid) -> Result<&mut DraftQuestion> {
        self.questions
            .iter_mut()
            .find(|q| q.id == id)
            .ok_or_else(|| QuizError::Validation(format!("Question {} not found", id)))
    }

    fn renumber(&mut self) {
        for (index, question) in self.questions.iter_mut().enumerate() {
            question.order = index as u32 + 1;
        }
    }

    /// Unconstrained scalar replace of the quiz metadata. Range checks are
    /// the only cross-field rules at this boundary.
    pub fn set_metadata(
        &mut self,
        title: String,
        description: String,
        passing_score_percent: u8,
        time_limit_minutes: u32,
        attempt_limit: u32,
    ) -> Result<()> {
        if passing_score_percent > 100 {
            return Err(QuizError::Validation(
                "Passing score must be between 0 and 100".to_string(),
            ));
        }
        if time_limit_minutes < 1 {
            return Err(QuizError::Validation(
                "Time limit must be at least 1 minute".to_string(),
            ));
        }
        if attempt_limit < 1 {
            return Err(QuizError::Validation(
                "Attempt limit must be at least 1".to_string(),
            ));
        }

        self.title = title;
        self.description = description;
        self.passing_score_percent = passing_score_percent;
        self.time_limit_minutes = time_limit_minutes;
        self.attempt_limit = attempt_limit;
        Ok(())
    }

    /// Append a templated question (four empty options, first correct) and
    /// return its client id.
    pub fn add_question(&mut self) -> Uuid {
        let question = DraftQuestion::new(self.questions.len() as u32 + 1);
        let id = question.id;
        self.questions.push(question);
        id
    }

    /// Refuses to empty the question set; otherwise removes and renumbers.
    pub fn remove_question(&mut self, id: Uuid) -> Result<()> {
        if self.questions.len() == 1 {
            return Err(QuizError::Validation(
                "A quiz must keep at least one question".to_string(),
            ));
        }

        let position = self
            .questions
            .iter()
            .position(|q| q.id == id)
            .ok_or_else(|| QuizError::Validation(format!("Question {} not found", id)))?;

        self.questions.remove(position);
        self.renumber();
        Ok(())
    }

    pub fn update_question_text(&mut self, id: Uuid, text: String) -> Result<()> {
        self.question_mut(id)?.text = text;
        Ok(())
    }

    /// Move a question to a new 1-based position; out-of-range targets are
    /// clamped. Orders stay contiguous.
    pub fn move_question(&mut self, id: Uuid, new_order: u32) -> Result<()> {
        let position = self
            .questions
            .iter()
            .position(|q| q.id == id)
            .ok_or_else(|| QuizError::Validation(format!("Question {} not found", id)))?;

        let target = (new_order.max(1) as usize).min(self.questions.len()) - 1;
        let question = self.questions.remove(position);
        self.questions.insert(target, question);
        self.renumber();
        Ok(())
    }

    /// Replaces option text only; the correctness flag is untouched.
    pub fn update_option_text(
        &mut self,
        question_id: Uuid,
        option_index: usize,
        text: String,
    ) -> Result<()> {
        let question = self.question_mut(question_id)?;
        let option = question.options.get_mut(option_index).ok_or_else(|| {
            QuizError::Validation(format!("Option index {} out of range", option_index))
        })?;
        option.text = text;
        Ok(())
    }

    /// Marks one option correct and every sibling incorrect in the same
    /// operation; never partially applied.
    pub fn set_correct_option(&mut self, question_id: Uuid, option_index: usize) -> Result<()> {
        let question = self.question_mut(question_id)?;
        if option_index >= question.options.len() {
            return Err(QuizError::Validation(format!(
                "Option index {} out of range",
                option_index
            )));
        }

        for (index, option) in question.options.iter_mut().enumerate() {
            option.is_correct = index == option_index;
        }
        Ok(())
    }

    /// Pre-persist check. Refused drafts never reach the network.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(QuizError::Validation("Quiz title is required".to_string()));
        }

        for question in &self.questions {
            if question.text.trim().is_empty() {
                return Err(QuizError::Validation(format!(
                    "Question {} has no text",
                    question.order
                )));
            }
            if question.options.len() < 2 {
                return Err(QuizError::Validation(format!(
                    "Question {} needs at least two options",
                    question.order
                )));
            }
            if question.options.iter().any(|o| o.text.trim().is_empty()) {
                return Err(QuizError::Validation(format!(
                    "Question {} has an empty option",
                    question.order
                )));
            }
            if question.options.iter().filter(|o| o.is_correct).count() != 1 {
                return Err(QuizError::Validation(format!(
                    "Question {} must have exactly one correct option",
                    question.order
                )));
            }
        }

        Ok(())
    }

    /// Phase-1 payload for the persistence gateway.
    pub fn metadata_request(&self) -> CreateQuizRequest {
        CreateQuizRequest {
            title: self.title.clone(),
            description: self.description.clone(),
            passing_score_percent: self.passing_score_percent,
            time_limit_minutes: self.time_limit_minutes,
            attempt_limit: self.attempt_limit,
        }
    }

    /// Phase-2 payloads, in authored order.
    pub fn question_requests(&self) -> Vec<CreateQuestionRequest> {
        self.questions
            .iter()
            .map(|question| CreateQuestionRequest {
                text: question.text.clone(),
                order: question.order,
                options: question
                    .options
                    .iter()
                    .map(|option| OptionRecord {
                        text: option.text.clone(),
                        is_correct: option.is_correct,
                    })
                    .collect(),
            })
            .collect()
    }
}
