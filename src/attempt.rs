use chrono::{DateTime, Duration, Utc};
use tracing::info;
use uuid::Uuid;

use crate::errors::{QuizError, Result};
use crate::gateway::QuizGateway;
use crate::models::{AnswerMap, AttemptSummary, GradedAttempt, QuizData};

/// Attempt history gate: a new attempt may start while fewer prior attempts
/// exist than the limit allows. Pure; consulted before every transition
/// into an in-progress attempt.
pub fn can_start_attempt(prior_attempts: &[AttemptSummary], attempt_limit: u32) -> bool {
    prior_attempts.len() < attempt_limit as usize
}

/// `round(100 * correct / total)`. The server is the grading authority;
/// this is its documented contract, used by test doubles.
pub fn score(correct: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    (100.0 * correct as f64 / total as f64).round() as u8
}

pub fn passes(score: u8, passing_score_percent: u8) -> bool {
    score >= passing_score_percent
}

/// Take-flow phases: `Summary -> InProgress -> Submitted -> Summary`.
#[derive(Debug, Clone)]
pub enum AttemptPhase {
    /// Not started, or between attempts.
    Summary,
    /// An attempt is underway; answers accumulate until submission.
    InProgress {
        started_at: DateTime<Utc>,
        answers: AnswerMap,
    },
    /// Graded; waiting for the learner to acknowledge the result.
    Submitted { result: GradedAttempt },
}

/// Drives one learner's passage through a quiz: loads quiz and history,
/// gates attempt starts, records answers, submits for grading.
pub struct AttemptRuntime {
    quiz: QuizData,
    attempts: Vec<AttemptSummary>,
    phase: AttemptPhase,
}

impl AttemptRuntime {
    /// Load quiz data and prior attempts, landing in `Summary`.
    pub async fn load(gateway: &QuizGateway, quiz_id: Uuid) -> Result<Self> {
        let quiz = gateway.fetch_quiz(quiz_id).await?;
        let attempts = gateway.list_attempts(quiz_id).await?;
        info!(
            quiz_id = %quiz_id,
            question_count = quiz.questions.len(),
            prior_attempts = attempts.len(),
            "Attempt runtime loaded"
        );
        Ok(Self {
            quiz,
            attempts,
            phase: AttemptPhase::Summary,
        })
    }

    /// Build a runtime from already-fetched data; `load` is the remote path.
    pub fn from_parts(quiz: QuizData, attempts: Vec<AttemptSummary>) -> Self {
        Self {
            quiz,
            attempts,
            phase: AttemptPhase::Summary,
        }
    }

    pub fn quiz(&self) -> &QuizData {
        &self.quiz
    }

    pub fn attempts(&self) -> &[AttemptSummary] {
        &self.attempts
    }

    pub fn phase(&self) -> &AttemptPhase {
        &self.phase
    }

    pub fn attempts_remaining(&self) -> u32 {
        (self.quiz.metadata.attempt_limit as usize).saturating_sub(self.attempts.len()) as u32
    }

    pub fn can_start(&self) -> bool {
        matches!(self.phase, AttemptPhase::Summary)
            && can_start_attempt(&self.attempts, self.quiz.metadata.attempt_limit)
    }

    /// `Summary -> InProgress`, refused when the attempt limit is exhausted.
    pub fn start_attempt(&mut self, now: DateTime<Utc>) -> Result<()> {
        if !matches!(self.phase, AttemptPhase::Summary) {
            return Err(QuizError::Validation(
                "An attempt is already in progress".to_string(),
            ));
        }
        if !can_start_attempt(&self.attempts, self.quiz.metadata.attempt_limit) {
            return Err(QuizError::AttemptLimitReached {
                used: self.attempts.len(),
                limit: self.quiz.metadata.attempt_limit,
            });
        }

        self.phase = AttemptPhase::InProgress {
            started_at: now,
            answers: AnswerMap::new(),
        };
        Ok(())
    }

    /// Record (or replace) the selected option for a question.
    pub fn select_answer(&mut self, question_id: Uuid, option_index: usize) -> Result<()> {
        let option_count = self
            .quiz
            .questions
            .iter()
            .find(|q| q.id == question_id)
            .map(|q| q.options.len())
            .ok_or_else(|| QuizError::Validation(format!("Question {} not found", question_id)))?;

        if option_index >= option_count {
            return Err(QuizError::Validation(format!(
                "Option index {} out of range",
                option_index
            )));
        }

        match &mut self.phase {
            AttemptPhase::InProgress { answers, .. } => {
                answers.insert(question_id, option_index);
                Ok(())
            }
            _ => Err(QuizError::Validation(
                "No attempt is in progress".to_string(),
            )),
        }
    }

    pub fn answered_count(&self) -> usize {
        match &self.phase {
            AttemptPhase::InProgress { answers, .. } => answers.len(),
            _ => 0,
        }
    }

    /// Hard submission precondition: every question has an answer.
    pub fn all_answered(&self) -> bool {
        self.answered_count() == self.quiz.questions.len()
    }

    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        match &self.phase {
            AttemptPhase::InProgress { started_at, .. } => {
                Some(*started_at + Duration::minutes(self.quiz.metadata.time_limit_minutes as i64))
            }
            _ => None,
        }
    }

    /// Remaining time while in progress; zero once the deadline has passed.
    pub fn time_remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.deadline()
            .map(|deadline| (deadline - now).max(Duration::zero()))
    }

    fn past_deadline(&self, now: DateTime<Utc>) -> bool {
        self.deadline().is_some_and(|deadline| now > deadline)
    }

    /// Whether the submit action is enabled: all questions answered and the
    /// time limit not yet exceeded.
    pub fn can_submit(&self, now: DateTime<Utc>) -> bool {
        matches!(self.phase, AttemptPhase::InProgress { .. })
            && self.all_answered()
            && !self.past_deadline(now)
    }

    /// Submit for grading. Two independent remote calls: the attempt is
    /// created server-side, then the answer map is sent. A failure between
    /// them leaves an attempt consumed against the limit with no score; that
    /// state is surfaced as `OrphanedAttempt` rather than lost.
    ///
    /// Past the deadline a full submit is refused; use
    /// [`Self::submit_expired`] to send what was answered.
    pub async fn submit(
        &mut self,
        gateway: &QuizGateway,
        now: DateTime<Utc>,
    ) -> Result<&GradedAttempt> {
        if !matches!(self.phase, AttemptPhase::InProgress { .. }) {
            return Err(QuizError::Validation(
                "No attempt is in progress".to_string(),
            ));
        }
        if self.past_deadline(now) {
            return Err(QuizError::TimeExpired);
        }
        if !self.all_answered() {
            return Err(QuizError::Validation(format!(
                "{} of {} questions answered",
                self.answered_count(),
                self.quiz.questions.len()
            )));
        }

        self.push_answers(gateway).await
    }

    /// Auto-submit path for an expired attempt: sends exactly the answers
    /// recorded so far. Only valid once the deadline has passed, so a
    /// learner can never run past the limit for full credit.
    pub async fn submit_expired(
        &mut self,
        gateway: &QuizGateway,
        now: DateTime<Utc>,
    ) -> Result<&GradedAttempt> {
        if !matches!(self.phase, AttemptPhase::InProgress { .. }) {
            return Err(QuizError::Validation(
                "No attempt is in progress".to_string(),
            ));
        }
        if !self.past_deadline(now) {
            return Err(QuizError::Validation(
                "The attempt has not expired".to_string(),
            ));
        }

        self.push_answers(gateway).await
    }

    async fn push_answers(&mut self, gateway: &QuizGateway) -> Result<&GradedAttempt> {
        let answers = match &self.phase {
            AttemptPhase::InProgress { answers, .. } => answers.clone(),
            _ => unreachable!("checked by callers"),
        };

        let created = gateway.create_attempt(self.quiz.metadata.id).await?;
        let graded = gateway
            .submit_attempt(created.attempt_id, &answers)
            .await
            .map_err(|err| QuizError::OrphanedAttempt {
                attempt_id: created.attempt_id,
                message: err.user_message(),
            })?;

        info!(
            attempt_id = %graded.attempt_id,
            score = graded.score,
            passed = graded.passed,
            "Attempt graded"
        );
        self.phase = AttemptPhase::Submitted { result: graded };
        match &self.phase {
            AttemptPhase::Submitted { result } => Ok(result),
            _ => unreachable!(),
        }
    }

    /// `Submitted -> Summary`: refresh attempt history so the summary view
    /// reflects the new attempt and retake availability.
    pub async fn acknowledge_result(&mut self, gateway: &QuizGateway) -> Result<()> {
        if !matches!(self.phase, AttemptPhase::Submitted { .. }) {
            return Err(QuizError::Validation(
                "No graded attempt to acknowledge".to_string(),
            ));
        }

        self.attempts = gateway.list_attempts(self.quiz.metadata.id).await?;
        self.phase = AttemptPhase::Summary;
        Ok(())
    }
}
