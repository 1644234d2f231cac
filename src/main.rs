use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::env;
use std::sync::Arc;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use course_quiz::config::Config;
use course_quiz::draft::{QuizDraft, DEFAULT_OPTION_COUNT};
use course_quiz::gateway::{HttpQuizService, QuizGateway};
use course_quiz::{log_op_error, log_op_start, log_op_success};

/// Authoring file format accepted by `quiz-push`. The draft is rebuilt
/// through the authoring engine so every invariant check applies.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DraftFile {
    title: String,
    #[serde(default)]
    description: String,
    passing_score_percent: u8,
    time_limit_minutes: u32,
    attempt_limit: u32,
    questions: Vec<DraftFileQuestion>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DraftFileQuestion {
    text: String,
    options: Vec<DraftFileOption>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DraftFileOption {
    text: String,
    #[serde(default)]
    is_correct: bool,
}

fn build_draft(file: DraftFile) -> Result<QuizDraft> {
    let mut draft = QuizDraft::new();
    draft.set_metadata(
        file.title,
        file.description,
        file.passing_score_percent,
        file.time_limit_minutes,
        file.attempt_limit,
    )?;

    if file.questions.is_empty() {
        return Err(anyhow!("Draft file contains no questions"));
    }

    // A fresh draft starts with one templated question; reuse it for the
    // first entry and append the rest.
    let mut ids = vec![draft.questions()[0].id];
    for _ in 1..file.questions.len() {
        ids.push(draft.add_question());
    }

    for (question_id, question) in ids.into_iter().zip(file.questions) {
        if question.options.len() != DEFAULT_OPTION_COUNT {
            return Err(anyhow!(
                "Question '{}' must have exactly {} options",
                question.text,
                DEFAULT_OPTION_COUNT
            ));
        }

        draft.update_question_text(question_id, question.text)?;
        let mut correct = None;
        for (index, option) in question.options.iter().enumerate() {
            draft.update_option_text(question_id, index, option.text.clone())?;
            if option.is_correct {
                correct = Some(index);
            }
        }
        let correct = correct
            .ok_or_else(|| anyhow!("A question in the draft file has no correct option"))?;
        draft.set_correct_option(question_id, correct)?;
    }

    draft.validate()?;
    Ok(draft)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    let _guard = setup_logging(&config)?;
    config.validate()?;

    let mut args = env::args().skip(1);
    let path = args
        .next()
        .ok_or_else(|| anyhow!("Usage: quiz-push <draft.json> [--replace <old-quiz-id>]"))?;
    let replace_id = match args.next().as_deref() {
        Some("--replace") => {
            let raw = args
                .next()
                .ok_or_else(|| anyhow!("--replace requires a quiz id"))?;
            Some(Uuid::parse_str(&raw).context("Invalid quiz id for --replace")?)
        }
        Some(other) => return Err(anyhow!("Unknown argument '{}'", other)),
        None => None,
    };

    let raw = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("Could not read draft file '{}'", path))?;
    let file: DraftFile =
        serde_json::from_str(&raw).context("Draft file is not valid JSON")?;
    let draft = build_draft(file)?;

    let service = HttpQuizService::new(
        config.quiz_service.base_url.clone(),
        config.quiz_service.token.clone(),
    );
    let gateway = QuizGateway::new(Arc::new(service));

    match replace_id {
        Some(old_quiz_id) => {
            log_op_start!("replace_quiz", quiz_id = old_quiz_id);
            match gateway.replace_quiz(old_quiz_id, &draft).await {
                Ok(replaced) => {
                    log_op_success!(
                        "replace_quiz",
                        quiz_id = replaced.quiz.metadata.id,
                        "quiz replaced"
                    );
                    if !replaced.old_quiz_deleted {
                        println!(
                            "Warning: old quiz {} could not be deleted and needs manual cleanup",
                            replaced.old_quiz_id
                        );
                    }
                    println!("Quiz replaced: new id {}", replaced.quiz.metadata.id);
                }
                Err(err) => {
                    log_op_error!("replace_quiz", error = err, "replace failed");
                    return Err(anyhow!(err.user_message()));
                }
            }
        }
        None => {
            log_op_start!("create_quiz");
            match gateway.create_complete_quiz(&draft).await {
                Ok(quiz) => {
                    log_op_success!("create_quiz", quiz_id = quiz.metadata.id, "quiz created");
                    println!(
                        "Quiz created: id {} ({} questions)",
                        quiz.metadata.id,
                        quiz.questions.len()
                    );
                }
                Err(err) => {
                    log_op_error!("create_quiz", error = err, "create failed");
                    return Err(anyhow!(err.user_message()));
                }
            }
        }
    }

    Ok(())
}

fn setup_logging(config: &Config) -> Result<Option<WorkerGuard>> {
    use tracing_subscriber::fmt;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone()));

    let registry = tracing_subscriber::registry().with(env_filter);

    let mut guard = None;
    if config.logging.file_enabled {
        std::fs::create_dir_all(&config.logging.log_directory).unwrap_or_else(|e| {
            eprintln!("Warning: Could not create logs directory: {}", e);
        });

        let file_appender =
            tracing_appender::rolling::daily(&config.logging.log_directory, "quiz-push.log");
        let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);
        guard = Some(file_guard);

        let file_layer = fmt::layer()
            .with_target(true)
            .with_ansi(false)
            .with_writer(non_blocking_file);

        if config.logging.console_enabled {
            registry.with(file_layer).with(fmt::layer()).init();
        } else {
            registry.with(file_layer).init();
        }
    } else {
        registry.with(fmt::layer()).init();
    }

    info!("Logging initialized");
    Ok(guard)
}
