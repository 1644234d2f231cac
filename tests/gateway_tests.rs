use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use course_quiz::draft::QuizDraft;
use course_quiz::errors::QuizError;
use course_quiz::gateway::{HttpQuizService, QuizGateway, QuizService};
use course_quiz::models::{
    CreateQuestionRequest, CreateQuizRequest, QuestionRecord, QuizMetadata,
};

#[derive(Default)]
struct MockState {
    calls: Vec<String>,
    quizzes: HashMap<Uuid, QuizMetadata>,
    questions: HashMap<Uuid, Vec<QuestionRecord>>,
    fail_question_uploads_after: Option<usize>,
    fail_deletes: bool,
    last_auth_header: Option<String>,
}

type Shared = Arc<Mutex<MockState>>;

async fn create_quiz(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(request): Json<CreateQuizRequest>,
) -> Json<QuizMetadata> {
    let metadata = QuizMetadata {
        id: Uuid::new_v4(),
        title: request.title,
        description: request.description,
        passing_score_percent: request.passing_score_percent,
        time_limit_minutes: request.time_limit_minutes,
        attempt_limit: request.attempt_limit,
    };

    let mut state = state.lock().unwrap();
    state.calls.push("create_quiz".to_string());
    state.last_auth_header = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    state.quizzes.insert(metadata.id, metadata.clone());
    state.questions.insert(metadata.id, Vec::new());
    Json(metadata)
}

async fn add_question(
    State(state): State<Shared>,
    Path(quiz_id): Path<Uuid>,
    Json(request): Json<CreateQuestionRequest>,
) -> Result<Json<QuestionRecord>, (StatusCode, Json<serde_json::Value>)> {
    let mut state = state.lock().unwrap();
    let already_persisted = state
        .questions
        .get(&quiz_id)
        .map(|q| q.len())
        .unwrap_or_default();

    if let Some(limit) = state.fail_question_uploads_after {
        if already_persisted >= limit {
            state.calls.push("add_question:rejected".to_string());
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "question storage unavailable"})),
            ));
        }
    }

    state.calls.push(format!("add_question:{}", request.order));
    let record = QuestionRecord {
        id: Uuid::new_v4(),
        text: request.text,
        order: request.order,
        options: request.options,
    };
    state
        .questions
        .get_mut(&quiz_id)
        .expect("quiz exists")
        .push(record.clone());
    Ok(Json(record))
}

async fn get_quiz(
    State(state): State<Shared>,
    Path(quiz_id): Path<Uuid>,
) -> Result<Json<QuizMetadata>, (StatusCode, Json<serde_json::Value>)> {
    let mut state = state.lock().unwrap();
    state.calls.push("get_quiz".to_string());
    state
        .quizzes
        .get(&quiz_id)
        .cloned()
        .map(Json)
        .ok_or((
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": "quiz not found"})),
        ))
}

async fn get_questions(
    State(state): State<Shared>,
    Path(quiz_id): Path<Uuid>,
) -> Json<Vec<QuestionRecord>> {
    let mut state = state.lock().unwrap();
    state.calls.push("get_questions".to_string());
    Json(state.questions.get(&quiz_id).cloned().unwrap_or_default())
}

async fn delete_quiz(
    State(state): State<Shared>,
    Path(quiz_id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, Json<serde_json::Value>)> {
    let mut state = state.lock().unwrap();
    state.calls.push("delete_quiz".to_string());

    if state.fail_deletes {
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": "delete unavailable"})),
        ));
    }
    if state.quizzes.remove(&quiz_id).is_none() {
        return Err((
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": "quiz not found"})),
        ));
    }
    state.questions.remove(&quiz_id);
    Ok(StatusCode::NO_CONTENT)
}

async fn spawn_mock(state: Shared) -> String {
    let app = Router::new()
        .route("/quizzes", post(create_quiz))
        .route("/quizzes/:id", get(get_quiz).delete(delete_quiz))
        .route("/quizzes/:id/questions", post(add_question).get(get_questions))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn three_question_draft() -> QuizDraft {
    let mut draft = QuizDraft::new();
    draft
        .set_metadata("Rust basics".into(), "intro".into(), 70, 15, 2)
        .unwrap();

    let first = draft.questions()[0].id;
    let mut ids = vec![first];
    ids.push(draft.add_question());
    ids.push(draft.add_question());

    for (number, id) in ids.iter().enumerate() {
        draft
            .update_question_text(*id, format!("Question {}", number + 1))
            .unwrap();
        for option in 0..4 {
            draft
                .update_option_text(*id, option, format!("Option {}", option))
                .unwrap();
        }
        draft.set_correct_option(*id, number % 4).unwrap();
    }
    draft
}

fn gateway_for(base_url: String, token: Option<String>) -> QuizGateway {
    QuizGateway::new(Arc::new(HttpQuizService::new(base_url, token)) as Arc<dyn QuizService>)
}

#[tokio::test]
async fn test_two_phase_creation_is_sequential_and_ordered() {
    let state: Shared = Arc::default();
    let base_url = spawn_mock(state.clone()).await;
    let gateway = gateway_for(base_url, None);

    let quiz = gateway
        .create_complete_quiz(&three_question_draft())
        .await
        .unwrap();

    assert_eq!(quiz.questions.len(), 3);
    let calls = state.lock().unwrap().calls.clone();
    // Exactly 1 + N calls, questions in authored order.
    assert_eq!(
        calls,
        vec![
            "create_quiz",
            "add_question:1",
            "add_question:2",
            "add_question:3"
        ]
    );
}

#[tokio::test]
async fn test_bearer_token_is_sent() {
    let state: Shared = Arc::default();
    let base_url = spawn_mock(state.clone()).await;
    let gateway = gateway_for(base_url, Some("secret-token".to_string()));

    gateway
        .create_complete_quiz(&three_question_draft())
        .await
        .unwrap();

    let auth = state.lock().unwrap().last_auth_header.clone();
    assert_eq!(auth.as_deref(), Some("Bearer secret-token"));
}

#[tokio::test]
async fn test_phase_two_failure_reports_partial_creation() {
    let state: Shared = Arc::default();
    state.lock().unwrap().fail_question_uploads_after = Some(1);
    let base_url = spawn_mock(state.clone()).await;
    let gateway = gateway_for(base_url, None);

    let draft = three_question_draft();
    let result = gateway.create_complete_quiz(&draft).await;

    let quiz_id = match result {
        Err(QuizError::PartialCreation {
            quiz_id,
            persisted,
            total,
            message,
        }) => {
            assert_eq!(persisted, 1);
            assert_eq!(total, 3);
            assert_eq!(message, "question storage unavailable");
            quiz_id
        }
        other => panic!("expected partial creation, got {:?}", other.err()),
    };

    // The quiz exists server-side with a partial question set.
    {
        let state = state.lock().unwrap();
        assert!(state.quizzes.contains_key(&quiz_id));
        assert_eq!(state.questions[&quiz_id].len(), 1);
    }

    // Resume at the first unpersisted question; nothing is re-sent.
    state.lock().unwrap().fail_question_uploads_after = None;
    let resumed = gateway
        .resume_question_upload(quiz_id, &draft, 1)
        .await
        .unwrap();
    assert_eq!(resumed.len(), 2);

    let state = state.lock().unwrap();
    assert_eq!(state.questions[&quiz_id].len(), 3);
    let orders: Vec<u32> = state.questions[&quiz_id].iter().map(|q| q.order).collect();
    assert_eq!(orders, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_fetch_quiz_merges_two_reads() {
    let state: Shared = Arc::default();
    let base_url = spawn_mock(state.clone()).await;
    let gateway = gateway_for(base_url, None);

    let created = gateway
        .create_complete_quiz(&three_question_draft())
        .await
        .unwrap();

    state.lock().unwrap().calls.clear();
    let fetched = gateway.fetch_quiz(created.metadata.id).await.unwrap();

    assert_eq!(fetched.metadata.title, "Rust basics");
    assert_eq!(fetched.questions.len(), 3);
    let calls = state.lock().unwrap().calls.clone();
    assert_eq!(calls, vec!["get_quiz", "get_questions"]);
}

#[tokio::test]
async fn test_replace_creates_new_quiz_before_deleting_old() {
    let state: Shared = Arc::default();
    let base_url = spawn_mock(state.clone()).await;
    let gateway = gateway_for(base_url, None);

    let old = gateway
        .create_complete_quiz(&three_question_draft())
        .await
        .unwrap();
    state.lock().unwrap().calls.clear();

    let mut new_draft = three_question_draft();
    new_draft
        .set_metadata("Rust basics v2".into(), "".into(), 70, 15, 2)
        .unwrap();
    let replaced = gateway
        .replace_quiz(old.metadata.id, &new_draft)
        .await
        .unwrap();

    assert!(replaced.old_quiz_deleted);
    assert_eq!(replaced.old_quiz_id, old.metadata.id);
    assert_ne!(replaced.quiz.metadata.id, old.metadata.id);

    let calls = state.lock().unwrap().calls.clone();
    // The new quiz is fully persisted before the old one is touched.
    assert_eq!(calls.first().map(String::as_str), Some("create_quiz"));
    assert_eq!(calls.last().map(String::as_str), Some("delete_quiz"));
}

#[tokio::test]
async fn test_replace_survives_failed_delete_of_old_quiz() {
    let state: Shared = Arc::default();
    let base_url = spawn_mock(state.clone()).await;
    let gateway = gateway_for(base_url, None);

    let old = gateway
        .create_complete_quiz(&three_question_draft())
        .await
        .unwrap();
    state.lock().unwrap().fail_deletes = true;

    let replaced = gateway
        .replace_quiz(old.metadata.id, &three_question_draft())
        .await
        .unwrap();

    // No data loss: the new quiz exists, the undeleted old id is reported.
    assert!(!replaced.old_quiz_deleted);
    let state = state.lock().unwrap();
    assert!(state.quizzes.contains_key(&replaced.quiz.metadata.id));
    assert!(state.quizzes.contains_key(&old.metadata.id));
}

#[tokio::test]
async fn test_server_error_message_is_surfaced() {
    let state: Shared = Arc::default();
    let base_url = spawn_mock(state.clone()).await;
    let gateway = gateway_for(base_url, None);

    let result = gateway.fetch_quiz(Uuid::new_v4()).await;
    match result {
        Err(QuizError::Network(message)) => assert_eq!(message, "quiz not found"),
        other => panic!("expected network error, got {:?}", other.err()),
    }
}

#[tokio::test]
async fn test_invalid_draft_never_reaches_the_network() {
    let state: Shared = Arc::default();
    let base_url = spawn_mock(state.clone()).await;
    let gateway = gateway_for(base_url, None);

    // Fresh draft: empty title and question text.
    let result = gateway.create_complete_quiz(&QuizDraft::new()).await;
    assert!(matches!(result, Err(QuizError::Validation(_))));
    assert!(state.lock().unwrap().calls.is_empty());
}
