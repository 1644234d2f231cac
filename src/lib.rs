pub mod attempt;
pub mod config;
pub mod draft;
pub mod errors;
pub mod gateway;
pub mod lesson;
pub mod logging;
pub mod models;
pub mod uploads;


pub use attempt::{can_start_attempt, passes, score, AttemptPhase, AttemptRuntime};
pub use config::Config;
pub use draft::{DraftOption, DraftQuestion, QuizDraft};
pub use errors::{QuizError, Result};
pub use gateway::{HttpQuizService, QuizGateway, QuizService, ReplacedQuiz};
pub use lesson::{LessonComposer, LessonStore};
pub use models::*;
pub use uploads::{FileStore, HttpFileStore, UploadKind};
