// Macros file - tracing macros are imported within the macro definitions

/// Standardized logging macros for consistent field names and message
/// patterns across the quiz subsystem.

/// Log the start of an operation with consistent fields.
#[macro_export]
macro_rules! log_op_start {
    ($operation:expr, quiz_id = $quiz_id:expr) => {
        tracing::debug!(
            operation = $operation,
            quiz_id = %$quiz_id,
            "Operation started"
        );
    };
    ($operation:expr, attempt_id = $attempt_id:expr) => {
        tracing::debug!(
            operation = $operation,
            attempt_id = %$attempt_id,
            "Operation started"
        );
    };
    ($operation:expr, lesson_id = $lesson_id:expr) => {
        tracing::debug!(
            operation = $operation,
            lesson_id = %$lesson_id,
            "Operation started"
        );
    };
    ($operation:expr) => {
        tracing::debug!(operation = $operation, "Operation started");
    };
}

/// Log successful completion of an operation.
#[macro_export]
macro_rules! log_op_success {
    ($operation:expr, quiz_id = $quiz_id:expr, $msg:expr) => {
        tracing::info!(
            operation = $operation,
            quiz_id = %$quiz_id,
            "Operation completed: {}", $msg
        );
    };
    ($operation:expr, attempt_id = $attempt_id:expr, $msg:expr) => {
        tracing::info!(
            operation = $operation,
            attempt_id = %$attempt_id,
            "Operation completed: {}", $msg
        );
    };
    ($operation:expr, count = $count:expr, $msg:expr) => {
        tracing::info!(
            operation = $operation,
            count = $count,
            "Operation completed: {}", $msg
        );
    };
    ($operation:expr, $msg:expr) => {
        tracing::info!(operation = $operation, "Operation completed: {}", $msg);
    };
}

/// Log operation errors with consistent structure.
#[macro_export]
macro_rules! log_op_error {
    ($operation:expr, quiz_id = $quiz_id:expr, error = $error:expr, $msg:expr) => {
        tracing::error!(
            operation = $operation,
            quiz_id = %$quiz_id,
            error = %$error,
            "Operation failed: {}", $msg
        );
    };
    ($operation:expr, attempt_id = $attempt_id:expr, error = $error:expr, $msg:expr) => {
        tracing::error!(
            operation = $operation,
            attempt_id = %$attempt_id,
            error = %$error,
            "Operation failed: {}", $msg
        );
    };
    ($operation:expr, error = $error:expr, $msg:expr) => {
        tracing::error!(
            operation = $operation,
            error = %$error,
            "Operation failed: {}", $msg
        );
    };
}
