use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::env;
use tracing::{info, warn};

/// Complete client configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub quiz_service: QuizServiceConfig,
    pub file_store: FileStoreConfig,
    pub logging: LoggingConfig,
}

/// Remote quiz-service endpoint configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct QuizServiceConfig {
    pub base_url: String,
    pub token: Option<String>,
}

/// File-upload collaborator endpoint configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FileStoreConfig {
    pub base_url: String,
}

/// Logging system configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file_enabled: bool,
    pub console_enabled: bool,
    pub log_directory: String,
}

impl Config {
    /// Load configuration from environment variables with sensible defaults.
    pub fn from_env() -> Result<Self> {
        let config = Config {
            quiz_service: QuizServiceConfig::from_env()?,
            file_store: FileStoreConfig::from_env()?,
            logging: LoggingConfig::from_env()?,
        };

        config.log_configuration_summary();
        Ok(config)
    }

    /// Log a summary of loaded configuration (without sensitive data).
    fn log_configuration_summary(&self) {
        info!(
            quiz_service_url = %self.quiz_service.base_url,
            token_masked = %self
                .quiz_service
                .token
                .as_deref()
                .map(mask_sensitive_data)
                .unwrap_or_else(|| "<none>".to_string()),
            file_store_url = %self.file_store.base_url,
            log_level = %self.logging.level,
            "Configuration summary"
        );
    }

    pub fn validate(&self) -> Result<()> {
        if !self.quiz_service.base_url.starts_with("http://")
            && !self.quiz_service.base_url.starts_with("https://")
        {
            return Err(anyhow!(
                "QUIZ_SERVICE_URL must start with 'http://' or 'https://'"
            ));
        }

        if !self.file_store.base_url.starts_with("http://")
            && !self.file_store.base_url.starts_with("https://")
        {
            return Err(anyhow!(
                "FILE_STORE_URL must start with 'http://' or 'https://'"
            ));
        }

        if self.quiz_service.token.is_none() {
            warn!("QUIZ_SERVICE_TOKEN is not set - authenticated operations may be rejected");
        }

        if !["trace", "debug", "info", "warn", "error"]
            .iter()
            .any(|level| self.logging.level.to_lowercase().starts_with(level))
        {
            warn!(
                "Unrecognized log level '{}', the env filter will fall back to its default",
                self.logging.level
            );
        }

        Ok(())
    }
}

impl QuizServiceConfig {
    fn from_env() -> Result<Self> {
        let base_url = env::var("QUIZ_SERVICE_URL")
            .unwrap_or_else(|_| "http://localhost:4000/api".to_string());
        let token = env::var("QUIZ_SERVICE_TOKEN").ok();

        Ok(QuizServiceConfig { base_url, token })
    }
}

impl FileStoreConfig {
    fn from_env() -> Result<Self> {
        let base_url =
            env::var("FILE_STORE_URL").unwrap_or_else(|_| "http://localhost:4100".to_string());

        Ok(FileStoreConfig { base_url })
    }
}

impl LoggingConfig {
    fn from_env() -> Result<Self> {
        let level =
            env::var("RUST_LOG").unwrap_or_else(|_| "info,course_quiz=debug".to_string());

        let file_enabled = env::var("LOG_FILE_ENABLED")
            .unwrap_or_else(|_| "true".to_string())
            .parse::<bool>()
            .unwrap_or(true);

        let console_enabled = env::var("LOG_CONSOLE_ENABLED")
            .unwrap_or_else(|_| "true".to_string())
            .parse::<bool>()
            .unwrap_or(true);

        let log_directory = env::var("LOG_DIRECTORY").unwrap_or_else(|_| "logs".to_string());

        Ok(LoggingConfig {
            level,
            file_enabled,
            console_enabled,
            log_directory,
        })
    }
}

/// Mask sensitive data in configuration for safe logging.
fn mask_sensitive_data(data: &str) -> String {
    if data.len() <= 8 {
        "*".repeat(data.len())
    } else {
        format!("{}***{}", &data[..4], &data[data.len() - 4..])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_sensitive_data() {
        assert_eq!(mask_sensitive_data("short"), "*****");
        assert_eq!(mask_sensitive_data("tok-1234567890abcd"), "tok-***abcd");
    }

    #[test]
    fn test_quiz_service_defaults() {
        env::remove_var("QUIZ_SERVICE_URL");
        env::remove_var("QUIZ_SERVICE_TOKEN");

        let config = QuizServiceConfig::from_env().unwrap();
        assert_eq!(config.base_url, "http://localhost:4000/api");
        assert!(config.token.is_none());
    }

    #[test]
    fn test_validate_rejects_bad_urls() {
        let config = Config {
            quiz_service: QuizServiceConfig {
                base_url: "localhost:4000".to_string(),
                token: None,
            },
            file_store: FileStoreConfig {
                base_url: "http://localhost:4100".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_enabled: true,
                console_enabled: true,
                log_directory: "logs".to_string(),
            },
        };
        assert!(config.validate().is_err());

        let mut config = config;
        config.quiz_service.base_url = "https://quiz.example.com/api".to_string();
        assert!(config.validate().is_ok());
    }
}
