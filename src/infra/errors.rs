// src/infra/errors.rs — Error types for tailscore

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EvalError {
    // Per-item errors (recoverable: the item is skipped for that metric)
    #[error("Failed to parse {language} program: {message}")]
    Parse { language: String, message: String },

    // Per-batch tool errors
    #[error("External tool '{tool}' not found on PATH")]
    ToolNotFound { tool: String },

    #[error("External tool '{tool}' failed: {message}")]
    ToolFailed { tool: String, message: String },

    // Computation errors (fatal for the metric)
    #[error("Cannot compute {metric}: no contributing lines or items")]
    DegenerateDenominator { metric: &'static str },

    // Caller errors
    #[error("Item {index} has {original} original lines but {generated} generated lines")]
    MismatchedLines {
        index: usize,
        original: usize,
        generated: usize,
    },

    #[error("Unsupported language '{0}' (expected 'python' or 'c')")]
    UnsupportedLanguage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    // Infra
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Pattern error: {0}")]
    Regex(#[from] regex::Error),
}

impl EvalError {
    /// Whether this error only invalidates the single item it was raised for.
    pub fn is_item_recoverable(&self) -> bool {
        matches!(self, EvalError::Parse { .. } | EvalError::Regex(_))
    }

    pub fn parse(language: &str, message: impl Into<String>) -> Self {
        EvalError::Parse {
            language: language.to_string(),
            message: message.into(),
        }
    }
}
