// src/lib.rs — Library root for tailscore

pub mod evaluator;
pub mod infra;

pub use evaluator::languages::{Language, LanguageBinding};
pub use evaluator::types::{Dataset, EvaluationItem, EvaluationReport};
pub use evaluator::{evaluate_file, Evaluator};
pub use infra::errors::EvalError;
