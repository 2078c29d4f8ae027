// src/evaluator/progress.rs — Batch progress events and terminal renderer

use std::fmt;

/// Progress of a chunked linting pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressEvent {
    Started {
        total: usize,
    },
    ChunkFinished {
        processed: usize,
        total: usize,
        errors: usize,
    },
    Finished {
        processed: usize,
        errors: usize,
    },
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ProgressEvent::Started { total } => {
                write!(f, "[lint] generating linting results for {} item(s)", total)
            }
            ProgressEvent::ChunkFinished {
                processed,
                total,
                errors,
            } => {
                let pct = if total == 0 {
                    100.0
                } else {
                    processed as f64 * 100.0 / total as f64
                };
                write!(
                    f,
                    "[lint] {}/{} ({:.1}%) complete, {} error(s)",
                    processed, total, pct, errors
                )
            }
            ProgressEvent::Finished { processed, errors } => {
                write!(f, "[done] {} item(s) linted, {} errored", processed, errors)
            }
        }
    }
}

/// Build a progress callback that writes formatted output to stderr.
///
/// Returns a closure suitable for `Evaluator::with_progress()`.
pub fn terminal_progress() -> impl Fn(ProgressEvent) + Send + 'static {
    move |event| eprintln!("{}", event)
}
