// src/evaluator/languages/mod.rs — Language bindings
//
// A binding supplies everything the evaluator cannot do generically: the
// keyword vocabulary, variable extraction, running the external tool on
// reconstructed programs and reducing its diagnostics.

pub mod c;
pub mod python;

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use tree_sitter::Node;

use super::types::{EvaluationItem, LintResult, LinterSummary};
use crate::infra::config::Config;
use crate::infra::errors::EvalError;

pub use c::CBinding;
pub use python::PythonBinding;

/// Language-specific capabilities used by [`crate::evaluator::Evaluator`].
pub trait LanguageBinding: Send + Sync {
    fn language(&self) -> Language;

    /// Fixed vocabulary of keywords (and reserved names) for this language.
    fn keywords(&self) -> &BTreeSet<String>;

    /// Variables/identifiers of a full program. Fails with a recoverable
    /// error when the program cannot be parsed.
    fn extract_variables(&self, program: &str) -> Result<Vec<String>, EvalError>;

    /// Reconstruct and lint every item of one batch, in order.
    ///
    /// An error discards the whole batch. Items that fail on their own are
    /// left out of the returned list; the evaluator counts them as errored.
    fn lint(&self, chunk: &[EvaluationItem]) -> Result<Vec<LintResult>, EvalError>;

    /// Reduce per-item results to counts and an executable fraction.
    /// Returns `None` when there is nothing to summarize.
    fn summarize_lint_results(&self, results: &[LintResult]) -> Option<LinterSummary>;

    fn is_keyword(&self, word: &str) -> bool {
        self.keywords().contains(word)
    }
}

/// Identifier of a supported target language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    C,
}

impl Language {
    pub fn as_str(self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::C => "c",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "python" | "py" => Ok(Language::Python),
            "c" => Ok(Language::C),
            _ => Err(EvalError::UnsupportedLanguage(s.to_string())),
        }
    }
}

/// Build the binding for `language` using the tool settings in `config`.
pub fn binding_for(language: Language, config: &Config) -> Box<dyn LanguageBinding> {
    match language {
        Language::Python => Box::new(PythonBinding::from_config(&config.python)),
        Language::C => Box::new(CBinding::from_config(&config.c)),
    }
}

/// Visit every node of a syntax tree in document order.
pub(crate) fn walk_tree<'tree>(root: Node<'tree>, mut visit: impl FnMut(Node<'tree>)) {
    let mut cursor = root.walk();
    loop {
        visit(cursor.node());
        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return;
            }
        }
    }
}

/// 1-based row of the first syntax error or missing token, if any.
pub(crate) fn first_error_line(root: Node<'_>) -> Option<usize> {
    let mut line = None;
    walk_tree(root, |node| {
        if line.is_none() && (node.is_error() || node.is_missing()) {
            line = Some(node.start_position().row + 1);
        }
    });
    line
}

/// Lint a batch item by item. An item-recoverable error drops that item and
/// the loop moves on; any other error fails the batch.
pub(crate) fn lint_each<F>(
    chunk: &[EvaluationItem],
    mut lint_item: F,
) -> Result<Vec<LintResult>, EvalError>
where
    F: FnMut(usize, &EvaluationItem) -> Result<LintResult, EvalError>,
{
    let mut results = Vec::with_capacity(chunk.len());
    for (index, item) in chunk.iter().enumerate() {
        match lint_item(index, item) {
            Ok(result) => results.push(result),
            Err(e) if e.is_item_recoverable() => {
                tracing::warn!("Skipping item {} of lint batch: {}", index, e);
            }
            Err(e) => return Err(e),
        }
    }
    Ok(results)
}

pub(crate) fn vocabulary(words: &[&str]) -> BTreeSet<String> {
    words.iter().map(|w| w.to_string()).collect()
}
