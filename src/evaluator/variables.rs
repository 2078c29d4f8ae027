// src/evaluator/variables.rs — Variable usage in the withheld tail

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

use super::languages::LanguageBinding;
use super::line_metrics::split_words;
use super::reconstruct::strip_tail;
use super::types::EvaluationItem;
use crate::infra::errors::EvalError;

/// Where an item's non-keyword variables occur relative to its tail.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TailVariables {
    /// Distinct variables present in the program once the tail is removed.
    pub outside_tail: Vec<String>,
    /// Distinct variables present in the tail lines.
    pub in_tail: Vec<String>,
    /// Tail variables that appear nowhere else in the program.
    pub introduced_in_tail: Vec<String>,
}

/// Classify the original program's variables against its tail lines.
///
/// Variables come from the binding's extractor over the full program;
/// presence is decided on word tokens of the stripped program and of the
/// tail text. Keywords never count as variables.
pub fn analyze_tail(
    binding: &dyn LanguageBinding,
    item: &EvaluationItem,
) -> Result<TailVariables, EvalError> {
    let all_variables = binding.extract_variables(&item.original_program)?;
    let stripped = strip_tail(&item.original_program, &item.original_lines)?;
    let tail_text = item.original_lines.join("\n");

    let body_words: HashSet<&str> = split_words(&stripped).collect();
    let tail_words: HashSet<&str> = split_words(&tail_text).collect();

    let mut result = TailVariables::default();
    for var in &all_variables {
        if binding.is_keyword(var) {
            continue;
        }
        if body_words.contains(var.as_str()) && !result.outside_tail.contains(var) {
            result.outside_tail.push(var.clone());
        }
        if tail_words.contains(var.as_str()) && !result.in_tail.contains(var) {
            result.in_tail.push(var.clone());
        }
    }
    result.introduced_in_tail = result
        .in_tail
        .iter()
        .filter(|v| !body_words.contains(v.as_str()))
        .cloned()
        .collect();

    Ok(result)
}

static PLACEHOLDER_RE: OnceLock<Regex> = OnceLock::new();

/// Count `temp<digits>` placeholders: the model's names for fresh variables.
///
/// Generated code rarely parses, so this textual count stands in for
/// extraction on the generated side.
pub fn count_placeholder_names(lines: &[String]) -> usize {
    let re = PLACEHOLDER_RE
        .get_or_init(|| Regex::new(r"temp[0-9]+").expect("placeholder pattern is valid"));
    re.find_iter(&lines.join("\n")).count()
}
