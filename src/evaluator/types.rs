// src/evaluator/types.rs — Data model for evaluation runs

use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::ops::Deref;
use std::path::Path;

use crate::infra::errors::EvalError;

/// One sample: a full original program plus its withheld tail and the
/// model's replacement for that tail.
///
/// `original_lines` and `generated_lines` are index-aligned and always the
/// same length. [`Dataset`] enforces this at ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationItem {
    pub original_program: String,
    pub original_lines: Vec<String>,
    pub generated_lines: Vec<String>,
}

impl EvaluationItem {
    pub fn new(
        original_program: impl Into<String>,
        original_lines: Vec<String>,
        generated_lines: Vec<String>,
    ) -> Self {
        Self {
            original_program: original_program.into(),
            original_lines,
            generated_lines,
        }
    }

    /// Aligned (original, generated) line pairs.
    pub fn line_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.original_lines
            .iter()
            .zip(self.generated_lines.iter())
            .map(|(o, g)| (o.as_str(), g.as_str()))
    }

    pub fn line_count(&self) -> usize {
        self.original_lines.len()
    }
}

/// Which half of an item a line-level metric reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSide {
    Original,
    Generated,
}

impl LineSide {
    pub fn lines(self, item: &EvaluationItem) -> &[String] {
        match self {
            LineSide::Original => &item.original_lines,
            LineSide::Generated => &item.generated_lines,
        }
    }
}

/// A validated sequence of items that all share the same tail length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    items: Vec<EvaluationItem>,
}

impl Dataset {
    /// Validate and wrap a list of items.
    ///
    /// Rejects any item whose original and generated tails differ in length,
    /// and any item whose tail length differs from the first item's.
    pub fn new(items: Vec<EvaluationItem>) -> Result<Self, EvalError> {
        let expected = items.first().map(|i| i.original_lines.len());
        for (index, item) in items.iter().enumerate() {
            let original = item.original_lines.len();
            let generated = item.generated_lines.len();
            if original != generated || Some(original) != expected {
                return Err(EvalError::MismatchedLines {
                    index,
                    original,
                    generated,
                });
            }
        }
        Ok(Self { items })
    }

    /// Parse a JSON array of items (the generator's output format).
    pub fn from_json_str(json: &str) -> Result<Self, EvalError> {
        let items: Vec<EvaluationItem> = serde_json::from_str(json)?;
        Self::new(items)
    }

    pub fn load(path: &Path) -> Result<Self, EvalError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn items(&self) -> &[EvaluationItem] {
        &self.items
    }

    pub fn total_lines(&self) -> usize {
        total_lines(&self.items)
    }
}

impl Deref for Dataset {
    type Target = [EvaluationItem];

    fn deref(&self) -> &Self::Target {
        &self.items
    }
}

/// Total number of aligned line pairs across all items.
pub fn total_lines(dataset: &[EvaluationItem]) -> usize {
    dataset.iter().map(EvaluationItem::line_count).sum()
}

/// Keyword -> occurrence count. Every vocabulary word is present.
pub type KeywordFrequencyMap = BTreeMap<String, u64>;

/// Diagnostic severity bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Style,
    Warning,
    Fatal,
}

/// One diagnostic reported by an external tool.
///
/// `severity` is `None` when the tool's output carries no bucket the binding
/// recognizes (unknown prefixes, or compilers whose output is not classified).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LintDiagnostic {
    pub code: String,
    pub severity: Option<Severity>,
}

impl LintDiagnostic {
    pub fn new(code: impl Into<String>, severity: Option<Severity>) -> Self {
        Self {
            code: code.into(),
            severity,
        }
    }
}

/// All diagnostics produced for one reconstructed program, in tool order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LintResult {
    pub diagnostics: Vec<LintDiagnostic>,
}

impl LintResult {
    pub fn new(diagnostics: Vec<LintDiagnostic>) -> Self {
        Self { diagnostics }
    }

    pub fn has_fatal(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Some(Severity::Fatal))
    }
}

/// Outcome of linting a whole dataset batch by batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LintRun {
    /// Per-item results of every batch that succeeded, in dataset order.
    pub results: Vec<LintResult>,
    /// Items belonging to batches whose tool invocation failed.
    pub errored_items: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinterSummary {
    pub style_fails: BTreeMap<String, u64>,
    pub warnings: BTreeMap<String, u64>,
    pub fatal_errors: BTreeMap<String, u64>,
    /// Fraction of linted items with no fatal diagnostic.
    pub executable_files: f64,
    #[serde(default)]
    pub errored_items: usize,
    /// Raw per-item diagnostic lines, for tools without severity buckets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<Vec<String>>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeywordStats {
    pub original_keyword_frequencies: KeywordFrequencyMap,
    pub generated_keyword_frequencies: KeywordFrequencyMap,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VariableStats {
    pub times_new_variable_was_introduced_original: f64,
    pub times_new_variable_was_introduced_generated: f64,
}

/// First-variable guess accuracy, or `NotApplicable` when no line in the
/// dataset contained a variable to guess. Serializes as a number or `"NA"`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FirstVariableScore {
    Ratio(f64),
    NotApplicable,
}

impl FirstVariableScore {
    pub fn as_ratio(self) -> Option<f64> {
        match self {
            FirstVariableScore::Ratio(r) => Some(r),
            FirstVariableScore::NotApplicable => None,
        }
    }
}

impl Serialize for FirstVariableScore {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.as_ratio() {
            Some(r) => serializer.serialize_f64(r),
            None => serializer.serialize_str("NA"),
        }
    }
}

/// The aggregate record handed to the reporting side (`stats.json`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub distance_vector_stats: f64,
    pub average_original_line_length: f64,
    pub average_generated_line_length: f64,
    pub keyword_stats: KeywordStats,
    pub variable_stats: VariableStats,
    pub first_keyword_stats: f64,
    pub first_variable_stats: FirstVariableScore,
    pub linter_stats: Option<LinterSummary>,
}

impl EvaluationReport {
    pub fn to_json_pretty(&self) -> Result<String, EvalError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_json(&self, path: &Path) -> Result<(), EvalError> {
        std::fs::write(path, self.to_json_pretty()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(orig: &[&str], gen: &[&str]) -> EvaluationItem {
        EvaluationItem::new(
            "",
            orig.iter().map(|s| s.to_string()).collect(),
            gen.iter().map(|s| s.to_string()).collect(),
        )
    }

    #[test]
    fn test_dataset_rejects_misaligned_item() {
        let err = Dataset::new(vec![item(&["a", "b"], &["a"])]).unwrap_err();
        assert!(matches!(
            err,
            EvalError::MismatchedLines {
                index: 0,
                original: 2,
                generated: 1
            }
        ));
    }

    #[test]
    fn test_dataset_rejects_differing_tail_lengths() {
        let err = Dataset::new(vec![item(&["a"], &["b"]), item(&["a", "b"], &["c", "d"])])
            .unwrap_err();
        assert!(matches!(err, EvalError::MismatchedLines { index: 1, .. }));
    }

    #[test]
    fn test_dataset_from_json() {
        let json = r#"[
            {"original_program": "x = 1\ny = 2\n", "original_lines": ["y = 2"], "generated_lines": ["y = 3"]},
            {"original_program": "a = 1\n", "original_lines": ["a = 1"], "generated_lines": ["a = 2"]}
        ]"#;
        let dataset = Dataset::from_json_str(json).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(total_lines(&dataset), 2);
        assert_eq!(dataset[0].generated_lines, vec!["y = 3".to_string()]);
    }

    #[test]
    fn test_dataset_from_invalid_json() {
        assert!(matches!(
            Dataset::from_json_str("{not json"),
            Err(EvalError::Json(_))
        ));
    }

    #[test]
    fn test_line_pairs_aligned() {
        let it = item(&["a", "b"], &["c", "d"]);
        let pairs: Vec<_> = it.line_pairs().collect();
        assert_eq!(pairs, vec![("a", "c"), ("b", "d")]);
    }

    #[test]
    fn test_first_variable_score_serialization() {
        assert_eq!(
            serde_json::to_string(&FirstVariableScore::NotApplicable).unwrap(),
            "\"NA\""
        );
        assert_eq!(
            serde_json::to_string(&FirstVariableScore::Ratio(0.5)).unwrap(),
            "0.5"
        );
    }

    #[test]
    fn test_lint_result_has_fatal() {
        let clean = LintResult::new(vec![LintDiagnostic::new("C0114", Some(Severity::Style))]);
        let broken = LintResult::new(vec![LintDiagnostic::new("E0602", Some(Severity::Fatal))]);
        assert!(!clean.has_fatal());
        assert!(broken.has_fatal());
    }

    #[test]
    fn test_linter_summary_omits_raw_errors_when_absent() {
        let json = serde_json::to_value(LinterSummary::default()).unwrap();
        assert!(json.get("errors").is_none());
        assert!(json.get("fatal_errors").is_some());
    }
}
