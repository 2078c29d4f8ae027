// src/evaluator/mod.rs — Evaluation engine
//
// The `Evaluator` computes every metric over a dataset, delegating the
// language-specific steps (variable extraction, reconstruction, linting) to
// the `LanguageBinding` it was built with. Each metric method consumes the
// whole dataset and can be called on its own.

pub mod languages;
pub mod line_metrics;
pub mod progress;
pub mod reconstruct;
pub mod static_analysis;
pub mod types;
pub mod utils;
pub mod variables;

use std::path::Path;

use languages::{binding_for, Language, LanguageBinding};
use line_metrics::{first_occurrence_guesses, keyword_frequencies, GuessTally};
use progress::ProgressEvent;
use types::*;
use utils::{checked_mean, checked_ratio, chunks};

use crate::infra::config::Config;
use crate::infra::errors::EvalError;
use crate::infra::logger;

/// Items per linter batch unless configured otherwise.
pub const DEFAULT_CHUNK_SIZE: usize = 50;

/// Report file written next to the other run outputs.
pub const STATS_FILE_NAME: &str = "stats.json";

/// Evaluate a dataset file end to end.
///
/// Logging is set up from `[logging] level`, the binding comes from
/// `[evaluation] language`, lint progress goes to stderr and the report is
/// written to `<output_dir>/stats.json`.
pub fn evaluate_file(
    dataset_path: &Path,
    output_dir: &Path,
    config: &Config,
) -> Result<EvaluationReport, EvalError> {
    logger::init_logging(&config.logging.level);

    let dataset = Dataset::load(dataset_path)?;
    let evaluator = Evaluator::from_config(config)?.with_progress(progress::terminal_progress());
    let report = evaluator.evaluate(&dataset)?;

    std::fs::create_dir_all(output_dir)?;
    let stats_path = output_dir.join(STATS_FILE_NAME);
    report.write_json(&stats_path)?;
    tracing::info!("Wrote {}", stats_path.display());
    Ok(report)
}

pub struct Evaluator {
    binding: Box<dyn LanguageBinding>,
    chunk_size: usize,
    /// Optional callback for batch progress events.
    on_progress: Option<Box<dyn Fn(ProgressEvent) + Send>>,
}

impl Evaluator {
    pub fn new(binding: Box<dyn LanguageBinding>) -> Self {
        Self {
            binding,
            chunk_size: DEFAULT_CHUNK_SIZE,
            on_progress: None,
        }
    }

    /// Build an evaluator for a language identifier such as `"python"` or `"c"`.
    pub fn for_language(language: &str, config: &Config) -> Result<Self, EvalError> {
        let language: Language = language.parse()?;
        Ok(Self::new(binding_for(language, config)).with_chunk_size(config.evaluation.chunk_size))
    }

    /// Build an evaluator for the language named in `[evaluation] language`.
    pub fn from_config(config: &Config) -> Result<Self, EvalError> {
        let language = config.evaluation.language.as_deref().ok_or_else(|| {
            EvalError::Config("no language given and [evaluation] language is unset".into())
        })?;
        Self::for_language(language, config)
    }

    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size.max(1);
        self
    }

    /// Set a callback for batch progress events.
    pub fn with_progress(mut self, cb: impl Fn(ProgressEvent) + Send + 'static) -> Self {
        self.on_progress = Some(Box::new(cb));
        self
    }

    pub fn binding(&self) -> &dyn LanguageBinding {
        self.binding.as_ref()
    }

    pub fn language(&self) -> Language {
        self.binding.language()
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Size of the binding's keyword vocabulary.
    pub fn keyword_count(&self) -> usize {
        self.binding.keywords().len()
    }

    fn emit(&self, event: ProgressEvent) {
        if let Some(ref cb) = self.on_progress {
            cb(event);
        }
    }

    /// Run every metric and assemble the aggregate report.
    pub fn evaluate(&self, dataset: &[EvaluationItem]) -> Result<EvaluationReport, EvalError> {
        tracing::info!(
            "Evaluating {} {} item(s)",
            dataset.len(),
            self.binding.language()
        );

        let report = EvaluationReport {
            distance_vector_stats: self.distance_vector_stats(dataset)?,
            average_original_line_length: self.average_original_line_length(dataset)?,
            average_generated_line_length: self.average_generated_line_length(dataset)?,
            keyword_stats: self.keyword_stats(dataset),
            variable_stats: self.variable_stats(dataset)?,
            first_keyword_stats: self.first_keyword_stats(dataset)?,
            first_variable_stats: self.first_variable_stats(dataset),
            linter_stats: self.linter_stats(dataset),
        };

        tracing::info!("Evaluation complete");
        Ok(report)
    }

    /// Lint the dataset batch by batch.
    ///
    /// A batch whose lint call fails is dropped and all its items are counted
    /// as errored; later batches still run. Items a batch left out on their
    /// own are counted as errored too. Progress is reported after every
    /// batch either way.
    pub fn lint_results(&self, dataset: &[EvaluationItem]) -> LintRun {
        let total = dataset.len();
        let mut run = LintRun {
            results: Vec::with_capacity(total),
            errored_items: 0,
        };
        let mut processed = 0usize;

        self.emit(ProgressEvent::Started { total });
        for (index, chunk) in chunks(dataset, self.chunk_size).enumerate() {
            match self.binding.lint(chunk) {
                Ok(results) => {
                    let skipped = chunk.len().saturating_sub(results.len());
                    if skipped > 0 {
                        tracing::warn!(
                            "Lint batch {}: {} item(s) could not be linted",
                            index,
                            skipped
                        );
                    }
                    run.errored_items += skipped;
                    run.results.extend(results);
                }
                Err(e) => {
                    tracing::warn!(
                        "Lint batch {} failed ({} item(s) counted as errored): {}",
                        index,
                        chunk.len(),
                        e
                    );
                    run.errored_items += chunk.len();
                }
            }
            processed += chunk.len();
            self.emit(ProgressEvent::ChunkFinished {
                processed,
                total,
                errors: run.errored_items,
            });
        }
        self.emit(ProgressEvent::Finished {
            processed,
            errors: run.errored_items,
        });

        run
    }

    /// Diagnostic counts and executable fraction over every item that was
    /// linted successfully. `None` when no batch produced results.
    pub fn linter_stats(&self, dataset: &[EvaluationItem]) -> Option<LinterSummary> {
        let run = self.lint_results(dataset);
        let mut summary = self.binding.summarize_lint_results(&run.results)?;
        summary.errored_items = run.errored_items;
        Some(summary)
    }

    /// Average Levenshtein distance per aligned line pair.
    pub fn distance_vector_stats(&self, dataset: &[EvaluationItem]) -> Result<f64, EvalError> {
        checked_ratio(
            line_metrics::total_distance(dataset) as f64,
            total_lines(dataset),
            "distance_vector_stats",
        )
    }

    /// Keyword frequencies on the original and generated tails.
    pub fn keyword_stats(&self, dataset: &[EvaluationItem]) -> KeywordStats {
        let vocabulary = self.binding.keywords();
        KeywordStats {
            original_keyword_frequencies: keyword_frequencies(
                dataset,
                LineSide::Original,
                vocabulary,
            ),
            generated_keyword_frequencies: keyword_frequencies(
                dataset,
                LineSide::Generated,
                vocabulary,
            ),
        }
    }

    /// Average number of variables introduced in the tail, per item.
    ///
    /// The original side uses real extraction; items that fail to parse are
    /// left out of both averages. The generated side counts `temp<N>`
    /// placeholders.
    pub fn variable_stats(&self, dataset: &[EvaluationItem]) -> Result<VariableStats, EvalError> {
        let mut original_counts = Vec::with_capacity(dataset.len());
        let mut generated_counts = Vec::with_capacity(dataset.len());

        for (index, item) in dataset.iter().enumerate() {
            match variables::analyze_tail(self.binding(), item) {
                Ok(vars) => {
                    original_counts.push(vars.introduced_in_tail.len());
                    generated_counts.push(variables::count_placeholder_names(
                        &item.generated_lines,
                    ));
                }
                Err(e) => tracing::debug!("Skipping item {} in variable_stats: {}", index, e),
            }
        }

        Ok(VariableStats {
            times_new_variable_was_introduced_original: checked_mean(
                &original_counts,
                "variable_stats",
            )?,
            times_new_variable_was_introduced_generated: checked_mean(
                &generated_counts,
                "variable_stats",
            )?,
        })
    }

    /// Fraction of guessable lines whose first keyword was reproduced.
    ///
    /// Fails with `DegenerateDenominator` when no original line contains a
    /// keyword.
    pub fn first_keyword_stats(&self, dataset: &[EvaluationItem]) -> Result<f64, EvalError> {
        let mut tally = GuessTally::default();
        for item in dataset {
            tally += first_occurrence_guesses(item, |w| self.binding.is_keyword(w));
        }
        checked_ratio(
            tally.correct as f64,
            total_lines(dataset).saturating_sub(tally.unguessable),
            "first_keyword_stats",
        )
    }

    /// Fraction of guessable lines whose first variable was reproduced.
    ///
    /// The reference list is the item's own extracted variables. An item whose
    /// extraction fails contributes all of its lines as unguessable.
    pub fn first_variable_stats(&self, dataset: &[EvaluationItem]) -> FirstVariableScore {
        let mut tally = GuessTally::default();
        for (index, item) in dataset.iter().enumerate() {
            match self.binding.extract_variables(&item.original_program) {
                Ok(vars) => {
                    let known: std::collections::HashSet<&str> =
                        vars.iter().map(String::as_str).collect();
                    tally += first_occurrence_guesses(item, |w| known.contains(w));
                }
                Err(e) => {
                    tracing::debug!("Skipping item {} in first_variable_stats: {}", index, e);
                    tally.unguessable += item.line_count();
                }
            }
        }

        let guessable = total_lines(dataset).saturating_sub(tally.unguessable);
        if guessable == 0 {
            return FirstVariableScore::NotApplicable;
        }
        FirstVariableScore::Ratio(tally.correct as f64 / guessable as f64)
    }

    pub fn average_original_line_length(
        &self,
        dataset: &[EvaluationItem],
    ) -> Result<f64, EvalError> {
        checked_ratio(
            line_metrics::total_line_length(dataset, LineSide::Original) as f64,
            total_lines(dataset),
            "average_original_line_length",
        )
    }

    pub fn average_generated_line_length(
        &self,
        dataset: &[EvaluationItem],
    ) -> Result<f64, EvalError> {
        checked_ratio(
            line_metrics::total_line_length(dataset, LineSide::Generated) as f64,
            total_lines(dataset),
            "average_generated_line_length",
        )
    }

    /// Average number of distinct non-keyword variables outside the tail.
    /// Baseline for `variable_stats`.
    pub fn avg_var_count_in_non_tail_program(
        &self,
        dataset: &[EvaluationItem],
    ) -> Result<f64, EvalError> {
        let counts: Vec<usize> = dataset
            .iter()
            .filter_map(|item| variables::analyze_tail(self.binding(), item).ok())
            .map(|vars| vars.outside_tail.len())
            .collect();
        checked_mean(&counts, "avg_var_count_in_non_tail_program")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::languages::{CBinding, PythonBinding};

    fn item(program: &str, orig: &[&str], gen: &[&str]) -> EvaluationItem {
        EvaluationItem::new(
            program,
            orig.iter().map(|s| s.to_string()).collect(),
            gen.iter().map(|s| s.to_string()).collect(),
        )
    }

    fn python() -> Evaluator {
        Evaluator::new(Box::new(PythonBinding::new()))
    }

    #[test]
    fn test_distance_scenario() {
        let data = vec![item("x = 1\ny = 2\n", &["x = 1", "y = 2"], &["x = 1", "y = 3"])];
        assert_eq!(python().distance_vector_stats(&data).unwrap(), 0.5);
    }

    #[test]
    fn test_distance_identical_is_zero() {
        let data = vec![
            item("a\n", &["if x:", "  pass"], &["if x:", "  pass"]),
            item("b\n", &["", "return"], &["", "return"]),
        ];
        assert_eq!(python().distance_vector_stats(&data).unwrap(), 0.0);
    }

    #[test]
    fn test_empty_dataset_averages_fail() {
        let ev = python();
        assert!(matches!(
            ev.distance_vector_stats(&[]),
            Err(EvalError::DegenerateDenominator { .. })
        ));
        assert!(ev.average_original_line_length(&[]).is_err());
        assert!(ev.first_keyword_stats(&[]).is_err());
        assert_eq!(ev.first_variable_stats(&[]), FirstVariableScore::NotApplicable);
    }

    #[test]
    fn test_average_line_lengths() {
        let data = vec![item("", &["abcd", "ab"], &["a", "abcdefg"])];
        let ev = python();
        assert_eq!(ev.average_original_line_length(&data).unwrap(), 3.0);
        assert_eq!(ev.average_generated_line_length(&data).unwrap(), 4.0);
    }

    #[test]
    fn test_keyword_stats_totals() {
        let data = vec![item(
            "",
            &["for i in range(10):", "    if i: return i"],
            &["while True:", "    pass"],
        )];
        let stats = python().keyword_stats(&data);
        let original_total: u64 = stats.original_keyword_frequencies.values().sum();
        // for, in, range, if, return
        assert_eq!(original_total, 5);
        assert_eq!(stats.generated_keyword_frequencies["while"], 1);
        assert_eq!(stats.generated_keyword_frequencies["True"], 1);
        assert_eq!(stats.generated_keyword_frequencies["pass"], 1);
        assert_eq!(stats.generated_keyword_frequencies["for"], 0);
    }

    #[test]
    fn test_variable_stats_skips_unparseable_items() {
        let data = vec![
            item(
                "a = 1\nb = a\nprint(b)\n",
                &["b = a", "print(b)"],
                &["temp1 = a", "print(temp1)"],
            ),
            item("def (:\n", &["x", "y"], &["temp1", "temp2"]),
        ];
        let stats = python().variable_stats(&data).unwrap();
        assert_eq!(stats.times_new_variable_was_introduced_original, 1.0);
        assert_eq!(stats.times_new_variable_was_introduced_generated, 2.0);
    }

    #[test]
    fn test_variable_stats_all_failed_is_degenerate() {
        let data = vec![item("def (:\n", &["x"], &["y"])];
        assert!(matches!(
            python().variable_stats(&data),
            Err(EvalError::DegenerateDenominator {
                metric: "variable_stats"
            })
        ));
    }

    #[test]
    fn test_first_keyword_stats() {
        let data = vec![item(
            "",
            &["return x", "x = 1", "if y: pass"],
            &["return y", "while 1", "while 2"],
        )];
        // Guessable: lines 1 and 3. Correct: line 1.
        assert_eq!(python().first_keyword_stats(&data).unwrap(), 0.5);
    }

    #[test]
    fn test_first_keyword_stats_no_keywords_is_degenerate() {
        let data = vec![item("", &["x = 1"], &["x = 2"])];
        assert!(python().first_keyword_stats(&data).is_err());
    }

    #[test]
    fn test_first_variable_stats() {
        let program = "total = 0\ncount = 1\ntotal = total + count\n";
        let data = vec![item(
            program,
            &["count = 1", "total = total + count"],
            &["count = 2", "count = total"],
        )];
        let score = python().first_variable_stats(&data);
        assert_eq!(score, FirstVariableScore::Ratio(0.5));
    }

    #[test]
    fn test_first_variable_stats_all_unguessable_is_na() {
        let data = vec![
            item("x = 1\n", &["1 + 2", "pass"], &["x", "x"]),
            item("def (:\n", &["x", "y"], &["x", "y"]),
        ];
        assert_eq!(
            python().first_variable_stats(&data),
            FirstVariableScore::NotApplicable
        );
    }

    #[test]
    fn test_avg_var_count_in_non_tail_program() {
        let data = vec![
            item("a = 1\nb = a\nc = b\n", &["c = b"], &["c = a"]),
            item("x = 1\ny = x\n", &["y = x"], &["y = 2"]),
        ];
        // {a, b} and {x}
        assert_eq!(
            python().avg_var_count_in_non_tail_program(&data).unwrap(),
            1.5
        );
    }

    #[test]
    fn test_c_variable_stats() {
        let program = "int main() {\n    int a = 1;\n    int b = a + 1;\n    return b;\n}\n";
        let data = vec![item(
            program,
            &["    int b = a + 1;", "    return b;"],
            &["    int temp1 = a;", "    return temp1;"],
        )];
        let ev = Evaluator::new(Box::new(CBinding::new()));
        let stats = ev.variable_stats(&data).unwrap();
        assert_eq!(stats.times_new_variable_was_introduced_original, 1.0);
        assert_eq!(stats.times_new_variable_was_introduced_generated, 2.0);
    }

    #[test]
    fn test_for_language_rejects_unknown() {
        assert!(matches!(
            Evaluator::for_language("fortran", &Config::default()),
            Err(EvalError::UnsupportedLanguage(_))
        ));
    }

    #[test]
    fn test_from_config_uses_configured_language() {
        let mut config = Config::default();
        assert!(matches!(
            Evaluator::from_config(&config),
            Err(EvalError::Config(_))
        ));
        config.evaluation.language = Some("c".into());
        config.evaluation.chunk_size = 7;
        let ev = Evaluator::from_config(&config).unwrap();
        assert_eq!(ev.language(), Language::C);
        assert_eq!(ev.chunk_size(), 7);
    }

    #[test]
    fn test_keyword_count() {
        assert_eq!(
            python().keyword_count(),
            languages::python::PYTHON_KEYWORDS.len()
        );
    }
}
