// src/evaluator/line_metrics.rs — Pure metrics over aligned line pairs
//
// Everything here works on raw text and never fails. Normalizing sums into
// averages (and rejecting empty denominators) is the orchestrator's job.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

use super::types::{EvaluationItem, KeywordFrequencyMap, LineSide};

static WORD_RE: OnceLock<Regex> = OnceLock::new();

fn word_re() -> &'static Regex {
    WORD_RE.get_or_init(|| Regex::new(r"[\w']+").expect("word pattern is valid"))
}

/// Split a line into word-like tokens: maximal runs of word characters and
/// apostrophes.
pub fn split_words(text: &str) -> impl Iterator<Item = &str> {
    word_re().find_iter(text).map(|m| m.as_str())
}

/// Levenshtein distance in characters between two lines.
pub fn line_distance(original: &str, generated: &str) -> usize {
    strsim::levenshtein(original, generated)
}

/// Sum of edit distances over every aligned line pair in the dataset.
pub fn total_distance(dataset: &[EvaluationItem]) -> usize {
    dataset
        .iter()
        .flat_map(EvaluationItem::line_pairs)
        .map(|(o, g)| line_distance(o, g))
        .sum()
}

/// Sum of line lengths (in characters) for one side of the dataset.
pub fn total_line_length(dataset: &[EvaluationItem], side: LineSide) -> usize {
    dataset
        .iter()
        .flat_map(|item| side.lines(item))
        .map(|line| line.chars().count())
        .sum()
}

/// Count vocabulary words on one side of the dataset.
///
/// The returned map holds every vocabulary word, unseen ones at zero.
pub fn keyword_frequencies(
    dataset: &[EvaluationItem],
    side: LineSide,
    vocabulary: &BTreeSet<String>,
) -> KeywordFrequencyMap {
    let mut freq: KeywordFrequencyMap = vocabulary.iter().map(|k| (k.clone(), 0)).collect();
    for line in dataset.iter().flat_map(|item| side.lines(item)) {
        for word in split_words(line) {
            if let Some(count) = freq.get_mut(word) {
                *count += 1;
            }
        }
    }
    freq
}

/// First token of `line` accepted by `is_member`.
pub fn first_member<'a>(line: &'a str, is_member: impl Fn(&str) -> bool) -> Option<&'a str> {
    split_words(line).find(|w| is_member(*w))
}

/// Per-item tally of first-token guesses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GuessTally {
    pub correct: usize,
    pub unguessable: usize,
}

impl std::ops::AddAssign for GuessTally {
    fn add_assign(&mut self, rhs: Self) {
        self.correct += rhs.correct;
        self.unguessable += rhs.unguessable;
    }
}

/// Compare the first reference-list token of each original line with that
/// of its generated counterpart.
///
/// A line is a correct guess when both sides have a first member and they
/// are equal. It is unguessable when the original line has no member at all.
pub fn first_occurrence_guesses(
    item: &EvaluationItem,
    is_member: impl Fn(&str) -> bool,
) -> GuessTally {
    let mut tally = GuessTally::default();
    for (original, generated) in item.line_pairs() {
        match first_member(original, &is_member) {
            None => tally.unguessable += 1,
            Some(expected) => {
                if first_member(generated, &is_member) == Some(expected) {
                    tally.correct += 1;
                }
            }
        }
    }
    tally
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

    fn vocab(words: &[&str]) -> BTreeSet<String> {
        words.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_split_words_keeps_apostrophes_and_underscores() {
        let words: Vec<_> = split_words("print('it's', my_var+2)").collect();
        assert_eq!(words, vec!["print", "'it's'", "my_var", "2"]);
    }

    #[test]
    fn test_split_words_empty() {
        assert_eq!(split_words("  ;; ").count(), 0);
    }

    #[test]
    fn test_line_distance() {
        assert_eq!(line_distance("y = 2", "y = 3"), 1);
        assert_eq!(line_distance("same", "same"), 0);
        assert_eq!(line_distance("", "abc"), 3);
    }

    #[test]
    fn test_total_distance_identical_is_zero() {
        let data = vec![item(&["a = 1", "b"], &["a = 1", "b"])];
        assert_eq!(total_distance(&data), 0);
    }

    #[test]
    fn test_total_line_length_counts_chars() {
        let data = vec![item(&["héllo", "ab"], &["", "x"])];
        assert_eq!(total_line_length(&data, LineSide::Original), 7);
        assert_eq!(total_line_length(&data, LineSide::Generated), 1);
    }

    #[test]
    fn test_keyword_frequencies_zero_filled() {
        let data = vec![
            item(&["if x: return y", "return"], &["while True:", "pass"]),
            item(&["for i in range(3):"], &["return 1"]),
        ];
        let v = vocab(&["if", "return", "for", "in", "while", "pass"]);
        let orig = keyword_frequencies(&data, LineSide::Original, &v);
        assert_eq!(orig["return"], 2);
        assert_eq!(orig["if"], 1);
        assert_eq!(orig["for"], 1);
        assert_eq!(orig["in"], 1);
        assert_eq!(orig["while"], 0);
        assert_eq!(orig.len(), v.len());

        let gen = keyword_frequencies(&data, LineSide::Generated, &v);
        assert_eq!(gen["while"], 1);
        assert_eq!(gen["pass"], 1);
        assert_eq!(gen["return"], 1);
    }

    #[test]
    fn test_first_occurrence_guesses() {
        let v = vocab(&["if", "return", "while"]);
        let it = item(
            &["if x: return", "return y", "x = 1"],
            &["if y: pass", "while 1", "return"],
        );
        let tally = first_occurrence_guesses(&it, |w| v.contains(w));
        assert_eq!(
            tally,
            GuessTally {
                correct: 1,
                unguessable: 1
            }
        );
    }

    #[test]
    fn test_first_occurrence_missing_on_generated_side_is_wrong() {
        let v = vocab(&["return"]);
        let it = item(&["return x"], &["x"]);
        let tally = first_occurrence_guesses(&it, |w| v.contains(w));
        assert_eq!(tally.correct, 0);
        assert_eq!(tally.unguessable, 0);
    }
}
