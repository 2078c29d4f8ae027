// src/evaluator/utils.rs — Helper functions for evaluation

use crate::infra::errors::EvalError;

/// Split `items` into contiguous slices of at most `size` elements.
///
/// Yields `ceil(len / size)` chunks; only the last may be shorter. A `size`
/// of zero is treated as one.
pub fn chunks<T>(items: &[T], size: usize) -> std::slice::Chunks<'_, T> {
    items.chunks(size.max(1))
}

/// `numerator / denominator`, or `DegenerateDenominator` when the
/// denominator is zero.
pub fn checked_ratio(
    numerator: f64,
    denominator: usize,
    metric: &'static str,
) -> Result<f64, EvalError> {
    if denominator == 0 {
        return Err(EvalError::DegenerateDenominator { metric });
    }
    Ok(numerator / denominator as f64)
}

/// Mean of `values`, or `DegenerateDenominator` when empty.
pub fn checked_mean(values: &[usize], metric: &'static str) -> Result<f64, EvalError> {
    let sum: usize = values.iter().sum();
    checked_ratio(sum as f64, values.len(), metric)
}
