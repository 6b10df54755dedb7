//! Uniform sampling of mixture weights on the unit simplex.
//!
//! `n - 1` distinct cut points are drawn from `1..resolution`, sorted, and framed by
//! `0` and `resolution`. The gaps between consecutive cuts, divided by the
//! resolution, are the weights. Every weight is a multiple of `1 / resolution` and
//! the weights sum to one.

use rand::Rng;
use rand::seq::index;

use crate::constants::simplex::WEIGHT_SUM_TOLERANCE;
use crate::errors::MixError;
use crate::types::{ByteCount, Weight};

/// Sample `n` non-negative weights summing to one at the given integer resolution.
///
/// Fails with [`MixError::Configuration`] when `n < 2` or when there are not enough
/// distinct integers in `1..resolution` to place `n - 1` cuts.
pub fn sample_unit_simplex<R: Rng + ?Sized>(
    n: usize,
    resolution: usize,
    rng: &mut R,
) -> Result<Vec<Weight>, MixError> {
    if n < 2 {
        return Err(MixError::Configuration(format!(
            "simplex sampling needs at least 2 categories (got {n})"
        )));
    }
    let available = resolution.saturating_sub(1);
    if n - 1 > available {
        return Err(MixError::Configuration(format!(
            "cannot draw {} distinct cut points at resolution {resolution}",
            n - 1
        )));
    }

    let mut cuts: Vec<usize> = index::sample(rng, available, n - 1)
        .into_iter()
        .map(|idx| idx + 1)
        .collect();
    cuts.sort_unstable();

    let scale = resolution as f64;
    let mut weights = Vec::with_capacity(n);
    let mut previous = 0;
    for cut in cuts.into_iter().chain(std::iter::once(resolution)) {
        weights.push((cut - previous) as f64 / scale);
        previous = cut;
    }
    Ok(weights)
}

/// Scale weights by the total budget into integer per-category byte targets.
pub fn byte_targets(weights: &[Weight], total_bytes: ByteCount) -> Vec<ByteCount> {
    weights
        .iter()
        .map(|weight| (weight * total_bytes as f64).floor() as ByteCount)
        .collect()
}

/// True when `weights` is a valid point on the simplex.
pub fn is_on_simplex(weights: &[Weight]) -> bool {
    !weights.is_empty()
        && weights.iter().all(|weight| *weight >= 0.0)
        && (weights.iter().sum::<f64>() - 1.0).abs() <= WEIGHT_SUM_TOLERANCE
}
