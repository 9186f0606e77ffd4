//! utils — small cross-module numeric helpers.
//!
//! Purpose
//! -------
//! Collect the handful of helpers shared by the priors, ensemble, and engine
//! layers: deterministic seed derivation for per-simulation RNG streams,
//! a numerically safe softmax, and a shuffled train/validation index split.
//!
//! Conventions
//! -----------
//! - Seed derivation uses a splitmix64 step so that a single engine-level
//!   seed expands into an arbitrary number of independent simulation seeds.
//! - `softmax` subtracts the maximum before exponentiating; inputs that are
//!   all `-inf` produce a uniform output rather than NaNs.
//! - The validation fraction passed to [`split_indices`] is clamped so that
//!   at least one training index always survives.

use ndarray::Array1;
use rand::{seq::SliceRandom, Rng};

/// Advance a splitmix64 state and return the next derived seed.
///
/// The caller owns the state word; each call mutates it in place and returns
/// a well-mixed 64-bit value suitable for seeding a downstream RNG. Identical
/// starting states yield identical seed sequences.
pub fn next_seed(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Numerically stable softmax over a slice.
///
/// Subtracts the maximum entry before exponentiating, so large-magnitude
/// inputs do not overflow. If every entry is `-inf` (no usable weight
/// information), the result is uniform.
pub fn softmax(values: &[f64]) -> Array1<f64> {
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        let n = values.len().max(1);
        return Array1::from_elem(values.len(), 1.0 / n as f64);
    }
    let exps: Array1<f64> = values.iter().map(|v| (v - max).exp()).collect();
    let total: f64 = exps.sum();
    exps / total
}

/// Shuffled train/validation split of `0..n`.
///
/// Returns `(train, validation)` index vectors. The validation set holds
/// `floor(n * f_val)` indices, but never all of them: at least one index is
/// always reserved for training. With `n == 0` both vectors are empty.
pub fn split_indices<R: Rng + ?Sized>(n: usize, f_val: f64, rng: &mut R) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(rng);
    let mut n_val = (n as f64 * f_val).floor() as usize;
    if n_val >= n && n > 0 {
        n_val = n - 1;
    }
    let train = indices.split_off(n_val);
    (train, indices)
}
