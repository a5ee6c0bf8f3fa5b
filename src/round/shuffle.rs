//! Unbiased in-place shuffling.

use rand::Rng;

/// Fisher–Yates shuffle: every permutation of `items` is equally likely.
///
/// Walks from the back, swapping each slot with a uniformly chosen slot at
/// or before it. The answer position of a round depends only on `rng`.
pub fn fisher_yates<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.gen_range(0..=i);
        items.swap(i, j);
    }
}
