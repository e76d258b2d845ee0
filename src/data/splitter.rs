// ============================================================
// Layer 4 — Train/Validation Splitter
// ============================================================
// Partitions the application listing into two subsets:
//   - Training set:   batches for gradient steps
//   - Validation set: batches for loss estimation only
//
// The partition is POSITIONAL: the first floor(0.8 * n) names
// of the listing train, the rest validate. No shuffling, so the
// same listing always produces the same two subsets, and the
// sampler can recompute the split on every call.
//
// Split ratio: 80% training, 20% validation (configurable)

use std::fmt;

/// Default share of the listing used for training.
pub const TRAIN_FRACTION: f64 = 0.8;

/// Which half of the listing a batch is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split {
    Train,
    Val,
}

impl Split {
    pub const ALL: [Split; 2] = [Split::Train, Split::Val];
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Split::Train => f.write_str("train"),
            Split::Val => f.write_str("val"),
        }
    }
}

/// Index of the first validation item: floor(len * train_fraction),
/// clamped to `len`.
pub fn split_index(len: usize, train_fraction: f64) -> usize {
    ((len as f64) * train_fraction).floor().max(0.0).min(len as f64) as usize
}

/// Borrow the subset of `items` that belongs to `split`.
pub fn subset<T>(items: &[T], split: Split, train_fraction: f64) -> &[T] {
    let at = split_index(items.len(), train_fraction);
    match split {
        Split::Train => &items[..at],
        Split::Val => &items[at..],
    }
}

/// Split owned `samples` into (train, validation) at the positional boundary.
pub fn split_train_val<T>(mut samples: Vec<T>, train_fraction: f64) -> (Vec<T>, Vec<T>) {
    let at = split_index(samples.len(), train_fraction);
    // split_off(n) leaves [0..n) in `samples` and returns [n..len)
    let val = samples.split_off(at);

    tracing::debug!(
        "Dataset split: {} training, {} validation",
        samples.len(),
        val.len(),
    );

    (samples, val)
}
