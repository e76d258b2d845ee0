//! Error types for malformed training data.

use std::path::PathBuf;

use thiserror::Error;

/// Every variant is fatal: batch assembly never retries or skips an app.
#[derive(Debug, Error)]
pub enum DataError {
    /// A token or label line is not an integer.
    #[error("{path}:{line}: expected an integer, found {content:?}")]
    NotAnInteger {
        path: PathBuf,
        /// 1-based line number
        line: usize,
        content: String,
    },

    /// The label file cannot even hold the two binary labels.
    #[error("label record for '{app}' has {found} line(s), at least 2 binary labels are required")]
    MissingBinaryLabels { app: String, found: usize },

    /// Only binary labels were present; the group head has nothing to fit.
    #[error("label record for '{app}' has no group labels after the 2 binary labels")]
    MissingGroupLabels { app: String },

    /// A token id outside `[0, vocab_size)`.
    #[error("token {token} at position {position} of '{app}' is outside [0, {vocab_size})")]
    TokenOutOfRange {
        app: String,
        position: usize,
        token: i64,
        vocab_size: usize,
    },

    /// A binary label other than 0 or 1.
    #[error("binary label {label} of '{app}' is not 0 or 1")]
    BinaryLabelOutOfRange { app: String, label: i64 },

    /// A group label outside `[0, group_num)`.
    #[error("group label {label} of '{app}' is outside [0, {group_num})")]
    GroupLabelOutOfRange {
        app: String,
        label: i64,
        group_num: usize,
    },

    /// Applications in one batch must share their sequence and label lengths.
    #[error("'{app}' has {found} {what}, the batch expects {expected}")]
    RaggedBatch {
        app: String,
        what: &'static str,
        expected: usize,
        found: usize,
    },

    /// The configured block size does not match a token file.
    #[error("'{app}' has {found} tokens, block size is {block_size}")]
    BlockSizeMismatch {
        app: String,
        block_size: usize,
        found: usize,
    },

    /// Group labels are aligned to positions, so there can't be more of them.
    #[error("'{app}' has {labels} group labels but only {tokens} token positions")]
    TooManyGroupLabels {
        app: String,
        labels: usize,
        tokens: usize,
    },

    /// The positional split left nothing to sample from.
    #[error("the {split} split is empty ({total} application(s) listed)")]
    EmptySplit { split: String, total: usize },

    #[error("no application directories found in '{dir}'")]
    EmptyListing { dir: String },

    /// A batch was requested from zero applications.
    #[error("cannot build a batch from zero applications")]
    EmptyBatch,
}
