// ============================================================
// Layer 3 — Application Record Domain Type
// ============================================================
// One analysed Android application as the model sees it:
//
//   tokens  API-call ids in call order, one per position
//   labels  [binary_0, binary_1, group_0, group_1, ...]
//
// The first two label entries are the binary indicator pair,
// everything after them is a group label. Group label i is
// scored against token position i.

use serde::{Deserialize, Serialize};

use crate::domain::error::DataError;

/// Number of leading label entries that belong to the binary head.
pub const BINARY_LABELS: usize = 2;

/// The label file of one application, split positionally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelRecord {
    pub binary: [i64; BINARY_LABELS],
    pub groups: Vec<i64>,
}

impl LabelRecord {
    /// Split a raw label list into its binary and group parts.
    ///
    /// Fewer than two entries is a malformed record, never padded.
    pub fn from_values(app: &str, values: Vec<i64>) -> Result<Self, DataError> {
        if values.len() < BINARY_LABELS {
            return Err(DataError::MissingBinaryLabels {
                app: app.to_string(),
                found: values.len(),
            });
        }
        if values.len() == BINARY_LABELS {
            return Err(DataError::MissingGroupLabels { app: app.to_string() });
        }

        let binary = [values[0], values[1]];
        let groups = values[BINARY_LABELS..].to_vec();
        Ok(Self { binary, groups })
    }
}

/// A fully loaded application ready for batching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppRecord {
    /// Directory name of the application, used in error messages
    pub name: String,
    pub tokens: Vec<i64>,
    pub labels: LabelRecord,
}

impl AppRecord {
    pub fn new(name: impl Into<String>, tokens: Vec<i64>, labels: LabelRecord) -> Self {
        Self {
            name: name.into(),
            tokens,
            labels,
        }
    }

    /// Sequence length T of this application.
    pub fn seq_len(&self) -> usize {
        self.tokens.len()
    }

    /// Check every id against the embedding table size and every label
    /// against its head width.
    pub fn validate(&self, vocab_size: usize, group_num: usize) -> Result<(), DataError> {
        if let Some((position, &token)) = self
            .tokens
            .iter()
            .enumerate()
            .find(|(_, t)| **t < 0 || **t as usize >= vocab_size)
        {
            return Err(DataError::TokenOutOfRange {
                app: self.name.clone(),
                position,
                token,
                vocab_size,
            });
        }

        if let Some(&label) = self.labels.binary.iter().find(|&&l| l != 0 && l != 1) {
            return Err(DataError::BinaryLabelOutOfRange {
                app: self.name.clone(),
                label,
            });
        }

        if let Some(&label) = self
            .labels
            .groups
            .iter()
            .find(|&&l| l < 0 || l as usize >= group_num)
        {
            return Err(DataError::GroupLabelOutOfRange {
                app: self.name.clone(),
                label,
                group_num,
            });
        }

        if self.labels.groups.len() > self.tokens.len() {
            return Err(DataError::TooManyGroupLabels {
                app: self.name.clone(),
                labels: self.labels.groups.len(),
                tokens: self.tokens.len(),
            });
        }

        Ok(())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_split() {
        let labels = LabelRecord::from_values("app", vec![1, 0, 3, 2, 2]).unwrap();
        assert_eq!(labels.binary, [1, 0]);
        assert_eq!(labels.groups, vec![3, 2, 2]);
    }

    #[test]
    fn test_short_label_file_is_fatal() {
        let err = LabelRecord::from_values("app", vec![1]).unwrap_err();
        assert!(matches!(err, DataError::MissingBinaryLabels { found: 1, .. }));

        let err = LabelRecord::from_values("app", vec![]).unwrap_err();
        assert!(matches!(err, DataError::MissingBinaryLabels { found: 0, .. }));
    }

    #[test]
    fn test_binary_only_label_file_is_fatal() {
        let err = LabelRecord::from_values("app", vec![0, 1]).unwrap_err();
        assert!(matches!(err, DataError::MissingGroupLabels { .. }));
    }

    #[test]
    fn test_validate_ranges() {
        let labels = LabelRecord::from_values("app", vec![1, 0, 3, 1]).unwrap();
        let ok = AppRecord::new("app", vec![0, 49, 7], labels.clone());
        assert!(ok.validate(50, 4).is_ok());

        let bad_token = AppRecord::new("app", vec![0, 50, 7], labels.clone());
        assert!(matches!(
            bad_token.validate(50, 4),
            Err(DataError::TokenOutOfRange { position: 1, token: 50, .. })
        ));

        let negative = AppRecord::new("app", vec![-1, 2, 7], labels.clone());
        assert!(matches!(
            negative.validate(50, 4),
            Err(DataError::TokenOutOfRange { token: -1, .. })
        ));

        assert!(matches!(
            ok.validate(50, 3),
            Err(DataError::GroupLabelOutOfRange { label: 3, .. })
        ));

        let bad_binary = AppRecord::new(
            "app",
            vec![0, 1, 2],
            LabelRecord { binary: [2, 0], groups: vec![0] },
        );
        assert!(matches!(
            bad_binary.validate(50, 4),
            Err(DataError::BinaryLabelOutOfRange { label: 2, .. })
        ));
    }

    #[test]
    fn test_more_group_labels_than_positions() {
        let labels = LabelRecord::from_values("app", vec![1, 0, 0, 0, 0]).unwrap();
        let record = AppRecord::new("app", vec![1, 2], labels);
        assert!(matches!(
            record.validate(50, 4),
            Err(DataError::TooManyGroupLabels { labels: 3, tokens: 2, .. })
        ));
    }
}
