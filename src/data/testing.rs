//! Test fixtures: an in-memory `AppSource` and on-disk data directories.

use std::{collections::BTreeMap, fs, path::Path};

use anyhow::{anyhow, Result};

use crate::data::loader::{LABEL_FILE, TOKEN_FILE};
use crate::domain::app_record::{AppRecord, LabelRecord};
use crate::domain::traits::AppSource;
use crate::infra::hyperparams::{Hyperparameters, HYPERPARAMETERS_FILE};

pub struct MemorySource {
    records: BTreeMap<String, AppRecord>,
}

impl MemorySource {
    pub fn new(records: Vec<AppRecord>) -> Self {
        Self {
            records: records.into_iter().map(|r| (r.name.clone(), r)).collect(),
        }
    }

    /// `n_apps` well-formed applications of `seq_len` tokens with
    /// `seq_len - 2` group labels each.
    pub fn synthetic(n_apps: usize, seq_len: usize, vocab_size: usize, group_num: usize) -> Self {
        let records = (0..n_apps)
            .map(|i| {
                let name = format!("app{i:03}");
                let tokens = (0..seq_len).map(|j| ((i * 7 + j * 3) % vocab_size) as i64).collect();
                let mut labels = vec![(i % 2) as i64, ((i + 1) % 2) as i64];
                labels.extend((0..seq_len - 2).map(|j| ((i + j) % group_num) as i64));
                let labels = LabelRecord::from_values(&name, labels).expect("synthetic labels");
                AppRecord::new(name, tokens, labels)
            })
            .collect();
        Self::new(records)
    }
}

impl AppSource for MemorySource {
    fn list(&self) -> Result<Vec<String>> {
        Ok(self.records.keys().cloned().collect())
    }

    fn load(&self, name: &str) -> Result<AppRecord> {
        self.records
            .get(name)
            .cloned()
            .ok_or_else(|| anyhow!("no application named '{name}'"))
    }
}

/// Hyperparameters small enough for a CPU test run.
pub fn small_hyperparameters() -> Hyperparameters {
    Hyperparameters {
        vocab_size: 30,
        group_num: 3,
        n_blocks: 1,
        n_embd: 8,
        n_head: 2,
        dropout: 0.1,
        batch_size: 2,
        block_size: Some(6),
        seed: Some(11),
    }
}

/// Write `n_apps` application directories plus `params` under `dir`.
pub fn write_data_dir(dir: &Path, n_apps: usize, params: &Hyperparameters) {
    let seq_len = params.block_size.unwrap_or(6);
    let lines = |v: Vec<i64>| v.iter().map(i64::to_string).collect::<Vec<_>>().join("\n");

    for i in 0..n_apps {
        let app = dir.join(format!("app{i:03}"));
        fs::create_dir_all(&app).unwrap();

        let tokens = (0..seq_len).map(|j| ((i * 5 + j) % params.vocab_size) as i64).collect();
        let mut labels = vec![(i % 2) as i64, ((i + 1) % 2) as i64];
        labels.extend((0..seq_len - 1).map(|j| ((i + j) % params.group_num) as i64));

        fs::write(app.join(TOKEN_FILE), lines(tokens)).unwrap();
        fs::write(app.join(LABEL_FILE), lines(labels)).unwrap();
    }
    params.write_to(&dir.join(HYPERPARAMETERS_FILE)).unwrap();
}
