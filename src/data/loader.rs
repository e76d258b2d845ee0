// ============================================================
// Layer 4 — Application Directory Loader
// ============================================================
// Loads tokenised applications from the data directory.
//
// Layout (produced by the upstream extraction + tokenizer):
//
//   data/
//     hyperparameters.json
//     com.example.one.apk/
//       api.txt             ← one token id per line
//       classification.txt  ← 2 binary labels, then group labels
//     com.example.two.apk/
//       ...
//
// Only sub-directories count as applications. Names are sorted
// so the listing (and therefore the positional split) is the
// same on every run over an unchanged directory.

use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::domain::app_record::{AppRecord, LabelRecord};
use crate::domain::error::DataError;
use crate::domain::traits::AppSource;

/// Token file name inside each application directory
pub const TOKEN_FILE: &str = "api.txt";

/// Label file name inside each application directory
pub const LABEL_FILE: &str = "classification.txt";

/// Reads applications from `<dir>/<app>/{api,classification}.txt`.
pub struct DirSource {
    dir: PathBuf,
}

impl DirSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl AppSource for DirSource {
    fn list(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();

        for entry in fs::read_dir(&self.dir)
            .with_context(|| format!("Cannot read data directory '{}'", self.dir.display()))?
        {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            } else {
                tracing::warn!("Skipping non UTF-8 entry {:?}", entry.file_name());
            }
        }

        names.sort();
        tracing::debug!("Listed {} applications in '{}'", names.len(), self.dir.display());
        Ok(names)
    }

    fn load(&self, name: &str) -> Result<AppRecord> {
        let app_dir = self.dir.join(name);

        let tokens = read_int_lines(&app_dir.join(TOKEN_FILE))?;
        let labels = read_int_lines(&app_dir.join(LABEL_FILE))?;
        let labels = LabelRecord::from_values(name, labels)?;

        Ok(AppRecord::new(name, tokens, labels))
    }
}

/// Parse a file holding one integer per line.
///
/// Any line that is not an integer fails the whole file.
pub fn read_int_lines(path: &Path) -> Result<Vec<i64>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Cannot read '{}'", path.display()))?;

    content
        .lines()
        .enumerate()
        .map(|(i, line)| {
            line.trim().parse::<i64>().map_err(|_| {
                anyhow::Error::from(DataError::NotAnInteger {
                    path: path.to_path_buf(),
                    line: i + 1,
                    content: line.to_string(),
                })
            })
        })
        .collect()
}
