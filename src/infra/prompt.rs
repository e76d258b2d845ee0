use anyhow::Result;
use std::io::{BufRead, Write};

pub const CHECKPOINT_PROMPT: &str = "Checkpoint to load (default: None): ";

/// Ask which checkpoint to resume from.
///
/// Returns the trimmed answer, or `None` for an empty line or end of input.
pub fn prompt_checkpoint<R: BufRead, W: Write>(mut reader: R, mut writer: W) -> Result<Option<String>> {
    write!(writer, "{CHECKPOINT_PROMPT}")?;
    writer.flush()?;

    let mut line = String::new();
    reader.read_line(&mut line)?;

    let answer = line.trim();
    if answer.is_empty() || answer.eq_ignore_ascii_case("none") {
        Ok(None)
    } else {
        Ok(Some(answer.to_string()))
    }
}
