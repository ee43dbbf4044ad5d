//! Utility functions for option parsing and file-backed task sources

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// Parse a human-friendly boolean value
///
/// Accepts `1/0`, `true/false`, `t/f`, `yes/no`, `y/n` and `on/off`, case-insensitively
/// and ignoring surrounding whitespace. Returns `None` for anything else.
///
/// # Examples
///
/// ```
/// use batchpool::utils::parse_bool;
///
/// assert_eq!(parse_bool("Yes"), Some(true));
/// assert_eq!(parse_bool("off"), Some(false));
/// assert_eq!(parse_bool("maybe"), None);
/// ```
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "t" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "f" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

/// Display name for the task at `index`: 1-based and zero-padded to five digits
pub fn task_name(index: usize) -> String {
    format!("{:05}", index + 1)
}

/// Resolve a task list path, appending `.txt` when the name lacks that suffix
pub(crate) fn txt_path(path: &Path) -> PathBuf {
    let has_txt = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("txt"));

    if has_txt {
        path.to_path_buf()
    } else {
        let mut name = path.as_os_str().to_os_string();
        name.push(".txt");
        PathBuf::from(name)
    }
}

/// Read a text file and return its non-empty lines, trimmed
///
/// A `.txt` suffix is appended to the path when missing.
pub async fn read_txt_lines(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = txt_path(path.as_ref());
    let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
        tracing::error!(path = %path.display(), error = %e, "Failed to read task file");
        Error::Io(e)
    })?;

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Split each line into fields on `separator`
pub(crate) fn split_lines(lines: Vec<String>, separator: &str) -> Result<Vec<Vec<String>>> {
    if separator.is_empty() {
        return Err(Error::InvalidSource(
            "line separator must not be empty".to_string(),
        ));
    }

    Ok(lines
        .into_iter()
        .map(|line| line.split(separator).map(str::to_string).collect())
        .collect())
}
