#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use glob::glob;
use which::which;

/// Finds and returns the path to javac binary
pub fn javac_path() -> Result<OsString> {
    which("javac")
        .map(PathBuf::into_os_string)
        .context("Cannot find a Java Compiler on path (javac)")
}

/// Finds and returns the path to java binary
pub fn java_path() -> Result<OsString> {
    which("java")
        .map(PathBuf::into_os_string)
        .context("Cannot find a Java runtime on path (java)")
}

/// A glob utility function to find paths to files with certain extension
///
/// Results are sorted so discovery order is stable across runs.
///
/// * `extension`: the file extension to find paths for
/// * `search_depth`: how many folders deep to search for
/// * `root_dir`: the root directory where search starts
pub fn find_files(extension: &str, search_depth: i8, root_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut pattern = root_dir.to_path_buf();

    for _ in 0..search_depth {
        pattern.push("**");
    }

    pattern.push(format!("*.{extension}"));
    let pattern = pattern
        .to_str()
        .context("Could not convert root_dir to string")?
        .to_string();

    let mut found: Vec<PathBuf> = glob(&pattern)
        .context("Could not create glob")?
        .filter_map(Result::ok)
        .collect();
    found.sort();
    found.dedup();

    Ok(found)
}

/// Truncates `content` to the provided `limit`, appending a notice to indicate
/// omitted output.
pub fn truncate_with_notice(content: &str, limit: usize) -> String {
    if content.len() <= limit {
        return content.to_string();
    }

    let mut end = limit;
    while end > 0 && !content.is_char_boundary(end) {
        end -= 1;
    }

    let omitted = content.len() - end;
    let mut truncated = content[..end].to_string();
    truncated.push_str(&format!("\n...[truncated {omitted} bytes]"));
    truncated
}

#[cfg(test)]
mod tests {
    use super::truncate_with_notice;

    #[test]
    fn truncate_is_noop_under_limit() {
        assert_eq!(truncate_with_notice("short", 100), "short");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let s = "héllo wörld";
        let out = truncate_with_notice(s, 3);
        assert!(out.starts_with("h"));
        assert!(out.contains("[truncated"));
    }
}
