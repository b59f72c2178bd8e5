#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::file::SourceFile;
use crate::util::find_files;

/// How deep under the submission root to look for `.java` files.
const SEARCH_DEPTH: i8 = 8;

/// Why a single entry point could not be designated for a submission.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EntryPointError {
    /// No class in the submission declares a `main` method.
    #[error("no class with a `public static void main(String[])` method was found")]
    NoneFound,
    /// More than one class declares a `main` method; the grader refuses to
    /// pick one silently.
    #[error("multiple candidate entry points found: {}", candidates.join(", "))]
    Ambiguous {
        /// Qualified names of every candidate, in discovery order.
        candidates: Vec<String>,
    },
}

/// The discovered set of Java sources for one submission.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceTree {
    /// Root directory the sources were discovered under.
    root:  PathBuf,
    /// Parsed source files, in stable discovery order.
    files: Vec<SourceFile>,
}

impl SourceTree {
    /// Discovers and parses every `.java` file under `root`.
    ///
    /// Files that cannot be read or parsed are skipped with a warning rather
    /// than failing the whole submission; the build stage will surface
    /// whatever javac thinks of them anyway.
    pub fn discover(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let mut files = Vec::new();

        for path in find_files("java", SEARCH_DEPTH, &root)? {
            match SourceFile::new(&path) {
                Ok(file) => files.push(file),
                Err(e) => {
                    tracing::warn!("skipping unparseable source {}: {e:#}", path.display());
                }
            }
        }

        Ok(Self { root, files })
    }

    /// Root directory of this source tree.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get a reference to the discovered files.
    pub fn files(&self) -> &[SourceFile] {
        self.files.as_ref()
    }

    /// Returns true when no Java sources were discovered at all.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Designates the single entry point for this submission.
    ///
    /// Exactly one class enclosing a `main` method must exist across the
    /// whole tree; zero or several candidates are distinct, reportable
    /// conditions and never resolved by guessing.
    pub fn entry_point(&self) -> Result<String, EntryPointError> {
        let candidates: Vec<String> = self
            .files
            .iter()
            .flat_map(|f| f.main_classes().iter().cloned())
            .collect();

        match candidates.as_slice() {
            [] => Err(EntryPointError::NoneFound),
            [single] => Ok(single.clone()),
            _ => Err(EntryPointError::Ambiguous { candidates }),
        }
    }

    /// Concatenates every source file with a `File:` header, the shape the
    /// feedback prompt expects. Paths are relative to the tree root.
    pub fn render_sources(&self) -> String {
        let mut out = String::new();
        for file in &self.files {
            let rel = file
                .path()
                .strip_prefix(&self.root)
                .unwrap_or_else(|_| file.path());
            out.push_str(&format!("File: {}\n", rel.display()));
            out.push_str(file.code());
            if !out.ends_with('\n') {
                out.push('\n');
            }
            out.push('\n');
        }
        out
    }
}
