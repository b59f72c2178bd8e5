//! Discovery, analysis, and compilation of one submission's Java sources.

/// Build stage: javac over every discovered source
pub mod compile;
/// A single parsed Java source file
pub mod file;
/// Tree-sitter wrapper for Java sources
pub mod parser;
/// The source tree of one submission and its entry-point locator
pub mod project;
/// Tree-sitter query strings
pub mod queries;

pub use compile::{BuildOutcome, compile};
pub use file::{FileType, SourceFile};
pub use project::{EntryPointError, SourceTree};
