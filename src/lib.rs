//! # cohort
//!
//! A batch autograder for folders of student Java submissions. Each submission
//! is extracted, compiled, executed in a time-bounded sandbox, diffed against
//! an expected-output reference, and (independently) sent to an LLM for a code
//! quality review. One report entry is produced per submission, in discovery
//! order, no matter where an individual submission's pipeline stopped.

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// Output comparison between captured stdout and the expected reference
pub mod compare;
/// Runtime configuration assembled from environment variables and CLI flags
pub mod config;
/// Archive extraction into per-submission scratch directories
pub mod extract;
/// LLM-backed code quality review client
pub mod feedback;
/// Discovering, analyzing, and compiling the Java sources of one submission
pub mod java;
/// Submission discovery and the bounded worker pool driving pipelines
pub mod orchestrator;
/// Per-submission grading state machine
pub mod pipeline;
/// Low-level child process spawning and bounded output capture
pub mod process;
/// The report data model and its rendering
pub mod report;
/// Running a compiled entry point as an isolated, time-bounded child process
pub mod sandbox;
/// Utility functions for convenience
pub mod util;

/// Defined for convenience
type Dict = std::collections::HashMap<String, String>;
