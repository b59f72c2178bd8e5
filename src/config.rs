#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::time::Duration;

/// Default wall-clock budget for one student program run, in seconds.
const DEFAULT_RUN_TIMEOUT_SECS: u64 = 10;

/// Default budget for compiling one submission, in seconds.
const DEFAULT_BUILD_TIMEOUT_SECS: u64 = 30;

/// Default budget for a single feedback-service round trip, in seconds.
const DEFAULT_FEEDBACK_TIMEOUT_SECS: u64 = 60;

/// Default number of submissions graded concurrently.
const DEFAULT_JOBS: usize = 4;

/// Default cap on captured stdout/stderr per stream, in bytes.
const DEFAULT_OUTPUT_CAP: usize = 1024 * 1024;

/// Default ceiling on a submission archive's total uncompressed size.
const DEFAULT_MAX_UNCOMPRESSED: u64 = 50 * 1024 * 1024;

/// Length budget for prompt payloads sent to the feedback service.
pub const PROMPT_TRUNCATE: usize = 60_000;

/// OpenAI-compatible credentials sourced from the environment.
#[derive(Debug, Clone)]
pub struct OpenAiEnv {
    /// Base URL for the OpenAI-compatible API endpoint.
    pub api_base: String,
    /// API key used to authenticate requests.
    pub api_key:  String,
    /// Model identifier for chat completions.
    pub model:    String,
}

impl OpenAiEnv {
    /// Construct an `OpenAiEnv` from environment variables; returns `None` if
    /// any required field is missing.
    pub fn from_env() -> Option<Self> {
        let api_base = std::env::var("OPENAI_ENDPOINT").ok()?.trim().to_owned();
        let api_key = std::env::var("OPENAI_API_KEY").ok()?.trim().to_owned();
        let model = std::env::var("OPENAI_MODEL").ok()?.trim().to_owned();

        if api_base.is_empty() || api_key.is_empty() || model.is_empty() {
            return None;
        }

        Some(Self {
            api_base,
            api_key,
            model,
        })
    }
}

/// Grading configuration shared by every pipeline instance in one run.
#[derive(Debug, Clone)]
pub struct GraderConfig {
    /// Wall-clock budget for one student program execution.
    pub run_timeout:        Duration,
    /// Budget for one submission's javac invocation.
    pub build_timeout:      Duration,
    /// Budget for a single feedback-service round trip. Independent of
    /// `run_timeout`; the two never share a deadline.
    pub feedback_timeout:   Duration,
    /// Bounded number of feedback retries after the first attempt.
    pub feedback_retries:   u32,
    /// Maximum number of submissions processed concurrently.
    pub jobs:               usize,
    /// Cap on captured bytes per output stream before truncation.
    pub output_cap:         usize,
    /// Ceiling on an archive's total uncompressed size.
    pub max_uncompressed:   u64,
    /// Compare output even when the program exited non-zero.
    pub compare_on_nonzero: bool,
    /// Keep per-submission scratch directories after grading.
    pub keep_scratch:       bool,
    /// Whether the quality-feedback stage is enabled at all.
    pub ai_enabled:         bool,
    /// Feedback service credentials, if configured.
    pub openai:             Option<OpenAiEnv>,
}

impl Default for GraderConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

impl GraderConfig {
    /// Builds a configuration from environment variables, using conservative
    /// defaults where unset. CLI flags override individual fields afterwards.
    pub fn from_env() -> Self {
        Self {
            run_timeout:        read_timeout_secs(
                "COHORT_RUN_TIMEOUT_SECS",
                DEFAULT_RUN_TIMEOUT_SECS,
            ),
            build_timeout:      read_timeout_secs(
                "COHORT_BUILD_TIMEOUT_SECS",
                DEFAULT_BUILD_TIMEOUT_SECS,
            ),
            feedback_timeout:   read_timeout_secs(
                "COHORT_FEEDBACK_TIMEOUT_SECS",
                DEFAULT_FEEDBACK_TIMEOUT_SECS,
            ),
            feedback_retries:   2,
            jobs:               std::env::var("COHORT_JOBS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|&n| n > 0)
                .unwrap_or(DEFAULT_JOBS),
            output_cap:         DEFAULT_OUTPUT_CAP,
            max_uncompressed:   DEFAULT_MAX_UNCOMPRESSED,
            compare_on_nonzero: false,
            keep_scratch:       false,
            ai_enabled:         true,
            openai:             OpenAiEnv::from_env(),
        }
    }
}

/// Parses an environment variable into a `Duration`, falling back to
/// `default_secs` when parsing fails or the variable is missing.
fn read_timeout_secs(env: &str, default_secs: u64) -> Duration {
    std::env::var(env)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(default_secs))
}
