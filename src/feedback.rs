#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! LLM-backed code quality review.
//!
//! The feedback service is a pure request/response collaborator: its verdict
//! never influences the correctness pipeline, and any failure here degrades
//! to `Unavailable` instead of aborting a submission.

use std::time::Duration;

use async_openai::{
    Client as OpenAIClient,
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs, ResponseFormat,
    },
};
use bon::Builder;
use serde::{Deserialize, Serialize};
use tokio::time::{sleep, timeout};

use crate::{
    config::{GraderConfig, PROMPT_TRUNCATE},
    util::truncate_with_notice,
};

/// System prompt sent with every review request.
const SYSTEM_PROMPT: &str = include_str!("prompts/review_system.md");

/// Delay before the first retry; doubles on each subsequent attempt.
const BACKOFF_BASE: Duration = Duration::from_secs(1);

/// A parsed quality assessment from the feedback service.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct QualityReview {
    /// Numeric rating, when the service produced a parseable one.
    pub score:    Option<f64>,
    /// Free-text observations about the submission.
    pub comments: Vec<String>,
}

/// Outcome of the feedback stage for one submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FeedbackOutcome {
    /// The service returned an assessment.
    Scored(QualityReview),
    /// The service could not be reached (or was disabled); grading continues
    /// without quality feedback.
    Unavailable {
        /// Why no review is attached.
        reason: String,
    },
}

/// Everything the review prompt is assembled from.
#[derive(Debug, Clone, Builder)]
#[builder(on(String, into))]
pub struct ReviewRequest {
    /// Free-text project description the quality rating is judged against.
    pub description:     String,
    /// Expected program output, for context.
    pub expected_output: String,
    /// Concatenated student sources, `File:`-headed per file.
    pub sources:         String,
    /// What the student's program actually printed, if it ran.
    pub actual_output:   Option<String>,
    /// Compiler diagnostics, when the submission did not build. A build
    /// failure is itself gradable material.
    pub diagnostics:     Option<String>,
}

impl ReviewRequest {
    /// Renders the user message for the chat completion, truncating the
    /// bulky sections to the prompt budget.
    fn render(&self) -> String {
        let mut body = String::new();

        body.push_str("Project Description:\n<START>\n");
        body.push_str(&self.description);
        body.push_str("\n<END>\n\nExpected Output:\n<START>\n");
        body.push_str(&truncate_with_notice(&self.expected_output, 20_000));
        body.push_str("\n<END>\n");

        if let Some(actual) = &self.actual_output {
            body.push_str("\nActual Program Output:\n<START>\n");
            body.push_str(&truncate_with_notice(actual, 20_000));
            body.push_str("\n<END>\n");
        }

        if let Some(diags) = &self.diagnostics {
            body.push_str("\nCompiler Diagnostics:\n<START>\n");
            body.push_str(&truncate_with_notice(diags, 20_000));
            body.push_str("\n<END>\n");
        }

        body.push_str("\nStudent Files:\n<START>\n");
        body.push_str(&truncate_with_notice(&self.sources, PROMPT_TRUNCATE));
        body.push_str("\n<END>\n");

        body
    }
}

/// Leniently parses the service's reply into a `QualityReview`.
///
/// The model is asked for `{score, comments}` JSON, but anything else
/// degrades to unscored commentary rather than `Unavailable` — a reply we
/// received is still feedback.
fn parse_review(text: &str) -> QualityReview {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(text) else {
        return QualityReview {
            score:    None,
            comments: vec![text.to_string()],
        };
    };

    let score = match value.get("score") {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.parse().ok(),
        _ => None,
    };

    let comments = match value.get("comments") {
        Some(serde_json::Value::Array(items)) => items
            .iter()
            .map(|c| match c {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect(),
        Some(serde_json::Value::String(s)) => vec![s.clone()],
        _ => vec![value.to_string()],
    };

    QualityReview { score, comments }
}

/// One round trip to the feedback service.
async fn attempt_review(
    openai: &crate::config::OpenAiEnv,
    messages: Vec<ChatCompletionRequestMessage>,
) -> anyhow::Result<String> {
    let client = OpenAIClient::with_config(
        OpenAIConfig::new()
            .with_api_base(&openai.api_base)
            .with_api_key(&openai.api_key),
    );

    let request = CreateChatCompletionRequestArgs::default()
        .model(&openai.model)
        .messages(messages)
        .temperature(0.0)
        .response_format(ResponseFormat::JsonObject)
        .build()?;

    let response = client.chat().create(request).await?;

    response
        .choices
        .first()
        .and_then(|c| c.message.content.clone())
        .ok_or_else(|| anyhow::anyhow!("feedback service returned no content"))
}

/// Requests a quality review, retrying a bounded number of times with
/// doubling backoff. Each attempt runs under its own timeout, distinct from
/// the execution sandbox's deadline. Never returns an error.
pub async fn request_review(cfg: &GraderConfig, request: &ReviewRequest) -> FeedbackOutcome {
    if !cfg.ai_enabled {
        return FeedbackOutcome::Unavailable {
            reason: "quality feedback disabled".to_string(),
        };
    }

    let Some(openai) = cfg.openai.as_ref() else {
        return FeedbackOutcome::Unavailable {
            reason: "OPENAI_ENDPOINT / OPENAI_API_KEY / OPENAI_MODEL not configured".to_string(),
        };
    };

    let messages: Vec<ChatCompletionRequestMessage> = match build_messages(request) {
        Ok(m) => m,
        Err(e) => {
            return FeedbackOutcome::Unavailable {
                reason: format!("could not build review prompt: {e:#}"),
            };
        }
    };

    let mut last_error = String::new();
    let attempts = cfg.feedback_retries + 1;

    for attempt in 0..attempts {
        if attempt > 0 {
            sleep(BACKOFF_BASE * 2u32.pow(attempt - 1)).await;
        }

        match timeout(cfg.feedback_timeout, attempt_review(openai, messages.clone())).await {
            Ok(Ok(text)) => return FeedbackOutcome::Scored(parse_review(&text)),
            Ok(Err(e)) => {
                last_error = format!("{e:#}");
                tracing::warn!("feedback attempt {} failed: {last_error}", attempt + 1);
            }
            Err(_) => {
                last_error = format!("timed out after {:?}", cfg.feedback_timeout);
                tracing::warn!("feedback attempt {} {last_error}", attempt + 1);
            }
        }
    }

    FeedbackOutcome::Unavailable { reason: last_error }
}

/// Assembles the system and user messages for one review request.
fn build_messages(request: &ReviewRequest) -> anyhow::Result<Vec<ChatCompletionRequestMessage>> {
    Ok(vec![
        ChatCompletionRequestSystemMessageArgs::default()
            .content(SYSTEM_PROMPT.to_string())
            .build()?
            .into(),
        ChatCompletionRequestUserMessageArgs::default()
            .content(request.render())
            .build()?
            .into(),
    ])
}

#[cfg(test)]
mod tests {
    use super::parse_review;

    #[test]
    fn parses_well_formed_review() {
        let review = parse_review(r#"{"score": 7.5, "comments": ["solid naming", "long main"]}"#);
        assert_eq!(review.score, Some(7.5));
        assert_eq!(review.comments.len(), 2);
    }

    #[test]
    fn parses_string_score() {
        let review = parse_review(r#"{"score": "6", "comments": "fine"}"#);
        assert_eq!(review.score, Some(6.0));
        assert_eq!(review.comments, vec!["fine".to_string()]);
    }

    #[test]
    fn degrades_to_raw_commentary_on_non_json() {
        let review = parse_review("the model rambled instead");
        assert_eq!(review.score, None);
        assert_eq!(review.comments, vec!["the model rambled instead".to_string()]);
    }
}
