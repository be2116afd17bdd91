//! Structure analyzer collaborator: the only stage with network I/O.
//!
//! The pipeline talks to a [`StructureAnalyzer`], never to a provider
//! directly, so tests and offline runs inject their own implementation.
//! [`LlmAnalyzer`] is the production one; all prompt wording lives in
//! [`crate::prompts`].
//!
//! ## Retry Strategy
//!
//! Each call is bounded by `api_timeout_secs` and retried with exponential
//! backoff (`retry_backoff_ms * 2^(attempt-1)`): with 500 ms base and 3
//! retries the waits are 500 ms, 1 s, 2 s. Failures are returned as
//! [`AnalyzerError`] and never abort a conversion.

use crate::config::DeckConfig;
use crate::error::AnalyzerError;
use crate::images::ImageDescriptor;
use crate::prompts::{
    clean_text_request, image_relation_request, image_summary, structure_request,
    CLEAN_TEXT_SYSTEM_PROMPT, IMAGE_RELATION_SYSTEM_PROMPT, STRUCTURE_SYSTEM_PROMPT,
};
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, warn};

/// Raw reply from an analyzer call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AnalyzerReply {
    pub content: String,
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub duration_ms: u64,
}

impl AnalyzerReply {
    /// A reply that cost nothing, e.g. from a scripted or offline analyzer.
    pub fn from_text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }
}

/// Produces candidate structures from document text.
pub trait StructureAnalyzer: Send + Sync {
    /// Candidate outline for `text`, expected to be JSON-ish text.
    fn analyze_structure<'a>(
        &'a self,
        text: &'a str,
    ) -> BoxFuture<'a, Result<AnalyzerReply, AnalyzerError>>;

    /// Which images belong to which sections, as JSON-ish text.
    fn relate_images<'a>(
        &'a self,
        text: &'a str,
        images: &'a [ImageDescriptor],
    ) -> BoxFuture<'a, Result<AnalyzerReply, AnalyzerError>>;

    /// Cleaned version of `text`. The default returns it unchanged.
    fn clean_text<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<AnalyzerReply, AnalyzerError>> {
        Box::pin(async move { Ok(AnalyzerReply::from_text(text)) })
    }
}

/// Analyzer that never answers, forcing the heuristic outline.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineAnalyzer;

impl StructureAnalyzer for OfflineAnalyzer {
    fn analyze_structure<'a>(
        &'a self,
        _text: &'a str,
    ) -> BoxFuture<'a, Result<AnalyzerReply, AnalyzerError>> {
        Box::pin(async { Err(AnalyzerError::Unavailable) })
    }

    fn relate_images<'a>(
        &'a self,
        _text: &'a str,
        _images: &'a [ImageDescriptor],
    ) -> BoxFuture<'a, Result<AnalyzerReply, AnalyzerError>> {
        Box::pin(async { Err(AnalyzerError::Unavailable) })
    }
}

/// Analyzer that replays fixed replies, such as a candidate saved by an
/// earlier run. A missing reply is reported as unavailable.
#[derive(Debug, Clone, Default)]
pub struct CannedAnalyzer {
    pub structure: Option<String>,
    pub image_analysis: Option<String>,
}

impl CannedAnalyzer {
    pub fn new(structure: impl Into<String>) -> Self {
        Self {
            structure: Some(structure.into()),
            image_analysis: None,
        }
    }

    pub fn with_image_analysis(mut self, reply: impl Into<String>) -> Self {
        self.image_analysis = Some(reply.into());
        self
    }
}

fn replay(reply: &Option<String>) -> Result<AnalyzerReply, AnalyzerError> {
    reply
        .as_deref()
        .map(AnalyzerReply::from_text)
        .ok_or(AnalyzerError::Unavailable)
}

impl StructureAnalyzer for CannedAnalyzer {
    fn analyze_structure<'a>(
        &'a self,
        _text: &'a str,
    ) -> BoxFuture<'a, Result<AnalyzerReply, AnalyzerError>> {
        Box::pin(async move { replay(&self.structure) })
    }

    fn relate_images<'a>(
        &'a self,
        _text: &'a str,
        _images: &'a [ImageDescriptor],
    ) -> BoxFuture<'a, Result<AnalyzerReply, AnalyzerError>> {
        Box::pin(async move { replay(&self.image_analysis) })
    }
}

/// Analyzer backed by an `edgequake-llm` provider.
pub struct LlmAnalyzer {
    provider: Arc<dyn LLMProvider>,
    config: DeckConfig,
}

impl LlmAnalyzer {
    pub fn new(provider: Arc<dyn LLMProvider>, config: &DeckConfig) -> Self {
        Self {
            provider,
            config: config.clone(),
        }
    }

    /// One system + one user message, with timeout and retries.
    async fn complete(
        &self,
        task: &str,
        system: &str,
        user: String,
    ) -> Result<AnalyzerReply, AnalyzerError> {
        let start = Instant::now();
        let messages = vec![ChatMessage::system(system), ChatMessage::user(user)];
        let options = build_options(&self.config);
        let limit = Duration::from_secs(self.config.api_timeout_secs);
        let mut last_err = AnalyzerError::EmptyReply;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let backoff = backoff_ms(self.config.retry_backoff_ms, attempt);
                warn!(
                    "{}: retry {}/{} after {}ms",
                    task, attempt, self.config.max_retries, backoff
                );
                sleep(Duration::from_millis(backoff)).await;
            }

            match timeout(limit, self.provider.chat(&messages, Some(&options))).await {
                Ok(Ok(response)) if response.content.trim().is_empty() => {
                    warn!("{}: attempt {} returned an empty reply", task, attempt + 1);
                    last_err = AnalyzerError::EmptyReply;
                }
                Ok(Ok(response)) => {
                    let duration = start.elapsed();
                    debug!(
                        "{}: {} input tokens, {} output tokens, {:?}",
                        task, response.prompt_tokens, response.completion_tokens, duration
                    );
                    return Ok(AnalyzerReply {
                        content: response.content,
                        input_tokens: response.prompt_tokens,
                        output_tokens: response.completion_tokens,
                        duration_ms: duration.as_millis() as u64,
                    });
                }
                Ok(Err(e)) => {
                    warn!("{}: attempt {} failed: {}", task, attempt + 1, e);
                    last_err = AnalyzerError::Llm {
                        retries: self.config.max_retries,
                        detail: e.to_string(),
                    };
                }
                Err(_) => {
                    warn!(
                        "{}: attempt {} timed out after {}s",
                        task,
                        attempt + 1,
                        self.config.api_timeout_secs
                    );
                    last_err = AnalyzerError::Timeout {
                        secs: self.config.api_timeout_secs,
                    };
                }
            }
        }

        Err(last_err)
    }
}

impl StructureAnalyzer for LlmAnalyzer {
    fn analyze_structure<'a>(
        &'a self,
        text: &'a str,
    ) -> BoxFuture<'a, Result<AnalyzerReply, AnalyzerError>> {
        Box::pin(async move {
            let excerpt = truncate_chars(text, self.config.analysis_char_limit);
            self.complete("structure", STRUCTURE_SYSTEM_PROMPT, structure_request(excerpt))
                .await
        })
    }

    fn relate_images<'a>(
        &'a self,
        text: &'a str,
        images: &'a [ImageDescriptor],
    ) -> BoxFuture<'a, Result<AnalyzerReply, AnalyzerError>> {
        Box::pin(async move {
            let excerpt = truncate_chars(text, self.config.image_context_char_limit);
            let summary = image_summary(images, self.config.max_prompt_images);
            self.complete(
                "images",
                IMAGE_RELATION_SYSTEM_PROMPT,
                image_relation_request(excerpt, &summary),
            )
            .await
        })
    }

    fn clean_text<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<AnalyzerReply, AnalyzerError>> {
        Box::pin(async move {
            self.complete("clean", CLEAN_TEXT_SYSTEM_PROMPT, clean_text_request(text))
                .await
        })
    }
}

fn build_options(config: &DeckConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}

/// Exponential backoff before retry `attempt` (1-based), saturating at
/// `u64::MAX`.
fn backoff_ms(base_ms: u64, attempt: u32) -> u64 {
    let factor = 2u64.checked_pow(attempt.saturating_sub(1)).unwrap_or(u64::MAX);
    base_ms.saturating_mul(factor)
}

/// At most `limit` characters of `text`, cut on a char boundary.
pub(crate) fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_options_defaults() {
        let opts = build_options(&DeckConfig::default());
        assert_eq!(opts.temperature, Some(0.2));
        assert_eq!(opts.max_tokens, Some(4096));
    }

    #[test]
    fn backoff_doubles_and_saturates() {
        assert_eq!(backoff_ms(1000, 1), 1000);
        assert_eq!(backoff_ms(1000, 3), 4000);
        assert_eq!(backoff_ms(1000, 64), u64::MAX);
        assert_eq!(backoff_ms(1000, 200), u64::MAX);
        assert_eq!(backoff_ms(0, 200), 0);
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("abc", 0), "");
    }

    #[tokio::test]
    async fn offline_analyzer_is_unavailable() {
        let a = OfflineAnalyzer;
        assert!(matches!(
            a.analyze_structure("text").await,
            Err(AnalyzerError::Unavailable)
        ));
        assert!(matches!(
            a.relate_images("text", &[]).await,
            Err(AnalyzerError::Unavailable)
        ));
    }

    #[tokio::test]
    async fn canned_analyzer_replays() {
        let a = CannedAnalyzer::new("{\"title\": \"x\"}");
        assert_eq!(a.analyze_structure("t").await.unwrap().content, "{\"title\": \"x\"}");
        assert!(matches!(
            a.relate_images("t", &[]).await,
            Err(AnalyzerError::Unavailable)
        ));
        let a = a.with_image_analysis("{}");
        assert_eq!(a.relate_images("t", &[]).await.unwrap().content, "{}");
    }

    #[tokio::test]
    async fn default_clean_text_echoes() {
        let reply = OfflineAnalyzer.clean_text("raw  text").await.unwrap();
        assert_eq!(reply.content, "raw  text");
        assert_eq!(reply.input_tokens, 0);
    }
}
