use crate::error::{Result, TranslateError};
use crate::openai::ChatService;
use crate::prompt::build_messages;
use crate::retry::{with_retry_if, RetryConfig};
use crate::usage::TokenUsage;
use tracing::debug;

/// Translations for one batch, positionally aligned with the request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchTranslation {
    pub translations: Vec<String>,
    pub usage: TokenUsage,
}

/// Translates batches of strings through a chat model.
///
/// Each batch is one chat request. The model must answer with a JSON array of
/// exactly as many strings as were sent; anything else counts as a failed
/// attempt and is retried under the configured policy.
pub struct TranslationClient<S> {
    service: S,
    retry: RetryConfig,
    debug: bool,
}

impl<S: ChatService> TranslationClient<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            retry: RetryConfig::batch_request(),
            debug: false,
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Trace prompts, raw responses, parsed arrays and token usage
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    /// Translate `texts` from `source_language` to `target_language`.
    ///
    /// Returns one translation per input string, in input order, together
    /// with the token usage of the successful call.
    pub async fn translate_batch(
        &self,
        texts: &[String],
        source_language: &str,
        target_language: &str,
    ) -> Result<BatchTranslation> {
        let messages = build_messages(texts, source_language, target_language)?;
        let messages = &messages;
        let operation_name = format!("Translating {} strings to {}", texts.len(), target_language);

        with_retry_if(
            &self.retry,
            &operation_name,
            move |attempt| async move {
                if self.debug {
                    for message in messages {
                        debug!(
                            "Prompt ({}, attempt {}):\n{}",
                            message.role, attempt, message.content
                        );
                    }
                }

                let completion = self.service.complete_chat(messages).await?;

                if self.debug {
                    debug!("Raw response (attempt {}):\n{}", attempt, completion.content);
                    debug!("Token usage (attempt {}): {}", attempt, completion.usage);
                }

                let translations = parse_translations(&completion.content, texts.len())?;

                if self.debug {
                    debug!("Parsed translations: {:?}", translations);
                }

                Ok(BatchTranslation {
                    translations,
                    usage: completion.usage,
                })
            },
            TranslateError::is_retryable,
        )
        .await
    }
}

/// Remove a surrounding Markdown code fence, if any
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.trim_end();
    let rest = rest.strip_suffix("```").unwrap_or(rest);

    // Skip the info string ("json"): the body starts on the next line, or at
    // the array itself when the fence is written on a single line
    let body = match rest.find(['\n', '[']) {
        Some(start) if rest[start..].starts_with('[') => &rest[start..],
        Some(start) => &rest[start + 1..],
        None => "",
    };
    body.trim()
}

/// Parse a completion into exactly `expected` strings.
///
/// Never pads or truncates: a count mismatch is a malformed response.
pub fn parse_translations(content: &str, expected: usize) -> Result<Vec<String>> {
    let json = strip_code_fence(content);
    let translations: Vec<String> = serde_json::from_str(json).map_err(|e| {
        TranslateError::MalformedResponse(format!("Expected a JSON array of strings: {}", e))
    })?;

    if translations.len() != expected {
        return Err(TranslateError::MalformedResponse(format!(
            "Expected {} translations, got {}",
            expected,
            translations.len()
        )));
    }

    Ok(translations)
}
