use crate::error::{Result, TranslateError};
use crate::openai::ChatMessage;

const SYSTEM_PROMPT: &str =
    "You are a professional translation assistant for software user interfaces.";

/// Build the user prompt for a batch of strings
fn build_user_prompt(
    texts: &[String],
    source_language: &str,
    target_language: &str,
) -> Result<String> {
    let input = serde_json::to_string_pretty(texts)
        .map_err(|e| TranslateError::RequestBuild(format!("Failed to serialize batch: {}", e)))?;

    Ok(format!(
        r#"Translate each string in the JSON array below from {source} to {target}.

Rules:
- Return ONLY a JSON array of strings, with no explanations, comments or code fences.
- The array must contain exactly {count} items, in the same order as the input.
- Keep format specifiers (%@, %d, %lld, %1$@), placeholders and escape sequences unchanged.
- If an input string is empty, return an empty string at that position.

Input:
{input}"#,
        source = source_language,
        target = target_language,
        count = texts.len(),
        input = input,
    ))
}

/// Render the chat messages for one batch.
///
/// The model is asked for a JSON array with the same length and order as
/// `texts` so the response can be zipped positionally with the request.
pub fn build_messages(
    texts: &[String],
    source_language: &str,
    target_language: &str,
) -> Result<Vec<ChatMessage>> {
    Ok(vec![
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(build_user_prompt(texts, source_language, target_language)?),
    ])
}
