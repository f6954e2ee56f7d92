//! Target language list parsing and validation.

use crate::error::{Result, TranslateError};
use unic_langid::LanguageIdentifier;

/// A validated BCP 47 language code as it appears in the catalog.
///
/// The original spelling is kept (`zh-Hans`, `pt-BR`) because catalog
/// localization keys are matched verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LanguageCode(String);

impl LanguageCode {
    /// Validate a single language code.
    pub fn parse(code: &str) -> Result<Self> {
        let code = code.trim();
        if code.is_empty() {
            return Err(TranslateError::Configuration(
                "Empty language code".to_string(),
            ));
        }
        code.parse::<LanguageIdentifier>().map_err(|e| {
            TranslateError::Configuration(format!("Unknown language code '{}': {}", code, e))
        })?;
        Ok(Self(code.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for LanguageCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Validate a list of target languages, e.g. `["zh-Hans", "fr", "de"]`.
///
/// Items are trimmed, blank items are skipped and duplicates are dropped
/// (first occurrence wins). An unrecognized code or an empty list is a
/// configuration error.
pub fn parse_languages<S: AsRef<str>>(items: &[S]) -> Result<Vec<LanguageCode>> {
    let mut languages: Vec<LanguageCode> = Vec::new();
    for item in items.iter().map(|s| s.as_ref().trim()).filter(|s| !s.is_empty()) {
        let code = LanguageCode::parse(item)?;
        if !languages.contains(&code) {
            languages.push(code);
        }
    }

    if languages.is_empty() {
        return Err(TranslateError::Configuration(
            "No target languages given".to_string(),
        ));
    }
    Ok(languages)
}
