//! Translate Xcode string catalogs (`.xcstrings`) with an OpenAI-compatible
//! chat model.
//!
//! For every requested target language the untranslated entries of the
//! catalog are sent to the model in small batches. Each batch that comes back
//! well-formed is merged into the catalog and the file is saved immediately;
//! entries that already carry a translation are never sent again.

pub mod batch;
pub mod catalog;
pub mod client;
pub mod config;
pub mod error;
pub mod language;
pub mod openai;
pub mod orchestrator;
pub mod pending;
pub mod prompt;
pub mod retry;
pub mod store;
pub mod usage;

use std::path::PathBuf;
use tracing::info;

pub use catalog::{StringCatalog, TranslationEntry, TranslationStatus, TranslationUnit};
pub use client::{BatchTranslation, TranslationClient};
pub use config::Config;
pub use error::TranslateError;
pub use language::LanguageCode;
pub use openai::{ChatCompletion, ChatMessage, ChatService, OpenAiClient};
pub use orchestrator::{BatchFailure, LanguageReport, Orchestrator, RunReport};
pub use retry::RetryConfig;
pub use store::CatalogStore;
pub use usage::TokenUsage;

/// What to translate in a single run
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Path of the `.xcstrings` file, read and written in place
    pub file: PathBuf,
    /// Target language codes, processed in this order
    pub target_languages: Vec<String>,
    /// Overrides the catalog's `sourceLanguage`
    pub source_language: Option<String>,
    /// Emit prompts, raw responses and per-call token usage
    pub debug: bool,
    pub retry: RetryConfig,
}

impl RunOptions {
    pub fn new(file: impl Into<PathBuf>, target_languages: Vec<String>) -> Self {
        Self {
            file: file.into(),
            target_languages,
            source_language: None,
            debug: false,
            retry: RetryConfig::batch_request(),
        }
    }
}

/// Run a complete translation pass over one catalog file.
///
/// Configuration problems and an unloadable catalog abort before any request
/// is made. Batches that keep failing are skipped and listed in the report.
pub async fn run(config: &Config, options: &RunOptions) -> error::Result<RunReport> {
    let languages = language::parse_languages(&options.target_languages)?;
    let source_language = options
        .source_language
        .as_deref()
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(LanguageCode::parse)
        .transpose()?;
    let service = OpenAiClient::new(config)?;

    let store = CatalogStore::new(&options.file);
    let mut catalog = store.load(source_language.as_ref().map(LanguageCode::as_str))?;
    info!(
        "Loaded {} entries from {} (source language: {})",
        catalog.len(),
        store.path().display(),
        catalog.source_language()
    );

    let client = TranslationClient::new(service)
        .with_retry(options.retry.clone())
        .with_debug(options.debug);
    let orchestrator = Orchestrator::new(client, config.batch_size)?;

    let report = orchestrator
        .translate_catalog(&mut catalog, &store, &languages)
        .await?;

    info!(
        "Translation process completed: {} entries translated, {} batches failed",
        report.translated(),
        report.failures.len()
    );
    Ok(report)
}
