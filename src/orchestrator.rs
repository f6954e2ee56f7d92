//! Drives a translation run over a loaded catalog.
//!
//! Languages are handled one after another, batches within a language one
//! after another. After every batch that merged at least one translation the
//! catalog is saved, so an interrupted run loses at most the batch in flight.
//! A batch that still fails after its retries is logged and skipped; the
//! untranslated units are picked up again by the next run.

use crate::batch::{batch_count, batches};
use crate::catalog::StringCatalog;
use crate::client::TranslationClient;
use crate::error::{Result, TranslateError};
use crate::language::LanguageCode;
use crate::openai::ChatService;
use crate::pending::{pending_units, retain_pending, PendingUnit};
use crate::store::CatalogStore;
use crate::usage::TokenUsage;
use tracing::{info, warn};

/// A batch abandoned after its retries were used up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFailure {
    pub language: String,
    /// 1-based batch number within the language
    pub batch: usize,
    pub keys: Vec<String>,
    pub error: String,
}

/// Outcome for one target language
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LanguageReport {
    pub language: String,
    pub pending: usize,
    pub translated: usize,
    pub failed_batches: usize,
}

/// Outcome of a whole run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub usage: TokenUsage,
    pub languages: Vec<LanguageReport>,
    pub failures: Vec<BatchFailure>,
}

impl RunReport {
    /// Number of translations written across all languages
    pub fn translated(&self) -> usize {
        self.languages.iter().map(|l| l.translated).sum()
    }

    /// True when no batch was abandoned
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct Orchestrator<S> {
    client: TranslationClient<S>,
    batch_size: usize,
}

impl<S: ChatService> Orchestrator<S> {
    pub fn new(client: TranslationClient<S>, batch_size: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(TranslateError::Configuration(
                "Batch size must be at least 1".to_string(),
            ));
        }
        Ok(Self { client, batch_size })
    }

    /// Translate every pending unit of `catalog` into each of `languages`,
    /// saving through `store` after each merged batch.
    ///
    /// Only configuration, request-construction and persistence errors are
    /// returned; failed batches are recorded in the report instead.
    pub async fn translate_catalog(
        &self,
        catalog: &mut StringCatalog,
        store: &CatalogStore,
        languages: &[LanguageCode],
    ) -> Result<RunReport> {
        let mut report = RunReport::default();

        for language in languages {
            let language_report = self
                .translate_language(catalog, store, language, &mut report)
                .await?;
            report.languages.push(language_report);
        }

        Ok(report)
    }

    async fn translate_language(
        &self,
        catalog: &mut StringCatalog,
        store: &CatalogStore,
        language: &LanguageCode,
        report: &mut RunReport,
    ) -> Result<LanguageReport> {
        let language = language.as_str();
        let source_language = catalog.source_language().to_string();
        let pending = pending_units(catalog, language);

        let mut language_report = LanguageReport {
            language: language.to_string(),
            pending: pending.len(),
            ..Default::default()
        };

        if pending.is_empty() {
            info!("All entries already have translations for {}, skipping", language);
            return Ok(language_report);
        }

        info!(
            "Starting translation for {}: {} entries in {} batches",
            language,
            pending.len(),
            batch_count(pending.len(), self.batch_size)
        );

        let mut offset = 0;
        for (index, batch) in batches(&pending, self.batch_size)?.enumerate() {
            let batch_number = index + 1;
            let first = offset + 1;
            offset += batch.len();

            // Units translated since the pending list was built are dropped
            let batch = retain_pending(catalog, language, batch);
            if batch.is_empty() {
                continue;
            }

            info!(
                "Translating entries {} to {} of {} for {}",
                first,
                offset,
                pending.len(),
                language
            );

            let texts: Vec<String> = batch.iter().map(|u| u.source_text.clone()).collect();
            match self
                .client
                .translate_batch(&texts, &source_language, language)
                .await
            {
                Ok(result) => {
                    report.usage.record(result.usage);
                    let merged = merge_batch(catalog, language, &batch, result.translations);
                    if merged > 0 {
                        store.save(catalog)?;
                        info!("Updated {} entries for {}, file written", merged, language);
                    }
                    language_report.translated += merged;
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    let keys: Vec<String> = batch.iter().map(|u| u.key.clone()).collect();
                    warn!(
                        "Batch {} for {} failed, skipping {} entries ({}): {}",
                        batch_number,
                        language,
                        keys.len(),
                        keys.join(", "),
                        e
                    );
                    language_report.failed_batches += 1;
                    report.failures.push(BatchFailure {
                        language: language.to_string(),
                        batch: batch_number,
                        keys,
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            "Translation for {} completed: {} of {} entries translated",
            language, language_report.translated, language_report.pending
        );
        Ok(language_report)
    }
}

/// Zip a batch with its translations and write them into the catalog.
/// Returns how many entries were actually written.
///
/// A blank translation is not written: the unit stays pending for the next
/// run.
fn merge_batch(
    catalog: &mut StringCatalog,
    language: &str,
    batch: &[PendingUnit],
    translations: Vec<String>,
) -> usize {
    let mut merged = 0;
    for (unit, translation) in batch.iter().zip(translations) {
        if translation.trim().is_empty() {
            warn!(
                "Empty translation for {} in {}, leaving it untranslated",
                unit.key, language
            );
            continue;
        }
        if catalog.set_translation(&unit.key, language, translation) {
            merged += 1;
        }
    }
    merged
}
