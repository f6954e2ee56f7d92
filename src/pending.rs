//! Selects which catalog entries still need a translation.

use crate::catalog::{StringCatalog, TranslationUnit};

/// A unit queued for translation into one language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingUnit {
    pub key: String,
    pub source_text: String,
}

impl From<&TranslationUnit> for PendingUnit {
    fn from(unit: &TranslationUnit) -> Self {
        Self {
            key: unit.key().to_string(),
            source_text: unit.source_text().to_string(),
        }
    }
}

/// Whether `unit` must be sent for translation into `language`.
///
/// Units opted out with `shouldTranslate: false` are never eligible; otherwise
/// a unit is eligible when it has no entry for the language or the entry is
/// empty.
pub fn is_pending(unit: &TranslationUnit, language: &str) -> bool {
    unit.should_translate() && unit.needs_translation(language)
}

/// Eligible units for `language`, in catalog order.
pub fn pending_units(catalog: &StringCatalog, language: &str) -> Vec<PendingUnit> {
    catalog
        .units()
        .iter()
        .filter(|unit| is_pending(unit, language))
        .map(PendingUnit::from)
        .collect()
}

/// Drop units from `batch` that stopped being eligible since it was built.
pub fn retain_pending(
    catalog: &StringCatalog,
    language: &str,
    batch: &[PendingUnit],
) -> Vec<PendingUnit> {
    batch
        .iter()
        .filter(|p| {
            catalog
                .unit(&p.key)
                .is_some_and(|unit| is_pending(unit, language))
        })
        .cloned()
        .collect()
}
