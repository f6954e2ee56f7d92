//! In-memory model of an Xcode string catalog (`.xcstrings`).
//!
//! Only the translation-relevant subset of the format is typed. Every other
//! field (comments, extraction state, plural variations, version, ...) is kept
//! as raw JSON and written back untouched, in its original position.
//!
//! ```json
//! {
//!   "sourceLanguage": "en",
//!   "strings": {
//!     "hello_world": {
//!       "comment": "Greeting",
//!       "localizations": {
//!         "en": { "stringUnit": { "state": "translated", "value": "Hello World" } }
//!       }
//!     }
//!   },
//!   "version": "1.0"
//! }
//! ```

use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

/// Source language used when the file does not declare one
pub const DEFAULT_SOURCE_LANGUAGE: &str = "en";

const STRINGS_FIELD: &str = "strings";
const SOURCE_LANGUAGE_FIELD: &str = "sourceLanguage";
const LOCALIZATIONS_FIELD: &str = "localizations";
const SHOULD_TRANSLATE_FIELD: &str = "shouldTranslate";
const STRING_UNIT_FIELD: &str = "stringUnit";
const STATE_FIELD: &str = "state";
const VALUE_FIELD: &str = "value";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("top-level value is not a JSON object")]
    NotAnObject,

    #[error("missing 'strings' field")]
    MissingStrings,

    #[error("entry '{0}' is not a JSON object")]
    InvalidEntry(String),
}

/// Translation state of a single localization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslationStatus {
    Untranslated,
    Translated,
    NeedsReview,
}

impl TranslationStatus {
    /// Map the file's `state` tag onto a status.
    pub fn from_state(state: Option<&str>) -> Self {
        match state {
            Some("translated") => TranslationStatus::Translated,
            Some("needs_review") | Some("stale") => TranslationStatus::NeedsReview,
            _ => TranslationStatus::Untranslated,
        }
    }

    /// The `state` tag written to the file for this status.
    pub fn as_state(&self) -> &'static str {
        match self {
            TranslationStatus::Untranslated => "new",
            TranslationStatus::Translated => "translated",
            TranslationStatus::NeedsReview => "needs_review",
        }
    }
}

/// One language's localization of a unit.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationEntry {
    value: String,
    status: TranslationStatus,
    /// The full localization object as it appears in the file
    raw: Map<String, Value>,
}

impl TranslationEntry {
    fn from_json(value: &Value) -> Self {
        let raw = value.as_object().cloned().unwrap_or_default();
        let string_unit = raw.get(STRING_UNIT_FIELD).and_then(Value::as_object);

        let text = string_unit
            .and_then(|unit| unit.get(VALUE_FIELD))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let state = string_unit
            .and_then(|unit| unit.get(STATE_FIELD))
            .and_then(Value::as_str);

        Self {
            value: text,
            status: TranslationStatus::from_state(state),
            raw,
        }
    }

    /// Build a translated entry, keeping any fields of the entry it replaces.
    fn translated(previous: Option<&TranslationEntry>, value: String) -> Self {
        let mut raw = previous.map(|p| p.raw.clone()).unwrap_or_default();

        let unit = raw
            .entry(STRING_UNIT_FIELD)
            .or_insert_with(|| Value::Object(Map::new()));
        if !unit.is_object() {
            *unit = Value::Object(Map::new());
        }
        if let Value::Object(unit) = unit {
            unit.insert(
                STATE_FIELD.to_string(),
                Value::String(TranslationStatus::Translated.as_state().to_string()),
            );
            unit.insert(VALUE_FIELD.to_string(), Value::String(value.clone()));
        }

        Self {
            value,
            status: TranslationStatus::Translated,
            raw,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn status(&self) -> TranslationStatus {
        self.status
    }

    /// Whether the entry carries no usable text (missing, empty or blank).
    pub fn is_empty(&self) -> bool {
        self.value.trim().is_empty()
    }

    fn to_json(&self) -> Value {
        Value::Object(self.raw.clone())
    }
}

/// A translatable string and its localizations.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationUnit {
    key: String,
    source_text: String,
    should_translate: bool,
    translations: BTreeMap<String, TranslationEntry>,
    /// Every field of the entry object, including `localizations`
    raw: Map<String, Value>,
}

impl TranslationUnit {
    fn from_json(key: &str, value: &Value, source_language: &str) -> Result<Self, CatalogError> {
        let raw = value
            .as_object()
            .cloned()
            .ok_or_else(|| CatalogError::InvalidEntry(key.to_string()))?;

        let translations: BTreeMap<String, TranslationEntry> = raw
            .get(LOCALIZATIONS_FIELD)
            .and_then(Value::as_object)
            .map(|locs| {
                locs.iter()
                    .map(|(lang, loc)| (lang.clone(), TranslationEntry::from_json(loc)))
                    .collect()
            })
            .unwrap_or_default();

        // Entries without a source localization use the key itself as source text
        let source_text = translations
            .get(source_language)
            .filter(|entry| !entry.is_empty())
            .map(|entry| entry.value.clone())
            .unwrap_or_else(|| key.to_string());

        let should_translate = raw
            .get(SHOULD_TRANSLATE_FIELD)
            .and_then(Value::as_bool)
            .unwrap_or(true);

        Ok(Self {
            key: key.to_string(),
            source_text,
            should_translate,
            translations,
            raw,
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn source_text(&self) -> &str {
        &self.source_text
    }

    /// False when the file marks the string with `"shouldTranslate": false`.
    pub fn should_translate(&self) -> bool {
        self.should_translate
    }

    pub fn translation(&self, language: &str) -> Option<&TranslationEntry> {
        self.translations.get(language)
    }

    pub fn translations(&self) -> &BTreeMap<String, TranslationEntry> {
        &self.translations
    }

    /// Whether this unit still needs a translation into `language`.
    pub fn needs_translation(&self, language: &str) -> bool {
        self.translations
            .get(language)
            .map_or(true, TranslationEntry::is_empty)
    }

    fn to_json(&self) -> Value {
        let mut raw = self.raw.clone();
        if !self.translations.is_empty() {
            let locs = raw
                .entry(LOCALIZATIONS_FIELD)
                .or_insert_with(|| Value::Object(Map::new()));
            if !locs.is_object() {
                *locs = Value::Object(Map::new());
            }
            if let Value::Object(locs) = locs {
                // Existing languages keep their position; new ones are appended
                for (lang, entry) in &self.translations {
                    locs.insert(lang.clone(), entry.to_json());
                }
            }
        }
        Value::Object(raw)
    }
}

/// The whole catalog: ordered units plus the untouched top-level document.
#[derive(Debug, Clone)]
pub struct StringCatalog {
    source_language: String,
    units: Vec<TranslationUnit>,
    index: HashMap<String, usize>,
    document: Map<String, Value>,
}

impl StringCatalog {
    /// Parse a catalog from JSON text.
    ///
    /// `source_override` replaces the file's `sourceLanguage` for this run
    /// (the field in the file itself is left as is). A leading UTF-8 BOM is
    /// ignored.
    pub fn parse(json: &str, source_override: Option<&str>) -> Result<Self, CatalogError> {
        let json = json.strip_prefix('\u{feff}').unwrap_or(json);
        let value: Value = serde_json::from_str(json)?;
        let Value::Object(document) = value else {
            return Err(CatalogError::NotAnObject);
        };

        let source_language = source_override
            .map(str::trim)
            .filter(|lang| !lang.is_empty())
            .map(str::to_string)
            .or_else(|| {
                document
                    .get(SOURCE_LANGUAGE_FIELD)
                    .and_then(Value::as_str)
                    .filter(|lang| !lang.is_empty())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| DEFAULT_SOURCE_LANGUAGE.to_string());

        let strings = document
            .get(STRINGS_FIELD)
            .and_then(Value::as_object)
            .ok_or(CatalogError::MissingStrings)?;

        let units = strings
            .iter()
            .map(|(key, entry)| TranslationUnit::from_json(key, entry, &source_language))
            .collect::<Result<Vec<_>, _>>()?;

        let index = units
            .iter()
            .enumerate()
            .map(|(i, unit)| (unit.key.clone(), i))
            .collect();

        Ok(Self {
            source_language,
            units,
            index,
            document,
        })
    }

    pub fn source_language(&self) -> &str {
        &self.source_language
    }

    pub fn units(&self) -> &[TranslationUnit] {
        &self.units
    }

    pub fn unit(&self, key: &str) -> Option<&TranslationUnit> {
        self.index.get(key).map(|&i| &self.units[i])
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Store a translation for `key` in `language` and mark it translated.
    ///
    /// Returns `false` without touching anything when the key is unknown or
    /// the unit already has a non-empty translation for that language.
    pub fn set_translation(&mut self, key: &str, language: &str, value: String) -> bool {
        let Some(&i) = self.index.get(key) else {
            return false;
        };
        let unit = &mut self.units[i];
        if !unit.needs_translation(language) {
            return false;
        }

        let entry = TranslationEntry::translated(unit.translations.get(language), value);
        unit.translations.insert(language.to_string(), entry);
        true
    }

    /// Rebuild the full JSON document.
    pub fn to_json(&self) -> Value {
        let strings: Map<String, Value> = self
            .units
            .iter()
            .map(|unit| (unit.key.clone(), unit.to_json()))
            .collect();

        let mut document = self.document.clone();
        document.insert(STRINGS_FIELD.to_string(), Value::Object(strings));
        Value::Object(document)
    }

    /// Serialize to pretty-printed JSON (two-space indentation).
    pub fn to_json_string(&self) -> Result<String, CatalogError> {
        Ok(serde_json::to_string_pretty(&self.to_json())?)
    }
}
