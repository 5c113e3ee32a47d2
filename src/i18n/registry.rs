//! Embedded translation dictionaries

use crate::i18n::I18nError;
use rust_embed::RustEmbed;
use serde_json::Value;
use std::collections::HashMap;
use unic_langid::LanguageIdentifier;

/// Locales the widget ships a dictionary for
pub const SUPPORTED_LOCALES: [&str; 7] = ["en", "vi", "de", "fr", "fr-CA", "es", "pt"];

#[derive(RustEmbed)]
#[folder = "assets/locales/"]
struct LocaleAssets;

/// Every registered locale with its flattened message dictionary
///
/// Built once at startup from the embedded JSON files. Nested message
/// objects flatten to dot-joined keys (`dialog.save.title`), so lookup
/// is a single map access. Immutable after registration.
#[derive(Debug, Clone)]
pub struct TranslationRegistry {
    dictionaries: HashMap<LanguageIdentifier, HashMap<String, String>>,
}

impl TranslationRegistry {
    /// Load the dictionary of every supported locale
    ///
    /// A missing or malformed dictionary fails the whole registration,
    /// so a broken translation file surfaces at startup rather than at
    /// the first lookup.
    pub fn register_all() -> Result<Self, I18nError> {
        let mut dictionaries = HashMap::new();
        for code in SUPPORTED_LOCALES {
            let locale: LanguageIdentifier =
                code.parse().map_err(|_| I18nError::InvalidLocale {
                    code: code.to_string(),
                })?;
            let dictionary = load_dictionary(code)?;
            dictionaries.insert(locale, dictionary);
        }
        Ok(Self { dictionaries })
    }

    pub fn is_registered(&self, locale: &LanguageIdentifier) -> bool {
        self.dictionaries.contains_key(locale)
    }

    /// Message template for `key` under `locale`, if present
    pub fn lookup(&self, locale: &LanguageIdentifier, key: &str) -> Option<&str> {
        self.dictionaries
            .get(locale)?
            .get(key)
            .map(String::as_str)
    }

    /// The registered locales, in no particular order
    pub fn locales(&self) -> Vec<&LanguageIdentifier> {
        self.dictionaries.keys().collect()
    }
}

fn load_dictionary(code: &str) -> Result<HashMap<String, String>, I18nError> {
    let file = format!("{code}.json");
    let asset = LocaleAssets::get(&file).ok_or_else(|| I18nError::MissingDictionary {
        locale: code.to_string(),
    })?;
    let value: Value =
        serde_json::from_slice(asset.data.as_ref()).map_err(|source| {
            I18nError::MalformedDictionary {
                locale: code.to_string(),
                source,
            }
        })?;

    if !value.is_object() {
        return Err(I18nError::NotAnObject {
            locale: code.to_string(),
        });
    }

    let mut dictionary = HashMap::new();
    flatten_into(code, "", &value, &mut dictionary)?;
    Ok(dictionary)
}

fn flatten_into(
    locale: &str,
    prefix: &str,
    value: &Value,
    out: &mut HashMap<String, String>,
) -> Result<(), I18nError> {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let joined = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten_into(locale, &joined, child, out)?;
            }
            Ok(())
        }
        Value::String(template) => {
            out.insert(prefix.to_string(), template.clone());
            Ok(())
        }
        _ => Err(I18nError::InvalidTemplate {
            locale: locale.to_string(),
            key: prefix.to_string(),
        }),
    }
}
