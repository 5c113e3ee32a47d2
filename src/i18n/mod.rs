//! Locale bootstrap for the editor widget
//!
//! Independent of the build pipeline: the widget registers its embedded
//! translation dictionaries once at startup, then switches the active
//! locale at runtime. Lookup falls back along active locale, bare
//! language, fallback locale, and finally the key itself.

pub mod lookup;
pub mod registry;

use thiserror::Error;

pub use lookup::{detect_locale, I18n};
pub use registry::{TranslationRegistry, SUPPORTED_LOCALES};

/// Locale used for both slots when nothing else is configured
pub const DEFAULT_LOCALE: &str = "en";

/// Errors from registering dictionaries or configuring lookup
#[derive(Debug, Error)]
pub enum I18nError {
    /// A locale code did not parse as a language identifier
    #[error("`{code}` is not a valid language identifier")]
    InvalidLocale { code: String },

    /// No dictionary file is embedded for a supported locale
    #[error("no embedded dictionary for locale `{locale}`")]
    MissingDictionary { locale: String },

    /// A dictionary file is not valid JSON
    #[error("dictionary for `{locale}` is not valid JSON: {source}")]
    MalformedDictionary {
        locale: String,
        #[source]
        source: serde_json::Error,
    },

    /// A dictionary file holds something other than a message object
    #[error("dictionary for `{locale}` must be a JSON object of messages")]
    NotAnObject { locale: String },

    /// A message leaf is not a string
    #[error("dictionary for `{locale}` has a non-string message at `{key}`")]
    InvalidTemplate { locale: String, key: String },

    /// The fallback locale has no registered dictionary
    #[error("fallback locale `{locale}` is not registered")]
    UnregisteredFallback { locale: String },
}
