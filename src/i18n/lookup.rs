//! Active locale selection and message lookup

use crate::i18n::registry::{TranslationRegistry, SUPPORTED_LOCALES};
use crate::i18n::{I18nError, DEFAULT_LOCALE};
use std::sync::{PoisonError, RwLock};
use tracing::{debug, warn};
use unic_langid::LanguageIdentifier;

/// The active and fallback locales, swapped as one unit
#[derive(Debug, Clone)]
struct LocaleSelection {
    active: LanguageIdentifier,
    fallback: LanguageIdentifier,
}

/// Message lookup over a registry with a switchable active locale
///
/// Lookup resolves along active locale, bare language of the active
/// locale (`fr-CA` falls back to `fr`), then the fallback locale; a key
/// missing everywhere comes back verbatim so the UI shows the key
/// instead of nothing.
#[derive(Debug)]
pub struct I18n {
    registry: TranslationRegistry,
    selection: RwLock<LocaleSelection>,
}

impl I18n {
    /// Bind a registry to an initial and fallback locale
    ///
    /// The fallback must be registered since it backstops every other
    /// locale. The initial locale is accepted unchecked; an
    /// unregistered one just resolves every lookup through the
    /// fallback, and an unparseable one starts the widget on the
    /// fallback instead.
    pub fn initialize(
        registry: TranslationRegistry,
        initial: &str,
        fallback: &str,
    ) -> Result<Self, I18nError> {
        let fallback_id: LanguageIdentifier =
            fallback.parse().map_err(|_| I18nError::InvalidLocale {
                code: fallback.to_string(),
            })?;
        if !registry.is_registered(&fallback_id) {
            return Err(I18nError::UnregisteredFallback {
                locale: fallback.to_string(),
            });
        }

        let active = match initial.parse::<LanguageIdentifier>() {
            Ok(locale) => {
                if !registry.is_registered(&locale) {
                    warn!(
                        "Initial locale `{}` has no dictionary, lookups will use `{}`",
                        initial, fallback_id
                    );
                }
                locale
            }
            Err(_) => {
                warn!(
                    "Initial locale `{}` is not a language identifier, starting on `{}`",
                    initial, fallback_id
                );
                fallback_id.clone()
            }
        };

        Ok(Self {
            registry,
            selection: RwLock::new(LocaleSelection {
                active,
                fallback: fallback_id,
            }),
        })
    }

    /// Initialize on the default locale for both slots
    pub fn with_defaults(registry: TranslationRegistry) -> Result<Self, I18nError> {
        Self::initialize(registry, DEFAULT_LOCALE, DEFAULT_LOCALE)
    }

    /// Switch the active locale for all subsequent lookups
    ///
    /// An unregistered locale is accepted with a warning; its lookups
    /// all resolve through the fallback. An unparseable code is ignored
    /// and the active locale stays as it was.
    pub fn set_locale(&self, code: &str) {
        match code.parse::<LanguageIdentifier>() {
            Ok(locale) => {
                if !self.registry.is_registered(&locale) {
                    warn!("Locale `{}` has no dictionary, lookups will fall back", code);
                }
                let mut selection = self
                    .selection
                    .write()
                    .unwrap_or_else(PoisonError::into_inner);
                debug!("Switching locale {} -> {}", selection.active, locale);
                selection.active = locale;
            }
            Err(_) => {
                warn!("Ignoring locale switch to `{}`: not a language identifier", code);
            }
        }
    }

    pub fn active_locale(&self) -> LanguageIdentifier {
        self.read_selection().active
    }

    pub fn fallback_locale(&self) -> LanguageIdentifier {
        self.read_selection().fallback
    }

    /// Message for `key` under the active locale
    pub fn message(&self, key: &str) -> String {
        let selection = self.read_selection();

        if let Some(template) = self.registry.lookup(&selection.active, key) {
            return template.to_string();
        }

        let bare = bare_language(&selection.active);
        if bare != selection.active {
            if let Some(template) = self.registry.lookup(&bare, key) {
                return template.to_string();
            }
        }

        if let Some(template) = self.registry.lookup(&selection.fallback, key) {
            return template.to_string();
        }

        debug!("No translation for `{}`, returning the key", key);
        key.to_string()
    }

    /// Message for `key` with `{name}` placeholders substituted
    ///
    /// Placeholders without a matching argument stay in the output.
    pub fn message_with(&self, key: &str, args: &[(&str, &str)]) -> String {
        let mut message = self.message(key);
        for (name, value) in args {
            message = message.replace(&format!("{{{name}}}"), value);
        }
        message
    }

    fn read_selection(&self) -> LocaleSelection {
        self.selection
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// The locale reported by the OS, mapped onto a supported one
///
/// Tries an exact match first, then the bare language, so an `fr-CA`
/// system lands on `fr-CA` while an `fr-FR` system lands on `fr`.
pub fn detect_locale() -> Option<LanguageIdentifier> {
    let raw = sys_locale::get_locale()?;
    let os_locale: LanguageIdentifier = raw.parse().ok()?;

    let supported: Vec<LanguageIdentifier> = SUPPORTED_LOCALES
        .iter()
        .filter_map(|code| code.parse().ok())
        .collect();

    if let Some(exact) = supported.iter().find(|candidate| **candidate == os_locale) {
        return Some(exact.clone());
    }

    supported
        .iter()
        .find(|candidate| candidate.language == os_locale.language)
        .cloned()
}

fn bare_language(locale: &LanguageIdentifier) -> LanguageIdentifier {
    LanguageIdentifier::from_parts(locale.language, None, None, &[])
}
