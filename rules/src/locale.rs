//! Locale set used for redirect fan-out.
//!
//! A localized redirect is published once without a locale prefix and once
//! more for every configured locale other than the default one. Which tag is
//! "the default" is decided with base-sensitivity collation, so `en-US`,
//! `en-us` and `EN-us` all name the same locale.
//!
//! The `Locales` is built at startup from configuration and remains immutable
//! during request processing.

use std::sync::Arc;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

pub const DEFAULT_LOCALE: &str = "en-US";

pub const DEFAULT_LOCALES: &[&str] = &[
    "de-de",
    "en-au",
    "en-ca",
    "en-gb",
    "en-in",
    "en-us",
    "es-es",
    "fr-fr",
    "id-id",
    "it-it",
    "ja-jp",
    "ko-kr",
    "nl-nl",
    "pt-br",
    "ru-ru",
    "sv-se",
    "th-th",
    "tr-tr",
    "vi-vn",
    "zh-cn",
    "zh-hans-cn",
    "zh-tw",
];

#[derive(Debug)]
struct LocalesInner {
    default_locale: String,
    default_key: String,
    /// Configured order is publish order.
    tags: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct Locales {
    inner: Arc<LocalesInner>,
}

impl Locales {
    pub fn new(tags: Vec<String>, default_locale: impl Into<String>) -> Self {
        let default_locale = default_locale.into();
        let default_key = collation_key(&default_locale);

        Self {
            inner: Arc::new(LocalesInner {
                default_locale,
                default_key,
                tags,
            }),
        }
    }

    pub fn default_locale(&self) -> &str {
        &self.inner.default_locale
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.inner.tags.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.inner.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.tags.is_empty()
    }

    /// Whether `tag` names the default locale, ignoring case and accents.
    pub fn is_default(&self, tag: &str) -> bool {
        collation_key(tag) == self.inner.default_key
    }

    /// Locales that get their own path-prefixed redirect.
    pub fn prefixed(&self) -> impl Iterator<Item = &str> {
        self.tags().filter(move |tag| !self.is_default(tag))
    }
}

impl Default for Locales {
    fn default() -> Self {
        Locales::new(
            DEFAULT_LOCALES.iter().map(|tag| tag.to_string()).collect(),
            DEFAULT_LOCALE,
        )
    }
}

/// Collation key at base strength: strips diacritics and folds case. Two tags
/// with the same key name the same locale.
pub fn collation_key(s: &str) -> String {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}
