use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Content locales the catalog is authored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Es,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unsupported locale: {raw}")]
pub struct UnsupportedLocale {
    pub raw: String,
}

impl Locale {
    pub const ALL: [Locale; 2] = [Locale::En, Locale::Es];

    /// Locale used when a translation is missing.
    pub const FALLBACK: Locale = Locale::En;

    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Es => "es",
        }
    }

    /// Native display name of the locale.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Locale::En => "English",
            Locale::Es => "Español",
        }
    }

    /// Best-effort match of a system locale tag like `es_ES.UTF-8` or `en-US`.
    #[must_use]
    pub fn from_system_tag(tag: &str) -> Option<Self> {
        let lang = tag
            .split(|c: char| c == '-' || c == '_' || c == '.')
            .next()
            .unwrap_or_default();
        lang.parse().ok()
    }
}

impl FromStr for Locale {
    type Err = UnsupportedLocale;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Locale::En),
            "es" => Ok(Locale::Es),
            _ => Err(UnsupportedLocale { raw: s.to_string() }),
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A piece of text authored in one or more locales.
///
/// Resolution prefers the requested locale and falls back to English; blank
/// translations count as missing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalizedText(BTreeMap<Locale, String>);

impl LocalizedText {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Text with only an English value.
    #[must_use]
    pub fn en(value: impl Into<String>) -> Self {
        Self::new().with(Locale::En, value)
    }

    #[must_use]
    pub fn with(mut self, locale: Locale, value: impl Into<String>) -> Self {
        self.0.insert(locale, value.into());
        self
    }

    #[must_use]
    pub fn get(&self, locale: Locale) -> Option<&str> {
        self.0
            .get(&locale)
            .map(String::as_str)
            .filter(|value| !value.trim().is_empty())
    }

    /// Resolve for `locale`, falling back to English.
    #[must_use]
    pub fn resolve(&self, locale: Locale) -> Option<&str> {
        self.get(locale).or_else(|| self.get(Locale::FALLBACK))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        Locale::ALL.iter().all(|locale| self.get(*locale).is_none())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_prefers_requested_locale() {
        let text = LocalizedText::en("Espresso").with(Locale::Es, "Expreso");
        assert_eq!(text.resolve(Locale::Es), Some("Expreso"));
        assert_eq!(text.resolve(Locale::En), Some("Espresso"));
    }

    #[test]
    fn resolve_falls_back_to_english() {
        let text = LocalizedText::en("Roasting").with(Locale::Es, "  ");
        assert_eq!(text.resolve(Locale::Es), Some("Roasting"));
    }

    #[test]
    fn resolve_is_none_without_any_translation() {
        let text = LocalizedText::new().with(Locale::Es, "Tueste");
        assert_eq!(text.resolve(Locale::En), None);
        assert!(!text.is_empty());
        assert!(LocalizedText::new().is_empty());
    }

    #[test]
    fn parses_codes_and_system_tags() {
        assert_eq!("ES".parse::<Locale>(), Ok(Locale::Es));
        assert!("fr".parse::<Locale>().is_err());
        assert_eq!(Locale::from_system_tag("es_ES.UTF-8"), Some(Locale::Es));
        assert_eq!(Locale::from_system_tag("en-US"), Some(Locale::En));
        assert_eq!(Locale::from_system_tag("de_DE"), None);
    }
}
