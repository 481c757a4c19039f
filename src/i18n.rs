use std::collections::BTreeMap;

use crate::error::Result;

pub const DEFAULT_LOCALE: &str = "en-US";

const BUNDLE: &str = include_str!("../assets/locales.ron");

type Messages = BTreeMap<String, String>;

/// Message lookup for one locale, falling back to en-US and then to the
/// message id itself.
#[derive(Debug, Clone)]
pub struct Localizer {
    locale: String,
    bundle: BTreeMap<String, Messages>,
}

impl Localizer {
    /// Uses the bundled translations.
    pub fn new(requested: &str) -> Result<Self> {
        Self::from_ron(BUNDLE, requested)
    }

    pub fn from_ron(source: &str, requested: &str) -> Result<Self> {
        let bundle: BTreeMap<String, Messages> = ron::from_str(source)?;
        let locale = find_matching_locale(bundle.keys().map(String::as_str), requested);
        Ok(Self { locale, bundle })
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn t<'a>(&'a self, key: &'a str) -> &'a str {
        self.bundle
            .get(&self.locale)
            .and_then(|m| m.get(key))
            .or_else(|| self.bundle.get(DEFAULT_LOCALE).and_then(|m| m.get(key)))
            .map(String::as_str)
            .unwrap_or(key)
    }
}

/// Exact match, else the first available locale of the same language,
/// else en-US.
pub fn find_matching_locale<'a>(
    available: impl IntoIterator<Item = &'a str> + Clone,
    requested: &str,
) -> String {
    if available.clone().into_iter().any(|l| l == requested) {
        return requested.to_string();
    }
    let language = requested.split('-').next().unwrap_or(requested);
    let prefix = format!("{language}-");
    available
        .into_iter()
        .find(|l| l.starts_with(&prefix))
        .unwrap_or(DEFAULT_LOCALE)
        .to_string()
}

/// Locale from the usual environment variables, in BCP 47 form
/// (`es_ES.UTF-8` becomes `es-ES`).
pub fn system_locale() -> String {
    ["LC_ALL", "LC_MESSAGES", "LANG"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|value| !value.is_empty() && value != "C" && value != "POSIX")
        .map(|value| posix_to_bcp47(&value))
        .unwrap_or_else(|| DEFAULT_LOCALE.to_string())
}

fn posix_to_bcp47(value: &str) -> String {
    let base = value.split(['.', '@']).next().unwrap_or(value);
    base.replace('_', "-")
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOCALES: [&str; 2] = ["en-US", "es-ES"];

    #[test]
    fn bundled_messages_parse() {
        let en = Localizer::new("en-US").unwrap();
        assert_eq!(en.t("playButton"), "Play");
        let es = Localizer::new("es-ES").unwrap();
        assert_eq!(es.t("playButton"), "Reproducir");
    }

    #[test]
    fn every_locale_has_every_message() {
        let en = Localizer::new("en-US").unwrap();
        let english: Vec<&String> = en.bundle[DEFAULT_LOCALE].keys().collect();
        for (locale, messages) in &en.bundle {
            let keys: Vec<&String> = messages.keys().collect();
            assert_eq!(keys, english, "{locale} is missing messages");
        }
    }

    #[test]
    fn matches_locales() {
        assert_eq!(find_matching_locale(LOCALES, "es-ES"), "es-ES");
        assert_eq!(find_matching_locale(LOCALES, "es-MX"), "es-ES");
        assert_eq!(find_matching_locale(LOCALES, "es"), "es-ES");
        assert_eq!(find_matching_locale(LOCALES, "fr-FR"), "en-US");
    }

    #[test]
    fn falls_back_to_english_then_key() {
        let source = r#"{
            "en-US": { "greeting": "Hello", "farewell": "Bye" },
            "es-ES": { "greeting": "Hola" },
        }"#;
        let es = Localizer::from_ron(source, "es-AR").unwrap();
        assert_eq!(es.locale(), "es-ES");
        assert_eq!(es.t("greeting"), "Hola");
        assert_eq!(es.t("farewell"), "Bye");
        assert_eq!(es.t("missing"), "missing");
    }

    #[test]
    fn converts_posix_locales() {
        assert_eq!(posix_to_bcp47("es_ES.UTF-8"), "es-ES");
        assert_eq!(posix_to_bcp47("de_DE@euro"), "de-DE");
        assert_eq!(posix_to_bcp47("en"), "en");
    }
}
