//! The closed set of languages the translator understands.

use crate::error::TranslateError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A supported document language.
///
/// Source documents may be in any of these; the translation target is always
/// [`Language::English`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Spanish,
    French,
    German,
    Mandarin,
    Hindi,
    English,
}

impl Language {
    /// Every supported language, in display order.
    pub const ALL: [Language; 6] = [
        Language::Spanish,
        Language::French,
        Language::German,
        Language::Mandarin,
        Language::Hindi,
        Language::English,
    ];

    /// Lowercase identifier used on the wire (`sourceLang` form field).
    pub fn as_str(self) -> &'static str {
        match self {
            Language::Spanish => "spanish",
            Language::French => "french",
            Language::German => "german",
            Language::Mandarin => "mandarin",
            Language::Hindi => "hindi",
            Language::English => "english",
        }
    }

    /// Human-readable name used in prompts and report headers.
    pub fn display_name(self) -> &'static str {
        match self {
            Language::Spanish => "Spanish",
            Language::French => "French",
            Language::German => "German",
            Language::Mandarin => "Mandarin Chinese",
            Language::Hindi => "Hindi",
            Language::English => "English",
        }
    }

    /// ISO 639-1 code used by Google Translate, MyMemory and LibreTranslate.
    pub fn iso_code(self) -> &'static str {
        match self {
            Language::Spanish => "es",
            Language::French => "fr",
            Language::German => "de",
            Language::Mandarin => "zh",
            Language::Hindi => "hi",
            Language::English => "en",
        }
    }

    /// Parse a free-form language name as returned by a detection model.
    ///
    /// Accepts the wire identifier, the display name, the ISO code and a few
    /// common aliases; surrounding punctuation and case are ignored.
    pub fn from_name(name: &str) -> Option<Language> {
        let cleaned = name
            .trim()
            .trim_matches(|c: char| !c.is_alphanumeric())
            .to_lowercase();
        match cleaned.as_str() {
            "spanish" | "es" | "español" | "espanol" | "castilian" => Some(Language::Spanish),
            "french" | "fr" | "français" | "francais" => Some(Language::French),
            "german" | "de" | "deutsch" => Some(Language::German),
            "mandarin" | "mandarin chinese" | "chinese" | "zh" | "中文" => Some(Language::Mandarin),
            "hindi" | "hi" | "हिन्दी" => Some(Language::Hindi),
            "english" | "en" => Some(Language::English),
            _ => None,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = TranslateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::from_name(s).ok_or_else(|| TranslateError::UnsupportedLanguage(s.to_string()))
    }
}

/// Parse an optional target-language field; only English is accepted.
pub fn parse_target(raw: Option<&str>) -> Result<Language, TranslateError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(Language::English),
        Some(s) => match Language::from_name(s) {
            Some(Language::English) => Ok(Language::English),
            _ => Err(TranslateError::UnsupportedTargetLanguage(s.to_string())),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wire_names_and_aliases() {
        assert_eq!("spanish".parse::<Language>().unwrap(), Language::Spanish);
        assert_eq!("Mandarin Chinese".parse::<Language>().unwrap(), Language::Mandarin);
        assert_eq!(Language::from_name("  French. "), Some(Language::French));
        assert_eq!(Language::from_name("DE"), Some(Language::German));
        assert!("klingon".parse::<Language>().is_err());
    }

    #[test]
    fn iso_codes_match_free_services() {
        let codes: Vec<_> = Language::ALL.iter().map(|l| l.iso_code()).collect();
        assert_eq!(codes, vec!["es", "fr", "de", "zh", "hi", "en"]);
    }

    #[test]
    fn target_defaults_to_english_and_rejects_others() {
        assert_eq!(parse_target(None).unwrap(), Language::English);
        assert_eq!(parse_target(Some("")).unwrap(), Language::English);
        assert_eq!(parse_target(Some("english")).unwrap(), Language::English);
        assert!(matches!(
            parse_target(Some("spanish")),
            Err(TranslateError::UnsupportedTargetLanguage(_))
        ));
    }

    #[test]
    fn serde_uses_lowercase() {
        let json = serde_json::to_string(&Language::Hindi).unwrap();
        assert_eq!(json, "\"hindi\"");
    }
}
