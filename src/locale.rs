//! Locale tags
//!
//! Locale tags identify a document in the persisted output. They come from a closed set of
//! RFC 5646 codes and compare by exact string.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;

/// RFC 5646 language codes
/// Based on <http://tools.ietf.org/html/rfc5646>
static LANGUAGE_CODES: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "af",
        "af-ZA",
        "ar",
        "ar-AE",
        "ar-BH",
        "ar-DZ",
        "ar-EG",
        "ar-IQ",
        "ar-JO",
        "ar-KW",
        "ar-LB",
        "ar-LY",
        "ar-MA",
        "ar-OM",
        "ar-QA",
        "ar-SA",
        "ar-SY",
        "ar-TN",
        "ar-YE",
        "az",
        "az-AZ",
        "az-Cyrl-AZ",
        "be",
        "be-BY",
        "bg",
        "bg-BG",
        "bs-BA",
        "ca",
        "ca-ES",
        "cs",
        "cs-CZ",
        "cy",
        "cy-GB",
        "da",
        "da-DK",
        "de",
        "de-AT",
        "de-CH",
        "de-DE",
        "de-LI",
        "de-LU",
        "dv",
        "dv-MV",
        "el",
        "el-GR",
        "en",
        "en-AU",
        "en-BZ",
        "en-CA",
        "en-CB",
        "en-GB",
        "en-IE",
        "en-JM",
        "en-NZ",
        "en-PH",
        "en-TT",
        "en-US",
        "en-ZA",
        "en-ZW",
        "eo",
        "es",
        "es-AR",
        "es-BO",
        "es-CL",
        "es-CO",
        "es-CR",
        "es-DO",
        "es-EC",
        "es-ES",
        "es-GT",
        "es-HN",
        "es-MX",
        "es-NI",
        "es-PA",
        "es-PE",
        "es-PR",
        "es-PY",
        "es-SV",
        "es-UY",
        "es-VE",
        "et",
        "et-EE",
        "eu",
        "eu-ES",
        "fa",
        "fa-IR",
        "fi",
        "fi-FI",
        "fo",
        "fo-FO",
        "fr",
        "fr-BE",
        "fr-CA",
        "fr-CH",
        "fr-FR",
        "fr-LU",
        "fr-MC",
        "gl",
        "gl-ES",
        "gu",
        "gu-IN",
        "he",
        "he-IL",
        "hi",
        "hi-IN",
        "hr",
        "hr-BA",
        "hr-HR",
        "hu",
        "hu-HU",
        "hy",
        "hy-AM",
        "id",
        "id-ID",
        "is",
        "is-IS",
        "it",
        "it-CH",
        "it-IT",
        "ja",
        "ja-JP",
        "ka",
        "ka-GE",
        "kk",
        "kk-KZ",
        "kn",
        "kn-IN",
        "ko",
        "ko-KR",
        "kok",
        "kok-IN",
        "ky",
        "ky-KG",
        "lt",
        "lt-LT",
        "lv",
        "lv-LV",
        "mi",
        "mi-NZ",
        "mk",
        "mk-MK",
        "mn",
        "mn-MN",
        "mr",
        "mr-IN",
        "ms",
        "ms-BN",
        "ms-MY",
        "mt",
        "mt-MT",
        "nb",
        "nb-NO",
        "nl",
        "nl-BE",
        "nl-NL",
        "nn-NO",
        "ns",
        "ns-ZA",
        "pa",
        "pa-IN",
        "pl",
        "pl-PL",
        "ps",
        "ps-AR",
        "pt",
        "pt-BR",
        "pt-PT",
        "qu",
        "qu-BO",
        "qu-EC",
        "qu-PE",
        "ro",
        "ro-RO",
        "ru",
        "ru-RU",
        "sa",
        "sa-IN",
        "se",
        "se-FI",
        "se-NO",
        "se-SE",
        "sk",
        "sk-SK",
        "sl",
        "sl-SI",
        "sq",
        "sq-AL",
        "sr-BA",
        "sr-Cyrl-BA",
        "sr-SP",
        "sr-Cyrl-SP",
        "sv",
        "sv-FI",
        "sv-SE",
        "sw",
        "sw-KE",
        "syr",
        "syr-SY",
        "ta",
        "ta-IN",
        "te",
        "te-IN",
        "th",
        "th-TH",
        "tl",
        "tl-PH",
        "tn",
        "tn-ZA",
        "tr",
        "tr-TR",
        "tt",
        "tt-RU",
        "ts",
        "uk",
        "uk-UA",
        "ur",
        "ur-PK",
        "uz",
        "uz-UZ",
        "uz-Cyrl-UZ",
        "vi",
        "vi-VN",
        "xh",
        "xh-ZA",
        "zh",
        "zh-CN",
        "zh-HK",
        "zh-MO",
        "zh-SG",
        "zh-TW",
        "zu",
        "zu-ZA",
    ]
    .into_iter()
    .collect()
});

/// Separators accepted between the language subtag and the rest of the tag.
const SUBTAG_SEPARATORS: [char; 2] = ['-', '_'];

/// ロケールタグの検証エラー
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LocaleError {
    /// 空文字列
    #[error("Locale tag cannot be empty")]
    Empty,

    /// 既知のタグに含まれない
    #[error("Unknown locale tag '{0}'")]
    Unknown(String),
}

/// A locale tag from the known set (e.g. `en`, `fr-CA`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LocaleTag(String);

impl LocaleTag {
    /// # Errors
    /// - The tag is empty
    /// - The tag is not a known RFC 5646 code
    pub fn parse(tag: &str) -> Result<Self, LocaleError> {
        if tag.is_empty() {
            return Err(LocaleError::Empty);
        }
        if !LANGUAGE_CODES.contains(tag) {
            return Err(LocaleError::Unknown(tag.to_string()));
        }
        Ok(Self(tag.to_string()))
    }

    /// The tag as written in the config.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Language subtag, lower-cased (`fr-CA` -> `fr`).
    ///
    /// Only used to look up translation cost, never for identity.
    #[must_use]
    pub fn base_language(&self) -> String {
        base_language_code(&self.0)
    }
}

/// Substring before the first separator, lower-cased.
#[must_use]
pub fn base_language_code(tag: &str) -> String {
    tag.split(SUBTAG_SEPARATORS).next().unwrap_or_default().to_lowercase()
}

impl fmt::Display for LocaleTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for LocaleTag {
    type Err = LocaleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for LocaleTag {
    type Error = LocaleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<LocaleTag> for String {
    fn from(tag: LocaleTag) -> Self {
        tag.0
    }
}

impl AsRef<str> for LocaleTag {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Joins tags for log messages (`en, fr-CA`).
#[must_use]
pub fn join_tags(tags: &[LocaleTag]) -> String {
    tags.iter().map(LocaleTag::as_str).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("en")]
    #[case("fr-CA")]
    #[case("zh-TW")]
    #[case("sr-Cyrl-BA")]
    #[case("kok")]
    fn parse_known_tags(#[case] tag: &str) {
        let parsed = LocaleTag::parse(tag);

        assert_that!(parsed, ok(anything()));
        assert_that!(parsed.unwrap().as_str(), eq(tag));
    }

    #[rstest]
    #[case("", LocaleError::Empty)]
    #[case("xx", LocaleError::Unknown("xx".to_string()))]
    #[case("fr-ca", LocaleError::Unknown("fr-ca".to_string()))]
    #[case("en ", LocaleError::Unknown("en ".to_string()))]
    fn parse_rejects_invalid_tags(#[case] tag: &str, #[case] expected: LocaleError) {
        assert_that!(LocaleTag::parse(tag), err(eq(&expected)));
    }

    #[rstest]
    #[case("en", "en")]
    #[case("fr-CA", "fr")]
    #[case("EN_us", "en")]
    #[case("sr-Cyrl-BA", "sr")]
    #[case("", "")]
    fn base_language_code_takes_first_subtag(#[case] tag: &str, #[case] expected: &str) {
        assert_that!(base_language_code(tag), eq(expected));
    }

    #[rstest]
    fn deserialize_validates_tag() {
        let valid: std::result::Result<Vec<LocaleTag>, _> =
            serde_json::from_str(r#"["en", "de"]"#);
        let invalid: std::result::Result<Vec<LocaleTag>, _> =
            serde_json::from_str(r#"["en", "??"]"#);

        assert_that!(valid, ok(len(eq(2))));
        assert_that!(invalid, err(anything()));
    }

    #[rstest]
    fn join_tags_formats_for_logs() {
        let tags = vec![LocaleTag::parse("en").unwrap(), LocaleTag::parse("fr-CA").unwrap()];

        assert_that!(join_tags(&tags), eq("en, fr-CA"));
    }
}
