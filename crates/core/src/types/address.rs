//! Address normalization.
//!
//! Addresses typed by people (especially Japanese addresses pasted from
//! different IMEs) arrive with ideographic spaces, full-width digits and a zoo
//! of dash characters. [`normalize`] folds those into one canonical text form
//! which is used both as the geocode cache key and as the address persisted
//! with each pin.

use core::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Ideographic (full-width) space, U+3000.
const IDEOGRAPHIC_SPACE: char = '\u{3000}';

/// Full-width digit zero, U+FF10. Digits one through nine follow contiguously.
const FULLWIDTH_ZERO: u32 = 0xFF10;

/// Dash-like characters folded into an ASCII hyphen.
const DASHES: [char; 3] = [
    '\u{2212}', // minus sign
    '\u{2013}', // en dash
    '\u{2014}', // em dash
];

/// An address in canonical form.
///
/// The only way to build one is through [`normalize`] (or the `From`
/// conversions, which call it), so a value of this type is always a valid
/// cache key.
///
/// ## Examples
///
/// ```
/// use pinmap_core::normalize;
///
/// let addr = normalize("\u{3000}東京都千代田区\u{FF11}\u{2212}\u{FF11} ");
/// assert_eq!(addr.as_str(), "東京都千代田区1-1");
/// ```
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct NormalizedAddress(String);

/// Canonicalize raw address text.
///
/// Steps, in order:
/// 1. ideographic space → ASCII space
/// 2. full-width digits `０`-`９` → ASCII `0`-`9`
/// 3. minus sign, en dash, em dash → ASCII `-`
/// 4. trim leading and trailing whitespace
///
/// Pure and total. `normalize(normalize(x)) == normalize(x)` for every input.
#[must_use]
pub fn normalize(raw: &str) -> NormalizedAddress {
    let folded: String = raw.chars().map(canonical_char).collect();
    NormalizedAddress(folded.trim().to_owned())
}

fn canonical_char(c: char) -> char {
    match c {
        IDEOGRAPHIC_SPACE => ' ',
        '\u{FF10}'..='\u{FF19}' => char::from_digit(u32::from(c) - FULLWIDTH_ZERO, 10).unwrap_or(c),
        c if DASHES.contains(&c) => '-',
        c => c,
    }
}

impl NormalizedAddress {
    /// Returns the address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the address and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Whether nothing is left after normalization.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for NormalizedAddress {
    fn from(raw: &str) -> Self {
        normalize(raw)
    }
}

impl From<String> for NormalizedAddress {
    fn from(raw: String) -> Self {
        normalize(&raw)
    }
}

impl<'de> Deserialize<'de> for NormalizedAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::from)
    }
}

impl fmt::Display for NormalizedAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NormalizedAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// SQLx support (with postgres feature)
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for NormalizedAddress {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for NormalizedAddress {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        // Only normalized text is ever written, so the stored form is trusted
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for NormalizedAddress {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_ideographic_space_becomes_ascii() {
        assert_eq!(normalize("東京都\u{3000}港区").as_str(), "東京都 港区");
    }

    #[test]
    fn test_fullwidth_digits() {
        assert_eq!(
            normalize("\u{FF10}\u{FF11}\u{FF12}\u{FF13}\u{FF14}\u{FF15}\u{FF16}\u{FF17}\u{FF18}\u{FF19}")
                .as_str(),
            "0123456789"
        );
    }

    #[test]
    fn test_dashes_unified() {
        assert_eq!(normalize("1\u{2212}2\u{2013}3\u{2014}4-5").as_str(), "1-2-3-4-5");
    }

    #[test]
    fn test_trims_after_folding() {
        // Leading ideographic space is folded first, then trimmed away
        assert_eq!(normalize("\u{3000} 渋谷区 \u{3000}").as_str(), "渋谷区");
        assert!(normalize(" \u{3000}\t").is_empty());
    }

    #[test]
    fn test_home_search_scenario() {
        let addr = normalize("東京都千代田区\u{FF11}\u{2212}\u{FF11}");
        assert_eq!(addr.as_str(), "東京都千代田区1-1");
        assert!(addr.as_str().ends_with("1-1"));
    }

    #[test]
    fn test_other_characters_untouched() {
        // Full-width letters and the katakana long vowel mark are not dashes
        assert_eq!(normalize("ＡＢＣ ビーチー").as_str(), "ＡＢＣ ビーチー");
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "",
            "   ",
            "\u{3000}",
            "東京都千代田区\u{FF11}\u{2212}\u{FF11}",
            "\u{3000}大阪府大阪市北区梅田\u{FF13}\u{2013}\u{FF11}\u{2014}\u{FF11}\u{3000}",
            "1600 Amphitheatre Pkwy, Mountain View",
            "\u{2212}\u{2212}\u{3000}\u{FF10}",
            "\t\n京都市 \u{3000}",
        ];
        for input in inputs {
            let once = normalize(input);
            let twice = normalize(once.as_str());
            assert_eq!(once, twice, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn test_from_conversions_normalize() {
        let a: NormalizedAddress = "\u{FF12}\u{2212}\u{FF13}".into();
        let b = NormalizedAddress::from(String::from(" 2-3 "));
        assert_eq!(a, b);
    }

    #[test]
    fn test_serde_normalizes_on_deserialize() {
        let addr: NormalizedAddress = serde_json::from_str("\"\u{3000}\u{FF17}\u{2014}\u{FF17}\"").unwrap();
        assert_eq!(addr.as_str(), "7-7");
        assert_eq!(serde_json::to_string(&addr).unwrap(), "\"7-7\"");
    }
}
