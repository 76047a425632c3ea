//! Short shareable map identifiers.

use core::fmt;

use rand::Rng;
use rand::distr::Alphanumeric;
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`MapId`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MapIdError {
    /// The input string is empty.
    #[error("map id cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("map id must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains something other than ASCII letters and digits.
    #[error("map id may only contain ASCII letters and digits")]
    InvalidCharacter,
}

/// Identifier of a shared map, used verbatim in share URLs (`/m/{id}`).
///
/// ## Constraints
///
/// - Length: 1-32 characters
/// - ASCII letters and digits only (URL safe without escaping)
///
/// ## Examples
///
/// ```
/// use pinmap_core::MapId;
///
/// assert!(MapId::parse("aB3xY9").is_ok());
/// assert!(MapId::parse("").is_err());
/// assert!(MapId::parse("../etc").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct MapId(String);

impl MapId {
    /// Maximum length of a map id.
    pub const MAX_LENGTH: usize = 32;

    /// Length of generated ids unless configured otherwise.
    pub const DEFAULT_LENGTH: usize = 6;

    /// Parse a `MapId` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, longer than 32 characters, or
    /// contains anything other than ASCII alphanumerics.
    pub fn parse(s: &str) -> Result<Self, MapIdError> {
        if s.is_empty() {
            return Err(MapIdError::Empty);
        }

        if s.len() > Self::MAX_LENGTH {
            return Err(MapIdError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        if !s.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(MapIdError::InvalidCharacter);
        }

        Ok(Self(s.to_owned()))
    }

    /// Generate a random id of `len` alphanumeric characters.
    ///
    /// `len` is clamped to `1..=MAX_LENGTH`. No uniqueness check is made; the
    /// store rejects duplicates.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R, len: usize) -> Self {
        let len = len.clamp(1, Self::MAX_LENGTH);
        Self(
            (0..len)
                .map(|_| char::from(rng.sample(Alphanumeric)))
                .collect(),
        )
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the id and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for MapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for MapId {
    type Err = MapIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for MapId {
    type Error = MapIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<MapId> for String {
    fn from(id: MapId) -> Self {
        id.0
    }
}

impl AsRef<str> for MapId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// SQLx support (with postgres feature)
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for MapId {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for MapId {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        // Database values are assumed valid
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for MapId {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}
