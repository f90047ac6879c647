//! Validated primitives shared across the NCP terminology crates.

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,

    /// The input was not a usable language tag
    #[error("invalid language tag: {0}")]
    InvalidLanguage(String),
}

/// A string type that guarantees non-empty content.
///
/// This type wraps a `String` and ensures it contains at least one non-whitespace character.
/// The input is automatically trimmed of leading and trailing whitespace during construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// The input is trimmed of leading and trailing whitespace. If the trimmed
    /// result is empty, an error is returned.
    ///
    /// # Arguments
    ///
    /// * `input` - Any type that can be converted to a string reference
    ///
    /// # Returns
    ///
    /// Returns `Ok(NonEmptyText)` if the trimmed input is non-empty,
    /// or `Err(TextError::Empty)` if it's empty or contains only whitespace.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Build from an optional string, treating `None` and blank text alike.
    pub fn from_optional(input: Option<&str>) -> Option<Self> {
        input.and_then(|s| Self::new(s).ok())
    }

    /// `input` if it has content, otherwise `fallback`. Never fails; a blank fallback
    /// shows as `"?"`.
    pub fn with_fallback(input: impl AsRef<str>, fallback: &str) -> Self {
        Self::new(input)
            .or_else(|_| Self::new(fallback))
            .unwrap_or_else(|_| Self("?".to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

/// A lower-cased BCP 47 style language tag such as `en`, `pt` or `pt-br`.
///
/// Only the primary subtag and an optional region/script subtag are accepted. The
/// catalogue keys its designations by these tags, so both sides are normalised the
/// same way.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LanguageCode(String);

impl LanguageCode {
    /// Parse and normalise a language tag. `_` is accepted as a separator.
    ///
    /// # Errors
    ///
    /// Returns [`TextError::Empty`] for blank input and [`TextError::InvalidLanguage`] when
    /// the primary subtag is not 2-3 ASCII letters or the tag has more than two subtags.
    pub fn parse(input: impl AsRef<str>) -> Result<Self, TextError> {
        let raw = input.as_ref().trim();
        if raw.is_empty() {
            return Err(TextError::Empty);
        }

        let normalised = raw.replace('_', "-").to_ascii_lowercase();
        let mut parts = normalised.split('-');

        let primary = parts.next().unwrap_or_default();
        if !(2..=3).contains(&primary.len()) || !primary.bytes().all(|b| b.is_ascii_lowercase()) {
            return Err(TextError::InvalidLanguage(raw.to_owned()));
        }

        if let Some(region) = parts.next() {
            if region.is_empty()
                || region.len() > 8
                || !region.bytes().all(|b| b.is_ascii_alphanumeric())
            {
                return Err(TextError::InvalidLanguage(raw.to_owned()));
            }
        }

        if parts.next().is_some() {
            return Err(TextError::InvalidLanguage(raw.to_owned()));
        }

        Ok(Self(normalised))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The primary subtag (`pt` for `pt-br`).
    pub fn primary(&self) -> &str {
        self.0.split('-').next().unwrap_or(&self.0)
    }

    /// Whether this tag carries a region or script subtag.
    pub fn has_subtag(&self) -> bool {
        self.0.contains('-')
    }
}

impl Default for LanguageCode {
    /// English, the display language used when none is configured.
    fn default() -> Self {
        Self("en".to_owned())
    }
}

impl std::fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for LanguageCode {
    type Err = TextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl serde::Serialize for LanguageCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for LanguageCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        LanguageCode::parse(&s).map_err(serde::de::Error::custom)
    }
}
