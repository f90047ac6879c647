//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. The intent is to avoid reading process-wide environment variables
//! while a resolution pass is running, which can lead to inconsistent behaviour in
//! multi-threaded runtimes and test harnesses.

use crate::constants::{DEFAULT_CACHE_MAX_ENTRIES, DEFAULT_CACHE_TTL, DEFAULT_LOOKUP_TIMEOUT};
use crate::{TerminologyError, TerminologyResult};
use ncp_types::LanguageCode;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    catalogue_path: Option<PathBuf>,
    default_language: LanguageCode,
    lookup_timeout: Duration,
    cache_ttl: Duration,
    cache_max_entries: usize,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns [`TerminologyError::InvalidInput`] if the lookup timeout is zero or the cache
    /// cannot hold a single entry.
    pub fn new(
        catalogue_path: Option<PathBuf>,
        default_language: LanguageCode,
        lookup_timeout: Duration,
        cache_ttl: Duration,
        cache_max_entries: usize,
    ) -> TerminologyResult<Self> {
        if lookup_timeout.is_zero() {
            return Err(TerminologyError::InvalidInput(
                "lookup_timeout must be greater than zero".into(),
            ));
        }

        if cache_max_entries == 0 {
            return Err(TerminologyError::InvalidInput(
                "cache_max_entries must be at least 1".into(),
            ));
        }

        Ok(Self {
            catalogue_path,
            default_language,
            lookup_timeout,
            cache_ttl,
            cache_max_entries,
        })
    }

    pub fn catalogue_path(&self) -> Option<&Path> {
        self.catalogue_path.as_deref()
    }

    pub fn default_language(&self) -> &LanguageCode {
        &self.default_language
    }

    pub fn lookup_timeout(&self) -> Duration {
        self.lookup_timeout
    }

    pub fn cache_ttl(&self) -> Duration {
        self.cache_ttl
    }

    pub fn cache_max_entries(&self) -> usize {
        self.cache_max_entries
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            catalogue_path: None,
            default_language: LanguageCode::default(),
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
            cache_ttl: DEFAULT_CACHE_TTL,
            cache_max_entries: DEFAULT_CACHE_MAX_ENTRIES,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse the default display language from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns the default language (`en`).
pub fn language_from_env_value(value: Option<String>) -> TerminologyResult<LanguageCode> {
    match non_blank(value) {
        Some(v) => Ok(LanguageCode::parse(v)?),
        None => Ok(LanguageCode::default()),
    }
}

/// Parse the catalogue lookup timeout (milliseconds) from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns [`DEFAULT_LOOKUP_TIMEOUT`].
pub fn lookup_timeout_from_env_value(value: Option<String>) -> TerminologyResult<Duration> {
    let Some(v) = non_blank(value) else {
        return Ok(DEFAULT_LOOKUP_TIMEOUT);
    };

    let millis = v.parse::<u64>().map_err(|e| {
        TerminologyError::InvalidInput(format!("invalid lookup timeout '{v}': {e}"))
    })?;

    Ok(Duration::from_millis(millis))
}

/// Parse the catalogue cache time-to-live (seconds) from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns [`DEFAULT_CACHE_TTL`]. A value of `0`
/// disables reuse of cached answers.
pub fn cache_ttl_from_env_value(value: Option<String>) -> TerminologyResult<Duration> {
    let Some(v) = non_blank(value) else {
        return Ok(DEFAULT_CACHE_TTL);
    };

    let secs = v
        .parse::<u64>()
        .map_err(|e| TerminologyError::InvalidInput(format!("invalid cache TTL '{v}': {e}")))?;

    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_documented_defaults() {
        let config = CoreConfig::default();
        assert_eq!(config.default_language().as_str(), "en");
        assert_eq!(config.lookup_timeout(), DEFAULT_LOOKUP_TIMEOUT);
        assert_eq!(config.cache_ttl(), DEFAULT_CACHE_TTL);
        assert_eq!(config.cache_max_entries(), DEFAULT_CACHE_MAX_ENTRIES);
        assert!(config.catalogue_path().is_none());
    }

    #[test]
    fn new_rejects_zero_timeout() {
        let err = CoreConfig::new(
            None,
            LanguageCode::default(),
            Duration::ZERO,
            DEFAULT_CACHE_TTL,
            10,
        )
        .expect_err("should reject zero timeout");
        assert!(
            matches!(err, TerminologyError::InvalidInput(msg) if msg.contains("lookup_timeout"))
        );
    }

    #[test]
    fn new_rejects_empty_cache() {
        let err = CoreConfig::new(
            None,
            LanguageCode::default(),
            DEFAULT_LOOKUP_TIMEOUT,
            DEFAULT_CACHE_TTL,
            0,
        )
        .expect_err("should reject zero-sized cache");
        assert!(
            matches!(err, TerminologyError::InvalidInput(msg) if msg.contains("cache_max_entries"))
        );
    }

    #[test]
    fn env_values_fall_back_to_defaults_when_blank() {
        assert_eq!(
            language_from_env_value(Some("  ".into()))
                .expect("default language")
                .as_str(),
            "en"
        );
        assert_eq!(
            lookup_timeout_from_env_value(None).expect("default timeout"),
            DEFAULT_LOOKUP_TIMEOUT
        );
        assert_eq!(
            cache_ttl_from_env_value(Some(String::new())).expect("default ttl"),
            DEFAULT_CACHE_TTL
        );
    }

    #[test]
    fn env_values_are_parsed() {
        assert_eq!(
            language_from_env_value(Some("pt_PT".into()))
                .expect("language")
                .as_str(),
            "pt-pt"
        );
        assert_eq!(
            lookup_timeout_from_env_value(Some("250".into())).expect("timeout"),
            Duration::from_millis(250)
        );
        assert_eq!(
            cache_ttl_from_env_value(Some(" 60 ".into())).expect("ttl"),
            Duration::from_secs(60)
        );
    }

    #[test]
    fn env_values_reject_garbage() {
        assert!(matches!(
            lookup_timeout_from_env_value(Some("soon".into())),
            Err(TerminologyError::InvalidInput(_))
        ));
        assert!(matches!(
            cache_ttl_from_env_value(Some("-1".into())),
            Err(TerminologyError::InvalidInput(_))
        ));
        assert!(matches!(
            language_from_env_value(Some("klingon".into())),
            Err(TerminologyError::Text(_))
        ));
    }
}
