//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. The intent is to avoid reading process-wide environment variables
//! during request handling, which can lead to inconsistent behaviour in multi-threaded runtimes
//! and test harnesses.

use crate::constants::{
    DEFAULT_ASSESSMENT_CAPACITY, DEFAULT_ASSESSMENT_TTL_SECS, DEFAULT_CANDIDATE_LIMIT,
    DEFAULT_CATALOGUE_WINDOW, DEFAULT_CTGOV_BASE_URL, DEFAULT_MAX_PAGES, DEFAULT_PAGE_SIZE,
    DEFAULT_TIMEOUT_SECS,
};
use crate::{TrialsError, TrialsResult};
use std::str::FromStr;
use std::time::Duration;

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    ctgov_base_url: String,
    page_size: usize,
    max_pages: usize,
    request_timeout: Duration,
    assessment_ttl: Duration,
    assessment_capacity: usize,
    candidate_limit: usize,
    catalogue_window: usize,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            ctgov_base_url: DEFAULT_CTGOV_BASE_URL.into(),
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            assessment_ttl: Duration::from_secs(DEFAULT_ASSESSMENT_TTL_SECS),
            assessment_capacity: DEFAULT_ASSESSMENT_CAPACITY,
            candidate_limit: DEFAULT_CANDIDATE_LIMIT,
            catalogue_window: DEFAULT_CATALOGUE_WINDOW,
        }
    }
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns [`TrialsError::InvalidInput`] if the base URL is blank, the page size is outside
    /// `1..=1000`, or any count or duration is zero.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        ctgov_base_url: String,
        page_size: usize,
        max_pages: usize,
        request_timeout: Duration,
        assessment_ttl: Duration,
        assessment_capacity: usize,
        candidate_limit: usize,
        catalogue_window: usize,
    ) -> TrialsResult<Self> {
        if ctgov_base_url.trim().is_empty() {
            return Err(TrialsError::InvalidInput(
                "CTGOV_BASE_URL cannot be empty".into(),
            ));
        }
        if !(1..=ctgov::client::MAX_PAGE_SIZE).contains(&page_size) {
            return Err(TrialsError::InvalidInput(format!(
                "CTGOV_PAGE_SIZE must be between 1 and {}",
                ctgov::client::MAX_PAGE_SIZE
            )));
        }

        let positive = [
            ("CTGOV_MAX_PAGES", max_pages),
            ("ASSESSMENT_CAPACITY", assessment_capacity),
            ("ASSESSMENT_CANDIDATE_LIMIT", candidate_limit),
            ("CATALOGUE_WINDOW", catalogue_window),
        ];
        if let Some((name, _)) = positive.iter().find(|(_, value)| *value == 0) {
            return Err(TrialsError::InvalidInput(format!(
                "{name} must be at least 1"
            )));
        }
        if request_timeout.is_zero() {
            return Err(TrialsError::InvalidInput(
                "CTGOV_TIMEOUT_SECS must be at least 1".into(),
            ));
        }
        if assessment_ttl.is_zero() {
            return Err(TrialsError::InvalidInput(
                "ASSESSMENT_TTL_SECS must be at least 1".into(),
            ));
        }

        Ok(Self {
            ctgov_base_url: ctgov_base_url.trim().to_owned(),
            page_size,
            max_pages,
            request_timeout,
            assessment_ttl,
            assessment_capacity,
            candidate_limit,
            catalogue_window,
        })
    }

    /// Resolve configuration from a key lookup, falling back to defaults for unset keys.
    ///
    /// The server passes `std::env::var`; tests pass a map so that they never touch the process
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns [`TrialsError::InvalidInput`] if a value cannot be parsed or fails validation.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> TrialsResult<Self> {
        let base_url = lookup("CTGOV_BASE_URL")
            .map(|v| v.trim().to_owned())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_CTGOV_BASE_URL.into());

        Self::new(
            base_url,
            parse_env_value("CTGOV_PAGE_SIZE", lookup("CTGOV_PAGE_SIZE"), DEFAULT_PAGE_SIZE)?,
            parse_env_value("CTGOV_MAX_PAGES", lookup("CTGOV_MAX_PAGES"), DEFAULT_MAX_PAGES)?,
            Duration::from_secs(parse_env_value(
                "CTGOV_TIMEOUT_SECS",
                lookup("CTGOV_TIMEOUT_SECS"),
                DEFAULT_TIMEOUT_SECS,
            )?),
            Duration::from_secs(parse_env_value(
                "ASSESSMENT_TTL_SECS",
                lookup("ASSESSMENT_TTL_SECS"),
                DEFAULT_ASSESSMENT_TTL_SECS,
            )?),
            parse_env_value(
                "ASSESSMENT_CAPACITY",
                lookup("ASSESSMENT_CAPACITY"),
                DEFAULT_ASSESSMENT_CAPACITY,
            )?,
            parse_env_value(
                "ASSESSMENT_CANDIDATE_LIMIT",
                lookup("ASSESSMENT_CANDIDATE_LIMIT"),
                DEFAULT_CANDIDATE_LIMIT,
            )?,
            parse_env_value(
                "CATALOGUE_WINDOW",
                lookup("CATALOGUE_WINDOW"),
                DEFAULT_CATALOGUE_WINDOW,
            )?,
        )
    }

    pub fn ctgov_base_url(&self) -> &str {
        &self.ctgov_base_url
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn max_pages(&self) -> usize {
        self.max_pages
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn assessment_ttl(&self) -> Duration {
        self.assessment_ttl
    }

    pub fn assessment_capacity(&self) -> usize {
        self.assessment_capacity
    }

    pub fn candidate_limit(&self) -> usize {
        self.candidate_limit
    }

    pub fn catalogue_window(&self) -> usize {
        self.catalogue_window
    }
}

/// Parse a numeric setting from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns `default`.
pub fn parse_env_value<T: FromStr>(name: &str, value: Option<String>, default: T) -> TrialsResult<T> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    match value {
        None => Ok(default),
        Some(raw) => raw.parse::<T>().map_err(|_| {
            TrialsError::InvalidInput(format!("{name} has an invalid value: '{raw}'"))
        }),
    }
}
