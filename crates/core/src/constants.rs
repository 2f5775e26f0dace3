//! Constants used throughout the trials core crate.
//!
//! Defaults for runtime configuration live here alongside the fixed limits of the matching,
//! search and suggestion features, so that every module agrees on the same values.

/// Default ClinicalTrials.gov v2 studies endpoint.
pub const DEFAULT_CTGOV_BASE_URL: &str = "https://clinicaltrials.gov/api/v2/studies";

/// Default number of studies requested per registry page.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Default maximum number of registry pages fetched for one search.
pub const DEFAULT_MAX_PAGES: usize = 20;

/// Default timeout for one registry request, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default lifetime of a stored assessment, in seconds (24 hours).
pub const DEFAULT_ASSESSMENT_TTL_SECS: u64 = 86_400;

/// Default maximum number of stored assessments.
pub const DEFAULT_ASSESSMENT_CAPACITY: usize = 1_000;

/// Default number of catalogue trials scored by one assessment.
pub const DEFAULT_CANDIDATE_LIMIT: usize = 100;

/// Default number of catalogue trials used for analytics and nearby lookups.
pub const DEFAULT_CATALOGUE_WINDOW: usize = 300;

/// Registry query used for assessments, analytics, statistics and nearby lookups.
pub const CATALOGUE_TERM: &str = "cancer";

/// Registry query used when a search carries no text criteria.
pub const DEFAULT_SEARCH_TERM: &str = "clinical trial";

/// Smallest prefetch window for a search.
pub const MIN_PREFETCH_WINDOW: usize = 100;

/// Default page size for `/trials/search`.
pub const DEFAULT_SEARCH_LIMIT: u32 = 100;

/// Default page size for `/trials`.
pub const DEFAULT_LIST_LIMIT: u32 = 1_000;

/// Trials scoring at least this much are recommended as top matches.
pub const TOP_MATCH_MIN_SCORE: u8 = 40;

pub const TOP_MATCH_LIMIT: usize = 5;
pub const OTHER_TRIAL_LIMIT: usize = 3;

/// Number of studies sampled for filter options and statistics.
pub const SAMPLE_SIZE: usize = 100;

/// Number of registry studies inspected for dynamic search suggestions.
pub const SUGGESTION_SAMPLE_SIZE: usize = 50;
pub const SUGGESTION_LIMIT: usize = 10;
pub const SUGGESTION_MIN_QUERY_CHARS: usize = 2;

pub const DEFAULT_RADIUS_MILES: f64 = 100.0;
pub const DEFAULT_NEARBY_LIMIT: usize = 20;

/// Mean Earth radius in miles.
pub const EARTH_RADIUS_MILES: f64 = 3_958.8;

/// Placeholder the registry adapter uses for a study without sites.
pub const NO_LOCATION: &str = "Location not specified";
