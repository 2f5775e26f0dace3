//! # Trials Core
//!
//! Core business logic for the cancer clinical-trials finder.
//!
//! This crate turns registry trials into something a patient can act on:
//! - Search, filtering, sorting and pagination over registry results
//! - Eligibility assessment: per-factor scoring, ranking, summaries and insights
//! - Autocomplete suggestions, nearby lookups and catalogue analytics
//! - A bounded, expiring store for completed assessments
//!
//! **No API concerns**: HTTP routing, OpenAPI and response envelopes belong in `api-rest` and
//! `api-shared`. Registry wire formats belong in `ctgov`.

pub mod analytics;
pub mod answers;
pub mod assessment;
pub mod assessment_id;
pub mod config;
pub mod constants;
pub mod error;
pub mod geo;
pub mod insights;
pub mod questions;
pub mod ranking;
pub mod scoring;
pub mod search;
pub mod service;
pub mod source;
pub mod store;
pub mod suggestions;
pub mod validation;

pub use answers::{AnswerField, AnswerValue, Answers};
pub use assessment::AssessmentRecord;
pub use assessment_id::AssessmentId;
pub use config::CoreConfig;
pub use error::{TrialsError, TrialsResult};
pub use ranking::ScoredTrial;
pub use service::{TrialDetail, TrialsService};
pub use source::{StaticSource, TrialSource};
