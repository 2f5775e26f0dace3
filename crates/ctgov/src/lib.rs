//! ClinicalTrials.gov boundary support.
//!
//! This crate provides the **wire model**, **HTTP client** and **translation helpers** for the
//! public ClinicalTrials.gov registry (API v2):
//! - [`wire`]: the nested study schema as the registry serves it
//! - [`ClinicalTrialsClient`]: paginated search, fetch-by-ID and total counts
//! - [`transform`]: flattening a study into a [`trial_types::Trial`]
//!
//! Nothing here scores or filters trials; that belongs to `trials-core`.

pub mod client;
pub mod transform;
pub mod wire;

pub use client::ClinicalTrialsClient;
pub use transform::{filter_options, to_trial};
pub use wire::{Study, StudiesPage};

/// Errors returned by the `ctgov` boundary crate.
#[derive(Debug, thiserror::Error)]
pub enum CtGovError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("registry request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("registry responded with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("registry response schema mismatch at {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Type alias for Results that can fail with a [`CtGovError`].
pub type CtGovResult<T> = Result<T, CtGovError>;
