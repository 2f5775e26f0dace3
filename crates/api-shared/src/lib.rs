//! # API Shared
//!
//! Shared utilities and definitions for the trials APIs.
//!
//! Contains:
//! - Shared services like `HealthService`
//! - Response bodies used by every surface (`HealthRes`, `ErrorRes`)
//!
//! Used by `api-rest` and the server binary.

pub mod health;
pub mod responses;

pub use health::HealthService;
pub use responses::{ErrorRes, HealthRes};
