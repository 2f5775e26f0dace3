use crate::HealthRes;

/// Simple health service shared by the API surfaces
///
/// This service provides a standardised way to check that the trials backend is up.
/// It can be used both as a static utility and as an instantiated service.
#[derive(Clone)]
pub struct HealthService;

impl HealthService {
    /// Creates a new instance of HealthService.
    ///
    /// # Returns
    /// A new `HealthService` instance.
    pub fn new() -> Self {
        Self
    }

    /// Static method to check health without creating an instance
    ///
    /// # Returns
    /// A `HealthRes` indicating the backend is running.
    pub fn check_health() -> HealthRes {
        HealthRes {
            status: "OK".into(),
            message: "Backend is running".into(),
        }
    }
}

impl Default for HealthService {
    fn default() -> Self {
        Self::new()
    }
}
