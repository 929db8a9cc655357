use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Liveness probe payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    /// Always `"ok"` while the process is serving requests.
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

/// Simple health service that can be used by both the RPC procedure and the plain HTTP route
///
/// This service provides a standardised way to check the health status of the clinic API.
#[derive(Clone)]
pub struct HealthService;

impl HealthService {
    /// Creates a new instance of HealthService.
    pub fn new() -> Self {
        Self
    }

    /// Static method to check health without creating an instance
    ///
    /// # Returns
    /// A `HealthRes` with status `"ok"` and the current time.
    pub fn check_health() -> HealthRes {
        HealthRes {
            status: "ok".into(),
            timestamp: Utc::now(),
        }
    }
}

impl Default for HealthService {
    fn default() -> Self {
        Self::new()
    }
}
