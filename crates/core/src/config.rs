//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into core services, so no
//! handler reads process-wide environment variables while serving a request.

use crate::constants::{DEFAULT_PASSWORD_ITERATIONS, DEFAULT_SESSION_TTL_HOURS};
use crate::{ClinicError, ClinicResult};
use chrono::Duration;
use midwifery_types::EmailAddress;
use std::path::{Path, PathBuf};

/// Credentials for an administrator account created at startup when none exists yet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdminSeed {
    pub email: EmailAddress,
    pub password: String,
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    snapshot_path: Option<PathBuf>,
    password_iterations: u32,
    reject_past_bookings: bool,
    admin_seed: Option<AdminSeed>,
    session_ttl: Duration,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    pub fn new(
        snapshot_path: Option<PathBuf>,
        password_iterations: u32,
        reject_past_bookings: bool,
        admin_seed: Option<AdminSeed>,
    ) -> ClinicResult<Self> {
        if password_iterations == 0 {
            return Err(ClinicError::InvalidInput(
                "password_iterations must be greater than 0".into(),
            ));
        }

        if let Some(seed) = &admin_seed {
            if seed.password.chars().count() < api_shared::contracts::PASSWORD_MIN_LEN {
                return Err(ClinicError::InvalidInput(format!(
                    "admin password must contain at least {} characters",
                    api_shared::contracts::PASSWORD_MIN_LEN
                )));
            }
        }

        Ok(Self {
            snapshot_path,
            password_iterations,
            reject_past_bookings,
            admin_seed,
            session_ttl: Duration::hours(DEFAULT_SESSION_TTL_HOURS),
        })
    }

    /// Memory-only store, default hashing cost and session lifetime, past bookings allowed, no
    /// admin seed.
    pub fn in_memory() -> Self {
        Self {
            snapshot_path: None,
            password_iterations: DEFAULT_PASSWORD_ITERATIONS,
            reject_past_bookings: false,
            admin_seed: None,
            session_ttl: Duration::hours(DEFAULT_SESSION_TTL_HOURS),
        }
    }

    pub fn snapshot_path(&self) -> Option<&Path> {
        self.snapshot_path.as_deref()
    }

    pub fn password_iterations(&self) -> u32 {
        self.password_iterations
    }

    pub fn reject_past_bookings(&self) -> bool {
        self.reject_past_bookings
    }

    pub fn admin_seed(&self) -> Option<&AdminSeed> {
        self.admin_seed.as_ref()
    }

    /// How long a session token stays valid after it was issued.
    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }

    /// Returns a copy with a different hashing cost. Tests use this to keep PBKDF2 cheap.
    pub fn with_password_iterations(mut self, iterations: u32) -> ClinicResult<Self> {
        if iterations == 0 {
            return Err(ClinicError::InvalidInput(
                "password_iterations must be greater than 0".into(),
            ));
        }
        self.password_iterations = iterations;
        Ok(self)
    }

    pub fn with_session_ttl(mut self, ttl: Duration) -> ClinicResult<Self> {
        if ttl <= Duration::zero() {
            return Err(ClinicError::InvalidInput(
                "session_ttl must be greater than 0".into(),
            ));
        }
        self.session_ttl = ttl;
        Ok(self)
    }

    pub fn with_reject_past_bookings(mut self, reject: bool) -> Self {
        self.reject_past_bookings = reject;
        self
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse the snapshot file path from an optional string value.
///
/// If `value` is `None` or empty/whitespace, the store stays memory-only.
pub fn snapshot_path_from_env_value(value: Option<String>) -> Option<PathBuf> {
    trimmed(value).map(PathBuf::from)
}

/// Parse the PBKDF2 iteration count from an optional string value.
pub fn password_iterations_from_env_value(value: Option<String>) -> ClinicResult<u32> {
    match trimmed(value) {
        None => Ok(DEFAULT_PASSWORD_ITERATIONS),
        Some(v) => match v.parse::<u32>() {
            Ok(0) | Err(_) => Err(ClinicError::InvalidInput(format!(
                "CLINIC_PASSWORD_ITERATIONS must be a positive integer, got {v:?}"
            ))),
            Ok(n) => Ok(n),
        },
    }
}

/// Parse the session lifetime in whole hours from an optional string value.
pub fn session_ttl_from_env_value(value: Option<String>) -> ClinicResult<Duration> {
    match trimmed(value) {
        None => Ok(Duration::hours(DEFAULT_SESSION_TTL_HOURS)),
        Some(v) => v
            .parse::<i64>()
            .ok()
            .filter(|h| *h > 0)
            .and_then(Duration::try_hours)
            .ok_or_else(|| {
                ClinicError::InvalidInput(format!(
                    "CLINIC_SESSION_TTL_HOURS must be a positive number of hours, got {v:?}"
                ))
            }),
    }
}

/// Parse a boolean flag. Accepts `true/false`, `1/0`, `yes/no` and `on/off`; empty means `false`.
pub fn flag_from_env_value(name: &str, value: Option<String>) -> ClinicResult<bool> {
    match trimmed(value).map(|v| v.to_ascii_lowercase()).as_deref() {
        None => Ok(false),
        Some("true" | "1" | "yes" | "on") => Ok(true),
        Some("false" | "0" | "no" | "off") => Ok(false),
        Some(other) => Err(ClinicError::InvalidInput(format!(
            "{name} must be a boolean, got {other:?}"
        ))),
    }
}

/// Build the admin seed from optional email and password values.
///
/// Both must be set for a seed to exist; setting only one is a configuration error.
pub fn admin_seed_from_env_values(
    email: Option<String>,
    password: Option<String>,
) -> ClinicResult<Option<AdminSeed>> {
    match (trimmed(email), password.filter(|p| !p.is_empty())) {
        (None, None) => Ok(None),
        (Some(email), Some(password)) => {
            let email = EmailAddress::parse(&email)
                .map_err(|e| ClinicError::InvalidInput(format!("CLINIC_ADMIN_EMAIL: {e}")))?;
            Ok(Some(AdminSeed { email, password }))
        }
        _ => Err(ClinicError::InvalidInput(
            "CLINIC_ADMIN_EMAIL and CLINIC_ADMIN_PASSWORD must be set together".into(),
        )),
    }
}
