//! # API Shared
//!
//! Shared definitions for the midwifery clinic API.
//!
//! Contains:
//! - The domain model (`model`): entity records and closed enums, as sent over the wire
//! - Validation contracts (`contracts`, `validation`): per-procedure input shapes and constraints
//! - Shared services like `HealthService`
//! - Authentication header helpers (`auth`)
//!
//! Used by `midwifery-core` and `api-rest`.

pub mod auth;
pub mod contracts;
pub mod health;
pub mod model;
pub mod validation;

pub use health::{HealthRes, HealthService};
pub use model::*;
pub use validation::{FieldIssue, IssueKind, Validate, ValidationErrors, Validator};
