//! # API REST
//!
//! RPC-over-HTTP API for the midwifery clinic.
//!
//! Handles:
//! - procedure dispatch with axum (`/rpc/{procedure}`)
//! - the `{"result": {"data": ...}}` and `{"error": {...}}` envelopes
//! - OpenAPI/Swagger documentation and CORS
//!
//! Uses `api-shared` for contracts and validation, and `midwifery-core` for the operations.

#![warn(rust_2018_idioms)]

pub mod error;
pub mod routes;
pub mod rpc;

pub use error::{RpcError, RpcErrorCode};
pub use routes::{router, ApiDoc, AppState};
pub use rpc::{ProcedureKind, ProcedureRegistry};
