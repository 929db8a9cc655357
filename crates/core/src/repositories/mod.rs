//! Operation handlers.
//!
//! One service per aggregate. Each service is a cheap `Clone` holding the shared configuration and
//! store; every mutating operation runs all of its checks and inserts inside one
//! [`ClinicStore::write`](crate::store::ClinicStore::write) closure.

pub mod accounts;
pub mod appointments;
pub mod catalog;
pub mod directory;
pub mod medical_records;
pub mod notifications;
