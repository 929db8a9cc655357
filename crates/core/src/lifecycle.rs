//! Appointment status transitions.
//!
//! ```text
//! pending ──► confirmed ──► completed
//!    │            │
//!    └──► cancelled ◄──┘
//! ```
//!
//! `completed` and `cancelled` are terminal. Re-applying the current status is not a transition.

use crate::{ClinicError, ClinicResult};
use api_shared::AppointmentStatus;

pub trait Lifecycle: Copy {
    fn can_transition_to(self, next: Self) -> bool;
}

impl Lifecycle for AppointmentStatus {
    fn can_transition_to(self, next: Self) -> bool {
        use AppointmentStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed) | (Pending, Cancelled) | (Confirmed, Completed) | (Confirmed, Cancelled)
        )
    }
}

/// Fails with [`ClinicError::InvalidTransition`] unless `from -> to` is allowed.
pub fn ensure_transition(from: AppointmentStatus, to: AppointmentStatus) -> ClinicResult<()> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(ClinicError::InvalidTransition { from, to })
    }
}
