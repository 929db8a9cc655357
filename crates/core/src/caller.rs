use api_shared::{Id, UserRole};

/// Identity attached to a request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Caller {
    /// No `Authorization` header was sent.
    Anonymous,
    User {
        user_id: Id,
        role: UserRole,
        /// Profile id when `role` is `patient`.
        patient_id: Option<Id>,
    },
}

impl Caller {
    pub fn user_id(&self) -> Option<Id> {
        match self {
            Caller::Anonymous => None,
            Caller::User { user_id, .. } => Some(*user_id),
        }
    }

    /// Patients see only their own medical records; every other caller sees all of them.
    pub fn can_view_records_of(&self, patient_id: Id) -> bool {
        match self {
            Caller::User {
                role: UserRole::Patient,
                patient_id: own,
                ..
            } => *own == Some(patient_id),
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patient_caller_is_scoped_to_own_records() {
        let caller = Caller::User {
            user_id: 3,
            role: UserRole::Patient,
            patient_id: Some(7),
        };
        assert!(caller.can_view_records_of(7));
        assert!(!caller.can_view_records_of(8));
    }

    #[test]
    fn test_staff_and_anonymous_callers_are_unscoped() {
        let midwife = Caller::User {
            user_id: 4,
            role: UserRole::Midwife,
            patient_id: None,
        };
        assert!(midwife.can_view_records_of(8));
        assert!(Caller::Anonymous.can_view_records_of(8));
        assert_eq!(Caller::Anonymous.user_id(), None);
        assert_eq!(midwife.user_id(), Some(4));
    }
}
