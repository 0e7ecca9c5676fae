//! Session outcomes.
//!
//! Every presence session ends in exactly one [`SessionOutcome`]. The
//! controller maps it to an operator message, an access log entry and the
//! lockout counter.

use facegate_core::constants::{
    MSG_ACCESS_GRANTED, MSG_ALREADY_ENROLLED, MSG_ENROLLED, MSG_INCORRECT_PIN,
    MSG_INVALID_IDENTITY, MSG_INVALID_OPTION, MSG_LOCKED_OUT, MSG_MULTIPLE_FACES, MSG_NO_FACE,
    MSG_NO_FACES_REGISTERED, MSG_NO_MATCH, MSG_PIN_ENTRY_FAILED, MSG_SESSION_ABORTED,
};
use facegate_core::{Identity, MatchResult};
use facegate_storage::AccessOutcome;

use crate::code_entry::CancelReason;

/// How a presence session ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    /// Face matched and code correct; the actuator was pulsed.
    Granted { identity: Identity, distance: f64 },

    /// Face matched but the code was wrong, or no code is stored.
    Denied { identity: Identity },

    /// Closest enrolled face was not below the threshold.
    NoMatch { best: Option<MatchResult> },

    NoFace,

    /// More than one face under the reject-multiple policy.
    MultipleFaces,

    NoFacesRegistered,

    /// Code entry after a successful match was cancelled.
    CodeEntryCancelled {
        identity: Identity,
        reason: CancelReason,
    },

    /// A credential was written.
    Enrolled { identity: Identity, replaced: bool },

    /// Enrollment named an existing identity under the reject policy.
    DuplicateIdentity { identity: Identity },

    InvalidSelection { input: String },

    InvalidIdentity { input: String },

    /// Presence ignored while locked out.
    LockedOut,

    /// Device, store or console failure.
    Aborted { reason: String },
}

impl SessionOutcome {
    /// Operator-facing message.
    pub fn message(&self) -> String {
        match self {
            Self::Granted { .. } => MSG_ACCESS_GRANTED.to_string(),
            Self::Denied { .. } => MSG_INCORRECT_PIN.to_string(),
            Self::NoMatch { .. } => MSG_NO_MATCH.to_string(),
            Self::NoFace => MSG_NO_FACE.to_string(),
            Self::MultipleFaces => MSG_MULTIPLE_FACES.to_string(),
            Self::NoFacesRegistered => MSG_NO_FACES_REGISTERED.to_string(),
            Self::CodeEntryCancelled { .. } => MSG_PIN_ENTRY_FAILED.to_string(),
            Self::Enrolled { identity, .. } => format!("{MSG_ENROLLED} ({identity})"),
            Self::DuplicateIdentity { identity } => format!("{MSG_ALREADY_ENROLLED}: {identity}"),
            Self::InvalidSelection { .. } => MSG_INVALID_OPTION.to_string(),
            Self::InvalidIdentity { .. } => MSG_INVALID_IDENTITY.to_string(),
            Self::LockedOut => MSG_LOCKED_OUT.to_string(),
            Self::Aborted { reason } => format!("{MSG_SESSION_ABORTED}: {reason}"),
        }
    }

    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted { .. })
    }

    /// Whether this counts toward the verification lockout.
    pub fn is_authentication_failure(&self) -> bool {
        matches!(
            self,
            Self::Denied { .. } | Self::NoMatch { .. } | Self::CodeEntryCancelled { .. }
        )
    }

    /// Audit log classification.
    pub fn access_outcome(&self) -> AccessOutcome {
        match self {
            Self::Granted { .. } => AccessOutcome::Granted,
            Self::Denied { .. } => AccessOutcome::Denied,
            Self::NoMatch { .. } => AccessOutcome::NoMatch,
            Self::NoFace => AccessOutcome::NoFace,
            Self::MultipleFaces => AccessOutcome::MultipleFaces,
            Self::NoFacesRegistered => AccessOutcome::NoFacesRegistered,
            Self::CodeEntryCancelled { .. } => AccessOutcome::Cancelled,
            Self::Enrolled { .. } => AccessOutcome::Enrolled,
            Self::DuplicateIdentity { .. } => AccessOutcome::DuplicateIdentity,
            Self::InvalidSelection { .. } | Self::InvalidIdentity { .. } => {
                AccessOutcome::InvalidInput
            }
            Self::LockedOut => AccessOutcome::LockedOut,
            Self::Aborted { .. } => AccessOutcome::Error,
        }
    }

    /// Identity involved, if one was established.
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Granted { identity, .. }
            | Self::Denied { identity }
            | Self::CodeEntryCancelled { identity, .. }
            | Self::Enrolled { identity, .. }
            | Self::DuplicateIdentity { identity } => Some(identity),
            Self::NoMatch { best } => best.as_ref().map(|m| &m.identity),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn alice() -> Identity {
        Identity::new("alice").unwrap()
    }

    #[rstest]
    #[case(SessionOutcome::Granted { identity: alice(), distance: 0.1 }, AccessOutcome::Granted)]
    #[case(SessionOutcome::Denied { identity: alice() }, AccessOutcome::Denied)]
    #[case(SessionOutcome::NoMatch { best: None }, AccessOutcome::NoMatch)]
    #[case(SessionOutcome::NoFace, AccessOutcome::NoFace)]
    #[case(SessionOutcome::NoFacesRegistered, AccessOutcome::NoFacesRegistered)]
    #[case(SessionOutcome::InvalidSelection { input: "open".into() }, AccessOutcome::InvalidInput)]
    #[case(SessionOutcome::Aborted { reason: "camera".into() }, AccessOutcome::Error)]
    fn test_access_outcome(#[case] outcome: SessionOutcome, #[case] expected: AccessOutcome) {
        assert_eq!(outcome.access_outcome(), expected);
        assert_eq!(outcome.is_granted(), expected.is_granted());
    }

    #[test]
    fn test_authentication_failures() {
        assert!(SessionOutcome::Denied { identity: alice() }.is_authentication_failure());
        assert!(SessionOutcome::NoMatch { best: None }.is_authentication_failure());
        assert!(
            SessionOutcome::CodeEntryCancelled {
                identity: alice(),
                reason: CancelReason::CancelKey,
            }
            .is_authentication_failure()
        );
        assert!(!SessionOutcome::NoFace.is_authentication_failure());
        assert!(!SessionOutcome::NoFacesRegistered.is_authentication_failure());
    }

    #[test]
    fn test_identity_of_near_miss() {
        let outcome = SessionOutcome::NoMatch {
            best: Some(MatchResult::new(alice(), 0.5)),
        };
        assert_eq!(outcome.identity(), Some(&alice()));
        assert_eq!(SessionOutcome::NoFace.identity(), None);
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            SessionOutcome::NoFacesRegistered.message(),
            "No faces have been registered yet"
        );
        assert!(
            SessionOutcome::Enrolled {
                identity: alice(),
                replaced: false
            }
            .message()
            .contains("alice")
        );
    }
}
