use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Access log entry recording the outcome of one session.
///
/// Logs are written for enrollments and verifications alike, granted or
/// not, and are never updated. The secret code is never recorded.
///
/// # Fields
///
/// * `identity` - Identity involved, when one was known (claimed at
///   enrollment or matched at verification)
/// * `workflow` - `register` or `unlock`; `None` for sessions that never
///   selected one
/// * `outcome` - Outcome kind, see [`AccessOutcome`]
/// * `granted` - Whether the door was unlocked
/// * `message` - Message shown to the visitor
/// * `timestamp` - When the session ended
/// * `created_at` - When the row was written
///
/// # Examples
///
/// ```
/// use facegate_storage::models::{AccessLog, AccessOutcome};
/// use chrono::Utc;
///
/// let log = AccessLog::new(
///     Some("alice".to_string()),
///     Some("unlock".to_string()),
///     AccessOutcome::Granted,
///     "PIN verified. The door is unlocked",
///     Utc::now(),
/// );
///
/// assert!(log.granted);
/// assert_eq!(log.get_outcome(), Some(AccessOutcome::Granted));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AccessLog {
    /// Auto-increment primary key
    pub id: i64,
    pub identity: Option<String>,
    pub workflow: Option<String>,
    pub outcome: String,
    pub granted: bool,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl AccessLog {
    /// Create a new access log entry
    pub fn new(
        identity: Option<String>,
        workflow: Option<String>,
        outcome: AccessOutcome,
        message: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: 0,
            identity,
            workflow,
            outcome: outcome.as_str().to_string(),
            granted: outcome.is_granted(),
            message: message.into(),
            timestamp,
            created_at: timestamp,
        }
    }

    /// Parse the stored outcome kind.
    pub fn get_outcome(&self) -> Option<AccessOutcome> {
        AccessOutcome::parse(&self.outcome)
    }
}

/// Kind of session outcome recorded in the access log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessOutcome {
    /// Face matched and code verified; door unlocked.
    Granted,
    /// Face matched but the code was wrong.
    Denied,
    /// No enrolled face within the match threshold.
    NoMatch,
    /// No face in the frame.
    NoFace,
    /// More than one face in the frame.
    MultipleFaces,
    /// Verification attempted with nothing enrolled.
    NoFacesRegistered,
    /// Code entry cancelled or failed.
    Cancelled,
    /// New credential written.
    Enrolled,
    /// Enrollment refused because the identity exists.
    DuplicateIdentity,
    /// Workflow selection or identity input rejected.
    InvalidInput,
    /// Presence ignored during a lockout.
    LockedOut,
    /// A device or store failure aborted the session.
    Error,
}

impl AccessOutcome {
    pub const ALL: [AccessOutcome; 12] = [
        Self::Granted,
        Self::Denied,
        Self::NoMatch,
        Self::NoFace,
        Self::MultipleFaces,
        Self::NoFacesRegistered,
        Self::Cancelled,
        Self::Enrolled,
        Self::DuplicateIdentity,
        Self::InvalidInput,
        Self::LockedOut,
        Self::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Granted => "granted",
            Self::Denied => "denied",
            Self::NoMatch => "no_match",
            Self::NoFace => "no_face",
            Self::MultipleFaces => "multiple_faces",
            Self::NoFacesRegistered => "no_faces_registered",
            Self::Cancelled => "cancelled",
            Self::Enrolled => "enrolled",
            Self::DuplicateIdentity => "duplicate_identity",
            Self::InvalidInput => "invalid_input",
            Self::LockedOut => "locked_out",
            Self::Error => "error",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|o| o.as_str() == value)
    }

    /// Only [`Granted`](Self::Granted) unlocks the door.
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted)
    }
}

impl std::fmt::Display for AccessOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(AccessOutcome::Granted, "granted")]
    #[case(AccessOutcome::NoMatch, "no_match")]
    #[case(AccessOutcome::NoFacesRegistered, "no_faces_registered")]
    #[case(AccessOutcome::DuplicateIdentity, "duplicate_identity")]
    #[case(AccessOutcome::LockedOut, "locked_out")]
    fn test_stored_outcome_names(#[case] outcome: AccessOutcome, #[case] stored: &str) {
        assert_eq!(outcome.as_str(), stored);
        assert_eq!(AccessOutcome::parse(stored), Some(outcome));
    }

    #[rstest]
    #[case("")]
    #[case("Granted")]
    #[case(" granted")]
    #[case("no-match")]
    fn test_parse_rejects_unknown_names(#[case] value: &str) {
        assert_eq!(AccessOutcome::parse(value), None);
    }

    #[test]
    fn test_outcome_names_roundtrip() {
        for outcome in AccessOutcome::ALL {
            assert_eq!(AccessOutcome::parse(outcome.as_str()), Some(outcome));
        }
        assert_eq!(AccessOutcome::parse("maybe"), None);
    }

    #[test]
    fn test_only_granted_is_granted() {
        let granted: Vec<_> = AccessOutcome::ALL
            .into_iter()
            .filter(AccessOutcome::is_granted)
            .collect();
        assert_eq!(granted, vec![AccessOutcome::Granted]);
    }

    #[test]
    fn test_new_sets_granted_from_outcome() {
        let log = AccessLog::new(None, None, AccessOutcome::InvalidInput, "Invalid option", Utc::now());
        assert!(!log.granted);
        assert_eq!(log.outcome, "invalid_input");
        assert_eq!(log.identity, None);
    }
}
