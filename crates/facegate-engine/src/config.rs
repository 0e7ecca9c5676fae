//! Engine configuration.
//!
//! Defaults reproduce the reference door controller: 50 cm presence
//! threshold polled every second, six-digit codes with a 300 ms settle
//! interval and no entry timeout, a 0.4 match threshold on the first
//! detected face, duplicate enrollments rejected and no lockout.

use std::time::Duration;

use facegate_core::constants::{
    DEFAULT_CODE_LENGTH, DEFAULT_FAILURE_HOLD_MS, DEFAULT_IDLE_INTERVAL_MS, DEFAULT_MATCH_THRESHOLD,
    DEFAULT_PROXIMITY_THRESHOLD_CM, DEFAULT_SETTLE_INTERVAL_MS, DEFAULT_SUCCESS_HOLD_MS,
    DEFAULT_UNLOCK_PULSE_MS, MAX_CODE_LENGTH,
};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Which detected faces verification evaluates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacePolicy {
    /// Evaluate the first face in detector order; ignore the rest.
    #[default]
    FirstFace,

    /// Fail the attempt when more than one face is in the frame.
    RejectMultiple,
}

/// What enrollment does when the identity is already enrolled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Refuse the enrollment; the stored credential is untouched.
    #[default]
    Reject,

    /// Replace the stored embedding and code.
    Overwrite,
}

/// Indicator and actuator timings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedbackTimings {
    /// How long red stays on after a failure.
    pub failure_hold: Duration,

    /// How long green stays on after a successful enrollment.
    pub success_hold: Duration,

    /// How long the actuator is energized on a grant.
    pub unlock_pulse: Duration,
}

impl Default for FeedbackTimings {
    fn default() -> Self {
        Self {
            failure_hold: Duration::from_millis(DEFAULT_FAILURE_HOLD_MS),
            success_hold: Duration::from_millis(DEFAULT_SUCCESS_HOLD_MS),
            unlock_pulse: Duration::from_millis(DEFAULT_UNLOCK_PULSE_MS),
        }
    }
}

/// Lock out verification after repeated failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutPolicy {
    /// Consecutive failed verifications that trigger a lockout.
    pub max_failures: u32,

    /// How long presence is ignored once locked out.
    pub duration: Duration,
}

/// Complete engine configuration.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use facegate_engine::config::{ControllerConfig, DuplicatePolicy};
///
/// let config = ControllerConfig::default()
///     .with_code_length(4)
///     .with_entry_timeout(Some(Duration::from_secs(30)))
///     .with_duplicate_policy(DuplicatePolicy::Overwrite);
///
/// assert!(config.validate().is_ok());
/// assert_eq!(config.code_length, 4);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerConfig {
    /// Presence is detected strictly below this distance.
    pub proximity_threshold_cm: f64,

    /// Delay between presence polls while idle.
    pub idle_interval: Duration,

    /// Exact number of digits in a secret code.
    pub code_length: usize,

    /// Key activity ignored after each accepted digit.
    pub settle_interval: Duration,

    /// Cancel code entry after this long; `None` waits forever.
    pub entry_timeout: Option<Duration>,

    /// A match is accepted strictly below this distance.
    pub match_threshold: f64,

    pub face_policy: FacePolicy,

    pub duplicate_policy: DuplicatePolicy,

    pub feedback: FeedbackTimings,

    /// `None` disables lockout.
    pub lockout: Option<LockoutPolicy>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            proximity_threshold_cm: DEFAULT_PROXIMITY_THRESHOLD_CM,
            idle_interval: Duration::from_millis(DEFAULT_IDLE_INTERVAL_MS),
            code_length: DEFAULT_CODE_LENGTH,
            settle_interval: Duration::from_millis(DEFAULT_SETTLE_INTERVAL_MS),
            entry_timeout: None,
            match_threshold: DEFAULT_MATCH_THRESHOLD,
            face_policy: FacePolicy::default(),
            duplicate_policy: DuplicatePolicy::default(),
            feedback: FeedbackTimings::default(),
            lockout: None,
        }
    }
}

impl ControllerConfig {
    pub fn with_proximity_threshold(mut self, cm: f64) -> Self {
        self.proximity_threshold_cm = cm;
        self
    }

    pub fn with_idle_interval(mut self, interval: Duration) -> Self {
        self.idle_interval = interval;
        self
    }

    pub fn with_code_length(mut self, length: usize) -> Self {
        self.code_length = length;
        self
    }

    pub fn with_settle_interval(mut self, interval: Duration) -> Self {
        self.settle_interval = interval;
        self
    }

    pub fn with_entry_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.entry_timeout = timeout;
        self
    }

    pub fn with_match_threshold(mut self, threshold: f64) -> Self {
        self.match_threshold = threshold;
        self
    }

    pub fn with_face_policy(mut self, policy: FacePolicy) -> Self {
        self.face_policy = policy;
        self
    }

    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    pub fn with_feedback(mut self, feedback: FeedbackTimings) -> Self {
        self.feedback = feedback;
        self
    }

    pub fn with_lockout(mut self, lockout: Option<LockoutPolicy>) -> Self {
        self.lockout = lockout;
        self
    }

    /// Check the configuration before the controller starts.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Config`] for a code length outside
    /// `1..=MAX_CODE_LENGTH`, a threshold that is not a positive finite
    /// number, a zero entry timeout or a lockout that never triggers.
    pub fn validate(&self) -> EngineResult<()> {
        if !(1..=MAX_CODE_LENGTH).contains(&self.code_length) {
            return Err(EngineError::config(format!(
                "code length must be between 1 and {MAX_CODE_LENGTH}, got {}",
                self.code_length
            )));
        }
        if !(self.proximity_threshold_cm.is_finite() && self.proximity_threshold_cm > 0.0) {
            return Err(EngineError::config(format!(
                "proximity threshold must be positive, got {}",
                self.proximity_threshold_cm
            )));
        }
        if !(self.match_threshold.is_finite() && self.match_threshold > 0.0) {
            return Err(EngineError::config(format!(
                "match threshold must be positive, got {}",
                self.match_threshold
            )));
        }
        if self.entry_timeout.is_some_and(|t| t.is_zero()) {
            return Err(EngineError::config("entry timeout must be non-zero"));
        }
        if let Some(lockout) = &self.lockout
            && lockout.max_failures == 0
        {
            return Err(EngineError::config("lockout max_failures must be at least 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_defaults_match_reference_device() {
        let config = ControllerConfig::default();

        assert_eq!(config.proximity_threshold_cm, 50.0);
        assert_eq!(config.idle_interval, Duration::from_secs(1));
        assert_eq!(config.code_length, 6);
        assert_eq!(config.settle_interval, Duration::from_millis(300));
        assert_eq!(config.entry_timeout, None);
        assert_eq!(config.match_threshold, 0.4);
        assert_eq!(config.face_policy, FacePolicy::FirstFace);
        assert_eq!(config.duplicate_policy, DuplicatePolicy::Reject);
        assert_eq!(config.lockout, None);
        assert!(config.validate().is_ok());
    }

    #[rstest]
    #[case(ControllerConfig::default().with_code_length(0))]
    #[case(ControllerConfig::default().with_code_length(MAX_CODE_LENGTH + 1))]
    #[case(ControllerConfig::default().with_match_threshold(0.0))]
    #[case(ControllerConfig::default().with_match_threshold(f64::NAN))]
    #[case(ControllerConfig::default().with_proximity_threshold(-1.0))]
    #[case(ControllerConfig::default().with_entry_timeout(Some(Duration::ZERO)))]
    #[case(ControllerConfig::default().with_lockout(Some(LockoutPolicy {
        max_failures: 0,
        duration: Duration::from_secs(60),
    })))]
    fn test_validate_rejects(#[case] config: ControllerConfig) {
        assert!(matches!(config.validate(), Err(EngineError::Config(_))));
    }

    #[test]
    fn test_policies_deserialize_snake_case() {
        let policy: FacePolicy = serde_json_like("reject_multiple");
        assert_eq!(policy, FacePolicy::RejectMultiple);
        let policy: DuplicatePolicy = serde_json_like("overwrite");
        assert_eq!(policy, DuplicatePolicy::Overwrite);
    }

    fn serde_json_like<T: serde::de::DeserializeOwned>(name: &str) -> T {
        use serde::de::IntoDeserializer;
        let de: serde::de::value::StrDeserializer<'_, serde::de::value::Error> =
            name.into_deserializer();
        T::deserialize(de).unwrap()
    }
}
