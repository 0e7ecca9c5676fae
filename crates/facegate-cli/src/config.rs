//! `facegate.toml` loading.
//!
//! Every section is optional; a missing key takes the reference device's
//! value. Example:
//!
//! ```toml
//! [presence]
//! threshold_cm = 50.0
//! idle_interval_ms = 1000
//!
//! [keypad]
//! code_length = 6
//! settle_interval_ms = 300
//! entry_timeout_ms = 30000
//!
//! [matching]
//! threshold = 0.4
//! face_policy = "first_face"
//!
//! [enrollment]
//! duplicate_policy = "reject"
//!
//! [lockout]
//! max_failures = 5
//! duration_ms = 60000
//!
//! [storage]
//! database_path = "facegate.db"
//!
//! [devices]
//! fixtures_dir = "fixtures"
//! simulated_distance_cm = 30.0
//!
//! [logging]
//! level = "info"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use facegate_core::constants::{
    DEFAULT_CODE_LENGTH, DEFAULT_FAILURE_HOLD_MS, DEFAULT_IDLE_INTERVAL_MS, DEFAULT_MATCH_THRESHOLD,
    DEFAULT_PROXIMITY_THRESHOLD_CM, DEFAULT_SETTLE_INTERVAL_MS, DEFAULT_SUCCESS_HOLD_MS,
    DEFAULT_UNLOCK_PULSE_MS,
};
use facegate_engine::{
    ControllerConfig, DuplicatePolicy, FacePolicy, FeedbackTimings, LockoutPolicy,
};
use facegate_storage::connection::DEFAULT_DATABASE_PATH;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Config file read when `--config` is not given, if present.
pub const DEFAULT_CONFIG_PATH: &str = "facegate.toml";

const DEFAULT_LOCKOUT_DURATION_MS: u64 = 60_000;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub presence: PresenceConfig,
    pub keypad: KeypadConfig,
    pub matching: MatchingConfig,
    pub enrollment: EnrollmentConfig,
    pub feedback: FeedbackConfig,
    pub lockout: LockoutConfig,
    pub storage: StorageConfig,
    pub devices: DevicesConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresenceConfig {
    pub threshold_cm: f64,
    pub idle_interval_ms: u64,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            threshold_cm: DEFAULT_PROXIMITY_THRESHOLD_CM,
            idle_interval_ms: DEFAULT_IDLE_INTERVAL_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeypadConfig {
    pub code_length: usize,
    pub settle_interval_ms: u64,
    /// Absent means code entry waits forever.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_timeout_ms: Option<u64>,
}

impl Default for KeypadConfig {
    fn default() -> Self {
        Self {
            code_length: DEFAULT_CODE_LENGTH,
            settle_interval_ms: DEFAULT_SETTLE_INTERVAL_MS,
            entry_timeout_ms: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    pub threshold: f64,
    pub face_policy: FacePolicy,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_MATCH_THRESHOLD,
            face_policy: FacePolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrollmentConfig {
    pub duplicate_policy: DuplicatePolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackConfig {
    pub failure_hold_ms: u64,
    pub success_hold_ms: u64,
    pub unlock_pulse_ms: u64,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            failure_hold_ms: DEFAULT_FAILURE_HOLD_MS,
            success_hold_ms: DEFAULT_SUCCESS_HOLD_MS,
            unlock_pulse_ms: DEFAULT_UNLOCK_PULSE_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockoutConfig {
    /// Absent disables lockout.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_failures: Option<u32>,
    pub duration_ms: u64,
}

impl Default for LockoutConfig {
    fn default() -> Self {
        Self {
            max_failures: None,
            duration_ms: DEFAULT_LOCKOUT_DURATION_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub database_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DevicesConfig {
    /// Directory of JSON face fixtures served as camera frames.
    pub fixtures_dir: PathBuf,

    /// Fixed ranger reading. Absent means the operator presses Enter to
    /// signal a visitor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub simulated_distance_cm: Option<f64>,
}

impl Default for DevicesConfig {
    fn default() -> Self {
        Self {
            fixtures_dir: PathBuf::from("fixtures"),
            simulated_distance_cm: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive; `RUST_LOG` takes precedence.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration.
    ///
    /// An explicit `path` must exist. Without one, [`DEFAULT_CONFIG_PATH`]
    /// is read when present and defaults are used otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG_PATH);
                if default.exists() {
                    Self::load_from_path(default)
                } else {
                    debug!("No config file, using defaults");
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            bail!("Config file not found: {}", path.display());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config = Self::parse(&contents)
            .with_context(|| format!("Invalid config in {}", path.display()))?;
        Ok(config)
    }

    /// Parse and validate a TOML document.
    pub fn parse(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents).context("Config parse error")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.controller_config().validate()?;
        if let Some(cm) = self.devices.simulated_distance_cm
            && !(cm.is_finite() && cm >= 0.0)
        {
            bail!("simulated_distance_cm must be a non-negative number, got {cm}");
        }
        Ok(())
    }

    /// Engine configuration described by this file.
    pub fn controller_config(&self) -> ControllerConfig {
        let lockout = self.lockout.max_failures.map(|max_failures| LockoutPolicy {
            max_failures,
            duration: Duration::from_millis(self.lockout.duration_ms),
        });

        ControllerConfig::default()
            .with_proximity_threshold(self.presence.threshold_cm)
            .with_idle_interval(Duration::from_millis(self.presence.idle_interval_ms))
            .with_code_length(self.keypad.code_length)
            .with_settle_interval(Duration::from_millis(self.keypad.settle_interval_ms))
            .with_entry_timeout(self.keypad.entry_timeout_ms.map(Duration::from_millis))
            .with_match_threshold(self.matching.threshold)
            .with_face_policy(self.matching.face_policy)
            .with_duplicate_policy(self.enrollment.duplicate_policy)
            .with_feedback(FeedbackTimings {
                failure_hold: Duration::from_millis(self.feedback.failure_hold_ms),
                success_hold: Duration::from_millis(self.feedback.success_hold_ms),
                unlock_pulse: Duration::from_millis(self.feedback.unlock_pulse_ms),
            })
            .with_lockout(lockout)
    }
}
