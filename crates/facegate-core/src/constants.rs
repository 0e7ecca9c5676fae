//! Default tuning constants for the access controller.
//!
//! Every value here is a default: the engine and CLI configuration layers can
//! override them. They are collected in one place so that the reference
//! device behaviour (50 cm trigger, 0.4 match threshold, 6 digit codes,
//! 300 ms key settle) is documented once.
//!
//! # Usage
//!
//! ```
//! use facegate_core::constants::*;
//! use std::time::Duration;
//!
//! assert_eq!(DEFAULT_CODE_LENGTH, 6);
//! let settle = Duration::from_millis(DEFAULT_SETTLE_INTERVAL_MS);
//! assert_eq!(settle.as_millis(), 300);
//! ```

// ============================================================================
// Presence Detection
// ============================================================================

/// Distance (centimetres) below which a subject counts as present.
///
/// The comparison is strict: a reading of exactly this value is absence.
pub const DEFAULT_PROXIMITY_THRESHOLD_CM: f64 = 50.0;

/// Polling cadence while nobody is in range (milliseconds).
pub const DEFAULT_IDLE_INTERVAL_MS: u64 = 1000;

/// Speed of sound used to convert ultrasonic echo time (cm/s).
pub const SPEED_OF_SOUND_CM_PER_S: f64 = 34_300.0;

/// Longest echo wait before a ranging attempt is abandoned (milliseconds).
///
/// Roughly 4 metres of round trip; anything longer is out of range for a
/// door sensor.
pub const DEFAULT_ECHO_TIMEOUT_MS: u64 = 25;

// ============================================================================
// Face Matching
// ============================================================================

/// Maximum accepted Euclidean distance between live and enrolled embeddings.
///
/// Acceptance is strict: a distance equal to the threshold is rejected.
///
/// # Value: 0.4
///
/// Tighter than the 0.6 commonly used with 128-d face encodings, trading
/// false rejects for fewer false accepts.
pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.4;

// ============================================================================
// Code Entry
// ============================================================================

/// Number of digits in a secret code.
pub const DEFAULT_CODE_LENGTH: usize = 6;

/// Upper bound accepted for a configured code length.
pub const MAX_CODE_LENGTH: usize = 16;

/// Pause after an accepted digit before the keypad is read again (milliseconds).
pub const DEFAULT_SETTLE_INTERVAL_MS: u64 = 300;

/// Key that aborts code entry.
pub const CANCEL_KEY: char = '#';

/// Character echoed on the console for each accepted digit.
pub const MASK_CHAR: char = '*';

// ============================================================================
// Identities
// ============================================================================

/// Maximum identity length in characters.
pub const MAX_IDENTITY_LENGTH: usize = 64;

// ============================================================================
// Feedback Timing
// ============================================================================

/// How long the red indicator stays on after a failure (milliseconds).
pub const DEFAULT_FAILURE_HOLD_MS: u64 = 2000;

/// How long the green indicator stays on after a success (milliseconds).
pub const DEFAULT_SUCCESS_HOLD_MS: u64 = 2000;

/// How long the unlock output is driven on a grant (milliseconds).
pub const DEFAULT_UNLOCK_PULSE_MS: u64 = 1000;

// ============================================================================
// Session Messages
// ============================================================================

/// Shown when a frame holds no face.
pub const MSG_NO_FACE: &str = "No face detected";

/// Shown when an enrollment frame holds more than one face.
pub const MSG_MULTIPLE_FACES: &str = "Multiple faces detected";

/// Shown when code entry is cancelled or fails.
pub const MSG_PIN_ENTRY_FAILED: &str = "PIN entry failed";

/// Shown when verification runs against an empty store.
pub const MSG_NO_FACES_REGISTERED: &str = "No faces have been registered yet";

/// Shown when the closest enrolled face is not close enough.
pub const MSG_NO_MATCH: &str = "No acceptable match";

/// Shown when the entered code does not match.
pub const MSG_INCORRECT_PIN: &str = "Incorrect PIN";

/// Shown on a grant.
pub const MSG_ACCESS_GRANTED: &str = "PIN verified. The door is unlocked";

/// Shown after a successful enrollment.
pub const MSG_ENROLLED: &str = "Face registered. PIN saved successfully";

/// Shown for an unknown workflow selection.
pub const MSG_INVALID_OPTION: &str = "Invalid option. Please choose 'register' or 'unlock'";

/// Shown for an empty or overlong enrollment name.
pub const MSG_INVALID_IDENTITY: &str = "Invalid name";

/// Shown when enrollment names an identity that is already enrolled.
pub const MSG_ALREADY_ENROLLED: &str = "This name is already registered";

/// Printed when the cancel key ends code entry.
pub const MSG_ENTRY_CANCELLED: &str = "Pin entry canceled.";

/// Printed when code entry runs past its deadline.
pub const MSG_ENTRY_TIMED_OUT: &str = "Pin entry timed out.";

/// Shown when a frame could not be acquired.
pub const MSG_CAPTURE_FAILED: &str = "Failed to capture image";

/// Shown while verification is suspended after repeated failures.
pub const MSG_LOCKED_OUT: &str = "Too many failed attempts. Try again later";

/// Shown when a session ends on a device or store failure.
pub const MSG_SESSION_ABORTED: &str = "Session aborted";

/// Shown on presence, before the workflow prompt.
pub const MSG_PRESENCE_DETECTED: &str = "Motion detected! Please choose an option.";

// ============================================================================
// Prompts
// ============================================================================

/// Workflow selection prompt.
pub const PROMPT_WORKFLOW: &str = "Do you want to register or unlock? (register/unlock): ";

/// Enrollment name prompt.
pub const PROMPT_IDENTITY: &str = "Enter your name for registration: ";

/// Shown before the enrollment capture loop.
pub const PROMPT_CAPTURE: &str = "Position yourself and press 'Enter' to capture the image.";
