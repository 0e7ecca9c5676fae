//! Access-decision engine for the facegate controller.
//!
//! This crate sequences presence detection, face matching against enrolled
//! embeddings, secret code entry and actuation into single presence
//! sessions with unambiguous outcomes.
//!
//! # Architecture
//!
//! - [`PresenceMonitor`] - binary presence from a distance sensor
//! - [`CodeEntryCollector`] - fixed-length code entry with cancel and timeout
//! - [`matcher`] - nearest enrolled embedding
//! - [`EnrollmentWorkflow`], [`VerificationWorkflow`] - the two session workflows
//! - [`AccessController`] - the top-level loop and [`StateMachine`]
//!
//! Authentication failures are [`SessionOutcome`] values, never errors.
//! [`EngineError`] is reserved for device, store and console failures.
//!
//! # Session Flow
//!
//! ```text
//! Idle ──presence──▶ AwaitingCamera ──register/unlock──▶ InWorkflow
//!   ▲                     │ invalid selection                 │
//!   └─────────────────────┴───────────────────────────────────┘
//! ```

pub mod code_entry;
pub mod config;
pub mod console;
pub mod controller;
pub mod enrollment;
pub mod error;
pub mod feedback;
pub mod lockout;
pub mod matcher;
pub mod outcome;
pub mod presence;
pub mod session;
pub mod state_machine;
pub mod verification;

pub use code_entry::{CancelReason, CodeEntry, CodeEntryCollector};
pub use config::{ControllerConfig, DuplicatePolicy, FacePolicy, FeedbackTimings, LockoutPolicy};
pub use console::Console;
pub use controller::{AccessController, Devices};
pub use enrollment::EnrollmentWorkflow;
pub use error::{EngineError, EngineResult};
pub use feedback::Feedback;
pub use outcome::SessionOutcome;
pub use presence::PresenceMonitor;
pub use state_machine::{SessionState, StateMachine, StateTransition};
pub use verification::VerificationWorkflow;
