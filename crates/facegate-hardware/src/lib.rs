//! Hardware abstraction layer for the facegate access controller.
//!
//! This crate defines the boundary between the access engine and the
//! physical world: the distance sensor that detects a visitor, the keypad
//! used for the secret code, the indicator and lock actuator, the camera,
//! and the face analyzer that turns a frame into face regions and
//! embeddings.
//!
//! # Design Philosophy
//!
//! - **Async-first**: All I/O operations are asynchronous using native `async fn`
//!   in traits (Rust 1.90 + Edition 2024 RPITIT).
//! - **Thread-safe**: All traits require `Send + Sync` for use with Tokio.
//! - **Error-aware**: All operations return `Result<T>` with detailed error information.
//! - **Injectable**: The engine owns device instances handed to it; nothing
//!   here is global.
//!
//! # Device Traits
//!
//! ## Keypad Devices
//!
//! The [`KeypadDevice`] trait reports one key press per read:
//!
//! ```no_run
//! use facegate_hardware::traits::{KeypadDevice, KeypadInput};
//! use facegate_hardware::error::Result;
//!
//! async fn read_digits<K: KeypadDevice>(keypad: &mut K, n: usize) -> Result<Option<String>> {
//!     let mut code = String::new();
//!     while code.len() < n {
//!         match keypad.read_input().await? {
//!             KeypadInput::Digit(d) => code.push(char::from(b'0' + d)),
//!             KeypadInput::Hash => return Ok(None),
//!             _ => {}
//!         }
//!     }
//!     Ok(Some(code))
//! }
//! ```
//!
//! ## Cameras and Face Analysis
//!
//! ```no_run
//! use facegate_hardware::traits::{Camera, FaceAnalyzer};
//! use facegate_hardware::error::Result;
//!
//! async fn count_faces<C: Camera, A: FaceAnalyzer>(camera: &mut C, analyzer: &mut A) -> Result<usize> {
//!     camera.open().await?;
//!     let frame = camera.capture_frame().await;
//!     camera.release();
//!     Ok(analyzer.detect_faces(&frame?).await?.len())
//! }
//! ```
//!
//! # Implementations
//!
//! - [`mock`]: scripted devices with call counters, for tests.
//! - [`matrix`]: a row-scanned 4x4 keypad over a pin trait.
//! - [`ultrasonic`]: echo-time ranging over a pin trait.
//! - [`fixture`]: a directory-backed camera and a JSON face analyzer, for
//!   running on a development host.
//!
//! [`KeypadDevice`]: traits::KeypadDevice

pub mod error;
pub mod fixture;
pub mod matrix;
pub mod mock;
pub mod traits;
pub mod types;
pub mod ultrasonic;

// Re-export commonly used types for convenience
pub use error::{HardwareError, Result};
pub use traits::{Camera, DistanceSensor, FaceAnalyzer, KeypadDevice, KeypadInput, OutputDevice};
pub use types::{DeviceInfo, FaceRegion, Frame, LedColor};
