//! Hardware device trait definitions.
//!
//! This module defines the contract between the access engine and the
//! peripherals it drives: the distance sensor, the keypad, the indicator and
//! actuator outputs, the camera, and the face analyzer that turns frames into
//! embeddings. Mock, emulated and real implementations all plug in here.
//!
//! All traits use native `async fn` methods (Rust 1.90 + Edition 2024 RPITIT),
//! eliminating the need for the `async_trait` macro.

#![allow(async_fn_in_trait)]

use std::time::Duration;

use facegate_core::Embedding;

use crate::error::Result;
use crate::types::{DeviceInfo, FaceRegion, Frame, LedColor};

/// Input from a keypad device.
///
/// Covers every key of a 4x4 membrane keypad: ten digits, `*`, `#` and the
/// four letter keys `A`-`D`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum KeypadInput {
    /// Numeric digit (0-9).
    Digit(u8),

    /// Star key (*).
    Star,

    /// Hash/pound key (#). Cancels code entry.
    Hash,

    /// Letter key (A-D).
    Letter(char),
}

impl KeypadInput {
    /// Create a digit input.
    ///
    /// # Errors
    ///
    /// Returns an error if the digit is greater than 9.
    ///
    /// # Examples
    ///
    /// ```
    /// use facegate_hardware::traits::KeypadInput;
    ///
    /// let input = KeypadInput::digit(5).unwrap();
    /// assert_eq!(input.as_digit(), Some(5));
    ///
    /// assert!(KeypadInput::digit(10).is_err());
    /// ```
    pub fn digit(d: u8) -> Result<Self> {
        if d > 9 {
            return Err(crate::error::HardwareError::invalid_data(format!(
                "Digit must be 0-9, got {}",
                d
            )));
        }
        Ok(Self::Digit(d))
    }

    /// Create a letter key input.
    ///
    /// # Errors
    ///
    /// Returns an error if the letter is not one of `A`-`D`.
    pub fn letter(c: char) -> Result<Self> {
        let upper = c.to_ascii_uppercase();
        if !('A'..='D').contains(&upper) {
            return Err(crate::error::HardwareError::invalid_data(format!(
                "Letter key must be A-D, got {:?}",
                c
            )));
        }
        Ok(Self::Letter(upper))
    }

    /// Map a key legend to an input, if it is a keypad key.
    ///
    /// # Examples
    ///
    /// ```
    /// use facegate_hardware::traits::KeypadInput;
    ///
    /// assert_eq!(KeypadInput::from_char('7'), Some(KeypadInput::Digit(7)));
    /// assert_eq!(KeypadInput::from_char('#'), Some(KeypadInput::Hash));
    /// assert_eq!(KeypadInput::from_char('x'), None);
    /// ```
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '0'..='9' => c.to_digit(10).map(|d| Self::Digit(d as u8)),
            '*' => Some(Self::Star),
            '#' => Some(Self::Hash),
            other => Self::letter(other).ok(),
        }
    }

    /// Key legend for this input.
    pub fn to_char(&self) -> char {
        match self {
            Self::Digit(d) => char::from(b'0' + d),
            Self::Star => '*',
            Self::Hash => '#',
            Self::Letter(c) => *c,
        }
    }

    /// Check if this input is a digit.
    pub fn is_digit(&self) -> bool {
        matches!(self, Self::Digit(_))
    }

    /// Get the digit value if this is a digit input.
    pub fn as_digit(&self) -> Option<u8> {
        match self {
            Self::Digit(d) => Some(*d),
            _ => None,
        }
    }
}

/// Trait for numeric keypad devices.
///
/// `read_input` blocks until a key is pressed. Debouncing between presses is
/// the caller's job; the device reports a held key on every read.
pub trait KeypadDevice: Send + Sync {
    /// Wait for the next key press.
    ///
    /// # Errors
    ///
    /// Returns an error if the device is disconnected or the scan fails.
    async fn read_input(&mut self) -> Result<KeypadInput>;

    /// Get device information.
    async fn get_info(&self) -> Result<DeviceInfo>;
}

/// Trait for proximity sensors.
pub trait DistanceSensor: Send + Sync {
    /// Take one distance reading in centimetres.
    ///
    /// # Errors
    ///
    /// Returns an error if the measurement times out or the device fails.
    /// Callers decide how to interpret a failed reading.
    async fn read_distance_cm(&mut self) -> Result<f64>;

    /// Get device information.
    async fn get_info(&self) -> Result<DeviceInfo>;
}

/// Trait for the visual/audible outputs: the RGB indicator and the lock
/// actuator (door strike or buzzer).
pub trait OutputDevice: Send + Sync {
    /// Drive the indicator to the given color.
    async fn set_indicator(&mut self, color: LedColor) -> Result<()>;

    /// Energize or release the actuator.
    async fn set_actuator(&mut self, active: bool) -> Result<()>;

    /// Energize the actuator for `duration`, then release it.
    ///
    /// The actuator is released even if the energize call fails halfway.
    async fn pulse_actuator(&mut self, duration: Duration) -> Result<()> {
        let energized = self.set_actuator(true).await;
        if energized.is_ok() {
            tokio::time::sleep(duration).await;
        }
        let released = self.set_actuator(false).await;
        energized.and(released)
    }

    /// De-assert every output.
    async fn all_off(&mut self) -> Result<()> {
        let indicator = self.set_indicator(LedColor::Off).await;
        let actuator = self.set_actuator(false).await;
        indicator.and(actuator)
    }

    /// Get device information.
    async fn get_info(&self) -> Result<DeviceInfo>;
}

/// Trait for frame sources.
///
/// A camera is opened for one presence session and released afterwards.
/// `release` is synchronous so it can run from `Drop` when a session is
/// torn down by an interrupt.
pub trait Camera: Send + Sync {
    /// Acquire the device.
    ///
    /// # Errors
    ///
    /// Returns an error if the device cannot be opened.
    async fn open(&mut self) -> Result<()>;

    /// Whether the device is currently acquired.
    fn is_open(&self) -> bool;

    /// Block until the next frame is available.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::CaptureFailed`](crate::HardwareError::CaptureFailed)
    /// for a single bad frame, or a permanent error if the device is gone.
    async fn capture_frame(&mut self) -> Result<Frame>;

    /// Release the device. Releasing a closed camera is a no-op.
    fn release(&mut self);

    /// Get device information.
    async fn get_info(&self) -> Result<DeviceInfo>;
}

/// Trait for the face detector and embedding extractor.
///
/// The extraction algorithm is opaque to the engine: it only needs face
/// locations and a fixed-length embedding per location.
pub trait FaceAnalyzer: Send + Sync {
    /// Locate every face in the frame, in detector order.
    async fn detect_faces(&mut self, frame: &Frame) -> Result<Vec<FaceRegion>>;

    /// Compute the embedding of the face at `region`.
    async fn encode_face(&mut self, frame: &Frame, region: &FaceRegion) -> Result<Embedding>;
}
