//! Common types shared across hardware device implementations.
//!
//! This module defines types used by multiple device traits: device
//! information, indicator colors, camera frames and face regions.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identification of a connected device.
///
/// Logged once when the controller starts so an operator can see which
/// peripherals a session will run against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Device name (e.g., "HC-SR04", "Fixture Camera").
    pub name: String,

    /// Device model identifier.
    pub model: String,

    /// Where the device is attached: a bus address, a pin set or a
    /// fixture directory.
    pub location: Option<String>,
}

impl DeviceInfo {
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            location: None,
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.model)?;
        if let Some(location) = &self.location {
            write!(f, " at {location}")?;
        }
        Ok(())
    }
}

/// Colors of the status indicator.
///
/// The indicator is a common RGB LED driven by three on/off lines, so only
/// the eight combinations of those lines are representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedColor {
    /// LED off.
    Off,

    /// Red: failure.
    Red,

    /// Green: success or grant.
    Green,

    /// Blue: scanning.
    Blue,

    /// Red and green lines.
    Yellow,

    /// Green and blue lines.
    Cyan,

    /// Red and blue lines.
    Magenta,

    /// All three lines.
    White,
}

impl LedColor {
    /// State of the (red, green, blue) lines for this color.
    pub fn lines(&self) -> (bool, bool, bool) {
        match self {
            Self::Off => (false, false, false),
            Self::Red => (true, false, false),
            Self::Green => (false, true, false),
            Self::Blue => (false, false, true),
            Self::Yellow => (true, true, false),
            Self::Cyan => (false, true, true),
            Self::Magenta => (true, false, true),
            Self::White => (true, true, true),
        }
    }

    /// Color produced by a given (red, green, blue) line state.
    pub fn from_lines(red: bool, green: bool, blue: bool) -> Self {
        match (red, green, blue) {
            (false, false, false) => Self::Off,
            (true, false, false) => Self::Red,
            (false, true, false) => Self::Green,
            (false, false, true) => Self::Blue,
            (true, true, false) => Self::Yellow,
            (false, true, true) => Self::Cyan,
            (true, false, true) => Self::Magenta,
            (true, true, true) => Self::White,
        }
    }
}

/// One image acquired from the camera.
///
/// The pixel format is whatever the camera and the face analyzer agree on;
/// the access engine never looks inside `data`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Monotonic sequence number assigned by the camera.
    pub sequence: u64,

    /// Width in pixels.
    pub width: u32,

    /// Height in pixels.
    pub height: u32,

    /// Raw frame payload.
    pub data: Vec<u8>,

    /// When the frame was acquired.
    pub captured_at: DateTime<Utc>,
}

impl Frame {
    /// Create a frame stamped with the current time.
    pub fn new(sequence: u64, width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            sequence,
            width,
            height,
            data,
            captured_at: Utc::now(),
        }
    }
}

/// Bounding box of a detected face, in pixel coordinates.
///
/// Follows the (top, right, bottom, left) convention used by common face
/// location detectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FaceRegion {
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
    pub left: u32,
}

impl FaceRegion {
    pub fn new(top: u32, right: u32, bottom: u32, left: u32) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    pub fn width(&self) -> u32 {
        self.right.saturating_sub(self.left)
    }

    pub fn height(&self) -> u32 {
        self.bottom.saturating_sub(self.top)
    }

    pub fn area(&self) -> u64 {
        u64::from(self.width()) * u64::from(self.height())
    }
}
