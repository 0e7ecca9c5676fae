//! Ultrasonic (HC-SR04 style) distance ranging.
//!
//! A trigger pulse is emitted and the width of the echo pulse is the sound's
//! round-trip time. Distance is half the round trip at the speed of sound.

#![allow(async_fn_in_trait)]

use std::time::Duration;

use facegate_core::constants::{DEFAULT_ECHO_TIMEOUT_MS, SPEED_OF_SOUND_CM_PER_S};
use tracing::trace;

use crate::{HardwareError, Result, traits::DistanceSensor, types::DeviceInfo};

/// Quiet time on the trigger line before each measurement.
pub const DEFAULT_TRIGGER_SETTLE: Duration = Duration::from_millis(500);

/// Convert an echo round-trip time to centimetres.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use facegate_hardware::ultrasonic::echo_to_distance_cm;
///
/// let cm = echo_to_distance_cm(Duration::from_micros(2000));
/// assert!((cm - 34.3).abs() < 1e-9);
/// ```
pub fn echo_to_distance_cm(round_trip: Duration) -> f64 {
    round_trip.as_secs_f64() * SPEED_OF_SOUND_CM_PER_S / 2.0
}

/// Pin-level access to the trigger and echo lines.
pub trait EchoTimer: Send + Sync {
    /// Hold the trigger line low.
    async fn quiet(&mut self) -> Result<()>;

    /// Emit the trigger pulse and measure the echo pulse width.
    ///
    /// Returns `None` if no echo arrived within `timeout`.
    async fn fire(&mut self, timeout: Duration) -> Result<Option<Duration>>;
}

/// [`DistanceSensor`] over an [`EchoTimer`].
#[derive(Debug)]
pub struct UltrasonicRanger<E> {
    timer: E,
    settle: Duration,
    echo_timeout: Duration,
}

impl<E: EchoTimer> UltrasonicRanger<E> {
    pub fn new(timer: E) -> Self {
        Self {
            timer,
            settle: DEFAULT_TRIGGER_SETTLE,
            echo_timeout: Duration::from_millis(DEFAULT_ECHO_TIMEOUT_MS),
        }
    }

    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    pub fn with_echo_timeout(mut self, timeout: Duration) -> Self {
        self.echo_timeout = timeout;
        self
    }
}

impl<E: EchoTimer> DistanceSensor for UltrasonicRanger<E> {
    async fn read_distance_cm(&mut self) -> Result<f64> {
        self.timer.quiet().await?;
        tokio::time::sleep(self.settle).await;

        let round_trip = self
            .timer
            .fire(self.echo_timeout)
            .await?
            .ok_or_else(|| HardwareError::timeout(self.echo_timeout.as_millis() as u64))?;

        let cm = echo_to_distance_cm(round_trip);
        trace!(round_trip_us = round_trip.as_micros() as u64, cm, "Echo measured");
        Ok(cm)
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        Ok(DeviceInfo::new("HC-SR04", "Ultrasonic Ranger"))
    }
}
