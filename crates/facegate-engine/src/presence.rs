//! Presence detection over a noisy distance signal.

use facegate_hardware::DistanceSensor;
use tracing::{debug, trace};

/// Whether a distance reading counts as a subject in range.
///
/// Only finite, non-negative readings strictly below `threshold_cm` count.
///
/// # Examples
///
/// ```
/// use facegate_engine::presence::is_present;
///
/// assert!(is_present(49.9, 50.0));
/// assert!(!is_present(50.0, 50.0));
/// assert!(!is_present(f64::NAN, 50.0));
/// assert!(!is_present(-3.0, 50.0));
/// ```
#[inline]
pub fn is_present(reading_cm: f64, threshold_cm: f64) -> bool {
    reading_cm.is_finite() && reading_cm >= 0.0 && reading_cm < threshold_cm
}

/// Turns a [`DistanceSensor`] into a binary presence signal.
///
/// A failed or malformed reading is reported as "no presence" and never
/// propagates; the idle loop just polls again.
#[derive(Debug)]
pub struct PresenceMonitor<S> {
    sensor: S,
    threshold_cm: f64,
}

impl<S: DistanceSensor> PresenceMonitor<S> {
    pub fn new(sensor: S, threshold_cm: f64) -> Self {
        Self {
            sensor,
            threshold_cm,
        }
    }

    pub fn threshold_cm(&self) -> f64 {
        self.threshold_cm
    }

    /// Take one reading and report whether a subject is in range.
    pub async fn poll(&mut self) -> bool {
        match self.sensor.read_distance_cm().await {
            Ok(reading) => {
                trace!(reading_cm = reading, "Distance reading");
                if !reading.is_finite() || reading < 0.0 {
                    debug!(reading_cm = reading, "Discarding malformed distance reading");
                    return false;
                }
                is_present(reading, self.threshold_cm)
            }
            Err(e) => {
                debug!(error = %e, "Distance reading failed, treating as absent");
                false
            }
        }
    }

    pub fn sensor(&self) -> &S {
        &self.sensor
    }

    pub fn into_inner(self) -> S {
        self.sensor
    }
}
