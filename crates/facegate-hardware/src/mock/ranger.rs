//! Mock distance sensor for testing and development.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use crate::{HardwareError, Result, traits::DistanceSensor, types::DeviceInfo};

/// Distance reported once the scripted readings run out.
pub const MOCK_OUT_OF_RANGE_CM: f64 = 400.0;

#[derive(Debug, Clone, Copy)]
enum Reading {
    Distance(f64),
    Timeout,
}

#[derive(Debug)]
struct RangerState {
    readings: VecDeque<Reading>,
    fallback: f64,
    reads: usize,
}

/// Mock distance sensor that replays scripted readings.
///
/// Readings are consumed in order. When the script is empty the sensor
/// reports a fallback distance (out of range unless changed), so an idle
/// loop under test never blocks.
///
/// # Examples
///
/// ```
/// use facegate_hardware::mock::MockRanger;
/// use facegate_hardware::traits::DistanceSensor;
///
/// #[tokio::main]
/// async fn main() -> facegate_hardware::Result<()> {
///     let (mut ranger, handle) = MockRanger::new();
///     handle.push_distance(30.0);
///     handle.push_timeout();
///
///     assert_eq!(ranger.read_distance_cm().await?, 30.0);
///     assert!(ranger.read_distance_cm().await.is_err());
///     assert_eq!(handle.reads(), 2);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockRanger {
    state: Arc<Mutex<RangerState>>,
}

impl MockRanger {
    /// Create a new mock ranger and its control handle.
    pub fn new() -> (Self, MockRangerHandle) {
        let state = Arc::new(Mutex::new(RangerState {
            readings: VecDeque::new(),
            fallback: MOCK_OUT_OF_RANGE_CM,
            reads: 0,
        }));

        (
            Self {
                state: Arc::clone(&state),
            },
            MockRangerHandle { state },
        )
    }
}

impl Default for MockRanger {
    fn default() -> Self {
        Self::new().0
    }
}

impl DistanceSensor for MockRanger {
    async fn read_distance_cm(&mut self) -> Result<f64> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.reads += 1;
        match state.readings.pop_front() {
            Some(Reading::Distance(cm)) => Ok(cm),
            Some(Reading::Timeout) => Err(HardwareError::timeout(25)),
            None => Ok(state.fallback),
        }
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        Ok(DeviceInfo::new("Mock Ranger", "Mock Ranger v1.0"))
    }
}

/// Handle for scripting a mock ranger.
#[derive(Debug, Clone)]
pub struct MockRangerHandle {
    state: Arc<Mutex<RangerState>>,
}

impl MockRangerHandle {
    fn with_state<T>(&self, f: impl FnOnce(&mut RangerState) -> T) -> T {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }

    /// Queue a distance reading.
    pub fn push_distance(&self, cm: f64) {
        self.with_state(|s| s.readings.push_back(Reading::Distance(cm)));
    }

    /// Queue a reading that fails with an echo timeout.
    pub fn push_timeout(&self) {
        self.with_state(|s| s.readings.push_back(Reading::Timeout));
    }

    /// Change the distance reported after the script runs out.
    pub fn set_fallback(&self, cm: f64) {
        self.with_state(|s| s.fallback = cm);
    }

    /// Number of readings taken so far.
    pub fn reads(&self) -> usize {
        self.with_state(|s| s.reads)
    }
}
