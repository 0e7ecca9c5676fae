//! Mock indicator and actuator outputs for testing and development.

use std::sync::{Arc, Mutex, PoisonError};

use crate::{
    Result,
    traits::OutputDevice,
    types::{DeviceInfo, LedColor},
};

/// A single change applied to the outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputEvent {
    /// Indicator switched to a color.
    Indicator(LedColor),

    /// Actuator energized (`true`) or released (`false`).
    Actuator(bool),
}

#[derive(Debug, Default)]
struct OutputState {
    events: Vec<OutputEvent>,
    indicator: Option<LedColor>,
    actuator: bool,
}

/// Mock output device that records every change.
///
/// # Examples
///
/// ```
/// use facegate_hardware::mock::{MockOutputs, OutputEvent};
/// use facegate_hardware::traits::OutputDevice;
/// use facegate_hardware::types::LedColor;
///
/// #[tokio::main]
/// async fn main() -> facegate_hardware::Result<()> {
///     let (mut outputs, handle) = MockOutputs::new();
///
///     outputs.set_indicator(LedColor::Green).await?;
///     outputs.all_off().await?;
///
///     assert_eq!(handle.events()[0], OutputEvent::Indicator(LedColor::Green));
///     assert_eq!(handle.indicator(), LedColor::Off);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockOutputs {
    state: Arc<Mutex<OutputState>>,
}

impl MockOutputs {
    /// Create a new mock output device and its inspection handle.
    pub fn new() -> (Self, MockOutputsHandle) {
        let state = Arc::new(Mutex::new(OutputState::default()));
        (
            Self {
                state: Arc::clone(&state),
            },
            MockOutputsHandle { state },
        )
    }

    fn record(&self, event: OutputEvent) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match event {
            OutputEvent::Indicator(color) => state.indicator = Some(color),
            OutputEvent::Actuator(active) => state.actuator = active,
        }
        state.events.push(event);
    }
}

impl Default for MockOutputs {
    fn default() -> Self {
        Self::new().0
    }
}

impl OutputDevice for MockOutputs {
    async fn set_indicator(&mut self, color: LedColor) -> Result<()> {
        self.record(OutputEvent::Indicator(color));
        Ok(())
    }

    async fn set_actuator(&mut self, active: bool) -> Result<()> {
        self.record(OutputEvent::Actuator(active));
        Ok(())
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        Ok(DeviceInfo::new("Mock Outputs", "Mock Outputs v1.0"))
    }
}

/// Handle for inspecting a mock output device.
#[derive(Debug, Clone)]
pub struct MockOutputsHandle {
    state: Arc<Mutex<OutputState>>,
}

impl MockOutputsHandle {
    fn with_state<T>(&self, f: impl FnOnce(&OutputState) -> T) -> T {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&state)
    }

    /// Every change recorded so far, oldest first.
    pub fn events(&self) -> Vec<OutputEvent> {
        self.with_state(|s| s.events.clone())
    }

    /// Colors the indicator has been set to, oldest first.
    pub fn indicator_history(&self) -> Vec<LedColor> {
        self.with_state(|s| {
            s.events
                .iter()
                .filter_map(|e| match e {
                    OutputEvent::Indicator(color) => Some(*color),
                    OutputEvent::Actuator(_) => None,
                })
                .collect()
        })
    }

    /// Current indicator color (`Off` if never set).
    pub fn indicator(&self) -> LedColor {
        self.with_state(|s| s.indicator.unwrap_or(LedColor::Off))
    }

    /// Whether the actuator is currently energized.
    pub fn actuator_active(&self) -> bool {
        self.with_state(|s| s.actuator)
    }

    /// Number of times the actuator was energized.
    pub fn actuations(&self) -> usize {
        self.with_state(|s| {
            s.events
                .iter()
                .filter(|e| matches!(e, OutputEvent::Actuator(true)))
                .count()
        })
    }

    /// Whether the indicator was ever set to `color`.
    pub fn showed(&self, color: LedColor) -> bool {
        self.indicator_history().contains(&color)
    }
}
