//! Indicator and actuator sequences.
//!
//! Output failures are logged and swallowed: a broken LED must not stop a
//! session from reaching its exit point.

use facegate_hardware::{LedColor, OutputDevice};
use tokio::time::sleep;
use tracing::warn;

use crate::config::FeedbackTimings;

/// Drives the output device through the fixed feedback sequences.
#[derive(Debug, Clone, Copy)]
pub struct Feedback {
    timings: FeedbackTimings,
}

impl Feedback {
    pub fn new(timings: FeedbackTimings) -> Self {
        Self { timings }
    }

    pub fn timings(&self) -> &FeedbackTimings {
        &self.timings
    }

    /// Red for the failure hold, then off.
    pub async fn failure<O: OutputDevice>(&self, outputs: &mut O) {
        self.hold(outputs, LedColor::Red, self.timings.failure_hold)
            .await;
    }

    /// Green for the success hold, then off.
    pub async fn success<O: OutputDevice>(&self, outputs: &mut O) {
        self.hold(outputs, LedColor::Green, self.timings.success_hold)
            .await;
    }

    /// Blue while a frame is analysed.
    pub async fn scanning<O: OutputDevice>(&self, outputs: &mut O) {
        set_indicator(outputs, LedColor::Blue).await;
    }

    /// Green with the actuator pulsed, then off.
    pub async fn grant<O: OutputDevice>(&self, outputs: &mut O) {
        set_indicator(outputs, LedColor::Green).await;
        if let Err(e) = outputs.pulse_actuator(self.timings.unlock_pulse).await {
            warn!(error = %e, "Failed to pulse actuator");
        }
        set_indicator(outputs, LedColor::Off).await;
    }

    /// De-assert every output.
    pub async fn all_off<O: OutputDevice>(&self, outputs: &mut O) {
        if let Err(e) = outputs.all_off().await {
            warn!(error = %e, "Failed to switch outputs off");
        }
    }

    async fn hold<O: OutputDevice>(&self, outputs: &mut O, color: LedColor, hold: std::time::Duration) {
        set_indicator(outputs, color).await;
        sleep(hold).await;
        set_indicator(outputs, LedColor::Off).await;
    }
}

impl Default for Feedback {
    fn default() -> Self {
        Self::new(FeedbackTimings::default())
    }
}

async fn set_indicator<O: OutputDevice>(outputs: &mut O, color: LedColor) {
    if let Err(e) = outputs.set_indicator(color).await {
        warn!(?color, error = %e, "Failed to set indicator");
    }
}
