//! Mock keypad implementation for testing and development.
//!
//! This module provides a simulated keypad device that can be controlled
//! programmatically for testing without requiring physical hardware.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::{
    Result,
    traits::{KeypadDevice, KeypadInput},
    types::DeviceInfo,
};
use tokio::sync::mpsc;

/// Mock keypad device for testing and development.
///
/// This device simulates a numeric keypad by receiving input through
/// an internal channel. Tests can queue key presses ahead of time using a
/// `MockKeypadHandle`; once the queue is drained and every handle has been
/// dropped, reads fail with a disconnection error.
///
/// # Examples
///
/// ```
/// use facegate_hardware::mock::MockKeypad;
/// use facegate_hardware::traits::{KeypadDevice, KeypadInput};
///
/// #[tokio::main]
/// async fn main() -> facegate_hardware::Result<()> {
///     let (mut keypad, handle) = MockKeypad::new();
///
///     handle.send_input(KeypadInput::Digit(1))?;
///     handle.send_input(KeypadInput::Hash)?;
///
///     assert_eq!(keypad.read_input().await?, KeypadInput::Digit(1));
///     assert_eq!(keypad.read_input().await?, KeypadInput::Hash);
///     assert_eq!(handle.reads(), 2);
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockKeypad {
    /// Channel receiver for simulated input
    input_rx: mpsc::UnboundedReceiver<KeypadInput>,

    /// Number of `read_input` calls, shared with the handle
    reads: Arc<AtomicUsize>,

    /// Device name
    name: String,
}

impl MockKeypad {
    /// Create a new mock keypad with the default name.
    ///
    /// Returns a tuple of (MockKeypad, MockKeypadHandle) where the handle
    /// can be used to simulate input to the keypad.
    pub fn new() -> (Self, MockKeypadHandle) {
        Self::with_name("Mock Keypad".to_string())
    }

    /// Create a new mock keypad with a custom name.
    pub fn with_name(name: String) -> (Self, MockKeypadHandle) {
        let (input_tx, input_rx) = mpsc::unbounded_channel();
        let reads = Arc::new(AtomicUsize::new(0));

        let keypad = Self {
            input_rx,
            reads: Arc::clone(&reads),
            name: name.clone(),
        };

        let handle = MockKeypadHandle {
            input_tx,
            reads,
            name,
        };

        (keypad, handle)
    }
}

impl Default for MockKeypad {
    fn default() -> Self {
        Self::new().0
    }
}

impl KeypadDevice for MockKeypad {
    async fn read_input(&mut self) -> Result<KeypadInput> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.input_rx
            .recv()
            .await
            .ok_or_else(|| crate::HardwareError::disconnected("Keypad input channel closed"))
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        Ok(DeviceInfo::new(self.name.clone(), "Mock Keypad v1.0"))
    }
}

/// Handle for controlling a mock keypad.
///
/// This handle allows programmatic control of the mock keypad by sending
/// input events. It can be cloned and shared across tasks.
#[derive(Debug, Clone)]
pub struct MockKeypadHandle {
    /// Channel sender for simulated input
    input_tx: mpsc::UnboundedSender<KeypadInput>,

    /// Number of `read_input` calls made on the keypad
    reads: Arc<AtomicUsize>,

    /// Device name
    name: String,
}

impl MockKeypadHandle {
    /// Queue an input event on the mock keypad.
    ///
    /// # Errors
    ///
    /// Returns an error if the keypad has been dropped and the channel is closed.
    pub fn send_input(&self, input: KeypadInput) -> Result<()> {
        self.input_tx
            .send(input)
            .map_err(|_| crate::HardwareError::disconnected("Keypad input channel closed"))
    }

    /// Queue a sequence of digit inputs.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Any digit is greater than 9
    /// - The keypad has been dropped and the channel is closed
    pub fn send_digits(&self, digits: &[u8]) -> Result<()> {
        for &digit in digits {
            let input = KeypadInput::digit(digit)?;
            self.send_input(input)?;
        }
        Ok(())
    }

    /// Queue every key legend in `keys` (e.g. `"12#"`).
    ///
    /// Characters that are not keypad legends are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the keypad has been dropped.
    pub fn send_keys(&self, keys: &str) -> Result<()> {
        for input in keys.chars().filter_map(KeypadInput::from_char) {
            self.send_input(input)?;
        }
        Ok(())
    }

    /// Number of times the keypad has been read.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Get the device name.
    pub fn name(&self) -> &str {
        &self.name
    }
}
