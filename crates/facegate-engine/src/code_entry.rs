//! Secret code entry on the keypad.
//!
//! [`CodeBuffer`] is the pure state machine (`Collecting`, `Cancelled`,
//! `Complete`); [`CodeEntryCollector`] drives it from a [`KeypadDevice`]
//! with the settle interval, the optional deadline and the masked echo.

use std::time::Duration;

use facegate_core::SecretCode;
use facegate_core::constants::{MSG_ENTRY_CANCELLED, MSG_ENTRY_TIMED_OUT};
use facegate_hardware::{KeypadDevice, KeypadInput};
use tokio::time::{Instant, sleep, timeout_at};
use tracing::{debug, warn};

use crate::config::ControllerConfig;
use crate::console::Console;
use crate::error::EngineResult;

/// Code entry progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Collecting,
    Cancelled,
    Complete,
}

/// What a single key did to the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEffect {
    /// A digit was appended.
    Accepted,

    /// The cancel key discarded the buffer.
    Cancelled,

    /// Non-digit key, or entry already finished.
    Ignored,
}

/// Fixed-length digit buffer.
///
/// # Examples
///
/// ```
/// use facegate_engine::code_entry::{CodeBuffer, EntryState};
/// use facegate_hardware::KeypadInput;
///
/// let mut buffer = CodeBuffer::new(2);
/// buffer.push(KeypadInput::Digit(4));
/// buffer.push(KeypadInput::Star);
/// buffer.push(KeypadInput::Digit(2));
///
/// assert_eq!(buffer.state(), EntryState::Complete);
/// assert_eq!(buffer.into_code().unwrap().expose(), "42");
/// ```
#[derive(Debug, Clone)]
pub struct CodeBuffer {
    digits: Vec<u8>,
    length: usize,
    state: EntryState,
}

impl CodeBuffer {
    pub fn new(length: usize) -> Self {
        Self {
            digits: Vec::with_capacity(length),
            length,
            state: EntryState::Collecting,
        }
    }

    pub fn state(&self) -> EntryState {
        self.state
    }

    /// Digits collected so far.
    pub fn len(&self) -> usize {
        self.digits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.digits.is_empty()
    }

    /// Apply one key press.
    pub fn push(&mut self, input: KeypadInput) -> KeyEffect {
        if self.state != EntryState::Collecting {
            return KeyEffect::Ignored;
        }
        match input {
            KeypadInput::Digit(d) if d <= 9 => {
                self.digits.push(d);
                if self.digits.len() >= self.length {
                    self.state = EntryState::Complete;
                }
                KeyEffect::Accepted
            }
            KeypadInput::Hash => {
                self.digits.clear();
                self.state = EntryState::Cancelled;
                KeyEffect::Cancelled
            }
            _ => KeyEffect::Ignored,
        }
    }

    /// The code, if entry completed.
    pub fn into_code(self) -> Option<SecretCode> {
        match self.state {
            EntryState::Complete => SecretCode::from_digits(&self.digits).ok(),
            _ => None,
        }
    }
}

/// Why code entry produced no code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// The operator pressed `#`.
    CancelKey,

    /// The entry deadline passed.
    Timeout,

    /// The keypad failed mid-entry.
    DeviceError,
}

/// Result of one code entry.
#[derive(Debug, Clone, PartialEq)]
pub enum CodeEntry {
    Complete(SecretCode),
    Cancelled(CancelReason),
}

impl CodeEntry {
    pub fn is_complete(&self) -> bool {
        matches!(self, CodeEntry::Complete(_))
    }
}

/// Collects one code from the keypad.
#[derive(Debug, Clone, Copy)]
pub struct CodeEntryCollector {
    length: usize,
    settle: Duration,
    timeout: Option<Duration>,
}

impl CodeEntryCollector {
    pub fn new(length: usize, settle: Duration) -> Self {
        Self {
            length,
            settle,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn from_config(config: &ControllerConfig) -> Self {
        Self::new(config.code_length, config.settle_interval).with_timeout(config.entry_timeout)
    }

    pub fn length(&self) -> usize {
        self.length
    }

    /// Read keys until the code is complete or entry is cancelled.
    ///
    /// Each accepted digit echoes a mask character and then waits out the
    /// settle interval before the next read. A keypad failure cancels entry.
    ///
    /// # Errors
    ///
    /// Only console failures are returned as errors.
    pub async fn collect<K, C>(&self, keypad: &mut K, console: &mut C) -> EngineResult<CodeEntry>
    where
        K: KeypadDevice,
        C: Console,
    {
        console
            .message(&format!("Enter your {}-digit PIN:", self.length))
            .await?;

        let deadline = self.timeout.map(|t| Instant::now() + t);
        let mut buffer = CodeBuffer::new(self.length);

        loop {
            let read = match deadline {
                Some(deadline) => match timeout_at(deadline, keypad.read_input()).await {
                    Ok(read) => read,
                    Err(_) => {
                        console.end_entry().await?;
                        console.message(MSG_ENTRY_TIMED_OUT).await?;
                        debug!(collected = buffer.len(), "Code entry timed out");
                        return Ok(CodeEntry::Cancelled(CancelReason::Timeout));
                    }
                },
                None => keypad.read_input().await,
            };

            let input = match read {
                Ok(input) => input,
                Err(e) => {
                    warn!(error = %e, "Keypad failed during code entry");
                    console.end_entry().await?;
                    return Ok(CodeEntry::Cancelled(CancelReason::DeviceError));
                }
            };

            match buffer.push(input) {
                KeyEffect::Accepted => {
                    console.echo_mask().await?;
                    if buffer.state() == EntryState::Complete {
                        break;
                    }
                    sleep(self.settle).await;
                }
                KeyEffect::Cancelled => {
                    console.end_entry().await?;
                    console.message(MSG_ENTRY_CANCELLED).await?;
                    debug!("Code entry cancelled by key");
                    return Ok(CodeEntry::Cancelled(CancelReason::CancelKey));
                }
                KeyEffect::Ignored => {}
            }
        }

        console.end_entry().await?;
        debug!(length = buffer.len(), "Code entry complete");
        match buffer.into_code() {
            Some(code) => Ok(CodeEntry::Complete(code)),
            None => Ok(CodeEntry::Cancelled(CancelReason::DeviceError)),
        }
    }
}
