//! Operator console.
//!
//! The console is the interactive surface of a session: the workflow
//! selection prompt, the enrollment name prompt, the capture trigger, status
//! messages and the masked echo during code entry.

#![allow(async_fn_in_trait)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::EngineResult;

/// Operator-facing text channel.
pub trait Console: Send {
    /// Show `text` and read one line. `Ok(None)` means the input is closed.
    async fn prompt(&mut self, text: &str) -> EngineResult<Option<String>>;

    /// Show a status line.
    async fn message(&mut self, text: &str) -> EngineResult<()>;

    /// Echo one masked character for an accepted digit.
    async fn echo_mask(&mut self) -> EngineResult<()>;

    /// End the masked echo line.
    async fn end_entry(&mut self) -> EngineResult<()>;

    /// Called once per preview frame during enrollment; `true` captures that
    /// frame.
    async fn capture_trigger(&mut self) -> EngineResult<bool>;
}

/// Everything a [`ScriptedConsole`] showed, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleEvent {
    Prompt(String),
    Message(String),
    Mask,
    EndEntry,
}

#[derive(Debug, Default)]
struct ScriptState {
    lines: VecDeque<String>,
    triggers: VecDeque<bool>,
    events: Vec<ConsoleEvent>,
    trigger_checks: usize,
}

/// Console driven by a script, for tests and demos.
///
/// Prompts pop queued lines; once the queue is empty every prompt reads as
/// end of input. Capture triggers pop queued answers and fire when the queue
/// is empty.
///
/// # Examples
///
/// ```
/// use facegate_engine::console::{Console, ScriptedConsole};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> facegate_engine::EngineResult<()> {
/// let (mut console, handle) = ScriptedConsole::new();
/// handle.push_line("unlock");
///
/// assert_eq!(console.prompt("choose: ").await?.as_deref(), Some("unlock"));
/// assert_eq!(console.prompt("choose: ").await?, None);
/// assert_eq!(handle.prompts(), vec!["choose: ", "choose: "]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ScriptedConsole {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedConsole {
    pub fn new() -> (Self, ScriptedConsoleHandle) {
        let state = Arc::new(Mutex::new(ScriptState::default()));
        (
            Self {
                state: Arc::clone(&state),
            },
            ScriptedConsoleHandle { state },
        )
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut ScriptState) -> T) -> T {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }
}

impl Default for ScriptedConsole {
    fn default() -> Self {
        Self::new().0
    }
}

impl Console for ScriptedConsole {
    async fn prompt(&mut self, text: &str) -> EngineResult<Option<String>> {
        Ok(self.with_state(|s| {
            s.events.push(ConsoleEvent::Prompt(text.to_string()));
            s.lines.pop_front()
        }))
    }

    async fn message(&mut self, text: &str) -> EngineResult<()> {
        self.with_state(|s| s.events.push(ConsoleEvent::Message(text.to_string())));
        Ok(())
    }

    async fn echo_mask(&mut self) -> EngineResult<()> {
        self.with_state(|s| s.events.push(ConsoleEvent::Mask));
        Ok(())
    }

    async fn end_entry(&mut self) -> EngineResult<()> {
        self.with_state(|s| s.events.push(ConsoleEvent::EndEntry));
        Ok(())
    }

    async fn capture_trigger(&mut self) -> EngineResult<bool> {
        Ok(self.with_state(|s| {
            s.trigger_checks += 1;
            s.triggers.pop_front().unwrap_or(true)
        }))
    }
}

/// Handle for scripting a [`ScriptedConsole`] and inspecting its output.
#[derive(Debug, Clone)]
pub struct ScriptedConsoleHandle {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedConsoleHandle {
    fn with_state<T>(&self, f: impl FnOnce(&mut ScriptState) -> T) -> T {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }

    /// Queue an operator input line.
    pub fn push_line(&self, line: &str) {
        self.with_state(|s| s.lines.push_back(line.to_string()));
    }

    /// Queue capture trigger answers for successive preview frames.
    pub fn push_triggers(&self, triggers: &[bool]) {
        self.with_state(|s| s.triggers.extend(triggers.iter().copied()));
    }

    pub fn events(&self) -> Vec<ConsoleEvent> {
        self.with_state(|s| s.events.clone())
    }

    pub fn prompts(&self) -> Vec<String> {
        self.with_state(|s| {
            s.events
                .iter()
                .filter_map(|e| match e {
                    ConsoleEvent::Prompt(p) => Some(p.clone()),
                    _ => None,
                })
                .collect()
        })
    }

    pub fn messages(&self) -> Vec<String> {
        self.with_state(|s| {
            s.events
                .iter()
                .filter_map(|e| match e {
                    ConsoleEvent::Message(m) => Some(m.clone()),
                    _ => None,
                })
                .collect()
        })
    }

    /// Whether any message contains `needle`.
    pub fn showed(&self, needle: &str) -> bool {
        self.messages().iter().any(|m| m.contains(needle))
    }

    /// Number of masked characters echoed.
    pub fn masks(&self) -> usize {
        self.with_state(|s| {
            s.events
                .iter()
                .filter(|e| matches!(e, ConsoleEvent::Mask))
                .count()
        })
    }

    pub fn trigger_checks(&self) -> usize {
        self.with_state(|s| s.trigger_checks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_trigger_defaults_to_capture() {
        let (mut console, handle) = ScriptedConsole::new();
        handle.push_triggers(&[false, false]);

        assert!(!console.capture_trigger().await.unwrap());
        assert!(!console.capture_trigger().await.unwrap());
        assert!(console.capture_trigger().await.unwrap());
        assert_eq!(handle.trigger_checks(), 3);
    }

    #[tokio::test]
    async fn test_events_are_recorded_in_order() {
        let (mut console, handle) = ScriptedConsole::new();

        console.message("hello").await.unwrap();
        console.echo_mask().await.unwrap();
        console.echo_mask().await.unwrap();
        console.end_entry().await.unwrap();

        assert_eq!(
            handle.events(),
            vec![
                ConsoleEvent::Message("hello".to_string()),
                ConsoleEvent::Mask,
                ConsoleEvent::Mask,
                ConsoleEvent::EndEntry,
            ]
        );
        assert_eq!(handle.masks(), 2);
        assert!(handle.showed("hell"));
    }
}
