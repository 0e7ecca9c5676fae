//! Terminal-backed devices for running on a development host.
//!
//! The console, the keypad and the operator ranger all read lines from one
//! shared [`LineSource`], so a single terminal drives the whole session: the
//! operator presses Enter when a visitor arrives, answers the prompts and
//! types the code digits followed by Enter. [`LoggedOutputs`] stands in for
//! the indicator and lock actuator.

use std::collections::VecDeque;
use std::io::{BufRead, BufReader, Write};
use std::sync::Arc;
use std::thread;

use facegate_engine::{Console, EngineError, EngineResult};
use facegate_hardware::{
    DeviceInfo, DistanceSensor, HardwareError, KeypadDevice, KeypadInput, LedColor, OutputDevice,
    Result,
};
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info};

/// Lines buffered between the reader thread and the controller.
const LINE_BUFFER: usize = 64;

/// Shared, line-oriented operator input.
///
/// Lines are read on a dedicated thread and forwarded over a channel, so a
/// pending read never holds up runtime shutdown. The thread ends at end of
/// input or once every clone of the source is dropped and another line
/// arrives.
#[derive(Clone)]
pub struct LineSource {
    lines: Arc<Mutex<mpsc::Receiver<std::io::Result<String>>>>,
}

impl LineSource {
    pub fn stdin() -> Self {
        Self::from_reader(BufReader::new(std::io::stdin()))
    }

    pub fn from_reader<R>(reader: R) -> Self
    where
        R: BufRead + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(LINE_BUFFER);
        thread::spawn(move || {
            for line in reader.lines() {
                if tx.blocking_send(line).is_err() {
                    break;
                }
            }
            debug!("Operator input reader finished");
        });

        Self {
            lines: Arc::new(Mutex::new(rx)),
        }
    }

    /// Next line without its terminator; `None` at end of input.
    pub async fn next_line(&self) -> std::io::Result<Option<String>> {
        self.lines.lock().await.recv().await.transpose()
    }
}

fn print_flush(text: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(text.as_bytes())?;
    stdout.flush()
}

/// Console on stdout reading answers from a [`LineSource`].
pub struct TerminalConsole {
    input: LineSource,
}

impl TerminalConsole {
    pub fn new(input: LineSource) -> Self {
        Self { input }
    }
}

impl Console for TerminalConsole {
    async fn prompt(&mut self, text: &str) -> EngineResult<Option<String>> {
        print_flush(text)?;
        Ok(self.input.next_line().await?)
    }

    async fn message(&mut self, text: &str) -> EngineResult<()> {
        print_flush(&format!("{text}\n"))?;
        Ok(())
    }

    async fn echo_mask(&mut self) -> EngineResult<()> {
        print_flush("*")?;
        Ok(())
    }

    async fn end_entry(&mut self) -> EngineResult<()> {
        print_flush("\n")?;
        Ok(())
    }

    async fn capture_trigger(&mut self) -> EngineResult<bool> {
        match self.input.next_line().await? {
            Some(_) => Ok(true),
            None => Err(EngineError::InputClosed),
        }
    }
}

/// Keypad fed by typed lines; each recognised character is one key press.
pub struct LineKeypad {
    input: LineSource,
    pending: VecDeque<KeypadInput>,
}

impl LineKeypad {
    pub fn new(input: LineSource) -> Self {
        Self {
            input,
            pending: VecDeque::new(),
        }
    }
}

impl KeypadDevice for LineKeypad {
    async fn read_input(&mut self) -> Result<KeypadInput> {
        loop {
            if let Some(key) = self.pending.pop_front() {
                return Ok(key);
            }
            let Some(line) = self.input.next_line().await? else {
                return Err(HardwareError::disconnected("terminal keypad"));
            };
            for c in line.chars() {
                match KeypadInput::from_char(c) {
                    Some(key) => self.pending.push_back(key),
                    None if c.is_whitespace() => {}
                    None => debug!(key = %c, "Ignoring unmapped key"),
                }
            }
        }
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        Ok(DeviceInfo::new("Terminal Keypad", "Line input"))
    }
}

/// Reading reported by the operator ranger when a visitor is announced.
pub const OPERATOR_PRESENCE_CM: f64 = 0.0;

/// Emulated distance sensor.
pub enum SimulatedRanger {
    /// Always reports the same distance.
    Fixed(f64),

    /// Blocks until the operator presses Enter, then reports a visitor.
    /// End of input also reads as a visitor so the session observes the
    /// closed console and the controller stops.
    Operator(LineSource),
}

impl DistanceSensor for SimulatedRanger {
    async fn read_distance_cm(&mut self) -> Result<f64> {
        match self {
            Self::Fixed(cm) => Ok(*cm),
            Self::Operator(input) => {
                if input.next_line().await?.is_none() {
                    debug!("Operator input closed");
                }
                Ok(OPERATOR_PRESENCE_CM)
            }
        }
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        let model = match self {
            Self::Fixed(_) => "Fixed distance",
            Self::Operator(_) => "Operator triggered",
        };
        Ok(DeviceInfo::new("Simulated Ranger", model))
    }
}

/// Outputs that only log what a real indicator and actuator would do.
#[derive(Debug)]
pub struct LoggedOutputs {
    indicator: LedColor,
    actuator: bool,
}

impl LoggedOutputs {
    pub fn new() -> Self {
        Self {
            indicator: LedColor::Off,
            actuator: false,
        }
    }
}

impl Default for LoggedOutputs {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputDevice for LoggedOutputs {
    async fn set_indicator(&mut self, color: LedColor) -> Result<()> {
        if color != self.indicator {
            info!(?color, "Indicator");
        }
        self.indicator = color;
        Ok(())
    }

    async fn set_actuator(&mut self, active: bool) -> Result<()> {
        if active != self.actuator {
            info!(active, "Lock actuator");
        }
        self.actuator = active;
        Ok(())
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        Ok(DeviceInfo::new("Logged Outputs", "Log only"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn source(text: &'static str) -> LineSource {
        LineSource::from_reader(text.as_bytes())
    }

    #[tokio::test]
    async fn test_keypad_splits_lines_into_keys() {
        let mut keypad = LineKeypad::new(source("12 3\n#x9\n"));

        let mut keys = Vec::new();
        for _ in 0..5 {
            keys.push(keypad.read_input().await.unwrap());
        }

        assert_eq!(
            keys,
            vec![
                KeypadInput::Digit(1),
                KeypadInput::Digit(2),
                KeypadInput::Digit(3),
                KeypadInput::Hash,
                KeypadInput::Digit(9),
            ]
        );
        assert!(keypad.read_input().await.is_err());
    }

    #[tokio::test]
    async fn test_keypad_skips_blank_lines() {
        let mut keypad = LineKeypad::new(source("\n\n7\n"));

        assert_eq!(keypad.read_input().await.unwrap(), KeypadInput::Digit(7));
    }

    #[tokio::test]
    async fn test_console_and_keypad_share_input() {
        let input = source("unlock\n123456\n");
        let mut console = TerminalConsole::new(input.clone());
        let mut keypad = LineKeypad::new(input);

        assert_eq!(console.prompt("> ").await.unwrap().as_deref(), Some("unlock"));
        assert_eq!(keypad.read_input().await.unwrap(), KeypadInput::Digit(1));
        assert_eq!(console.prompt("> ").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_capture_trigger_needs_a_line() {
        let mut console = TerminalConsole::new(source("\n"));

        assert!(console.capture_trigger().await.unwrap());
        assert!(matches!(
            console.capture_trigger().await,
            Err(EngineError::InputClosed)
        ));
    }

    #[tokio::test]
    async fn test_fixed_ranger() {
        let mut ranger = SimulatedRanger::Fixed(35.0);

        assert_eq!(ranger.read_distance_cm().await.unwrap(), 35.0);
        assert_eq!(ranger.read_distance_cm().await.unwrap(), 35.0);
    }

    #[tokio::test]
    async fn test_operator_ranger_reports_presence_per_line() {
        let mut ranger = SimulatedRanger::Operator(source("\n"));

        assert_eq!(ranger.read_distance_cm().await.unwrap(), OPERATOR_PRESENCE_CM);
        assert_eq!(ranger.read_distance_cm().await.unwrap(), OPERATOR_PRESENCE_CM);
    }

    #[tokio::test]
    async fn test_logged_outputs_track_state() {
        let mut outputs = LoggedOutputs::new();

        outputs.set_indicator(LedColor::Green).await.unwrap();
        outputs.pulse_actuator(Duration::from_millis(1)).await.unwrap();
        assert_eq!(outputs.indicator, LedColor::Green);
        assert!(!outputs.actuator);

        outputs.set_actuator(true).await.unwrap();
        outputs.all_off().await.unwrap();
        assert_eq!(outputs.indicator, LedColor::Off);
        assert!(!outputs.actuator);
    }
}
