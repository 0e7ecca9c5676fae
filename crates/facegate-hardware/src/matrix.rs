//! Row-scanned 4x4 membrane keypad.
//!
//! The lines are active-low, as on the usual membrane wiring: rows idle
//! high, the scanned row is pulled low, and the columns have pull-ups, so a
//! pressed key shows as a column reading low while its row is selected. The
//! pin layer is behind [`KeypadMatrix`] so the scanner runs against real
//! GPIO or a fake.

use std::time::Duration;

use tracing::trace;

use crate::{
    Result,
    traits::{KeypadDevice, KeypadInput},
    types::DeviceInfo,
};

/// Number of row lines.
pub const ROWS: usize = 4;

/// Number of column lines.
pub const COLUMNS: usize = 4;

/// Key legends indexed by `[row][column]`.
pub const KEYPAD_LAYOUT: [[char; COLUMNS]; ROWS] = [
    ['1', '2', '3', 'A'],
    ['4', '5', '6', 'B'],
    ['7', '8', '9', 'C'],
    ['*', '0', '#', 'D'],
];

/// Delay between full scans when no key is down.
pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_millis(100);

/// Pin-level access to a keypad matrix.
///
/// Levels are electrical: `true` is a high line. Implementors pass them
/// through without inverting.
pub trait KeypadMatrix: Send + Sync {
    /// Drive a row line high (`true`, idle) or low (`false`, selected).
    fn set_row(&mut self, row: usize, high: bool) -> Result<()>;

    /// Sample a column line. A pulled-up column reads high until a key on
    /// the selected row connects it.
    fn read_column(&mut self, column: usize) -> Result<bool>;
}

/// Key legend at a matrix position.
pub fn key_at(row: usize, column: usize) -> Option<KeypadInput> {
    KEYPAD_LAYOUT
        .get(row)
        .and_then(|r| r.get(column))
        .and_then(|&c| KeypadInput::from_char(c))
}

/// [`KeypadDevice`] implemented by polling a [`KeypadMatrix`].
#[derive(Debug)]
pub struct MatrixKeypad<M> {
    matrix: M,
    scan_interval: Duration,
    rows_idle: bool,
}

impl<M: KeypadMatrix> MatrixKeypad<M> {
    pub fn new(matrix: M) -> Self {
        Self {
            matrix,
            scan_interval: DEFAULT_SCAN_INTERVAL,
            rows_idle: false,
        }
    }

    pub fn with_scan_interval(mut self, interval: Duration) -> Self {
        self.scan_interval = interval;
        self
    }

    /// One pass over every row. Returns the first key found down.
    pub fn scan_once(&mut self) -> Result<Option<KeypadInput>> {
        if !self.rows_idle {
            // rows may power up low, which would select all of them at once
            for row in 0..ROWS {
                self.matrix.set_row(row, true)?;
            }
            self.rows_idle = true;
        }

        for row in 0..ROWS {
            self.matrix.set_row(row, false)?;
            let hit = self.read_row(row);
            // the row is released even when sampling failed
            self.matrix.set_row(row, true)?;
            if let Some(key) = hit? {
                return Ok(Some(key));
            }
        }
        Ok(None)
    }

    fn read_row(&mut self, row: usize) -> Result<Option<KeypadInput>> {
        for column in 0..COLUMNS {
            if !self.matrix.read_column(column)? {
                trace!(row, column, "Matrix key down");
                return Ok(key_at(row, column));
            }
        }
        Ok(None)
    }

    pub fn into_inner(self) -> M {
        self.matrix
    }
}

impl<M: KeypadMatrix> KeypadDevice for MatrixKeypad<M> {
    async fn read_input(&mut self) -> Result<KeypadInput> {
        loop {
            if let Some(key) = self.scan_once()? {
                return Ok(key);
            }
            tokio::time::sleep(self.scan_interval).await;
        }
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        Ok(DeviceInfo::new("4x4 Matrix Keypad", "Membrane 4x4"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HardwareError;
    use rstest::rstest;
    use std::collections::VecDeque;

    /// Active-low fake matrix: each scan pops the next scripted key
    /// position. Rows power up low.
    #[derive(Default)]
    struct FakeMatrix {
        script: VecDeque<Option<(usize, usize)>>,
        current: Option<(usize, usize)>,
        row_high: [bool; ROWS],
        scans: usize,
        fail_reads: bool,
    }

    impl FakeMatrix {
        fn selected_rows(&self) -> Vec<usize> {
            (0..ROWS).filter(|&r| !self.row_high[r]).collect()
        }
    }

    impl KeypadMatrix for FakeMatrix {
        fn set_row(&mut self, row: usize, high: bool) -> Result<()> {
            if !high && row == 0 {
                self.scans += 1;
                self.current = self.script.pop_front().flatten();
            }
            self.row_high[row] = high;
            Ok(())
        }

        fn read_column(&mut self, column: usize) -> Result<bool> {
            if self.fail_reads {
                return Err(HardwareError::communication("column line fault"));
            }
            let pressed = self
                .selected_rows()
                .into_iter()
                .any(|row| self.current == Some((row, column)));
            Ok(!pressed)
        }
    }

    #[rstest]
    #[case(0, 0, KeypadInput::Digit(1))]
    #[case(0, 3, KeypadInput::Letter('A'))]
    #[case(2, 2, KeypadInput::Digit(9))]
    #[case(3, 0, KeypadInput::Star)]
    #[case(3, 1, KeypadInput::Digit(0))]
    #[case(3, 2, KeypadInput::Hash)]
    #[case(3, 3, KeypadInput::Letter('D'))]
    fn test_key_at(#[case] row: usize, #[case] column: usize, #[case] expected: KeypadInput) {
        assert_eq!(key_at(row, column), Some(expected));
    }

    #[test]
    fn test_key_at_out_of_bounds() {
        assert_eq!(key_at(4, 0), None);
        assert_eq!(key_at(0, 4), None);
    }

    #[test]
    fn test_scan_once_finds_key() {
        let mut matrix = FakeMatrix::default();
        matrix.script.push_back(Some((1, 2)));
        let mut keypad = MatrixKeypad::new(matrix);

        assert_eq!(keypad.scan_once().unwrap(), Some(KeypadInput::Digit(6)));
        assert!(keypad.into_inner().selected_rows().is_empty());
    }

    #[test]
    fn test_scan_once_propagates_read_error() {
        let matrix = FakeMatrix {
            fail_reads: true,
            ..FakeMatrix::default()
        };
        let mut keypad = MatrixKeypad::new(matrix);

        assert!(keypad.scan_once().is_err());
        assert!(keypad.into_inner().selected_rows().is_empty());
    }

    #[test]
    fn test_idle_pulled_up_columns_are_not_presses() {
        let mut keypad = MatrixKeypad::new(FakeMatrix::default());

        assert_eq!(keypad.scan_once().unwrap(), None);

        let matrix = keypad.into_inner();
        assert_eq!(matrix.row_high, [true; ROWS]);
        assert_eq!(matrix.scans, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_input_polls_until_pressed() {
        let mut matrix = FakeMatrix::default();
        matrix.script.extend([None, None, Some((3, 2))]);
        let mut keypad = MatrixKeypad::new(matrix);

        let started = tokio::time::Instant::now();
        assert_eq!(keypad.read_input().await.unwrap(), KeypadInput::Hash);
        assert_eq!(started.elapsed(), DEFAULT_SCAN_INTERVAL * 2);
        assert_eq!(keypad.into_inner().scans, 3);
    }
}
