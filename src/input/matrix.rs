use std::time::{Duration, Instant};
use tracing::debug;

use super::debounce::Debouncer;
use super::{KeyEvent, Transition};
use crate::device::{KeyIdentity, MatrixLines, MATRIX_COLS, MATRIX_ROWS};

/// Debounced scanner for the 8x9 keypad matrix
pub struct MatrixScanner {
    cells: [[Debouncer; MATRIX_COLS]; MATRIX_ROWS],
    debounce: Duration,
}

impl MatrixScanner {
    pub fn new(debounce: Duration) -> Self {
        Self {
            cells: [[Debouncer::default(); MATRIX_COLS]; MATRIX_ROWS],
            debounce,
        }
    }

    /// Scan every populated intersection once
    ///
    /// Events come out in row-major order. Simultaneous presses are
    /// reported independently; there is no chord handling.
    pub fn poll(&mut self, lines: &mut impl MatrixLines, now: Instant) -> Vec<KeyEvent> {
        let mut events = Vec::new();

        for row in 0..MATRIX_ROWS {
            lines.select_row(row);
            for col in 0..MATRIX_COLS {
                let Some(key) = KeyIdentity::at(row, col) else {
                    continue;
                };
                let level = lines.column_active(col);
                if let Some(pressed) = self.cells[row][col].sample(level, now, self.debounce) {
                    let transition = if pressed {
                        Transition::Pressed
                    } else {
                        Transition::Released
                    };
                    debug!("Key {} {:?}", key, transition);
                    events.push(KeyEvent {
                        key,
                        transition,
                        at: now,
                    });
                }
            }
            lines.release_row(row);
        }

        events
    }

    /// Whether the debounced state of a key is currently pressed
    pub fn is_pressed(&self, key: KeyIdentity) -> bool {
        key.position()
            .map(|(row, col)| self.cells[row][col].is_active())
            .unwrap_or(false)
    }
}
