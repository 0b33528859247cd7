//! CDU panel constants
//!
//! Keypad matrix (as wired on the FMC board, 1-based):
//!   - 8 rows (R1-R8) x 9 columns (C1-C9) = 72 intersections
//!   - SW01-SW69 fill the matrix row by row; R8 C7-C9 are unpopulated
//!   - SW70 is the encoder push-button on its own digital line
//!
//! Status outputs:
//!   - DIM_CTRL: PWM backlight for all keycaps
//!   - LED_MSG, LED_CALL, LED_FAIL, LED_OFST: status annunciators
//!   - LED_EXEC: passthrough of the simulator EXEC light
//!   - BUZZER: audible key click

/// Number of matrix rows
pub const MATRIX_ROWS: usize = 8;

/// Number of matrix columns
pub const MATRIX_COLS: usize = 9;

/// Number of physical keypad switches in the matrix
pub const MATRIX_KEY_COUNT: usize = 69;

/// Key identities including the synthetic encoder push-button
pub const KEY_COUNT: usize = MATRIX_KEY_COUNT + 1;

/// Number of DIP switches used for profile selection
pub const DIP_SWITCH_COUNT: u8 = 3;

/// Default debounce window in milliseconds
pub const DEBOUNCE_MS: u64 = 8;

/// Default longest press that still counts as a click
pub const CLICK_MAX_MS: u64 = 250;

/// Default window for the second click of a double-click
pub const DOUBLE_CLICK_MS: u64 = 400;

/// Long press threshold in milliseconds (LCD settings entry)
pub const LONG_PRESS_MS: u64 = 3000;

/// Default idle time before LCD settings mode falls back to normal
pub const SETTINGS_IDLE_MS: u64 = 10_000;

/// Default LED flash half-period
pub const FLASH_PERIOD_MS: u64 = 250;

/// Default buzzer click pulse width
pub const BUZZER_PULSE_MS: u64 = 4;

/// Default control loop cadence on the bench
pub const SCAN_PERIOD_MS: u64 = 1;

/// Quadrature transitions per reported rotation step
///
/// One event per valid transition; 4 suits encoders with a full cycle
/// per detent.
pub const STEPS_PER_DETENT: u8 = 1;

/// Convert a zero-based matrix position to its switch number (SW01-SW69)
///
/// Returns `None` for the unpopulated intersections.
#[inline]
pub fn switch_number_at(row: usize, col: usize) -> Option<u8> {
    if row >= MATRIX_ROWS || col >= MATRIX_COLS {
        return None;
    }
    let index = row * MATRIX_COLS + col;
    if index < MATRIX_KEY_COUNT {
        Some(index as u8 + 1)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_switch_numbers_fill_rows_first() {
        assert_eq!(switch_number_at(0, 0), Some(1));
        assert_eq!(switch_number_at(0, 8), Some(9));
        assert_eq!(switch_number_at(1, 0), Some(10));
        assert_eq!(switch_number_at(7, 5), Some(69));
    }

    #[test]
    fn test_unpopulated_positions() {
        assert_eq!(switch_number_at(7, 6), None);
        assert_eq!(switch_number_at(7, 8), None);
        assert_eq!(switch_number_at(8, 0), None);
        assert_eq!(switch_number_at(0, 9), None);
    }
}
