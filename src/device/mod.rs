//! Hardware seams between the firmware core and the platform layer
//!
//! Every physical line the CDU touches is reached through one of these
//! traits. A real board wires them to GPIO; the bench binary and the tests
//! use in-memory boards.

pub mod bench;
mod buttons;
mod protocol;

pub use buttons::*;
pub use protocol::*;

use crate::display::{LedZone, PanelButton};
use crate::error::Result;
use crate::profiles::{OutboundCommand, Profile};

/// Row/column lines of the keypad matrix
pub trait MatrixLines {
    /// Drive one row active; all other rows stay idle
    fn select_row(&mut self, row: usize);

    /// Sample one column while a row is selected
    fn column_active(&mut self, col: usize) -> bool;

    /// Return the selected row to idle
    fn release_row(&mut self, row: usize);
}

/// Quadrature and push-button lines of the rotary encoder
pub trait EncoderLines {
    /// Current (A, B) phase levels
    fn phases(&mut self) -> (bool, bool);

    /// Raw push-button level, `true` while closed
    fn button_closed(&mut self) -> bool;
}

/// PWM outputs for backlight and status LEDs
pub trait LedOutputs {
    fn set_level(&mut self, zone: LedZone, level: u8);
}

/// Buzzer and EXEC passthrough lines
pub trait FeedbackOutputs {
    fn set_buzzer(&mut self, on: bool);

    fn toggle_exec_led(&mut self);
}

/// Simulator-facing command link
pub trait CommandSink {
    fn send(&mut self, command: &OutboundCommand) -> Result<()>;
}

/// LCD driver board control contacts
pub trait PanelSink {
    fn send_panel_button(&mut self, button: PanelButton) -> Result<()>;
}

/// DIP-switch profile selector
pub trait ProfileSelector {
    fn read_profile(&mut self) -> Profile;
}

/// Everything the control loop needs from a board
pub trait Board:
    MatrixLines + EncoderLines + LedOutputs + FeedbackOutputs + CommandSink + PanelSink + ProfileSelector
{
}

impl<T> Board for T where
    T: MatrixLines
        + EncoderLines
        + LedOutputs
        + FeedbackOutputs
        + CommandSink
        + PanelSink
        + ProfileSelector
{
}
