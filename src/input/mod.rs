mod debounce;
pub mod encoder;
pub mod handler;
pub mod keystrokes;
pub mod matrix;

pub use debounce::Debouncer;
pub use encoder::{EncoderTracker, GestureTiming};
pub use handler::InputHandler;
pub use keystrokes::KeystrokeSender;
pub use matrix::MatrixScanner;

use std::time::Instant;

use crate::device::KeyIdentity;

/// Debounced edge of a matrix key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Pressed,
    Released,
}

/// One debounced matrix transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: KeyIdentity,
    pub transition: Transition,
    pub at: Instant,
}

/// Encoder gesture kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncoderEventKind {
    RotateCw,
    RotateCcw,
    ButtonDown,
    ButtonUp,
    ButtonClick,
    ButtonDoubleClick,
    ButtonLongPress,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderEvent {
    pub kind: EncoderEventKind,
    pub at: Instant,
}
