use enigo::{Direction, Enigo, Key as EnigoKey, Keyboard, Settings};
use tracing::{debug, warn};

use crate::device::CommandSink;
use crate::error::{Error, Result};
use crate::profiles::{Chord, CommandAction, KeyCode, OutboundCommand};

/// Sends mapped commands to the focused simulator window as keystrokes
pub struct KeystrokeSender {
    enigo: Option<Enigo>,
}

impl KeystrokeSender {
    /// Connect to the platform input system
    ///
    /// When that fails the sender stays usable but every send reports the
    /// link as unavailable.
    pub fn new() -> Self {
        let enigo = match Enigo::new(&Settings::default()) {
            Ok(enigo) => Some(enigo),
            Err(e) => {
                warn!("Keystroke injection unavailable: {}", e);
                None
            }
        };
        Self { enigo }
    }

    pub fn is_available(&self) -> bool {
        self.enigo.is_some()
    }

    /// Press modifiers, click the key, release modifiers in reverse order
    fn send_chord(enigo: &mut Enigo, chord: Chord) -> Result<()> {
        let modifiers = modifier_keys(chord);
        debug!("Sending chord: {}", chord);

        for modifier in &modifiers {
            enigo.key(*modifier, Direction::Press).map_err(link_error)?;
        }

        let clicked = enigo.key(enigo_key(chord.key), Direction::Click).map_err(link_error);

        for modifier in modifiers.iter().rev() {
            let _ = enigo.key(*modifier, Direction::Release);
        }
        clicked
    }

    fn send_text(enigo: &mut Enigo, text: &str) -> Result<()> {
        debug!("Sending text: {}", text);
        enigo.text(text).map_err(link_error)?;
        enigo
            .key(EnigoKey::Return, Direction::Click)
            .map_err(link_error)
    }
}

impl Default for KeystrokeSender {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandSink for KeystrokeSender {
    fn send(&mut self, command: &OutboundCommand) -> Result<()> {
        let enigo = self
            .enigo
            .as_mut()
            .ok_or_else(|| Error::SinkUnavailable("keystroke injection not initialised".into()))?;

        match &command.action {
            CommandAction::Keystroke(chord) => Self::send_chord(enigo, *chord),
            CommandAction::Echo(text) => Self::send_text(enigo, text),
            CommandAction::NoOp => Ok(()),
        }
    }
}

fn link_error(e: enigo::InputError) -> Error {
    Error::SinkUnavailable(e.to_string())
}

fn modifier_keys(chord: Chord) -> Vec<EnigoKey> {
    let m = chord.modifiers;
    [
        (m.ctrl, EnigoKey::Control),
        (m.alt, EnigoKey::Alt),
        (m.shift, EnigoKey::Shift),
        (m.meta, EnigoKey::Meta),
    ]
    .into_iter()
    .filter_map(|(held, key)| held.then_some(key))
    .collect()
}

fn enigo_key(code: KeyCode) -> EnigoKey {
    match code {
        KeyCode::F(n) => match n {
            1 => EnigoKey::F1,
            2 => EnigoKey::F2,
            3 => EnigoKey::F3,
            4 => EnigoKey::F4,
            5 => EnigoKey::F5,
            6 => EnigoKey::F6,
            7 => EnigoKey::F7,
            8 => EnigoKey::F8,
            9 => EnigoKey::F9,
            10 => EnigoKey::F10,
            11 => EnigoKey::F11,
            12 => EnigoKey::F12,
            13 => EnigoKey::F13,
            14 => EnigoKey::F14,
            15 => EnigoKey::F15,
            16 => EnigoKey::F16,
            17 => EnigoKey::F17,
            18 => EnigoKey::F18,
            19 => EnigoKey::F19,
            _ => EnigoKey::F20,
        },
        KeyCode::Char(c) => EnigoKey::Unicode(c),
        KeyCode::Space => EnigoKey::Space,
        KeyCode::Delete => EnigoKey::Delete,
        KeyCode::Backspace => EnigoKey::Backspace,
        KeyCode::PageUp => EnigoKey::PageUp,
        KeyCode::PageDown => EnigoKey::PageDown,
        KeyCode::Home => EnigoKey::Home,
    }
}
