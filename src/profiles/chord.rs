//! Keyboard chords sent over the simulator link ("Ctrl+Alt+F5")

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Modifier keys held while the chord key is clicked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        ctrl: false,
        alt: false,
        shift: false,
        meta: false,
    };
    pub const CTRL: Modifiers = Modifiers {
        ctrl: true,
        ..Self::NONE
    };
    pub const ALT: Modifiers = Modifiers {
        alt: true,
        ..Self::NONE
    };
    pub const SHIFT: Modifiers = Modifiers {
        shift: true,
        ..Self::NONE
    };
    pub const META: Modifiers = Modifiers {
        meta: true,
        ..Self::NONE
    };

    /// Union of two modifier sets
    pub const fn with(self, other: Modifiers) -> Modifiers {
        Modifiers {
            ctrl: self.ctrl || other.ctrl,
            alt: self.alt || other.alt,
            shift: self.shift || other.shift,
            meta: self.meta || other.meta,
        }
    }
}

/// The non-modifier key of a chord
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// Function key F1-F20
    F(u8),
    /// Printable character, stored lower-case
    Char(char),
    Space,
    Delete,
    Backspace,
    PageUp,
    PageDown,
    Home,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Chord {
    pub modifiers: Modifiers,
    pub key: KeyCode,
}

impl Chord {
    pub const fn new(modifiers: Modifiers, key: KeyCode) -> Self {
        Self { modifiers, key }
    }

    /// Same key with extra modifiers held
    pub fn layered(self, layer: Modifiers) -> Self {
        Self {
            modifiers: self.modifiers.with(layer),
            key: self.key,
        }
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = self.modifiers;
        for (held, name) in [
            (m.ctrl, "Ctrl"),
            (m.alt, "Alt"),
            (m.meta, "Meta"),
            (m.shift, "Shift"),
        ] {
            if held {
                write!(f, "{}+", name)?;
            }
        }
        match self.key {
            KeyCode::F(n) => write!(f, "F{}", n),
            KeyCode::Char(c) => write!(f, "{}", c),
            KeyCode::Space => f.write_str("Space"),
            KeyCode::Delete => f.write_str("Delete"),
            KeyCode::Backspace => f.write_str("Backspace"),
            KeyCode::PageUp => f.write_str("PageUp"),
            KeyCode::PageDown => f.write_str("PageDown"),
            KeyCode::Home => f.write_str("Home"),
        }
    }
}

impl FromStr for Chord {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |why| Error::InvalidChord(s.to_string(), why);

        // A trailing "+" is the plus key itself ("Ctrl++")
        let (prefix, last) = match s.strip_suffix("++") {
            Some(head) => (head, "+"),
            None if s.trim() == "+" => ("", "+"),
            None => match s.rsplit_once('+') {
                Some((head, last)) => (head, last),
                None => ("", s),
            },
        };

        let mut modifiers = Modifiers::NONE;
        for part in prefix.split('+').filter(|p| !p.is_empty()) {
            let flag = match part.trim().to_ascii_lowercase().as_str() {
                "ctrl" | "control" => &mut modifiers.ctrl,
                "alt" | "option" => &mut modifiers.alt,
                "shift" => &mut modifiers.shift,
                "meta" | "cmd" | "win" | "super" => &mut modifiers.meta,
                _ => return Err(invalid("unknown modifier")),
            };
            if *flag {
                return Err(invalid("repeated modifier"));
            }
            *flag = true;
        }

        let last = last.trim();
        let key = match last.to_ascii_lowercase().as_str() {
            "" => return Err(invalid("missing key")),
            "space" => KeyCode::Space,
            "delete" | "del" => KeyCode::Delete,
            "backspace" => KeyCode::Backspace,
            "pageup" | "pgup" => KeyCode::PageUp,
            "pagedown" | "pgdn" => KeyCode::PageDown,
            "home" => KeyCode::Home,
            lower => {
                let mut chars = lower.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => KeyCode::Char(c),
                    (Some('f'), Some(_)) => {
                        let n: u8 = lower[1..].parse().map_err(|_| invalid("unknown key"))?;
                        if !(1..=20).contains(&n) {
                            return Err(invalid("function key out of range"));
                        }
                        KeyCode::F(n)
                    }
                    _ => return Err(invalid("unknown key")),
                }
            }
        };

        Ok(Chord { modifiers, key })
    }
}
