//! Avionics-suite profiles and the key -> simulator command tables

mod chord;
pub mod selector;
pub mod store;

pub use chord::{Chord, KeyCode, Modifiers};
pub use selector::{profile_from_dip, DipSwitches};
pub use store::MappingOverride;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::device::{KeyIdentity, KEY_COUNT};
use crate::error::{Error, Result};

/// Target avionics suite selected on the DIP switches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Profile {
    /// AeroSoft (pilot side only)
    #[serde(rename = "aerosoft")]
    AeroSoft,
    #[serde(rename = "pmdg_pilot")]
    PmdgPilot,
    #[serde(rename = "pmdg_copilot")]
    PmdgCopilot,
    #[serde(rename = "prosim_pilot")]
    ProSimPilot,
    #[serde(rename = "prosim_copilot")]
    ProSimCopilot,
    /// Echo each key's identity instead of sending simulator commands
    #[serde(rename = "diagnostics")]
    Diagnostics,
}

const SIMULATOR_PROFILE_COUNT: usize = 5;

type Tables = [[Option<Chord>; KEY_COUNT]; SIMULATOR_PROFILE_COUNT];

/// Profiles backed by a command table, in table order
pub const SIMULATOR_PROFILES: [Profile; SIMULATOR_PROFILE_COUNT] = [
    Profile::AeroSoft,
    Profile::PmdgPilot,
    Profile::PmdgCopilot,
    Profile::ProSimPilot,
    Profile::ProSimCopilot,
];

impl Profile {
    /// Row in the command table, `None` for Diagnostics
    fn table_index(self) -> Option<usize> {
        SIMULATOR_PROFILES.iter().position(|p| *p == self)
    }

    /// Modifier layer each simulator profile puts on top of the base chords
    fn layer(self) -> Modifiers {
        match self {
            Profile::AeroSoft => Modifiers::CTRL.with(Modifiers::ALT),
            Profile::PmdgPilot => Modifiers::CTRL,
            Profile::PmdgCopilot => Modifiers::CTRL.with(Modifiers::META),
            Profile::ProSimPilot => Modifiers::ALT,
            Profile::ProSimCopilot => Modifiers::ALT.with(Modifiers::META),
            Profile::Diagnostics => Modifiers::NONE,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Profile::AeroSoft => "aerosoft",
            Profile::PmdgPilot => "pmdg_pilot",
            Profile::PmdgCopilot => "pmdg_copilot",
            Profile::ProSimPilot => "prosim_pilot",
            Profile::ProSimCopilot => "prosim_copilot",
            Profile::Diagnostics => "diagnostics",
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Profile {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match normalized.as_str() {
            "aerosoft" => Ok(Profile::AeroSoft),
            "pmdgpilot" | "pmdg" => Ok(Profile::PmdgPilot),
            "pmdgcopilot" => Ok(Profile::PmdgCopilot),
            "prosimpilot" | "prosim" => Ok(Profile::ProSimPilot),
            "prosimcopilot" => Ok(Profile::ProSimCopilot),
            "diagnostics" | "diag" => Ok(Profile::Diagnostics),
            _ => Err(Error::UnknownProfile(s.to_string())),
        }
    }
}

/// Payload sent over the simulator link
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandAction {
    /// Keyboard chord picked up by the simulator-side scripts
    Keystroke(Chord),
    /// Diagnostics identity echo, typed as text
    Echo(String),
    /// Position intentionally left unused by this profile
    NoOp,
}

/// A mapped command together with the key that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundCommand {
    pub key: KeyIdentity,
    pub action: CommandAction,
}

impl OutboundCommand {
    pub fn is_noop(&self) -> bool {
        self.action == CommandAction::NoOp
    }
}

/// Base chord for every key before the profile layer is applied
fn base_chord(key: KeyIdentity) -> Option<Chord> {
    let sw = key.switch_number();
    let plain = |code| Some(Chord::new(Modifiers::NONE, code));

    match sw {
        // LSK1-6, RSK1-6
        1..=12 => plain(KeyCode::F(sw)),
        // INIT REF .. N1 LIMIT
        13..=24 => Some(Chord::new(Modifiers::SHIFT, KeyCode::F(sw - 12))),
        25 => plain(KeyCode::Home),
        26 => plain(KeyCode::PageUp),
        27 => plain(KeyCode::PageDown),
        54 => plain(KeyCode::Space),
        55 => plain(KeyCode::Delete),
        57 => plain(KeyCode::Backspace),
        60 => plain(KeyCode::Char('-')),
        70 => None,
        _ => {
            // Alpha, digits, "." and "/" send their own character
            let c = key.label().chars().next()?;
            plain(KeyCode::Char(c.to_ascii_lowercase()))
        }
    }
}

/// Immutable (profile, key) -> command table
///
/// Every simulator profile has an entry for every key; `None` is an
/// explicit no-op. Diagnostics has no table.
#[derive(Debug, Clone)]
pub struct CommandMapping {
    tables: Tables,
}

fn default_tables() -> Tables {
    let mut tables = [[None; KEY_COUNT]; SIMULATOR_PROFILE_COUNT];
    for (row, profile) in SIMULATOR_PROFILES.iter().enumerate() {
        let layer = profile.layer();
        for key in KeyIdentity::ALL {
            tables[row][key.index()] = base_chord(key).map(|c| c.layered(layer));
        }
    }
    tables
}

impl CommandMapping {
    /// Build the default tables with overrides applied
    pub fn build(overrides: &[MappingOverride]) -> Result<Self> {
        let mut tables = default_tables();

        for entry in overrides {
            let (profile, key, chord) = entry.resolve()?;
            let row = profile
                .table_index()
                .ok_or(Error::OverrideNotAllowed(profile))?;
            debug!("Override {} {} -> {:?}", profile, key, chord);
            tables[row][key.index()] = chord;
        }

        Ok(Self { tables })
    }

    /// Table entry for a simulator profile; `None` for Diagnostics
    pub fn entry(&self, profile: Profile, key: KeyIdentity) -> Option<Option<Chord>> {
        profile
            .table_index()
            .map(|row| self.tables[row][key.index()])
    }
}

impl Default for CommandMapping {
    fn default() -> Self {
        Self {
            tables: default_tables(),
        }
    }
}

/// Resolves key identities to outbound commands for a profile
#[derive(Debug, Clone, Default)]
pub struct ProfileMapper {
    mapping: CommandMapping,
}

impl ProfileMapper {
    pub fn new(mapping: CommandMapping) -> Self {
        Self { mapping }
    }

    /// Pure lookup of the command for a key under a profile
    pub fn map(&self, key: KeyIdentity, profile: Profile) -> OutboundCommand {
        let action = match self.mapping.entry(profile, key) {
            None => CommandAction::Echo(diagnostic_echo(key)),
            Some(Some(chord)) => CommandAction::Keystroke(chord),
            Some(None) => CommandAction::NoOp,
        };
        OutboundCommand { key, action }
    }

    pub fn mapping(&self) -> &CommandMapping {
        &self.mapping
    }
}

/// Text shown for a key in the Diagnostics profile
pub fn diagnostic_echo(key: KeyIdentity) -> String {
    match key.position() {
        Some((row, col)) => format!(
            "{} SW{:02} R{}C{}",
            key.label(),
            key.switch_number(),
            row + 1,
            col + 1
        ),
        None => format!("{} SW{:02}", key.label(), key.switch_number()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn key(label: &str) -> KeyIdentity {
        KeyIdentity::from_label(label).unwrap()
    }

    #[test]
    fn test_every_key_mapped_for_simulator_profiles() {
        let mapping = CommandMapping::build(&[]).unwrap();
        for profile in SIMULATOR_PROFILES {
            let mut chords = HashSet::new();
            for k in KeyIdentity::ALL {
                let entry = mapping.entry(profile, k).expect("simulator profile has a table");
                if k.is_encoder() {
                    assert_eq!(entry, None);
                } else {
                    let chord = entry.unwrap_or_else(|| panic!("{} unmapped in {}", k, profile));
                    assert!(chords.insert(chord), "{} reuses a chord in {}", k, profile);
                }
            }
        }
    }

    #[test]
    fn test_profile_layers() {
        let mapper = ProfileMapper::default();
        let lsk1 = key("LSK1");

        let cmd = mapper.map(lsk1, Profile::PmdgPilot);
        assert_eq!(cmd.action, CommandAction::Keystroke("Ctrl+F1".parse().unwrap()));

        let cmd = mapper.map(key("EXEC"), Profile::ProSimCopilot);
        assert_eq!(cmd.action, CommandAction::Keystroke("Alt+Meta+Shift+F11".parse().unwrap()));
        assert_eq!(cmd.key, KeyIdentity::EXEC);

        let cmd = mapper.map(key("A"), Profile::AeroSoft);
        assert_eq!(cmd.action, CommandAction::Keystroke("Ctrl+Alt+a".parse().unwrap()));
    }

    #[test]
    fn test_diagnostics_echoes_identity() {
        let mapper = ProfileMapper::default();
        for k in KeyIdentity::ALL {
            let cmd = mapper.map(k, Profile::Diagnostics);
            match cmd.action {
                CommandAction::Echo(text) => assert!(text.starts_with(k.label())),
                other => panic!("expected echo for {}, got {:?}", k, other),
            }
        }
        let cmd = mapper.map(key("LSK5"), Profile::Diagnostics);
        assert_eq!(cmd.action, CommandAction::Echo("LSK5 SW05 R1C5".to_string()));
        let cmd = mapper.map(KeyIdentity::ENCODER_BUTTON, Profile::Diagnostics);
        assert_eq!(cmd.action, CommandAction::Echo("ENCODER SW70".to_string()));
    }

    #[test]
    fn test_map_is_deterministic() {
        let mapper = ProfileMapper::default();
        for profile in SIMULATOR_PROFILES {
            for k in KeyIdentity::ALL {
                assert_eq!(mapper.map(k, profile), mapper.map(k, profile));
            }
        }
    }

    #[test]
    fn test_overrides_apply_to_one_profile() {
        let overrides = vec![
            MappingOverride {
                profile: Profile::PmdgPilot,
                key: "CLR".to_string(),
                chord: "Ctrl+Shift+c".to_string(),
            },
            MappingOverride {
                profile: Profile::PmdgPilot,
                key: "DEL".to_string(),
                chord: "none".to_string(),
            },
        ];
        let mapper = ProfileMapper::new(CommandMapping::build(&overrides).unwrap());

        assert_eq!(
            mapper.map(key("CLR"), Profile::PmdgPilot).action,
            CommandAction::Keystroke("Ctrl+Shift+c".parse().unwrap())
        );
        assert!(mapper.map(key("DEL"), Profile::PmdgPilot).is_noop());
        assert_eq!(
            mapper.map(key("CLR"), Profile::PmdgCopilot).action,
            CommandAction::Keystroke("Ctrl+Meta+Backspace".parse().unwrap())
        );
    }

    #[test]
    fn test_diagnostics_override_rejected() {
        let overrides = vec![MappingOverride {
            profile: Profile::Diagnostics,
            key: "CLR".to_string(),
            chord: "x".to_string(),
        }];
        assert!(matches!(
            CommandMapping::build(&overrides),
            Err(Error::OverrideNotAllowed(Profile::Diagnostics))
        ));
    }

    #[test]
    fn test_profile_from_str() {
        assert_eq!("PMDG-Copilot".parse::<Profile>().unwrap(), Profile::PmdgCopilot);
        assert_eq!("prosim_pilot".parse::<Profile>().unwrap(), Profile::ProSimPilot);
        assert_eq!("AeroSoft".parse::<Profile>().unwrap(), Profile::AeroSoft);
        assert!("xplane".parse::<Profile>().is_err());
    }
}
