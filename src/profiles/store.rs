//! Mapping entry types for serialization/deserialization
//!
//! These are stored under `[[mapping.overrides]]` in config.toml and are
//! also what `--print-map` emits for a profile.

use serde::{Deserialize, Serialize};

use super::{Chord, CommandMapping, Profile};
use crate::device::KeyIdentity;
use crate::error::{Error, Result};

/// Chord text meaning "explicitly unmapped"
pub const NO_CHORD: &str = "none";

/// One (profile, key) -> chord table entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingOverride {
    pub profile: Profile,
    /// Keycap label, e.g. "LSK1" or "DEP ARR"
    pub key: String,
    /// Chord such as "Ctrl+F1", or "none" for a no-op
    pub chord: String,
}

impl MappingOverride {
    /// Validate the entry into table coordinates
    pub fn resolve(&self) -> Result<(Profile, KeyIdentity, Option<Chord>)> {
        let key =
            KeyIdentity::from_label(&self.key).ok_or_else(|| Error::UnknownKey(self.key.clone()))?;

        let chord = if self.chord.trim().eq_ignore_ascii_case(NO_CHORD) {
            None
        } else {
            Some(self.chord.trim().parse::<Chord>()?)
        };

        Ok((self.profile, key, chord))
    }

    /// Create from a table entry
    pub fn from_entry(profile: Profile, key: KeyIdentity, chord: Option<Chord>) -> Self {
        Self {
            profile,
            key: key.label().to_string(),
            chord: chord
                .map(|c| c.to_string())
                .unwrap_or_else(|| NO_CHORD.to_string()),
        }
    }
}

/// Serializable view of a whole profile table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileTable {
    pub entries: Vec<MappingOverride>,
}

/// Dump every entry of a simulator profile's table
///
/// Returns `None` for Diagnostics, which has no table.
pub fn export_profile(mapping: &CommandMapping, profile: Profile) -> Option<ProfileTable> {
    let entries = KeyIdentity::ALL
        .iter()
        .map(|key| {
            mapping
                .entry(profile, *key)
                .map(|chord| MappingOverride::from_entry(profile, *key, chord))
        })
        .collect::<Option<Vec<_>>>()?;
    Some(ProfileTable { entries })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_entry() {
        let entry = MappingOverride {
            profile: Profile::ProSimPilot,
            key: "dep arr".to_string(),
            chord: "Alt+Shift+F8".to_string(),
        };
        let (profile, key, chord) = entry.resolve().unwrap();
        assert_eq!(profile, Profile::ProSimPilot);
        assert_eq!(key.label(), "DEP ARR");
        assert_eq!(chord, Some("Alt+Shift+F8".parse().unwrap()));
    }

    #[test]
    fn test_resolve_errors() {
        let entry = MappingOverride {
            profile: Profile::PmdgPilot,
            key: "WARP".to_string(),
            chord: "F1".to_string(),
        };
        assert!(matches!(entry.resolve(), Err(Error::UnknownKey(_))));

        let entry = MappingOverride {
            profile: Profile::PmdgPilot,
            key: "LSK1".to_string(),
            chord: "Ctrl+".to_string(),
        };
        assert!(matches!(entry.resolve(), Err(Error::InvalidChord(..))));
    }

    #[test]
    fn test_export_rebuilds_same_table() {
        let mapping = CommandMapping::default();
        let table = export_profile(&mapping, Profile::PmdgCopilot).unwrap();
        assert_eq!(table.entries.len(), KeyIdentity::ALL.len());

        let rebuilt = CommandMapping::build(&table.entries).unwrap();
        for key in KeyIdentity::ALL {
            assert_eq!(
                rebuilt.entry(Profile::PmdgCopilot, key),
                mapping.entry(Profile::PmdgCopilot, key)
            );
        }

        assert!(export_profile(&mapping, Profile::Diagnostics).is_none());
    }

    #[test]
    fn test_override_toml_shape() {
        let toml_text = r#"
            profile = "pmdg_pilot"
            key = "EXEC"
            chord = "Ctrl+Shift+F11"
        "#;
        let entry: MappingOverride = toml::from_str(toml_text).unwrap();
        assert_eq!(entry.profile, Profile::PmdgPilot);
        assert_eq!(entry.key, "EXEC");
    }
}
