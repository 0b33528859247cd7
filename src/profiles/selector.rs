//! DIP-switch profile readout (DS_1..DS_3)

use super::Profile;
use crate::device::DIP_SWITCH_COUNT;

/// Decode the 3-bit DIP value (DS_1 is bit 0)
///
/// Reserved codes 5 and 6 fall back to Diagnostics.
pub fn profile_from_dip(value: u8) -> Profile {
    match value & ((1 << DIP_SWITCH_COUNT) - 1) {
        0 => Profile::AeroSoft,
        1 => Profile::PmdgPilot,
        2 => Profile::PmdgCopilot,
        3 => Profile::ProSimPilot,
        4 => Profile::ProSimCopilot,
        _ => Profile::Diagnostics,
    }
}

/// DIP-switch bank state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DipSwitches {
    pub switches: [bool; DIP_SWITCH_COUNT as usize],
}

impl DipSwitches {
    pub fn from_value(value: u8) -> Self {
        let mut switches = [false; DIP_SWITCH_COUNT as usize];
        for (bit, on) in switches.iter_mut().enumerate() {
            *on = value & (1 << bit) != 0;
        }
        Self { switches }
    }

    pub fn value(&self) -> u8 {
        self.switches
            .iter()
            .enumerate()
            .fold(0, |acc, (bit, on)| acc | ((*on as u8) << bit))
    }

    pub fn profile(&self) -> Profile {
        profile_from_dip(self.value())
    }
}
