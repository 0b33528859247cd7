use std::time::{Duration, Instant};
use tracing::debug;

use crate::device::LedOutputs;

/// Independently driven LED groups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LedZone {
    /// Keycap backlighting for all 69 keys (DIM_CTRL)
    Backlight,
    Msg,
    Call,
    Fail,
    Ofst,
}

impl LedZone {
    pub const ALL: [LedZone; 5] = [
        LedZone::Backlight,
        LedZone::Msg,
        LedZone::Call,
        LedZone::Fail,
        LedZone::Ofst,
    ];

    #[inline]
    fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            LedZone::Backlight => "backlight",
            LedZone::Msg => "msg",
            LedZone::Call => "call",
            LedZone::Fail => "fail",
            LedZone::Ofst => "ofst",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|z| z.name().eq_ignore_ascii_case(name.trim()))
    }
}

/// Why a zone is flashing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashReason {
    /// LCD settings mode is active; overrides every other source
    SettingsMode,
    /// Individually requested through `set_flashing`
    Requested,
}

#[derive(Debug, Clone, Copy, Default)]
struct LedState {
    brightness: u8,
    /// Individual flash request (kept while settings mode suspends it)
    requested_flash: bool,
    /// Level last pushed to the output
    written: Option<u8>,
}

/// Owns all LED state; the only writer of LED outputs
pub struct LedController {
    zones: [LedState; 5],
    max: u8,
    flash_period: Duration,
    flash_on: bool,
    next_toggle: Option<Instant>,
    settings_flash: bool,
}

impl LedController {
    pub fn new(max: u8, flash_period: Duration) -> Self {
        Self {
            zones: [LedState::default(); 5],
            max,
            flash_period,
            flash_on: false,
            next_toggle: None,
            settings_flash: false,
        }
    }

    pub fn max(&self) -> u8 {
        self.max
    }

    /// Set a zone's steady brightness, clamped to `[0, max]`
    pub fn set_brightness(&mut self, zone: LedZone, level: u8) {
        let level = level.min(self.max);
        let state = &mut self.zones[zone.index()];
        if state.brightness != level {
            debug!("LED {} brightness {}", zone.name(), level);
            state.brightness = level;
        }
    }

    /// Step a zone's brightness up or down, clamped; returns the new level
    pub fn adjust_brightness(&mut self, zone: LedZone, delta: i16) -> u8 {
        let current = self.zones[zone.index()].brightness as i16;
        let level = (current + delta).clamp(0, self.max as i16) as u8;
        self.set_brightness(zone, level);
        level
    }

    pub fn brightness(&self, zone: LedZone) -> u8 {
        self.zones[zone.index()].brightness
    }

    /// Request or cancel flashing for one zone
    ///
    /// While settings mode flashing is active the request is remembered and
    /// takes effect once settings mode ends.
    pub fn set_flashing(&mut self, zone: LedZone, enabled: bool) {
        self.zones[zone.index()].requested_flash = enabled;
    }

    /// Flash every zone to signal LCD settings mode
    pub fn begin_settings_flash(&mut self) {
        if !self.settings_flash {
            debug!("LED settings flash on");
            self.settings_flash = true;
            // Restart the phase so every zone flashes in unison
            self.next_toggle = None;
        }
    }

    /// Stop settings flashing and resume any suspended requests
    pub fn end_settings_flash(&mut self) {
        if self.settings_flash {
            debug!("LED settings flash off");
            self.settings_flash = false;
        }
    }

    pub fn flash_reason(&self, zone: LedZone) -> Option<FlashReason> {
        if self.settings_flash {
            Some(FlashReason::SettingsMode)
        } else if self.zones[zone.index()].requested_flash {
            Some(FlashReason::Requested)
        } else {
            None
        }
    }

    pub fn is_flashing(&self, zone: LedZone) -> bool {
        self.flash_reason(zone).is_some()
    }

    /// Level the zone should show right now
    pub fn level(&self, zone: LedZone) -> u8 {
        if self.is_flashing(zone) {
            if self.flash_on {
                self.max
            } else {
                0
            }
        } else {
            self.zones[zone.index()].brightness
        }
    }

    /// Advance the flash phase and push changed levels to the outputs
    pub fn tick(&mut self, now: Instant, outputs: &mut impl LedOutputs) {
        let any_flashing = LedZone::ALL.iter().any(|z| self.is_flashing(*z));

        if !any_flashing {
            self.next_toggle = None;
            self.flash_on = false;
        } else {
            match self.next_toggle {
                None => {
                    self.flash_on = true;
                    self.next_toggle = Some(now + self.flash_period);
                }
                Some(due) if now >= due => {
                    self.flash_on = !self.flash_on;
                    // Skip missed half-periods instead of toggling repeatedly
                    let next = due + self.flash_period;
                    self.next_toggle = Some(if next > now { next } else { now + self.flash_period });
                }
                Some(_) => {}
            }
        }

        for zone in LedZone::ALL {
            let level = self.level(zone);
            let state = &mut self.zones[zone.index()];
            if state.written != Some(level) {
                state.written = Some(level);
                outputs.set_level(zone, level);
            }
        }
    }
}
