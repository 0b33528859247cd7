//! LCD settings (OSD) mode
//!
//! Holding the encoder button for the long-press time switches the encoder
//! over to the LCD driver board: rotation and clicks emulate its control
//! contacts until the session idles out or Power is pressed.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::leds::LedController;
use crate::device::PanelSink;
use crate::input::{EncoderEvent, EncoderEventKind};

/// Control contacts on the LCD driver board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelButton {
    Menu,
    Plus,
    Minus,
    SAuto,
    Power,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsMode {
    Normal,
    SettingsActive,
}

/// An open LCD settings session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettingsSession {
    pub entered_at: Instant,
    pub last_activity: Instant,
    /// Encoder button is down; the idle timeout waits for its release
    pub button_held: bool,
}

/// What the state machine did with an encoder event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Claim {
    /// Not ours; the normal path gets it
    Passed,
    /// Consumed without a panel signal
    Claimed,
    /// Consumed and forwarded to the LCD board
    Signalled(PanelButton),
}

impl Claim {
    pub fn is_claimed(self) -> bool {
        self != Claim::Passed
    }
}

/// Arbitrates encoder ownership between normal mode and the LCD OSD
pub struct LcdSettings {
    session: Option<SettingsSession>,
    idle_timeout: Duration,
}

impl LcdSettings {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            session: None,
            idle_timeout,
        }
    }

    pub fn mode(&self) -> SettingsMode {
        if self.session.is_some() {
            SettingsMode::SettingsActive
        } else {
            SettingsMode::Normal
        }
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&SettingsSession> {
        self.session.as_ref()
    }

    /// Offer one encoder event to the state machine
    pub fn handle(
        &mut self,
        event: &EncoderEvent,
        leds: &mut LedController,
        panel: &mut impl PanelSink,
    ) -> Claim {
        let Some(session) = self.session.as_mut() else {
            if event.kind == EncoderEventKind::ButtonLongPress {
                self.enter(event.at, leds);
                return Claim::Claimed;
            }
            return Claim::Passed;
        };

        let button = match event.kind {
            EncoderEventKind::RotateCw => PanelButton::Plus,
            EncoderEventKind::RotateCcw => PanelButton::Minus,
            EncoderEventKind::ButtonClick => PanelButton::Menu,
            EncoderEventKind::ButtonDoubleClick => PanelButton::SAuto,
            EncoderEventKind::ButtonLongPress => PanelButton::Power,
            EncoderEventKind::ButtonDown | EncoderEventKind::ButtonUp => {
                session.button_held = event.kind == EncoderEventKind::ButtonDown;
                session.last_activity = event.at;
                return Claim::Claimed;
            }
        };

        session.last_activity = event.at;
        send(panel, button);

        if button == PanelButton::Power {
            self.exit("power", leds);
        }
        Claim::Signalled(button)
    }

    /// Leave settings mode once the session has been idle too long
    ///
    /// Returns `true` when this call ended the session.
    pub fn tick(&mut self, now: Instant, leds: &mut LedController) -> bool {
        match self.session {
            Some(session)
                if !session.button_held
                    && now.saturating_duration_since(session.last_activity) >= self.idle_timeout =>
            {
                self.exit("idle timeout", leds);
                true
            }
            _ => false,
        }
    }

    fn enter(&mut self, now: Instant, leds: &mut LedController) {
        info!("Entering LCD settings mode");
        self.session = Some(SettingsSession {
            entered_at: now,
            last_activity: now,
            // The long press that opened the session is still down
            button_held: true,
        });
        leds.begin_settings_flash();
    }

    fn exit(&mut self, reason: &str, leds: &mut LedController) {
        if let Some(session) = self.session.take() {
            info!(
                "Leaving LCD settings mode ({}, after {:?})",
                reason,
                session.last_activity.saturating_duration_since(session.entered_at)
            );
        }
        leds.end_settings_flash();
    }
}

fn send(panel: &mut impl PanelSink, button: PanelButton) {
    debug!("LCD panel button {:?}", button);
    if let Err(e) = panel.send_panel_button(button) {
        warn!("LCD panel button {:?} dropped: {}", button, e);
    }
}
