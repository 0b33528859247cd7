use std::time::Instant;
use tracing::{debug, info};

use super::{EncoderEvent, EncoderEventKind, KeyEvent, Transition};
use crate::device::{CommandSink, FeedbackOutputs, KeyIdentity};
use crate::dispatch::Dispatcher;
use crate::display::{LedController, LedZone};
use crate::profiles::{Profile, ProfileMapper};

/// Normal-mode routing: keys to the simulator, encoder to the backlight
pub struct InputHandler {
    mapper: ProfileMapper,
    profile: Profile,
    brightness_step: u8,
}

impl InputHandler {
    pub fn new(mapper: ProfileMapper, profile: Profile, brightness_step: u8) -> Self {
        Self {
            mapper,
            profile,
            brightness_step,
        }
    }

    pub fn profile(&self) -> Profile {
        self.profile
    }

    pub fn set_profile(&mut self, profile: Profile) {
        if profile != self.profile {
            info!("Profile changed: {} -> {}", self.profile, profile);
            self.profile = profile;
        }
    }

    pub fn mapper(&self) -> &ProfileMapper {
        &self.mapper
    }

    /// Handle a matrix key event; returns `true` if a command went out
    pub fn handle_key<S>(&self, event: &KeyEvent, dispatcher: &mut Dispatcher, io: &mut S) -> bool
    where
        S: CommandSink + FeedbackOutputs,
    {
        match event.transition {
            Transition::Pressed => self.send_key(event.key, event.at, dispatcher, io),
            Transition::Released => false,
        }
    }

    /// Handle an encoder event not claimed by LCD settings mode
    ///
    /// Returns `true` if a command went out.
    pub fn handle_encoder<S>(
        &self,
        event: &EncoderEvent,
        leds: &mut LedController,
        dispatcher: &mut Dispatcher,
        io: &mut S,
    ) -> bool
    where
        S: CommandSink + FeedbackOutputs,
    {
        let step = self.brightness_step as i16;
        match event.kind {
            EncoderEventKind::RotateCw => {
                let level = leds.adjust_brightness(LedZone::Backlight, step);
                debug!("Backlight up: {}", level);
                false
            }
            EncoderEventKind::RotateCcw => {
                let level = leds.adjust_brightness(LedZone::Backlight, -step);
                debug!("Backlight down: {}", level);
                false
            }
            EncoderEventKind::ButtonClick => {
                self.send_key(KeyIdentity::ENCODER_BUTTON, event.at, dispatcher, io)
            }
            EncoderEventKind::ButtonDown
            | EncoderEventKind::ButtonUp
            | EncoderEventKind::ButtonDoubleClick
            | EncoderEventKind::ButtonLongPress => false,
        }
    }

    fn send_key<S>(&self, key: KeyIdentity, at: Instant, dispatcher: &mut Dispatcher, io: &mut S) -> bool
    where
        S: CommandSink + FeedbackOutputs,
    {
        let command = self.mapper.map(key, self.profile);
        dispatcher.dispatch(command, at, io)
    }
}
