pub mod config;
pub mod device;
pub mod dispatch;
pub mod display;
pub mod error;
pub mod input;
pub mod profiles;

#[cfg(test)]
pub(crate) mod testing;

use std::time::{Duration, Instant};
use tracing::{debug, info};

use config::Config;
use device::Board;
use dispatch::Dispatcher;
use display::{LcdSettings, LedController, LedZone, PanelButton};
use error::Result;
use input::{EncoderTracker, InputHandler, MatrixScanner, Transition};
use profiles::{CommandMapping, Profile, ProfileMapper};

/// What one control loop iteration did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepReport {
    pub key_events: usize,
    pub encoder_events: usize,
    pub dispatched: usize,
    /// Key presses swallowed because LCD settings mode owned the panel
    pub dropped_keys: usize,
    pub panel_signals: Vec<PanelButton>,
    pub settings_exited: bool,
    pub profile_changed: Option<Profile>,
}

impl StepReport {
    pub fn is_idle(&self) -> bool {
        self == &StepReport::default()
    }
}

/// The CDU control loop
///
/// Owns every component and the board it drives. Nothing here blocks; the
/// caller runs `step` at the scan period with the current time.
pub struct Firmware<B: Board> {
    board: B,
    scanner: MatrixScanner,
    encoder: EncoderTracker,
    input: InputHandler,
    dispatcher: Dispatcher,
    leds: LedController,
    settings: LcdSettings,
    repoll: Option<Duration>,
    next_repoll: Option<Instant>,
}

impl<B: Board> Firmware<B> {
    /// Sample the profile, build the mapping and push initial LED levels
    pub fn new(config: &Config, mut board: B, now: Instant) -> Result<Self> {
        let mapping = CommandMapping::build(&config.mapping.overrides)?;
        let profile = board.read_profile();
        info!("Active profile: {}", profile);

        let timing = &config.timing;
        let mut encoder = EncoderTracker::new(timing.gestures(), timing.steps_per_detent);
        encoder.sync(&mut board);

        let mut leds = LedController::new(config.backlight.max, timing.flash_period());
        leds.set_brightness(LedZone::Backlight, config.backlight.initial);
        leds.tick(now, &mut board);

        let repoll = config.profile.repoll();

        Ok(Self {
            board,
            scanner: MatrixScanner::new(timing.debounce()),
            encoder,
            input: InputHandler::new(ProfileMapper::new(mapping), profile, config.backlight.step),
            dispatcher: Dispatcher::new(
                config.feedback.audible_click,
                config.feedback.buzzer_pulse(),
            ),
            leds,
            settings: LcdSettings::new(timing.settings_idle()),
            repoll,
            next_repoll: repoll.map(|period| now + period),
        })
    }

    /// Run one scan iteration
    pub fn step(&mut self, now: Instant) -> StepReport {
        let mut report = StepReport::default();

        let keys = self.scanner.poll(&mut self.board, now);
        let gestures = self.encoder.poll(&mut self.board, now);
        report.key_events = keys.len();
        report.encoder_events = gestures.len();

        for event in &gestures {
            let claim = self.settings.handle(event, &mut self.leds, &mut self.board);
            if let display::Claim::Signalled(button) = claim {
                report.panel_signals.push(button);
            }
            if claim.is_claimed() {
                continue;
            }
            if self
                .input
                .handle_encoder(event, &mut self.leds, &mut self.dispatcher, &mut self.board)
            {
                report.dispatched += 1;
            }
        }

        for event in &keys {
            if self.settings.is_active() {
                if event.transition == Transition::Pressed {
                    debug!("Settings mode active, dropping {}", event.key);
                    report.dropped_keys += 1;
                }
                continue;
            }
            if self.input.handle_key(event, &mut self.dispatcher, &mut self.board) {
                report.dispatched += 1;
            }
        }

        report.settings_exited = self.settings.tick(now, &mut self.leds);
        self.leds.tick(now, &mut self.board);
        self.dispatcher.tick(now, &mut self.board);

        if let (Some(period), Some(due)) = (self.repoll, self.next_repoll) {
            if now >= due {
                self.next_repoll = Some(now + period);
                let profile = self.board.read_profile();
                if profile != self.input.profile() {
                    self.input.set_profile(profile);
                    report.profile_changed = Some(profile);
                }
            }
        }

        report
    }

    pub fn profile(&self) -> Profile {
        self.input.profile()
    }

    pub fn mapper(&self) -> &ProfileMapper {
        self.input.mapper()
    }

    pub fn leds(&self) -> &LedController {
        &self.leds
    }

    /// Direct access for status LED requests from the simulator side
    pub fn leds_mut(&mut self) -> &mut LedController {
        &mut self.leds
    }

    pub fn settings(&self) -> &LcdSettings {
        &self.settings
    }

    pub fn board(&self) -> &B {
        &self.board
    }

    pub fn board_mut(&mut self) -> &mut B {
        &mut self.board
    }

    pub fn into_board(self) -> B {
        self.board
    }
}
