use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::device::{CommandSink, FeedbackOutputs, KeyIdentity};
use crate::profiles::OutboundCommand;

/// Fire-and-forget delivery of mapped commands plus local key feedback
pub struct Dispatcher {
    audible_click: bool,
    pulse: Duration,
    buzzer_until: Option<Instant>,
}

impl Dispatcher {
    pub fn new(audible_click: bool, pulse: Duration) -> Self {
        Self {
            audible_click,
            pulse,
            buzzer_until: None,
        }
    }

    /// Send a command to the simulator link
    ///
    /// A send failure is logged and dropped; there is no retry or queueing.
    /// Returns `false` for no-op commands, which produce no output at all.
    pub fn dispatch<S>(&mut self, command: OutboundCommand, now: Instant, io: &mut S) -> bool
    where
        S: CommandSink + FeedbackOutputs,
    {
        if command.is_noop() {
            debug!("{} is unmapped, ignoring", command.key);
            return false;
        }

        debug!("Dispatching {} -> {:?}", command.key, command.action);
        if let Err(e) = io.send(&command) {
            warn!("Command for {} dropped: {}", command.key, e);
        }

        if command.key == KeyIdentity::EXEC {
            io.toggle_exec_led();
        }

        if self.audible_click {
            io.set_buzzer(true);
            self.buzzer_until = Some(now + self.pulse);
        }

        true
    }

    /// End the buzzer pulse once its width has elapsed
    pub fn tick(&mut self, now: Instant, outputs: &mut impl FeedbackOutputs) {
        if let Some(until) = self.buzzer_until {
            if now >= until {
                outputs.set_buzzer(false);
                self.buzzer_until = None;
            }
        }
    }

    pub fn buzzer_active(&self) -> bool {
        self.buzzer_until.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profiles::{CommandAction, Profile, ProfileMapper};
    use crate::testing::FakeBoard;

    const PULSE: Duration = Duration::from_millis(4);

    fn key(label: &str) -> KeyIdentity {
        KeyIdentity::from_label(label).unwrap()
    }

    #[test]
    fn test_dispatch_sends_and_clicks() {
        let t0 = Instant::now();
        let mut board = FakeBoard::new();
        let mut dispatcher = Dispatcher::new(true, PULSE);
        let command = ProfileMapper::default().map(key("LSK1"), Profile::PmdgPilot);

        assert!(dispatcher.dispatch(command.clone(), t0, &mut board));
        assert_eq!(board.sent, vec![command]);
        assert!(board.buzzer);
        assert_eq!(board.exec_toggles, 0);

        dispatcher.tick(t0 + Duration::from_millis(3), &mut board);
        assert!(board.buzzer);
        dispatcher.tick(t0 + PULSE, &mut board);
        assert!(!board.buzzer);
        assert!(!dispatcher.buzzer_active());
    }

    #[test]
    fn test_silent_when_click_disabled() {
        let t0 = Instant::now();
        let mut board = FakeBoard::new();
        let mut dispatcher = Dispatcher::new(false, PULSE);
        let command = ProfileMapper::default().map(key("A"), Profile::AeroSoft);

        dispatcher.dispatch(command, t0, &mut board);
        assert_eq!(board.sent.len(), 1);
        assert!(!board.buzzer);
        assert!(!dispatcher.buzzer_active());
    }

    #[test]
    fn test_exec_toggles_passthrough() {
        let t0 = Instant::now();
        let mut board = FakeBoard::new();
        let mut dispatcher = Dispatcher::new(true, PULSE);
        let mapper = ProfileMapper::default();

        dispatcher.dispatch(mapper.map(KeyIdentity::EXEC, Profile::ProSimPilot), t0, &mut board);
        dispatcher.dispatch(mapper.map(KeyIdentity::EXEC, Profile::Diagnostics), t0, &mut board);
        assert_eq!(board.exec_toggles, 2);
    }

    #[test]
    fn test_unavailable_sink_is_swallowed() {
        let t0 = Instant::now();
        let mut board = FakeBoard::new();
        board.link_online = false;
        let mut dispatcher = Dispatcher::new(true, PULSE);
        let command = ProfileMapper::default().map(key("CLR"), Profile::PmdgCopilot);

        assert!(dispatcher.dispatch(command, t0, &mut board));
        assert!(board.sent.is_empty());
        // Local feedback still happens for the key press
        assert!(board.buzzer);
    }

    #[test]
    fn test_noop_produces_nothing() {
        let t0 = Instant::now();
        let mut board = FakeBoard::new();
        let mut dispatcher = Dispatcher::new(true, PULSE);
        let command = OutboundCommand {
            key: KeyIdentity::ENCODER_BUTTON,
            action: CommandAction::NoOp,
        };

        assert!(!dispatcher.dispatch(command, t0, &mut board));
        assert!(board.sent.is_empty());
        assert!(!board.buzzer);
    }
}
