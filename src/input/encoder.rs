//! Rotary encoder handler
//!
//! Decodes the quadrature phases into detent steps and classifies the
//! push-button into click, double-click and long-press gestures.

use std::time::{Duration, Instant};
use tracing::debug;

use super::debounce::Debouncer;
use super::{EncoderEvent, EncoderEventKind};
use crate::device::EncoderLines;

/// Direction of one step indexed by `(previous << 2) | current` phase bits.
/// Zero entries are either no change or an illegal double-bit jump.
const QUADRATURE_TABLE: [i8; 16] = [0, -1, 1, 0, 1, 0, 0, -1, -1, 0, 0, 1, 0, 1, -1, 0];

/// Timing thresholds for the push-button gestures
#[derive(Debug, Clone, Copy)]
pub struct GestureTiming {
    pub debounce: Duration,
    pub click_max: Duration,
    pub double_click: Duration,
    pub long_press: Duration,
}

/// Push-button gesture tracking
#[derive(Debug, Clone, Copy, Default)]
struct ButtonState {
    debouncer: Debouncer,
    pressed_at: Option<Instant>,
    long_press_fired: bool,
    /// A qualifying click is waiting for a possible second click
    pending_click: Option<Instant>,
    /// The current press is the second half of a possible double-click
    second_press: bool,
}

/// Quadrature decoder plus push-button gesture classifier
pub struct EncoderTracker {
    phase: u8,
    accumulated: i8,
    steps_per_detent: i8,
    button: ButtonState,
    timing: GestureTiming,
}

impl EncoderTracker {
    pub fn new(timing: GestureTiming, steps_per_detent: u8) -> Self {
        Self {
            phase: 0b11,
            accumulated: 0,
            steps_per_detent: steps_per_detent.clamp(1, 4) as i8,
            button: ButtonState::default(),
            timing,
        }
    }

    /// Seed the phase from the lines so the first poll isn't read as motion
    pub fn sync(&mut self, lines: &mut impl EncoderLines) {
        let (a, b) = lines.phases();
        self.phase = phase_bits(a, b);
        self.accumulated = 0;
    }

    /// Sample the encoder lines and return any gestures, in time order
    pub fn poll(&mut self, lines: &mut impl EncoderLines, now: Instant) -> Vec<EncoderEvent> {
        let mut events = Vec::new();

        let (a, b) = lines.phases();
        if let Some(kind) = self.decode(phase_bits(a, b)) {
            events.push(EncoderEvent { kind, at: now });
        }

        let closed = lines.button_closed();
        self.track_button(closed, now, &mut events);

        for event in &events {
            debug!("Encoder {:?}", event.kind);
        }
        events
    }

    fn decode(&mut self, current: u8) -> Option<EncoderEventKind> {
        if current == self.phase {
            return None;
        }

        let step = QUADRATURE_TABLE[((self.phase << 2) | current) as usize];
        self.phase = current;
        if step == 0 {
            // Skipped a state; direction unknown
            return None;
        }

        if step.signum() != self.accumulated.signum() && self.accumulated != 0 {
            self.accumulated = 0;
        }
        self.accumulated += step;

        if self.accumulated >= self.steps_per_detent {
            self.accumulated = 0;
            Some(EncoderEventKind::RotateCw)
        } else if self.accumulated <= -self.steps_per_detent {
            self.accumulated = 0;
            Some(EncoderEventKind::RotateCcw)
        } else {
            None
        }
    }

    fn track_button(&mut self, closed: bool, now: Instant, events: &mut Vec<EncoderEvent>) {
        let timing = self.timing;
        let button = &mut self.button;
        let mut push = |kind| events.push(EncoderEvent { kind, at: now });

        match button.debouncer.sample(closed, now, timing.debounce) {
            Some(true) => {
                if let Some(released_at) = button.pending_click {
                    if now.saturating_duration_since(released_at) > timing.double_click {
                        button.pending_click = None;
                        push(EncoderEventKind::ButtonClick);
                    }
                }
                push(EncoderEventKind::ButtonDown);
                button.pressed_at = Some(now);
                button.long_press_fired = false;
                button.second_press = button.pending_click.is_some();
            }
            Some(false) => {
                push(EncoderEventKind::ButtonUp);
                let held = button
                    .pressed_at
                    .take()
                    .map(|t| now.saturating_duration_since(t))
                    .unwrap_or_default();

                if button.long_press_fired || held > timing.click_max {
                    // Not a click; any pending click was already flushed
                } else if button.second_press && button.pending_click.take().is_some() {
                    push(EncoderEventKind::ButtonDoubleClick);
                } else {
                    button.pending_click = Some(now);
                }
                button.second_press = false;
            }
            None => {}
        }

        if let Some(pressed_at) = button.pressed_at {
            let held = now.saturating_duration_since(pressed_at);

            // Second press held too long to be a double-click
            if held > timing.click_max && button.pending_click.take().is_some() {
                push(EncoderEventKind::ButtonClick);
                button.second_press = false;
            }

            if !button.long_press_fired && held >= timing.long_press {
                button.long_press_fired = true;
                push(EncoderEventKind::ButtonLongPress);
            }
        } else if let Some(released_at) = button.pending_click {
            if now.saturating_duration_since(released_at) > timing.double_click {
                button.pending_click = None;
                push(EncoderEventKind::ButtonClick);
            }
        }
    }

    /// Whether the debounced push-button is down
    pub fn button_held(&self) -> bool {
        self.button.debouncer.is_active()
    }
}

#[inline]
fn phase_bits(a: bool, b: bool) -> u8 {
    ((a as u8) << 1) | b as u8
}
