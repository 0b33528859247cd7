//! In-memory board used by the unit tests

use std::collections::HashSet;

use crate::device::{
    CommandSink, EncoderLines, FeedbackOutputs, LedOutputs, MatrixLines, PanelSink,
    ProfileSelector,
};
use crate::display::{LedZone, PanelButton};
use crate::error::{Error, Result};
use crate::profiles::{OutboundCommand, Profile};

/// Quadrature phases in clockwise order as (A << 1) | B
const PHASE_SEQUENCE: [(bool, bool); 4] = [(false, false), (true, false), (true, true), (false, true)];

pub struct FakeBoard {
    /// Closed switches by zero-based (row, column)
    pub closed: HashSet<(usize, usize)>,
    selected: Option<usize>,

    pub phases: (bool, bool),
    pub button: bool,

    pub led_writes: Vec<(LedZone, u8)>,
    pub buzzer: bool,
    pub exec_toggles: u32,

    pub sent: Vec<OutboundCommand>,
    pub link_online: bool,

    pub panel_buttons: Vec<PanelButton>,
    pub panel_online: bool,

    pub profile: Profile,
}

impl FakeBoard {
    pub fn new() -> Self {
        Self {
            closed: HashSet::new(),
            selected: None,
            phases: (true, true),
            button: false,
            led_writes: Vec::new(),
            buzzer: false,
            exec_toggles: 0,
            sent: Vec::new(),
            link_online: true,
            panel_buttons: Vec::new(),
            panel_online: true,
            profile: Profile::AeroSoft,
        }
    }

    pub fn close(&mut self, row: usize, col: usize) {
        self.closed.insert((row, col));
    }

    pub fn open(&mut self, row: usize, col: usize) {
        self.closed.remove(&(row, col));
    }

    pub fn set_phases(&mut self, a: bool, b: bool) {
        self.phases = (a, b);
    }

    /// Move the encoder one quadrature transition; positive is clockwise
    pub fn step_encoder(&mut self, dir: i32) {
        let current = PHASE_SEQUENCE
            .iter()
            .position(|p| *p == self.phases)
            .unwrap_or(0) as i32;
        let next = (current + dir.signum()).rem_euclid(PHASE_SEQUENCE.len() as i32);
        self.phases = PHASE_SEQUENCE[next as usize];
    }

    pub fn set_button(&mut self, closed: bool) {
        self.button = closed;
    }

    /// Last level written to a zone
    pub fn led_level(&self, zone: LedZone) -> Option<u8> {
        self.led_writes
            .iter()
            .rev()
            .find(|(z, _)| *z == zone)
            .map(|(_, level)| *level)
    }
}

impl MatrixLines for FakeBoard {
    fn select_row(&mut self, row: usize) {
        self.selected = Some(row);
    }

    fn column_active(&mut self, col: usize) -> bool {
        self.selected
            .map(|row| self.closed.contains(&(row, col)))
            .unwrap_or(false)
    }

    fn release_row(&mut self, _row: usize) {
        self.selected = None;
    }
}

impl EncoderLines for FakeBoard {
    fn phases(&mut self) -> (bool, bool) {
        self.phases
    }

    fn button_closed(&mut self) -> bool {
        self.button
    }
}

impl LedOutputs for FakeBoard {
    fn set_level(&mut self, zone: LedZone, level: u8) {
        self.led_writes.push((zone, level));
    }
}

impl FeedbackOutputs for FakeBoard {
    fn set_buzzer(&mut self, on: bool) {
        self.buzzer = on;
    }

    fn toggle_exec_led(&mut self) {
        self.exec_toggles += 1;
    }
}

impl CommandSink for FakeBoard {
    fn send(&mut self, command: &OutboundCommand) -> Result<()> {
        if !self.link_online {
            return Err(Error::SinkUnavailable("link offline".into()));
        }
        self.sent.push(command.clone());
        Ok(())
    }
}

impl PanelSink for FakeBoard {
    fn send_panel_button(&mut self, button: PanelButton) -> Result<()> {
        if !self.panel_online {
            return Err(Error::SinkUnavailable("panel offline".into()));
        }
        self.panel_buttons.push(button);
        Ok(())
    }
}

impl ProfileSelector for FakeBoard {
    fn read_profile(&mut self) -> Profile {
        self.profile
    }
}
