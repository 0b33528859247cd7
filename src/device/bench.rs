//! Virtual panel for running the firmware on a desktop
//!
//! Switch closures, encoder motion and DIP settings come from bench
//! commands (stdin or a JSON script); every output is logged.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

use super::{
    CommandSink, EncoderLines, FeedbackOutputs, KeyIdentity, LedOutputs, MatrixLines, PanelSink,
    ProfileSelector,
};
use crate::display::{LedZone, PanelButton};
use crate::error::{Error, Result};
use crate::profiles::{CommandAction, DipSwitches, OutboundCommand, Profile};
use crate::Firmware;

/// Clockwise quadrature order as (A, B)
const PHASE_SEQUENCE: [(bool, bool); 4] = [(false, false), (true, false), (true, true), (false, true)];

const TAP_MS: u64 = 60;
const CLICK_GAP_MS: u64 = 80;
const HOLD_MS: u64 = 3500;
/// Largest detent count one `cw`/`ccw` command accepts
const MAX_DETENTS: i32 = 1000;

/// Writes outbound commands to the log instead of a simulator
#[derive(Debug, Default)]
pub struct LogSink;

impl CommandSink for LogSink {
    fn send(&mut self, command: &OutboundCommand) -> Result<()> {
        info!("{} -> {}", command.key, describe(&command.action));
        Ok(())
    }
}

pub fn describe(action: &CommandAction) -> String {
    match action {
        CommandAction::Keystroke(chord) => chord.to_string(),
        CommandAction::Echo(text) => format!("\"{}\"", text),
        CommandAction::NoOp => "(no-op)".to_string(),
    }
}

/// In-memory board driven by bench actions
pub struct BenchBoard {
    closed: HashSet<(usize, usize)>,
    selected: Option<usize>,
    phase: usize,
    /// Quadrature transitions still to play out, signed by direction
    pending_steps: i32,
    steps_per_detent: i32,
    button: bool,
    dip: DipSwitches,
    pinned: Option<Profile>,
    exec_led: bool,
    sink: Box<dyn CommandSink>,
    sent: usize,
}

impl BenchBoard {
    pub fn new(sink: Box<dyn CommandSink>, steps_per_detent: u8) -> Self {
        Self {
            closed: HashSet::new(),
            selected: None,
            phase: 2,
            pending_steps: 0,
            steps_per_detent: steps_per_detent.clamp(1, 4) as i32,
            button: false,
            dip: DipSwitches::default(),
            pinned: None,
            exec_led: false,
            sink,
            sent: 0,
        }
    }

    /// Report this profile regardless of the DIP switches
    pub fn pin_profile(&mut self, profile: Profile) {
        self.pinned = Some(profile);
    }

    pub fn set_dip(&mut self, value: u8) {
        self.dip = DipSwitches::from_value(value);
        info!("DIP switches {:?} ({})", self.dip.switches, self.dip.profile());
        if let Some(profile) = self.pinned {
            warn!("Profile pinned to {}, DIP change has no effect", profile);
        }
    }

    /// Close a switch by zero-based matrix position
    pub fn press(&mut self, row: usize, col: usize) {
        self.closed.insert((row, col));
    }

    pub fn release(&mut self, row: usize, col: usize) {
        self.closed.remove(&(row, col));
    }

    /// Queue whole detents; positive is clockwise
    pub fn rotate(&mut self, detents: i32) {
        self.pending_steps = self
            .pending_steps
            .saturating_add(detents.saturating_mul(self.steps_per_detent));
    }

    pub fn set_button(&mut self, closed: bool) {
        self.button = closed;
    }

    pub fn exec_led(&self) -> bool {
        self.exec_led
    }

    /// Commands the sink accepted so far
    pub fn sent(&self) -> usize {
        self.sent
    }
}

impl MatrixLines for BenchBoard {
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

impl EncoderLines for BenchBoard {
    /// Plays one pending transition per read
    fn phases(&mut self) -> (bool, bool) {
        if self.pending_steps != 0 {
            let dir = self.pending_steps.signum();
            self.pending_steps -= dir;
            self.phase = (self.phase as i32 + dir).rem_euclid(4) as usize;
        }
        PHASE_SEQUENCE[self.phase]
    }

    fn button_closed(&mut self) -> bool {
        self.button
    }
}

impl LedOutputs for BenchBoard {
    fn set_level(&mut self, zone: LedZone, level: u8) {
        trace!("LED {} = {}", zone.name(), level);
    }
}

impl FeedbackOutputs for BenchBoard {
    fn set_buzzer(&mut self, on: bool) {
        trace!("Buzzer {}", if on { "on" } else { "off" });
    }

    fn toggle_exec_led(&mut self) {
        self.exec_led = !self.exec_led;
        info!("EXEC LED {}", if self.exec_led { "on" } else { "off" });
    }
}

impl CommandSink for BenchBoard {
    fn send(&mut self, command: &OutboundCommand) -> Result<()> {
        self.sink.send(command)?;
        self.sent += 1;
        Ok(())
    }
}

impl PanelSink for BenchBoard {
    fn send_panel_button(&mut self, button: PanelButton) -> Result<()> {
        info!("LCD panel: {:?}", button);
        Ok(())
    }
}

impl ProfileSelector for BenchBoard {
    fn read_profile(&mut self) -> Profile {
        self.pinned.unwrap_or_else(|| self.dip.profile())
    }
}

/// One stimulus applied to the bench board
///
/// Matrix positions are one-based, as printed on the schematic (R1C1).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum BenchAction {
    Press { row: usize, col: usize },
    Release { row: usize, col: usize },
    /// Encoder detents, negative is counter-clockwise
    Rotate { steps: i32 },
    Button { down: bool },
    Dip { value: u8 },
    Led { zone: String, flashing: bool },
    Level { zone: String, level: u8 },
}

/// A scheduled bench action, `at_ms` after the script starts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptEntry {
    pub at_ms: u64,
    #[serde(flatten)]
    pub action: BenchAction,
}

impl ScriptEntry {
    fn at(at_ms: u64, action: BenchAction) -> Self {
        Self { at_ms, action }
    }
}

/// Load a JSON bench script
pub fn load_script(path: &Path) -> anyhow::Result<Vec<ScriptEntry>> {
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let entries: Vec<ScriptEntry> =
        serde_json::from_str(&contents).with_context(|| format!("parsing {}", path.display()))?;
    Ok(entries)
}

/// Pending actions ordered by due time
#[derive(Debug, Default)]
pub struct Schedule {
    pending: Vec<(Instant, BenchAction)>,
}

impl Schedule {
    pub fn push_all(&mut self, base: Instant, entries: Vec<ScriptEntry>) {
        for entry in entries {
            self.pending
                .push((base + Duration::from_millis(entry.at_ms), entry.action));
        }
        // Stable sort keeps same-time actions in the order given
        self.pending.sort_by_key(|(at, _)| *at);
    }

    /// Remove and return every action due at `now`
    pub fn take_due(&mut self, now: Instant) -> Vec<BenchAction> {
        let due = self.pending.partition_point(|(at, _)| *at <= now);
        self.pending.drain(..due).map(|(_, action)| action).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Parse one interactive bench line into scheduled actions
///
/// ```text
/// press 1 1 | release 1 1 | tap 1 1 | tap DEP ARR
/// cw [n] | ccw [n] | click | double | hold [ms] | button down|up
/// dip <0-7> | led <zone> on|off | level <zone> <0-255>
/// ```
pub fn parse_command(line: &str) -> Result<Vec<ScriptEntry>> {
    let bad = |why: &'static str| Error::BenchCommand(line.trim().to_string(), why);
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(Vec::new());
    };
    let args: Vec<&str> = words.collect();

    let count = |default: i32| -> Result<i32> {
        match args.first() {
            Some(n) => n.parse().map_err(|_| bad("expected a number")),
            None => Ok(default),
        }
    };
    let position = || -> Result<(usize, usize)> {
        match args.as_slice() {
            [row, col] if row.parse::<usize>().is_ok() => {
                let row = row.parse().map_err(|_| bad("bad row"))?;
                let col = col.parse().map_err(|_| bad("bad column"))?;
                Ok((row, col))
            }
            _ => {
                let key = KeyIdentity::from_label(&args.join(" ")).ok_or(bad("unknown key"))?;
                key.position()
                    .map(|(r, c)| (r + 1, c + 1))
                    .ok_or(bad("not a matrix key"))
            }
        }
    };
    let detents = || -> Result<i32> {
        let n = count(1)?;
        if !(1..=MAX_DETENTS).contains(&n) {
            return Err(bad("detent count must be 1-1000"));
        }
        Ok(n)
    };
    let button = |at_ms, down| ScriptEntry::at(at_ms, BenchAction::Button { down });

    let entries = match verb.to_ascii_lowercase().as_str() {
        "press" => {
            let (row, col) = position()?;
            vec![ScriptEntry::at(0, BenchAction::Press { row, col })]
        }
        "release" => {
            let (row, col) = position()?;
            vec![ScriptEntry::at(0, BenchAction::Release { row, col })]
        }
        "tap" => {
            let (row, col) = position()?;
            vec![
                ScriptEntry::at(0, BenchAction::Press { row, col }),
                ScriptEntry::at(TAP_MS, BenchAction::Release { row, col }),
            ]
        }
        "cw" => vec![ScriptEntry::at(0, BenchAction::Rotate { steps: detents()? })],
        "ccw" => vec![ScriptEntry::at(0, BenchAction::Rotate { steps: -detents()? })],
        "click" => vec![button(0, true), button(TAP_MS, false)],
        "double" => vec![
            button(0, true),
            button(TAP_MS, false),
            button(TAP_MS + CLICK_GAP_MS, true),
            button(2 * TAP_MS + CLICK_GAP_MS, false),
        ],
        "hold" => {
            let ms = count(HOLD_MS as i32)?;
            if ms <= 0 {
                return Err(bad("hold time must be positive"));
            }
            vec![button(0, true), button(ms as u64, false)]
        }
        "button" => match args.first().copied() {
            Some("down") => vec![button(0, true)],
            Some("up") => vec![button(0, false)],
            _ => return Err(bad("expected down or up")),
        },
        "dip" => {
            let value = args
                .first()
                .and_then(|v| v.parse::<u8>().ok())
                .filter(|v| *v < 8)
                .ok_or(bad("expected a value 0-7"))?;
            vec![ScriptEntry::at(0, BenchAction::Dip { value })]
        }
        "led" => match args.as_slice() {
            [zone, state] => {
                let flashing = match *state {
                    "on" | "flash" => true,
                    "off" => false,
                    _ => return Err(bad("expected on or off")),
                };
                vec![ScriptEntry::at(
                    0,
                    BenchAction::Led {
                        zone: zone.to_string(),
                        flashing,
                    },
                )]
            }
            _ => return Err(bad("expected a zone and on/off")),
        },
        "level" => match args.as_slice() {
            [zone, level] => {
                let level = level.parse().map_err(|_| bad("expected a level 0-255"))?;
                vec![ScriptEntry::at(
                    0,
                    BenchAction::Level {
                        zone: zone.to_string(),
                        level,
                    },
                )]
            }
            _ => return Err(bad("expected a zone and level")),
        },
        _ => return Err(bad("unknown command")),
    };

    Ok(entries)
}

/// Apply one action to a firmware instance running on the bench board
pub fn apply(firmware: &mut Firmware<BenchBoard>, action: &BenchAction) -> Result<()> {
    debug!("Bench: {:?}", action);
    let bad = |why: &'static str| Error::BenchCommand(format!("{:?}", action), why);
    let zone_named = |name: &str| LedZone::from_name(name).ok_or(bad("unknown LED zone"));

    match action {
        BenchAction::Press { row, col } | BenchAction::Release { row, col } => {
            let (r, c) = row
                .checked_sub(1)
                .zip(col.checked_sub(1))
                .filter(|(r, c)| KeyIdentity::at(*r, *c).is_some())
                .ok_or(bad("no switch at that position"))?;
            let board = firmware.board_mut();
            if matches!(action, BenchAction::Press { .. }) {
                board.press(r, c);
            } else {
                board.release(r, c);
            }
        }
        BenchAction::Rotate { steps } => firmware.board_mut().rotate(*steps),
        BenchAction::Button { down } => firmware.board_mut().set_button(*down),
        BenchAction::Dip { value } => firmware.board_mut().set_dip(*value),
        BenchAction::Led { zone, flashing } => {
            let zone = zone_named(zone.as_str())?;
            firmware.leds_mut().set_flashing(zone, *flashing);
        }
        BenchAction::Level { zone, level } => {
            let zone = zone_named(zone.as_str())?;
            firmware.leds_mut().set_brightness(zone, *level);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn bench(t0: Instant) -> Firmware<BenchBoard> {
        let mut config = Config::default();
        config.profile.repoll_ms = Some(10);
        let board = BenchBoard::new(Box::new(LogSink), config.timing.steps_per_detent);
        Firmware::new(&config, board, t0).unwrap()
    }

    /// Feed the entries through a schedule, stepping once per millisecond
    fn play(fw: &mut Firmware<BenchBoard>, t0: Instant, entries: Vec<ScriptEntry>, until: u64) {
        let mut schedule = Schedule::default();
        schedule.push_all(t0, entries);
        for t in 0..=until {
            let now = t0 + ms(t);
            for action in schedule.take_due(now) {
                apply(fw, &action).unwrap();
            }
            fw.step(now);
        }
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            parse_command("press 2 3").unwrap(),
            vec![ScriptEntry::at(0, BenchAction::Press { row: 2, col: 3 })]
        );
        assert_eq!(
            parse_command("tap DEP ARR").unwrap()[0].action,
            BenchAction::Press { row: 3, col: 2 }
        );
        assert_eq!(
            parse_command("ccw 3").unwrap()[0].action,
            BenchAction::Rotate { steps: -3 }
        );
        assert_eq!(parse_command("double").unwrap().len(), 4);
        assert_eq!(
            parse_command("hold 4000").unwrap()[1],
            ScriptEntry::at(4000, BenchAction::Button { down: false })
        );
        assert!(parse_command("   ").unwrap().is_empty());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_command("tap NOPE").is_err());
        assert!(parse_command("dip 9").is_err());
        assert!(parse_command("led msg maybe").is_err());
        assert!(parse_command("button sideways").is_err());
        assert!(parse_command("jump").is_err());
        assert!(parse_command("cw 1000000000").is_err());
        assert!(parse_command("ccw -2147483648").is_err());
        assert!(parse_command("cw 0").is_err());
        assert!(parse_command("ccw 99999999999").is_err());
    }

    #[test]
    fn test_rotate_saturates_pending_steps() {
        let mut board = BenchBoard::new(Box::new(LogSink), 4);
        board.rotate(i32::MAX);
        board.rotate(1);
        assert_eq!(board.pending_steps, i32::MAX);

        let mut board = BenchBoard::new(Box::new(LogSink), 4);
        board.rotate(i32::MIN);
        assert_eq!(board.pending_steps, i32::MIN);
    }

    #[test]
    fn test_script_json() {
        let entries: Vec<ScriptEntry> = serde_json::from_str(
            r#"[
                {"at_ms": 0, "action": "press", "row": 1, "col": 1},
                {"at_ms": 50, "action": "release", "row": 1, "col": 1},
                {"at_ms": 100, "action": "rotate", "steps": -2},
                {"at_ms": 200, "action": "led", "zone": "msg", "flashing": true}
            ]"#,
        )
        .unwrap();
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[2].action, BenchAction::Rotate { steps: -2 });
    }

    #[test]
    fn test_schedule_orders_by_time() {
        let t0 = Instant::now();
        let mut schedule = Schedule::default();
        schedule.push_all(
            t0,
            vec![
                ScriptEntry::at(20, BenchAction::Dip { value: 2 }),
                ScriptEntry::at(10, BenchAction::Dip { value: 1 }),
            ],
        );
        assert!(schedule.take_due(t0 + ms(5)).is_empty());
        assert_eq!(schedule.take_due(t0 + ms(25)), vec![
            BenchAction::Dip { value: 1 },
            BenchAction::Dip { value: 2 },
        ]);
        assert!(schedule.is_empty());
    }

    #[test]
    fn test_tap_and_rotate_on_bench() {
        let t0 = Instant::now();
        let mut fw = bench(t0);
        let mut entries = parse_command("tap 1 1").unwrap();
        entries.extend(parse_command("cw 2").unwrap());
        play(&mut fw, t0, entries, 200);

        assert_eq!(fw.board().sent(), 1);
        assert_eq!(fw.leds().brightness(LedZone::Backlight), 60);
    }

    #[test]
    fn test_dip_change_and_pin() {
        let t0 = Instant::now();
        let mut fw = bench(t0);
        play(&mut fw, t0, vec![ScriptEntry::at(0, BenchAction::Dip { value: 7 })], 20);
        assert_eq!(fw.profile(), Profile::Diagnostics);

        fw.board_mut().pin_profile(Profile::ProSimCopilot);
        fw.board_mut().set_dip(1);
        fw.step(t0 + ms(40));
        assert_eq!(fw.profile(), Profile::ProSimCopilot);
    }

    #[test]
    fn test_led_requests_and_bad_positions() {
        let t0 = Instant::now();
        let mut fw = bench(t0);
        apply(&mut fw, &BenchAction::Led { zone: "call".into(), flashing: true }).unwrap();
        assert!(fw.leds().is_flashing(LedZone::Call));

        assert!(apply(&mut fw, &BenchAction::Press { row: 8, col: 9 }).is_err());
        assert!(apply(&mut fw, &BenchAction::Press { row: 0, col: 1 }).is_err());
        assert!(apply(&mut fw, &BenchAction::Level { zone: "exec".into(), level: 1 }).is_err());
    }

    #[test]
    fn test_exec_led_passthrough() {
        let t0 = Instant::now();
        let mut fw = bench(t0);
        let (row, col) = KeyIdentity::EXEC.position().unwrap();
        play(&mut fw, t0, parse_command(&format!("tap {} {}", row + 1, col + 1)).unwrap(), 100);
        assert!(fw.board().exec_led());
    }
}
