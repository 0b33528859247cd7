use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cdu_firmware::config::Config;
use cdu_firmware::device::bench::{self, BenchBoard, LogSink, Schedule};
use cdu_firmware::device::{CommandSink, FeedbackOutputs, KeyIdentity, LedOutputs};
use cdu_firmware::display::LedZone;
use cdu_firmware::input::KeystrokeSender;
use cdu_firmware::profiles::store::export_profile;
use cdu_firmware::profiles::{diagnostic_echo, CommandMapping, Profile};
use cdu_firmware::Firmware;

#[derive(Parser, Debug)]
#[command(name = "cdu-firmware")]
#[command(about = "B737 FMC/CDU keypad firmware core on a virtual bench panel")]
#[command(version)]
struct Cli {
    /// Config file (default ~/.config/cdu-firmware/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Use this profile instead of the DIP switches
    #[arg(long)]
    profile: Option<Profile>,

    /// Where mapped commands go
    #[arg(long, value_enum, default_value_t = SinkKind::Keystrokes)]
    sink: SinkKind,

    /// Replay a JSON bench script
    #[arg(long, value_name = "FILE")]
    script: Option<PathBuf>,

    /// Print the command table of the selected profile and exit
    #[arg(long)]
    print_map: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum SinkKind {
    /// Inject keystrokes into the focused simulator window
    Keystrokes,
    /// Only log commands
    Log,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_deref())?;
    let pinned = cli.profile.or(config.profile.bench_profile);

    if cli.print_map {
        return print_map(&config, pinned.unwrap_or(Profile::AeroSoft));
    }

    let sink: Box<dyn CommandSink> = match cli.sink {
        SinkKind::Keystrokes => {
            let sender = KeystrokeSender::new();
            if !sender.is_available() {
                warn!("Commands will be dropped; try --sink log");
            }
            Box::new(sender)
        }
        SinkKind::Log => Box::new(LogSink),
    };

    let mut board = BenchBoard::new(sink, config.timing.steps_per_detent);
    if let Some(profile) = pinned {
        board.pin_profile(profile);
    }

    let start = Instant::now();
    let mut firmware = Firmware::new(&config, board, start)?;

    let mut schedule = Schedule::default();
    if let Some(path) = &cli.script {
        let entries = bench::load_script(path)?;
        info!("Loaded {} script entries from {}", entries.len(), path.display());
        schedule.push_all(start, entries);
    }

    info!("Starting cdu-firmware ({})", firmware.profile());

    // Set up signal handlers for graceful shutdown
    let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())?;

    let result = tokio::select! {
        result = run(&mut firmware, &mut schedule, config.timing.scan_period()) => {
            result
        }
        _ = signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
            Ok(())
        }
        _ = sigterm.recv() => {
            info!("Received SIGTERM, shutting down...");
            Ok(())
        }
    };

    // Always run shutdown
    shutdown(&mut firmware);
    result
}

/// Step the firmware at the scan period and feed it bench commands
async fn run(
    firmware: &mut Firmware<BenchBoard>,
    schedule: &mut Schedule,
    period: Duration,
) -> Result<()> {
    info!("Running - type bench commands (tap 1 1, cw 2, hold, dip 7, ...)");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let now = Instant::now();
                for action in schedule.take_due(now) {
                    if let Err(e) = bench::apply(firmware, &action) {
                        warn!("{}", e);
                    }
                }
                let report = firmware.step(now);
                if !report.is_idle() {
                    debug!("{:?}", report);
                }
            }
            line = lines.next_line(), if stdin_open => {
                match line? {
                    Some(line) => match bench::parse_command(&line) {
                        Ok(entries) => schedule.push_all(Instant::now(), entries),
                        Err(e) => warn!("{}", e),
                    },
                    None => {
                        debug!("stdin closed");
                        stdin_open = false;
                    }
                }
            }
        }
    }
}

fn print_map(config: &Config, profile: Profile) -> Result<()> {
    let mapping = CommandMapping::build(&config.mapping.overrides)?;

    match export_profile(&mapping, profile) {
        Some(table) => print!("{}", toml::to_string_pretty(&table)?),
        None => {
            for key in KeyIdentity::ALL {
                println!("{:<10} {}", key.label(), diagnostic_echo(key));
            }
        }
    }
    Ok(())
}

/// Quiet the outputs before exit
fn shutdown(firmware: &mut Firmware<BenchBoard>) {
    info!("Shutting down cdu-firmware...");

    let board = firmware.board_mut();
    board.set_buzzer(false);
    for zone in LedZone::ALL {
        board.set_level(zone, 0);
    }

    info!("Shutdown complete ({} commands sent)", board.sent());
}
