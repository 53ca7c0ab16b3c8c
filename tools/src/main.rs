//! stall-runner: headless driver for the fish-bun stall simulation.
//!
//! Usage:
//!   stall-runner --seed 12345 --days 5 --db run.db --lang en
//!   stall-runner --seed 12345 --realtime
//!   stall-runner --ipc-mode --tuning data/tuning.json

mod autopilot;
mod narrator;

use anyhow::Result;
use autopilot::{Autopilot, DayReport};
use chrono::Utc;
use fishbun_core::{
    command::PlayerCommand,
    config::SimConfig,
    engine::SimEngine,
    locale::Language,
    narrative::{Dispatch, Narrator, OfflineNarrator},
    store::SimStore,
};
use narrator::HttpNarrator;
use std::env;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Frame length for simulated and wall-clock driving (~60 Hz).
const FRAME: Duration = Duration::from_millis(16);

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    GetState,
    /// Advance the driver clock by `elapsed_ms`.
    Pump {
        elapsed_ms: u64,
    },
    Command {
        command: PlayerCommand,
    },
    Quit,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode {
    Autopilot,
    Realtime,
    Ipc,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let days = parse_arg(&args, "--days", 3u32);
    let language = parse_arg(&args, "--lang", Language::Ko);
    let db = string_arg(&args, "--db").unwrap_or(":memory:");
    let tuning = string_arg(&args, "--tuning");
    let mode = if args.iter().any(|a| a == "--ipc-mode") {
        Mode::Ipc
    } else if args.iter().any(|a| a == "--realtime") {
        Mode::Realtime
    } else {
        Mode::Autopilot
    };

    let config = match tuning {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::default(),
    };

    let store = if db == ":memory:" {
        SimStore::in_memory()?
    } else {
        SimStore::open(db)?
    };
    store.migrate()?;

    let started = Utc::now();
    let run_id = format!("run-{seed}-{}", started.format("%Y%m%dT%H%M%S"));
    store.insert_run(&run_id, seed, env!("CARGO_PKG_VERSION"), started.timestamp())?;

    let narrator: Arc<dyn Narrator> = match HttpNarrator::from_env(config.narrative_timeout())? {
        Some(http) => {
            log::info!("narrator: {}", http.model());
            Arc::new(http)
        }
        None => {
            log::info!("narrator: offline, using fallback content");
            Arc::new(OfflineNarrator)
        }
    };

    // Simulated time races ahead of any real request; call inline there.
    let dispatch = if mode == Mode::Autopilot { Dispatch::Inline } else { Dispatch::Threaded };

    let mut engine = SimEngine::new(run_id.clone(), seed, config, store, narrator)?
        .with_dispatch(dispatch)
        .with_language(language);

    if mode != Mode::Ipc {
        println!("Fish-bun stall: stall-runner");
        println!("  seed:      {seed}");
        println!("  days:      {days}");
        println!("  db:        {db}");
        println!("  language:  {}", language.display_name());
        println!("  started:   {}", started.to_rfc3339());
        println!();
    }

    match mode {
        Mode::Ipc => run_ipc_loop(&mut engine)?,
        Mode::Autopilot | Mode::Realtime => {
            let mut pilot = Autopilot::new();
            run_days(&mut engine, &mut pilot, days, mode == Mode::Realtime)?;
            print_summary(&engine, &pilot, &run_id)?;
        }
    }

    Ok(())
}

/// Let the autopilot play `days` days, on simulated or wall-clock time.
fn run_days(engine: &mut SimEngine, pilot: &mut Autopilot, days: u32, realtime: bool) -> Result<()> {
    let wall = Instant::now();
    let mut simulated = Duration::ZERO;

    while (pilot.reports().len() as u32) < days {
        let now = if realtime {
            std::thread::sleep(FRAME);
            wall.elapsed()
        } else {
            simulated += FRAME;
            simulated
        };
        engine.pump(now)?;
        if let Some(report) = pilot.act(engine)? {
            print_day(engine, &report);
        }
    }
    Ok(())
}

fn run_ipc_loop(engine: &mut SimEngine) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();
    let mut now = Duration::ZERO;

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }
        if buffer.trim().is_empty() {
            continue;
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                let err_json = serde_json::json!({ "error": e.to_string() });
                writeln!(stdout, "{}", err_json)?;
                stdout.flush()?;
                continue;
            }
        };

        match cmd {
            IpcCommand::Quit => break,
            IpcCommand::Pump { elapsed_ms } => {
                now = advance_clock(now, elapsed_ms);
                engine.pump(now)?;
            }
            IpcCommand::GetState => {}
            IpcCommand::Command { command } => {
                log::debug!("ipc: {}", command.name());
                engine.apply(command)?;
            }
        }
        writeln!(stdout, "{}", serde_json::to_string(&engine.snapshot())?)?;
        stdout.flush()?;
    }
    Ok(())
}

fn print_day(engine: &SimEngine, report: &DayReport) {
    let t = |key: &str| engine.translate(key, &[]);
    println!("=== {} ===", engine.translate("day_complete", &[("day", report.day.to_string())]));
    println!("  event:       {} ({})", report.title, report.effect);
    println!("  {:<12} {}", t("stat_served"), report.served);
    println!("  {:<12} {}", t("stat_burnt"), report.burnt);
    println!("  {:<12} {}", t("stat_earnings"), report.earned);
    println!("  money:       {}", report.money);
    println!("  reputation:  {}", report.reputation);
    println!("  review:      {}", report.review);
    println!();
}

fn print_summary(engine: &SimEngine, pilot: &Autopilot, run_id: &str) -> Result<()> {
    let reports = pilot.reports();
    let served: u32 = reports.iter().map(|r| r.served).sum();
    let burnt: u32 = reports.iter().map(|r| r.burnt).sum();
    let earned: i64 = reports.iter().map(|r| r.earned).sum();

    println!("=== RUN SUMMARY ===");
    println!("  run_id:       {run_id}");
    println!("  days played:  {}", reports.len());
    println!("  final tick:   {}", engine.clock.current_tick);
    println!("  served:       {served}");
    println!("  burnt:        {burnt}");
    println!("  earned:       {earned}");
    println!("  money:        {}", engine.state().money);
    println!("  reputation:   {}", engine.state().reputation);
    println!("  molds:        {}", engine.molds().len());
    for upgrade in engine.upgrades() {
        println!(
            "  {:<22} level {}/{}",
            engine.translate(&upgrade.name, &[]),
            upgrade.level,
            upgrade.max_level
        );
    }
    println!("  journal:      {} events", engine.journal_event_count()?);
    Ok(())
}

/// Driver clock for IPC pumps. Saturates instead of overflowing on
/// oversized deltas.
fn advance_clock(now: Duration, elapsed_ms: u64) -> Duration {
    now.saturating_add(Duration::from_millis(elapsed_ms))
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}

fn string_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}
