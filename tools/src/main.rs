//! desk-runner: headless runner for the SLA desk.
//!
//! Usage:
//!   desk-runner --tickets tickets.json --at 2024-01-15T19:12:00Z
//!   desk-runner --demo 40 --seed 7 --db desk.db --watch 5
//!   desk-runner --resume desk-20240115T000000 --db desk.db
//!   desk-runner --ipc-mode

use anyhow::Result;
use desk_core::{
    command::DeskCommand,
    config::DeskConfig,
    demo,
    engine::DeskEngine,
    intake,
    notification::LogSink,
    scheduler::{SlaScheduler, SystemNow},
    selectors::{self, SlaBoard},
    store::DeskStore,
    ticket::Ticket,
    types::{Tick, Timestamp},
};
use std::env;
use std::io::{self, BufRead, Write};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    GetState,
    Tick {
        #[serde(default)]
        at: Option<String>,
    },
    Command {
        command: DeskCommand,
    },
    Quit,
}

#[derive(serde::Serialize)]
struct UiState {
    tick:    Tick,
    board:   SlaBoard,
    #[serde(skip_serializing_if = "Option::is_none")]
    error:   Option<String>,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let demo_count = parse_arg(&args, "--demo", 0usize);
    let watch_ticks = parse_arg(&args, "--watch", 0u64);
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let db = str_arg(&args, "--db").unwrap_or(":memory:");
    let at = match str_arg(&args, "--at") {
        Some(raw) => intake::parse_timestamp(raw)?,
        None => chrono::Utc::now(),
    };

    let config = match str_arg(&args, "--config") {
        Some(path) => DeskConfig::load(path)?,
        None => DeskConfig::default_test(),
    };

    let store = if db == ":memory:" {
        DeskStore::in_memory()?
    } else {
        DeskStore::open(db)?
    };
    store.migrate()?;

    let mut engine = match str_arg(&args, "--resume") {
        Some(session_id) => DeskEngine::resume(session_id.to_string(), config, store, Box::new(LogSink))?,
        None => {
            let tickets = initial_tickets(&args, &config, &store, seed, demo_count, at)?;
            let session_id = format!("desk-{}", at.format("%Y%m%dT%H%M%S"));
            DeskEngine::build(session_id, config, store, Box::new(LogSink), tickets, at)?
        }
    };

    if ipc_mode {
        run_ipc_loop(&mut engine)?;
    } else if watch_ticks > 0 {
        let runtime = tokio::runtime::Runtime::new()?;
        let engine = runtime.block_on(watch(engine, watch_ticks))?;
        print_summary(&engine, &engine.board())?;
    } else {
        println!("SLA desk — desk-runner");
        println!("  session:   {}", engine.session_id);
        println!("  db:        {db}");
        println!("  at:        {}", at.to_rfc3339());
        println!();
        engine.tick(at)?;
        print_summary(&engine, &engine.board_at(at))?;
    }

    Ok(())
}

fn initial_tickets(
    args: &[String],
    config: &DeskConfig,
    store: &DeskStore,
    seed: u64,
    demo_count: usize,
    at: Timestamp,
) -> Result<Vec<Ticket>> {
    if let Some(path) = str_arg(args, "--tickets") {
        let json = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        return Ok(intake::tickets_from_json(&json, config)?);
    }
    if demo_count > 0 {
        return Ok(demo::generate_backlog(seed, demo_count, at, config));
    }
    let stored = store.load_tickets()?;
    if !stored.is_empty() {
        log::info!("using {} tickets from the store", stored.len());
        return Ok(stored);
    }
    Ok(demo::fixture_tickets())
}

async fn watch(engine: DeskEngine, ticks: u64) -> Result<DeskEngine> {
    let period = engine.clock.period();
    let handle = SlaScheduler::spawn(engine, SystemNow);

    for _ in 0..ticks {
        tokio::select! {
            _ = tokio::time::sleep(period) => {}
            _ = tokio::signal::ctrl_c() => {
                log::info!("interrupted");
                break;
            }
        }
        let board = handle.board().await?;
        let s = &board.summary;
        println!(
            "{}  active={} escalated={} overdue={} near={} compliance={}%",
            board.now.format("%H:%M:%S"),
            s.active,
            s.escalated,
            s.overdue,
            s.near_deadline,
            s.compliance_pct
        );
    }

    Ok(handle.shutdown().await?)
}

fn run_ipc_loop(engine: &mut DeskEngine) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
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

        let error = match cmd {
            IpcCommand::Quit => break,
            other => handle_ipc(engine, other)?,
        };

        let state = UiState {
            tick: engine.clock.current_tick,
            board: engine.board(),
            error,
        };
        writeln!(stdout, "{}", serde_json::to_string(&state)?)?;
        stdout.flush()?;
    }
    Ok(())
}

/// Apply one IPC request. Bad input comes back as `Some(message)` and the
/// loop carries on; only store failures end the runner.
fn handle_ipc(engine: &mut DeskEngine, cmd: IpcCommand) -> Result<Option<String>> {
    match cmd {
        IpcCommand::Quit | IpcCommand::GetState => Ok(None),
        IpcCommand::Tick { at } => {
            let now = match at.as_deref().map(intake::parse_timestamp).transpose() {
                Ok(now) => now.unwrap_or_else(chrono::Utc::now),
                Err(e) => return Ok(Some(e.to_string())),
            };
            engine.tick(now)?;
            Ok(None)
        }
        IpcCommand::Command { command } => {
            let now = engine.clock.now.unwrap_or_else(chrono::Utc::now);
            match engine.execute(command, now) {
                Ok(_) => Ok(None),
                Err(e) if e.is_rejection() => Ok(Some(e.to_string())),
                Err(e) => Err(e.into()),
            }
        }
    }
}

fn print_summary(engine: &DeskEngine, board: &SlaBoard) -> Result<()> {
    let s = &board.summary;
    println!("=== SLA BOARD @ {} ===", board.now.to_rfc3339());
    println!("  tick:           {}", engine.clock.current_tick);
    println!("  active:         {}", s.active);
    println!("  escalated:      {}", s.escalated);
    println!("  overdue:        {}", s.overdue);
    println!("  near deadline:  {}", s.near_deadline);
    println!("  compliance:     {}%", s.compliance_pct);
    println!();
    for row in &board.rows {
        println!(
            "  {:<8} {:<34} {:>4.0}% {:<9} {:>8}{}",
            row.ticket_id,
            row.title,
            row.progress,
            row.status.label(),
            row.time_remaining,
            if row.escalated { "  [escalated]" } else if row.escalate_offered { "  [escalate?]" } else { "" },
        );
        if let Some(step) = &row.due_step {
            println!("           step {}: {} -> {}", step.level, step.action, step.recipients.join(", "));
        }
    }

    println!();
    println!("=== TEAM WORKLOAD ===");
    for (team, w) in selectors::workload_by_team(engine.book().as_slice()) {
        println!(
            "  {team:<18} total={} open={} in-progress={} resolved={} escalated={}",
            w.total, w.open, w.in_progress, w.resolved, w.escalated
        );
    }
    Ok(())
}

fn str_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
