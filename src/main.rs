//! tape-vm - CLI entry point
//!
//! `tape-vm <program>` loads the file and runs it against stdin/stdout.
//! Diagnostics go to stderr.

use clap::Parser;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tapevm::{CancelToken, Machine, Opcode, Program, RunOutcome, RunReport};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// A runtime error (bounds violation, unmatched bracket, broken output).
const EXIT_RUNTIME_ERROR: u8 = 1;
/// The program could not be loaded. Matches clap's usage error code.
const EXIT_LOAD_ERROR: u8 = 2;

#[derive(Parser)]
#[command(name = "tape-vm")]
#[command(version)]
#[command(about = "Run a program for the eight-opcode tape machine")]
struct Cli {
    /// Path to the program file to execute
    program: PathBuf,
    /// Only report errors on stderr
    #[arg(short, long)]
    quiet: bool,
    /// Print a JSON run report to stderr when the run ends
    #[arg(long)]
    report: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.quiet);

    let program = match Program::load(&cli.program) {
        Ok(p) => p,
        Err(e) => {
            error!("{}", e);
            return ExitCode::from(EXIT_LOAD_ERROR);
        }
    };

    info!(
        size = program.len(),
        opcodes = program.opcode_count(),
        "loaded program"
    );

    let cancel = CancelToken::new();
    watch_interrupts(cancel.clone());

    info!("running, press ctrl+c to abort, ctrl+d to end input");
    execute(&program, &cancel, cli.report)
}

/// Run the program on stdin/stdout. The machine and its tape are dropped
/// before the exit code is handed back.
fn execute(program: &Program, cancel: &CancelToken, want_report: bool) -> ExitCode {
    let mut machine = Machine::new(program, io::stdin().lock(), io::stdout().lock());

    match machine.run(cancel) {
        Ok(report) => {
            match report.outcome {
                RunOutcome::Completed => {
                    info!("done, took: {:.6}s", report.elapsed.as_secs_f64());
                }
                RunOutcome::Interrupted => {
                    warn!(ip = machine.ip(), "aborted");
                }
            }
            if want_report {
                print_report(&report);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            let opcode = e
                .ip()
                .and_then(|ip| machine.program().get(ip))
                .and_then(Opcode::decode);
            match opcode {
                Some(op) => error!(opcode = %op, "{}", e),
                None => error!("{}", e),
            }
            ExitCode::from(EXIT_RUNTIME_ERROR)
        }
    }
}

fn print_report(report: &RunReport) {
    match serde_json::to_string(report) {
        Ok(json) => eprintln!("{}", json),
        Err(e) => error!("failed to serialize run report: {}", e),
    }
}

fn init_logging(quiet: bool) {
    let default = if quiet { "error" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

/// Cancel `token` on Ctrl+C.
///
/// The engine only sees the flag between instructions. If it is blocked on
/// input when the interrupt arrives the process exits here instead; stdout is
/// flushed after every byte, so nothing written is lost.
fn watch_interrupts(token: CancelToken) {
    let spawned = std::thread::Builder::new()
        .name("ctrl-c".into())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(rt) => rt,
                Err(e) => {
                    warn!("interrupt handling unavailable: {}", e);
                    return;
                }
            };

            runtime.block_on(async {
                if tokio::signal::ctrl_c().await.is_err() {
                    return;
                }
                token.cancel();
                if token.is_reading_input() {
                    warn!("aborted while waiting for input");
                    std::process::exit(0);
                }
                warn!("interrupt received, stopping");
            });
        });

    if let Err(e) = spawned {
        warn!("interrupt handling unavailable: {}", e);
    }
}
