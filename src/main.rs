use owo_colors::OwoColorize;
use riskvm::config::Config;
use riskvm::simulator::{Options, Simulator};
use std::io::{self, Write};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn init_tracing(trace: bool) {
    let filter = if trace {
        EnvFilter::new("riskvm=trace")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn error(message: impl std::fmt::Display) -> ExitCode {
    eprintln!("{} {message}", "error:".bright_red().bold());
    ExitCode::from(1)
}

fn main() -> ExitCode {
    let config = match Config::get() {
        Ok(config) => config,
        Err(e) => return error(e),
    };
    init_tracing(config.trace);

    let mut sim = match Simulator::load_from_file(&config.file, Options::from(&config)) {
        Ok(sim) => sim,
        Err(e) => return error(e),
    };

    if config.disassemble {
        let mut stdout = io::stdout().lock();
        return match sim.disassemble(&mut stdout).and_then(|()| stdout.flush()) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => error(e),
        };
    }

    match sim.run() {
        Ok(outcome) => {
            tracing::info!(?outcome, "done");
            ExitCode::SUCCESS
        }
        // The console went away (e.g. a closed pipe), nothing more can be printed to it
        Err(e) => error(format_args!("console I/O failed: {e}")),
    }
}
