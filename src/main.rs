//! Entry point. Loads both ledgers, runs the console, flushes on exit.

mod config;
mod console;
mod error;
mod ledger;
mod parser;
mod store;
mod types;
mod utils;

use dotenvy::dotenv;
use std::io::{self, BufRead, Write};
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

use crate::console::{Console, Step, HELP};
use crate::ledger::{EquityLedger, OptionLedger};

fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with_writer(io::stderr)
        .init();

    // Load config
    let cfg_path = config::AppConfig::resolve_path();
    let cfg = config::AppConfig::load(&cfg_path)?;

    // Ledgers are restored once at startup; a bad file degrades to empty.
    let equities = EquityLedger::load(&cfg.ledger.equity_path);
    let options = OptionLedger::load(&cfg.ledger.option_path);
    info!(
        "Trade ledger started. Stocks={} ({}), Options={} ({})",
        equities.len(),
        cfg.ledger.equity_path.display(),
        options.len(),
        cfg.ledger.option_path.display()
    );

    let mut console = Console::new(equities, options);
    println!("{HELP}");

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut line = String::new();
    loop {
        print!("{}", cfg.console.prompt);
        stdout.flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            // EOF behaves like quit
            println!();
            break;
        }
        match console.handle_line(&line) {
            Step::Continue(out) if out.is_empty() => {}
            Step::Continue(out) => println!("{out}"),
            Step::Quit => break,
        }
    }

    if let Err(e) = console.save_all() {
        error!("final save failed: {:#}", e);
        return Err(e.into());
    }
    Ok(())
}
