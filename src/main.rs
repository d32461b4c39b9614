use std::io::{self, BufRead};

use anyhow::{Context, bail};
use clap::Parser;
use tracing::info;

use matchbook::{Cli, Engine, EngineConfig, EngineWorker, write_reply};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = EngineConfig::for_book(&cli.venue, &cli.symbol);
    info!(venue = %cli.venue, symbol = %cli.symbol, "starting matching engine");

    // Commands arrive on stdin, replies leave on stdout, and the
    // execution/ticker feed goes to stderr.
    let engine = Engine::new(config, Box::new(io::stderr()));
    let (client, _handle) = EngineWorker::start(engine);

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    for line in stdin.lock().lines() {
        let line = line.context("failed reading the command channel")?;
        let reply = client
            .submit(&line)
            .context("engine worker went away mid-session")?;
        write_reply(&mut stdout, &reply).context("failed writing a reply")?;
    }

    bail!("unexpected EOF on the command channel");
}
