use anyhow::{bail, Context, Result};
use clap::Parser;
use std::io::{self, BufRead};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use chessdesk::board::Board;
use chessdesk::command::Command;
use chessdesk::config::Cli;
use chessdesk::engine::GameEngine;
use chessdesk::error::SubmitError;
use chessdesk::uci::{Analyzer, UciEngine, Unavailable};
use chessdesk::view::{render, BoardView, ConsoleView};

const EXIT_WORDS: [&str; 3] = ["exit", "quit", "qq"];

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let analyzer: Box<dyn Analyzer> = match UciEngine::spawn(&cli.engine, cli.depth, cli.engine_timeout()) {
        Ok(engine) => {
            info!("Connected to engine {}", cli.engine.display());
            Box::new(engine)
        }
        Err(e) => {
            warn!("{}; engine moves are unavailable", e);
            Box::new(Unavailable::new(cli.depth))
        }
    };

    ConsoleView.refresh(&render(&Board::new()));
    let handle = GameEngine::new(analyzer, cli.engine_config())
        .with_view(ConsoleView)
        .spawn()
        .context("failed to start the game engine thread")?;

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line.context("failed to read input")?;
        let line = line.trim();
        if EXIT_WORDS.contains(&line) {
            break;
        }
        let Some(command) = Command::from_input(line) else {
            continue;
        };

        match handle.submit(command) {
            Ok(()) => {}
            Err(SubmitError::Busy(command)) => {
                warn!("Engine busy, auto-play in progress? Send q to halt. Dropped `{}`", command)
            }
            Err(SubmitError::Closed(_)) => bail!("game engine stopped unexpectedly"),
        }
    }

    info!("Shutting down");
    if handle.shutdown().is_err() {
        bail!("game engine thread panicked");
    }
    Ok(())
}
