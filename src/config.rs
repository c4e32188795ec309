use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(name = "chessdesk", version, about = "Play through a chess game from the command line against a UCI engine")]
pub struct Cli {
    /// Path to a UCI engine executable
    #[arg(long, default_value = "stockfish")]
    pub engine: PathBuf,

    /// Default search depth sent with `go depth`
    #[arg(long, default_value_t = 9)]
    pub depth: u32,

    /// Pause after each board refresh, in milliseconds
    #[arg(long, default_value_t = 200)]
    pub settle_ms: u64,

    /// Pause between automatic moves, in milliseconds
    #[arg(long, default_value_t = 1000)]
    pub loop_pause_ms: u64,

    /// How long to wait for the engine's `bestmove`, in seconds
    #[arg(long, default_value_t = 30)]
    pub engine_timeout_secs: u64,

    /// Seed for random moves
    #[arg(long)]
    pub seed: Option<u64>,

    /// Directory for `save-board` exports
    #[arg(long, default_value = ".")]
    pub export_dir: PathBuf,
}

impl Cli {
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            settle_delay: Duration::from_millis(self.settle_ms),
            loop_pause: Duration::from_millis(self.loop_pause_ms),
            seed: self.seed,
            export_dir: self.export_dir.clone(),
        }
    }

    pub fn engine_timeout(&self) -> Duration {
        Duration::from_secs(self.engine_timeout_secs)
    }
}

/// Settings of the game engine itself. The defaults pace nothing, which is
/// what headless runs and tests want.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub settle_delay: Duration,
    pub loop_pause: Duration,
    pub seed: Option<u64>,
    pub export_dir: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            settle_delay: Duration::ZERO,
            loop_pause: Duration::ZERO,
            seed: None,
            export_dir: PathBuf::from("."),
        }
    }
}
