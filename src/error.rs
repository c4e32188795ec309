use std::io;
use std::time::Duration;
use thiserror::Error;

use crate::command::Command;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("invalid move notation: {0}")]
    InvalidNotation(String),

    #[error("illegal move: {0}")]
    IllegalMove(String),

    #[error("edit placement rejected for {notation}: {reason}")]
    EditRejected { notation: String, reason: String },

    #[error("invalid position: {0}")]
    InvalidFen(String),

    #[error("command not recognized: {0}")]
    UnknownCommand(String),

    #[error("bad arguments for `{command}`: {reason}")]
    Argument { command: String, reason: String },

    #[error("no move to take back")]
    NothingToUndo,

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("could not export board: {0}")]
    Export(#[from] io::Error),
}

/// Failures talking to the external engine process.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to start engine `{path}`: {source}")]
    Spawn {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("engine i/o failed: {0}")]
    Io(#[from] io::Error),

    #[error("engine did not answer within {0:?}")]
    Timeout(Duration),

    #[error("engine process exited")]
    Exited,

    #[error("unexpected engine output: {0}")]
    Protocol(String),

    #[error("engine suggested a move that is not legal here: {0}")]
    IllegalSuggestion(String),

    #[error("no engine process is attached")]
    Unavailable,
}

#[derive(Debug, Error)]
pub enum SubmitError {
    /// The mailbox already holds a command the engine has not taken yet.
    #[error("engine busy, command dropped: {0}")]
    Busy(Command),

    #[error("engine has stopped, command dropped: {0}")]
    Closed(Command),
}
