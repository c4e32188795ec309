use std::fmt;

use crate::autoplay::LoopPolicy;
use crate::error::CommandError;
use crate::notation::MoveRequest;

/// A unit of work for the game engine thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Move(MoveRequest),
    Named { name: String, args: Vec<String> },
    Halt,
    Stop,
}

impl Command {
    /// Turns a line of user input into a command. Names are resolved later
    /// by the engine, so anything that is not a halt becomes `Named`.
    pub fn from_input(input: &str) -> Option<Command> {
        let mut parts = input.split_whitespace();
        let name = parts.next()?;
        if Action::lookup(name) == Some(Action::Halt) {
            return Some(Command::Halt);
        }
        Some(Command::Named {
            name: name.to_string(),
            args: parts.map(str::to_string).collect(),
        })
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Command::Move(request) => write!(f, "{}", request),
            Command::Named { name, args } if args.is_empty() => write!(f, "{}", name),
            Command::Named { name, args } => write!(f, "{} {}", name, args.join(" ")),
            Command::Halt => write!(f, "halt"),
            Command::Stop => write!(f, "stop"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    BestMove,
    RandomMove,
    FastForward,
    EngineVsEngine,
    RandomVsRandom,
    LookAhead,
    Reset,
    Undo,
    Halt,
    ToggleEdit,
    Benchmark,
    EngineInfo,
    Status,
    LegalMoves,
    SaveBoard,
    SetDepth,
    LoadFen,
    Help,
}

struct ActionEntry {
    action: Action,
    name: &'static str,
    alias: &'static str,
    usage: &'static str,
}

const ACTIONS: &[ActionEntry] = &[
    ActionEntry { action: Action::BestMove, name: "best-move", alias: "sf", usage: "play the engine's best move" },
    ActionEntry { action: Action::RandomMove, name: "random-move", alias: "rr", usage: "play a random legal move" },
    ActionEntry { action: Action::FastForward, name: "fast-forward", alias: "ff", usage: "alternate engine and random moves until the game ends" },
    ActionEntry { action: Action::EngineVsEngine, name: "engine-vs-engine", alias: "psf", usage: "let the engine play both sides" },
    ActionEntry { action: Action::RandomVsRandom, name: "random-vs-random", alias: "prr", usage: "play random moves for both sides" },
    ActionEntry { action: Action::LookAhead, name: "look-ahead", alias: "la", usage: "random moves, keeping an engine move only when it ends the game" },
    ActionEntry { action: Action::Reset, name: "reset", alias: "re", usage: "back to the initial position" },
    ActionEntry { action: Action::Undo, name: "undo", alias: "rev", usage: "take back the last move" },
    ActionEntry { action: Action::Halt, name: "halt", alias: "q", usage: "stop automatic play" },
    ActionEntry { action: Action::ToggleEdit, name: "edit", alias: "ee", usage: "toggle free piece placement" },
    ActionEntry { action: Action::Benchmark, name: "bench", alias: "bm", usage: "bench N: time N rounds of headless auto-play" },
    ActionEntry { action: Action::EngineInfo, name: "info", alias: "ii", usage: "show the engine's last search info" },
    ActionEntry { action: Action::Status, name: "status", alias: "cc", usage: "show the game result" },
    ActionEntry { action: Action::LegalMoves, name: "legal-moves", alias: "lm", usage: "list legal moves" },
    ActionEntry { action: Action::SaveBoard, name: "save-board", alias: "sb", usage: "write the board to a new file" },
    ActionEntry { action: Action::SetDepth, name: "depth", alias: "sd", usage: "depth N: set the engine search depth" },
    ActionEntry { action: Action::LoadFen, name: "fen", alias: "lf", usage: "fen FEN: load a position" },
    ActionEntry { action: Action::Help, name: "help", alias: "hh", usage: "list commands" },
];

impl Action {
    pub fn lookup(name: &str) -> Option<Action> {
        ACTIONS
            .iter()
            .find(|entry| entry.name == name || entry.alias == name)
            .map(|entry| entry.action)
    }

    pub fn name(&self) -> &'static str {
        ACTIONS
            .iter()
            .find(|entry| entry.action == *self)
            .map_or("?", |entry| entry.name)
    }

    /// Checks the argument list against what the action takes.
    pub fn bind(self, args: &[String]) -> Result<BoundAction, CommandError> {
        let bound = match self {
            Action::Benchmark => return Ok(BoundAction::Benchmark(self.count_arg(args)?)),
            Action::SetDepth => return Ok(BoundAction::SetDepth(self.count_arg(args)?)),
            Action::LoadFen => {
                if args.is_empty() {
                    return Err(self.argument_error("expected a FEN string"));
                }
                return Ok(BoundAction::LoadFen(args.join(" ")));
            }
            Action::BestMove => BoundAction::BestMove,
            Action::RandomMove => BoundAction::RandomMove,
            Action::FastForward => BoundAction::Loop(LoopPolicy::Alternating),
            Action::EngineVsEngine => BoundAction::Loop(LoopPolicy::BestMove),
            Action::RandomVsRandom => BoundAction::Loop(LoopPolicy::RandomMove),
            Action::LookAhead => BoundAction::Loop(LoopPolicy::LookAhead),
            Action::Reset => BoundAction::Reset,
            Action::Undo => BoundAction::Undo,
            Action::Halt => BoundAction::Halt,
            Action::ToggleEdit => BoundAction::ToggleEdit,
            Action::EngineInfo => BoundAction::EngineInfo,
            Action::Status => BoundAction::Status,
            Action::LegalMoves => BoundAction::LegalMoves,
            Action::SaveBoard => BoundAction::SaveBoard,
            Action::Help => BoundAction::Help,
        };

        if !args.is_empty() {
            return Err(self.argument_error(&format!("takes no arguments, got {}", args.len())));
        }
        Ok(bound)
    }

    fn count_arg(self, args: &[String]) -> Result<u32, CommandError> {
        match args {
            [value] => match value.parse::<u32>() {
                Ok(n) if n > 0 => Ok(n),
                _ => Err(self.argument_error(&format!("`{}` is not a positive number", value))),
            },
            _ => Err(self.argument_error(&format!("expected one number, got {} arguments", args.len()))),
        }
    }

    fn argument_error(self, reason: &str) -> CommandError {
        CommandError::Argument {
            command: self.name().to_string(),
            reason: reason.to_string(),
        }
    }
}

/// An action with its arguments already parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoundAction {
    BestMove,
    RandomMove,
    Loop(LoopPolicy),
    Reset,
    Undo,
    Halt,
    ToggleEdit,
    Benchmark(u32),
    EngineInfo,
    Status,
    LegalMoves,
    SaveBoard,
    SetDepth(u32),
    LoadFen(String),
    Help,
}

pub fn help() -> String {
    let mut lines = vec!["Commands (name / short form):".to_string()];
    lines.push("  e2e4, e7e8q        play a move".to_string());
    for entry in ACTIONS {
        lines.push(format!("  {:<18} {:<4} {}", entry.name, entry.alias, entry.usage));
    }
    lines.push("  exit, quit, qq     leave".to_string());
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn names_and_aliases_resolve_to_the_same_action() {
        assert_eq!(Action::lookup("psf"), Some(Action::EngineVsEngine));
        assert_eq!(Action::lookup("engine-vs-engine"), Some(Action::EngineVsEngine));
        assert_eq!(Action::lookup("ff"), Some(Action::FastForward));
        assert_eq!(Action::lookup("e2e4"), None);
        assert_eq!(Action::lookup("zz"), None);
    }

    #[test]
    fn every_action_has_a_distinct_name_and_alias() {
        let mut seen = Vec::new();
        for entry in ACTIONS {
            assert!(!seen.contains(&entry.name), "duplicate {}", entry.name);
            assert!(!seen.contains(&entry.alias), "duplicate {}", entry.alias);
            seen.push(entry.name);
            seen.push(entry.alias);
        }
    }

    #[test]
    fn halt_input_becomes_the_halt_command() {
        assert_eq!(Command::from_input("q"), Some(Command::Halt));
        assert_eq!(Command::from_input(" halt "), Some(Command::Halt));
        assert_eq!(Command::from_input("   "), None);
        assert_eq!(
            Command::from_input("bench 3"),
            Some(Command::Named {
                name: "bench".to_string(),
                args: args(&["3"])
            })
        );
    }

    #[test]
    fn arguments_are_checked() {
        assert_eq!(Action::Benchmark.bind(&args(&["2"])).unwrap(), BoundAction::Benchmark(2));
        assert!(matches!(
            Action::Benchmark.bind(&[]),
            Err(CommandError::Argument { .. })
        ));
        assert!(matches!(
            Action::Benchmark.bind(&args(&["two"])),
            Err(CommandError::Argument { .. })
        ));
        assert!(matches!(
            Action::SetDepth.bind(&args(&["0"])),
            Err(CommandError::Argument { .. })
        ));
        assert!(matches!(
            Action::Reset.bind(&args(&["now"])),
            Err(CommandError::Argument { .. })
        ));
        assert_eq!(
            Action::LoadFen.bind(&args(&["8/8/8/8/8/8/8/8", "w", "-", "-"])).unwrap(),
            BoundAction::LoadFen("8/8/8/8/8/8/8/8 w - -".to_string())
        );
        assert_eq!(
            Action::FastForward.bind(&[]).unwrap(),
            BoundAction::Loop(LoopPolicy::Alternating)
        );
    }
}
