use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use shakmaty::{CastlingMode, Move};
use std::io;
use std::path::PathBuf;
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

use crate::autoplay::{self, AutoPlayer, LoopPolicy, LoopReport, Selector, Step};
use crate::board::{color_name, Board, GameStatus};
use crate::command::{self, Action, BoundAction, Command};
use crate::config::EngineConfig;
use crate::error::{CommandError, EngineError, SubmitError};
use crate::mailbox::{mailbox, CommandSender, Mailbox};
use crate::notation::MoveRequest;
use crate::uci::Analyzer;
use crate::view::{export, render, BoardView};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Dispatching,
    LoopRunning,
    Stopped,
}

/// Owns the board and applies every change to it. Runs on its own thread
/// and takes its work from a single-slot mailbox.
pub struct GameEngine {
    board: Board,
    analyzer: Box<dyn Analyzer>,
    view: Option<Box<dyn BoardView>>,
    config: EngineConfig,
    rng: StdRng,
    inbox: Option<Mailbox>,
    state: EngineState,
    edit_mode: bool,
    halt: bool,
    stopping: bool,
}

impl GameEngine {
    pub fn new(analyzer: Box<dyn Analyzer>, config: EngineConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            board: Board::new(),
            analyzer,
            view: None,
            config,
            rng,
            inbox: None,
            state: EngineState::Idle,
            edit_mode: false,
            halt: false,
            stopping: false,
        }
    }

    pub fn with_view(mut self, view: impl BoardView + 'static) -> Self {
        self.view = Some(Box::new(view));
        self
    }

    pub fn with_board(mut self, board: Board) -> Self {
        self.board = board;
        self
    }

    /// Lets running loops see commands that arrive while they play.
    pub fn attach(&mut self, inbox: Mailbox) {
        self.inbox = Some(inbox);
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn analyzer(&self) -> &dyn Analyzer {
        self.analyzer.as_ref()
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn is_edit_mode(&self) -> bool {
        self.edit_mode
    }

    pub fn is_halted(&self) -> bool {
        self.halt
    }

    pub fn is_auto_playing(&self) -> bool {
        self.state == EngineState::LoopRunning
    }

    /// Moves the engine onto its own thread. The thread hands the engine
    /// back when it stops.
    pub fn spawn(self) -> io::Result<EngineHandle> {
        let (sender, inbox) = mailbox();
        let mut engine = self;
        let thread = thread::Builder::new()
            .name("game-engine".to_string())
            .spawn(move || {
                engine.run(inbox);
                engine
            })?;
        Ok(EngineHandle { sender, thread })
    }

    /// Takes and dispatches commands until the stop command arrives.
    pub fn run(&mut self, inbox: Mailbox) {
        self.attach(inbox);
        self.stopping = false;
        debug!("Game engine running");

        loop {
            self.state = EngineState::Idle;
            let command = match &self.inbox {
                Some(inbox) => inbox.take(),
                None => Command::Stop,
            };
            if command == Command::Stop {
                break;
            }

            self.state = EngineState::Dispatching;
            if let Err(e) = self.execute(command) {
                warn!("{}", e);
            }
            if self.stopping {
                break;
            }
        }

        self.state = EngineState::Stopped;
        debug!("Game engine stopped");
    }

    pub fn execute(&mut self, command: Command) -> Result<(), CommandError> {
        match command {
            Command::Move(request) => self.apply_request(&request, true).map(|_| ()),
            Command::Named { name, args } => self.dispatch(&name, &args),
            Command::Halt => {
                self.halt_idle();
                Ok(())
            }
            Command::Stop => {
                self.halt = true;
                self.stopping = true;
                Ok(())
            }
        }
    }

    fn dispatch(&mut self, name: &str, args: &[String]) -> Result<(), CommandError> {
        let Some(action) = Action::lookup(name) else {
            // Anything that is not an action name is read as a move
            let request: MoveRequest = name
                .parse()
                .map_err(|_| CommandError::UnknownCommand(name.to_string()))?;
            if !args.is_empty() {
                return Err(CommandError::UnknownCommand(format!("{} {}", name, args.join(" "))));
            }
            return self.apply_request(&request, true).map(|_| ());
        };

        let bound = action.bind(args)?;
        self.perform(bound)
    }

    fn perform(&mut self, action: BoundAction) -> Result<(), CommandError> {
        match action {
            BoundAction::BestMove => self.play_best_move(true).map(|_| ()),
            BoundAction::RandomMove => {
                self.play_random_move(true);
                Ok(())
            }
            BoundAction::Loop(policy) => {
                self.run_loop(policy);
                Ok(())
            }
            BoundAction::Reset => {
                self.reset_board();
                Ok(())
            }
            BoundAction::Undo => self.reverse_move().map(|_| ()),
            BoundAction::Halt => {
                self.halt_idle();
                Ok(())
            }
            BoundAction::ToggleEdit => {
                self.toggle_edit_mode();
                Ok(())
            }
            BoundAction::Benchmark(rounds) => {
                self.run_benchmark(rounds);
                Ok(())
            }
            BoundAction::EngineInfo => {
                match self.analyzer.last_info() {
                    Some(line) => info!("Engine (depth {}): {}", self.analyzer.depth(), line),
                    None => info!("Engine (depth {}) has not searched yet", self.analyzer.depth()),
                }
                Ok(())
            }
            BoundAction::Status => {
                let status = self.board.status();
                info!("{} ({}), {} to move", status.result(), status, color_name(self.board.turn()));
                Ok(())
            }
            BoundAction::LegalMoves => {
                let moves: Vec<String> = self
                    .board
                    .legal_moves()
                    .iter()
                    .map(|mv| mv.to_uci(CastlingMode::Standard).to_string())
                    .collect();
                info!("{}", moves.join(", "));
                Ok(())
            }
            BoundAction::SaveBoard => self.save_board().map(|_| ()),
            BoundAction::SetDepth(depth) => {
                self.analyzer.set_depth(depth);
                info!("Engine search depth set to {}", depth);
                Ok(())
            }
            BoundAction::LoadFen(fen) => self.load_fen(&fen),
            BoundAction::Help => {
                info!("{}", command::help());
                Ok(())
            }
        }
    }

    /// Parses and plays a move. With `refresh` the view is redrawn and given
    /// time to settle.
    pub fn apply(&mut self, notation: &str, refresh: bool) -> Result<GameStatus, CommandError> {
        let request: MoveRequest = notation.parse()?;
        self.apply_request(&request, refresh)
    }

    pub fn apply_request(&mut self, request: &MoveRequest, refresh: bool) -> Result<GameStatus, CommandError> {
        if self.edit_mode {
            self.board.place(request)?;
            info!("Placed {}", request);
        } else {
            let mv = self
                .board
                .legal_move(request)
                .ok_or_else(|| CommandError::IllegalMove(request.to_string()))?;
            self.board.push(&mv);
        }
        Ok(self.after_move(refresh))
    }

    fn play(&mut self, mv: &Move, refresh: bool) -> GameStatus {
        self.board.push(mv);
        self.after_move(refresh)
    }

    fn after_move(&mut self, refresh: bool) -> GameStatus {
        if refresh {
            self.refresh_view();
        }
        self.check_status()
    }

    /// Logs checkmate or any other end of game.
    pub fn check_status(&self) -> GameStatus {
        let status = self.board.status();
        match status {
            GameStatus::Ongoing => {}
            GameStatus::Checkmate(_) => info!("Checkmate! {} ({})", status, status.result()),
            _ => info!("Game over! {} ({})", status, status.result()),
        }
        status
    }

    fn query_best(&mut self, depth: Option<u32>) -> Result<Option<String>, EngineError> {
        // Always hand the engine the position as it is now
        let fen = self.board.fen();
        self.analyzer.best_move(&fen, depth)
    }

    fn resolve_suggestion(&self, suggestion: &str) -> Result<Move, EngineError> {
        suggestion
            .parse::<MoveRequest>()
            .ok()
            .and_then(|request| self.board.legal_move(&request))
            .ok_or_else(|| EngineError::IllegalSuggestion(suggestion.to_string()))
    }

    /// An engine with no move to offer is taken as the end of the game.
    pub fn play_best_move(&mut self, refresh: bool) -> Result<Step, CommandError> {
        match self.query_best(None)? {
            Some(suggestion) => {
                let mv = self.resolve_suggestion(&suggestion)?;
                info!("Playing engine move: {}", suggestion);
                self.play(&mv, refresh);
                Ok(Step::Played)
            }
            None => {
                self.check_status();
                Ok(Step::Exhausted)
            }
        }
    }

    pub fn play_random_move(&mut self, refresh: bool) -> Step {
        let moves = self.board.legal_moves();
        match moves.choose(&mut self.rng).cloned() {
            Some(mv) => {
                info!("Playing random move: {}", mv.to_uci(CastlingMode::Standard));
                self.play(&mv, refresh);
                Step::Played
            }
            None => {
                self.check_status();
                Step::Exhausted
            }
        }
    }

    /// Tries the engine's depth-1 move first. It is kept only if it ends the
    /// game; otherwise it is taken back and a random move is played instead.
    pub fn play_look_ahead(&mut self, refresh: bool) -> Result<Step, CommandError> {
        let Some(suggestion) = self.query_best(Some(1))? else {
            self.check_status();
            return Ok(Step::Exhausted);
        };

        let tentative = self.resolve_suggestion(&suggestion)?;
        self.board.push(&tentative);
        if self.board.is_game_over() {
            info!("Engine move {} ends the game", suggestion);
            self.after_move(refresh);
            return Ok(Step::Played);
        }
        self.board.pop();

        Ok(self.play_random_move(refresh))
    }

    pub fn run_loop(&mut self, policy: LoopPolicy) -> LoopReport {
        self.run_loop_paced(policy, false)
    }

    fn run_loop_paced(&mut self, policy: LoopPolicy, headless: bool) -> LoopReport {
        self.state = EngineState::LoopRunning;
        debug!("Auto-play {:?} started", policy);

        let report = autoplay::drive(self, policy, headless);

        // A halt only ever ends the run it was aimed at
        self.halt = false;
        self.state = EngineState::Dispatching;
        info!(
            "Auto-play {:?} finished after {} moves in {:.2?}{}",
            policy,
            report.iterations,
            report.elapsed,
            if report.halted { " (halted)" } else { "" }
        );
        report
    }

    fn poll_inbox(&mut self) {
        let Some(command) = self.inbox.as_ref().and_then(Mailbox::poll) else {
            return;
        };

        match command {
            Command::Halt => {
                info!("Halt automatic play.");
                self.halt = true;
            }
            Command::Named { ref name, .. } if Action::lookup(name) == Some(Action::Halt) => {
                info!("Halt automatic play.");
                self.halt = true;
            }
            Command::Stop => {
                self.halt = true;
                self.stopping = true;
            }
            other => info!("Auto-play in progress, dropped `{}`. Send q to halt.", other),
        }
    }

    fn halt_idle(&self) {
        info!("No automatic play to halt.");
    }

    /// Runs the engine, random and look-ahead loops headless from the initial
    /// position, `rounds` times, and logs how long each took.
    pub fn run_benchmark(&mut self, rounds: u32) -> Vec<LoopReport> {
        let mut reports = Vec::new();

        'rounds: for round in 1..=rounds {
            for policy in [LoopPolicy::BestMove, LoopPolicy::RandomMove, LoopPolicy::LookAhead] {
                self.board.reset();
                let report = self.run_loop_paced(policy, true);
                info!(
                    "Benchmark {}/{} {:?}: elapsed {:.2?}, iterations {}, {}",
                    round,
                    rounds,
                    policy,
                    report.elapsed,
                    report.iterations,
                    report.status.result()
                );

                let halted = report.halted;
                reports.push(report);
                if halted || self.stopping {
                    break 'rounds;
                }
            }
        }

        self.board.reset();
        self.refresh_view();
        reports
    }

    pub fn reset_board(&mut self) {
        info!("Resetting board.");
        self.board.reset();
        if let Err(e) = self.analyzer.new_game() {
            warn!("Engine did not acknowledge the new game: {}", e);
        }
        self.refresh_view();
    }

    pub fn reverse_move(&mut self) -> Result<String, CommandError> {
        let taken_back = self.board.pop().ok_or(CommandError::NothingToUndo)?;
        info!("Took back {}", taken_back);
        self.refresh_view();
        Ok(taken_back)
    }

    pub fn toggle_edit_mode(&mut self) {
        self.edit_mode = !self.edit_mode;
        info!("Edit mode {}", if self.edit_mode { "on" } else { "off" });
    }

    pub fn load_fen(&mut self, fen: &str) -> Result<(), CommandError> {
        self.board = Board::from_fen(fen)?;
        if let Err(e) = self.analyzer.new_game() {
            warn!("Engine did not acknowledge the new game: {}", e);
        }
        self.refresh_view();
        self.check_status();
        Ok(())
    }

    pub fn save_board(&self) -> Result<PathBuf, CommandError> {
        let path = export(&self.config.export_dir, &render(&self.board))?;
        info!("Board written to: {}", path.display());
        Ok(path)
    }

    pub fn refresh_view(&self) {
        if let Some(view) = &self.view {
            view.refresh(&render(&self.board));
            if !self.config.settle_delay.is_zero() {
                thread::sleep(self.config.settle_delay);
            }
        }
    }
}

impl AutoPlayer for GameEngine {
    fn halt_requested(&mut self) -> bool {
        self.poll_inbox();
        self.halt
    }

    fn status(&self) -> GameStatus {
        self.board.status()
    }

    fn step(&mut self, selector: Selector, refresh: bool) -> Result<Step, CommandError> {
        match selector {
            Selector::Best => self.play_best_move(refresh),
            Selector::Random => Ok(self.play_random_move(refresh)),
            Selector::LookAhead => self.play_look_ahead(refresh),
        }
    }

    fn pause(&self) {
        if !self.config.loop_pause.is_zero() {
            thread::sleep(self.config.loop_pause);
        }
    }
}

/// The front end's grip on a spawned engine.
pub struct EngineHandle {
    sender: CommandSender,
    thread: JoinHandle<GameEngine>,
}

impl EngineHandle {
    pub fn submit(&self, command: Command) -> Result<(), SubmitError> {
        self.sender.submit(command)
    }

    pub fn sender(&self) -> CommandSender {
        self.sender.clone()
    }

    /// Sends the stop command and waits for the engine thread to finish.
    pub fn shutdown(self) -> thread::Result<GameEngine> {
        self.sender.stop();
        self.thread.join()
    }
}
