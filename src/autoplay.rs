use std::time::{Duration, Instant};
use tracing::warn;

use crate::board::GameStatus;
use crate::error::CommandError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopPolicy {
    BestMove,
    RandomMove,
    Alternating,
    LookAhead,
}

/// How the next move of a run is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector {
    Best,
    Random,
    LookAhead,
}

/// Hands out `Best` and `Random` in strict turns, starting with `Best`.
#[derive(Debug, Clone, Copy)]
pub struct Alternator {
    next: Selector,
}

impl Alternator {
    pub fn new() -> Self {
        Self {
            next: Selector::Best,
        }
    }

    pub fn advance(&mut self) -> Selector {
        let current = self.next;
        self.next = match current {
            Selector::Best => Selector::Random,
            _ => Selector::Best,
        };
        current
    }
}

impl Default for Alternator {
    fn default() -> Self {
        Self::new()
    }
}

enum Picker {
    Fixed(Selector),
    Alternating(Alternator),
}

impl Picker {
    fn for_policy(policy: LoopPolicy) -> Self {
        match policy {
            LoopPolicy::BestMove => Picker::Fixed(Selector::Best),
            LoopPolicy::RandomMove => Picker::Fixed(Selector::Random),
            LoopPolicy::LookAhead => Picker::Fixed(Selector::LookAhead),
            LoopPolicy::Alternating => Picker::Alternating(Alternator::new()),
        }
    }

    fn next(&mut self) -> Selector {
        match self {
            Picker::Fixed(selector) => *selector,
            Picker::Alternating(alternator) => alternator.advance(),
        }
    }
}

/// Outcome of a single iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Played,
    /// Nothing left to play: no engine move or no legal move.
    Exhausted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopReport {
    pub policy: LoopPolicy,
    pub iterations: u32,
    pub status: GameStatus,
    pub halted: bool,
    pub elapsed: Duration,
}

/// What the loop driver needs from whoever owns the game.
pub trait AutoPlayer {
    /// Checked once per iteration, before anything is played.
    fn halt_requested(&mut self) -> bool;

    fn status(&self) -> GameStatus;

    fn step(&mut self, selector: Selector, refresh: bool) -> Result<Step, CommandError>;

    fn pause(&self);
}

/// Plays moves picked by `policy` until the game ends, a halt is requested,
/// or no move can be produced. Headless runs skip view refreshes and pauses.
pub fn drive<P: AutoPlayer + ?Sized>(player: &mut P, policy: LoopPolicy, headless: bool) -> LoopReport {
    let started = Instant::now();
    let mut picker = Picker::for_policy(policy);
    let mut iterations = 0;
    let mut halted = false;

    loop {
        if player.halt_requested() {
            halted = true;
            break;
        }
        if player.status().is_over() {
            break;
        }

        match player.step(picker.next(), !headless) {
            Ok(Step::Played) => iterations += 1,
            Ok(Step::Exhausted) => break,
            Err(e) => {
                warn!("Auto-play stopped: {}", e);
                break;
            }
        }

        if !headless {
            player.pause();
        }
    }

    LoopReport {
        policy,
        iterations,
        status: player.status(),
        halted,
        elapsed: started.elapsed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use std::cell::Cell;

    struct FakePlayer {
        moves_left: u32,
        halt_after: Option<u32>,
        played: Vec<Selector>,
        refreshed: Vec<bool>,
        pauses: Cell<u32>,
        fail_on: Option<u32>,
    }

    impl FakePlayer {
        fn new(moves_left: u32) -> Self {
            Self {
                moves_left,
                halt_after: None,
                played: Vec::new(),
                refreshed: Vec::new(),
                pauses: Cell::new(0),
                fail_on: None,
            }
        }
    }

    impl AutoPlayer for FakePlayer {
        fn halt_requested(&mut self) -> bool {
            self.halt_after == Some(self.played.len() as u32)
        }

        fn status(&self) -> GameStatus {
            if self.moves_left == 0 {
                GameStatus::Stalemate
            } else {
                GameStatus::Ongoing
            }
        }

        fn step(&mut self, selector: Selector, refresh: bool) -> Result<Step, CommandError> {
            if self.fail_on == Some(self.played.len() as u32) {
                return Err(EngineError::Exited.into());
            }
            self.played.push(selector);
            self.refreshed.push(refresh);
            self.moves_left -= 1;
            Ok(Step::Played)
        }

        fn pause(&self) {
            self.pauses.set(self.pauses.get() + 1);
        }
    }

    #[test]
    fn alternator_starts_with_best_and_flips_every_time() {
        let mut alternator = Alternator::new();
        let picked: Vec<Selector> = (0..5).map(|_| alternator.advance()).collect();
        assert_eq!(
            picked,
            vec![
                Selector::Best,
                Selector::Random,
                Selector::Best,
                Selector::Random,
                Selector::Best
            ]
        );
    }

    #[test]
    fn runs_until_the_game_is_over() {
        let mut player = FakePlayer::new(4);
        let report = drive(&mut player, LoopPolicy::Alternating, false);

        assert_eq!(report.iterations, 4);
        assert_eq!(report.status, GameStatus::Stalemate);
        assert!(!report.halted);
        assert_eq!(
            player.played,
            vec![Selector::Best, Selector::Random, Selector::Best, Selector::Random]
        );
        assert!(player.refreshed.iter().all(|&r| r));
        assert_eq!(player.pauses.get(), 4);
    }

    #[test]
    fn halt_is_seen_at_the_top_of_the_next_iteration() {
        let mut player = FakePlayer::new(10);
        player.halt_after = Some(2);
        let report = drive(&mut player, LoopPolicy::LookAhead, true);

        assert_eq!(report.iterations, 2);
        assert!(report.halted);
        assert_eq!(report.status, GameStatus::Ongoing);
        assert_eq!(player.played, vec![Selector::LookAhead, Selector::LookAhead]);
        assert!(player.refreshed.iter().all(|&r| !r));
    }

    #[test]
    fn finished_game_plays_nothing() {
        let mut player = FakePlayer::new(0);
        let report = drive(&mut player, LoopPolicy::BestMove, false);
        assert_eq!(report.iterations, 0);
        assert!(player.played.is_empty());
    }

    #[test]
    fn step_error_ends_the_run() {
        let mut player = FakePlayer::new(10);
        player.fail_on = Some(3);
        let report = drive(&mut player, LoopPolicy::RandomMove, true);
        assert_eq!(report.iterations, 3);
        assert!(!report.halted);
        assert_eq!(player.pauses.get(), 0);
    }
}
