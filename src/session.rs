//! Round lifecycle around a [`TickArbiter`]: lives, resets after a capture,
//! and the end-of-round summary.

use tracing::info;

use crate::constants::DEFAULT_LIVES;
use crate::engine::{ArbiterOptions, TickArbiter};
use crate::error::LevelError;
use crate::types::{GameOverReason, SessionSummary, Snapshot, TickInput, TickOutcome};
use crate::world::Level;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionOptions {
    pub lives: u32,
    pub arbiter: ArbiterOptions,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            lives: DEFAULT_LIVES,
            arbiter: ArbiterOptions::default(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct GameSession {
    arbiter: TickArbiter,
    lives: u32,
    captures: u32,
    collectibles_cleared: usize,
    end_reason: Option<GameOverReason>,
}

impl GameSession {
    pub fn new(level: Level, options: SessionOptions) -> Result<Self, LevelError> {
        Ok(Self {
            arbiter: TickArbiter::new(level, options.arbiter)?,
            lives: options.lives.max(1),
            captures: 0,
            collectibles_cleared: 0,
            end_reason: None,
        })
    }

    pub fn arbiter(&self) -> &TickArbiter {
        &self.arbiter
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    pub fn captures(&self) -> u32 {
        self.captures
    }

    pub fn is_ended(&self) -> bool {
        self.end_reason.is_some()
    }

    pub fn end_reason(&self) -> Option<GameOverReason> {
        self.end_reason
    }

    /// Runs one arbiter tick and applies its outcome. Does nothing once the
    /// round is over.
    ///
    /// Clearing the last collectible ends the round before a capture on the
    /// same tick is counted.
    pub fn step(&mut self, input: TickInput) -> TickOutcome {
        if self.is_ended() {
            return TickOutcome::default();
        }
        let outcome = self.arbiter.tick(input);

        if outcome.collectible_cleared.is_some() {
            self.collectibles_cleared += 1;
            if self.arbiter.collectibles_remaining() == 0 {
                self.finish(GameOverReason::RoundCleared);
                return outcome;
            }
        }

        if outcome.captured {
            self.captures += 1;
            self.lives = self.lives.saturating_sub(1);
            if self.lives == 0 {
                self.finish(GameOverReason::OutOfLives);
            } else {
                self.arbiter.reset_round(self.lives);
            }
        }
        outcome
    }

    pub fn finish(&mut self, reason: GameOverReason) {
        if self.end_reason.is_some() {
            return;
        }
        self.end_reason = Some(reason);
        info!(
            ?reason,
            tick = self.arbiter.tick_count(),
            lives = self.lives,
            captures = self.captures,
            cleared = self.collectibles_cleared,
            "round over"
        );
    }

    pub fn build_snapshot(&mut self, include_events: bool) -> Snapshot {
        self.arbiter.build_snapshot(include_events)
    }

    pub fn build_summary(&self) -> SessionSummary {
        SessionSummary {
            reason: self.end_reason.unwrap_or(GameOverReason::TickLimit),
            ticks: self.arbiter.tick_count(),
            difficulty: self.arbiter.difficulty(),
            lives_remaining: self.lives,
            captures: self.captures,
            collectibles_cleared: self.collectibles_cleared,
            collectibles_total: self.arbiter.collectibles_total(),
        }
    }
}
