//! Game session state machine.
//!
//! A session plays a fixed number of rounds:
//!
//! ```text
//! AwaitingRound ──start_round──► Playing ──answer──► Answered ──start_round──► Playing ...
//!                                   │                    │
//!                              snippet_ended        (last round)
//!                                   │                    ▼
//!                                Playing             Finished
//! ```
//!
//! Out-of-order calls return [`TuneError::InvalidInput`] and leave the
//! session unchanged.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::RoundData;
use crate::{Result, TuneError};

/// Rounds per session unless configured otherwise.
pub const DEFAULT_ROUNDS: u32 = 5;

/// Length of the played snippet.
pub const DEFAULT_SNIPPET_MS: u64 = 5_000;

/// Outcome of answering a round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResult {
    pub is_correct: bool,
    pub correct_answer: String,
}

/// The round currently being played.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveRound {
    pub round: RoundData,
    /// Offset into the track where the snippet starts.
    pub snippet_start_ms: u64,
    /// Set once the snippet has finished playing.
    pub snippet_over: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GamePhase {
    AwaitingRound,
    Playing(ActiveRound),
    Answered(AnswerResult),
    Finished,
}

/// Score keeping and phase tracking for one player.
#[derive(Debug, Clone)]
pub struct GameSession {
    total_rounds: u32,
    snippet_ms: u64,
    rounds_started: u32,
    score: u32,
    phase: GamePhase,
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new(DEFAULT_ROUNDS)
    }
}

impl GameSession {
    pub fn new(total_rounds: u32) -> Self {
        Self {
            total_rounds,
            snippet_ms: DEFAULT_SNIPPET_MS,
            rounds_started: 0,
            score: 0,
            phase: if total_rounds == 0 {
                GamePhase::Finished
            } else {
                GamePhase::AwaitingRound
            },
        }
    }

    pub fn snippet_ms(mut self, ms: u64) -> Self {
        self.snippet_ms = ms;
        self
    }

    /// Begin playing `round`, choosing where the snippet starts.
    pub fn start_round<R: Rng + ?Sized>(
        &mut self,
        round: RoundData,
        rng: &mut R,
    ) -> Result<&ActiveRound> {
        match self.phase {
            GamePhase::AwaitingRound | GamePhase::Answered(_) => {}
            _ => return Err(self.out_of_order("start a round")),
        }

        let span = round
            .track_to_guess
            .duration_ms
            .saturating_sub(self.snippet_ms);
        let snippet_start_ms = if span == 0 { 0 } else { rng.gen_range(0..span) };

        self.rounds_started += 1;
        debug!(round = self.rounds_started, snippet_start_ms, "round started");
        self.phase = GamePhase::Playing(ActiveRound {
            round,
            snippet_start_ms,
            snippet_over: false,
        });
        match &self.phase {
            GamePhase::Playing(active) => Ok(active),
            _ => Err(self.out_of_order("start a round")),
        }
    }

    /// Mark the current snippet as finished.
    pub fn snippet_ended(&mut self) -> Result<()> {
        match &mut self.phase {
            GamePhase::Playing(active) => {
                active.snippet_over = true;
                Ok(())
            }
            _ => Err(self.out_of_order("end a snippet")),
        }
    }

    /// Answer the current round with `choice`.
    pub fn answer(&mut self, choice: &str) -> Result<AnswerResult> {
        let GamePhase::Playing(active) = &self.phase else {
            return Err(self.out_of_order("answer"));
        };

        let result = AnswerResult {
            is_correct: active.round.is_correct(choice),
            correct_answer: active.round.correct_track_name.clone(),
        };
        if result.is_correct {
            self.score += 1;
        }
        debug!(round = self.rounds_started, correct = result.is_correct, score = self.score, "round answered");

        self.phase = if self.rounds_started >= self.total_rounds {
            GamePhase::Finished
        } else {
            GamePhase::Answered(result.clone())
        };
        Ok(result)
    }

    pub fn phase(&self) -> &GamePhase {
        &self.phase
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn total_rounds(&self) -> u32 {
        self.total_rounds
    }

    /// Rounds not yet started.
    pub fn rounds_left(&self) -> u32 {
        self.total_rounds.saturating_sub(self.rounds_started)
    }

    pub fn is_finished(&self) -> bool {
        self.phase == GamePhase::Finished
    }

    fn out_of_order(&self, action: &str) -> TuneError {
        let phase = match self.phase {
            GamePhase::AwaitingRound => "awaiting a round",
            GamePhase::Playing(_) => "playing",
            GamePhase::Answered(_) => "answered",
            GamePhase::Finished => "finished",
        };
        TuneError::InvalidInput(format!("cannot {action} while session is {phase}"))
    }
}
