//! Round payload handed to the round consumer

use serde::{Deserialize, Serialize};

use super::Track;

/// One "guess the track" round.
///
/// `options` holds the target's name exactly once, every entry distinct.
/// Built fresh per request and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundData {
    pub track_to_guess: Track,
    pub options: Vec<String>,
    pub correct_track_name: String,
}

impl RoundData {
    /// Whether `choice` is the correct answer.
    pub fn is_correct(&self, choice: &str) -> bool {
        choice == self.correct_track_name
    }
}
