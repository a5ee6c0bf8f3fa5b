//! Round assembly.
//!
//! A round is one target track plus distractor names. [`RoundBuilder`] gets
//! the artist's catalog through the process-wide [`Memoized`] catalog cache
//! and hands it to [`assemble_round`], which is pure apart from its RNG:
//!
//! 1. keep tracks longer than `min_playable_ms`; none left means no round;
//! 2. pick the target uniformly;
//! 3. load the other playable tracks into a [`PolicyQueue`] (popularity as
//!    priority, album release date as timestamp);
//! 4. apply the four dequeue policies in shuffled order, taking one unused
//!    name per policy, so distractors mix hits, deep cuts, old and new;
//! 5. top up with uniformly sampled unused names if still short;
//! 6. Fisher–Yates the option list.
//!
//! A catalog with fewer distinct names than requested yields a shorter
//! option list, never duplicates.

pub mod session;
mod shuffle;

use std::collections::HashSet;
use std::sync::Arc;

use rand::Rng;
use tracing::{debug, info};

pub use session::{ActiveRound, AnswerResult, GamePhase, GameSession};
pub use shuffle::fisher_yates;

use crate::cache::{CacheConfig, Memoized};
use crate::catalog::CatalogFetcher;
use crate::proxy::Credentials;
use crate::queue::{DequeuePolicy, PolicyQueue};
use crate::telemetry;
use crate::types::{RoundData, Track};
use crate::Result;

/// Default number of options per round, target included.
pub const DEFAULT_OPTION_COUNT: usize = 4;

/// Tracks must be strictly longer than this to be playable.
pub const DEFAULT_MIN_PLAYABLE_MS: u64 = 5_000;

/// Catalog cache keyed on `(artist_id, access_token)`.
pub type CatalogCache = Memoized<(String, String), Vec<Track>>;

/// Tuning for [`assemble_round`].
#[derive(Debug, Clone)]
pub struct RoundOptions {
    /// Options per round including the target. Default: 4.
    pub option_count: usize,
    /// Minimum playable duration (exclusive). Default: 5000 ms.
    pub min_playable_ms: u64,
}

impl Default for RoundOptions {
    fn default() -> Self {
        Self {
            option_count: DEFAULT_OPTION_COUNT,
            min_playable_ms: DEFAULT_MIN_PLAYABLE_MS,
        }
    }
}

impl RoundOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn option_count(mut self, n: usize) -> Self {
        self.option_count = n;
        self
    }

    pub fn min_playable_ms(mut self, ms: u64) -> Self {
        self.min_playable_ms = ms;
        self
    }
}

/// Builds rounds from cached artist catalogs.
#[derive(Clone)]
pub struct RoundBuilder {
    catalog: CatalogCache,
    options: RoundOptions,
}

impl RoundBuilder {
    pub fn new(catalog: CatalogCache, options: RoundOptions) -> Self {
        Self { catalog, options }
    }

    /// Memoize [`CatalogFetcher::fetch_artist_catalog`] for use with [`RoundBuilder`].
    ///
    /// The access token is part of the key and is sent as an explicit user
    /// token.
    pub fn memoized_catalog(fetcher: Arc<CatalogFetcher>, config: &CacheConfig) -> CatalogCache {
        Memoized::new(
            "artist_catalog",
            config,
            move |(artist_id, access_token): (String, String)| {
                let fetcher = Arc::clone(&fetcher);
                async move {
                    fetcher
                        .fetch_artist_catalog(&artist_id, &Credentials::Token(access_token))
                        .await
                }
            },
        )
    }

    pub fn options(&self) -> &RoundOptions {
        &self.options
    }

    pub fn catalog(&self) -> &CatalogCache {
        &self.catalog
    }

    /// Build a round for `artist_id`, or `None` when nothing is playable.
    pub async fn build_round(
        &self,
        artist_id: &str,
        access_token: &str,
    ) -> Result<Option<RoundData>> {
        let tracks = self
            .catalog
            .call((artist_id.to_string(), access_token.to_string()))
            .await?;

        let round = assemble_round(&tracks, &self.options, &mut rand::thread_rng());
        match &round {
            Some(round) => {
                info!(artist_id, options = round.options.len(), "round built");
                metrics::counter!(telemetry::ROUNDS_TOTAL, "outcome" => "built").increment(1);
            }
            None => {
                info!(artist_id, catalog = tracks.len(), "no playable tracks, no round");
                metrics::counter!(telemetry::ROUNDS_TOTAL, "outcome" => "no_data").increment(1);
            }
        }
        Ok(round)
    }
}

/// Assemble a round from `tracks` using `rng` for every random choice.
pub fn assemble_round<R: Rng + ?Sized>(
    tracks: &[Track],
    options: &RoundOptions,
    rng: &mut R,
) -> Option<RoundData> {
    let playable: Vec<&Track> = tracks
        .iter()
        .filter(|t| t.duration_ms > options.min_playable_ms)
        .collect();
    if playable.is_empty() {
        return None;
    }

    let target_idx = rng.gen_range(0..playable.len());
    let target = playable[target_idx];
    let wanted = options.option_count.max(1);

    let mut used: HashSet<&str> = HashSet::with_capacity(wanted);
    used.insert(target.name.as_str());
    let mut names: Vec<String> = Vec::with_capacity(wanted);
    names.push(target.name.clone());

    // Missing or malformed release dates count as "released now".
    let now = chrono::Utc::now().timestamp_millis();
    let mut candidates = PolicyQueue::with_capacity(playable.len());
    for (idx, track) in playable.iter().enumerate() {
        if idx != target_idx {
            let released = track.album.release_timestamp_ms().unwrap_or(now);
            candidates.enqueue_at(*track, i64::from(track.popularity), released);
        }
    }

    let mut policies = DequeuePolicy::ALL;
    fisher_yates(&mut policies, rng);
    for policy in policies {
        if names.len() >= wanted {
            break;
        }
        while let Some(track) = candidates.dequeue(policy) {
            if used.insert(track.name.as_str()) {
                debug!(?policy, name = %track.name, "distractor picked");
                names.push(track.name.clone());
                break;
            }
        }
    }

    if names.len() < wanted {
        let mut leftovers: Vec<&Track> = candidates.drain().collect();
        while names.len() < wanted && !leftovers.is_empty() {
            let track = leftovers.swap_remove(rng.gen_range(0..leftovers.len()));
            if used.insert(track.name.as_str()) {
                names.push(track.name.clone());
            }
        }
    }

    fisher_yates(&mut names, rng);

    Some(RoundData {
        track_to_guess: target.clone(),
        options: names,
        correct_track_name: target.name.clone(),
    })
}
