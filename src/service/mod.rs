//! Service facade
//!
//! [`GameService`] wires the request proxy, catalog fetcher, catalog cache
//! and round builder together. Create one per process with
//! [`TuneMetrics::builder`] and share it; the catalog cache lives inside.

mod builder;

use std::sync::Arc;

pub use builder::{TuneMetrics, TuneMetricsBuilder};

use crate::Result;
use crate::catalog::CatalogFetcher;
use crate::proxy::{Credentials, RequestProxy};
use crate::round::{CatalogCache, GameSession, RoundBuilder, RoundOptions};
use crate::types::{RoundData, Track};

/// Round and catalog operations over one shared proxy and cache.
#[derive(Clone)]
pub struct GameService {
    proxy: Arc<RequestProxy>,
    fetcher: Arc<CatalogFetcher>,
    rounds: RoundBuilder,
}

impl GameService {
    pub(crate) fn new(
        proxy: Arc<RequestProxy>,
        fetcher: Arc<CatalogFetcher>,
        rounds: RoundBuilder,
    ) -> Self {
        Self {
            proxy,
            fetcher,
            rounds,
        }
    }

    /// Build a round from the (memoized) catalog of `artist_id`.
    ///
    /// `Ok(None)` means the artist has no playable track.
    pub async fn build_round(
        &self,
        artist_id: &str,
        access_token: &str,
    ) -> Result<Option<RoundData>> {
        self.rounds.build_round(artist_id, access_token).await
    }

    /// Fetch the catalog of `artist_id`, bypassing the cache.
    pub async fn artist_catalog(
        &self,
        artist_id: &str,
        credentials: &Credentials,
    ) -> Result<Vec<Track>> {
        self.fetcher.fetch_artist_catalog(artist_id, credentials).await
    }

    /// A fresh session of `rounds` rounds.
    pub fn new_session(&self, rounds: u32) -> GameSession {
        GameSession::new(rounds)
    }

    pub fn proxy(&self) -> &Arc<RequestProxy> {
        &self.proxy
    }

    pub fn catalog_cache(&self) -> &CatalogCache {
        self.rounds.catalog()
    }

    pub fn round_options(&self) -> &RoundOptions {
        self.rounds.options()
    }
}
