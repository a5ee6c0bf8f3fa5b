//! Paginated, batched artist catalog fetching.
//!
//! [`CatalogFetcher::fetch_artist_catalog`] assembles an artist's tracks:
//!
//! ```text
//!  /artists/{id}/albums?include_groups=album,single   (page 1, 2, ... via `next`)
//!          │ album ids
//!          ▼
//!  /albums?ids=a1,...,a20                              (batches of 20)
//!          │ album track listings (+ their own `next` pages)
//!          ▼
//!  keep tracks crediting the artist ─► normalize ─► dedup by id (last wins)
//! ```
//!
//! # Partial failure policy
//!
//! Only recoverable failures ([`TuneError::is_recoverable`]) are absorbed;
//! auth-class and configuration failures always propagate. Absorption
//! happens where the failure occurs:
//!
//! - a failed album page stops pagination; tracks gathered so far are kept;
//! - a failed batch lookup is skipped; later batches and pages continue;
//! - a failed follow-up page of an album's track listing ends that album.
//!
//! Every absorbed failure is logged at `warn` and counted under
//! [`CATALOG_PARTIAL_FAILURES_TOTAL`](crate::telemetry::CATALOG_PARTIAL_FAILURES_TOTAL).
//!
//! Requests run sequentially: pagination depends on the previous cursor, and
//! serial batches keep the upstream rate limit happy. The order of the
//! returned tracks is unspecified.

mod wire;

use std::collections::HashMap;
use std::sync::Arc;

use reqwest::Url;
use tracing::{debug, info, instrument, warn};

use crate::proxy::{Credentials, RequestOptions, RequestProxy};
use crate::telemetry;
use crate::types::Track;
use crate::{Result, TuneError};

use wire::{AlbumRef, AlbumsBatch, Paging, WireTrack};

/// Default upstream API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.spotify.com/v1";

/// Albums requested per listing page (the upstream maximum).
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Maximum album ids per batched lookup (the upstream ceiling).
pub const ALBUM_BATCH_SIZE: usize = 20;

/// Configuration for [`CatalogFetcher`].
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Base URL of the upstream API. Default: [`DEFAULT_API_BASE`].
    pub api_base: String,
    /// Albums per listing page. Default: [`DEFAULT_PAGE_SIZE`].
    pub page_size: u32,
    /// Optional market (ISO country code) restricting availability.
    pub market: Option<String>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            market: None,
        }
    }
}

impl CatalogConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn api_base(mut self, url: impl Into<String>) -> Self {
        self.api_base = url.into();
        self
    }

    pub fn page_size(mut self, n: u32) -> Self {
        self.page_size = n;
        self
    }

    pub fn market(mut self, market: impl Into<String>) -> Self {
        self.market = Some(market.into());
        self
    }
}

/// Walks an artist's album pages and collects their tracks.
pub struct CatalogFetcher {
    proxy: Arc<RequestProxy>,
    config: CatalogConfig,
}

impl CatalogFetcher {
    pub fn new(proxy: Arc<RequestProxy>) -> Self {
        Self::with_config(proxy, CatalogConfig::default())
    }

    pub fn with_config(proxy: Arc<RequestProxy>, config: CatalogConfig) -> Self {
        Self { proxy, config }
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// Fetch the deduplicated catalog of `artist_id`.
    #[instrument(skip(self, credentials))]
    pub async fn fetch_artist_catalog(
        &self,
        artist_id: &str,
        credentials: &Credentials,
    ) -> Result<Vec<Track>> {
        if artist_id.trim().is_empty() {
            return Err(TuneError::InvalidInput("artist id is empty".to_string()));
        }

        let options = credentials.request_options();
        let mut collected = Vec::new();
        let mut next = Some(self.first_page_url(artist_id)?);
        let mut pages = 0u32;

        while let Some(url) = next.take() {
            let page: Paging<AlbumRef> = match self.proxy.request_json(&url, &options).await {
                Ok(page) => page,
                Err(e) if !e.is_recoverable() => return Err(e),
                Err(e) => {
                    warn!(artist_id, page = pages + 1, error = %e, "album page failed, keeping partial catalog");
                    metrics::counter!(telemetry::CATALOG_PARTIAL_FAILURES_TOTAL, "stage" => "page")
                        .increment(1);
                    break;
                }
            };
            pages += 1;
            metrics::counter!(telemetry::CATALOG_PAGES_TOTAL).increment(1);

            let album_ids: Vec<String> = page.items.into_iter().filter_map(|a| a.id).collect();
            debug!(artist_id, page = pages, albums = album_ids.len(), "album page fetched");

            for batch in album_ids.chunks(ALBUM_BATCH_SIZE) {
                match self.fetch_album_batch(batch, artist_id, &options).await {
                    Ok(tracks) => collected.extend(tracks),
                    Err(e) if !e.is_recoverable() => return Err(e),
                    Err(e) => {
                        warn!(artist_id, albums = batch.len(), error = %e, "album batch failed, skipping");
                        metrics::counter!(telemetry::CATALOG_PARTIAL_FAILURES_TOTAL, "stage" => "batch")
                            .increment(1);
                    }
                }
            }

            next = page.next;
        }

        let tracks = dedup_by_id(collected);
        info!(artist_id, pages, tracks = tracks.len(), "artist catalog fetched");
        Ok(tracks)
    }

    /// Look up one batch of albums and return the artist's tracks in them.
    async fn fetch_album_batch(
        &self,
        album_ids: &[String],
        artist_id: &str,
        options: &RequestOptions,
    ) -> Result<Vec<Track>> {
        let url = self.batch_url(album_ids)?;
        let batch: AlbumsBatch = self.proxy.request_json(&url, options).await?;

        let mut tracks = Vec::new();
        for album in batch.albums.into_iter().flatten() {
            let (album, mut page) = album.into_parts();
            loop {
                let Paging { items, next } = page;
                tracks.extend(
                    items
                        .into_iter()
                        .filter_map(|t| t.into_track(&album))
                        .filter(|t| t.is_credited_to(artist_id)),
                );

                let Some(next_url) = next else { break };
                match self.proxy.request_json::<Paging<WireTrack>>(&next_url, options).await {
                    Ok(more) => page = more,
                    Err(e) if !e.is_recoverable() => return Err(e),
                    Err(e) => {
                        warn!(album_id = %album.id, error = %e, "album track page failed, truncating album");
                        metrics::counter!(telemetry::CATALOG_PARTIAL_FAILURES_TOTAL, "stage" => "album_tracks")
                            .increment(1);
                        break;
                    }
                }
            }
        }
        Ok(tracks)
    }

    /// URL of the first album listing page for `artist_id`.
    pub fn first_page_url(&self, artist_id: &str) -> Result<String> {
        let mut url = self.endpoint(&["artists", artist_id, "albums"])?;
        url.query_pairs_mut()
            .append_pair("include_groups", "album,single")
            .append_pair("limit", &self.config.page_size.to_string())
            .append_pair("offset", "0");
        self.append_market(&mut url);
        Ok(url.into())
    }

    fn batch_url(&self, album_ids: &[String]) -> Result<String> {
        let mut url = self.endpoint(&["albums"])?;
        url.query_pairs_mut().append_pair("ids", &album_ids.join(","));
        self.append_market(&mut url);
        Ok(url.into())
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.config.api_base).map_err(|e| {
            TuneError::Configuration(format!("invalid API base URL {:?}: {e}", self.config.api_base))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                TuneError::Configuration(format!(
                    "API base URL {:?} cannot carry a path",
                    self.config.api_base
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn append_market(&self, url: &mut Url) {
        if let Some(market) = &self.config.market {
            url.query_pairs_mut().append_pair("market", market);
        }
    }
}

/// Deduplicate tracks by id; a later occurrence replaces an earlier one.
pub fn dedup_by_id(tracks: Vec<Track>) -> Vec<Track> {
    let mut positions: HashMap<String, usize> = HashMap::with_capacity(tracks.len());
    let mut unique: Vec<Track> = Vec::with_capacity(tracks.len());
    for track in tracks {
        match positions.get(&track.id) {
            Some(&idx) => unique[idx] = track,
            None => {
                positions.insert(track.id.clone(), unique.len());
                unique.push(track);
            }
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::{NoClientCredentials, SessionTokens};
    use crate::types::Album;

    fn fetcher(config: CatalogConfig) -> CatalogFetcher {
        let proxy = RequestProxy::new(Arc::new(NoClientCredentials), Arc::new(SessionTokens));
        CatalogFetcher::with_config(Arc::new(proxy), config)
    }

    fn track(id: &str, name: &str) -> Track {
        Track {
            id: id.into(),
            name: name.into(),
            uri: format!("spotify:track:{id}"),
            preview_url: None,
            duration_ms: 1000,
            popularity: 0,
            explicit: false,
            album: Album::default(),
            artists: vec![],
        }
    }

    #[test]
    fn dedup_keeps_last_occurrence() {
        let tracks = vec![track("a", "first"), track("b", "b"), track("a", "second")];
        let unique = dedup_by_id(tracks);
        assert_eq!(unique.len(), 2);
        let a = unique.iter().find(|t| t.id == "a").unwrap();
        assert_eq!(a.name, "second");
    }

    #[test]
    fn first_page_url_has_filters() {
        let url = fetcher(CatalogConfig::new().market("SE"))
            .first_page_url("artist 1")
            .unwrap();
        assert!(url.starts_with("https://api.spotify.com/v1/artists/artist%201/albums?"));
        assert!(url.contains("include_groups=album%2Csingle"));
        assert!(url.contains("limit=50"));
        assert!(url.contains("offset=0"));
        assert!(url.contains("market=SE"));
    }

    #[test]
    fn trailing_slash_in_base_is_tolerated() {
        let url = fetcher(CatalogConfig::new().api_base("http://localhost:1234/v1/"))
            .batch_url(&["a".to_string(), "b".to_string()])
            .unwrap();
        assert_eq!(url, "http://localhost:1234/v1/albums?ids=a%2Cb");
    }

    #[test]
    fn invalid_base_is_configuration_error() {
        let err = fetcher(CatalogConfig::new().api_base("not a url"))
            .first_page_url("x")
            .unwrap_err();
        assert!(matches!(err, TuneError::Configuration(_)));
    }
}
