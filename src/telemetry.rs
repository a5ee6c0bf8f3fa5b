//! Telemetry metric name constants.
//!
//! Centralised metric names for tunemetrics operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `tunemetrics_`. Counters end in `_total`.
//!
//! # Common labels
//!
//! - `method`: HTTP method of an upstream request
//! - `status`: HTTP status code, or "transport" when no response arrived
//! - `token_kind`: "client" or "user"
//! - `cache`: name of the memoized producer (e.g. "artist_catalog")

/// Upstream HTTP requests issued by the request proxy (retries included).
///
/// Labels: `method`, `status`.
pub const UPSTREAM_REQUESTS_TOTAL: &str = "tunemetrics_upstream_requests_total";

/// Retries after an upstream auth failure (at most one per request).
///
/// Labels: `token_kind`.
pub const AUTH_RETRIES_TOTAL: &str = "tunemetrics_auth_retries_total";

/// Memoization cache hits.
///
/// Labels: `cache`.
pub const CACHE_HITS_TOTAL: &str = "tunemetrics_cache_hits_total";

/// Memoization cache misses (producer invocations).
///
/// Labels: `cache`.
pub const CACHE_MISSES_TOTAL: &str = "tunemetrics_cache_misses_total";

/// Album listing pages fetched successfully.
pub const CATALOG_PAGES_TOTAL: &str = "tunemetrics_catalog_pages_total";

/// Page or batch lookups that failed and were absorbed.
///
/// Labels: `stage` ("page" | "batch" | "album_tracks").
pub const CATALOG_PARTIAL_FAILURES_TOTAL: &str = "tunemetrics_catalog_partial_failures_total";

/// Round assembly attempts.
///
/// Labels: `outcome` ("built" | "no_data").
pub const ROUNDS_TOTAL: &str = "tunemetrics_rounds_total";
