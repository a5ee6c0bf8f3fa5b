//! Caching subsystem.
//!
//! [`Memoized`] puts a bounded LRU cache in front of an async producer.
//! The service owns one process-wide instance wrapping
//! [`CatalogFetcher::fetch_artist_catalog`](crate::catalog::CatalogFetcher::fetch_artist_catalog)
//! so repeated rounds for the same artist and token reuse one catalog fetch.
//! See [`memoize`] module docs for key derivation and concurrency notes.

pub mod memoize;

pub use memoize::{CacheConfig, Memoized};
