//! tunemetrics - "guess the track" round builder
//!
//! This crate turns an artist's upstream music catalog into trivia rounds:
//! one target track plus distractor titles, chosen through a multi-policy
//! priority queue so the wrong answers mix hits, deep cuts, old and new
//! releases.
//!
//! The pieces, bottom-up:
//!
//! - [`proxy`]: authenticated upstream requests with client/user token
//!   resolution and a single retry after a rejected client token
//! - [`catalog`]: paginated, batched artist catalog fetching with partial
//!   failure tolerance
//! - [`cache`]: bounded LRU memoization of async producers
//! - [`queue`]: the four-policy priority queue
//! - [`round`]: round assembly and the game session state machine
//! - [`service`]: the facade wiring all of the above together
//!
//! # Example
//!
//! ```rust,no_run
//! use tunemetrics::TuneMetrics;
//!
//! #[tokio::main]
//! async fn main() -> tunemetrics::Result<()> {
//!     let service = TuneMetrics::builder()
//!         .client_credentials("client-id", "client-secret")
//!         .build()?;
//!
//!     match service.build_round("0OdUWJ0sBjDrqHygGUXeCF", "user-token").await? {
//!         Some(round) => println!("options: {:?}", round.options),
//!         None => println!("nothing playable"),
//!     }
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod proxy;
pub mod queue;
pub mod round;
pub mod service;
pub mod telemetry;
pub mod ticker;
pub mod types;
mod version;

// Re-export main types at crate root
pub use error::{Result, TuneError};
pub use service::{GameService, TuneMetrics, TuneMetricsBuilder};
pub use version::{GIT_BRANCH, GIT_SHA, PKG_VERSION, git_dirty, version_string};

pub use cache::{CacheConfig, Memoized};
pub use catalog::{CatalogConfig, CatalogFetcher};
pub use proxy::{CallerContext, Credentials, RequestOptions, RequestProxy, TokenKind};
pub use queue::{DequeuePolicy, PolicyQueue};
pub use round::{AnswerResult, GamePhase, GameSession, RoundBuilder, RoundOptions, assemble_round};
pub use types::{Album, ArtistRef, Image, RoundData, Track};
