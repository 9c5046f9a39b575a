//! # Hoard: The Stash
//!
//! **Deduplicating fetch-and-cache of remote content.**
//!
//! Hoard fetches thumbnails and archives over HTTP into a local cache directory
//! and remembers what it has. It is the [`ContentFetcher`](curio_core::ContentFetcher)
//! the `curio` core talks to, but works on its own too.
//!
//! ## Core Features
//!
//! - **Deduplication**: concurrent requests for the same URL share one transfer;
//!   every caller's completion receives the same record.
//! - **Progress**: an outstanding transfer is visible as a [`FetchTask`](curio_core::FetchTask)
//!   with fetched/total byte counters.
//! - **Bounded concurrency**: at most `max_concurrent_fetches` transfers run at
//!   once; the rest wait in the `Queuing` state.
//! - **Persistence**: cached records survive restarts via `<cache>/contents.toml`.
//!
//! ## Usage
//!
//! ```no_run
//! use curio_core::{ContentFetcher, CurioConfig};
//! use curio_hoard::ContentCache;
//! use futures::channel::oneshot;
//!
//! #[async_std::main]
//! async fn main() -> anyhow::Result<()> {
//!     let cache = ContentCache::new(&CurioConfig::load()?)?;
//!     let (tx, rx) = oneshot::channel();
//!
//!     cache.async_get_content(
//!         "https://example.com/thumbnail.png",
//!         Box::new(move |record| {
//!             let _ = tx.send(record);
//!         }),
//!     );
//!
//!     let record = rx.await?;
//!     println!("{:?} -> {:?}", record.state, record.filepath);
//!     Ok(())
//! }
//! ```

/// The shared cache and its fetch workers.
pub mod cache;

/// HTTP transfer with redirect handling.
pub mod download;

mod index;

pub use cache::{content_id, ContentCache};
