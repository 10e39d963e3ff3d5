//! # Network module
//!
//! Everything involved in talking to the MediaWiki API and remembering
//! what was already fetched:
//!
//! - `session` - blocking HTTP session with pacing and bounded retries
//! - `revisions` - incremental revision-history fetching and merging
//! - `cache` - per-article JSON cache of edit dates

pub mod cache;
pub mod revisions;
pub mod session;

// Re-export commonly used items for convenience
pub use cache::RevisionCache;
pub use revisions::{FetchOutcome, RevisionFetcher, RevisionSource};
pub use session::Session;
