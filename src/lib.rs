//! # Wikiplot Library
//!
//! Fetches the complete revision history of a Wikipedia article through the
//! MediaWiki API, keeps a local per-article cache of edit dates, and renders
//! a log-scale bar chart of edits per day.
//!
//! ## Module organization
//!
//! - `core` - configuration, error types, and the top-level pipeline
//! - `network` - MediaWiki HTTP session, revision fetching, and the date cache
//! - `chart` - edit-history chart rendering
//! - `utils` - article title and URL helpers

pub mod chart;
pub mod core;
pub mod network;
pub mod utils;

// Re-export commonly used items for convenience
pub use crate::core::*;
pub use crate::network::*;
pub use crate::utils::*;
