//! # Utility module
//!
//! Helpers for turning raw user input into canonical article titles,
//! article URLs, and filesystem-safe cache filenames.

pub mod url;

// Re-export commonly used items for convenience
pub use url::{article_url, cache_file_name, normalize_article_input, WIKIPEDIA_BASE_URL};
