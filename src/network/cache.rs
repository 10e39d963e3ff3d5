use std::fs;
use std::path::{Path, PathBuf};

use crate::core::WikiplotError;
use crate::utils::url::cache_file_name;

/// Persistent per-article cache of revision dates
///
/// One JSON file per article under the cache root; each file holds a
/// sorted array of `YYYY-MM-DD` strings, one entry per edit. Files are
/// created and overwritten by this tool but never deleted.
pub struct RevisionCache {
    root: PathBuf,
}

impl RevisionCache {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Cache file path for an article title; a pure function of the title
    pub fn file_path(&self, title: &str) -> PathBuf {
        self.root.join(cache_file_name(title))
    }

    /// Loads the cached date list for an article
    ///
    /// A missing file is an empty history, not an error. A file that
    /// exists but does not parse as a JSON array of strings is fatal;
    /// silently dropping it could lose recorded edits.
    pub fn load(&self, title: &str) -> Result<Vec<String>, WikiplotError> {
        let path = self.file_path(title);

        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(WikiplotError::CacheIo { path, source: e }),
        };

        let mut dates: Vec<String> = serde_json::from_str(&contents)
            .map_err(|e| WikiplotError::CacheCorrupt { path, source: e })?;
        dates.sort();

        Ok(dates)
    }

    /// Writes the date list for an article, sorted, overwriting any
    /// previous record and creating the cache root if needed
    pub fn save(&self, title: &str, dates: &[String]) -> Result<(), WikiplotError> {
        let path = self.file_path(title);

        fs::create_dir_all(&self.root).map_err(|e| WikiplotError::CacheIo {
            path: self.root.clone(),
            source: e,
        })?;

        let mut sorted: Vec<&String> = dates.iter().collect();
        sorted.sort();

        let contents = serde_json::to_string(&sorted).map_err(|e| WikiplotError::CacheCorrupt {
            path: path.clone(),
            source: e,
        })?;

        fs::write(&path, contents).map_err(|e| WikiplotError::CacheIo { path, source: e })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_path_is_pure_function_of_title() {
        let cache = RevisionCache::new("cache");
        assert_eq!(
            cache.file_path("Rust"),
            PathBuf::from("cache/https-en-wikipedia-org-wiki-Rust.json")
        );
        assert_eq!(cache.file_path("Rust"), cache.file_path("Rust"));
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let cache = RevisionCache::new(dir.path());
        assert!(cache.load("Nonexistent Article").unwrap().is_empty());
    }

    #[test]
    fn test_save_sorts_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        let cache = RevisionCache::new(dir.path());
        let dates = vec![
            "2020-01-03".to_string(),
            "2020-01-01".to_string(),
            "2020-01-02".to_string(),
            "2020-01-01".to_string(),
        ];

        cache.save("Article", &dates).unwrap();

        assert_eq!(
            cache.load("Article").unwrap(),
            vec!["2020-01-01", "2020-01-01", "2020-01-02", "2020-01-03"]
        );
    }

    #[test]
    fn test_load_corrupt_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let cache = RevisionCache::new(dir.path());
        fs::write(cache.file_path("Article"), "{not a json array}").unwrap();

        let error = cache.load("Article").unwrap_err();
        assert!(matches!(error, WikiplotError::CacheCorrupt { .. }));
    }
}
