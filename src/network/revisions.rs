use std::io::{self, Write};

use serde::Deserialize;

use crate::core::{print_error_message, WikiplotError};
use crate::network::cache::RevisionCache;

/// Largest number of revisions requested per API round-trip
pub const REVISION_BATCH_SIZE: usize = 500;

/// Continuation token pair issued by the API; both values must be echoed
/// verbatim on the next request
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Continuation {
    #[serde(rename = "continue")]
    pub token: String,
    pub rvcontinue: String,
}

/// One revision-metadata request, oldest revisions first
#[derive(Clone, Debug)]
pub struct RevisionQuery {
    pub title: String,
    /// `rvstart` lower bound; midnight UTC of the last cached day
    pub start: Option<String>,
    pub continuation: Option<Continuation>,
}

/// One page of revision days, in the order the server returned them
#[derive(Clone, Debug)]
pub struct RevisionBatch {
    pub dates: Vec<String>,
    pub continuation: Option<Continuation>,
}

/// Source of revision batches
///
/// The trait is the seam between the fetch protocol and the transport:
/// `Session` implements it over HTTP, tests implement it over canned
/// fixtures. `Ok(None)` means the response arrived but lacked the
/// expected page container; the fetcher treats that as the end of the
/// data, not as a failure.
pub trait RevisionSource {
    fn fetch_batch(&mut self, query: &RevisionQuery) -> Result<Option<RevisionBatch>, WikiplotError>;
}

/// Result of one incremental fetch
#[derive(Debug)]
pub struct FetchOutcome {
    /// Complete sorted date list, cache plus newly fetched days
    pub dates: Vec<String>,
    /// How many of those dates were not in the cache before this run
    pub new_count: usize,
    /// Whether the cache file was (re)written
    pub cache_written: bool,
}

/// Fetches the revision history of one article, reusing cached days
///
/// Protocol: load the cache, re-request history from midnight of the last
/// cached day onward, follow continuation tokens until the server stops
/// issuing them, drop re-fetched boundary-day entries, append the rest,
/// and persist the merged list when it grew.
pub struct RevisionFetcher<'a, S: RevisionSource> {
    source: &'a mut S,
    cache: &'a RevisionCache,
    silent: bool,
}

impl<'a, S: RevisionSource> RevisionFetcher<'a, S> {
    pub fn new(source: &'a mut S, cache: &'a RevisionCache, silent: bool) -> Self {
        Self {
            source,
            cache,
            silent,
        }
    }

    pub fn fetch(&mut self, title: &str) -> Result<FetchOutcome, WikiplotError> {
        let cached = self.cache.load(title)?;
        let last_date = cached.last().cloned();

        if !self.silent {
            if let Some(last) = &last_date {
                println!(" (updating from cache, last date: {last})");
            }
        }

        let mut query = RevisionQuery {
            title: title.to_string(),
            start: last_date.as_ref().map(|d| format!("{d}T00:00:00Z")),
            continuation: None,
        };

        let mut fetched: Vec<String> = Vec::new();
        let mut aborted = false;
        loop {
            let batch = match self.source.fetch_batch(&query)? {
                Some(batch) => batch,
                None => {
                    // Recoverable: nonexistent page or truncated payload.
                    // Whatever accumulated so far is the complete new data.
                    print_error_message("Error: Page not found or invalid response");
                    aborted = true;
                    break;
                }
            };

            fetched.extend(batch.dates);

            if !self.silent {
                print!(
                    "Fetched {} revisions so far...\r",
                    cached.len() + fetched.len()
                );
                let _ = io::stdout().flush();
            }

            match batch.continuation {
                Some(continuation) => query.continuation = Some(continuation),
                None => break,
            }
        }

        if let Some(last) = &last_date {
            if let Some((was, now)) = boundary_day_mismatch(&cached, &fetched, last) {
                print_error_message(&format!(
                    "Warning: boundary day {last} re-fetched with {now} edits, cache holds {was}; keeping cached count"
                ));
            }
        }

        let new_dates = filter_new_dates(fetched, last_date.as_deref());
        let new_count = new_dates.len();

        let mut dates = cached.clone();
        dates.extend(new_dates);

        // An unchanged existing cache is not rewritten, and an aborted
        // first fetch leaves no cache file behind.
        let cache_written = new_count > 0 || (cached.is_empty() && !aborted);
        if cache_written {
            self.cache.save(title, &dates)?;
        }

        if !self.silent {
            println!("\nDone! Total revisions: {} ({new_count} new)", dates.len());
        }

        Ok(FetchOutcome {
            dates,
            new_count,
            cache_written,
        })
    }
}

/// Drops every fetched date not strictly greater than the last cached day
///
/// With `rvstart` at midnight of that day the server re-sends the whole
/// boundary day; those entries are already represented in the cache.
/// Without a cache, everything fetched is new.
pub fn filter_new_dates(fetched: Vec<String>, last_date: Option<&str>) -> Vec<String> {
    match last_date {
        Some(last) => fetched.into_iter().filter(|d| d.as_str() > last).collect(),
        None => fetched,
    }
}

/// Compares the cached edit count for the boundary day against the
/// re-fetched count; a difference means the merge may drop or duplicate
/// edits (deleted or suppressed revisions), which is worth surfacing
pub fn boundary_day_mismatch(
    cached: &[String],
    fetched: &[String],
    last_date: &str,
) -> Option<(usize, usize)> {
    let cached_count = cached.iter().filter(|d| d.as_str() == last_date).count();
    let refetched_count = fetched.iter().filter(|d| d.as_str() <= last_date).count();

    if cached_count == refetched_count {
        None
    } else {
        Some((cached_count, refetched_count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dates(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_filter_new_dates_without_cache_keeps_all() {
        let fetched = dates(&["2020-01-01", "2020-01-01", "2020-01-02"]);
        assert_eq!(filter_new_dates(fetched.clone(), None), fetched);
    }

    #[test]
    fn test_filter_new_dates_drops_boundary_day() {
        let fetched = dates(&["2020-01-02", "2020-01-02", "2020-01-03"]);
        assert_eq!(
            filter_new_dates(fetched, Some("2020-01-02")),
            dates(&["2020-01-03"])
        );
    }

    #[test]
    fn test_filter_new_dates_everything_already_cached() {
        let fetched = dates(&["2020-01-01", "2020-01-02"]);
        assert!(filter_new_dates(fetched, Some("2020-01-02")).is_empty());
    }

    #[test]
    fn test_boundary_day_mismatch_counts_match() {
        let cached = dates(&["2020-01-01", "2020-01-02", "2020-01-02"]);
        let fetched = dates(&["2020-01-02", "2020-01-02", "2020-01-03"]);
        assert_eq!(boundary_day_mismatch(&cached, &fetched, "2020-01-02"), None);
    }

    #[test]
    fn test_boundary_day_mismatch_detects_difference() {
        let cached = dates(&["2020-01-01", "2020-01-02", "2020-01-02"]);
        // One of the boundary-day revisions disappeared server-side.
        let fetched = dates(&["2020-01-02", "2020-01-03"]);
        assert_eq!(
            boundary_day_mismatch(&cached, &fetched, "2020-01-02"),
            Some((2, 1))
        );
    }

    #[test]
    fn test_merged_result_stays_sorted() {
        let cached = dates(&["2020-01-01", "2020-01-02"]);
        let fetched = dates(&["2020-01-02", "2020-01-03", "2020-01-04"]);

        let mut merged = cached.clone();
        merged.extend(filter_new_dates(fetched, Some("2020-01-02")));

        let mut sorted = merged.clone();
        sorted.sort();
        assert_eq!(merged, sorted);
        assert_eq!(
            merged,
            dates(&["2020-01-01", "2020-01-02", "2020-01-03", "2020-01-04"])
        );
    }
}
