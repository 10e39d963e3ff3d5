use std::collections::BTreeMap;
use std::thread::sleep;
use std::time::{Duration, Instant};

use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::core::{WikiplotError, WikiplotOptions};
use crate::network::revisions::{
    Continuation, RevisionBatch, RevisionQuery, RevisionSource, REVISION_BATCH_SIZE,
};

/// Blocking HTTP session against the MediaWiki API
///
/// Owns the client and the options, paces consecutive requests to honor
/// the fair-use policy, and retries transient failures with exponential
/// backoff. Pagination stays strictly sequential; every request depends
/// on the previous response's continuation tokens.
pub struct Session {
    client: Client,
    options: WikiplotOptions,
    last_request_at: Option<Instant>,
    request_count: usize,
}

impl Session {
    pub fn new(options: WikiplotOptions) -> Result<Self, WikiplotError> {
        let user_agent = options.user_agent.clone().unwrap_or_else(|| {
            format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
        });

        let mut builder = Client::builder().user_agent(user_agent);
        if options.timeout > 0 {
            builder = builder.timeout(Duration::from_secs(options.timeout));
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            options,
            last_request_at: None,
            request_count: 0,
        })
    }

    pub fn options(&self) -> &WikiplotOptions {
        &self.options
    }

    /// Number of API requests issued so far in this session
    pub fn request_count(&self) -> usize {
        self.request_count
    }

    /// Issues one GET against the API, with pacing and bounded retries
    ///
    /// Retries cover transport errors, HTTP 429 and 5xx. Anything else,
    /// or an exhausted retry budget, is fatal.
    fn api_query(&mut self, params: &[(&str, String)]) -> Result<Value, WikiplotError> {
        let mut attempt: usize = 0;

        loop {
            self.apply_pacing();

            let response = self
                .client
                .get(&self.options.api_url)
                .query(params)
                .send();

            match response {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response.json()?);
                    }
                    if attempt < self.options.max_retries && is_retryable_status(status) {
                        self.wait_before_retry(attempt);
                        attempt += 1;
                        continue;
                    }
                    return Err(WikiplotError::RemoteStatus(status));
                }
                Err(error) => {
                    if attempt < self.options.max_retries
                        && (error.is_timeout() || error.is_connect() || error.is_request())
                    {
                        self.wait_before_retry(attempt);
                        attempt += 1;
                        continue;
                    }
                    return Err(error.into());
                }
            }
        }
    }

    /// Waits out the remainder of the pacing interval since the previous
    /// request; the first request of a session goes out immediately
    fn apply_pacing(&mut self) {
        if let Some(last) = self.last_request_at {
            let required = Duration::from_millis(self.options.pacing_ms);
            let elapsed = last.elapsed();
            if elapsed < required {
                sleep(required - elapsed);
            }
        }
        self.last_request_at = Some(Instant::now());
        self.request_count = self.request_count.saturating_add(1);
    }

    fn wait_before_retry(&self, attempt: usize) {
        let exponent = u32::try_from(attempt).unwrap_or(8).min(8);
        let scale = 1u64.checked_shl(exponent).unwrap_or(256);
        sleep(Duration::from_millis(
            self.options.retry_delay_ms.saturating_mul(scale),
        ));
    }
}

fn is_retryable_status(status: reqwest::StatusCode) -> bool {
    status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

impl RevisionSource for Session {
    fn fetch_batch(&mut self, query: &RevisionQuery) -> Result<Option<RevisionBatch>, WikiplotError> {
        let mut params: Vec<(&str, String)> = vec![
            ("action", "query".to_string()),
            ("format", "json".to_string()),
            ("prop", "revisions".to_string()),
            ("titles", query.title.clone()),
            ("rvprop", "timestamp|userid".to_string()),
            ("rvlimit", REVISION_BATCH_SIZE.to_string()),
            ("rvdir", "newer".to_string()),
        ];
        if let Some(start) = &query.start {
            params.push(("rvstart", start.clone()));
        }
        match &query.continuation {
            Some(continuation) => {
                params.push(("continue", continuation.token.clone()));
                params.push(("rvcontinue", continuation.rvcontinue.clone()));
            }
            // An empty continue opts into the current continuation format.
            None => params.push(("continue", String::new())),
        }

        let payload = self.api_query(&params)?;

        Ok(parse_revision_batch(payload))
    }
}

#[derive(Deserialize)]
struct ApiResponse {
    #[serde(rename = "continue")]
    continuation: Option<Continuation>,
    query: Option<ApiQuery>,
}

#[derive(Deserialize)]
struct ApiQuery {
    /// Pages keyed by an opaque page id ("-1" for a missing page)
    pages: Option<BTreeMap<String, ApiPage>>,
}

#[derive(Deserialize)]
struct ApiPage {
    #[serde(default)]
    revisions: Vec<ApiRevision>,
}

#[derive(Deserialize)]
struct ApiRevision {
    timestamp: String,
}

/// Extracts the per-day dates and continuation tokens from one response
///
/// Returns None when the expected page container is absent or the payload
/// has the wrong shape; the fetcher treats that as a recoverable end of
/// pagination.
fn parse_revision_batch(payload: Value) -> Option<RevisionBatch> {
    let response: ApiResponse = serde_json::from_value(payload).ok()?;
    let pages = response.query?.pages?;

    let dates = pages
        .values()
        .flat_map(|page| &page.revisions)
        .map(|revision| {
            revision
                .timestamp
                .get(..10)
                .unwrap_or(&revision.timestamp)
                .to_string()
        })
        .collect();

    Some(RevisionBatch {
        dates,
        continuation: response.continuation,
    })
}
