use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use portico_core::domain::actor::BearerToken;
use portico_core::envelope::Envelope;

use crate::client::PlatformClient;
use crate::normalize::NormalizedResponse;
use crate::transport::{TransportError, UpstreamRequest};

/// One page of a backend listing reduced to its items and continuation
/// flag. Listings arrive in several shapes (bare array, `items`, `results`,
/// `docs`) and signal continuation in several ways; this is the single place
/// those shapes are interpreted.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PageSlice {
    pub items: Vec<Value>,
    pub has_more: bool,
}

impl PageSlice {
    pub fn from_envelope(envelope: &Envelope) -> PageSlice {
        let Some(data) = &envelope.data else {
            return PageSlice::default();
        };

        match data {
            Value::Array(items) => PageSlice { items: items.clone(), has_more: false },
            Value::Object(map) => {
                let items = ["items", "results", "docs"]
                    .iter()
                    .find_map(|key| map.get(*key).and_then(Value::as_array))
                    .cloned()
                    .unwrap_or_default();
                PageSlice { items, has_more: object_has_more(map) }
            }
            _ => PageSlice::default(),
        }
    }
}

fn object_has_more(map: &serde_json::Map<String, Value>) -> bool {
    if let Some(flag) = map.get("hasMore").and_then(Value::as_bool) {
        return flag;
    }
    if let Some(flag) =
        map.get("pagination").and_then(|p| p.get("hasMore")).and_then(Value::as_bool)
    {
        return flag;
    }
    if let (Some(page), Some(total)) = (
        map.get("page").and_then(Value::as_u64),
        map.get("totalPages").and_then(Value::as_u64),
    ) {
        return page < total;
    }
    false
}

/// Result of draining a listing to exhaustion. `complete` is false when a
/// later page failed and the items gathered up to that point were kept.
#[derive(Clone, Debug, PartialEq)]
pub struct DrainOutcome {
    pub items: Vec<Value>,
    pub pages: u32,
    pub complete: bool,
    pub failure_message: Option<String>,
}

/// A failure on the very first page. Nothing was gathered, so the caller
/// forwards the failure instead of a partial result.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DrainError {
    #[error("{0}")]
    Transport(TransportError),
    #[error("backend rejected the first page with status {}", .0.status)]
    Backend(NormalizedResponse),
}

/// Fetch every page of a backend listing sequentially: request a page,
/// inspect the continuation flag, request the next. Stops when the backend
/// reports no more data, returns an empty page, or fails. No retries.
pub async fn drain_pages(
    client: &PlatformClient,
    path: &str,
    token: &BearerToken,
    base_query: Vec<(String, String)>,
    page_size: u32,
) -> Result<DrainOutcome, DrainError> {
    let mut items = Vec::new();
    let mut page: u32 = 1;

    loop {
        let mut query = base_query.clone();
        query.push(("page".to_string(), page.to_string()));
        query.push(("limit".to_string(), page_size.to_string()));

        let request = UpstreamRequest::get(path).with_token(token).with_query(query);
        let normalized = match client.request(request).await {
            Ok(normalized) => normalized,
            Err(err) if page == 1 => return Err(DrainError::Transport(err)),
            Err(err) => {
                warn!(path, page, error = %err, "listing drain stopped mid-way");
                return Ok(DrainOutcome {
                    items,
                    pages: page - 1,
                    complete: false,
                    failure_message: Some(err.to_string()),
                });
            }
        };

        if !normalized.envelope.success {
            if page == 1 {
                return Err(DrainError::Backend(normalized));
            }
            warn!(path, page, status = normalized.status, "listing drain stopped mid-way");
            let message = normalized
                .envelope
                .message
                .unwrap_or_else(|| format!("page {page} failed with status {}", normalized.status));
            return Ok(DrainOutcome {
                items,
                pages: page - 1,
                complete: false,
                failure_message: Some(message),
            });
        }

        let slice = PageSlice::from_envelope(&normalized.envelope);
        let fetched = slice.items.len();
        items.extend(slice.items);
        debug!(path, page, fetched, "listing page drained");

        if !slice.has_more || fetched == 0 {
            return Ok(DrainOutcome { items, pages: page, complete: true, failure_message: None });
        }
        page += 1;
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Arc;

    use async_trait::async_trait;
    use bytes::Bytes;
    use serde_json::{json, Value};
    use tokio::sync::Mutex;

    use portico_core::domain::actor::BearerToken;
    use portico_core::envelope::Envelope;

    use crate::client::PlatformClient;
    use crate::transport::{PlatformTransport, RawResponse, TransportError, UpstreamRequest};

    use super::{drain_pages, DrainError, PageSlice};

    struct PagedTransport {
        replies: Mutex<VecDeque<Result<RawResponse, TransportError>>>,
    }

    impl PagedTransport {
        fn new(replies: Vec<Result<RawResponse, TransportError>>) -> Self {
            PagedTransport { replies: Mutex::new(replies.into()) }
        }
    }

    #[async_trait]
    impl PlatformTransport for PagedTransport {
        async fn execute(
            &self,
            _request: UpstreamRequest,
        ) -> Result<RawResponse, TransportError> {
            self.replies.lock().await.pop_front().unwrap_or_else(|| {
                Err(TransportError::Request("paged transport exhausted".to_string()))
            })
        }
    }

    fn page_reply(items: Vec<Value>, has_more: bool) -> Result<RawResponse, TransportError> {
        let body = json!({
            "success": true,
            "data": { "items": items, "hasMore": has_more },
        });
        Ok(RawResponse {
            status: 200,
            content_type: Some("application/json".to_string()),
            content_disposition: None,
            body: Bytes::from(body.to_string()),
        })
    }

    fn client(replies: Vec<Result<RawResponse, TransportError>>) -> PlatformClient {
        PlatformClient::new(Arc::new(PagedTransport::new(replies)), "/health")
    }

    fn token() -> BearerToken {
        BearerToken::new("Bearer drain-test")
    }

    #[test]
    fn slice_reads_bare_array_as_single_page() {
        let envelope = Envelope::success(json!([{"id": 1}, {"id": 2}]));
        let slice = PageSlice::from_envelope(&envelope);
        assert_eq!(slice.items.len(), 2);
        assert!(!slice.has_more);
    }

    #[test]
    fn slice_prefers_top_level_has_more_flag() {
        let envelope = Envelope::success(json!({
            "items": [{"id": 1}],
            "hasMore": false,
            "pagination": { "hasMore": true },
        }));
        assert!(!PageSlice::from_envelope(&envelope).has_more);
    }

    #[test]
    fn slice_falls_back_to_page_counts() {
        let envelope = Envelope::success(json!({
            "results": [{"id": 1}],
            "page": 1,
            "totalPages": 3,
        }));
        let slice = PageSlice::from_envelope(&envelope);
        assert_eq!(slice.items.len(), 1);
        assert!(slice.has_more);
    }

    #[tokio::test]
    async fn drains_until_backend_reports_no_more() {
        let client = client(vec![
            page_reply(vec![json!({"id": 1}), json!({"id": 2})], true),
            page_reply(vec![json!({"id": 3})], false),
        ]);

        let outcome =
            drain_pages(&client, "/users", &token(), Vec::new(), 2).await.expect("outcome");

        assert_eq!(outcome.items.len(), 3);
        assert_eq!(outcome.pages, 2);
        assert!(outcome.complete);
        assert!(outcome.failure_message.is_none());
    }

    #[tokio::test]
    async fn empty_page_ends_the_drain() {
        let client = client(vec![page_reply(Vec::new(), true)]);

        let outcome =
            drain_pages(&client, "/users", &token(), Vec::new(), 50).await.expect("outcome");

        assert!(outcome.items.is_empty());
        assert!(outcome.complete);
    }

    #[tokio::test]
    async fn first_page_failure_propagates() {
        let client = client(vec![Err(TransportError::Request("refused".to_string()))]);

        let err =
            drain_pages(&client, "/users", &token(), Vec::new(), 50).await.expect_err("failure");

        assert_eq!(err, DrainError::Transport(TransportError::Request("refused".to_string())));
    }

    #[tokio::test]
    async fn later_page_failure_keeps_partial_items() {
        let client = client(vec![
            page_reply(vec![json!({"id": 1})], true),
            Err(TransportError::Request("timed out".to_string())),
        ]);

        let outcome =
            drain_pages(&client, "/notifications", &token(), Vec::new(), 1).await.expect("outcome");

        assert_eq!(outcome.items.len(), 1);
        assert_eq!(outcome.pages, 1);
        assert!(!outcome.complete);
        assert!(outcome.failure_message.is_some());
    }
}
