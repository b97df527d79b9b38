//! Ordered "first success wins" request driver.

use serde_json::Value;
use tracing::{debug, warn};

use super::request::{Upstream, UpstreamRequest};

/// Outcome of running a list of strategies.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<T> {
    /// Strategy `index` produced an accepted value; later ones were not tried.
    Found { index: usize, value: T },

    /// Every strategy failed or was rejected.
    Exhausted,

    /// The upstream reported a used-up quota; remaining strategies were skipped.
    QuotaExceeded,
}

impl<T> Resolution<T> {
    pub fn into_value(self) -> Option<T> {
        match self {
            Resolution::Found { value, .. } => Some(value),
            Resolution::Exhausted | Resolution::QuotaExceeded => None,
        }
    }
}

/// Try `requests` in order until one succeeds and `accept` turns its body
/// into a value.
///
/// A request that errors, or whose body `accept` rejects, counts as a failed
/// strategy and the next one is tried. A quota error stops the run.
pub async fn first_success<U, T, F>(
    upstream: &U,
    requests: &[UpstreamRequest],
    mut accept: F,
) -> Resolution<T>
where
    U: Upstream,
    F: FnMut(Value) -> Option<T>,
{
    for (index, request) in requests.iter().enumerate() {
        match upstream.get(request).await {
            Ok(body) => match accept(body) {
                Some(value) => {
                    debug!(request = %request, index, "strategy succeeded");
                    return Resolution::Found { index, value };
                }
                None => debug!(request = %request, index, "strategy returned nothing usable"),
            },
            Err(e) if e.is_quota() => {
                warn!(request = %request, error = %e, "transport API quota exceeded");
                return Resolution::QuotaExceeded;
            }
            Err(e) => warn!(request = %request, error = %e, "strategy failed"),
        }
    }

    Resolution::Exhausted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::testing::FakeUpstream;
    use serde_json::json;

    fn requests() -> Vec<UpstreamRequest> {
        vec![
            UpstreamRequest::path(["a.json"]),
            UpstreamRequest::path(["b.json"]),
            UpstreamRequest::path(["c.json"]),
        ]
    }

    #[tokio::test]
    async fn stops_at_first_success() {
        let upstream = FakeUpstream::new()
            .respond("/b.json", json!({"from": "b"}))
            .respond("/c.json", json!({"from": "c"}));

        let result = first_success(&upstream, &requests(), Some).await;

        assert_eq!(
            result,
            Resolution::Found {
                index: 1,
                value: json!({"from": "b"})
            }
        );
        assert_eq!(upstream.calls(), vec!["/a.json", "/b.json"]);
    }

    #[tokio::test]
    async fn rejected_bodies_fall_through() {
        let upstream = FakeUpstream::new()
            .respond("/a.json", json!([]))
            .respond("/b.json", json!([1]));

        let result = first_success(&upstream, &requests(), |body| {
            body.as_array().filter(|a| !a.is_empty()).cloned()
        })
        .await;

        assert_eq!(result.into_value(), Some(vec![json!(1)]));
    }

    #[tokio::test]
    async fn exhausted_when_nothing_succeeds() {
        let upstream = FakeUpstream::new();
        let result = first_success(&upstream, &requests(), Some).await;

        assert_eq!(result, Resolution::Exhausted);
        assert_eq!(upstream.calls().len(), 3);
    }

    #[tokio::test]
    async fn quota_error_stops_the_run() {
        let upstream = FakeUpstream::new()
            .quota_exceeded("/a.json")
            .respond("/b.json", json!({}));

        let result = first_success(&upstream, &requests(), Some).await;

        assert_eq!(result, Resolution::QuotaExceeded);
        assert_eq!(upstream.calls(), vec!["/a.json"]);
    }
}
