//! Per-endpoint request counters
//!
//! Requests are keyed by method and matched route template
//! (e.g. `GET /api/thread/{slug_or_id}/posts`), so the key space is bounded
//! by the router. Unmatched requests are counted under `<unmatched>`.

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};
use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};
use tokio::sync::RwLock;

const UNMATCHED: &str = "<unmatched>";

/// Request statistics collector, shared through `AppState`
#[derive(Clone, Default)]
pub struct RequestStats {
    counts: Arc<RwLock<HashMap<String, u64>>>,
}

impl RequestStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record(&self, key: &str) {
        let mut counts = self.counts.write().await;
        match counts.get_mut(key) {
            Some(count) => *count += 1,
            None => {
                counts.insert(key.to_string(), 1);
            }
        }
    }

    pub async fn get_count(&self, key: &str) -> u64 {
        self.counts.read().await.get(key).copied().unwrap_or(0)
    }

    /// Sorted copy of all counters
    pub async fn snapshot(&self) -> BTreeMap<String, u64> {
        self.counts
            .read()
            .await
            .iter()
            .map(|(key, count)| (key.clone(), *count))
            .collect()
    }
}

/// Count every request before handing it on
pub async fn track_requests(
    State(stats): State<RequestStats>,
    request: Request,
    next: Next,
) -> Response {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str())
        .unwrap_or(UNMATCHED);
    let key = format!("{} {}", request.method(), route);

    stats.record(&key).await;

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_record_and_snapshot() {
        let stats = RequestStats::new();
        stats.record("GET /api/forum/{slug}/details").await;
        stats.record("GET /api/forum/{slug}/details").await;
        stats.record("POST /api/forum/create").await;

        assert_eq!(stats.get_count("GET /api/forum/{slug}/details").await, 2);
        assert_eq!(stats.get_count("GET /missing").await, 0);

        let snapshot = stats.snapshot().await;
        let keys: Vec<_> = snapshot.keys().cloned().collect();
        assert_eq!(
            keys,
            vec!["GET /api/forum/{slug}/details", "POST /api/forum/create"]
        );
    }

    #[tokio::test]
    async fn test_clones_share_counters() {
        let stats = RequestStats::new();
        let handle = stats.clone();
        handle.record("GET /health").await;

        assert_eq!(stats.get_count("GET /health").await, 1);
        assert_eq!(handle.snapshot().await.len(), 1);
    }
}
