use std::collections::HashMap;
use std::sync::Arc;

use indexwatch_core::RuleSummary;
use tokio::sync::Mutex;
use watch_logging::watch_debug;

use crate::client::{ClientError, JobClient};

/// Fetch-once cache of per-document rule summaries.
///
/// A successful fetch is kept for the life of the cache and never
/// revalidated. Failures are returned as-is and not retried here.
pub struct RuleSummaryCache {
    client: Arc<dyn JobClient>,
    entries: Mutex<HashMap<String, Arc<RuleSummary>>>,
}

impl RuleSummaryCache {
    pub fn new(client: Arc<dyn JobClient>) -> Self {
        Self {
            client,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub async fn get(&self, document_id: &str) -> Result<Arc<RuleSummary>, ClientError> {
        // Held across the fetch so concurrent callers share one request.
        let mut entries = self.entries.lock().await;
        if let Some(summary) = entries.get(document_id) {
            return Ok(Arc::clone(summary));
        }
        watch_debug!("fetching rule summary for document {}", document_id);
        let summary = Arc::new(self.client.fetch_rule_summary(document_id).await?);
        entries.insert(document_id.to_string(), Arc::clone(&summary));
        Ok(summary)
    }

    pub async fn cached(&self, document_id: &str) -> Option<Arc<RuleSummary>> {
        self.entries.lock().await.get(document_id).cloned()
    }
}
