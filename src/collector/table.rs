use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::models::MemberRecord;

/// Shared membership view keyed by source address.
///
/// Writers (upsert, eviction) take the write lock; snapshots take the read
/// lock and copy the records out, so callers never iterate live state.
#[derive(Debug, Clone, Default)]
pub struct MembershipTable {
    inner: Arc<RwLock<HashMap<String, MemberRecord>>>,
}

impl MembershipTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the record for `source_address`.
    ///
    /// Last writer wins: an older timestamp still replaces a newer one.
    /// Returns the record that was replaced, if any.
    pub async fn upsert(
        &self,
        source_address: &str,
        identity: &str,
        timestamp: DateTime<Utc>,
    ) -> Option<MemberRecord> {
        let record = MemberRecord {
            identity: identity.to_string(),
            source_address: source_address.to_string(),
            last_seen: timestamp,
        };
        let mut members = self.inner.write().await;
        members.insert(source_address.to_string(), record)
    }

    /// Point-in-time copy of every record, ordered by identity then address.
    pub async fn snapshot(&self) -> Vec<MemberRecord> {
        let mut records: Vec<MemberRecord> = {
            let members = self.inner.read().await;
            members.values().cloned().collect()
        };
        records.sort_by(|a, b| {
            a.identity
                .cmp(&b.identity)
                .then_with(|| a.source_address.cmp(&b.source_address))
        });
        records
    }

    pub async fn get(&self, source_address: &str) -> Option<MemberRecord> {
        self.inner.read().await.get(source_address).cloned()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Remove every record last seen strictly before `cutoff` and return them.
    ///
    /// Only the sweeper evicts.
    pub(crate) async fn evict_older_than(&self, cutoff: DateTime<Utc>) -> Vec<MemberRecord> {
        let mut members = self.inner.write().await;
        let expired: Vec<String> = members
            .iter()
            .filter(|(_, record)| record.last_seen < cutoff)
            .map(|(key, _)| key.clone())
            .collect();

        expired
            .into_iter()
            .filter_map(|key| members.remove(&key))
            .collect()
    }
}
