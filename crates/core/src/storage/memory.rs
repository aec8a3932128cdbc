use crate::error::Result;
use crate::storage::{Bucket, KvStore};
use chrono::NaiveDate;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

/// In-process store for tests and for running the API without a database.
#[derive(Debug, Default)]
pub struct MemoryStore {
    buckets: RwLock<HashMap<Bucket, BTreeMap<NaiveDate, Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl KvStore for MemoryStore {
    async fn upsert(&self, bucket: Bucket, date: NaiveDate, value: Value) -> Result<()> {
        self.buckets
            .write()
            .await
            .entry(bucket)
            .or_default()
            .insert(date, value);
        Ok(())
    }

    async fn get(&self, bucket: Bucket, date: NaiveDate) -> Result<Option<Value>> {
        Ok(self
            .buckets
            .read()
            .await
            .get(&bucket)
            .and_then(|b| b.get(&date).cloned()))
    }

    async fn list_recent(&self, bucket: Bucket, limit: usize) -> Result<Vec<(NaiveDate, Value)>> {
        Ok(self
            .buckets
            .read()
            .await
            .get(&bucket)
            .map(|b| {
                b.iter()
                    .rev()
                    .take(limit)
                    .map(|(d, v)| (*d, v.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn retain_recent(&self, bucket: Bucket, keep: usize) -> Result<u64> {
        let mut buckets = self.buckets.write().await;
        let Some(b) = buckets.get_mut(&bucket) else {
            return Ok(0);
        };
        let excess = b.len().saturating_sub(keep);
        let stale: Vec<NaiveDate> = b.keys().take(excess).copied().collect();
        for d in &stale {
            b.remove(d);
        }
        Ok(stale.len() as u64)
    }

    async fn upsert_retaining(
        &self,
        bucket: Bucket,
        date: NaiveDate,
        value: Value,
        keep: usize,
    ) -> Result<()> {
        let mut buckets = self.buckets.write().await;
        let b = buckets.entry(bucket).or_default();
        b.insert(date, value);
        while b.len() > keep {
            b.pop_first();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    #[tokio::test]
    async fn upsert_overwrites_same_key() {
        let store = MemoryStore::new();
        store.upsert(Bucket::Picks, day(2), json!({"v": 1})).await.unwrap();
        store.upsert(Bucket::Picks, day(2), json!({"v": 2})).await.unwrap();
        assert_eq!(
            store.get(Bucket::Picks, day(2)).await.unwrap(),
            Some(json!({"v": 2}))
        );
        assert_eq!(store.list_recent(Bucket::Picks, 10).await.unwrap().len(), 1);
        assert_eq!(store.get(Bucket::History, day(2)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn list_recent_is_newest_first_and_retention_drops_oldest() {
        let store = MemoryStore::new();
        for d in [3, 1, 5, 2, 4] {
            store
                .upsert_retaining(Bucket::History, day(d), json!(d), 3)
                .await
                .unwrap();
        }
        let dates: Vec<NaiveDate> = store
            .list_recent(Bucket::History, 10)
            .await
            .unwrap()
            .into_iter()
            .map(|(d, _)| d)
            .collect();
        assert_eq!(dates, vec![day(5), day(4), day(3)]);
        assert_eq!(store.retain_recent(Bucket::History, 1).await.unwrap(), 2);
    }
}
