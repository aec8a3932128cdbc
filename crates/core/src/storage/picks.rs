use crate::domain::rocket::{HistoryDay, RocketPick};
use crate::error::{Error, Result};
use crate::storage::{Bucket, KvStore};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const HISTORY_RETENTION: usize = 90;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredPicks {
    date: NaiveDate,
    picks: Vec<RocketPick>,
}

/// Sole owner of persisted rocket picks and history days.
#[derive(Clone)]
pub struct PickStore {
    kv: Arc<dyn KvStore>,
}

impl PickStore {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    pub async fn save_picks(&self, date: NaiveDate, picks: &[RocketPick]) -> Result<()> {
        let record = StoredPicks {
            date,
            picks: picks.to_vec(),
        };
        self.kv
            .upsert_retaining(Bucket::Picks, date, to_value(&record)?, HISTORY_RETENTION)
            .await?;
        tracing::info!(%date, picks = picks.len(), "saved rocket picks");
        Ok(())
    }

    pub async fn load_picks(&self, date: NaiveDate) -> Result<Option<Vec<RocketPick>>> {
        let Some(raw) = self.kv.get(Bucket::Picks, date).await? else {
            return Ok(None);
        };
        let record: StoredPicks = from_value(raw)?;
        Ok(Some(record.picks))
    }

    pub async fn append_history_day(&self, day: &HistoryDay) -> Result<()> {
        self.kv
            .upsert_retaining(Bucket::History, day.date, to_value(day)?, HISTORY_RETENTION)
            .await?;
        tracing::info!(date = %day.date, results = day.results.len(), "saved rocket history day");
        Ok(())
    }

    /// Newest first, never more than the retention window.
    pub async fn load_history(&self, max_days: usize) -> Result<Vec<HistoryDay>> {
        let limit = max_days.min(HISTORY_RETENTION);
        let rows = self.kv.list_recent(Bucket::History, limit).await?;

        let mut days = Vec::with_capacity(rows.len());
        for (date, raw) in rows {
            match from_value::<HistoryDay>(raw) {
                Ok(day) => days.push(day),
                Err(err) => tracing::warn!(%date, error = %err, "skipping unreadable history day"),
            }
        }
        days.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(days)
    }
}

fn to_value<T: Serialize>(v: &T) -> Result<serde_json::Value> {
    serde_json::to_value(v).map_err(|e| Error::StoreUnavailable(format!("encode failed: {e}")))
}

fn from_value<T: for<'de> Deserialize<'de>>(v: serde_json::Value) -> Result<T> {
    serde_json::from_value(v).map_err(|e| Error::StoreUnavailable(format!("decode failed: {e}")))
}
