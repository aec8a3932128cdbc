pub mod lock;
pub mod memory;
pub mod picks;
pub mod postgres;

use crate::error::Result;
use chrono::NaiveDate;
use serde_json::Value;

pub use memory::MemoryStore;
pub use picks::PickStore;
pub use postgres::PgStore;

pub async fn migrate(pool: &sqlx::PgPool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Record families kept by the store, one row per calendar date each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Bucket {
    Picks,
    History,
}

impl Bucket {
    pub fn table(self) -> &'static str {
        match self {
            Bucket::Picks => "rocket_picks",
            Bucket::History => "rocket_history",
        }
    }
}

/// Date-keyed JSON blob store. Upserts are atomic per key.
#[async_trait::async_trait]
pub trait KvStore: Send + Sync {
    async fn upsert(&self, bucket: Bucket, date: NaiveDate, value: Value) -> Result<()>;

    async fn get(&self, bucket: Bucket, date: NaiveDate) -> Result<Option<Value>>;

    /// Newest first, at most `limit` entries.
    async fn list_recent(&self, bucket: Bucket, limit: usize) -> Result<Vec<(NaiveDate, Value)>>;

    /// Deletes everything but the `keep` newest dates. Returns the number removed.
    async fn retain_recent(&self, bucket: Bucket, keep: usize) -> Result<u64>;

    /// Upsert followed by a retention prune. Stores with transactions do both atomically.
    async fn upsert_retaining(
        &self,
        bucket: Bucket,
        date: NaiveDate,
        value: Value,
        keep: usize,
    ) -> Result<()> {
        self.upsert(bucket, date, value).await?;
        self.retain_recent(bucket, keep).await?;
        Ok(())
    }
}
