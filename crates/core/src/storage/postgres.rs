use crate::error::Result;
use crate::storage::{Bucket, KvStore};
use chrono::NaiveDate;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: sqlx::PgPool,
}

impl PgStore {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &sqlx::PgPool {
        &self.pool
    }
}

fn upsert_sql(bucket: Bucket) -> String {
    format!(
        "INSERT INTO {} (date, data, updated_at) VALUES ($1, $2, now()) \
         ON CONFLICT (date) DO UPDATE SET data = EXCLUDED.data, updated_at = now()",
        bucket.table()
    )
}

fn retain_sql(bucket: Bucket) -> String {
    let table = bucket.table();
    format!(
        "DELETE FROM {table} WHERE date NOT IN \
         (SELECT date FROM {table} ORDER BY date DESC LIMIT $1)"
    )
}

#[async_trait::async_trait]
impl KvStore for PgStore {
    async fn upsert(&self, bucket: Bucket, date: NaiveDate, value: Value) -> Result<()> {
        sqlx::query(&upsert_sql(bucket))
            .bind(date)
            .bind(value)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get(&self, bucket: Bucket, date: NaiveDate) -> Result<Option<Value>> {
        let row: Option<(Value,)> =
            sqlx::query_as(&format!("SELECT data FROM {} WHERE date = $1", bucket.table()))
                .bind(date)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(v,)| v))
    }

    async fn list_recent(&self, bucket: Bucket, limit: usize) -> Result<Vec<(NaiveDate, Value)>> {
        let rows: Vec<(NaiveDate, Value)> = sqlx::query_as(&format!(
            "SELECT date, data FROM {} ORDER BY date DESC LIMIT $1",
            bucket.table()
        ))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn retain_recent(&self, bucket: Bucket, keep: usize) -> Result<u64> {
        let res = sqlx::query(&retain_sql(bucket))
            .bind(keep as i64)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected())
    }

    async fn upsert_retaining(
        &self,
        bucket: Bucket,
        date: NaiveDate,
        value: Value,
        keep: usize,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(&upsert_sql(bucket))
            .bind(date)
            .bind(value)
            .execute(&mut *tx)
            .await?;

        let pruned = sqlx::query(&retain_sql(bucket))
            .bind(keep as i64)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        if pruned > 0 {
            tracing::info!(table = bucket.table(), pruned, "pruned old rows");
        }
        Ok(())
    }
}
