use crate::domain::recommendation::BriefingKind;
use crate::error::Result;
use chrono::{Datelike, NaiveDate};

// Advisory locks are scoped to the Postgres session. They guard against two processes
// generating the same briefing kind for the same date at once.
const LOCK_NAMESPACE: i64 = 0x4E4F_5244_5055; // "NORDPU"

fn lock_key(date: NaiveDate, kind: BriefingKind) -> i64 {
    let kind_bit = match kind {
        BriefingKind::Morning => 0,
        BriefingKind::Evening => 1,
    };
    LOCK_NAMESPACE ^ ((date.num_days_from_ce() as i64) << 1 | kind_bit)
}

/// Must be released on the same connection it was taken on.
pub async fn try_acquire_briefing_lock(
    conn: &mut sqlx::PgConnection,
    date: NaiveDate,
    kind: BriefingKind,
) -> Result<bool> {
    let key = lock_key(date, kind);
    let acquired: (bool,) = sqlx::query_as("SELECT pg_try_advisory_lock($1)")
        .persistent(false)
        .bind(key)
        .fetch_one(&mut *conn)
        .await?;
    tracing::debug!(%date, %kind, key, acquired = acquired.0, "advisory lock");
    Ok(acquired.0)
}

pub async fn release_briefing_lock(
    conn: &mut sqlx::PgConnection,
    date: NaiveDate,
    kind: BriefingKind,
) -> Result<()> {
    let key = lock_key(date, kind);
    sqlx::query("SELECT pg_advisory_unlock($1)")
        .persistent(false)
        .bind(key)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_differ_by_date_and_kind() {
        let d1 = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2026, 3, 3).unwrap();
        let keys = [
            lock_key(d1, BriefingKind::Morning),
            lock_key(d1, BriefingKind::Evening),
            lock_key(d2, BriefingKind::Morning),
            lock_key(d2, BriefingKind::Evening),
        ];
        for (i, a) in keys.iter().enumerate() {
            for b in &keys[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
