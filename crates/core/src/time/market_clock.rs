use crate::domain::briefing::MarketStatus;
use crate::error::{Error, Result};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Timelike, Utc};

// Stockholm trading hours, local time.
const OPEN_HOUR: u32 = 9;
const CLOSE_HOUR: u32 = 17;
const CLOSE_MINUTE: u32 = 30;

/// Wall clock of the home exchange as a fixed UTC offset.
#[derive(Debug, Clone, Copy)]
pub struct MarketClock {
    offset: FixedOffset,
}

impl MarketClock {
    pub fn from_offset_minutes(minutes: i32) -> Result<Self> {
        let offset = minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                Error::config(format!("MARKET_UTC_OFFSET_MINUTES out of range: {minutes}"))
            })?;
        Ok(Self { offset })
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    pub fn local(&self, now: DateTime<Utc>) -> DateTime<FixedOffset> {
        now.with_timezone(&self.offset)
    }

    /// Calendar date on the exchange; the key for picks and history.
    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        self.local(now).date_naive()
    }

    pub fn market_status(&self, now: DateTime<Utc>) -> MarketStatus {
        market_status_at(self.local(now).time())
    }

    /// `YYYY-MM-DD` override if given, else the exchange's current date.
    pub fn resolve_date(&self, arg: Option<&str>, now: DateTime<Utc>) -> Result<NaiveDate> {
        match arg {
            Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                .map_err(|e| Error::config(format!("invalid date {s:?}: {e}"))),
            None => Ok(self.today(now)),
        }
    }
}

pub fn market_status_at(local: NaiveTime) -> MarketStatus {
    if local.hour() < OPEN_HOUR {
        MarketStatus::PreOpen
    } else if (local.hour(), local.minute()) < (CLOSE_HOUR, CLOSE_MINUTE) {
        MarketStatus::Open
    } else {
        MarketStatus::Closed
    }
}
