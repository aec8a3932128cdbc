use crate::briefing::BriefingService;
use crate::config::Settings;
use crate::domain::recommendation::BriefingKind;
use crate::time::MarketClock;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use std::sync::Arc;

/// Next trigger strictly after `now`, in exchange-local wall time.
pub fn next_trigger(
    now: DateTime<Utc>,
    clock: MarketClock,
    morning_at: NaiveTime,
    evening_at: NaiveTime,
) -> (BriefingKind, DateTime<Utc>) {
    let today = clock.today(now);
    let candidates = [
        (BriefingKind::Morning, today, morning_at),
        (BriefingKind::Evening, today, evening_at),
        (BriefingKind::Morning, today + Duration::days(1), morning_at),
    ];

    for (kind, date, at) in candidates {
        let when = trigger_instant(clock, date, at);
        if when > now {
            return (kind, when);
        }
    }
    // Unreachable while morning_at < evening_at; keeps the function total anyway.
    (
        BriefingKind::Morning,
        trigger_instant(clock, today + Duration::days(1), morning_at),
    )
}

/// UTC instant of local wall time `at` on exchange date `date`.
pub fn trigger_instant(clock: MarketClock, date: NaiveDate, at: NaiveTime) -> DateTime<Utc> {
    let local = date.and_time(at);
    let offset = Duration::seconds(i64::from(clock.offset().local_minus_utc()));
    Utc.from_utc_datetime(&(local - offset))
}

/// Fires the morning and evening cycles at fixed local times, once per trigger.
pub struct Scheduler {
    service: Arc<BriefingService>,
    clock: MarketClock,
    morning_at: NaiveTime,
    evening_at: NaiveTime,
}

impl Scheduler {
    pub fn new(service: Arc<BriefingService>, morning_at: NaiveTime, evening_at: NaiveTime) -> Self {
        let clock = service.engine().clock();
        Self {
            service,
            clock,
            morning_at,
            evening_at,
        }
    }

    pub fn from_settings(service: Arc<BriefingService>, settings: &Settings) -> Self {
        Self::new(service, settings.morning_at, settings.evening_at)
    }

    /// Runs until the task is aborted.
    pub async fn run(self) {
        let mut last_fired: Option<DateTime<Utc>> = None;
        loop {
            let now = Utc::now();
            let from = last_fired.map_or(now, |t| t.max(now));
            let (kind, at) = next_trigger(from, self.clock, self.morning_at, self.evening_at);
            tracing::info!(%kind, at = %at, "next scheduled briefing");

            let wait = (at - now).to_std().unwrap_or_default();
            tokio::time::sleep(wait).await;
            last_fired = Some(at);

            let service = Arc::clone(&self.service);
            tokio::spawn(async move {
                if let Some(briefing) = service.run_scheduled(kind).await {
                    tracing::info!(
                        %kind,
                        id = %briefing.id,
                        warnings = briefing.warnings.len(),
                        "scheduled briefing finished"
                    );
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn clock() -> MarketClock {
        MarketClock::from_offset_minutes(60).unwrap()
    }

    #[test]
    fn picks_morning_before_open() {
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 5, 0, 0).unwrap();
        let (kind, at) = next_trigger(now, clock(), hm(8, 15), hm(17, 15));
        assert_eq!(kind, BriefingKind::Morning);
        assert_eq!(at, Utc.with_ymd_and_hms(2026, 3, 2, 7, 15, 0).unwrap());
    }

    #[test]
    fn trigger_time_is_exclusive() {
        let at_morning = Utc.with_ymd_and_hms(2026, 3, 2, 7, 15, 0).unwrap();
        let (kind, at) = next_trigger(at_morning, clock(), hm(8, 15), hm(17, 15));
        assert_eq!(kind, BriefingKind::Evening);
        assert_eq!(at, Utc.with_ymd_and_hms(2026, 3, 2, 16, 15, 0).unwrap());
    }

    #[test]
    fn rolls_over_to_next_morning() {
        let late = Utc.with_ymd_and_hms(2026, 3, 2, 20, 0, 0).unwrap();
        let (kind, at) = next_trigger(late, clock(), hm(8, 15), hm(17, 15));
        assert_eq!(kind, BriefingKind::Morning);
        assert_eq!(at, Utc.with_ymd_and_hms(2026, 3, 3, 7, 15, 0).unwrap());

        // 23:30 UTC is already 00:30 local on the 3rd.
        let after_midnight_local = Utc.with_ymd_and_hms(2026, 3, 2, 23, 30, 0).unwrap();
        let (_, at) = next_trigger(after_midnight_local, clock(), hm(8, 15), hm(17, 15));
        assert_eq!(at, Utc.with_ymd_and_hms(2026, 3, 3, 7, 15, 0).unwrap());
    }
}
