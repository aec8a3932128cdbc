use crate::domain::round_to;
use crate::domain::signal::SentimentLabel;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RocketPick {
    pub symbol: String,
    pub name: String,
    pub morning_price: f64,
    pub entry: f64,
    pub stop: f64,
    pub target: f64,
    pub stop_pct: f64,
    pub target_pct: f64,
    pub rsi: Option<f64>,
    pub signal_score: i32,
    pub rocket_score: i32,
    pub volume_ratio: f64,
    pub news_sentiment: SentimentLabel,
    pub reasons: Vec<String>,
    pub pick_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutcomeStatus {
    TargetHit,
    Profit,
    Flat,
    SmallLoss,
    StopLoss,
    NoData,
}

impl OutcomeStatus {
    pub fn recommendation(self) -> &'static str {
        match self {
            OutcomeStatus::TargetHit => "take profit",
            OutcomeStatus::Profit => "hold or sell half",
            OutcomeStatus::Flat | OutcomeStatus::SmallLoss => "hold",
            OutcomeStatus::StopLoss => "sell at stop",
            OutcomeStatus::NoData => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RocketOutcome {
    #[serde(flatten)]
    pub pick: RocketPick,
    pub evening_price: Option<f64>,
    pub change_percent: Option<f64>,
    pub status: OutcomeStatus,
    pub recommendation: String,
    pub message: String,
}

impl RocketOutcome {
    pub fn is_evaluated(&self) -> bool {
        self.status != OutcomeStatus::NoData && self.change_percent.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DaySummary {
    pub picks: usize,
    pub winners: usize,
    pub losers: usize,
    pub total_return_percent: f64,
    pub avg_return_percent: f64,
}

impl DaySummary {
    pub fn from_outcomes(outcomes: &[RocketOutcome]) -> Self {
        let changes: Vec<f64> = outcomes.iter().filter_map(|o| o.change_percent).collect();
        let total: f64 = changes.iter().sum();
        let avg = if changes.is_empty() {
            0.0
        } else {
            total / changes.len() as f64
        };
        Self {
            picks: changes.len(),
            winners: changes.iter().filter(|c| **c > 0.0).count(),
            losers: changes.iter().filter(|c| **c < 0.0).count(),
            total_return_percent: round_to(total, 2),
            avg_return_percent: round_to(avg, 2),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryDay {
    pub date: NaiveDate,
    pub results: Vec<RocketOutcome>,
    pub summary: DaySummary,
}

impl HistoryDay {
    pub fn new(date: NaiveDate, results: Vec<RocketOutcome>) -> Self {
        let summary = DaySummary::from_outcomes(&results);
        Self {
            date,
            results,
            summary,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryStats {
    pub total_days: usize,
    pub total_picks: usize,
    pub total_winners: usize,
    pub total_losers: usize,
    pub win_rate: f64,
    pub avg_return: f64,
    pub total_return: f64,
}

impl HistoryStats {
    pub fn from_history(days: &[HistoryDay]) -> Self {
        let changes: Vec<f64> = days
            .iter()
            .flat_map(|d| d.results.iter().filter_map(|o| o.change_percent))
            .collect();
        if changes.is_empty() {
            return Self {
                total_days: days.len(),
                ..Self::default()
            };
        }

        let winners = changes.iter().filter(|c| **c > 0.0).count();
        let losers = changes.iter().filter(|c| **c < 0.0).count();
        let total: f64 = changes.iter().sum();
        Self {
            total_days: days.len(),
            total_picks: changes.len(),
            total_winners: winners,
            total_losers: losers,
            win_rate: round_to(winners as f64 / changes.len() as f64 * 100.0, 1),
            avg_return: round_to(total / changes.len() as f64, 2),
            total_return: round_to(total, 2),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RocketHistory {
    pub history: Vec<HistoryDay>,
    pub stats: HistoryStats,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn outcome(change: Option<f64>, status: OutcomeStatus) -> RocketOutcome {
        RocketOutcome {
            pick: RocketPick {
                symbol: "ABB.ST".to_string(),
                name: "ABB".to_string(),
                morning_price: 100.0,
                entry: 100.0,
                stop: 96.0,
                target: 105.0,
                stop_pct: -4.0,
                target_pct: 5.0,
                rsi: Some(40.0),
                signal_score: 2,
                rocket_score: 6,
                volume_ratio: 1.2,
                news_sentiment: SentimentLabel::Positive,
                reasons: vec!["positive price move (+2.5%)".to_string()],
                pick_time: Utc.with_ymd_and_hms(2026, 3, 2, 7, 15, 0).unwrap(),
            },
            evening_price: change.map(|c| 100.0 + c),
            change_percent: change,
            status,
            recommendation: status.recommendation().to_string(),
            message: String::new(),
        }
    }

    #[test]
    fn day_summary_ignores_no_data() {
        let outcomes = vec![
            outcome(Some(3.5), OutcomeStatus::TargetHit),
            outcome(Some(-1.0), OutcomeStatus::SmallLoss),
            outcome(None, OutcomeStatus::NoData),
        ];
        let s = DaySummary::from_outcomes(&outcomes);
        assert_eq!(s.picks, 2);
        assert_eq!(s.winners, 1);
        assert_eq!(s.losers, 1);
        assert_eq!(s.total_return_percent, 2.5);
        assert_eq!(s.avg_return_percent, 1.25);
    }

    #[test]
    fn history_stats_aggregate_across_days() {
        let d1 = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2026, 3, 3).unwrap();
        let days = vec![
            HistoryDay::new(d2, vec![outcome(Some(2.0), OutcomeStatus::Profit)]),
            HistoryDay::new(
                d1,
                vec![
                    outcome(Some(-3.0), OutcomeStatus::StopLoss),
                    outcome(Some(4.0), OutcomeStatus::TargetHit),
                ],
            ),
        ];
        let stats = HistoryStats::from_history(&days);
        assert_eq!(stats.total_days, 2);
        assert_eq!(stats.total_picks, 3);
        assert_eq!(stats.total_winners, 2);
        assert_eq!(stats.total_losers, 1);
        assert_eq!(stats.win_rate, 66.7);
        assert_eq!(stats.total_return, 3.0);
        assert_eq!(stats.avg_return, 1.0);
    }

    #[test]
    fn outcome_round_trips_through_json() {
        let day = HistoryDay::new(
            NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            vec![outcome(Some(3.5), OutcomeStatus::TargetHit)],
        );
        let v = serde_json::to_value(&day).unwrap();
        assert_eq!(v["date"], "2026-03-02");
        assert_eq!(v["results"][0]["status"], "TARGET_HIT");
        assert_eq!(v["results"][0]["symbol"], "ABB.ST");
        let back: HistoryDay = serde_json::from_value(v).unwrap();
        assert_eq!(back, day);
    }
}
