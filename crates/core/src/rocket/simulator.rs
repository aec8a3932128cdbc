use crate::domain::rocket::HistoryDay;
use crate::domain::round_to;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const SMALL_STAKE: f64 = 1_000.0;
pub const LARGE_STAKE: f64 = 10_000.0;

/// One evaluated pick bought at the morning price and sold at the evening price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationTrade {
    pub date: NaiveDate,
    pub symbol: String,
    pub name: String,
    pub morning_price: f64,
    pub evening_price: f64,
    pub change_percent: f64,
    pub profit_1000: f64,
    pub profit_10000: f64,
    pub cumulative_1000: f64,
    pub cumulative_10000: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationTotals {
    pub trade_count: usize,
    pub start_1000: f64,
    pub end_1000: f64,
    pub profit_1000: f64,
    pub start_10000: f64,
    pub end_10000: f64,
    pub profit_10000: f64,
    pub return_percent: f64,
}

/// Trades of one pick rank, oldest first, with the stake rolled over each day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RocketSimulation {
    pub rank: usize,
    pub trades: Vec<SimulationTrade>,
    pub totals: SimulationTotals,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentSimulation {
    pub days: usize,
    pub rockets: Vec<RocketSimulation>,
    pub combined: SimulationTotals,
}

/// Replays history as if each rank had its own pot of 1 000 and 10 000 kr.
/// NO_DATA outcomes are skipped and leave the pot untouched.
pub fn simulate(history: &[HistoryDay]) -> InvestmentSimulation {
    let mut days: Vec<&HistoryDay> = history.iter().collect();
    days.sort_by_key(|d| d.date);

    let ranks = days.iter().map(|d| d.results.len()).max().unwrap_or(0);
    let rockets: Vec<RocketSimulation> = (0..ranks).map(|rank| simulate_rank(&days, rank)).collect();

    let mut combined = SimulationTotals::default();
    for r in &rockets {
        combined.trade_count += r.totals.trade_count;
        combined.start_1000 += r.totals.start_1000;
        combined.end_1000 += r.totals.end_1000;
        combined.start_10000 += r.totals.start_10000;
        combined.end_10000 += r.totals.end_10000;
    }
    finish(&mut combined);

    InvestmentSimulation {
        days: days.len(),
        rockets,
        combined,
    }
}

fn simulate_rank(days: &[&HistoryDay], rank: usize) -> RocketSimulation {
    let mut small = SMALL_STAKE;
    let mut large = LARGE_STAKE;
    let mut trades = Vec::new();

    for day in days {
        let Some(outcome) = day.results.get(rank).filter(|o| o.is_evaluated()) else {
            continue;
        };
        let (Some(change), Some(evening_price)) = (outcome.change_percent, outcome.evening_price)
        else {
            continue;
        };

        let profit_small = small * change / 100.0;
        let profit_large = large * change / 100.0;
        small += profit_small;
        large += profit_large;

        trades.push(SimulationTrade {
            date: day.date,
            symbol: outcome.pick.symbol.clone(),
            name: outcome.pick.name.clone(),
            morning_price: outcome.pick.morning_price,
            evening_price,
            change_percent: change,
            profit_1000: round_to(profit_small, 2),
            profit_10000: round_to(profit_large, 2),
            cumulative_1000: round_to(small, 2),
            cumulative_10000: round_to(large, 2),
        });
    }

    let mut totals = SimulationTotals {
        trade_count: trades.len(),
        start_1000: SMALL_STAKE,
        end_1000: small,
        start_10000: LARGE_STAKE,
        end_10000: large,
        ..SimulationTotals::default()
    };
    finish(&mut totals);

    RocketSimulation {
        rank: rank + 1,
        trades,
        totals,
    }
}

fn finish(totals: &mut SimulationTotals) {
    totals.profit_1000 = round_to(totals.end_1000 - totals.start_1000, 2);
    totals.profit_10000 = round_to(totals.end_10000 - totals.start_10000, 2);
    totals.return_percent = if totals.start_1000 > 0.0 {
        round_to((totals.end_1000 - totals.start_1000) / totals.start_1000 * 100.0, 2)
    } else {
        0.0
    };
    totals.end_1000 = round_to(totals.end_1000, 2);
    totals.end_10000 = round_to(totals.end_10000, 2);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::rocket::{OutcomeStatus, RocketOutcome, RocketPick};
    use crate::domain::signal::SentimentLabel;
    use chrono::{TimeZone, Utc};

    fn outcome(symbol: &str, change: Option<f64>) -> RocketOutcome {
        let status = match change {
            Some(c) => crate::rocket::evaluator::classify(c),
            None => OutcomeStatus::NoData,
        };
        RocketOutcome {
            pick: RocketPick {
                symbol: symbol.to_string(),
                name: symbol.trim_end_matches(".ST").to_string(),
                morning_price: 100.0,
                entry: 100.0,
                stop: 96.0,
                target: 105.0,
                stop_pct: -4.0,
                target_pct: 5.0,
                rsi: None,
                signal_score: 1,
                rocket_score: 5,
                volume_ratio: 1.0,
                news_sentiment: SentimentLabel::Neutral,
                reasons: Vec::new(),
                pick_time: Utc.with_ymd_and_hms(2026, 3, 2, 7, 15, 0).unwrap(),
            },
            evening_price: change.map(|c| 100.0 + c),
            change_percent: change,
            status,
            recommendation: status.recommendation().to_string(),
            message: String::new(),
        }
    }

    fn day(d: u32, results: Vec<RocketOutcome>) -> HistoryDay {
        HistoryDay::new(NaiveDate::from_ymd_opt(2026, 3, d).unwrap(), results)
    }

    #[test]
    fn stakes_roll_over_per_rank() {
        // Newest first, as history is loaded.
        let history = vec![
            day(3, vec![outcome("ABB.ST", Some(-5.0)), outcome("SAND.ST", Some(2.0))]),
            day(2, vec![outcome("ABB.ST", Some(10.0)), outcome("VOLV-B.ST", Some(-1.0))]),
        ];
        let sim = simulate(&history);
        assert_eq!(sim.days, 2);
        assert_eq!(sim.rockets.len(), 2);

        let first = &sim.rockets[0];
        assert_eq!(first.rank, 1);
        assert_eq!(first.trades[0].date, NaiveDate::from_ymd_opt(2026, 3, 2).unwrap());
        assert_eq!(first.trades[0].profit_1000, 100.0);
        assert_eq!(first.trades[0].cumulative_1000, 1100.0);
        // 5% of the rolled-over 1 100 kr.
        assert_eq!(first.trades[1].profit_1000, -55.0);
        assert_eq!(first.totals.end_1000, 1045.0);
        assert_eq!(first.totals.profit_10000, 450.0);
        assert_eq!(first.totals.return_percent, 4.5);

        let second = &sim.rockets[1];
        assert_eq!(second.trades[1].symbol, "SAND.ST");
        assert_eq!(second.totals.end_1000, 1009.8);

        assert_eq!(sim.combined.trade_count, 4);
        assert_eq!(sim.combined.start_1000, 2000.0);
        assert_eq!(sim.combined.end_1000, 2054.8);
        assert_eq!(sim.combined.profit_1000, 54.8);
        assert_eq!(sim.combined.return_percent, 2.74);
    }

    #[test]
    fn no_data_days_leave_the_pot_untouched() {
        let history = vec![
            day(4, vec![outcome("ABB.ST", Some(3.0))]),
            day(3, vec![outcome("ABB.ST", None)]),
            day(2, vec![]),
        ];
        let sim = simulate(&history);
        assert_eq!(sim.days, 3);
        assert_eq!(sim.rockets.len(), 1);
        assert_eq!(sim.rockets[0].totals.trade_count, 1);
        assert_eq!(sim.rockets[0].totals.end_10000, 10300.0);
    }

    #[test]
    fn empty_history_has_no_ranks() {
        let sim = simulate(&[]);
        assert!(sim.rockets.is_empty());
        assert_eq!(sim.combined, SimulationTotals::default());
    }
}
