//! End-of-run scoring and the reconstructed performance series.

use serde::{Deserialize, Serialize};

use crate::numbers::{i64_to_f64, round_f64_to_i64, u32_to_f64};
use crate::state::{PlayerState, TransactionKind};

/// One point on the reconstructed net-worth curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySnapshot {
    pub day: u32,
    pub cash: i64,
    pub bank: i64,
    pub debt: i64,
    pub net_worth: i64,
}

/// Everything a results screen or leaderboard submission needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSummary {
    pub seed: u64,
    pub days_played: u32,
    pub final_cash: i64,
    pub final_bank: i64,
    pub final_debt: i64,
    pub score: i64,
    pub profit: i64,
    pub growth_rate_pct: f64,
    pub total_buys: u32,
    pub total_sells: u32,
    pub units_moved: u32,
    pub locations_visited: u32,
    pub events_seen: u32,
}

/// The score is plain net worth: cash + bank - debt. Negative scores
/// are legitimate; a run can end underwater.
#[must_use]
pub fn final_score(state: &PlayerState) -> i64 {
    state.net_worth()
}

/// Profit relative to the opening position (which itself starts
/// underwater: opening cash minus opening debt).
#[must_use]
pub fn profit(state: &PlayerState) -> i64 {
    state.net_worth() - (state.starting_cash - state.starting_debt)
}

/// Average compounded daily growth of the final score against opening
/// cash, in percent. A run that ends at or below zero reports -100.
#[must_use]
pub fn growth_rate_pct(state: &PlayerState) -> f64 {
    let final_worth = state.net_worth();
    if final_worth <= 0 || state.starting_cash <= 0 {
        return -100.0;
    }
    let days = state.day.max(1);
    let ratio = i64_to_f64(final_worth) / i64_to_f64(state.starting_cash);
    (ratio.powf(1.0 / u32_to_f64(days)) - 1.0) * 100.0
}

/// Rebuild a per-day net-worth series from the transaction journal.
///
/// Trades are exact; money moved by events, bribes, and banking is not
/// journaled, so intermediate days are an estimate. The final day is
/// pinned to the live balances and therefore always exact.
#[must_use]
pub fn daily_snapshots(state: &PlayerState) -> Vec<DailySnapshot> {
    let mut series = Vec::with_capacity(state.day as usize);
    let mut cash = state.starting_cash;
    let mut debt = state.starting_debt;
    let bank = 0;

    for day in 1..=state.day {
        for txn in state.transactions.iter().filter(|txn| txn.day == day) {
            match txn.kind {
                TransactionKind::Buy => cash -= txn.total,
                TransactionKind::Sell => cash += txn.total,
            }
        }
        series.push(DailySnapshot {
            day,
            cash,
            bank,
            debt,
            net_worth: cash + bank - debt,
        });
        debt = compound_estimate(debt, state.debt_rate_pct);
    }

    if let Some(last) = series.last_mut() {
        *last = DailySnapshot {
            day: state.day,
            cash: state.cash,
            bank: state.bank,
            debt: state.debt,
            net_worth: state.net_worth(),
        };
    }
    series
}

fn compound_estimate(balance: i64, rate_pct: u32) -> i64 {
    if balance <= 0 {
        return balance.max(0);
    }
    round_f64_to_i64(i64_to_f64(balance) * (1.0 + u32_to_f64(rate_pct) / 100.0))
}

/// Assemble the full results view for a finished (or abandoned) run.
#[must_use]
pub fn summarize(state: &PlayerState) -> ResultSummary {
    let total_buys = state
        .transactions
        .iter()
        .filter(|txn| txn.kind == TransactionKind::Buy)
        .count();
    let total_sells = state.transactions.len() - total_buys;
    let units_moved = state.transactions.iter().map(|txn| txn.quantity).sum();

    ResultSummary {
        seed: state.seed,
        days_played: state.day,
        final_cash: state.cash,
        final_bank: state.bank,
        final_debt: state.debt,
        score: final_score(state),
        profit: profit(state),
        growth_rate_pct: growth_rate_pct(state),
        total_buys: u32::try_from(total_buys).unwrap_or(u32::MAX),
        total_sells: u32::try_from(total_sells).unwrap_or(u32::MAX),
        units_moved,
        locations_visited: u32::try_from(state.visits.len()).unwrap_or(u32::MAX),
        events_seen: u32::try_from(state.event_history.len()).unwrap_or(u32::MAX),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_is_net_worth_in_both_signs() {
        let mut state = PlayerState::new_game(1);
        state.cash = 12_000;
        state.bank = 3_000;
        state.debt = 5_000;
        assert_eq!(final_score(&state), 10_000);

        state.cash = 500;
        state.bank = 0;
        state.debt = 8_000;
        assert_eq!(final_score(&state), -7_500);
    }

    #[test]
    fn profit_is_measured_against_the_opening_position() {
        let mut state = PlayerState::new_game(1);
        // Opening position: 2000 cash - 5500 debt = -3500.
        state.cash = 2_000;
        state.bank = 0;
        state.debt = 5_500;
        assert_eq!(profit(&state), 0);
        state.cash = 4_000;
        assert_eq!(profit(&state), 2_000);
    }

    #[test]
    fn underwater_runs_report_floor_growth() {
        let mut state = PlayerState::new_game(1);
        state.cash = 100;
        state.debt = 9_000;
        state.day = 30;
        assert!((growth_rate_pct(&state) - -100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn breakeven_run_grows_at_zero() {
        let mut state = PlayerState::new_game(1);
        state.cash = 2_000;
        state.bank = 0;
        state.debt = 0;
        state.day = 30;
        assert!(growth_rate_pct(&state).abs() < 1e-9);
    }

    #[test]
    fn doubling_over_the_run_compounds_out() {
        let mut state = PlayerState::new_game(1);
        state.cash = 4_000;
        state.bank = 0;
        state.debt = 0;
        state.day = 30;
        let rate = growth_rate_pct(&state);
        // 2^(1/30) - 1 = 2.337%.
        assert!((rate - 2.337).abs() < 0.01, "rate was {rate}");
    }

    #[test]
    fn snapshots_cover_every_day_and_pin_the_endpoint() {
        let mut state = PlayerState::new_game(1);
        state.day = 3;
        state.cash = 3_333;
        state.bank = 250;
        state.debt = 6_655;
        let series = daily_snapshots(&state);
        assert_eq!(series.len(), 3);
        assert_eq!(series[0].day, 1);
        assert_eq!(series[0].debt, 5_500);
        assert_eq!(series[1].debt, 6_050);
        let last = series.last().copied().expect("nonempty");
        assert_eq!(last.cash, 3_333);
        assert_eq!(last.bank, 250);
        assert_eq!(last.debt, 6_655);
        assert_eq!(last.net_worth, 3_333 + 250 - 6_655);
    }

    #[test]
    fn snapshots_track_journaled_trades() {
        let mut state = PlayerState::new_game(1);
        state.record_transaction(crate::state::TransactionKind::Buy, "untaxed-spirits", 10, 30);
        state.day = 2;
        state.record_transaction(crate::state::TransactionKind::Sell, "untaxed-spirits", 10, 45);
        state.day = 3;
        state.cash = 2_150;
        let series = daily_snapshots(&state);
        assert_eq!(series[0].cash, 2_000 - 300);
        assert_eq!(series[1].cash, 2_000 - 300 + 450);
    }

    #[test]
    fn summary_counts_trades_and_travels() {
        let mut state = PlayerState::new_game(7);
        state.record_transaction(crate::state::TransactionKind::Buy, "untaxed-spirits", 5, 30);
        state.record_transaction(crate::state::TransactionKind::Sell, "untaxed-spirits", 5, 40);
        state.visits.insert("docks".to_string(), 2);
        state.visits.insert("uptown".to_string(), 1);
        let summary = summarize(&state);
        assert_eq!(summary.total_buys, 1);
        assert_eq!(summary.total_sells, 1);
        assert_eq!(summary.units_moved, 10);
        assert_eq!(summary.locations_visited, 2);
        assert_eq!(summary.seed, 7);
    }
}
