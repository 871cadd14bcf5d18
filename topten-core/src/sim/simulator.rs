//! The portfolio simulator — a sequential fold over the trading-day
//! sequence.
//!
//! Two phases per run: days strictly before the first resolved rebalance
//! date are skipped with no valuation recorded; from the first rebalance
//! onward every trading day is checked against the resolved rebalance and
//! contribution dates, trades execute, and a daily snapshot is appended.
//!
//! Failure semantics: per-ticker price gaps degrade to 0 (skip the trade,
//! zero the valuation contribution) and never abort the run. The only
//! fatal paths are the empty calendar at bootstrap and a constituent-table
//! gap under the `Exact` missing-year policy.

use crate::calendar::{CalendarError, ClampPolicy, TradingCalendar};
use crate::domain::{
    Constituent, ConstituentError, ConstituentTable, DailySnapshot, InvestmentLog,
    MissingYearPolicy, PortfolioState, Ticker,
};
use crate::price_cache::PriceCache;
use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// When rebalances and contributions happen.
///
/// Defaults match the original strategy: annual rebalance on the 2nd Monday
/// of January, contribution on the 2nd Monday of every month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub rebalance_month: u32,
    pub rebalance_ordinal: u32,
    pub rebalance_weekday: Weekday,
    pub contribution_ordinal: u32,
    pub contribution_weekday: Weekday,
}

impl Default for Schedule {
    fn default() -> Self {
        Self {
            rebalance_month: 1,
            rebalance_ordinal: 2,
            rebalance_weekday: Weekday::Mon,
            contribution_ordinal: 2,
            contribution_weekday: Weekday::Mon,
        }
    }
}

/// Simulation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    pub initial_capital: f64,
    pub monthly_contribution: f64,
    /// Proportional fee on liquidation proceeds (0.002 = 0.2%, roughly
    /// Korean brokerage fee plus transaction tax).
    pub fee_rate: f64,
    pub schedule: Schedule,
    pub clamp: ClampPolicy,
    pub missing_year: MissingYearPolicy,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            initial_capital: 1_000_000.0,
            monthly_contribution: 1_000_000.0,
            fee_rate: 0.002,
            schedule: Schedule::default(),
            clamp: ClampPolicy::ClampToLast,
            missing_year: MissingYearPolicy::NearestYear,
        }
    }
}

#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Calendar(#[from] CalendarError),

    #[error(transparent)]
    Constituent(#[from] ConstituentError),
}

/// Output of a simulation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimResult {
    /// One valuation per simulated trading day, in date order.
    pub snapshots: Vec<DailySnapshot>,
    /// Constituents actually selected at each rebalance, keyed by year.
    pub selections: BTreeMap<i32, Vec<Constituent>>,
    /// Every cash injection: initial capital plus each contribution.
    pub investment_log: InvestmentLog,
    /// Non-fatal events (nearest-year substitutions).
    pub warnings: Vec<String>,
}

/// The rebalancing portfolio simulator.
pub struct Simulator<'a> {
    config: SimConfig,
    calendar: &'a TradingCalendar,
    cache: &'a mut PriceCache,
    table: &'a ConstituentTable,
    state: PortfolioState,
    snapshots: Vec<DailySnapshot>,
    selections: BTreeMap<i32, Vec<Constituent>>,
    log: InvestmentLog,
    warnings: Vec<String>,
}

impl<'a> Simulator<'a> {
    pub fn new(
        config: SimConfig,
        calendar: &'a TradingCalendar,
        cache: &'a mut PriceCache,
        table: &'a ConstituentTable,
    ) -> Self {
        let state = PortfolioState::new(config.initial_capital);
        Self {
            config,
            calendar,
            cache,
            table,
            state,
            snapshots: Vec::new(),
            selections: BTreeMap::new(),
            log: InvestmentLog::new(),
            warnings: Vec::new(),
        }
    }

    /// Run the full simulation.
    pub fn run(mut self) -> Result<SimResult, SimError> {
        let days = self.calendar.days().to_vec();
        let start = days[0];
        let end = *days.last().expect("calendar is non-empty");

        // Bulk prefetch for every ticker the table can ever select.
        let tickers: Vec<Ticker> = self.table.all_tickers();
        self.cache.ensure_cached(&tickers, start, end);

        let sched = self.config.schedule;
        let first_rebalance = self.calendar.resolve_ordinal_weekday(
            start.year(),
            sched.rebalance_month,
            sched.rebalance_ordinal,
            sched.rebalance_weekday,
            self.config.clamp,
        )?;

        // The initial capital is logged against the first rebalance date:
        // cash sits idle until then and no snapshots are recorded.
        self.log.record(first_rebalance, self.config.initial_capital);

        let mut idx = days.partition_point(|d| *d < first_rebalance);
        while idx < days.len() {
            let today = days[idx];

            let rebalance_date = self.calendar.resolve_ordinal_weekday(
                today.year(),
                sched.rebalance_month,
                sched.rebalance_ordinal,
                sched.rebalance_weekday,
                self.config.clamp,
            )?;
            let contribution_date = self.calendar.resolve_ordinal_weekday(
                today.year(),
                today.month(),
                sched.contribution_ordinal,
                sched.contribution_weekday,
                self.config.clamp,
            )?;

            if today == rebalance_date {
                self.rebalance(today)?;
            } else if today == contribution_date {
                self.contribute(today);
            }

            self.record_snapshot(today);
            idx += 1;
        }

        Ok(SimResult {
            snapshots: self.snapshots,
            selections: self.selections,
            investment_log: self.log,
            warnings: self.warnings,
        })
    }

    /// Price used for trades: exact close, falling back to a same-day
    /// direct re-fetch. Returns 0 when the ticker is unpriceable today.
    fn trade_price(&mut self, ticker: &str, date: NaiveDate) -> f64 {
        let price = self.cache.price_on(ticker, date);
        if price > 0.0 {
            price
        } else {
            self.cache.refetch_on(ticker, date)
        }
    }

    /// Price used for valuation: exact close, falling back to the latest
    /// known close (forward-fill).
    fn value_price(&self, ticker: &str, date: NaiveDate) -> f64 {
        let price = self.cache.price_on(ticker, date);
        if price > 0.0 {
            price
        } else {
            self.cache.price_as_of(ticker, date)
        }
    }

    /// Annual rebalance: liquidate, top up, re-select, equal-weight re-buy.
    fn rebalance(&mut self, date: NaiveDate) -> Result<(), SimError> {
        // 1. Liquidate everything. A ticker with no price today sells for
        //    nothing — its value is simply lost to the cash book, matching
        //    the degraded-pricing policy.
        if !self.state.is_flat() {
            let mut proceeds = 0.0;
            let held: Vec<(Ticker, u64)> = self
                .state
                .positions
                .iter()
                .map(|(t, q)| (t.clone(), *q))
                .collect();
            for (ticker, qty) in held {
                let price = self.trade_price(&ticker, date);
                if price > 0.0 {
                    proceeds += price * qty as f64;
                }
            }
            self.state.cash += proceeds * (1.0 - self.config.fee_rate);
            self.state.positions.clear();
        }

        // 2. Every rebalance after the first doubles as that month's
        //    contribution; the first one spends the already-logged initial
        //    capital.
        let is_first = self.snapshots.is_empty();
        if !is_first {
            self.state.cash += self.config.monthly_contribution;
            self.log.record(date, self.config.monthly_contribution);
        }

        // 3. Select this year's constituents.
        let year = date.year();
        let (year_used, picks) = self.table.for_year(year, self.config.missing_year)?;
        if year_used != year {
            self.warnings.push(format!(
                "no constituents for {year}; substituted nearest year {year_used}"
            ));
        }
        let picks: Vec<Constituent> = picks.to_vec();
        self.selections.insert(year, picks.clone());

        // 4. Equal-weight buy with whole shares; flooring remainders and
        //    zero-priced allocations stay in cash.
        let allocation = self.state.cash / picks.len() as f64;
        let mut total_cost = 0.0;
        for constituent in &picks {
            let price = self.trade_price(&constituent.ticker, date);
            if price > 0.0 {
                let qty = (allocation / price).floor() as u64;
                if qty > 0 {
                    self.state.positions.insert(constituent.ticker.clone(), qty);
                    total_cost += qty as f64 * price;
                }
            }
        }
        self.state.cash -= total_cost;

        Ok(())
    }

    /// Monthly top-up: split the contribution across currently-held tickers
    /// only. With no holdings the cash just accumulates until the next
    /// rebalance.
    fn contribute(&mut self, date: NaiveDate) {
        self.state.cash += self.config.monthly_contribution;
        self.log.record(date, self.config.monthly_contribution);

        if self.state.is_flat() {
            return;
        }

        let held: Vec<Ticker> = self.state.positions.keys().cloned().collect();
        let allocation = self.config.monthly_contribution / held.len() as f64;
        let mut total_cost = 0.0;
        for ticker in held {
            let price = self.trade_price(&ticker, date);
            if price > 0.0 {
                let qty = (allocation / price).floor() as u64;
                if qty > 0 {
                    *self.state.positions.get_mut(&ticker).expect("held ticker") += qty;
                    total_cost += qty as f64 * price;
                }
            }
        }
        self.state.cash -= total_cost;
    }

    fn record_snapshot(&mut self, date: NaiveDate) {
        let holdings_value = self
            .state
            .positions
            .iter()
            .map(|(ticker, qty)| *qty as f64 * self.value_price(ticker, date))
            .sum::<f64>();

        self.snapshots.push(DailySnapshot {
            date,
            total_value: self.state.cash + holdings_value,
            cash: self.state.cash,
            holdings_value,
        });
    }
}
