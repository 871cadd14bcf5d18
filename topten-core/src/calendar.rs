//! Trading calendar — the ordered trading-day sequence and schedule resolution.
//!
//! The calendar is built once per run from the reference ticker's close
//! series (a date with a recorded close is a trading day) and is immutable
//! afterwards. `resolve_ordinal_weekday` turns schedule rules like
//! "2nd Monday of January" into actual trading days.

use crate::data::provider::{DataError, PriceProvider};
use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What to do when a schedule rule resolves past the end of history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClampPolicy {
    /// Return the last available trading day. Near the end of a run this can
    /// re-resolve a prior date for a new logical period, so callers that
    /// trigger trades off resolved dates should be aware of the reuse.
    ClampToLast,
    /// Surface `CalendarError::RangeExhausted` instead.
    Fail,
}

#[derive(Debug, Error)]
pub enum CalendarError {
    #[error("no trading days for reference ticker '{ticker}' over the run window")]
    EmptyCalendar { ticker: String },

    #[error("no trading day on or after {target} and clamping is disabled")]
    RangeExhausted { target: NaiveDate },

    #[error("invalid month {month}")]
    InvalidMonth { month: u32 },

    #[error(transparent)]
    Data(#[from] DataError),
}

/// Immutable, strictly increasing sequence of trading days.
#[derive(Debug, Clone)]
pub struct TradingCalendar {
    days: Vec<NaiveDate>,
}

impl TradingCalendar {
    /// Build a calendar from an explicit day list (sorted and deduplicated).
    pub fn from_days(mut days: Vec<NaiveDate>, reference: &str) -> Result<Self, CalendarError> {
        days.sort();
        days.dedup();
        if days.is_empty() {
            return Err(CalendarError::EmptyCalendar {
                ticker: reference.to_string(),
            });
        }
        Ok(Self { days })
    }

    /// Fetch the reference ticker's series and extract its dates.
    ///
    /// This is the only fatal bootstrap path in the whole run: with no
    /// calendar there is nothing to simulate.
    pub fn fetch(
        provider: &dyn PriceProvider,
        reference: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Self, CalendarError> {
        let closes = provider.fetch_closes(reference, start, end)?;
        Self::from_days(closes.into_iter().map(|c| c.date).collect(), reference)
    }

    pub fn days(&self) -> &[NaiveDate] {
        &self.days
    }

    pub fn first(&self) -> NaiveDate {
        self.days[0]
    }

    pub fn last(&self) -> NaiveDate {
        *self.days.last().expect("calendar is non-empty by construction")
    }

    /// First trading day on or after `date`, if any.
    pub fn on_or_after(&self, date: NaiveDate) -> Option<NaiveDate> {
        let idx = self.days.partition_point(|d| *d < date);
        self.days.get(idx).copied()
    }

    /// Resolve "the `ordinal`-th `weekday` of `month`/`year`" to a trading day.
    ///
    /// The calendar date is computed by month-day enumeration; a month with
    /// fewer than `ordinal` occurrences of `weekday` falls back to the last
    /// occurrence. The result is then snapped to the first trading day on or
    /// after that date; past the end of history the `clamp` policy decides.
    pub fn resolve_ordinal_weekday(
        &self,
        year: i32,
        month: u32,
        ordinal: u32,
        weekday: Weekday,
        clamp: ClampPolicy,
    ) -> Result<NaiveDate, CalendarError> {
        let target = ordinal_weekday_in_month(year, month, ordinal, weekday)?;
        match self.on_or_after(target) {
            Some(day) => Ok(day),
            None => match clamp {
                ClampPolicy::ClampToLast => Ok(self.last()),
                ClampPolicy::Fail => Err(CalendarError::RangeExhausted { target }),
            },
        }
    }
}

/// Calendar date of the `ordinal`-th `weekday` in `month`/`year`.
///
/// Degenerate months (fewer matching weekdays than `ordinal`) yield the last
/// occurrence rather than failing.
pub fn ordinal_weekday_in_month(
    year: i32,
    month: u32,
    ordinal: u32,
    weekday: Weekday,
) -> Result<NaiveDate, CalendarError> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or(CalendarError::InvalidMonth { month })?;

    let offset = (weekday.num_days_from_monday() + 7 - first.weekday().num_days_from_monday()) % 7;
    let first_occurrence = 1 + offset;
    let occurrences = (days_in_month(year, month) - first_occurrence) / 7 + 1;

    let pick = ordinal.max(1).min(occurrences);
    let day = first_occurrence + 7 * (pick - 1);
    Ok(NaiveDate::from_ymd_opt(year, month, day).expect("day is within the month by construction"))
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    next.expect("valid month")
        .pred_opt()
        .expect("not the minimum date")
        .day()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn weekday_calendar(start: NaiveDate, end: NaiveDate) -> TradingCalendar {
        let mut days = Vec::new();
        let mut cur = start;
        while cur <= end {
            if cur.weekday().num_days_from_monday() < 5 {
                days.push(cur);
            }
            cur = cur.succ_opt().unwrap();
        }
        TradingCalendar::from_days(days, "005930").unwrap()
    }

    #[test]
    fn second_monday_of_january_2024() {
        // 2024-01-08 is the 2nd Monday
        let date = ordinal_weekday_in_month(2024, 1, 2, Weekday::Mon).unwrap();
        assert_eq!(date, d(2024, 1, 8));
    }

    #[test]
    fn degenerate_month_falls_back_to_last_occurrence() {
        // February 2023 has only four Mondays; asking for the 5th yields the 4th.
        let date = ordinal_weekday_in_month(2023, 2, 5, Weekday::Mon).unwrap();
        assert_eq!(date, d(2023, 2, 27));
    }

    #[test]
    fn five_friday_month() {
        // March 2024 has five Fridays; the 5th is the 29th.
        let date = ordinal_weekday_in_month(2024, 3, 5, Weekday::Fri).unwrap();
        assert_eq!(date, d(2024, 3, 29));
    }

    #[test]
    fn resolution_snaps_to_next_trading_day() {
        // Calendar missing 2024-01-08 (holiday): snap to the 9th.
        let mut days: Vec<NaiveDate> = weekday_calendar(d(2024, 1, 2), d(2024, 1, 31))
            .days()
            .to_vec();
        days.retain(|day| *day != d(2024, 1, 8));
        let cal = TradingCalendar::from_days(days, "005930").unwrap();

        let resolved = cal
            .resolve_ordinal_weekday(2024, 1, 2, Weekday::Mon, ClampPolicy::Fail)
            .unwrap();
        assert_eq!(resolved, d(2024, 1, 9));
    }

    #[test]
    fn clamp_policy_controls_end_of_history() {
        let cal = weekday_calendar(d(2024, 1, 2), d(2024, 3, 29));

        let clamped = cal
            .resolve_ordinal_weekday(2024, 6, 2, Weekday::Mon, ClampPolicy::ClampToLast)
            .unwrap();
        assert_eq!(clamped, d(2024, 3, 29));

        assert!(matches!(
            cal.resolve_ordinal_weekday(2024, 6, 2, Weekday::Mon, ClampPolicy::Fail),
            Err(CalendarError::RangeExhausted { .. })
        ));
    }

    #[test]
    fn calendar_is_strictly_increasing_and_deduplicated() {
        let days = vec![d(2024, 1, 3), d(2024, 1, 2), d(2024, 1, 3), d(2024, 1, 4)];
        let cal = TradingCalendar::from_days(days, "005930").unwrap();
        assert_eq!(cal.days(), &[d(2024, 1, 2), d(2024, 1, 3), d(2024, 1, 4)]);
        assert!(cal.days().windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn empty_calendar_is_fatal() {
        assert!(matches!(
            TradingCalendar::from_days(Vec::new(), "005930"),
            Err(CalendarError::EmptyCalendar { .. })
        ));
    }
}
