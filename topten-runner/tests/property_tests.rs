//! Property tests for config resolution and the metric functions.

use chrono::{Datelike, NaiveDate};
use proptest::prelude::*;
use topten_runner::config::{weekday_from_index, BacktestConfig};
use topten_runner::metrics::{max_drawdown, return_on_invested};

proptest! {
    #[test]
    fn weekday_index_round_trips(index in 0u8..=6) {
        let weekday = weekday_from_index(index);
        prop_assert_eq!(weekday.num_days_from_monday(), index as u32);
    }

    #[test]
    fn derived_window_start_precedes_end(
        offset in 1u32..=50,
        year in 1990i32..2100,
        month in 1u32..=12,
        day in 1u32..=28,
    ) {
        let config = BacktestConfig {
            start_year_offset: offset,
            ..BacktestConfig::default()
        };
        let today = NaiveDate::from_ymd_opt(year, month, day).unwrap();
        let (start, end) = config.window(today);

        prop_assert!(start < end);
        prop_assert_eq!(end, today);
        prop_assert_eq!(start.year(), today.year() - offset as i32);
    }

    #[test]
    fn drawdown_is_a_fraction_of_the_peak(
        values in prop::collection::vec(1.0f64..1e9, 1..50),
    ) {
        let dd = max_drawdown(&values);
        prop_assert!(dd <= 0.0);
        prop_assert!(dd >= -1.0);
    }

    #[test]
    fn sorted_curve_never_draws_down(
        mut values in prop::collection::vec(1.0f64..1e9, 1..50),
    ) {
        values.sort_by(|a, b| a.partial_cmp(b).unwrap());
        prop_assert_eq!(max_drawdown(&values), 0.0);
    }

    #[test]
    fn return_sign_follows_profit(
        invested in 1.0f64..1e9,
        final_value in 0.0f64..1e9,
    ) {
        let ret = return_on_invested(final_value, invested);
        if final_value > invested {
            prop_assert!(ret > 0.0);
        } else if final_value < invested {
            prop_assert!(ret < 0.0);
        } else {
            prop_assert_eq!(ret, 0.0);
        }
    }
}
