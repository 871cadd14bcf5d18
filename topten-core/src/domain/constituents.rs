//! ConstituentTable — the static year → top-N mapping.

use super::Ticker;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// One selected stock for a given year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constituent {
    pub ticker: Ticker,
    pub name: String,
}

impl Constituent {
    pub fn new(ticker: impl Into<Ticker>, name: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            name: name.into(),
        }
    }
}

/// What to do when a requested year has no entry in the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingYearPolicy {
    /// Substitute the nearest year by absolute distance; ties prefer the
    /// earlier year. The substitution is reported to the caller so it can
    /// be surfaced as a warning.
    NearestYear,
    /// Treat a missing year as a hard failure.
    Exact,
}

#[derive(Debug, Error)]
pub enum ConstituentError {
    #[error("constituent table is empty")]
    EmptyTable,

    #[error("constituent list for year {year} is empty")]
    EmptyYear { year: i32 },

    #[error("no constituents for year {year}")]
    YearMissing { year: i32 },
}

/// Read-only mapping from calendar year to that year's top-N constituents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstituentTable {
    years: BTreeMap<i32, Vec<Constituent>>,
}

impl ConstituentTable {
    /// Build a table, rejecting an empty table or any empty year up front.
    /// A totally empty table is the one configuration that cannot be
    /// recovered from mid-run, so it fails at construction.
    pub fn new(years: BTreeMap<i32, Vec<Constituent>>) -> Result<Self, ConstituentError> {
        if years.is_empty() {
            return Err(ConstituentError::EmptyTable);
        }
        if let Some((year, _)) = years.iter().find(|(_, list)| list.is_empty()) {
            return Err(ConstituentError::EmptyYear { year: *year });
        }
        Ok(Self { years })
    }

    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.years.keys().copied()
    }

    /// Constituents for `year` under the given missing-year policy.
    ///
    /// Returns the year actually used alongside the list, so callers can
    /// detect a nearest-year substitution.
    pub fn for_year(
        &self,
        year: i32,
        policy: MissingYearPolicy,
    ) -> Result<(i32, &[Constituent]), ConstituentError> {
        if let Some(list) = self.years.get(&year) {
            return Ok((year, list));
        }
        match policy {
            MissingYearPolicy::Exact => Err(ConstituentError::YearMissing { year }),
            MissingYearPolicy::NearestYear => {
                let nearest = self
                    .years
                    .keys()
                    .copied()
                    .min_by_key(|y| ((*y - year).abs(), *y))
                    .ok_or(ConstituentError::EmptyTable)?;
                Ok((nearest, &self.years[&nearest]))
            }
        }
    }

    /// All distinct tickers across every year, sorted.
    pub fn all_tickers(&self) -> Vec<Ticker> {
        let mut tickers: Vec<Ticker> = self
            .years
            .values()
            .flatten()
            .map(|c| c.ticker.clone())
            .collect();
        tickers.sort();
        tickers.dedup();
        tickers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(years: &[i32]) -> ConstituentTable {
        let map = years
            .iter()
            .map(|&y| (y, vec![Constituent::new("005930", "Samsung Electronics")]))
            .collect();
        ConstituentTable::new(map).unwrap()
    }

    #[test]
    fn exact_year_hit() {
        let t = table(&[2020, 2021]);
        let (used, list) = t.for_year(2021, MissingYearPolicy::Exact).unwrap();
        assert_eq!(used, 2021);
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn nearest_year_substitution() {
        let t = table(&[2016, 2020]);
        let (used, _) = t.for_year(2023, MissingYearPolicy::NearestYear).unwrap();
        assert_eq!(used, 2020);
    }

    #[test]
    fn nearest_year_tie_prefers_earlier() {
        let t = table(&[2018, 2022]);
        // 2020 is equidistant from both
        let (used, _) = t.for_year(2020, MissingYearPolicy::NearestYear).unwrap();
        assert_eq!(used, 2018);
    }

    #[test]
    fn exact_policy_fails_on_gap() {
        let t = table(&[2020]);
        assert!(matches!(
            t.for_year(2019, MissingYearPolicy::Exact),
            Err(ConstituentError::YearMissing { year: 2019 })
        ));
    }

    #[test]
    fn empty_table_rejected() {
        assert!(matches!(
            ConstituentTable::new(BTreeMap::new()),
            Err(ConstituentError::EmptyTable)
        ));
    }

    #[test]
    fn all_tickers_deduplicates() {
        let t = table(&[2020, 2021, 2022]);
        assert_eq!(t.all_tickers(), vec!["005930".to_string()]);
    }
}
