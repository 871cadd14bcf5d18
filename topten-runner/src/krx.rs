//! Curated KRX top-10 constituents by year.
//!
//! Approximate January 1st market-cap rankings for 2016–2026, common shares
//! only (preferred shares such as Samsung Electronics Pfd are excluded).
//! Hand-maintained because programmatic market-cap snapshots for past years
//! are not reliably available.

use std::collections::BTreeMap;
use topten_core::domain::{Constituent, ConstituentError, ConstituentTable};

/// The built-in historical table used when no custom table is supplied.
pub fn historical_top10() -> Result<ConstituentTable, ConstituentError> {
    let raw: &[(i32, &[(&str, &str)])] = &[
        (
            2016,
            &[
                ("005930", "Samsung Electronics"),
                ("000660", "SK Hynix"),
                ("005380", "Hyundai Motor"),
                ("028260", "Samsung C&T"),
                ("035420", "NAVER"),
                ("090430", "AmorePacific"),
                ("051910", "LG Chem"),
                ("032830", "Samsung Life"),
                ("000270", "Kia"),
                ("005490", "POSCO Holdings"),
            ],
        ),
        (
            2017,
            &[
                ("005930", "Samsung Electronics"),
                ("000660", "SK Hynix"),
                ("005380", "Hyundai Motor"),
                ("035420", "NAVER"),
                ("005490", "POSCO Holdings"),
                ("028260", "Samsung C&T"),
                ("055550", "Shinhan Financial"),
                ("051910", "LG Chem"),
                ("012330", "Hyundai Mobis"),
                ("105560", "KB Financial"),
            ],
        ),
        (
            2018,
            &[
                ("005930", "Samsung Electronics"),
                ("000660", "SK Hynix"),
                ("068270", "Celltrion"),
                ("207940", "Samsung Biologics"),
                ("005380", "Hyundai Motor"),
                ("051910", "LG Chem"),
                ("005490", "POSCO Holdings"),
                ("105560", "KB Financial"),
                ("035420", "NAVER"),
                ("028260", "Samsung C&T"),
            ],
        ),
        (
            2019,
            &[
                ("005930", "Samsung Electronics"),
                ("000660", "SK Hynix"),
                ("035420", "NAVER"),
                ("207940", "Samsung Biologics"),
                ("005380", "Hyundai Motor"),
                ("012330", "Hyundai Mobis"),
                ("068270", "Celltrion"),
                ("051910", "LG Chem"),
                ("005490", "POSCO Holdings"),
                ("055550", "Shinhan Financial"),
            ],
        ),
        (
            2020,
            &[
                ("005930", "Samsung Electronics"),
                ("000660", "SK Hynix"),
                ("051910", "LG Chem"),
                ("207940", "Samsung Biologics"),
                ("068270", "Celltrion"),
                ("035420", "NAVER"),
                ("006400", "Samsung SDI"),
                ("005380", "Hyundai Motor"),
                ("035720", "Kakao"),
                ("012330", "Hyundai Mobis"),
            ],
        ),
        (
            2021,
            &[
                ("005930", "Samsung Electronics"),
                ("000660", "SK Hynix"),
                ("035420", "NAVER"),
                ("051910", "LG Chem"),
                ("005380", "Hyundai Motor"),
                ("207940", "Samsung Biologics"),
                ("006400", "Samsung SDI"),
                ("035720", "Kakao"),
                ("068270", "Celltrion"),
                ("005490", "POSCO Holdings"),
            ],
        ),
        (
            2022,
            &[
                ("005930", "Samsung Electronics"),
                ("373220", "LG Energy Solution"),
                ("000660", "SK Hynix"),
                ("207940", "Samsung Biologics"),
                ("005380", "Hyundai Motor"),
                ("035420", "NAVER"),
                ("006400", "Samsung SDI"),
                ("000270", "Kia"),
                ("005490", "POSCO Holdings"),
                ("051910", "LG Chem"),
            ],
        ),
        (
            2023,
            &[
                ("005930", "Samsung Electronics"),
                ("373220", "LG Energy Solution"),
                ("000660", "SK Hynix"),
                ("207940", "Samsung Biologics"),
                ("051910", "LG Chem"),
                ("006400", "Samsung SDI"),
                ("005380", "Hyundai Motor"),
                ("035420", "NAVER"),
                ("000270", "Kia"),
                ("005490", "POSCO Holdings"),
            ],
        ),
        (
            2024,
            &[
                ("005930", "Samsung Electronics"),
                ("000660", "SK Hynix"),
                ("373220", "LG Energy Solution"),
                ("207940", "Samsung Biologics"),
                ("005380", "Hyundai Motor"),
                ("000270", "Kia"),
                ("005490", "POSCO Holdings"),
                ("035420", "NAVER"),
                ("051910", "LG Chem"),
                ("006400", "Samsung SDI"),
            ],
        ),
        (
            2025,
            &[
                ("005930", "Samsung Electronics"),
                ("000660", "SK Hynix"),
                ("373220", "LG Energy Solution"),
                ("207940", "Samsung Biologics"),
                ("005380", "Hyundai Motor"),
                ("000270", "Kia"),
                ("105560", "KB Financial"),
                ("005490", "POSCO Holdings"),
                ("035420", "NAVER"),
                ("068270", "Celltrion"),
            ],
        ),
        // 2026 carries the 2025 list: the rebalance lands in early January
        // before any meaningful ranking shift.
        (
            2026,
            &[
                ("005930", "Samsung Electronics"),
                ("000660", "SK Hynix"),
                ("373220", "LG Energy Solution"),
                ("207940", "Samsung Biologics"),
                ("005380", "Hyundai Motor"),
                ("000270", "Kia"),
                ("105560", "KB Financial"),
                ("005490", "POSCO Holdings"),
                ("035420", "NAVER"),
                ("068270", "Celltrion"),
            ],
        ),
    ];

    let by_year: BTreeMap<i32, Vec<Constituent>> = raw
        .iter()
        .map(|(year, picks)| {
            (
                *year,
                picks
                    .iter()
                    .map(|(ticker, name)| Constituent::new(*ticker, *name))
                    .collect(),
            )
        })
        .collect();

    ConstituentTable::new(by_year)
}

/// Truncate a table to its first `n` names per year.
pub fn take_top_n(table: &ConstituentTable, n: usize) -> Result<ConstituentTable, ConstituentError> {
    let mut by_year = BTreeMap::new();
    for year in table.years().collect::<Vec<_>>() {
        let (_, picks) = table.for_year(year, topten_core::domain::MissingYearPolicy::Exact)?;
        by_year.insert(year, picks.iter().take(n).cloned().collect());
    }
    ConstituentTable::new(by_year)
}

#[cfg(test)]
mod tests {
    use super::*;
    use topten_core::domain::MissingYearPolicy;

    #[test]
    fn every_year_has_ten_names() {
        let table = historical_top10().unwrap();
        for year in 2016..=2026 {
            let (used, picks) = table.for_year(year, MissingYearPolicy::Exact).unwrap();
            assert_eq!(used, year);
            assert_eq!(picks.len(), 10, "year {year}");
        }
    }

    #[test]
    fn samsung_electronics_leads_every_year() {
        let table = historical_top10().unwrap();
        for year in 2016..=2026 {
            let (_, picks) = table.for_year(year, MissingYearPolicy::Exact).unwrap();
            assert_eq!(picks[0].ticker, "005930");
        }
    }

    #[test]
    fn tickers_are_six_digit_codes() {
        let table = historical_top10().unwrap();
        for ticker in table.all_tickers() {
            assert_eq!(ticker.len(), 6);
            assert!(ticker.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn top_n_truncation() {
        let table = historical_top10().unwrap();
        let top3 = take_top_n(&table, 3).unwrap();
        let (_, picks) = top3.for_year(2016, MissingYearPolicy::Exact).unwrap();
        assert_eq!(picks.len(), 3);
        assert_eq!(picks[0].ticker, "005930");
        assert_eq!(picks[1].ticker, "000660");
    }
}
