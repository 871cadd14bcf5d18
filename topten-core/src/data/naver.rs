//! Naver Finance daily-close provider.
//!
//! Fetches daily closes from Naver's `siseJson` endpoint. The endpoint has
//! no official contract and answers with single-quoted, JSON-ish rows of
//! `[date, open, high, low, close, volume, foreign-ratio]`; the response is
//! sanitized before parsing. Requests retry with exponential backoff.

use super::provider::{normalize_closes, ClosePrice, DataError, PriceProvider};
use chrono::NaiveDate;
use std::time::Duration;

/// Naver Finance provider.
pub struct NaverProvider {
    client: reqwest::blocking::Client,
    max_retries: u32,
    base_delay: Duration,
}

impl Default for NaverProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl NaverProvider {
    pub fn new() -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .expect("failed to build HTTP client");

        Self {
            client,
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        }
    }

    /// Build the siseJson URL for a ticker and date range.
    fn sise_url(ticker: &str, start: NaiveDate, end: NaiveDate) -> String {
        format!(
            "https://api.finance.naver.com/siseJson.naver?symbol={ticker}\
             &requestType=1&startTime={}&endTime={}&timeframe=day",
            start.format("%Y%m%d"),
            end.format("%Y%m%d"),
        )
    }

    /// Parse the siseJson body into close prices.
    ///
    /// The body is a nested array whose first row is a header; date cells
    /// are `"YYYYMMDD"` strings and the close sits in column 4.
    fn parse_body(ticker: &str, body: &str) -> Result<Vec<ClosePrice>, DataError> {
        let sanitized = body.replace('\'', "\"");
        let rows: serde_json::Value = serde_json::from_str(sanitized.trim()).map_err(|e| {
            DataError::ResponseFormatChanged(format!("siseJson parse for {ticker}: {e}"))
        })?;

        let rows = rows
            .as_array()
            .ok_or_else(|| DataError::ResponseFormatChanged("top level is not an array".into()))?;

        let mut closes = Vec::new();
        for row in rows.iter().skip(1) {
            let Some(cells) = row.as_array() else {
                continue;
            };
            if cells.len() < 5 {
                continue;
            }
            let Some(date_str) = cells[0].as_str() else {
                // Trailing header repeats and padding rows are not data.
                continue;
            };
            let date = NaiveDate::parse_from_str(date_str, "%Y%m%d").map_err(|e| {
                DataError::ResponseFormatChanged(format!("bad date cell '{date_str}': {e}"))
            })?;
            if let Some(close) = cells[4].as_f64() {
                closes.push(ClosePrice { date, close });
            }
        }

        Ok(normalize_closes(closes))
    }
}

impl PriceProvider for NaverProvider {
    fn name(&self) -> &str {
        "naver-finance"
    }

    fn fetch_closes(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ClosePrice>, DataError> {
        let url = Self::sise_url(ticker, start, end);
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.base_delay * 2u32.pow(attempt - 1);
                std::thread::sleep(delay);
            }

            match self.client.get(&url).send() {
                Ok(resp) => {
                    let status = resp.status();

                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        let retry_after = resp
                            .headers()
                            .get("retry-after")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|v| v.parse::<u64>().ok())
                            .unwrap_or(60);
                        last_error = Some(DataError::RateLimited {
                            retry_after_secs: retry_after,
                        });
                        continue;
                    }

                    if status == reqwest::StatusCode::NOT_FOUND {
                        return Err(DataError::TickerNotFound {
                            ticker: ticker.to_string(),
                        });
                    }

                    if !status.is_success() {
                        last_error = Some(DataError::Other(format!("HTTP {status} for {ticker}")));
                        continue;
                    }

                    let body = resp.text().map_err(|e| {
                        DataError::ResponseFormatChanged(format!("body read for {ticker}: {e}"))
                    })?;

                    return Self::parse_body(ticker, &body);
                }
                Err(e) => {
                    if e.is_connect() || e.is_timeout() {
                        last_error = Some(DataError::NetworkUnreachable(e.to_string()));
                        continue;
                    }
                    return Err(DataError::NetworkUnreachable(e.to_string()));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| DataError::Other(format!("fetch failed for {ticker}"))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_sise_json_body() {
        let body = "[['날짜', '시가', '고가', '저가', '종가', '거래량', '외국인소진율'], \
                    [\"20240102\", 78200, 79800, 78200, 79600, 17142847, 54.31], \
                    [\"20240103\", 78500, 78800, 77000, 77000, 21753644, 54.17]]";
        let closes = NaverProvider::parse_body("005930", body).unwrap();
        assert_eq!(closes.len(), 2);
        assert_eq!(closes[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(closes[0].close, 79600.0);
        assert_eq!(closes[1].close, 77000.0);
    }

    #[test]
    fn parse_empty_body_yields_empty_series() {
        let closes = NaverProvider::parse_body("000000", "[['날짜', '종가']]").unwrap();
        assert!(closes.is_empty());
    }

    #[test]
    fn parse_garbage_is_a_format_error() {
        assert!(matches!(
            NaverProvider::parse_body("005930", "<html>blocked</html>"),
            Err(DataError::ResponseFormatChanged(_))
        ));
    }

    #[test]
    fn url_encodes_dates_as_yyyymmdd() {
        let url = NaverProvider::sise_url(
            "005930",
            NaiveDate::from_ymd_opt(2016, 1, 4).unwrap(),
            NaiveDate::from_ymd_opt(2026, 1, 2).unwrap(),
        );
        assert!(url.contains("symbol=005930"));
        assert!(url.contains("startTime=20160104"));
        assert!(url.contains("endTime=20260102"));
    }
}
