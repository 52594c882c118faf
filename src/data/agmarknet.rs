//! data.gov.in integration for daily mandi (wholesale market) prices.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::data::PriceSource;
use crate::domain::FetchWindow;
use crate::error::AppError;
use crate::io::normalize::RawRecord;

pub const DEFAULT_BASE_URL: &str =
    "https://api.data.gov.in/resource/35985678-0d79-46b4-9ed6-6f13308a1d24";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Rows requested per call; a 10-day window for one district rarely exceeds it.
const PAGE_LIMIT: usize = 1000;

/// Format of the `filters[Arrival_Date]` value.
const FILTER_DATE_FORMAT: &str = "%d/%m/%Y";

pub struct AgmarknetClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl AgmarknetClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::upstream(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        })
    }

    /// Read `DATA_GOV_API_KEY` (required) and `MANDI_BASE_URL` (optional) from
    /// the environment, loading `.env` first.
    pub fn from_env(timeout: Duration) -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        let api_key = std::env::var("DATA_GOV_API_KEY")
            .map_err(|_| AppError::invalid("Missing DATA_GOV_API_KEY in environment (.env)."))?;
        let base_url =
            std::env::var("MANDI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::new(base_url, api_key, timeout)
    }

    /// Fetch the records the upstream publishes for one window.
    ///
    /// The resource filters on a single arrival date, so the window end is
    /// sent as the filter value.
    pub fn fetch_window(&self, window: &FetchWindow) -> Result<Vec<RawRecord>, AppError> {
        let arrival = window.end.format(FILTER_DATE_FORMAT).to_string();
        let limit = PAGE_LIMIT.to_string();

        let resp = self
            .client
            .get(&self.base_url)
            .query(&[
                ("api-key", self.api_key.as_str()),
                ("format", "json"),
                ("limit", limit.as_str()),
                ("filters[State]", window.state.as_str()),
                ("filters[District]", window.district.as_str()),
                ("filters[Commodity]", window.commodity.as_str()),
                ("filters[Arrival_Date]", arrival.as_str()),
            ])
            .send()
            .map_err(|e| AppError::upstream(format!("Price request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AppError::upstream(format!(
                "Price request failed with status {}.",
                resp.status()
            )));
        }

        let body: RecordsResponse = resp
            .json()
            .map_err(|e| AppError::upstream(format!("Failed to parse price response: {e}")))?;

        Ok(body.into_records())
    }
}

impl PriceSource for AgmarknetClient {
    fn fetch(&self, window: &FetchWindow) -> Result<Vec<RawRecord>, AppError> {
        self.fetch_window(window)
    }
}

/// Response envelopes seen in the wild: a bare array, `{ "records": [...] }`
/// (data.gov.in) or `{ "data": [...] }` (proxied through a backend).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RecordsResponse {
    Bare(Vec<Value>),
    Records { records: Vec<Value> },
    Data { data: Vec<Value> },
}

impl RecordsResponse {
    fn into_records(self) -> Vec<RawRecord> {
        let values = match self {
            RecordsResponse::Bare(v) => v,
            RecordsResponse::Records { records } => records,
            RecordsResponse::Data { data } => data,
        };
        // Non-object entries carry nothing to normalize.
        values.into_iter().filter_map(RawRecord::from_value).collect()
    }
}
