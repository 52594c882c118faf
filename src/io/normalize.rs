//! Raw record normalization.
//!
//! This module is responsible for turning heterogeneous upstream JSON objects
//! into canonical `PriceRecord`s.
//!
//! Design goals:
//! - **Explicit field aliases**: each canonical field has a fixed list of
//!   upstream spellings, tried in priority order (`Capitalized_Snake_Case`
//!   first, then `snake_case`, then `lowerCamelCase`)
//! - **Record-level tolerance**: a record without a usable date is dropped and
//!   counted, never an error
//! - **Explicit missing values**: unparsable, zero or negative prices become
//!   `None`; upstream exports use `0` for "not reported"

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::PriceRecord;

const DATE_FIELDS: &[&str] = &[
    "Arrival_Date",
    "arrival_date",
    "ArrivalDate",
    "arrivalDate",
    "date",
];
const STATE_FIELDS: &[&str] = &["State", "state"];
const DISTRICT_FIELDS: &[&str] = &["District", "district"];
const MARKET_FIELDS: &[&str] = &["Market", "market"];
const COMMODITY_FIELDS: &[&str] = &["Commodity", "commodity"];
const VARIETY_FIELDS: &[&str] = &["Variety", "variety"];
const MIN_PRICE_FIELDS: &[&str] = &["Min_Price", "min_price", "minPrice"];
const MAX_PRICE_FIELDS: &[&str] = &["Max_Price", "max_price", "maxPrice"];
const MODAL_PRICE_FIELDS: &[&str] = &["Modal_Price", "modal_price", "modalPrice"];

const DATE_FORMATS: [&str; 2] = ["%d/%m/%Y", "%Y-%m-%d"];

const DEFAULT_VARIETY: &str = "N/A";

/// One upstream observation as received: a JSON object with upstream-defined
/// field names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord(Map<String, Value>);

impl RawRecord {
    /// Wrap a JSON value; only objects are records.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// First alias holding a non-blank value.
    fn lookup(&self, aliases: &[&str]) -> Option<&Value> {
        aliases
            .iter()
            .filter_map(|name| self.as_map().get(*name))
            .find(|v| match v {
                Value::Null => false,
                Value::String(s) => !s.trim().is_empty(),
                _ => true,
            })
    }

    fn text(&self, aliases: &[&str]) -> Option<String> {
        match self.lookup(aliases)? {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    fn price(&self, aliases: &[&str]) -> Option<f64> {
        self.lookup(aliases).and_then(parse_price)
    }
}

/// Why a record was excluded from the series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    MissingDate,
    InvalidDate(String),
}

impl std::fmt::Display for DropReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DropReason::MissingDate => write!(f, "missing arrival date"),
            DropReason::InvalidDate(raw) => write!(
                f,
                "invalid arrival date '{raw}' (expected DD/MM/YYYY or YYYY-MM-DD)"
            ),
        }
    }
}

/// Anything that can be read as a canonical price observation.
pub trait IntoPriceRecord {
    fn to_price_record(&self) -> Result<PriceRecord, DropReason>;
}

impl IntoPriceRecord for RawRecord {
    fn to_price_record(&self) -> Result<PriceRecord, DropReason> {
        let raw_date = self.text(DATE_FIELDS).ok_or(DropReason::MissingDate)?;
        let date = parse_date(&raw_date).ok_or(DropReason::InvalidDate(raw_date))?;

        Ok(PriceRecord {
            date,
            state: self.text(STATE_FIELDS).unwrap_or_default(),
            district: self.text(DISTRICT_FIELDS).unwrap_or_default(),
            market: self.text(MARKET_FIELDS).unwrap_or_default(),
            commodity: self.text(COMMODITY_FIELDS).unwrap_or_default(),
            variety: self
                .text(VARIETY_FIELDS)
                .unwrap_or_else(|| DEFAULT_VARIETY.to_string()),
            min_price: self.price(MIN_PRICE_FIELDS),
            max_price: self.price(MAX_PRICE_FIELDS),
            modal_price: self.price(MODAL_PRICE_FIELDS),
        })
    }
}

/// A record excluded during normalization.
#[derive(Debug, Clone)]
pub struct DroppedRecord {
    /// Position in the input slice.
    pub index: usize,
    pub reason: DropReason,
}

/// Normalization output: canonical records plus what was dropped.
#[derive(Debug, Clone, Default)]
pub struct NormalizedRecords {
    pub records: Vec<PriceRecord>,
    pub dropped: Vec<DroppedRecord>,
}

/// Normalize every record, preserving input order.
pub fn normalize_records<R: IntoPriceRecord>(raw: &[R]) -> NormalizedRecords {
    let mut out = NormalizedRecords {
        records: Vec::with_capacity(raw.len()),
        dropped: Vec::new(),
    };
    for (index, rec) in raw.iter().enumerate() {
        match rec.to_price_record() {
            Ok(record) => out.records.push(record),
            Err(reason) => out.dropped.push(DroppedRecord { index, reason }),
        }
    }
    out
}

/// Parse an upstream arrival date (`DD/MM/YYYY` or `YYYY-MM-DD`).
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

fn parse_price(value: &Value) -> Option<f64> {
    let v = match value {
        Value::Number(n) => n.as_f64()?,
        // Thousands separators show up in some exports ("3,520").
        Value::String(s) => s.trim().replace(',', "").parse::<f64>().ok()?,
        _ => return None,
    };
    (v.is_finite() && v > 0.0).then_some(v)
}
