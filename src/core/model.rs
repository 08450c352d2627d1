//! Entity and statement types shared across the pipeline

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One entry from the registry's entity-list archive. Unique on `code`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityCode {
    pub code: String,
    pub name: String,
    pub listing_symbol: Option<String>,
    pub last_modified: Option<NaiveDate>,
}

/// Detailed profile for a single entity. `industry_code` carries the KSIC
/// classification; the remaining fields are free text and feed keyword
/// scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityProfile {
    pub code: String,
    pub name: String,
    pub name_eng: String,
    pub stock_name: String,
    pub industry_code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub code: String,
    pub name: String,
    pub listing_symbol: Option<String>,
    pub score: u32,
    pub matched: bool,
}

/// A single observed value in long format, keyed by (code, year, metric).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementRecord {
    pub code: String,
    pub name: String,
    pub year: i32,
    pub metric: String,
    pub value: f64,
    pub unit: String,
}
