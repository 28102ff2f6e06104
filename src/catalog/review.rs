use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::item::or_not_available;
use crate::catalog::lenient::{
    deserialize_optional_f64, deserialize_optional_i64, deserialize_optional_text,
};
use crate::catalog::{CatalogError, Result, MISSING_RATING};

/// A review row, identical in both review projections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRow {
    pub reviewer_id: String,
    pub asin: String,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub review_time: DateTime<Utc>,
    pub reviewer_name: String,
    pub rating: f64,
    pub summary: String,
    pub review_text: String,
}

/// One line of the reviews corpus. Unknown keys are ignored; optional fields
/// of an unexpected type are converted rather than rejected.
#[derive(Debug, Deserialize)]
struct ReviewRecord {
    #[serde(rename = "reviewerID")]
    reviewer_id: Option<String>,
    asin: Option<String>,
    #[serde(
        rename = "reviewerName",
        default,
        deserialize_with = "deserialize_optional_text"
    )]
    reviewer_name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_f64")]
    overall: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_optional_text")]
    summary: Option<String>,
    #[serde(
        rename = "reviewText",
        default,
        deserialize_with = "deserialize_optional_text"
    )]
    review_text: Option<String>,
    #[serde(
        rename = "unixReviewTime",
        default,
        deserialize_with = "deserialize_optional_i64"
    )]
    unix_review_time: Option<i64>,
}

impl ReviewRow {
    /// Parses one JSON line of the reviews corpus.
    pub fn from_json_line(line: &str) -> Result<Self> {
        let record: ReviewRecord = serde_json::from_str(line)?;
        let reviewer_id = record.reviewer_id.ok_or(CatalogError::MissingField {
            record: "review",
            field: "reviewerID",
        })?;
        let asin = record.asin.ok_or(CatalogError::MissingField {
            record: "review",
            field: "asin",
        })?;
        let seconds = record.unix_review_time.unwrap_or(0);
        let review_time =
            DateTime::from_timestamp(seconds, 0).ok_or(CatalogError::InvalidTimestamp(seconds))?;

        Ok(Self {
            reviewer_id,
            asin,
            review_time,
            reviewer_name: or_not_available(record.reviewer_name),
            rating: record.overall.unwrap_or(MISSING_RATING),
            summary: or_not_available(record.summary),
            review_text: or_not_available(record.review_text),
        })
    }
}
