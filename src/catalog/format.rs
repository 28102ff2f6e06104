//! Output formatting for query results. The layouts are a fixed contract and
//! must stay byte-identical.

use chrono::{DateTime, Utc};

use crate::catalog::{ItemRow, ReviewRow};

/// Returned by an item lookup that finds no row. No trailing newline.
pub const NOT_EXISTS: &str = "not exists";

pub fn format_item(item: &ItemRow) -> String {
    format!(
        "asin: {}\ntitle: {}\nimage: {}\ncategories: [{}]\ndescription: {}\n",
        item.asin,
        item.title,
        item.image_url,
        item.categories
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", "),
        item.description,
    )
}

pub fn format_review(review: &ReviewRow) -> String {
    format!(
        "time: {}, asin: {}, reviewerID: {}, reviewerName: {}, rating: {}, summary: {}, reviewText: {}\n",
        format_instant(review.review_time),
        review.asin,
        review.reviewer_id,
        review.reviewer_name,
        format_rating(review.rating),
        review.summary,
        review.review_text,
    )
}

/// ISO-8601 in UTC with a `Z` suffix; reviews carry whole seconds only.
fn format_instant(instant: DateTime<Utc>) -> String {
    instant.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Always shows a decimal point: `5.0`, `-1.0`, `4.5`.
fn format_rating(rating: f64) -> String {
    format!("{rating:?}")
}
