//! Clustering key encoding for the review projections.
//!
//! The store orders a partition by one string sort key, compared byte-wise.
//! The two clustering columns `(review_time DESC, discriminator ASC)` are
//! folded into that key:
//!
//! Pattern: `<20-digit inverted seconds>#<discriminator>`
//!
//! The inverted seconds are `i64::MAX - review_time` widened to `u64`, so a
//! later review sorts first. The fixed width makes the discriminator compare
//! only against discriminators of the same second.

use chrono::{DateTime, Utc};

pub const CLUSTERING_SEPARATOR: char = '#';

/// Builds the sort key for a review at `review_time`, tie-broken by `discriminator`.
pub fn clustering_key(review_time: DateTime<Utc>, discriminator: &str) -> String {
    format!(
        "{:020}{CLUSTERING_SEPARATOR}{discriminator}",
        inverted_seconds(review_time.timestamp())
    )
}

fn inverted_seconds(seconds: i64) -> u64 {
    (i128::from(i64::MAX) - i128::from(seconds)) as u64
}
