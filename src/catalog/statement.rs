//! Prepared statements.
//!
//! Every data operation goes through one of six statement shapes. A shape is
//! prepared once per session against its keyspace-qualified table and then
//! bound with typed values for each execution; no query text is ever built
//! from record data.

use crate::catalog::driver::Driver;
use crate::catalog::keys::clustering_key;
use crate::catalog::table::{TableDef, ITEMS, REVIEWS_BY_ITEM, REVIEWS_BY_USER};
use crate::catalog::{CatalogError, ItemRow, Result, ReviewRow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    InsertItem,
    InsertReviewByUser,
    InsertReviewByItem,
    SelectItem,
    SelectReviewsByUser,
    SelectReviewsByItem,
}

impl StatementKind {
    pub fn name(self) -> &'static str {
        match self {
            StatementKind::InsertItem => "insert-item",
            StatementKind::InsertReviewByUser => "insert-review-by-user",
            StatementKind::InsertReviewByItem => "insert-review-by-item",
            StatementKind::SelectItem => "select-item",
            StatementKind::SelectReviewsByUser => "select-reviews-by-user",
            StatementKind::SelectReviewsByItem => "select-reviews-by-item",
        }
    }

    /// The table this statement reads or writes.
    pub fn table(self) -> &'static TableDef {
        match self {
            StatementKind::InsertItem | StatementKind::SelectItem => &ITEMS,
            StatementKind::InsertReviewByUser | StatementKind::SelectReviewsByUser => {
                &REVIEWS_BY_USER
            }
            StatementKind::InsertReviewByItem | StatementKind::SelectReviewsByItem => {
                &REVIEWS_BY_ITEM
            }
        }
    }
}

/// A statement shape resolved against a keyspace-qualified table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedStatement {
    kind: StatementKind,
    table: String,
}

/// Values bound into a prepared statement.
#[derive(Debug, Clone)]
pub enum Values {
    Item(ItemRow),
    Review(ReviewRow),
    /// Partition key of a read.
    Key(String),
}

/// A row written to or read from a table.
#[derive(Debug, Clone, PartialEq)]
pub enum Row {
    Item(ItemRow),
    Review(ReviewRow),
}

/// A prepared statement with its values bound and its key resolved.
#[derive(Debug)]
pub struct BoundStatement<'a> {
    prepared: &'a PreparedStatement,
    partition_key: String,
    clustering_key: Option<String>,
    row: Option<Row>,
}

impl Values {
    fn label(&self) -> &'static str {
        match self {
            Values::Item(_) => "item",
            Values::Review(_) => "review",
            Values::Key(_) => "key",
        }
    }
}

impl Row {
    pub fn into_item(self) -> Result<ItemRow> {
        match self {
            Row::Item(item) => Ok(item),
            Row::Review(_) => Err(CatalogError::UnexpectedRow { expected: "item" }),
        }
    }

    pub fn into_review(self) -> Result<ReviewRow> {
        match self {
            Row::Review(review) => Ok(review),
            Row::Item(_) => Err(CatalogError::UnexpectedRow { expected: "review" }),
        }
    }
}

impl PreparedStatement {
    pub(crate) fn new(kind: StatementKind, table: String) -> Self {
        Self { kind, table }
    }

    /// Binds `values`, resolving the partition and clustering keys of the row.
    pub fn bind(&self, values: Values) -> Result<BoundStatement<'_>> {
        let mismatch = |values: &Values| CatalogError::BindMismatch {
            statement: self.kind.name(),
            given: values.label(),
        };
        let (partition_key, clustering_key, row) = match (self.kind, values) {
            (StatementKind::InsertItem, Values::Item(item)) => {
                (item.asin.clone(), None, Some(Row::Item(item)))
            }
            (StatementKind::InsertReviewByUser, Values::Review(review)) => (
                review.reviewer_id.clone(),
                Some(clustering_key(review.review_time, &review.asin)),
                Some(Row::Review(review)),
            ),
            (StatementKind::InsertReviewByItem, Values::Review(review)) => (
                review.asin.clone(),
                Some(clustering_key(review.review_time, &review.reviewer_id)),
                Some(Row::Review(review)),
            ),
            (
                StatementKind::SelectItem
                | StatementKind::SelectReviewsByUser
                | StatementKind::SelectReviewsByItem,
                Values::Key(key),
            ) => (key, None, None),
            (_, values) => return Err(mismatch(&values)),
        };
        Ok(BoundStatement {
            prepared: self,
            partition_key,
            clustering_key,
            row,
        })
    }
}

impl BoundStatement<'_> {
    pub fn kind(&self) -> StatementKind {
        self.prepared.kind
    }

    pub fn table(&self) -> &str {
        &self.prepared.table
    }

    pub fn partition_key(&self) -> &str {
        &self.partition_key
    }

    /// Encoded clustering key of a review write; `None` for items and reads.
    pub fn clustering_key(&self) -> Option<&str> {
        self.clustering_key.as_deref()
    }

    /// The row carried by a write; `None` for reads.
    pub fn row(&self) -> Option<&Row> {
        self.row.as_ref()
    }
}

/// The six prepared statements of a session.
#[derive(Debug, Clone)]
pub struct StatementCache {
    pub insert_item: PreparedStatement,
    pub insert_review_by_user: PreparedStatement,
    pub insert_review_by_item: PreparedStatement,
    pub select_item: PreparedStatement,
    pub select_reviews_by_user: PreparedStatement,
    pub select_reviews_by_item: PreparedStatement,
}

impl StatementCache {
    /// Prepares every statement shape against `keyspace`.
    ///
    /// Fails with [`CatalogError::UnknownTable`] if a table is missing.
    pub async fn prepare(driver: &dyn Driver, keyspace: &str) -> Result<Self> {
        Ok(Self {
            insert_item: driver.prepare(StatementKind::InsertItem, keyspace).await?,
            insert_review_by_user: driver
                .prepare(StatementKind::InsertReviewByUser, keyspace)
                .await?,
            insert_review_by_item: driver
                .prepare(StatementKind::InsertReviewByItem, keyspace)
                .await?,
            select_item: driver.prepare(StatementKind::SelectItem, keyspace).await?,
            select_reviews_by_user: driver
                .prepare(StatementKind::SelectReviewsByUser, keyspace)
                .await?,
            select_reviews_by_item: driver
                .prepare(StatementKind::SelectReviewsByItem, keyspace)
                .await?,
        })
    }

    pub fn get(&self, kind: StatementKind) -> &PreparedStatement {
        match kind {
            StatementKind::InsertItem => &self.insert_item,
            StatementKind::InsertReviewByUser => &self.insert_review_by_user,
            StatementKind::InsertReviewByItem => &self.insert_review_by_item,
            StatementKind::SelectItem => &self.select_item,
            StatementKind::SelectReviewsByUser => &self.select_reviews_by_user,
            StatementKind::SelectReviewsByItem => &self.select_reviews_by_item,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use std::collections::BTreeSet;

    fn review() -> ReviewRow {
        ReviewRow {
            reviewer_id: "U1".to_string(),
            asin: "B001".to_string(),
            review_time: DateTime::from_timestamp(200, 0).unwrap(),
            reviewer_name: "na".to_string(),
            rating: 5.0,
            summary: "s1".to_string(),
            review_text: "t1".to_string(),
        }
    }

    fn prepared(kind: StatementKind) -> PreparedStatement {
        PreparedStatement::new(kind, kind.table().qualified_name("catalog"))
    }

    #[test]
    fn test_review_projections_resolve_different_partitions() {
        let by_user = prepared(StatementKind::InsertReviewByUser);
        let bound = by_user.bind(Values::Review(review())).unwrap();
        assert_eq!(bound.table(), "catalog.reviews_by_user");
        assert_eq!(bound.partition_key(), "U1");
        assert!(bound.clustering_key().unwrap().ends_with("#B001"));

        let by_item = prepared(StatementKind::InsertReviewByItem);
        let bound = by_item.bind(Values::Review(review())).unwrap();
        assert_eq!(bound.partition_key(), "B001");
        assert!(bound.clustering_key().unwrap().ends_with("#U1"));
        assert_eq!(bound.row(), Some(&Row::Review(review())));
    }

    #[test]
    fn test_item_write_has_no_clustering_key() {
        let item = ItemRow {
            asin: "B001".to_string(),
            title: "T".to_string(),
            image_url: "U".to_string(),
            categories: BTreeSet::from(["A".to_string()]),
            description: "D".to_string(),
        };
        let statement = prepared(StatementKind::InsertItem);
        let bound = statement.bind(Values::Item(item)).unwrap();
        assert_eq!(bound.partition_key(), "B001");
        assert_eq!(bound.clustering_key(), None);
    }

    #[test]
    fn test_bind_mismatch() {
        let statement = prepared(StatementKind::SelectItem);
        let err = statement.bind(Values::Review(review())).unwrap_err();
        assert_eq!(err.to_string(), "cannot bind review values to select-item");

        let statement = prepared(StatementKind::InsertReviewByUser);
        assert!(statement.bind(Values::Key("U1".to_string())).is_err());
    }

    #[test]
    fn test_kind_targets() {
        assert_eq!(StatementKind::SelectItem.table().name(), "items");
        assert_eq!(
            StatementKind::SelectReviewsByItem.table().name(),
            "reviews_by_item"
        );
        assert_eq!(StatementKind::InsertReviewByUser.name(), "insert-review-by-user");
    }
}
