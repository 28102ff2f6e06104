//! In-process driver.
//!
//! Keeps each table as partitions of rows ordered by the same encoded
//! clustering key the remote store sorts by, so reads come back in identical
//! order. Data is lost when the driver is dropped.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::catalog::driver::Driver;
use crate::catalog::statement::{BoundStatement, Row};
use crate::catalog::table::TableDef;
use crate::catalog::{CatalogError, Result};

/// Rows of one table, by partition key then clustering key.
type Partitions = HashMap<String, BTreeMap<String, Row>>;

#[derive(Debug, Default)]
pub struct MemoryDriver {
    tables: RwLock<HashMap<String, Partitions>>,
}

impl MemoryDriver {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Driver for MemoryDriver {
    async fn check_auth(&self) -> Result<()> {
        Ok(())
    }

    async fn table_exists(&self, name: &str) -> Result<bool> {
        Ok(self.tables.read().await.contains_key(name))
    }

    async fn create_table_if_not_exists(&self, table: &TableDef, name: &str) -> Result<bool> {
        let mut tables = self.tables.write().await;
        if tables.contains_key(name) {
            return Ok(false);
        }
        tables.insert(name.to_string(), Partitions::new());
        debug!("Created in-memory {} table '{name}'", table.name());
        Ok(true)
    }

    async fn execute(&self, statement: &BoundStatement<'_>) -> Result<Vec<Row>> {
        let table = statement.table();

        if let Some(row) = statement.row() {
            let mut tables = self.tables.write().await;
            let partitions = tables
                .get_mut(table)
                .ok_or_else(|| CatalogError::UnknownTable(table.to_string()))?;
            partitions
                .entry(statement.partition_key().to_string())
                .or_default()
                .insert(
                    statement.clustering_key().unwrap_or_default().to_string(),
                    row.clone(),
                );
            return Ok(Vec::new());
        }

        let tables = self.tables.read().await;
        let partitions = tables
            .get(table)
            .ok_or_else(|| CatalogError::UnknownTable(table.to_string()))?;
        Ok(partitions
            .get(statement.partition_key())
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::statement::{PreparedStatement, StatementKind, Values};
    use crate::catalog::table::REVIEWS_BY_USER;
    use crate::catalog::ReviewRow;
    use chrono::DateTime;

    fn review(asin: &str, seconds: i64) -> ReviewRow {
        ReviewRow {
            reviewer_id: "U1".to_string(),
            asin: asin.to_string(),
            review_time: DateTime::from_timestamp(seconds, 0).unwrap(),
            reviewer_name: "na".to_string(),
            rating: -1.0,
            summary: "na".to_string(),
            review_text: "na".to_string(),
        }
    }

    #[tokio::test]
    async fn test_partition_scan_in_clustering_order() {
        let driver = MemoryDriver::new();
        let name = REVIEWS_BY_USER.qualified_name("ks");
        assert!(driver
            .create_table_if_not_exists(&REVIEWS_BY_USER, &name)
            .await
            .unwrap());

        let insert = driver
            .prepare(StatementKind::InsertReviewByUser, "ks")
            .await
            .unwrap();
        for (asin, seconds) in [("B2", 100), ("B9", 300), ("B1", 100)] {
            let bound = insert.bind(Values::Review(review(asin, seconds))).unwrap();
            driver.execute(&bound).await.unwrap();
        }

        let select = PreparedStatement::new(StatementKind::SelectReviewsByUser, name);
        let bound = select.bind(Values::Key("U1".to_string())).unwrap();
        let asins: Vec<String> = driver
            .execute(&bound)
            .await
            .unwrap()
            .into_iter()
            .map(|row| row.into_review().unwrap().asin)
            .collect();
        assert_eq!(asins, ["B9", "B1", "B2"]);
    }

    #[tokio::test]
    async fn test_same_key_overwrites() {
        let driver = MemoryDriver::new();
        let name = REVIEWS_BY_USER.qualified_name("ks");
        driver
            .create_table_if_not_exists(&REVIEWS_BY_USER, &name)
            .await
            .unwrap();
        let insert = PreparedStatement::new(StatementKind::InsertReviewByUser, name.clone());
        let mut second = review("B1", 100);
        second.summary = "later".to_string();
        for row in [review("B1", 100), second] {
            driver
                .execute(&insert.bind(Values::Review(row)).unwrap())
                .await
                .unwrap();
        }

        let select = PreparedStatement::new(StatementKind::SelectReviewsByUser, name);
        let rows = driver
            .execute(&select.bind(Values::Key("U1".to_string())).unwrap())
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].clone().into_review().unwrap().summary, "later");
    }

    #[tokio::test]
    async fn test_prepare_requires_table() {
        let driver = MemoryDriver::new();
        let err = driver
            .prepare(StatementKind::SelectItem, "ks")
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::UnknownTable(name) if name == "ks.items"));
    }
}
