use crate::catalog::format::{format_item, format_review, NOT_EXISTS};
use crate::catalog::statement::{Row, StatementKind, Values};
use crate::catalog::{Result, Session};

impl Session {
    /// Looks up one item. Returns [`NOT_EXISTS`] if the asin was never loaded.
    pub async fn item(&self, asin: &str) -> Result<String> {
        let rows = self.select(StatementKind::SelectItem, asin).await?;
        match rows.into_iter().next() {
            Some(row) => Ok(format_item(&row.into_item()?)),
            None => Ok(NOT_EXISTS.to_string()),
        }
    }

    /// Every review by `reviewer_id`, newest first, ties by asin.
    pub async fn user_reviews(&self, reviewer_id: &str) -> Result<Vec<String>> {
        self.reviews(StatementKind::SelectReviewsByUser, reviewer_id)
            .await
    }

    /// Every review of `asin`, newest first, ties by reviewer id.
    pub async fn item_reviews(&self, asin: &str) -> Result<Vec<String>> {
        self.reviews(StatementKind::SelectReviewsByItem, asin).await
    }

    async fn reviews(&self, kind: StatementKind, key: &str) -> Result<Vec<String>> {
        let lines = self
            .select(kind, key)
            .await?
            .into_iter()
            .map(|row| row.into_review().map(|review| format_review(&review)))
            .collect::<Result<Vec<_>>>()?;
        println!("total reviews: {}", lines.len());
        Ok(lines)
    }

    async fn select(&self, kind: StatementKind, key: &str) -> Result<Vec<Row>> {
        let (driver, statements) = self.handles()?;
        let bound = statements.get(kind).bind(Values::Key(key.to_string()))?;
        driver.execute(&bound).await
    }
}
