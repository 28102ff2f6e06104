use std::collections::HashMap;

use async_trait::async_trait;
use aws_config::{meta::region::RegionProviderChain, BehaviorVersion};
use aws_sdk_dynamodb::{
    config::{Credentials as AwsCredentials, Region},
    error::DisplayErrorContext,
    operation::describe_table::DescribeTableError,
    types::{
        AttributeDefinition, AttributeValue, BillingMode, KeySchemaElement, KeyType,
        ScalarAttributeType, TableStatus,
    },
    Client,
};
use tokio::time::Duration;
use tracing::{debug, error, info};

use crate::catalog::driver::Driver;
use crate::catalog::statement::{BoundStatement, Row, StatementKind};
use crate::catalog::table::TableDef;
use crate::catalog::{CatalogError, ItemRow, Result, ReviewRow};
use crate::config::Credentials;
use crate::utils::retry_with_backoff;

const DEFAULT_REGION: &str = "us-east-1";

/// Driver for Amazon DynamoDB.
///
/// Each catalog table maps to one DynamoDB table:
///
/// - the partition key becomes the table's HASH key (string);
/// - the clustering columns of the review projections are folded into a
///   single string RANGE key, so an ascending `Query` returns a partition
///   newest-first (see [`crate::catalog::keys`]).
///
/// Writes are `PutItem` (upsert), the item lookup is `GetItem`, and partition
/// scans are paginated `Query` calls. Reads are strongly consistent, so a
/// query issued after a load sees every write the load acknowledged.
#[derive(Debug)]
pub struct DynamoDriver {
    client: Client,
}

impl DynamoDriver {
    /// Builds a client for `region` or an explicit `endpoint`, signing with the
    /// given static credentials.
    pub async fn connect(
        region: Option<&str>,
        endpoint: Option<&str>,
        credentials: &Credentials,
    ) -> Result<Self> {
        let credentials = AwsCredentials::new(
            credentials.username(),
            credentials.password(),
            None,
            None,
            "review-catalog",
        );
        let region_provider =
            RegionProviderChain::first_try(region.map(|r| Region::new(r.to_string())))
                .or_default_provider()
                .or_else(Region::new(DEFAULT_REGION));

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(region_provider)
            .credentials_provider(credentials);
        if let Some(endpoint) = endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let sdk_config = loader.load().await;

        Ok(Self {
            client: Client::new(&sdk_config),
        })
    }

    /// Polls the table description until the table is `ACTIVE`.
    async fn wait_until_active(&self, name: &str) -> Result<()> {
        let client = &self.client;
        retry_with_backoff(
            "table activation",
            move || async move {
                let output = client
                    .describe_table()
                    .table_name(name)
                    .send()
                    .await
                    .map_err(|e| {
                        CatalogError::driver("describe_table", name, DisplayErrorContext(e))
                    })?;
                match output.table().and_then(|t| t.table_status()) {
                    Some(TableStatus::Active) => Ok(()),
                    status => Err(CatalogError::Schema(format!(
                        "table '{name}' is not active yet ({status:?})"
                    ))),
                }
            },
            Duration::from_millis(500),
            12,
        )
        .await
    }

    async fn put_row(&self, statement: &BoundStatement<'_>, row: &Row) -> Result<()> {
        let table = statement.table();
        let attributes = row_attributes(statement, row)?;

        self.client
            .put_item()
            .table_name(table)
            .set_item(Some(attributes))
            .send()
            .await
            .map_err(|e| CatalogError::driver("put_item", table, DisplayErrorContext(e)))?;
        Ok(())
    }

    async fn get_item(&self, statement: &BoundStatement<'_>) -> Result<Vec<Row>> {
        let table = statement.table();
        let response = self
            .client
            .get_item()
            .table_name(table)
            .key(
                statement.kind().table().partition_key(),
                AttributeValue::S(statement.partition_key().to_string()),
            )
            .consistent_read(true)
            .send()
            .await
            .map_err(|e| CatalogError::driver("get_item", table, DisplayErrorContext(e)))?;

        match response.item {
            Some(attributes) => Ok(vec![item_row(attributes)?]),
            None => Ok(Vec::new()),
        }
    }

    /// Reads one partition in ascending sort-key order, following pagination.
    async fn query_partition(&self, statement: &BoundStatement<'_>) -> Result<Vec<Row>> {
        let table = statement.table();
        let mut rows = Vec::new();
        let mut last_evaluated_key = None;

        loop {
            let response = self
                .client
                .query()
                .table_name(table)
                .key_condition_expression("#pk = :pk")
                .expression_attribute_names("#pk", statement.kind().table().partition_key())
                .expression_attribute_values(
                    ":pk",
                    AttributeValue::S(statement.partition_key().to_string()),
                )
                .scan_index_forward(true)
                .consistent_read(true)
                .set_exclusive_start_key(last_evaluated_key)
                .send()
                .await
                .map_err(|e| CatalogError::driver("query", table, DisplayErrorContext(e)))?;

            for attributes in response.items.unwrap_or_default() {
                rows.push(review_row(attributes)?);
            }

            last_evaluated_key = response.last_evaluated_key;
            if last_evaluated_key.is_none() {
                break;
            }
        }

        Ok(rows)
    }
}

/// Encodes a row for `PutItem`, adding the encoded clustering key under the
/// table's sort-key attribute.
fn row_attributes(
    statement: &BoundStatement<'_>,
    row: &Row,
) -> Result<HashMap<String, AttributeValue>> {
    let mut attributes: HashMap<String, AttributeValue> = match row {
        Row::Item(item) => serde_dynamo::to_item(item)?,
        Row::Review(review) => serde_dynamo::to_item(review)?,
    };
    if let (Some(sort_key), Some(clustering)) = (
        statement.kind().table().sort_key(),
        statement.clustering_key(),
    ) {
        attributes.insert(
            sort_key.to_string(),
            AttributeValue::S(clustering.to_string()),
        );
    }
    Ok(attributes)
}

fn item_row(attributes: HashMap<String, AttributeValue>) -> Result<Row> {
    let item: ItemRow = serde_dynamo::from_item(attributes)?;
    Ok(Row::Item(item))
}

/// Decodes a review; the sort-key attribute is not part of the row.
fn review_row(attributes: HashMap<String, AttributeValue>) -> Result<Row> {
    let review: ReviewRow = serde_dynamo::from_item(attributes)?;
    Ok(Row::Review(review))
}

#[async_trait]
impl Driver for DynamoDriver {
    async fn check_auth(&self) -> Result<()> {
        self.client
            .list_tables()
            .limit(1)
            .send()
            .await
            .map_err(|e| {
                error!("Authentication failed: {}", DisplayErrorContext(&e));
                CatalogError::Connection(format!("authentication failed: {e}"))
            })?;
        info!("Authentication successful");
        Ok(())
    }

    async fn table_exists(&self, name: &str) -> Result<bool> {
        match self.client.describe_table().table_name(name).send().await {
            Ok(_) => Ok(true),
            Err(e) => match e.into_service_error() {
                DescribeTableError::ResourceNotFoundException(_) => Ok(false),
                other => Err(CatalogError::driver("describe_table", name, other)),
            },
        }
    }

    async fn create_table_if_not_exists(&self, table: &TableDef, name: &str) -> Result<bool> {
        if self.table_exists(name).await? {
            debug!("Table '{name}' exists");
            return Ok(false);
        }

        let schema_error = |e: aws_sdk_dynamodb::error::BuildError| {
            CatalogError::Schema(format!("invalid definition for '{name}': {e}"))
        };

        let mut attribute_definitions = vec![AttributeDefinition::builder()
            .attribute_name(table.partition_key())
            .attribute_type(ScalarAttributeType::S)
            .build()
            .map_err(schema_error)?];

        let mut key_schema = vec![KeySchemaElement::builder()
            .attribute_name(table.partition_key())
            .key_type(KeyType::Hash)
            .build()
            .map_err(schema_error)?];

        if let Some(sort_key) = table.sort_key() {
            attribute_definitions.push(
                AttributeDefinition::builder()
                    .attribute_name(sort_key)
                    .attribute_type(ScalarAttributeType::S)
                    .build()
                    .map_err(schema_error)?,
            );
            key_schema.push(
                KeySchemaElement::builder()
                    .attribute_name(sort_key)
                    .key_type(KeyType::Range)
                    .build()
                    .map_err(schema_error)?,
            );
        }

        self.client
            .create_table()
            .table_name(name)
            .billing_mode(BillingMode::PayPerRequest)
            .set_attribute_definitions(Some(attribute_definitions))
            .set_key_schema(Some(key_schema))
            .send()
            .await
            .map_err(|e| {
                CatalogError::Schema(format!("create '{name}': {}", DisplayErrorContext(e)))
            })?;

        self.wait_until_active(name).await?;
        Ok(true)
    }

    async fn execute(&self, statement: &BoundStatement<'_>) -> Result<Vec<Row>> {
        if let Some(row) = statement.row() {
            self.put_row(statement, row).await?;
            return Ok(Vec::new());
        }
        match statement.kind() {
            StatementKind::SelectItem => self.get_item(statement).await,
            _ => self.query_partition(statement).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::keys::clustering_key;
    use crate::catalog::statement::{PreparedStatement, Values};
    use crate::catalog::table::CLUSTERING_ATTRIBUTE;
    use chrono::DateTime;
    use std::collections::BTreeSet;

    fn review() -> ReviewRow {
        ReviewRow {
            reviewer_id: "U1".to_string(),
            asin: "B001".to_string(),
            review_time: DateTime::from_timestamp(200, 0).unwrap(),
            reviewer_name: "Ann".to_string(),
            rating: 4.5,
            summary: "s1".to_string(),
            review_text: "t1".to_string(),
        }
    }

    fn prepared(kind: StatementKind) -> PreparedStatement {
        PreparedStatement::new(kind, kind.table().qualified_name("catalog"))
    }

    #[test]
    fn test_review_attributes_carry_clustering_key() {
        let statement = prepared(StatementKind::InsertReviewByItem);
        let bound = statement.bind(Values::Review(review())).unwrap();
        let attributes = row_attributes(&bound, bound.row().unwrap()).unwrap();

        assert_eq!(
            attributes.get(CLUSTERING_ATTRIBUTE),
            Some(&AttributeValue::S(clustering_key(review().review_time, "U1")))
        );
        assert_eq!(
            attributes.get("review_time"),
            Some(&AttributeValue::N("200".to_string()))
        );
        assert_eq!(
            attributes.get("asin"),
            Some(&AttributeValue::S("B001".to_string()))
        );

        let row = review_row(attributes).unwrap();
        assert_eq!(row, Row::Review(review()));
    }

    #[test]
    fn test_item_attributes_round_trip() {
        let item = ItemRow {
            asin: "B001".to_string(),
            title: "T".to_string(),
            image_url: "na".to_string(),
            categories: BTreeSet::from(["A".to_string(), "B".to_string()]),
            description: "D".to_string(),
        };
        let statement = prepared(StatementKind::InsertItem);
        let bound = statement.bind(Values::Item(item.clone())).unwrap();
        let attributes = row_attributes(&bound, bound.row().unwrap()).unwrap();

        assert!(!attributes.contains_key(CLUSTERING_ATTRIBUTE));
        assert_eq!(item_row(attributes).unwrap(), Row::Item(item));
    }
}
