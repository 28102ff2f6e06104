use std::fmt::Write as _;

use crate::catalog::schema::{column, text, Column, FieldType, Order, Schema};

/// Name of the encoded sort-key attribute carried by the review projections.
pub const CLUSTERING_ATTRIBUTE: &str = "clustering";

/// Catalog table definition.
///
/// Each table is a projection of the data keyed for exactly one query shape,
/// so every read is a scan of a single partition in clustering order.
///
/// # Tables
///
/// | Table | Partition key | Clustering order |
/// |---|---|---|
/// | `items` | `asin` | — |
/// | `reviews_by_user` | `reviewer_id` | `review_time DESC, asin ASC` |
/// | `reviews_by_item` | `asin` | `review_time DESC, reviewer_id ASC` |
///
/// Physical names are qualified by the keyspace, e.g. `catalog.items`.
#[derive(Debug)]
pub struct TableDef {
    name: &'static str,
    partition_key: &'static str,
    sort_key: Option<&'static str>,
    schema: Schema,
}

const ITEM_COLUMNS: &[Column] = &[
    text("asin"),
    text("title"),
    text("image_url"),
    column("categories", FieldType::TextSet),
    text("description"),
];

const REVIEW_BY_USER_COLUMNS: &[Column] = &[
    text("reviewer_id"),
    column("review_time", FieldType::Timestamp),
    text("asin"),
    text("reviewer_name"),
    column("rating", FieldType::Double),
    text("summary"),
    text("review_text"),
];

const REVIEW_BY_ITEM_COLUMNS: &[Column] = &[
    text("asin"),
    column("review_time", FieldType::Timestamp),
    text("reviewer_id"),
    text("reviewer_name"),
    column("rating", FieldType::Double),
    text("summary"),
    text("review_text"),
];

pub static ITEMS: TableDef = TableDef {
    name: "items",
    partition_key: "asin",
    sort_key: None,
    schema: Schema::new(ITEM_COLUMNS, &[]),
};

pub static REVIEWS_BY_USER: TableDef = TableDef {
    name: "reviews_by_user",
    partition_key: "reviewer_id",
    sort_key: Some(CLUSTERING_ATTRIBUTE),
    schema: Schema::new(
        REVIEW_BY_USER_COLUMNS,
        &[("review_time", Order::Desc), ("asin", Order::Asc)],
    ),
};

pub static REVIEWS_BY_ITEM: TableDef = TableDef {
    name: "reviews_by_item",
    partition_key: "asin",
    sort_key: Some(CLUSTERING_ATTRIBUTE),
    schema: Schema::new(
        REVIEW_BY_ITEM_COLUMNS,
        &[("review_time", Order::Desc), ("reviewer_id", Order::Asc)],
    ),
};

/// All catalog tables, in creation order.
pub static TABLES: [&TableDef; 3] = [&ITEMS, &REVIEWS_BY_USER, &REVIEWS_BY_ITEM];

impl TableDef {
    /// Returns the unqualified table name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the table name qualified by `keyspace`.
    pub fn qualified_name(&self, keyspace: &str) -> String {
        format!("{keyspace}.{}", self.name)
    }

    /// Returns the partition key attribute.
    pub fn partition_key(&self) -> &'static str {
        self.partition_key
    }

    /// Returns the sort key attribute, if the table clusters its partitions.
    pub fn sort_key(&self) -> Option<&'static str> {
        self.sort_key
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Renders the table in CQL-like notation, for operator output.
    pub fn describe(&self) -> String {
        let schema = self.schema();
        let mut out = format!("TABLE {} (", self.name);
        for column in schema.columns() {
            let _ = write!(out, "{} {}, ", column.name, column.field_type.as_str());
        }
        let clustering = schema.clustering();
        let _ = write!(out, "PRIMARY KEY (({})", self.partition_key);
        for (name, _) in clustering {
            let _ = write!(out, ", {name}");
        }
        out.push_str("))");
        if !clustering.is_empty() {
            let order = clustering
                .iter()
                .map(|(name, order)| format!("{name} {}", order.as_str()))
                .collect::<Vec<_>>()
                .join(", ");
            let _ = write!(out, " WITH CLUSTERING ORDER BY ({order})");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_keys() {
        assert_eq!(ITEMS.partition_key(), "asin");
        assert_eq!(ITEMS.sort_key(), None);
        assert_eq!(REVIEWS_BY_USER.partition_key(), "reviewer_id");
        assert_eq!(REVIEWS_BY_ITEM.partition_key(), "asin");
        assert_eq!(REVIEWS_BY_ITEM.sort_key(), Some(CLUSTERING_ATTRIBUTE));
    }

    #[test]
    fn test_qualified_name() {
        assert_eq!(
            REVIEWS_BY_USER.qualified_name("catalog"),
            "catalog.reviews_by_user"
        );
    }

    #[test]
    fn test_describe_review_projection() {
        assert_eq!(
            REVIEWS_BY_ITEM.describe(),
            "TABLE reviews_by_item (asin TEXT, review_time TIMESTAMP, reviewer_id TEXT, \
             reviewer_name TEXT, rating DOUBLE, summary TEXT, review_text TEXT, \
             PRIMARY KEY ((asin), review_time, reviewer_id)) \
             WITH CLUSTERING ORDER BY (review_time DESC, reviewer_id ASC)"
        );
    }

    #[test]
    fn test_describe_items() {
        assert!(ITEMS.describe().ends_with("PRIMARY KEY ((asin)))"));
    }
}
