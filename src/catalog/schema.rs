/// Column layout of a catalog table.
///
/// The store itself is schemaless beyond its key attributes; the column list
/// records what every row of a table carries, and in which order the
/// clustering columns sort inside a partition.
///
/// # Key Structure
///
/// - **Partition key**: selects the partition; every query reads exactly one.
/// - **Clustering columns**: order rows inside a partition. On the wire they
///   are folded into one encoded sort-key attribute (see [`super::keys`]).
#[derive(Debug, Clone, Copy)]
pub struct Schema {
    columns: &'static [Column],
    clustering: &'static [(&'static str, Order)],
}

/// A named, typed column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub field_type: FieldType,
}

/// Value type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Text,
    /// UTC instant with second precision.
    Timestamp,
    Double,
    /// Unordered set of strings, rendered sorted.
    TextSet,
}

/// Sort direction of a clustering column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

impl FieldType {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::Text => "TEXT",
            FieldType::Timestamp => "TIMESTAMP",
            FieldType::Double => "DOUBLE",
            FieldType::TextSet => "SET<TEXT>",
        }
    }
}

impl Order {
    pub fn as_str(self) -> &'static str {
        match self {
            Order::Asc => "ASC",
            Order::Desc => "DESC",
        }
    }
}

impl Schema {
    pub const fn new(
        columns: &'static [Column],
        clustering: &'static [(&'static str, Order)],
    ) -> Self {
        Self {
            columns,
            clustering,
        }
    }

    /// Returns the columns in declaration order.
    pub fn columns(&self) -> &'static [Column] {
        self.columns
    }

    /// Returns the clustering columns with their sort direction.
    pub fn clustering(&self) -> &'static [(&'static str, Order)] {
        self.clustering
    }
}

pub(crate) const fn text(name: &'static str) -> Column {
    Column {
        name,
        field_type: FieldType::Text,
    }
}

pub(crate) const fn column(name: &'static str, field_type: FieldType) -> Column {
    Column { name, field_type }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLUMNS: &[Column] = &[
        text("id"),
        column("at", FieldType::Timestamp),
        column("score", FieldType::Double),
    ];

    #[test]
    fn test_schema_accessors() {
        let schema = Schema::new(COLUMNS, &[("at", Order::Desc)]);
        assert_eq!(schema.columns()[1].field_type, FieldType::Timestamp);
        assert_eq!(schema.columns()[2].field_type.as_str(), "DOUBLE");
        assert_eq!(schema.clustering(), &[("at", Order::Desc)]);
        assert_eq!(FieldType::TextSet.as_str(), "SET<TEXT>");
    }
}
