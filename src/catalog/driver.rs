use async_trait::async_trait;

use crate::catalog::statement::{BoundStatement, PreparedStatement, Row, StatementKind};
use crate::catalog::table::TableDef;
use crate::catalog::{CatalogError, Result};

/// Connection to a concrete wide-column store.
///
/// A driver is shared by every bulk-load worker, so implementations must be
/// safe for concurrent use without external locking.
#[async_trait]
pub trait Driver: Send + Sync + std::fmt::Debug {
    /// Verifies that the configured credentials are accepted.
    async fn check_auth(&self) -> Result<()>;

    async fn table_exists(&self, name: &str) -> Result<bool>;

    /// Creates `table` under `name` unless it exists.
    ///
    /// Returns `true` if the table was created by this call.
    async fn create_table_if_not_exists(&self, table: &TableDef, name: &str) -> Result<bool>;

    /// Executes a bound statement. Writes return no rows; reads return the
    /// rows of one partition in clustering order.
    async fn execute(&self, statement: &BoundStatement<'_>) -> Result<Vec<Row>>;

    /// Resolves `kind` against `keyspace`, failing if its table is missing.
    async fn prepare(&self, kind: StatementKind, keyspace: &str) -> Result<PreparedStatement> {
        let table = kind.table().qualified_name(keyspace);
        if !self.table_exists(&table).await? {
            return Err(CatalogError::UnknownTable(table));
        }
        Ok(PreparedStatement::new(kind, table))
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
