use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::catalog::driver::Driver;
use crate::catalog::statement::StatementCache;
use crate::catalog::table::TABLES;
use crate::catalog::{CatalogError, DynamoDriver, MemoryDriver, Result};
use crate::config::{Bundle, Credentials, LoaderConfig};

/// A keyspace-bound connection to the catalog store.
///
/// Lifecycle: [`connect`](Self::connect), then [`create_tables`](Self::create_tables)
/// and [`initialize`](Self::initialize), then any number of loads and queries,
/// then [`close`](Self::close). Connecting twice or closing twice is a logged no-op.
///
/// The driver and the prepared statements are shared with bulk-load workers
/// through `Arc`; both are safe for concurrent use.
#[derive(Debug, Default)]
pub struct Session {
    connection: Option<Connection>,
    statements: Option<Arc<StatementCache>>,
    pub(crate) loader: LoaderConfig,
}

#[derive(Debug)]
struct Connection {
    driver: Arc<dyn Driver>,
    keyspace: String,
}

impl Session {
    pub fn new(loader: LoaderConfig) -> Self {
        Self {
            connection: None,
            statements: None,
            loader,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    pub fn keyspace(&self) -> Option<&str> {
        self.connection.as_ref().map(|c| c.keyspace.as_str())
    }

    /// Connects using the bundle at `bundle_path`.
    pub async fn connect(
        &mut self,
        bundle_path: impl AsRef<Path>,
        username: &str,
        password: &str,
        keyspace: &str,
    ) -> Result<()> {
        if self.warn_if_connected() {
            return Ok(());
        }
        let bundle = Bundle::load(bundle_path.as_ref())?;
        self.connect_with(bundle, Credentials::new(username, password), keyspace)
            .await
    }

    /// Connects using an already loaded bundle.
    pub async fn connect_with(
        &mut self,
        bundle: Bundle,
        credentials: Credentials,
        keyspace: &str,
    ) -> Result<()> {
        if self.warn_if_connected() {
            return Ok(());
        }
        if keyspace.is_empty() {
            return Err(CatalogError::Connection("keyspace must not be empty".to_string()));
        }

        info!("Initializing connection to keyspace '{keyspace}'...");
        let driver: Arc<dyn Driver> = match &bundle {
            Bundle::Dynamodb { region, endpoint } => Arc::new(
                DynamoDriver::connect(region.as_deref(), endpoint.as_deref(), &credentials)
                    .await?,
            ),
            Bundle::Memory => Arc::new(MemoryDriver::new()),
        };
        driver.check_auth().await?;

        self.connection = Some(Connection {
            driver,
            keyspace: keyspace.to_string(),
        });
        info!("Initializing connection to keyspace '{keyspace}'... Done");
        Ok(())
    }

    fn warn_if_connected(&self) -> bool {
        match &self.connection {
            Some(connection) => {
                warn!("Already connected to keyspace '{}'", connection.keyspace);
                true
            }
            None => false,
        }
    }

    /// Closes the connection. The data stays in the store.
    pub async fn close(&mut self) -> Result<()> {
        let Some(connection) = self.connection.take() else {
            warn!("Connection is already closed");
            return Ok(());
        };
        info!("Closing connection...");
        self.statements = None;
        connection.driver.close().await?;
        info!("Closing connection... Done");
        Ok(())
    }

    /// Creates the catalog tables that do not exist yet.
    pub async fn create_tables(&self) -> Result<()> {
        let connection = self.connection()?;
        info!("Creating tables...");
        for table in TABLES {
            let name = table.qualified_name(&connection.keyspace);
            if connection
                .driver
                .create_table_if_not_exists(table, &name)
                .await?
            {
                info!("Created table: {name}");
            } else {
                info!("Table '{name}' already exists");
            }
        }
        info!("Creating tables... Done");
        Ok(())
    }

    /// Prepares every statement. The tables must exist.
    pub async fn initialize(&mut self) -> Result<()> {
        let connection = self.connection()?;
        info!("Initializing prepared statements...");
        let statements =
            StatementCache::prepare(connection.driver.as_ref(), &connection.keyspace).await?;
        self.statements = Some(Arc::new(statements));
        info!("Initializing prepared statements... Done");
        Ok(())
    }

    fn connection(&self) -> Result<&Connection> {
        self.connection.as_ref().ok_or(CatalogError::NotConnected)
    }

    /// Returns the driver and statements shared with workers.
    pub(crate) fn handles(&self) -> Result<(Arc<dyn Driver>, Arc<StatementCache>)> {
        let driver = self.connection()?.driver.clone();
        let statements = self
            .statements
            .clone()
            .ok_or(CatalogError::NotInitialized)?;
        Ok((driver, statements))
    }
}
