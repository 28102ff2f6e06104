//! # Catalog Module
//!
//! Data-access layer for a product catalog and its reviews on a wide-column,
//! partitioned store.
//!
//! ## Components
//!
//! - `Session`: a keyspace-bound connection owning the driver and the
//!   prepared statements; entry point for bootstrap, bulk load and queries.
//! - `Driver`: the seam to a concrete store. `DynamoDriver` talks to Amazon
//!   DynamoDB, `MemoryDriver` keeps everything in process.
//! - `StatementCache`: the six prepared statements every operation binds into.
//! - `TableDef`: the three denormalized tables and their key layout.
//! - `ItemRow` / `ReviewRow`: stored rows, parsed from JSON-lines corpora.
//!
//! ## Data Layout
//!
//! Every query is a single-partition read. Reviews are written twice, once
//! partitioned by reviewer and once by product, each clustered newest-first.
//! The two writes are independent; if one fails the projections diverge.
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut session = Session::new(LoaderConfig::default());
//! session.connect("bundle.json", "AKIA...", "secret", "catalog").await?;
//! session.create_tables().await?;
//! session.initialize().await?;
//!
//! session.load_items("items.json").await?;
//! session.load_reviews("reviews.json").await?;
//!
//! println!("{}", session.item("B000GFK7L6").await?);
//! for line in session.user_reviews("A2E2F6NKVKB4ZT").await? {
//!     print!("{line}");
//! }
//! session.close().await?;
//! ```

mod client;
mod driver;
mod error;
mod format;
mod item;
mod keys;
mod lenient;
mod loader;
mod memory;
mod query;
mod review;
mod schema;
mod session;
mod statement;
mod table;

pub use client::DynamoDriver;
pub use error::{CatalogError, Result};
pub use format::NOT_EXISTS;
pub use item::ItemRow;
pub use loader::LoadReport;
pub use memory::MemoryDriver;
pub use review::ReviewRow;
pub use session::Session;
pub use table::TABLES;

/// Stored in place of any textual field missing from the source record.
pub const NOT_AVAILABLE: &str = "na";

/// Stored in place of a missing review rating.
pub const MISSING_RATING: f64 = -1.0;
