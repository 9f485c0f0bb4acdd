//! # orderdesk-db: Database Layer for orderdesk
//!
//! SQLite storage through sqlx: pool, schema bootstrap, write-path
//! repositories and the order query core.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        orderdesk Data Flow                              │
//! │                                                                         │
//! │  Caller (web layer, seed binary, tests)                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  orderdesk-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐   ┌────────────────┐   ┌───────────────┐  │   │
//! │  │   │   Database    │   │  Repositories  │   │  OrderQueries │  │   │
//! │  │   │   (pool.rs)   │   │  member, item, │   │  predicate    │  │   │
//! │  │   │               │◄──│  order writes  │   │  loader       │  │   │
//! │  │   │  SqlitePool   │   └────────────────┘   │  pagination   │  │   │
//! │  │   │  QueryPolicy  │◄───────────────────────│  projection   │  │   │
//! │  │   └───────────────┘                        └───────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite (members, items, shipments, orders, order_items)               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`config`] - Query policy and environment variables
//! - [`migrations`] - Embedded schema
//! - [`error`] - Database error types
//! - [`repository`] - Member, item and order writes
//! - [`query`] - Filtered, joined, paged order reads
//!
//! ## Usage
//!
//! ```rust,ignore
//! use orderdesk_core::{OrderSearch, OrderStatus};
//! use orderdesk_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("orderdesk.db")).await?;
//!
//! let criteria = OrderSearch::new().with_status(OrderStatus::Placed);
//! let page = db.order_queries().search_page(&criteria, 0, 20).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod query;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{ConfigError, QueryPolicy};
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use query::OrderQueries;

pub use repository::item::ItemRepository;
pub use repository::member::MemberRepository;
pub use repository::order::OrderRepository;
