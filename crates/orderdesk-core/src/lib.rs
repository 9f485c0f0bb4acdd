//! # orderdesk-core: Domain Types and Rules
//!
//! Entities, read models, search criteria and the state rules that guard
//! them. Everything here is pure: no database, no network, no clock reads
//! except where a caller asks for a fresh timestamp.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        orderdesk Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Web layer (outside this workspace)              │   │
//! │  │      list orders ──► order detail ──► place / cancel order      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                orderdesk-db (Database Layer)                    │   │
//! │  │        repositories, order query core, SQLite migrations        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ orderdesk-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │  search   │  │   money   │  │ validation│  │   │
//! │  │   │  Order    │  │ OrderSearch│ │   Money   │  │   rules   │  │   │
//! │  │   │  Member   │  │           │  │           │  │           │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK                             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Entities (Member, Item, Order, Shipment, LineItem) and read models
//! - [`search`] - Order search criteria
//! - [`money`] - Integer money
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use orderdesk_core::{OrderSearch, OrderStatus};
//!
//! let criteria = OrderSearch::new()
//!     .with_status(OrderStatus::Placed)
//!     .with_member_name("user");
//!
//! assert_eq!(criteria.status(), Some(OrderStatus::Placed));
//! assert_eq!(criteria.member_name(), Some("user"));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod search;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use search::OrderSearch;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Longest member-name filter accepted by [`OrderSearch::validate`].
pub const MAX_NAME_FILTER_LEN: usize = 100;

/// Longest member or item name accepted on insert.
pub const MAX_NAME_LEN: usize = 100;

/// Maximum quantity of a single line item.
///
/// ## Business Reason
/// Catches typing 1000 instead of 10 before stock is touched.
pub const MAX_LINE_QUANTITY: i64 = 999;
