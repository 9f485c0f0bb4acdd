//! # Repository Module
//!
//! Thin write-path repositories. Filtered order reads are in [`crate::query`].
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  db.members()  → MemberRepository   register, lookups                  │
//! │  db.items()    → ItemRepository     catalogue, stock                   │
//! │  db.orders()   → OrderRepository    place, cancel, shipment status     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite (one pooled connection or one transaction per call)            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod item;
pub mod member;
pub mod order;
