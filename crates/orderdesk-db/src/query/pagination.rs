//! # Pagination Coordinator
//!
//! Decides how a page is fetched given the join topology.
//!
//! ## Strategy Table
//! ```text
//! ┌──────────────────────┬──────────────┬──────────────────────────────────┐
//! │ LoadMode             │ page given?  │ FetchStrategy                    │
//! ├──────────────────────┼──────────────┼──────────────────────────────────┤
//! │ SingleValued         │ yes / no     │ Direct  (LIMIT/OFFSET in SQL,    │
//! │                      │              │          capped when no page)    │
//! │ List                 │ yes / no     │ TwoPhase (page orders, then      │
//! │                      │              │           batched line items)    │
//! │ Detail               │ yes          │ TwoPhase (forced)                │
//! │ Detail               │ no           │ Joined  (orders capped in a      │
//! │                      │              │          subquery, fold by id)   │
//! └──────────────────────┴──────────────┴──────────────────────────────────┘
//! ```
//!
//! LIMIT/OFFSET is never applied to a statement that joins `order_items`:
//! with one row per line item it would cut pages in the middle of an order.
//! `Joined` bounds the order ids in a subquery instead, so every line item
//! of an order that is returned comes with it.

use sqlx::{QueryBuilder, Sqlite};

use crate::config::QueryPolicy;
use crate::query::loader::LoadMode;
use orderdesk_core::{CoreError, CoreResult, ValidationError};

/// A validated offset/limit pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    offset: u32,
    limit: u32,
}

impl PageRequest {
    /// Validates `limit` against `1..=policy.max_results`.
    pub fn new(offset: u32, limit: u32, policy: &QueryPolicy) -> CoreResult<Self> {
        if limit == 0 || limit > policy.max_results {
            return Err(CoreError::InvalidCriteria(ValidationError::OutOfRange {
                field: "limit".to_string(),
                min: 1,
                max: i64::from(policy.max_results),
            }));
        }

        Ok(PageRequest { offset, limit })
    }

    /// The first `max_results` rows; what every unbounded search gets.
    pub fn capped(policy: &QueryPolicy) -> Self {
        PageRequest {
            offset: 0,
            limit: policy.max_results,
        }
    }

    #[inline]
    pub fn offset(&self) -> u32 {
        self.offset
    }

    #[inline]
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Appends ` LIMIT ? OFFSET ?` to `qb`.
    pub(crate) fn push_limit(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        qb.push(" LIMIT ")
            .push_bind(i64::from(self.limit))
            .push(" OFFSET ")
            .push_bind(i64::from(self.offset));
    }
}

/// How the primary statement is bounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStrategy {
    /// Single-valued joins only; the page goes straight into SQL.
    Direct(PageRequest),

    /// Page the orders without `order_items`, then batch-load line items
    /// for exactly that page.
    TwoPhase(PageRequest),

    /// Join `order_items` for the orders selected by the page, which is
    /// applied to a subquery over order ids.
    Joined(PageRequest),
}

impl FetchStrategy {
    /// True when line items come from a follow-up query.
    pub fn needs_follow_up(&self) -> bool {
        matches!(self, FetchStrategy::TwoPhase(_))
    }
}

/// Picks the fetch strategy for `mode` and an optional page.
pub fn plan_fetch(mode: LoadMode, page: Option<PageRequest>, policy: &QueryPolicy) -> FetchStrategy {
    if !mode.includes_line_items() {
        return FetchStrategy::Direct(page.unwrap_or_else(|| PageRequest::capped(policy)));
    }

    match (mode, page) {
        (LoadMode::Detail, None) => FetchStrategy::Joined(PageRequest::capped(policy)),
        (_, page) => FetchStrategy::TwoPhase(page.unwrap_or_else(|| PageRequest::capped(policy))),
    }
}
