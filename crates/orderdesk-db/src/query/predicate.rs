//! # Predicate Composer
//!
//! Turns an [`OrderSearch`] into an ordered list of bound `WHERE` clauses.
//!
//! ## Composition Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  OrderSearch { status, member_name }                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  status present?        ──► o.status = ?                  (first)      │
//! │  member_name non-blank? ──► m.name LIKE ? ESCAPE '\'      (second)     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  joined with AND; nothing present → no WHERE at all                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Values are always bound, never spliced into the SQL text, so the statement
//! text depends only on which filters are present.
//!
//! ## Case Policy
//! Name matching is a substring match that ignores ASCII case, which is what
//! SQLite's `LIKE` does. `%`, `_` and `\` in user input match literally.

use sqlx::{QueryBuilder, Sqlite};

use orderdesk_core::{CoreResult, OrderSearch, OrderStatus};

/// One filter clause with its bound value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderPredicate {
    /// `o.status = ?`
    StatusEquals(OrderStatus),

    /// `m.name LIKE ?` with the raw (unescaped) substring.
    MemberNameContains(String),

    /// `o.id = ?`, for single-order lookups.
    OrderIdEquals(String),
}

impl OrderPredicate {
    fn push_to(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        match self {
            OrderPredicate::StatusEquals(status) => {
                qb.push("o.status = ").push_bind(*status);
            }
            OrderPredicate::MemberNameContains(name) => {
                qb.push("m.name LIKE ")
                    .push_bind(like_pattern(name))
                    .push(" ESCAPE '\\'");
            }
            OrderPredicate::OrderIdEquals(id) => {
                qb.push("o.id = ").push_bind(id.clone());
            }
        }
    }
}

/// The composed filter for one query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderFilter {
    predicates: Vec<OrderPredicate>,
}

impl OrderFilter {
    /// Composes the filter for `criteria`.
    ///
    /// Fails with `InvalidCriteria` before any SQL exists when the criteria
    /// are out of bounds; otherwise never fails.
    pub fn compose(criteria: &OrderSearch) -> CoreResult<Self> {
        criteria.validate()?;

        let mut predicates = Vec::with_capacity(2);
        if let Some(status) = criteria.status() {
            predicates.push(OrderPredicate::StatusEquals(status));
        }
        if let Some(name) = criteria.member_name() {
            predicates.push(OrderPredicate::MemberNameContains(name.to_string()));
        }

        Ok(OrderFilter { predicates })
    }

    /// Matches exactly one order id.
    pub fn by_order_id(order_id: impl Into<String>) -> Self {
        OrderFilter {
            predicates: vec![OrderPredicate::OrderIdEquals(order_id.into())],
        }
    }

    pub fn predicates(&self) -> &[OrderPredicate] {
        &self.predicates
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Appends ` WHERE a AND b` (or nothing) to `qb`.
    pub fn push_where(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        for (i, predicate) in self.predicates.iter().enumerate() {
            qb.push(if i == 0 { " WHERE " } else { " AND " });
            predicate.push_to(qb);
        }
    }
}

/// `%input%` with LIKE metacharacters escaped by `\`.
pub fn like_pattern(input: &str) -> String {
    let mut pattern = String::with_capacity(input.len() + 2);
    pattern.push('%');
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
