//! # Order Search Criteria
//!
//! The transient input to every order query: an optional status and an
//! optional member-name substring. Never persisted.
//!
//! ## Blank Means Absent
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  member_name: None       → no name clause                               │
//! │  member_name: "   "      → no name clause                               │
//! │  member_name: " kim "    → name clause on "kim"                         │
//! │  member_name: 101 chars  → InvalidCriteria (no query issued)            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::types::OrderStatus;
use crate::validation::validate_name_filter;

/// Filters for order retrieval.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OrderSearch {
    status: Option<OrderStatus>,
    member_name: Option<String>,
}

impl OrderSearch {
    /// Criteria with no filters.
    pub fn new() -> Self {
        OrderSearch::default()
    }

    /// Builds criteria from raw request parameters.
    ///
    /// Blank strings count as absent. An unknown status or an over-long name
    /// is rejected with [`CoreError::InvalidCriteria`].
    pub fn from_params(status: Option<&str>, member_name: Option<&str>) -> CoreResult<Self> {
        let status = match status.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => Some(raw.parse::<OrderStatus>().map_err(CoreError::InvalidCriteria)?),
            None => None,
        };

        let criteria = OrderSearch {
            status,
            member_name: member_name.map(str::to_string),
        };
        criteria.validate()?;
        Ok(criteria)
    }

    pub fn with_status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_member_name(mut self, name: impl Into<String>) -> Self {
        self.member_name = Some(name.into());
        self
    }

    #[inline]
    pub fn status(&self) -> Option<OrderStatus> {
        self.status
    }

    /// The trimmed name filter, or `None` when absent or blank.
    pub fn member_name(&self) -> Option<&str> {
        self.member_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }

    /// True when neither filter contributes a clause.
    pub fn is_unfiltered(&self) -> bool {
        self.status.is_none() && self.member_name().is_none()
    }

    /// Checks the criteria before a query is built.
    pub fn validate(&self) -> CoreResult<()> {
        if let Some(name) = self.member_name() {
            validate_name_filter(name).map_err(CoreError::InvalidCriteria)?;
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
