//! # Error Types
//!
//! Domain-specific error types for orderdesk-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  orderdesk-core errors (this file)                                     │
//! │  ├── CoreError        - Domain rule violations                         │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  orderdesk-db errors (separate crate)                                  │
//! │  └── DbError          - Storage failures, wraps CoreError              │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → caller                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Domain rule violations.
///
/// Every variant is something a user can act on; none of them are storage
/// failures.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Search criteria rejected before any query was issued.
    #[error("Invalid search criteria: {0}")]
    InvalidCriteria(ValidationError),

    /// Cancelling an order whose shipment already completed.
    ///
    /// ## User Workflow
    /// ```text
    /// cancel_order(id)
    ///      │
    ///      ▼
    /// shipment.status == COMPLETE
    ///      │
    ///      ▼
    /// InconsistentCancellation { order_id }
    ///      │
    ///      ▼
    /// UI shows: "Order already delivered, cannot cancel"
    /// ```
    #[error("Order {order_id} has a completed shipment and cannot be cancelled")]
    InconsistentCancellation { order_id: String },

    /// Order is not in a state that allows the requested operation.
    #[error("Order {order_id} is {current_status}, cannot perform operation")]
    InvalidOrderStatus {
        order_id: String,
        current_status: String,
    },

    /// Not enough stock to place the order.
    #[error("Not enough stock for {item}: available {available}, requested {requested}")]
    NotEnoughStock {
        item: String,
        available: i64,
        requested: i64,
    },

    /// A member with the same name is already registered.
    #[error("Member already exists: {0}")]
    DuplicateMember(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
