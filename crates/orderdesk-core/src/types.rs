//! # Domain Types
//!
//! Entities and read models used throughout orderdesk.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Member      │◄──│      Order      │──►│    Shipment     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  id             │   │  id             │       │
//! │  │  name           │   │  member_id (FK) │   │  address        │       │
//! │  │  address        │   │  shipment_id(FK)│   │  status         │       │
//! │  └─────────────────┘   │  ordered_at     │   └─────────────────┘       │
//! │                        │  status         │                              │
//! │                        └────────▲────────┘                              │
//! │                                 │ order_id (FK)                         │
//! │  ┌─────────────────┐   ┌────────┴────────┐                              │
//! │  │      Item       │◄──│    LineItem     │                              │
//! │  │  price, stock   │   │  unit price, qty│                              │
//! │  └─────────────────┘   └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## References, Not Pointers
//! Entities point at each other only through id fields. Nothing holds a
//! back-reference, so every type serializes without cycles. Attached data
//! lives in read models ([`OrderGraph`], [`OrderRow`]) that the query layer
//! fills explicitly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;

// =============================================================================
// Address
// =============================================================================

/// Postal address value object.
///
/// Copied by value onto a shipment when an order is placed, so later member
/// moves do not rewrite shipping history.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Address {
    pub city: String,
    pub street: String,
    pub zipcode: String,
}

impl Address {
    pub fn new(
        city: impl Into<String>,
        street: impl Into<String>,
        zipcode: impl Into<String>,
    ) -> Self {
        Address {
            city: city.into(),
            street: street.into(),
            zipcode: zipcode.into(),
        }
    }
}

// =============================================================================
// Member
// =============================================================================

/// A registered customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Member {
    pub id: String,
    pub name: String,
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub address: Address,
}

impl Member {
    /// Creates a member with a fresh id.
    pub fn new(name: impl Into<String>, address: Address) -> Self {
        Member {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            address,
        }
    }
}

// =============================================================================
// Item
// =============================================================================

/// A sellable item with a stock level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Item {
    pub id: String,
    pub name: String,
    pub price_cents: i64,
    pub stock_quantity: i64,
}

impl Item {
    /// Creates an item with a fresh id.
    pub fn new(name: impl Into<String>, price_cents: i64, stock_quantity: i64) -> Self {
        Item {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            price_cents,
            stock_quantity,
        }
    }

    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Takes `quantity` out of stock.
    ///
    /// Stock never goes negative.
    pub fn remove_stock(&mut self, quantity: i64) -> CoreResult<()> {
        let rest = self.stock_quantity - quantity;
        if rest < 0 {
            return Err(CoreError::NotEnoughStock {
                item: self.name.clone(),
                available: self.stock_quantity,
                requested: quantity,
            });
        }
        self.stock_quantity = rest;
        Ok(())
    }

    /// Puts `quantity` back into stock.
    pub fn add_stock(&mut self, quantity: i64) {
        self.stock_quantity += quantity;
    }
}

// =============================================================================
// Order Status
// =============================================================================

/// Lifecycle of an order. Only `Placed → Cancelled` is allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum OrderStatus {
    #[default]
    Placed,
    Cancelled,
}

impl OrderStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Placed => "PLACED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ValidationError;

    /// Parses `PLACED` / `CANCELLED`, ignoring ASCII case and surrounding blanks.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("placed") {
            Ok(OrderStatus::Placed)
        } else if s.eq_ignore_ascii_case("cancelled") {
            Ok(OrderStatus::Cancelled)
        } else {
            Err(ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: vec!["PLACED".to_string(), "CANCELLED".to_string()],
            })
        }
    }
}

// =============================================================================
// Shipment
// =============================================================================

/// Delivery progress of a shipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum ShipmentStatus {
    #[default]
    Ready,
    InProgress,
    Complete,
}

/// The shipment attached to exactly one order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Shipment {
    pub id: String,
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub address: Address,
    pub status: ShipmentStatus,
}

impl Shipment {
    /// Creates a `Ready` shipment to `address`.
    pub fn ready(address: Address) -> Self {
        Shipment {
            id: Uuid::new_v4().to_string(),
            address,
            status: ShipmentStatus::Ready,
        }
    }
}

// =============================================================================
// Order
// =============================================================================

/// An order row: identity, foreign keys, timestamp and status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Order {
    pub id: String,
    pub member_id: String,
    pub shipment_id: String,
    #[ts(as = "String")]
    pub ordered_at: DateTime<Utc>,
    pub status: OrderStatus,
}

impl Order {
    /// Creates a `Placed` order for `member_id`, shipped via `shipment_id`.
    pub fn place(member_id: impl Into<String>, shipment_id: impl Into<String>) -> Self {
        Order {
            id: Uuid::new_v4().to_string(),
            member_id: member_id.into(),
            shipment_id: shipment_id.into(),
            ordered_at: Utc::now(),
            status: OrderStatus::Placed,
        }
    }

    /// Moves the order to `Cancelled`.
    ///
    /// ## Rules
    /// - A completed shipment blocks cancellation.
    /// - Cancelled orders stay cancelled; there is no way back to `Placed`.
    ///
    /// The status is untouched when this returns an error.
    pub fn cancel(&mut self, shipment: &Shipment) -> CoreResult<()> {
        if shipment.status == ShipmentStatus::Complete {
            return Err(CoreError::InconsistentCancellation {
                order_id: self.id.clone(),
            });
        }

        if self.status != OrderStatus::Placed {
            return Err(CoreError::InvalidOrderStatus {
                order_id: self.id.clone(),
                current_status: self.status.to_string(),
            });
        }

        self.status = OrderStatus::Cancelled;
        Ok(())
    }
}

// =============================================================================
// Line Item
// =============================================================================

/// One line of an order.
///
/// Item name and price are snapshotted at order time so later catalogue edits
/// do not rewrite order history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LineItem {
    pub id: String,
    pub order_id: String,
    pub item_id: String,
    pub item_name: String,
    pub unit_price_cents: i64,
    pub quantity: i64,
    /// Zero-based position within the order.
    pub position: i64,
}

impl LineItem {
    /// Builds the line for `quantity` of `item`, taking the item's current price.
    pub fn new(order_id: impl Into<String>, item: &Item, quantity: i64, position: i64) -> Self {
        LineItem {
            id: Uuid::new_v4().to_string(),
            order_id: order_id.into(),
            item_id: item.id.clone(),
            item_name: item.name.clone(),
            unit_price_cents: item.price_cents,
            quantity,
            position,
        }
    }

    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// `unit_price × quantity`.
    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price() * self.quantity
    }

    /// Returns this line's quantity to `item`'s stock.
    pub fn cancel(&self, item: &mut Item) {
        item.add_stock(self.quantity);
    }
}

/// A requested line when placing an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OrderLine {
    pub item_id: String,
    pub quantity: i64,
}

impl OrderLine {
    pub fn new(item_id: impl Into<String>, quantity: i64) -> Self {
        OrderLine {
            item_id: item_id.into(),
            quantity,
        }
    }
}

// =============================================================================
// Read Models
// =============================================================================

/// An order with its associations attached by the query layer.
///
/// `line_items` is `None` when the query did not load them and `Some(vec![])`
/// when it did and found none. The two are never conflated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OrderGraph {
    pub order: Order,
    pub member: Member,
    pub shipment: Shipment,
    pub line_items: Option<Vec<LineItem>>,
}

impl OrderGraph {
    #[inline]
    pub fn id(&self) -> &str {
        &self.order.id
    }

    /// Sum of line totals, if line items were loaded.
    pub fn total_price(&self) -> Option<Money> {
        self.line_items
            .as_ref()
            .map(|items| items.iter().map(LineItem::line_total).sum())
    }
}

/// Flat list-display row: five columns, no relationship references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OrderRow {
    pub order_id: String,
    pub member_name: String,
    #[ts(as = "String")]
    pub ordered_at: DateTime<Utc>,
    pub status: OrderStatus,
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub address: Address,
}

impl From<&OrderGraph> for OrderRow {
    /// Same shape as the projection query; the address is the shipment's.
    fn from(graph: &OrderGraph) -> Self {
        OrderRow {
            order_id: graph.order.id.clone(),
            member_name: graph.member.name.clone(),
            ordered_at: graph.order.ordered_at,
            status: graph.order.status,
            address: graph.shipment.address.clone(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
