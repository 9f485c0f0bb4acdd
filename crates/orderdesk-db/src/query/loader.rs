//! # Association Loader
//!
//! Attaches members, shipments and line items to orders without per-row
//! follow-up queries.
//!
//! ## Join Plan
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  orders o ─┬─ JOIN members m    (always, one row per order)            │
//! │            └─ JOIN shipments s  (always, one row per order)            │
//! │                                                                         │
//! │  Detail:  ... LEFT JOIN order_items li                                  │
//! │           one row per line item → fold by order id (first seen wins)   │
//! │                                                                         │
//! │  List:    page of orders, no order_items join                          │
//! │             │ ids = [o1, o2, ... oK]                                    │
//! │             ▼                                                           │
//! │           SELECT ... FROM order_items WHERE order_id IN (batch)        │
//! │           one statement per batch_size ids → ceil(K / batch_size)      │
//! │             │                                                           │
//! │             ▼                                                           │
//! │           merge by order id; no rows for an order → empty lines        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite};
use std::collections::{HashMap, HashSet};

use orderdesk_core::{
    Address, LineItem, Member, Order, OrderGraph, OrderStatus, Shipment, ShipmentStatus,
};

/// Columns of the primary statement: order, member and shipment.
pub(crate) const GRAPH_COLUMNS: &str = "o.id AS order_id, o.member_id, o.shipment_id, \
     o.ordered_at, o.status, \
     m.name AS member_name, m.city AS member_city, m.street AS member_street, \
     m.zipcode AS member_zipcode, \
     s.city AS shipment_city, s.street AS shipment_street, \
     s.zipcode AS shipment_zipcode, s.status AS shipment_status";

/// Line item columns for the detail join; all nullable under `LEFT JOIN`.
pub(crate) const LINE_COLUMNS: &str = "li.id AS line_id, li.item_id AS line_item_id, \
     li.item_name AS line_item_name, li.unit_price_cents AS line_unit_price_cents, \
     li.quantity AS line_quantity, li.position AS line_position";

/// Inner joins for the single-valued associations.
pub(crate) const GRAPH_FROM: &str = " FROM orders o \
     JOIN members m ON m.id = o.member_id \
     JOIN shipments s ON s.id = o.shipment_id";

/// Stable order so pages partition the result set.
pub(crate) const PAGE_ORDER: &str = " ORDER BY o.ordered_at, o.id";

/// Which associations a query attaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    /// Member and shipment only; `line_items` stays `None`.
    SingleValued,

    /// Joins line items directly. For one order or a small unpaged set.
    Detail,

    /// Pages orders, then loads line items in batched `IN (...)` queries.
    List,
}

impl LoadMode {
    pub fn includes_line_items(&self) -> bool {
        !matches!(self, LoadMode::SingleValued)
    }
}

// =============================================================================
// Row Types
// =============================================================================

/// One row of the primary statement.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct GraphRow {
    order_id: String,
    member_id: String,
    shipment_id: String,
    ordered_at: DateTime<Utc>,
    status: OrderStatus,
    member_name: String,
    member_city: String,
    member_street: String,
    member_zipcode: String,
    shipment_city: String,
    shipment_street: String,
    shipment_zipcode: String,
    shipment_status: ShipmentStatus,
}

impl GraphRow {
    pub(crate) fn into_graph(self) -> OrderGraph {
        OrderGraph {
            order: Order {
                id: self.order_id,
                member_id: self.member_id.clone(),
                shipment_id: self.shipment_id.clone(),
                ordered_at: self.ordered_at,
                status: self.status,
            },
            member: Member {
                id: self.member_id,
                name: self.member_name,
                address: Address::new(self.member_city, self.member_street, self.member_zipcode),
            },
            shipment: Shipment {
                id: self.shipment_id,
                address: Address::new(
                    self.shipment_city,
                    self.shipment_street,
                    self.shipment_zipcode,
                ),
                status: self.shipment_status,
            },
            line_items: None,
        }
    }
}

/// One row of the detail join: an order plus at most one of its line items.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct DetailRow {
    #[sqlx(flatten)]
    graph: GraphRow,
    line_id: Option<String>,
    line_item_id: Option<String>,
    line_item_name: Option<String>,
    line_unit_price_cents: Option<i64>,
    line_quantity: Option<i64>,
    line_position: Option<i64>,
}

impl DetailRow {
    fn line_item(&self) -> Option<LineItem> {
        Some(LineItem {
            id: self.line_id.clone()?,
            order_id: self.graph.order_id.clone(),
            item_id: self.line_item_id.clone()?,
            item_name: self.line_item_name.clone()?,
            unit_price_cents: self.line_unit_price_cents?,
            quantity: self.line_quantity?,
            position: self.line_position?,
        })
    }
}

// =============================================================================
// Detail Mode
// =============================================================================

/// Folds joined rows into one graph per order.
///
/// Orders keep first-seen order; line items are deduplicated by id and
/// sorted by position. An order whose only row has no line item gets
/// `Some(vec![])`.
pub(crate) fn fold_detail_rows(rows: Vec<DetailRow>) -> Vec<OrderGraph> {
    let mut graphs: Vec<OrderGraph> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut seen_lines: HashSet<String> = HashSet::new();

    for row in rows {
        let line = row.line_item();

        let slot = match index.get(&row.graph.order_id) {
            Some(&slot) => slot,
            None => {
                index.insert(row.graph.order_id.clone(), graphs.len());
                let mut graph = row.graph.into_graph();
                graph.line_items = Some(Vec::new());
                graphs.push(graph);
                graphs.len() - 1
            }
        };

        if let Some(line) = line {
            if seen_lines.insert(line.id.clone()) {
                if let Some(lines) = graphs[slot].line_items.as_mut() {
                    lines.push(line);
                }
            }
        }
    }

    for graph in &mut graphs {
        if let Some(lines) = graph.line_items.as_mut() {
            lines.sort_by_key(|line| line.position);
        }
    }

    graphs
}

// =============================================================================
// List Mode
// =============================================================================

/// Splits order ids into follow-up batches of at most `batch_size`.
pub fn plan_batches(ids: &[String], batch_size: usize) -> std::slice::Chunks<'_, String> {
    ids.chunks(batch_size.max(1))
}

/// The follow-up statement for one batch of order ids.
pub(crate) fn line_items_query(batch: &[String]) -> QueryBuilder<'static, Sqlite> {
    let mut qb = QueryBuilder::new(
        "SELECT id, order_id, item_id, item_name, unit_price_cents, quantity, position \
         FROM order_items WHERE order_id IN (",
    );
    let mut ids = qb.separated(", ");
    for id in batch {
        ids.push_bind(id.clone());
    }
    ids.push_unseparated(") ORDER BY order_id, position");
    qb
}

/// Merges loaded line items into their orders.
///
/// Every graph ends up with `Some(..)`. Returns the ids of orders that got
/// no line items at all.
pub(crate) fn attach_line_items(graphs: &mut [OrderGraph], lines: Vec<LineItem>) -> Vec<String> {
    let mut by_order: HashMap<String, Vec<LineItem>> = HashMap::new();
    for line in lines {
        by_order.entry(line.order_id.clone()).or_default().push(line);
    }

    let mut gaps = Vec::new();
    for graph in graphs.iter_mut() {
        match by_order.remove(&graph.order.id) {
            Some(mut lines) => {
                lines.sort_by_key(|line| line.position);
                graph.line_items = Some(lines);
            }
            None => {
                gaps.push(graph.order.id.clone());
                graph.line_items = Some(Vec::new());
            }
        }
    }

    gaps
}
