//! # Order Query Core
//!
//! Filtered, joined and paged order reads.
//!
//! ## Control Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        OrderQueries (facade)                            │
//! │                                                                         │
//! │  search / search_page / search_detailed / search_projected             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  predicate::OrderFilter::compose(criteria)   InvalidCriteria → return  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  loader::LoadMode  (SingleValued | Detail | List)                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  pagination::plan_fetch → Direct | TwoPhase | Joined                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite: primary statement ──► (TwoPhase) batched IN follow-ups        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Vec<OrderGraph>   or   projection::OrderRow                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Follow-ups run strictly after the primary statement and one after the
//! other. Nothing is retried; storage errors come back as [`DbError`].
//!
//! [`DbError`]: crate::error::DbError

pub mod loader;
pub mod pagination;
pub mod predicate;
pub mod projection;

use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::{debug, warn};

use crate::config::QueryPolicy;
use crate::error::DbResult;
use orderdesk_core::{LineItem, OrderGraph, OrderRow, OrderSearch};

use loader::{
    attach_line_items, fold_detail_rows, line_items_query, plan_batches, DetailRow, GraphRow,
    LoadMode, GRAPH_COLUMNS, GRAPH_FROM, LINE_COLUMNS, PAGE_ORDER,
};
use pagination::{plan_fetch, FetchStrategy, PageRequest};
use predicate::OrderFilter;

/// Read-only order queries.
///
/// Get one from [`Database::order_queries`](crate::Database::order_queries)
/// per request. The counters are per instance and only describe the calls
/// made through it.
///
/// ## Example
/// ```rust,ignore
/// let queries = db.order_queries();
/// let criteria = OrderSearch::new().with_member_name("kim");
///
/// let page = queries.search_page(&criteria, 0, 20).await?;
/// let rows = queries.search_projected(&criteria).await?;
/// ```
#[derive(Debug)]
pub struct OrderQueries {
    pool: SqlitePool,
    policy: QueryPolicy,
    round_trips: AtomicU32,
    gaps: AtomicU32,
    gap_loads: AtomicU32,
}

impl OrderQueries {
    pub fn new(pool: SqlitePool, policy: QueryPolicy) -> Self {
        OrderQueries {
            pool,
            policy,
            round_trips: AtomicU32::new(0),
            gaps: AtomicU32::new(0),
            gap_loads: AtomicU32::new(0),
        }
    }

    pub fn policy(&self) -> &QueryPolicy {
        &self.policy
    }

    /// Statements issued through this instance so far.
    pub fn round_trips(&self) -> u32 {
        self.round_trips.load(Ordering::Relaxed)
    }

    /// Orders that came back from a batched load with no line items.
    pub fn association_gaps(&self) -> u32 {
        self.gaps.load(Ordering::Relaxed)
    }

    /// Batched loads that found at least one order without line items.
    pub fn gap_loads(&self) -> u32 {
        self.gap_loads.load(Ordering::Relaxed)
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Orders matching `criteria` with member and shipment attached.
    ///
    /// Unpaged, so capped at `max_results`. `line_items` is `None`.
    pub async fn search(&self, criteria: &OrderSearch) -> DbResult<Vec<OrderGraph>> {
        let filter = OrderFilter::compose(criteria)?;
        self.load(&filter, LoadMode::SingleValued, None).await
    }

    /// One order with every line item, or `None` when the id is unknown.
    pub async fn search_detailed(&self, order_id: &str) -> DbResult<Option<OrderGraph>> {
        let filter = OrderFilter::by_order_id(order_id);
        let mut graphs = self.load(&filter, LoadMode::Detail, None).await?;

        if graphs.is_empty() {
            debug!(order_id = %order_id, "Order not found");
            return Ok(None);
        }
        Ok(Some(graphs.swap_remove(0)))
    }

    /// One page of matching orders, each with its line items.
    ///
    /// `limit` must be within `1..=max_results`, else `InvalidCriteria`
    /// and nothing is queried.
    pub async fn search_page(
        &self,
        criteria: &OrderSearch,
        offset: u32,
        limit: u32,
    ) -> DbResult<Vec<OrderGraph>> {
        let filter = OrderFilter::compose(criteria)?;
        let page = PageRequest::new(offset, limit, &self.policy)?;
        self.load(&filter, LoadMode::List, Some(page)).await
    }

    /// Flat display rows for `criteria`, capped at `max_results`.
    pub async fn search_projected(&self, criteria: &OrderSearch) -> DbResult<Vec<OrderRow>> {
        let filter = OrderFilter::compose(criteria)?;
        let page = PageRequest::capped(&self.policy);

        let mut qb = projection::projection_query(&filter, page);
        let rows = self.fetch_all::<OrderRow>(&mut qb).await?;

        debug!(
            filters = filter.predicates().len(),
            rows = rows.len(),
            "Projected order rows"
        );
        Ok(rows)
    }

    // =========================================================================
    // Execution
    // =========================================================================

    async fn load(
        &self,
        filter: &OrderFilter,
        mode: LoadMode,
        page: Option<PageRequest>,
    ) -> DbResult<Vec<OrderGraph>> {
        let strategy = plan_fetch(mode, page, &self.policy);
        debug!(?mode, ?strategy, filters = filter.predicates().len(), "Loading orders");

        let graphs = match strategy {
            FetchStrategy::Direct(page) => self.fetch_graphs(filter, page).await?,
            FetchStrategy::TwoPhase(page) => {
                let mut graphs = self.fetch_graphs(filter, page).await?;
                self.load_line_items(&mut graphs).await?;
                graphs
            }
            FetchStrategy::Joined(page) => self.fetch_joined(filter, page).await?,
        };

        debug!(orders = graphs.len(), "Orders loaded");
        Ok(graphs)
    }

    /// Primary statement: orders with member and shipment, bounded by `page`.
    async fn fetch_graphs(
        &self,
        filter: &OrderFilter,
        page: PageRequest,
    ) -> DbResult<Vec<OrderGraph>> {
        let mut qb = QueryBuilder::new("SELECT ");
        qb.push(GRAPH_COLUMNS).push(GRAPH_FROM);
        filter.push_where(&mut qb);
        qb.push(PAGE_ORDER);
        page.push_limit(&mut qb);

        let rows = self.fetch_all::<GraphRow>(&mut qb).await?;
        Ok(rows.into_iter().map(GraphRow::into_graph).collect())
    }

    /// Detail statement: orders left-joined to their line items.
    ///
    /// `page` bounds the orders in a subquery, never the joined rows.
    async fn fetch_joined(
        &self,
        filter: &OrderFilter,
        page: PageRequest,
    ) -> DbResult<Vec<OrderGraph>> {
        let mut qb = QueryBuilder::new("SELECT ");
        qb.push(GRAPH_COLUMNS)
            .push(", ")
            .push(LINE_COLUMNS)
            .push(GRAPH_FROM)
            .push(" LEFT JOIN order_items li ON li.order_id = o.id")
            .push(" WHERE o.id IN (SELECT o.id")
            .push(GRAPH_FROM);
        filter.push_where(&mut qb);
        qb.push(PAGE_ORDER);
        page.push_limit(&mut qb);
        qb.push(")").push(PAGE_ORDER).push(", li.position");

        let rows = self.fetch_all::<DetailRow>(&mut qb).await?;
        Ok(fold_detail_rows(rows))
    }

    /// Batched follow-up: line items for exactly the orders in `graphs`.
    async fn load_line_items(&self, graphs: &mut [OrderGraph]) -> DbResult<()> {
        let ids: Vec<String> = graphs.iter().map(|g| g.order.id.clone()).collect();

        let mut lines: Vec<LineItem> = Vec::new();
        let mut batches = 0u32;
        for batch in plan_batches(&ids, self.policy.batch_size) {
            let mut qb = line_items_query(batch);
            lines.extend(self.fetch_all::<LineItem>(&mut qb).await?);
            batches += 1;
        }

        debug!(
            orders = ids.len(),
            batches,
            lines = lines.len(),
            "Line items loaded"
        );

        let missing = attach_line_items(graphs, lines);
        if !missing.is_empty() {
            self.record_gaps(&missing);
        }
        Ok(())
    }

    async fn fetch_all<T>(&self, qb: &mut QueryBuilder<'_, Sqlite>) -> DbResult<Vec<T>>
    where
        T: for<'r> sqlx::FromRow<'r, sqlx::sqlite::SqliteRow> + Send + Unpin,
    {
        self.round_trips.fetch_add(1, Ordering::Relaxed);
        let rows = qb.build_query_as::<T>().fetch_all(&self.pool).await?;
        Ok(rows)
    }

    /// A first load with gaps in an instance is expected noise; a load
    /// that finds them again is logged as an anomaly.
    fn record_gaps(&self, order_ids: &[String]) {
        let count = u32::try_from(order_ids.len()).unwrap_or(u32::MAX);
        let gaps = self.gaps.fetch_add(count, Ordering::Relaxed).saturating_add(count);
        let previous_loads = self.gap_loads.fetch_add(1, Ordering::Relaxed);

        if previous_loads == 0 {
            debug!(orders = ?order_ids, "Orders have no line items");
        } else {
            warn!(
                orders = ?order_ids,
                gaps,
                loads = previous_loads + 1,
                "Repeated orders without line items"
            );
        }
    }
}
