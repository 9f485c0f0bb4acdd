//! # Projection Builder
//!
//! Flat [`OrderRow`]s selected straight from the joined tables. No
//! `OrderGraph` is built and `order_items` is never touched.
//!
//! Selected columns, in constructor order:
//!
//! | # | Column          | `OrderRow` field |
//! |---|-----------------|------------------|
//! | 1 | `o.id`          | `order_id`       |
//! | 2 | `m.name`        | `member_name`    |
//! | 3 | `o.ordered_at`  | `ordered_at`     |
//! | 4 | `o.status`      | `status`         |
//! | 5 | `s.city/street/zipcode` | `address` (shipment's) |

use sqlx::{QueryBuilder, Sqlite};

use crate::query::loader::{GRAPH_FROM, PAGE_ORDER};
use crate::query::pagination::PageRequest;
use crate::query::predicate::OrderFilter;

const ROW_COLUMNS: &str = "o.id AS order_id, m.name AS member_name, o.ordered_at, o.status, \
     s.city, s.street, s.zipcode";

/// Builds the projection statement for `filter`, bounded by `page`.
pub(crate) fn projection_query(filter: &OrderFilter, page: PageRequest) -> QueryBuilder<'static, Sqlite> {
    let mut qb = QueryBuilder::new("SELECT ");
    qb.push(ROW_COLUMNS).push(GRAPH_FROM);
    filter.push_where(&mut qb);
    qb.push(PAGE_ORDER);
    page.push_limit(&mut qb);
    qb
}
