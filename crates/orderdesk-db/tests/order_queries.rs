//! End-to-end checks for the order query core against an in-memory SQLite.

use std::collections::HashSet;

use orderdesk_core::{
    Address, CoreError, Item, Member, Order, OrderLine, OrderSearch, OrderStatus, Shipment,
    ShipmentStatus,
};
use orderdesk_db::{Database, DbConfig, DbError, QueryPolicy};

// =============================================================================
// Fixtures
// =============================================================================

async fn open(policy: QueryPolicy) -> Database {
    Database::new(DbConfig::in_memory().query_policy(policy))
        .await
        .unwrap()
}

async fn member(db: &Database, name: &str, city: &str) -> Member {
    db.members()
        .register(name, Address::new(city, "street", "12345"))
        .await
        .unwrap()
}

async fn book(db: &Database, name: &str, price_cents: i64) -> Item {
    db.items()
        .insert(&Item::new(name, price_cents, 1_000))
        .await
        .unwrap()
}

/// Places an order of `quantities.len()` lines, one fresh book per line.
async fn order_with_lines(db: &Database, member: &Member, quantities: &[i64]) -> Order {
    let mut lines = Vec::new();
    for (i, qty) in quantities.iter().enumerate() {
        let item = book(db, &format!("BOOK-{}-{}", member.name, i), 10_000).await;
        lines.push(OrderLine::new(item.id, *qty));
    }
    db.orders().place_order(&member.id, &lines).await.unwrap()
}

/// Writes an order row with no line items, bypassing `place_order`.
async fn order_without_lines(db: &Database, member: &Member) -> Order {
    let shipment = Shipment::ready(member.address.clone());
    let order = Order::place(&member.id, &shipment.id);

    sqlx::query("INSERT INTO shipments (id, city, street, zipcode, status) VALUES (?1, ?2, ?3, ?4, ?5)")
        .bind(&shipment.id)
        .bind(&shipment.address.city)
        .bind(&shipment.address.street)
        .bind(&shipment.address.zipcode)
        .bind(ShipmentStatus::Ready)
        .execute(db.pool())
        .await
        .unwrap();

    sqlx::query(
        "INSERT INTO orders (id, member_id, shipment_id, ordered_at, status) VALUES (?1, ?2, ?3, ?4, ?5)",
    )
    .bind(&order.id)
    .bind(&order.member_id)
    .bind(&order.shipment_id)
    .bind(order.ordered_at)
    .bind(OrderStatus::Placed)
    .execute(db.pool())
    .await
    .unwrap();

    order
}

/// Two members, `per_member` single-line orders each.
async fn shop(db: &Database, per_member: usize) -> (Member, Member) {
    let user_a = member(db, "userA", "Seoul").await;
    let user_b = member(db, "userB", "Busan").await;
    for _ in 0..per_member {
        order_with_lines(db, &user_a, &[1]).await;
        order_with_lines(db, &user_b, &[1]).await;
    }
    (user_a, user_b)
}

fn ids<'a>(graphs: impl IntoIterator<Item = &'a orderdesk_core::OrderGraph>) -> Vec<String> {
    graphs.into_iter().map(|g| g.order.id.clone()).collect()
}

// =============================================================================
// Predicates
// =============================================================================

#[tokio::test]
async fn unfiltered_search_is_capped() {
    let db = open(QueryPolicy::default().max_results(3)).await;
    shop(&db, 3).await;

    let queries = db.order_queries();
    let found = queries.search(&OrderSearch::new()).await.unwrap();
    assert_eq!(found.len(), 3);
    assert!(found.iter().all(|g| g.line_items.is_none()));

    // Blank filters are the same query
    let blank = OrderSearch::from_params(Some("  "), Some("")).unwrap();
    assert_eq!(ids(&queries.search(&blank).await.unwrap()), ids(&found));

    let projected = queries.search_projected(&OrderSearch::new()).await.unwrap();
    let projected_ids: Vec<String> = projected.into_iter().map(|r| r.order_id).collect();
    assert_eq!(projected_ids, ids(&found));
}

#[tokio::test]
async fn status_filter_matches_every_result() {
    let db = open(QueryPolicy::default()).await;
    shop(&db, 2).await;

    let all = db.order_queries().search(&OrderSearch::new()).await.unwrap();
    db.orders().cancel_order(all[1].id()).await.unwrap();

    let queries = db.order_queries();
    let cancelled = queries
        .search(&OrderSearch::new().with_status(OrderStatus::Cancelled))
        .await
        .unwrap();
    assert_eq!(ids(&cancelled), vec![all[1].order.id.clone()]);

    let placed = queries
        .search(&OrderSearch::new().with_status(OrderStatus::Placed))
        .await
        .unwrap();
    assert_eq!(placed.len(), 3);
    assert!(placed.iter().all(|g| g.order.status == OrderStatus::Placed));
}

#[tokio::test]
async fn name_filter_ignores_ascii_case() {
    let db = open(QueryPolicy::default()).await;
    let (user_a, _) = shop(&db, 2).await;
    let queries = db.order_queries();

    for needle in ["serA", "usera", "USERA"] {
        let found = queries
            .search(&OrderSearch::new().with_member_name(needle))
            .await
            .unwrap();
        assert_eq!(found.len(), 2, "filter {needle:?}");
        assert!(found.iter().all(|g| g.member.id == user_a.id));
        assert!(found
            .iter()
            .all(|g| g.member.name.to_lowercase().contains(&needle.to_lowercase())));
    }

    let both = queries
        .search(&OrderSearch::new().with_member_name("USER"))
        .await
        .unwrap();
    assert_eq!(both.len(), 4);
}

#[tokio::test]
async fn name_filter_wildcards_are_literal() {
    let db = open(QueryPolicy::default()).await;
    shop(&db, 1).await;
    let queries = db.order_queries();

    for needle in ["%", "_", "user_"] {
        let found = queries
            .search(&OrderSearch::new().with_member_name(needle))
            .await
            .unwrap();
        assert!(found.is_empty(), "filter {needle:?}");
    }
}

#[tokio::test]
async fn combined_filters_are_anded() {
    let db = open(QueryPolicy::default()).await;
    let (user_a, _) = shop(&db, 2).await;

    let a_orders = db
        .order_queries()
        .search(&OrderSearch::new().with_member_name("userA"))
        .await
        .unwrap();
    db.orders().cancel_order(a_orders[0].id()).await.unwrap();

    let found = db
        .order_queries()
        .search(
            &OrderSearch::new()
                .with_status(OrderStatus::Placed)
                .with_member_name("usera"),
        )
        .await
        .unwrap();

    assert_eq!(ids(&found), vec![a_orders[1].order.id.clone()]);
    assert_eq!(found[0].member.id, user_a.id);
}

#[tokio::test]
async fn invalid_criteria_issue_no_query() {
    let db = open(QueryPolicy::default().max_results(10)).await;
    let queries = db.order_queries();

    let long_name = OrderSearch::new().with_member_name("k".repeat(101));
    let err = queries.search(&long_name).await.unwrap_err();
    assert!(matches!(err, DbError::Domain(CoreError::InvalidCriteria(_))));

    let err = queries
        .search_page(&OrderSearch::new(), 0, 11)
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Domain(CoreError::InvalidCriteria(_))));

    let err = queries
        .search_page(&OrderSearch::new(), 0, 0)
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Domain(CoreError::InvalidCriteria(_))));

    assert_eq!(queries.round_trips(), 0);

    let err = OrderSearch::from_params(Some("SHIPPED"), None).unwrap_err();
    assert!(matches!(err, CoreError::InvalidCriteria(_)));
}

// =============================================================================
// Pagination
// =============================================================================

#[tokio::test]
async fn pages_partition_search() {
    let db = open(QueryPolicy::default()).await;
    shop(&db, 4).await;
    let queries = db.order_queries();

    let all = ids(&queries.search(&OrderSearch::new()).await.unwrap());
    assert_eq!(all.len(), 8);

    for limit in [1u32, 3, 8, 20] {
        let mut paged = Vec::new();
        let mut offset = 0;
        loop {
            let page = queries
                .search_page(&OrderSearch::new(), offset, limit)
                .await
                .unwrap();
            if page.is_empty() {
                break;
            }
            assert!(page.len() <= limit as usize);
            paged.extend(ids(&page));
            offset += limit;
        }

        assert_eq!(paged, all, "limit {limit}");
        let unique: HashSet<&String> = paged.iter().collect();
        assert_eq!(unique.len(), paged.len());
    }
}

#[tokio::test]
async fn filtered_pages_partition_filtered_search() {
    let db = open(QueryPolicy::default()).await;
    shop(&db, 3).await;
    let queries = db.order_queries();
    let criteria = OrderSearch::new().with_member_name("userB");

    let all = ids(&queries.search(&criteria).await.unwrap());
    let mut paged = ids(&queries.search_page(&criteria, 0, 2).await.unwrap());
    paged.extend(ids(&queries.search_page(&criteria, 2, 2).await.unwrap()));

    assert_eq!(all.len(), 3);
    assert_eq!(paged, all);
}

#[tokio::test]
async fn page_loads_every_line_item() {
    let db = open(QueryPolicy::default()).await;
    let user = member(&db, "userA", "Seoul").await;
    let three = order_with_lines(&db, &user, &[1, 2, 3]).await;
    let one = order_with_lines(&db, &user, &[5]).await;

    let page = db
        .order_queries()
        .search_page(&OrderSearch::new(), 0, 10)
        .await
        .unwrap();

    let by_id = |id: &str| page.iter().find(|g| g.id() == id).unwrap();
    let lines = by_id(&three.id).line_items.as_ref().unwrap();
    assert_eq!(
        lines.iter().map(|l| l.quantity).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
    assert_eq!(by_id(&one.id).line_items.as_ref().unwrap().len(), 1);
    assert_eq!(by_id(&three.id).total_price().unwrap().cents(), 60_000);
}

#[tokio::test]
async fn list_mode_batches_follow_ups() {
    let db = open(QueryPolicy::default().batch_size(2)).await;
    shop(&db, 3).await; // 6 orders

    let queries = db.order_queries();
    let page = queries
        .search_page(&OrderSearch::new(), 0, 5)
        .await
        .unwrap();

    assert_eq!(page.len(), 5);
    assert!(page.iter().all(|g| g.line_items.as_ref().unwrap().len() == 1));
    // 1 primary + ceil(5 / 2) follow-ups, never one per order
    assert_eq!(queries.round_trips(), 1 + 3);

    let fresh = db.order_queries();
    fresh
        .search_page(&OrderSearch::new().with_member_name("nobody"), 0, 5)
        .await
        .unwrap();
    assert_eq!(fresh.round_trips(), 1);
}

#[tokio::test]
async fn default_batch_is_one_follow_up() {
    let db = open(QueryPolicy::default()).await;
    shop(&db, 5).await;

    let queries = db.order_queries();
    let page = queries
        .search_page(&OrderSearch::new(), 0, 10)
        .await
        .unwrap();

    assert_eq!(page.len(), 10);
    assert_eq!(queries.round_trips(), 2);
}

#[tokio::test]
async fn missing_line_items_are_not_an_error() {
    let db = open(QueryPolicy::default()).await;
    let user = member(&db, "userA", "Seoul").await;
    order_with_lines(&db, &user, &[1]).await;
    let empty = order_without_lines(&db, &user).await;

    let queries = db.order_queries();
    let page = queries
        .search_page(&OrderSearch::new(), 0, 10)
        .await
        .unwrap();

    assert_eq!(page.len(), 2);
    let gap = page.iter().find(|g| g.id() == empty.id).unwrap();
    assert_eq!(gap.line_items, Some(vec![]));
    assert_eq!(queries.association_gaps(), 1);
    assert_eq!(queries.gap_loads(), 1);

    // Repeated within the same instance: still not an error
    queries
        .search_page(&OrderSearch::new(), 0, 10)
        .await
        .unwrap();
    assert_eq!(queries.association_gaps(), 2);
    assert_eq!(queries.gap_loads(), 2);
    assert_eq!(db.order_queries().association_gaps(), 0);
}

#[tokio::test]
async fn gaps_in_one_load_count_as_one_occurrence() {
    let db = open(QueryPolicy::default()).await;
    let user = member(&db, "userA", "Seoul").await;
    order_without_lines(&db, &user).await;
    order_without_lines(&db, &user).await;

    let queries = db.order_queries();
    let page = queries
        .search_page(&OrderSearch::new(), 0, 10)
        .await
        .unwrap();

    assert_eq!(page.len(), 2);
    assert_eq!(queries.association_gaps(), 2);
    assert_eq!(queries.gap_loads(), 1);

    queries
        .search_page(&OrderSearch::new(), 0, 10)
        .await
        .unwrap();
    assert_eq!(queries.association_gaps(), 4);
    assert_eq!(queries.gap_loads(), 2);
}

#[tokio::test]
async fn complete_loads_record_no_gaps() {
    let db = open(QueryPolicy::default()).await;
    shop(&db, 2).await;

    let queries = db.order_queries();
    queries
        .search_page(&OrderSearch::new(), 0, 10)
        .await
        .unwrap();
    assert_eq!(queries.association_gaps(), 0);
    assert_eq!(queries.gap_loads(), 0);
}

// =============================================================================
// Detail
// =============================================================================

#[tokio::test]
async fn detailed_returns_exactly_n_lines() {
    let db = open(QueryPolicy::default()).await;
    let user = member(&db, "userA", "Seoul").await;

    for n in [1usize, 2, 5] {
        let quantities: Vec<i64> = (1..=n as i64).collect();
        let order = order_with_lines(&db, &user, &quantities).await;

        let queries = db.order_queries();
        let graph = queries.search_detailed(&order.id).await.unwrap().unwrap();
        let lines = graph.line_items.unwrap();

        assert_eq!(lines.len(), n);
        let unique: HashSet<&str> = lines.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(unique.len(), n);
        assert_eq!(lines.iter().map(|l| l.quantity).collect::<Vec<_>>(), quantities);
        assert_eq!(queries.round_trips(), 1);
    }

    let empty = order_without_lines(&db, &user).await;
    let graph = db
        .order_queries()
        .search_detailed(&empty.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(graph.line_items, Some(vec![]));
    assert_eq!(graph.member.id, user.id);
}

#[tokio::test]
async fn detailed_is_not_truncated_by_result_cap() {
    let db = open(QueryPolicy::default().max_results(3)).await;
    let user = member(&db, "userA", "Seoul").await;
    let order = order_with_lines(&db, &user, &[1, 2, 3, 4, 5]).await;

    let detailed = db
        .order_queries()
        .search_detailed(&order.id)
        .await
        .unwrap()
        .unwrap();
    let detailed_lines = detailed.line_items.unwrap();
    assert_eq!(detailed_lines.len(), 5);

    let page = db
        .order_queries()
        .search_page(&OrderSearch::new(), 0, 1)
        .await
        .unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].line_items.as_ref(), Some(&detailed_lines));
}

#[tokio::test]
async fn detailed_unknown_order_is_none() {
    let db = open(QueryPolicy::default()).await;
    let found = db.order_queries().search_detailed("no-such-order").await.unwrap();
    assert!(found.is_none());
}

// =============================================================================
// Cancellation
// =============================================================================

#[tokio::test]
async fn cancel_after_delivery_fails_and_keeps_status() {
    let db = open(QueryPolicy::default()).await;
    let user = member(&db, "userA", "Seoul").await;
    let order = order_with_lines(&db, &user, &[2]).await;

    db.orders()
        .update_shipment_status(&order.id, ShipmentStatus::Complete)
        .await
        .unwrap();

    let err = db.orders().cancel_order(&order.id).await.unwrap_err();
    assert!(matches!(
        err,
        DbError::Domain(CoreError::InconsistentCancellation { .. })
    ));

    let graph = db
        .order_queries()
        .search_detailed(&order.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(graph.order.status, OrderStatus::Placed);
    assert_eq!(graph.shipment.status, ShipmentStatus::Complete);
}

#[tokio::test]
async fn cancel_restores_stock_for_every_line() {
    let db = open(QueryPolicy::default()).await;
    let user = member(&db, "userA", "Seoul").await;
    let order = order_with_lines(&db, &user, &[1, 2, 3]).await;

    let graph = db
        .order_queries()
        .search_detailed(&order.id)
        .await
        .unwrap()
        .unwrap();
    let lines = graph.line_items.unwrap();
    for line in &lines {
        let item = db.items().get_by_id(&line.item_id).await.unwrap().unwrap();
        assert_eq!(item.stock_quantity, 1_000 - line.quantity);
    }

    let cancelled = db.orders().cancel_order(&order.id).await.unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);

    for line in &lines {
        let item = db.items().get_by_id(&line.item_id).await.unwrap().unwrap();
        assert_eq!(item.stock_quantity, 1_000);
    }
}

// =============================================================================
// End to End
// =============================================================================

#[tokio::test]
async fn two_members_two_orders() {
    let db = open(QueryPolicy::default()).await;
    let user_a = member(&db, "userA", "Seoul").await;
    let user_b = member(&db, "userB", "Busan").await;

    let jpa1 = book(&db, "JPA1 BOOK", 10_000).await;
    let jpa2 = book(&db, "JPA2 BOOK", 20_000).await;
    let spring1 = book(&db, "SPRING1 BOOK", 20_000).await;
    let spring2 = book(&db, "SPRING2 BOOK", 40_000).await;

    let order_a = db
        .orders()
        .place_order(
            &user_a.id,
            &[OrderLine::new(&jpa1.id, 1), OrderLine::new(&jpa2.id, 2)],
        )
        .await
        .unwrap();
    let order_b = db
        .orders()
        .place_order(
            &user_b.id,
            &[OrderLine::new(&spring1.id, 3), OrderLine::new(&spring2.id, 4)],
        )
        .await
        .unwrap();

    let queries = db.order_queries();
    let only_b = queries
        .search(&OrderSearch::new().with_member_name("B"))
        .await
        .unwrap();
    assert_eq!(ids(&only_b), vec![order_b.id.clone()]);

    let rows = queries.search_projected(&OrderSearch::new()).await.unwrap();
    assert_eq!(rows.len(), 2);

    let row_ids: HashSet<&str> = rows.iter().map(|r| r.order_id.as_str()).collect();
    assert_eq!(row_ids, HashSet::from([order_a.id.as_str(), order_b.id.as_str()]));

    for row in &rows {
        let json = serde_json::to_value(row).unwrap();
        let fields = json.as_object().unwrap();
        assert_eq!(fields.len(), 5);
        for key in ["orderId", "memberName", "orderedAt", "status"] {
            assert!(fields[key].is_string(), "{key} should be a plain value");
        }
        assert_eq!(fields["status"], "PLACED");

        let address = fields["address"].as_object().unwrap();
        assert_eq!(address.len(), 3);
        assert!(address.values().all(|v| v.is_string() && v != ""));
    }

    let row_a = rows.iter().find(|r| r.order_id == order_a.id).unwrap();
    assert_eq!(row_a.member_name, "userA");
    assert_eq!(row_a.address.city, "Seoul");
}
