//! # Order Repository
//!
//! The write path for orders: placement, cancellation and shipment progress.
//! Reads with filters, joins and paging live in [`crate::query`].
//!
//! ## Order Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Order Lifecycle                                 │
//! │                                                                         │
//! │  place_order(member, lines)          one transaction                   │
//! │  ├── remove stock per line           (NotEnoughStock → rollback)       │
//! │  ├── shipment READY @ member address                                   │
//! │  └── order PLACED + line items                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────┐   cancel_order()    ┌───────────┐                         │
//! │  │ PLACED  │ ──────────────────► │ CANCELLED │   (terminal)            │
//! │  └─────────┘                     └───────────┘                         │
//! │       │         shipment COMPLETE?                                      │
//! │       └──────── yes ──► InconsistentCancellation, nothing written       │
//! │                                                                         │
//! │  Cancellation restores every line's quantity to its item's stock       │
//! │  in the same transaction as the status change.                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::item::{apply_stock_delta, fetch_item};
use orderdesk_core::validation::validate_quantity;
use orderdesk_core::{
    CoreError, LineItem, Member, Order, OrderLine, OrderStatus, Shipment, ShipmentStatus,
    ValidationError,
};

const ORDER_COLUMNS: &str = "id, member_id, shipment_id, ordered_at, status";

/// Repository for order writes.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Gets an order row by id (no associations).
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    /// Line items of one order, by position.
    pub async fn get_line_items(&self, order_id: &str) -> DbResult<Vec<LineItem>> {
        let mut conn = self.pool.acquire().await?;
        fetch_line_items(&mut conn, order_id).await
    }

    /// Places an order for `member_id`.
    ///
    /// ## What This Does
    /// 1. Checks every line quantity
    /// 2. Loads the member (`NotFound` when missing)
    /// 3. Takes stock for each line at the item's current price
    /// 4. Creates a `READY` shipment to the member's address
    /// 5. Inserts the `PLACED` order and its line items
    ///
    /// All of it commits together or not at all.
    pub async fn place_order(&self, member_id: &str, lines: &[OrderLine]) -> DbResult<Order> {
        if lines.is_empty() {
            return Err(CoreError::from(ValidationError::Required {
                field: "lines".to_string(),
            })
            .into());
        }
        for line in lines {
            validate_quantity(line.quantity).map_err(CoreError::from)?;
        }

        let mut tx = self.pool.begin().await?;

        let member = sqlx::query_as::<_, Member>(
            "SELECT id, name, city, street, zipcode FROM members WHERE id = ?1",
        )
        .bind(member_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("Member", member_id))?;

        let shipment = Shipment::ready(member.address.clone());
        let order = Order::place(&member.id, &shipment.id);

        let mut line_items = Vec::with_capacity(lines.len());
        for (position, line) in lines.iter().enumerate() {
            let mut item = fetch_item(&mut tx, &line.item_id).await?;
            item.remove_stock(line.quantity)?;
            apply_stock_delta(&mut tx, &item.id, -line.quantity).await?;

            line_items.push(LineItem::new(
                &order.id,
                &item,
                line.quantity,
                position as i64,
            ));
        }

        sqlx::query(
            r#"
            INSERT INTO shipments (id, city, street, zipcode, status)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&shipment.id)
        .bind(&shipment.address.city)
        .bind(&shipment.address.street)
        .bind(&shipment.address.zipcode)
        .bind(shipment.status)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO orders (id, member_id, shipment_id, ordered_at, status)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&order.id)
        .bind(&order.member_id)
        .bind(&order.shipment_id)
        .bind(order.ordered_at)
        .bind(order.status)
        .execute(&mut *tx)
        .await?;

        for line in &line_items {
            sqlx::query(
                r#"
                INSERT INTO order_items (
                    id, order_id, item_id, item_name,
                    unit_price_cents, quantity, position
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(&line.id)
            .bind(&line.order_id)
            .bind(&line.item_id)
            .bind(&line.item_name)
            .bind(line.unit_price_cents)
            .bind(line.quantity)
            .bind(line.position)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            order_id = %order.id,
            member_id = %order.member_id,
            lines = line_items.len(),
            "Order placed"
        );
        Ok(order)
    }

    /// Cancels an order and puts its stock back.
    ///
    /// ## Returns
    /// * `Ok(Order)` - The order, now `CANCELLED`
    /// * `Err(DbError::NotFound)` - No such order
    /// * `Err(DbError::Domain(CoreError::InconsistentCancellation))` - Shipment is `COMPLETE`
    /// * `Err(DbError::Domain(CoreError::InvalidOrderStatus))` - Already cancelled
    ///
    /// Nothing is written when an error is returned.
    pub async fn cancel_order(&self, order_id: &str) -> DbResult<Order> {
        let mut tx = self.pool.begin().await?;

        let mut order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1"
        ))
        .bind(order_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("Order", order_id))?;

        let shipment = sqlx::query_as::<_, Shipment>(
            "SELECT id, city, street, zipcode, status FROM shipments WHERE id = ?1",
        )
        .bind(&order.shipment_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("Shipment", &order.shipment_id))?;

        order.cancel(&shipment)?;

        sqlx::query("UPDATE orders SET status = ?2 WHERE id = ?1")
            .bind(&order.id)
            .bind(order.status)
            .execute(&mut *tx)
            .await?;

        let line_items = fetch_line_items(&mut tx, &order.id).await?;
        for line in &line_items {
            let mut item = fetch_item(&mut tx, &line.item_id).await?;
            line.cancel(&mut item);
            apply_stock_delta(&mut tx, &item.id, line.quantity).await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            order_id = %order.id,
            restored_lines = line_items.len(),
            "Order cancelled"
        );
        Ok(order)
    }

    /// Moves the shipment of `order_id` to `status`.
    pub async fn update_shipment_status(
        &self,
        order_id: &str,
        status: ShipmentStatus,
    ) -> DbResult<()> {
        debug!(order_id = %order_id, status = ?status, "Updating shipment status");

        let result = sqlx::query(
            r#"
            UPDATE shipments SET status = ?2
            WHERE id = (SELECT shipment_id FROM orders WHERE id = ?1)
            "#,
        )
        .bind(order_id)
        .bind(status)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order", order_id));
        }

        Ok(())
    }

    /// Counts orders with the given status (for diagnostics).
    pub async fn count_by_status(&self, status: OrderStatus) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE status = ?1")
            .bind(status)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

async fn fetch_line_items(conn: &mut SqliteConnection, order_id: &str) -> DbResult<Vec<LineItem>> {
    let lines = sqlx::query_as::<_, LineItem>(
        r#"
        SELECT id, order_id, item_id, item_name, unit_price_cents, quantity, position
        FROM order_items
        WHERE order_id = ?1
        ORDER BY position
        "#,
    )
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use orderdesk_core::{Address, Item};

    async fn setup() -> (Database, Member, Item, Item) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let member = db
            .members()
            .register("userA", Address::new("Seoul", "1", "1111"))
            .await
            .unwrap();
        let jpa1 = db.items().insert(&Item::new("JPA1", 10_000, 100)).await.unwrap();
        let jpa2 = db.items().insert(&Item::new("JPA2", 20_000, 100)).await.unwrap();
        (db, member, jpa1, jpa2)
    }

    async fn stock(db: &Database, id: &str) -> i64 {
        db.items().get_by_id(id).await.unwrap().unwrap().stock_quantity
    }

    #[tokio::test]
    async fn test_place_order() {
        let (db, member, jpa1, jpa2) = setup().await;

        let order = db
            .orders()
            .place_order(
                &member.id,
                &[OrderLine::new(&jpa1.id, 1), OrderLine::new(&jpa2.id, 2)],
            )
            .await
            .unwrap();

        assert_eq!(order.status, OrderStatus::Placed);
        assert_eq!(stock(&db, &jpa1.id).await, 99);
        assert_eq!(stock(&db, &jpa2.id).await, 98);

        let lines = db.orders().get_line_items(&order.id).await.unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].item_name, "JPA1");
        assert_eq!(lines[1].line_total().cents(), 40_000);
    }

    #[tokio::test]
    async fn test_not_enough_stock_rolls_back() {
        let (db, member, jpa1, jpa2) = setup().await;

        let err = db
            .orders()
            .place_order(
                &member.id,
                &[OrderLine::new(&jpa1.id, 5), OrderLine::new(&jpa2.id, 101)],
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DbError::Domain(CoreError::NotEnoughStock { requested: 101, .. })
        ));
        // First line's stock removal was rolled back too
        assert_eq!(stock(&db, &jpa1.id).await, 100);
        assert_eq!(db.orders().count_by_status(OrderStatus::Placed).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_place_order_rejects_bad_input() {
        let (db, member, jpa1, _) = setup().await;

        let err = db.orders().place_order(&member.id, &[]).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));

        let err = db
            .orders()
            .place_order(&member.id, &[OrderLine::new(&jpa1.id, 0)])
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));

        let err = db
            .orders()
            .place_order("ghost", &[OrderLine::new(&jpa1.id, 1)])
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_cancel_restores_stock() {
        let (db, member, jpa1, jpa2) = setup().await;
        let order = db
            .orders()
            .place_order(
                &member.id,
                &[OrderLine::new(&jpa1.id, 3), OrderLine::new(&jpa2.id, 4)],
            )
            .await
            .unwrap();

        let cancelled = db.orders().cancel_order(&order.id).await.unwrap();

        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert_eq!(stock(&db, &jpa1.id).await, 100);
        assert_eq!(stock(&db, &jpa2.id).await, 100);

        let err = db.orders().cancel_order(&order.id).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InvalidOrderStatus { .. })
        ));
        // A second cancel must not restore stock twice
        assert_eq!(stock(&db, &jpa1.id).await, 100);
    }

    #[tokio::test]
    async fn test_cancel_blocked_after_delivery() {
        let (db, member, jpa1, _) = setup().await;
        let order = db
            .orders()
            .place_order(&member.id, &[OrderLine::new(&jpa1.id, 2)])
            .await
            .unwrap();

        db.orders()
            .update_shipment_status(&order.id, ShipmentStatus::Complete)
            .await
            .unwrap();

        let err = db.orders().cancel_order(&order.id).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InconsistentCancellation { .. })
        ));

        let stored = db.orders().get_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Placed);
        assert_eq!(stock(&db, &jpa1.id).await, 98);
    }

    #[tokio::test]
    async fn test_update_shipment_status_missing_order() {
        let (db, ..) = setup().await;

        let err = db
            .orders()
            .update_shipment_status("missing", ShipmentStatus::InProgress)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
