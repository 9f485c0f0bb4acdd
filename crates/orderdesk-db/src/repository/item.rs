//! # Item Repository
//!
//! Catalogue items and their stock levels.
//!
//! ## Stock Updates
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  ❌ Absolute:  UPDATE items SET stock_quantity = 7                  │
//! │  ✅ Delta:     UPDATE items SET stock_quantity = stock_quantity - 3 │
//! │                                                                     │
//! │  Order placement and cancellation only ever apply deltas, so two    │
//! │  concurrent orders for the same item both land.                     │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use orderdesk_core::validation::{validate_name, validate_price_cents, validate_stock_quantity};
use orderdesk_core::{CoreError, Item};

const ITEM_COLUMNS: &str = "id, name, price_cents, stock_quantity";

/// Repository for item database operations.
#[derive(Debug, Clone)]
pub struct ItemRepository {
    pool: SqlitePool,
}

impl ItemRepository {
    /// Creates a new ItemRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ItemRepository { pool }
    }

    /// Inserts a new item.
    ///
    /// ## Returns
    /// * `Ok(Item)` - Inserted item
    /// * `Err(DbError::Domain(..))` - Blank name, negative price or stock
    pub async fn insert(&self, item: &Item) -> DbResult<Item> {
        check_fields(&item.name, item.price_cents, item.stock_quantity)?;

        let item = Item {
            name: item.name.trim().to_string(),
            ..item.clone()
        };
        debug!(id = %item.id, name = %item.name, "Inserting item");

        sqlx::query(
            r#"
            INSERT INTO items (id, name, price_cents, stock_quantity)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&item.id)
        .bind(&item.name)
        .bind(item.price_cents)
        .bind(item.stock_quantity)
        .execute(&self.pool)
        .await?;

        Ok(item)
    }

    /// Gets an item by its id.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Item>> {
        let item = sqlx::query_as::<_, Item>(&format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    /// Lists all items by name.
    pub async fn find_all(&self) -> DbResult<Vec<Item>> {
        let items = sqlx::query_as::<_, Item>(&format!(
            "SELECT {ITEM_COLUMNS} FROM items ORDER BY name, id"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Overwrites an item's name, price and stock.
    ///
    /// ## Returns
    /// * `Ok(Item)` - The updated item
    /// * `Err(DbError::NotFound)` - Item doesn't exist
    pub async fn update_item(
        &self,
        id: &str,
        name: &str,
        price_cents: i64,
        stock_quantity: i64,
    ) -> DbResult<Item> {
        check_fields(name, price_cents, stock_quantity)?;

        debug!(id = %id, name = %name, price_cents, stock_quantity, "Updating item");

        let result = sqlx::query(
            r#"
            UPDATE items SET
                name = ?2,
                price_cents = ?3,
                stock_quantity = ?4
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(name.trim())
        .bind(price_cents)
        .bind(stock_quantity)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Item", id));
        }

        Ok(Item {
            id: id.to_string(),
            name: name.trim().to_string(),
            price_cents,
            stock_quantity,
        })
    }

    /// Counts items (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

fn check_fields(name: &str, price_cents: i64, stock_quantity: i64) -> Result<(), CoreError> {
    validate_name("name", name)?;
    validate_price_cents(price_cents)?;
    validate_stock_quantity(stock_quantity)?;
    Ok(())
}

/// Loads an item inside an open transaction.
pub(crate) async fn fetch_item(conn: &mut SqliteConnection, id: &str) -> DbResult<Item> {
    sqlx::query_as::<_, Item>(&format!(
        "SELECT {ITEM_COLUMNS} FROM items WHERE id = ?1"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| DbError::not_found("Item", id))
}

/// Applies a stock delta inside an open transaction.
///
/// Negative deltas only apply when enough stock is left; the caller checks
/// the domain rule first, the `WHERE` guard catches a concurrent writer.
pub(crate) async fn apply_stock_delta(
    conn: &mut SqliteConnection,
    id: &str,
    delta: i64,
) -> DbResult<()> {
    debug!(id = %id, delta, "Updating stock");

    let result = sqlx::query(
        r#"
        UPDATE items
        SET stock_quantity = stock_quantity + ?2
        WHERE id = ?1 AND stock_quantity + ?2 >= 0
        "#,
    )
    .bind(id)
    .bind(delta)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        let item = fetch_item(conn, id).await?;
        return Err(CoreError::NotEnoughStock {
            item: item.name,
            available: item.stock_quantity,
            requested: -delta,
        }
        .into());
    }

    Ok(())
}
