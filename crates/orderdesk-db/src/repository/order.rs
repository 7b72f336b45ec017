//! # Order Repository
//!
//! Orders, their lines, and the cart-to-order consolidation transaction.
//!
//! ## place_order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       SINGLE TRANSACTION                                │
//! │                                                                         │
//! │  1. UPDATE carts SET updated_at = ? WHERE key        (takes write lock) │
//! │     no row → CartNotFound                                               │
//! │  2. Load cart lines, build ConsolidationPlan (orderdesk-core)           │
//! │  3. Target order:                                                       │
//! │       merge_into given → must exist, same user+client, pending          │
//! │       else pending order for (user, client, customer)                   │
//! │       else INSERT new order, total 0                                    │
//! │  4. Per contribution: absorb into existing line or INSERT               │
//! │  5. recompute_total(order)          ← every line of the order           │
//! │  6. DELETE cart (lines cascade)     ← last                              │
//! │                                                                         │
//! │  COMMIT. Any failure rolls back everything; the cart stays intact.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A unique violation (order number collision, or a concurrent creator of
//! the pending order) aborts the attempt and the whole transaction is
//! retried.
//!
//! ## Total Invariant
//! Every path that changes lines ends in [`recompute_total`], so
//! `orders.total_amount_cents` always equals the sum of its lines.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::sqlite::{Sqlite, SqliteConnection};
use sqlx::{FromRow, QueryBuilder, SqlitePool};
use tracing::{debug, info, warn};

use super::cart::{fetch_lines, CartHeaderRow};
use super::{from_cents, from_milli, new_id, to_cents, to_milli};
use crate::error::{DbError, DbResult};
use orderdesk_core::consolidation::{generate_order_number, ConsolidationPlan, DEFAULT_ORDER_PREFIX};
use orderdesk_core::validation::validate_quantity;
use orderdesk_core::{
    CartKey, CoreError, Money, Order, OrderFilter, OrderLine, OrderStatus, PageInfo, PageRequest,
};

/// Tuning for `place_order`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceOrderOptions {
    /// Prefix of generated order numbers.
    pub order_prefix: String,
    /// Total attempts when a unique constraint rejects an attempt.
    pub max_attempts: u32,
}

impl Default for PlaceOrderOptions {
    fn default() -> Self {
        PlaceOrderOptions {
            order_prefix: DEFAULT_ORDER_PREFIX.to_string(),
            max_attempts: 3,
        }
    }
}

/// A page of orders.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderPage {
    pub orders: Vec<Order>,
    pub page: PageInfo,
}

/// Repository for orders.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

// =============================================================================
// Rows
// =============================================================================

const ORDER_COLUMNS: &str = r#"
    id, order_number, customer_name, customer_phone, customer_address,
    total_amount_cents, status, user_id, client_id, created_at, updated_at
"#;

const LINE_COLUMNS: &str = r#"
    id, order_id, product_code, product_name,
    quantity_milli, unit_price_cents, discount_pct_bps, total_price_cents
"#;

#[derive(Debug, FromRow)]
struct OrderRow {
    id: String,
    order_number: String,
    customer_name: String,
    customer_phone: Option<String>,
    customer_address: Option<String>,
    total_amount_cents: i64,
    status: OrderStatus,
    user_id: String,
    client_id: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, lines: Vec<OrderLine>) -> Order {
        Order {
            id: self.id,
            order_number: self.order_number,
            customer_name: self.customer_name,
            customer_phone: self.customer_phone,
            customer_address: self.customer_address,
            total_amount: from_cents(self.total_amount_cents),
            status: self.status,
            created_at: self.created_at,
            updated_at: self.updated_at,
            user_id: self.user_id,
            client_id: self.client_id,
            lines,
        }
    }
}

#[derive(Debug, FromRow)]
struct OrderLineRow {
    id: String,
    order_id: String,
    product_code: String,
    product_name: String,
    quantity_milli: i64,
    unit_price_cents: i64,
    discount_pct_bps: i64,
    total_price_cents: i64,
}

impl From<OrderLineRow> for OrderLine {
    fn from(row: OrderLineRow) -> Self {
        OrderLine {
            id: row.id,
            order_id: row.order_id,
            product_code: row.product_code,
            product_name: row.product_name,
            quantity: from_milli(row.quantity_milli),
            unit_price: from_cents(row.unit_price_cents),
            discount_pct: from_cents(row.discount_pct_bps),
            total_price: from_cents(row.total_price_cents),
        }
    }
}

#[derive(Debug, FromRow)]
struct MergeTargetRow {
    id: String,
    status: OrderStatus,
    user_id: String,
    client_id: String,
}

// =============================================================================
// Shared Helpers
// =============================================================================

/// Recomputes and stores `total_amount` from every line of the order.
///
/// The single place the order total is written.
async fn recompute_total(
    conn: &mut SqliteConnection,
    order_id: &str,
    now: DateTime<Utc>,
) -> DbResult<Money> {
    let cents: Option<i64> = sqlx::query_scalar(
        r#"
        UPDATE orders SET
            total_amount_cents = (
                SELECT COALESCE(SUM(total_price_cents), 0)
                FROM order_lines
                WHERE order_id = ?1
            ),
            updated_at = ?2
        WHERE id = ?1
        RETURNING total_amount_cents
        "#,
    )
    .bind(order_id)
    .bind(now)
    .fetch_optional(&mut *conn)
    .await?;

    let total = cents
        .map(from_cents)
        .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))?;

    debug!(order_id = %order_id, total = %total, "Order total recomputed");
    Ok(total)
}

async fn fetch_order(conn: &mut SqliteConnection, order_id: &str) -> DbResult<Order> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1");
    let row = sqlx::query_as::<_, OrderRow>(&sql)
        .bind(order_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))?;

    let sql = format!("SELECT {LINE_COLUMNS} FROM order_lines WHERE order_id = ?1 ORDER BY rowid");
    let lines = sqlx::query_as::<_, OrderLineRow>(&sql)
        .bind(order_id)
        .fetch_all(&mut *conn)
        .await?;

    Ok(row.into_order(lines.into_iter().map(OrderLine::from).collect()))
}

/// Appends the WHERE clause for a filter. Every condition is ANDed.
fn push_filters(qb: &mut QueryBuilder<'_, Sqlite>, filter: &OrderFilter) {
    qb.push(" WHERE 1 = 1");

    if let Some(client_id) = &filter.client_id {
        qb.push(" AND client_id = ").push_bind(client_id.clone());
    }
    if let Some(user_id) = &filter.user_id {
        qb.push(" AND user_id = ").push_bind(user_id.clone());
    }
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status.as_str());
    }
    // updated_at is RFC 3339 text in UTC; its first 10 chars are the date
    if let Some(from) = filter.from_date {
        qb.push(" AND substr(updated_at, 1, 10) >= ")
            .push_bind(from.format("%Y-%m-%d").to_string());
    }
    if let Some(to) = filter.to_date {
        qb.push(" AND substr(updated_at, 1, 10) <= ")
            .push_bind(to.format("%Y-%m-%d").to_string());
    }
    if let Some(order_id) = &filter.order_id {
        qb.push(" AND id = ").push_bind(order_id.clone());
    }
}

// =============================================================================
// Repository
// =============================================================================

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Converts the cart for `key` into order lines.
    ///
    /// ## Arguments
    /// * `discount_percent` - Clamped to 0–100 and recorded on every line
    /// * `merge_into` - Explicit pending order to merge into
    ///
    /// ## Errors
    /// * `CartNotFound` - No cart for the key
    /// * `InvalidMergeTarget` - Explicit target missing, foreign or not pending
    /// * `UniqueViolation` - Still conflicting after `max_attempts`
    pub async fn place_order(
        &self,
        key: &CartKey,
        discount_percent: Money,
        merge_into: Option<&str>,
        options: &PlaceOrderOptions,
    ) -> DbResult<Order> {
        let attempts = options.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self
                .place_order_once(key, discount_percent, merge_into, &options.order_prefix)
                .await
            {
                Err(e) if e.is_unique_violation() && attempt < attempts => {
                    warn!(
                        cart = %key,
                        attempt = attempt,
                        error = %e,
                        "place_order conflicted, retrying"
                    );
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    async fn place_order_once(
        &self,
        key: &CartKey,
        discount_percent: Money,
        merge_into: Option<&str>,
        order_prefix: &str,
    ) -> DbResult<Order> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        // 1. Lock the cart by writing to it first
        let cart = sqlx::query_as::<_, CartHeaderRow>(
            r#"
            UPDATE carts SET updated_at = ?1
            WHERE customer_name = ?2 AND user_id = ?3 AND client_id = ?4
            RETURNING id, customer_name, customer_phone, customer_address, user_id, client_id
            "#,
        )
        .bind(now)
        .bind(&key.customer_name)
        .bind(&key.user_id)
        .bind(&key.client_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| CoreError::CartNotFound {
            customer_name: key.customer_name.clone(),
        })?;

        // 2. Plan
        let lines = fetch_lines(&mut tx, &cart.id).await?;
        let plan = ConsolidationPlan::from_cart_lines(&lines, discount_percent);

        // 3. Target order
        let (order_id, merged) = match merge_into {
            Some(target) => (explicit_target(&mut tx, key, target).await?, true),
            None => match pending_order_for(&mut tx, key).await? {
                Some(id) => (id, true),
                None => (create_order(&mut tx, &cart, order_prefix, now).await?, false),
            },
        };

        // 4. Lines
        for contribution in &plan.lines {
            let sql = format!(
                "SELECT {LINE_COLUMNS} FROM order_lines WHERE order_id = ?1 AND product_code = ?2"
            );
            let existing = sqlx::query_as::<_, OrderLineRow>(&sql)
                .bind(&order_id)
                .bind(&contribution.product_code)
                .fetch_optional(&mut *tx)
                .await?;

            match existing {
                Some(row) => {
                    let mut line = OrderLine::from(row);
                    line.absorb(contribution);

                    sqlx::query(
                        r#"
                        UPDATE order_lines SET
                            quantity_milli = ?2,
                            unit_price_cents = ?3,
                            discount_pct_bps = ?4,
                            total_price_cents = ?5
                        WHERE id = ?1
                        "#,
                    )
                    .bind(&line.id)
                    .bind(to_milli(line.quantity)?)
                    .bind(to_cents(line.unit_price)?)
                    .bind(to_cents(line.discount_pct)?)
                    .bind(to_cents(line.total_price)?)
                    .execute(&mut *tx)
                    .await?;
                }
                None => {
                    let line = OrderLine::from_contribution(new_id(), order_id.clone(), contribution);

                    sqlx::query(
                        r#"
                        INSERT INTO order_lines (
                            id, order_id, product_code, product_name,
                            quantity_milli, unit_price_cents, discount_pct_bps, total_price_cents,
                            created_at
                        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                        "#,
                    )
                    .bind(&line.id)
                    .bind(&line.order_id)
                    .bind(&line.product_code)
                    .bind(&line.product_name)
                    .bind(to_milli(line.quantity)?)
                    .bind(to_cents(line.unit_price)?)
                    .bind(to_cents(line.discount_pct)?)
                    .bind(to_cents(line.total_price)?)
                    .bind(now)
                    .execute(&mut *tx)
                    .await?;
                }
            }
        }

        // 5. Totals
        let total = recompute_total(&mut tx, &order_id, now).await?;

        // 6. Consume the cart
        sqlx::query("DELETE FROM carts WHERE id = ?1")
            .bind(&cart.id)
            .execute(&mut *tx)
            .await?;

        let order = fetch_order(&mut tx, &order_id).await?;
        tx.commit().await?;

        info!(
            order_id = %order.id,
            order_number = %order.order_number,
            merged = merged,
            lines = plan.lines.len(),
            discount_pct = %plan.discount.percent(),
            total = %total,
            "Order placed"
        );

        Ok(order)
    }

    /// Loads an order with its lines.
    pub async fn get(&self, order_id: &str) -> DbResult<Order> {
        let mut conn = self.pool.acquire().await?;
        fetch_order(&mut conn, order_id).await
    }

    /// Filtered, paginated listing, most recently updated first.
    pub async fn list(&self, filter: &OrderFilter, page: PageRequest) -> DbResult<OrderPage> {
        let mut conn = self.pool.acquire().await?;

        let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM orders");
        push_filters(&mut count_qb, filter);
        let total_count: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&mut *conn)
            .await?;

        let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {ORDER_COLUMNS} FROM orders"));
        push_filters(&mut qb, filter);
        qb.push(" ORDER BY updated_at DESC, rowid DESC LIMIT ")
            .push_bind(i64::from(page.per_page))
            .push(" OFFSET ")
            .push_bind(i64::try_from(page.offset()).unwrap_or(i64::MAX));

        let rows: Vec<OrderRow> = qb.build_query_as().fetch_all(&mut *conn).await?;

        let mut lines_by_order: HashMap<String, Vec<OrderLine>> = HashMap::new();

        if !rows.is_empty() {
            let mut lines_qb = QueryBuilder::<Sqlite>::new(format!(
                "SELECT {LINE_COLUMNS} FROM order_lines WHERE order_id IN ("
            ));
            let mut ids = lines_qb.separated(", ");
            for row in &rows {
                ids.push_bind(row.id.clone());
            }
            ids.push_unseparated(") ORDER BY rowid");

            let lines: Vec<OrderLineRow> = lines_qb.build_query_as().fetch_all(&mut *conn).await?;
            for line in lines {
                lines_by_order
                    .entry(line.order_id.clone())
                    .or_default()
                    .push(OrderLine::from(line));
            }
        }

        let orders = rows
            .into_iter()
            .map(|row| {
                let lines = lines_by_order.remove(&row.id).unwrap_or_default();
                row.into_order(lines)
            })
            .collect();

        Ok(OrderPage {
            orders,
            page: PageInfo::new(page, u64::try_from(total_count).unwrap_or(0)),
        })
    }

    /// Sets the status. Any status may follow any other.
    ///
    /// Re-opening to `pending` while another pending order exists for the
    /// same (user, client, customer) fails with `UniqueViolation`.
    pub async fn update_status(&self, order_id: &str, status: OrderStatus) -> DbResult<Order> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("UPDATE orders SET status = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(order_id)
            .bind(status)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await
            .map_err(|e| match DbError::from(e) {
                DbError::UniqueViolation { .. } => DbError::duplicate("pending order", order_id),
                other => other,
            })?;

        if result.rows_affected() == 0 {
            return Err(CoreError::OrderNotFound(order_id.to_string()).into());
        }

        let order = fetch_order(&mut tx, order_id).await?;
        tx.commit().await?;

        info!(order_id = %order_id, status = %status, "Order status updated");
        Ok(order)
    }

    /// Deletes an order and its lines.
    pub async fn delete(&self, order_id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM orders WHERE id = ?1")
            .bind(order_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::OrderNotFound(order_id.to_string()).into());
        }

        info!(order_id = %order_id, "Order deleted");
        Ok(())
    }

    /// Manual quantity edit on an order line. A quantity ≤ 0 deletes it.
    ///
    /// The new total is `unit_price × quantity` with no discount applied.
    pub async fn update_line_quantity(&self, line_id: &str, quantity: Money) -> DbResult<Order> {
        if !quantity.round_quantity().is_positive() {
            return self.delete_line(line_id).await;
        }
        validate_quantity(quantity)?;

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        let order_id = touch_owner(&mut tx, line_id, now).await?;

        let sql = format!("SELECT {LINE_COLUMNS} FROM order_lines WHERE id = ?1");
        let mut line = sqlx::query_as::<_, OrderLineRow>(&sql)
            .bind(line_id)
            .fetch_optional(&mut *tx)
            .await?
            .map(OrderLine::from)
            .ok_or_else(|| CoreError::OrderLineNotFound(line_id.to_string()))?;

        line.set_manual_quantity(quantity);

        sqlx::query(
            "UPDATE order_lines SET quantity_milli = ?2, total_price_cents = ?3 WHERE id = ?1",
        )
        .bind(line_id)
        .bind(to_milli(line.quantity)?)
        .bind(to_cents(line.total_price)?)
        .execute(&mut *tx)
        .await?;

        recompute_total(&mut tx, &order_id, now).await?;
        let order = fetch_order(&mut tx, &order_id).await?;
        tx.commit().await?;

        debug!(line_id = %line_id, quantity = %line.quantity, "Order line quantity set");
        Ok(order)
    }

    /// Deletes an order line and returns the updated order.
    pub async fn delete_line(&self, line_id: &str) -> DbResult<Order> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        let order_id = touch_owner(&mut tx, line_id, now).await?;

        sqlx::query("DELETE FROM order_lines WHERE id = ?1")
            .bind(line_id)
            .execute(&mut *tx)
            .await?;

        recompute_total(&mut tx, &order_id, now).await?;
        let order = fetch_order(&mut tx, &order_id).await?;
        tx.commit().await?;

        debug!(line_id = %line_id, order_id = %order_id, "Order line deleted");
        Ok(order)
    }
}

// =============================================================================
// Transaction Steps
// =============================================================================

/// Bumps the owning order of a line (taking the write lock) and returns its
/// id.
async fn touch_owner(
    conn: &mut SqliteConnection,
    line_id: &str,
    now: DateTime<Utc>,
) -> DbResult<String> {
    let order_id: Option<String> = sqlx::query_scalar(
        r#"
        UPDATE orders SET updated_at = ?2
        WHERE id = (SELECT order_id FROM order_lines WHERE id = ?1)
        RETURNING id
        "#,
    )
    .bind(line_id)
    .bind(now)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(order_id.ok_or_else(|| CoreError::OrderLineNotFound(line_id.to_string()))?)
}

async fn explicit_target(
    conn: &mut SqliteConnection,
    key: &CartKey,
    order_id: &str,
) -> DbResult<String> {
    let target = sqlx::query_as::<_, MergeTargetRow>(
        "SELECT id, status, user_id, client_id FROM orders WHERE id = ?1",
    )
    .bind(order_id)
    .fetch_optional(&mut *conn)
    .await?;

    let invalid = |reason: &str| CoreError::InvalidMergeTarget {
        order_id: order_id.to_string(),
        reason: reason.to_string(),
    };

    match target {
        // Foreign orders look the same as missing ones
        Some(t) if t.user_id != key.user_id || t.client_id != key.client_id => {
            Err(invalid("order does not exist").into())
        }
        None => Err(invalid("order does not exist").into()),
        Some(t) if t.status != OrderStatus::Pending => {
            Err(invalid(&format!("order is {}", t.status)).into())
        }
        Some(t) => Ok(t.id),
    }
}

async fn pending_order_for(conn: &mut SqliteConnection, key: &CartKey) -> DbResult<Option<String>> {
    let id: Option<String> = sqlx::query_scalar(
        r#"
        SELECT id FROM orders
        WHERE user_id = ?1 AND client_id = ?2 AND customer_name = ?3 AND status = 'pending'
        ORDER BY created_at
        LIMIT 1
        "#,
    )
    .bind(&key.user_id)
    .bind(&key.client_id)
    .bind(&key.customer_name)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(id)
}

async fn create_order(
    conn: &mut SqliteConnection,
    cart: &CartHeaderRow,
    order_prefix: &str,
    now: DateTime<Utc>,
) -> DbResult<String> {
    let id = new_id();
    let order_number = generate_order_number(order_prefix, now.date_naive());

    sqlx::query(
        r#"
        INSERT INTO orders (
            id, order_number, customer_name, customer_phone, customer_address,
            total_amount_cents, status, user_id, client_id, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6, ?7, ?8, ?9, ?9)
        "#,
    )
    .bind(&id)
    .bind(&order_number)
    .bind(&cart.customer_name)
    .bind(&cart.customer_phone)
    .bind(&cart.customer_address)
    .bind(OrderStatus::Pending)
    .bind(&cart.user_id)
    .bind(&cart.client_id)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    debug!(order_id = %id, order_number = %order_number, "Order created");
    Ok(id)
}

// =============================================================================
// Unit Tests
// =============================================================================
