//! # Cart Repository
//!
//! Persistent carts keyed by (customer_name, user_id, client_id).
//!
//! ## Add Item
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       SINGLE TRANSACTION                                │
//! │                                                                         │
//! │  1. INSERT INTO carts ... ON CONFLICT (key) DO UPDATE  RETURNING id     │
//! │     (get-or-create; first statement is a write, so the lock is held)    │
//! │                                                                         │
//! │  2. UPDATE cart_lines SET                                               │
//! │        quantity_milli = quantity_milli + ?,    ← increment in place     │
//! │        unit_price_cents = ?                    ← latest price wins      │
//! │     WHERE cart_id = ? AND product_code = ?                              │
//! │                                                                         │
//! │  3a. no row updated, quantity > 0  → INSERT new line                    │
//! │  3b. resulting quantity ≤ 0        → DELETE line, report Removed        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Absent Carts
//! Reading, removing from or clearing a cart that does not exist is not an
//! error: `get` returns [`Cart::empty`] and removals report `false`.

use chrono::Utc;
use sqlx::sqlite::SqliteConnection;
use sqlx::{FromRow, SqlitePool};
use tracing::{debug, info};

use super::{from_cents, from_milli, new_id, to_cents, to_milli};
use crate::error::DbResult;
use orderdesk_core::validation::{validate_quantity, validate_unit_price};
use orderdesk_core::{Cart, CartItemOutcome, CartKey, CartLine, CoreError, CustomerContact, Money};

/// A line to merge into a cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCartLine {
    pub product_code: String,
    pub product_name: String,
    /// Added to any existing quantity; may be negative.
    pub quantity: Money,
    pub unit_price: Money,
}

/// Repository for carts and cart lines.
#[derive(Debug, Clone)]
pub struct CartRepository {
    pool: SqlitePool,
}

#[derive(Debug, FromRow)]
pub(crate) struct CartHeaderRow {
    pub id: String,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub customer_address: Option<String>,
    pub user_id: String,
    pub client_id: String,
}

impl CartHeaderRow {
    fn into_cart(self, lines: Vec<CartLine>) -> Cart {
        Cart {
            id: Some(self.id),
            customer_name: self.customer_name,
            customer_phone: self.customer_phone,
            customer_address: self.customer_address,
            user_id: self.user_id,
            client_id: self.client_id,
            lines,
        }
    }
}

#[derive(Debug, FromRow)]
struct CartLineRow {
    id: String,
    cart_id: String,
    product_code: String,
    product_name: String,
    quantity_milli: i64,
    unit_price_cents: i64,
}

impl From<CartLineRow> for CartLine {
    fn from(row: CartLineRow) -> Self {
        CartLine {
            id: row.id,
            cart_id: row.cart_id,
            product_code: row.product_code,
            product_name: row.product_name,
            quantity: from_milli(row.quantity_milli),
            unit_price: from_cents(row.unit_price_cents),
        }
    }
}

/// Lines of a cart in insertion order.
pub(crate) async fn fetch_lines(
    conn: &mut SqliteConnection,
    cart_id: &str,
) -> DbResult<Vec<CartLine>> {
    let rows = sqlx::query_as::<_, CartLineRow>(
        r#"
        SELECT id, cart_id, product_code, product_name, quantity_milli, unit_price_cents
        FROM cart_lines
        WHERE cart_id = ?1
        ORDER BY rowid
        "#,
    )
    .bind(cart_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows.into_iter().map(CartLine::from).collect())
}

impl CartRepository {
    /// Creates a new CartRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CartRepository { pool }
    }

    /// Adds a quantity of a product to the cart, creating the cart on first
    /// use.
    ///
    /// `contact` is only recorded when the cart is created. The delta, the
    /// unit price and the resulting quantity must stay within the amount
    /// limits of `orderdesk_core::validation`; otherwise nothing is written.
    pub async fn add_item(
        &self,
        key: &CartKey,
        contact: &CustomerContact,
        item: &NewCartLine,
    ) -> DbResult<CartItemOutcome> {
        let now = Utc::now();
        let delta_milli = to_milli(validate_quantity(item.quantity)?)?;
        let unit_price_cents = to_cents(validate_unit_price(item.unit_price)?)?;

        let mut tx = self.pool.begin().await?;

        let cart_id: String = sqlx::query_scalar(
            r#"
            INSERT INTO carts (
                id, customer_name, customer_phone, customer_address,
                user_id, client_id, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
            ON CONFLICT (customer_name, user_id, client_id) DO UPDATE SET
                updated_at = excluded.updated_at
            RETURNING id
            "#,
        )
        .bind(new_id())
        .bind(&key.customer_name)
        .bind(&contact.phone)
        .bind(&contact.address)
        .bind(&key.user_id)
        .bind(&key.client_id)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        let updated = sqlx::query_as::<_, CartLineRow>(
            r#"
            UPDATE cart_lines SET
                quantity_milli = quantity_milli + ?1,
                unit_price_cents = ?2
            WHERE cart_id = ?3 AND product_code = ?4
            RETURNING id, cart_id, product_code, product_name, quantity_milli, unit_price_cents
            "#,
        )
        .bind(delta_milli)
        .bind(unit_price_cents)
        .bind(&cart_id)
        .bind(&item.product_code)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(row) = &updated {
            validate_quantity(from_milli(row.quantity_milli))?;
        }

        let outcome = match updated {
            Some(row) if row.quantity_milli <= 0 => {
                sqlx::query("DELETE FROM cart_lines WHERE id = ?1")
                    .bind(&row.id)
                    .execute(&mut *tx)
                    .await?;

                CartItemOutcome::Removed {
                    cart_id: cart_id.clone(),
                    product_code: row.product_code,
                }
            }
            Some(row) => CartItemOutcome::Saved {
                cart_id: cart_id.clone(),
                line: row.into(),
            },
            None if delta_milli <= 0 => CartItemOutcome::Removed {
                cart_id: cart_id.clone(),
                product_code: item.product_code.clone(),
            },
            None => {
                let row = sqlx::query_as::<_, CartLineRow>(
                    r#"
                    INSERT INTO cart_lines (
                        id, cart_id, product_code, product_name,
                        quantity_milli, unit_price_cents, created_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                    RETURNING id, cart_id, product_code, product_name, quantity_milli, unit_price_cents
                    "#,
                )
                .bind(new_id())
                .bind(&cart_id)
                .bind(&item.product_code)
                .bind(&item.product_name)
                .bind(delta_milli)
                .bind(unit_price_cents)
                .bind(now)
                .fetch_one(&mut *tx)
                .await?;

                CartItemOutcome::Saved {
                    cart_id: cart_id.clone(),
                    line: row.into(),
                }
            }
        };

        tx.commit().await?;

        debug!(
            cart_id = %cart_id,
            product_code = %item.product_code,
            delta_milli = delta_milli,
            "Cart item merged"
        );

        Ok(outcome)
    }

    /// Loads the cart for a key, or the synthetic empty cart.
    pub async fn get(&self, key: &CartKey) -> DbResult<Cart> {
        let mut conn = self.pool.acquire().await?;

        let header = sqlx::query_as::<_, CartHeaderRow>(
            r#"
            SELECT id, customer_name, customer_phone, customer_address, user_id, client_id
            FROM carts
            WHERE customer_name = ?1 AND user_id = ?2 AND client_id = ?3
            "#,
        )
        .bind(&key.customer_name)
        .bind(&key.user_id)
        .bind(&key.client_id)
        .fetch_optional(&mut *conn)
        .await?;

        match header {
            Some(header) => {
                let lines = fetch_lines(&mut conn, &header.id).await?;
                Ok(header.into_cart(lines))
            }
            None => Ok(Cart::empty(key)),
        }
    }

    /// Replaces a line's quantity. A quantity ≤ 0 deletes the line.
    ///
    /// Fails with `CartLineNotFound` for an unknown line id.
    pub async fn update_line_quantity(
        &self,
        line_id: &str,
        quantity: Money,
    ) -> DbResult<CartItemOutcome> {
        let quantity_milli = to_milli(validate_quantity(quantity)?)?;

        let row = if quantity_milli <= 0 {
            sqlx::query_as::<_, CartLineRow>(
                r#"
                DELETE FROM cart_lines
                WHERE id = ?1
                RETURNING id, cart_id, product_code, product_name, quantity_milli, unit_price_cents
                "#,
            )
            .bind(line_id)
            .fetch_optional(&self.pool)
            .await?
        } else {
            sqlx::query_as::<_, CartLineRow>(
                r#"
                UPDATE cart_lines SET quantity_milli = ?2
                WHERE id = ?1
                RETURNING id, cart_id, product_code, product_name, quantity_milli, unit_price_cents
                "#,
            )
            .bind(line_id)
            .bind(quantity_milli)
            .fetch_optional(&self.pool)
            .await?
        };

        let row = row.ok_or_else(|| CoreError::CartLineNotFound(line_id.to_string()))?;

        debug!(line_id = %line_id, quantity_milli = quantity_milli, "Cart line quantity set");

        Ok(if quantity_milli <= 0 {
            CartItemOutcome::Removed {
                cart_id: row.cart_id,
                product_code: row.product_code,
            }
        } else {
            CartItemOutcome::Saved {
                cart_id: row.cart_id.clone(),
                line: row.into(),
            }
        })
    }

    /// Removes every line for a product code. Returns whether anything was
    /// deleted; an absent cart or line is not an error.
    pub async fn remove_line(&self, key: &CartKey, product_code: &str) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM cart_lines
            WHERE product_code = ?1
              AND cart_id IN (
                  SELECT id FROM carts
                  WHERE customer_name = ?2 AND user_id = ?3 AND client_id = ?4
              )
            "#,
        )
        .bind(product_code)
        .bind(&key.customer_name)
        .bind(&key.user_id)
        .bind(&key.client_id)
        .execute(&self.pool)
        .await?;

        debug!(
            cart = %key,
            product_code = %product_code,
            removed = result.rows_affected(),
            "Cart line removal"
        );

        Ok(result.rows_affected() > 0)
    }

    /// Deletes the cart and its lines. Returns whether a cart existed.
    pub async fn clear(&self, key: &CartKey) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM carts
            WHERE customer_name = ?1 AND user_id = ?2 AND client_id = ?3
            "#,
        )
        .bind(&key.customer_name)
        .bind(&key.user_id)
        .bind(&key.client_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            info!(cart = %key, "Cart cleared");
        }

        Ok(result.rows_affected() > 0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::pool::{Database, DbConfig};

    fn m(s: &str) -> Money {
        Money::parse(s).unwrap()
    }

    fn key() -> CartKey {
        CartKey::new("Guest", "u1", "client-a")
    }

    fn item(code: &str, qty: &str, price: &str) -> NewCartLine {
        NewCartLine {
            product_code: code.to_string(),
            product_name: format!("Product {code}"),
            quantity: m(qty),
            unit_price: m(price),
        }
    }

    async fn setup() -> CartRepository {
        Database::new(DbConfig::in_memory()).await.unwrap().carts()
    }

    #[tokio::test]
    async fn test_add_merges_quantity_and_overwrites_price() {
        let carts = setup().await;
        let contact = CustomerContact::default();

        carts.add_item(&key(), &contact, &item("P", "2", "10.00")).await.unwrap();
        let outcome = carts.add_item(&key(), &contact, &item("P", "3", "12.50")).await.unwrap();

        let CartItemOutcome::Saved { line, .. } = outcome else {
            panic!("expected a saved line");
        };
        assert_eq!(line.quantity, m("5"));
        assert_eq!(line.unit_price, m("12.50"));

        let cart = carts.get(&key()).await.unwrap();
        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.total_amount(), m("62.50"));
    }

    #[tokio::test]
    async fn test_fractional_quantity() {
        let carts = setup().await;
        carts
            .add_item(&key(), &CustomerContact::default(), &item("P", "1.5", "3.00"))
            .await
            .unwrap();

        let cart = carts.get(&key()).await.unwrap();
        assert_eq!(cart.lines[0].quantity.to_string(), "1.500");
        assert_eq!(cart.lines[0].line_total(), m("4.50"));
    }

    #[tokio::test]
    async fn test_negative_delta_removes_line() {
        let carts = setup().await;
        let contact = CustomerContact::default();
        carts.add_item(&key(), &contact, &item("P", "2", "1")).await.unwrap();

        let outcome = carts.add_item(&key(), &contact, &item("P", "-2", "1")).await.unwrap();
        assert!(matches!(outcome, CartItemOutcome::Removed { .. }));
        assert!(carts.get(&key()).await.unwrap().lines.is_empty());

        // Nothing to remove and nothing created
        let outcome = carts.add_item(&key(), &contact, &item("Q", "0", "1")).await.unwrap();
        assert!(matches!(outcome, CartItemOutcome::Removed { .. }));
        assert!(carts.get(&key()).await.unwrap().lines.is_empty());
    }

    #[tokio::test]
    async fn test_contact_recorded_on_create_only() {
        let carts = setup().await;
        let first = CustomerContact {
            phone: Some("555-0100".to_string()),
            address: Some("1 Main St".to_string()),
        };
        let second = CustomerContact {
            phone: Some("555-0199".to_string()),
            address: None,
        };

        carts.add_item(&key(), &first, &item("P", "1", "1")).await.unwrap();
        carts.add_item(&key(), &second, &item("Q", "1", "1")).await.unwrap();

        let cart = carts.get(&key()).await.unwrap();
        assert_eq!(cart.customer_phone.as_deref(), Some("555-0100"));
        assert_eq!(cart.customer_address.as_deref(), Some("1 Main St"));
    }

    #[tokio::test]
    async fn test_missing_cart_is_empty_not_error() {
        let carts = setup().await;
        let cart = carts.get(&key()).await.unwrap();
        assert!(cart.id.is_none());
        assert_eq!(cart.customer_name, "Guest");
    }

    #[tokio::test]
    async fn test_update_line_quantity() {
        let carts = setup().await;
        let outcome = carts
            .add_item(&key(), &CustomerContact::default(), &item("P", "2", "1"))
            .await
            .unwrap();
        let CartItemOutcome::Saved { line, .. } = outcome else {
            panic!("expected a saved line");
        };

        let updated = carts.update_line_quantity(&line.id, m("7")).await.unwrap();
        assert!(matches!(updated, CartItemOutcome::Saved { ref line, .. } if line.quantity == m("7")));

        let removed = carts.update_line_quantity(&line.id, m("-1")).await.unwrap();
        assert!(matches!(removed, CartItemOutcome::Removed { .. }));
        assert!(carts.get(&key()).await.unwrap().lines.is_empty());

        let missing = carts.update_line_quantity(&line.id, m("1")).await;
        assert!(matches!(
            missing,
            Err(DbError::Domain(CoreError::CartLineNotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_remove_and_clear_are_idempotent() {
        let carts = setup().await;
        carts
            .add_item(&key(), &CustomerContact::default(), &item("P", "1", "1"))
            .await
            .unwrap();

        assert!(carts.remove_line(&key(), "P").await.unwrap());
        assert!(!carts.remove_line(&key(), "P").await.unwrap());

        assert!(carts.clear(&key()).await.unwrap());
        assert!(!carts.clear(&key()).await.unwrap());
        assert!(!carts.remove_line(&key(), "P").await.unwrap());
    }

    #[tokio::test]
    async fn test_carts_are_isolated_by_key() {
        let carts = setup().await;
        let contact = CustomerContact::default();
        let other = CartKey::new("Guest", "u2", "client-a");

        carts.add_item(&key(), &contact, &item("P", "1", "1")).await.unwrap();
        carts.add_item(&other, &contact, &item("P", "4", "1")).await.unwrap();

        assert_eq!(carts.get(&key()).await.unwrap().lines[0].quantity, m("1"));
        assert_eq!(carts.get(&other).await.unwrap().lines[0].quantity, m("4"));
    }

    #[tokio::test]
    async fn test_amounts_beyond_limits_are_rejected() {
        let carts = setup().await;
        let contact = CustomerContact::default();

        let result = carts
            .add_item(&key(), &contact, &item("P", "9000000000000", "90000000000000000"))
            .await;
        assert!(matches!(
            result,
            Err(DbError::Domain(CoreError::Validation(_)))
        ));

        // Nothing stored, so the cart still reads
        let cart = carts.get(&key()).await.unwrap();
        assert!(cart.lines.is_empty());

        // A merge that would push the quantity past the limit rolls back
        carts.add_item(&key(), &contact, &item("P", "1000000", "10.00")).await.unwrap();
        let result = carts.add_item(&key(), &contact, &item("P", "1", "99.00")).await;
        assert!(result.is_err());

        let cart = carts.get(&key()).await.unwrap();
        assert_eq!(cart.lines[0].quantity, m("1000000"));
        assert_eq!(cart.lines[0].unit_price, m("10.00"));
        assert_eq!(cart.total_amount(), m("10000000.00"));

        let line_id = cart.lines[0].id.clone();
        let result = carts.update_line_quantity(&line_id, m("1000001")).await;
        assert!(result.is_err());
    }
}

