//! # Domain Types
//!
//! Core domain types used throughout OrderDesk.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   owns   ┌─────────────────┐                       │
//! │  │      Cart       │ ───────► │    CartLine     │  unique per code      │
//! │  │  key: CartKey   │          │  quantity (3dp) │                       │
//! │  └────────┬────────┘          │  unit_price(2dp)│                       │
//! │           │ place_order       └─────────────────┘                       │
//! │           ▼                                                             │
//! │  ┌─────────────────┐   owns   ┌─────────────────┐                       │
//! │  │      Order      │ ───────► │    OrderLine    │  unique per code      │
//! │  │  total_amount   │          │  discount_pct   │                       │
//! │  │  status         │          │  total_price    │                       │
//! │  └─────────────────┘          └─────────────────┘                       │
//! │                                                                         │
//! │  total_amount == Σ total_price after every mutation                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Natural Keys
//! Carts have no session token: a cart is identified by
//! (customer_name, user_id, client_id), see [`CartKey`].

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::money::{Money, CURRENCY_SCALE};

// =============================================================================
// Cart Key
// =============================================================================

/// Composite natural key identifying a cart.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CartKey {
    pub customer_name: String,
    pub user_id: String,
    pub client_id: String,
}

impl CartKey {
    /// Creates a key, trimming surrounding whitespace from every part.
    pub fn new(
        customer_name: impl AsRef<str>,
        user_id: impl AsRef<str>,
        client_id: impl AsRef<str>,
    ) -> Self {
        CartKey {
            customer_name: customer_name.as_ref().trim().to_string(),
            user_id: user_id.as_ref().trim().to_string(),
            client_id: client_id.as_ref().trim().to_string(),
        }
    }
}

impl fmt::Display for CartKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.client_id, self.user_id, self.customer_name)
    }
}

/// Contact details recorded when a cart is first created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerContact {
    pub phone: Option<String>,
    pub address: Option<String>,
}

// =============================================================================
// Cart
// =============================================================================

/// A line in a cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: String,
    pub cart_id: String,
    pub product_code: String,
    pub product_name: String,
    /// Always > 0 while the line exists.
    pub quantity: Money,
    pub unit_price: Money,
}

impl CartLine {
    /// `round2(quantity × unit_price)`, undiscounted.
    pub fn line_total(&self) -> Money {
        (self.quantity * self.unit_price).quantize(CURRENCY_SCALE)
    }
}

/// A customer's cart.
///
/// `id` is `None` for the synthetic empty cart returned when nothing has been
/// added yet for a key. That is a valid state, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub id: Option<String>,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub customer_address: Option<String>,
    pub user_id: String,
    pub client_id: String,
    pub lines: Vec<CartLine>,
}

impl Cart {
    /// The synthetic empty cart for a key that has no stored cart.
    pub fn empty(key: &CartKey) -> Self {
        Cart {
            id: None,
            customer_name: key.customer_name.clone(),
            customer_phone: None,
            customer_address: None,
            user_id: key.user_id.clone(),
            client_id: key.client_id.clone(),
            lines: Vec::new(),
        }
    }

    /// Whether this cart is stored.
    pub fn exists(&self) -> bool {
        self.id.is_some()
    }

    /// Finds the line for a product code.
    pub fn line(&self, product_code: &str) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.product_code == product_code)
    }

    /// Sum of rounded line totals.
    pub fn total_amount(&self) -> Money {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    pub fn item_count(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Result of an add-to-cart call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CartItemOutcome {
    /// The line exists with the returned quantity and price.
    Saved { cart_id: String, line: CartLine },
    /// The resulting quantity was ≤ 0 so the line was deleted.
    Removed { cart_id: String, product_code: String },
}

// =============================================================================
// Order Status
// =============================================================================

/// The status of an order.
///
/// NOTE: this is a plain tag, not a guarded state machine. Any status may be
/// set from any other (a completed order can be re-opened). Transition rules
/// belong here if they are ever introduced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Open; the only status that accepts merged cart contents.
    #[default]
    Pending,
    /// Fulfilled.
    Completed,
    /// Abandoned or refused.
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 3] = [
        OrderStatus::Pending,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "pending" => Ok(OrderStatus::Pending),
            "completed" => Ok(OrderStatus::Completed),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(CoreError::InvalidStatus(other.to_string())),
        }
    }
}

// =============================================================================
// Order
// =============================================================================

/// A persisted order line.
///
/// `total_price` is authoritative. After merges at different discount
/// percentages it is the sum of each merge's discounted contribution, and
/// `discount_pct` only records the most recent merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: String,
    pub order_id: String,
    pub product_code: String,
    pub product_name: String,
    pub quantity: Money,
    pub unit_price: Money,
    /// Percentage 0–100 at 2 places.
    pub discount_pct: Money,
    pub total_price: Money,
}

impl OrderLine {
    /// Manual quantity edit.
    ///
    /// Recomputes `total_price = unit_price × quantity` with no discount
    /// factor, so a previously applied discount is dropped from the stored
    /// total. `discount_pct` is left as recorded.
    pub fn set_manual_quantity(&mut self, quantity: Money) {
        self.quantity = quantity.round_quantity();
        self.total_price = (self.unit_price * self.quantity).quantize(CURRENCY_SCALE);
    }
}

/// An order with its lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    /// Human-readable, e.g. `ORD-20260131-9F3A1C2B`.
    pub order_number: String,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub customer_address: Option<String>,
    pub total_amount: Money,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user_id: String,
    pub client_id: String,
    pub lines: Vec<OrderLine>,
}

impl Order {
    /// Sum of the current lines' `total_price`.
    pub fn lines_total(&self) -> Money {
        self.lines.iter().map(|l| l.total_price).sum()
    }

    pub fn item_count(&self) -> usize {
        self.lines.len()
    }

    pub fn total_quantity(&self) -> Money {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    pub fn is_pending(&self) -> bool {
        self.status == OrderStatus::Pending
    }
}

// =============================================================================
// Reference Data
// =============================================================================

/// A product from the synced catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub code: String,
    pub name: Option<String>,
    pub brand: Option<String>,
    pub unit: Option<String>,
    pub company: Option<String>,
    pub client_id: String,
}

impl Product {
    /// Name used on cart and order lines; empty when the catalog has none.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }
}

/// Where a customer record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CustomerSource {
    /// Imported by the bulk reference-data sync.
    Synced,
    /// Added by a user of the tenant.
    Manual,
}

/// A customer visible to a tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    /// Account code for synced customers; manual customers have none.
    pub code: Option<String>,
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub client_id: String,
    pub source: CustomerSource,
}

// =============================================================================
// Identity
// =============================================================================

/// A normalized role name (`"Level 3"` → `"level3"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(String);

impl Role {
    /// Roles allowed to see every order of their tenant.
    pub const TENANT_WIDE: [&'static str; 2] = ["admin", "level3"];

    /// Lower-cases and strips all whitespace. Returns `None` for a blank role.
    pub fn normalize(raw: &str) -> Option<Role> {
        let normalized: String = raw
            .chars()
            .filter(|c| !c.is_whitespace())
            .flat_map(char::to_lowercase)
            .collect();

        if normalized.is_empty() {
            None
        } else {
            Some(Role(normalized))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn can_view_all_orders(&self) -> bool {
        Role::TENANT_WIDE.contains(&self.0.as_str())
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: String,
    pub client_id: String,
    pub role: Role,
}

// =============================================================================
// Listing
// =============================================================================

/// Conjunctive order filters. Every field is optional.
///
/// Date bounds are inclusive and compare against the date part of
/// `updated_at`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderFilter {
    pub client_id: Option<String>,
    pub user_id: Option<String>,
    pub status: Option<OrderStatus>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub order_id: Option<String>,
}

/// 1-based page selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: u32,
}

impl PageRequest {
    /// Normalizes to `page >= 1` and `1 <= per_page <= max_per_page`.
    pub fn new(page: u32, per_page: u32, max_per_page: u32) -> Self {
        PageRequest {
            page: page.max(1),
            per_page: per_page.clamp(1, max_per_page.max(1)),
        }
    }

    /// Rows to skip.
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.per_page)
    }
}

/// Pagination metadata returned with a page of orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_count: u64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl PageInfo {
    pub fn new(request: PageRequest, total_count: u64) -> Self {
        let per_page = u64::from(request.per_page);
        let total_pages = total_count.div_ceil(per_page).max(1);
        let total_pages = u32::try_from(total_pages).unwrap_or(u32::MAX);

        PageInfo {
            current_page: request.page,
            total_pages,
            total_count,
            has_next: request.page < total_pages,
            has_previous: request.page > 1,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn m(s: &str) -> Money {
        Money::parse(s).unwrap()
    }

    fn order_line(qty: &str, price: &str, pct: &str, total: &str) -> OrderLine {
        OrderLine {
            id: "line-1".to_string(),
            order_id: "order-1".to_string(),
            product_code: "P-1".to_string(),
            product_name: "Rice 5kg".to_string(),
            quantity: m(qty),
            unit_price: m(price),
            discount_pct: m(pct),
            total_price: m(total),
        }
    }

    #[test]
    fn test_cart_key_trims() {
        let key = CartKey::new(" Guest ", "u1 ", " c1");
        assert_eq!(key.customer_name, "Guest");
        assert_eq!(key.user_id, "u1");
        assert_eq!(key.client_id, "c1");
    }

    #[test]
    fn test_empty_cart_is_synthetic() {
        let cart = Cart::empty(&CartKey::new("Guest", "u1", "c1"));
        assert!(!cart.exists());
        assert!(cart.is_empty());
        assert_eq!(cart.total_amount(), Money::ZERO);
    }

    #[test]
    fn test_cart_totals_round_each_line() {
        let line = |code: &str, qty: &str, price: &str| CartLine {
            id: code.to_string(),
            cart_id: "cart-1".to_string(),
            product_code: code.to_string(),
            product_name: code.to_string(),
            quantity: m(qty),
            unit_price: m(price),
        };
        let mut cart = Cart::empty(&CartKey::new("Guest", "u1", "c1"));
        cart.lines.push(line("A", "1.333", "3.00")); // 3.999 → 4.00
        cart.lines.push(line("B", "2", "0.99")); // 1.98

        assert_eq!(cart.total_amount(), m("5.98"));
        assert_eq!(cart.line("B").map(|l| l.line_total()), Some(m("1.98")));
    }

    #[test]
    fn test_order_status_parsing() {
        assert_eq!("pending".parse::<OrderStatus>().unwrap(), OrderStatus::Pending);
        assert_eq!("completed".parse::<OrderStatus>().unwrap(), OrderStatus::Completed);
        assert_eq!("cancelled".parse::<OrderStatus>().unwrap(), OrderStatus::Cancelled);
        assert_eq!(
            "shipped".parse::<OrderStatus>(),
            Err(CoreError::InvalidStatus("shipped".to_string()))
        );
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
    }

    #[test]
    fn test_manual_quantity_edit_drops_discount_from_total() {
        let mut line = order_line("1", "10.00", "50.00", "5.00");
        line.set_manual_quantity(m("3"));

        assert_eq!(line.quantity, m("3.000"));
        assert_eq!(line.total_price, m("30.00"));
        assert_eq!(line.discount_pct, m("50.00"));
    }

    #[test]
    fn test_role_normalization() {
        let role = Role::normalize(" Level 3 ").unwrap();
        assert_eq!(role.as_str(), "level3");
        assert!(role.can_view_all_orders());

        assert!(Role::normalize("ADMIN").unwrap().can_view_all_orders());
        assert!(!Role::normalize("sales").unwrap().can_view_all_orders());
        assert!(Role::normalize("   ").is_none());
    }

    #[test]
    fn test_page_info() {
        let request = PageRequest::new(2, 20, 100);
        let info = PageInfo::new(request, 45);
        assert_eq!(info.total_pages, 3);
        assert!(info.has_next);
        assert!(info.has_previous);
        assert_eq!(request.offset(), 20);

        let empty = PageInfo::new(PageRequest::new(0, 0, 100), 0);
        assert_eq!(empty.current_page, 1);
        assert_eq!(empty.total_pages, 1);
        assert!(!empty.has_next);
        assert!(!empty.has_previous);
    }
}
