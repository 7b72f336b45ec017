//! # Consolidation Math
//!
//! The pure half of turning a cart into order lines: discount ratios,
//! discounted line totals, merge accumulation and order numbers. The storage
//! half (finding the target order, persisting, deleting the cart) lives in
//! `orderdesk-db`.
//!
//! ## Percent Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  discount_percent = 20                                                  │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  ratio = clamp(20 / 100, 0, 1) = 0.2000          (4 places)             │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  per line:  round2(qty × unit_price × (1 − ratio))                      │
//! │             discount_pct = 20.00 on every line    (2 places)            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Merge Accumulation
//! When the target order already has a line for the product code:
//! ```text
//! quantity     += incoming quantity
//! unit_price    = incoming unit_price        (latest wins)
//! total_price  += incoming discounted total  (cumulative across merges)
//! discount_pct  = incoming percentage        (most recent merge only)
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::money::{Money, CURRENCY_SCALE, QUANTITY_SCALE, RATIO_SCALE};
use crate::types::{CartLine, OrderLine};

/// Prefix of generated order numbers.
pub const DEFAULT_ORDER_PREFIX: &str = "ORD";

// =============================================================================
// Discount Ratio
// =============================================================================

/// A discount as a ratio in `[0, 1]` with 4 decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiscountRatio(Money);

impl DiscountRatio {
    /// No discount.
    pub const NONE: DiscountRatio = DiscountRatio(Money::ZERO);

    /// Converts a percentage, clamping to 0–100.
    ///
    /// ## Example
    /// ```rust
    /// use orderdesk_core::consolidation::DiscountRatio;
    /// use orderdesk_core::Money;
    ///
    /// let ratio = DiscountRatio::from_percent(Money::from_int(20));
    /// assert_eq!(ratio.ratio().to_string(), "0.2000");
    ///
    /// let over = DiscountRatio::from_percent(Money::from_int(150));
    /// assert_eq!(over.percent().to_string(), "100.00");
    /// ```
    pub fn from_percent(percent: Money) -> Self {
        let ratio = percent * Money::from_minor_units(1, 2);
        DiscountRatio(
            ratio
                .clamp_to(Money::ZERO, Money::from_int(1))
                .quantize(RATIO_SCALE),
        )
    }

    pub fn ratio(&self) -> Money {
        self.0
    }

    /// The percentage recorded on order lines (2 places).
    pub fn percent(&self) -> Money {
        (self.0 * Money::ONE_HUNDRED).quantize(CURRENCY_SCALE)
    }

    /// `round2(amount × (1 − ratio))`.
    pub fn apply(&self, amount: Money) -> Money {
        (amount * (Money::from_int(1) - self.0)).quantize(CURRENCY_SCALE)
    }
}

/// `round2(quantity × unit_price × (1 − ratio))`.
pub fn discounted_line_total(quantity: Money, unit_price: Money, discount: DiscountRatio) -> Money {
    discount.apply(quantity * unit_price)
}

// =============================================================================
// Consolidation Plan
// =============================================================================

/// What one cart line adds to the target order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineContribution {
    pub product_code: String,
    pub product_name: String,
    pub quantity: Money,
    pub unit_price: Money,
    pub discount_pct: Money,
    /// Discounted total for `quantity` only.
    pub line_total: Money,
}

/// The full set of contributions for one `place_order` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsolidationPlan {
    pub discount: DiscountRatio,
    /// `Σ round2(quantity × unit_price)`, undiscounted.
    pub subtotal: Money,
    pub lines: Vec<LineContribution>,
}

impl ConsolidationPlan {
    /// Builds contributions for every cart line at one discount percentage.
    pub fn from_cart_lines(lines: &[CartLine], discount_percent: Money) -> Self {
        let discount = DiscountRatio::from_percent(discount_percent);
        let discount_pct = discount.percent();

        let subtotal = lines.iter().map(CartLine::line_total).sum();

        let lines = lines
            .iter()
            .map(|line| LineContribution {
                product_code: line.product_code.clone(),
                product_name: line.product_name.clone(),
                quantity: line.quantity.round_quantity(),
                unit_price: line.unit_price.round_currency(),
                discount_pct,
                line_total: discounted_line_total(line.quantity, line.unit_price, discount),
            })
            .collect();

        ConsolidationPlan {
            discount,
            subtotal,
            lines,
        }
    }

    /// Sum of discounted contributions.
    pub fn discounted_total(&self) -> Money {
        self.lines.iter().map(|l| l.line_total).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl OrderLine {
    /// New order line holding a single contribution.
    pub fn from_contribution(
        id: impl Into<String>,
        order_id: impl Into<String>,
        contribution: &LineContribution,
    ) -> Self {
        OrderLine {
            id: id.into(),
            order_id: order_id.into(),
            product_code: contribution.product_code.clone(),
            product_name: contribution.product_name.clone(),
            quantity: contribution.quantity,
            unit_price: contribution.unit_price,
            discount_pct: contribution.discount_pct,
            total_price: contribution.line_total,
        }
    }

    /// Merges a contribution into an existing line for the same product.
    pub fn absorb(&mut self, contribution: &LineContribution) {
        self.quantity = (self.quantity + contribution.quantity).quantize(QUANTITY_SCALE);
        self.unit_price = contribution.unit_price;
        self.total_price = (self.total_price + contribution.line_total).quantize(CURRENCY_SCALE);
        self.discount_pct = contribution.discount_pct;
    }
}

// =============================================================================
// Order Numbers
// =============================================================================

/// Formats `PREFIX-YYYYMMDD-XXXXXXXX` from the first 8 hex digits of `id`.
pub fn format_order_number(prefix: &str, date: NaiveDate, id: &Uuid) -> String {
    let hex = id.simple().to_string().to_uppercase();
    format!("{}-{}-{}", prefix, date.format("%Y%m%d"), &hex[..8])
}

/// Generates a fresh order number with a random suffix.
///
/// Collisions are unlikely but possible; storage rejects duplicates and the
/// caller retries.
pub fn generate_order_number(prefix: &str, date: NaiveDate) -> String {
    format_order_number(prefix, date, &Uuid::new_v4())
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

    fn cart_line(code: &str, qty: &str, price: &str) -> CartLine {
        CartLine {
            id: format!("cl-{code}"),
            cart_id: "cart-1".to_string(),
            product_code: code.to_string(),
            product_name: format!("Product {code}"),
            quantity: m(qty),
            unit_price: m(price),
        }
    }

    #[test]
    fn test_ratio_clamps() {
        assert_eq!(DiscountRatio::from_percent(m("-5")), DiscountRatio::NONE);
        assert_eq!(DiscountRatio::from_percent(m("12.345")).ratio(), m("0.1235"));
        assert_eq!(DiscountRatio::from_percent(m("12.345")).percent(), m("12.35"));
        assert_eq!(DiscountRatio::from_percent(m("250")).ratio(), m("1"));
    }

    #[test]
    fn test_twenty_percent_off_one_hundred() {
        let plan = ConsolidationPlan::from_cart_lines(&[cart_line("A", "1", "100.00")], m("20"));

        assert_eq!(plan.subtotal, m("100.00"));
        assert_eq!(plan.lines[0].line_total, m("80.00"));
        assert_eq!(plan.lines[0].discount_pct.to_string(), "20.00");
        assert_eq!(plan.discounted_total(), m("80.00"));
    }

    #[test]
    fn test_each_line_rounded_before_summing() {
        let plan = ConsolidationPlan::from_cart_lines(
            &[cart_line("A", "1.333", "3.00"), cart_line("B", "1", "0.005")],
            Money::ZERO,
        );
        // 3.999 → 4.00, 0.005 → 0.01
        assert_eq!(plan.subtotal, m("4.01"));
        assert_eq!(plan.discounted_total(), m("4.01"));
    }

    #[test]
    fn test_full_discount_gives_zero_totals() {
        let plan = ConsolidationPlan::from_cart_lines(&[cart_line("A", "3", "9.99")], m("100"));
        assert_eq!(plan.lines[0].line_total, Money::ZERO);
    }

    #[test]
    fn test_absorb_accumulates_total_and_overwrites_pct() {
        let first = ConsolidationPlan::from_cart_lines(&[cart_line("P", "1", "10.00")], Money::ZERO);
        let mut line = OrderLine::from_contribution("ol-1", "ord-1", &first.lines[0]);
        assert_eq!(line.total_price, m("10.00"));

        let second = ConsolidationPlan::from_cart_lines(&[cart_line("P", "1", "10.00")], m("50"));
        line.absorb(&second.lines[0]);

        assert_eq!(line.quantity, m("2"));
        assert_eq!(line.total_price, m("15.00"));
        assert_eq!(line.discount_pct, m("50.00"));
    }

    #[test]
    fn test_absorb_takes_latest_unit_price() {
        let first = ConsolidationPlan::from_cart_lines(&[cart_line("P", "2", "10.00")], Money::ZERO);
        let mut line = OrderLine::from_contribution("ol-1", "ord-1", &first.lines[0]);

        let second = ConsolidationPlan::from_cart_lines(&[cart_line("P", "1", "12.00")], Money::ZERO);
        line.absorb(&second.lines[0]);

        assert_eq!(line.unit_price, m("12.00"));
        assert_eq!(line.total_price, m("32.00"));
    }

    #[test]
    fn test_order_number_format() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 31).unwrap();
        let id = Uuid::parse_str("9f3a1c2b-0000-4000-8000-000000000000").unwrap();
        assert_eq!(format_order_number("ORD", date, &id), "ORD-20260131-9F3A1C2B");

        let generated = generate_order_number(DEFAULT_ORDER_PREFIX, date);
        assert!(generated.starts_with("ORD-20260131-"));
        assert_eq!(generated.len(), "ORD-20260131-".len() + 8);
    }
}
