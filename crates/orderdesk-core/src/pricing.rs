//! # Price Tiers
//!
//! Selection of a unit price from a product batch's named price tiers.
//!
//! ## Resolution Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  resolve_unit_price(code, batch, explicit, price_key)                   │
//! │                                                                         │
//! │  explicit unit_price supplied? ──yes──► use it (trusted override)       │
//! │        │ no                                                             │
//! │        ▼                                                                │
//! │  batch present? ──no──► PriceNotFound                                   │
//! │        │ yes                                                            │
//! │        ▼                                                                │
//! │  price_key names a tier with a value? ──yes──► use that tier            │
//! │        │ no                                                             │
//! │        ▼                                                                │
//! │  cost → salesprice → bmrp → secondprice → thirdprice → fourthprice      │
//! │        first non-null wins, 0 if every tier is null                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The fallback order is part of the pricing contract: it decides what the
//! customer is charged. Do not reorder [`FALLBACK_ORDER`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, CoreResult};
use crate::money::{Money, CURRENCY_SCALE};

// =============================================================================
// Price Tier
// =============================================================================

/// A named price field on a product batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceTier {
    Cost,
    SalesPrice,
    Bmrp,
    SecondPrice,
    ThirdPrice,
    FourthPrice,
}

/// Tier priority used when no `price_key` applies.
pub const FALLBACK_ORDER: [PriceTier; 6] = [
    PriceTier::Cost,
    PriceTier::SalesPrice,
    PriceTier::Bmrp,
    PriceTier::SecondPrice,
    PriceTier::ThirdPrice,
    PriceTier::FourthPrice,
];

impl PriceTier {
    /// Parses a client-supplied tier key.
    ///
    /// Case-insensitive; underscores are ignored so `sales_price` and
    /// `SalesPrice` both name [`PriceTier::SalesPrice`]. Unknown keys give
    /// `None`.
    ///
    /// ## Example
    /// ```rust
    /// use orderdesk_core::pricing::PriceTier;
    ///
    /// assert_eq!(PriceTier::from_key("bmrp"), Some(PriceTier::Bmrp));
    /// assert_eq!(PriceTier::from_key("Sales_Price"), Some(PriceTier::SalesPrice));
    /// assert_eq!(PriceTier::from_key("wholesale"), None);
    /// ```
    pub fn from_key(key: &str) -> Option<PriceTier> {
        let normalized: String = key
            .trim()
            .chars()
            .filter(|c| *c != '_')
            .flat_map(char::to_lowercase)
            .collect();

        match normalized.as_str() {
            "cost" => Some(PriceTier::Cost),
            "salesprice" => Some(PriceTier::SalesPrice),
            "bmrp" => Some(PriceTier::Bmrp),
            "secondprice" => Some(PriceTier::SecondPrice),
            "thirdprice" => Some(PriceTier::ThirdPrice),
            "fourthprice" => Some(PriceTier::FourthPrice),
            _ => None,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            PriceTier::Cost => "cost",
            PriceTier::SalesPrice => "salesprice",
            PriceTier::Bmrp => "bmrp",
            PriceTier::SecondPrice => "secondprice",
            PriceTier::ThirdPrice => "thirdprice",
            PriceTier::FourthPrice => "fourthprice",
        }
    }
}

impl fmt::Display for PriceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Product Batch
// =============================================================================

/// The pricing record for a product under one tenant.
///
/// Tier values are stored with 3 decimal places and may each be absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductBatch {
    pub product_code: String,
    pub client_id: String,
    pub cost: Option<Money>,
    pub sales_price: Option<Money>,
    pub bmrp: Option<Money>,
    pub second_price: Option<Money>,
    pub third_price: Option<Money>,
    pub fourth_price: Option<Money>,
}

impl ProductBatch {
    /// A batch with every tier empty.
    pub fn new(product_code: impl Into<String>, client_id: impl Into<String>) -> Self {
        ProductBatch {
            product_code: product_code.into(),
            client_id: client_id.into(),
            cost: None,
            sales_price: None,
            bmrp: None,
            second_price: None,
            third_price: None,
            fourth_price: None,
        }
    }

    /// Value of one tier.
    pub fn tier(&self, tier: PriceTier) -> Option<Money> {
        match tier {
            PriceTier::Cost => self.cost,
            PriceTier::SalesPrice => self.sales_price,
            PriceTier::Bmrp => self.bmrp,
            PriceTier::SecondPrice => self.second_price,
            PriceTier::ThirdPrice => self.third_price,
            PriceTier::FourthPrice => self.fourth_price,
        }
    }

    /// Applies the tier rule: `price_key` first, then [`FALLBACK_ORDER`].
    ///
    /// Returns zero when every tier is empty. The result is quantized to
    /// currency precision.
    pub fn select_price(&self, price_key: Option<&str>) -> Money {
        let requested = price_key.and_then(PriceTier::from_key);

        requested
            .into_iter()
            .chain(FALLBACK_ORDER)
            .find_map(|tier| self.tier(tier))
            .unwrap_or(Money::ZERO)
            .quantize(CURRENCY_SCALE)
    }
}

/// Picks the batch with the highest sales price.
///
/// Batches without a sales price rank below every priced batch. On ties the
/// first candidate wins.
pub fn pick_best_batch(batches: &[ProductBatch]) -> Option<&ProductBatch> {
    batches.iter().fold(None, |best: Option<&ProductBatch>, candidate| match best {
        Some(current) if candidate.sales_price <= current.sales_price => Some(current),
        _ => Some(candidate),
    })
}

/// Resolves the unit price for a cart line.
///
/// An explicit price always wins and does not need a batch. Without one, a
/// missing batch fails with [`CoreError::PriceNotFound`].
pub fn resolve_unit_price(
    product_code: &str,
    batch: Option<&ProductBatch>,
    explicit: Option<Money>,
    price_key: Option<&str>,
) -> CoreResult<Money> {
    if let Some(price) = explicit {
        return Ok(price.quantize(CURRENCY_SCALE));
    }

    batch
        .map(|b| b.select_price(price_key))
        .ok_or_else(|| CoreError::PriceNotFound(product_code.to_string()))
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

    fn batch() -> ProductBatch {
        ProductBatch {
            cost: Some(m("7.500")),
            sales_price: Some(m("10.000")),
            bmrp: Some(m("12.000")),
            second_price: Some(m("9.000")),
            third_price: None,
            fourth_price: Some(m("8.250")),
            ..ProductBatch::new("P-1", "client-a")
        }
    }

    #[test]
    fn test_explicit_price_wins() {
        let price = resolve_unit_price("P-1", Some(&batch()), Some(m("3.333")), Some("bmrp"));
        assert_eq!(price.unwrap(), m("3.33"));

        // No batch needed for an explicit price
        let price = resolve_unit_price("P-1", None, Some(m("5")), None);
        assert_eq!(price.unwrap().to_string(), "5.00");
    }

    #[test]
    fn test_price_key_is_tried_first() {
        assert_eq!(batch().select_price(Some("bmrp")), m("12.00"));
        assert_eq!(batch().select_price(Some("fourthprice")), m("8.25"));
        assert_eq!(batch().select_price(Some("SALES_PRICE")), m("10.00"));
    }

    #[test]
    fn test_fallback_starts_with_cost() {
        assert_eq!(batch().select_price(None), m("7.50"));
        // Empty tier named by the key falls through to the fixed order
        assert_eq!(batch().select_price(Some("thirdprice")), m("7.50"));
        // Unknown key is ignored
        assert_eq!(batch().select_price(Some("wholesale")), m("7.50"));
    }

    #[test]
    fn test_fallback_skips_null_tiers() {
        let b = ProductBatch {
            bmrp: Some(m("4.4")),
            third_price: Some(m("1")),
            ..ProductBatch::new("P-1", "client-a")
        };
        assert_eq!(b.select_price(None), m("4.40"));
    }

    #[test]
    fn test_all_null_tiers_give_zero() {
        let b = ProductBatch::new("P-1", "client-a");
        assert_eq!(b.select_price(Some("cost")).to_string(), "0.00");
    }

    #[test]
    fn test_missing_batch_without_explicit_price() {
        assert_eq!(
            resolve_unit_price("P-9", None, None, None),
            Err(CoreError::PriceNotFound("P-9".to_string()))
        );
    }

    #[test]
    fn test_pick_best_batch() {
        let priced = |p: Option<&str>| ProductBatch {
            sales_price: p.map(m),
            ..ProductBatch::new("P-1", "client-a")
        };
        let batches = vec![priced(None), priced(Some("5")), priced(Some("9")), priced(Some("9.0"))];

        let best = pick_best_batch(&batches).unwrap();
        assert!(std::ptr::eq(best, &batches[2]));

        let unpriced = vec![priced(None), priced(None)];
        assert!(std::ptr::eq(pick_best_batch(&unpriced).unwrap(), &unpriced[0]));
        assert!(pick_best_batch(&[]).is_none());
    }
}
