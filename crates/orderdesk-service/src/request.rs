//! # Request Payloads
//!
//! Inputs of the `OrderDesk` operations. Numeric fields accept either JSON
//! numbers or strings (`2`, `"2"`, `"1.5"`); invalid or missing values become
//! zero unless the operation validates them.

use chrono::NaiveDate;
use serde::Deserialize;

use orderdesk_core::{Money, OrderStatus};

/// A number that may arrive as a JSON number or a string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum NumericInput {
    Number(f64),
    Text(String),
}

impl NumericInput {
    /// Strict conversion.
    pub fn to_money(&self) -> orderdesk_core::CoreResult<Money> {
        match self {
            NumericInput::Number(n) => Money::from_number(*n),
            NumericInput::Text(s) => Money::parse(s),
        }
    }

    /// Lenient conversion: anything unparsable is zero.
    pub fn to_money_or_zero(&self) -> Money {
        self.to_money().unwrap_or(Money::ZERO)
    }
}

impl From<&str> for NumericInput {
    fn from(value: &str) -> Self {
        NumericInput::Text(value.to_string())
    }
}

impl From<f64> for NumericInput {
    fn from(value: f64) -> Self {
        NumericInput::Number(value)
    }
}

/// Lenient value of an optional numeric field.
pub(crate) fn money_or(input: Option<&NumericInput>, default: Money) -> Money {
    input.map(NumericInput::to_money_or_zero).unwrap_or(default)
}

/// The cart key as sent by callers. `customer_name` defaults to `"Guest"`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CartRef {
    pub customer_name: Option<String>,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub client_id: String,
}

impl CartRef {
    pub fn new(
        customer_name: Option<&str>,
        user_id: impl Into<String>,
        client_id: impl Into<String>,
    ) -> Self {
        CartRef {
            customer_name: customer_name.map(str::to_string),
            user_id: user_id.into(),
            client_id: client_id.into(),
        }
    }
}

/// `resolve_price` input.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PriceQuery {
    #[serde(default)]
    pub product_code: String,
    #[serde(default)]
    pub client_id: String,
    /// Tier to try first (`"bmrp"`, `"second_price"`, ...).
    pub price_key: Option<String>,
    /// Trusted override; wins over every tier.
    pub unit_price: Option<NumericInput>,
}

/// `add_item` input.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AddItemRequest {
    #[serde(flatten)]
    pub cart: CartRef,
    pub customer_phone: Option<String>,
    pub customer_address: Option<String>,
    #[serde(default)]
    pub product_code: String,
    /// Added to the current quantity. Defaults to 1.
    pub quantity: Option<NumericInput>,
    pub unit_price: Option<NumericInput>,
    pub price_key: Option<String>,
}

/// `place_order` input.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PlaceOrderRequest {
    #[serde(flatten)]
    pub cart: CartRef,
    /// 0–100; clamped. Defaults to 0.
    pub discount_percent: Option<NumericInput>,
    /// Merge into this pending order instead of the customer's own.
    pub merge_into_order_id: Option<String>,
}

/// `list_orders` input.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ListOrdersRequest {
    #[serde(default)]
    pub client_id: String,
    pub user_id: Option<String>,
    /// `pending`, `completed` or `cancelled`; blank means any.
    pub status: Option<String>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub order_id: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl ListOrdersRequest {
    /// Parses the optional status filter; blank is no filter.
    pub(crate) fn status_filter(&self) -> orderdesk_core::CoreResult<Option<OrderStatus>> {
        match self.status.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw.parse().map(Some),
        }
    }
}

/// `add_customer` input.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NewCustomerRequest {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_input_accepts_numbers_and_strings() {
        let n: NumericInput = serde_json::from_str("1.5").unwrap();
        assert_eq!(n.to_money().unwrap(), Money::parse("1.5").unwrap());

        let s: NumericInput = serde_json::from_str("\"2\"").unwrap();
        assert_eq!(s.to_money().unwrap(), Money::from_int(2));

        let bad: NumericInput = serde_json::from_str("\"two\"").unwrap();
        assert!(bad.to_money().is_err());
        assert_eq!(bad.to_money_or_zero(), Money::ZERO);

        assert_eq!(money_or(None, Money::from_int(1)), Money::from_int(1));
    }

    #[test]
    fn test_add_item_request_from_json() {
        let req: AddItemRequest = serde_json::from_str(
            r#"{"user_id":"u1","client_id":"client-a","product_code":"P1","quantity":"3"}"#,
        )
        .unwrap();

        assert_eq!(req.cart.customer_name, None);
        assert_eq!(req.cart.user_id, "u1");
        assert_eq!(req.quantity, Some(NumericInput::Text("3".to_string())));
    }

    #[test]
    fn test_status_filter() {
        let mut req = ListOrdersRequest {
            status: Some(" ".to_string()),
            ..Default::default()
        };
        assert_eq!(req.status_filter().unwrap(), None);

        req.status = Some("completed".to_string());
        assert_eq!(req.status_filter().unwrap(), Some(OrderStatus::Completed));

        req.status = Some("shipped".to_string());
        assert!(req.status_filter().is_err());
    }
}
