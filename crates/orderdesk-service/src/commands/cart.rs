//! # Cart Commands
//!
//! Building a cart and turning it into an order.
//!
//! ## Cart Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  ┌──────────┐  add_item   ┌──────────┐  place_order  ┌───────────────┐  │
//! │  │ No cart  │────────────►│ In cart  │──────────────►│ Pending order │  │
//! │  │ (empty   │             │          │               │ (new/merged)  │  │
//! │  │  view)   │◄────────────│          │               └───────────────┘  │
//! │  └──────────┘ clear_cart  └──────────┘                                  │
//! │       ▲                     │    ▲                                      │
//! │       │                     │    │ add_item / update_line_quantity      │
//! │       │                     └────┘ remove_line                          │
//! │       └── place_order consumes the cart                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use tracing::debug;

use crate::auth::Authenticator;
use crate::commands::order::OrderView;
use crate::desk::OrderDesk;
use crate::error::ApiError;
use crate::pricing::PriceQuote;
use crate::request::{money_or, AddItemRequest, CartRef, NumericInput, PlaceOrderRequest, PriceQuery};
use crate::response::ApiResponse;
use orderdesk_core::validation::{
    optional, validate_cart_key, validate_client_id, validate_id, validate_product_code,
    MAX_ADDRESS_LEN, MAX_PHONE_LEN,
};
use orderdesk_core::{
    Cart, CartItemOutcome, CartKey, CartLine, CustomerContact, Money, DEFAULT_CUSTOMER_NAME,
};
use orderdesk_db::NewCartLine;

// =============================================================================
// Payloads
// =============================================================================

/// A cart line with its total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartLineView {
    pub id: String,
    pub product_code: String,
    pub product_name: String,
    pub quantity: Money,
    pub unit_price: Money,
    /// `round2(quantity × unit_price)`
    pub total_price: Money,
}

impl From<&CartLine> for CartLineView {
    fn from(line: &CartLine) -> Self {
        CartLineView {
            id: line.id.clone(),
            product_code: line.product_code.clone(),
            product_name: line.product_name.clone(),
            quantity: line.quantity,
            unit_price: line.unit_price,
            total_price: line.line_total(),
        }
    }
}

/// A cart as shown to callers. `id` is `null` when no cart exists yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartView {
    pub id: Option<String>,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub customer_address: Option<String>,
    pub items: Vec<CartLineView>,
    pub item_count: usize,
    pub total_amount: Money,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        CartView {
            id: cart.id.clone(),
            customer_name: cart.customer_name.clone(),
            customer_phone: cart.customer_phone.clone(),
            customer_address: cart.customer_address.clone(),
            items: cart.lines.iter().map(CartLineView::from).collect(),
            item_count: cart.item_count(),
            total_amount: cart.total_amount(),
        }
    }
}

/// `get_cart` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartPayload {
    pub cart: CartView,
}

/// `remove_line` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartLineRemoved {
    pub product_code: String,
    /// False when there was nothing to remove.
    pub removed: bool,
}

/// `clear_cart` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartCleared {
    pub cleared: bool,
}

/// `place_order` payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedOrder {
    pub order_id: String,
    pub order_number: String,
    pub order: OrderView,
}

// =============================================================================
// Input Helpers
// =============================================================================

/// Validated cart key; a blank customer name means `"Guest"`.
pub(crate) fn cart_key(cart: &CartRef) -> Result<CartKey, ApiError> {
    let customer_name = cart
        .customer_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_CUSTOMER_NAME);

    let key = CartKey::new(customer_name, &cart.user_id, &cart.client_id);
    Ok(validate_cart_key(&key)?)
}

fn item_message(outcome: &CartItemOutcome) -> &'static str {
    match outcome {
        CartItemOutcome::Saved { .. } => "Product added to cart",
        CartItemOutcome::Removed { .. } => "Item removed from cart",
    }
}

// =============================================================================
// Commands
// =============================================================================

impl<A: Authenticator> OrderDesk<A> {
    /// Resolves the unit price of a product for a tenant.
    pub async fn resolve_price(&self, query: &PriceQuery) -> ApiResponse<PriceQuote> {
        debug!(product_code = %query.product_code, client_id = %query.client_id, "resolve_price");

        let result: Result<_, ApiError> = async {
            let code = validate_product_code(&query.product_code)?;
            let client_id = validate_client_id(&query.client_id)?;
            let explicit = query.unit_price.as_ref().map(NumericInput::to_money_or_zero);

            Ok(self
                .prices
                .resolve(&code, &client_id, query.price_key.as_deref(), explicit)
                .await?)
        }
        .await;

        ApiResponse::from_result(result, "Price resolved")
    }

    /// Adds a quantity of a product to a cart, creating the cart if needed.
    ///
    /// ## Behavior
    /// - Quantity defaults to 1 and is added to any existing quantity
    /// - The unit price is re-resolved and overwrites the stored price
    /// - A resulting quantity ≤ 0 removes the line
    pub async fn add_item(&self, request: &AddItemRequest) -> ApiResponse<CartItemOutcome> {
        debug!(
            product_code = %request.product_code,
            client_id = %request.cart.client_id,
            "add_item"
        );

        let result: Result<_, ApiError> = async {
            let key = cart_key(&request.cart)?;
            let code = validate_product_code(&request.product_code)?;
            let contact = CustomerContact {
                phone: optional("customer_phone", request.customer_phone.as_deref(), MAX_PHONE_LEN)?,
                address: optional(
                    "customer_address",
                    request.customer_address.as_deref(),
                    MAX_ADDRESS_LEN,
                )?,
            };

            let quantity = money_or(request.quantity.as_ref(), Money::from_int(1));
            let explicit = request.unit_price.as_ref().map(NumericInput::to_money_or_zero);

            let quote = self
                .prices
                .resolve(&code, &key.client_id, request.price_key.as_deref(), explicit)
                .await?;

            let line = NewCartLine {
                product_code: quote.product_code,
                product_name: quote.product_name,
                quantity,
                unit_price: quote.unit_price,
            };

            Ok(self.db.carts().add_item(&key, &contact, &line).await?)
        }
        .await;

        match result {
            Ok(outcome) => {
                let message = item_message(&outcome);
                ApiResponse::ok_with_message(outcome, message)
            }
            Err(err) => ApiResponse::failure(err),
        }
    }

    /// Returns the cart, or an empty view with `id: null` when there is none.
    pub async fn get_cart(&self, cart: &CartRef) -> ApiResponse<CartPayload> {
        let result: Result<_, ApiError> = async {
            let key = cart_key(cart)?;
            debug!(cart = %key, "get_cart");

            let cart = self.db.carts().get(&key).await?;
            Ok(CartPayload {
                cart: CartView::from(&cart),
            })
        }
        .await;

        ApiResponse::from_result(result, "Cart loaded")
    }

    /// Replaces a cart line's quantity; ≤ 0 removes it.
    pub async fn update_line_quantity(
        &self,
        line_id: &str,
        quantity: &NumericInput,
    ) -> ApiResponse<CartItemOutcome> {
        debug!(line_id = %line_id, "update_line_quantity");

        let result: Result<_, ApiError> = async {
            let line_id = validate_id("item_id", line_id)?;
            let quantity = quantity.to_money_or_zero();
            Ok(self.db.carts().update_line_quantity(&line_id, quantity).await?)
        }
        .await;

        match result {
            Ok(outcome @ CartItemOutcome::Saved { .. }) => {
                ApiResponse::ok_with_message(outcome, "Cart item updated")
            }
            Ok(outcome) => ApiResponse::ok_with_message(outcome, "Item removed from cart"),
            Err(err) => ApiResponse::failure(err),
        }
    }

    /// Removes a product from a cart. Absent carts and lines are not errors.
    pub async fn remove_line(&self, cart: &CartRef, product_code: &str) -> ApiResponse<CartLineRemoved> {
        let result: Result<_, ApiError> = async {
            let key = cart_key(cart)?;
            let code = validate_product_code(product_code)?;
            debug!(cart = %key, product_code = %code, "remove_line");

            let removed = self.db.carts().remove_line(&key, &code).await?;
            Ok(CartLineRemoved {
                product_code: code,
                removed,
            })
        }
        .await;

        ApiResponse::from_result(result, "Item removed from cart")
    }

    /// Deletes the cart and its lines. An absent cart is not an error.
    pub async fn clear_cart(&self, cart: &CartRef) -> ApiResponse<CartCleared> {
        let result: Result<_, ApiError> = async {
            let key = cart_key(cart)?;
            debug!(cart = %key, "clear_cart");

            let cleared = self.db.carts().clear(&key).await?;
            Ok(CartCleared { cleared })
        }
        .await;

        ApiResponse::from_result(result, "Cart cleared")
    }

    /// Converts the cart into a new or existing pending order.
    ///
    /// See `OrderRepository::place_order` for the transaction.
    pub async fn place_order(&self, request: &PlaceOrderRequest) -> ApiResponse<PlacedOrder> {
        let result: Result<_, ApiError> = async {
            let key = cart_key(&request.cart)?;
            let discount = money_or(request.discount_percent.as_ref(), Money::ZERO);
            let merge_into = match request.merge_into_order_id.as_deref().map(str::trim) {
                None | Some("") => None,
                Some(id) => Some(validate_id("merge_into_order_id", id)?),
            };

            debug!(cart = %key, discount_pct = %discount, merge_into = ?merge_into, "place_order");

            let order = self
                .db
                .orders()
                .place_order(
                    &key,
                    discount,
                    merge_into.as_deref(),
                    &self.config.place_order_options(),
                )
                .await?;

            Ok(PlacedOrder {
                order_id: order.id.clone(),
                order_number: order.order_number.clone(),
                order: OrderView::from(order),
            })
        }
        .await;

        ApiResponse::from_result(result, "Order placed successfully")
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::testing::{add, cart, desk, m, place};

    fn saved_line(response: ApiResponse<CartItemOutcome>) -> CartLine {
        match response.into_data() {
            Some(CartItemOutcome::Saved { line, .. }) => line,
            other => panic!("expected a saved line, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_add_item_accumulates_quantity() {
        let desk = desk().await;
        let c = cart("Alice");

        let first = desk.add_item(&add(&c, "P10", "2")).await;
        assert!(first.success);
        assert_eq!(first.message.as_deref(), Some("Product added to cart"));

        let line = saved_line(desk.add_item(&add(&c, "P10", "3")).await);
        assert_eq!(line.quantity, m("5"));
        assert_eq!(line.unit_price, m("10.00"));

        let view = desk.get_cart(&c).await.into_data().unwrap().cart;
        assert_eq!(view.items.len(), 1);
        assert_eq!(view.item_count, 1);
        assert_eq!(view.total_amount, m("50.00"));
    }

    #[tokio::test]
    async fn test_quantity_defaults_to_one() {
        let desk = desk().await;
        let c = cart("Alice");

        let mut request = add(&c, "P25", "0");
        request.quantity = None;
        let line = saved_line(desk.add_item(&request).await);
        assert_eq!(line.quantity, m("1"));
    }

    #[tokio::test]
    async fn test_negative_update_removes_line() {
        let desk = desk().await;
        let c = cart("Alice");

        let line = saved_line(desk.add_item(&add(&c, "P10", "2")).await);

        let response = desk
            .update_line_quantity(&line.id, &NumericInput::from("-1"))
            .await;
        assert!(response.success);
        assert_eq!(response.message.as_deref(), Some("Item removed from cart"));
        assert!(matches!(
            response.into_data(),
            Some(CartItemOutcome::Removed { .. })
        ));

        let view = desk.get_cart(&c).await.into_data().unwrap().cart;
        assert!(view.items.is_empty());
    }

    #[tokio::test]
    async fn test_update_unknown_line_is_not_found() {
        let desk = desk().await;

        let response = desk.update_line_quantity("missing", &NumericInput::from(2.0)).await;
        assert!(!response.success);
        assert_eq!(response.code, Some(ErrorCode::NotFound));
    }

    #[tokio::test]
    async fn test_other_tenants_product_reads_as_not_found() {
        let desk = desk().await;
        let c = cart("Alice");

        let response = desk.add_item(&add(&c, "PB", "1")).await;
        assert!(!response.success);
        assert_eq!(response.code, Some(ErrorCode::NotFound));
        assert_eq!(response.http_status(), 404);

        let error = response.error.unwrap();
        assert!(error.contains("PB"));
        assert!(!error.contains("client-b"));

        let quote = desk
            .resolve_price(&PriceQuery {
                product_code: "PB".to_string(),
                client_id: "client-b".to_string(),
                ..Default::default()
            })
            .await;
        assert_eq!(quote.into_data().unwrap().unit_price, m("4.00"));
    }

    #[tokio::test]
    async fn test_remove_line_is_idempotent() {
        let desk = desk().await;
        let c = cart("Alice");
        desk.add_item(&add(&c, "P10", "1")).await;

        let first = desk.remove_line(&c, "P10").await;
        assert!(first.success);
        assert!(first.into_data().unwrap().removed);

        let second = desk.remove_line(&c, "P10").await;
        assert!(second.success);
        assert!(!second.into_data().unwrap().removed);

        let cleared = desk.clear_cart(&c).await;
        assert!(cleared.success);
    }

    #[tokio::test]
    async fn test_blank_customer_name_is_guest() {
        let desk = desk().await;

        let blank = CartRef::new(Some("  "), "u1", "client-a");
        desk.add_item(&add(&blank, "P10", "1")).await;

        let guest = desk
            .get_cart(&CartRef::new(None, "u1", "client-a"))
            .await
            .into_data()
            .unwrap()
            .cart;
        assert_eq!(guest.customer_name, DEFAULT_CUSTOMER_NAME);
        assert_eq!(guest.items.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_client_is_a_validation_error() {
        let desk = desk().await;

        let response = desk.get_cart(&CartRef::new(Some("Alice"), "u1", "")).await;
        assert_eq!(response.code, Some(ErrorCode::ValidationError));
        assert_eq!(response.http_status(), 400);
    }

    #[tokio::test]
    async fn test_place_order_applies_discount_and_consumes_cart() {
        let desk = desk().await;
        let c = cart("Alice");
        desk.add_item(&add(&c, "P25", "4")).await;

        let response = desk.place_order(&place(&c, "20")).await;
        assert!(response.success);
        assert_eq!(response.message.as_deref(), Some("Order placed successfully"));

        let placed = response.into_data().unwrap();
        assert!(placed.order_number.starts_with("ORD-"));
        assert_eq!(placed.order.order.total_amount, m("80.00"));
        assert_eq!(placed.order.order.lines[0].discount_pct, m("20"));
        assert_eq!(placed.order.total_quantity, m("4"));

        let view = desk.get_cart(&c).await.into_data().unwrap().cart;
        assert_eq!(view.id, None);
        assert!(view.items.is_empty());
        assert_eq!(view.total_amount, Money::ZERO);
    }

    #[tokio::test]
    async fn test_place_order_without_cart_fails() {
        let desk = desk().await;

        let response = desk.place_order(&place(&cart("Nobody"), "0")).await;
        assert!(!response.success);
        assert_eq!(response.code, Some(ErrorCode::NotFound));
    }

    #[tokio::test]
    async fn test_place_order_merges_into_pending_order() {
        let desk = desk().await;
        let c = cart("Alice");

        desk.add_item(&add(&c, "P10", "1")).await;
        let first = desk.place_order(&place(&c, "0")).await.into_data().unwrap();

        desk.add_item(&add(&c, "P10", "4")).await;
        let second = desk.place_order(&place(&c, "0")).await.into_data().unwrap();

        assert_eq!(first.order_id, second.order_id);
        let order = second.order.order;
        assert_eq!(order.lines.len(), 1);
        assert_eq!(order.lines[0].quantity, m("5"));
        assert_eq!(order.lines[0].total_price, m("50.00"));
        assert_eq!(order.total_amount, m("50.00"));
    }

    #[tokio::test]
    async fn test_oversized_amounts_fail_inside_the_envelope() {
        let desk = desk().await;
        let c = cart("Alice");

        let mut request = add(&c, "P10", "9000000000000");
        request.unit_price = Some(NumericInput::from("90000000000000000"));
        let response = desk.add_item(&request).await;
        assert!(!response.success);
        assert_eq!(response.code, Some(ErrorCode::ValidationError));

        let quote = desk
            .resolve_price(&PriceQuery {
                product_code: "P10".to_string(),
                client_id: "client-a".to_string(),
                unit_price: Some(NumericInput::from("90000000000000000")),
                ..Default::default()
            })
            .await;
        assert_eq!(quote.code, Some(ErrorCode::ValidationError));

        // The cart stays usable
        let view = desk.get_cart(&c).await;
        assert!(view.success);
        assert!(view.into_data().unwrap().cart.items.is_empty());

        desk.add_item(&add(&c, "P10", "2")).await;
        let placed = desk.place_order(&place(&c, "0")).await;
        assert!(placed.success);
        assert_eq!(placed.into_data().unwrap().order.order.total_amount, m("20.00"));
    }
}

