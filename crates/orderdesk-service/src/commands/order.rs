//! # Order Commands
//!
//! Listing orders and editing them after placement. Every line edit returns
//! the whole order with its recomputed total.
//!
//! ## Visibility
//! ```text
//! list_orders_for(principal, filters)
//!      │
//!      ├── client_id  ← always the principal's tenant
//!      │
//!      └── role admin / level3 ? ── yes ──► every order of the tenant
//!                                 └─ no ──► user_id ← principal.user_id
//! ```

use serde::Serialize;
use tracing::{debug, info};

use crate::auth::Authenticator;
use crate::desk::OrderDesk;
use crate::error::ApiError;
use crate::request::{ListOrdersRequest, NumericInput};
use crate::response::ApiResponse;
use orderdesk_core::validation::{optional, validate_client_id, validate_id, MAX_USER_ID_LEN};
use orderdesk_core::{Money, Order, OrderFilter, OrderStatus, PageInfo, PageRequest, Principal};

// =============================================================================
// Payloads
// =============================================================================

/// An order with its derived counts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderView {
    #[serde(flatten)]
    pub order: Order,
    pub item_count: usize,
    pub total_quantity: Money,
}

impl From<Order> for OrderView {
    fn from(order: Order) -> Self {
        OrderView {
            item_count: order.item_count(),
            total_quantity: order.total_quantity(),
            order,
        }
    }
}

/// `list_orders` payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderList {
    pub orders: Vec<OrderView>,
    pub pagination: PageInfo,
}

/// Payload of commands that return one order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderPayload {
    pub order: OrderView,
}

impl From<Order> for OrderPayload {
    fn from(order: Order) -> Self {
        OrderPayload {
            order: OrderView::from(order),
        }
    }
}

/// `delete_order` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderDeleted {
    pub order_id: String,
}

// =============================================================================
// Commands
// =============================================================================

impl<A: Authenticator> OrderDesk<A> {
    /// Lists orders of a tenant, most recently updated first.
    ///
    /// Every filter is optional except `client_id`; all of them are ANDed.
    pub async fn list_orders(&self, request: &ListOrdersRequest) -> ApiResponse<OrderList> {
        debug!(client_id = %request.client_id, "list_orders");

        let result: Result<_, ApiError> = async {
            let filter = OrderFilter {
                client_id: Some(validate_client_id(&request.client_id)?),
                user_id: optional("user_id", request.user_id.as_deref(), MAX_USER_ID_LEN)?,
                status: request.status_filter()?,
                from_date: request.from_date,
                to_date: request.to_date,
                order_id: optional("order_id", request.order_id.as_deref(), 64)?,
            };

            let page = PageRequest::new(
                request.page.unwrap_or(1),
                request.per_page.unwrap_or(self.config.default_page_size),
                self.config.max_page_size,
            );

            let found = self.db.orders().list(&filter, page).await?;
            Ok(OrderList {
                orders: found.orders.into_iter().map(OrderView::from).collect(),
                pagination: found.page,
            })
        }
        .await;

        ApiResponse::from_result(result, "Orders loaded")
    }

    /// Lists the orders `principal` may see.
    ///
    /// The tenant is always the principal's. Roles without tenant-wide
    /// visibility only see their own orders, whatever `user_id` they ask for.
    pub async fn list_orders_for(
        &self,
        principal: &Principal,
        request: &ListOrdersRequest,
    ) -> ApiResponse<OrderList> {
        let mut scoped = request.clone();
        scoped.client_id = principal.client_id.clone();

        if !principal.role.can_view_all_orders() {
            scoped.user_id = Some(principal.user_id.clone());
        }

        debug!(
            user_id = %principal.user_id,
            role = %principal.role,
            tenant_wide = principal.role.can_view_all_orders(),
            "list_orders_for"
        );

        self.list_orders(&scoped).await
    }

    /// Sets an order's status to `pending`, `completed` or `cancelled`.
    pub async fn update_order_status(&self, order_id: &str, status: &str) -> ApiResponse<OrderPayload> {
        let result: Result<_, ApiError> = async {
            let order_id = validate_id("order_id", order_id)?;
            let status: OrderStatus = status.trim().parse()?;

            let order = self.db.orders().update_status(&order_id, status).await?;
            Ok(OrderPayload::from(order))
        }
        .await;

        ApiResponse::from_result(result, "Order status updated")
    }

    /// Deletes an order and all of its lines.
    pub async fn delete_order(&self, order_id: &str) -> ApiResponse<OrderDeleted> {
        let result: Result<_, ApiError> = async {
            let order_id = validate_id("order_id", order_id)?;
            self.db.orders().delete(&order_id).await?;

            info!(order_id = %order_id, "delete_order");
            Ok(OrderDeleted { order_id })
        }
        .await;

        ApiResponse::from_result(result, "Order deleted")
    }

    /// Sets an order line's quantity; ≤ 0 deletes the line.
    ///
    /// The line total becomes `unit_price × quantity`. A discount applied at
    /// placement is not re-applied. Unlike cart edits, the quantity is parsed
    /// strictly: unparsable input is a validation error, never a deletion.
    pub async fn update_order_item_quantity(
        &self,
        line_id: &str,
        quantity: &NumericInput,
    ) -> ApiResponse<OrderPayload> {
        let result: Result<_, ApiError> = async {
            let line_id = validate_id("item_id", line_id)?;
            let quantity = quantity.to_money()?;
            debug!(line_id = %line_id, quantity = %quantity, "update_order_item_quantity");

            let order = self.db.orders().update_line_quantity(&line_id, quantity).await?;
            Ok(OrderPayload::from(order))
        }
        .await;

        ApiResponse::from_result(result, "Order item updated")
    }

    /// Deletes an order line.
    pub async fn delete_order_item(&self, line_id: &str) -> ApiResponse<OrderPayload> {
        let result: Result<_, ApiError> = async {
            let line_id = validate_id("item_id", line_id)?;
            debug!(line_id = %line_id, "delete_order_item");

            let order = self.db.orders().delete_line(&line_id).await?;
            Ok(OrderPayload::from(order))
        }
        .await;

        ApiResponse::from_result(result, "Order item deleted")
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServiceConfig;
    use crate::error::ErrorCode;
    use crate::request::CartRef;
    use crate::testing::{add, cart, desk, m, place};
    use orderdesk_core::Role;

    async fn placed(desk: &OrderDesk, c: &CartRef, code: &str, qty: &str) -> Order {
        desk.add_item(&add(c, code, qty)).await;
        desk.place_order(&place(c, "0"))
            .await
            .into_data()
            .unwrap()
            .order
            .order
    }

    fn principal(user_id: &str, role: &str) -> Principal {
        Principal {
            user_id: user_id.to_string(),
            client_id: "client-a".to_string(),
            role: Role::normalize(role).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_line_edits_keep_total_in_sync() {
        let desk = desk().await;
        let c = cart("Alice");
        desk.add_item(&add(&c, "P10", "2")).await;
        let order = placed(&desk, &c, "P25", "1").await;
        assert_eq!(order.total_amount, m("45.00"));

        let p10 = order.lines.iter().find(|l| l.product_code == "P10").unwrap();
        let updated = desk
            .update_order_item_quantity(&p10.id, &NumericInput::from("3"))
            .await
            .into_data()
            .unwrap()
            .order
            .order;
        assert_eq!(updated.total_amount, m("55.00"));
        assert_eq!(updated.total_amount, updated.lines_total());

        let p25 = updated.lines.iter().find(|l| l.product_code == "P25").unwrap();
        let after_delete = desk.delete_order_item(&p25.id).await.into_data().unwrap().order;
        assert_eq!(after_delete.item_count, 1);
        assert_eq!(after_delete.order.total_amount, m("30.00"));

        // Zero quantity deletes the last line; the order stays with a zero total
        let p10 = &after_delete.order.lines[0];
        let emptied = desk
            .update_order_item_quantity(&p10.id, &NumericInput::from(0.0))
            .await
            .into_data()
            .unwrap()
            .order;
        assert_eq!(emptied.item_count, 0);
        assert_eq!(emptied.order.total_amount, Money::ZERO);
    }

    #[tokio::test]
    async fn test_unparsable_order_quantity_keeps_the_line() {
        let desk = desk().await;
        let order = placed(&desk, &cart("Alice"), "P10", "2").await;
        let line_id = order.lines[0].id.clone();

        let response = desk
            .update_order_item_quantity(&line_id, &NumericInput::from("abc"))
            .await;
        assert!(!response.success);
        assert_eq!(response.code, Some(ErrorCode::ValidationError));

        let oversized = desk
            .update_order_item_quantity(&line_id, &NumericInput::from("9000000000000"))
            .await;
        assert_eq!(oversized.code, Some(ErrorCode::ValidationError));

        let unchanged = desk.db.orders().get(&order.id).await.unwrap();
        assert_eq!(unchanged.lines.len(), 1);
        assert_eq!(unchanged.lines[0].quantity, m("2"));
        assert_eq!(unchanged.total_amount, m("20.00"));
    }

    #[tokio::test]
    async fn test_status_update_and_delete() {
        let desk = desk().await;
        let order = placed(&desk, &cart("Alice"), "P10", "1").await;

        let invalid = desk.update_order_status(&order.id, "shipped").await;
        assert_eq!(invalid.code, Some(ErrorCode::ValidationError));

        let done = desk.update_order_status(&order.id, " completed ").await;
        assert_eq!(done.into_data().unwrap().order.order.status, OrderStatus::Completed);

        // A completed order is not a merge target: the next cart opens a new order
        let next = placed(&desk, &cart("Alice"), "P10", "1").await;
        assert_ne!(next.id, order.id);

        let reopened = desk.update_order_status(&order.id, "pending").await;
        assert_eq!(reopened.code, Some(ErrorCode::Conflict));

        let deleted = desk.delete_order(&order.id).await;
        assert_eq!(deleted.into_data().unwrap().order_id, order.id);

        let again = desk.delete_order(&order.id).await;
        assert_eq!(again.code, Some(ErrorCode::NotFound));
    }

    #[tokio::test]
    async fn test_list_orders_requires_client() {
        let desk = desk().await;

        let response = desk.list_orders(&ListOrdersRequest::default()).await;
        assert_eq!(response.code, Some(ErrorCode::ValidationError));
    }

    #[tokio::test]
    async fn test_list_orders_for_scopes_by_role() {
        let desk = desk().await;
        placed(&desk, &CartRef::new(Some("Alice"), "rep", "client-a"), "P10", "1").await;
        placed(&desk, &CartRef::new(Some("Bob"), "other", "client-a"), "P25", "1").await;

        let asked_for_everything = ListOrdersRequest {
            client_id: "client-b".to_string(),
            ..Default::default()
        };

        let sales = desk
            .list_orders_for(&principal("rep", "Sales"), &asked_for_everything)
            .await
            .into_data()
            .unwrap();
        assert_eq!(sales.pagination.total_count, 1);
        assert_eq!(sales.orders[0].order.user_id, "rep");

        let admin = desk
            .list_orders_for(&principal("boss", "Admin"), &asked_for_everything)
            .await
            .into_data()
            .unwrap();
        assert_eq!(admin.pagination.total_count, 2);
        assert!(admin.orders.iter().all(|o| o.order.client_id == "client-a"));
    }

    #[tokio::test]
    async fn test_list_orders_page_size_is_capped() {
        let seeded = desk().await;
        let config = ServiceConfig {
            default_page_size: 1,
            max_page_size: 1,
            ..Default::default()
        };
        let desk = OrderDesk::new(seeded.database().clone(), config);

        placed(&desk, &cart("Alice"), "P10", "1").await;
        placed(&desk, &cart("Bob"), "P10", "1").await;

        let response = desk
            .list_orders(&ListOrdersRequest {
                client_id: "client-a".to_string(),
                per_page: Some(10_000),
                ..Default::default()
            })
            .await
            .into_data()
            .unwrap();

        assert_eq!(response.orders.len(), 1);
        assert_eq!(response.pagination.total_pages, 2);
        assert!(response.pagination.has_next);
    }
}
