//! Shared fixtures for command tests.

use orderdesk_core::{Money, Product, ProductBatch};
use orderdesk_db::{Database, DbConfig};

use crate::config::ServiceConfig;
use crate::desk::OrderDesk;
use crate::request::{AddItemRequest, CartRef, NumericInput, PlaceOrderRequest};

pub(crate) fn m(s: &str) -> Money {
    Money::parse(s).unwrap()
}

pub(crate) fn cart(customer: &str) -> CartRef {
    CartRef::new(Some(customer), "u1", "client-a")
}

pub(crate) fn add(cart: &CartRef, code: &str, quantity: &str) -> AddItemRequest {
    AddItemRequest {
        cart: cart.clone(),
        product_code: code.to_string(),
        quantity: Some(NumericInput::from(quantity)),
        ..Default::default()
    }
}

pub(crate) fn place(cart: &CartRef, percent: &str) -> PlaceOrderRequest {
    PlaceOrderRequest {
        cart: cart.clone(),
        discount_percent: Some(NumericInput::from(percent)),
        merge_into_order_id: None,
    }
}

/// In-memory desk with a small catalog:
///
/// | code | tenant   | sales price |
/// |------|----------|-------------|
/// | P10  | client-a | 10.00       |
/// | P25  | client-a | 25.00       |
/// | PB   | client-b | 4.00        |
pub(crate) async fn desk() -> OrderDesk {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();

    for (code, client_id, price) in [
        ("P10", "client-a", "10.00"),
        ("P25", "client-a", "25.00"),
        ("PB", "client-b", "4.00"),
    ] {
        db.catalog()
            .upsert_product(&Product {
                code: code.to_string(),
                name: Some(format!("Product {code}")),
                brand: None,
                unit: None,
                company: None,
                client_id: client_id.to_string(),
            })
            .await
            .unwrap();

        let mut batch = ProductBatch::new(code, client_id);
        batch.sales_price = Some(m(price));
        db.catalog().insert_batch(&batch).await.unwrap();
    }

    OrderDesk::new(db, ServiceConfig::default())
}
