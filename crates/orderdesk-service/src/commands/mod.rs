//! # Commands
//!
//! The operations of [`crate::OrderDesk`], one module per area.
//!
//! ## Command Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       OrderDesk Operations                              │
//! │                                                                         │
//! │  cart.rs                order.rs                 customer.rs            │
//! │  ───────                ────────                 ───────────            │
//! │  resolve_price          list_orders              list_customers         │
//! │  add_item               list_orders_for          add_customer           │
//! │  get_cart               update_order_status                             │
//! │  update_line_quantity   delete_order             session.rs             │
//! │  remove_line            update_order_item_qty    ──────────             │
//! │  clear_cart             delete_order_item        authenticate           │
//! │  place_order                                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each command validates its input first, then calls one repository
//! operation, then wraps the result in an [`crate::ApiResponse`].

pub mod cart;
pub mod customer;
pub mod order;
pub mod session;

pub use cart::{CartCleared, CartLineRemoved, CartLineView, CartPayload, CartView, PlacedOrder};
pub use customer::{CustomerList, CustomerPayload};
pub use order::{OrderDeleted, OrderList, OrderPayload, OrderView};
