//! # Customer Commands
//!
//! The customer directory of a tenant: synced accounts first, then the ones
//! users added by hand.

use serde::Serialize;
use tracing::debug;

use crate::auth::Authenticator;
use crate::desk::OrderDesk;
use crate::error::ApiError;
use crate::request::NewCustomerRequest;
use crate::response::ApiResponse;
use orderdesk_core::validation::{
    optional, require, validate_client_id, MAX_ADDRESS_LEN, MAX_CUSTOMER_NAME_LEN, MAX_PHONE_LEN,
};
use orderdesk_core::Customer;

/// `list_customers` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerList {
    pub count: usize,
    pub customers: Vec<Customer>,
}

/// `add_customer` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerPayload {
    pub customer: Customer,
}

impl<A: Authenticator> OrderDesk<A> {
    pub async fn list_customers(&self, client_id: &str) -> ApiResponse<CustomerList> {
        let result: Result<_, ApiError> = async {
            let client_id = validate_client_id(client_id)?;
            debug!(client_id = %client_id, "list_customers");

            let customers = self.db.customers().list(&client_id).await?;
            Ok(CustomerList {
                count: customers.len(),
                customers,
            })
        }
        .await;

        ApiResponse::from_result(result, "Customers loaded")
    }

    /// Adds a manual customer. Names are unique per tenant.
    pub async fn add_customer(&self, request: &NewCustomerRequest) -> ApiResponse<CustomerPayload> {
        let result: Result<_, ApiError> = async {
            let client_id = validate_client_id(&request.client_id)?;
            let name = require("name", &request.name, MAX_CUSTOMER_NAME_LEN)?;
            let phone = optional("phone", request.phone.as_deref(), MAX_PHONE_LEN)?;
            let address = optional("address", request.address.as_deref(), MAX_ADDRESS_LEN)?;

            let customer = self
                .db
                .customers()
                .add_manual(&client_id, &name, phone.as_deref(), address.as_deref())
                .await?;

            Ok(CustomerPayload { customer })
        }
        .await;

        ApiResponse::from_result(result, "Customer added")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::testing::desk;
    use orderdesk_core::CustomerSource;

    fn new_customer(name: &str) -> NewCustomerRequest {
        NewCustomerRequest {
            client_id: "client-a".to_string(),
            name: name.to_string(),
            phone: Some("0300-1234567".to_string()),
            address: None,
        }
    }

    #[tokio::test]
    async fn test_add_and_list_customers() {
        let desk = desk().await;

        let added = desk.add_customer(&new_customer(" Walk-in Store ")).await;
        assert!(added.success);
        let customer = added.into_data().unwrap().customer;
        assert_eq!(customer.name, "Walk-in Store");
        assert_eq!(customer.source, CustomerSource::Manual);

        let list = desk.list_customers("client-a").await.into_data().unwrap();
        assert_eq!(list.count, 1);

        let other = desk.list_customers("client-b").await.into_data().unwrap();
        assert_eq!(other.count, 0);
    }

    #[tokio::test]
    async fn test_add_customer_rejects_blank_and_duplicate_names() {
        let desk = desk().await;

        let blank = desk.add_customer(&new_customer("   ")).await;
        assert_eq!(blank.code, Some(ErrorCode::ValidationError));

        desk.add_customer(&new_customer("Corner Shop")).await;
        let duplicate = desk.add_customer(&new_customer("Corner Shop")).await;
        assert_eq!(duplicate.code, Some(ErrorCode::Conflict));
        assert_eq!(duplicate.http_status(), 409);
    }
}
