//! # Session Commands

use tracing::info;

use crate::auth::{AuthError, Authenticator, Credentials};
use crate::desk::OrderDesk;
use crate::error::ApiError;
use crate::response::ApiResponse;
use orderdesk_core::Principal;

impl<A: Authenticator> OrderDesk<A> {
    /// Verifies credentials and returns the caller's identity and
    /// normalized role.
    pub async fn authenticate(&self, credentials: &Credentials) -> ApiResponse<Principal> {
        let result: Result<Principal, AuthError> = async {
            let credentials = credentials.normalized()?;
            self.authenticator.authenticate(&credentials).await
        }
        .await;

        match result {
            Ok(principal) => {
                info!(
                    user_id = %principal.user_id,
                    client_id = %principal.client_id,
                    role = %principal.role,
                    "Login successful"
                );
                ApiResponse::ok_with_message(principal, "Login successful")
            }
            Err(err) => ApiResponse::failure(ApiError::from(err)),
        }
    }
}
