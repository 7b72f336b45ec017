//! # Price Resolution
//!
//! Finds the product and its price record under a tenant, then applies the
//! tier rule from `orderdesk_core::pricing`.
//!
//! ## Lookup Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. Product                                                             │
//! │     (code, client) ──found──► use it                                    │
//! │           │ none                                                        │
//! │           ▼                                                             │
//! │     (code, any client) ──found──► TenantMismatch                        │
//! │           │ none                                                        │
//! │           ▼                                                             │
//! │     ProductNotFound                                                     │
//! │                                                                         │
//! │  2. Price (skipped when the caller supplies a unit price)               │
//! │     batches(code, client) ──any──► highest sales price                  │
//! │           │ none                                                        │
//! │           ▼                                                             │
//! │     batches(code, any client) ──any──► TenantMismatch                   │
//! │           │ none                                                        │
//! │           ▼                                                             │
//! │     PriceNotFound                                                       │
//! │                                                                         │
//! │  3. explicit price, else requested tier, else                           │
//! │     cost → salesprice → bmrp → second → third → fourth → 0              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use tracing::debug;

use orderdesk_core::pricing::{pick_best_batch, resolve_unit_price};
use orderdesk_core::validation::validate_unit_price;
use orderdesk_core::{CoreError, Money, Product, ProductBatch};
use orderdesk_db::{CatalogRepository, DbResult};

/// A resolved unit price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriceQuote {
    pub product_code: String,
    pub product_name: String,
    pub unit_price: Money,
}

/// Tenant-scoped price lookups.
#[derive(Debug, Clone)]
pub struct PriceResolver {
    catalog: CatalogRepository,
}

impl PriceResolver {
    pub fn new(catalog: CatalogRepository) -> Self {
        PriceResolver { catalog }
    }

    /// Resolves the price of `product_code` for `client_id`.
    ///
    /// ## Errors
    /// * `ProductNotFound` - No product with this code anywhere
    /// * `TenantMismatch` - Product or price record belongs to another client
    /// * `PriceNotFound` - No price record and no explicit price
    /// * `Validation` - Resolved price outside `MAX_UNIT_PRICE`
    pub async fn resolve(
        &self,
        product_code: &str,
        client_id: &str,
        price_key: Option<&str>,
        explicit: Option<Money>,
    ) -> DbResult<PriceQuote> {
        let product = self.product(product_code, client_id).await?;

        let unit_price = match explicit {
            Some(price) => resolve_unit_price(product_code, None, Some(price), price_key)?,
            None => {
                let batch = self.batch(product_code, client_id).await?;
                resolve_unit_price(product_code, batch.as_ref(), None, price_key)?
            }
        };
        let unit_price = validate_unit_price(unit_price)?;

        debug!(
            product_code = %product_code,
            client_id = %client_id,
            price_key = ?price_key,
            explicit = explicit.is_some(),
            unit_price = %unit_price,
            "Price resolved"
        );

        Ok(PriceQuote {
            product_code: product.code.clone(),
            product_name: product.display_name().to_string(),
            unit_price,
        })
    }

    async fn product(&self, code: &str, client_id: &str) -> DbResult<Product> {
        if let Some(product) = self.catalog.find_product(code, client_id).await? {
            return Ok(product);
        }

        match self.catalog.find_product_any(code).await? {
            Some(other) => Err(CoreError::TenantMismatch {
                entity: "Product".to_string(),
                code: code.to_string(),
                requested: client_id.to_string(),
                owner: other.client_id,
            }
            .into()),
            None => Err(CoreError::ProductNotFound(code.to_string()).into()),
        }
    }

    async fn batch(&self, code: &str, client_id: &str) -> DbResult<Option<ProductBatch>> {
        let scoped = self.catalog.batches_for(code, client_id).await?;
        if let Some(best) = pick_best_batch(&scoped) {
            return Ok(Some(best.clone()));
        }

        let any = self.catalog.batches_any(code).await?;
        match pick_best_batch(&any) {
            Some(other) => Err(CoreError::TenantMismatch {
                entity: "Price record".to_string(),
                code: code.to_string(),
                requested: client_id.to_string(),
                owner: other.client_id.clone(),
            }
            .into()),
            None => Ok(None),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
