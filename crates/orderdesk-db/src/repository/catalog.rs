//! # Catalog Repository
//!
//! Read access to synced products and their price batches, plus the upserts
//! used by seeding and tests. Bulk synchronization itself happens elsewhere.
//!
//! ## Lookup Scopes
//! ```text
//! find_product(code, client)     → WHERE code = ? AND client_id = ?
//! find_product_any(code)         → WHERE code = ?    (first by client_id)
//! batches_for(code, client)      → highest sales price first
//! batches_any(code)              → same ordering, every tenant
//! ```
//! The unscoped variants only exist so the caller can tell "owned by another
//! tenant" apart from "does not exist".

use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use super::{from_milli, to_milli};
use crate::error::DbResult;
use orderdesk_core::{Money, Product, ProductBatch};

/// Repository for products and price batches.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

#[derive(Debug, FromRow)]
struct ProductRow {
    code: String,
    client_id: String,
    name: Option<String>,
    brand: Option<String>,
    unit: Option<String>,
    company: Option<String>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            code: row.code,
            name: row.name,
            brand: row.brand,
            unit: row.unit,
            company: row.company,
            client_id: row.client_id,
        }
    }
}

#[derive(Debug, FromRow)]
struct BatchRow {
    product_code: String,
    client_id: String,
    cost_milli: Option<i64>,
    sales_price_milli: Option<i64>,
    bmrp_milli: Option<i64>,
    second_price_milli: Option<i64>,
    third_price_milli: Option<i64>,
    fourth_price_milli: Option<i64>,
}

impl From<BatchRow> for ProductBatch {
    fn from(row: BatchRow) -> Self {
        ProductBatch {
            product_code: row.product_code,
            client_id: row.client_id,
            cost: row.cost_milli.map(from_milli),
            sales_price: row.sales_price_milli.map(from_milli),
            bmrp: row.bmrp_milli.map(from_milli),
            second_price: row.second_price_milli.map(from_milli),
            third_price: row.third_price_milli.map(from_milli),
            fourth_price: row.fourth_price_milli.map(from_milli),
        }
    }
}

const BATCH_COLUMNS: &str = r#"
    product_code, client_id,
    cost_milli, sales_price_milli, bmrp_milli,
    second_price_milli, third_price_milli, fourth_price_milli
"#;

fn tier_milli(value: Option<Money>) -> DbResult<Option<i64>> {
    value.map(to_milli).transpose()
}

impl CatalogRepository {
    /// Creates a new CatalogRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    /// Inserts or replaces a product for its tenant.
    pub async fn upsert_product(&self, product: &Product) -> DbResult<()> {
        debug!(code = %product.code, client_id = %product.client_id, "Upserting product");

        sqlx::query(
            r#"
            INSERT INTO products (code, client_id, name, brand, unit, company)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT (client_id, code) DO UPDATE SET
                name = excluded.name,
                brand = excluded.brand,
                unit = excluded.unit,
                company = excluded.company
            "#,
        )
        .bind(&product.code)
        .bind(&product.client_id)
        .bind(&product.name)
        .bind(&product.brand)
        .bind(&product.unit)
        .bind(&product.company)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Inserts a price batch.
    pub async fn insert_batch(&self, batch: &ProductBatch) -> DbResult<()> {
        debug!(
            product_code = %batch.product_code,
            client_id = %batch.client_id,
            "Inserting product batch"
        );

        sqlx::query(
            r#"
            INSERT INTO product_batches (
                product_code, client_id,
                cost_milli, sales_price_milli, bmrp_milli,
                second_price_milli, third_price_milli, fourth_price_milli
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&batch.product_code)
        .bind(&batch.client_id)
        .bind(tier_milli(batch.cost)?)
        .bind(tier_milli(batch.sales_price)?)
        .bind(tier_milli(batch.bmrp)?)
        .bind(tier_milli(batch.second_price)?)
        .bind(tier_milli(batch.third_price)?)
        .bind(tier_milli(batch.fourth_price)?)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Finds a product within one tenant.
    pub async fn find_product(&self, code: &str, client_id: &str) -> DbResult<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT code, client_id, name, brand, unit, company
            FROM products
            WHERE code = ?1 AND client_id = ?2
            "#,
        )
        .bind(code)
        .bind(client_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Product::from))
    }

    /// Finds a product with this code under any tenant.
    pub async fn find_product_any(&self, code: &str) -> DbResult<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT code, client_id, name, brand, unit, company
            FROM products
            WHERE code = ?1
            ORDER BY client_id
            LIMIT 1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Product::from))
    }

    /// Price batches for a product within one tenant, highest sales price
    /// first (unpriced last, then insertion order).
    pub async fn batches_for(&self, code: &str, client_id: &str) -> DbResult<Vec<ProductBatch>> {
        let sql = format!(
            "SELECT {BATCH_COLUMNS} FROM product_batches \
             WHERE product_code = ?1 AND client_id = ?2 \
             ORDER BY sales_price_milli IS NULL, sales_price_milli DESC, id"
        );

        let rows = sqlx::query_as::<_, BatchRow>(&sql)
            .bind(code)
            .bind(client_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(ProductBatch::from).collect())
    }

    /// Price batches for a product under any tenant, same ordering.
    pub async fn batches_any(&self, code: &str) -> DbResult<Vec<ProductBatch>> {
        let sql = format!(
            "SELECT {BATCH_COLUMNS} FROM product_batches \
             WHERE product_code = ?1 \
             ORDER BY sales_price_milli IS NULL, sales_price_milli DESC, id"
        );

        let rows = sqlx::query_as::<_, BatchRow>(&sql)
            .bind(code)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(ProductBatch::from).collect())
    }

    /// Number of products for a tenant.
    pub async fn count_products(&self, client_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE client_id = ?1")
            .bind(client_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use orderdesk_core::pricing::pick_best_batch;

    fn product(code: &str, client_id: &str) -> Product {
        Product {
            code: code.to_string(),
            name: Some(format!("Product {code}")),
            brand: None,
            unit: Some("pcs".to_string()),
            company: None,
            client_id: client_id.to_string(),
        }
    }

    fn batch(code: &str, client_id: &str, sales: Option<&str>) -> ProductBatch {
        ProductBatch {
            sales_price: sales.map(|s| Money::parse(s).unwrap()),
            cost: Some(Money::parse("1.250").unwrap()),
            ..ProductBatch::new(code, client_id)
        }
    }

    #[tokio::test]
    async fn test_product_lookup_scopes() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let catalog = db.catalog();
        catalog.upsert_product(&product("P-1", "client-a")).await.unwrap();

        assert!(catalog.find_product("P-1", "client-a").await.unwrap().is_some());
        assert!(catalog.find_product("P-1", "client-b").await.unwrap().is_none());

        let any = catalog.find_product_any("P-1").await.unwrap().unwrap();
        assert_eq!(any.client_id, "client-a");
        assert!(catalog.find_product_any("P-404").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_replaces_fields() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let catalog = db.catalog();
        catalog.upsert_product(&product("P-1", "client-a")).await.unwrap();

        let renamed = Product {
            name: Some("Renamed".to_string()),
            ..product("P-1", "client-a")
        };
        catalog.upsert_product(&renamed).await.unwrap();

        let found = catalog.find_product("P-1", "client-a").await.unwrap().unwrap();
        assert_eq!(found.display_name(), "Renamed");
        assert_eq!(catalog.count_products("client-a").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_batches_ordered_by_sales_price() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let catalog = db.catalog();
        catalog.insert_batch(&batch("P-1", "client-a", None)).await.unwrap();
        catalog.insert_batch(&batch("P-1", "client-a", Some("5.000"))).await.unwrap();
        catalog.insert_batch(&batch("P-1", "client-a", Some("9.500"))).await.unwrap();
        catalog.insert_batch(&batch("P-1", "client-b", Some("99"))).await.unwrap();

        let batches = catalog.batches_for("P-1", "client-a").await.unwrap();
        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0].sales_price, Some(Money::parse("9.5").unwrap()));
        assert_eq!(batches[2].sales_price, None);
        assert_eq!(batches[0].cost, Some(Money::parse("1.25").unwrap()));

        let best = pick_best_batch(&batches).unwrap();
        assert_eq!(best.sales_price, Some(Money::parse("9.5").unwrap()));

        let any = catalog.batches_any("P-1").await.unwrap();
        assert_eq!(any[0].client_id, "client-b");
    }
}
