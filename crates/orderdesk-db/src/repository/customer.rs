//! # Customer Repository
//!
//! The customer directory of a tenant: synced accounts plus customers added
//! by hand. Manual names are unique per tenant.

use chrono::Utc;
use sqlx::{FromRow, SqlitePool};
use tracing::{debug, info};

use super::new_id;
use crate::error::{DbError, DbResult};
use orderdesk_core::{Customer, CustomerSource};

/// Repository for customers.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

#[derive(Debug, FromRow)]
struct CustomerRow {
    code: Option<String>,
    client_id: String,
    name: String,
    phone: Option<String>,
    address: Option<String>,
}

impl CustomerRow {
    fn into_customer(self, source: CustomerSource) -> Customer {
        Customer {
            code: self.code,
            name: self.name,
            phone: self.phone,
            address: self.address,
            client_id: self.client_id,
            source,
        }
    }
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Inserts or replaces a synced customer.
    pub async fn upsert_synced(&self, customer: &Customer) -> DbResult<()> {
        let code = customer
            .code
            .as_deref()
            .ok_or_else(|| DbError::QueryFailed("synced customer requires a code".to_string()))?;

        debug!(code = %code, client_id = %customer.client_id, "Upserting synced customer");

        sqlx::query(
            r#"
            INSERT INTO customers (code, client_id, name, phone, address)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT (client_id, code) DO UPDATE SET
                name = excluded.name,
                phone = excluded.phone,
                address = excluded.address
            "#,
        )
        .bind(code)
        .bind(&customer.client_id)
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(&customer.address)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Adds a manual customer.
    ///
    /// Fails with `UniqueViolation` when the tenant already has a manual
    /// customer with this name.
    pub async fn add_manual(
        &self,
        client_id: &str,
        name: &str,
        phone: Option<&str>,
        address: Option<&str>,
    ) -> DbResult<Customer> {
        sqlx::query(
            r#"
            INSERT INTO manual_customers (id, client_id, name, phone, address, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(new_id())
        .bind(client_id)
        .bind(name)
        .bind(phone)
        .bind(address)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("customer name", name),
            other => other,
        })?;

        info!(client_id = %client_id, name = %name, "Manual customer added");

        Ok(Customer {
            code: None,
            name: name.to_string(),
            phone: phone.map(str::to_string),
            address: address.map(str::to_string),
            client_id: client_id.to_string(),
            source: CustomerSource::Manual,
        })
    }

    /// Synced customers (by name) followed by manual ones (by name).
    pub async fn list(&self, client_id: &str) -> DbResult<Vec<Customer>> {
        let synced = sqlx::query_as::<_, CustomerRow>(
            r#"
            SELECT code, client_id, name, phone, address
            FROM customers
            WHERE client_id = ?1
            ORDER BY name
            "#,
        )
        .bind(client_id)
        .fetch_all(&self.pool)
        .await?;

        let manual = sqlx::query_as::<_, CustomerRow>(
            r#"
            SELECT NULL AS code, client_id, name, phone, address
            FROM manual_customers
            WHERE client_id = ?1
            ORDER BY name
            "#,
        )
        .bind(client_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(synced
            .into_iter()
            .map(|r| r.into_customer(CustomerSource::Synced))
            .chain(manual.into_iter().map(|r| r.into_customer(CustomerSource::Manual)))
            .collect())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_manual_customer_names_unique_per_client() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let customers = db.customers();

        customers.add_manual("client-a", "Acme", Some("555"), None).await.unwrap();

        let dup = customers.add_manual("client-a", "Acme", None, None).await;
        assert!(matches!(dup, Err(DbError::UniqueViolation { .. })));

        // Same name under another tenant is fine
        customers.add_manual("client-b", "Acme", None, None).await.unwrap();
    }

    #[tokio::test]
    async fn test_list_merges_synced_and_manual() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let customers = db.customers();

        customers
            .upsert_synced(&Customer {
                code: Some("C-1".to_string()),
                name: "Zenith Mart".to_string(),
                phone: None,
                address: Some("1 Main St".to_string()),
                client_id: "client-a".to_string(),
                source: CustomerSource::Synced,
            })
            .await
            .unwrap();
        customers.add_manual("client-a", "Acme", None, None).await.unwrap();
        customers.add_manual("client-b", "Other", None, None).await.unwrap();

        let list = customers.list("client-a").await.unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].source, CustomerSource::Synced);
        assert_eq!(list[0].code.as_deref(), Some("C-1"));
        assert_eq!(list[1].name, "Acme");
        assert_eq!(list[1].code, None);
    }
}
