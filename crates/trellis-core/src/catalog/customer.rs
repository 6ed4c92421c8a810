//! Customer entity and repository
//!
//! Customers are keyed by a stable external id (the chat-platform user id)
//! and are soft-deactivated rather than deleted.

use crate::storage::Database;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Row;
use uuid::Uuid;

/// A customer of the business
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    /// Unique customer identifier
    pub id: String,
    /// Stable external identity, e.g. the chat-platform user id
    pub external_id: String,
    /// Customer name
    pub name: String,
    /// Contact phone number
    pub phone: Option<String>,
    /// Contact email
    pub email: Option<String>,
    /// Free-form preference map
    pub preferences: serde_json::Map<String, serde_json::Value>,
    /// Whether the customer is active (soft-delete flag)
    pub is_active: bool,
    /// When the customer was created
    pub created_at: DateTime<Utc>,
    /// When the customer was last updated
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    /// Create a new customer
    pub fn new(external_id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            external_id: external_id.into(),
            name: name.into(),
            phone: None,
            email: None,
            preferences: serde_json::Map::new(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the phone number
    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    /// Set the email address
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Set a preference value
    pub fn with_preference(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.preferences.insert(key.into(), value);
        self
    }
}

/// Customer repository for database operations
pub struct CustomerRepository<'a> {
    db: &'a Database,
}

impl<'a> CustomerRepository<'a> {
    /// Create a new customer repository
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Create a new customer in the database
    pub async fn create(&self, customer: &Customer) -> Result<()> {
        let preferences_json = serde_json::to_string(&customer.preferences)
            .map_err(|e| Error::Validation(format!("Invalid preferences: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO customers (id, external_id, name, phone, email, preferences, is_active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.external_id)
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(&customer.email)
        .bind(&preferences_json)
        .bind(customer.is_active)
        .bind(customer.created_at)
        .bind(customer.updated_at)
        .execute(self.db.pool())
        .await?;

        Ok(())
    }

    /// Get a customer by ID
    pub async fn get(&self, id: &str) -> Result<Option<Customer>> {
        let row = sqlx::query(
            "SELECT id, external_id, name, phone, email, preferences, is_active, created_at, updated_at FROM customers WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(row_to_customer))
    }

    /// Get a customer by external (chat-platform) id
    pub async fn get_by_external_id(&self, external_id: &str) -> Result<Option<Customer>> {
        let row = sqlx::query(
            "SELECT id, external_id, name, phone, email, preferences, is_active, created_at, updated_at FROM customers WHERE external_id = ?",
        )
        .bind(external_id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(row_to_customer))
    }

    /// Get an existing customer by external id, or create one on first
    /// contact. Deactivated customers are not resurrected; resolving one
    /// fails with `CustomerNotFound`.
    pub async fn create_or_get(&self, external_id: &str, name: &str) -> Result<Customer> {
        if let Some(existing) = self.get_by_external_id(external_id).await? {
            if !existing.is_active {
                return Err(Error::CustomerNotFound(external_id.to_string()));
            }
            return Ok(existing);
        }

        let customer = Customer::new(external_id, name);
        self.create(&customer).await?;
        tracing::info!(customer_id = %customer.id, "Created customer on first contact");
        Ok(customer)
    }

    /// Update customer contact fields and preferences
    pub async fn update(&self, customer: &Customer) -> Result<()> {
        let preferences_json = serde_json::to_string(&customer.preferences)
            .map_err(|e| Error::Validation(format!("Invalid preferences: {}", e)))?;

        let result = sqlx::query(
            r#"
            UPDATE customers
            SET name = ?, phone = ?, email = ?, preferences = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(&customer.email)
        .bind(&preferences_json)
        .bind(Utc::now())
        .bind(&customer.id)
        .execute(self.db.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::CustomerNotFound(customer.id.clone()));
        }
        Ok(())
    }

    /// Soft-deactivate a customer. History is retained.
    pub async fn deactivate(&self, id: &str) -> Result<()> {
        let result = sqlx::query("UPDATE customers SET is_active = 0, updated_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(id)
            .execute(self.db.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::CustomerNotFound(id.to_string()));
        }
        Ok(())
    }

    /// List all active customers
    pub async fn list_active(&self) -> Result<Vec<Customer>> {
        let rows = sqlx::query(
            "SELECT id, external_id, name, phone, email, preferences, is_active, created_at, updated_at FROM customers WHERE is_active = 1 ORDER BY name",
        )
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.into_iter().map(row_to_customer).collect())
    }
}

/// Convert a database row to a Customer
fn row_to_customer(row: sqlx::sqlite::SqliteRow) -> Customer {
    let preferences_str: String = row.get("preferences");
    let preferences = serde_json::from_str(&preferences_str).unwrap_or_default();

    Customer {
        id: row.get("id"),
        external_id: row.get("external_id"),
        name: row.get("name"),
        phone: row.get("phone"),
        email: row.get("email"),
        preferences,
        is_active: row.get("is_active"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Schema;

    #[test]
    fn test_customer_new() {
        let customer = Customer::new("tg-1001", "Alice");

        assert!(!customer.id.is_empty());
        assert_eq!(customer.external_id, "tg-1001");
        assert_eq!(customer.name, "Alice");
        assert!(customer.is_active);
        assert!(customer.preferences.is_empty());
    }

    #[test]
    fn test_customer_builders() {
        let customer = Customer::new("tg-1001", "Alice")
            .with_phone("+15551234")
            .with_email("alice@example.com")
            .with_preference("preferred_time", serde_json::json!("morning"));

        assert_eq!(customer.phone, Some("+15551234".to_string()));
        assert_eq!(customer.email, Some("alice@example.com".to_string()));
        assert_eq!(
            customer.preferences.get("preferred_time"),
            Some(&serde_json::json!("morning"))
        );
    }

    #[tokio::test]
    async fn test_customer_repository_crud() {
        let db = Database::in_memory(Schema::Relational)
            .await
            .expect("Failed to create database");
        let repo = CustomerRepository::new(&db);

        let customer = Customer::new("tg-1001", "Alice").with_email("alice@example.com");
        repo.create(&customer).await.unwrap();

        let retrieved = repo.get(&customer.id).await.unwrap().unwrap();
        assert_eq!(retrieved.name, "Alice");
        assert_eq!(retrieved.email, Some("alice@example.com".to_string()));

        let by_external = repo.get_by_external_id("tg-1001").await.unwrap().unwrap();
        assert_eq!(by_external.id, customer.id);

        let mut updated = retrieved;
        updated.name = "Alice B".to_string();
        repo.update(&updated).await.unwrap();
        assert_eq!(repo.get(&customer.id).await.unwrap().unwrap().name, "Alice B");
    }

    #[tokio::test]
    async fn test_create_or_get_is_stable() {
        let db = Database::in_memory(Schema::Relational).await.unwrap();
        let repo = CustomerRepository::new(&db);

        let first = repo.create_or_get("tg-42", "Bob").await.unwrap();
        let second = repo.create_or_get("tg-42", "Robert").await.unwrap();

        // Same external id resolves to the same customer; name is not clobbered
        assert_eq!(first.id, second.id);
        assert_eq!(second.name, "Bob");
    }

    #[tokio::test]
    async fn test_deactivate_keeps_row() {
        let db = Database::in_memory(Schema::Relational).await.unwrap();
        let repo = CustomerRepository::new(&db);

        let customer = Customer::new("tg-7", "Carol");
        repo.create(&customer).await.unwrap();
        repo.deactivate(&customer.id).await.unwrap();

        let retrieved = repo.get(&customer.id).await.unwrap().unwrap();
        assert!(!retrieved.is_active);
        assert!(repo.list_active().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_or_get_rejects_deactivated() {
        let db = Database::in_memory(Schema::Relational).await.unwrap();
        let repo = CustomerRepository::new(&db);

        let customer = repo.create_or_get("tg-11", "Erin").await.unwrap();
        repo.deactivate(&customer.id).await.unwrap();

        let result = repo.create_or_get("tg-11", "Erin").await;
        assert!(matches!(result, Err(Error::CustomerNotFound(_))));
    }

    #[tokio::test]
    async fn test_duplicate_external_id_rejected() {
        let db = Database::in_memory(Schema::Relational).await.unwrap();
        let repo = CustomerRepository::new(&db);

        repo.create(&Customer::new("tg-9", "Dee")).await.unwrap();
        let result = repo.create(&Customer::new("tg-9", "Dupe")).await;
        assert!(result.is_err());
    }
}
