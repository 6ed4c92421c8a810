//! Service entity and repository

use crate::storage::Database;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Row;
use uuid::Uuid;

/// A bookable service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    /// Unique service identifier
    pub id: String,
    /// Service name
    pub name: String,
    /// Service description
    pub description: String,
    /// Duration in minutes
    pub duration_minutes: u32,
    /// Price
    pub price: f64,
    /// Category name
    pub category: String,
    /// Whether the service is bookable
    pub is_active: bool,
    /// When the service was created
    pub created_at: DateTime<Utc>,
    /// When the service was last updated
    pub updated_at: DateTime<Utc>,
}

impl Service {
    /// Create a new service
    pub fn new(name: impl Into<String>, duration_minutes: u32, price: f64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            description: String::new(),
            duration_minutes,
            price,
            category: String::new(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the category
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Service duration as a chrono Duration
    pub fn duration(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.duration_minutes))
    }
}

/// Service repository for database operations
pub struct ServiceRepository<'a> {
    db: &'a Database,
}

impl<'a> ServiceRepository<'a> {
    /// Create a new service repository
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Create a new service in the database
    pub async fn create(&self, service: &Service) -> Result<()> {
        if service.duration_minutes == 0 {
            return Err(Error::Validation(
                "Service duration must be positive".to_string(),
            ));
        }

        sqlx::query(
            r#"
            INSERT INTO services (id, name, description, duration_minutes, price, category, is_active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&service.id)
        .bind(&service.name)
        .bind(&service.description)
        .bind(service.duration_minutes)
        .bind(service.price)
        .bind(&service.category)
        .bind(service.is_active)
        .bind(service.created_at)
        .bind(service.updated_at)
        .execute(self.db.pool())
        .await?;

        Ok(())
    }

    /// Get a service by ID
    pub async fn get(&self, id: &str) -> Result<Option<Service>> {
        let row = sqlx::query(
            "SELECT id, name, description, duration_minutes, price, category, is_active, created_at, updated_at FROM services WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(row_to_service))
    }

    /// List all active services
    pub async fn list_active(&self) -> Result<Vec<Service>> {
        let rows = sqlx::query(
            "SELECT id, name, description, duration_minutes, price, category, is_active, created_at, updated_at FROM services WHERE is_active = 1 ORDER BY name",
        )
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.into_iter().map(row_to_service).collect())
    }

    /// Find an active service by name, case-insensitive substring match
    pub async fn find_by_name(&self, name: &str) -> Result<Option<Service>> {
        let pattern = format!("%{}%", name);
        let row = sqlx::query(
            "SELECT id, name, description, duration_minutes, price, category, is_active, created_at, updated_at FROM services WHERE name LIKE ? AND is_active = 1 ORDER BY name LIMIT 1",
        )
        .bind(&pattern)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(row_to_service))
    }

    /// Deactivate a service
    pub async fn deactivate(&self, id: &str) -> Result<()> {
        let result = sqlx::query("UPDATE services SET is_active = 0, updated_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(id)
            .execute(self.db.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::ServiceNotFound(id.to_string()));
        }
        Ok(())
    }
}

/// Convert a database row to a Service
fn row_to_service(row: sqlx::sqlite::SqliteRow) -> Service {
    Service {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        duration_minutes: row.get::<i64, _>("duration_minutes") as u32,
        price: row.get("price"),
        category: row.get("category"),
        is_active: row.get("is_active"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
