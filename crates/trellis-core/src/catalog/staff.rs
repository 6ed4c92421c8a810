//! Staff entity and repository

use crate::storage::Database;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Row;
use uuid::Uuid;

/// A staff member who performs services
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Staff {
    /// Unique staff identifier
    pub id: String,
    /// Staff member name
    pub name: String,
    /// Contact email (unique)
    pub email: String,
    /// Contact phone number
    pub phone: Option<String>,
    /// Names of service categories this staff member covers
    pub specializations: Vec<String>,
    /// Working-hours descriptor, keyed by weekday
    pub working_hours: serde_json::Map<String, serde_json::Value>,
    /// Whether the staff member is active
    pub is_active: bool,
    /// When the staff member was created
    pub created_at: DateTime<Utc>,
    /// When the staff member was last updated
    pub updated_at: DateTime<Utc>,
}

impl Staff {
    /// Create a new staff member
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            email: email.into(),
            phone: None,
            specializations: Vec::new(),
            working_hours: serde_json::Map::new(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the specialization list
    pub fn with_specializations(mut self, specializations: Vec<String>) -> Self {
        self.specializations = specializations;
        self
    }

    /// Set the phone number
    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }
}

/// Staff repository for database operations
pub struct StaffRepository<'a> {
    db: &'a Database,
}

impl<'a> StaffRepository<'a> {
    /// Create a new staff repository
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Create a new staff member in the database
    pub async fn create(&self, staff: &Staff) -> Result<()> {
        let specializations_json = serde_json::to_string(&staff.specializations)
            .map_err(|e| Error::Validation(format!("Invalid specializations: {}", e)))?;
        let working_hours_json = serde_json::to_string(&staff.working_hours)
            .map_err(|e| Error::Validation(format!("Invalid working hours: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO staff (id, name, email, phone, specializations, working_hours, is_active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&staff.id)
        .bind(&staff.name)
        .bind(&staff.email)
        .bind(&staff.phone)
        .bind(&specializations_json)
        .bind(&working_hours_json)
        .bind(staff.is_active)
        .bind(staff.created_at)
        .bind(staff.updated_at)
        .execute(self.db.pool())
        .await?;

        Ok(())
    }

    /// Get a staff member by ID
    pub async fn get(&self, id: &str) -> Result<Option<Staff>> {
        let row = sqlx::query(
            "SELECT id, name, email, phone, specializations, working_hours, is_active, created_at, updated_at FROM staff WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(row_to_staff))
    }

    /// List active staff, in listing order
    ///
    /// Auto-assignment picks the first available member of this list, so the
    /// ordering here is the documented tie-break for staff selection.
    pub async fn list_active(&self) -> Result<Vec<Staff>> {
        let rows = sqlx::query(
            "SELECT id, name, email, phone, specializations, working_hours, is_active, created_at, updated_at FROM staff WHERE is_active = 1 ORDER BY created_at, id",
        )
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.into_iter().map(row_to_staff).collect())
    }

    /// Deactivate a staff member
    pub async fn deactivate(&self, id: &str) -> Result<()> {
        let result = sqlx::query("UPDATE staff SET is_active = 0, updated_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(id)
            .execute(self.db.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::StaffNotFound(id.to_string()));
        }
        Ok(())
    }
}

/// Convert a database row to a Staff
fn row_to_staff(row: sqlx::sqlite::SqliteRow) -> Staff {
    let specializations_str: String = row.get("specializations");
    let working_hours_str: String = row.get("working_hours");

    Staff {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        phone: row.get("phone"),
        specializations: serde_json::from_str(&specializations_str).unwrap_or_default(),
        working_hours: serde_json::from_str(&working_hours_str).unwrap_or_default(),
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
    fn test_staff_new() {
        let staff = Staff::new("Sara", "sara@example.com")
            .with_specializations(vec!["massage".to_string()]);

        assert!(!staff.id.is_empty());
        assert_eq!(staff.name, "Sara");
        assert!(staff.is_active);
        assert_eq!(staff.specializations, vec!["massage".to_string()]);
    }

    #[tokio::test]
    async fn test_staff_repository_crud() {
        let db = Database::in_memory(Schema::Relational).await.unwrap();
        let repo = StaffRepository::new(&db);

        let staff = Staff::new("Sara", "sara@example.com")
            .with_specializations(vec!["massage".to_string(), "facial".to_string()]);
        repo.create(&staff).await.unwrap();

        let retrieved = repo.get(&staff.id).await.unwrap().unwrap();
        assert_eq!(retrieved.name, "Sara");
        assert_eq!(retrieved.specializations.len(), 2);

        let active = repo.list_active().await.unwrap();
        assert_eq!(active.len(), 1);

        repo.deactivate(&staff.id).await.unwrap();
        assert!(repo.list_active().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_active_preserves_creation_order() {
        let db = Database::in_memory(Schema::Relational).await.unwrap();
        let repo = StaffRepository::new(&db);

        let mut first = Staff::new("A", "a@example.com");
        let mut second = Staff::new("B", "b@example.com");
        // Force distinct, ordered timestamps
        first.created_at = Utc::now() - chrono::Duration::minutes(2);
        second.created_at = Utc::now() - chrono::Duration::minutes(1);
        repo.create(&second).await.unwrap();
        repo.create(&first).await.unwrap();

        let active = repo.list_active().await.unwrap();
        assert_eq!(active[0].id, first.id);
        assert_eq!(active[1].id, second.id);
    }
}
