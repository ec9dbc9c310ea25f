//! # Staff Repository
//!
//! The people who record sales, and the admin operations on them. The HTTP
//! layer resolves the `x-staff-id` header through
//! [`StaffRepository::get_active`]; there are no credentials here.
//!
//! Staff are never deleted. Deactivating keeps the row so past sales still
//! name their creator.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use gearbox_core::validation::{validate_email, validate_staff_name};
use gearbox_core::{Staff, StaffRole};

const STAFF_COLUMNS: &str = "id, full_name, email, role, is_active, created_at";

/// Partial staff update; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StaffPatch {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub role: Option<StaffRole>,
}

#[derive(Debug, Clone)]
pub struct StaffRepository {
    pool: SqlitePool,
}

impl StaffRepository {
    pub fn new(pool: SqlitePool) -> Self {
        StaffRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Staff>> {
        let staff = sqlx::query_as::<_, Staff>(&format!(
            "SELECT {STAFF_COLUMNS} FROM staff WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(staff)
    }

    /// Gets a staff member only if they are still active.
    pub async fn get_active(&self, id: &str) -> DbResult<Option<Staff>> {
        Ok(self.get_by_id(id).await?.filter(|s| s.is_active))
    }

    /// Active staff, newest first.
    pub async fn list_active(&self) -> DbResult<Vec<Staff>> {
        let staff = sqlx::query_as::<_, Staff>(&format!(
            "SELECT {STAFF_COLUMNS} FROM staff WHERE is_active = 1 ORDER BY created_at DESC, id"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(staff)
    }

    pub async fn get_by_email(&self, email: &str) -> DbResult<Option<Staff>> {
        let staff = sqlx::query_as::<_, Staff>(&format!(
            "SELECT {STAFF_COLUMNS} FROM staff WHERE email = ?1"
        ))
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(staff)
    }

    /// Inserts a staff member.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - email already registered
    pub async fn insert(&self, full_name: &str, email: &str, role: StaffRole) -> DbResult<Staff> {
        let full_name = validate_staff_name(full_name)?;
        let email = validate_email(email)?;

        if self.email_taken(&email, None).await? {
            return Err(DbError::duplicate("Email", email));
        }

        let staff = Staff {
            id: Uuid::new_v4().to_string(),
            full_name,
            email,
            role,
            is_active: true,
            created_at: Utc::now(),
        };

        debug!(id = %staff.id, email = %staff.email, role = ?role, "Inserting staff");

        sqlx::query(
            r#"
            INSERT INTO staff (id, full_name, email, role, is_active, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&staff.id)
        .bind(&staff.full_name)
        .bind(&staff.email)
        .bind(staff.role)
        .bind(staff.is_active)
        .bind(staff.created_at)
        .execute(&self.pool)
        .await?;

        Ok(staff)
    }

    /// Updates name, email and role.
    pub async fn update(&self, id: &str, patch: StaffPatch) -> DbResult<Staff> {
        let mut staff = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Staff", id))?;

        if let Some(name) = patch.full_name {
            staff.full_name = validate_staff_name(&name)?;
        }
        if let Some(email) = patch.email {
            let email = validate_email(&email)?;
            if self.email_taken(&email, Some(id)).await? {
                return Err(DbError::duplicate("Email", email));
            }
            staff.email = email;
        }
        if let Some(role) = patch.role {
            staff.role = role;
        }

        debug!(id = %id, role = ?staff.role, "Updating staff");

        sqlx::query("UPDATE staff SET full_name = ?1, email = ?2, role = ?3 WHERE id = ?4")
            .bind(&staff.full_name)
            .bind(&staff.email)
            .bind(staff.role)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(staff)
    }

    /// Deactivates a staff member. Their past sales keep the reference.
    pub async fn deactivate(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deactivating staff");

        let result = sqlx::query("UPDATE staff SET is_active = 0 WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Staff", id));
        }

        Ok(())
    }

    /// Flips the active flag and returns the updated record.
    pub async fn toggle_active(&self, id: &str) -> DbResult<Staff> {
        let staff = sqlx::query_as::<_, Staff>(&format!(
            "UPDATE staff SET is_active = 1 - is_active WHERE id = ?1 RETURNING {STAFF_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Staff", id))?;

        debug!(id = %id, active = staff.is_active, "Toggled staff status");
        Ok(staff)
    }

    async fn email_taken(&self, email: &str, except_id: Option<&str>) -> DbResult<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM staff WHERE email = ?1 AND (?2 IS NULL OR id <> ?2)",
        )
        .bind(email)
        .bind(except_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }
}
