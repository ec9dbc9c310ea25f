//! # Category Repository
//!
//! Product groupings. Names are unique ignoring case (the column is
//! `COLLATE NOCASE`, so plain `=` comparisons already ignore case).
//!
//! ## Delete Rule
//! ```text
//! DELETE /api/categories/{id}
//!      │
//!      ▼
//! products referencing it? ──yes──► CategoryInUse { product_count }
//!      │ no
//!      ▼
//! is_active = 0 (soft delete)
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use gearbox_core::validation::validate_category_name;
use gearbox_core::{Category, CategoryOverview, CategoryStats, CoreError};

const CATEGORY_COLUMNS: &str =
    "id, name, description, is_active, created_by, created_at, updated_at";

/// Partial category update; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    /// Active categories sorted by name.
    pub async fn list_active(&self) -> DbResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE is_active = 1 ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    pub async fn get_by_name(&self, name: &str) -> DbResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE name = ?1"
        ))
        .bind(name.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    /// Creates a category.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - same name exists, ignoring case
    pub async fn create(
        &self,
        name: &str,
        description: &str,
        created_by: &str,
    ) -> DbResult<Category> {
        let name = validate_category_name(name)?;

        if self.name_taken(&name, None).await? {
            return Err(DbError::duplicate("Category name", name));
        }

        let now = Utc::now();
        let category = Category {
            id: Uuid::new_v4().to_string(),
            name,
            description: description.trim().to_string(),
            is_active: true,
            created_by: Some(created_by.to_string()),
            created_at: now,
            updated_at: now,
        };

        debug!(id = %category.id, name = %category.name, "Creating category");

        sqlx::query(
            r#"
            INSERT INTO categories (id, name, description, is_active, created_by, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&category.id)
        .bind(&category.name)
        .bind(&category.description)
        .bind(category.is_active)
        .bind(&category.created_by)
        .bind(category.created_at)
        .bind(category.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(category)
    }

    /// Updates name, description and active flag.
    pub async fn update(&self, id: &str, patch: CategoryPatch) -> DbResult<Category> {
        let mut category = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Category", id))?;

        if let Some(name) = patch.name {
            let name = validate_category_name(&name)?;
            if self.name_taken(&name, Some(id)).await? {
                return Err(DbError::duplicate("Category name", name));
            }
            category.name = name;
        }
        if let Some(description) = patch.description {
            category.description = description.trim().to_string();
        }
        if let Some(active) = patch.is_active {
            category.is_active = active;
        }
        category.updated_at = Utc::now();

        debug!(id = %id, name = %category.name, "Updating category");

        sqlx::query(
            r#"
            UPDATE categories SET name = ?2, description = ?3, is_active = ?4, updated_at = ?5
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&category.name)
        .bind(&category.description)
        .bind(category.is_active)
        .bind(category.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(category)
    }

    /// Soft-deletes a category nobody uses.
    ///
    /// ## Returns
    /// * `Err(DbError::Domain(CoreError::CategoryInUse))` - products still point at it
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        if self.get_by_id(id).await?.is_none() {
            return Err(DbError::not_found("Category", id));
        }

        let product_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE category_id = ?1")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;

        if product_count > 0 {
            return Err(CoreError::CategoryInUse { product_count }.into());
        }

        debug!(id = %id, "Soft-deleting category");

        sqlx::query("UPDATE categories SET is_active = 0, updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Per-category product count, total stock and average price.
    pub async fn overview(&self) -> DbResult<CategoryOverview> {
        let rows: Vec<(String, String, i64, i64, i64)> = sqlx::query_as(
            r#"
            SELECT
                c.id,
                c.name,
                COUNT(p.id),
                COALESCE(SUM(p.stock), 0),
                CAST(COALESCE(ROUND(AVG(p.price_cents)), 0) AS INTEGER)
            FROM categories c
            INNER JOIN products p ON p.category_id = c.id
            GROUP BY c.id, c.name
            ORDER BY COUNT(p.id) DESC, c.name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let total_categories: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM categories WHERE is_active = 1")
                .fetch_one(&self.pool)
                .await?;
        let total_products: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(CategoryOverview {
            total_categories,
            total_products,
            category_stats: rows
                .into_iter()
                .map(
                    |(category_id, category_name, product_count, total_stock, average_price_cents)| {
                        CategoryStats {
                            category_id,
                            category_name,
                            product_count,
                            total_stock,
                            average_price_cents,
                        }
                    },
                )
                .collect(),
        })
    }

    async fn name_taken(&self, name: &str, except_id: Option<&str>) -> DbResult<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM categories WHERE name = ?1 AND (?2 IS NULL OR id <> ?2)",
        )
        .bind(name)
        .bind(except_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }
}
