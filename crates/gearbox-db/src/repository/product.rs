//! # Product Repository
//!
//! Database operations for the car-parts catalog.
//!
//! ## Key Operations
//! - Barcode lookup (the scanner path)
//! - Paginated listing with category and text filters
//! - CRUD with soft delete
//!
//! Stock is only ever *decremented* by the sale transaction
//! ([`crate::SaleRepository::create_sale`]); this repository sets it
//! absolutely when an admin edits a product.
//!
//! ## Listing Filters
//! ```text
//! GET /api/products?category=Filters&search=bosch&page=2&limit=10
//!                      │                 │
//!                      ▼                 ▼
//!          category name → id     name / description / manufacturer
//!          (unknown → empty)      LIKE '%bosch%' (case-insensitive)
//!                      │                 │
//!                      └──────┬──────────┘
//!                             ▼
//!               is_active = 1, newest first, LIMIT/OFFSET
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use gearbox_core::validation::{
    page_offset, validate_barcode, validate_price_cents, validate_product_name,
    validate_search_query, validate_stock,
};
use gearbox_core::{Pagination, Product, DEFAULT_PAGE_SIZE};

const PRODUCT_COLUMNS: &str = r#"
    p.id, p.barcode, p.name, p.description, p.price_cents, p.stock,
    p.category_id, p.manufacturer, p.part_number, p.is_active,
    p.created_at, p.updated_at
"#;

// =============================================================================
// Inputs
// =============================================================================

/// Fields for a new product.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub barcode: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price_cents: i64,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub part_number: Option<String>,
}

/// Partial product update; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductPatch {
    pub barcode: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub stock: Option<i64>,
    pub category_id: Option<String>,
    pub manufacturer: Option<String>,
    pub part_number: Option<String>,
    pub is_active: Option<bool>,
}

/// Listing filter. Mirrors the query string of `GET /api/products`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductFilter {
    /// Category *name*, matched case-insensitively.
    pub category: Option<String>,
    pub search: Option<String>,
    pub page: i64,
    pub limit: i64,
}

impl Default for ProductFilter {
    fn default() -> Self {
        ProductFilter {
            category: None,
            search: None,
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub pagination: Pagination,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// // Scanner lookup
/// let pads = repo.get_by_barcode("1234567890123").await?;
///
/// // Admin listing
/// let page = repo.list(&ProductFilter::default()).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by its ID, active or not.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p WHERE p.id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets an active product by barcode.
    pub async fn get_by_barcode(&self, barcode: &str) -> DbResult<Option<Product>> {
        debug!(barcode = %barcode, "Looking up barcode");

        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p WHERE p.barcode = ?1 AND p.is_active = 1"
        ))
        .bind(barcode.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Lists active products, newest first.
    ///
    /// An unknown category name yields an empty page rather than an error.
    pub async fn list(&self, filter: &ProductFilter) -> DbResult<ProductPage> {
        let offset = page_offset(filter.page, filter.limit)?;
        let search = filter
            .search
            .as_deref()
            .map(validate_search_query)
            .transpose()?
            .filter(|s| !s.is_empty());

        debug!(
            category = ?filter.category,
            search = ?search,
            page = filter.page,
            limit = filter.limit,
            "Listing products"
        );

        let category_id = match filter.category.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => {
                let id: Option<String> = sqlx::query_scalar(
                    "SELECT id FROM categories WHERE name = ?1 AND is_active = 1",
                )
                .bind(name)
                .fetch_optional(&self.pool)
                .await?;

                match id {
                    Some(id) => Some(id),
                    None => {
                        return Ok(ProductPage {
                            products: Vec::new(),
                            pagination: Pagination::new(filter.page, filter.limit, 0),
                        })
                    }
                }
            }
            _ => None,
        };

        let pattern = search.as_deref().map(like_pattern);

        const WHERE: &str = r#"
            WHERE p.is_active = 1
              AND (?1 IS NULL OR p.category_id = ?1)
              AND (?2 IS NULL
                   OR p.name LIKE ?2 ESCAPE '\'
                   OR p.description LIKE ?2 ESCAPE '\'
                   OR p.manufacturer LIKE ?2 ESCAPE '\')
        "#;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM products p {WHERE}"))
            .bind(&category_id)
            .bind(&pattern)
            .fetch_one(&self.pool)
            .await?;

        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p {WHERE} \
             ORDER BY p.created_at DESC, p.id LIMIT ?3 OFFSET ?4"
        ))
        .bind(&category_id)
        .bind(&pattern)
        .bind(filter.limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = products.len(), total, "Listed products");

        Ok(ProductPage {
            products,
            pagination: Pagination::new(filter.page, filter.limit, total),
        })
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Inserted product with generated fields
    /// * `Err(DbError::UniqueViolation)` - barcode already exists
    /// * `Err(DbError::ForeignKeyViolation)` - unknown category
    pub async fn insert(&self, input: &NewProduct) -> DbResult<Product> {
        let barcode = input.barcode.trim();
        validate_barcode(barcode)?;
        validate_product_name(&input.name)?;
        validate_price_cents(input.price_cents)?;
        validate_stock(input.stock)?;

        if self.barcode_taken(barcode, None).await? {
            return Err(DbError::duplicate("barcode", barcode));
        }

        let now = Utc::now();
        let product = Product {
            id: generate_product_id(),
            barcode: barcode.to_string(),
            name: input.name.trim().to_string(),
            description: input.description.clone(),
            price_cents: input.price_cents,
            stock: input.stock,
            category_id: input.category_id.clone(),
            manufacturer: input.manufacturer.clone(),
            part_number: input.part_number.clone(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %product.id, barcode = %product.barcode, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, barcode, name, description, price_cents, stock,
                category_id, manufacturer, part_number, is_active,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&product.id)
        .bind(&product.barcode)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(product.stock)
        .bind(&product.category_id)
        .bind(&product.manufacturer)
        .bind(&product.part_number)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(product)
    }

    /// Applies a partial update.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - Product doesn't exist
    /// * `Err(DbError::UniqueViolation)` - new barcode belongs to another product
    pub async fn update(&self, id: &str, patch: ProductPatch) -> DbResult<Product> {
        let mut product = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))?;

        if let Some(barcode) = patch.barcode {
            let barcode = barcode.trim().to_string();
            validate_barcode(&barcode)?;
            if self.barcode_taken(&barcode, Some(id)).await? {
                return Err(DbError::duplicate("barcode", barcode));
            }
            product.barcode = barcode;
        }
        if let Some(name) = patch.name {
            validate_product_name(&name)?;
            product.name = name.trim().to_string();
        }
        if let Some(price) = patch.price_cents {
            validate_price_cents(price)?;
            product.price_cents = price;
        }
        if let Some(stock) = patch.stock {
            validate_stock(stock)?;
            product.stock = stock;
        }
        if patch.description.is_some() {
            product.description = patch.description;
        }
        if patch.category_id.is_some() {
            product.category_id = patch.category_id;
        }
        if patch.manufacturer.is_some() {
            product.manufacturer = patch.manufacturer;
        }
        if patch.part_number.is_some() {
            product.part_number = patch.part_number;
        }
        if let Some(active) = patch.is_active {
            product.is_active = active;
        }
        product.updated_at = Utc::now();

        debug!(id = %id, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                barcode = ?2,
                name = ?3,
                description = ?4,
                price_cents = ?5,
                stock = ?6,
                category_id = ?7,
                manufacturer = ?8,
                part_number = ?9,
                is_active = ?10,
                updated_at = ?11
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&product.barcode)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(product.stock)
        .bind(&product.category_id)
        .bind(&product.manufacturer)
        .bind(&product.part_number)
        .bind(product.is_active)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(product)
    }

    /// Soft-deletes a product by setting is_active = false.
    ///
    /// Historical sales still reference the row, so it is never removed.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting product");

        let result = sqlx::query("UPDATE products SET is_active = 0, updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Names of active categories that at least one active product uses.
    pub async fn used_category_names(&self) -> DbResult<Vec<String>> {
        let names: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT c.name
            FROM categories c
            WHERE c.is_active = 1
              AND EXISTS (
                  SELECT 1 FROM products p
                  WHERE p.category_id = c.id AND p.is_active = 1
              )
            ORDER BY c.name COLLATE NOCASE
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(names)
    }

    /// Active products with `stock <= threshold`, lowest stock first.
    pub async fn low_stock(&self, threshold: i64) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p \
             WHERE p.is_active = 1 AND p.stock <= ?1 \
             ORDER BY p.stock, p.name"
        ))
        .bind(threshold)
        .fetch_all(&self.pool)
        .await?;

        debug!(threshold, count = products.len(), "Low stock products");
        Ok(products)
    }

    /// Counts active products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn barcode_taken(&self, barcode: &str, except_id: Option<&str>) -> DbResult<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM products WHERE barcode = ?1 AND (?2 IS NULL OR id <> ?2)",
        )
        .bind(barcode)
        .bind(except_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }
}

/// Helper to generate a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}

/// `%term%` with LIKE wildcards in the term escaped.
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

// =============================================================================
// Unit Tests
// =============================================================================
