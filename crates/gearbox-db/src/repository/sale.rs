//! # Sale Repository
//!
//! Recording sales and reading them back for receipts and reports.
//!
//! ## Checkout Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    create_sale (one SQLite transaction)                 │
//! │                                                                         │
//! │  BEGIN                                                                 │
//! │   1. UPDATE sale_counters ... RETURNING value   ← takes the write lock │
//! │      └── SALE-000042 (or fallback if that number is already taken)     │
//! │                                                                         │
//! │   2. for each line n:                                                  │
//! │      ├── resolve id + quantity           → ValidationError (item n)    │
//! │      ├── SELECT product                  → NotFound (item n)           │
//! │      ├── price_line (stock check)        → InsufficientStock (item n)  │
//! │      └── UPDATE products SET stock = stock - q                         │
//! │              WHERE id = ? AND stock >= q  (0 rows → InsufficientStock) │
//! │                                                                         │
//! │   3. totals (subtotal + tax − discount ≥ 0)                            │
//! │   4. INSERT sales, INSERT sale_items                                   │
//! │  COMMIT                                                                │
//! │                                                                         │
//! │  Any error before COMMIT drops the transaction: no sale row, no stock  │
//! │  change, and the counter is back where it was.                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{Sqlite, SqliteConnection};
use sqlx::{QueryBuilder, SqlitePool};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::settings::SettingsRepository;
use gearbox_core::checkout::{price_line, CreateSaleRequest, LineTarget, PricedLine, SaleQuote, SaleTotals};
use gearbox_core::validation::page_offset;
use gearbox_core::{
    CoreError, Customer, MonthlyRevenueReport, Pagination, PaymentMethod, PaymentStatus,
    PeriodTotals, Product, ProductSummary, Sale, SaleItem, SaleNumber, SalesStats, TopProduct,
    ValidationError, DEFAULT_PAGE_SIZE, TOP_PRODUCTS_LIMIT,
};

/// Name of the `sale_counters` row backing sequential sale numbers.
const SALE_COUNTER: &str = "sale";

const SALE_SELECT: &str = r#"
    SELECT
        s.id, s.sale_number,
        s.subtotal_cents, s.tax_cents, s.discount_cents, s.total_cents,
        s.payment_method, s.payment_status,
        s.customer_name, s.customer_email, s.customer_phone, s.customer_address,
        s.notes, s.sale_date, s.created_by,
        st.full_name AS created_by_name,
        s.created_at, s.updated_at
    FROM sales s
    LEFT JOIN staff st ON st.id = s.created_by
"#;

const ITEM_SELECT: &str = r#"
    SELECT
        si.sale_id, si.id, si.line_no, si.product_id,
        p.name AS product_name,
        p.barcode AS product_barcode,
        p.manufacturer AS product_manufacturer,
        si.quantity, si.unit_price_cents, si.line_total_cents
    FROM sale_items si
    INNER JOIN products p ON p.id = si.product_id
"#;

const PRODUCT_SELECT: &str = r#"
    SELECT id, barcode, name, description, price_cents, stock,
           category_id, manufacturer, part_number, is_active,
           created_at, updated_at
    FROM products
    WHERE id = ?1 AND is_active = 1
"#;

// =============================================================================
// Rows & Filters
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct SaleRow {
    id: String,
    sale_number: String,
    subtotal_cents: i64,
    tax_cents: i64,
    discount_cents: i64,
    total_cents: i64,
    payment_method: PaymentMethod,
    payment_status: PaymentStatus,
    customer_name: Option<String>,
    customer_email: Option<String>,
    customer_phone: Option<String>,
    customer_address: Option<String>,
    notes: String,
    sale_date: DateTime<Utc>,
    created_by: String,
    created_by_name: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SaleRow {
    fn into_sale(self, items: Vec<SaleItem>) -> Sale {
        Sale {
            id: self.id,
            sale_number: self.sale_number,
            items,
            subtotal_cents: self.subtotal_cents,
            tax_cents: self.tax_cents,
            discount_cents: self.discount_cents,
            total_cents: self.total_cents,
            payment_method: self.payment_method,
            payment_status: self.payment_status,
            customer: Customer {
                name: self.customer_name,
                email: self.customer_email,
                phone: self.customer_phone,
                address: self.customer_address,
            },
            notes: self.notes,
            sale_date: self.sale_date,
            created_by: self.created_by,
            created_by_name: self.created_by_name,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SaleItemRow {
    sale_id: String,
    id: String,
    line_no: i64,
    product_id: String,
    product_name: String,
    product_barcode: String,
    product_manufacturer: Option<String>,
    quantity: i64,
    unit_price_cents: i64,
    line_total_cents: i64,
}

impl SaleItemRow {
    fn into_item(self) -> (String, SaleItem) {
        (
            self.sale_id,
            SaleItem {
                id: self.id,
                line_no: self.line_no,
                product: ProductSummary {
                    id: self.product_id,
                    name: self.product_name,
                    barcode: self.product_barcode,
                    manufacturer: self.product_manufacturer,
                },
                quantity: self.quantity,
                unit_price_cents: self.unit_price_cents,
                line_total_cents: self.line_total_cents,
            },
        )
    }
}

/// Listing filter for `GET /api/sales`. `end_date` is exclusive.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleFilter {
    pub page: i64,
    pub limit: i64,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

impl Default for SaleFilter {
    fn default() -> Self {
        SaleFilter {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
            start_date: None,
            end_date: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalePage {
    pub sales: Vec<Sale>,
    pub pagination: Pagination,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Records a sale dated now. See [`SaleRepository::create_sale_at`].
    pub async fn create_sale(&self, request: &CreateSaleRequest, staff_id: &str) -> DbResult<Sale> {
        self.create_sale_at(request, staff_id, Utc::now()).await
    }

    /// Validates, prices and records a sale, decrementing stock, as one
    /// all-or-nothing transaction.
    ///
    /// ## Errors
    /// * `Domain(Validation(..))` - empty items, missing payment method, bad
    ///   line, negative adjustment or negative total
    /// * `Domain(LineProductNotFound)` - unknown or deleted product
    /// * `Domain(InsufficientStock)` - not enough stock, including when a
    ///   concurrent sale took it first
    /// * `TransactionFailed` - begin or commit failed
    pub async fn create_sale_at(
        &self,
        request: &CreateSaleRequest,
        staff_id: &str,
        sale_date: DateTime<Utc>,
    ) -> DbResult<Sale> {
        let lines = request.lines()?;
        let payment_method = request.require_payment_method()?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let sale_number = next_sale_number(&mut *tx).await?;
        debug!(sale_number = %sale_number, lines = lines.len(), "Allocated sale number");

        let now = Utc::now();
        let mut priced = Vec::with_capacity(lines.len());
        for (idx, line) in lines.iter().enumerate() {
            let target = line.resolve(idx + 1)?;
            let priced_line = price_target(&mut *tx, &target, 0).await?;
            decrement_stock(&mut *tx, &target, now).await?;
            priced.push(priced_line);
        }

        let totals = SaleTotals::compute(&priced, request.tax_cents, request.discount_cents)?;

        let sale_id = Uuid::new_v4().to_string();
        let customer = normalize_customer(request.customer.clone().unwrap_or_default());
        let notes = request.notes.as_deref().map(str::trim).unwrap_or_default();

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, sale_number,
                subtotal_cents, tax_cents, discount_cents, total_cents,
                payment_method, payment_status,
                customer_name, customer_email, customer_phone, customer_address,
                notes, sale_date, created_by, created_at, updated_at
            ) VALUES (
                ?1, ?2,
                ?3, ?4, ?5, ?6,
                ?7, ?8,
                ?9, ?10, ?11, ?12,
                ?13, ?14, ?15, ?16, ?16
            )
            "#,
        )
        .bind(&sale_id)
        .bind(sale_number.as_str())
        .bind(totals.subtotal_cents)
        .bind(totals.tax_cents)
        .bind(totals.discount_cents)
        .bind(totals.total_cents)
        .bind(payment_method)
        .bind(PaymentStatus::Completed)
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(&customer.phone)
        .bind(&customer.address)
        .bind(notes)
        .bind(sale_date)
        .bind(staff_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        for line in &priced {
            sqlx::query(
                r#"
                INSERT INTO sale_items (
                    id, sale_id, line_no, product_id,
                    quantity, unit_price_cents, line_total_cents
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&sale_id)
            .bind(line.line_no as i64)
            .bind(&line.product.id)
            .bind(line.quantity)
            .bind(line.unit_price_cents)
            .bind(line.line_total_cents)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await.map_err(|e| {
            error!(
                sale_number = %sale_number,
                error = %e,
                "Sale commit failed; the sale may be partially applied"
            );
            DbError::TransactionFailed(e.to_string())
        })?;

        info!(
            sale_id = %sale_id,
            sale_number = %sale_number,
            total_cents = totals.total_cents,
            items = priced.len(),
            staff_id = %staff_id,
            "Sale recorded"
        );

        self.get_by_id(&sale_id)
            .await?
            .ok_or_else(|| DbError::Internal(format!("sale {sale_id} missing after commit")))
    }

    /// Prices a cart without writing anything.
    ///
    /// Repeated lines for the same product are checked against what the
    /// earlier lines already claimed.
    pub async fn quote(&self, request: &CreateSaleRequest) -> DbResult<SaleQuote> {
        let lines = request.lines()?;
        let settings = SettingsRepository::new(self.pool.clone()).get().await?;

        let mut conn = self.pool.acquire().await?;
        let mut claimed: HashMap<String, i64> = HashMap::new();
        let mut priced: Vec<PricedLine> = Vec::with_capacity(lines.len());

        for (idx, line) in lines.iter().enumerate() {
            let target = line.resolve(idx + 1)?;
            let already = claimed.get(&target.product_id).copied().unwrap_or(0);
            priced.push(price_target(&mut *conn, &target, already).await?);
            *claimed.entry(target.product_id).or_insert(0) += target.quantity;
        }

        debug!(lines = priced.len(), "Quoted cart");

        Ok(SaleQuote::build(
            priced,
            settings.tax_rate(),
            request.tax_cents,
            request.discount_cents,
        )?)
    }

    /// Gets a sale with its items, product summaries and creator name.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let row = sqlx::query_as::<_, SaleRow>(&format!("{SALE_SELECT} WHERE s.id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, SaleItemRow>(&format!(
            "{ITEM_SELECT} WHERE si.sale_id = ?1 ORDER BY si.line_no"
        ))
        .bind(id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|r| r.into_item().1)
        .collect();

        Ok(Some(row.into_sale(items)))
    }

    /// Lists sales, newest `sale_date` first.
    pub async fn list(&self, filter: &SaleFilter) -> DbResult<SalePage> {
        let offset = page_offset(filter.page, filter.limit)?;

        debug!(
            page = filter.page,
            limit = filter.limit,
            start = ?filter.start_date,
            end = ?filter.end_date,
            "Listing sales"
        );

        const WHERE: &str = r#"
            WHERE (?1 IS NULL OR s.sale_date >= ?1)
              AND (?2 IS NULL OR s.sale_date < ?2)
        "#;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM sales s {WHERE}"))
            .bind(filter.start_date)
            .bind(filter.end_date)
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query_as::<_, SaleRow>(&format!(
            "{SALE_SELECT} {WHERE} ORDER BY s.sale_date DESC, s.sale_number DESC LIMIT ?3 OFFSET ?4"
        ))
        .bind(filter.start_date)
        .bind(filter.end_date)
        .bind(filter.limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let mut items_by_sale: HashMap<String, Vec<SaleItem>> = HashMap::new();
        if !rows.is_empty() {
            let mut qb = QueryBuilder::<Sqlite>::new(ITEM_SELECT);
            qb.push(" WHERE si.sale_id IN (");
            let mut ids = qb.separated(", ");
            for row in &rows {
                ids.push_bind(row.id.clone());
            }
            ids.push_unseparated(") ORDER BY si.sale_id, si.line_no");

            let item_rows: Vec<SaleItemRow> = qb.build_query_as().fetch_all(&self.pool).await?;
            for item_row in item_rows {
                let (sale_id, item) = item_row.into_item();
                items_by_sale.entry(sale_id).or_default().push(item);
            }
        }

        let sales = rows
            .into_iter()
            .map(|row| {
                let items = items_by_sale.remove(&row.id).unwrap_or_default();
                row.into_sale(items)
            })
            .collect();

        Ok(SalePage {
            sales,
            pagination: Pagination::new(filter.page, filter.limit, total),
        })
    }

    /// Completed-sale totals for today, this month and this year (UTC
    /// calendar boundaries relative to `now`) plus the best sellers.
    pub async fn stats(&self, now: DateTime<Utc>) -> DbResult<SalesStats> {
        let today = now.date_naive();
        let start_of_month = today
            .with_day(1)
            .ok_or_else(|| DbError::Internal("invalid month start".to_string()))?;
        let start_of_year = NaiveDate::from_ymd_opt(today.year(), 1, 1)
            .ok_or_else(|| DbError::Internal("invalid year start".to_string()))?;

        let today_totals = self.completed_since(midnight(today)).await?;
        let month_totals = self.completed_since(midnight(start_of_month)).await?;
        let year_totals = self.completed_since(midnight(start_of_year)).await?;

        let top: Vec<(String, String, i64, i64)> = sqlx::query_as(
            r#"
            SELECT si.product_id, p.name, SUM(si.quantity) AS qty, SUM(si.line_total_cents)
            FROM sale_items si
            INNER JOIN products p ON p.id = si.product_id
            GROUP BY si.product_id, p.name
            ORDER BY qty DESC, p.name
            LIMIT ?1
            "#,
        )
        .bind(TOP_PRODUCTS_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        Ok(SalesStats {
            today: today_totals,
            this_month: month_totals,
            this_year: year_totals,
            top_products: top
                .into_iter()
                .map(
                    |(product_id, product_name, total_quantity, total_revenue_cents)| TopProduct {
                        product_id,
                        product_name,
                        total_quantity,
                        total_revenue_cents,
                    },
                )
                .collect(),
        })
    }

    /// Completed-sale revenue per calendar month (UTC) of `year`.
    pub async fn monthly_revenue(&self, year: i32) -> DbResult<MonthlyRevenueReport> {
        let bounds = NaiveDate::from_ymd_opt(year, 1, 1)
            .zip(year.checked_add(1).and_then(|y| NaiveDate::from_ymd_opt(y, 1, 1)));
        let (start, end) = match bounds {
            Some(bounds) if year >= 1970 => bounds,
            _ => {
                return Err(ValidationError::OutOfRange {
                    field: "year".to_string(),
                    min: 1970,
                    max: 9999,
                }
                .into())
            }
        };

        let rows: Vec<(DateTime<Utc>, i64)> = sqlx::query_as(
            r#"
            SELECT sale_date, total_cents
            FROM sales
            WHERE payment_status = 'completed' AND sale_date >= ?1 AND sale_date < ?2
            "#,
        )
        .bind(midnight(start))
        .bind(midnight(end))
        .fetch_all(&self.pool)
        .await?;

        let mut months = [PeriodTotals::default(); 12];
        for (sale_date, total_cents) in rows {
            let bucket = &mut months[sale_date.month0() as usize];
            bucket.total_revenue_cents += total_cents;
            bucket.total_sales += 1;
        }

        Ok(MonthlyRevenueReport::from_months(year, months))
    }

    /// Raises the counter to the highest sequential number already stored.
    ///
    /// Runs at startup so that sales imported or restored from elsewhere
    /// don't make every new sale fall back to a non-sequential number.
    pub async fn reconcile_counter(&self) -> DbResult<()> {
        let highest: Option<String> = sqlx::query_scalar(
            r#"
            SELECT sale_number FROM sales
            WHERE sale_number GLOB 'SALE-[0-9][0-9][0-9][0-9][0-9][0-9]*'
              AND sale_number NOT GLOB 'SALE-*-*'
            ORDER BY LENGTH(sale_number) DESC, sale_number DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        let Some(seq) = highest.and_then(|n| SaleNumber::from(n).sequence()) else {
            return Ok(());
        };

        let result = sqlx::query(
            r#"
            INSERT INTO sale_counters (name, value) VALUES (?1, ?2)
            ON CONFLICT(name) DO UPDATE SET value = MAX(value, excluded.value)
            "#,
        )
        .bind(SALE_COUNTER)
        .bind(seq)
        .execute(&self.pool)
        .await?;

        debug!(highest = seq, changed = result.rows_affected(), "Sale counter reconciled");
        Ok(())
    }

    async fn completed_since(&self, since: DateTime<Utc>) -> DbResult<PeriodTotals> {
        let (total_revenue_cents, total_sales): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(total_cents), 0), COUNT(*)
            FROM sales
            WHERE payment_status = 'completed' AND sale_date >= ?1
            "#,
        )
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(PeriodTotals {
            total_revenue_cents,
            total_sales,
        })
    }
}

// =============================================================================
// Transaction Steps
// =============================================================================

/// Allocates the next sale number inside the caller's transaction.
async fn next_sale_number(conn: &mut SqliteConnection) -> DbResult<SaleNumber> {
    let value: Option<i64> = sqlx::query_scalar(
        "UPDATE sale_counters SET value = value + 1 WHERE name = ?1 RETURNING value",
    )
    .bind(SALE_COUNTER)
    .fetch_optional(&mut *conn)
    .await?;

    let value = value.ok_or_else(|| DbError::Internal("sale counter row is missing".to_string()))?;
    let candidate = SaleNumber::sequential(value);

    let taken: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales WHERE sale_number = ?1")
        .bind(candidate.as_str())
        .fetch_one(&mut *conn)
        .await?;

    if taken == 0 {
        return Ok(candidate);
    }

    let salt = (Uuid::new_v4().as_u128() % 100) as u8;
    let fallback = SaleNumber::fallback(Utc::now().timestamp_millis(), salt);
    warn!(
        candidate = %candidate,
        fallback = %fallback,
        "Sequential sale number already taken, using fallback"
    );
    Ok(fallback)
}

/// Looks up the line's product and prices it. `claimed` units of the
/// product are treated as already spoken for.
async fn price_target(
    conn: &mut SqliteConnection,
    target: &LineTarget,
    claimed: i64,
) -> DbResult<PricedLine> {
    let mut product = fetch_product(conn, &target.product_id)
        .await?
        .ok_or_else(|| CoreError::LineProductNotFound {
            line_no: target.line_no,
            product_id: target.product_id.clone(),
        })?;
    product.stock -= claimed;

    Ok(price_line(target, &product)?)
}

/// Conditional decrement: never takes stock below zero.
async fn decrement_stock(
    conn: &mut SqliteConnection,
    target: &LineTarget,
    now: DateTime<Utc>,
) -> DbResult<()> {
    let result = sqlx::query(
        "UPDATE products SET stock = stock - ?1, updated_at = ?3 WHERE id = ?2 AND stock >= ?1",
    )
    .bind(target.quantity)
    .bind(&target.product_id)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        let product = fetch_product(conn, &target.product_id).await?;
        return Err(match product {
            Some(p) => CoreError::InsufficientStock {
                line_no: target.line_no,
                product: p.name,
                available: p.stock,
                requested: target.quantity,
            },
            None => CoreError::LineProductNotFound {
                line_no: target.line_no,
                product_id: target.product_id.clone(),
            },
        }
        .into());
    }

    Ok(())
}

async fn fetch_product(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(PRODUCT_SELECT)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(product)
}

fn normalize_customer(customer: Customer) -> Customer {
    let clean = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
    Customer {
        name: clean(customer.name),
        email: clean(customer.email),
        phone: clean(customer.phone),
        address: clean(customer.address),
    }
}

fn midnight(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(NaiveTime::MIN).and_utc()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{new_product, test_db};
    use crate::{Database, DbConfig};
    use chrono::TimeZone;
    use gearbox_core::checkout::SaleLineRequest;
    use gearbox_core::{SettingsUpdate, StaffRole};

    struct Fixture {
        db: Database,
        staff_id: String,
        pads: Product,
        filter: Product,
    }

    async fn fixture_with(db: Database) -> Fixture {
        let staff = db
            .staff()
            .insert("Counter Staff", "staff@shop.test", StaffRole::Staff)
            .await
            .unwrap();
        let pads = db
            .products()
            .insert(&new_product("1234567890123", "Brake Pads - Front Set", 2599, 10))
            .await
            .unwrap();
        let filter = db
            .products()
            .insert(&new_product("2345678901234", "Oil Filter", 1550, 5))
            .await
            .unwrap();
        Fixture {
            db,
            staff_id: staff.id,
            pads,
            filter,
        }
    }

    async fn fixture() -> Fixture {
        fixture_with(test_db().await).await
    }

    fn request(items: Vec<SaleLineRequest>) -> CreateSaleRequest {
        CreateSaleRequest {
            items: Some(items),
            payment_method: Some(PaymentMethod::Cash),
            ..Default::default()
        }
    }

    async fn stock_of(db: &Database, id: &str) -> i64 {
        db.products().get_by_id(id).await.unwrap().unwrap().stock
    }

    async fn sale_count(db: &Database) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(db.pool())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_reference_sale() {
        let f = fixture().await;

        let req = CreateSaleRequest {
            tax_cents: Some(540),
            customer: Some(Customer {
                name: Some("  Jane Driver ".to_string()),
                phone: Some("".to_string()),
                ..Default::default()
            }),
            ..request(vec![
                SaleLineRequest::new(&f.pads.id, 2),
                SaleLineRequest::new(&f.filter.id, 1),
            ])
        };

        let sale = f.db.sales().create_sale(&req, &f.staff_id).await.unwrap();

        assert_eq!(sale.sale_number, "SALE-000001");
        assert_eq!(sale.subtotal_cents, 6748);
        assert_eq!(sale.tax_cents, 540);
        assert_eq!(sale.discount_cents, 0);
        assert_eq!(sale.total_cents, 7288);
        assert_eq!(sale.payment_status, PaymentStatus::Completed);
        assert_eq!(sale.created_by_name.as_deref(), Some("Counter Staff"));
        assert_eq!(sale.customer.name.as_deref(), Some("Jane Driver"));
        assert!(sale.customer.phone.is_none());
        assert_eq!(sale.notes, "");

        assert_eq!(sale.items.len(), 2);
        assert_eq!(sale.items[0].line_no, 1);
        assert_eq!(sale.items[0].product.name, "Brake Pads - Front Set");
        assert_eq!(sale.items[0].unit_price_cents, 2599);
        assert_eq!(sale.items[0].line_total_cents, 5198);
        assert_eq!(sale.items[1].line_total_cents, 1550);

        assert_eq!(stock_of(&f.db, &f.pads.id).await, 8);
        assert_eq!(stock_of(&f.db, &f.filter.id).await, 4);

        // read-back equals what create returned
        let stored = f.db.sales().get_by_id(&sale.id).await.unwrap().unwrap();
        assert_eq!(stored, sale);
    }

    #[tokio::test]
    async fn test_unit_price_is_frozen() {
        let f = fixture().await;
        let sale = f
            .db
            .sales()
            .create_sale(&request(vec![SaleLineRequest::new(&f.pads.id, 1)]), &f.staff_id)
            .await
            .unwrap();

        f.db.products()
            .update(
                &f.pads.id,
                crate::ProductPatch {
                    price_cents: Some(9999),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let stored = f.db.sales().get_by_id(&sale.id).await.unwrap().unwrap();
        assert_eq!(stored.items[0].unit_price_cents, 2599);
        assert_eq!(stored.total_cents, 2599);
    }

    #[tokio::test]
    async fn test_insufficient_stock_changes_nothing() {
        let f = fixture().await;

        let err = f
            .db
            .sales()
            .create_sale(&request(vec![SaleLineRequest::new(&f.filter.id, 6)]), &f.staff_id)
            .await
            .unwrap_err();

        match err {
            DbError::Domain(CoreError::InsufficientStock {
                line_no,
                ref product,
                available,
                requested,
            }) => {
                assert_eq!(line_no, 1);
                assert_eq!(product, "Oil Filter");
                assert_eq!(available, 5);
                assert_eq!(requested, 6);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Oil Filter. Available: 5, Requested: 6"
        );

        assert_eq!(stock_of(&f.db, &f.filter.id).await, 5);
        assert_eq!(sale_count(&f.db).await, 0);

        // the counter rolled back with the transaction
        let sale = f
            .db
            .sales()
            .create_sale(&request(vec![SaleLineRequest::new(&f.filter.id, 5)]), &f.staff_id)
            .await
            .unwrap();
        assert_eq!(sale.sale_number, "SALE-000001");
        assert_eq!(stock_of(&f.db, &f.filter.id).await, 0);
    }

    #[tokio::test]
    async fn test_later_line_failure_rolls_back_earlier_decrements() {
        let f = fixture().await;

        let err = f
            .db
            .sales()
            .create_sale(
                &request(vec![
                    SaleLineRequest::new(&f.pads.id, 2),
                    SaleLineRequest::new(&f.filter.id, 50),
                ]),
                &f.staff_id,
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientStock { line_no: 2, .. })
        ));
        assert_eq!(stock_of(&f.db, &f.pads.id).await, 10);
        assert_eq!(sale_count(&f.db).await, 0);
    }

    #[tokio::test]
    async fn test_unknown_product_reports_item_and_changes_nothing() {
        let f = fixture().await;

        let err = f
            .db
            .sales()
            .create_sale(
                &request(vec![
                    SaleLineRequest::new(&f.pads.id, 1),
                    SaleLineRequest::new("no-such-product", 1),
                ]),
                &f.staff_id,
            )
            .await
            .unwrap_err();

        match &err {
            DbError::Domain(CoreError::LineProductNotFound { line_no, product_id }) => {
                assert_eq!(*line_no, 2);
                assert_eq!(product_id, "no-such-product");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(stock_of(&f.db, &f.pads.id).await, 10);
        assert_eq!(sale_count(&f.db).await, 0);
    }

    #[tokio::test]
    async fn test_deleted_product_cannot_be_sold() {
        let f = fixture().await;
        f.db.products().soft_delete(&f.filter.id).await.unwrap();

        let err = f
            .db
            .sales()
            .create_sale(&request(vec![SaleLineRequest::new(&f.filter.id, 1)]), &f.staff_id)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::LineProductNotFound { line_no: 1, .. })
        ));
    }

    #[tokio::test]
    async fn test_invalid_quantity_reports_item() {
        let f = fixture().await;

        for qty in [0, -3] {
            let err = f
                .db
                .sales()
                .create_sale(
                    &request(vec![
                        SaleLineRequest::new(&f.pads.id, 1),
                        SaleLineRequest::new(&f.filter.id, qty),
                    ]),
                    &f.staff_id,
                )
                .await
                .unwrap_err();
            assert_eq!(err.to_string(), "Valid quantity is required for item 2");
        }
        assert_eq!(stock_of(&f.db, &f.pads.id).await, 10);
    }

    #[tokio::test]
    async fn test_header_validation_order() {
        let f = fixture().await;

        let err = f
            .db
            .sales()
            .create_sale(&CreateSaleRequest::default(), &f.staff_id)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::Validation(ValidationError::EmptyItems))
        ));

        // payment method is checked before any line is looked at
        let err = f
            .db
            .sales()
            .create_sale(
                &CreateSaleRequest {
                    items: Some(vec![SaleLineRequest::new("no-such-product", 0)]),
                    ..Default::default()
                },
                &f.staff_id,
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Payment method is required");
    }

    #[tokio::test]
    async fn test_negative_total_is_rejected() {
        let f = fixture().await;

        let err = f
            .db
            .sales()
            .create_sale(
                &CreateSaleRequest {
                    discount_cents: Some(5000),
                    ..request(vec![SaleLineRequest::new(&f.filter.id, 1)])
                },
                &f.staff_id,
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DbError::Domain(CoreError::Validation(ValidationError::NegativeTotal { .. }))
        ));
        assert_eq!(stock_of(&f.db, &f.filter.id).await, 5);
        assert_eq!(sale_count(&f.db).await, 0);
    }

    #[tokio::test]
    async fn test_repeated_product_lines_share_stock() {
        let f = fixture().await;

        let err = f
            .db
            .sales()
            .create_sale(
                &request(vec![
                    SaleLineRequest::new(&f.filter.id, 3),
                    SaleLineRequest::new(&f.filter.id, 3),
                ]),
                &f.staff_id,
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientStock {
                line_no: 2,
                available: 2,
                ..
            })
        ));
        assert_eq!(stock_of(&f.db, &f.filter.id).await, 5);
    }

    #[tokio::test]
    async fn test_sale_numbers_are_sequential_and_unique() {
        let f = fixture().await;

        let mut numbers = Vec::new();
        for _ in 0..3 {
            let sale = f
                .db
                .sales()
                .create_sale(&request(vec![SaleLineRequest::new(&f.pads.id, 1)]), &f.staff_id)
                .await
                .unwrap();
            assert!(SaleNumber::is_well_formed(&sale.sale_number));
            numbers.push(sale.sale_number);
        }

        assert_eq!(numbers, vec!["SALE-000001", "SALE-000002", "SALE-000003"]);
    }

    #[tokio::test]
    async fn test_collision_uses_fallback_number() {
        let f = fixture().await;
        let first = f
            .db
            .sales()
            .create_sale(&request(vec![SaleLineRequest::new(&f.pads.id, 1)]), &f.staff_id)
            .await
            .unwrap();

        sqlx::query("UPDATE sale_counters SET value = 0 WHERE name = 'sale'")
            .execute(f.db.pool())
            .await
            .unwrap();

        let second = f
            .db
            .sales()
            .create_sale(&request(vec![SaleLineRequest::new(&f.pads.id, 1)]), &f.staff_id)
            .await
            .unwrap();

        assert_eq!(first.sale_number, "SALE-000001");
        assert_ne!(second.sale_number, first.sale_number);
        assert!(SaleNumber::is_well_formed(&second.sale_number));
        assert_eq!(SaleNumber::from(second.sale_number).sequence(), None);
    }

    #[tokio::test]
    async fn test_reconcile_counter_skips_existing_numbers() {
        let f = fixture().await;
        for _ in 0..2 {
            f.db.sales()
                .create_sale(&request(vec![SaleLineRequest::new(&f.pads.id, 1)]), &f.staff_id)
                .await
                .unwrap();
        }

        sqlx::query("UPDATE sale_counters SET value = 0 WHERE name = 'sale'")
            .execute(f.db.pool())
            .await
            .unwrap();
        f.db.sales().reconcile_counter().await.unwrap();

        let sale = f
            .db
            .sales()
            .create_sale(&request(vec![SaleLineRequest::new(&f.pads.id, 1)]), &f.staff_id)
            .await
            .unwrap();
        assert_eq!(sale.sale_number, "SALE-000003");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_sales_never_oversell() {
        let path = std::env::temp_dir().join(format!("gearbox-{}.db", Uuid::new_v4()));
        let db = Database::new(DbConfig::new(&path).max_connections(4))
            .await
            .unwrap();
        let f = fixture_with(db).await;

        let last_unit = f
            .db
            .products()
            .insert(&new_product("9999", "Timing Belt", 4599, 1))
            .await
            .unwrap();

        let sales = f.db.sales();
        let req = request(vec![SaleLineRequest::new(&last_unit.id, 1)]);
        let (a, b) = tokio::join!(
            sales.create_sale(&req, &f.staff_id),
            sales.create_sale(&req, &f.staff_id)
        );

        let results = [a, b];
        let ok = results.iter().filter(|r| r.is_ok()).count();
        let short = results
            .iter()
            .filter(|r| matches!(r, Err(DbError::Domain(CoreError::InsufficientStock { .. }))))
            .count();
        assert_eq!(ok, 1);
        assert_eq!(short, 1);
        assert_eq!(stock_of(&f.db, &last_unit.id).await, 0);

        // many buyers, five units
        let handles: Vec<_> = (0..10)
            .map(|_| {
                let sales = f.db.sales();
                let staff_id = f.staff_id.clone();
                let req = request(vec![SaleLineRequest::new(&f.filter.id, 1)]);
                tokio::spawn(async move { sales.create_sale(&req, &staff_id).await })
            })
            .collect();

        let mut sold = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                sold += 1;
            }
        }
        assert_eq!(sold, 5);
        assert_eq!(stock_of(&f.db, &f.filter.id).await, 0);

        let numbers: std::collections::HashSet<String> =
            sqlx::query_scalar("SELECT sale_number FROM sales")
                .fetch_all(f.db.pool())
                .await
                .unwrap()
                .into_iter()
                .collect();
        assert_eq!(numbers.len(), 6);

        f.db.close().await;
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
        }
    }

    #[tokio::test]
    async fn test_quote_writes_nothing() {
        let f = fixture().await;
        f.db.settings()
            .update(
                SettingsUpdate {
                    tax_rate_bps: Some(800),
                    ..Default::default()
                },
                &f.staff_id,
            )
            .await
            .unwrap();

        let quote = f
            .db
            .sales()
            .quote(&CreateSaleRequest {
                items: Some(vec![
                    SaleLineRequest::new(&f.pads.id, 2),
                    SaleLineRequest::new(&f.filter.id, 1),
                ]),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(quote.totals.subtotal_cents, 6748);
        assert_eq!(quote.suggested_tax_cents, 540);
        assert_eq!(quote.totals.total_cents, 7288);
        assert_eq!(stock_of(&f.db, &f.pads.id).await, 10);
        assert_eq!(sale_count(&f.db).await, 0);

        let err = f
            .db
            .sales()
            .quote(&request(vec![
                SaleLineRequest::new(&f.filter.id, 4),
                SaleLineRequest::new(&f.filter.id, 2),
            ]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientStock { line_no: 2, .. })
        ));
    }

    #[tokio::test]
    async fn test_list_with_date_range() {
        let f = fixture().await;
        let sales = f.db.sales();
        let day = |d: u32| Utc.with_ymd_and_hms(2026, 3, d, 12, 0, 0).unwrap();

        for d in [1, 2, 3] {
            sales
                .create_sale_at(&request(vec![SaleLineRequest::new(&f.pads.id, 1)]), &f.staff_id, day(d))
                .await
                .unwrap();
        }

        let page = sales.list(&SaleFilter::default()).await.unwrap();
        assert_eq!(page.pagination.total_items, 3);
        assert_eq!(page.sales[0].sale_date, day(3));
        assert_eq!(page.sales[0].items.len(), 1);
        assert_eq!(page.sales[0].created_by_name.as_deref(), Some("Counter Staff"));

        let page = sales
            .list(&SaleFilter {
                start_date: Some(day(2)),
                end_date: Some(day(3)),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.pagination.total_items, 1);
        assert_eq!(page.sales[0].sale_date, day(2));

        let page = sales
            .list(&SaleFilter {
                limit: 2,
                page: 2,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.sales.len(), 1);
        assert!(page.pagination.has_prev);
        assert!(!page.pagination.has_next);

        let err = sales
            .list(&SaleFilter {
                page: i64::MAX,
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));
    }

    #[tokio::test]
    async fn test_stats_and_monthly_revenue() {
        let f = fixture().await;
        let sales = f.db.sales();
        let now = Utc.with_ymd_and_hms(2026, 3, 15, 18, 0, 0).unwrap();

        let dates = [
            Utc.with_ymd_and_hms(2026, 3, 15, 9, 0, 0).unwrap(), // today
            Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap(),  // this month
            Utc.with_ymd_and_hms(2026, 1, 20, 9, 0, 0).unwrap(), // this year
            Utc.with_ymd_and_hms(2025, 12, 31, 23, 0, 0).unwrap(), // last year
        ];
        for date in dates {
            sales
                .create_sale_at(&request(vec![SaleLineRequest::new(&f.pads.id, 1)]), &f.staff_id, date)
                .await
                .unwrap();
        }
        sales
            .create_sale_at(
                &request(vec![SaleLineRequest::new(&f.filter.id, 3)]),
                &f.staff_id,
                dates[0],
            )
            .await
            .unwrap();

        let stats = sales.stats(now).await.unwrap();
        assert_eq!(stats.today.total_sales, 2);
        assert_eq!(stats.today.total_revenue_cents, 2599 + 4650);
        assert_eq!(stats.this_month.total_sales, 3);
        assert_eq!(stats.this_year.total_sales, 4);
        assert_eq!(stats.top_products[0].product_name, "Brake Pads - Front Set");
        assert_eq!(stats.top_products[0].total_quantity, 4);
        assert_eq!(stats.top_products[1].total_quantity, 3);
        assert_eq!(stats.top_products[1].total_revenue_cents, 4650);

        let report = sales.monthly_revenue(2026).await.unwrap();
        assert_eq!(report.monthly_data.len(), 12);
        assert_eq!(report.monthly_data[0].total_sales, 1);
        assert_eq!(report.monthly_data[1].total_sales, 0);
        assert_eq!(report.monthly_data[2].total_sales, 3);
        assert_eq!(report.monthly_data[2].total_revenue_cents, 2599 * 2 + 4650);
        assert_eq!(report.total_year_sales, 4);

        let last_year = sales.monthly_revenue(2025).await.unwrap();
        assert_eq!(last_year.monthly_data[11].total_sales, 1);

        assert!(sales.monthly_revenue(1969).await.unwrap_err().is_domain());
    }
}
