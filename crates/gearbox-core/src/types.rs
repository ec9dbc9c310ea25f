//! # Domain Types
//!
//! Core domain types used throughout Gearbox POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Category     │◄──│    Product      │◄──│    SaleItem     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  line_no        │       │
//! │  │  name (unique,  │   │  barcode (uniq) │   │  quantity       │       │
//! │  │   ci)           │   │  price_cents    │   │  unit_price     │       │
//! │  └─────────────────┘   │  stock ≥ 0      │   │   (frozen)      │       │
//! │                        └─────────────────┘   └────────┬────────┘       │
//! │                                                       │ 1..n           │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌────────┴────────┐       │
//! │  │    Settings     │   │     Staff       │◄──│      Sale       │       │
//! │  │  (singleton)    │   │  role           │   │  sale_number    │       │
//! │  │  tax_rate_bps   │   │  admin | staff  │   │  totals         │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID: (barcode, sale_number, category name) - human-facing

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// 1 basis point = 0.01%, so 825 bps = 8.25%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// A sellable car part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Scanned barcode (EAN-13 for most parts). Unique across the catalog.
    pub barcode: String,

    pub name: String,

    pub description: Option<String>,

    /// Current price in cents. Sales copy this value at checkout.
    pub price_cents: i64,

    /// Units on hand. Never negative; the sale workflow only decrements it.
    pub stock: i64,

    pub category_id: Option<String>,

    /// Brand, e.g. "Brembo" or "NGK".
    pub manufacturer: Option<String>,

    /// Manufacturer part number, e.g. "BP-FRONT-001".
    pub part_number: Option<String>,

    /// Soft-delete flag.
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Whether `quantity` units can be taken from stock.
    #[inline]
    pub fn can_sell(&self, quantity: i64) -> bool {
        self.stock >= quantity
    }

    /// Display-friendly reference used inside sale line items.
    pub fn summary(&self) -> ProductSummary {
        ProductSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            barcode: self.barcode.clone(),
            manufacturer: self.manufacturer.clone(),
        }
    }
}

/// The product fields shown next to a sale line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProductSummary {
    pub id: String,
    pub name: String,
    pub barcode: String,
    pub manufacturer: Option<String>,
}

/// A named product grouping ("Brake System", "Filters", ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Category {
    pub id: String,
    /// Unique, compared case-insensitively.
    pub name: String,
    pub description: String,
    pub is_active: bool,
    pub created_by: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Per-category inventory figures for the admin overview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CategoryStats {
    pub category_id: String,
    pub category_name: String,
    pub product_count: i64,
    pub total_stock: i64,
    pub average_price_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CategoryOverview {
    pub total_categories: i64,
    pub total_products: i64,
    /// Busiest categories first.
    pub category_stats: Vec<CategoryStats>,
}

// =============================================================================
// Staff
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum StaffRole {
    /// Catalog, settings and reporting access.
    Admin,
    /// Checkout only.
    Staff,
}

/// A person who records sales.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Staff {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub role: StaffRole,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Staff {
    #[inline]
    pub fn is_admin(&self) -> bool {
        self.role == StaffRole::Admin
    }
}

// =============================================================================
// Payment
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum PaymentMethod {
    Cash,
    Card,
    BankTransfer,
    Check,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum PaymentStatus {
    Pending,
    /// Every sale recorded at the counter is paid on the spot.
    #[default]
    Completed,
    Failed,
    Refunded,
}

// =============================================================================
// Sale
// =============================================================================

/// Optional customer contact captured at checkout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct Customer {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// A completed sale. Immutable once persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Sale {
    pub id: String,
    /// `SALE-000042`, or the timestamp fallback form.
    pub sale_number: String,
    pub items: Vec<SaleItem>,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub discount_cents: i64,
    /// subtotal + tax − discount
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub customer: Customer,
    pub notes: String,
    #[ts(as = "String")]
    pub sale_date: DateTime<Utc>,
    /// Staff id of whoever recorded the sale.
    pub created_by: String,
    /// Resolved on read.
    pub created_by_name: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Sale {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// Total units across all lines.
    pub fn unit_count(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }
}

/// A line in a sale.
/// Snapshot pattern: the unit price is frozen at time of sale, so later
/// catalog price changes never rewrite history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SaleItem {
    pub id: String,
    /// 1-based position in the original request.
    pub line_no: i64,
    pub product: ProductSummary,
    pub quantity: i64,
    pub unit_price_cents: i64,
    /// unit_price × quantity
    pub line_total_cents: i64,
}

impl SaleItem {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }
}

// =============================================================================
// Settings
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub enum Currency {
    #[default]
    Usd,
    Eur,
    Gbp,
    Inr,
}

impl Currency {
    pub const ALL: [Currency; 4] = [Currency::Usd, Currency::Eur, Currency::Gbp, Currency::Inr];

    pub fn name(&self) -> &'static str {
        match self {
            Currency::Usd => "US Dollar",
            Currency::Eur => "Euro",
            Currency::Gbp => "British Pound",
            Currency::Inr => "Indian Rupee",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Usd => "$",
            Currency::Eur => "€",
            Currency::Gbp => "£",
            Currency::Inr => "₹",
        }
    }

    /// Locale the frontend should format amounts with.
    pub fn locale(&self) -> &'static str {
        match self {
            Currency::Usd => "en-US",
            Currency::Eur => "de-DE",
            Currency::Gbp => "en-GB",
            Currency::Inr => "en-IN",
        }
    }
}

/// A selectable currency as the settings screen shows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CurrencyInfo {
    pub code: Currency,
    pub name: String,
    pub symbol: String,
    pub locale: String,
}

impl From<Currency> for CurrencyInfo {
    fn from(code: Currency) -> Self {
        CurrencyInfo {
            code,
            name: code.name().to_string(),
            symbol: code.symbol().to_string(),
            locale: code.locale().to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Language {
    #[default]
    En,
    Es,
    Fr,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub enum Timezone {
    #[default]
    Utc,
    Est,
    Pst,
    Cst,
    Ist,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
pub enum DateFormat {
    #[default]
    #[serde(rename = "MM/DD/YYYY")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "MM/DD/YYYY"))]
    MonthDayYear,
    #[serde(rename = "DD/MM/YYYY")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "DD/MM/YYYY"))]
    DayMonthYear,
    #[serde(rename = "YYYY-MM-DD")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "YYYY-MM-DD"))]
    Iso,
}

/// Process-wide store settings (singleton row).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Settings {
    pub currency: Currency,
    pub language: Language,
    pub timezone: Timezone,
    pub date_format: DateFormat,

    pub email_notifications: bool,
    pub push_notifications: bool,
    pub sales_alerts: bool,
    pub low_stock_alerts: bool,

    /// Default rate the checkout screen uses to suggest tax (825 = 8.25%).
    pub tax_rate_bps: u32,

    pub company_name: String,
    pub company_address: String,
    pub company_phone: String,
    pub company_email: String,

    /// Products at or below this stock level show up as low stock.
    pub low_stock_threshold: i64,

    pub last_updated_by: Option<String>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Settings {
    #[inline]
    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.tax_rate_bps)
    }
}

/// Partial settings update; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsUpdate {
    pub currency: Option<Currency>,
    pub language: Option<Language>,
    pub timezone: Option<Timezone>,
    pub date_format: Option<DateFormat>,
    pub email_notifications: Option<bool>,
    pub push_notifications: Option<bool>,
    pub sales_alerts: Option<bool>,
    pub low_stock_alerts: Option<bool>,
    pub tax_rate_bps: Option<u32>,
    pub company_name: Option<String>,
    pub company_address: Option<String>,
    pub company_phone: Option<String>,
    pub company_email: Option<String>,
    pub low_stock_threshold: Option<i64>,
}

impl SettingsUpdate {
    /// Applies the present fields onto `settings`.
    pub fn apply_to(self, settings: &mut Settings) {
        if let Some(v) = self.currency {
            settings.currency = v;
        }
        if let Some(v) = self.language {
            settings.language = v;
        }
        if let Some(v) = self.timezone {
            settings.timezone = v;
        }
        if let Some(v) = self.date_format {
            settings.date_format = v;
        }
        if let Some(v) = self.email_notifications {
            settings.email_notifications = v;
        }
        if let Some(v) = self.push_notifications {
            settings.push_notifications = v;
        }
        if let Some(v) = self.sales_alerts {
            settings.sales_alerts = v;
        }
        if let Some(v) = self.low_stock_alerts {
            settings.low_stock_alerts = v;
        }
        if let Some(v) = self.tax_rate_bps {
            settings.tax_rate_bps = v;
        }
        if let Some(v) = self.company_name {
            settings.company_name = v;
        }
        if let Some(v) = self.company_address {
            settings.company_address = v;
        }
        if let Some(v) = self.company_phone {
            settings.company_phone = v;
        }
        if let Some(v) = self.company_email {
            settings.company_email = v;
        }
        if let Some(v) = self.low_stock_threshold {
            settings.low_stock_threshold = v;
        }
    }
}

// =============================================================================
// Reports
// =============================================================================

/// Revenue and count of completed sales in one period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PeriodTotals {
    pub total_revenue_cents: i64,
    pub total_sales: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TopProduct {
    pub product_id: String,
    pub product_name: String,
    pub total_quantity: i64,
    pub total_revenue_cents: i64,
}

/// Dashboard figures (calendar periods in UTC).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SalesStats {
    pub today: PeriodTotals,
    pub this_month: PeriodTotals,
    pub this_year: PeriodTotals,
    pub top_products: Vec<TopProduct>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct MonthlyRevenue {
    /// English month name, "January".."December".
    pub month: String,
    pub month_number: u32,
    pub total_revenue_cents: i64,
    pub total_sales: i64,
    /// Rounded half up to the cent; 0 for a month without sales.
    pub average_order_value_cents: i64,
}

impl MonthlyRevenue {
    pub fn new(month_number: u32, totals: PeriodTotals) -> Self {
        let average = if totals.total_sales > 0 {
            (totals.total_revenue_cents + totals.total_sales / 2) / totals.total_sales
        } else {
            0
        };
        MonthlyRevenue {
            month: month_name(month_number).to_string(),
            month_number,
            total_revenue_cents: totals.total_revenue_cents,
            total_sales: totals.total_sales,
            average_order_value_cents: average,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct MonthlyRevenueReport {
    pub year: i32,
    /// Always twelve entries, January first.
    pub monthly_data: Vec<MonthlyRevenue>,
    pub total_year_revenue_cents: i64,
    pub total_year_sales: i64,
}

impl MonthlyRevenueReport {
    /// Builds the zero-filled report from per-month totals (index 0 = January).
    pub fn from_months(year: i32, months: [PeriodTotals; 12]) -> Self {
        let monthly_data: Vec<MonthlyRevenue> = months
            .iter()
            .enumerate()
            .map(|(idx, totals)| MonthlyRevenue::new(idx as u32 + 1, *totals))
            .collect();

        MonthlyRevenueReport {
            year,
            total_year_revenue_cents: monthly_data.iter().map(|m| m.total_revenue_cents).sum(),
            total_year_sales: monthly_data.iter().map(|m| m.total_sales).sum(),
            monthly_data,
        }
    }
}

fn month_name(month_number: u32) -> &'static str {
    match month_number {
        1 => "January",
        2 => "February",
        3 => "March",
        4 => "April",
        5 => "May",
        6 => "June",
        7 => "July",
        8 => "August",
        9 => "September",
        10 => "October",
        11 => "November",
        12 => "December",
        _ => "",
    }
}

// =============================================================================
// Pagination
// =============================================================================

/// Page metadata returned alongside list results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Pagination {
    pub current_page: i64,
    pub total_pages: i64,
    pub total_items: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl Pagination {
    pub fn new(page: i64, limit: i64, total_items: i64) -> Self {
        let total_pages = if limit > 0 {
            (total_items + limit - 1) / limit
        } else {
            0
        };
        Pagination {
            current_page: page,
            total_pages,
            total_items,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
