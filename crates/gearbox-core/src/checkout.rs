//! # Checkout
//!
//! Pure pricing for a sale request: resolving each line, checking it
//! against the product record, and computing totals.
//!
//! ## Flow
//! ```text
//! CreateSaleRequest
//!      │
//!      ├── lines()                  items missing/empty → ValidationError
//!      ├── require_payment_method() missing → ValidationError
//!      │
//!      ▼  for each line n (1-based), in order
//! SaleLineRequest::resolve(n) ──► LineTarget { product_id, quantity }
//!      │                               │
//!      │            (db looks up the Product)
//!      ▼                               ▼
//! price_line(target, product) ──► PricedLine (unit price frozen)
//!      │
//!      ▼
//! SaleTotals::compute(lines, tax, discount)
//!      total = subtotal + tax − discount, never negative
//! ```
//!
//! The database crate drives this inside its transaction; nothing here
//! touches storage.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{Customer, PaymentMethod, Product, ProductSummary, TaxRate};
use crate::validation::{validate_adjustment_cents, validate_quantity};

// =============================================================================
// Request Types
// =============================================================================

/// How a line refers to its product when `productId` is absent.
///
/// The cart UI sometimes sends the whole product object it scanned, so both
/// a bare id and `{ "_id": ... }` / `{ "id": ... }` are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProductRef {
    Id(String),
    Object {
        #[serde(rename = "_id", alias = "id", default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },
}

impl ProductRef {
    fn id(&self) -> Option<&str> {
        match self {
            ProductRef::Id(id) => Some(id.as_str()),
            ProductRef::Object { id } => id.as_deref(),
        }
    }
}

/// One requested line. Every field is optional on the wire so that a
/// malformed line is reported with its position instead of failing the
/// whole body at deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleLineRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<ProductRef>,
    /// Kept as raw JSON so a fractional or quoted quantity fails on its
    /// own line rather than rejecting the body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<Value>,
}

/// A line that passed shape validation and is ready to be looked up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineTarget {
    pub line_no: usize,
    pub product_id: String,
    pub quantity: i64,
}

impl SaleLineRequest {
    /// Convenience constructor for the common `productId` + `quantity` form.
    pub fn new(product_id: impl Into<String>, quantity: i64) -> Self {
        SaleLineRequest {
            product_id: Some(product_id.into()),
            product: None,
            quantity: Some(Value::from(quantity)),
        }
    }

    /// The product id, preferring `productId` over `product`. A blank
    /// `productId` falls through to `product`.
    pub fn product_id(&self) -> Option<&str> {
        fn non_blank(id: &str) -> Option<&str> {
            Some(id.trim()).filter(|id| !id.is_empty())
        }

        self.product_id
            .as_deref()
            .and_then(non_blank)
            .or_else(|| self.product.as_ref().and_then(ProductRef::id).and_then(non_blank))
    }

    /// The quantity when it is a whole JSON number.
    pub fn quantity(&self) -> Option<i64> {
        self.quantity.as_ref().and_then(Value::as_i64)
    }

    /// Checks the line's shape. `line_no` is 1-based.
    pub fn resolve(&self, line_no: usize) -> CoreResult<LineTarget> {
        let product_id = self.product_id().ok_or_else(|| ValidationError::LineItem {
            line_no,
            reason: "Product ID is required".to_string(),
        })?;

        let quantity = self
            .quantity()
            .filter(|q| validate_quantity(*q).is_ok())
            .ok_or_else(|| ValidationError::LineItem {
                line_no,
                reason: "Valid quantity is required".to_string(),
            })?;

        Ok(LineTarget {
            line_no,
            product_id: product_id.to_string(),
            quantity,
        })
    }
}

/// Body of `POST /api/sales` and `POST /api/sales/quote`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSaleRequest {
    #[serde(default)]
    pub items: Option<Vec<SaleLineRequest>>,
    #[serde(default)]
    pub customer: Option<Customer>,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default)]
    pub tax_cents: Option<i64>,
    #[serde(default)]
    pub discount_cents: Option<i64>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CreateSaleRequest {
    /// The requested lines; fails when missing or empty.
    pub fn lines(&self) -> CoreResult<&[SaleLineRequest]> {
        match self.items.as_deref() {
            Some(items) if !items.is_empty() => Ok(items),
            _ => Err(ValidationError::EmptyItems.into()),
        }
    }

    pub fn require_payment_method(&self) -> CoreResult<PaymentMethod> {
        self.payment_method.ok_or_else(|| {
            ValidationError::Required {
                field: "Payment method".to_string(),
            }
            .into()
        })
    }

    /// The line at 1-based `line_no`, for echoing back in error details.
    pub fn line(&self, line_no: usize) -> Option<&SaleLineRequest> {
        line_no
            .checked_sub(1)
            .and_then(|idx| self.items.as_ref()?.get(idx))
    }
}

// =============================================================================
// Pricing
// =============================================================================

/// A line priced against the current product record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PricedLine {
    pub line_no: usize,
    pub product: ProductSummary,
    pub quantity: i64,
    /// Copied from the product at pricing time.
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
    /// Stock before this sale.
    pub available_stock: i64,
}

impl PricedLine {
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }
}

/// Checks stock and prices one line.
///
/// ```rust
/// use chrono::Utc;
/// use gearbox_core::checkout::{price_line, LineTarget};
/// use gearbox_core::types::Product;
///
/// let pads = Product {
///     id: "p1".into(),
///     barcode: "1234567890123".into(),
///     name: "Brake Pads - Front Set".into(),
///     description: None,
///     price_cents: 2599,
///     stock: 10,
///     category_id: None,
///     manufacturer: Some("Brembo".into()),
///     part_number: None,
///     is_active: true,
///     created_at: Utc::now(),
///     updated_at: Utc::now(),
/// };
/// let target = LineTarget { line_no: 1, product_id: "p1".into(), quantity: 2 };
/// let line = price_line(&target, &pads).unwrap();
/// assert_eq!(line.line_total_cents, 5198);
/// ```
pub fn price_line(target: &LineTarget, product: &Product) -> CoreResult<PricedLine> {
    if !product.can_sell(target.quantity) {
        return Err(CoreError::InsufficientStock {
            line_no: target.line_no,
            product: product.name.clone(),
            available: product.stock,
            requested: target.quantity,
        });
    }

    let unit_price = product.price();
    let line_total = unit_price
        .checked_multiply_quantity(target.quantity)
        .ok_or_else(|| ValidationError::LineItem {
            line_no: target.line_no,
            reason: "Line total is too large".to_string(),
        })?;

    Ok(PricedLine {
        line_no: target.line_no,
        product: product.summary(),
        quantity: target.quantity,
        unit_price_cents: unit_price.cents(),
        line_total_cents: line_total.cents(),
        available_stock: product.stock,
    })
}

// =============================================================================
// Totals
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SaleTotals {
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,
}

impl SaleTotals {
    /// Computes `subtotal + tax − discount`.
    ///
    /// Missing tax or discount counts as zero. Negative adjustments and a
    /// negative total are rejected.
    pub fn compute(
        lines: &[PricedLine],
        tax_cents: Option<i64>,
        discount_cents: Option<i64>,
    ) -> CoreResult<Self> {
        let tax = tax_cents.unwrap_or(0);
        let discount = discount_cents.unwrap_or(0);
        validate_adjustment_cents("taxCents", tax)?;
        validate_adjustment_cents("discountCents", discount)?;

        let overflow = || ValidationError::OutOfRange {
            field: "total".to_string(),
            min: 0,
            max: i64::MAX,
        };

        let subtotal = lines
            .iter()
            .try_fold(Money::zero(), |acc, line| acc.checked_add(line.line_total()))
            .ok_or_else(overflow)?;

        let total = subtotal
            .checked_add(Money::from_cents(tax))
            .ok_or_else(overflow)?
            - Money::from_cents(discount);

        if total.is_negative() {
            return Err(ValidationError::NegativeTotal {
                total_cents: total.cents(),
            }
            .into());
        }

        Ok(SaleTotals {
            subtotal_cents: subtotal.cents(),
            tax_cents: tax,
            discount_cents: discount,
            total_cents: total.cents(),
        })
    }

    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }

    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Quote
// =============================================================================

/// Read-only pricing of a cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SaleQuote {
    pub items: Vec<PricedLine>,
    /// Store tax rate the suggestion was computed with.
    pub tax_rate_bps: u32,
    pub suggested_tax_cents: i64,
    /// Totals using the caller's tax, or the suggested tax when none was sent.
    pub totals: SaleTotals,
}

impl SaleQuote {
    pub fn build(
        items: Vec<PricedLine>,
        rate: TaxRate,
        tax_cents: Option<i64>,
        discount_cents: Option<i64>,
    ) -> CoreResult<Self> {
        let subtotal = items
            .iter()
            .try_fold(Money::zero(), |acc, line| acc.checked_add(line.line_total()))
            .ok_or_else(|| ValidationError::OutOfRange {
                field: "subtotal".to_string(),
                min: 0,
                max: i64::MAX,
            })?;
        let suggested = subtotal.calculate_tax(rate);
        let totals = SaleTotals::compute(
            &items,
            Some(tax_cents.unwrap_or(suggested.cents())),
            discount_cents,
        )?;

        Ok(SaleQuote {
            items,
            tax_rate_bps: rate.bps(),
            suggested_tax_cents: suggested.cents(),
            totals,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn product(id: &str, name: &str, price_cents: i64, stock: i64) -> Product {
        Product {
            id: id.to_string(),
            barcode: format!("BC-{id}"),
            name: name.to_string(),
            description: None,
            price_cents,
            stock,
            category_id: None,
            manufacturer: None,
            part_number: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn priced(id: &str, price_cents: i64, qty: i64, line_no: usize) -> PricedLine {
        let target = SaleLineRequest::new(id, qty).resolve(line_no).unwrap();
        price_line(&target, &product(id, id, price_cents, 100)).unwrap()
    }

    #[test]
    fn test_resolve_prefers_product_id() {
        let line: SaleLineRequest = serde_json::from_value(serde_json::json!({
            "productId": "a",
            "product": "b",
            "quantity": 1
        }))
        .unwrap();
        assert_eq!(line.resolve(1).unwrap().product_id, "a");
    }

    #[test]
    fn test_resolve_blank_product_id_falls_through_to_product() {
        let line: SaleLineRequest = serde_json::from_value(serde_json::json!({
            "productId": "",
            "product": { "_id": "p-1" },
            "quantity": 1
        }))
        .unwrap();
        assert_eq!(line.resolve(1).unwrap().product_id, "p-1");

        let line: SaleLineRequest = serde_json::from_value(serde_json::json!({
            "productId": "   ",
            "product": "p-2",
            "quantity": 1
        }))
        .unwrap();
        assert_eq!(line.product_id(), Some("p-2"));

        let line: SaleLineRequest = serde_json::from_value(serde_json::json!({
            "productId": "",
            "product": { "_id": "" },
            "quantity": 1
        }))
        .unwrap();
        assert!(line.resolve(1).is_err());
    }

    #[test]
    fn test_resolve_accepts_nested_product_object() {
        let line: SaleLineRequest = serde_json::from_value(serde_json::json!({
            "product": { "_id": "p-9", "name": "Oil Filter" },
            "quantity": 3
        }))
        .unwrap();
        let target = line.resolve(1).unwrap();
        assert_eq!(target.product_id, "p-9");
        assert_eq!(target.quantity, 3);

        let line: SaleLineRequest = serde_json::from_value(serde_json::json!({
            "product": { "id": "p-10" },
            "quantity": 1
        }))
        .unwrap();
        assert_eq!(line.product_id(), Some("p-10"));
    }

    #[test]
    fn test_resolve_missing_product_id() {
        let line = SaleLineRequest {
            quantity: Some(Value::from(1)),
            ..Default::default()
        };
        let err = line.resolve(2).unwrap_err();
        assert_eq!(err.to_string(), "Product ID is required for item 2");
        assert_eq!(err.line_no(), Some(2));
    }

    #[test]
    fn test_resolve_rejects_non_positive_quantity() {
        for qty in [Some(0), Some(-1), None] {
            let line = SaleLineRequest {
                product_id: Some("p".to_string()),
                quantity: qty.map(Value::from),
                ..Default::default()
            };
            let err = line.resolve(1).unwrap_err();
            assert_eq!(err.to_string(), "Valid quantity is required for item 1");
        }
    }

    #[test]
    fn test_non_integer_quantity_is_reported_on_its_line() {
        let req: CreateSaleRequest = serde_json::from_value(serde_json::json!({
            "items": [
                { "productId": "a", "quantity": 1 },
                { "productId": "b", "quantity": 1.5 },
                { "productId": "c", "quantity": "2" }
            ],
            "paymentMethod": "cash"
        }))
        .unwrap();
        let lines = req.lines().unwrap();

        assert_eq!(lines[0].resolve(1).unwrap().quantity, 1);

        let err = lines[1].resolve(2).unwrap_err();
        assert_eq!(err.to_string(), "Valid quantity is required for item 2");
        assert_eq!(err.line_no(), Some(2));

        let err = lines[2].resolve(3).unwrap_err();
        assert_eq!(err.line_no(), Some(3));
    }

    #[test]
    fn test_request_header_checks() {
        let empty = CreateSaleRequest::default();
        assert!(matches!(
            empty.lines(),
            Err(CoreError::Validation(ValidationError::EmptyItems))
        ));

        let req = CreateSaleRequest {
            items: Some(vec![]),
            ..Default::default()
        };
        assert!(req.lines().is_err());

        let err = req.require_payment_method().unwrap_err();
        assert_eq!(err.to_string(), "Payment method is required");
    }

    #[test]
    fn test_request_line_lookup_is_one_based() {
        let req = CreateSaleRequest {
            items: Some(vec![SaleLineRequest::new("a", 1), SaleLineRequest::new("b", 2)]),
            ..Default::default()
        };
        assert_eq!(req.line(2).and_then(|l| l.product_id()), Some("b"));
        assert!(req.line(0).is_none());
        assert!(req.line(3).is_none());
    }

    #[test]
    fn test_unknown_payment_method_fails_to_deserialize() {
        let res: Result<CreateSaleRequest, _> = serde_json::from_value(serde_json::json!({
            "items": [],
            "paymentMethod": "crypto"
        }));
        assert!(res.is_err());
    }

    #[test]
    fn test_price_line_insufficient_stock() {
        let target = SaleLineRequest::new("p", 5).resolve(1).unwrap();
        let err = price_line(&target, &product("p", "Brake Pads", 2599, 3)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Brake Pads. Available: 3, Requested: 5"
        );
    }

    #[test]
    fn test_price_line_exact_stock_is_allowed() {
        let target = SaleLineRequest::new("p", 3).resolve(1).unwrap();
        let line = price_line(&target, &product("p", "Brake Pads", 2599, 3)).unwrap();
        assert_eq!(line.line_total_cents, 7797);
        assert_eq!(line.available_stock, 3);
    }

    #[test]
    fn test_totals_reference_cart() {
        // Brake pads $25.99 × 2 + oil filter $15.50 × 1, tax $5.40
        let lines = vec![priced("pads", 2599, 2, 1), priced("filter", 1550, 1, 2)];
        let totals = SaleTotals::compute(&lines, Some(540), None).unwrap();
        assert_eq!(totals.subtotal_cents, 6748);
        assert_eq!(totals.tax_cents, 540);
        assert_eq!(totals.discount_cents, 0);
        assert_eq!(totals.total_cents, 7288);
    }

    #[test]
    fn test_totals_reject_negative_total() {
        let lines = vec![priced("wiper", 1000, 1, 1)];
        let err = SaleTotals::compute(&lines, None, Some(1500)).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::NegativeTotal { total_cents: -500 })
        ));

        // a discount equal to the total is fine
        let totals = SaleTotals::compute(&lines, Some(100), Some(1100)).unwrap();
        assert_eq!(totals.total_cents, 0);
    }

    #[test]
    fn test_totals_reject_negative_adjustments() {
        let lines = vec![priced("wiper", 1000, 1, 1)];
        assert!(SaleTotals::compute(&lines, Some(-1), None).is_err());
        assert!(SaleTotals::compute(&lines, None, Some(-1)).is_err());
    }

    #[test]
    fn test_quote_suggests_tax() {
        let lines = vec![priced("pads", 2599, 2, 1), priced("filter", 1550, 1, 2)];
        let quote = SaleQuote::build(lines.clone(), TaxRate::from_bps(800), None, None).unwrap();
        assert_eq!(quote.suggested_tax_cents, 540);
        assert_eq!(quote.totals.total_cents, 7288);

        let quote = SaleQuote::build(lines, TaxRate::from_bps(800), Some(0), Some(48)).unwrap();
        assert_eq!(quote.suggested_tax_cents, 540);
        assert_eq!(quote.totals.total_cents, 6700);
    }

    #[test]
    fn test_quote_subtotal_overflow_is_an_error() {
        let huge = i64::MAX / 2 + 1;
        let lines = vec![priced("a", huge, 1, 1), priced("b", huge, 1, 2)];
        let err = SaleQuote::build(lines, TaxRate::from_bps(800), None, None).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::OutOfRange { .. })
        ));
    }
}
