//! Sale routes: checkout for the counter, reports for admins.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{Datelike, Utc};
use serde::Deserialize;

use gearbox_core::checkout::{CreateSaleRequest, SaleQuote};
use gearbox_core::validation::{parse_date_bound, DateBound};
use gearbox_core::{MonthlyRevenueReport, Sale, SalesStats, DEFAULT_PAGE_SIZE};
use gearbox_db::{DbError, SaleFilter, SalePage};

use crate::auth::{AdminStaff, CurrentStaff};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/sales", get(list_sales).post(create_sale))
        .route("/api/sales/quote", post(quote_sale))
        .route("/api/sales/stats", get(sales_stats))
        .route("/api/sales/revenue/monthly", get(monthly_revenue))
        .route("/api/sales/{id}", get(get_sale))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SalesQuery {
    page: Option<i64>,
    limit: Option<i64>,
    start_date: Option<String>,
    end_date: Option<String>,
}

impl SalesQuery {
    fn into_filter(self) -> ApiResult<SaleFilter> {
        let parse = |field: &str, value: Option<String>, bound: DateBound| {
            value
                .filter(|v| !v.trim().is_empty())
                .map(|v| parse_date_bound(field, &v, bound))
                .transpose()
        };

        Ok(SaleFilter {
            page: self.page.unwrap_or(1),
            limit: self.limit.unwrap_or(DEFAULT_PAGE_SIZE),
            start_date: parse("startDate", self.start_date, DateBound::Start)?,
            end_date: parse("endDate", self.end_date, DateBound::End)?,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct YearQuery {
    year: Option<i32>,
}

/// Records a sale. Line-level failures echo the offending request line.
async fn create_sale(
    State(state): State<AppState>,
    CurrentStaff(staff): CurrentStaff,
    payload: Result<Json<CreateSaleRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Sale>)> {
    let Json(request) = payload?;

    let sale = state
        .db
        .sales()
        .create_sale(&request, &staff.id)
        .await
        .map_err(|e| echo_line(e, &request))?;

    Ok((StatusCode::CREATED, Json(sale)))
}

/// Prices a cart without recording anything.
async fn quote_sale(
    State(state): State<AppState>,
    CurrentStaff(_staff): CurrentStaff,
    payload: Result<Json<CreateSaleRequest>, JsonRejection>,
) -> ApiResult<Json<SaleQuote>> {
    let Json(request) = payload?;

    let quote = state
        .db
        .sales()
        .quote(&request)
        .await
        .map_err(|e| echo_line(e, &request))?;

    Ok(Json(quote))
}

async fn list_sales(
    State(state): State<AppState>,
    AdminStaff(_admin): AdminStaff,
    query: Result<Query<SalesQuery>, QueryRejection>,
) -> ApiResult<Json<SalePage>> {
    let Query(query) = query?;
    let filter = query.into_filter()?;
    Ok(Json(state.db.sales().list(&filter).await?))
}

async fn get_sale(
    State(state): State<AppState>,
    AdminStaff(_admin): AdminStaff,
    Path(id): Path<String>,
) -> ApiResult<Json<Sale>> {
    state
        .db
        .sales()
        .get_by_id(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Sale not found"))
}

async fn sales_stats(
    State(state): State<AppState>,
    AdminStaff(_admin): AdminStaff,
) -> ApiResult<Json<SalesStats>> {
    Ok(Json(state.db.sales().stats(Utc::now()).await?))
}

/// GET /api/sales/revenue/monthly?year=2026 (defaults to the current year)
async fn monthly_revenue(
    State(state): State<AppState>,
    AdminStaff(_admin): AdminStaff,
    query: Result<Query<YearQuery>, QueryRejection>,
) -> ApiResult<Json<MonthlyRevenueReport>> {
    let Query(query) = query?;
    let year = query.year.unwrap_or_else(|| Utc::now().year());
    Ok(Json(state.db.sales().monthly_revenue(year).await?))
}

fn echo_line(err: DbError, request: &CreateSaleRequest) -> ApiError {
    let line = match &err {
        DbError::Domain(core) => core.line_no().and_then(|n| request.line(n)).cloned(),
        _ => None,
    };

    let api_error = ApiError::from(err);
    match line {
        Some(line) => api_error.with_detail("line", line),
        None => api_error,
    }
}
