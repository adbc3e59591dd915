//! Billing handlers for Web API.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use std::sync::Arc;

use crate::billing::UsagePeriod;
use crate::web::dto::{
    ApiResponse, DeletedResponse, InvoicePeriodQuery, InvoiceResponse, PricingResponse,
    ReconciliationResponse, UsageResponse,
};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::web::middleware::AuthUser;

/// GET /api/billing/usage - Month-to-date usage and estimated cost.
#[utoipa::path(
    get,
    path = "/billing/usage",
    tag = "billing",
    responses(
        (status = 200, description = "Current month usage", body = UsageResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_usage(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<ApiResponse<UsageResponse>>, ApiError> {
    let estimate = state
        .billing()
        .current_usage(user.user_id(), Utc::now())
        .await?;

    Ok(Json(ApiResponse::new(UsageResponse::from(&estimate))))
}

/// GET /api/billing/pricing - Effective pricing tiers.
#[utoipa::path(
    get,
    path = "/billing/pricing",
    tag = "billing",
    responses(
        (status = 200, description = "Pricing tiers", body = PricingResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_pricing(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
) -> Json<ApiResponse<PricingResponse>> {
    Json(ApiResponse::new(PricingResponse::from(&state.calculator)))
}

/// GET /api/billing/invoices - Latest invoices, newest first.
#[utoipa::path(
    get,
    path = "/billing/invoices",
    tag = "billing",
    responses(
        (status = 200, description = "Invoice history", body = Vec<InvoiceResponse>),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_invoices(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<ApiResponse<Vec<InvoiceResponse>>>, ApiError> {
    let invoices = state.billing().list_invoices(user.user_id()).await?;
    let responses = invoices.iter().map(InvoiceResponse::summary).collect();

    Ok(Json(ApiResponse::new(responses)))
}

/// POST /api/billing/invoices - Generate the invoice for a closed month.
///
/// Defaults to the previous calendar month.
#[utoipa::path(
    post,
    path = "/billing/invoices",
    tag = "billing",
    params(InvoicePeriodQuery),
    responses(
        (status = 201, description = "Invoice generated", body = InvoiceResponse),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Invoice already exists"),
        (status = 422, description = "Invalid or open billing period")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn generate_invoice(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(query): Query<InvoicePeriodQuery>,
) -> Result<(StatusCode, Json<ApiResponse<InvoiceResponse>>), ApiError> {
    let now = Utc::now();
    let period = match (query.year, query.month) {
        (Some(year), Some(month)) => UsagePeriod::new(year, month),
        (None, None) => UsagePeriod::previous_closed(now),
        _ => {
            return Err(ApiError::unprocessable(
                "year and month must be given together",
            ))
        }
    }
    .map_err(|e| ApiError::unprocessable(e.to_string()))?;

    let invoice = state
        .billing()
        .generate_invoice(user.user_id(), period, now)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(InvoiceResponse::detail(&invoice))),
    ))
}

/// GET /api/billing/invoices/:id - Invoice detail with breakdown.
#[utoipa::path(
    get,
    path = "/billing/invoices/{id}",
    tag = "billing",
    params(
        ("id" = i64, Path, description = "Invoice ID")
    ),
    responses(
        (status = 200, description = "Invoice detail", body = InvoiceResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Invoice not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_invoice(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(invoice_id): Path<i64>,
) -> Result<Json<ApiResponse<InvoiceResponse>>, ApiError> {
    let invoice = state
        .billing()
        .get_invoice(user.user_id(), invoice_id)
        .await?;

    Ok(Json(ApiResponse::new(InvoiceResponse::detail(&invoice))))
}

/// GET /api/billing/invoices/:id/reconcile - Compare an invoice with current data.
#[utoipa::path(
    get,
    path = "/billing/invoices/{id}/reconcile",
    tag = "billing",
    params(
        ("id" = i64, Path, description = "Invoice ID")
    ),
    responses(
        (status = 200, description = "Reconciliation report", body = ReconciliationResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Invoice not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn reconcile_invoice(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(invoice_id): Path<i64>,
) -> Result<Json<ApiResponse<ReconciliationResponse>>, ApiError> {
    let reconciliation = state
        .billing()
        .reconcile_invoice(user.user_id(), invoice_id)
        .await?;

    Ok(Json(ApiResponse::new(reconciliation.into())))
}

/// DELETE /api/billing/invoices/:id - Delete an unpaid invoice.
#[utoipa::path(
    delete,
    path = "/billing/invoices/{id}",
    tag = "billing",
    params(
        ("id" = i64, Path, description = "Invoice ID")
    ),
    responses(
        (status = 200, description = "Invoice deleted", body = DeletedResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Invoice not found"),
        (status = 409, description = "Invoice is settled")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_invoice(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(invoice_id): Path<i64>,
) -> Result<Json<ApiResponse<DeletedResponse>>, ApiError> {
    state
        .billing()
        .delete_invoice(user.user_id(), invoice_id)
        .await?;

    Ok(Json(ApiResponse::new(DeletedResponse {
        id: invoice_id,
        deleted: true,
    })))
}
