// src/handlers/payments.rs

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    common::{
        error::ApiError,
        response::{ApiResponse, Payload},
    },
    config::AppState,
    middleware::{i18n::Locale, tenancy::TenantContext},
    models::payment::{CreatePaymentRequest, PaymentDto},
};

// GET /api/payments
#[utoipa::path(
    get,
    path = "/api/payments",
    tag = "Payments",
    responses(
        (status = 200, description = "Pagamentos do tenant", body = Vec<PaymentDto>)
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID do tenant")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_payments(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
) -> Result<impl IntoResponse, ApiError> {
    let payments = app_state
        .payment_service
        .list_payments(tenant.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(ApiResponse::ok(payments))
}

// GET /api/payments/{id}
#[utoipa::path(
    get,
    path = "/api/payments/{id}",
    tag = "Payments",
    responses(
        (status = 200, description = "Pagamento", body = PaymentDto),
        (status = 404, description = "Pagamento não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do pagamento"),
        ("x-tenant-id" = Uuid, Header, description = "ID do tenant")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_payment(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(payment_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let payment = app_state
        .payment_service
        .get_payment(tenant.0, payment_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(ApiResponse::ok(payment))
}

// POST /api/payments
#[utoipa::path(
    post,
    path = "/api/payments",
    tag = "Payments",
    request_body = CreatePaymentRequest,
    responses(
        (status = 201, description = "Pagamento registrado com itens e comprovantes", body = PaymentDto),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Cliente ou fatura não encontrado")
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID do tenant")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_payment(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Json(payload): Json<Payload<CreatePaymentRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let payment = app_state
        .payment_service
        .create_payment(tenant.0, payload.into_inner())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(ApiResponse::created(payment))
}
