// src/handlers/invoices.rs

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
    models::{
        invoice::{CreateInvoiceRequest, InvoiceDto, ReminderDto, UpdateInvoiceStatusRequest},
        mail::{EmailMessage, SendEmailRequest},
    },
};

// GET /api/invoices
#[utoipa::path(
    get,
    path = "/api/invoices",
    tag = "Invoices",
    responses(
        (status = 200, description = "Faturas com status derivado (vencida quando passou do vencimento)", body = Vec<InvoiceDto>)
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID do tenant")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_invoices(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
) -> Result<impl IntoResponse, ApiError> {
    let invoices = app_state
        .invoice_service
        .list_invoices(tenant.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(ApiResponse::ok(invoices))
}

// GET /api/invoices/{id}
#[utoipa::path(
    get,
    path = "/api/invoices/{id}",
    tag = "Invoices",
    responses(
        (status = 200, description = "Fatura", body = InvoiceDto),
        (status = 404, description = "Fatura não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da fatura"),
        ("x-tenant-id" = Uuid, Header, description = "ID do tenant")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_invoice(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(invoice_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let invoice = app_state
        .invoice_service
        .get_invoice(tenant.0, invoice_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(ApiResponse::ok(invoice))
}

// POST /api/invoices
#[utoipa::path(
    post,
    path = "/api/invoices",
    tag = "Invoices",
    request_body = CreateInvoiceRequest,
    responses(
        (status = 201, description = "Fatura criada", body = InvoiceDto),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Cliente, serviço ou imposto não encontrado")
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID do tenant")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_invoice(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Json(payload): Json<Payload<CreateInvoiceRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let invoice = app_state
        .invoice_service
        .create_invoice(tenant.0, payload.into_inner())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(ApiResponse::created(invoice))
}

// PATCH /api/invoices/{id}/status
#[utoipa::path(
    patch,
    path = "/api/invoices/{id}/status",
    tag = "Invoices",
    request_body = UpdateInvoiceStatusRequest,
    responses(
        (status = 200, description = "Status atualizado", body = InvoiceDto),
        (status = 400, description = "Status não reconhecido")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da fatura"),
        ("x-tenant-id" = Uuid, Header, description = "ID do tenant")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_invoice_status(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(invoice_id): Path<Uuid>,
    Json(payload): Json<Payload<UpdateInvoiceStatusRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let invoice = app_state
        .invoice_service
        .update_status(tenant.0, invoice_id, payload.into_inner())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(ApiResponse::ok(invoice))
}

// POST /api/invoices/{id}/send
#[utoipa::path(
    post,
    path = "/api/invoices/{id}/send",
    tag = "Invoices",
    request_body = SendEmailRequest,
    responses(
        (status = 200, description = "Mensagem montada para o destinatário", body = EmailMessage),
        (status = 400, description = "Destinatário ausente ou inválido")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da fatura"),
        ("x-tenant-id" = Uuid, Header, description = "ID do tenant")
    ),
    security(("api_jwt" = []))
)]
pub async fn send_invoice(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(invoice_id): Path<Uuid>,
    Json(payload): Json<Payload<SendEmailRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let message = app_state
        .invoice_service
        .send_email(tenant.0, invoice_id, payload.into_inner())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(ApiResponse::ok(message))
}

// GET /api/reminders
#[utoipa::path(
    get,
    path = "/api/reminders",
    tag = "Invoices",
    responses(
        (status = 200, description = "Lembretes de cobrança projetados das faturas", body = Vec<ReminderDto>)
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID do tenant")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_reminders(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
) -> Result<impl IntoResponse, ApiError> {
    let reminders = app_state
        .invoice_service
        .list_reminders(tenant.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(ApiResponse::ok(reminders))
}
