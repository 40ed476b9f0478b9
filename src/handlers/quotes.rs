// src/handlers/quotes.rs

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
        mail::{EmailMessage, SendEmailRequest},
        quote::{ConversionResult, CreateQuoteRequest, QuoteDto, UpdateQuoteStatusRequest},
    },
};

// GET /api/quotes
#[utoipa::path(
    get,
    path = "/api/quotes",
    tag = "Quotes",
    responses(
        (status = 200, description = "Cotações com itens e total", body = Vec<QuoteDto>)
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID do tenant")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_quotes(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
) -> Result<impl IntoResponse, ApiError> {
    let quotes = app_state
        .quote_service
        .list_quotes(tenant.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(ApiResponse::ok(quotes))
}

// GET /api/quotes/{id}
#[utoipa::path(
    get,
    path = "/api/quotes/{id}",
    tag = "Quotes",
    responses(
        (status = 200, description = "Cotação", body = QuoteDto),
        (status = 404, description = "Cotação não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da cotação"),
        ("x-tenant-id" = Uuid, Header, description = "ID do tenant")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_quote(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(quote_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let quote = app_state
        .quote_service
        .get_quote(tenant.0, quote_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(ApiResponse::ok(quote))
}

// POST /api/quotes
#[utoipa::path(
    post,
    path = "/api/quotes",
    tag = "Quotes",
    request_body = CreateQuoteRequest,
    responses(
        (status = 201, description = "Cotação criada", body = QuoteDto),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Cliente ou serviço não encontrado")
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID do tenant")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_quote(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Json(payload): Json<Payload<CreateQuoteRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let quote = app_state
        .quote_service
        .create_quote(tenant.0, payload.into_inner())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(ApiResponse::created(quote))
}

// PATCH /api/quotes/{id}/status
#[utoipa::path(
    patch,
    path = "/api/quotes/{id}/status",
    tag = "Quotes",
    request_body = UpdateQuoteStatusRequest,
    responses(
        (status = 200, description = "Status atualizado", body = QuoteDto),
        (status = 400, description = "Status não reconhecido")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da cotação"),
        ("x-tenant-id" = Uuid, Header, description = "ID do tenant")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_quote_status(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(quote_id): Path<Uuid>,
    Json(payload): Json<Payload<UpdateQuoteStatusRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let quote = app_state
        .quote_service
        .update_status(tenant.0, quote_id, payload.into_inner())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(ApiResponse::ok(quote))
}

// POST /api/quotes/{id}/convert
#[utoipa::path(
    post,
    path = "/api/quotes/{id}/convert",
    tag = "Quotes",
    responses(
        (status = 201, description = "Fatura gerada a partir da cotação", body = ConversionResult),
        (status = 200, description = "Cotação já convertida; devolve a fatura existente", body = ConversionResult),
        (status = 404, description = "Cotação não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da cotação"),
        ("x-tenant-id" = Uuid, Header, description = "ID do tenant")
    ),
    security(("api_jwt" = []))
)]
pub async fn convert_quote(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(quote_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let result = app_state
        .quote_service
        .convert_to_invoice(tenant.0, quote_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    if result.already_converted {
        Ok(ApiResponse::ok(result))
    } else {
        Ok(ApiResponse::created(result))
    }
}

// POST /api/quotes/{id}/send
#[utoipa::path(
    post,
    path = "/api/quotes/{id}/send",
    tag = "Quotes",
    request_body = SendEmailRequest,
    responses(
        (status = 200, description = "Mensagem montada para o destinatário", body = EmailMessage),
        (status = 400, description = "Destinatário ausente ou inválido")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da cotação"),
        ("x-tenant-id" = Uuid, Header, description = "ID do tenant")
    ),
    security(("api_jwt" = []))
)]
pub async fn send_quote(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(quote_id): Path<Uuid>,
    Json(payload): Json<Payload<SendEmailRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let message = app_state
        .quote_service
        .send_email(tenant.0, quote_id, payload.into_inner())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(ApiResponse::ok(message))
}
