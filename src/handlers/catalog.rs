// src/handlers/catalog.rs

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
    models::catalog::{ServiceDto, ServiceRequest, ServiceUpdateResult, TaxDto, TaxRequest},
};

// =============================================================================
//  SERVIÇOS
// =============================================================================

// GET /api/services
#[utoipa::path(
    get,
    path = "/api/services",
    tag = "Catalog",
    responses(
        (status = 200, description = "Serviços com a contagem de clientes ativos", body = Vec<ServiceDto>)
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID do tenant")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_services(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
) -> Result<impl IntoResponse, ApiError> {
    let services = app_state
        .catalog_service
        .list_services(tenant.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(ApiResponse::ok(services))
}

// GET /api/services/{id}
#[utoipa::path(
    get,
    path = "/api/services/{id}",
    tag = "Catalog",
    responses(
        (status = 200, description = "Serviço", body = ServiceDto),
        (status = 404, description = "Serviço não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do serviço"),
        ("x-tenant-id" = Uuid, Header, description = "ID do tenant")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_service(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(service_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let service = app_state
        .catalog_service
        .get_service(tenant.0, service_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(ApiResponse::ok(service))
}

// POST /api/services
#[utoipa::path(
    post,
    path = "/api/services",
    tag = "Catalog",
    request_body = ServiceRequest,
    responses(
        (status = 201, description = "Serviço criado", body = ServiceDto),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Imposto não encontrado")
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID do tenant")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_service(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Json(payload): Json<Payload<ServiceRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let service = app_state
        .catalog_service
        .create_service(tenant.0, payload.into_inner())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(ApiResponse::created(service))
}

// PUT /api/services/{id}
#[utoipa::path(
    put,
    path = "/api/services/{id}",
    tag = "Catalog",
    request_body = ServiceRequest,
    responses(
        (status = 200, description = "Serviço atualizado; faturas vinculadas recalculadas", body = ServiceUpdateResult),
        (status = 404, description = "Serviço ou imposto não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do serviço"),
        ("x-tenant-id" = Uuid, Header, description = "ID do tenant")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_service(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(service_id): Path<Uuid>,
    Json(payload): Json<Payload<ServiceRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let result = app_state
        .catalog_service
        .update_service(tenant.0, service_id, payload.into_inner())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(ApiResponse::ok(result))
}

// DELETE /api/services/{id}
#[utoipa::path(
    delete,
    path = "/api/services/{id}",
    tag = "Catalog",
    responses(
        (status = 200, description = "Serviço excluído"),
        (status = 404, description = "Serviço não encontrado"),
        (status = 409, description = "Serviço com clientes ativos ou faturas vinculadas")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do serviço"),
        ("x-tenant-id" = Uuid, Header, description = "ID do tenant")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_service(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(service_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .catalog_service
        .delete_service(tenant.0, service_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(ApiResponse::ok(serde_json::json!({ "id": service_id })))
}

// =============================================================================
//  IMPOSTOS
// =============================================================================

// GET /api/taxes
#[utoipa::path(
    get,
    path = "/api/taxes",
    tag = "Catalog",
    responses(
        (status = 200, description = "Impostos do tenant", body = Vec<TaxDto>)
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID do tenant")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_taxes(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
) -> Result<impl IntoResponse, ApiError> {
    let taxes = app_state
        .catalog_service
        .list_taxes(tenant.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(ApiResponse::ok(taxes))
}

// POST /api/taxes
#[utoipa::path(
    post,
    path = "/api/taxes",
    tag = "Catalog",
    request_body = TaxRequest,
    responses(
        (status = 201, description = "Imposto criado", body = TaxDto),
        (status = 400, description = "Dados inválidos")
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID do tenant")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_tax(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Json(payload): Json<Payload<TaxRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let tax = app_state
        .catalog_service
        .create_tax(tenant.0, payload.into_inner())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(ApiResponse::created(tax))
}

// PUT /api/taxes/{id}
#[utoipa::path(
    put,
    path = "/api/taxes/{id}",
    tag = "Catalog",
    request_body = TaxRequest,
    responses(
        (status = 200, description = "Imposto atualizado", body = TaxDto),
        (status = 404, description = "Imposto não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do imposto"),
        ("x-tenant-id" = Uuid, Header, description = "ID do tenant")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_tax(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(tax_id): Path<Uuid>,
    Json(payload): Json<Payload<TaxRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let tax = app_state
        .catalog_service
        .update_tax(tenant.0, tax_id, payload.into_inner())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(ApiResponse::ok(tax))
}
