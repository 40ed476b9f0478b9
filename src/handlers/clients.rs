// src/handlers/clients.rs

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
        catalog::{AssignServiceRequest, ClientServiceDto},
        client::{ClientDto, ClientRequest, ClientSummaryDto, ParameterRow},
    },
};

// GET /api/clients
#[utoipa::path(
    get,
    path = "/api/clients",
    tag = "Clients",
    responses(
        (status = 200, description = "Clientes do tenant com status e tipo derivados", body = Vec<ClientSummaryDto>)
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID do tenant")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_clients(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
) -> Result<impl IntoResponse, ApiError> {
    let clients = app_state
        .client_service
        .list_clients(tenant.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(ApiResponse::ok(clients))
}

// GET /api/clients/{id}
#[utoipa::path(
    get,
    path = "/api/clients/{id}",
    tag = "Clients",
    responses(
        (status = 200, description = "Ficha completa: detalhes, serviços, cotações, faturas, pagamentos, lembretes e histórico", body = ClientDto),
        (status = 404, description = "Cliente não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do cliente"),
        ("x-tenant-id" = Uuid, Header, description = "ID do tenant")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_client(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(client_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let client = app_state
        .client_service
        .get_client(tenant.0, client_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(ApiResponse::ok(client))
}

// POST /api/clients
#[utoipa::path(
    post,
    path = "/api/clients",
    tag = "Clients",
    request_body = ClientRequest,
    responses(
        (status = 201, description = "Cliente criado", body = ClientDto),
        (status = 400, description = "Dados inválidos")
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID do tenant")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_client(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Json(payload): Json<Payload<ClientRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let client = app_state
        .client_service
        .create_client(tenant.0, payload.into_inner())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(ApiResponse::created(client))
}

// PUT /api/clients/{id}
#[utoipa::path(
    put,
    path = "/api/clients/{id}",
    tag = "Clients",
    request_body = ClientRequest,
    responses(
        (status = 200, description = "Cliente atualizado", body = ClientDto),
        (status = 404, description = "Cliente não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do cliente"),
        ("x-tenant-id" = Uuid, Header, description = "ID do tenant")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_client(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(client_id): Path<Uuid>,
    Json(payload): Json<Payload<ClientRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let client = app_state
        .client_service
        .update_client(tenant.0, client_id, payload.into_inner())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(ApiResponse::ok(client))
}

// DELETE /api/clients/{id}
#[utoipa::path(
    delete,
    path = "/api/clients/{id}",
    tag = "Clients",
    responses(
        (status = 200, description = "Cliente e todos os registros dependentes excluídos"),
        (status = 404, description = "Cliente não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do cliente"),
        ("x-tenant-id" = Uuid, Header, description = "ID do tenant")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_client(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(client_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .client_service
        .delete_client(tenant.0, client_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(ApiResponse::ok(serde_json::json!({ "id": client_id })))
}

// POST /api/clients/{id}/services
#[utoipa::path(
    post,
    path = "/api/clients/{id}/services",
    tag = "Clients",
    request_body = AssignServiceRequest,
    responses(
        (status = 201, description = "Serviço atribuído ao cliente", body = ClientServiceDto),
        (status = 404, description = "Cliente ou serviço não encontrado"),
        (status = 409, description = "Serviço já atribuído a este cliente")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do cliente"),
        ("x-tenant-id" = Uuid, Header, description = "ID do tenant")
    ),
    security(("api_jwt" = []))
)]
pub async fn assign_service(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(client_id): Path<Uuid>,
    Json(payload): Json<Payload<AssignServiceRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let assignment = app_state
        .client_service
        .assign_service(tenant.0, client_id, payload.into_inner())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(ApiResponse::created(assignment))
}

// DELETE /api/clients/{id}/services/{service_id}
#[utoipa::path(
    delete,
    path = "/api/clients/{id}/services/{service_id}",
    tag = "Clients",
    responses(
        (status = 200, description = "Atribuição removida"),
        (status = 404, description = "Atribuição não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do cliente"),
        ("service_id" = Uuid, Path, description = "ID do serviço"),
        ("x-tenant-id" = Uuid, Header, description = "ID do tenant")
    ),
    security(("api_jwt" = []))
)]
pub async fn unassign_service(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path((client_id, service_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .client_service
        .unassign_service(tenant.0, client_id, service_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(ApiResponse::ok(serde_json::json!({ "clientId": client_id, "serviceId": service_id })))
}

// GET /api/parameters
#[utoipa::path(
    get,
    path = "/api/parameters",
    tag = "Clients",
    responses(
        (status = 200, description = "Campos configuráveis da ficha do cliente", body = Vec<ParameterRow>)
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID do tenant")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_parameters(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
) -> Result<impl IntoResponse, ApiError> {
    let parameters = app_state
        .client_service
        .list_parameters(tenant.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(ApiResponse::ok(parameters))
}
