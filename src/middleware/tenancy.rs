// src/middleware/tenancy.rs

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use uuid::Uuid;

use crate::{
    common::{error::ApiError, i18n::I18nStore},
    middleware::i18n::Locale,
};

// Cabeçalho HTTP que escolhe o tenant da requisição
const TENANT_ID_HEADER: &str = "x-tenant-id";

/// Tenant da requisição. Todas as consultas ficam restritas a ele.
#[derive(Debug, Clone, Copy)]
pub struct TenantContext(pub Uuid);

impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(TENANT_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Uuid::parse_str(value.trim()).ok())
            .map(TenantContext)
            .ok_or_else(|| {
                let lang = parts
                    .headers
                    .get(axum::http::header::ACCEPT_LANGUAGE)
                    .and_then(|value| value.to_str().ok());
                let locale = Locale::from_header(lang);
                ApiError {
                    status: StatusCode::BAD_REQUEST,
                    code: "tenant_required".to_string(),
                    error: I18nStore::default().translate(&locale.0, "tenant_required"),
                    details: None,
                }
            })
    }
}
