// src/models/settings.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TenantSettings {
    #[schema(ignore)] // Ocultamos o ID interno, pois o contexto (Header) já define a loja
    pub tenant_id: Uuid,

    // --- SMTP ---
    #[schema(example = "smtp.mailgun.org")]
    pub smtp_host: Option<String>,

    #[schema(example = 587)]
    pub smtp_port: Option<i32>,

    pub smtp_user: Option<String>,

    #[serde(skip_serializing)] // Nunca devolvemos a senha
    #[schema(ignore)]
    pub smtp_password: Option<String>,

    #[schema(example = "facturacion@miempresa.co")]
    pub smtp_from: Option<String>,

    // --- Alertas ---
    pub alerts_enabled: bool,

    #[schema(example = 5)]
    pub alert_days_before_due: Option<i32>,

    // --- Marca ---
    #[schema(example = "Mi Empresa SAS")]
    pub company_name: Option<String>,

    #[schema(example = "https://miempresa.co/assets/logo.png")]
    pub logo_url: Option<String>,

    #[schema(example = "#0F4C81")]
    pub primary_color: Option<String>,

    pub updated_at: Option<DateTime<Utc>>,
}

impl TenantSettings {
    pub fn empty(tenant_id: Uuid) -> Self {
        Self {
            tenant_id,
            smtp_host: None,
            smtp_port: None,
            smtp_user: None,
            smtp_password: None,
            smtp_from: None,
            alerts_enabled: false,
            alert_days_before_due: None,
            company_name: None,
            logo_url: None,
            primary_color: None,
            updated_at: None,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettingsRequest {
    pub smtp_host: Option<String>,

    #[validate(range(min = 1, max = 65535, message = "invalid_port"))]
    pub smtp_port: Option<i32>,

    pub smtp_user: Option<String>,

    /// Ausente = mantém a senha atual
    pub smtp_password: Option<String>,

    #[validate(email(message = "invalid_email"))]
    pub smtp_from: Option<String>,

    #[serde(default)]
    pub alerts_enabled: bool,

    #[validate(range(min = 0, max = 90, message = "invalid_days"))]
    pub alert_days_before_due: Option<i32>,

    #[schema(example = "Mi Empresa SAS")]
    pub company_name: Option<String>,

    #[validate(url(message = "invalid_url"))]
    pub logo_url: Option<String>,

    #[schema(example = "#0F4C81")]
    pub primary_color: Option<String>,
}
