// src/models/catalog.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// --- Linhas do banco ---

#[derive(Debug, Clone, FromRow)]
pub struct ServiceRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: Option<String>,
    pub unit: Option<String>,
    pub price: Decimal,
    pub subtotal: Decimal,
    pub frequency: Option<String>,
    pub tax_one_id: Option<Uuid>,
    pub tax_two_id: Option<Uuid>,
    pub category: Option<String>,
    pub status: Option<bool>,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
}

// Serviço + contagem de atribuições ativas (listagem)
#[derive(Debug, Clone, FromRow)]
pub struct ServiceWithUsage {
    #[sqlx(flatten)]
    pub service: ServiceRow,
    pub clients_count: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct TaxRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: Option<String>,
    pub percentage: Decimal,
    pub active: bool,
}

/// Atribuição cliente <-> serviço. As datas são texto legado do formulário.
#[derive(Debug, Clone, FromRow)]
pub struct ClientServiceRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub client_id: Uuid,
    pub service_id: Uuid,
    pub started: Option<String>,
    pub delivery: Option<String>,
    pub expiry: Option<String>,
    pub frequency: Option<String>,
    pub unit: Option<String>,
    pub url_api: Option<String>,
    pub token_api: Option<String>,
    pub status: Option<bool>,
    pub created: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ClientServiceView {
    #[sqlx(flatten)]
    pub assignment: ClientServiceRow,
    pub service_name: Option<String>,
    pub service_price: Option<Decimal>,
}

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Active,
    Inactive,
}

// --- DTOs ---

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaxDto {
    pub id: Uuid,
    #[schema(example = "Retención en la fuente")]
    pub name: String,
    #[schema(example = "4.0")]
    pub percentage: Decimal,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDto {
    pub id: Uuid,
    #[schema(example = "Hosting mensual")]
    pub name: String,
    pub unit: Option<String>,
    #[schema(example = "150000.00")]
    pub price: Decimal,
    #[schema(example = "150000.00")]
    pub subtotal: Decimal,
    pub frequency: Option<String>,
    pub tax_one_id: Option<Uuid>,
    pub tax_two_id: Option<Uuid>,
    pub category: Option<String>,
    pub status: ServiceStatus,
    pub clients_count: i64,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientServiceDto {
    pub id: Uuid,
    pub service_id: Uuid,
    pub service_name: String,
    pub price: Option<Decimal>,
    pub started: Option<String>,
    pub delivery: Option<String>,
    pub expiry: Option<String>,
    pub frequency: Option<String>,
    pub unit: Option<String>,
    pub url_api: Option<String>,
    pub token_api: Option<String>,
    pub status: ServiceStatus,
    pub created_at: Option<String>,
}

/// Resultado da atualização de um serviço: quantas faturas foram recalculadas.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceUpdateResult {
    pub service: ServiceDto,
    pub invoices_updated: usize,
}

// --- Requests ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequest {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Hosting mensual")]
    pub name: String,

    pub unit: Option<String>,

    /// Número ou texto monetário ("150.000,00")
    #[serde(default)]
    #[schema(value_type = Object, example = "150.000,00")]
    pub price: Value,

    /// Quando ausente, usa o preço
    #[schema(value_type = Option<Object>)]
    pub subtotal: Option<Value>,

    #[schema(example = "mensual")]
    pub frequency: Option<String>,
    pub tax_one_id: Option<Uuid>,
    pub tax_two_id: Option<Uuid>,
    pub category: Option<String>,
    pub status: Option<bool>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaxRequest {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "ICA")]
    pub name: String,

    #[schema(example = "0.966")]
    pub percentage: Decimal,

    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignServiceRequest {
    // Obrigatório, mas validado no service para devolver `missing_field`
    pub service_id: Option<Uuid>,
    #[schema(example = "2024-01-15")]
    pub started: Option<String>,
    pub delivery: Option<String>,
    pub expiry: Option<String>,
    pub frequency: Option<String>,
    pub unit: Option<String>,
    #[validate(url(message = "invalid_url"))]
    pub url_api: Option<String>,
    pub token_api: Option<String>,
}
