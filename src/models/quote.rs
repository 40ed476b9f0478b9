// src/models/quote.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::common::normalizer::KeywordTable;

// --- Linhas do banco ---

#[derive(Debug, Clone, FromRow)]
pub struct QuoteRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub client_id: Uuid,
    pub description: Option<String>,
    pub reference: Option<String>,
    // Valor fixo digitado; só vale quando a cotação não tem itens
    pub value: Decimal,
    pub status: Option<bool>,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, FromRow)]
pub struct QuoteWithClient {
    #[sqlx(flatten)]
    pub quote: QuoteRow,
    pub client_name: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct QuoteDetailRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub quote_id: Uuid,
    pub service_id: Option<Uuid>,
    pub item: i32,
    pub quantity: Decimal,
    pub total: Decimal,
}

#[derive(Debug, Clone, FromRow)]
pub struct QuoteDetailView {
    #[sqlx(flatten)]
    pub detail: QuoteDetailRow,
    pub service_name: Option<String>,
}

/// Vínculo cotação -> fatura gerada pela conversão.
#[derive(Debug, Clone, FromRow)]
pub struct QuoteAttachmentRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub quote_id: Uuid,
    pub invoice_id: Uuid,
    pub created: Option<DateTime<Utc>>,
}

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum QuoteStatus {
    Pendiente,
    Aprobada,
    Rechazada,
}

/// Texto livre -> status da cotação (usado no PATCH de status).
pub const QUOTE_STATUS_KEYWORDS: KeywordTable<Option<QuoteStatus>> = KeywordTable {
    rules: &[
        (Some(QuoteStatus::Aprobada), &["aprobad", "aceptad", "approved"]),
        (Some(QuoteStatus::Pendiente), &["pendiente", "pending", "borrador"]),
        (Some(QuoteStatus::Rechazada), &["rechazad", "anulad", "rejected"]),
    ],
    when_true: Some(QuoteStatus::Aprobada),
    when_false: Some(QuoteStatus::Pendiente),
    other: None,
};

// --- DTOs ---

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuoteDetailDto {
    pub id: Uuid,
    pub item: i32,
    pub service_id: Option<Uuid>,
    pub service_name: String,
    pub quantity: Decimal,
    pub total: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuoteDto {
    pub id: Uuid,
    pub client_id: Uuid,
    pub client_name: String,
    #[schema(example = "Implementación portal web")]
    pub description: String,
    pub reference: Option<String>,
    pub status: QuoteStatus,
    #[schema(example = "2500000.00")]
    pub total: Decimal,
    pub invoice_id: Option<Uuid>,
    pub details: Vec<QuoteDetailDto>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResult {
    pub invoice_id: Uuid,
    pub already_converted: bool,
}

// --- Requests ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuoteDetailRequest {
    pub service_id: Option<Uuid>,
    #[schema(example = "2")]
    pub quantity: Option<Decimal>,
    /// Quando ausente: preço do serviço x quantidade
    #[schema(value_type = Option<Object>)]
    pub total: Option<Value>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuoteRequest {
    pub client_id: Option<Uuid>,

    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Implementación portal web")]
    pub description: String,

    pub reference: Option<String>,

    /// Valor fixo, usado só quando não há itens
    #[schema(value_type = Option<Object>, example = "2.500.000")]
    pub value: Option<Value>,

    #[serde(default)]
    #[validate(nested)]
    pub details: Vec<QuoteDetailRequest>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuoteStatusRequest {
    #[schema(example = "Aprobada")]
    pub status: Option<String>,
}
