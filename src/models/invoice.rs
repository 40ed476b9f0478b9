// src/models/invoice.rs

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
pub struct InvoiceRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub client_id: Uuid,
    pub service_id: Option<Uuid>,
    pub number: Option<String>,
    pub description: Option<String>,
    pub subtotal: Decimal,
    pub tax_one_id: Option<Uuid>,
    pub tax_two_id: Option<Uuid>,
    pub tax_one_amount: Decimal,
    pub tax_two_amount: Decimal,
    pub include_vat: bool,
    pub vat_amount: Decimal,
    pub total: Decimal,
    // true = paga, false = anulada, null = em aberto (vencida ou não)
    pub status: Option<bool>,
    pub expiry: Option<DateTime<Utc>>,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, FromRow)]
pub struct InvoiceWithClient {
    #[sqlx(flatten)]
    pub invoice: InvoiceRow,
    pub client_name: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct InvoiceDetailRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub invoice_id: Uuid,
    pub service_id: Option<Uuid>,
    pub item: i32,
    pub description: Option<String>,
    pub quantity: Decimal,
    pub total: Decimal,
}

#[derive(Debug, Clone, FromRow)]
pub struct InvoiceAttachmentRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub invoice_id: Uuid,
    pub url: String,
    pub created: Option<DateTime<Utc>>,
}

/// Valores monetários recalculados de uma fatura.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceAmounts {
    pub subtotal: Decimal,
    pub tax_one_id: Option<Uuid>,
    pub tax_two_id: Option<Uuid>,
    pub tax_one_amount: Decimal,
    pub tax_two_amount: Decimal,
    pub include_vat: bool,
    pub vat_amount: Decimal,
    pub total: Decimal,
}

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Paid,
    Pending,
    Overdue,
    Cancelled,
}

/// Texto livre -> status da fatura.
pub const INVOICE_STATUS_KEYWORDS: KeywordTable<Option<InvoiceStatus>> = KeywordTable {
    rules: &[
        (Some(InvoiceStatus::Paid), &["pagada", "pagado", "paid"]),
        (Some(InvoiceStatus::Pending), &["pendiente", "pending", "por pagar", "abierta"]),
        (Some(InvoiceStatus::Cancelled), &["anulada", "anulado", "cancelada", "cancelled"]),
        (Some(InvoiceStatus::Overdue), &["vencida", "overdue", "mora"]),
    ],
    when_true: Some(InvoiceStatus::Paid),
    when_false: Some(InvoiceStatus::Pending),
    other: None,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReminderStatus {
    Enviado,
    Pendiente,
}

// --- DTOs ---

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDetailDto {
    pub id: Uuid,
    pub item: i32,
    pub service_id: Option<Uuid>,
    pub description: Option<String>,
    pub quantity: Decimal,
    pub total: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentDto {
    pub id: Uuid,
    pub url: String,
    pub invoice_id: Option<Uuid>,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDto {
    pub id: Uuid,
    pub client_id: Uuid,
    pub client_name: String,
    pub service_id: Option<Uuid>,
    #[schema(example = "FE-1024")]
    pub number: String,
    pub description: Option<String>,
    pub subtotal: Decimal,
    pub tax_one_amount: Decimal,
    pub tax_two_amount: Decimal,
    pub include_vat: bool,
    pub vat_amount: Decimal,
    pub total: Decimal,
    pub status: InvoiceStatus,
    pub expiry: Option<String>,
    pub details: Vec<InvoiceDetailDto>,
    pub attachments: Vec<AttachmentDto>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Lembrete de cobrança. Não é persistido: é projetado das faturas em aberto.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReminderDto {
    pub invoice_id: Uuid,
    pub client_id: Uuid,
    pub invoice_number: String,
    pub amount: Decimal,
    pub due_date: Option<String>,
    pub status: ReminderStatus,
}

// --- Requests ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDetailRequest {
    pub service_id: Option<Uuid>,
    pub description: Option<String>,
    pub quantity: Option<Decimal>,
    #[schema(value_type = Option<Object>)]
    pub total: Option<Value>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoiceRequest {
    pub client_id: Option<Uuid>,
    pub service_id: Option<Uuid>,
    #[schema(example = "FE-1024")]
    pub number: Option<String>,
    pub description: Option<String>,

    /// Quando ausente, soma dos itens
    #[schema(value_type = Option<Object>, example = "1.000.000,00")]
    pub subtotal: Option<Value>,

    pub tax_one_id: Option<Uuid>,
    pub tax_two_id: Option<Uuid>,

    #[serde(default)]
    pub include_vat: bool,

    pub expiry: Option<DateTime<Utc>>,

    #[serde(default)]
    #[validate(nested)]
    pub details: Vec<InvoiceDetailRequest>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInvoiceStatusRequest {
    #[schema(example = "Pagada")]
    pub status: Option<String>,
}
