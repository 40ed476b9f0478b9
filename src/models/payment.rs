// src/models/payment.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{common::normalizer::KeywordTable, models::invoice::AttachmentDto};

// --- Linhas do banco ---

#[derive(Debug, Clone, FromRow)]
pub struct PaymentRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub client_id: Uuid,
    // Valor como foi digitado ("$ 1.250.000"); convertido na leitura
    pub amount: Option<String>,
    pub status_text: Option<String>,
    pub status: Option<bool>,
    pub method_id: Option<Uuid>,
    pub date: Option<String>,
    pub reference: Option<String>,
    pub created: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, FromRow)]
pub struct PaymentWithMethod {
    #[sqlx(flatten)]
    pub payment: PaymentRow,
    pub method_name: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct PaymentMethodRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct PaymentDetailRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub payment_id: Uuid,
    pub invoice_id: Uuid,
    pub amount: Decimal,
}

/// Comprovante do pagamento, opcionalmente ligado a uma fatura.
#[derive(Debug, Clone, FromRow)]
pub struct PaymentAttachmentRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub payment_id: Uuid,
    pub invoice_id: Option<Uuid>,
    pub url: String,
    pub created: Option<DateTime<Utc>>,
}

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Paid,
    Pending,
    Cancelled,
    Failed,
    Other,
}

/// Ordem importa: pago > pendente > cancelado > falhou.
pub const PAYMENT_STATUS_KEYWORDS: KeywordTable<PaymentStatus> = KeywordTable {
    rules: &[
        (PaymentStatus::Paid, &["pagado", "aprobado", "completado", "exitoso", "paid", "approved"]),
        (PaymentStatus::Pending, &["pendiente", "en proceso", "espera", "pending"]),
        (PaymentStatus::Cancelled, &["cancelado", "anulado", "reversado", "cancelled"]),
        (PaymentStatus::Failed, &["fallido", "rechazado", "error", "failed", "declined"]),
    ],
    when_true: PaymentStatus::Paid,
    when_false: PaymentStatus::Pending,
    other: PaymentStatus::Other,
};

// --- DTOs ---

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetailDto {
    pub invoice_id: Uuid,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDto {
    pub id: Uuid,
    pub client_id: Uuid,
    #[schema(example = "1250000.00")]
    pub amount: Decimal,
    /// Texto original, para exibição
    pub amount_text: Option<String>,
    pub status: PaymentStatus,
    pub method: String,
    pub date: Option<String>,
    pub reference: Option<String>,
    pub invoices: Vec<PaymentDetailDto>,
    pub attachments: Vec<AttachmentDto>,
    pub created_at: Option<String>,
}

// --- Requests ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInvoiceRequest {
    pub invoice_id: Uuid,
    #[schema(value_type = Option<Object>)]
    pub amount: Option<Value>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentAttachmentRequest {
    #[validate(url(message = "invalid_url"))]
    pub url: String,
    pub invoice_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    pub client_id: Option<Uuid>,

    /// Número ou texto ("$ 1.250.000")
    #[serde(default)]
    #[schema(value_type = Object, example = "$ 1.250.000")]
    pub amount: Value,

    #[schema(example = "Pagado")]
    pub status: Option<String>,
    pub paid: Option<bool>,

    /// Nome do método; criado se ainda não existir
    #[schema(example = "Transferencia")]
    pub method: Option<String>,

    #[schema(example = "2024-03-10")]
    pub date: Option<String>,
    pub reference: Option<String>,

    #[serde(default)]
    #[validate(nested)]
    pub invoices: Vec<PaymentInvoiceRequest>,

    #[serde(default)]
    #[validate(nested)]
    pub attachments: Vec<PaymentAttachmentRequest>,
}
