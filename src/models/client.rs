// src/models/client.rs

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::{
    catalog::ClientServiceDto, invoice::{InvoiceDto, ReminderDto}, payment::PaymentDto,
    quote::QuoteDto,
};

// --- Linhas do banco ---

#[derive(Debug, Clone, FromRow)]
pub struct ClientRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    // true = ativo, false = inativo, null = em onboarding
    pub status: Option<bool>,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
}

/// Definição de campo personalizado do cliente (Ex: "NIT", "Razón social").
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ParameterRow {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub tenant_id: Uuid,
    pub name: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ClientDetailRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub client_id: Uuid,
    pub parameter_id: Uuid,
    pub value: Option<String>,
}

// Valor + nome do parâmetro (JOIN com parameters)
#[derive(Debug, Clone, FromRow)]
pub struct ClientDetailView {
    pub client_id: Uuid,
    pub parameter_id: Uuid,
    pub parameter_name: Option<String>,
    pub value: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct UsageLogRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub client_id: Uuid,
    pub description: Option<String>,
    pub created: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, FromRow)]
pub struct AuditLogRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub client_id: Uuid,
    pub action: String,
    pub created: Option<DateTime<Utc>>,
}

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ClientStatus {
    Active,
    Inactive,
    Onboarding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ClientType {
    Natural,
    Juridica,
}

// --- DTOs ---

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientSummaryDto {
    pub id: Uuid,
    #[schema(example = "Comercializadora Andina SAS")]
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status: ClientStatus,
    pub client_type: ClientType,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UsageLogDto {
    pub id: Uuid,
    pub description: Option<String>,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogDto {
    pub id: Uuid,
    pub action: String,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientDto {
    #[serde(flatten)]
    pub summary: ClientSummaryDto,
    /// parameter_id -> valor
    #[schema(value_type = Object)]
    pub details: BTreeMap<String, String>,
    pub services: Vec<ClientServiceDto>,
    pub quotes: Vec<QuoteDto>,
    pub invoices: Vec<InvoiceDto>,
    pub payments: Vec<PaymentDto>,
    pub reminders: Vec<ReminderDto>,
    pub usage: Vec<UsageLogDto>,
    pub activity: Vec<AuditLogDto>,
}

// --- Requests ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientRequest {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Comercializadora Andina SAS")]
    pub name: String,

    #[validate(email(message = "invalid_email"))]
    pub email: Option<String>,

    pub phone: Option<String>,

    /// true = ativo, false = inativo, ausente = onboarding
    pub status: Option<bool>,

    /// Substitui todos os valores personalizados quando presente
    #[schema(value_type = Option<Object>, example = json!({"550e8400-e29b-41d4-a716-446655440000": "900123456-7"}))]
    pub details: Option<BTreeMap<Uuid, String>>,
}
