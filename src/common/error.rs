// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::{common::i18n::I18nStore, middleware::i18n::Locale};

// Erros de domínio e de infraestrutura. Cada variante tem um código estável
// (ver `code()`) que o frontend usa para decidir o que mostrar.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Campo obrigatório ausente: {0}")]
    MissingField(&'static str),

    #[error("Valor inválido para {field}: {value}")]
    InvalidValue { field: &'static str, value: String },

    #[error("Token inválido")]
    InvalidToken,

    #[error("Cliente não encontrado")]
    ClientNotFound,

    #[error("Serviço não encontrado")]
    ServiceNotFound,

    #[error("Imposto não encontrado")]
    TaxNotFound,

    #[error("Cotação não encontrada")]
    QuoteNotFound,

    #[error("Fatura não encontrada")]
    InvoiceNotFound,

    #[error("Pagamento não encontrado")]
    PaymentNotFound,

    // Conflitos que a UI precisa distinguir
    #[error("Serviço já atribuído a este cliente")]
    ServiceAlreadyAssigned,

    #[error("Serviço atribuído a {0} cliente(s)")]
    ServiceAssignedToClients(i64),

    #[error("Serviço vinculado a {0} fatura(s)")]
    ServiceHasInvoices(i64),

    #[error("Violação de unicidade: {0}")]
    UniqueConstraintViolation(String),

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "validation_error",
            AppError::MissingField(_) => "missing_field",
            AppError::InvalidValue { .. } => "invalid_value",
            AppError::InvalidToken | AppError::JwtError(_) => "invalid_token",
            AppError::ClientNotFound => "client_not_found",
            AppError::ServiceNotFound => "service_not_found",
            AppError::TaxNotFound => "tax_not_found",
            AppError::QuoteNotFound => "quote_not_found",
            AppError::InvoiceNotFound => "invoice_not_found",
            AppError::PaymentNotFound => "payment_not_found",
            AppError::ServiceAlreadyAssigned => "service_already_assigned",
            AppError::ServiceAssignedToClients(_) => "service_has_clients",
            AppError::ServiceHasInvoices(_) => "service_has_invoices",
            AppError::UniqueConstraintViolation(_) => "unique_violation",
            AppError::DatabaseError(_) | AppError::InternalServerError(_) => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::MissingField(_)
            | AppError::InvalidValue { .. } => StatusCode::BAD_REQUEST,
            AppError::InvalidToken | AppError::JwtError(_) => StatusCode::UNAUTHORIZED,
            AppError::ClientNotFound
            | AppError::ServiceNotFound
            | AppError::TaxNotFound
            | AppError::QuoteNotFound
            | AppError::InvoiceNotFound
            | AppError::PaymentNotFound => StatusCode::NOT_FOUND,
            AppError::ServiceAlreadyAssigned
            | AppError::ServiceAssignedToClients(_)
            | AppError::ServiceHasInvoices(_)
            | AppError::UniqueConstraintViolation(_) => StatusCode::CONFLICT,
            AppError::DatabaseError(_) | AppError::InternalServerError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Converte para o formato HTTP, traduzindo a mensagem pelo idioma da requisição.
    pub fn to_api_error(&self, locale: &Locale, store: &I18nStore) -> ApiError {
        let status = self.status();
        let code = self.code();

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            // O detalhe fica só no log, nunca na resposta
            tracing::error!("Erro Interno do Servidor: {:?}", self);
        }

        let details = match self {
            AppError::ValidationError(errors) => {
                let mut details = serde_json::Map::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<Value> = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                                .into()
                        })
                        .collect();
                    details.insert(field.to_string(), Value::Array(messages));
                }
                Some(Value::Object(details))
            }
            AppError::MissingField(field) => Some(json!({ "field": field })),
            AppError::InvalidValue { field, value } => Some(json!({ "field": field, "value": value })),
            AppError::ServiceAssignedToClients(count) | AppError::ServiceHasInvoices(count) => {
                Some(json!({ "count": count }))
            }
            AppError::UniqueConstraintViolation(msg) => Some(json!({ "reason": msg })),
            _ => None,
        };

        ApiError {
            status,
            code: code.to_string(),
            error: store.translate(&locale.0, code),
            details,
        }
    }
}

// Sem locale disponível (middlewares), respondemos no idioma padrão.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_api_error(&Locale::default(), &I18nStore::default())
            .into_response()
    }
}

/// Corpo de erro enviado ao cliente HTTP.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: String,
    pub error: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = json!({
            "success": false,
            "code": self.code,
            "error": self.error,
        });
        if let Some(details) = self.details {
            body["details"] = details;
        }
        (self.status, Json(body)).into_response()
    }
}
