// src/models/mail.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendEmailRequest {
    #[schema(example = "pagos@cliente.co")]
    pub recipient: Option<String>,
}

/// Mensagem montada para envio. O disparo SMTP fica com o colaborador externo.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmailMessage {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}
