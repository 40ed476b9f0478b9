// src/services/mail.rs

use validator::ValidateEmail;

use crate::{common::{error::AppError, normalizer::non_blank}, models::mail::EmailMessage};

/// Destinatário pedido ou, na falta dele, o e-mail cadastrado do cliente.
pub(crate) fn resolve_recipient(requested: Option<&str>, fallback: Option<&str>) -> Result<String, AppError> {
    let recipient = non_blank(requested)
        .or_else(|| non_blank(fallback))
        .ok_or(AppError::MissingField("recipient"))?;

    if !recipient.validate_email() {
        return Err(AppError::InvalidValue { field: "recipient", value: recipient });
    }
    Ok(recipient)
}

/// Monta a mensagem. O envio fica com o colaborador SMTP do tenant.
pub(crate) fn compose(recipient: String, subject: String, lines: &[String]) -> EmailMessage {
    EmailMessage { recipient, subject, body: lines.join("\n") }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_client_email() {
        assert_eq!(resolve_recipient(Some("  "), Some("pagos@andina.co")).unwrap(), "pagos@andina.co");
    }

    #[test]
    fn rejects_missing_or_malformed_recipient() {
        assert!(matches!(resolve_recipient(None, None), Err(AppError::MissingField("recipient"))));
        assert!(matches!(
            resolve_recipient(Some("sin-arroba"), None),
            Err(AppError::InvalidValue { field: "recipient", .. })
        ));
    }
}
