// src/common/i18n.rs

use std::collections::HashMap;

pub const DEFAULT_LANG: &str = "es";

// (código, es, pt, en)
const MESSAGES: &[(&str, &str, &str, &str)] = &[
    ("validation_error", "Uno o más campos son inválidos.", "Um ou mais campos são inválidos.", "One or more fields are invalid."),
    ("missing_field", "Falta un campo obligatorio.", "Campo obrigatório ausente.", "A required field is missing."),
    ("invalid_value", "Valor no reconocido.", "Valor não reconhecido.", "Unrecognized value."),
    ("invalid_token", "Token de autenticación inválido o ausente.", "Token de autenticação inválido ou ausente.", "Invalid or missing authentication token."),
    ("tenant_required", "El encabezado X-Tenant-ID es obligatorio y debe ser un UUID.", "O cabeçalho X-Tenant-ID é obrigatório e deve ser um UUID.", "The X-Tenant-ID header is required and must be a UUID."),
    ("client_not_found", "Cliente no encontrado.", "Cliente não encontrado.", "Client not found."),
    ("service_not_found", "Servicio no encontrado.", "Serviço não encontrado.", "Service not found."),
    ("tax_not_found", "Impuesto no encontrado.", "Imposto não encontrado.", "Tax not found."),
    ("quote_not_found", "Cotización no encontrada.", "Cotação não encontrada.", "Quote not found."),
    ("invoice_not_found", "Factura no encontrada.", "Fatura não encontrada.", "Invoice not found."),
    ("payment_not_found", "Pago no encontrado.", "Pagamento não encontrado.", "Payment not found."),
    ("service_already_assigned", "El servicio ya está asignado a este cliente.", "O serviço já está atribuído a este cliente.", "The service is already assigned to this client."),
    ("service_has_clients", "No se puede eliminar: el servicio está asignado a clientes.", "Não é possível excluir: o serviço está atribuído a clientes.", "Cannot delete: the service is assigned to clients."),
    ("service_has_invoices", "No se puede eliminar: el servicio tiene facturas asociadas.", "Não é possível excluir: o serviço possui faturas vinculadas.", "Cannot delete: the service has linked invoices."),
    ("unique_violation", "El registro ya existe.", "O registro já existe.", "The record already exists."),
    ("internal_error", "Ocurrió un error inesperado.", "Ocorreu um erro inesperado.", "An unexpected error occurred."),
];

/// Mensagens de erro por idioma, carregadas uma vez no AppState.
#[derive(Debug, Clone)]
pub struct I18nStore {
    messages: HashMap<&'static str, HashMap<&'static str, &'static str>>,
}

impl Default for I18nStore {
    fn default() -> Self {
        let mut messages: HashMap<&'static str, HashMap<&'static str, &'static str>> = HashMap::new();
        for (code, es, pt, en) in MESSAGES {
            messages.entry("es").or_default().insert(code, es);
            messages.entry("pt").or_default().insert(code, pt);
            messages.entry("en").or_default().insert(code, en);
        }
        Self { messages }
    }
}

impl I18nStore {
    pub fn translate(&self, lang: &str, code: &str) -> String {
        self.messages
            .get(lang)
            .or_else(|| self.messages.get(DEFAULT_LANG))
            .and_then(|table| table.get(code))
            .map(|m| m.to_string())
            // Código sem tradução: devolve o próprio código
            .unwrap_or_else(|| code.to_string())
    }
}
