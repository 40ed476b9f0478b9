// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Clients ---
        handlers::clients::list_clients,
        handlers::clients::get_client,
        handlers::clients::create_client,
        handlers::clients::update_client,
        handlers::clients::delete_client,
        handlers::clients::assign_service,
        handlers::clients::unassign_service,
        handlers::clients::list_parameters,

        // --- Catalog ---
        handlers::catalog::list_services,
        handlers::catalog::get_service,
        handlers::catalog::create_service,
        handlers::catalog::update_service,
        handlers::catalog::delete_service,
        handlers::catalog::list_taxes,
        handlers::catalog::create_tax,
        handlers::catalog::update_tax,

        // --- Quotes ---
        handlers::quotes::list_quotes,
        handlers::quotes::get_quote,
        handlers::quotes::create_quote,
        handlers::quotes::update_quote_status,
        handlers::quotes::convert_quote,
        handlers::quotes::send_quote,

        // --- Invoices ---
        handlers::invoices::list_invoices,
        handlers::invoices::get_invoice,
        handlers::invoices::create_invoice,
        handlers::invoices::update_invoice_status,
        handlers::invoices::send_invoice,
        handlers::invoices::list_reminders,

        // --- Payments ---
        handlers::payments::list_payments,
        handlers::payments::get_payment,
        handlers::payments::create_payment,

        // --- Settings ---
        handlers::settings::get_settings,
        handlers::settings::update_settings,
    ),
    components(
        schemas(
            // --- Clients ---
            models::client::ClientStatus,
            models::client::ClientType,
            models::client::ClientSummaryDto,
            models::client::ClientDto,
            models::client::UsageLogDto,
            models::client::AuditLogDto,
            models::client::ParameterRow,
            models::client::ClientRequest,

            // --- Catalog ---
            models::catalog::ServiceStatus,
            models::catalog::ServiceDto,
            models::catalog::ServiceUpdateResult,
            models::catalog::ClientServiceDto,
            models::catalog::TaxDto,
            models::catalog::ServiceRequest,
            models::catalog::TaxRequest,
            models::catalog::AssignServiceRequest,

            // --- Quotes ---
            models::quote::QuoteStatus,
            models::quote::QuoteDto,
            models::quote::QuoteDetailDto,
            models::quote::ConversionResult,
            models::quote::CreateQuoteRequest,
            models::quote::QuoteDetailRequest,
            models::quote::UpdateQuoteStatusRequest,

            // --- Invoices ---
            models::invoice::InvoiceStatus,
            models::invoice::ReminderStatus,
            models::invoice::InvoiceDto,
            models::invoice::InvoiceDetailDto,
            models::invoice::AttachmentDto,
            models::invoice::ReminderDto,
            models::invoice::CreateInvoiceRequest,
            models::invoice::InvoiceDetailRequest,
            models::invoice::UpdateInvoiceStatusRequest,

            // --- Payments ---
            models::payment::PaymentStatus,
            models::payment::PaymentDto,
            models::payment::PaymentDetailDto,
            models::payment::CreatePaymentRequest,
            models::payment::PaymentInvoiceRequest,
            models::payment::PaymentAttachmentRequest,

            // --- Mail ---
            models::mail::SendEmailRequest,
            models::mail::EmailMessage,

            // --- Settings ---
            models::settings::TenantSettings,
            models::settings::UpdateSettingsRequest,
        )
    ),
    tags(
        (name = "Clients", description = "Clientes, detalhes e serviços atribuídos"),
        (name = "Catalog", description = "Serviços e impostos"),
        (name = "Quotes", description = "Cotações e conversão em fatura"),
        (name = "Invoices", description = "Faturas e lembretes de cobrança"),
        (name = "Payments", description = "Pagamentos e comprovantes"),
        (name = "Settings", description = "Configurações do tenant")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
