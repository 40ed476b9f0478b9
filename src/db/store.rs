// src/db/store.rs

//! Fronteira entre os workflows e a persistência.
//!
//! Todo acesso passa por uma unidade de trabalho (`BillingTx`) aberta para um
//! tenant. Leituras usam a mesma interface: uma transação = um snapshot.
//! `commit` grava tudo; descartar a transação sem commit desfaz tudo.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        catalog::{ClientServiceRow, ClientServiceView, ServiceRow, ServiceWithUsage, TaxRow},
        client::{AuditLogRow, ClientDetailRow, ClientDetailView, ClientRow, ParameterRow, UsageLogRow},
        invoice::{InvoiceAmounts, InvoiceAttachmentRow, InvoiceDetailRow, InvoiceRow, InvoiceWithClient},
        payment::{PaymentAttachmentRow, PaymentDetailRow, PaymentMethodRow, PaymentRow, PaymentWithMethod},
        quote::{QuoteAttachmentRow, QuoteDetailRow, QuoteDetailView, QuoteRow, QuoteWithClient},
    },
};

#[async_trait]
pub trait BillingStore: Clone + Send + Sync + 'static {
    type Tx: BillingTx;

    /// Abre uma unidade de trabalho restrita ao tenant.
    async fn begin(&self, tenant_id: Uuid) -> Result<Self::Tx, AppError>;
}

/// Tabelas dependentes de um cliente, removidas na exclusão em cascata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientScope {
    Details,
    Services,
    QuoteDetails,
    QuoteAttachments,
    InvoiceDetails,
    InvoiceAttachments,
    /// Inclui itens de pagamentos de terceiros que citam faturas do cliente.
    PaymentDetails,
    PaymentAttachments,
    Invoices,
    Payments,
    Quotes,
    UsageLogs,
    AuditLogs,
    Client,
}

/// Filhos antes dos pais: a ordem evita violação de chave estrangeira.
pub const CLIENT_DELETE_ORDER: [ClientScope; 14] = [
    ClientScope::Details,
    ClientScope::Services,
    ClientScope::QuoteDetails,
    ClientScope::QuoteAttachments,
    ClientScope::InvoiceDetails,
    ClientScope::InvoiceAttachments,
    ClientScope::PaymentDetails,
    ClientScope::PaymentAttachments,
    ClientScope::Invoices,
    ClientScope::Payments,
    ClientScope::Quotes,
    ClientScope::UsageLogs,
    ClientScope::AuditLogs,
    ClientScope::Client,
];

#[async_trait]
pub trait BillingTx: Send {
    async fn commit(self) -> Result<(), AppError>;

    // =========================================================================
    //  CLIENTES
    // =========================================================================

    async fn list_clients(&mut self) -> Result<Vec<ClientRow>, AppError>;
    async fn find_client(&mut self, id: Uuid) -> Result<Option<ClientRow>, AppError>;
    async fn insert_client(&mut self, client: &ClientRow) -> Result<(), AppError>;
    async fn update_client(&mut self, client: &ClientRow) -> Result<(), AppError>;
    async fn touch_client(&mut self, id: Uuid, at: DateTime<Utc>) -> Result<(), AppError>;

    async fn list_parameters(&mut self) -> Result<Vec<ParameterRow>, AppError>;
    /// `None` = detalhes de todos os clientes do tenant
    async fn list_client_details(&mut self, client_id: Option<Uuid>) -> Result<Vec<ClientDetailView>, AppError>;
    async fn replace_client_details(&mut self, client_id: Uuid, details: &[ClientDetailRow]) -> Result<(), AppError>;

    async fn list_usage_logs(&mut self, client_id: Uuid) -> Result<Vec<UsageLogRow>, AppError>;
    async fn list_audit_logs(&mut self, client_id: Uuid) -> Result<Vec<AuditLogRow>, AppError>;
    async fn insert_audit_log(&mut self, log: &AuditLogRow) -> Result<(), AppError>;

    /// Remove as linhas de uma tabela ligadas ao cliente. Retorna quantas saíram.
    async fn delete_client_rows(&mut self, scope: ClientScope, client_id: Uuid) -> Result<u64, AppError>;

    // =========================================================================
    //  CATÁLOGO (SERVIÇOS E IMPOSTOS)
    // =========================================================================

    async fn list_services(&mut self) -> Result<Vec<ServiceWithUsage>, AppError>;
    async fn find_service(&mut self, id: Uuid) -> Result<Option<ServiceRow>, AppError>;
    async fn insert_service(&mut self, service: &ServiceRow) -> Result<(), AppError>;
    async fn update_service(&mut self, service: &ServiceRow) -> Result<(), AppError>;
    async fn delete_service(&mut self, id: Uuid) -> Result<u64, AppError>;
    async fn count_active_assignments(&mut self, service_id: Uuid) -> Result<i64, AppError>;
    /// Faturas que citam o serviço no cabeçalho ou em algum item; bloqueiam a
    /// exclusão, pois itens de fatura não perdem a referência
    async fn count_service_invoices(&mut self, service_id: Uuid) -> Result<i64, AppError>;

    async fn list_taxes(&mut self) -> Result<Vec<TaxRow>, AppError>;
    async fn find_tax(&mut self, id: Uuid) -> Result<Option<TaxRow>, AppError>;
    async fn insert_tax(&mut self, tax: &TaxRow) -> Result<(), AppError>;
    async fn update_tax(&mut self, tax: &TaxRow) -> Result<(), AppError>;

    // =========================================================================
    //  ATRIBUIÇÕES CLIENTE <-> SERVIÇO
    // =========================================================================

    async fn find_assignment(&mut self, client_id: Uuid, service_id: Uuid) -> Result<Option<ClientServiceRow>, AppError>;
    async fn list_assignments(&mut self, client_id: Uuid) -> Result<Vec<ClientServiceView>, AppError>;
    async fn insert_assignment(&mut self, assignment: &ClientServiceRow) -> Result<(), AppError>;
    async fn delete_assignment(&mut self, id: Uuid) -> Result<u64, AppError>;

    // =========================================================================
    //  COTAÇÕES
    // =========================================================================

    async fn list_quotes(&mut self, client_id: Option<Uuid>) -> Result<Vec<QuoteWithClient>, AppError>;
    async fn find_quote(&mut self, id: Uuid) -> Result<Option<QuoteWithClient>, AppError>;
    async fn insert_quote(&mut self, quote: &QuoteRow) -> Result<(), AppError>;
    async fn update_quote_status(&mut self, id: Uuid, status: Option<bool>, at: DateTime<Utc>) -> Result<(), AppError>;
    async fn list_quote_details(&mut self, quote_ids: &[Uuid]) -> Result<Vec<QuoteDetailView>, AppError>;
    async fn insert_quote_detail(&mut self, detail: &QuoteDetailRow) -> Result<(), AppError>;
    async fn list_quote_attachments(&mut self, quote_ids: &[Uuid]) -> Result<Vec<QuoteAttachmentRow>, AppError>;
    async fn insert_quote_attachment(&mut self, attachment: &QuoteAttachmentRow) -> Result<(), AppError>;

    // =========================================================================
    //  FATURAS
    // =========================================================================

    async fn list_invoices(&mut self, client_id: Option<Uuid>) -> Result<Vec<InvoiceWithClient>, AppError>;
    /// Faturas precificadas pelo serviço (cabeçalho); alvo da propagação de preço
    async fn list_invoices_by_service(&mut self, service_id: Uuid) -> Result<Vec<InvoiceRow>, AppError>;
    async fn find_invoice(&mut self, id: Uuid) -> Result<Option<InvoiceWithClient>, AppError>;
    async fn insert_invoice(&mut self, invoice: &InvoiceRow) -> Result<(), AppError>;
    async fn update_invoice_amounts(&mut self, id: Uuid, amounts: &InvoiceAmounts, at: DateTime<Utc>) -> Result<(), AppError>;
    async fn update_invoice_status(&mut self, id: Uuid, status: Option<bool>, at: DateTime<Utc>) -> Result<(), AppError>;
    async fn list_invoice_details(&mut self, invoice_ids: &[Uuid]) -> Result<Vec<InvoiceDetailRow>, AppError>;
    async fn insert_invoice_detail(&mut self, detail: &InvoiceDetailRow) -> Result<(), AppError>;
    async fn list_invoice_attachments(&mut self, invoice_ids: &[Uuid]) -> Result<Vec<InvoiceAttachmentRow>, AppError>;

    // =========================================================================
    //  PAGAMENTOS
    // =========================================================================

    async fn list_payments(&mut self, client_id: Option<Uuid>) -> Result<Vec<PaymentWithMethod>, AppError>;
    async fn find_payment(&mut self, id: Uuid) -> Result<Option<PaymentWithMethod>, AppError>;
    async fn insert_payment(&mut self, payment: &PaymentRow) -> Result<(), AppError>;
    /// Busca por nome, sem diferenciar maiúsculas
    async fn find_payment_method(&mut self, name: &str) -> Result<Option<PaymentMethodRow>, AppError>;
    async fn insert_payment_method(&mut self, method: &PaymentMethodRow) -> Result<(), AppError>;
    async fn list_payment_details(&mut self, payment_ids: &[Uuid]) -> Result<Vec<PaymentDetailRow>, AppError>;
    async fn insert_payment_detail(&mut self, detail: &PaymentDetailRow) -> Result<(), AppError>;
    async fn list_payment_attachments(&mut self, payment_ids: &[Uuid]) -> Result<Vec<PaymentAttachmentRow>, AppError>;
    async fn insert_payment_attachment(&mut self, attachment: &PaymentAttachmentRow) -> Result<(), AppError>;
}
