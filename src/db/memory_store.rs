// src/db/memory_store.rs

//! Store em memória para os testes dos workflows.
//!
//! Uma transação segura o mutex do estado inteiro e trabalha numa cópia:
//! `commit` troca a cópia pelo original, `drop` sem commit descarta a cópia.
//! As chaves estrangeiras e as constraints UNIQUE da migração são conferidas
//! aqui também, para que uma ordem de exclusão errada falhe no teste.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::store::{BillingStore, BillingTx, ClientScope},
    models::{
        catalog::{ClientServiceRow, ClientServiceView, ServiceRow, ServiceWithUsage, TaxRow},
        client::{AuditLogRow, ClientDetailRow, ClientDetailView, ClientRow, ParameterRow, UsageLogRow},
        invoice::{InvoiceAmounts, InvoiceAttachmentRow, InvoiceDetailRow, InvoiceRow, InvoiceWithClient},
        payment::{PaymentAttachmentRow, PaymentDetailRow, PaymentMethodRow, PaymentRow, PaymentWithMethod},
        quote::{QuoteAttachmentRow, QuoteDetailRow, QuoteDetailView, QuoteRow, QuoteWithClient},
    },
};

#[derive(Debug, Clone, Default)]
pub struct MemoryState {
    pub clients: Vec<ClientRow>,
    pub parameters: Vec<ParameterRow>,
    pub client_details: Vec<ClientDetailRow>,
    pub services: Vec<ServiceRow>,
    pub taxes: Vec<TaxRow>,
    pub assignments: Vec<ClientServiceRow>,
    pub quotes: Vec<QuoteRow>,
    pub quote_details: Vec<QuoteDetailRow>,
    pub quote_attachments: Vec<QuoteAttachmentRow>,
    pub invoices: Vec<InvoiceRow>,
    pub invoice_details: Vec<InvoiceDetailRow>,
    pub invoice_attachments: Vec<InvoiceAttachmentRow>,
    pub payments: Vec<PaymentRow>,
    pub payment_methods: Vec<PaymentMethodRow>,
    pub payment_details: Vec<PaymentDetailRow>,
    pub payment_attachments: Vec<PaymentAttachmentRow>,
    pub usage_logs: Vec<UsageLogRow>,
    pub audit_logs: Vec<AuditLogRow>,
    /// Nome de uma operação que deve falhar (simula erro do banco no meio do workflow)
    pub fail_on: Option<&'static str>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new(state: MemoryState) -> Self {
        Self { state: Arc::new(Mutex::new(state)) }
    }

    /// Cópia do estado gravado. Não chamar com uma transação aberta.
    pub async fn snapshot(&self) -> MemoryState {
        self.state.lock().await.clone()
    }

    pub async fn fail_on(&self, operation: &'static str) {
        self.state.lock().await.fail_on = Some(operation);
    }
}

#[async_trait]
impl BillingStore for MemoryStore {
    type Tx = MemoryTx;

    async fn begin(&self, tenant_id: Uuid) -> Result<MemoryTx, AppError> {
        let guard = self.state.clone().lock_owned().await;
        let work = guard.clone();
        Ok(MemoryTx { guard, work, tenant_id })
    }
}

pub struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    work: MemoryState,
    tenant_id: Uuid,
}

fn fk_violation(relation: &str) -> AppError {
    AppError::InternalServerError(anyhow::anyhow!("violação de chave estrangeira: {relation}"))
}

fn remove_where<T>(rows: &mut Vec<T>, pred: impl Fn(&T) -> bool) -> u64 {
    let before = rows.len();
    rows.retain(|row| !pred(row));
    (before - rows.len()) as u64
}

impl MemoryTx {
    fn check_fail(&self, operation: &str) -> Result<(), AppError> {
        if self.work.fail_on == Some(operation) {
            return Err(AppError::InternalServerError(anyhow::anyhow!("falha simulada em {operation}")));
        }
        Ok(())
    }

    fn owned<'a, T>(&self, rows: &'a [T], tenant: impl Fn(&T) -> Uuid) -> impl Iterator<Item = &'a T> {
        let tenant_id = self.tenant_id;
        rows.iter().filter(move |row| tenant(row) == tenant_id)
    }

    fn client_name(&self, client_id: Uuid) -> Option<String> {
        self.work
            .clients
            .iter()
            .find(|c| c.id == client_id)
            .and_then(|c| c.name.clone())
    }

    fn ids_of_client<T>(&self, rows: &[T], key: impl Fn(&T) -> (Uuid, Uuid, Uuid), client_id: Uuid) -> Vec<Uuid> {
        rows.iter()
            .map(key)
            .filter(|(tenant, _, owner)| *tenant == self.tenant_id && *owner == client_id)
            .map(|(_, id, _)| id)
            .collect()
    }

    fn quote_view(&self, quote: &QuoteRow) -> QuoteWithClient {
        QuoteWithClient { quote: quote.clone(), client_name: self.client_name(quote.client_id) }
    }

    fn invoice_view(&self, invoice: &InvoiceRow) -> InvoiceWithClient {
        InvoiceWithClient { invoice: invoice.clone(), client_name: self.client_name(invoice.client_id) }
    }

    fn payment_view(&self, payment: &PaymentRow) -> PaymentWithMethod {
        let method_name = payment.method_id.and_then(|method_id| {
            self.work
                .payment_methods
                .iter()
                .find(|m| m.id == method_id)
                .map(|m| m.name.clone())
        });
        PaymentWithMethod { payment: payment.clone(), method_name }
    }
}

#[async_trait]
impl BillingTx for MemoryTx {
    async fn commit(self) -> Result<(), AppError> {
        self.check_fail("commit")?;
        let MemoryTx { mut guard, work, .. } = self;
        *guard = work;
        Ok(())
    }

    // =========================================================================
    //  CLIENTES
    // =========================================================================

    async fn list_clients(&mut self) -> Result<Vec<ClientRow>, AppError> {
        let mut clients: Vec<ClientRow> = self.owned(&self.work.clients, |c| c.tenant_id).cloned().collect();
        clients.sort_by(|a, b| b.created.cmp(&a.created));
        Ok(clients)
    }

    async fn find_client(&mut self, id: Uuid) -> Result<Option<ClientRow>, AppError> {
        Ok(self.owned(&self.work.clients, |c| c.tenant_id).find(|c| c.id == id).cloned())
    }

    async fn insert_client(&mut self, client: &ClientRow) -> Result<(), AppError> {
        self.check_fail("insert_client")?;
        let mut row = client.clone();
        row.tenant_id = self.tenant_id;
        self.work.clients.push(row);
        Ok(())
    }

    async fn update_client(&mut self, client: &ClientRow) -> Result<(), AppError> {
        let tenant_id = self.tenant_id;
        if let Some(row) = self.work.clients.iter_mut().find(|c| c.tenant_id == tenant_id && c.id == client.id) {
            row.name = client.name.clone();
            row.email = client.email.clone();
            row.phone = client.phone.clone();
            row.status = client.status;
            row.updated = client.updated;
        }
        Ok(())
    }

    async fn touch_client(&mut self, id: Uuid, at: DateTime<Utc>) -> Result<(), AppError> {
        let tenant_id = self.tenant_id;
        if let Some(row) = self.work.clients.iter_mut().find(|c| c.tenant_id == tenant_id && c.id == id) {
            row.updated = Some(at);
        }
        Ok(())
    }

    async fn list_parameters(&mut self) -> Result<Vec<ParameterRow>, AppError> {
        let mut parameters: Vec<ParameterRow> = self.owned(&self.work.parameters, |p| p.tenant_id).cloned().collect();
        parameters.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(parameters)
    }

    async fn list_client_details(&mut self, client_id: Option<Uuid>) -> Result<Vec<ClientDetailView>, AppError> {
        let details = self
            .owned(&self.work.client_details, |d| d.tenant_id)
            .filter(|d| client_id.is_none_or(|id| d.client_id == id))
            .map(|d| ClientDetailView {
                client_id: d.client_id,
                parameter_id: d.parameter_id,
                parameter_name: self
                    .work
                    .parameters
                    .iter()
                    .find(|p| p.id == d.parameter_id)
                    .and_then(|p| p.name.clone()),
                value: d.value.clone(),
            })
            .collect();
        Ok(details)
    }

    async fn replace_client_details(&mut self, client_id: Uuid, details: &[ClientDetailRow]) -> Result<(), AppError> {
        let tenant_id = self.tenant_id;
        remove_where(&mut self.work.client_details, |d| d.tenant_id == tenant_id && d.client_id == client_id);

        for detail in details {
            if !self.work.parameters.iter().any(|p| p.id == detail.parameter_id) {
                return Err(fk_violation("client_details.parameter_id"));
            }
            let mut row = detail.clone();
            row.tenant_id = tenant_id;
            row.client_id = client_id;
            self.work.client_details.push(row);
        }
        Ok(())
    }

    async fn list_usage_logs(&mut self, client_id: Uuid) -> Result<Vec<UsageLogRow>, AppError> {
        let mut logs: Vec<UsageLogRow> = self
            .owned(&self.work.usage_logs, |l| l.tenant_id)
            .filter(|l| l.client_id == client_id)
            .cloned()
            .collect();
        logs.sort_by(|a, b| b.created.cmp(&a.created));
        Ok(logs)
    }

    async fn list_audit_logs(&mut self, client_id: Uuid) -> Result<Vec<AuditLogRow>, AppError> {
        let mut logs: Vec<AuditLogRow> = self
            .owned(&self.work.audit_logs, |l| l.tenant_id)
            .filter(|l| l.client_id == client_id)
            .cloned()
            .collect();
        logs.sort_by(|a, b| b.created.cmp(&a.created));
        Ok(logs)
    }

    async fn insert_audit_log(&mut self, log: &AuditLogRow) -> Result<(), AppError> {
        self.check_fail("insert_audit_log")?;
        let mut row = log.clone();
        row.tenant_id = self.tenant_id;
        self.work.audit_logs.push(row);
        Ok(())
    }

    async fn delete_client_rows(&mut self, scope: ClientScope, client_id: Uuid) -> Result<u64, AppError> {
        let tenant_id = self.tenant_id;
        let quote_ids = self.ids_of_client(&self.work.quotes, |q| (q.tenant_id, q.id, q.client_id), client_id);
        let invoice_ids = self.ids_of_client(&self.work.invoices, |i| (i.tenant_id, i.id, i.client_id), client_id);
        let payment_ids = self.ids_of_client(&self.work.payments, |p| (p.tenant_id, p.id, p.client_id), client_id);
        let w = &mut self.work;

        let removed = match scope {
            ClientScope::Details => {
                remove_where(&mut w.client_details, |d| d.tenant_id == tenant_id && d.client_id == client_id)
            }
            ClientScope::Services => {
                remove_where(&mut w.assignments, |a| a.tenant_id == tenant_id && a.client_id == client_id)
            }
            ClientScope::QuoteDetails => remove_where(&mut w.quote_details, |d| quote_ids.contains(&d.quote_id)),
            ClientScope::QuoteAttachments => {
                remove_where(&mut w.quote_attachments, |a| quote_ids.contains(&a.quote_id))
            }
            ClientScope::InvoiceDetails => {
                remove_where(&mut w.invoice_details, |d| invoice_ids.contains(&d.invoice_id))
            }
            ClientScope::InvoiceAttachments => {
                remove_where(&mut w.invoice_attachments, |a| invoice_ids.contains(&a.invoice_id))
            }
            ClientScope::PaymentDetails => remove_where(&mut w.payment_details, |d| {
                payment_ids.contains(&d.payment_id) || invoice_ids.contains(&d.invoice_id)
            }),
            ClientScope::PaymentAttachments => remove_where(&mut w.payment_attachments, |a| {
                payment_ids.contains(&a.payment_id) || a.invoice_id.is_some_and(|id| invoice_ids.contains(&id))
            }),
            ClientScope::Invoices => {
                let referenced = w.invoice_details.iter().any(|d| invoice_ids.contains(&d.invoice_id))
                    || w.invoice_attachments.iter().any(|a| invoice_ids.contains(&a.invoice_id))
                    || w.quote_attachments.iter().any(|a| invoice_ids.contains(&a.invoice_id))
                    || w.payment_details.iter().any(|d| invoice_ids.contains(&d.invoice_id))
                    || w.payment_attachments.iter().any(|a| a.invoice_id.is_some_and(|id| invoice_ids.contains(&id)));
                if referenced {
                    return Err(fk_violation("invoices"));
                }
                remove_where(&mut w.invoices, |i| invoice_ids.contains(&i.id))
            }
            ClientScope::Payments => {
                let referenced = w.payment_details.iter().any(|d| payment_ids.contains(&d.payment_id))
                    || w.payment_attachments.iter().any(|a| payment_ids.contains(&a.payment_id));
                if referenced {
                    return Err(fk_violation("payments"));
                }
                remove_where(&mut w.payments, |p| payment_ids.contains(&p.id))
            }
            ClientScope::Quotes => {
                let referenced = w.quote_details.iter().any(|d| quote_ids.contains(&d.quote_id))
                    || w.quote_attachments.iter().any(|a| quote_ids.contains(&a.quote_id));
                if referenced {
                    return Err(fk_violation("quotes"));
                }
                remove_where(&mut w.quotes, |q| quote_ids.contains(&q.id))
            }
            ClientScope::UsageLogs => {
                remove_where(&mut w.usage_logs, |l| l.tenant_id == tenant_id && l.client_id == client_id)
            }
            ClientScope::AuditLogs => {
                remove_where(&mut w.audit_logs, |l| l.tenant_id == tenant_id && l.client_id == client_id)
            }
            ClientScope::Client => {
                let referenced = w.client_details.iter().any(|d| d.client_id == client_id)
                    || w.assignments.iter().any(|a| a.client_id == client_id)
                    || w.quotes.iter().any(|q| q.client_id == client_id)
                    || w.invoices.iter().any(|i| i.client_id == client_id)
                    || w.payments.iter().any(|p| p.client_id == client_id)
                    || w.usage_logs.iter().any(|l| l.client_id == client_id)
                    || w.audit_logs.iter().any(|l| l.client_id == client_id);
                if referenced {
                    return Err(fk_violation("clients"));
                }
                remove_where(&mut w.clients, |c| c.tenant_id == tenant_id && c.id == client_id)
            }
        };

        Ok(removed)
    }

    // =========================================================================
    //  CATÁLOGO (SERVIÇOS E IMPOSTOS)
    // =========================================================================

    async fn list_services(&mut self) -> Result<Vec<ServiceWithUsage>, AppError> {
        let mut services: Vec<ServiceWithUsage> = self
            .owned(&self.work.services, |s| s.tenant_id)
            .map(|s| ServiceWithUsage {
                service: s.clone(),
                clients_count: self
                    .work
                    .assignments
                    .iter()
                    .filter(|a| a.service_id == s.id && a.status != Some(false))
                    .count() as i64,
            })
            .collect();
        services.sort_by(|a, b| a.service.name.cmp(&b.service.name));
        Ok(services)
    }

    async fn find_service(&mut self, id: Uuid) -> Result<Option<ServiceRow>, AppError> {
        Ok(self.owned(&self.work.services, |s| s.tenant_id).find(|s| s.id == id).cloned())
    }

    async fn insert_service(&mut self, service: &ServiceRow) -> Result<(), AppError> {
        let mut row = service.clone();
        row.tenant_id = self.tenant_id;
        self.work.services.push(row);
        Ok(())
    }

    async fn update_service(&mut self, service: &ServiceRow) -> Result<(), AppError> {
        self.check_fail("update_service")?;
        let tenant_id = self.tenant_id;
        if let Some(row) = self.work.services.iter_mut().find(|s| s.tenant_id == tenant_id && s.id == service.id) {
            *row = ServiceRow { tenant_id, created: row.created, ..service.clone() };
        }
        Ok(())
    }

    async fn delete_service(&mut self, id: Uuid) -> Result<u64, AppError> {
        let w = &mut self.work;
        if w.invoices.iter().any(|i| i.service_id == Some(id))
            || w.invoice_details.iter().any(|d| d.service_id == Some(id))
        {
            return Err(fk_violation("services"));
        }

        // ON DELETE CASCADE / SET NULL da migração
        remove_where(&mut w.assignments, |a| a.service_id == id);
        for detail in w.quote_details.iter_mut().filter(|d| d.service_id == Some(id)) {
            detail.service_id = None;
        }

        let tenant_id = self.tenant_id;
        Ok(remove_where(&mut self.work.services, |s| s.tenant_id == tenant_id && s.id == id))
    }

    async fn count_active_assignments(&mut self, service_id: Uuid) -> Result<i64, AppError> {
        let count = self
            .owned(&self.work.assignments, |a| a.tenant_id)
            .filter(|a| a.service_id == service_id && a.status != Some(false))
            .count();
        Ok(count as i64)
    }

    async fn count_service_invoices(&mut self, service_id: Uuid) -> Result<i64, AppError> {
        let count = self
            .owned(&self.work.invoices, |i| i.tenant_id)
            .filter(|i| {
                i.service_id == Some(service_id)
                    || self
                        .work
                        .invoice_details
                        .iter()
                        .any(|d| d.invoice_id == i.id && d.service_id == Some(service_id))
            })
            .count();
        Ok(count as i64)
    }

    async fn list_taxes(&mut self) -> Result<Vec<TaxRow>, AppError> {
        let mut taxes: Vec<TaxRow> = self.owned(&self.work.taxes, |t| t.tenant_id).cloned().collect();
        taxes.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(taxes)
    }

    async fn find_tax(&mut self, id: Uuid) -> Result<Option<TaxRow>, AppError> {
        Ok(self.owned(&self.work.taxes, |t| t.tenant_id).find(|t| t.id == id).cloned())
    }

    async fn insert_tax(&mut self, tax: &TaxRow) -> Result<(), AppError> {
        let mut row = tax.clone();
        row.tenant_id = self.tenant_id;
        self.work.taxes.push(row);
        Ok(())
    }

    async fn update_tax(&mut self, tax: &TaxRow) -> Result<(), AppError> {
        let tenant_id = self.tenant_id;
        if let Some(row) = self.work.taxes.iter_mut().find(|t| t.tenant_id == tenant_id && t.id == tax.id) {
            *row = TaxRow { tenant_id, ..tax.clone() };
        }
        Ok(())
    }

    // =========================================================================
    //  ATRIBUIÇÕES CLIENTE <-> SERVIÇO
    // =========================================================================

    async fn find_assignment(&mut self, client_id: Uuid, service_id: Uuid) -> Result<Option<ClientServiceRow>, AppError> {
        Ok(self
            .owned(&self.work.assignments, |a| a.tenant_id)
            .find(|a| a.client_id == client_id && a.service_id == service_id)
            .cloned())
    }

    async fn list_assignments(&mut self, client_id: Uuid) -> Result<Vec<ClientServiceView>, AppError> {
        let mut assignments: Vec<ClientServiceView> = self
            .owned(&self.work.assignments, |a| a.tenant_id)
            .filter(|a| a.client_id == client_id)
            .map(|a| {
                let service = self.work.services.iter().find(|s| s.id == a.service_id);
                ClientServiceView {
                    assignment: a.clone(),
                    service_name: service.and_then(|s| s.name.clone()),
                    service_price: service.map(|s| s.price),
                }
            })
            .collect();
        assignments.sort_by(|a, b| a.assignment.created.cmp(&b.assignment.created));
        Ok(assignments)
    }

    async fn insert_assignment(&mut self, assignment: &ClientServiceRow) -> Result<(), AppError> {
        self.check_fail("insert_assignment")?;
        let w = &self.work;
        if !w.clients.iter().any(|c| c.id == assignment.client_id) {
            return Err(fk_violation("client_services.client_id"));
        }
        if !w.services.iter().any(|s| s.id == assignment.service_id) {
            return Err(fk_violation("client_services.service_id"));
        }
        if w.assignments
            .iter()
            .any(|a| a.client_id == assignment.client_id && a.service_id == assignment.service_id)
        {
            return Err(AppError::ServiceAlreadyAssigned);
        }

        let mut row = assignment.clone();
        row.tenant_id = self.tenant_id;
        self.work.assignments.push(row);
        Ok(())
    }

    async fn delete_assignment(&mut self, id: Uuid) -> Result<u64, AppError> {
        let tenant_id = self.tenant_id;
        Ok(remove_where(&mut self.work.assignments, |a| a.tenant_id == tenant_id && a.id == id))
    }

    // =========================================================================
    //  COTAÇÕES
    // =========================================================================

    async fn list_quotes(&mut self, client_id: Option<Uuid>) -> Result<Vec<QuoteWithClient>, AppError> {
        let mut quotes: Vec<QuoteWithClient> = self
            .owned(&self.work.quotes, |q| q.tenant_id)
            .filter(|q| client_id.is_none_or(|id| q.client_id == id))
            .map(|q| self.quote_view(q))
            .collect();
        quotes.sort_by(|a, b| b.quote.created.cmp(&a.quote.created));
        Ok(quotes)
    }

    async fn find_quote(&mut self, id: Uuid) -> Result<Option<QuoteWithClient>, AppError> {
        Ok(self
            .owned(&self.work.quotes, |q| q.tenant_id)
            .find(|q| q.id == id)
            .map(|q| self.quote_view(q)))
    }

    async fn insert_quote(&mut self, quote: &QuoteRow) -> Result<(), AppError> {
        if !self.work.clients.iter().any(|c| c.id == quote.client_id) {
            return Err(fk_violation("quotes.client_id"));
        }
        let mut row = quote.clone();
        row.tenant_id = self.tenant_id;
        self.work.quotes.push(row);
        Ok(())
    }

    async fn update_quote_status(&mut self, id: Uuid, status: Option<bool>, at: DateTime<Utc>) -> Result<(), AppError> {
        self.check_fail("update_quote_status")?;
        let tenant_id = self.tenant_id;
        if let Some(row) = self.work.quotes.iter_mut().find(|q| q.tenant_id == tenant_id && q.id == id) {
            row.status = status;
            row.updated = Some(at);
        }
        Ok(())
    }

    async fn list_quote_details(&mut self, quote_ids: &[Uuid]) -> Result<Vec<QuoteDetailView>, AppError> {
        let mut details: Vec<QuoteDetailView> = self
            .owned(&self.work.quote_details, |d| d.tenant_id)
            .filter(|d| quote_ids.contains(&d.quote_id))
            .map(|d| QuoteDetailView {
                detail: d.clone(),
                service_name: d.service_id.and_then(|service_id| {
                    self.work
                        .services
                        .iter()
                        .find(|s| s.id == service_id)
                        .and_then(|s| s.name.clone())
                }),
            })
            .collect();
        details.sort_by_key(|d| d.detail.item);
        Ok(details)
    }

    async fn insert_quote_detail(&mut self, detail: &QuoteDetailRow) -> Result<(), AppError> {
        let mut row = detail.clone();
        row.tenant_id = self.tenant_id;
        self.work.quote_details.push(row);
        Ok(())
    }

    async fn list_quote_attachments(&mut self, quote_ids: &[Uuid]) -> Result<Vec<QuoteAttachmentRow>, AppError> {
        Ok(self
            .owned(&self.work.quote_attachments, |a| a.tenant_id)
            .filter(|a| quote_ids.contains(&a.quote_id))
            .cloned()
            .collect())
    }

    async fn insert_quote_attachment(&mut self, attachment: &QuoteAttachmentRow) -> Result<(), AppError> {
        self.check_fail("insert_quote_attachment")?;
        if self.work.quote_attachments.iter().any(|a| a.quote_id == attachment.quote_id) {
            return Err(AppError::UniqueConstraintViolation(format!(
                "A cotação '{}' já foi convertida.",
                attachment.quote_id
            )));
        }
        if !self.work.invoices.iter().any(|i| i.id == attachment.invoice_id) {
            return Err(fk_violation("quote_attachments.invoice_id"));
        }
        let mut row = attachment.clone();
        row.tenant_id = self.tenant_id;
        self.work.quote_attachments.push(row);
        Ok(())
    }

    // =========================================================================
    //  FATURAS
    // =========================================================================

    async fn list_invoices(&mut self, client_id: Option<Uuid>) -> Result<Vec<InvoiceWithClient>, AppError> {
        let mut invoices: Vec<InvoiceWithClient> = self
            .owned(&self.work.invoices, |i| i.tenant_id)
            .filter(|i| client_id.is_none_or(|id| i.client_id == id))
            .map(|i| self.invoice_view(i))
            .collect();
        invoices.sort_by(|a, b| b.invoice.created.cmp(&a.invoice.created));
        Ok(invoices)
    }

    async fn list_invoices_by_service(&mut self, service_id: Uuid) -> Result<Vec<InvoiceRow>, AppError> {
        Ok(self
            .owned(&self.work.invoices, |i| i.tenant_id)
            .filter(|i| i.service_id == Some(service_id))
            .cloned()
            .collect())
    }

    async fn find_invoice(&mut self, id: Uuid) -> Result<Option<InvoiceWithClient>, AppError> {
        Ok(self
            .owned(&self.work.invoices, |i| i.tenant_id)
            .find(|i| i.id == id)
            .map(|i| self.invoice_view(i)))
    }

    async fn insert_invoice(&mut self, invoice: &InvoiceRow) -> Result<(), AppError> {
        self.check_fail("insert_invoice")?;
        if !self.work.clients.iter().any(|c| c.id == invoice.client_id) {
            return Err(fk_violation("invoices.client_id"));
        }
        let mut row = invoice.clone();
        row.tenant_id = self.tenant_id;
        self.work.invoices.push(row);
        Ok(())
    }

    async fn update_invoice_amounts(&mut self, id: Uuid, amounts: &InvoiceAmounts, at: DateTime<Utc>) -> Result<(), AppError> {
        self.check_fail("update_invoice_amounts")?;
        let tenant_id = self.tenant_id;
        if let Some(row) = self.work.invoices.iter_mut().find(|i| i.tenant_id == tenant_id && i.id == id) {
            row.subtotal = amounts.subtotal;
            row.tax_one_id = amounts.tax_one_id;
            row.tax_two_id = amounts.tax_two_id;
            row.tax_one_amount = amounts.tax_one_amount;
            row.tax_two_amount = amounts.tax_two_amount;
            row.include_vat = amounts.include_vat;
            row.vat_amount = amounts.vat_amount;
            row.total = amounts.total;
            row.updated = Some(at);
        }
        Ok(())
    }

    async fn update_invoice_status(&mut self, id: Uuid, status: Option<bool>, at: DateTime<Utc>) -> Result<(), AppError> {
        let tenant_id = self.tenant_id;
        if let Some(row) = self.work.invoices.iter_mut().find(|i| i.tenant_id == tenant_id && i.id == id) {
            row.status = status;
            row.updated = Some(at);
        }
        Ok(())
    }

    async fn list_invoice_details(&mut self, invoice_ids: &[Uuid]) -> Result<Vec<InvoiceDetailRow>, AppError> {
        let mut details: Vec<InvoiceDetailRow> = self
            .owned(&self.work.invoice_details, |d| d.tenant_id)
            .filter(|d| invoice_ids.contains(&d.invoice_id))
            .cloned()
            .collect();
        details.sort_by_key(|d| d.item);
        Ok(details)
    }

    async fn insert_invoice_detail(&mut self, detail: &InvoiceDetailRow) -> Result<(), AppError> {
        self.check_fail("insert_invoice_detail")?;
        if !self.work.invoices.iter().any(|i| i.id == detail.invoice_id) {
            return Err(fk_violation("invoice_details.invoice_id"));
        }
        let mut row = detail.clone();
        row.tenant_id = self.tenant_id;
        self.work.invoice_details.push(row);
        Ok(())
    }

    async fn list_invoice_attachments(&mut self, invoice_ids: &[Uuid]) -> Result<Vec<InvoiceAttachmentRow>, AppError> {
        let mut attachments: Vec<InvoiceAttachmentRow> = self
            .owned(&self.work.invoice_attachments, |a| a.tenant_id)
            .filter(|a| invoice_ids.contains(&a.invoice_id))
            .cloned()
            .collect();
        attachments.sort_by(|a, b| b.created.cmp(&a.created));
        Ok(attachments)
    }

    // =========================================================================
    //  PAGAMENTOS
    // =========================================================================

    async fn list_payments(&mut self, client_id: Option<Uuid>) -> Result<Vec<PaymentWithMethod>, AppError> {
        let mut payments: Vec<PaymentWithMethod> = self
            .owned(&self.work.payments, |p| p.tenant_id)
            .filter(|p| client_id.is_none_or(|id| p.client_id == id))
            .map(|p| self.payment_view(p))
            .collect();
        payments.sort_by(|a, b| b.payment.created.cmp(&a.payment.created));
        Ok(payments)
    }

    async fn find_payment(&mut self, id: Uuid) -> Result<Option<PaymentWithMethod>, AppError> {
        Ok(self
            .owned(&self.work.payments, |p| p.tenant_id)
            .find(|p| p.id == id)
            .map(|p| self.payment_view(p)))
    }

    async fn insert_payment(&mut self, payment: &PaymentRow) -> Result<(), AppError> {
        if !self.work.clients.iter().any(|c| c.id == payment.client_id) {
            return Err(fk_violation("payments.client_id"));
        }
        let mut row = payment.clone();
        row.tenant_id = self.tenant_id;
        self.work.payments.push(row);
        Ok(())
    }

    async fn find_payment_method(&mut self, name: &str) -> Result<Option<PaymentMethodRow>, AppError> {
        let wanted = name.trim().to_lowercase();
        Ok(self
            .owned(&self.work.payment_methods, |m| m.tenant_id)
            .find(|m| m.name.trim().to_lowercase() == wanted)
            .cloned())
    }

    async fn insert_payment_method(&mut self, method: &PaymentMethodRow) -> Result<(), AppError> {
        let mut row = method.clone();
        row.tenant_id = self.tenant_id;
        self.work.payment_methods.push(row);
        Ok(())
    }

    async fn list_payment_details(&mut self, payment_ids: &[Uuid]) -> Result<Vec<PaymentDetailRow>, AppError> {
        Ok(self
            .owned(&self.work.payment_details, |d| d.tenant_id)
            .filter(|d| payment_ids.contains(&d.payment_id))
            .cloned()
            .collect())
    }

    async fn insert_payment_detail(&mut self, detail: &PaymentDetailRow) -> Result<(), AppError> {
        if !self.work.invoices.iter().any(|i| i.id == detail.invoice_id) {
            return Err(fk_violation("payment_details.invoice_id"));
        }
        let mut row = detail.clone();
        row.tenant_id = self.tenant_id;
        self.work.payment_details.push(row);
        Ok(())
    }

    async fn list_payment_attachments(&mut self, payment_ids: &[Uuid]) -> Result<Vec<PaymentAttachmentRow>, AppError> {
        let mut attachments: Vec<PaymentAttachmentRow> = self
            .owned(&self.work.payment_attachments, |a| a.tenant_id)
            .filter(|a| payment_ids.contains(&a.payment_id))
            .cloned()
            .collect();
        attachments.sort_by(|a, b| b.created.cmp(&a.created));
        Ok(attachments)
    }

    async fn insert_payment_attachment(&mut self, attachment: &PaymentAttachmentRow) -> Result<(), AppError> {
        self.check_fail("insert_payment_attachment")?;
        if let Some(invoice_id) = attachment.invoice_id {
            if !self.work.invoices.iter().any(|i| i.id == invoice_id) {
                return Err(fk_violation("payment_attachments.invoice_id"));
            }
        }
        let mut row = attachment.clone();
        row.tenant_id = self.tenant_id;
        self.work.payment_attachments.push(row);
        Ok(())
    }
}

// =========================================================================
//  FIXTURES
// =========================================================================

/// Construtores de linhas para montar cenários de teste.
impl MemoryState {
    pub fn add_client(&mut self, tenant_id: Uuid, name: &str) -> Uuid {
        let id = Uuid::new_v4();
        let at = Utc::now() - chrono::Duration::days(30);
        self.clients.push(ClientRow {
            id,
            tenant_id,
            name: Some(name.to_string()),
            email: None,
            phone: None,
            status: Some(true),
            created: Some(at),
            updated: Some(at),
        });
        id
    }

    pub fn add_parameter(&mut self, tenant_id: Uuid, name: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.parameters.push(ParameterRow { id, tenant_id, name: Some(name.to_string()) });
        id
    }

    pub fn add_tax(&mut self, tenant_id: Uuid, name: &str, percentage: Decimal) -> Uuid {
        let id = Uuid::new_v4();
        self.taxes.push(TaxRow { id, tenant_id, name: Some(name.to_string()), percentage, active: true });
        id
    }

    pub fn add_service(&mut self, tenant_id: Uuid, name: &str, price: Decimal) -> Uuid {
        let id = Uuid::new_v4();
        self.services.push(ServiceRow {
            id,
            tenant_id,
            name: Some(name.to_string()),
            unit: None,
            price,
            subtotal: price,
            frequency: None,
            tax_one_id: None,
            tax_two_id: None,
            category: None,
            status: Some(true),
            created: Some(Utc::now()),
            updated: None,
        });
        id
    }

    pub fn add_assignment(&mut self, tenant_id: Uuid, client_id: Uuid, service_id: Uuid, status: Option<bool>) -> Uuid {
        let id = Uuid::new_v4();
        self.assignments.push(ClientServiceRow {
            id,
            tenant_id,
            client_id,
            service_id,
            started: None,
            delivery: None,
            expiry: None,
            frequency: None,
            unit: None,
            url_api: None,
            token_api: None,
            status,
            created: Some(Utc::now()),
        });
        id
    }

    pub fn add_invoice(&mut self, tenant_id: Uuid, client_id: Uuid, service_id: Option<Uuid>, subtotal: Decimal) -> Uuid {
        let id = Uuid::new_v4();
        self.invoices.push(InvoiceRow {
            id,
            tenant_id,
            client_id,
            service_id,
            number: Some(format!("FE-{}", self.invoices.len() + 1)),
            description: None,
            subtotal,
            tax_one_id: None,
            tax_two_id: None,
            tax_one_amount: Decimal::ZERO,
            tax_two_amount: Decimal::ZERO,
            include_vat: false,
            vat_amount: Decimal::ZERO,
            total: subtotal,
            status: None,
            expiry: None,
            created: Some(Utc::now()),
            updated: None,
        });
        id
    }

    pub fn add_quote(&mut self, tenant_id: Uuid, client_id: Uuid, value: Decimal, line_totals: &[Decimal]) -> Uuid {
        let id = Uuid::new_v4();
        self.quotes.push(QuoteRow {
            id,
            tenant_id,
            client_id,
            description: Some("Cotización de prueba".to_string()),
            reference: None,
            value,
            status: None,
            created: Some(Utc::now()),
            updated: None,
        });
        for (index, total) in line_totals.iter().enumerate() {
            self.quote_details.push(QuoteDetailRow {
                id: Uuid::new_v4(),
                tenant_id,
                quote_id: id,
                service_id: None,
                item: index as i32 + 1,
                quantity: Decimal::ONE,
                total: *total,
            });
        }
        id
    }

    pub fn add_payment(&mut self, tenant_id: Uuid, client_id: Uuid, amount: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.payments.push(PaymentRow {
            id,
            tenant_id,
            client_id,
            amount: Some(amount.to_string()),
            status_text: None,
            status: Some(true),
            method_id: None,
            date: None,
            reference: None,
            created: Some(Utc::now()),
        });
        id
    }
}
