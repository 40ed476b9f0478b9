// src/services/invoice_service.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::AppError,
        normalizer::{classify_status, non_blank, parse_currency_value, round_money},
    },
    db::{BillingStore, BillingTx},
    mappers::invoice::map_invoice,
    models::{
        invoice::{
            CreateInvoiceRequest, InvoiceDetailRow, InvoiceDto, InvoiceRow, InvoiceWithClient, ReminderDto,
            UpdateInvoiceStatusRequest, INVOICE_STATUS_KEYWORDS,
        },
        mail::{EmailMessage, SendEmailRequest},
    },
    services::{
        billing_rules::{build_reminders, compute_invoice_amounts, invoice_status, invoice_status_flag},
        catalog_service::require_tax,
        mail,
    },
};

/// Faturas com itens, anexos e o status exibido no instante `now`.
pub(crate) async fn hydrate_invoices<T: BillingTx>(
    tx: &mut T,
    invoices: &[InvoiceWithClient],
    now: DateTime<Utc>,
) -> Result<Vec<InvoiceDto>, AppError> {
    if invoices.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<Uuid> = invoices.iter().map(|i| i.invoice.id).collect();
    let details = tx.list_invoice_details(&ids).await?;
    let attachments = tx.list_invoice_attachments(&ids).await?;

    Ok(invoices
        .iter()
        .map(|row| {
            let status = invoice_status(row.invoice.status, row.invoice.expiry, now);
            map_invoice(row, &details, &attachments, status)
        })
        .collect())
}

async fn load_invoice<T: BillingTx>(tx: &mut T, invoice_id: Uuid, now: DateTime<Utc>) -> Result<InvoiceDto, AppError> {
    let invoice = tx.find_invoice(invoice_id).await?.ok_or(AppError::InvoiceNotFound)?;
    let mut dtos = hydrate_invoices(tx, std::slice::from_ref(&invoice), now).await?;
    dtos.pop().ok_or(AppError::InvoiceNotFound)
}

#[derive(Clone)]
pub struct InvoiceService<S: BillingStore> {
    store: S,
}

impl<S: BillingStore> InvoiceService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn list_invoices(&self, tenant_id: Uuid) -> Result<Vec<InvoiceDto>, AppError> {
        let mut tx = self.store.begin(tenant_id).await?;
        let invoices = tx.list_invoices(None).await?;
        hydrate_invoices(&mut tx, &invoices, Utc::now()).await
    }

    pub async fn get_invoice(&self, tenant_id: Uuid, invoice_id: Uuid) -> Result<InvoiceDto, AppError> {
        let mut tx = self.store.begin(tenant_id).await?;
        load_invoice(&mut tx, invoice_id, Utc::now()).await
    }

    /// Lembretes de cobrança de todas as faturas não pagas do tenant.
    pub async fn list_reminders(&self, tenant_id: Uuid) -> Result<Vec<ReminderDto>, AppError> {
        let mut tx = self.store.begin(tenant_id).await?;
        let rows: Vec<InvoiceRow> = tx.list_invoices(None).await?.into_iter().map(|r| r.invoice).collect();
        Ok(build_reminders(&rows, Utc::now()))
    }

    /// Cria a fatura com a fórmula canônica. Subtotal ausente = soma dos itens.
    pub async fn create_invoice(&self, tenant_id: Uuid, payload: CreateInvoiceRequest) -> Result<InvoiceDto, AppError> {
        payload.validate()?;
        let client_id = payload.client_id.ok_or(AppError::MissingField("clientId"))?;
        let now = Utc::now();

        let mut tx = self.store.begin(tenant_id).await?;
        tx.find_client(client_id).await?.ok_or(AppError::ClientNotFound)?;
        if let Some(service_id) = payload.service_id {
            tx.find_service(service_id).await?.ok_or(AppError::ServiceNotFound)?;
        }

        let tax_one = require_tax(&mut tx, payload.tax_one_id).await?;
        let tax_two = require_tax(&mut tx, payload.tax_two_id).await?;

        let mut lines = Vec::with_capacity(payload.details.len());
        for line in &payload.details {
            let quantity = line.quantity.unwrap_or(Decimal::ONE);
            let total = match &line.total {
                Some(raw) if !raw.is_null() => parse_currency_value(raw),
                _ => match line.service_id {
                    Some(service_id) => {
                        tx.find_service(service_id).await?.ok_or(AppError::ServiceNotFound)?.price * quantity
                    }
                    None => Decimal::ZERO,
                },
            };
            lines.push((line, quantity, round_money(total)));
        }

        let subtotal = match &payload.subtotal {
            Some(raw) if !raw.is_null() => parse_currency_value(raw),
            _ => lines.iter().map(|(_, _, total)| *total).sum(),
        };
        let amounts = compute_invoice_amounts(
            subtotal,
            (payload.tax_one_id, tax_one),
            (payload.tax_two_id, tax_two),
            payload.include_vat,
        );

        let invoice = InvoiceRow {
            id: Uuid::new_v4(),
            tenant_id,
            client_id,
            service_id: payload.service_id,
            number: non_blank(payload.number.as_deref()),
            description: non_blank(payload.description.as_deref()),
            subtotal: amounts.subtotal,
            tax_one_id: amounts.tax_one_id,
            tax_two_id: amounts.tax_two_id,
            tax_one_amount: amounts.tax_one_amount,
            tax_two_amount: amounts.tax_two_amount,
            include_vat: amounts.include_vat,
            vat_amount: amounts.vat_amount,
            total: amounts.total,
            status: None,
            expiry: payload.expiry,
            created: Some(now),
            updated: Some(now),
        };
        tx.insert_invoice(&invoice).await?;

        for (index, (line, quantity, total)) in lines.into_iter().enumerate() {
            tx.insert_invoice_detail(&InvoiceDetailRow {
                id: Uuid::new_v4(),
                tenant_id,
                invoice_id: invoice.id,
                service_id: line.service_id,
                item: index as i32 + 1,
                description: non_blank(line.description.as_deref()),
                quantity,
                total,
            })
            .await?;
        }

        let dto = load_invoice(&mut tx, invoice.id, now).await?;
        tx.commit().await?;

        tracing::info!("Fatura {} criada (total {})", invoice.id, invoice.total);
        Ok(dto)
    }

    /// "Pagada", "anulada por error", "pendiente"... "Vencida" volta a ficar em aberto.
    pub async fn update_status(
        &self,
        tenant_id: Uuid,
        invoice_id: Uuid,
        payload: UpdateInvoiceStatusRequest,
    ) -> Result<InvoiceDto, AppError> {
        let text = non_blank(payload.status.as_deref()).ok_or(AppError::MissingField("status"))?;
        let status = classify_status(Some(&text), None, &INVOICE_STATUS_KEYWORDS)
            .ok_or_else(|| AppError::InvalidValue { field: "status", value: text.clone() })?;
        let now = Utc::now();

        let mut tx = self.store.begin(tenant_id).await?;
        tx.find_invoice(invoice_id).await?.ok_or(AppError::InvoiceNotFound)?;
        tx.update_invoice_status(invoice_id, invoice_status_flag(status), now).await?;

        let dto = load_invoice(&mut tx, invoice_id, now).await?;
        tx.commit().await?;
        Ok(dto)
    }

    pub async fn send_email(
        &self,
        tenant_id: Uuid,
        invoice_id: Uuid,
        payload: SendEmailRequest,
    ) -> Result<EmailMessage, AppError> {
        let now = Utc::now();
        let mut tx = self.store.begin(tenant_id).await?;

        let invoice = load_invoice(&mut tx, invoice_id, now).await?;
        let client = tx.find_client(invoice.client_id).await?.ok_or(AppError::ClientNotFound)?;
        let recipient = mail::resolve_recipient(payload.recipient.as_deref(), client.email.as_deref())?;

        let mut lines = vec![
            format!("Hola {},", invoice.client_name),
            format!("Adjuntamos la factura {}.", invoice.number),
            format!("Subtotal: {}", invoice.subtotal),
        ];
        if invoice.include_vat {
            lines.push(format!("IVA: {}", invoice.vat_amount));
        }
        lines.push(format!("Total: {}", invoice.total));
        if let Some(due) = &invoice.expiry {
            lines.push(format!("Vence: {due}"));
        }

        tracing::info!("Fatura {} preparada para envio a {}", invoice_id, recipient);
        Ok(mail::compose(recipient, format!("Factura {}", invoice.number), &lines))
    }
}
