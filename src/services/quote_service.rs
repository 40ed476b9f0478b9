// src/services/quote_service.rs

use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::Value;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::AppError,
        normalizer::{classify_status, non_blank, parse_currency_value, round_money},
    },
    db::{BillingStore, BillingTx},
    mappers::quote::{map_quote, status_flag},
    models::{
        invoice::{InvoiceDetailRow, InvoiceRow},
        mail::{EmailMessage, SendEmailRequest},
        quote::{
            ConversionResult, CreateQuoteRequest, QuoteAttachmentRow, QuoteDetailRow, QuoteDto, QuoteRow,
            QuoteWithClient, UpdateQuoteStatusRequest, QUOTE_STATUS_KEYWORDS,
        },
    },
    services::{billing_rules::quote_total, client_service::record_activity, mail},
};

/// Cotações (de um cliente ou do tenant) com itens, total e fatura gerada.
pub(crate) async fn load_quotes<T: BillingTx>(tx: &mut T, client_id: Option<Uuid>) -> Result<Vec<QuoteDto>, AppError> {
    let quotes = tx.list_quotes(client_id).await?;
    hydrate_quotes(tx, &quotes).await
}

async fn hydrate_quotes<T: BillingTx>(tx: &mut T, quotes: &[QuoteWithClient]) -> Result<Vec<QuoteDto>, AppError> {
    if quotes.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<Uuid> = quotes.iter().map(|q| q.quote.id).collect();
    let details = tx.list_quote_details(&ids).await?;
    let attachments = tx.list_quote_attachments(&ids).await?;

    Ok(quotes
        .iter()
        .map(|q| {
            let totals: Vec<Decimal> = details
                .iter()
                .filter(|d| d.detail.quote_id == q.quote.id)
                .map(|d| d.detail.total)
                .collect();
            let invoice_id = attachments.iter().find(|a| a.quote_id == q.quote.id).map(|a| a.invoice_id);
            map_quote(q, &details, invoice_id, quote_total(q.quote.value, &totals))
        })
        .collect())
}

async fn load_quote<T: BillingTx>(tx: &mut T, quote_id: Uuid) -> Result<QuoteDto, AppError> {
    let quote = tx.find_quote(quote_id).await?.ok_or(AppError::QuoteNotFound)?;
    let mut dtos = hydrate_quotes(tx, std::slice::from_ref(&quote)).await?;
    dtos.pop().ok_or(AppError::QuoteNotFound)
}

#[derive(Clone)]
pub struct QuoteService<S: BillingStore> {
    store: S,
}

impl<S: BillingStore> QuoteService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn list_quotes(&self, tenant_id: Uuid) -> Result<Vec<QuoteDto>, AppError> {
        let mut tx = self.store.begin(tenant_id).await?;
        load_quotes(&mut tx, None).await
    }

    pub async fn get_quote(&self, tenant_id: Uuid, quote_id: Uuid) -> Result<QuoteDto, AppError> {
        let mut tx = self.store.begin(tenant_id).await?;
        load_quote(&mut tx, quote_id).await
    }

    pub async fn create_quote(&self, tenant_id: Uuid, payload: CreateQuoteRequest) -> Result<QuoteDto, AppError> {
        payload.validate()?;
        let client_id = payload.client_id.ok_or(AppError::MissingField("clientId"))?;
        let now = Utc::now();

        let mut tx = self.store.begin(tenant_id).await?;
        tx.find_client(client_id).await?.ok_or(AppError::ClientNotFound)?;

        let quote = QuoteRow {
            id: Uuid::new_v4(),
            tenant_id,
            client_id,
            description: non_blank(Some(payload.description.as_str())),
            reference: non_blank(payload.reference.as_deref()),
            value: round_money(parse_currency_value(payload.value.as_ref().unwrap_or(&Value::Null))),
            status: None,
            created: Some(now),
            updated: Some(now),
        };
        tx.insert_quote(&quote).await?;

        for (index, line) in payload.details.iter().enumerate() {
            let quantity = line.quantity.unwrap_or(Decimal::ONE);
            let price = match line.service_id {
                Some(service_id) => tx.find_service(service_id).await?.ok_or(AppError::ServiceNotFound)?.price,
                None => Decimal::ZERO,
            };
            // Sem total informado: preço do serviço x quantidade
            let total = match &line.total {
                Some(raw) if !raw.is_null() => parse_currency_value(raw),
                _ => price * quantity,
            };

            tx.insert_quote_detail(&QuoteDetailRow {
                id: Uuid::new_v4(),
                tenant_id,
                quote_id: quote.id,
                service_id: line.service_id,
                item: index as i32 + 1,
                quantity,
                total: round_money(total),
            })
            .await?;
        }

        let dto = load_quote(&mut tx, quote.id).await?;
        tx.commit().await?;
        Ok(dto)
    }

    /// Status a partir de texto livre ("Aprobada", "rechazada por el cliente").
    pub async fn update_status(
        &self,
        tenant_id: Uuid,
        quote_id: Uuid,
        payload: UpdateQuoteStatusRequest,
    ) -> Result<QuoteDto, AppError> {
        let text = non_blank(payload.status.as_deref()).ok_or(AppError::MissingField("status"))?;
        let status = classify_status(Some(&text), None, &QUOTE_STATUS_KEYWORDS)
            .ok_or_else(|| AppError::InvalidValue { field: "status", value: text.clone() })?;

        let mut tx = self.store.begin(tenant_id).await?;
        tx.find_quote(quote_id).await?.ok_or(AppError::QuoteNotFound)?;
        tx.update_quote_status(quote_id, status_flag(status), Utc::now()).await?;

        let dto = load_quote(&mut tx, quote_id).await?;
        tx.commit().await?;
        Ok(dto)
    }

    /// Converte a cotação em fatura. Idempotente: uma segunda chamada devolve
    /// a fatura já criada com `already_converted = true`.
    pub async fn convert_to_invoice(&self, tenant_id: Uuid, quote_id: Uuid) -> Result<ConversionResult, AppError> {
        let now = Utc::now();
        let mut tx = self.store.begin(tenant_id).await?;

        let QuoteWithClient { quote, .. } = tx.find_quote(quote_id).await?.ok_or(AppError::QuoteNotFound)?;

        if let Some(existing) = tx.list_quote_attachments(&[quote_id]).await?.first() {
            return Ok(ConversionResult { invoice_id: existing.invoice_id, already_converted: true });
        }

        let details = tx.list_quote_details(&[quote_id]).await?;
        let totals: Vec<Decimal> = details.iter().map(|d| d.detail.total).collect();
        let total = round_money(quote_total(quote.value, &totals));

        let invoice = InvoiceRow {
            id: Uuid::new_v4(),
            tenant_id,
            client_id: quote.client_id,
            // O total vem da cotação; os serviços ficam só nos itens
            service_id: None,
            number: quote.reference.clone(),
            description: quote.description.clone(),
            subtotal: total,
            tax_one_id: None,
            tax_two_id: None,
            tax_one_amount: Decimal::ZERO,
            tax_two_amount: Decimal::ZERO,
            include_vat: false,
            vat_amount: Decimal::ZERO,
            total,
            status: None,
            expiry: None,
            created: Some(now),
            updated: Some(now),
        };
        tx.insert_invoice(&invoice).await?;

        // Itens renumerados a partir de 1, na ordem da cotação
        for (index, view) in details.iter().enumerate() {
            tx.insert_invoice_detail(&InvoiceDetailRow {
                id: Uuid::new_v4(),
                tenant_id,
                invoice_id: invoice.id,
                service_id: view.detail.service_id,
                item: index as i32 + 1,
                description: view.service_name.clone(),
                quantity: view.detail.quantity,
                total: view.detail.total,
            })
            .await?;
        }

        tx.insert_quote_attachment(&QuoteAttachmentRow {
            id: Uuid::new_v4(),
            tenant_id,
            quote_id,
            invoice_id: invoice.id,
            created: Some(now),
        })
        .await?;
        tx.update_quote_status(quote_id, Some(true), now).await?;

        let label = quote.description.as_deref().unwrap_or("-");
        record_activity(&mut tx, quote.client_id, format!("Cotización convertida en factura: {label}"), now).await?;

        tx.commit().await?;

        tracing::info!("Cotação {} convertida na fatura {}", quote_id, invoice.id);
        Ok(ConversionResult { invoice_id: invoice.id, already_converted: false })
    }

    pub async fn send_email(
        &self,
        tenant_id: Uuid,
        quote_id: Uuid,
        payload: SendEmailRequest,
    ) -> Result<EmailMessage, AppError> {
        let mut tx = self.store.begin(tenant_id).await?;

        let quote = load_quote(&mut tx, quote_id).await?;
        let client = tx.find_client(quote.client_id).await?.ok_or(AppError::ClientNotFound)?;
        let recipient = mail::resolve_recipient(payload.recipient.as_deref(), client.email.as_deref())?;

        let mut lines = vec![
            format!("Hola {},", quote.client_name),
            format!("Adjuntamos la cotización \"{}\".", quote.description),
        ];
        lines.extend(quote.details.iter().map(|d| format!("{}. {} x {} = {}", d.item, d.service_name, d.quantity, d.total)));
        lines.push(format!("Total: {}", quote.total));

        tracing::info!("Cotação {} preparada para envio a {}", quote_id, recipient);
        Ok(mail::compose(recipient, format!("Cotización: {}", quote.description), &lines))
    }
}
