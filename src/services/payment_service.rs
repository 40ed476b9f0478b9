// src/services/payment_service.rs

use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::AppError,
        normalizer::{non_blank, parse_currency_value, round_money},
    },
    db::{BillingStore, BillingTx},
    mappers::payment::map_payment,
    models::invoice::InvoiceWithClient,
    models::payment::{
        CreatePaymentRequest, PaymentAttachmentRow, PaymentDetailRow, PaymentDto, PaymentMethodRow, PaymentRow,
        PaymentWithMethod,
    },
    services::client_service::record_activity,
};

/// Pagamentos (de um cliente ou do tenant) com faturas quitadas e comprovantes.
pub(crate) async fn load_payments<T: BillingTx>(tx: &mut T, client_id: Option<Uuid>) -> Result<Vec<PaymentDto>, AppError> {
    let payments = tx.list_payments(client_id).await?;
    hydrate_payments(tx, &payments).await
}

async fn hydrate_payments<T: BillingTx>(tx: &mut T, payments: &[PaymentWithMethod]) -> Result<Vec<PaymentDto>, AppError> {
    if payments.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<Uuid> = payments.iter().map(|p| p.payment.id).collect();
    let details = tx.list_payment_details(&ids).await?;
    let attachments = tx.list_payment_attachments(&ids).await?;

    Ok(payments.iter().map(|p| map_payment(p, &details, &attachments)).collect())
}

async fn load_payment<T: BillingTx>(tx: &mut T, payment_id: Uuid) -> Result<PaymentDto, AppError> {
    let payment = tx.find_payment(payment_id).await?.ok_or(AppError::PaymentNotFound)?;
    let mut dtos = hydrate_payments(tx, std::slice::from_ref(&payment)).await?;
    dtos.pop().ok_or(AppError::PaymentNotFound)
}

// O valor é guardado como foi enviado; número vira texto sem formatação
fn amount_text(raw: &Value) -> Result<String, AppError> {
    match raw {
        Value::String(s) => non_blank(Some(s.as_str())).ok_or(AppError::MissingField("amount")),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Err(AppError::MissingField("amount")),
        other => Err(AppError::InvalidValue { field: "amount", value: other.to_string() }),
    }
}

// Método existente (sem diferenciar maiúsculas) ou um novo
async fn resolve_method<T: BillingTx>(tx: &mut T, tenant_id: Uuid, name: Option<&str>) -> Result<Option<Uuid>, AppError> {
    let Some(name) = non_blank(name) else {
        return Ok(None);
    };
    if let Some(method) = tx.find_payment_method(&name).await? {
        return Ok(Some(method.id));
    }

    let method = PaymentMethodRow { id: Uuid::new_v4(), tenant_id, name };
    tx.insert_payment_method(&method).await?;
    tracing::debug!("Método de pagamento '{}' criado", method.name);
    Ok(Some(method.id))
}

// Fatura citada pelo pagamento: precisa existir e ser do mesmo cliente
async fn client_invoice<T: BillingTx>(
    tx: &mut T,
    client_id: Uuid,
    invoice_id: Uuid,
) -> Result<InvoiceWithClient, AppError> {
    let invoice = tx.find_invoice(invoice_id).await?.ok_or(AppError::InvoiceNotFound)?;
    if invoice.invoice.client_id != client_id {
        return Err(AppError::InvalidValue { field: "invoiceId", value: invoice_id.to_string() });
    }
    Ok(invoice)
}

#[derive(Clone)]
pub struct PaymentService<S: BillingStore> {
    store: S,
}

impl<S: BillingStore> PaymentService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn list_payments(&self, tenant_id: Uuid) -> Result<Vec<PaymentDto>, AppError> {
        let mut tx = self.store.begin(tenant_id).await?;
        load_payments(&mut tx, None).await
    }

    pub async fn get_payment(&self, tenant_id: Uuid, payment_id: Uuid) -> Result<PaymentDto, AppError> {
        let mut tx = self.store.begin(tenant_id).await?;
        load_payment(&mut tx, payment_id).await
    }

    /// Registra o pagamento, seus itens por fatura e os comprovantes numa
    /// única transação. Item sem valor quita o total da fatura.
    pub async fn create_payment(&self, tenant_id: Uuid, payload: CreatePaymentRequest) -> Result<PaymentDto, AppError> {
        payload.validate()?;
        let client_id = payload.client_id.ok_or(AppError::MissingField("clientId"))?;
        let amount = amount_text(&payload.amount)?;
        let now = Utc::now();

        let mut tx = self.store.begin(tenant_id).await?;
        tx.find_client(client_id).await?.ok_or(AppError::ClientNotFound)?;

        let status_text = non_blank(payload.status.as_deref());
        // Sem texto nem flag, pagamento registrado conta como pago
        let status = match (&status_text, payload.paid) {
            (None, None) => Some(true),
            (_, flag) => flag,
        };

        // Referências validadas antes de qualquer escrita
        let mut lines = Vec::with_capacity(payload.invoices.len());
        for line in &payload.invoices {
            let invoice = client_invoice(&mut tx, client_id, line.invoice_id).await?;
            let amount = match &line.amount {
                Some(raw) if !raw.is_null() => round_money(parse_currency_value(raw)),
                _ => invoice.invoice.total,
            };
            lines.push((line.invoice_id, amount));
        }
        for attachment in &payload.attachments {
            if let Some(invoice_id) = attachment.invoice_id {
                client_invoice(&mut tx, client_id, invoice_id).await?;
            }
        }

        let method_id = resolve_method(&mut tx, tenant_id, payload.method.as_deref()).await?;

        let payment = PaymentRow {
            id: Uuid::new_v4(),
            tenant_id,
            client_id,
            amount: Some(amount.clone()),
            status_text,
            status,
            method_id,
            date: non_blank(payload.date.as_deref()).or_else(|| Some(now.format("%Y-%m-%d").to_string())),
            reference: non_blank(payload.reference.as_deref()),
            created: Some(now),
        };
        tx.insert_payment(&payment).await?;

        for (invoice_id, amount) in lines {
            tx.insert_payment_detail(&PaymentDetailRow {
                id: Uuid::new_v4(),
                tenant_id,
                payment_id: payment.id,
                invoice_id,
                amount,
            })
            .await?;
        }

        for attachment in &payload.attachments {
            tx.insert_payment_attachment(&PaymentAttachmentRow {
                id: Uuid::new_v4(),
                tenant_id,
                payment_id: payment.id,
                invoice_id: attachment.invoice_id,
                url: attachment.url.trim().to_string(),
                created: Some(now),
            })
            .await?;
        }

        record_activity(&mut tx, client_id, format!("Pago registrado: {amount}"), now).await?;

        let dto = load_payment(&mut tx, payment.id).await?;
        tx.commit().await?;

        tracing::info!("Pagamento {} registrado para o cliente {}", payment.id, client_id);
        Ok(dto)
    }
}
