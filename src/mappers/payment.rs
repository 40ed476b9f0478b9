// src/mappers/payment.rs

use crate::{
    common::normalizer::{classify_status, format_legacy_date, format_timestamp, non_blank, parse_currency, text_or},
    mappers::FALLBACK_METHOD_NAME,
    models::{
        invoice::AttachmentDto,
        payment::{
            PaymentAttachmentRow, PaymentDetailDto, PaymentDetailRow, PaymentDto, PaymentRow, PaymentStatus,
            PaymentWithMethod, PAYMENT_STATUS_KEYWORDS,
        },
    },
};

/// Texto livre primeiro, flag booleana como reserva.
pub fn payment_status(row: &PaymentRow) -> PaymentStatus {
    classify_status(row.status_text.as_deref(), row.status, &PAYMENT_STATUS_KEYWORDS)
}

pub fn map_payment_attachment(row: &PaymentAttachmentRow) -> AttachmentDto {
    AttachmentDto {
        id: row.id,
        url: row.url.clone(),
        invoice_id: row.invoice_id,
        created_at: format_timestamp(row.created),
    }
}

pub fn map_payment(
    row: &PaymentWithMethod,
    details: &[PaymentDetailRow],
    attachments: &[PaymentAttachmentRow],
) -> PaymentDto {
    let p = &row.payment;

    PaymentDto {
        id: p.id,
        client_id: p.client_id,
        amount: parse_currency(p.amount.as_deref()),
        amount_text: non_blank(p.amount.as_deref()),
        status: payment_status(p),
        method: text_or(row.method_name.as_deref(), FALLBACK_METHOD_NAME),
        date: format_legacy_date(p.date.as_deref()),
        reference: non_blank(p.reference.as_deref()),
        invoices: details
            .iter()
            .filter(|d| d.payment_id == p.id)
            .map(|d| PaymentDetailDto { invoice_id: d.invoice_id, amount: d.amount })
            .collect(),
        attachments: attachments
            .iter()
            .filter(|a| a.payment_id == p.id)
            .map(map_payment_attachment)
            .collect(),
        created_at: format_timestamp(p.created),
    }
}
