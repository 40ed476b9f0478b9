// src/mappers/invoice.rs

use crate::{
    common::normalizer::{format_timestamp, non_blank, text_or},
    mappers::{FALLBACK_CLIENT_NAME, FALLBACK_INVOICE_NUMBER},
    models::invoice::{
        AttachmentDto, InvoiceAttachmentRow, InvoiceDetailDto, InvoiceDetailRow, InvoiceDto, InvoiceStatus,
        InvoiceWithClient,
    },
};

pub fn map_invoice_detail(row: &InvoiceDetailRow) -> InvoiceDetailDto {
    InvoiceDetailDto {
        id: row.id,
        item: row.item,
        service_id: row.service_id,
        description: non_blank(row.description.as_deref()),
        quantity: row.quantity,
        total: row.total,
    }
}

pub fn map_invoice_attachment(row: &InvoiceAttachmentRow) -> AttachmentDto {
    AttachmentDto {
        id: row.id,
        url: row.url.clone(),
        invoice_id: Some(row.invoice_id),
        created_at: format_timestamp(row.created),
    }
}

/// `status` é o status exibido (já com "vencida" derivada do relógio).
pub fn map_invoice(
    row: &InvoiceWithClient,
    details: &[InvoiceDetailRow],
    attachments: &[InvoiceAttachmentRow],
    status: InvoiceStatus,
) -> InvoiceDto {
    let i = &row.invoice;

    let mut items: Vec<&InvoiceDetailRow> = details.iter().filter(|d| d.invoice_id == i.id).collect();
    items.sort_by_key(|d| d.item);

    InvoiceDto {
        id: i.id,
        client_id: i.client_id,
        client_name: text_or(row.client_name.as_deref(), FALLBACK_CLIENT_NAME),
        service_id: i.service_id,
        number: text_or(i.number.as_deref(), FALLBACK_INVOICE_NUMBER),
        description: non_blank(i.description.as_deref()),
        subtotal: i.subtotal,
        tax_one_amount: i.tax_one_amount,
        tax_two_amount: i.tax_two_amount,
        include_vat: i.include_vat,
        vat_amount: i.vat_amount,
        total: i.total,
        status,
        expiry: format_timestamp(i.expiry),
        details: items.into_iter().map(map_invoice_detail).collect(),
        attachments: attachments
            .iter()
            .filter(|a| a.invoice_id == i.id)
            .map(map_invoice_attachment)
            .collect(),
        created_at: format_timestamp(i.created),
        updated_at: format_timestamp(i.updated),
    }
}
