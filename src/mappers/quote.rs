// src/mappers/quote.rs

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::normalizer::{format_timestamp, non_blank, text_or, TriState},
    mappers::{FALLBACK_CLIENT_NAME, FALLBACK_QUOTE_DESCRIPTION, FALLBACK_SERVICE_NAME},
    models::quote::{QuoteDetailDto, QuoteDetailView, QuoteDto, QuoteStatus, QuoteWithClient},
};

pub fn quote_status(flag: Option<bool>) -> QuoteStatus {
    match TriState::from(flag) {
        TriState::True => QuoteStatus::Aprobada,
        TriState::False => QuoteStatus::Rechazada,
        TriState::Unset => QuoteStatus::Pendiente,
    }
}

pub fn status_flag(status: QuoteStatus) -> Option<bool> {
    match status {
        QuoteStatus::Aprobada => Some(true),
        QuoteStatus::Rechazada => Some(false),
        QuoteStatus::Pendiente => None,
    }
}

pub fn map_quote_detail(view: &QuoteDetailView) -> QuoteDetailDto {
    let d = &view.detail;
    QuoteDetailDto {
        id: d.id,
        item: d.item,
        service_id: d.service_id,
        service_name: text_or(view.service_name.as_deref(), FALLBACK_SERVICE_NAME),
        quantity: d.quantity,
        total: d.total,
    }
}

/// `details` pode conter itens de outras cotações (leitura em lote); só os
/// desta entram. `total` vem das regras de derivação.
pub fn map_quote(row: &QuoteWithClient, details: &[QuoteDetailView], invoice_id: Option<Uuid>, total: Decimal) -> QuoteDto {
    let q = &row.quote;

    let mut items: Vec<&QuoteDetailView> = details.iter().filter(|d| d.detail.quote_id == q.id).collect();
    items.sort_by_key(|d| d.detail.item);

    QuoteDto {
        id: q.id,
        client_id: q.client_id,
        client_name: text_or(row.client_name.as_deref(), FALLBACK_CLIENT_NAME),
        description: text_or(q.description.as_deref(), FALLBACK_QUOTE_DESCRIPTION),
        reference: non_blank(q.reference.as_deref()),
        status: quote_status(q.status),
        total,
        invoice_id,
        details: items.into_iter().map(map_quote_detail).collect(),
        created_at: format_timestamp(q.created),
        updated_at: format_timestamp(q.updated),
    }
}
