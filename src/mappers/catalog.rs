// src/mappers/catalog.rs

use crate::{
    common::normalizer::{format_legacy_date, format_timestamp, non_blank, text_or},
    mappers::{FALLBACK_SERVICE_NAME, FALLBACK_TAX_NAME},
    models::catalog::{ClientServiceDto, ClientServiceView, ServiceDto, ServiceRow, ServiceStatus, ServiceWithUsage, TaxDto, TaxRow},
};

/// Serviço: só `true` é ativo.
pub fn service_status(flag: Option<bool>) -> ServiceStatus {
    if flag == Some(true) { ServiceStatus::Active } else { ServiceStatus::Inactive }
}

/// Atribuição: só `false` é inativa (mesma regra da contagem de clientes).
pub fn assignment_status(flag: Option<bool>) -> ServiceStatus {
    if flag == Some(false) { ServiceStatus::Inactive } else { ServiceStatus::Active }
}

pub fn map_tax(row: &TaxRow) -> TaxDto {
    TaxDto {
        id: row.id,
        name: text_or(row.name.as_deref(), FALLBACK_TAX_NAME),
        percentage: row.percentage,
        active: row.active,
    }
}

pub fn map_service_row(row: &ServiceRow, clients_count: i64) -> ServiceDto {
    ServiceDto {
        id: row.id,
        name: text_or(row.name.as_deref(), FALLBACK_SERVICE_NAME),
        unit: non_blank(row.unit.as_deref()),
        price: row.price,
        subtotal: row.subtotal,
        frequency: non_blank(row.frequency.as_deref()),
        tax_one_id: row.tax_one_id,
        tax_two_id: row.tax_two_id,
        category: non_blank(row.category.as_deref()),
        status: service_status(row.status),
        clients_count,
        created_at: format_timestamp(row.created),
        updated_at: format_timestamp(row.updated),
    }
}

pub fn map_service(row: &ServiceWithUsage) -> ServiceDto {
    map_service_row(&row.service, row.clients_count)
}

pub fn map_client_service(view: &ClientServiceView) -> ClientServiceDto {
    let a = &view.assignment;
    ClientServiceDto {
        id: a.id,
        service_id: a.service_id,
        service_name: text_or(view.service_name.as_deref(), FALLBACK_SERVICE_NAME),
        price: view.service_price,
        started: format_legacy_date(a.started.as_deref()),
        delivery: format_legacy_date(a.delivery.as_deref()),
        expiry: format_legacy_date(a.expiry.as_deref()),
        frequency: non_blank(a.frequency.as_deref()),
        unit: non_blank(a.unit.as_deref()),
        url_api: non_blank(a.url_api.as_deref()),
        token_api: non_blank(a.token_api.as_deref()),
        status: assignment_status(a.status),
        created_at: format_timestamp(a.created),
    }
}
