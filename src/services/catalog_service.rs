// src/services/catalog_service.rs

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::AppError,
        normalizer::{non_blank, parse_currency_value, round_money},
    },
    db::{BillingStore, BillingTx},
    mappers::catalog::{map_service, map_service_row, map_tax},
    models::catalog::{ServiceDto, ServiceRequest, ServiceRow, ServiceUpdateResult, TaxDto, TaxRequest, TaxRow},
    services::billing_rules::compute_invoice_amounts,
};

/// Percentual de um imposto referenciado pelo usuário. Id desconhecido = 404.
pub(crate) async fn require_tax<T: BillingTx>(tx: &mut T, tax_id: Option<Uuid>) -> Result<Decimal, AppError> {
    match tax_id {
        Some(id) => Ok(tx.find_tax(id).await?.ok_or(AppError::TaxNotFound)?.percentage),
        None => Ok(Decimal::ZERO),
    }
}

#[derive(Clone)]
pub struct CatalogService<S: BillingStore> {
    store: S,
}

impl<S: BillingStore> CatalogService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    // =========================================================================
    //  SERVIÇOS
    // =========================================================================

    pub async fn list_services(&self, tenant_id: Uuid) -> Result<Vec<ServiceDto>, AppError> {
        let mut tx = self.store.begin(tenant_id).await?;
        Ok(tx.list_services().await?.iter().map(map_service).collect())
    }

    pub async fn get_service(&self, tenant_id: Uuid, service_id: Uuid) -> Result<ServiceDto, AppError> {
        let mut tx = self.store.begin(tenant_id).await?;
        let service = tx.find_service(service_id).await?.ok_or(AppError::ServiceNotFound)?;
        let clients_count = tx.count_active_assignments(service_id).await?;
        Ok(map_service_row(&service, clients_count))
    }

    pub async fn create_service(&self, tenant_id: Uuid, payload: ServiceRequest) -> Result<ServiceDto, AppError> {
        payload.validate()?;
        let now = Utc::now();
        let mut tx = self.store.begin(tenant_id).await?;

        require_tax(&mut tx, payload.tax_one_id).await?;
        require_tax(&mut tx, payload.tax_two_id).await?;

        let service = build_service(Uuid::new_v4(), tenant_id, &payload, Some(now), None);
        tx.insert_service(&service).await?;
        tx.commit().await?;

        Ok(map_service_row(&service, 0))
    }

    /// Atualiza o serviço e recalcula, na mesma transação, todas as faturas
    /// que o referenciam (pagas inclusive).
    pub async fn update_service(
        &self,
        tenant_id: Uuid,
        service_id: Uuid,
        payload: ServiceRequest,
    ) -> Result<ServiceUpdateResult, AppError> {
        payload.validate()?;
        let now = Utc::now();
        let mut tx = self.store.begin(tenant_id).await?;

        let current = tx.find_service(service_id).await?.ok_or(AppError::ServiceNotFound)?;
        let tax_one = require_tax(&mut tx, payload.tax_one_id).await?;
        let tax_two = require_tax(&mut tx, payload.tax_two_id).await?;

        let service = build_service(service_id, tenant_id, &payload, current.created, Some(now));
        tx.update_service(&service).await?;

        let invoices = tx.list_invoices_by_service(service_id).await?;
        for invoice in &invoices {
            let amounts = compute_invoice_amounts(
                service.subtotal,
                (service.tax_one_id, tax_one),
                (service.tax_two_id, tax_two),
                invoice.include_vat,
            );
            tx.update_invoice_amounts(invoice.id, &amounts, now).await?;
        }

        let clients_count = tx.count_active_assignments(service_id).await?;
        tx.commit().await?;

        tracing::info!("Serviço {} atualizado; {} fatura(s) recalculada(s)", service_id, invoices.len());
        Ok(ServiceUpdateResult {
            service: map_service_row(&service, clients_count),
            invoices_updated: invoices.len(),
        })
    }

    /// Só exclui serviços sem atribuições ativas e sem faturas que o citem,
    /// no cabeçalho ou em algum item.
    pub async fn delete_service(&self, tenant_id: Uuid, service_id: Uuid) -> Result<(), AppError> {
        let mut tx = self.store.begin(tenant_id).await?;

        tx.find_service(service_id).await?.ok_or(AppError::ServiceNotFound)?;

        let active = tx.count_active_assignments(service_id).await?;
        if active > 0 {
            return Err(AppError::ServiceAssignedToClients(active));
        }
        let invoices = tx.count_service_invoices(service_id).await?;
        if invoices > 0 {
            return Err(AppError::ServiceHasInvoices(invoices));
        }

        tx.delete_service(service_id).await?;
        tx.commit().await?;

        tracing::info!("Serviço {} excluído", service_id);
        Ok(())
    }

    // =========================================================================
    //  IMPOSTOS
    // =========================================================================

    pub async fn list_taxes(&self, tenant_id: Uuid) -> Result<Vec<TaxDto>, AppError> {
        let mut tx = self.store.begin(tenant_id).await?;
        Ok(tx.list_taxes().await?.iter().map(map_tax).collect())
    }

    pub async fn create_tax(&self, tenant_id: Uuid, payload: TaxRequest) -> Result<TaxDto, AppError> {
        payload.validate()?;
        let mut tx = self.store.begin(tenant_id).await?;

        let tax = TaxRow {
            id: Uuid::new_v4(),
            tenant_id,
            name: non_blank(Some(payload.name.as_str())),
            percentage: payload.percentage,
            active: payload.active,
        };
        tx.insert_tax(&tax).await?;
        tx.commit().await?;

        Ok(map_tax(&tax))
    }

    /// Não recalcula faturas: o novo percentual vale na próxima propagação do serviço.
    pub async fn update_tax(&self, tenant_id: Uuid, tax_id: Uuid, payload: TaxRequest) -> Result<TaxDto, AppError> {
        payload.validate()?;
        let mut tx = self.store.begin(tenant_id).await?;

        let mut tax = tx.find_tax(tax_id).await?.ok_or(AppError::TaxNotFound)?;
        tax.name = non_blank(Some(payload.name.as_str()));
        tax.percentage = payload.percentage;
        tax.active = payload.active;
        tx.update_tax(&tax).await?;
        tx.commit().await?;

        Ok(map_tax(&tax))
    }
}

// Preço em texto livre; subtotal ausente = preço
fn build_service(
    id: Uuid,
    tenant_id: Uuid,
    payload: &ServiceRequest,
    created: Option<chrono::DateTime<Utc>>,
    updated: Option<chrono::DateTime<Utc>>,
) -> ServiceRow {
    let price = round_money(parse_currency_value(&payload.price));
    let subtotal = payload
        .subtotal
        .as_ref()
        .filter(|raw| !raw.is_null())
        .map(|raw| round_money(parse_currency_value(raw)))
        .unwrap_or(price);

    ServiceRow {
        id,
        tenant_id,
        name: non_blank(Some(payload.name.as_str())),
        unit: non_blank(payload.unit.as_deref()),
        price,
        subtotal,
        frequency: non_blank(payload.frequency.as_deref()),
        tax_one_id: payload.tax_one_id,
        tax_two_id: payload.tax_two_id,
        category: non_blank(payload.category.as_deref()),
        status: payload.status,
        created,
        updated,
    }
}
