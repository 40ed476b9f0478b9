// src/services/client_service.rs

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{error::AppError, normalizer::non_blank},
    db::{
        store::CLIENT_DELETE_ORDER,
        BillingStore, BillingTx,
    },
    mappers::{
        catalog::map_client_service,
        client::{map_client, map_client_summary, ClientRelations},
    },
    models::{
        catalog::{AssignServiceRequest, ClientServiceDto, ClientServiceRow},
        client::{AuditLogRow, ClientDetailRow, ClientDto, ClientRequest, ClientRow, ClientSummaryDto, ParameterRow},
    },
    services::{
        billing_rules::build_reminders,
        invoice_service::hydrate_invoices,
        payment_service::load_payments,
        quote_service::load_quotes,
    },
};

/// Grava uma linha no histórico de atividade do cliente.
pub(crate) async fn record_activity<T: BillingTx>(
    tx: &mut T,
    client_id: Uuid,
    action: String,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    tx.insert_audit_log(&AuditLogRow {
        id: Uuid::new_v4(),
        tenant_id: Uuid::nil(),
        client_id,
        action,
        created: Some(now),
    })
    .await
}

/// Ficha completa do cliente, lida dentro da transação recebida.
pub(crate) async fn load_client<T: BillingTx>(tx: &mut T, client_id: Uuid, now: DateTime<Utc>) -> Result<ClientDto, AppError> {
    let client = tx.find_client(client_id).await?.ok_or(AppError::ClientNotFound)?;

    let details = tx.list_client_details(Some(client_id)).await?;
    let services = tx
        .list_assignments(client_id)
        .await?
        .iter()
        .map(map_client_service)
        .collect();
    let quotes = load_quotes(tx, Some(client_id)).await?;

    let invoice_rows = tx.list_invoices(Some(client_id)).await?;
    let open_rows: Vec<_> = invoice_rows.iter().map(|row| row.invoice.clone()).collect();
    let reminders = build_reminders(&open_rows, now);
    let invoices = hydrate_invoices(tx, &invoice_rows, now).await?;

    let payments = load_payments(tx, Some(client_id)).await?;
    let usage = tx.list_usage_logs(client_id).await?;
    let activity = tx.list_audit_logs(client_id).await?;

    Ok(map_client(
        &client,
        ClientRelations { details, services, quotes, invoices, payments, reminders, usage, activity },
    ))
}

#[derive(Clone)]
pub struct ClientService<S: BillingStore> {
    store: S,
}

impl<S: BillingStore> ClientService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    // =========================================================================
    //  LEITURA
    // =========================================================================

    pub async fn list_clients(&self, tenant_id: Uuid) -> Result<Vec<ClientSummaryDto>, AppError> {
        let mut tx = self.store.begin(tenant_id).await?;

        let clients = tx.list_clients().await?;
        let details = tx.list_client_details(None).await?;

        Ok(clients
            .iter()
            .map(|client| {
                let own: Vec<_> = details.iter().filter(|d| d.client_id == client.id).cloned().collect();
                map_client_summary(client, &own)
            })
            .collect())
    }

    pub async fn get_client(&self, tenant_id: Uuid, client_id: Uuid) -> Result<ClientDto, AppError> {
        let mut tx = self.store.begin(tenant_id).await?;
        load_client(&mut tx, client_id, Utc::now()).await
    }

    pub async fn list_parameters(&self, tenant_id: Uuid) -> Result<Vec<ParameterRow>, AppError> {
        let mut tx = self.store.begin(tenant_id).await?;
        tx.list_parameters().await
    }

    // =========================================================================
    //  ESCRITA
    // =========================================================================

    pub async fn create_client(&self, tenant_id: Uuid, payload: ClientRequest) -> Result<ClientDto, AppError> {
        payload.validate()?;
        let now = Utc::now();
        let mut tx = self.store.begin(tenant_id).await?;

        let client = ClientRow {
            id: Uuid::new_v4(),
            tenant_id,
            name: non_blank(Some(payload.name.as_str())),
            email: non_blank(payload.email.as_deref()),
            phone: non_blank(payload.phone.as_deref()),
            status: payload.status,
            created: Some(now),
            updated: Some(now),
        };
        tx.insert_client(&client).await?;

        if let Some(values) = &payload.details {
            write_details(&mut tx, client.id, values).await?;
        }

        let dto = load_client(&mut tx, client.id, now).await?;
        tx.commit().await?;

        tracing::info!("Cliente {} criado no tenant {}", client.id, tenant_id);
        Ok(dto)
    }

    pub async fn update_client(&self, tenant_id: Uuid, client_id: Uuid, payload: ClientRequest) -> Result<ClientDto, AppError> {
        payload.validate()?;
        let now = Utc::now();
        let mut tx = self.store.begin(tenant_id).await?;

        let mut client = tx.find_client(client_id).await?.ok_or(AppError::ClientNotFound)?;
        client.name = non_blank(Some(payload.name.as_str()));
        client.email = non_blank(payload.email.as_deref());
        client.phone = non_blank(payload.phone.as_deref());
        client.status = payload.status;
        client.updated = Some(now);
        tx.update_client(&client).await?;

        if let Some(values) = &payload.details {
            write_details(&mut tx, client_id, values).await?;
        }

        let dto = load_client(&mut tx, client_id, now).await?;
        tx.commit().await?;
        Ok(dto)
    }

    /// Remove o cliente e tudo que depende dele, filhos antes dos pais, numa
    /// única transação. Qualquer falha desfaz a exclusão inteira.
    pub async fn delete_client(&self, tenant_id: Uuid, client_id: Uuid) -> Result<(), AppError> {
        let mut tx = self.store.begin(tenant_id).await?;

        tx.find_client(client_id).await?.ok_or(AppError::ClientNotFound)?;

        let mut removed = 0;
        for scope in CLIENT_DELETE_ORDER {
            removed += tx.delete_client_rows(scope, client_id).await?;
        }

        tx.commit().await?;

        tracing::info!("Cliente {} excluído ({} linhas removidas)", client_id, removed);
        Ok(())
    }

    // =========================================================================
    //  SERVIÇOS DO CLIENTE
    // =========================================================================

    pub async fn assign_service(
        &self,
        tenant_id: Uuid,
        client_id: Uuid,
        payload: AssignServiceRequest,
    ) -> Result<ClientServiceDto, AppError> {
        payload.validate()?;
        let service_id = payload.service_id.ok_or(AppError::MissingField("serviceId"))?;
        let now = Utc::now();

        let mut tx = self.store.begin(tenant_id).await?;

        tx.find_client(client_id).await?.ok_or(AppError::ClientNotFound)?;
        let service = tx.find_service(service_id).await?.ok_or(AppError::ServiceNotFound)?;

        if tx.find_assignment(client_id, service_id).await?.is_some() {
            // Nada foi escrito; a transação é descartada
            return Err(AppError::ServiceAlreadyAssigned);
        }

        let assignment = ClientServiceRow {
            id: Uuid::new_v4(),
            tenant_id,
            client_id,
            service_id,
            started: non_blank(payload.started.as_deref()),
            delivery: non_blank(payload.delivery.as_deref()),
            expiry: non_blank(payload.expiry.as_deref()),
            frequency: non_blank(payload.frequency.as_deref()).or(service.frequency.clone()),
            unit: non_blank(payload.unit.as_deref()).or(service.unit.clone()),
            url_api: non_blank(payload.url_api.as_deref()),
            token_api: non_blank(payload.token_api.as_deref()),
            status: Some(true),
            created: Some(now),
        };
        tx.insert_assignment(&assignment).await?;
        tx.touch_client(client_id, now).await?;

        let service_name = service.name.as_deref().unwrap_or("-");
        record_activity(&mut tx, client_id, format!("Servicio asignado: {service_name}"), now).await?;

        let view = tx
            .list_assignments(client_id)
            .await?
            .into_iter()
            .find(|v| v.assignment.id == assignment.id)
            .ok_or_else(|| anyhow::anyhow!("Atribuição {} não encontrada após inserção", assignment.id))?;

        tx.commit().await?;

        tracing::info!("Serviço {} atribuído ao cliente {}", service_id, client_id);
        Ok(map_client_service(&view))
    }

    pub async fn unassign_service(&self, tenant_id: Uuid, client_id: Uuid, service_id: Uuid) -> Result<(), AppError> {
        let now = Utc::now();
        let mut tx = self.store.begin(tenant_id).await?;

        tx.find_client(client_id).await?.ok_or(AppError::ClientNotFound)?;
        let assignment = tx
            .find_assignment(client_id, service_id)
            .await?
            .ok_or(AppError::ServiceNotFound)?;

        tx.delete_assignment(assignment.id).await?;
        tx.touch_client(client_id, now).await?;
        record_activity(&mut tx, client_id, "Servicio retirado".to_string(), now).await?;

        tx.commit().await?;
        Ok(())
    }
}

// Substitui os valores personalizados. Parâmetro desconhecido = 400.
async fn write_details<T: BillingTx>(
    tx: &mut T,
    client_id: Uuid,
    values: &std::collections::BTreeMap<Uuid, String>,
) -> Result<(), AppError> {
    let known: HashSet<Uuid> = tx.list_parameters().await?.iter().map(|p| p.id).collect();

    let mut rows = Vec::with_capacity(values.len());
    for (parameter_id, value) in values {
        if !known.contains(parameter_id) {
            return Err(AppError::InvalidValue { field: "details", value: parameter_id.to_string() });
        }
        rows.push(ClientDetailRow {
            id: Uuid::new_v4(),
            tenant_id: Uuid::nil(),
            client_id,
            parameter_id: *parameter_id,
            value: Some(value.trim().to_string()),
        });
    }

    tx.replace_client_details(client_id, &rows).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::memory_store::{MemoryState, MemoryStore},
        models::client::{ClientStatus, ClientType},
    };
    use rust_decimal::Decimal;
    use std::collections::BTreeMap;

    fn request(name: &str) -> ClientRequest {
        ClientRequest { name: name.to_string(), email: None, phone: None, status: None, details: None }
    }

    #[tokio::test]
    async fn assigning_same_service_twice_is_a_conflict_without_writes() {
        let tenant = Uuid::new_v4();
        let mut state = MemoryState::default();
        let client = state.add_client(tenant, "Andina");
        let service = state.add_service(tenant, "Hosting", Decimal::from(100));
        let store = MemoryStore::new(state);
        let clients = ClientService::new(store.clone());

        let assign = || AssignServiceRequest { service_id: Some(service), ..Default::default() };
        clients.assign_service(tenant, client, assign()).await.unwrap();
        let before = store.snapshot().await;

        let err = clients.assign_service(tenant, client, assign()).await.unwrap_err();

        let after = store.snapshot().await;
        assert!(matches!(err, AppError::ServiceAlreadyAssigned));
        assert_eq!(after.assignments.len(), 1);
        assert_eq!(after.audit_logs.len(), before.audit_logs.len());
        assert_eq!(after.clients[0].updated, before.clients[0].updated);
    }

    #[tokio::test]
    async fn assignment_bumps_client_and_inherits_service_defaults() {
        let tenant = Uuid::new_v4();
        let mut state = MemoryState::default();
        let client = state.add_client(tenant, "Andina");
        let service = state.add_service(tenant, "Hosting", Decimal::from(100));
        state.services[0].frequency = Some("mensual".to_string());
        let old_updated = state.clients[0].updated;
        let store = MemoryStore::new(state);

        let dto = ClientService::new(store.clone())
            .assign_service(tenant, client, AssignServiceRequest { service_id: Some(service), ..Default::default() })
            .await
            .unwrap();

        let saved = store.snapshot().await;
        assert_eq!(dto.service_name, "Hosting");
        assert_eq!(dto.frequency.as_deref(), Some("mensual"));
        assert!(saved.clients[0].updated > old_updated);
        assert_eq!(saved.audit_logs.len(), 1);
    }

    #[tokio::test]
    async fn assignment_requires_existing_client_and_service() {
        let tenant = Uuid::new_v4();
        let mut state = MemoryState::default();
        let client = state.add_client(tenant, "Andina");
        let clients = ClientService::new(MemoryStore::new(state));

        let missing_service = clients
            .assign_service(tenant, client, AssignServiceRequest { service_id: Some(Uuid::new_v4()), ..Default::default() })
            .await
            .unwrap_err();
        let missing_field = clients
            .assign_service(tenant, client, AssignServiceRequest::default())
            .await
            .unwrap_err();
        let missing_client = clients
            .assign_service(tenant, Uuid::new_v4(), AssignServiceRequest { service_id: Some(Uuid::new_v4()), ..Default::default() })
            .await
            .unwrap_err();

        assert!(matches!(missing_service, AppError::ServiceNotFound));
        assert!(matches!(missing_field, AppError::MissingField("serviceId")));
        assert!(matches!(missing_client, AppError::ClientNotFound));
    }

    #[tokio::test]
    async fn deleting_client_removes_every_dependent_row() {
        let tenant = Uuid::new_v4();
        let mut state = MemoryState::default();
        let client = state.add_client(tenant, "Andina");
        let keeper = state.add_client(tenant, "Otro");
        let service = state.add_service(tenant, "Hosting", Decimal::from(100));
        state.add_assignment(tenant, client, service, Some(true));
        let invoice = state.add_invoice(tenant, client, Some(service), Decimal::from(100));
        state.add_invoice(tenant, keeper, None, Decimal::from(50));
        state.add_quote(tenant, client, Decimal::from(10), &[Decimal::from(4), Decimal::from(6)]);
        let payment = state.add_payment(tenant, client, "100");
        state.payment_details.push(crate::models::payment::PaymentDetailRow {
            id: Uuid::new_v4(),
            tenant_id: tenant,
            payment_id: payment,
            invoice_id: invoice,
            amount: Decimal::from(100),
        });
        let store = MemoryStore::new(state);
        let clients = ClientService::new(store.clone());

        clients.delete_client(tenant, client).await.unwrap();

        let saved = store.snapshot().await;
        assert_eq!(saved.clients.len(), 1);
        assert_eq!(saved.invoices.len(), 1);
        assert!(saved.assignments.is_empty());
        assert!(saved.quotes.is_empty());
        assert!(saved.quote_details.is_empty());
        assert!(saved.payments.is_empty());
        assert!(saved.payment_details.is_empty());
        assert!(matches!(clients.get_client(tenant, client).await.unwrap_err(), AppError::ClientNotFound));
    }

    #[tokio::test]
    async fn deleting_client_drops_foreign_payment_lines_to_its_invoices() {
        use crate::models::payment::{PaymentAttachmentRow, PaymentDetailRow};

        let tenant = Uuid::new_v4();
        let mut state = MemoryState::default();
        let client = state.add_client(tenant, "Andina");
        let payer = state.add_client(tenant, "Cafetera");
        let invoice = state.add_invoice(tenant, client, None, Decimal::from(300));
        let own_invoice = state.add_invoice(tenant, payer, None, Decimal::from(50));
        // Dado legado: pagamento de outro cliente citando fatura deste
        let payment = state.add_payment(tenant, payer, "350");
        for invoice_id in [invoice, own_invoice] {
            state.payment_details.push(PaymentDetailRow {
                id: Uuid::new_v4(),
                tenant_id: tenant,
                payment_id: payment,
                invoice_id,
                amount: Decimal::from(10),
            });
        }
        state.payment_attachments.push(PaymentAttachmentRow {
            id: Uuid::new_v4(),
            tenant_id: tenant,
            payment_id: payment,
            invoice_id: Some(invoice),
            url: "https://files.example.com/r.pdf".to_string(),
            created: None,
        });
        let store = MemoryStore::new(state);

        ClientService::new(store.clone()).delete_client(tenant, client).await.unwrap();

        let saved = store.snapshot().await;
        assert_eq!(saved.clients.len(), 1);
        assert_eq!(saved.invoices.len(), 1);
        assert_eq!(saved.payments.len(), 1);
        assert_eq!(saved.payment_details.len(), 1);
        assert_eq!(saved.payment_details[0].invoice_id, own_invoice);
        assert!(saved.payment_attachments.is_empty());
    }

    #[tokio::test]
    async fn failed_cascade_leaves_everything_in_place() {
        let tenant = Uuid::new_v4();
        let mut state = MemoryState::default();
        let client = state.add_client(tenant, "Andina");
        state.add_invoice(tenant, client, None, Decimal::from(100));
        state.fail_on = Some("commit");
        let store = MemoryStore::new(state);

        let result = ClientService::new(store.clone()).delete_client(tenant, client).await;

        let saved = store.snapshot().await;
        assert!(result.is_err());
        assert_eq!(saved.clients.len(), 1);
        assert_eq!(saved.invoices.len(), 1);
    }

    #[tokio::test]
    async fn create_with_details_guesses_type_and_defaults_to_onboarding() {
        let tenant = Uuid::new_v4();
        let mut state = MemoryState::default();
        let nit = state.add_parameter(tenant, "NIT");
        let clients = ClientService::new(MemoryStore::new(state));

        let mut payload = request("Comercializadora Andina SAS");
        payload.details = Some(BTreeMap::from([(nit, " 900123456-7 ".to_string())]));
        let dto = clients.create_client(tenant, payload).await.unwrap();

        assert_eq!(dto.summary.status, ClientStatus::Onboarding);
        assert_eq!(dto.summary.client_type, ClientType::Juridica);
        assert_eq!(dto.details.get(&nit.to_string()).map(String::as_str), Some("900123456-7"));

        let listed = clients.list_clients(tenant).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].client_type, ClientType::Juridica);
    }

    #[tokio::test]
    async fn unknown_parameter_is_rejected() {
        let tenant = Uuid::new_v4();
        let store = MemoryStore::new(MemoryState::default());

        let mut payload = request("Andina");
        payload.details = Some(BTreeMap::from([(Uuid::new_v4(), "x".to_string())]));
        let err = ClientService::new(store.clone()).create_client(tenant, payload).await.unwrap_err();

        assert!(matches!(err, AppError::InvalidValue { field: "details", .. }));
        assert!(store.snapshot().await.clients.is_empty());
    }

    #[tokio::test]
    async fn tenants_do_not_see_each_other() {
        let tenant = Uuid::new_v4();
        let mut state = MemoryState::default();
        let client = state.add_client(tenant, "Andina");
        let clients = ClientService::new(MemoryStore::new(state));

        let other = Uuid::new_v4();
        assert!(clients.list_clients(other).await.unwrap().is_empty());
        assert!(matches!(clients.get_client(other, client).await.unwrap_err(), AppError::ClientNotFound));
    }

    #[tokio::test]
    async fn unassign_removes_pair() {
        let tenant = Uuid::new_v4();
        let mut state = MemoryState::default();
        let client = state.add_client(tenant, "Andina");
        let service = state.add_service(tenant, "Hosting", Decimal::from(100));
        state.add_assignment(tenant, client, service, Some(true));
        let store = MemoryStore::new(state);
        let clients = ClientService::new(store.clone());

        clients.unassign_service(tenant, client, service).await.unwrap();
        let again = clients.unassign_service(tenant, client, service).await.unwrap_err();

        assert!(store.snapshot().await.assignments.is_empty());
        assert!(matches!(again, AppError::ServiceNotFound));
    }
}
