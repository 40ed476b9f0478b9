// src/mappers/client.rs

use std::collections::BTreeMap;

use crate::{
    common::normalizer::{format_timestamp, non_blank, text_or, TriState},
    mappers::FALLBACK_CLIENT_NAME,
    models::{
        catalog::ClientServiceDto,
        client::{
            AuditLogDto, AuditLogRow, ClientDetailView, ClientDto, ClientRow, ClientStatus,
            ClientSummaryDto, ClientType, UsageLogDto, UsageLogRow,
        },
        invoice::{InvoiceDto, ReminderDto},
        payment::PaymentDto,
        quote::QuoteDto,
    },
};

/// Coleções já mapeadas que compõem a ficha do cliente.
#[derive(Debug, Default)]
pub struct ClientRelations {
    pub details: Vec<ClientDetailView>,
    pub services: Vec<ClientServiceDto>,
    pub quotes: Vec<QuoteDto>,
    pub invoices: Vec<InvoiceDto>,
    pub payments: Vec<PaymentDto>,
    pub reminders: Vec<ReminderDto>,
    pub usage: Vec<UsageLogRow>,
    pub activity: Vec<AuditLogRow>,
}

pub fn client_status(flag: Option<bool>) -> ClientStatus {
    match TriState::from(flag) {
        TriState::True => ClientStatus::Active,
        TriState::False => ClientStatus::Inactive,
        TriState::Unset => ClientStatus::Onboarding,
    }
}

/// Pessoa jurídica quando algum campo identifica empresa (NIT, razão social)
/// ou o valor diz explicitamente "jurídica"/"empresa".
pub fn guess_client_type(details: &[ClientDetailView]) -> ClientType {
    let is_company = details.iter().any(|detail| {
        let Some(value) = non_blank(detail.value.as_deref()) else {
            return false;
        };
        let value = value.to_lowercase();
        if matches!(value.as_str(), "juridica" | "jurídica" | "persona juridica" | "persona jurídica" | "empresa") {
            return true;
        }

        let name = detail.parameter_name.as_deref().unwrap_or_default().to_lowercase();
        name.split(|c: char| !c.is_alphanumeric()).any(|token| token == "nit")
            || name.contains("razon social")
            || name.contains("razón social")
    });

    if is_company { ClientType::Juridica } else { ClientType::Natural }
}

pub fn map_client_summary(row: &ClientRow, details: &[ClientDetailView]) -> ClientSummaryDto {
    ClientSummaryDto {
        id: row.id,
        name: text_or(row.name.as_deref(), FALLBACK_CLIENT_NAME),
        email: non_blank(row.email.as_deref()),
        phone: non_blank(row.phone.as_deref()),
        status: client_status(row.status),
        client_type: guess_client_type(details),
        created_at: format_timestamp(row.created),
        updated_at: format_timestamp(row.updated),
    }
}

pub fn map_usage_log(row: &UsageLogRow) -> UsageLogDto {
    UsageLogDto {
        id: row.id,
        description: non_blank(row.description.as_deref()),
        created_at: format_timestamp(row.created),
    }
}

pub fn map_audit_log(row: &AuditLogRow) -> AuditLogDto {
    AuditLogDto {
        id: row.id,
        action: row.action.clone(),
        created_at: format_timestamp(row.created),
    }
}

pub fn map_client(row: &ClientRow, relations: ClientRelations) -> ClientDto {
    let ClientRelations { details, services, quotes, invoices, payments, reminders, mut usage, mut activity } =
        relations;

    // Mais recentes primeiro
    usage.sort_by(|a, b| b.created.cmp(&a.created));
    activity.sort_by(|a, b| b.created.cmp(&a.created));

    let values: BTreeMap<String, String> = details
        .iter()
        .filter(|d| d.client_id == row.id)
        .map(|d| (d.parameter_id.to_string(), d.value.clone().unwrap_or_default()))
        .collect();

    ClientDto {
        summary: map_client_summary(row, &details),
        details: values,
        services,
        quotes,
        invoices,
        payments,
        reminders,
        usage: usage.iter().map(map_usage_log).collect(),
        activity: activity.iter().map(map_audit_log).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use uuid::Uuid;

    fn detail(name: &str, value: &str) -> ClientDetailView {
        ClientDetailView {
            client_id: Uuid::nil(),
            parameter_id: Uuid::new_v4(),
            parameter_name: Some(name.to_string()),
            value: Some(value.to_string()),
        }
    }

    fn row(name: Option<&str>, status: Option<bool>) -> ClientRow {
        ClientRow {
            id: Uuid::nil(),
            tenant_id: Uuid::new_v4(),
            name: name.map(str::to_string),
            email: Some("  ".to_string()),
            phone: None,
            status,
            created: Some(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()),
            updated: None,
        }
    }

    #[test]
    fn status_is_tri_state() {
        assert_eq!(client_status(Some(true)), ClientStatus::Active);
        assert_eq!(client_status(Some(false)), ClientStatus::Inactive);
        assert_eq!(client_status(None), ClientStatus::Onboarding);
    }

    #[test]
    fn nit_or_company_value_means_juridica() {
        assert_eq!(guess_client_type(&[detail("NIT", "900123456-7")]), ClientType::Juridica);
        assert_eq!(guess_client_type(&[detail("Razón social", "Andina SAS")]), ClientType::Juridica);
        assert_eq!(guess_client_type(&[detail("Tipo", "Empresa")]), ClientType::Juridica);
    }

    #[test]
    fn blank_or_unrelated_fields_mean_natural() {
        assert_eq!(guess_client_type(&[detail("NIT", "   ")]), ClientType::Natural);
        assert_eq!(guess_client_type(&[detail("Unidad", "12")]), ClientType::Natural);
        assert_eq!(guess_client_type(&[]), ClientType::Natural);
    }

    #[test]
    fn summary_uses_fallback_name_and_iso_dates() {
        let dto = map_client_summary(&row(Some("   "), None), &[]);

        assert_eq!(dto.name, FALLBACK_CLIENT_NAME);
        assert_eq!(dto.email, None);
        assert_eq!(dto.created_at.as_deref(), Some("2024-03-01T12:00:00.000Z"));
        assert_eq!(dto.updated_at, None);
    }

    #[test]
    fn activity_is_sorted_newest_first() {
        let client = row(Some("Andina"), Some(true));
        let base = Utc::now();
        let log = |action: &str, age: i64| AuditLogRow {
            id: Uuid::new_v4(),
            tenant_id: client.tenant_id,
            client_id: client.id,
            action: action.to_string(),
            created: Some(base - Duration::hours(age)),
        };

        let dto = map_client(
            &client,
            ClientRelations { activity: vec![log("antigo", 5), log("novo", 1)], ..Default::default() },
        );

        let actions: Vec<&str> = dto.activity.iter().map(|a| a.action.as_str()).collect();
        assert_eq!(actions, ["novo", "antigo"]);
    }
}
