// src/db/settings_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::settings::{TenantSettings, UpdateSettingsRequest},
};

const SETTINGS_COLUMNS: &str = r#"
    tenant_id, smtp_host, smtp_port, smtp_user, smtp_password, smtp_from,
    alerts_enabled, alert_days_before_due, company_name, logo_url, primary_color, updated_at
"#;

#[derive(Clone, Default)]
pub struct SettingsRepository;

impl SettingsRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn get_settings<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
    ) -> Result<TenantSettings, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let settings = sqlx::query_as::<_, TenantSettings>(&format!(
            "SELECT {SETTINGS_COLUMNS} FROM tenant_settings WHERE tenant_id = $1"
        ))
        .bind(tenant_id)
        .fetch_optional(executor)
        .await?;

        // Tenant sem linha ainda = configurações vazias
        Ok(settings.unwrap_or_else(|| TenantSettings::empty(tenant_id)))
    }

    pub async fn update_settings<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        input: &UpdateSettingsRequest,
    ) -> Result<TenantSettings, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // UPSERT. Senha ausente mantém a gravada.
        let settings = sqlx::query_as::<_, TenantSettings>(&format!(
            r#"
            INSERT INTO tenant_settings (
                tenant_id, smtp_host, smtp_port, smtp_user, smtp_password, smtp_from,
                alerts_enabled, alert_days_before_due, company_name, logo_url, primary_color
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (tenant_id)
            DO UPDATE SET
                smtp_host = EXCLUDED.smtp_host,
                smtp_port = EXCLUDED.smtp_port,
                smtp_user = EXCLUDED.smtp_user,
                smtp_password = COALESCE(EXCLUDED.smtp_password, tenant_settings.smtp_password),
                smtp_from = EXCLUDED.smtp_from,
                alerts_enabled = EXCLUDED.alerts_enabled,
                alert_days_before_due = EXCLUDED.alert_days_before_due,
                company_name = EXCLUDED.company_name,
                logo_url = EXCLUDED.logo_url,
                primary_color = EXCLUDED.primary_color,
                updated_at = NOW()
            RETURNING {SETTINGS_COLUMNS}
            "#
        ))
        .bind(tenant_id)
        .bind(&input.smtp_host)
        .bind(input.smtp_port)
        .bind(&input.smtp_user)
        .bind(&input.smtp_password)
        .bind(&input.smtp_from)
        .bind(input.alerts_enabled)
        .bind(input.alert_days_before_due)
        .bind(&input.company_name)
        .bind(&input.logo_url)
        .bind(&input.primary_color)
        .fetch_one(executor)
        .await?;

        Ok(settings)
    }
}
