// src/db/pg_store.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::{
    common::{db_utils::begin_rls_transaction, error::AppError},
    db::store::{BillingStore, BillingTx, ClientScope},
    models::{
        catalog::{ClientServiceRow, ClientServiceView, ServiceRow, ServiceWithUsage, TaxRow},
        client::{AuditLogRow, ClientDetailRow, ClientDetailView, ClientRow, ParameterRow, UsageLogRow},
        invoice::{InvoiceAmounts, InvoiceAttachmentRow, InvoiceDetailRow, InvoiceRow, InvoiceWithClient},
        payment::{PaymentAttachmentRow, PaymentDetailRow, PaymentMethodRow, PaymentRow, PaymentWithMethod},
        quote::{QuoteAttachmentRow, QuoteDetailRow, QuoteDetailView, QuoteRow, QuoteWithClient},
    },
};

const CLIENT_COLUMNS: &str = "id, tenant_id, name, email, phone, status, created, updated";

const SERVICE_COLUMNS: &str = r#"
    s.id, s.tenant_id, s.name, s.unit, s.price, s.subtotal, s.frequency,
    s.tax_one_id, s.tax_two_id, s.category, s.status, s.created, s.updated
"#;

const ASSIGNMENT_COLUMNS: &str = r#"
    cs.id, cs.tenant_id, cs.client_id, cs.service_id, cs.started, cs.delivery, cs.expiry,
    cs.frequency, cs.unit, cs.url_api, cs.token_api, cs.status, cs.created
"#;

const QUOTE_COLUMNS: &str = r#"
    q.id, q.tenant_id, q.client_id, q.description, q.reference, q.value,
    q.status, q.created, q.updated
"#;

const INVOICE_COLUMNS: &str = r#"
    i.id, i.tenant_id, i.client_id, i.service_id, i.number, i.description, i.subtotal,
    i.tax_one_id, i.tax_two_id, i.tax_one_amount, i.tax_two_amount, i.include_vat,
    i.vat_amount, i.total, i.status, i.expiry, i.created, i.updated
"#;

const PAYMENT_COLUMNS: &str = r#"
    p.id, p.tenant_id, p.client_id, p.amount, p.status_text, p.status, p.method_id,
    p.date, p.reference, p.created
"#;

/// Store Postgres. Cada `begin` abre uma transação com a chave RLS do tenant.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BillingStore for PgStore {
    type Tx = PgTx;

    async fn begin(&self, tenant_id: Uuid) -> Result<PgTx, AppError> {
        let tx = begin_rls_transaction(&self.pool, tenant_id).await?;
        Ok(PgTx { tx, tenant_id })
    }
}

pub struct PgTx {
    tx: Transaction<'static, Postgres>,
    tenant_id: Uuid,
}

// SQL da exclusão em cascata, uma tabela por vez
fn delete_sql(scope: ClientScope) -> &'static str {
    match scope {
        ClientScope::Details => "DELETE FROM client_details WHERE tenant_id = $1 AND client_id = $2",
        ClientScope::Services => "DELETE FROM client_services WHERE tenant_id = $1 AND client_id = $2",
        ClientScope::QuoteDetails => {
            "DELETE FROM quote_details WHERE tenant_id = $1 AND quote_id IN \
             (SELECT id FROM quotes WHERE tenant_id = $1 AND client_id = $2)"
        }
        ClientScope::QuoteAttachments => {
            "DELETE FROM quote_attachments WHERE tenant_id = $1 AND quote_id IN \
             (SELECT id FROM quotes WHERE tenant_id = $1 AND client_id = $2)"
        }
        ClientScope::InvoiceDetails => {
            "DELETE FROM invoice_details WHERE tenant_id = $1 AND invoice_id IN \
             (SELECT id FROM invoices WHERE tenant_id = $1 AND client_id = $2)"
        }
        ClientScope::InvoiceAttachments => {
            "DELETE FROM invoice_attachments WHERE tenant_id = $1 AND invoice_id IN \
             (SELECT id FROM invoices WHERE tenant_id = $1 AND client_id = $2)"
        }
        // Itens e comprovantes dos pagamentos do cliente ou que citam faturas dele
        ClientScope::PaymentDetails => {
            "DELETE FROM payment_details WHERE tenant_id = $1 AND (payment_id IN \
             (SELECT id FROM payments WHERE tenant_id = $1 AND client_id = $2) OR invoice_id IN \
             (SELECT id FROM invoices WHERE tenant_id = $1 AND client_id = $2))"
        }
        ClientScope::PaymentAttachments => {
            "DELETE FROM payment_attachments WHERE tenant_id = $1 AND (payment_id IN \
             (SELECT id FROM payments WHERE tenant_id = $1 AND client_id = $2) OR invoice_id IN \
             (SELECT id FROM invoices WHERE tenant_id = $1 AND client_id = $2))"
        }
        ClientScope::Invoices => "DELETE FROM invoices WHERE tenant_id = $1 AND client_id = $2",
        ClientScope::Payments => "DELETE FROM payments WHERE tenant_id = $1 AND client_id = $2",
        ClientScope::Quotes => "DELETE FROM quotes WHERE tenant_id = $1 AND client_id = $2",
        ClientScope::UsageLogs => "DELETE FROM usage_logs WHERE tenant_id = $1 AND client_id = $2",
        ClientScope::AuditLogs => "DELETE FROM audit_logs WHERE tenant_id = $1 AND client_id = $2",
        ClientScope::Client => "DELETE FROM clients WHERE tenant_id = $1 AND id = $2",
    }
}

#[async_trait]
impl BillingTx for PgTx {
    async fn commit(self) -> Result<(), AppError> {
        self.tx.commit().await?;
        Ok(())
    }

    // =========================================================================
    //  CLIENTES
    // =========================================================================

    async fn list_clients(&mut self) -> Result<Vec<ClientRow>, AppError> {
        let clients = sqlx::query_as::<_, ClientRow>(&format!(
            "SELECT {CLIENT_COLUMNS} FROM clients WHERE tenant_id = $1 ORDER BY created DESC"
        ))
        .bind(self.tenant_id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(clients)
    }

    async fn find_client(&mut self, id: Uuid) -> Result<Option<ClientRow>, AppError> {
        let client = sqlx::query_as::<_, ClientRow>(&format!(
            "SELECT {CLIENT_COLUMNS} FROM clients WHERE tenant_id = $1 AND id = $2"
        ))
        .bind(self.tenant_id)
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(client)
    }

    async fn insert_client(&mut self, client: &ClientRow) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO clients (id, tenant_id, name, email, phone, status, created, updated)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(client.id)
        .bind(self.tenant_id)
        .bind(&client.name)
        .bind(&client.email)
        .bind(&client.phone)
        .bind(client.status)
        .bind(client.created)
        .bind(client.updated)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn update_client(&mut self, client: &ClientRow) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE clients
            SET name = $3, email = $4, phone = $5, status = $6, updated = $7
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(self.tenant_id)
        .bind(client.id)
        .bind(&client.name)
        .bind(&client.email)
        .bind(&client.phone)
        .bind(client.status)
        .bind(client.updated)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn touch_client(&mut self, id: Uuid, at: DateTime<Utc>) -> Result<(), AppError> {
        sqlx::query("UPDATE clients SET updated = $3 WHERE tenant_id = $1 AND id = $2")
            .bind(self.tenant_id)
            .bind(id)
            .bind(at)
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }

    async fn list_parameters(&mut self) -> Result<Vec<ParameterRow>, AppError> {
        let parameters = sqlx::query_as::<_, ParameterRow>(
            "SELECT id, tenant_id, name FROM parameters WHERE tenant_id = $1 ORDER BY name ASC",
        )
        .bind(self.tenant_id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(parameters)
    }

    async fn list_client_details(&mut self, client_id: Option<Uuid>) -> Result<Vec<ClientDetailView>, AppError> {
        let details = sqlx::query_as::<_, ClientDetailView>(
            r#"
            SELECT d.client_id, d.parameter_id, p.name AS parameter_name, d.value
            FROM client_details d
            LEFT JOIN parameters p ON p.id = d.parameter_id
            WHERE d.tenant_id = $1 AND ($2::uuid IS NULL OR d.client_id = $2)
            "#,
        )
        .bind(self.tenant_id)
        .bind(client_id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(details)
    }

    async fn replace_client_details(&mut self, client_id: Uuid, details: &[ClientDetailRow]) -> Result<(), AppError> {
        sqlx::query("DELETE FROM client_details WHERE tenant_id = $1 AND client_id = $2")
            .bind(self.tenant_id)
            .bind(client_id)
            .execute(&mut *self.tx)
            .await?;

        for detail in details {
            sqlx::query(
                r#"
                INSERT INTO client_details (id, tenant_id, client_id, parameter_id, value)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(detail.id)
            .bind(self.tenant_id)
            .bind(client_id)
            .bind(detail.parameter_id)
            .bind(&detail.value)
            .execute(&mut *self.tx)
            .await?;
        }

        Ok(())
    }

    async fn list_usage_logs(&mut self, client_id: Uuid) -> Result<Vec<UsageLogRow>, AppError> {
        let logs = sqlx::query_as::<_, UsageLogRow>(
            r#"
            SELECT id, tenant_id, client_id, description, created
            FROM usage_logs
            WHERE tenant_id = $1 AND client_id = $2
            ORDER BY created DESC
            "#,
        )
        .bind(self.tenant_id)
        .bind(client_id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(logs)
    }

    async fn list_audit_logs(&mut self, client_id: Uuid) -> Result<Vec<AuditLogRow>, AppError> {
        let logs = sqlx::query_as::<_, AuditLogRow>(
            r#"
            SELECT id, tenant_id, client_id, action, created
            FROM audit_logs
            WHERE tenant_id = $1 AND client_id = $2
            ORDER BY created DESC
            "#,
        )
        .bind(self.tenant_id)
        .bind(client_id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(logs)
    }

    async fn insert_audit_log(&mut self, log: &AuditLogRow) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO audit_logs (id, tenant_id, client_id, action, created) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(log.id)
        .bind(self.tenant_id)
        .bind(log.client_id)
        .bind(&log.action)
        .bind(log.created)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn delete_client_rows(&mut self, scope: ClientScope, client_id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query(delete_sql(scope))
            .bind(self.tenant_id)
            .bind(client_id)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected())
    }

    // =========================================================================
    //  CATÁLOGO (SERVIÇOS E IMPOSTOS)
    // =========================================================================

    async fn list_services(&mut self) -> Result<Vec<ServiceWithUsage>, AppError> {
        let services = sqlx::query_as::<_, ServiceWithUsage>(&format!(
            r#"
            SELECT {SERVICE_COLUMNS},
                (
                    SELECT COUNT(*) FROM client_services cs
                    WHERE cs.service_id = s.id AND cs.status IS DISTINCT FROM FALSE
                ) AS clients_count
            FROM services s
            WHERE s.tenant_id = $1
            ORDER BY s.name ASC
            "#
        ))
        .bind(self.tenant_id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(services)
    }

    async fn find_service(&mut self, id: Uuid) -> Result<Option<ServiceRow>, AppError> {
        let service = sqlx::query_as::<_, ServiceRow>(&format!(
            "SELECT {SERVICE_COLUMNS} FROM services s WHERE s.tenant_id = $1 AND s.id = $2"
        ))
        .bind(self.tenant_id)
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(service)
    }

    async fn insert_service(&mut self, service: &ServiceRow) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO services (
                id, tenant_id, name, unit, price, subtotal, frequency,
                tax_one_id, tax_two_id, category, status, created, updated
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(service.id)
        .bind(self.tenant_id)
        .bind(&service.name)
        .bind(&service.unit)
        .bind(service.price)
        .bind(service.subtotal)
        .bind(&service.frequency)
        .bind(service.tax_one_id)
        .bind(service.tax_two_id)
        .bind(&service.category)
        .bind(service.status)
        .bind(service.created)
        .bind(service.updated)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn update_service(&mut self, service: &ServiceRow) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE services
            SET name = $3, unit = $4, price = $5, subtotal = $6, frequency = $7,
                tax_one_id = $8, tax_two_id = $9, category = $10, status = $11, updated = $12
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(self.tenant_id)
        .bind(service.id)
        .bind(&service.name)
        .bind(&service.unit)
        .bind(service.price)
        .bind(service.subtotal)
        .bind(&service.frequency)
        .bind(service.tax_one_id)
        .bind(service.tax_two_id)
        .bind(&service.category)
        .bind(service.status)
        .bind(service.updated)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn delete_service(&mut self, id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM services WHERE tenant_id = $1 AND id = $2")
            .bind(self.tenant_id)
            .bind(id)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected())
    }

    async fn count_active_assignments(&mut self, service_id: Uuid) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM client_services
            WHERE tenant_id = $1 AND service_id = $2 AND status IS DISTINCT FROM FALSE
            "#,
        )
        .bind(self.tenant_id)
        .bind(service_id)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(count)
    }

    async fn count_service_invoices(&mut self, service_id: Uuid) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM invoices i
            WHERE i.tenant_id = $1
            AND (
                i.service_id = $2
                OR EXISTS (
                    SELECT 1 FROM invoice_details d
                    WHERE d.invoice_id = i.id AND d.service_id = $2
                )
            )
            "#,
        )
        .bind(self.tenant_id)
        .bind(service_id)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(count)
    }

    async fn list_taxes(&mut self) -> Result<Vec<TaxRow>, AppError> {
        let taxes = sqlx::query_as::<_, TaxRow>(
            "SELECT id, tenant_id, name, percentage, active FROM taxes WHERE tenant_id = $1 ORDER BY name ASC",
        )
        .bind(self.tenant_id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(taxes)
    }

    async fn find_tax(&mut self, id: Uuid) -> Result<Option<TaxRow>, AppError> {
        let tax = sqlx::query_as::<_, TaxRow>(
            "SELECT id, tenant_id, name, percentage, active FROM taxes WHERE tenant_id = $1 AND id = $2",
        )
        .bind(self.tenant_id)
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(tax)
    }

    async fn insert_tax(&mut self, tax: &TaxRow) -> Result<(), AppError> {
        sqlx::query("INSERT INTO taxes (id, tenant_id, name, percentage, active) VALUES ($1, $2, $3, $4, $5)")
            .bind(tax.id)
            .bind(self.tenant_id)
            .bind(&tax.name)
            .bind(tax.percentage)
            .bind(tax.active)
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }

    async fn update_tax(&mut self, tax: &TaxRow) -> Result<(), AppError> {
        sqlx::query("UPDATE taxes SET name = $3, percentage = $4, active = $5 WHERE tenant_id = $1 AND id = $2")
            .bind(self.tenant_id)
            .bind(tax.id)
            .bind(&tax.name)
            .bind(tax.percentage)
            .bind(tax.active)
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }

    // =========================================================================
    //  ATRIBUIÇÕES CLIENTE <-> SERVIÇO
    // =========================================================================

    async fn find_assignment(&mut self, client_id: Uuid, service_id: Uuid) -> Result<Option<ClientServiceRow>, AppError> {
        let assignment = sqlx::query_as::<_, ClientServiceRow>(&format!(
            r#"
            SELECT {ASSIGNMENT_COLUMNS}
            FROM client_services cs
            WHERE cs.tenant_id = $1 AND cs.client_id = $2 AND cs.service_id = $3
            "#
        ))
        .bind(self.tenant_id)
        .bind(client_id)
        .bind(service_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(assignment)
    }

    async fn list_assignments(&mut self, client_id: Uuid) -> Result<Vec<ClientServiceView>, AppError> {
        let assignments = sqlx::query_as::<_, ClientServiceView>(&format!(
            r#"
            SELECT {ASSIGNMENT_COLUMNS}, s.name AS service_name, s.price AS service_price
            FROM client_services cs
            LEFT JOIN services s ON s.id = cs.service_id
            WHERE cs.tenant_id = $1 AND cs.client_id = $2
            ORDER BY cs.created ASC
            "#
        ))
        .bind(self.tenant_id)
        .bind(client_id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(assignments)
    }

    async fn insert_assignment(&mut self, assignment: &ClientServiceRow) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO client_services (
                id, tenant_id, client_id, service_id, started, delivery, expiry,
                frequency, unit, url_api, token_api, status, created
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(assignment.id)
        .bind(self.tenant_id)
        .bind(assignment.client_id)
        .bind(assignment.service_id)
        .bind(&assignment.started)
        .bind(&assignment.delivery)
        .bind(&assignment.expiry)
        .bind(&assignment.frequency)
        .bind(&assignment.unit)
        .bind(&assignment.url_api)
        .bind(&assignment.token_api)
        .bind(assignment.status)
        .bind(assignment.created)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| {
            // Corrida entre duas atribuições iguais: a constraint UNIQUE decide
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::ServiceAlreadyAssigned;
                }
            }
            e.into()
        })?;

        Ok(())
    }

    async fn delete_assignment(&mut self, id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM client_services WHERE tenant_id = $1 AND id = $2")
            .bind(self.tenant_id)
            .bind(id)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected())
    }

    // =========================================================================
    //  COTAÇÕES
    // =========================================================================

    async fn list_quotes(&mut self, client_id: Option<Uuid>) -> Result<Vec<QuoteWithClient>, AppError> {
        let quotes = sqlx::query_as::<_, QuoteWithClient>(&format!(
            r#"
            SELECT {QUOTE_COLUMNS}, c.name AS client_name
            FROM quotes q
            LEFT JOIN clients c ON c.id = q.client_id
            WHERE q.tenant_id = $1 AND ($2::uuid IS NULL OR q.client_id = $2)
            ORDER BY q.created DESC
            "#
        ))
        .bind(self.tenant_id)
        .bind(client_id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(quotes)
    }

    async fn find_quote(&mut self, id: Uuid) -> Result<Option<QuoteWithClient>, AppError> {
        let quote = sqlx::query_as::<_, QuoteWithClient>(&format!(
            r#"
            SELECT {QUOTE_COLUMNS}, c.name AS client_name
            FROM quotes q
            LEFT JOIN clients c ON c.id = q.client_id
            WHERE q.tenant_id = $1 AND q.id = $2
            "#
        ))
        .bind(self.tenant_id)
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(quote)
    }

    async fn insert_quote(&mut self, quote: &QuoteRow) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO quotes (id, tenant_id, client_id, description, reference, value, status, created, updated)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(quote.id)
        .bind(self.tenant_id)
        .bind(quote.client_id)
        .bind(&quote.description)
        .bind(&quote.reference)
        .bind(quote.value)
        .bind(quote.status)
        .bind(quote.created)
        .bind(quote.updated)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn update_quote_status(&mut self, id: Uuid, status: Option<bool>, at: DateTime<Utc>) -> Result<(), AppError> {
        sqlx::query("UPDATE quotes SET status = $3, updated = $4 WHERE tenant_id = $1 AND id = $2")
            .bind(self.tenant_id)
            .bind(id)
            .bind(status)
            .bind(at)
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }

    async fn list_quote_details(&mut self, quote_ids: &[Uuid]) -> Result<Vec<QuoteDetailView>, AppError> {
        let details = sqlx::query_as::<_, QuoteDetailView>(
            r#"
            SELECT d.id, d.tenant_id, d.quote_id, d.service_id, d.item, d.quantity, d.total,
                s.name AS service_name
            FROM quote_details d
            LEFT JOIN services s ON s.id = d.service_id
            WHERE d.tenant_id = $1 AND d.quote_id = ANY($2)
            ORDER BY d.item ASC
            "#,
        )
        .bind(self.tenant_id)
        .bind(quote_ids)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(details)
    }

    async fn insert_quote_detail(&mut self, detail: &QuoteDetailRow) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO quote_details (id, tenant_id, quote_id, service_id, item, quantity, total)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(detail.id)
        .bind(self.tenant_id)
        .bind(detail.quote_id)
        .bind(detail.service_id)
        .bind(detail.item)
        .bind(detail.quantity)
        .bind(detail.total)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn list_quote_attachments(&mut self, quote_ids: &[Uuid]) -> Result<Vec<QuoteAttachmentRow>, AppError> {
        let attachments = sqlx::query_as::<_, QuoteAttachmentRow>(
            r#"
            SELECT id, tenant_id, quote_id, invoice_id, created
            FROM quote_attachments
            WHERE tenant_id = $1 AND quote_id = ANY($2)
            "#,
        )
        .bind(self.tenant_id)
        .bind(quote_ids)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(attachments)
    }

    async fn insert_quote_attachment(&mut self, attachment: &QuoteAttachmentRow) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO quote_attachments (id, tenant_id, quote_id, invoice_id, created) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(attachment.id)
        .bind(self.tenant_id)
        .bind(attachment.quote_id)
        .bind(attachment.invoice_id)
        .bind(attachment.created)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::UniqueConstraintViolation(format!(
                        "A cotação '{}' já foi convertida.",
                        attachment.quote_id
                    ));
                }
            }
            e.into()
        })?;

        Ok(())
    }

    // =========================================================================
    //  FATURAS
    // =========================================================================

    async fn list_invoices(&mut self, client_id: Option<Uuid>) -> Result<Vec<InvoiceWithClient>, AppError> {
        let invoices = sqlx::query_as::<_, InvoiceWithClient>(&format!(
            r#"
            SELECT {INVOICE_COLUMNS}, c.name AS client_name
            FROM invoices i
            LEFT JOIN clients c ON c.id = i.client_id
            WHERE i.tenant_id = $1 AND ($2::uuid IS NULL OR i.client_id = $2)
            ORDER BY i.created DESC
            "#
        ))
        .bind(self.tenant_id)
        .bind(client_id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(invoices)
    }

    async fn list_invoices_by_service(&mut self, service_id: Uuid) -> Result<Vec<InvoiceRow>, AppError> {
        let invoices = sqlx::query_as::<_, InvoiceRow>(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices i WHERE i.tenant_id = $1 AND i.service_id = $2"
        ))
        .bind(self.tenant_id)
        .bind(service_id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(invoices)
    }

    async fn find_invoice(&mut self, id: Uuid) -> Result<Option<InvoiceWithClient>, AppError> {
        let invoice = sqlx::query_as::<_, InvoiceWithClient>(&format!(
            r#"
            SELECT {INVOICE_COLUMNS}, c.name AS client_name
            FROM invoices i
            LEFT JOIN clients c ON c.id = i.client_id
            WHERE i.tenant_id = $1 AND i.id = $2
            "#
        ))
        .bind(self.tenant_id)
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(invoice)
    }

    async fn insert_invoice(&mut self, invoice: &InvoiceRow) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO invoices (
                id, tenant_id, client_id, service_id, number, description, subtotal,
                tax_one_id, tax_two_id, tax_one_amount, tax_two_amount, include_vat,
                vat_amount, total, status, expiry, created, updated
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            "#,
        )
        .bind(invoice.id)
        .bind(self.tenant_id)
        .bind(invoice.client_id)
        .bind(invoice.service_id)
        .bind(&invoice.number)
        .bind(&invoice.description)
        .bind(invoice.subtotal)
        .bind(invoice.tax_one_id)
        .bind(invoice.tax_two_id)
        .bind(invoice.tax_one_amount)
        .bind(invoice.tax_two_amount)
        .bind(invoice.include_vat)
        .bind(invoice.vat_amount)
        .bind(invoice.total)
        .bind(invoice.status)
        .bind(invoice.expiry)
        .bind(invoice.created)
        .bind(invoice.updated)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn update_invoice_amounts(&mut self, id: Uuid, amounts: &InvoiceAmounts, at: DateTime<Utc>) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE invoices
            SET subtotal = $3, tax_one_id = $4, tax_two_id = $5, tax_one_amount = $6,
                tax_two_amount = $7, include_vat = $8, vat_amount = $9, total = $10, updated = $11
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(self.tenant_id)
        .bind(id)
        .bind(amounts.subtotal)
        .bind(amounts.tax_one_id)
        .bind(amounts.tax_two_id)
        .bind(amounts.tax_one_amount)
        .bind(amounts.tax_two_amount)
        .bind(amounts.include_vat)
        .bind(amounts.vat_amount)
        .bind(amounts.total)
        .bind(at)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn update_invoice_status(&mut self, id: Uuid, status: Option<bool>, at: DateTime<Utc>) -> Result<(), AppError> {
        sqlx::query("UPDATE invoices SET status = $3, updated = $4 WHERE tenant_id = $1 AND id = $2")
            .bind(self.tenant_id)
            .bind(id)
            .bind(status)
            .bind(at)
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }

    async fn list_invoice_details(&mut self, invoice_ids: &[Uuid]) -> Result<Vec<InvoiceDetailRow>, AppError> {
        let details = sqlx::query_as::<_, InvoiceDetailRow>(
            r#"
            SELECT id, tenant_id, invoice_id, service_id, item, description, quantity, total
            FROM invoice_details
            WHERE tenant_id = $1 AND invoice_id = ANY($2)
            ORDER BY item ASC
            "#,
        )
        .bind(self.tenant_id)
        .bind(invoice_ids)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(details)
    }

    async fn insert_invoice_detail(&mut self, detail: &InvoiceDetailRow) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO invoice_details (id, tenant_id, invoice_id, service_id, item, description, quantity, total)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(detail.id)
        .bind(self.tenant_id)
        .bind(detail.invoice_id)
        .bind(detail.service_id)
        .bind(detail.item)
        .bind(&detail.description)
        .bind(detail.quantity)
        .bind(detail.total)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn list_invoice_attachments(&mut self, invoice_ids: &[Uuid]) -> Result<Vec<InvoiceAttachmentRow>, AppError> {
        let attachments = sqlx::query_as::<_, InvoiceAttachmentRow>(
            r#"
            SELECT id, tenant_id, invoice_id, url, created
            FROM invoice_attachments
            WHERE tenant_id = $1 AND invoice_id = ANY($2)
            ORDER BY created DESC
            "#,
        )
        .bind(self.tenant_id)
        .bind(invoice_ids)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(attachments)
    }

    // =========================================================================
    //  PAGAMENTOS
    // =========================================================================

    async fn list_payments(&mut self, client_id: Option<Uuid>) -> Result<Vec<PaymentWithMethod>, AppError> {
        let payments = sqlx::query_as::<_, PaymentWithMethod>(&format!(
            r#"
            SELECT {PAYMENT_COLUMNS}, m.name AS method_name
            FROM payments p
            LEFT JOIN payment_methods m ON m.id = p.method_id
            WHERE p.tenant_id = $1 AND ($2::uuid IS NULL OR p.client_id = $2)
            ORDER BY p.created DESC
            "#
        ))
        .bind(self.tenant_id)
        .bind(client_id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(payments)
    }

    async fn find_payment(&mut self, id: Uuid) -> Result<Option<PaymentWithMethod>, AppError> {
        let payment = sqlx::query_as::<_, PaymentWithMethod>(&format!(
            r#"
            SELECT {PAYMENT_COLUMNS}, m.name AS method_name
            FROM payments p
            LEFT JOIN payment_methods m ON m.id = p.method_id
            WHERE p.tenant_id = $1 AND p.id = $2
            "#
        ))
        .bind(self.tenant_id)
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(payment)
    }

    async fn insert_payment(&mut self, payment: &PaymentRow) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO payments (
                id, tenant_id, client_id, amount, status_text, status, method_id, date, reference, created
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(payment.id)
        .bind(self.tenant_id)
        .bind(payment.client_id)
        .bind(&payment.amount)
        .bind(&payment.status_text)
        .bind(payment.status)
        .bind(payment.method_id)
        .bind(&payment.date)
        .bind(&payment.reference)
        .bind(payment.created)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn find_payment_method(&mut self, name: &str) -> Result<Option<PaymentMethodRow>, AppError> {
        let method = sqlx::query_as::<_, PaymentMethodRow>(
            r#"
            SELECT id, tenant_id, name FROM payment_methods
            WHERE tenant_id = $1 AND LOWER(TRIM(name)) = LOWER(TRIM($2))
            LIMIT 1
            "#,
        )
        .bind(self.tenant_id)
        .bind(name)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(method)
    }

    async fn insert_payment_method(&mut self, method: &PaymentMethodRow) -> Result<(), AppError> {
        sqlx::query("INSERT INTO payment_methods (id, tenant_id, name) VALUES ($1, $2, $3)")
            .bind(method.id)
            .bind(self.tenant_id)
            .bind(&method.name)
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }

    async fn list_payment_details(&mut self, payment_ids: &[Uuid]) -> Result<Vec<PaymentDetailRow>, AppError> {
        let details = sqlx::query_as::<_, PaymentDetailRow>(
            r#"
            SELECT id, tenant_id, payment_id, invoice_id, amount
            FROM payment_details
            WHERE tenant_id = $1 AND payment_id = ANY($2)
            "#,
        )
        .bind(self.tenant_id)
        .bind(payment_ids)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(details)
    }

    async fn insert_payment_detail(&mut self, detail: &PaymentDetailRow) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO payment_details (id, tenant_id, payment_id, invoice_id, amount) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(detail.id)
        .bind(self.tenant_id)
        .bind(detail.payment_id)
        .bind(detail.invoice_id)
        .bind(detail.amount)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn list_payment_attachments(&mut self, payment_ids: &[Uuid]) -> Result<Vec<PaymentAttachmentRow>, AppError> {
        let attachments = sqlx::query_as::<_, PaymentAttachmentRow>(
            r#"
            SELECT id, tenant_id, payment_id, invoice_id, url, created
            FROM payment_attachments
            WHERE tenant_id = $1 AND payment_id = ANY($2)
            ORDER BY created DESC
            "#,
        )
        .bind(self.tenant_id)
        .bind(payment_ids)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(attachments)
    }

    async fn insert_payment_attachment(&mut self, attachment: &PaymentAttachmentRow) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO payment_attachments (id, tenant_id, payment_id, invoice_id, url, created)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(attachment.id)
        .bind(self.tenant_id)
        .bind(attachment.payment_id)
        .bind(attachment.invoice_id)
        .bind(&attachment.url)
        .bind(attachment.created)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }
}
