// src/services/billing_rules.rs

//! Regras de derivação. Tudo é calculado na leitura, nada é guardado em cache:
//! status "vencida" e lembretes mudam com o relógio.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::normalizer::{format_timestamp, round_money, text_or, TriState},
    mappers::FALLBACK_INVOICE_NUMBER,
    models::invoice::{InvoiceAmounts, InvoiceRow, InvoiceStatus, ReminderDto, ReminderStatus},
};

/// IVA fixo aplicado quando a fatura marca `include_vat`.
pub const VAT_RATE: Decimal = Decimal::from_parts(19, 0, 0, false, 2);

/// Soma dos itens quando existem; sem itens, o valor fixo gravado.
pub fn quote_total(stored_value: Decimal, line_totals: &[Decimal]) -> Decimal {
    if line_totals.is_empty() {
        stored_value
    } else {
        line_totals.iter().copied().sum()
    }
}

pub fn invoice_status(status: Option<bool>, expiry: Option<DateTime<Utc>>, now: DateTime<Utc>) -> InvoiceStatus {
    match TriState::from(status) {
        TriState::True => InvoiceStatus::Paid,
        TriState::False => InvoiceStatus::Cancelled,
        TriState::Unset => match expiry {
            Some(due) if due < now => InvoiceStatus::Overdue,
            _ => InvoiceStatus::Pending,
        },
    }
}

/// Flag persistida para um status escolhido pelo usuário. "Vencida" não é
/// gravável: continua em aberto e volta a ser derivada da data.
pub fn invoice_status_flag(status: InvoiceStatus) -> Option<bool> {
    match status {
        InvoiceStatus::Paid => Some(true),
        InvoiceStatus::Cancelled => Some(false),
        InvoiceStatus::Pending | InvoiceStatus::Overdue => None,
    }
}

/// Um lembrete por fatura não paga. Vencimento: expiry, senão updated, senão created.
pub fn build_reminders(invoices: &[InvoiceRow], now: DateTime<Utc>) -> Vec<ReminderDto> {
    invoices
        .iter()
        .filter(|invoice| invoice.status != Some(true))
        .map(|invoice| {
            let due = invoice.expiry.or(invoice.updated).or(invoice.created);
            let status = match due {
                Some(due) if due < now => ReminderStatus::Enviado,
                _ => ReminderStatus::Pendiente,
            };
            ReminderDto {
                invoice_id: invoice.id,
                client_id: invoice.client_id,
                invoice_number: text_or(invoice.number.as_deref(), FALLBACK_INVOICE_NUMBER),
                amount: invoice.total,
                due_date: format_timestamp(due),
                status,
            }
        })
        .collect()
}

/// Percentual de imposto aplicado sobre o subtotal.
pub fn tax_amount(subtotal: Decimal, percentage: Decimal) -> Decimal {
    round_money(subtotal * percentage / Decimal::ONE_HUNDRED)
}

/// Fórmula canônica: total = subtotal + imposto 1 + imposto 2 + IVA.
/// `taxes` traz o id e o percentual de cada imposto (ausente = 0%).
pub fn compute_invoice_amounts(
    subtotal: Decimal,
    tax_one: (Option<Uuid>, Decimal),
    tax_two: (Option<Uuid>, Decimal),
    include_vat: bool,
) -> InvoiceAmounts {
    let subtotal = round_money(subtotal);
    let tax_one_amount = tax_amount(subtotal, tax_one.1);
    let tax_two_amount = tax_amount(subtotal, tax_two.1);
    let vat_amount = if include_vat { round_money(subtotal * VAT_RATE) } else { Decimal::ZERO };

    InvoiceAmounts {
        subtotal,
        tax_one_id: tax_one.0,
        tax_two_id: tax_two.0,
        tax_one_amount,
        tax_two_amount,
        include_vat,
        vat_amount,
        total: round_money(subtotal + tax_one_amount + tax_two_amount + vat_amount),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn invoice(status: Option<bool>, expiry: Option<DateTime<Utc>>) -> InvoiceRow {
        InvoiceRow {
            id: Uuid::new_v4(),
            tenant_id: Uuid::nil(),
            client_id: Uuid::new_v4(),
            service_id: None,
            number: None,
            description: None,
            subtotal: dec("100"),
            tax_one_id: None,
            tax_two_id: None,
            tax_one_amount: Decimal::ZERO,
            tax_two_amount: Decimal::ZERO,
            include_vat: false,
            vat_amount: Decimal::ZERO,
            total: dec("100"),
            status,
            expiry,
            created: None,
            updated: None,
        }
    }

    #[test]
    fn vat_rate_is_nineteen_percent() {
        assert_eq!(VAT_RATE, dec("0.19"));
    }

    #[test]
    fn line_items_win_over_stored_value() {
        assert_eq!(quote_total(dec("999"), &[dec("10"), dec("15")]), dec("25"));
    }

    #[test]
    fn stored_value_is_used_without_line_items() {
        assert_eq!(quote_total(dec("999"), &[]), dec("999"));
    }

    #[test]
    fn open_invoice_past_due_is_overdue() {
        let now = Utc::now();
        assert_eq!(invoice_status(None, Some(now - Duration::days(1)), now), InvoiceStatus::Overdue);
        assert_eq!(invoice_status(None, Some(now + Duration::days(1)), now), InvoiceStatus::Pending);
        assert_eq!(invoice_status(None, None, now), InvoiceStatus::Pending);
    }

    #[test]
    fn paid_ignores_expiry_and_false_is_cancelled() {
        let now = Utc::now();
        let past = Some(now - Duration::days(30));
        assert_eq!(invoice_status(Some(true), past, now), InvoiceStatus::Paid);
        assert_eq!(invoice_status(Some(false), past, now), InvoiceStatus::Cancelled);
    }

    #[test]
    fn reminders_skip_paid_invoices_and_fall_back_on_dates() {
        let now = Utc::now();
        let mut from_updated = invoice(None, None);
        from_updated.updated = Some(now - Duration::days(2));
        let future = invoice(None, Some(now + Duration::days(5)));
        let paid = invoice(Some(true), Some(now - Duration::days(5)));
        let undated = invoice(Some(false), None);

        let reminders = build_reminders(&[from_updated.clone(), future.clone(), paid, undated.clone()], now);

        assert_eq!(reminders.len(), 3);
        assert_eq!(reminders[0].invoice_id, from_updated.id);
        assert_eq!(reminders[0].status, ReminderStatus::Enviado);
        assert_eq!(reminders[1].status, ReminderStatus::Pendiente);
        assert_eq!(reminders[2].invoice_id, undated.id);
        assert_eq!(reminders[2].due_date, None);
        assert_eq!(reminders[2].status, ReminderStatus::Pendiente);
        assert_eq!(reminders[2].invoice_number, FALLBACK_INVOICE_NUMBER);
    }

    #[test]
    fn amounts_follow_canonical_formula() {
        let retention = Uuid::new_v4();
        let amounts = compute_invoice_amounts(
            dec("1000.005"),
            (Some(retention), dec("4")),
            (None, Decimal::ZERO),
            true,
        );

        assert_eq!(amounts.subtotal, dec("1000.01"));
        assert_eq!(amounts.tax_one_amount, dec("40.00"));
        assert_eq!(amounts.tax_two_amount, dec("0"));
        assert_eq!(amounts.vat_amount, dec("190.00"));
        assert_eq!(amounts.total, dec("1230.01"));
        assert_eq!(amounts.tax_one_id, Some(retention));
    }

    #[test]
    fn without_vat_total_is_subtotal_plus_taxes() {
        let amounts = compute_invoice_amounts(dec("200"), (None, dec("0.966")), (None, dec("2.5")), false);

        assert_eq!(amounts.tax_one_amount, dec("1.93"));
        assert_eq!(amounts.tax_two_amount, dec("5.00"));
        assert_eq!(amounts.vat_amount, Decimal::ZERO);
        assert_eq!(amounts.total, dec("206.93"));
    }
}
