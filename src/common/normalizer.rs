// src/common/normalizer.rs

//! Normalização de dados legados: valores monetários em texto livre, status
//! tri-estado e datas. Tudo aqui é usado no caminho de leitura, então nenhuma
//! função falha: dado inválido vira um valor padrão (0, `None`, `Other`).

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use rust_decimal::{prelude::FromPrimitive, Decimal, RoundingStrategy};
use serde_json::Value;

// =========================================================================
//  DINHEIRO
// =========================================================================

/// Converte texto monetário livre ("$ 1.234,56", "1,234.56", "12,5") em Decimal.
///
/// Com vírgula e ponto presentes, o separador que aparece por último é o
/// decimal. Um único separador que se repete ("1.250.000") é de milhar; se
/// aparece uma vez só, é o decimal. Entrada sem número vira 0.
pub fn parse_currency(raw: Option<&str>) -> Decimal {
    let Some(raw) = raw else {
        return Decimal::ZERO;
    };

    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, ',' | '.' | '-'))
        .collect();

    if cleaned.is_empty() {
        return Decimal::ZERO;
    }

    let normalized = match (cleaned.rfind(','), cleaned.rfind('.')) {
        (Some(comma), Some(dot)) if comma > dot => cleaned.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        (Some(_), None) if cleaned.matches(',').count() > 1 => cleaned.replace(',', ""),
        (Some(_), None) => cleaned.replace(',', "."),
        (None, Some(_)) if cleaned.matches('.').count() > 1 => cleaned.replace('.', ""),
        _ => cleaned,
    };

    numeric_prefix(&normalized)
        .and_then(|n| Decimal::from_str(&n).ok())
        .unwrap_or(Decimal::ZERO)
}

/// Mesma regra de `parse_currency`, aceitando número, texto ou null do JSON.
pub fn parse_currency_value(raw: &Value) -> Decimal {
    match raw {
        Value::Number(n) => Decimal::from_str(&n.to_string())
            .ok()
            .or_else(|| n.as_f64().and_then(Decimal::from_f64))
            .unwrap_or(Decimal::ZERO),
        Value::String(s) => parse_currency(Some(s)),
        _ => Decimal::ZERO,
    }
}

// Maior prefixo no formato -?\d*(\.\d+)? com ao menos um dígito
fn numeric_prefix(s: &str) -> Option<String> {
    let bytes = s.as_bytes();
    let negative = bytes.first() == Some(&b'-');
    let mut pos = usize::from(negative);

    let int_start = pos;
    while pos < bytes.len() && bytes[pos].is_ascii_digit() {
        pos += 1;
    }
    let int_part = &s[int_start..pos];

    let mut frac_part = "";
    if pos < bytes.len() && bytes[pos] == b'.' {
        let frac_start = pos + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        frac_part = &s[frac_start..frac_end];
    }

    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }

    let mut out = String::with_capacity(s.len() + 1);
    if negative {
        out.push('-');
    }
    out.push_str(if int_part.is_empty() { "0" } else { int_part });
    if !frac_part.is_empty() {
        out.push('.');
        out.push_str(frac_part);
    }
    Some(out)
}

/// Arredonda para 2 casas (meio para longe do zero), como é persistido.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

// =========================================================================
//  STATUS
// =========================================================================

/// Campo booleano anulável do banco, convertido logo após a leitura.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriState {
    True,
    False,
    Unset,
}

impl From<Option<bool>> for TriState {
    fn from(value: Option<bool>) -> Self {
        match value {
            Some(true) => TriState::True,
            Some(false) => TriState::False,
            None => TriState::Unset,
        }
    }
}

impl From<TriState> for Option<bool> {
    fn from(value: TriState) -> Self {
        match value {
            TriState::True => Some(true),
            TriState::False => Some(false),
            TriState::Unset => None,
        }
    }
}

/// Vocabulário de um ponto de chamada: palavras-chave por status, em ordem de
/// prioridade, e os valores usados quando não há texto.
pub struct KeywordTable<S: 'static> {
    pub rules: &'static [(S, &'static [&'static str])],
    pub when_true: S,
    pub when_false: S,
    pub other: S,
}

/// Classifica um status a partir de texto livre e/ou da flag booleana.
///
/// O texto é comparado por substring (não igualdade) e a primeira regra que
/// casar vence. Sem texto, vale a flag. Sem nenhum dos dois, `other`.
pub fn classify_status<S: Copy>(raw_text: Option<&str>, flag: Option<bool>, table: &KeywordTable<S>) -> S {
    let text = raw_text.map(|t| t.trim().to_lowercase()).unwrap_or_default();

    if !text.is_empty() {
        return table
            .rules
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| text.contains(k)))
            .map(|(status, _)| *status)
            .unwrap_or(table.other);
    }

    match flag {
        Some(true) => table.when_true,
        Some(false) => table.when_false,
        None => table.other,
    }
}

// =========================================================================
//  TEXTO E DATAS
// =========================================================================

/// Texto aparado ou o fallback, quando vazio/nulo.
pub fn text_or(value: Option<&str>, fallback: &str) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => fallback.to_string(),
    }
}

/// Texto aparado, ou `None` quando vazio.
pub fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Lê datas legadas em texto. Formatos aceitos: RFC 3339, "AAAA-MM-DD HH:MM:SS",
/// "AAAA-MM-DD" e "DD/MM/AAAA".
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    for fmt in ["%Y-%m-%d", "%d/%m/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, fmt) {
            return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
        }
    }
    None
}

/// ISO-8601 em UTC com milissegundos ("2024-03-01T12:00:00.000Z").
pub fn format_timestamp(value: Option<DateTime<Utc>>) -> Option<String> {
    value.map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
}

pub fn format_legacy_date(raw: Option<&str>) -> Option<String> {
    format_timestamp(raw.and_then(parse_date))
}
