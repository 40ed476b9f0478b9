// src/mappers.rs

//! Linha do banco -> DTO da API. Funções puras: os valores derivados
//! (total da cotação, status da fatura) chegam prontos do chamador.

pub mod catalog;
pub mod client;
pub mod invoice;
pub mod payment;
pub mod quote;

pub const FALLBACK_CLIENT_NAME: &str = "Cliente sin nombre";
pub const FALLBACK_SERVICE_NAME: &str = "Servicio sin nombre";
pub const FALLBACK_QUOTE_DESCRIPTION: &str = "Cotización sin descripción";
pub const FALLBACK_INVOICE_NUMBER: &str = "Factura sin número";
pub const FALLBACK_METHOD_NAME: &str = "Método sin nombre";
pub const FALLBACK_TAX_NAME: &str = "Impuesto sin nombre";
