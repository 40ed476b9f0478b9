// src/services.rs

pub mod auth;
pub mod billing_rules;
pub mod catalog_service;
pub mod client_service;
pub mod invoice_service;
pub mod mail;
pub mod payment_service;
pub mod quote_service;
