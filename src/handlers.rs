// src/handlers.rs

pub mod catalog;
pub mod clients;
pub mod invoices;
pub mod payments;
pub mod quotes;
pub mod settings;
