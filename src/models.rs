// src/models.rs

pub mod auth;
pub mod catalog;
pub mod client;
pub mod invoice;
pub mod mail;
pub mod payment;
pub mod quote;
pub mod settings;
