// src/db.rs

pub mod store;
pub use store::{BillingStore, BillingTx};
pub mod pg_store;
pub use pg_store::PgStore;
pub mod settings_repo;
pub use settings_repo::SettingsRepository;

#[cfg(test)]
pub mod memory_store;
