// src/config.rs

use std::{env, net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    common::i18n::I18nStore,
    db::{PgStore, SettingsRepository},
    services::{
        auth::{JwtVerifier, TokenVerifier},
        catalog_service::CatalogService,
        client_service::ClientService,
        invoice_service::InvoiceService,
        payment_service::PaymentService,
        quote_service::QuoteService,
    },
};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Configuração lida do ambiente (`.env` incluído).
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: SocketAddr,
    pub max_connections: u32,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?;

        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .context("BIND_ADDR inválido")?;

        let max_connections = match env::var("DB_MAX_CONNECTIONS") {
            Ok(raw) => raw.parse().context("DB_MAX_CONNECTIONS deve ser um número")?,
            Err(_) => DEFAULT_MAX_CONNECTIONS,
        };

        Ok(Self { database_url, jwt_secret, bind_addr, max_connections })
    }
}

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub client_service: ClientService<PgStore>,
    pub catalog_service: CatalogService<PgStore>,
    pub quote_service: QuoteService<PgStore>,
    pub invoice_service: InvoiceService<PgStore>,
    pub payment_service: PaymentService<PgStore>,
    pub settings_repo: SettingsRepository,
    pub i18n_store: I18nStore,
    pub token_verifier: Arc<dyn TokenVerifier>,
}

impl AppState {
    pub async fn new(settings: &Settings) -> anyhow::Result<Self> {
        let db_pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&settings.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        // --- Monta o gráfico de dependências ---
        let store = PgStore::new(db_pool.clone());

        Ok(Self {
            client_service: ClientService::new(store.clone()),
            catalog_service: CatalogService::new(store.clone()),
            quote_service: QuoteService::new(store.clone()),
            invoice_service: InvoiceService::new(store.clone()),
            payment_service: PaymentService::new(store),
            settings_repo: SettingsRepository::new(),
            i18n_store: I18nStore::default(),
            token_verifier: Arc::new(JwtVerifier::new(&settings.jwt_secret)),
            db_pool,
        })
    }
}
