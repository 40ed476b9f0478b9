//src/main.rs

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, patch, post, put},
    Router,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod mappers;
mod middleware;
mod models;
mod services;

use crate::config::{AppState, Settings};
use crate::docs::ApiDoc;
use crate::middleware::auth::auth_guard;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG controla o nível; padrão: info
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let settings = Settings::from_env()?;
    let app_state = AppState::new(&settings).await?;

    // Faz o app rodar as migrações do SQLx na inicialização
    sqlx::migrate!().run(&app_state.db_pool).await?;
    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    let app = router(app_state);

    let listener = TcpListener::bind(settings.bind_addr).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(app_state: AppState) -> Router {
    let client_routes = Router::new()
        .route("/", get(handlers::clients::list_clients).post(handlers::clients::create_client))
        .route(
            "/{id}",
            get(handlers::clients::get_client)
                .put(handlers::clients::update_client)
                .delete(handlers::clients::delete_client),
        )
        .route("/{id}/services", post(handlers::clients::assign_service))
        .route("/{id}/services/{service_id}", delete(handlers::clients::unassign_service));

    let service_routes = Router::new()
        .route("/", get(handlers::catalog::list_services).post(handlers::catalog::create_service))
        .route(
            "/{id}",
            get(handlers::catalog::get_service)
                .put(handlers::catalog::update_service)
                .delete(handlers::catalog::delete_service),
        );

    let tax_routes = Router::new()
        .route("/", get(handlers::catalog::list_taxes).post(handlers::catalog::create_tax))
        .route("/{id}", put(handlers::catalog::update_tax));

    let quote_routes = Router::new()
        .route("/", get(handlers::quotes::list_quotes).post(handlers::quotes::create_quote))
        .route("/{id}", get(handlers::quotes::get_quote))
        .route("/{id}/status", patch(handlers::quotes::update_quote_status))
        .route("/{id}/convert", post(handlers::quotes::convert_quote))
        .route("/{id}/send", post(handlers::quotes::send_quote));

    let invoice_routes = Router::new()
        .route("/", get(handlers::invoices::list_invoices).post(handlers::invoices::create_invoice))
        .route("/{id}", get(handlers::invoices::get_invoice))
        .route("/{id}/status", patch(handlers::invoices::update_invoice_status))
        .route("/{id}/send", post(handlers::invoices::send_invoice));

    let payment_routes = Router::new()
        .route("/", get(handlers::payments::list_payments).post(handlers::payments::create_payment))
        .route("/{id}", get(handlers::payments::get_payment));

    // Tudo sob /api exige bearer token; o tenant vem do X-Tenant-ID
    let api_routes = Router::new()
        .nest("/clients", client_routes)
        .nest("/services", service_routes)
        .nest("/taxes", tax_routes)
        .nest("/quotes", quote_routes)
        .nest("/invoices", invoice_routes)
        .nest("/payments", payment_routes)
        .route("/parameters", get(handlers::clients::list_parameters))
        .route("/reminders", get(handlers::invoices::list_reminders))
        .route(
            "/settings",
            get(handlers::settings::get_settings).put(handlers::settings::update_settings),
        )
        .route_layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    Router::new()
        .route("/health", get(|| async { "OK" }))
        .nest("/api", api_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(app_state)
}
