use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::{
    configuration::{Settings, StoreBackend, StoreSettings},
    routes::{
        api::{
            create_appointment, get_appointment, health_check, update_appointment,
            verify_appointment,
        },
        pages::{register_page, register_post, reschedule_page, welcome_page},
    },
    services::AppointmentService,
    store::{AppointmentStore, MemoryStore, RedisStore, SqliteStore, StoreError},
};

#[derive(Clone, Debug)]
pub struct AppState {
    pub appointments: AppointmentService,
}

impl AppState {
    pub fn new(store: Arc<dyn AppointmentStore>) -> Self {
        Self {
            appointments: AppointmentService::new(store),
        }
    }
}

pub async fn build_store(
    settings: &StoreSettings,
) -> Result<Arc<dyn AppointmentStore>, StoreError> {
    let store: Arc<dyn AppointmentStore> = match settings.backend {
        StoreBackend::Sqlite => {
            Arc::new(SqliteStore::connect(&settings.sqlite, settings.acquire_timeout()).await?)
        }
        StoreBackend::Redis => {
            Arc::new(RedisStore::connect(&settings.redis, settings.acquire_timeout()).await?)
        }
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory store; appointments are lost on restart");
            Arc::new(MemoryStore::new())
        }
    };
    Ok(store)
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(welcome_page))
        .route("/register", get(register_page).post(register_post))
        .route("/reschedule.html", get(reschedule_page))
        .route("/health", get(health_check))
        .route("/api/appointments", post(create_appointment))
        .route("/verify_appointment", post(verify_appointment))
        .route("/get_appointment/{id}", get(get_appointment))
        .route("/update_appointment", post(update_appointment))
        .nest_service("/assets", ServeDir::new("public"))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

pub async fn run(settings: Settings) -> anyhow::Result<()> {
    tracing::info!(backend = ?settings.store.backend, "Opening appointment store");
    let store = build_store(&settings.store)
        .await
        .context("could not open the appointment store")?;

    let app = build_router(AppState::new(store));

    let address = format!("{}:{}", settings.application.host, settings.application.port);
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("could not bind {address}"))?;
    tracing::info!("Listening on http://{}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for ctrl-c: {:?}", e);
    }
}
