mod activities;
mod auth;
mod datatypes;
mod error;
mod misc;
mod registry;
mod routes;
mod settings;
mod teachers;

use std::sync::Arc;
use std::time::Duration;

use axum_server::tls_rustls::RustlsConfig;
use axum_server::Handle;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::registry::ActivityRegistry;
use crate::settings::Settings;
use crate::teachers::TeacherDirectory;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env()?;

    init_tracing(&settings.log_level);
    info!(?settings, "configuration");

    run_server(settings).await
}

fn init_tracing(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run_server(settings: Settings) -> anyhow::Result<()> {
    let teachers = TeacherDirectory::load(&settings.teachers_path)?;
    if teachers.is_empty() {
        warn!("teacher directory is empty, signups and removals are disabled");
    }

    let registry = match &settings.activities_path {
        Some(path) => ActivityRegistry::load(path, settings.enforce_capacity)?,
        None => ActivityRegistry::seeded(settings.enforce_capacity)?,
    };
    if registry.is_empty() {
        warn!("no activities configured");
    }
    if !settings.enforce_capacity {
        warn!("capacity is advisory, full activities keep accepting signups");
    }

    let app = routes::app(Arc::new(registry), Arc::new(teachers), &settings);
    let addr = settings.socket_addr();

    let handle = Handle::new();
    tokio::spawn(shutdown_on_ctrl_c(handle.clone()));

    match &settings.tls {
        Some(tls) => {
            let config = RustlsConfig::from_pem_file(&tls.cert_path, &tls.key_path).await?;

            info!(%addr, "listening with tls");
            axum_server::bind_rustls(addr, config)
                .handle(handle)
                .serve(app.into_make_service())
                .await?;
        }
        None => {
            info!(%addr, "listening");
            axum_server::bind(addr)
                .handle(handle)
                .serve(app.into_make_service())
                .await?;
        }
    }

    info!("server stopped");
    Ok(())
}

async fn shutdown_on_ctrl_c(handle: Handle) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            info!("shutting down");
            handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
        }
        Err(err) => warn!(%err, "could not listen for ctrl-c"),
    }
}
