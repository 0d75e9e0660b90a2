use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use crate::cli::utils::{bind, shutdown_signal};
use crate::config::{AppConfig, StorageBackend};
use crate::database::DatabaseManager;
use crate::device::store::{
    InMemoryReadStore, InMemorySystemOfRecord, PostgresDeviceStore, PostgresDocumentStore,
};
use crate::device::{CombinedRepository, DeviceService};
use crate::rpc::server;

#[derive(Clone)]
enum StoreHealth {
    Memory,
    Postgres(DatabaseManager),
}

impl StoreHealth {
    async fn check(self) -> Result<(), String> {
        match self {
            StoreHealth::Memory => Ok(()),
            StoreHealth::Postgres(database) => {
                database.health_check().await.map_err(|e| e.to_string())
            }
        }
    }
}

async fn build_repository(config: &AppConfig) -> anyhow::Result<(CombinedRepository, StoreHealth)> {
    match config.storage.backend {
        StorageBackend::Memory => {
            info!("Using in-memory device stores");
            let repository = CombinedRepository::new(
                Arc::new(InMemorySystemOfRecord::new()),
                Arc::new(InMemoryReadStore::new()),
            );
            Ok((repository, StoreHealth::Memory))
        }
        StorageBackend::Postgres => {
            let postgres_uri =
                config.storage.postgres_uri.as_deref().context("POSTGRES_URI is not set")?;
            let read_store_uri =
                config.storage.read_store_uri.as_deref().context("READ_STORE_URI is not set")?;

            let database = DatabaseManager::new(config.database.clone());
            let system_of_record = database
                .connect("system_of_record", postgres_uri)
                .await
                .context("failed to connect to the system of record")?;
            let read_store = database
                .connect("read_store", read_store_uri)
                .await
                .context("failed to connect to the read store")?;

            let repository = CombinedRepository::new(
                Arc::new(PostgresDeviceStore::new(system_of_record)),
                Arc::new(PostgresDocumentStore::new(read_store)),
            );
            Ok((repository, StoreHealth::Postgres(database)))
        }
    }
}

pub async fn run(config: &AppConfig, addr: Option<String>) -> anyhow::Result<()> {
    config.validate_device_service()?;

    let (repository, health) = build_repository(config).await?;
    let repository = Arc::new(repository);
    let service = Arc::new(DeviceService::new(repository.clone(), repository));

    let store_health = health.clone();
    let app = server::router(service, move || store_health.clone().check());

    let addr = addr.unwrap_or_else(|| config.server.device_rpc_addr.clone());
    let listener = bind(&addr).await?;
    info!(addr = %addr, storage = ?config.storage.backend, "Device service listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("device service failed")?;

    if let StoreHealth::Postgres(database) = health {
        database.close_all().await;
    }
    info!("Device service stopped");
    Ok(())
}
