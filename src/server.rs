//! Startup for each process role

use std::sync::Arc;

use axum::Router;
use reqwest::Client;
use tokio::net::TcpListener;
use tracing::{info, warn};

use pixelq::api::{
    self,
    state::{CoordinatorState, GatewayState, StorageState},
};
use pixelq::config::Config;
use pixelq::coordinator::Coordinator;
use pixelq::directory::{COORDINATOR_ADDRESS, LEDGER_ADDRESS, STORAGE_ADDRESS, ServiceDirectory};
use pixelq::ledger::TaskLedger;
use pixelq::observability::Metrics;
use pixelq::remote::{self, BlobClient, CoordinatorClient, DirectoryClient, LedgerClient};
use pixelq::storage::ObjectBlobStore;
use pixelq::worker::{WorkerPool, default_transform};

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub async fn run_directory(config: Config) -> Result<(), AnyError> {
    config.validate()?;
    let metrics = Arc::new(Metrics::new());

    let app = api::service(api::directory::router(ServiceDirectory::new()), "directory", metrics);
    let listener = TcpListener::bind(config.server.bind_addr).await?;
    api::serve(listener, app, "directory").await?;
    Ok(())
}

pub async fn run_ledger(config: Config) -> Result<(), AnyError> {
    config.validate()?;
    let metrics = Arc::new(Metrics::new());
    let ledger = TaskLedger::with_metrics(config.ledger.lease_duration.as_duration(), metrics.clone());
    info!(lease_duration = %config.ledger.lease_duration, "Task ledger ready");

    let listener = TcpListener::bind(config.server.bind_addr).await?;
    let client = remote::build_client(&config.http)?;
    directory(&config, client).register_with_retry(LEDGER_ADDRESS, &advertised(&config)).await?;

    let app = api::service(api::ledger::router(ledger), "ledger", metrics);
    api::serve(listener, app, "ledger").await?;
    Ok(())
}

pub async fn run_storage(config: Config) -> Result<(), AnyError> {
    config.validate()?;
    let metrics = Arc::new(Metrics::new());
    let blobs = ObjectBlobStore::from_config(&config.storage)?;
    info!(provider = ?config.storage.provider, "Blob store ready");

    let listener = TcpListener::bind(config.server.bind_addr).await?;
    let client = remote::build_client(&config.http)?;
    directory(&config, client).register_with_retry(STORAGE_ADDRESS, &advertised(&config)).await?;

    let state = StorageState {
        blobs: Arc::new(blobs),
        max_blob_bytes: config.limits.max_blob_bytes.as_usize(),
    };
    let app = api::service(api::storage::router(state), "storage", metrics);
    api::serve(listener, app, "storage").await?;
    Ok(())
}

pub async fn run_coordinator(config: Config) -> Result<(), AnyError> {
    config.validate()?;
    let metrics = Arc::new(Metrics::new());
    let client = remote::build_client(&config.http)?;
    let directory = directory(&config, client.clone());

    let ledger_address = directory.lookup_with_retry(LEDGER_ADDRESS).await?;
    let storage_address = directory.lookup_with_retry(STORAGE_ADDRESS).await?;
    info!(ledger = %ledger_address, storage = %storage_address, "Dependencies resolved");

    let coordinator = Coordinator::new(
        Arc::new(LedgerClient::new(client.clone(), &ledger_address)),
        Arc::new(BlobClient::new(client, &storage_address)),
        metrics.clone(),
    );

    let listener = TcpListener::bind(config.server.bind_addr).await?;
    directory.register_with_retry(COORDINATOR_ADDRESS, &advertised(&config)).await?;

    let state = CoordinatorState {
        coordinator: Arc::new(coordinator),
        max_upload_bytes: config.limits.max_upload_bytes.as_usize(),
    };
    let app = api::service(api::coordinator::router(state), "coordinator", metrics);
    api::serve(listener, app, "coordinator").await?;
    Ok(())
}

pub async fn run_worker(config: Config) -> Result<(), AnyError> {
    config.validate()?;
    let client = remote::build_client(&config.http)?;
    let directory = directory(&config, client.clone());

    let coordinator_address = directory.lookup_with_retry(COORDINATOR_ADDRESS).await?;
    let storage_address = directory.lookup_with_retry(STORAGE_ADDRESS).await?;
    info!(coordinator = %coordinator_address, storage = %storage_address, "Dependencies resolved");

    let pool = WorkerPool::spawn(
        &config.worker,
        Arc::new(CoordinatorClient::new(client.clone(), &coordinator_address)),
        Arc::new(BlobClient::new(client, &storage_address)),
        default_transform(),
    );
    info!(pool = %pool.id(), "Worker role ready");

    tokio::select! {
        _ = pool.join() => {},
        _ = api::shutdown_signal() => {},
    }
    Ok(())
}

pub async fn run_gateway(config: Config) -> Result<(), AnyError> {
    config.validate()?;
    let metrics = Arc::new(Metrics::new());
    let client = remote::build_client(&config.http)?;

    let coordinator_address = directory(&config, client.clone())
        .lookup_with_retry(COORDINATOR_ADDRESS)
        .await?;
    info!(coordinator = %coordinator_address, "Dependencies resolved");

    let state = GatewayState {
        submissions: Arc::new(CoordinatorClient::new(client, &coordinator_address)),
        max_upload_bytes: config.limits.max_upload_bytes.as_usize(),
    };

    let listener = TcpListener::bind(config.server.bind_addr).await?;
    let app = api::service(api::gateway::router(state), "gateway", metrics);
    api::serve(listener, app, "gateway").await?;
    Ok(())
}

/// Every role in one process; internal calls stay in memory
pub async fn run_standalone(config: Config) -> Result<(), AnyError> {
    config.validate()?;
    let metrics = Arc::new(Metrics::new());
    let max_upload_bytes = config.limits.max_upload_bytes.as_usize();

    let ledger = TaskLedger::with_metrics(config.ledger.lease_duration.as_duration(), metrics.clone());
    let blobs = Arc::new(ObjectBlobStore::from_config(&config.storage)?);
    let coordinator = Arc::new(Coordinator::new(Arc::new(ledger.clone()), blobs.clone(), metrics.clone()));

    let _pool = WorkerPool::spawn_with_metrics(
        &config.worker,
        coordinator.clone(),
        blobs,
        default_transform(),
        metrics.clone(),
    );

    let gateway = api::gateway::router(GatewayState {
        submissions: coordinator.clone(),
        max_upload_bytes,
    });
    let routes = Router::new()
        .merge(gateway)
        .nest("/api", api::coordinator::router(CoordinatorState {
            coordinator,
            max_upload_bytes,
        }))
        .nest("/ledger", api::ledger::router(ledger));

    let listener = TcpListener::bind(config.server.bind_addr).await?;
    let app = api::service(routes, "standalone", metrics);
    api::serve(listener, app, "standalone").await?;
    Ok(())
}

fn directory(config: &Config, client: Client) -> DirectoryClient {
    DirectoryClient::new(client, &config.directory.address, config.directory.max_retries)
}

fn advertised(config: &Config) -> String {
    if config.server.advertise_addr.is_none() && config.server.bind_addr.ip().is_unspecified() {
        warn!(
            bind_addr = %config.server.bind_addr,
            "Advertising an unspecified address; set server.advertise_addr so other roles can reach this one"
        );
    }
    config.server.advertised()
}
