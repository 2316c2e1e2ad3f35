mod adapters;
mod application;
mod domain;
mod proto;
mod services;

use std::sync::Arc;

use adapters::{
    controllers::amqp_controller::DeleteFilesHandler,
    repositories::StorageFileRepository,
    servers::{amqp_consumer::AmqpConsumer, grpc_server::GrpcServer, http_server::HttpServer},
    state::AppState,
};
use application::{
    lifecycle::App,
    repositories::file_repository::FileRepository,
    use_cases::file_use_case::{FileService, FileUseCase},
};
use domain::config::{
    logger::{LogFormat, LoggerConfig},
    AppConfig,
};
use tracing_subscriber::EnvFilter;

fn init_tracing(config: &LoggerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    match config.format {
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

#[tokio::main]
async fn main() {
    // Must be installed before the S3 client builds its TLS config
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            std::process::exit(1);
        }
    };

    init_tracing(&config.logger);
    tracing::info!("Starting file-storage-gateway for bucket {}", config.storage.bucket_name);
    tracing::debug!("{:?}", config);

    let storage_service = services::create_storage_service(&config.storage);
    let file_repository = Arc::new(StorageFileRepository::new(
        storage_service,
        config.storage.bucket_name.clone(),
    )) as Arc<dyn FileRepository>;
    let file_use_case = Arc::new(FileService::new(file_repository)) as Arc<dyn FileUseCase>;

    let mut app = App::new();
    app.register(Box::new(GrpcServer::new(config.grpc.clone(), file_use_case.clone())));

    if config.http.enabled {
        let app_state = AppState {
            file_use_case: file_use_case.clone(),
        };
        app.register(Box::new(HttpServer::new(config.http.clone(), app_state)));
    }

    if config.amqp.enabled {
        let handler = DeleteFilesHandler::new(file_use_case.clone());
        app.register(Box::new(AmqpConsumer::new(config.amqp.clone(), handler)));
    }

    if let Err(e) = app.start().await {
        tracing::error!("Startup aborted: {}", e);
        std::process::exit(1);
    }

    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => tracing::error!("Failed to listen for shutdown signal: {}", e),
    }

    app.shutdown().await;
    tracing::info!("file-storage-gateway stopped");
}
