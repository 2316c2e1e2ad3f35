use std::sync::Arc;

use async_trait::async_trait;
use tokio::{net::TcpListener, task::JoinHandle};
use tokio_stream::wrappers::TcpListenerStream;
use tokio_util::sync::CancellationToken;
use tonic::transport::Server;
use tracing::{error, info};

use crate::{
    adapters::controllers::grpc_controller::FileStorageController,
    application::{
        lifecycle::{LaunchError, Launchable},
        use_cases::file_use_case::FileUseCase,
    },
    domain::config::server::GrpcConfig,
    proto::file_storage_server::FileStorageServer,
};

pub struct GrpcServer {
    config: GrpcConfig,
    file_use_case: Arc<dyn FileUseCase>,
    shutdown: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl GrpcServer {
    pub fn new(config: GrpcConfig, file_use_case: Arc<dyn FileUseCase>) -> Self {
        Self {
            config,
            file_use_case,
            shutdown: CancellationToken::new(),
            task: None,
        }
    }
}

#[async_trait]
impl Launchable for GrpcServer {
    fn name(&self) -> &'static str {
        "grpc server"
    }

    async fn start(&mut self) -> Result<(), LaunchError> {
        let addr = self.config.addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| LaunchError::start(self.name(), format!("cannot bind {}: {}", addr, e)))?;
        info!("gRPC server listening on {}", addr);

        let service = FileStorageServer::new(FileStorageController::new(self.file_use_case.clone()));
        let shutdown = self.shutdown.clone();

        self.task = Some(tokio::spawn(async move {
            let result = Server::builder()
                .add_service(service)
                .serve_with_incoming_shutdown(TcpListenerStream::new(listener), shutdown.cancelled_owned())
                .await;
            if let Err(e) = result {
                error!("gRPC server stopped with error: {}", e);
            }
        }));
        Ok(())
    }

    async fn shutdown(&mut self) {
        self.shutdown.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                error!("gRPC server task failed: {}", e);
            }
        }
        info!("gRPC server stopped");
    }
}
