use async_trait::async_trait;
use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use tokio::{net::TcpListener, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

use crate::{
    adapters::{controllers::file_controller::FileController, state::AppState},
    application::lifecycle::{LaunchError, Launchable},
    domain::config::server::HttpConfig,
};

pub fn http_router(
    app_state: AppState,
    cors_allowed_origins: Option<&[String]>,
    max_upload_bytes: usize,
) -> Router {
    let cors = match cors_allowed_origins {
        Some(allowed_origins) => {
            let origins: Vec<HeaderValue> = allowed_origins
                .iter()
                .filter_map(|origin| match origin.parse() {
                    Ok(value) => Some(value),
                    Err(_) => {
                        warn!("Ignoring invalid CORS origin: {}", origin);
                        None
                    }
                })
                .collect();
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods(Any)
                .allow_headers(Any)
        }
        // Allow all origins if not specified (only for development)
        None => CorsLayer::permissive(),
    };

    Router::new()
        .route("/api/v1/ping", get(FileController::ping))
        .route("/api/v1/upload", post(FileController::upload_file))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(cors)
        .with_state(app_state)
}

pub struct HttpServer {
    config: HttpConfig,
    app_state: AppState,
    shutdown: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl HttpServer {
    pub fn new(config: HttpConfig, app_state: AppState) -> Self {
        Self {
            config,
            app_state,
            shutdown: CancellationToken::new(),
            task: None,
        }
    }
}

#[async_trait]
impl Launchable for HttpServer {
    fn name(&self) -> &'static str {
        "http server"
    }

    async fn start(&mut self) -> Result<(), LaunchError> {
        let addr = self.config.addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| LaunchError::start(self.name(), format!("cannot bind {}: {}", addr, e)))?;
        info!("HTTP server listening on {}", addr);

        let router = http_router(
            self.app_state.clone(),
            self.config.cors_allowed_origins.as_deref(),
            self.config.max_upload_bytes,
        );
        let shutdown = self.shutdown.clone();

        self.task = Some(tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router)
                .with_graceful_shutdown(shutdown.cancelled_owned())
                .await
            {
                error!("HTTP server stopped with error: {}", e);
            }
        }));
        Ok(())
    }

    async fn shutdown(&mut self) {
        self.shutdown.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                error!("HTTP server task failed: {}", e);
            }
        }
        info!("HTTP server stopped");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::application::use_cases::file_use_case::MockFileUseCase;

    #[tokio::test]
    async fn port_in_use_fails_start() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = taken.local_addr().unwrap().port();

        let config = HttpConfig {
            enabled: true,
            host: "127.0.0.1".to_string(),
            port,
            cors_allowed_origins: None,
            max_upload_bytes: 1024,
        };
        let mut server = HttpServer::new(
            config,
            AppState {
                file_use_case: Arc::new(MockFileUseCase::new()),
            },
        );

        let err = server.start().await.unwrap_err();
        assert!(err.to_string().starts_with("failed to start http server"));
    }

    #[tokio::test]
    async fn starts_and_stops() {
        let config = HttpConfig {
            enabled: true,
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_allowed_origins: Some(vec!["https://example.com".to_string()]),
            max_upload_bytes: 1024,
        };
        let mut server = HttpServer::new(
            config,
            AppState {
                file_use_case: Arc::new(MockFileUseCase::new()),
            },
        );

        server.start().await.unwrap();
        server.shutdown().await;
        assert!(server.task.is_none());
    }
}
