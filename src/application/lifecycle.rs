use async_trait::async_trait;
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("failed to start {name}: {reason}")]
    Start { name: &'static str, reason: String },
}

impl LaunchError {
    pub fn start(name: &'static str, reason: impl ToString) -> Self {
        LaunchError::Start {
            name,
            reason: reason.to_string(),
        }
    }
}

/// A long-running component owned by [`App`].
///
/// `start` must return once the component is ready (listening, connected),
/// leaving the actual work to a spawned task.
#[async_trait]
pub trait Launchable: Send + Sync {
    fn name(&self) -> &'static str;
    async fn start(&mut self) -> Result<(), LaunchError>;
    async fn shutdown(&mut self);
}

#[derive(Default)]
pub struct App {
    launchables: Vec<Box<dyn Launchable>>,
    started: usize,
}

impl App {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, launchable: Box<dyn Launchable>) -> &mut Self {
        self.launchables.push(launchable);
        self
    }

    /// Starts launchables in registration order. If one fails, the ones
    /// already running are shut down before the error is returned.
    pub async fn start(&mut self) -> Result<(), LaunchError> {
        while self.started < self.launchables.len() {
            let launchable = &mut self.launchables[self.started];
            let name = launchable.name();
            if let Err(e) = launchable.start().await {
                error!("{}", e);
                self.shutdown().await;
                return Err(e);
            }
            info!("{} started", name);
            self.started += 1;
        }
        Ok(())
    }

    /// Stops every started launchable in reverse order.
    pub async fn shutdown(&mut self) {
        while self.started > 0 {
            self.started -= 1;
            let launchable = &mut self.launchables[self.started];
            info!("Stopping {}", launchable.name());
            launchable.shutdown().await;
        }
    }
}
