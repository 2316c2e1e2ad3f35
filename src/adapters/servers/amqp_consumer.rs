use std::{fmt::Display, time::Duration};

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use lapin::{
    message::Delivery,
    options::{
        BasicAckOptions, BasicConsumeOptions, BasicQosOptions, BasicRejectOptions, QueueBindOptions,
        QueueDeclareOptions,
    },
    types::FieldTable,
    Channel, Connection, ConnectionProperties, Consumer,
};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::{
    adapters::{controllers::amqp_controller::DeleteFilesHandler, presenters::amqp_presenter::DeliveryOutcome},
    application::{
        context::RequestContext,
        lifecycle::{LaunchError, Launchable},
    },
    domain::config::amqp::AmqpConfig,
};

const CONSUMER_TAG: &str = "file-storage-gateway";
const RECONNECT_MIN_DELAY: Duration = Duration::from_millis(500);
const RECONNECT_MAX_DELAY: Duration = Duration::from_secs(30);

/// Consumes delete requests from a durable queue, one task per delivery.
/// A lost broker connection is re-established until shutdown.
pub struct AmqpConsumer {
    config: AmqpConfig,
    handler: DeleteFilesHandler,
    shutdown: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl AmqpConsumer {
    pub fn new(config: AmqpConfig, handler: DeleteFilesHandler) -> Self {
        Self {
            config,
            handler,
            shutdown: CancellationToken::new(),
            task: None,
        }
    }
}

#[async_trait]
impl Launchable for AmqpConsumer {
    fn name(&self) -> &'static str {
        "amqp consumer"
    }

    async fn start(&mut self) -> Result<(), LaunchError> {
        // The first connection must succeed; later ones are retried
        let session = Session::open(&self.config)
            .await
            .map_err(|e| LaunchError::start(self.name(), e))?;
        info!("Consuming delete requests from {}", self.config.delete_queue);

        self.task = Some(tokio::spawn(run(
            self.config.clone(),
            self.handler.clone(),
            self.shutdown.clone(),
            session,
        )));
        Ok(())
    }

    async fn shutdown(&mut self) {
        self.shutdown.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                error!("AMQP consumer task failed: {}", e);
            }
        }
        info!("AMQP consumer stopped");
    }
}

struct Session {
    connection: Connection,
    channel: Channel,
    consumer: Consumer,
}

impl Session {
    async fn open(config: &AmqpConfig) -> Result<Self, lapin::Error> {
        let connection = Connection::connect(&config.url, ConnectionProperties::default()).await?;
        let channel = connection.create_channel().await?;

        channel
            .basic_qos(config.prefetch_count, BasicQosOptions::default())
            .await?;
        channel
            .queue_declare(
                &config.delete_queue,
                QueueDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await?;

        if let Some(exchange) = &config.exchange {
            let routing_key = config.routing_key.as_deref().unwrap_or(&config.delete_queue);
            channel
                .queue_bind(
                    &config.delete_queue,
                    exchange,
                    routing_key,
                    QueueBindOptions::default(),
                    FieldTable::default(),
                )
                .await?;
            info!(
                "Queue {} bound to exchange {} with key {}",
                config.delete_queue, exchange, routing_key
            );
        }

        let consumer = channel
            .basic_consume(
                &config.delete_queue,
                CONSUMER_TAG,
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await?;

        Ok(Self {
            connection,
            channel,
            consumer,
        })
    }

    async fn close(self) {
        if let Err(e) = self.channel.close(200, "shutdown").await {
            debug!("Failed to close AMQP channel: {}", e);
        }
        if let Err(e) = self.connection.close(200, "shutdown").await {
            debug!("Failed to close AMQP connection: {}", e);
        }
    }
}

/// Why a delivery stream stopped.
#[derive(Debug, PartialEq, Eq)]
enum StreamEnd {
    Shutdown,
    Failed(String),
    Closed,
}

/// Hands every item to `dispatch` until the stream ends, fails or shutdown is requested.
async fn drain<S, T, E, F>(mut stream: S, shutdown: &CancellationToken, mut dispatch: F) -> StreamEnd
where
    S: Stream<Item = Result<T, E>> + Unpin,
    E: Display,
    F: FnMut(T),
{
    loop {
        let next = tokio::select! {
            biased;
            _ = shutdown.cancelled() => return StreamEnd::Shutdown,
            next = stream.next() => next,
        };

        match next {
            Some(Ok(item)) => dispatch(item),
            Some(Err(e)) => return StreamEnd::Failed(e.to_string()),
            None => return StreamEnd::Closed,
        }
    }
}

async fn run(
    config: AmqpConfig,
    handler: DeleteFilesHandler,
    shutdown: CancellationToken,
    mut session: Session,
) {
    loop {
        let end = drain(&mut session.consumer, &shutdown, |delivery| {
            let handler = handler.clone();
            let ctx = RequestContext::new().with_cancellation(&shutdown);
            tokio::spawn(async move {
                let outcome = handler.handle(&ctx, &delivery.data).await;
                settle(&delivery, outcome).await;
            });
        })
        .await;

        match end {
            StreamEnd::Shutdown => {
                session.close().await;
                return;
            }
            StreamEnd::Failed(e) => error!("AMQP consumer error: {}", e),
            StreamEnd::Closed => warn!("AMQP consumer stream ended"),
        }

        session.close().await;
        match reconnect(&config, &shutdown).await {
            Some(next) => session = next,
            None => return,
        }
    }
}

/// Retries with exponential backoff; gives up only when shutdown is requested.
async fn reconnect(config: &AmqpConfig, shutdown: &CancellationToken) -> Option<Session> {
    let mut delay = RECONNECT_MIN_DELAY;
    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => return None,
            _ = tokio::time::sleep(delay) => {}
        }

        match Session::open(config).await {
            Ok(session) => {
                info!("Reconnected to AMQP broker, consuming {}", config.delete_queue);
                return Some(session);
            }
            Err(e) => {
                warn!("AMQP reconnect failed, retrying in {:?}: {}", delay, e);
                delay = next_delay(delay);
            }
        }
    }
}

fn next_delay(delay: Duration) -> Duration {
    (delay * 2).min(RECONNECT_MAX_DELAY)
}

async fn settle(delivery: &Delivery, outcome: DeliveryOutcome) {
    let result = match outcome {
        DeliveryOutcome::Ack => delivery.ack(BasicAckOptions::default()).await,
        DeliveryOutcome::Reject { requeue } => {
            debug!("Rejecting delivery {} (requeue: {})", delivery.delivery_tag, requeue);
            delivery.reject(BasicRejectOptions { requeue }).await
        }
    };
    if let Err(e) = result {
        error!("Failed to settle delivery {}: {}", delivery.delivery_tag, e);
    }
}

#[cfg(test)]
mod tests {
    use futures::stream;

    use super::*;

    #[tokio::test]
    async fn drain_reports_closed_stream_after_dispatching_everything() {
        let shutdown = CancellationToken::new();
        let mut seen = Vec::new();

        let end = drain(
            stream::iter(vec![Ok::<_, String>(1), Ok(2), Ok(3)]),
            &shutdown,
            |item| seen.push(item),
        )
        .await;

        assert_eq!(end, StreamEnd::Closed);
        assert_eq!(seen, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn drain_stops_at_first_stream_error() {
        let shutdown = CancellationToken::new();
        let mut seen = Vec::new();

        let end = drain(
            stream::iter(vec![Ok(1), Err("connection reset"), Ok(2)]),
            &shutdown,
            |item| seen.push(item),
        )
        .await;

        assert_eq!(end, StreamEnd::Failed("connection reset".to_string()));
        assert_eq!(seen, vec![1]);
    }

    #[tokio::test]
    async fn drain_prefers_shutdown_over_pending_items() {
        let shutdown = CancellationToken::new();
        shutdown.cancel();
        let mut seen = Vec::new();

        let end = drain(
            stream::iter(vec![Ok::<_, String>(1)]),
            &shutdown,
            |item| seen.push(item),
        )
        .await;

        assert_eq!(end, StreamEnd::Shutdown);
        assert!(seen.is_empty());
    }

    #[tokio::test]
    async fn drain_waits_on_idle_stream_until_shutdown() {
        let shutdown = CancellationToken::new();
        let trigger = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let end = drain(stream::pending::<Result<u8, String>>(), &shutdown, |_| {}).await;
        assert_eq!(end, StreamEnd::Shutdown);
    }

    #[test]
    fn reconnect_delay_doubles_up_to_cap() {
        assert_eq!(next_delay(RECONNECT_MIN_DELAY), Duration::from_secs(1));
        assert_eq!(next_delay(Duration::from_secs(20)), RECONNECT_MAX_DELAY);
        assert_eq!(next_delay(RECONNECT_MAX_DELAY), RECONNECT_MAX_DELAY);
    }

    #[tokio::test]
    async fn reconnect_gives_up_on_shutdown() {
        let shutdown = CancellationToken::new();
        shutdown.cancel();
        let config = AmqpConfig {
            enabled: true,
            url: "amqp://127.0.0.1:1/%2f".to_string(),
            delete_queue: "q".to_string(),
            exchange: None,
            routing_key: None,
            prefetch_count: 1,
        };

        assert!(reconnect(&config, &shutdown).await.is_none());
    }
}
