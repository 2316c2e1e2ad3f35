use super::{ConfigError, Env};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmqpConfig {
    pub enabled: bool,
    pub url: String,
    pub delete_queue: String,
    pub exchange: Option<String>,
    pub routing_key: Option<String>,
    pub prefetch_count: u16,
}

impl AmqpConfig {
    pub(crate) fn load(env: &Env<'_>) -> Result<Self, ConfigError> {
        Ok(Self {
            enabled: env.parse_or("AMQP_ENABLED", false)?,
            url: env.or("AMQP_URL", "amqp://127.0.0.1:5672/%2f"),
            delete_queue: env.or("AMQP_DELETE_QUEUE", "file_storage.delete_files"),
            exchange: env.optional("AMQP_EXCHANGE"),
            routing_key: env.optional("AMQP_ROUTING_KEY"),
            prefetch_count: env.parse_or("AMQP_PREFETCH_COUNT", 16)?,
        })
    }
}
