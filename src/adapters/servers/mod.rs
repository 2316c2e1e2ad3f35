pub mod amqp_consumer;
pub mod grpc_server;
pub mod http_server;
