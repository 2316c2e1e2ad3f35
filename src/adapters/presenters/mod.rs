pub mod amqp_presenter;
pub mod grpc_presenter;
pub mod http_presenter;
