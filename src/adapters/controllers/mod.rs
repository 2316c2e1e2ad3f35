pub mod amqp_controller;
pub mod file_controller;
pub mod grpc_controller;
