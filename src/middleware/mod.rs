pub mod auth_middleware;
pub mod request_logger;
pub mod role_gate;
