//! HTTP/JSON transport for the graph manager

pub mod handler;
pub mod server;

pub use handler::ApiError;
pub use server::{router, HttpServer, ServerConfig};
