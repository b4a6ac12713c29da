//! Web server bootstrap: the standard middleware chain, a liveness route and
//! development hot reload.

pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod reload;
pub mod security;

pub use config::{Mode, Settings};
pub use http::{ConfigureError, HttpServer, ServerConfigurator, ServerInstance};
pub use lifecycle::Shutdown;
