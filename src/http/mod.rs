//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! ServerInstance::new()
//!     → configure.rs (attach middleware chain + /healthcheck)
//!     → caller may add its own routes and stages
//!     → instance.rs into_router() (one-shot build)
//!     → server.rs (trace layer, serve, graceful shutdown)
//! ```

pub mod configure;
pub mod instance;
pub mod middleware;
pub mod server;

pub use configure::{ConfigureError, ServerConfigurator, CSP_KEY};
pub use instance::ServerInstance;
pub use server::HttpServer;
