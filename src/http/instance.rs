//! Server instance under construction.
//!
//! # Responsibilities
//! - Record middleware stages in registration order
//! - Record routes
//! - Build the final axum `Router` exactly once
//!
//! # Design Decisions
//! - `into_router` consumes the instance: nothing can be attached once the
//!   router exists, so middleware always precedes accepting connections
//! - The first registered stage is the outermost layer and sees every
//!   request first
//! - Stages wrap every route and the fallback, regardless of when the route
//!   was registered

use std::fmt;

use axum::handler::Handler;
use axum::routing::{get, MethodRouter};
use axum::Router;
use uuid::Uuid;

type Stage = Box<dyn FnOnce(Router) -> Router + Send>;

/// A server being assembled by the configurator and its caller.
pub struct ServerInstance {
    id: Uuid,
    stages: Vec<(&'static str, Stage)>,
    routes: Router,
    paths: Vec<String>,
}

impl ServerInstance {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            stages: Vec::new(),
            routes: Router::new(),
            paths: Vec::new(),
        }
    }

    /// Stable identity of this instance.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Register a named middleware stage.
    ///
    /// The closure receives the router holding every route and every stage
    /// registered after this one, and returns it wrapped.
    pub fn use_stage<F>(&mut self, name: &'static str, stage: F) -> &mut Self
    where
        F: FnOnce(Router) -> Router + Send + 'static,
    {
        tracing::debug!(instance = %self.id, stage = name, "Registering middleware");
        self.stages.push((name, Box::new(stage)));
        self
    }

    /// Register a GET (and implied HEAD) route.
    pub fn get<H, T>(&mut self, path: &str, handler: H) -> &mut Self
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        self.route(path, get(handler))
    }

    /// Register a route for any set of methods.
    pub fn route(&mut self, path: &str, method_router: MethodRouter) -> &mut Self {
        tracing::debug!(instance = %self.id, path, "Registering route");
        let routes = std::mem::take(&mut self.routes);
        self.routes = routes.route(path, method_router);
        self.paths.push(path.to_string());
        self
    }

    /// Names of the registered stages, in registration order.
    pub fn stages(&self) -> Vec<&'static str> {
        self.stages.iter().map(|(name, _)| *name).collect()
    }

    pub fn has_route(&self, path: &str) -> bool {
        self.paths.iter().any(|p| p == path)
    }

    /// Build the serving router.
    pub fn into_router(self) -> Router {
        let mut router = self.routes;
        for (name, stage) in self.stages.into_iter().rev() {
            router = stage(router);
            tracing::trace!(stage = name, "Applied middleware stage");
        }
        router
    }
}

impl Default for ServerInstance {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ServerInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerInstance")
            .field("id", &self.id)
            .field("stages", &self.stages())
            .field("routes", &self.paths)
            .finish()
    }
}
