//! Middleware composition for a server instance.
//!
//! # Responsibilities
//! - Attach the standard middleware chain in a fixed order
//! - Register the liveness route
//! - Start the development source watcher once
//!
//! # Order
//! ```text
//! cookie-parser            must precede auth/anti-forgery layers
//! urlencoded               request bodies inflated, then extended form bodies
//! json                     strict JSON bodies
//! compression              not for event streams
//! security-headers         frame guard off in development
//! no-cache
//! content-security-policy  from the `contentSecurityPolicy` setting
//! GET /healthcheck
//! source watcher           development only
//! ```
//!
//! # Design Decisions
//! - The CSP setting is read after the body parsers are attached; when it is
//!   missing, configuration stops there and no route is registered
//! - Run mode and the watcher handle are explicit state, never read from the
//!   environment here

use std::path::Path;
use std::sync::Arc;

use axum::middleware::{from_fn, from_fn_with_state};
use thiserror::Error;
use tower_http::decompression::RequestDecompressionLayer;

use crate::config::{Mode, Settings};
use crate::health::{healthcheck, HEALTHCHECK_PATH};
use crate::http::instance::ServerInstance;
use crate::http::middleware::{compression_layer, cookie_parser, json_parser, urlencoded_parser};
use crate::reload::{LogReloads, ReloadCoordinator, SourceWatcher};
use crate::security::csp::{ContentSecurityPolicy, CspError};
use crate::security::headers::SecurityHeaders;
use crate::security::no_cache;

/// Setting holding the CSP directive mapping.
pub const CSP_KEY: &str = "contentSecurityPolicy";

/// Stage names, in registration order.
pub mod stages {
    pub const COOKIE_PARSER: &str = "cookie-parser";
    pub const URLENCODED: &str = "urlencoded";
    pub const JSON: &str = "json";
    pub const COMPRESSION: &str = "compression";
    pub const SECURITY_HEADERS: &str = "security-headers";
    pub const NO_CACHE: &str = "no-cache";
    pub const CONTENT_SECURITY_POLICY: &str = "content-security-policy";

    pub const ALL: [&str; 7] = [
        COOKIE_PARSER,
        URLENCODED,
        JSON,
        COMPRESSION,
        SECURITY_HEADERS,
        NO_CACHE,
        CONTENT_SECURITY_POLICY,
    ];
}

#[derive(Debug, Error)]
pub enum ConfigureError {
    #[error("required configuration key '{key}' is missing")]
    ConfigurationMissing { key: &'static str },

    #[error("configuration key '{key}' is invalid: {reason}")]
    ConfigurationInvalid {
        key: &'static str,
        #[source]
        reason: CspError,
    },
}

/// Attaches the standard middleware chain to server instances.
pub struct ServerConfigurator {
    mode: Mode,
    settings: Settings,
    coordinator: Arc<dyn ReloadCoordinator>,
    watcher: Option<SourceWatcher>,
}

impl ServerConfigurator {
    /// Create a configurator. Source changes are only logged until
    /// [`with_coordinator`](Self::with_coordinator) installs a coordinator.
    pub fn new(mode: Mode, settings: Settings) -> Self {
        Self {
            mode,
            settings,
            coordinator: Arc::new(LogReloads),
            watcher: None,
        }
    }

    pub fn with_coordinator(mut self, coordinator: Arc<dyn ReloadCoordinator>) -> Self {
        self.coordinator = coordinator;
        self
    }

    /// Use an already running watcher instead of starting one.
    pub fn with_watcher(mut self, watcher: SourceWatcher) -> Self {
        self.watcher = Some(watcher);
        self
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn watcher(&self) -> Option<&SourceWatcher> {
        self.watcher.as_ref()
    }

    /// Attach the middleware chain and liveness route to `server`.
    ///
    /// Resolves with the same instance.
    ///
    /// # Errors
    /// `ConfigurationMissing` when the CSP setting is absent and
    /// `ConfigurationInvalid` when it cannot be rendered. In both cases the
    /// cookie and body parsers are already attached and nothing else is.
    pub async fn configure<'a>(
        &mut self,
        server: &'a mut ServerInstance,
    ) -> Result<&'a mut ServerInstance, ConfigureError> {
        let body = self.settings.body.clone();
        let form_body = body.clone();
        server
            .use_stage(stages::COOKIE_PARSER, |router| router.layer(from_fn(cookie_parser)))
            .use_stage(stages::URLENCODED, move |router| {
                // gzip/deflate/br/zstd bodies are inflated for both parsers;
                // other encodings get 415.
                router
                    .layer(from_fn_with_state(form_body, urlencoded_parser))
                    .layer(RequestDecompressionLayer::new())
            })
            .use_stage(stages::JSON, move |router| {
                router.layer(from_fn_with_state(body, json_parser))
            });

        let directives = self
            .settings
            .content_security_policy
            .as_ref()
            .ok_or(ConfigureError::ConfigurationMissing { key: CSP_KEY })?;
        let csp = ContentSecurityPolicy::from_directives(directives)
            .map_err(|reason| ConfigureError::ConfigurationInvalid { key: CSP_KEY, reason })?;

        let compression = compression_layer(&self.settings.compression);
        let headers = SecurityHeaders::for_mode(self.mode);
        server
            .use_stage(stages::COMPRESSION, move |router| router.layer(compression))
            .use_stage(stages::SECURITY_HEADERS, move |router| headers.apply(router))
            .use_stage(stages::NO_CACHE, no_cache::apply)
            .use_stage(stages::CONTENT_SECURITY_POLICY, move |router| csp.apply(router))
            .get(HEALTHCHECK_PATH, healthcheck);

        if !self.mode.is_production() {
            self.ensure_watcher();
        }

        tracing::info!(
            instance = %server.id(),
            mode = %self.mode,
            frame_guard = headers.frame_guard(),
            watching = self.watcher.is_some(),
            "Server configured"
        );
        Ok(server)
    }

    fn ensure_watcher(&mut self) {
        if self.watcher.is_some() {
            return;
        }
        let root = Path::new(&self.settings.watch.root);
        match SourceWatcher::start(root, self.coordinator.clone()) {
            Ok(watcher) => self.watcher = Some(watcher),
            Err(e) => tracing::warn!(error = %e, "Source watcher not started; hot reload disabled"),
        }
    }
}
