/**
 * Application State Management
 *
 * This module defines the application state structure and implements the
 * `FromRef` traits for Axum state extraction.
 *
 * # Architecture
 *
 * `AppState` is the central state container: the document registry
 * (every open document and its sessions), the effective server
 * configuration, and the startup timestamp for uptime reporting.
 *
 * # Thread Safety
 *
 * `DocumentRegistry` is internally synchronized and cheap to clone; the
 * remaining fields are immutable after startup.
 *
 * # State Extraction
 *
 * The `FromRef` implementations let handlers extract just the part of
 * the state they use, following Axum's recommended pattern.
 */
use axum::extract::FromRef;
use chrono::{DateTime, Utc};

use crate::backend::doc::DocumentRegistry;
use crate::backend::server::config::ServerConfig;

/// Application state shared by all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Every open document and its sessions.
    pub documents: DocumentRegistry,
    /// Effective configuration the server started with.
    pub config: ServerConfig,
    /// Startup timestamp, for the status endpoint.
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            documents: DocumentRegistry::new(),
            config,
            started_at: Utc::now(),
        }
    }

    /// Seconds since the server started.
    pub fn uptime_seconds(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}

/// Allow handlers to extract the document registry directly.
impl FromRef<AppState> for DocumentRegistry {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.documents.clone()
    }
}

/// Allow handlers to extract the configuration directly.
impl FromRef<AppState> for ServerConfig {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.config.clone()
    }
}
