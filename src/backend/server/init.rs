/**
 * Server Initialization
 *
 * Builds the application: state creation and route configuration.
 *
 * # Initialization Process
 *
 * 1. Create the document registry (empty; documents open on first
 *    connection and close with their last session)
 * 2. Create the application state from the effective configuration
 * 3. Create and configure the router
 *
 * Nothing here touches the network; the binary binds and serves the
 * returned router.
 */
use axum::Router;

use crate::backend::routes::router::create_router;
use crate::backend::server::config::ServerConfig;
use crate::backend::server::state::AppState;

/// Create and configure the Axum application.
pub fn create_app(config: ServerConfig) -> Router<()> {
    tracing::info!("Initializing coedit session server");

    let app_state = AppState::new(config);
    let app = create_router(app_state);

    tracing::info!("Router configured");
    app
}
