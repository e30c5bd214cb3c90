//! Coedit - Collaborative Document-Editing Session Server
//!
//! Coedit is the session layer of a collaborative document-editing
//! server: one WebSocket control channel per connected user, bridging a
//! line-oriented text/binary wire protocol to a stateful editing engine
//! shared by multiple simultaneous viewers.
//!
//! # Overview
//!
//! The core of the crate is the event coalescing and replay subsystem:
//!
//! - an outbound per-connection queue that deduplicates high-frequency
//!   update notifications (tile renders, cursor moves, progress values)
//!   before they reach the network, and
//! - an inactivity-aware recorder that buffers state-change notifications
//!   for a user who has stopped interacting, replaying a consistent,
//!   minimal resync on reactivation instead of a flood of stale messages.
//!
//! The editing engine itself (loading, rendering, editing, saving) is an
//! external collaborator, consumed through the narrow
//! [`backend::doc::DocumentAccessor`] surface and the engine-event
//! delivery methods on [`backend::doc::DocumentBroker`].
//!
//! # Module Structure
//!
//! - **`shared`** - Wire-level types usable by any client: engine events,
//!   outbound messages, payload decoding, shared errors
//! - **`backend`** - The server: session layer, document brokers,
//!   WebSocket endpoint, configuration and routing
//!
//! # Usage
//!
//! ```rust,no_run
//! use coedit::backend::server::{create_app, ServerConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let app = create_app(ServerConfig::default());
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

/// Types shared with clients of the wire protocol
pub mod shared;

/// Server-side code
pub mod backend;
