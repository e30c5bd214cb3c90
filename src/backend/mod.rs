//! Backend Module
//!
//! All server-side code: the WebSocket session layer bridging the wire
//! protocol to the shared editing engine, and the HTTP server around it.
//!
//! # Architecture
//!
//! The backend is organized into focused submodules:
//!
//! - **`server`** - Server initialization, application state, configuration
//! - **`routes`** - HTTP route configuration and router assembly
//! - **`session`** - Event coalescing and replay: queue, classifier, recorder, orchestrator
//! - **`doc`** - Document collaborator surface: brokers, registry, accessor trait
//! - **`realtime`** - WebSocket connections and per-connection sender tasks
//! - **`error`** - Backend-specific error types
//!
//! # Module Structure
//!
//! ```
//! backend/
//! ├── mod.rs      - Module exports and documentation
//! ├── server/     - Server initialization and state
//! ├── routes/     - Route configuration
//! ├── session/    - Event coalescing and replay subsystem
//! ├── doc/        - Document brokers and registry
//! ├── realtime/   - WebSocket endpoint
//! └── error/      - Error types
//! ```
//!
//! # Concurrency Model
//!
//! Two independent mutual-exclusion domains:
//!
//! - the **document lock** (one `tokio::sync::Mutex<DocumentBroker>` per
//!   document) guards session fields, classification and forwarding
//!   decisions for every viewer of that document;
//! - each connection's **queue lock** (private to `SenderQueue`) guards
//!   only that queue's deque and stop flag.
//!
//! They are deliberately separate: a slow socket blocks neither engine
//! callbacks nor the other viewers, and callback handling never waits on
//! network I/O.

/// Server setup and configuration
pub mod server;

/// Route configuration
pub mod routes;

/// Event coalescing and replay subsystem
pub mod session;

/// Document brokers and registry
pub mod doc;

/// WebSocket connections
pub mod realtime;

/// Backend error types
pub mod error;

/// Re-export commonly used types
pub use doc::{DocumentBroker, DocumentRegistry};
pub use error::BackendError;
pub use server::create_app;
pub use session::{Session, SenderQueue, StateRecorder};
