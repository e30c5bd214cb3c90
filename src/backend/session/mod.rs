//! Session Module
//!
//! The event coalescing and replay subsystem: everything between an
//! engine callback and the frames a connection's sender task writes to
//! the socket.
//!
//! # Module Structure
//!
//! ```
//! session/
//! ├── mod.rs        - Module exports and documentation
//! ├── queue.rs      - Outbound sender queue with enqueue-time dedup
//! ├── classifier.rs - Callback type -> merge policy mapping
//! ├── recorder.rs   - Buffer for events missed while inactive
//! └── session.rs    - Per-user orchestrator and replay sequencing
//! ```
//!
//! # Data Flow
//!
//! ```text
//! engine callback -> Session -> { SenderQueue   (active)
//!                               { StateRecorder (inactive)
//! reactivation: StateRecorder replay -> SenderQueue
//! sender task: SenderQueue -> socket
//! ```
//!
//! The recorder and the queue never reference each other; the session is
//! the only component that moves an event from one to the other. The
//! queue has its own private lock so the network path and the callback
//! path only ever contend on that, never on the document lock.

/// Outbound sender queue with inline deduplication
pub mod queue;

/// Callback classification policies
pub mod classifier;

/// Inactivity event recorder
pub mod recorder;

/// Per-user session orchestration
pub mod session;

// Re-export commonly used types
pub use classifier::{classify, MergePolicy};
pub use queue::SenderQueue;
pub use recorder::StateRecorder;
pub use session::Session;
