//! Shared Module
//!
//! Types and decoders shared between the server and any client of the wire
//! protocol: engine callback events, outbound messages, payload decoding
//! and the errors those can produce. Everything here is transport-agnostic.

/// Outbound message data structures
pub mod message;

/// Engine callback events
pub mod event;

/// Shared error types
pub mod error;

/// Wire protocol payload decoding
pub mod protocol;

/// Re-export commonly used types for convenience
pub use error::SharedError;
pub use event::{EngineEvent, EventType};
pub use message::{Command, DedupKey, Frame, OutboundMessage, TileKey};
