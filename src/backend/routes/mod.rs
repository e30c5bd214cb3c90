//! Routes Module
//!
//! HTTP route configuration and router assembly.

/// Main router assembly
pub mod router;

// Re-export commonly used functions
pub use router::create_router;
