//! Simulation error taxonomy
//!
//! Most per-tick invariants hold by construction and are not defensively
//! checked; the variants here cover the few contract violations the core
//! can actually surface to a caller.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GameError {
    /// Visibility levels form a fixed closed set registered at startup.
    /// Querying an unregistered level is a programming error.
    #[error("zoom level {zoom} is not registered with the visibility grid")]
    InvalidZoomLevel { zoom: u32 },

    /// The object id namespace is full. Fatal for this simulation instance;
    /// under designed capacity limits this indicates an id leak.
    #[error("object id namespace exhausted ({capacity} ids)")]
    CapacityExhausted { capacity: usize },

    /// Snapshot/update encoding failed (opaque serializer boundary).
    #[error("encode failed: {0}")]
    Encode(String),
}
