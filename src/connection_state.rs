//! Connection lifecycle states
//!
//! The client tracks the WebSocket lifecycle with five states. The numeric
//! codes are stable and exposed for external inspection (dashboards, metric
//! gauges); they are part of the public contract.
//!
//! # State Transitions
//!
//! ```text
//! Idle → Connecting → Connected
//!  ↑         ↑            ↓
//!  └── (give up) ← drop / Closing
//! ```
//!
//! - `connect` enters `Connecting`; a successful open enters `Connected`.
//! - A deliberate `disconnect` enters `Closing` before the close request is
//!   issued, which is what suppresses reconnection when the close lands.
//! - A transport drop with retry budget left re-enters `Connecting` after the
//!   retry delay; an exhausted budget (or a deliberate close) settles in `Idle`.
//! - `Errored` is only entered when no transport capability is available.
//!
//! There is no terminal state: a client that settled in `Idle` (or `Errored`)
//! can be connected again.

/// Connection state with its stable numeric code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ConnState {
    /// Not connected
    Idle = 0,
    /// Transport capability unavailable
    Errored = 1,
    /// Attempting to establish a connection
    Connecting = 2,
    /// Deliberate disconnect requested, close not yet observed
    Closing = 3,
    /// Connected and operational
    Connected = 4,
}

impl ConnState {
    /// Stable numeric code for this state
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl std::fmt::Display for ConnState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ConnState::Idle => "idle",
            ConnState::Errored => "errored",
            ConnState::Connecting => "connecting",
            ConnState::Closing => "closing",
            ConnState::Connected => "connected",
        };
        f.write_str(name)
    }
}
