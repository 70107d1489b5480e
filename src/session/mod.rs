//! Session management module.
//!
//! This module owns the lifecycle of MCP sessions: identification, the
//! registry that enforces capacity and idle expiry, and the background
//! sweeper that reclaims idle sessions.

mod clock;
mod id;
mod registry;
mod sweeper;

pub use clock::{Clock, ManualClock, SystemClock};
pub use id::SessionId;
pub use registry::{CloseObserver, RegistryConfig, Session, SessionRegistry, SessionTransport};
pub use sweeper::{spawn_sweeper, SweeperHandle};
