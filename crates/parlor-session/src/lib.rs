//! Peer session and state-synchronization layer.
//!
//! This crate pairs two processes over one TCP connection and keeps a small
//! shared game consistent in real time.
//!
//! # Architecture
//!
//! - [`link`]: peer link establishment (host/join), handshake, and the
//!   per-link reader/writer tasks
//! - [`framing`]: receive-side frame reassembly
//! - [`session`]: session lifecycle state machine
//! - [`games`]: per-game synchronization engines
//! - [`driver`]: the session driver task and the collaborator surface for
//!   the UI and stats layers
//! - [`error`]: error types

pub mod config;
pub mod driver;
pub mod error;
pub mod framing;
pub mod games;
pub mod link;
pub mod session;

// Re-export commonly used types
pub use config::{DEFAULT_PORT, SessionConfig};
pub use driver::{
    SessionCommand, SessionDriver, SessionHandle, SessionReport, StartMode, start,
    start_with_link,
};
pub use error::SessionError;
pub use framing::{PacketOwned, TcpFramer};
pub use games::{GameResult, GameSnapshot, GameVariant, PlayerInput};
pub use link::{LinkEvent, PeerLink};
pub use session::{AuthorityRole, SessionMachine, SessionPhase};
