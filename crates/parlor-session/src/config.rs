use std::time::Duration;

/// Default TCP port for hosting and joining.
pub const DEFAULT_PORT: u16 = 5555;

/// Tunables for session establishment and the simulation tick.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long a hosting peer waits for someone to join.
    pub accept_timeout: Duration,

    /// How long a joining peer waits for the TCP connect to complete.
    pub connect_timeout: Duration,

    /// How long either side waits for the peer's handshake after the
    /// socket is up.
    pub handshake_timeout: Duration,

    /// Simulation tick period. Snake paces its movement separately on top
    /// of this.
    pub tick_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            accept_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            handshake_timeout: Duration::from_secs(5),
            tick_interval: Duration::from_millis(16),
        }
    }
}
