//! The session driver task and the collaborator surfaces.
//!
//! The driver owns everything after the handshake: it runs a
//! `tokio::select!` loop over the link's event channel, the local command
//! channel and a fixed-rate tick, and it is the *only* execution context
//! that ever mutates game state. The receiver loop and the UI layer just
//! enqueue; the published snapshot cell is the single read-only export.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use parlor_proto::{
    codec::encode_message, messages::session::GameSelect, msg_id::MsgId,
};
use tokio::sync::{mpsc, oneshot};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::{
    config::SessionConfig,
    error::SessionError,
    framing::PacketOwned,
    games::{GameResult, GameSnapshot, GameSync, GameVariant, Outbound, PlayerInput, build_engine},
    link::{self, LinkEvent, PeerLink},
    session::{AuthorityRole, SessionMachine, SessionPhase},
};

/// How to bring the peer link up.
#[derive(Debug, Clone, Copy)]
pub enum StartMode {
    /// Bind, listen and accept one peer; this side becomes the host.
    Host { port: u16 },
    /// Connect to a hosting peer; this side becomes the client.
    Join { addr: SocketAddr },
}

/// Local intents fed into the driver.
#[derive(Debug, Clone, Copy)]
pub enum SessionCommand {
    Input(PlayerInput),
    SelectGame(GameVariant),
    Exit,
}

/// Emitted to the stats collaborator when a played session ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionReport {
    pub variant: GameVariant,
    pub result: GameResult,
}

struct Shared {
    phase: Mutex<SessionPhase>,
    snapshot: Mutex<Option<GameSnapshot>>,
    peer_name: String,
}

/// The collaborator surface handed to the UI layer.
///
/// All methods are non-blocking: reads copy out of the published cells,
/// writes enqueue into the driver's bounded command queue.
#[derive(Clone)]
pub struct SessionHandle {
    shared: Arc<Shared>,
    command_tx: mpsc::Sender<SessionCommand>,
    role: AuthorityRole,
}

impl SessionHandle {
    pub fn phase(&self) -> SessionPhase {
        *self.shared.phase.lock()
    }

    /// The reconciled game state, `None` until a game has settled.
    /// Intended to be read once per render.
    pub fn snapshot(&self) -> Option<GameSnapshot> {
        self.shared.snapshot.lock().clone()
    }

    pub fn peer_name(&self) -> &str {
        &self.shared.peer_name
    }

    pub fn role(&self) -> AuthorityRole {
        self.role
    }

    /// Queue a local input intent for the next tick.
    pub fn submit_input(&self, input: PlayerInput) {
        if self.command_tx.try_send(SessionCommand::Input(input)).is_err() {
            debug!(?input, "input dropped, command queue full or session over");
        }
    }

    /// Pick a game. Only honored while the session is selecting.
    pub fn select_game(&self, variant: GameVariant) {
        if self
            .command_tx
            .try_send(SessionCommand::SelectGame(variant))
            .is_err()
        {
            warn!(%variant, "game selection dropped, session is gone");
        }
    }

    /// Request session teardown.
    pub fn exit(&self) {
        if self.command_tx.try_send(SessionCommand::Exit).is_err() {
            debug!("exit request dropped, session already gone");
        }
    }
}

/// Establish a session end to end: link bring-up, handshake, driver.
///
/// Returns the driver (to be spawned), the UI handle, and the receiver for
/// the final [`SessionReport`]. The report resolves only for sessions that
/// actually reached play; tearing down earlier just drops the sender.
pub async fn start(
    mode: StartMode,
    username: &str,
    config: SessionConfig,
) -> Result<(SessionDriver, SessionHandle, oneshot::Receiver<SessionReport>), SessionError> {
    let (role, link, events) = match mode {
        StartMode::Host { port } => {
            let (link, events) = link::host(port, &config).await?;
            (AuthorityRole::Host, link, events)
        }
        StartMode::Join { addr } => {
            let (link, events) = link::join(addr, &config).await?;
            (AuthorityRole::Client, link, events)
        }
    };
    start_with_link(role, link, events, username, config).await
}

/// Run the handshake over an already-established link and build the
/// driver. Public so tests and embedders can bring up the link themselves.
pub async fn start_with_link(
    role: AuthorityRole,
    link: PeerLink,
    mut events: mpsc::Receiver<LinkEvent>,
    username: &str,
    config: SessionConfig,
) -> Result<(SessionDriver, SessionHandle, oneshot::Receiver<SessionReport>), SessionError> {
    let mut machine = SessionMachine::new();
    machine.advance(SessionPhase::Handshaking);

    let peer_name = match link::exchange_handshake(&link, &mut events, username, &config).await {
        Ok(name) => name,
        Err(e) => {
            machine.advance(SessionPhase::Idle);
            return Err(e);
        }
    };
    machine.advance(SessionPhase::Selecting);

    let shared = Arc::new(Shared {
        phase: Mutex::new(SessionPhase::Selecting),
        snapshot: Mutex::new(None),
        peer_name,
    });
    let (command_tx, command_rx) = mpsc::channel(64);
    let (report_tx, report_rx) = oneshot::channel();

    let handle = SessionHandle {
        shared: shared.clone(),
        command_tx,
        role,
    };
    let driver = SessionDriver {
        machine,
        role,
        config,
        link,
        events,
        commands: command_rx,
        shared,
        report_tx: Some(report_tx),
        engine: None,
        pending_inputs: Vec::new(),
        seq: 1,
    };
    Ok((driver, handle, report_rx))
}

/// Drives one session from game selection to termination.
pub struct SessionDriver {
    machine: SessionMachine,
    role: AuthorityRole,
    config: SessionConfig,
    link: PeerLink,
    events: mpsc::Receiver<LinkEvent>,
    commands: mpsc::Receiver<SessionCommand>,
    shared: Arc<Shared>,
    report_tx: Option<oneshot::Sender<SessionReport>>,
    engine: Option<Box<dyn GameSync>>,
    pending_inputs: Vec<PlayerInput>,
    seq: u32,
}

impl SessionDriver {
    pub fn role(&self) -> AuthorityRole {
        self.role
    }

    /// Run the session to completion. Never panics on link trouble; every
    /// exit path converges on `Terminated` with the link closed.
    pub async fn run(mut self) {
        let mut tick = tokio::time::interval(self.config.tick_interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let reason = loop {
            tokio::select! {
                // Drain peer traffic before local work so remote state is
                // never a tick staler than it has to be.
                biased;

                event = self.events.recv() => match event {
                    Some(LinkEvent::Packet(packet)) => {
                        if let Err(reason) = self.handle_packet(packet).await {
                            break reason;
                        }
                    }
                    Some(LinkEvent::Disconnected { reason }) => break reason,
                    None => break "link task exited".to_string(),
                },

                command = self.commands.recv() => match command {
                    Some(SessionCommand::Input(input)) => self.pending_inputs.push(input),
                    Some(SessionCommand::SelectGame(variant)) => {
                        if let Err(reason) = self.handle_local_select(variant).await {
                            break reason;
                        }
                    }
                    Some(SessionCommand::Exit) => break "local exit".to_string(),
                    None => break "all session handles dropped".to_string(),
                },

                _ = tick.tick() => {
                    if let Err(reason) = self.step_tick().await {
                        break reason;
                    }
                }
            }
        };

        self.terminate(reason);
    }

    /// One fixed-rate tick: drain queued local inputs into the engine, run
    /// the authoritative step, send what the engine produced, publish the
    /// snapshot.
    async fn step_tick(&mut self) -> Result<(), String> {
        let Some(engine) = self.engine.as_mut() else {
            // Inputs cannot mean anything before a game settles.
            self.pending_inputs.clear();
            return Ok(());
        };

        let mut outbound = Vec::new();
        for input in self.pending_inputs.drain(..) {
            if let Some(out) = engine.apply_local_input(input) {
                outbound.push(out);
            }
        }
        outbound.extend(engine.tick_if_authoritative(Instant::now()));

        *self.shared.snapshot.lock() = Some(engine.snapshot());

        for out in outbound {
            self.send_outbound(&out).await?;
        }
        Ok(())
    }

    async fn handle_packet(&mut self, packet: PacketOwned) -> Result<(), String> {
        match packet.msg_id() {
            None => {
                warn!(raw = packet.raw_msg_id(), "dropping message of unknown kind");
                Ok(())
            }
            Some(MsgId::Handshake) => {
                warn!("dropping stray handshake after session setup");
                Ok(())
            }
            Some(MsgId::GameSelect) => self.handle_remote_select(&packet),
            Some(_) => match self.engine.as_mut() {
                Some(engine) => engine
                    .apply_remote_message(&packet)
                    .map_err(|e| format!("protocol error: {e}")),
                None => {
                    warn!(
                        raw = packet.raw_msg_id(),
                        "dropping game message before a game settled"
                    );
                    Ok(())
                }
            },
        }
    }

    /// A selection from the peer. First settled selection wins; a later
    /// conflicting one is advisory noise and dropped.
    fn handle_remote_select(&mut self, packet: &PacketOwned) -> Result<(), String> {
        if self.machine.phase() != SessionPhase::Selecting {
            debug!("dropping game selection, one already settled");
            return Ok(());
        }
        let select: GameSelect = packet
            .decode()
            .map_err(|e| format!("protocol error: {e}"))?;
        let Some(variant) = GameVariant::from_index(select.index) else {
            warn!(index = select.index, "dropping out-of-range game selection");
            return Ok(());
        };
        info!(%variant, "peer selected the game");
        self.enter_game(variant);
        Ok(())
    }

    async fn handle_local_select(&mut self, variant: GameVariant) -> Result<(), String> {
        if self.machine.phase() != SessionPhase::Selecting {
            warn!(%variant, "ignoring game selection outside the selecting phase");
            return Ok(());
        }
        let select = GameSelect {
            index: variant.index(),
        };
        let frame = encode_message(&select, self.next_seq())
            .map_err(|e| format!("protocol error: {e}"))?;
        self.link
            .send_frame(frame)
            .await
            .map_err(|e| format!("{e}"))?;

        info!(%variant, "selected the game");
        self.enter_game(variant);
        Ok(())
    }

    fn enter_game(&mut self, variant: GameVariant) {
        let engine = build_engine(variant, self.role);
        *self.shared.snapshot.lock() = Some(engine.snapshot());
        self.engine = Some(engine);
        self.machine.advance(SessionPhase::InSession);
        *self.shared.phase.lock() = SessionPhase::InSession;
    }

    async fn send_outbound(&mut self, out: &Outbound) -> Result<(), String> {
        let frame = out
            .encode(self.next_seq())
            .map_err(|e| format!("protocol error: {e}"))?;
        self.link.send_frame(frame).await.map_err(|e| format!("{e}"))
    }

    fn next_seq(&mut self) -> u32 {
        let seq = self.seq;
        self.seq = self.seq.wrapping_add(1);
        seq
    }

    fn terminate(mut self, reason: String) {
        info!(%reason, "session terminated");
        self.machine.advance(SessionPhase::Terminated);
        *self.shared.phase.lock() = SessionPhase::Terminated;
        // Closing the link is what stops the receiver loop; doing it twice
        // is harmless.
        self.link.close();

        if let Some(engine) = self.engine.as_ref() {
            *self.shared.snapshot.lock() = Some(engine.snapshot());
            if let Some(tx) = self.report_tx.take() {
                let _ = tx.send(SessionReport {
                    variant: engine.variant(),
                    result: engine.result(),
                });
            }
        }
    }
}
