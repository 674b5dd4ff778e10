//! Peer link establishment and the per-link reader/writer tasks.
//!
//! A session has exactly one [`PeerLink`]: the hosting side binds, listens
//! and accepts a single inbound connection; the joining side connects.
//! After the socket is up both sides exchange a handshake with a bounded
//! wait, then the link carries framed game traffic for the rest of the
//! session.

use std::net::SocketAddr;

use bytes::Bytes;
use parlor_proto::{
    codec::encode_message, limits::RX_BUFFER_SIZE, messages::session::Handshake, msg_id::MsgId,
};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{
        TcpListener, TcpStream,
        tcp::{OwnedReadHalf, OwnedWriteHalf},
    },
    sync::mpsc,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::{config::SessionConfig, error::SessionError, framing::TcpFramer};

pub use crate::framing::PacketOwned;

/// Events produced by a link's reader task.
#[derive(Debug)]
pub enum LinkEvent {
    /// One decoded in-order frame from the peer.
    Packet(PacketOwned),
    /// The link is dead: peer closed, IO error, protocol error, or local
    /// close. Emitted at most once, and always last.
    Disconnected { reason: String },
}

/// Handle to the single live connection between the two session peers.
///
/// Cheap to clone is not needed; the session driver owns it. Closing is
/// idempotent: the first `close()` cancels both background tasks and shuts
/// the socket down, later calls are no-ops.
#[derive(Debug)]
pub struct PeerLink {
    peer: SocketAddr,
    out_tx: mpsc::Sender<Bytes>,
    cancel: CancellationToken,
}

impl PeerLink {
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// Queue one already-framed message for the writer task.
    pub async fn send_frame(&self, frame: Vec<u8>) -> Result<(), SessionError> {
        self.out_tx
            .send(Bytes::from(frame))
            .await
            .map_err(|_| SessionError::LinkClosed)
    }

    /// Tear the link down. Double close is a no-op.
    pub fn close(&self) {
        self.cancel.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Bind `0.0.0.0:port`, accept exactly one peer within the configured
/// window, and return the live link.
pub async fn host(
    port: u16,
    config: &SessionConfig,
) -> Result<(PeerLink, mpsc::Receiver<LinkEvent>), SessionError> {
    let listener = TcpListener::bind(("0.0.0.0", port))
        .await
        .map_err(|e| SessionError::ConnectFailed(format!("bind failed on port {port}: {e}")))?;
    host_with_listener(listener, config).await
}

/// Accept one peer on an existing listener. Public to let tests and
/// embedders bind their own (e.g. an ephemeral port).
pub async fn host_with_listener(
    listener: TcpListener,
    config: &SessionConfig,
) -> Result<(PeerLink, mpsc::Receiver<LinkEvent>), SessionError> {
    info!("waiting for a peer to join");
    let (stream, peer) = match tokio::time::timeout(config.accept_timeout, listener.accept()).await
    {
        Err(_) => return Err(SessionError::AcceptTimeout(config.accept_timeout)),
        Ok(Err(e)) => return Err(SessionError::ConnectFailed(format!("accept failed: {e}"))),
        Ok(Ok(accepted)) => accepted,
    };
    info!(%peer, "peer connected");
    Ok(spawn_link(stream, peer))
}

/// Connect to a hosting peer with a bounded wait.
pub async fn join(
    addr: SocketAddr,
    config: &SessionConfig,
) -> Result<(PeerLink, mpsc::Receiver<LinkEvent>), SessionError> {
    info!(%addr, "connecting to host");
    let stream = match tokio::time::timeout(config.connect_timeout, TcpStream::connect(addr)).await
    {
        Err(_) => return Err(SessionError::ConnectTimeout(config.connect_timeout)),
        Ok(Err(e)) => {
            return Err(SessionError::ConnectFailed(format!(
                "failed to connect to {addr}: {e}"
            )));
        }
        Ok(Ok(stream)) => stream,
    };
    info!(%addr, "connected");
    Ok(spawn_link(stream, addr))
}

/// Exchange `Handshake` messages in both directions with a bounded wait.
///
/// Sends our username immediately, then requires the peer's handshake to be
/// the first frame received within the window. On any failure the link is
/// closed before returning. Returns the peer's username.
pub async fn exchange_handshake(
    link: &PeerLink,
    events: &mut mpsc::Receiver<LinkEvent>,
    username: &str,
    config: &SessionConfig,
) -> Result<String, SessionError> {
    let result = exchange_handshake_inner(link, events, username, config).await;
    if result.is_err() {
        link.close();
    }
    result
}

async fn exchange_handshake_inner(
    link: &PeerLink,
    events: &mut mpsc::Receiver<LinkEvent>,
    username: &str,
    config: &SessionConfig,
) -> Result<String, SessionError> {
    let hello = Handshake {
        username: username.to_string(),
    };
    link.send_frame(encode_message(&hello, 0)?).await?;

    match tokio::time::timeout(config.handshake_timeout, events.recv()).await {
        Err(_) => Err(SessionError::HandshakeTimeout(config.handshake_timeout)),
        Ok(None) => Err(SessionError::ConnectionLost("link task exited".to_string())),
        Ok(Some(LinkEvent::Disconnected { reason })) => Err(SessionError::ConnectionLost(reason)),
        Ok(Some(LinkEvent::Packet(packet))) => match packet.msg_id() {
            Some(MsgId::Handshake) => {
                let peer: Handshake = packet.decode()?;
                info!(peer = %peer.username, "handshake complete");
                Ok(peer.username)
            }
            _ => Err(SessionError::HandshakeFailed(format!(
                "expected handshake, got msg id {}",
                packet.raw_msg_id()
            ))),
        },
    }
}

fn spawn_link(stream: TcpStream, peer: SocketAddr) -> (PeerLink, mpsc::Receiver<LinkEvent>) {
    let _ = stream.set_nodelay(true);
    let (read_half, write_half) = stream.into_split();

    let (event_tx, event_rx) = mpsc::channel(256);
    let (out_tx, out_rx) = mpsc::channel::<Bytes>(256);
    let cancel = CancellationToken::new();

    tokio::spawn(writer_loop(write_half, out_rx, cancel.clone()));
    tokio::spawn(reader_loop(read_half, event_tx, cancel.clone()));

    (
        PeerLink {
            peer,
            out_tx,
            cancel,
        },
        event_rx,
    )
}

/// Writer task: drains the outbound queue onto the socket.
///
/// Exits on local close, channel close, or write error, then shuts the
/// write half down so the peer sees EOF.
async fn writer_loop(
    mut write: OwnedWriteHalf,
    mut rx: mpsc::Receiver<Bytes>,
    cancel: CancellationToken,
) {
    loop {
        let frame = tokio::select! {
            _ = cancel.cancelled() => break,
            frame = rx.recv() => frame,
        };
        match frame {
            Some(bytes) => {
                trace!("sending {} bytes to peer", bytes.len());
                if let Err(e) = write.write_all(&bytes).await {
                    warn!("write error: {e}");
                    cancel.cancel();
                    break;
                }
            }
            None => {
                debug!("outbound channel closed");
                break;
            }
        }
    }

    let _ = write.shutdown().await;
}

/// Reader task: the receiver loop of the link.
///
/// Continuously reads into the framer, forwards every decoded frame in
/// order, and exits on EOF, IO error, protocol error, or local close. The
/// steady-state read has no timeout of its own; cancelling the link token
/// is the only way to interrupt it.
async fn reader_loop(
    mut read: OwnedReadHalf,
    event_tx: mpsc::Sender<LinkEvent>,
    cancel: CancellationToken,
) {
    let mut framer = TcpFramer::new(8 * 1024);

    let reason = loop {
        // Hard cap to avoid unbounded buffering.
        if framer.buf_mut().len() > RX_BUFFER_SIZE {
            break format!("rx buffer exceeded limit ({RX_BUFFER_SIZE} bytes)");
        }

        framer.buf_mut().reserve(4096);
        let read_res = tokio::select! {
            res = read.read_buf(framer.buf_mut()) => res,
            _ = cancel.cancelled() => break "closed locally".to_string(),
        };

        match read_res {
            Ok(0) => break "peer closed connection".to_string(),
            Ok(n) => trace!("received {n} bytes from peer"),
            Err(e) => break format!("read error: {e}"),
        }

        match framer.drain_packets() {
            Ok(packets) => {
                for packet in packets {
                    if event_tx.send(LinkEvent::Packet(packet)).await.is_err() {
                        // Consumer is gone; stop the link.
                        cancel.cancel();
                        return;
                    }
                }
            }
            Err(e) => break format!("protocol error: {e}"),
        }
    };

    debug!(%reason, "receiver loop exiting");
    // Make sure the writer stops too once the link is dead.
    cancel.cancel();
    let _ = event_tx
        .send(LinkEvent::Disconnected { reason })
        .await;
}
