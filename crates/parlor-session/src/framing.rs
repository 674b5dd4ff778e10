use bytes::{Buf, Bytes, BytesMut};
use parlor_proto::codec::{decode_payload, try_decode_frames};
use parlor_proto::error::ProtoError;
use parlor_proto::header::Header;
use parlor_proto::messages::Message;
use parlor_proto::msg_id::MsgId;
use parlor_proto::packet::PacketView;

/// A single decoded frame that owns its payload bytes.
/// Safe to move across tasks/channels.
#[derive(Debug, Clone)]
pub struct PacketOwned {
    pub header: Header,
    pub payload: Bytes,
}

impl PacketOwned {
    /// Resolve the header's message id, `None` for unknown ids.
    pub fn msg_id(&self) -> Option<MsgId> {
        MsgId::from_repr(self.header.msg_id)
    }

    pub fn raw_msg_id(&self) -> u8 {
        self.header.msg_id
    }

    /// Borrow this packet as a [`PacketView`] for payload decoding.
    pub fn as_view(&self) -> PacketView<'_> {
        PacketView::new(self.header, &self.payload)
    }

    /// Decode the payload as a specific message type.
    pub fn decode<T: Message>(&self) -> Result<T, ProtoError> {
        decode_payload(&self.as_view())
    }
}

/// Receive-side frame reassembly:
/// - keeps an internal receive buffer (`BytesMut`)
/// - decodes as many frames as possible
/// - returns owned packets and keeps the remaining bytes for the next read
pub struct TcpFramer {
    buf: BytesMut,
}

impl TcpFramer {
    /// Create a framer with an initial buffer capacity.
    pub fn new(initial_capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(initial_capacity),
        }
    }

    /// Get mutable access to the internal buffer for socket reads.
    ///
    /// Typical usage:
    /// - `framer.buf_mut().reserve(n)`
    /// - `socket.read_buf(framer.buf_mut()).await?`
    pub fn buf_mut(&mut self) -> &mut BytesMut {
        &mut self.buf
    }

    /// Try to decode as many frames as possible from the current buffer.
    ///
    /// On success:
    /// - returns a vector of `PacketOwned`
    /// - consumes the decoded bytes from the internal buffer
    pub fn drain_packets(&mut self) -> Result<Vec<PacketOwned>, ProtoError> {
        // Borrowed views must be copied into owned bytes before the buffer
        // is advanced.
        let (views, consumed) = try_decode_frames(&self.buf)?;

        let mut out = Vec::with_capacity(views.len());
        for v in views {
            out.push(PacketOwned {
                header: v.header,
                payload: Bytes::copy_from_slice(v.payload),
            });
        }
        self.buf.advance(consumed);

        Ok(out)
    }
}
