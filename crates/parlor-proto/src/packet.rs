use crate::{header::Header, msg_id::MsgId};

/// A borrowed view of one decoded frame: header plus payload slice.
#[derive(Debug, Clone, Copy)]
pub struct PacketView<'a> {
    pub header: Header,
    pub payload: &'a [u8],
}

impl<'a> PacketView<'a> {
    pub fn new(header: Header, payload: &'a [u8]) -> Self {
        Self { header, payload }
    }

    /// Resolve the header's message id.
    ///
    /// Returns `None` for ids this build does not know; the consumer is
    /// expected to drop such packets with a diagnostic rather than fail
    /// the link.
    pub fn msg_id(&self) -> Option<MsgId> {
        MsgId::from_repr(self.header.msg_id)
    }
}
