use serde::{Deserialize, Serialize};

use crate::{messages::Message, msg_id::MsgId};

/// One placed piece. Sent by whichever side made the move.
///
/// Application is not idempotent: replaying the same `Move` places the
/// piece twice. The link's in-order exactly-once delivery is what keeps
/// both boards identical.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Move {
    pub row: u8,
    pub col: u8,
    /// 1 = X (host), 2 = O (client).
    pub piece: u8,
}

impl Message for Move {
    fn msg_id() -> MsgId {
        MsgId::Move
    }
}
