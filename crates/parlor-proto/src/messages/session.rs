use serde::{Deserialize, Serialize};

use crate::{messages::Message, msg_id::MsgId};

/// First message on a fresh link, sent by both sides exactly once.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Handshake {
    pub username: String,
}

impl Message for Handshake {
    fn msg_id() -> MsgId {
        MsgId::Handshake
    }
}

/// Announce the locally picked game.
///
/// Selection is advisory: both peers present the same menu, and whichever
/// selection settles first on a given side wins there. Out-of-range
/// indices are dropped by the receiver.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameSelect {
    /// 0 = Pong, 1 = Tic-Tac-Toe, 2 = Snake.
    pub index: u8,
}

impl Message for GameSelect {
    fn msg_id() -> MsgId {
        MsgId::GameSelect
    }
}
