use serde::{Deserialize, Serialize};

use crate::{messages::Message, msg_id::MsgId};

/// Sender's own paddle position, sent by both sides every tick.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaddleUpdate {
    pub paddle_y: i32,
}

impl Message for PaddleUpdate {
    fn msg_id() -> MsgId {
        MsgId::PaddleUpdate
    }
}

/// Authoritative ball/score frame, host to client, every tick.
///
/// Fields are sender-relative: `paddle_y` is the host's paddle and
/// `player_score` the host's score. The client swaps perspectives when it
/// applies the frame.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct BallFrame {
    pub paddle_y: i32,
    pub ball_x: i32,
    pub ball_y: i32,
    pub player_score: u32,
    pub opponent_score: u32,
}

impl Message for BallFrame {
    fn msg_id() -> MsgId {
        MsgId::BallFrame
    }
}
