use strum::FromRepr;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRepr)]
pub enum MsgId {
    Handshake = 1,
    GameSelect = 2,

    PaddleUpdate = 10,
    BallFrame = 11,

    Move = 20,

    DirectionChange = 30,
    SnakeFrame = 31,
}
