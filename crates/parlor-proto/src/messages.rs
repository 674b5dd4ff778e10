use crate::msg_id::MsgId;
use serde::de::DeserializeOwned;

pub mod pong;
pub mod session;
pub mod snake;
pub mod tictactoe;

/// A trait for all session protocol messages.
///
/// Each message type declares its associated `MsgId`, enabling automatic
/// header construction during encoding and id checking during decoding.
pub trait Message: serde::Serialize + DeserializeOwned + Send + 'static {
    /// Returns the message identifier for this message type.
    fn msg_id() -> MsgId;
}
