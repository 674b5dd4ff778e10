use serde::{Deserialize, Serialize};

use crate::{messages::Message, msg_id::MsgId};

/// One grid cell. The board is 40x30 cells.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// The direction that would make a snake fold back on itself.
    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}

/// Sender's new heading, sent on every local direction change.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectionChange {
    pub direction: Direction,
}

impl Message for DirectionChange {
    fn msg_id() -> MsgId {
        MsgId::DirectionChange
    }
}

/// Authoritative full-board frame, host to client, every movement tick.
///
/// The host composes the frame already swapped into the *receiver's*
/// perspective: `player_snake` is the client's own snake, `player_score`
/// the client's score, and so on. The client overwrites its entire view
/// with each frame, so reapplying one is harmless.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SnakeFrame {
    pub player_snake: Vec<Cell>,
    pub opponent_snake: Vec<Cell>,
    pub food: Cell,
    pub player_score: u32,
    pub opponent_score: u32,
    pub player_alive: bool,
    pub opponent_alive: bool,
    pub game_over: bool,
}

impl Message for SnakeFrame {
    fn msg_id() -> MsgId {
        MsgId::SnakeFrame
    }
}
