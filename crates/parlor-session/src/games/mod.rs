//! Per-game synchronization engines.
//!
//! Each variant implements the same capability set behind [`GameSync`] and
//! is dispatched by the session driver as a boxed trait object. Pong and
//! Snake are host-authoritative: the host runs the only simulation and the
//! client mirrors full snapshots. Tic-Tac-Toe is symmetric: both sides
//! apply the identical move sequence.

pub mod pong;
pub mod snake;
pub mod tictactoe;

use std::time::Instant;

use parlor_proto::{
    codec::encode_message,
    error::ProtoError,
    messages::{
        pong::{BallFrame, PaddleUpdate},
        snake::{DirectionChange, SnakeFrame},
        tictactoe::Move,
    },
};

use crate::{framing::PacketOwned, session::AuthorityRole};

pub use parlor_proto::messages::snake::{Cell, Direction};
pub use pong::PongSnapshot;
pub use snake::SnakeSnapshot;
pub use tictactoe::BoardSnapshot;

/// Board geometry shared by all variants, in pixels.
pub const BOARD_WIDTH: i32 = 800;
pub const BOARD_HEIGHT: i32 = 600;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameVariant {
    Pong,
    TicTacToe,
    Snake,
}

impl GameVariant {
    /// Menu index as carried by `GameSelect`.
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(GameVariant::Pong),
            1 => Some(GameVariant::TicTacToe),
            2 => Some(GameVariant::Snake),
            _ => None,
        }
    }

    pub fn index(self) -> u8 {
        match self {
            GameVariant::Pong => 0,
            GameVariant::TicTacToe => 1,
            GameVariant::Snake => 2,
        }
    }
}

impl std::fmt::Display for GameVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameVariant::Pong => write!(f, "pong"),
            GameVariant::TicTacToe => write!(f, "tic-tac-toe"),
            GameVariant::Snake => write!(f, "snake"),
        }
    }
}

/// A local input intent from the UI layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerInput {
    /// Pong: nudge the own paddle one step up.
    PaddleUp,
    /// Pong: nudge the own paddle one step down.
    PaddleDown,
    /// Tic-Tac-Toe: click a board cell.
    CellClick { row: u8, col: u8 },
    /// Snake: steer the own snake.
    Turn(Direction),
}

/// Session result from the local player's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameResult {
    Win,
    Loss,
    Draw,
}

/// A message an engine wants sent to the peer.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    Paddle(PaddleUpdate),
    Ball(BallFrame),
    Move(Move),
    Turn(DirectionChange),
    Snake(SnakeFrame),
}

impl Outbound {
    pub fn encode(&self, seq: u32) -> Result<Vec<u8>, ProtoError> {
        match self {
            Outbound::Paddle(m) => encode_message(m, seq),
            Outbound::Ball(m) => encode_message(m, seq),
            Outbound::Move(m) => encode_message(m, seq),
            Outbound::Turn(m) => encode_message(m, seq),
            Outbound::Snake(m) => encode_message(m, seq),
        }
    }
}

/// Variant-specific read-only state copy, published once per tick for the
/// UI layer.
#[derive(Debug, Clone, PartialEq)]
pub enum GameSnapshot {
    Pong(PongSnapshot),
    TicTacToe(BoardSnapshot),
    Snake(SnakeSnapshot),
}

/// The capability set every game variant implements.
///
/// The session driver is the only caller, and the only execution context
/// that ever touches an engine, so implementations need no interior
/// synchronization.
pub trait GameSync: Send {
    /// Apply one local input intent. Returns a message to forward to the
    /// peer when the input produced one; inputs that are invalid right now
    /// (not our turn, reverse snake direction, ...) are absorbed silently.
    fn apply_local_input(&mut self, input: PlayerInput) -> Option<Outbound>;

    /// Apply one in-order message from the peer.
    ///
    /// Messages of a foreign kind or with out-of-range fields are dropped
    /// with a diagnostic. An undecodable payload is a protocol error and
    /// fatal to the link.
    fn apply_remote_message(&mut self, packet: &PacketOwned) -> Result<(), ProtoError>;

    /// Advance the simulation if this side owns it. Returns the frames to
    /// send this tick (an authoritative snapshot on the host, periodic
    /// input forwarding on either side).
    fn tick_if_authoritative(&mut self, now: Instant) -> Vec<Outbound>;

    /// Current state copy for the UI.
    fn snapshot(&self) -> GameSnapshot;

    /// Session result if the session ended now.
    fn result(&self) -> GameResult;

    fn variant(&self) -> GameVariant;
}

/// Build the engine for a settled game selection.
pub fn build_engine(variant: GameVariant, role: AuthorityRole) -> Box<dyn GameSync> {
    match variant {
        GameVariant::Pong => Box::new(pong::PongSync::new(role)),
        GameVariant::TicTacToe => Box::new(tictactoe::TicTacToeSync::new(role)),
        GameVariant::Snake => Box::new(snake::SnakeSync::new(role)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variant_indices_round_trip() {
        for variant in [GameVariant::Pong, GameVariant::TicTacToe, GameVariant::Snake] {
            assert_eq!(GameVariant::from_index(variant.index()), Some(variant));
        }
        assert_eq!(GameVariant::from_index(3), None);
    }
}
