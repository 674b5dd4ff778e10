//! Tic-Tac-Toe synchronization engine (symmetric turn-based).
//!
//! Both sides hold the full board and apply the identical `Move` sequence:
//! local clicks on our turn, remote moves on the peer's. Turn ownership is
//! enforced on the local input path only; there is no arbiter for the
//! remote side, so a misbehaving peer is trusted by design.

use std::time::Instant;

use parlor_proto::{error::ProtoError, messages::tictactoe::Move, msg_id::MsgId};
use tracing::warn;

use crate::{framing::PacketOwned, session::AuthorityRole};

use super::{GameResult, GameSnapshot, GameSync, GameVariant, Outbound, PlayerInput};

pub const X_PIECE: u8 = 1;
pub const O_PIECE: u8 = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardSnapshot {
    /// 0 = empty, 1 = X, 2 = O.
    pub board: [[u8; 3]; 3],
    /// Piece whose turn it is.
    pub current_player: u8,
    /// The local player's piece.
    pub own_piece: u8,
    /// 0 while undecided.
    pub winner: u8,
    pub game_over: bool,
}

pub struct TicTacToeSync {
    own_piece: u8,
    board: [[u8; 3]; 3],
    current_player: u8,
    winner: u8,
    game_over: bool,
}

impl TicTacToeSync {
    pub fn new(role: AuthorityRole) -> Self {
        Self {
            // The host plays X and X opens.
            own_piece: match role {
                AuthorityRole::Host => X_PIECE,
                AuthorityRole::Client => O_PIECE,
            },
            board: [[0; 3]; 3],
            current_player: X_PIECE,
            winner: 0,
            game_over: false,
        }
    }

    fn toggle_turn(&mut self) {
        self.current_player = if self.current_player == X_PIECE {
            O_PIECE
        } else {
            X_PIECE
        };
    }

    /// Scan for a verdict: rows, then columns, then the two diagonals,
    /// then a full-board draw — in that order.
    fn check_winner(&mut self) {
        for row in &self.board {
            if row[0] != 0 && row[0] == row[1] && row[1] == row[2] {
                self.winner = row[0];
                self.game_over = true;
                return;
            }
        }

        for col in 0..3 {
            if self.board[0][col] != 0
                && self.board[0][col] == self.board[1][col]
                && self.board[1][col] == self.board[2][col]
            {
                self.winner = self.board[0][col];
                self.game_over = true;
                return;
            }
        }

        if self.board[0][0] != 0
            && self.board[0][0] == self.board[1][1]
            && self.board[1][1] == self.board[2][2]
        {
            self.winner = self.board[0][0];
            self.game_over = true;
            return;
        }

        if self.board[0][2] != 0
            && self.board[0][2] == self.board[1][1]
            && self.board[1][1] == self.board[2][0]
        {
            self.winner = self.board[0][2];
            self.game_over = true;
            return;
        }

        if self
            .board
            .iter()
            .all(|row| row.iter().all(|&cell| cell != 0))
        {
            self.game_over = true;
        }
    }

    fn apply_move(&mut self, mv: Move) {
        if mv.row > 2 || mv.col > 2 || !(X_PIECE..=O_PIECE).contains(&mv.piece) {
            warn!(?mv, "dropping out-of-range move");
            return;
        }
        // No turn or occupancy check here: the remote side is trusted.
        self.board[mv.row as usize][mv.col as usize] = mv.piece;
        self.toggle_turn();
        self.check_winner();
    }
}

impl GameSync for TicTacToeSync {
    fn apply_local_input(&mut self, input: PlayerInput) -> Option<Outbound> {
        let PlayerInput::CellClick { row, col } = input else {
            warn!(?input, "ignoring input foreign to tic-tac-toe");
            return None;
        };
        if self.game_over
            || self.current_player != self.own_piece
            || row > 2
            || col > 2
            || self.board[row as usize][col as usize] != 0
        {
            return None;
        }

        self.board[row as usize][col as usize] = self.own_piece;
        self.toggle_turn();
        self.check_winner();

        Some(Outbound::Move(Move {
            row,
            col,
            piece: self.own_piece,
        }))
    }

    fn apply_remote_message(&mut self, packet: &PacketOwned) -> Result<(), ProtoError> {
        match packet.msg_id() {
            Some(MsgId::Move) => self.apply_move(packet.decode()?),
            other => warn!(
                ?other,
                raw = packet.raw_msg_id(),
                "dropping message foreign to tic-tac-toe"
            ),
        }
        Ok(())
    }

    fn tick_if_authoritative(&mut self, _now: Instant) -> Vec<Outbound> {
        // Turn-based: nothing is ever simulated or periodically sent.
        Vec::new()
    }

    fn snapshot(&self) -> GameSnapshot {
        GameSnapshot::TicTacToe(BoardSnapshot {
            board: self.board,
            current_player: self.current_player,
            own_piece: self.own_piece,
            winner: self.winner,
            game_over: self.game_over,
        })
    }

    fn result(&self) -> GameResult {
        if self.winner == self.own_piece {
            GameResult::Win
        } else if self.winner != 0 {
            GameResult::Loss
        } else {
            // Full-board draw, or a session abandoned before a verdict.
            GameResult::Draw
        }
    }

    fn variant(&self) -> GameVariant {
        GameVariant::TicTacToe
    }
}
