//! Pong synchronization engine (host-authoritative).
//!
//! The host runs the only ball simulation. Both sides own their paddle
//! locally and report it every tick; the client overwrites ball, host
//! paddle and scores with every authoritative frame it receives.

use std::time::Instant;

use parlor_proto::{
    error::ProtoError,
    messages::pong::{BallFrame, PaddleUpdate},
    msg_id::MsgId,
};
use tracing::warn;

use crate::{framing::PacketOwned, session::AuthorityRole};

use super::{
    BOARD_HEIGHT, BOARD_WIDTH, GameResult, GameSnapshot, GameSync, GameVariant, Outbound,
    PlayerInput,
};

pub const PADDLE_WIDTH: i32 = 15;
pub const PADDLE_HEIGHT: i32 = 100;
pub const PADDLE_SPEED: i32 = 8;
/// Distance of each paddle's inner edge from its wall.
pub const PADDLE_INSET: i32 = 50;
pub const BALL_SIZE: i32 = 15;
pub const BALL_SPEED: i32 = 7;

const MAX_PADDLE_Y: i32 = BOARD_HEIGHT - PADDLE_HEIGHT;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PongSnapshot {
    /// Top-left corner of the local player's paddle.
    pub own_paddle: (i32, i32),
    /// Top-left corner of the peer's paddle.
    pub opponent_paddle: (i32, i32),
    /// Top-left corner of the ball.
    pub ball: (i32, i32),
    pub own_score: u32,
    pub opponent_score: u32,
}

pub struct PongSync {
    role: AuthorityRole,
    own_x: i32,
    opp_x: i32,
    own_y: i32,
    opp_y: i32,
    ball_x: i32,
    ball_y: i32,
    vel_x: i32,
    vel_y: i32,
    own_score: u32,
    opp_score: u32,
}

impl PongSync {
    pub fn new(role: AuthorityRole) -> Self {
        let left_x = PADDLE_INSET;
        let right_x = BOARD_WIDTH - PADDLE_INSET - PADDLE_WIDTH;
        let (own_x, opp_x) = match role {
            AuthorityRole::Host => (left_x, right_x),
            AuthorityRole::Client => (right_x, left_x),
        };
        Self {
            role,
            own_x,
            opp_x,
            own_y: (BOARD_HEIGHT - PADDLE_HEIGHT) / 2,
            opp_y: (BOARD_HEIGHT - PADDLE_HEIGHT) / 2,
            ball_x: (BOARD_WIDTH - BALL_SIZE) / 2,
            ball_y: (BOARD_HEIGHT - BALL_SIZE) / 2,
            // Serve toward the client; only meaningful on the host.
            vel_x: match role {
                AuthorityRole::Host => BALL_SPEED,
                AuthorityRole::Client => -BALL_SPEED,
            },
            vel_y: BALL_SPEED,
            own_score: 0,
            opp_score: 0,
        }
    }

    fn reset_ball(&mut self) {
        self.ball_x = (BOARD_WIDTH - BALL_SIZE) / 2;
        self.ball_y = (BOARD_HEIGHT - BALL_SIZE) / 2;
        self.vel_x = -self.vel_x;
    }

    fn ball_hits_paddle(&self, paddle_x: i32, paddle_y: i32) -> bool {
        self.ball_x < paddle_x + PADDLE_WIDTH
            && self.ball_x + BALL_SIZE > paddle_x
            && self.ball_y < paddle_y + PADDLE_HEIGHT
            && self.ball_y + BALL_SIZE > paddle_y
    }

    /// One authoritative simulation step. Evaluation order is the
    /// tie-break for simultaneous events: wall bounce, paddle bounce, left
    /// bound (client scores), right bound (host scores).
    fn step_ball(&mut self) {
        self.ball_x += self.vel_x;
        self.ball_y += self.vel_y;

        if self.ball_y <= 0 || self.ball_y + BALL_SIZE >= BOARD_HEIGHT {
            self.vel_y = -self.vel_y;
        }

        if self.ball_hits_paddle(self.own_x, self.own_y)
            || self.ball_hits_paddle(self.opp_x, self.opp_y)
        {
            self.vel_x = -self.vel_x;
        }

        if self.ball_x <= 0 {
            self.opp_score += 1;
            self.reset_ball();
        } else if self.ball_x + BALL_SIZE >= BOARD_WIDTH {
            self.own_score += 1;
            self.reset_ball();
        }
    }

    fn apply_paddle_update(&mut self, update: PaddleUpdate) {
        if !(0..=MAX_PADDLE_Y).contains(&update.paddle_y) {
            warn!(paddle_y = update.paddle_y, "dropping out-of-range paddle update");
            return;
        }
        self.opp_y = update.paddle_y;
    }

    fn apply_ball_frame(&mut self, frame: BallFrame) {
        if self.role == AuthorityRole::Host {
            warn!("dropping ball frame from non-authoritative peer");
            return;
        }
        // Full overwrite of everything the host owns; sender-relative
        // scores swap into our perspective.
        if (0..=MAX_PADDLE_Y).contains(&frame.paddle_y) {
            self.opp_y = frame.paddle_y;
        }
        self.ball_x = frame.ball_x;
        self.ball_y = frame.ball_y;
        self.own_score = frame.opponent_score;
        self.opp_score = frame.player_score;
    }
}

impl GameSync for PongSync {
    fn apply_local_input(&mut self, input: PlayerInput) -> Option<Outbound> {
        match input {
            PlayerInput::PaddleUp => {
                self.own_y = (self.own_y - PADDLE_SPEED).max(0);
            }
            PlayerInput::PaddleDown => {
                self.own_y = (self.own_y + PADDLE_SPEED).min(MAX_PADDLE_Y);
            }
            other => warn!(?other, "ignoring input foreign to pong"),
        }
        // The paddle position is reported every tick, not per input.
        None
    }

    fn apply_remote_message(&mut self, packet: &PacketOwned) -> Result<(), ProtoError> {
        match packet.msg_id() {
            Some(MsgId::PaddleUpdate) => self.apply_paddle_update(packet.decode()?),
            Some(MsgId::BallFrame) => self.apply_ball_frame(packet.decode()?),
            other => warn!(?other, raw = packet.raw_msg_id(), "dropping message foreign to pong"),
        }
        Ok(())
    }

    fn tick_if_authoritative(&mut self, _now: Instant) -> Vec<Outbound> {
        let mut out = vec![Outbound::Paddle(PaddleUpdate {
            paddle_y: self.own_y,
        })];

        if self.role == AuthorityRole::Host {
            self.step_ball();
            out.push(Outbound::Ball(BallFrame {
                paddle_y: self.own_y,
                ball_x: self.ball_x,
                ball_y: self.ball_y,
                player_score: self.own_score,
                opponent_score: self.opp_score,
            }));
        }
        out
    }

    fn snapshot(&self) -> GameSnapshot {
        GameSnapshot::Pong(PongSnapshot {
            own_paddle: (self.own_x, self.own_y),
            opponent_paddle: (self.opp_x, self.opp_y),
            ball: (self.ball_x, self.ball_y),
            own_score: self.own_score,
            opponent_score: self.opp_score,
        })
    }

    fn result(&self) -> GameResult {
        match self.own_score.cmp(&self.opp_score) {
            std::cmp::Ordering::Greater => GameResult::Win,
            std::cmp::Ordering::Less => GameResult::Loss,
            std::cmp::Ordering::Equal => GameResult::Draw,
        }
    }

    fn variant(&self) -> GameVariant {
        GameVariant::Pong
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parlor_proto::codec::encode_message;

    fn packet_of<T: parlor_proto::messages::Message>(msg: &T) -> PacketOwned {
        let frame = encode_message(msg, 0).unwrap();
        let mut framer = crate::framing::TcpFramer::new(64);
        framer.buf_mut().extend_from_slice(&frame);
        framer.drain_packets().unwrap().remove(0)
    }

    #[test]
    fn paddle_input_moves_and_clamps() {
        let mut game = PongSync::new(AuthorityRole::Host);
        let start = game.own_y;

        game.apply_local_input(PlayerInput::PaddleDown);
        assert_eq!(game.own_y, start + PADDLE_SPEED);

        for _ in 0..200 {
            game.apply_local_input(PlayerInput::PaddleUp);
        }
        assert_eq!(game.own_y, 0);

        for _ in 0..200 {
            game.apply_local_input(PlayerInput::PaddleDown);
        }
        assert_eq!(game.own_y, MAX_PADDLE_Y);
    }

    #[test]
    fn host_tick_moves_ball_and_emits_frame() {
        let mut game = PongSync::new(AuthorityRole::Host);
        let (x0, y0) = (game.ball_x, game.ball_y);

        let out = game.tick_if_authoritative(Instant::now());
        assert_eq!(game.ball_x, x0 + BALL_SPEED);
        assert_eq!(game.ball_y, y0 + BALL_SPEED);

        assert!(matches!(out[0], Outbound::Paddle(_)));
        assert!(matches!(out[1], Outbound::Ball(_)));
    }

    #[test]
    fn client_tick_emits_only_paddle() {
        let mut game = PongSync::new(AuthorityRole::Client);
        let (x0, y0) = (game.ball_x, game.ball_y);

        let out = game.tick_if_authoritative(Instant::now());
        // No physics on the mirroring side.
        assert_eq!((game.ball_x, game.ball_y), (x0, y0));
        assert_eq!(out.len(), 1);
        assert!(matches!(out[0], Outbound::Paddle(_)));
    }

    #[test]
    fn ball_bounces_off_walls() {
        let mut game = PongSync::new(AuthorityRole::Host);
        game.ball_y = 2;
        game.vel_y = -BALL_SPEED;

        game.step_ball();
        assert_eq!(game.vel_y, BALL_SPEED);
    }

    #[test]
    fn left_bound_scores_for_the_client() {
        let mut game = PongSync::new(AuthorityRole::Host);
        game.ball_x = 3;
        game.ball_y = BOARD_HEIGHT / 2;
        game.vel_x = -BALL_SPEED;
        // Move the host paddle away so the ball cannot be saved.
        game.own_y = 0;

        game.step_ball();
        assert_eq!(game.opp_score, 1);
        assert_eq!(game.own_score, 0);
        // Ball is back at center, serving the other way.
        assert_eq!(game.ball_x, (BOARD_WIDTH - BALL_SIZE) / 2);
        assert_eq!(game.vel_x, BALL_SPEED);
    }

    #[test]
    fn right_bound_scores_for_the_host() {
        let mut game = PongSync::new(AuthorityRole::Host);
        game.ball_x = BOARD_WIDTH - BALL_SIZE - 3;
        game.ball_y = BOARD_HEIGHT / 2;
        game.vel_x = BALL_SPEED;
        game.opp_y = 0;

        game.step_ball();
        assert_eq!(game.own_score, 1);
    }

    #[test]
    fn paddle_deflects_ball() {
        let mut game = PongSync::new(AuthorityRole::Host);
        // Place the ball just right of the host paddle, moving left into it.
        game.own_y = 250;
        game.ball_x = PADDLE_INSET + PADDLE_WIDTH + 2;
        game.ball_y = 260;
        game.vel_x = -BALL_SPEED;
        game.vel_y = 0;

        game.step_ball();
        assert_eq!(game.vel_x, BALL_SPEED);
        assert_eq!(game.own_score, 0);
        assert_eq!(game.opp_score, 0);
    }

    #[test]
    fn ball_frame_overwrites_client_view_idempotently() {
        let mut game = PongSync::new(AuthorityRole::Client);
        let frame = BallFrame {
            paddle_y: 123,
            ball_x: 400,
            ball_y: 77,
            player_score: 3,
            opponent_score: 1,
        };
        let packet = packet_of(&frame);

        game.apply_remote_message(&packet).unwrap();
        let first = game.snapshot();

        game.apply_remote_message(&packet).unwrap();
        assert_eq!(game.snapshot(), first);

        // Scores arrive host-relative and land swapped.
        assert_eq!(game.own_score, 1);
        assert_eq!(game.opp_score, 3);
        assert_eq!(game.opp_y, 123);
        assert_eq!((game.ball_x, game.ball_y), (400, 77));
    }

    #[test]
    fn host_ignores_ball_frames() {
        let mut game = PongSync::new(AuthorityRole::Host);
        let before = game.snapshot();
        let packet = packet_of(&BallFrame {
            paddle_y: 1,
            ball_x: 1,
            ball_y: 1,
            player_score: 9,
            opponent_score: 9,
        });

        game.apply_remote_message(&packet).unwrap();
        assert_eq!(game.snapshot(), before);
    }

    #[test]
    fn out_of_range_paddle_update_is_dropped() {
        let mut game = PongSync::new(AuthorityRole::Host);
        let before = game.opp_y;

        let packet = packet_of(&PaddleUpdate { paddle_y: -50 });
        game.apply_remote_message(&packet).unwrap();
        assert_eq!(game.opp_y, before);

        let packet = packet_of(&PaddleUpdate {
            paddle_y: BOARD_HEIGHT,
        });
        game.apply_remote_message(&packet).unwrap();
        assert_eq!(game.opp_y, before);
    }

    #[test]
    fn result_compares_scores() {
        let mut game = PongSync::new(AuthorityRole::Host);
        assert_eq!(game.result(), GameResult::Draw);
        game.own_score = 2;
        game.opp_score = 1;
        assert_eq!(game.result(), GameResult::Win);
        game.opp_score = 5;
        assert_eq!(game.result(), GameResult::Loss);
    }
}
