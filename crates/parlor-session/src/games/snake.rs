//! Snake synchronization engine (host-authoritative).
//!
//! The host simulates both snakes on its movement cadence and broadcasts a
//! full board frame after every step, composed in the receiver's
//! perspective. The client only forwards direction changes and mirrors the
//! frames it receives.

use std::time::{Duration, Instant};

use parlor_proto::{
    error::ProtoError,
    messages::snake::{Cell, Direction, DirectionChange, SnakeFrame},
    msg_id::MsgId,
};
use rand::Rng;
use tracing::{debug, warn};

use crate::{framing::PacketOwned, session::AuthorityRole};

use super::{GameResult, GameSnapshot, GameSync, GameVariant, Outbound, PlayerInput};

/// Cell edge length in pixels; the 800x600 board becomes a 40x30 grid.
pub const GRID_SIZE: i32 = 20;
pub const GRID_WIDTH: i32 = super::BOARD_WIDTH / GRID_SIZE;
pub const GRID_HEIGHT: i32 = super::BOARD_HEIGHT / GRID_SIZE;

/// Movement cadence of the authoritative simulation.
pub const MOVE_INTERVAL: Duration = Duration::from_millis(150);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnakeSnapshot {
    pub own_snake: Vec<Cell>,
    pub opponent_snake: Vec<Cell>,
    pub food: Cell,
    pub own_score: u32,
    pub opponent_score: u32,
    pub own_alive: bool,
    pub opponent_alive: bool,
    pub game_over: bool,
}

pub struct SnakeSync {
    role: AuthorityRole,
    own: Vec<Cell>,
    opp: Vec<Cell>,
    own_dir: Direction,
    opp_dir: Direction,
    food: Cell,
    own_score: u32,
    opp_score: u32,
    own_alive: bool,
    opp_alive: bool,
    game_over: bool,
    last_move: Option<Instant>,
}

fn host_spawn() -> Vec<Cell> {
    vec![
        Cell { x: 5, y: 5 },
        Cell { x: 4, y: 5 },
        Cell { x: 3, y: 5 },
    ]
}

fn client_spawn() -> Vec<Cell> {
    vec![
        Cell {
            x: GRID_WIDTH - 5,
            y: GRID_HEIGHT - 5,
        },
        Cell {
            x: GRID_WIDTH - 4,
            y: GRID_HEIGHT - 5,
        },
        Cell {
            x: GRID_WIDTH - 3,
            y: GRID_HEIGHT - 5,
        },
    ]
}

fn place_food(occupied_a: &[Cell], occupied_b: &[Cell]) -> Cell {
    let mut rng = rand::rng();
    loop {
        let food = Cell {
            x: rng.random_range(0..GRID_WIDTH),
            y: rng.random_range(0..GRID_HEIGHT),
        };
        if !occupied_a.contains(&food) && !occupied_b.contains(&food) {
            return food;
        }
    }
}

fn stepped(head: Cell, dir: Direction) -> Cell {
    match dir {
        Direction::Up => Cell {
            x: head.x,
            y: head.y - 1,
        },
        Direction::Down => Cell {
            x: head.x,
            y: head.y + 1,
        },
        Direction::Left => Cell {
            x: head.x - 1,
            y: head.y,
        },
        Direction::Right => Cell {
            x: head.x + 1,
            y: head.y,
        },
    }
}

fn collides(snake: &[Cell], other: &[Cell]) -> bool {
    let head = snake[0];
    if head.x < 0 || head.x >= GRID_WIDTH || head.y < 0 || head.y >= GRID_HEIGHT {
        return true;
    }
    if snake[1..].contains(&head) {
        return true;
    }
    other.contains(&head)
}

impl SnakeSync {
    pub fn new(role: AuthorityRole) -> Self {
        let (own, opp, own_dir, opp_dir) = match role {
            AuthorityRole::Host => (
                host_spawn(),
                client_spawn(),
                Direction::Right,
                Direction::Left,
            ),
            AuthorityRole::Client => (
                client_spawn(),
                host_spawn(),
                Direction::Left,
                Direction::Right,
            ),
        };
        // The client's food is provisional; the first authoritative frame
        // overwrites it.
        let food = place_food(&own, &opp);
        Self {
            role,
            own,
            opp,
            own_dir,
            opp_dir,
            food,
            own_score: 0,
            opp_score: 0,
            own_alive: true,
            opp_alive: true,
            game_over: false,
            last_move: None,
        }
    }

    /// Advance one snake: move the head, resolve collisions, then food.
    /// Returns the new alive flag and whether the food was eaten.
    fn step_one(
        snake: &mut Vec<Cell>,
        dir: Direction,
        other: &[Cell],
        food: Cell,
    ) -> (bool, bool) {
        let head = stepped(snake[0], dir);
        snake.insert(0, head);

        let alive = !collides(snake, other);
        let ate = head == food;
        if ate {
            // Growth: the tail stays when the food is eaten.
        } else {
            snake.pop();
        }
        (alive, ate)
    }

    /// One authoritative movement step. The host's snake moves, collides
    /// and eats first, then the guest's; if both heads reach the food in
    /// the same step the host eats it and the food respawns before the
    /// guest moves.
    fn step_board(&mut self) {
        if self.own_alive {
            let (alive, ate) = Self::step_one(&mut self.own, self.own_dir, &self.opp, self.food);
            self.own_alive = alive;
            if ate {
                self.own_score += 1;
                self.food = place_food(&self.own, &self.opp);
            }
        }

        if self.opp_alive {
            let (alive, ate) = Self::step_one(&mut self.opp, self.opp_dir, &self.own, self.food);
            self.opp_alive = alive;
            if ate {
                self.opp_score += 1;
                self.food = place_food(&self.own, &self.opp);
            }
        }

        if !self.own_alive && !self.opp_alive {
            self.game_over = true;
        }
    }

    /// Compose the authoritative frame in the receiver's perspective.
    fn frame_for_peer(&self) -> SnakeFrame {
        SnakeFrame {
            player_snake: self.opp.clone(),
            opponent_snake: self.own.clone(),
            food: self.food,
            player_score: self.opp_score,
            opponent_score: self.own_score,
            player_alive: self.opp_alive,
            opponent_alive: self.own_alive,
            game_over: self.game_over,
        }
    }

    fn apply_direction_change(&mut self, change: DirectionChange) {
        match self.role {
            AuthorityRole::Host => self.opp_dir = change.direction,
            // The mirroring side has no independent state to steer.
            AuthorityRole::Client => {
                debug!(direction = ?change.direction, "ignoring direction change on mirror side")
            }
        }
    }

    fn apply_frame(&mut self, frame: SnakeFrame) {
        if self.role == AuthorityRole::Host {
            warn!("dropping snake frame from non-authoritative peer");
            return;
        }
        // Full overwrite; the host already swapped the frame into our
        // perspective.
        self.own = frame.player_snake;
        self.opp = frame.opponent_snake;
        self.food = frame.food;
        self.own_score = frame.player_score;
        self.opp_score = frame.opponent_score;
        self.own_alive = frame.player_alive;
        self.opp_alive = frame.opponent_alive;
        self.game_over = frame.game_over;
    }
}

impl GameSync for SnakeSync {
    fn apply_local_input(&mut self, input: PlayerInput) -> Option<Outbound> {
        let PlayerInput::Turn(direction) = input else {
            warn!(?input, "ignoring input foreign to snake");
            return None;
        };
        if !self.own_alive || self.game_over {
            return None;
        }
        // A snake cannot fold back on itself.
        if direction == self.own_dir || direction == self.own_dir.opposite() {
            return None;
        }
        self.own_dir = direction;
        Some(Outbound::Turn(DirectionChange { direction }))
    }

    fn apply_remote_message(&mut self, packet: &PacketOwned) -> Result<(), ProtoError> {
        match packet.msg_id() {
            Some(MsgId::DirectionChange) => self.apply_direction_change(packet.decode()?),
            Some(MsgId::SnakeFrame) => self.apply_frame(packet.decode()?),
            other => warn!(
                ?other,
                raw = packet.raw_msg_id(),
                "dropping message foreign to snake"
            ),
        }
        Ok(())
    }

    fn tick_if_authoritative(&mut self, now: Instant) -> Vec<Outbound> {
        if self.role != AuthorityRole::Host || self.game_over {
            return Vec::new();
        }
        // Self-paced: only move once the cadence interval has elapsed.
        if let Some(last) = self.last_move {
            if now.duration_since(last) < MOVE_INTERVAL {
                return Vec::new();
            }
        }
        self.last_move = Some(now);

        self.step_board();
        vec![Outbound::Snake(self.frame_for_peer())]
    }

    fn snapshot(&self) -> GameSnapshot {
        GameSnapshot::Snake(SnakeSnapshot {
            own_snake: self.own.clone(),
            opponent_snake: self.opp.clone(),
            food: self.food,
            own_score: self.own_score,
            opponent_score: self.opp_score,
            own_alive: self.own_alive,
            opponent_alive: self.opp_alive,
            game_over: self.game_over,
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
        GameVariant::Snake
    }
}
