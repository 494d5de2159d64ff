//! Data model and wire protocol shared between the tennis client and the
//! relay server.
//!
//! The court coordinate system follows the original table layout: x runs
//! along the court length (player 1 on the negative side, player 2 on the
//! positive side), y is height above the floor, z is the lateral axis.

use serde::{Deserialize, Serialize};

pub const PROTOCOL_VERSION: u32 = 1;

// Ball tuning. All velocities are per simulation tick, not per second.
pub const GRAVITY_PER_TICK: f32 = 0.003;
pub const FLOOR_HEIGHT: f32 = 0.15;
pub const FLOOR_BOUNCE_DAMPING: f32 = 0.7;
pub const BALL_REST_HEIGHT: f32 = 0.3;

// Court geometry.
pub const COURT_HALF_WIDTH: f32 = 4.75;
pub const OUT_OF_BOUNDS_X: f32 = 9.75;
pub const BASELINE_X: f32 = 8.5;
pub const NET_HALF_DEPTH: f32 = 0.2;
pub const NET_HEIGHT: f32 = 0.6;
pub const NET_DAMPING: f32 = 0.5;

// Paddle geometry and handling.
pub const PADDLE_HALF_DEPTH: f32 = 0.2;
pub const PADDLE_HALF_HEIGHT: f32 = 0.6;
pub const PADDLE_HALF_WIDTH: f32 = 0.75;
pub const PADDLE_HIT_SPEEDUP: f32 = 1.05;
pub const PADDLE_HIT_LIFT: f32 = 0.1;
pub const PADDLE_HIT_JITTER: f32 = 0.01;
pub const PADDLE_STEP: f32 = 0.5;
pub const PADDLE_Z_LIMIT: f32 = 4.0;
pub const PADDLE_HOME_HEIGHT: f32 = 0.6;

// Serving.
pub const SERVE_SPEED: f32 = 0.3;
pub const SERVE_LIFT: f32 = 0.1;
pub const SERVE_HEIGHT: f32 = 0.5;
pub const SERVE_JITTER: f32 = 0.05;

// AI opponent.
pub const AI_SPEED: f32 = 0.05;
pub const AI_DEAD_ZONE: f32 = 0.5;
pub const AI_SERVE_DELAY_MS: u64 = 1000;

// Tennis point ladder. A game is won at index 4 with a two point lead.
pub const POINT_LABELS: [&str; 5] = ["0", "15", "30", "40", "Game"];
pub const GAME_POINT: usize = 4;
pub const WIN_LEAD: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }
}

/// A player's seat in the session, assigned by join order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerSlot {
    One,
    Two,
}

impl PlayerSlot {
    pub fn opponent(self) -> PlayerSlot {
        match self {
            PlayerSlot::One => PlayerSlot::Two,
            PlayerSlot::Two => PlayerSlot::One,
        }
    }

    /// Zero-based index into per-player arrays.
    pub fn index(self) -> usize {
        match self {
            PlayerSlot::One => 0,
            PlayerSlot::Two => 1,
        }
    }

    /// Numeric form used on the wire and in user-facing text.
    pub fn number(self) -> u8 {
        match self {
            PlayerSlot::One => 1,
            PlayerSlot::Two => 2,
        }
    }

    pub fn from_number(n: u8) -> Option<PlayerSlot> {
        match n {
            1 => Some(PlayerSlot::One),
            2 => Some(PlayerSlot::Two),
            _ => None,
        }
    }

    /// Sign of this player's end of the court on the x axis.
    pub fn court_sign(self) -> f32 {
        match self {
            PlayerSlot::One => -1.0,
            PlayerSlot::Two => 1.0,
        }
    }

    /// Legal forward/back range for this player's paddle. The two ranges
    /// mirror each other rather than sharing one clamp.
    pub fn paddle_x_range(self) -> (f32, f32) {
        match self {
            PlayerSlot::One => (-9.0, -7.0),
            PlayerSlot::Two => (9.0, 11.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameMode {
    Singleplayer,
    Multiplayer,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BallState {
    pub position: Vec3,
    pub velocity: Vec3,
    pub in_play: bool,
}

impl BallState {
    /// Ball at the rest pose, waiting for a serve.
    pub fn at_rest() -> Self {
        Self {
            position: Vec3::new(0.0, BALL_REST_HEIGHT, 0.0),
            velocity: Vec3::zero(),
            in_play: false,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::at_rest();
    }
}

impl Default for BallState {
    fn default() -> Self {
        Self::at_rest()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PaddleState {
    pub position: Vec3,
}

impl PaddleState {
    pub fn home(slot: PlayerSlot) -> Self {
        Self {
            position: Vec3::new(9.0 * slot.court_sign(), PADDLE_HOME_HEIGHT, 0.0),
        }
    }

    /// The paddle pose as carried on the wire (the height never changes).
    pub fn pose(&self) -> PaddlePose {
        PaddlePose {
            x: self.position.x,
            z: self.position.z,
        }
    }
}

/// Paddle position payload relayed between clients.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PaddlePose {
    pub x: f32,
    pub z: f32,
}

/// Point-ladder and game tallies for both players.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreState {
    pub points: [usize; 2],
    pub games: [u32; 2],
    pub serving: PlayerSlot,
}

impl ScoreState {
    pub fn new() -> Self {
        Self {
            points: [0, 0],
            games: [0, 0],
            serving: PlayerSlot::One,
        }
    }

    /// Awards one point to `scorer` and hands the next serve to the
    /// scorer's opponent. Returns the winner when this point closes a
    /// game, in which case both point counters reset and the winner's
    /// game tally is incremented.
    pub fn score_point(&mut self, scorer: PlayerSlot) -> Option<PlayerSlot> {
        self.points[scorer.index()] += 1;
        self.serving = scorer.opponent();

        let lead_over = self.points[scorer.opponent().index()] + WIN_LEAD;
        if self.points[scorer.index()] >= GAME_POINT && self.points[scorer.index()] >= lead_over {
            self.games[scorer.index()] += 1;
            self.points = [0, 0];
            return Some(scorer);
        }
        None
    }

    pub fn point_label(&self, player: PlayerSlot) -> &'static str {
        let idx = self.points[player.index()].min(POINT_LABELS.len() - 1);
        POINT_LABELS[idx]
    }
}

impl Default for ScoreState {
    fn default() -> Self {
        Self::new()
    }
}

/// Axis-aligned box test between the ball center and a paddle center.
/// Bounds are strict, matching the original hit window.
pub fn paddle_contains_ball(ball: &Vec3, paddle: &Vec3) -> bool {
    ball.x < paddle.x + PADDLE_HALF_DEPTH
        && ball.x > paddle.x - PADDLE_HALF_DEPTH
        && ball.z < paddle.z + PADDLE_HALF_WIDTH
        && ball.z > paddle.z - PADDLE_HALF_WIDTH
        && ball.y < paddle.y + PADDLE_HALF_HEIGHT
        && ball.y > paddle.y - PADDLE_HALF_HEIGHT
}

/// Every message exchanged over the wire, bincode-encoded per datagram.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum Packet {
    // Client to server.
    Connect {
        client_version: u32,
    },
    Ping,
    MovePaddle {
        player: PlayerSlot,
        position: PaddlePose,
    },
    ServeBall,
    Disconnect,

    // Server to client.
    PlayerNumber {
        slot: PlayerSlot,
    },
    NewPlayer {
        count: u8,
    },
    StartMultiplayerGame,
    UpdatePaddle {
        player: PlayerSlot,
        position: PaddlePose,
    },
    ResetGame,
    PlayerLeft,
    GameFull,
}
