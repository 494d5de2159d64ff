//! The tennis simulation: ball flight, collisions, and scoring.
//!
//! Everything lives in one simulation context so the whole game can be
//! driven deterministically from tests. One `tick()` call advances the
//! ball by exactly one fixed step regardless of real frame duration,
//! reproducing the original per-frame integration. In multiplayer both
//! clients run this simulation independently and stay loosely consistent
//! through relayed paddle poses and serve triggers only; ball state is
//! never synchronized.

use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::{
    paddle_contains_ball, BallState, GameMode, PaddlePose, PaddleState, PlayerSlot, ScoreState,
    Vec3, BASELINE_X, COURT_HALF_WIDTH, FLOOR_BOUNCE_DAMPING, FLOOR_HEIGHT, GRAVITY_PER_TICK,
    NET_DAMPING, NET_HALF_DEPTH, NET_HEIGHT, OUT_OF_BOUNDS_X, PADDLE_HIT_JITTER, PADDLE_HIT_LIFT,
    PADDLE_HIT_SPEEDUP, PADDLE_STEP, PADDLE_Z_LIMIT, SERVE_HEIGHT, SERVE_JITTER, SERVE_LIFT,
    SERVE_SPEED,
};

/// One discrete paddle move, triggered per key press rather than held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaddleMove {
    /// Lateral, toward negative z.
    Left,
    /// Lateral, toward positive z.
    Right,
    /// Away from the net.
    Back,
    /// Toward the net.
    Forward,
}

/// Full simulation state for one client.
#[derive(Debug)]
pub struct TennisGame {
    pub ball: BallState,
    pub paddles: [PaddleState; 2],
    pub score: ScoreState,
    pub mode: GameMode,
    rng: StdRng,
}

impl TennisGame {
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// Seeded constructor for reproducible tests.
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            ball: BallState::at_rest(),
            paddles: [
                PaddleState::home(PlayerSlot::One),
                PaddleState::home(PlayerSlot::Two),
            ],
            score: ScoreState::new(),
            mode: GameMode::Singleplayer,
            rng,
        }
    }

    /// Advances the ball one fixed step. No-op while the ball waits for
    /// a serve.
    pub fn tick(&mut self) {
        if !self.ball.in_play {
            return;
        }

        self.ball.position.x += self.ball.velocity.x;
        self.ball.position.y += self.ball.velocity.y;
        self.ball.position.z += self.ball.velocity.z;

        self.ball.velocity.y -= GRAVITY_PER_TICK;

        // Floor bounce, with the double-bounce rule: a bounce behind the
        // server's own baseline means the serve never made it across, and
        // the point goes to the opponent.
        if self.ball.position.y < FLOOR_HEIGHT {
            self.ball.position.y = FLOOR_HEIGHT;
            self.ball.velocity.y = -self.ball.velocity.y * FLOOR_BOUNCE_DAMPING;

            if self.ball.position.x < -BASELINE_X && self.score.serving == PlayerSlot::One {
                self.score_point(PlayerSlot::Two);
                return;
            } else if self.ball.position.x > BASELINE_X && self.score.serving == PlayerSlot::Two {
                self.score_point(PlayerSlot::One);
                return;
            }
        }

        // Side walls reflect without damping.
        if self.ball.position.z > COURT_HALF_WIDTH || self.ball.position.z < -COURT_HALF_WIDTH {
            self.ball.velocity.z = -self.ball.velocity.z;
        }

        // Paddle return: speed up, pop the ball up, nudge it sideways.
        if paddle_contains_ball(&self.ball.position, &self.paddles[0].position)
            || paddle_contains_ball(&self.ball.position, &self.paddles[1].position)
        {
            self.ball.velocity.x = -self.ball.velocity.x * PADDLE_HIT_SPEEDUP;
            self.ball.velocity.z += self.rng.gen_range(-PADDLE_HIT_JITTER..PADDLE_HIT_JITTER);
            self.ball.velocity.y = PADDLE_HIT_LIFT;
        }

        // Soft net: low balls through the center band lose most of their
        // pace but are not stopped outright.
        if self.ball.position.x < NET_HALF_DEPTH
            && self.ball.position.x > -NET_HALF_DEPTH
            && self.ball.position.y < NET_HEIGHT
        {
            self.ball.velocity.x = -self.ball.velocity.x * NET_DAMPING;
        }

        // Past either end line: point to the opposite player.
        if self.ball.position.x > OUT_OF_BOUNDS_X {
            self.score_point(PlayerSlot::One);
        } else if self.ball.position.x < -OUT_OF_BOUNDS_X {
            self.score_point(PlayerSlot::Two);
        }
    }

    /// Puts the ball into play from the current server's baseline.
    pub fn serve(&mut self) {
        self.ball.in_play = true;

        let sign = self.score.serving.court_sign();
        self.ball.position = Vec3::new(BASELINE_X * sign, SERVE_HEIGHT, 0.0);
        self.ball.velocity.x = -SERVE_SPEED * sign;
        self.ball.velocity.y = SERVE_LIFT;
        self.ball.velocity.z = self.rng.gen_range(-SERVE_JITTER..SERVE_JITTER);

        debug!(
            "Player {} serves, velocity ({:.2}, {:.2}, {:.2})",
            self.score.serving.number(),
            self.ball.velocity.x,
            self.ball.velocity.y,
            self.ball.velocity.z
        );
    }

    /// Serves only when the ball is dead and `local` holds the serve.
    /// Returns whether the serve was accepted.
    pub fn try_serve(&mut self, local: PlayerSlot) -> bool {
        if self.ball.in_play || self.score.serving != local {
            return false;
        }
        self.serve();
        true
    }

    /// Awards a point, hands the serve to the other player, and parks
    /// the ball at the rest pose.
    pub fn score_point(&mut self, scorer: PlayerSlot) {
        if let Some(winner) = self.score.score_point(scorer) {
            info!(
                "Player {} wins the game ({} - {})",
                winner.number(),
                self.score.games[0],
                self.score.games[1]
            );
        }
        self.ball.reset();
    }

    /// Applies one discrete move to a paddle, clamped to its legal
    /// range, and returns the resulting wire pose.
    pub fn move_paddle(&mut self, slot: PlayerSlot, mv: PaddleMove) -> PaddlePose {
        let paddle = &mut self.paddles[slot.index()];
        let (back, forward) = slot.paddle_x_range();

        match mv {
            PaddleMove::Left => {
                paddle.position.z = (paddle.position.z - PADDLE_STEP).max(-PADDLE_Z_LIMIT);
            }
            PaddleMove::Right => {
                paddle.position.z = (paddle.position.z + PADDLE_STEP).min(PADDLE_Z_LIMIT);
            }
            PaddleMove::Back => {
                paddle.position.x = (paddle.position.x - PADDLE_STEP).max(back);
            }
            PaddleMove::Forward => {
                paddle.position.x = (paddle.position.x + PADDLE_STEP).min(forward);
            }
        }

        paddle.pose()
    }

    /// Mirrors a relayed peer paddle pose. The height is local-only and
    /// never touched.
    pub fn apply_remote_paddle(&mut self, player: PlayerSlot, position: PaddlePose) {
        let paddle = &mut self.paddles[player.index()];
        paddle.position.x = position.x;
        paddle.position.z = position.z;
    }

    /// Full reset: scores, games, ball, paddles, and serve all return to
    /// their starting state.
    pub fn reset(&mut self) {
        self.score = ScoreState::new();
        self.ball.reset();
        self.paddles = [
            PaddleState::home(PlayerSlot::One),
            PaddleState::home(PlayerSlot::Two),
        ];
    }

    /// Second player arrived: fresh scoreboard, relay-driven opponent.
    pub fn start_multiplayer(&mut self) {
        self.reset();
        self.mode = GameMode::Multiplayer;
    }

    /// Peer left: fresh scoreboard, AI takes over paddle two.
    pub fn reset_to_singleplayer(&mut self) {
        self.reset();
        self.mode = GameMode::Singleplayer;
    }
}

impl Default for TennisGame {
    fn default() -> Self {
        Self::new()
    }
}
