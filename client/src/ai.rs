//! Singleplayer opponent for paddle two.
//!
//! Steering chases the ball's lateral coordinate with a dead zone so the
//! paddle does not jitter around small offsets. When the AI holds the
//! serve it fires one deferred serve after a fixed delay rather than
//! serving instantly.

use crate::game::TennisGame;
use shared::{GameMode, PlayerSlot, AI_DEAD_ZONE, AI_SERVE_DELAY_MS, AI_SPEED, PADDLE_Z_LIMIT};
use std::time::{Duration, Instant};

pub struct AiOpponent {
    /// Pending one-shot serve, armed while the AI waits to put the ball
    /// back into play.
    serve_at: Option<Instant>,
}

impl AiOpponent {
    pub fn new() -> Self {
        Self { serve_at: None }
    }

    /// Runs one AI step against the current simulation state.
    pub fn update(&mut self, game: &mut TennisGame) {
        self.update_at(game, Instant::now());
    }

    fn update_at(&mut self, game: &mut TennisGame, now: Instant) {
        if game.mode != GameMode::Singleplayer {
            self.serve_at = None;
            return;
        }

        if game.ball.in_play {
            self.serve_at = None;
            self.steer(game);
        } else if game.score.serving == PlayerSlot::Two {
            match self.serve_at {
                None => {
                    self.serve_at = Some(now + Duration::from_millis(AI_SERVE_DELAY_MS));
                }
                Some(at) if now >= at => {
                    self.serve_at = None;
                    game.serve();
                }
                Some(_) => {}
            }
        } else {
            self.serve_at = None;
        }
    }

    fn steer(&self, game: &mut TennisGame) {
        let target = game.ball.position.z;
        let paddle = &mut game.paddles[PlayerSlot::Two.index()];
        let z = paddle.position.z;

        if target > z + AI_DEAD_ZONE {
            paddle.position.z = (z + AI_SPEED).min(PADDLE_Z_LIMIT);
        } else if target < z - AI_DEAD_ZONE {
            paddle.position.z = (z - AI_SPEED).max(-PADDLE_Z_LIMIT);
        }
    }
}

impl Default for AiOpponent {
    fn default() -> Self {
        Self::new()
    }
}
