//! Presentation layer: a top-down projection of the court drawn with
//! macroquad's immediate-mode primitives. Purely cosmetic; nothing here
//! feeds back into the simulation.

use crate::game::TennisGame;
use macroquad::prelude::*;
use shared::{
    GameMode, PlayerSlot, Vec3, COURT_HALF_WIDTH, NET_HEIGHT, PADDLE_HALF_DEPTH,
    PADDLE_HALF_WIDTH,
};

// Drawable world extent: the court is 20 long, paddles can back up to
// |x| = 11, so leave a margin past that.
const WORLD_HALF_LENGTH: f32 = 11.5;
const WORLD_HALF_WIDTH: f32 = 6.0;

pub struct Renderer;

impl Renderer {
    pub fn new() -> Self {
        Renderer
    }

    pub fn render(&mut self, game: &TennisGame, local: Option<PlayerSlot>, notice: Option<&str>) {
        clear_background(Color::from_rgba(20, 24, 20, 255));

        self.draw_court();
        self.draw_paddle(game, PlayerSlot::One, local);
        self.draw_paddle(game, PlayerSlot::Two, local);
        self.draw_ball(&game.ball.position);
        self.draw_hud(game, local, notice);
    }

    /// Court x (length axis) to screen x.
    fn sx(&self, x: f32) -> f32 {
        (x + WORLD_HALF_LENGTH) / (2.0 * WORLD_HALF_LENGTH) * screen_width()
    }

    /// Court z (lateral axis) to screen y.
    fn sy(&self, z: f32) -> f32 {
        (z + WORLD_HALF_WIDTH) / (2.0 * WORLD_HALF_WIDTH) * screen_height()
    }

    fn scale_x(&self, len: f32) -> f32 {
        len / (2.0 * WORLD_HALF_LENGTH) * screen_width()
    }

    fn scale_y(&self, len: f32) -> f32 {
        len / (2.0 * WORLD_HALF_WIDTH) * screen_height()
    }

    fn draw_court(&self) {
        // Playing surface.
        draw_rectangle(
            self.sx(-10.0),
            self.sy(-5.0),
            self.scale_x(20.0),
            self.scale_y(10.0),
            Color::from_rgba(40, 100, 60, 255),
        );

        // Side lines and baselines.
        let white = Color::from_rgba(220, 220, 220, 255);
        draw_line(self.sx(-10.0), self.sy(-5.0), self.sx(10.0), self.sy(-5.0), 2.0, white);
        draw_line(self.sx(-10.0), self.sy(5.0), self.sx(10.0), self.sy(5.0), 2.0, white);
        draw_line(self.sx(-10.0), self.sy(-5.0), self.sx(-10.0), self.sy(5.0), 2.0, white);
        draw_line(self.sx(10.0), self.sy(-5.0), self.sx(10.0), self.sy(5.0), 2.0, white);

        // Lateral wall markers at the reflection boundary.
        let wall = Color::from_rgba(120, 120, 120, 255);
        draw_line(
            self.sx(-10.0),
            self.sy(-COURT_HALF_WIDTH),
            self.sx(10.0),
            self.sy(-COURT_HALF_WIDTH),
            1.0,
            wall,
        );
        draw_line(
            self.sx(-10.0),
            self.sy(COURT_HALF_WIDTH),
            self.sx(10.0),
            self.sy(COURT_HALF_WIDTH),
            1.0,
            wall,
        );

        // The net across center court.
        draw_line(
            self.sx(0.0),
            self.sy(-COURT_HALF_WIDTH),
            self.sx(0.0),
            self.sy(COURT_HALF_WIDTH),
            3.0,
            Color::from_rgba(230, 230, 230, 255),
        );
    }

    fn draw_paddle(&self, game: &TennisGame, slot: PlayerSlot, local: Option<PlayerSlot>) {
        let paddle = &game.paddles[slot.index()];
        let color = if Some(slot) == local {
            GREEN
        } else {
            Color::from_rgba(255, 68, 68, 255)
        };

        draw_rectangle(
            self.sx(paddle.position.x - PADDLE_HALF_DEPTH),
            self.sy(paddle.position.z - PADDLE_HALF_WIDTH),
            self.scale_x(2.0 * PADDLE_HALF_DEPTH),
            self.scale_y(2.0 * PADDLE_HALF_WIDTH),
            color,
        );
    }

    fn draw_ball(&self, position: &Vec3) {
        // Ground shadow anchors the ball while the radius cues height.
        draw_circle(
            self.sx(position.x),
            self.sy(position.z),
            5.0,
            Color::from_rgba(0, 0, 0, 90),
        );

        let radius = 5.0 + (position.y / NET_HEIGHT) * 3.0;
        draw_circle(
            self.sx(position.x),
            self.sy(position.z) - position.y * 4.0,
            radius,
            YELLOW,
        );
    }

    fn draw_hud(&self, game: &TennisGame, local: Option<PlayerSlot>, notice: Option<&str>) {
        let score_line = format!(
            "Score: {} - {} (Games: {} - {})",
            game.score.point_label(PlayerSlot::One),
            game.score.point_label(PlayerSlot::Two),
            game.score.games[0],
            game.score.games[1],
        );
        draw_text(&score_line, 12.0, 24.0, 24.0, WHITE);

        let mode_line = match game.mode {
            GameMode::Singleplayer => "Single-player",
            GameMode::Multiplayer => "Multiplayer",
        };
        draw_text(mode_line, 12.0, 46.0, 18.0, GRAY);

        if let Some(slot) = local {
            draw_text(
                &format!("You are player {}", slot.number()),
                12.0,
                64.0,
                18.0,
                GRAY,
            );
        } else {
            draw_text("Waiting for player number...", 12.0, 64.0, 18.0, GRAY);
        }

        if !game.ball.in_play {
            let prompt = format!(
                "Player {} serves. Press SPACE to serve.",
                game.score.serving.number()
            );
            draw_text(
                &prompt,
                screen_width() / 2.0 - 170.0,
                screen_height() - 24.0,
                22.0,
                WHITE,
            );
        }

        if let Some(text) = notice {
            draw_text(
                text,
                screen_width() / 2.0 - 200.0,
                36.0,
                22.0,
                Color::from_rgba(255, 220, 120, 255),
            );
        }
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}
