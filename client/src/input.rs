//! Input handling: discrete key presses become paddle moves and serves.
//!
//! Movement is event-driven, not held: each key press steps the paddle
//! once, exactly like the original keydown handling. Key sampling is
//! separated from rule application so the rules can be unit-tested
//! without a window.

use crate::game::{PaddleMove, TennisGame};
use macroquad::prelude::{is_key_pressed, KeyCode};
use shared::{Packet, PlayerSlot};

/// Raw input gathered for one frame.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InputFrame {
    pub moves: Vec<PaddleMove>,
    pub serve: bool,
}

/// Maps key events to paddle moves and serve attempts.
#[derive(Debug, Default)]
pub struct InputController;

impl InputController {
    pub fn new() -> Self {
        Self
    }

    /// Samples this frame's key presses. Edge-triggered, so holding a
    /// key produces a single move.
    pub fn poll(&self) -> InputFrame {
        let mut frame = InputFrame::default();

        if is_key_pressed(KeyCode::Left) {
            frame.moves.push(PaddleMove::Left);
        }
        if is_key_pressed(KeyCode::Right) {
            frame.moves.push(PaddleMove::Right);
        }
        if is_key_pressed(KeyCode::Down) {
            frame.moves.push(PaddleMove::Back);
        }
        if is_key_pressed(KeyCode::Up) {
            frame.moves.push(PaddleMove::Forward);
        }
        frame.serve = is_key_pressed(KeyCode::Space);

        frame
    }

    /// Applies a frame of input to the local paddle and returns the
    /// packets to send to the peer. Input before a slot is assigned is
    /// silently ignored; a serve is accepted only when the ball is dead
    /// and the local player holds the serve.
    pub fn apply(
        &self,
        game: &mut TennisGame,
        local: Option<PlayerSlot>,
        frame: &InputFrame,
    ) -> Vec<Packet> {
        let mut outgoing = Vec::new();

        let Some(slot) = local else {
            return outgoing;
        };

        for mv in &frame.moves {
            let position = game.move_paddle(slot, *mv);
            outgoing.push(Packet::MovePaddle {
                player: slot,
                position,
            });
        }

        if frame.serve && game.try_serve(slot) {
            outgoing.push(Packet::ServeBall);
        }

        outgoing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::PaddlePose;

    fn frame(moves: Vec<PaddleMove>, serve: bool) -> InputFrame {
        InputFrame { moves, serve }
    }

    #[test]
    fn test_input_before_slot_assignment_is_ignored() {
        let controller = InputController::new();
        let mut game = TennisGame::with_seed(1);
        let before = game.paddles[0];

        let sent = controller.apply(
            &mut game,
            None,
            &frame(vec![PaddleMove::Left, PaddleMove::Forward], true),
        );

        assert!(sent.is_empty());
        assert_eq!(game.paddles[0], before);
        assert!(!game.ball.in_play);
    }

    #[test]
    fn test_each_move_emits_one_paddle_packet() {
        let controller = InputController::new();
        let mut game = TennisGame::with_seed(1);

        let sent = controller.apply(
            &mut game,
            Some(PlayerSlot::One),
            &frame(vec![PaddleMove::Left, PaddleMove::Left], false),
        );

        assert_eq!(sent.len(), 2);
        assert_eq!(
            sent[1],
            Packet::MovePaddle {
                player: PlayerSlot::One,
                position: PaddlePose { x: -9.0, z: -1.0 },
            }
        );
        assert_eq!(game.paddles[0].position.z, -1.0);
    }

    #[test]
    fn test_serve_key_serves_only_for_the_designated_server() {
        let controller = InputController::new();
        let mut game = TennisGame::with_seed(1);

        // Player two does not hold the serve: nothing happens.
        let sent = controller.apply(&mut game, Some(PlayerSlot::Two), &frame(vec![], true));
        assert!(sent.is_empty());
        assert!(!game.ball.in_play);

        // Player one does.
        let sent = controller.apply(&mut game, Some(PlayerSlot::One), &frame(vec![], true));
        assert_eq!(sent, vec![Packet::ServeBall]);
        assert!(game.ball.in_play);

        // Ball already in play: the serve key is dead.
        let sent = controller.apply(&mut game, Some(PlayerSlot::One), &frame(vec![], true));
        assert!(sent.is_empty());
    }

    #[test]
    fn test_clamped_moves_still_report_a_pose() {
        let controller = InputController::new();
        let mut game = TennisGame::with_seed(1);

        let mut sent = Vec::new();
        for _ in 0..12 {
            sent = controller.apply(
                &mut game,
                Some(PlayerSlot::Two),
                &frame(vec![PaddleMove::Right], false),
            );
        }

        // Pinned at the clamp, and the relayed pose agrees.
        assert_eq!(
            sent,
            vec![Packet::MovePaddle {
                player: PlayerSlot::Two,
                position: PaddlePose { x: 9.0, z: 4.0 },
            }]
        );
    }
}
