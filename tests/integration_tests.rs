//! Integration tests for the relay server and cross-client consistency.
//!
//! Broker tests run a real server on a loopback UDP socket and talk to
//! it with plain blocking sockets, validating the join/relay/leave
//! protocol end to end.

use bincode::{deserialize, serialize};
use shared::{PaddlePose, Packet, PlayerSlot, FLOOR_HEIGHT, PROTOCOL_VERSION};
use std::net::{SocketAddr, UdpSocket};
use std::time::Duration;
use tokio::time::sleep;

/// A scripted player talking to the broker over a blocking socket.
struct TestPeer {
    socket: UdpSocket,
    server_addr: SocketAddr,
}

impl TestPeer {
    fn new(server_addr: SocketAddr) -> Self {
        let socket = UdpSocket::bind("127.0.0.1:0").expect("Failed to bind peer socket");
        socket
            .set_read_timeout(Some(Duration::from_millis(300)))
            .unwrap();
        Self {
            socket,
            server_addr,
        }
    }

    fn send(&self, packet: &Packet) {
        let data = serialize(packet).unwrap();
        self.socket.send_to(&data, self.server_addr).unwrap();
    }

    fn join(&self) {
        self.send(&Packet::Connect {
            client_version: PROTOCOL_VERSION,
        });
    }

    /// Collects every packet that arrives before the read timeout.
    fn drain(&self) -> Vec<Packet> {
        let mut packets = Vec::new();
        let mut buf = [0u8; 2048];

        while let Ok((len, _)) = self.socket.recv_from(&mut buf) {
            if let Ok(packet) = deserialize::<Packet>(&buf[..len]) {
                packets.push(packet);
            }
        }

        packets
    }
}

/// Boots a relay server on an ephemeral port and returns its address.
async fn spawn_server() -> SocketAddr {
    let mut server = server::network::Server::new("127.0.0.1:0")
        .await
        .expect("Failed to start server");
    let addr = server.local_addr();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    sleep(Duration::from_millis(50)).await;
    addr
}

mod broker_tests {
    use super::*;

    #[tokio::test(flavor = "multi_thread")]
    async fn slots_are_assigned_in_join_order() {
        let addr = spawn_server().await;

        let peer1 = TestPeer::new(addr);
        peer1.join();
        sleep(Duration::from_millis(50)).await;

        let received = peer1.drain();
        assert!(received.contains(&Packet::PlayerNumber {
            slot: PlayerSlot::One
        }));
        assert!(received.contains(&Packet::NewPlayer { count: 1 }));
        assert!(!received.contains(&Packet::StartMultiplayerGame));

        let peer2 = TestPeer::new(addr);
        peer2.join();
        sleep(Duration::from_millis(50)).await;

        let received = peer2.drain();
        assert!(received.contains(&Packet::PlayerNumber {
            slot: PlayerSlot::Two
        }));
        assert!(received.contains(&Packet::NewPlayer { count: 2 }));
        assert!(received.contains(&Packet::StartMultiplayerGame));

        // The first player hears about the new arrival too.
        let received = peer1.drain();
        assert!(received.contains(&Packet::NewPlayer { count: 2 }));
        assert!(received.contains(&Packet::StartMultiplayerGame));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn third_join_is_rejected_with_game_full() {
        let addr = spawn_server().await;

        let peer1 = TestPeer::new(addr);
        let peer2 = TestPeer::new(addr);
        peer1.join();
        peer2.join();
        sleep(Duration::from_millis(50)).await;

        let peer3 = TestPeer::new(addr);
        peer3.join();
        sleep(Duration::from_millis(50)).await;

        let received = peer3.drain();
        assert!(received.contains(&Packet::GameFull));
        assert!(!received
            .iter()
            .any(|p| matches!(p, Packet::PlayerNumber { .. })));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn repeated_connect_reseats_the_same_address() {
        let addr = spawn_server().await;

        let peer1 = TestPeer::new(addr);
        let peer2 = TestPeer::new(addr);
        peer1.join();
        peer2.join();
        sleep(Duration::from_millis(50)).await;
        peer1.drain();
        peer2.drain();

        // Same address connects again: the old seat is released and the
        // peer rejoins at the end of the list, so its count-based slot
        // is now 2 and the session never exceeds two players.
        peer1.join();
        sleep(Duration::from_millis(50)).await;

        let received = peer1.drain();
        assert!(received.contains(&Packet::PlayerNumber {
            slot: PlayerSlot::Two
        }));
        assert!(received.contains(&Packet::NewPlayer { count: 2 }));
        assert!(received.contains(&Packet::StartMultiplayerGame));
        assert!(!received.contains(&Packet::GameFull));
        // Re-seating is not a departure.
        assert!(!received.contains(&Packet::PlayerLeft));

        // Both seats are still taken from a third address's view.
        let peer3 = TestPeer::new(addr);
        peer3.join();
        sleep(Duration::from_millis(50)).await;
        assert!(peer3.drain().contains(&Packet::GameFull));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn paddle_moves_reach_only_the_other_peer() {
        let addr = spawn_server().await;

        let peer1 = TestPeer::new(addr);
        let peer2 = TestPeer::new(addr);
        peer1.join();
        peer2.join();
        sleep(Duration::from_millis(50)).await;
        peer1.drain();
        peer2.drain();

        let position = PaddlePose { x: -8.5, z: 2.0 };
        peer1.send(&Packet::MovePaddle {
            player: PlayerSlot::One,
            position,
        });
        sleep(Duration::from_millis(50)).await;

        let received = peer2.drain();
        assert!(received.contains(&Packet::UpdatePaddle {
            player: PlayerSlot::One,
            position,
        }));

        // The sender gets no echo.
        assert!(peer1.drain().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn serve_triggers_relay_to_the_peer() {
        let addr = spawn_server().await;

        let peer1 = TestPeer::new(addr);
        let peer2 = TestPeer::new(addr);
        peer1.join();
        peer2.join();
        sleep(Duration::from_millis(50)).await;
        peer1.drain();
        peer2.drain();

        peer1.send(&Packet::ServeBall);
        sleep(Duration::from_millis(50)).await;

        assert!(peer2.drain().contains(&Packet::ServeBall));
        assert!(peer1.drain().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn leave_downgrades_to_singleplayer_and_frees_the_slot() {
        let addr = spawn_server().await;

        let peer1 = TestPeer::new(addr);
        let peer2 = TestPeer::new(addr);
        peer1.join();
        peer2.join();
        sleep(Duration::from_millis(50)).await;
        peer1.drain();
        peer2.drain();

        peer1.send(&Packet::Disconnect);
        sleep(Duration::from_millis(50)).await;

        let received = peer2.drain();
        assert!(received.contains(&Packet::PlayerLeft));
        assert!(received.contains(&Packet::ResetGame));

        // Slot numbering derives from the current count: the next
        // joiner fills seat two, not seat three.
        let peer3 = TestPeer::new(addr);
        peer3.join();
        sleep(Duration::from_millis(50)).await;
        assert!(peer3.drain().contains(&Packet::PlayerNumber {
            slot: PlayerSlot::Two
        }));

        // With everyone gone a fresh joiner is player one again.
        peer2.send(&Packet::Disconnect);
        peer3.send(&Packet::Disconnect);
        sleep(Duration::from_millis(50)).await;

        let peer4 = TestPeer::new(addr);
        peer4.join();
        sleep(Duration::from_millis(50)).await;
        assert!(peer4.drain().contains(&Packet::PlayerNumber {
            slot: PlayerSlot::One
        }));
    }
}

/// Cross-client consistency: two simulations kept loosely in sync by
/// relayed paddle poses and serve triggers only.
mod lockstep_tests {
    use super::*;
    use client::game::{PaddleMove, TennisGame};
    use client::input::{InputController, InputFrame};

    #[test]
    fn relayed_paddle_moves_mirror_across_simulations() {
        let controller = InputController::new();
        let mut local = TennisGame::with_seed(1);
        let mut remote = TennisGame::with_seed(2);

        let frame = InputFrame {
            moves: vec![PaddleMove::Left, PaddleMove::Forward],
            serve: false,
        };
        let outgoing = controller.apply(&mut local, Some(PlayerSlot::One), &frame);

        // Feed the emitted packets through the relay translation into
        // the peer simulation, as the broker would.
        for packet in outgoing {
            if let Packet::MovePaddle { player, position } = packet {
                remote.apply_remote_paddle(player, position);
            }
        }

        assert_eq!(
            local.paddles[0].position.z,
            remote.paddles[0].position.z
        );
        assert_eq!(
            local.paddles[0].position.x,
            remote.paddles[0].position.x
        );
    }

    #[test]
    fn serve_trigger_puts_both_simulations_into_play() {
        let controller = InputController::new();
        let mut local = TennisGame::with_seed(1);
        let mut remote = TennisGame::with_seed(2);

        let frame = InputFrame {
            moves: vec![],
            serve: true,
        };
        let outgoing = controller.apply(&mut local, Some(PlayerSlot::One), &frame);
        assert!(outgoing.contains(&Packet::ServeBall));

        remote.serve();

        assert!(local.ball.in_play);
        assert!(remote.ball.in_play);
        // Same serve pose and forward speed; only the jitter differs.
        assert_eq!(local.ball.position, remote.ball.position);
        assert_eq!(local.ball.velocity.x, remote.ball.velocity.x);
    }

    #[test]
    fn ball_never_sinks_below_the_floor_over_a_long_rally() {
        let mut game = TennisGame::with_seed(42);
        game.serve();

        for _ in 0..2000 {
            game.tick();
            if game.ball.in_play {
                assert!(game.ball.position.y >= FLOOR_HEIGHT);
            } else {
                // Point over: put the ball back into play and keep going.
                game.serve();
            }
        }
    }
}
