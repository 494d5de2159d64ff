//! UDP relay layer: socket tasks, the event loop, and packet routing.
//!
//! The broker never simulates the ball. It seats at most two peers,
//! relays paddle and serve events between them, and announces joins,
//! departures, and mode changes. Every event handler runs to completion
//! inside the single event loop before the next message is processed, so
//! the player list is never mutated concurrently.

use crate::session::{Session, PEER_TIMEOUT, SESSION_CAPACITY};
use bincode::{deserialize, serialize};
use log::{debug, error, info, warn};
use shared::Packet;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, RwLock};

/// Messages sent from network tasks to the main event loop.
#[derive(Debug)]
pub enum ServerMessage {
    PacketReceived {
        packet: Packet,
        addr: SocketAddr,
    },
    PeerTimeout {
        addr: SocketAddr,
    },
    #[allow(dead_code)]
    Shutdown,
}

/// Messages sent from the event loop to the outbound socket task.
#[derive(Debug)]
pub enum RelayMessage {
    SendPacket {
        packet: Packet,
        addr: SocketAddr,
    },
    BroadcastPacket {
        packet: Packet,
        exclude: Option<SocketAddr>,
    },
}

/// Translates an inbound peer event into the packet relayed to the
/// other side, or `None` for packets that are not relayed. Paddle data
/// is forwarded verbatim; bounds are not validated server-side.
pub fn relay_packet(packet: &Packet) -> Option<Packet> {
    match packet {
        Packet::MovePaddle { player, position } => Some(Packet::UpdatePaddle {
            player: *player,
            position: *position,
        }),
        Packet::ServeBall => Some(Packet::ServeBall),
        _ => None,
    }
}

/// The session broker: one socket, one session, one event loop.
pub struct Server {
    socket: Arc<UdpSocket>,
    local_addr: SocketAddr,
    session: Arc<RwLock<Session>>,

    // Communication channels
    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
    relay_tx: mpsc::UnboundedSender<RelayMessage>,
    relay_rx: mpsc::UnboundedReceiver<RelayMessage>,
}

impl Server {
    pub async fn new(addr: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let socket = Arc::new(UdpSocket::bind(addr).await?);
        let local_addr = socket.local_addr()?;
        info!("Relay server listening on {}", local_addr);

        let (server_tx, server_rx) = mpsc::unbounded_channel();
        let (relay_tx, relay_rx) = mpsc::unbounded_channel();

        Ok(Server {
            socket,
            local_addr,
            session: Arc::new(RwLock::new(Session::new())),
            server_tx,
            server_rx,
            relay_tx,
            relay_rx,
        })
    }

    /// The bound address, useful when binding to port 0 in tests.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Spawns the task that continuously listens for incoming datagrams.
    fn spawn_network_receiver(&self) {
        let socket = Arc::clone(&self.socket);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut buffer = [0u8; 2048];

            loop {
                match socket.recv_from(&mut buffer).await {
                    Ok((len, addr)) => {
                        if let Ok(packet) = deserialize::<Packet>(&buffer[0..len]) {
                            if let Err(e) =
                                server_tx.send(ServerMessage::PacketReceived { packet, addr })
                            {
                                error!("Failed to send packet to main loop: {}", e);
                                break;
                            }
                        } else {
                            warn!("Failed to deserialize packet from {}", addr);
                        }
                    }
                    Err(e) => {
                        error!("Error receiving packet: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        });
    }

    /// Spawns the task that drains the outbound packet queue.
    fn spawn_network_sender(&mut self) {
        let socket = Arc::clone(&self.socket);
        let session = Arc::clone(&self.session);
        let mut relay_rx = std::mem::replace(&mut self.relay_rx, mpsc::unbounded_channel().1);

        tokio::spawn(async move {
            while let Some(message) = relay_rx.recv().await {
                match message {
                    RelayMessage::SendPacket { packet, addr } => {
                        if let Err(e) = Self::send_packet_impl(&socket, &packet, addr).await {
                            error!("Failed to send packet to {}: {}", addr, e);
                        }
                    }
                    RelayMessage::BroadcastPacket { packet, exclude } => {
                        let addrs = {
                            let session_guard = session.read().await;
                            session_guard.addrs()
                        };

                        for addr in addrs {
                            if Some(addr) == exclude {
                                continue;
                            }

                            if let Err(e) = Self::send_packet_impl(&socket, &packet, addr).await {
                                error!("Failed to send to peer {}: {}", addr, e);
                            }
                        }
                    }
                }
            }
        });
    }

    /// Spawns the task that sweeps silent peers.
    fn spawn_timeout_checker(&self) {
        let session = Arc::clone(&self.session);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));

            loop {
                interval.tick().await;

                let timed_out = {
                    let mut session_guard = session.write().await;
                    session_guard.check_timeouts(PEER_TIMEOUT)
                };

                for addr in timed_out {
                    if let Err(e) = server_tx.send(ServerMessage::PeerTimeout { addr }) {
                        error!("Failed to send timeout message: {}", e);
                        break;
                    }
                }
            }
        });
    }

    async fn send_packet_impl(
        socket: &UdpSocket,
        packet: &Packet,
        addr: SocketAddr,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let data = serialize(packet)?;
        socket.send_to(&data, addr).await?;
        Ok(())
    }

    fn send_packet(&self, packet: &Packet, addr: SocketAddr) {
        if let Err(e) = self.relay_tx.send(RelayMessage::SendPacket {
            packet: packet.clone(),
            addr,
        }) {
            error!("Failed to queue packet for sending: {}", e);
        }
    }

    fn broadcast_packet(&self, packet: &Packet, exclude: Option<SocketAddr>) {
        if let Err(e) = self.relay_tx.send(RelayMessage::BroadcastPacket {
            packet: packet.clone(),
            exclude,
        }) {
            error!("Failed to queue broadcast packet: {}", e);
        }
    }

    /// Processes one inbound packet. Join handling, relays, and
    /// departures all go through here, one at a time.
    async fn handle_packet(&mut self, packet: Packet, addr: SocketAddr) {
        match packet {
            Packet::Connect { client_version } => {
                info!(
                    "Peer connecting from {} (version: {})",
                    addr, client_version
                );

                // A repeated connect from a seated address re-seats it.
                {
                    let mut session = self.session.write().await;
                    if session.contains(addr) {
                        debug!("Re-seating existing peer at {}", addr);
                        session.leave(addr);
                    }
                }

                let (slot, count) = {
                    let mut session = self.session.write().await;
                    let slot = session.join(addr);
                    (slot, session.len() as u8)
                };

                match slot.and_then(shared::PlayerSlot::from_number) {
                    Some(slot) => {
                        self.send_packet(&Packet::PlayerNumber { slot }, addr);
                        self.broadcast_packet(&Packet::NewPlayer { count }, None);
                        if count as usize == SESSION_CAPACITY {
                            info!("Both slots filled, starting multiplayer game");
                            self.broadcast_packet(&Packet::StartMultiplayerGame, None);
                        }
                    }
                    None => {
                        info!("Session full, rejecting {}", addr);
                        self.send_packet(&Packet::GameFull, addr);
                    }
                }
            }

            Packet::Ping => {
                let mut session = self.session.write().await;
                session.touch(addr);
            }

            Packet::MovePaddle { .. } | Packet::ServeBall => {
                {
                    let mut session = self.session.write().await;
                    session.touch(addr);
                }

                // Relayed verbatim to everyone else; the payload is
                // trusted as-is, like the original broker.
                if let Some(relayed) = relay_packet(&packet) {
                    self.broadcast_packet(&relayed, Some(addr));
                }
            }

            Packet::Disconnect => {
                self.handle_leave(addr).await;
            }

            _ => {
                warn!("Unexpected packet type from peer at {}", addr);
            }
        }
    }

    /// Removes a peer and announces the departure. When the session
    /// drops below two players the remaining peer is told to reset to
    /// singleplayer.
    async fn handle_leave(&mut self, addr: SocketAddr) {
        let (removed, remaining) = {
            let mut session = self.session.write().await;
            let removed = session.leave(addr);
            (removed, session.len())
        };

        if removed {
            self.announce_departure(remaining);
        }
    }

    fn announce_departure(&self, remaining: usize) {
        self.broadcast_packet(&Packet::PlayerLeft, None);
        if remaining < SESSION_CAPACITY {
            self.broadcast_packet(&Packet::ResetGame, None);
        }
    }

    /// Main event loop. Handlers never overlap; a departure is fully
    /// processed (cleanup and broadcasts queued in order) before the
    /// next message is taken.
    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.spawn_network_receiver();
        self.spawn_network_sender();
        self.spawn_timeout_checker();

        info!("Server started successfully");

        while let Some(message) = self.server_rx.recv().await {
            match message {
                ServerMessage::PacketReceived { packet, addr } => {
                    self.handle_packet(packet, addr).await;
                }
                ServerMessage::PeerTimeout { addr } => {
                    info!("Peer at {} timed out", addr);
                    let remaining = {
                        let session = self.session.read().await;
                        session.len()
                    };
                    self.announce_departure(remaining);
                }
                ServerMessage::Shutdown => {
                    info!("Server shutting down");
                    break;
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{PaddlePose, PlayerSlot};

    #[test]
    fn test_paddle_moves_relay_as_updates() {
        let packet = Packet::MovePaddle {
            player: PlayerSlot::One,
            position: PaddlePose { x: -8.0, z: 1.5 },
        };

        match relay_packet(&packet) {
            Some(Packet::UpdatePaddle { player, position }) => {
                assert_eq!(player, PlayerSlot::One);
                assert_eq!(position, PaddlePose { x: -8.0, z: 1.5 });
            }
            other => panic!("Unexpected relay result: {:?}", other),
        }
    }

    #[test]
    fn test_serve_relays_unchanged() {
        assert_eq!(relay_packet(&Packet::ServeBall), Some(Packet::ServeBall));
    }

    #[test]
    fn test_non_relay_packets_are_dropped() {
        assert_eq!(relay_packet(&Packet::Ping), None);
        assert_eq!(relay_packet(&Packet::Disconnect), None);
        assert_eq!(
            relay_packet(&Packet::Connect { client_version: 1 }),
            None
        );
        assert_eq!(relay_packet(&Packet::ResetGame), None);
    }

    #[test]
    fn test_broadcast_message_carries_exclusion() {
        let addr: SocketAddr = "127.0.0.1:9000".parse().unwrap();
        let msg = RelayMessage::BroadcastPacket {
            packet: Packet::PlayerLeft,
            exclude: Some(addr),
        };

        match msg {
            RelayMessage::BroadcastPacket { packet, exclude } => {
                assert_eq!(packet, Packet::PlayerLeft);
                assert_eq!(exclude, Some(addr));
            }
            _ => panic!("Unexpected message type"),
        }
    }
}
