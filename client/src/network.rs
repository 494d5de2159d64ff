//! Client networking and the per-frame orchestration loop.
//!
//! The window loop owns the one logical thread of control: every frame
//! drains the socket, applies input, advances the simulation, runs the
//! AI, and renders. Network handlers therefore never interleave with a
//! simulation tick. The socket is a non-blocking UDP socket polled once
//! per frame; there is no second runtime behind the renderer.

use crate::ai::AiOpponent;
use crate::game::TennisGame;
use crate::input::InputController;
use crate::rendering::Renderer;
use bincode::{deserialize, serialize};
use log::{error, info, warn};
use shared::{GameMode, Packet, PlayerSlot, PROTOCOL_VERSION};
use std::io::ErrorKind;
use std::net::{SocketAddr, UdpSocket};
use std::time::{Duration, Instant};

const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(1);

/// Non-blocking datagram link to the relay server.
pub struct Connection {
    socket: UdpSocket,
    server_addr: SocketAddr,
    last_keepalive: Instant,
}

impl Connection {
    /// Binds a local socket and announces the client to the server.
    /// UDP carries no handshake, so "connected" simply means the join
    /// request went out; identity arrives with `PlayerNumber`.
    pub fn connect(server: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.set_nonblocking(true)?;
        let server_addr = server.parse()?;

        let connection = Self {
            socket,
            server_addr,
            last_keepalive: Instant::now(),
        };
        connection.send(&Packet::Connect {
            client_version: PROTOCOL_VERSION,
        });

        Ok(connection)
    }

    /// Sends one packet. Send failures are logged and dropped; losing a
    /// datagram is never fatal on the client.
    pub fn send(&self, packet: &Packet) {
        match serialize(packet) {
            Ok(data) => {
                if let Err(e) = self.socket.send_to(&data, self.server_addr) {
                    error!("Failed to send packet: {}", e);
                }
            }
            Err(e) => error!("Failed to serialize packet: {}", e),
        }
    }

    /// Drains every datagram currently queued on the socket.
    pub fn poll(&mut self) -> Vec<Packet> {
        let mut packets = Vec::new();
        let mut buffer = [0u8; 2048];

        loop {
            match self.socket.recv_from(&mut buffer) {
                Ok((len, from)) => {
                    if from != self.server_addr {
                        continue;
                    }
                    match deserialize::<Packet>(&buffer[0..len]) {
                        Ok(packet) => packets.push(packet),
                        Err(_) => warn!("Failed to deserialize packet from {}", from),
                    }
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) => {
                    error!("Error receiving packet: {}", e);
                    break;
                }
            }
        }

        packets
    }

    /// Keeps the server's liveness window open between paddle moves.
    pub fn maintain(&mut self) {
        if self.last_keepalive.elapsed() >= KEEPALIVE_INTERVAL {
            self.send(&Packet::Ping);
            self.last_keepalive = Instant::now();
        }
    }

    pub fn disconnect(&self) {
        self.send(&Packet::Disconnect);
    }
}

/// The playable client: simulation, input, AI, network, and renderer.
pub struct Client {
    connection: Connection,
    game: TennisGame,
    input: InputController,
    ai: AiOpponent,
    renderer: Renderer,
    local_slot: Option<PlayerSlot>,
    notice: Option<String>,
}

impl Client {
    pub fn new(server: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let connection = Connection::connect(server)?;

        Ok(Client {
            connection,
            game: TennisGame::new(),
            input: InputController::new(),
            ai: AiOpponent::new(),
            renderer: Renderer::new(),
            local_slot: None,
            notice: None,
        })
    }

    /// One frame: network in, input, simulation tick, AI, network
    /// upkeep, render.
    pub fn frame(&mut self) {
        for packet in self.connection.poll() {
            self.handle_packet(packet);
        }

        let frame = self.input.poll();
        for packet in self.input.apply(&mut self.game, self.local_slot, &frame) {
            self.connection.send(&packet);
        }

        self.game.tick();
        self.ai.update(&mut self.game);
        self.connection.maintain();

        self.renderer
            .render(&self.game, self.local_slot, self.notice.as_deref());
    }

    fn handle_packet(&mut self, packet: Packet) {
        match packet {
            Packet::PlayerNumber { slot } => {
                info!("Assigned player number {}", slot.number());
                self.local_slot = Some(slot);
            }

            Packet::NewPlayer { count } => {
                info!("Player count is now {}", count);
                if count == 2 && self.game.mode != GameMode::Multiplayer {
                    self.notice = Some("New player connected. Starting multiplayer game.".into());
                    self.game.start_multiplayer();
                }
            }

            Packet::StartMultiplayerGame => {
                info!("Multiplayer game starting");
                self.game.start_multiplayer();
            }

            Packet::UpdatePaddle { player, position } => {
                self.game.apply_remote_paddle(player, position);
            }

            Packet::ServeBall => {
                self.game.serve();
            }

            Packet::ResetGame => {
                self.notice = Some("Player disconnected. Switching to single-player mode.".into());
                self.game.reset_to_singleplayer();
            }

            Packet::PlayerLeft => {
                self.notice = Some("Player disconnected.".into());
            }

            Packet::GameFull => {
                warn!("Server rejected the join: game is full");
                self.notice = Some("Game is full. Spectating is not supported.".into());
                self.local_slot = None;
            }

            _ => {
                warn!("Unexpected packet type");
            }
        }
    }

    pub fn shutdown(&self) {
        self.connection.disconnect();
    }
}
