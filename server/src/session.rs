//! Session bookkeeping for a single two-player match.
//!
//! The session is an ordered list of at most two peers. A peer's slot
//! number is its position in the list at join time, so slot numbers are
//! derived purely from the current connection count: after a departure
//! the list compacts and the next joiner fills the freed position. There
//! is no persistent identity-to-slot mapping, which means a reconnecting
//! player may come back under a different number.

use log::info;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// Maximum players per match.
pub const SESSION_CAPACITY: usize = 2;

/// Peers silent for this long are treated as disconnected. The client's
/// one-second keep-alive ping stays well inside this window.
pub const PEER_TIMEOUT: Duration = Duration::from_secs(5);

/// One connected player.
#[derive(Debug)]
pub struct Peer {
    pub addr: SocketAddr,
    /// Last time any packet arrived from this address.
    pub last_seen: Instant,
}

impl Peer {
    fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            last_seen: Instant::now(),
        }
    }

    pub fn is_timed_out(&self, timeout: Duration) -> bool {
        self.last_seen.elapsed() > timeout
    }
}

/// The player list for one match, ordered by arrival.
#[derive(Debug, Default)]
pub struct Session {
    peers: Vec<Peer>,
}

impl Session {
    pub fn new() -> Self {
        Self { peers: Vec::new() }
    }

    /// Seats a new peer and returns its slot number (1 or 2), or `None`
    /// when both slots are occupied.
    pub fn join(&mut self, addr: SocketAddr) -> Option<u8> {
        if self.peers.len() >= SESSION_CAPACITY {
            return None;
        }

        self.peers.push(Peer::new(addr));
        let slot = self.peers.len() as u8;
        info!("Player {} joined from {}", slot, addr);
        Some(slot)
    }

    /// Removes a peer. Returns true if the address was seated.
    pub fn leave(&mut self, addr: SocketAddr) -> bool {
        let before = self.peers.len();
        self.peers.retain(|peer| peer.addr != addr);
        if self.peers.len() < before {
            info!("Player at {} left ({} remaining)", addr, self.peers.len());
            true
        } else {
            false
        }
    }

    pub fn contains(&self, addr: SocketAddr) -> bool {
        self.peers.iter().any(|peer| peer.addr == addr)
    }

    /// Refreshes the liveness timestamp for a peer.
    pub fn touch(&mut self, addr: SocketAddr) {
        if let Some(peer) = self.peers.iter_mut().find(|peer| peer.addr == addr) {
            peer.last_seen = Instant::now();
        }
    }

    /// Removes every peer that has been silent past `timeout` and
    /// returns their addresses for follow-up broadcasts.
    pub fn check_timeouts(&mut self, timeout: Duration) -> Vec<SocketAddr> {
        let timed_out: Vec<SocketAddr> = self
            .peers
            .iter()
            .filter(|peer| peer.is_timed_out(timeout))
            .map(|peer| peer.addr)
            .collect();

        for addr in &timed_out {
            self.leave(*addr);
        }

        timed_out
    }

    /// All seated addresses, in slot order.
    pub fn addrs(&self) -> Vec<SocketAddr> {
        self.peers.iter().map(|peer| peer.addr).collect()
    }

    /// All seated addresses except `addr`. Relays go here.
    pub fn others(&self, addr: SocketAddr) -> Vec<SocketAddr> {
        self.peers
            .iter()
            .map(|peer| peer.addr)
            .filter(|other| *other != addr)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(port: u16) -> SocketAddr {
        format!("127.0.0.1:{}", port).parse().unwrap()
    }

    #[test]
    fn test_slots_assigned_by_arrival_order() {
        let mut session = Session::new();
        assert_eq!(session.join(addr(9001)), Some(1));
        assert_eq!(session.join(addr(9002)), Some(2));
        assert_eq!(session.len(), 2);
    }

    #[test]
    fn test_third_join_is_rejected() {
        let mut session = Session::new();
        session.join(addr(9001));
        session.join(addr(9002));

        assert_eq!(session.join(addr(9003)), None);
        assert_eq!(session.len(), 2);
        assert!(!session.contains(addr(9003)));
    }

    #[test]
    fn test_slot_numbers_derive_from_count_after_leave() {
        let mut session = Session::new();
        session.join(addr(9001));
        session.join(addr(9002));

        assert!(session.leave(addr(9001)));
        assert_eq!(session.len(), 1);

        // One seat free again: the next joiner gets slot 2, not 3.
        assert_eq!(session.join(addr(9003)), Some(2));

        // With everyone gone, a fresh joiner starts back at slot 1.
        session.leave(addr(9002));
        session.leave(addr(9003));
        assert_eq!(session.join(addr(9001)), Some(1));
    }

    #[test]
    fn test_leave_unknown_address_is_a_no_op() {
        let mut session = Session::new();
        session.join(addr(9001));

        assert!(!session.leave(addr(9099)));
        assert_eq!(session.len(), 1);
    }

    #[test]
    fn test_others_excludes_the_sender() {
        let mut session = Session::new();
        session.join(addr(9001));
        session.join(addr(9002));

        assert_eq!(session.others(addr(9001)), vec![addr(9002)]);
        assert_eq!(session.others(addr(9002)), vec![addr(9001)]);
        assert_eq!(session.addrs().len(), 2);
    }

    #[test]
    fn test_touch_keeps_peer_alive() {
        let mut session = Session::new();
        session.join(addr(9001));

        session.touch(addr(9001));
        assert!(session.check_timeouts(Duration::from_secs(1)).is_empty());
        assert_eq!(session.len(), 1);
    }

    #[test]
    fn test_silent_peers_time_out() {
        let mut session = Session::new();
        session.join(addr(9001));
        session.join(addr(9002));

        // Back-date one peer past the deadline.
        session.peers[0].last_seen = Instant::now() - Duration::from_secs(2);

        let expired = session.check_timeouts(Duration::from_secs(1));
        assert_eq!(expired, vec![addr(9001)]);
        assert_eq!(session.len(), 1);
        assert!(session.contains(addr(9002)));
    }
}
