//! # Tennis Relay Server
//!
//! A lightweight session broker for two-player 3D tennis. The server
//! deliberately owns no ball physics: each client runs its own
//! simulation, and the broker's whole job is pairing the first two
//! connections into a match and relaying paddle and serve events
//! between them.
//!
//! ## Module Organization
//!
//! ### Session Module (`session`)
//! Pure slot bookkeeping: join-order seat assignment, count-based
//! renumbering after departures, and liveness tracking for the timeout
//! sweep. No networking, so it is fully unit-testable.
//!
//! ### Network Module (`network`)
//! The UDP reactor: a receiver task feeding a single event loop, an
//! outbound sender task, and a timeout sweeper. All session mutation
//! happens inside the event loop, one handler at a time.
//!
//! ## Trust Model
//!
//! Relayed paddle payloads are forwarded without bounds validation; the
//! clients are trusted, matching the original broker. A stricter
//! deployment would validate positions here before relaying.

pub mod network;
pub mod session;
