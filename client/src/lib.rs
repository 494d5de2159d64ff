//! # Tennis Client Library
//!
//! The playable side of the two-player 3D tennis game. Each client runs
//! its own full ball simulation; the relay server never simulates.
//! Multiplayer consistency is deliberately loose: the only state shared
//! between clients is relayed paddle poses and serve triggers, so both
//! simulations start each rally identically and drift is accepted.
//!
//! ## Module Organization
//!
//! ### Game Module (`game`)
//! The simulation context: ball flight with gravity, floor bounces,
//! wall and net interaction, paddle returns, the double-bounce serving
//! fault, and tennis scoring with serve rotation.
//!
//! ### Input Module (`input`)
//! Discrete key-press handling: one key event moves the local paddle
//! one step and emits the relayed paddle packet; the serve key is
//! honored only for the designated server.
//!
//! ### AI Module (`ai`)
//! The single-player opponent driving paddle two: dead-zone chase
//! steering and a one-shot deferred serve.
//!
//! ### Network Module (`network`)
//! A non-blocking UDP link to the relay server plus the per-frame
//! orchestration that keeps network handling, input, simulation, and
//! rendering on one logical thread.
//!
//! ### Rendering Module (`rendering`)
//! Top-down macroquad presentation of the court, paddles, ball, and
//! scoreboard. Cosmetic only.

pub mod ai;
pub mod game;
pub mod input;
pub mod network;
pub mod rendering;
