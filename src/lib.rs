//! Arena Royale simulation core
//!
//! The authoritative tick engine for a real-time multiplayer arena game.
//! Advances world state at a fixed cadence, resolves combat with two-phase
//! damage application, tracks per-observer visibility, and emits minimal
//! state deltas for synchronization.
//!
//! Transport, packet encoding schemas, and map generation live outside this
//! crate; they interact with the core through [`net::sync::UpdateSink`] and
//! the command queue on [`game::game_loop::Game`].

pub mod config;
pub mod error;
pub mod util;
pub mod game;
pub mod net;
