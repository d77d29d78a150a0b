//! Simulation core: state, systems, and the instance driver

pub mod constants;
pub mod dirty;
pub mod game_loop;
pub mod ids;
pub mod lifecycle;
pub mod object;
pub mod state;
pub mod systems;
pub mod visibility;
