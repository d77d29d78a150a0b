pub mod combat;
pub mod gas;
pub mod movement;
pub mod physics;
