//! Built-in systems

pub mod movement;

pub use movement::MovementSystem;
