//! **maze_race**: two players race through a freshly carved perfect maze to a
//! shared goal.
//!
//! A round is built bottom-up: [`grid`] allocates the lattice, [`generator`] carves a
//! spanning tree of open passages, [`geometry`] turns the closed boundaries into
//! wall rectangles, and [`game`] hands the result to a [`physics::PhysicsEngine`]
//! and keeps score.

pub mod config;
pub mod error;
pub mod game;
pub mod generator;
pub mod geometry;
pub mod grid;
pub mod input;
pub mod physics;
pub mod player;
pub mod render;

pub use error::{Error, Result};
