//! Worm simulation engine: steering, chain relaxation and the population driver.

pub mod segment;
pub mod simulation;
pub mod worm;

pub use segment::Segment;
pub use simulation::Simulation;
pub use worm::{Bounds, Worm};
