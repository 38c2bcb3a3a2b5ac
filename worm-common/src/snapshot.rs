use crate::canvas::DrawCommand;
use crate::sim_params::Viewport;
use serde::{Deserialize, Serialize};

/// A recorded frame of the simulation.
#[derive(Debug, Clone, Serialize, Deserialize)] // Derive traits for easy saving/loading
pub struct Snapshot {
    /// The tick at which the frame was drawn.
    pub tick: u32,
    /// Viewport size at the time of drawing; the visualizer sizes its frames from it.
    pub viewport: Viewport,
    /// Head position of every worm, in population order.
    pub heads: Vec<(f32, f32)>,
    /// Every canvas call made while drawing this frame.
    pub commands: Vec<DrawCommand>,
}
