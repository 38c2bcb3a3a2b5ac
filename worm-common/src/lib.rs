pub mod canvas;
pub mod config;
pub mod sim_params;
pub mod snapshot;
pub mod spline;
pub mod vecmath;

// Re-export key types for easier use by dependent crates
pub use canvas::{replay, Canvas, DrawCommand, Hsl, LineCap, LineJoin, Paint, RecordingCanvas};
pub use config::{ScheduledAction, ScheduledEvent, WormsConfig};
pub use sim_params::{ParamOverrides, SimParams, Viewport};
pub use snapshot::Snapshot;
pub use spline::{curve_through_points, trace_through_points};
pub use vecmath::Vec2;
