use serde::{Deserialize, Serialize};
use std::fmt;

/// Hue in degrees, saturation and lightness in percent.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hsl {
    pub hue: f32,
    pub saturation: f32,
    pub lightness: f32,
}

impl Hsl {
    pub const fn new(hue: f32, saturation: f32, lightness: f32) -> Self {
        Hsl { hue, saturation, lightness }
    }
}

impl From<[f32; 3]> for Hsl {
    fn from([hue, saturation, lightness]: [f32; 3]) -> Self {
        Hsl::new(hue, saturation, lightness)
    }
}

/// Stroke colour handed to a canvas.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub enum Paint {
    Hsl(Hsl),
    /// RGB channels in 0..=255, alpha in 0..=1.
    Rgba { r: u8, g: u8, b: u8, a: f32 },
}

// Formats as a CSS colour string, the way a browser canvas expects `strokeStyle`.
impl fmt::Display for Paint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Paint::Hsl(c) => write!(f, "hsl({},{}%,{}%)", c.hue, c.saturation, c.lightness),
            Paint::Rgba { r, g, b, a } => write!(f, "rgba({},{},{},{})", r, g, b, a),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

/// The drawing surface the simulation renders into.
///
/// Mirrors the subset of the HTML canvas 2D context the worms use: a single current path
/// built from `move_to` / `line_to` / `bezier_curve_to`, stroked with the current style.
pub trait Canvas {
    fn begin_path(&mut self);
    fn move_to(&mut self, x: f32, y: f32);
    fn line_to(&mut self, x: f32, y: f32);
    fn bezier_curve_to(&mut self, c1x: f32, c1y: f32, c2x: f32, c2y: f32, x: f32, y: f32);
    fn set_stroke_style(&mut self, paint: Paint);
    fn set_line_width(&mut self, width: f32);
    fn set_line_join(&mut self, join: LineJoin);
    fn set_line_cap(&mut self, cap: LineCap);
    fn set_global_alpha(&mut self, alpha: f32);
    fn stroke(&mut self);
}

/// One canvas call, as captured by [`RecordingCanvas`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DrawCommand {
    BeginPath,
    MoveTo { x: f32, y: f32 },
    LineTo { x: f32, y: f32 },
    BezierCurveTo { c1x: f32, c1y: f32, c2x: f32, c2y: f32, x: f32, y: f32 },
    StrokeStyle(Paint),
    LineWidth(f32),
    LineJoin(LineJoin),
    LineCap(LineCap),
    GlobalAlpha(f32),
    Stroke,
}

/// A canvas that stores every call so a frame can be saved and replayed later.
#[derive(Debug, Clone, Default)]
pub struct RecordingCanvas {
    commands: Vec<DrawCommand>,
}

impl RecordingCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Hands back the recorded commands and leaves the canvas empty for the next frame.
    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

impl Canvas for RecordingCanvas {
    fn begin_path(&mut self) {
        self.commands.push(DrawCommand::BeginPath);
    }

    fn move_to(&mut self, x: f32, y: f32) {
        self.commands.push(DrawCommand::MoveTo { x, y });
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.commands.push(DrawCommand::LineTo { x, y });
    }

    fn bezier_curve_to(&mut self, c1x: f32, c1y: f32, c2x: f32, c2y: f32, x: f32, y: f32) {
        self.commands.push(DrawCommand::BezierCurveTo { c1x, c1y, c2x, c2y, x, y });
    }

    fn set_stroke_style(&mut self, paint: Paint) {
        self.commands.push(DrawCommand::StrokeStyle(paint));
    }

    fn set_line_width(&mut self, width: f32) {
        self.commands.push(DrawCommand::LineWidth(width));
    }

    fn set_line_join(&mut self, join: LineJoin) {
        self.commands.push(DrawCommand::LineJoin(join));
    }

    fn set_line_cap(&mut self, cap: LineCap) {
        self.commands.push(DrawCommand::LineCap(cap));
    }

    fn set_global_alpha(&mut self, alpha: f32) {
        self.commands.push(DrawCommand::GlobalAlpha(alpha));
    }

    fn stroke(&mut self) {
        self.commands.push(DrawCommand::Stroke);
    }
}

/// Plays recorded commands back onto another canvas, in order.
pub fn replay<C: Canvas + ?Sized>(commands: &[DrawCommand], canvas: &mut C) {
    for command in commands {
        match *command {
            DrawCommand::BeginPath => canvas.begin_path(),
            DrawCommand::MoveTo { x, y } => canvas.move_to(x, y),
            DrawCommand::LineTo { x, y } => canvas.line_to(x, y),
            DrawCommand::BezierCurveTo { c1x, c1y, c2x, c2y, x, y } => {
                canvas.bezier_curve_to(c1x, c1y, c2x, c2y, x, y)
            }
            DrawCommand::StrokeStyle(paint) => canvas.set_stroke_style(paint),
            DrawCommand::LineWidth(width) => canvas.set_line_width(width),
            DrawCommand::LineJoin(join) => canvas.set_line_join(join),
            DrawCommand::LineCap(cap) => canvas.set_line_cap(cap),
            DrawCommand::GlobalAlpha(alpha) => canvas.set_global_alpha(alpha),
            DrawCommand::Stroke => canvas.stroke(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paint_formats_as_css() {
        let hsl = Paint::Hsl(Hsl::new(349.0, 99.0, 63.0));
        assert_eq!(hsl.to_string(), "hsl(349,99%,63%)");
        let shadow = Paint::Rgba { r: 0, g: 0, b: 0, a: 0.1 };
        assert_eq!(shadow.to_string(), "rgba(0,0,0,0.1)");
    }

    #[test]
    fn replay_reproduces_recording() {
        let mut original = RecordingCanvas::new();
        original.set_global_alpha(0.5);
        original.begin_path();
        original.move_to(1.0, 2.0);
        original.line_to(3.0, 4.0);
        original.bezier_curve_to(1.0, 1.0, 2.0, 2.0, 3.0, 3.0);
        original.set_line_cap(LineCap::Round);
        original.stroke();

        let mut copy = RecordingCanvas::new();
        replay(original.commands(), &mut copy);
        assert_eq!(original.commands(), copy.commands());

        let taken = original.take_commands();
        assert_eq!(taken.len(), 7);
        assert!(original.commands().is_empty());
    }
}
