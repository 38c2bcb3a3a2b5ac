//! Catmull-Rom curves emitted as cubic Bezier segments.

use crate::canvas::Canvas;
use crate::vecmath::Vec2;

const SIXTH: f32 = 1.0 / 6.0;

/// Appends one cubic Bezier per interior span of `points` to the canvas' current path.
///
/// For each window `p0..p3` the segment runs to `p2`, with control points taken from the
/// uniform Catmull-Rom tangents. Fewer than four points emit nothing. The caller is
/// responsible for starting a sub-path first; see [`trace_through_points`].
pub fn curve_through_points<C: Canvas + ?Sized>(points: &[Vec2], canvas: &mut C) {
    for window in points.windows(4) {
        let (p0, p1, p2, p3) = (window[0], window[1], window[2], window[3]);
        canvas.bezier_curve_to(
            p2.x * SIXTH + p1.x - p0.x * SIXTH,
            p2.y * SIXTH + p1.y - p0.y * SIXTH,
            p3.x * -SIXTH + p2.x + p1.x * SIXTH,
            p3.y * -SIXTH + p2.y + p1.y * SIXTH,
            p2.x,
            p2.y,
        );
    }
}

/// Starts a sub-path at `points[0]`, then emits the curve.
/// Does nothing for fewer than four points.
pub fn trace_through_points<C: Canvas + ?Sized>(points: &[Vec2], canvas: &mut C) {
    if points.len() < 4 {
        return;
    }
    canvas.move_to(points[0].x, points[0].y);
    curve_through_points(points, canvas);
}
