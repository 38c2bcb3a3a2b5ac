//! A software canvas that strokes worm paths into an RGBA image.

use image::{GrayImage, Luma, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_polygon_mut};
use imageproc::point::Point;
use palette::{FromColor, Hsl as PaletteHsl, Srgb};
use worm_common::{Canvas, LineCap, LineJoin, Paint};

/// Line pieces each Bezier segment is flattened into.
const BEZIER_STEPS: usize = 16;

/// Converts a canvas paint into 8-bit RGB plus its own alpha.
pub fn paint_to_rgba(paint: Paint) -> ([u8; 3], f32) {
    match paint {
        Paint::Hsl(c) => {
            let hsl: PaletteHsl = PaletteHsl::new(
                c.hue.rem_euclid(360.0),
                (c.saturation / 100.0).clamp(0.0, 1.0),
                (c.lightness / 100.0).clamp(0.0, 1.0),
            );
            let rgb: Srgb = Srgb::from_color(hsl);
            (
                [
                    (rgb.red * 255.0).round() as u8,
                    (rgb.green * 255.0).round() as u8,
                    (rgb.blue * 255.0).round() as u8,
                ],
                1.0,
            )
        }
        Paint::Rgba { r, g, b, a } => ([r, g, b], a.clamp(0.0, 1.0)),
    }
}

#[derive(Debug, Clone, Copy)]
struct StrokeState {
    paint: Paint,
    width: f32,
    join: LineJoin,
    cap: LineCap,
    global_alpha: f32,
}

impl Default for StrokeState {
    fn default() -> Self {
        StrokeState {
            paint: Paint::Rgba { r: 0, g: 0, b: 0, a: 1.0 },
            width: 1.0,
            join: LineJoin::default(),
            cap: LineCap::default(),
            global_alpha: 1.0,
        }
    }
}

/// Strokes paths into `image`, scaling world coordinates by `scale`.
///
/// Each stroke is rasterised into a coverage mask first and blended once, so overlapping
/// pieces of the same ribbon do not darken each other.
pub struct RasterCanvas<'a> {
    image: &'a mut RgbaImage,
    scale: f32,
    state: StrokeState,
    subpaths: Vec<Vec<(f32, f32)>>,
}

impl<'a> RasterCanvas<'a> {
    pub fn new(image: &'a mut RgbaImage, scale: f32) -> Self {
        RasterCanvas {
            image,
            scale,
            state: StrokeState::default(),
            subpaths: Vec::new(),
        }
    }

    fn current_point(&self) -> Option<(f32, f32)> {
        self.subpaths.last().and_then(|path| path.last().copied())
    }

    fn push_point(&mut self, x: f32, y: f32) {
        let p = (x * self.scale, y * self.scale);
        match self.subpaths.last_mut() {
            Some(path) => path.push(p),
            None => self.subpaths.push(vec![p]),
        }
    }

    /// Pixel box touched by the current path, padded by half the line width.
    fn stroke_extent(&self, half: f32) -> Option<(i32, i32, u32, u32)> {
        let points = self.subpaths.iter().flatten();
        let (mut x0, mut y0, mut x1, mut y1) = (f32::MAX, f32::MAX, f32::MIN, f32::MIN);
        for &(x, y) in points {
            x0 = x0.min(x);
            y0 = y0.min(y);
            x1 = x1.max(x);
            y1 = y1.max(y);
        }
        if x0 > x1 {
            return None;
        }
        let left = ((x0 - half).floor() as i32 - 1).max(0);
        let top = ((y0 - half).floor() as i32 - 1).max(0);
        let right = ((x1 + half).ceil() as i32 + 1).min(self.image.width() as i32);
        let bottom = ((y1 + half).ceil() as i32 + 1).min(self.image.height() as i32);
        if right <= left || bottom <= top {
            return None;
        }
        Some((left, top, (right - left) as u32, (bottom - top) as u32))
    }

    fn rasterize_mask(&self, left: i32, top: i32, mask: &mut GrayImage, half: f32) {
        let on = Luma([255u8]);
        let radius = half.round().max(1.0) as i32;
        let local = |(x, y): (f32, f32)| (x - left as f32, y - top as f32);
        let dot = |mask: &mut GrayImage, (x, y): (f32, f32)| {
            draw_filled_circle_mut(mask, (x.round() as i32, y.round() as i32), radius, on);
        };

        for path in &self.subpaths {
            let points: Vec<(f32, f32)> = path.iter().copied().map(local).collect();
            if points.len() == 1 {
                if self.state.cap == LineCap::Round {
                    dot(mask, points[0]);
                }
                continue;
            }
            for pair in points.windows(2) {
                let ((ax, ay), (bx, by)) = (pair[0], pair[1]);
                let (dx, dy) = (bx - ax, by - ay);
                let len = (dx * dx + dy * dy).sqrt();
                if len < f32::EPSILON {
                    continue;
                }
                let (nx, ny) = (-dy / len * half, dx / len * half);
                let quad = [
                    Point::new((ax + nx).round() as i32, (ay + ny).round() as i32),
                    Point::new((bx + nx).round() as i32, (by + ny).round() as i32),
                    Point::new((bx - nx).round() as i32, (by - ny).round() as i32),
                    Point::new((ax - nx).round() as i32, (ay - ny).round() as i32),
                ];
                if quad[0] != quad[3] {
                    draw_polygon_mut(mask, &quad, on);
                }
            }
            if self.state.join == LineJoin::Round {
                for &p in &points[1..points.len() - 1] {
                    dot(mask, p);
                }
            }
            if self.state.cap == LineCap::Round {
                dot(mask, points[0]);
                dot(mask, points[points.len() - 1]);
            }
        }
    }
}

impl Canvas for RasterCanvas<'_> {
    fn begin_path(&mut self) {
        self.subpaths.clear();
    }

    fn move_to(&mut self, x: f32, y: f32) {
        self.subpaths.push(vec![(x * self.scale, y * self.scale)]);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.push_point(x, y);
    }

    fn bezier_curve_to(&mut self, c1x: f32, c1y: f32, c2x: f32, c2y: f32, x: f32, y: f32) {
        // Without a current point the curve starts at its first control point.
        let (sx, sy) = match self.current_point() {
            Some((px, py)) => (px / self.scale, py / self.scale),
            None => {
                self.move_to(c1x, c1y);
                (c1x, c1y)
            }
        };
        for step in 1..=BEZIER_STEPS {
            let t = step as f32 / BEZIER_STEPS as f32;
            let u = 1.0 - t;
            let (b0, b1, b2, b3) = (u * u * u, 3.0 * u * u * t, 3.0 * u * t * t, t * t * t);
            self.push_point(
                b0 * sx + b1 * c1x + b2 * c2x + b3 * x,
                b0 * sy + b1 * c1y + b2 * c2y + b3 * y,
            );
        }
    }

    fn set_stroke_style(&mut self, paint: Paint) {
        self.state.paint = paint;
    }

    fn set_line_width(&mut self, width: f32) {
        self.state.width = width;
    }

    fn set_line_join(&mut self, join: LineJoin) {
        self.state.join = join;
    }

    fn set_line_cap(&mut self, cap: LineCap) {
        self.state.cap = cap;
    }

    fn set_global_alpha(&mut self, alpha: f32) {
        self.state.global_alpha = alpha.clamp(0.0, 1.0);
    }

    fn stroke(&mut self) {
        let half = (self.state.width * self.scale * 0.5).max(0.5);
        let Some((left, top, width, height)) = self.stroke_extent(half) else {
            return;
        };

        let mut mask = GrayImage::new(width, height);
        self.rasterize_mask(left, top, &mut mask, half);

        let ([r, g, b], paint_alpha) = paint_to_rgba(self.state.paint);
        let alpha = paint_alpha * self.state.global_alpha;
        for (mx, my, coverage) in mask.enumerate_pixels() {
            if coverage[0] == 0 {
                continue;
            }
            let a = alpha * coverage[0] as f32 / 255.0;
            let pixel = self.image.get_pixel_mut(left as u32 + mx, top as u32 + my);
            let Rgba([dr, dg, db, da]) = *pixel;
            let mix = |src: u8, dst: u8| (src as f32 * a + dst as f32 * (1.0 - a)).round() as u8;
            let out_alpha = (a * 255.0 + da as f32 * (1.0 - a)).round() as u8;
            *pixel = Rgba([mix(r, dr), mix(g, dg), mix(b, db), out_alpha]);
        }
    }
}
