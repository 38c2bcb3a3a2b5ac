use crate::segment::Segment;
use rand::Rng;
use std::f32::consts::PI;
use worm_common::{trace_through_points, Canvas, Hsl, LineCap, LineJoin, Paint, Vec2};

/// Velocity retained after each tick.
const DRAG: f32 = 0.985;
/// Squared distance below which a target counts as reached.
const ARRIVAL_EPSILON_SQ: f32 = 1e-5;
/// Squared distance inside which `flee` reacts.
const FLEE_RADIUS_SQ: f32 = 100.0;
/// How much wider than the body the shadow stroke is.
const SHADOW_SPREAD: f32 = 8.0;
const SHADOW_PAINT: Paint = Paint::Rgba { r: 0, g: 0, b: 0, a: 0.1 };

/// Uniform draw in `[min, max)`; collapses to `min` for an empty range.
pub fn random_between<R: Rng + ?Sized>(rng: &mut R, min: f32, max: f32) -> f32 {
    min + rng.random::<f32>() * (max - min)
}

/// Axis-aligned box around a worm, already padded by half its thickness.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Bounds {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl Bounds {
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.x1 && p.x <= self.x2 && p.y >= self.y1 && p.y <= self.y2
    }

    /// True when no part of the box overlaps the `width` x `height` area at the origin.
    pub fn is_outside(&self, width: f32, height: f32) -> bool {
        self.x2 < 0.0 || self.x1 > width || self.y2 < 0.0 || self.y1 > height
    }
}

/// An articulated chain of joints that steers like a vehicle.
///
/// Steering calls (`wander`, `seek`, `flee`) only accumulate force; `update` turns the
/// accumulated force into motion of the head and drags the rest of the body after it.
#[derive(Debug, Clone)]
pub struct Worm {
    joints: Vec<Vec2>,
    segments: Vec<Segment>,
    velocity: Vec2,
    force: Vec2,
    meander: Vec2,
    jitter: f32,
    max_force: f32,
    thickness: f32,
    spacing: f32,
    color: Hsl,
}

impl Worm {
    /// Builds a worm of `length` segments with a loosely spiralling body around the origin.
    pub fn new<R: Rng + ?Sized>(
        length: usize,
        thickness: f32,
        spacing: f32,
        color: Hsl,
        rng: &mut R,
    ) -> Self {
        let jitter = random_between(rng, 0.2, 1.5);
        let max_force = random_between(rng, 0.08, 0.15);

        let mut joints = Vec::with_capacity(length + 1);
        let mut segments = Vec::with_capacity(length);
        let mut node = Vec2::zero();
        joints.push(node);

        for i in 0..length {
            let theta = i as f32 * random_between(rng, 0.2, 0.6);
            let radius = random_between(rng, 20.0, 40.0);
            node += Vec2::new(theta.sin(), theta.cos()) * radius;
            segments.push(Segment::new(spacing, i, i + 1));
            joints.push(node);
        }

        // Start with a random direction
        let mut meander = Vec2::new(1.0, 1.0);
        meander.rotate(random_between(rng, -PI, PI));

        Worm {
            joints,
            segments,
            velocity: Vec2::zero(),
            force: Vec2::zero(),
            meander,
            jitter,
            max_force,
            thickness,
            spacing,
            color,
        }
    }

    pub fn joints(&self) -> &[Vec2] {
        &self.joints
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn head(&self) -> Vec2 {
        self.joints[0]
    }

    pub fn tail(&self) -> Vec2 {
        self.joints[self.joints.len() - 1]
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn force(&self) -> Vec2 {
        self.force
    }

    pub fn meander(&self) -> Vec2 {
        self.meander
    }

    pub fn jitter(&self) -> f32 {
        self.jitter
    }

    pub fn max_force(&self) -> f32 {
        self.max_force
    }

    pub fn thickness(&self) -> f32 {
        self.thickness
    }

    pub fn set_thickness(&mut self, thickness: f32) {
        self.thickness = thickness;
    }

    pub fn spacing(&self) -> f32 {
        self.spacing
    }

    pub fn color(&self) -> Hsl {
        self.color
    }

    /// Sets the target distance of every segment.
    pub fn set_spacing(&mut self, spacing: f32) {
        self.spacing = spacing;
        for segment in &mut self.segments {
            segment.spacing = spacing;
        }
    }

    /// Moves only the head; the body catches up over the following updates.
    pub fn place_head(&mut self, position: Vec2) {
        self.joints[0].copy_from(position);
    }

    /// Shifts the whole body without changing its shape.
    pub fn translate(&mut self, offset: Vec2) {
        for joint in &mut self.joints {
            *joint += offset;
        }
    }

    /// Nudges the persistent heading by up to `jitter` radians and pushes along it.
    pub fn wander<R: Rng + ?Sized>(&mut self, rng: &mut R, multiplier: f32) {
        let turn = random_between(rng, -self.jitter, self.jitter);
        self.meander.rotate(turn);
        self.force += self.meander * multiplier;
    }

    pub fn seek(&mut self, target: Vec2, multiplier: f32) {
        let desired = target - self.head();
        if desired.magnitude_squared() > ARRIVAL_EPSILON_SQ {
            self.force += (desired - self.velocity) * multiplier;
        }
    }

    /// Steers away from `target`, but only once it is within a radius of 10.
    pub fn flee(&mut self, target: Vec2, multiplier: f32) {
        let desired = target - self.head();
        let distance_sq = desired.magnitude_squared();
        if distance_sq > ARRIVAL_EPSILON_SQ && distance_sq < FLEE_RADIUS_SQ {
            self.force += (self.velocity - desired) * multiplier;
        }
    }

    /// Integrates this tick's force and relaxes the body once, head to tail.
    pub fn update(&mut self) {
        // The accumulated force is capped to max_force whatever its size.
        self.force.normalize();
        self.force *= self.max_force;

        self.velocity += self.force;
        self.velocity *= DRAG;
        let velocity = self.velocity;
        self.joints[0] += velocity;

        self.force.reset();

        for segment in &self.segments {
            segment.relax(&mut self.joints);
        }
    }

    pub fn bounds(&self) -> Bounds {
        let radius = self.thickness * 0.5;
        let init = Bounds {
            x1: f32::INFINITY,
            y1: f32::INFINITY,
            x2: f32::NEG_INFINITY,
            y2: f32::NEG_INFINITY,
        };
        self.joints.iter().fold(init, |b, node| Bounds {
            x1: b.x1.min(node.x - radius),
            y1: b.y1.min(node.y - radius),
            x2: b.x2.max(node.x + radius),
            y2: b.y2.max(node.y + radius),
        })
    }

    /// Strokes the body as a Catmull-Rom ribbon, with an optional soft shadow underneath.
    pub fn draw<C: Canvas + ?Sized>(&self, canvas: &mut C, shadow: bool) {
        if shadow {
            self.stroke_body(canvas, SHADOW_PAINT, self.thickness + SHADOW_SPREAD);
        }
        self.stroke_body(canvas, Paint::Hsl(self.color), self.thickness);
    }

    fn stroke_body<C: Canvas + ?Sized>(&self, canvas: &mut C, paint: Paint, width: f32) {
        canvas.begin_path();
        trace_through_points(&self.joints, canvas);
        canvas.set_stroke_style(paint);
        canvas.set_line_width(width);
        canvas.set_line_join(LineJoin::Round);
        canvas.set_line_cap(LineCap::Round);
        canvas.stroke();
    }
}
