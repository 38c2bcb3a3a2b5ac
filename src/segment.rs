use worm_common::Vec2;

/// Lower bound on the measured length, so a collapsed segment does not divide by zero.
const MIN_DISTANCE: f32 = 1e-6;
/// Extra damping on every correction.
const DAMPING: f32 = 0.99;
/// Share of the correction taken by the tail; the head takes the rest.
const TAIL_SHARE: f32 = 0.998;

/// A distance constraint between two joints of a worm, stored as indices into its joints.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub spacing: f32,
    pub head: usize,
    pub tail: usize,
}

impl Segment {
    pub fn new(spacing: f32, head: usize, tail: usize) -> Self {
        Segment { spacing, head, tail }
    }

    /// One relaxation step: pulls the pair toward `spacing`, almost all of it on the tail.
    ///
    /// The step is damped and never iterated, so a fast-turning worm stretches.
    pub fn relax(&self, joints: &mut [Vec2]) {
        let head = joints[self.head];
        let tail = joints[self.tail];

        let delta = head - tail;
        let dist = delta.magnitude().max(MIN_DISTANCE);
        let force = (0.5 - self.spacing / dist * 0.5) * DAMPING;
        let correction = delta * force;

        joints[self.tail] += correction * (TAIL_SHARE * 2.0);
        joints[self.head] -= correction * ((1.0 - TAIL_SHARE) * 2.0);
    }
}
