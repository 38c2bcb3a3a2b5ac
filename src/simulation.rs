use crate::worm::{random_between, Worm};
use anyhow::Result;
use log::{debug, info, trace, warn};
use rand::prelude::*;
use rayon::prelude::*;
use worm_common::{Canvas, Hsl, ParamOverrides, SimParams, Vec2, Viewport, WormsConfig};

/// Alpha applied to the whole population when drawing.
pub const GLOBAL_ALPHA: f32 = 0.92;
/// Wander/update rounds run on each new worm before its first frame.
pub const SETTLE_TICKS: usize = 60;
/// How far from the centre new worms are placed, per axis.
const SPAWN_SPREAD: (f32, f32) = (300.0, 100.0);
/// Maximum shift applied to each HSL channel of a palette colour.
const COLOR_VARIATION: f32 = 10.0;

/// Owns the worm population and the viewport, and advances them one tick at a time.
pub struct Simulation {
    params: SimParams,
    viewport: Viewport,
    worms: Vec<Worm>,
    /// One random stream per worm, so worms can be advanced in any order or in parallel.
    streams: Vec<StdRng>,
    /// Host-side RNG for setup and refresh.
    rng: StdRng,
    running: bool,
    current_tick: u64,
}

impl Simulation {
    /// Creates an empty simulation; call [`Simulation::setup`] to populate it.
    pub fn new(mut params: SimParams, viewport: Viewport, seed: u64) -> Self {
        params.sanitize();
        Simulation {
            params,
            viewport,
            worms: Vec::new(),
            streams: Vec::new(),
            rng: StdRng::seed_from_u64(seed),
            running: true,
            current_tick: 0,
        }
    }

    /// Builds and populates a simulation from a loaded configuration.
    pub fn from_config(config: &WormsConfig) -> Result<Self> {
        config.validate()?;
        let mut sim = Self::new(
            config.get_sim_params(),
            config.viewport(),
            config.initial_conditions.seed,
        );
        sim.setup(config.viewport());
        Ok(sim)
    }

    /// Uses an existing set of worms instead of generating one.
    pub fn with_population(params: SimParams, viewport: Viewport, worms: Vec<Worm>, seed: u64) -> Self {
        let mut sim = Self::new(params, viewport, seed);
        sim.streams = (0..worms.len())
            .map(|_| StdRng::seed_from_u64(sim.rng.random()))
            .collect();
        sim.worms = worms;
        sim
    }

    /// Replaces the population with freshly generated, pre-settled worms.
    pub fn setup(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        let center = viewport.center();
        let count = self.params.num_worms as usize;
        info!(
            "Spawning {} worms around ({:.1}, {:.1}) in a {}x{} viewport.",
            count, center.x, center.y, viewport.width, viewport.height
        );

        self.worms.clear();
        self.streams.clear();
        for i in 0..count {
            let mut stream = StdRng::seed_from_u64(self.rng.random());
            let mut worm = self.spawn_worm(i, center, &mut stream);
            for _ in 0..SETTLE_TICKS {
                worm.wander(&mut stream, 1.0);
                worm.update();
            }
            debug!(
                "Worm {}: {} segments, thickness {:.2}, spacing {:.2}, head ({:.1}, {:.1})",
                i,
                worm.segments().len(),
                worm.thickness(),
                worm.spacing(),
                worm.head().x,
                worm.head().y
            );
            self.worms.push(worm);
            self.streams.push(stream);
        }
        self.current_tick = 0;
    }

    fn spawn_worm(&mut self, index: usize, center: Vec2, stream: &mut StdRng) -> Worm {
        let params = &self.params;
        let rng = &mut self.rng;

        let length = random_between(rng, params.min_length, params.max_length);
        let thickness = length * random_between(rng, 0.5, 1.5);
        let spacing = random_between(rng, params.min_spacing, params.max_spacing);

        let base = params.palette[index % params.palette.len()];
        let color = Hsl::new(
            base.hue + random_between(rng, -COLOR_VARIATION, COLOR_VARIATION),
            base.saturation + random_between(rng, -COLOR_VARIATION, COLOR_VARIATION),
            base.lightness + random_between(rng, -COLOR_VARIATION, COLOR_VARIATION),
        );

        let mut worm = Worm::new(length.ceil() as usize, thickness, spacing, color, stream);

        // Position the worm around the center
        let offset = Vec2::new(
            random_between(rng, -SPAWN_SPREAD.0, SPAWN_SPREAD.0),
            random_between(rng, -SPAWN_SPREAD.1, SPAWN_SPREAD.1),
        );
        worm.place_head(center + offset);
        worm
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        debug!("Viewport resized to {}x{}.", width, height);
        self.viewport = Viewport::new(width, height);
    }

    /// Applies `overrides`, then re-rolls every worm's spacing and thickness in place.
    pub fn refresh(&mut self, overrides: &ParamOverrides) {
        let previous_count = self.params.num_worms;
        self.params.apply(overrides);
        if self.params.num_worms != previous_count {
            warn!(
                "Worm count changed from {} to {}; it takes effect at the next setup.",
                previous_count, self.params.num_worms
            );
        }

        let params = &self.params;
        for worm in &mut self.worms {
            worm.set_spacing(random_between(&mut self.rng, params.min_spacing, params.max_spacing));
            worm.set_thickness(random_between(&mut self.rng, params.min_thickness, params.max_thickness));
        }
        info!(
            "Refreshed {} worms (spacing {:.1}-{:.1}, thickness {:.1}-{:.1}).",
            self.worms.len(),
            params.min_spacing,
            params.max_spacing,
            params.min_thickness,
            params.max_thickness
        );
    }

    /// Steers every worm and advances it one step.
    pub fn update(&mut self) {
        let viewport = self.viewport;
        if self.params.parallel {
            self.worms
                .par_iter_mut()
                .zip(self.streams.par_iter_mut())
                .for_each(|(worm, stream)| advance_worm(worm, stream, viewport));
        } else {
            self.worms
                .iter_mut()
                .zip(self.streams.iter_mut())
                .for_each(|(worm, stream)| advance_worm(worm, stream, viewport));
        }
        self.current_tick += 1;
        trace!("Tick {} advanced {} worms.", self.current_tick, self.worms.len());
    }

    /// Draws the population back to front: the first worm created ends up on top.
    pub fn draw<C: Canvas + ?Sized>(&self, canvas: &mut C) {
        canvas.set_global_alpha(GLOBAL_ALPHA);
        for worm in self.worms.iter().rev() {
            worm.draw(canvas, self.params.shadow);
        }
    }

    /// One host frame: update then draw, unless stopped.
    pub fn tick<C: Canvas + ?Sized>(&mut self, canvas: &mut C) -> bool {
        if !self.running {
            return false;
        }
        self.update();
        self.draw(canvas);
        true
    }

    /// Starts or stops the animation, returning whether it is now running.
    pub fn toggle(&mut self) -> bool {
        self.running = !self.running;
        info!("Animation {}.", if self.running { "started" } else { "stopped" });
        self.running
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn set_max_thickness(&mut self, value: f32) {
        self.params.set_max_thickness(value);
        self.params.sanitize();
    }

    pub fn set_max_spacing(&mut self, value: f32) {
        self.params.set_max_spacing(value);
        self.params.sanitize();
    }

    pub fn set_shadow(&mut self, enabled: bool) {
        self.params.shadow = enabled;
    }

    pub fn params(&self) -> &SimParams {
        &self.params
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn worms(&self) -> &[Worm] {
        &self.worms
    }

    pub fn current_tick(&self) -> u64 {
        self.current_tick
    }

    /// Head position of every worm, in population order.
    pub fn heads(&self) -> Vec<(f32, f32)> {
        self.worms.iter().map(|w| (w.head().x, w.head().y)).collect()
    }
}

/// Wander, head home if the whole body has left the viewport, then move.
fn advance_worm(worm: &mut Worm, stream: &mut StdRng, viewport: Viewport) {
    worm.wander(stream, 1.0);
    if worm.bounds().is_outside(viewport.width, viewport.height) {
        worm.seek(viewport.center(), 1.0);
    }
    worm.update();
}

#[cfg(test)]
mod tests {
    use super::*;
    use worm_common::{DrawCommand, Paint, RecordingCanvas};

    fn params(count: u32) -> SimParams {
        SimParams { num_worms: count, ..SimParams::default() }
    }

    fn populated(count: u32, seed: u64) -> Simulation {
        let mut sim = Simulation::new(params(count), Viewport::new(800.0, 600.0), seed);
        sim.setup(Viewport::new(800.0, 600.0));
        sim
    }

    #[test]
    fn setup_spawns_configured_population() {
        let sim = populated(12, 1);
        assert_eq!(sim.worms().len(), 12);
        for worm in sim.worms() {
            let segments = worm.segments().len();
            assert!((5..=35).contains(&segments), "{segments}");
            assert!((1.0..=4.0).contains(&worm.spacing()));
            assert!(worm.head().x.is_finite() && worm.head().y.is_finite());
        }
    }

    #[test]
    fn setup_draws_colour_and_thickness_from_params() {
        let sim = populated(16, 12);
        let palette = &sim.params().palette;
        for (i, worm) in sim.worms().iter().enumerate() {
            let base = palette[i % palette.len()];
            let color = worm.color();
            assert!((color.hue - base.hue).abs() <= COLOR_VARIATION, "worm {i}: {color:?}");
            assert!((color.saturation - base.saturation).abs() <= COLOR_VARIATION);
            assert!((color.lightness - base.lightness).abs() <= COLOR_VARIATION);

            // Body length is the drawn length rounded up, so the drawn length lies in (n - 1, n].
            let segments = worm.segments().len() as f32;
            let thickness = worm.thickness();
            assert!(thickness >= 0.5 * (segments - 1.0), "worm {i}: {thickness} for {segments}");
            assert!(thickness <= 1.5 * segments, "worm {i}: {thickness} for {segments}");
        }
    }

    #[test]
    fn spawned_heads_land_near_center() {
        let mut sim = Simulation::new(params(0), Viewport::new(800.0, 600.0), 13);
        let center = sim.viewport().center();
        let mut stream = StdRng::seed_from_u64(14);
        for i in 0..50 {
            let worm = sim.spawn_worm(i, center, &mut stream);
            let offset = worm.head() - center;
            assert!(offset.x.abs() <= SPAWN_SPREAD.0, "{offset:?}");
            assert!(offset.y.abs() <= SPAWN_SPREAD.1, "{offset:?}");
        }
    }

    #[test]
    fn empty_palette_is_replaced_before_setup() {
        let params = SimParams { num_worms: 3, palette: Vec::new(), ..SimParams::default() };
        let mut sim = Simulation::new(params, Viewport::new(800.0, 600.0), 15);
        sim.setup(Viewport::new(800.0, 600.0));
        assert_eq!(sim.worms().len(), 3);
        assert!(!sim.params().palette.is_empty());
    }

    #[test]
    fn setup_is_reproducible_from_the_seed() {
        let (a, b) = (populated(5, 9), populated(5, 9));
        assert_eq!(a.heads(), b.heads());
        assert_ne!(a.heads(), populated(5, 10).heads());
    }

    #[test]
    fn parallel_and_serial_updates_agree() {
        let mut parallel = populated(6, 3);
        let mut serial = populated(6, 3);
        serial.params.parallel = false;
        for _ in 0..25 {
            parallel.update();
            serial.update();
        }
        assert_eq!(parallel.heads(), serial.heads());
    }

    #[test]
    fn draw_paints_last_worm_first() {
        let sim = populated(3, 4);
        let mut canvas = RecordingCanvas::new();
        sim.draw(&mut canvas);

        assert_eq!(canvas.commands()[0], DrawCommand::GlobalAlpha(GLOBAL_ALPHA));
        let colors: Vec<_> = canvas
            .commands()
            .iter()
            .filter_map(|c| match c {
                DrawCommand::StrokeStyle(Paint::Hsl(hsl)) => Some(*hsl),
                _ => None,
            })
            .collect();
        let expected: Vec<_> = sim.worms().iter().rev().map(|w| w.color()).collect();
        assert_eq!(colors, expected);
    }

    #[test]
    fn refresh_rerolls_size_but_keeps_shape() {
        let mut sim = populated(4, 5);
        let joints_before: Vec<_> = sim.worms().iter().map(|w| w.joints().to_vec()).collect();
        sim.refresh(&ParamOverrides {
            min_thickness: Some(30.0),
            max_thickness: Some(40.0),
            min_spacing: Some(6.0),
            max_spacing: Some(8.0),
            ..Default::default()
        });
        for (worm, before) in sim.worms().iter().zip(&joints_before) {
            assert_eq!(worm.joints(), before.as_slice());
            assert!((30.0..=40.0).contains(&worm.thickness()));
            assert!((6.0..=8.0).contains(&worm.spacing()));
            assert!(worm.segments().iter().all(|s| s.spacing == worm.spacing()));
        }
    }

    #[test]
    fn stopped_simulation_does_not_tick() {
        let mut sim = populated(2, 6);
        let mut canvas = RecordingCanvas::new();
        assert!(!sim.toggle());
        assert!(!sim.tick(&mut canvas));
        assert!(canvas.commands().is_empty());
        assert_eq!(sim.current_tick(), 0);

        assert!(sim.toggle());
        assert!(sim.tick(&mut canvas));
        assert_eq!(sim.current_tick(), 1);
        assert!(!canvas.commands().is_empty());
    }

    #[test]
    fn shadow_toggle_changes_stroke_count() {
        let mut sim = populated(2, 7);
        let count_strokes = |sim: &Simulation| {
            let mut canvas = RecordingCanvas::new();
            sim.draw(&mut canvas);
            canvas.commands().iter().filter(|c| **c == DrawCommand::Stroke).count()
        };
        assert_eq!(count_strokes(&sim), 4);
        sim.set_shadow(false);
        assert_eq!(count_strokes(&sim), 2);
    }

    #[test]
    fn live_limits_clamp() {
        let mut sim = populated(1, 8);
        sim.set_max_thickness(1000.0);
        sim.set_max_spacing(0.5);
        assert_eq!(sim.params().max_thickness, 80.0);
        assert_eq!(sim.params().max_spacing, 1.0);
    }
}
