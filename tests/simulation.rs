use rand::rngs::StdRng;
use rand::SeedableRng;
use worm_common::{Hsl, RecordingCanvas, SimParams, Vec2, Viewport};
use worm_engine::{Simulation, Worm};

const CENTER: Vec2 = Vec2::new(400.0, 300.0);

fn lost_worms(seed: u64) -> Vec<Worm> {
    let mut rng = StdRng::seed_from_u64(seed);
    let starts = [
        Vec2::new(1400.0, 1100.0),
        Vec2::new(-700.0, -600.0),
        Vec2::new(1500.0, -500.0),
    ];
    starts
        .iter()
        .map(|&start| {
            let mut worm = Worm::new(5, 10.0, 2.0, Hsl::new(177.0, 42.0, 76.0), &mut rng);
            worm.translate(start - worm.head());
            worm
        })
        .collect()
}

#[test]
fn worms_outside_the_viewport_head_back_to_center() {
    let viewport = Viewport::new(800.0, 600.0);
    let worms = lost_worms(11);
    for worm in &worms {
        assert!(worm.bounds().is_outside(viewport.width, viewport.height));
    }
    let start: Vec<f32> = worms.iter().map(|w| (w.head() - CENTER).magnitude()).collect();

    let params = SimParams { num_worms: 3, ..SimParams::default() };
    let mut sim = Simulation::with_population(params, viewport, worms, 11);
    let mut canvas = RecordingCanvas::new();

    let mut halfway = Vec::new();
    for tick in 0..200 {
        assert!(sim.tick(&mut canvas));
        canvas.clear();
        if tick == 99 {
            halfway = sim.worms().iter().map(|w| (w.head() - CENTER).magnitude()).collect();
        }
    }

    for (i, worm) in sim.worms().iter().enumerate() {
        let end = (worm.head() - CENTER).magnitude();
        assert!(halfway[i] < start[i], "worm {i}: {} -> {}", start[i], halfway[i]);
        assert!(end < start[i] * 0.75, "worm {i}: {} -> {end}", start[i]);
    }
}

#[test]
fn single_worm_settles_deterministically() {
    let settle = |seed: u64| {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut worm = Worm::new(5, 10.0, 2.0, Hsl::new(46.0, 75.0, 70.0), &mut rng);
        for _ in 0..60 {
            worm.wander(&mut rng, 1.0);
            worm.update();
        }
        worm
    };

    let first = settle(2024);
    let second = settle(2024);
    assert_eq!(first.head(), second.head());
    assert!(first.bounds().contains(first.head()));
    assert_eq!(first.joints().len(), first.segments().len() + 1);

    // After settling the body hangs close to its target spacing.
    for pair in first.joints().windows(2) {
        assert!((pair[0] - pair[1]).magnitude() < 20.0);
    }
}

#[test]
fn resize_moves_the_homing_point() {
    let params = SimParams { num_worms: 4, ..SimParams::default() };
    let mut sim = Simulation::new(params, Viewport::new(800.0, 600.0), 5);
    sim.setup(Viewport::new(800.0, 600.0));
    sim.resize(2000.0, 1000.0);
    assert_eq!(sim.viewport().center(), Vec2::new(1000.0, 500.0));
    for _ in 0..10 {
        sim.update();
    }
    assert_eq!(sim.worms().len(), 4);
}

#[test]
fn worm_outside_resized_viewport_heads_for_new_center() {
    let new_center = Vec2::new(1000.0, 500.0);
    let mut rng = StdRng::seed_from_u64(21);
    let mut worm = Worm::new(5, 10.0, 2.0, Hsl::new(350.0, 65.0, 46.0), &mut rng);
    worm.translate(Vec2::new(2600.0, 1900.0) - worm.head());

    let params = SimParams { num_worms: 1, ..SimParams::default() };
    let mut sim = Simulation::with_population(params, Viewport::new(800.0, 600.0), vec![worm], 21);
    sim.resize(2000.0, 1000.0);
    assert!(sim.worms()[0].bounds().is_outside(2000.0, 1000.0));

    let start = (sim.worms()[0].head() - new_center).magnitude();
    for _ in 0..150 {
        sim.update();
    }
    let end = (sim.worms()[0].head() - new_center).magnitude();
    assert!(end < start - 100.0, "{start} -> {end}");
}
