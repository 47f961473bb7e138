use band_field::app::synth_bands;
use band_field::band::Band;
use band_field::engine::{EngineError, EngineState, FieldEngine};
use band_field::grid::LINE_STRIDE;
use band_field::params::FieldParams;
use band_field::particle::flatten_positions;

#[test]
fn tick_before_initialize_is_rejected() {
    let mut engine = FieldEngine::with_seed(FieldParams::default(), 1);
    assert_eq!(engine.state(), EngineState::Uninitialized);

    let err = engine
        .tick(&[Band::new(0.0, 0.0, 1.0, 1.0)])
        .expect_err("tick without init must fail");
    assert_eq!(err, EngineError::Uninitialized);
    assert_eq!(engine.state(), EngineState::Uninitialized);
    assert_eq!(engine.ticks(), 0);
}

#[test]
fn empty_tick_returns_post_init_positions() {
    let mut engine = FieldEngine::with_seed(FieldParams::default(), 17);
    engine.initialize();
    let system = engine.system().expect("initialized").clone();

    let result = engine.tick(&[]).expect("tick should succeed");
    assert_eq!(result.particle_coords, flatten_positions(&system.primary));
    assert_eq!(result.shadow_particle_coords, flatten_positions(&system.shadow));
    assert!(result.lines.is_empty());
    assert!(result.shadow_lines.is_empty());
    assert_eq!(engine.system(), Some(&system));
}

#[test]
fn result_buffers_have_expected_shapes() {
    let params = FieldParams {
        particle_count: 48,
        ..FieldParams::default()
    };
    let mut engine = FieldEngine::with_seed(params, 23);
    engine.initialize();

    let mut saw_lines = false;
    for f in 0..240 {
        let bands = synth_bands(f as f32 / 60.0, 6, &params);
        let result = engine.tick(&bands).expect("tick should succeed");
        assert_eq!(result.particle_coords.len(), 96);
        assert_eq!(result.shadow_particle_coords.len(), 96);
        assert_eq!(result.lines.len() % LINE_STRIDE, 0);
        assert_eq!(result.shadow_lines.len() % LINE_STRIDE, 0);
        assert_eq!(result.line_count() % 2, 0);
        assert_eq!(result.shadow_line_count() % 2, 0);
        saw_lines |= result.line_count() > 0;
        for v in result.particle_coords.iter().chain(result.shadow_particle_coords.iter()) {
            assert!(v.is_finite());
        }
    }
    assert!(saw_lines, "48 particles drawn to 6 bands should connect at some point");
    assert_eq!(engine.ticks(), 240);
}

#[test]
fn every_particle_respects_max_speed_through_ticks() {
    let params = FieldParams::default();
    let mut engine = FieldEngine::with_seed(params, 31);
    engine.initialize();

    for f in 0..120 {
        let bands = synth_bands(f as f32 / 30.0, 4, &params);
        engine.tick(&bands).expect("tick should succeed");
        let system = engine.system().expect("initialized");
        for p in system.primary.iter().chain(system.shadow.iter()) {
            assert!(p.speed() <= params.max_speed + 1e-4);
            let idx = p.target.expect("non-empty snapshot assigns targets");
            assert!(idx < bands.len());
        }
    }
}

#[test]
fn initialize_resets_everything() {
    let params = FieldParams::default();
    let mut engine = FieldEngine::with_seed(params, 5);
    engine.initialize();
    let first = engine.system().expect("initialized").clone();

    let bands = synth_bands(0.0, 3, &params);
    for _ in 0..10 {
        engine.tick(&bands).expect("tick should succeed");
    }
    engine.initialize();

    let second = engine.system().expect("initialized");
    assert_eq!(engine.ticks(), 0);
    assert_eq!(second.primary.len(), params.particle_count);
    assert_eq!(second.shadow.len(), params.particle_count);
    assert!(second.primary.iter().all(|p| p.target.is_none()));
    assert_ne!(second, &first, "fresh spawn should differ from the first");
}

#[test]
fn shrinking_snapshot_between_ticks_is_tolerated() {
    let params = FieldParams::default();
    let mut engine = FieldEngine::with_seed(params, 8);
    engine.initialize();

    engine.tick(&synth_bands(0.0, 8, &params)).expect("tick should succeed");
    let small = synth_bands(0.1, 2, &params);
    engine.tick(&small).expect("tick should succeed");

    let system = engine.system().expect("initialized");
    for p in system.primary.iter().chain(system.shadow.iter()) {
        assert!(p.target.is_some_and(|i| i < 2));
    }
}
