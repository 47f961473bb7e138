use band_field::band::{Band, Variant};
use band_field::params::FieldParams;
use band_field::particle::{Particle, ParticleSystem};

fn params() -> FieldParams {
    FieldParams::default()
}

fn ring_bands(count: usize, level: f32) -> Vec<Band> {
    (0..count)
        .map(|i| {
            let a = i as f32 / count as f32 * std::f32::consts::TAU;
            Band::new(400.0 + a.cos() * 200.0, 300.0 + a.sin() * 200.0, level, level)
        })
        .collect()
}

#[test]
fn speed_never_exceeds_max_after_step() {
    let p = params();
    let mut rng = fastrand::Rng::with_seed(7);
    let mut system = ParticleSystem::spawn(&mut rng, &p);
    // Far-away bands produce a large pull, so the clamp is exercised.
    let bands = vec![
        Band::new(10_000.0, -10_000.0, 1.0, 1.0),
        Band::new(-5_000.0, 8_000.0, 0.5, 0.9),
        Band::new(400.0, 300.0, 0.0, 0.0),
    ];

    for _ in 0..300 {
        system.step_all(&bands, &p, &mut rng);
        for particle in system.primary.iter().chain(system.shadow.iter()) {
            assert!(
                particle.speed() <= p.max_speed + 1e-4,
                "speed {} over limit",
                particle.speed()
            );
        }
    }
}

#[test]
fn empty_snapshot_is_a_no_op() {
    let p = params();
    let mut rng = fastrand::Rng::with_seed(11);
    let mut particle = Particle::new(12.0, -3.5, 0.75, -1.25, Variant::Primary);
    particle.target = Some(3);
    let before = particle;

    particle.step(&[], &p, &mut rng);
    assert_eq!(particle, before);
}

#[test]
fn missing_target_is_assigned_from_snapshot() {
    let p = params();
    let mut rng = fastrand::Rng::with_seed(3);
    let bands = ring_bands(4, 0.5);
    let mut particle = Particle::new(0.0, 0.0, 0.0, 0.0, Variant::Shadow);

    particle.step(&bands, &p, &mut rng);
    let idx = particle.target.expect("target should be assigned");
    assert!(idx < bands.len());
}

#[test]
fn stale_target_heals_when_snapshot_shrinks() {
    let p = params();
    let mut rng = fastrand::Rng::with_seed(5);
    let mut particle = Particle::new(100.0, 100.0, 0.0, 0.0, Variant::Primary);
    particle.target = Some(7);

    let bands = ring_bands(2, 0.3);
    particle.step(&bands, &p, &mut rng);
    let idx = particle.target.expect("target should be reassigned");
    assert!(idx < 2, "index {idx} out of range");
}

#[test]
fn arrival_switches_to_a_different_band() {
    let p = params();
    let bands = ring_bands(5, 0.8);

    for seed in 0..200u64 {
        let mut rng = fastrand::Rng::with_seed(seed);
        let current = (seed % 5) as usize;
        let b = bands[current];
        let mut particle = Particle::new(b.x + 3.0, b.y - 4.0, 0.0, 0.0, Variant::Primary);
        particle.target = Some(current);

        particle.step(&bands, &p, &mut rng);
        let next = particle.target.expect("target should stay assigned");
        assert_ne!(next, current, "seed {seed} reselected the current band");
        assert!(next < bands.len());
    }
}

#[test]
fn single_band_keeps_its_target_on_arrival() {
    let p = params();
    let mut rng = fastrand::Rng::with_seed(9);
    let bands = vec![Band::new(50.0, 50.0, 0.5, 0.5)];
    let mut particle = Particle::new(52.0, 51.0, 0.0, 0.0, Variant::Shadow);
    particle.target = Some(0);

    particle.step(&bands, &p, &mut rng);
    assert_eq!(particle.target, Some(0));
}

#[test]
fn far_particle_keeps_target_and_moves_toward_it() {
    let p = params();
    let mut rng = fastrand::Rng::with_seed(1);
    let bands = vec![Band::new(200.0, 0.0, 0.0, 1.0), Band::new(-200.0, 0.0, 0.0, 1.0)];
    let mut particle = Particle::new(0.0, 0.0, 0.0, 0.0, Variant::Primary);
    particle.target = Some(0);

    particle.step(&bands, &p, &mut rng);
    assert_eq!(particle.target, Some(0));
    // pull = 0.011, dx = 200 -> vx = 2.2 * 0.97
    assert!((particle.vx - 2.2 * 0.97).abs() < 1e-5, "vx = {}", particle.vx);
    assert!((particle.x - particle.vx).abs() < 1e-6);
    assert_eq!(particle.vy, 0.0);
}

#[test]
fn shadow_follows_dry_level_and_primary_follows_wet() {
    let p = params();
    let bands = vec![Band::new(100.0, 0.0, 0.0, 1.0)];

    let mut rng = fastrand::Rng::with_seed(2);
    let mut primary = Particle::new(0.0, 0.0, 0.0, 0.0, Variant::Primary);
    let mut shadow = Particle::new(0.0, 0.0, 0.0, 0.0, Variant::Shadow);
    primary.step(&bands, &p, &mut rng);
    shadow.step(&bands, &p, &mut rng);

    // wet 1.0 -> pull 0.011; dry 0.0 -> pull 0.001
    assert!((primary.vx - 100.0 * 0.011 * 0.97).abs() < 1e-5);
    assert!((shadow.vx - 100.0 * 0.001 * 0.97).abs() < 1e-5);
}

#[test]
fn non_finite_band_position_does_not_move_particle() {
    let p = params();
    let mut rng = fastrand::Rng::with_seed(4);
    let bands = vec![Band::new(f32::NAN, 0.0, 1.0, 1.0)];
    let mut particle = Particle::new(10.0, 10.0, 1.0, 1.0, Variant::Primary);
    particle.target = Some(0);
    let before = particle;

    particle.step(&bands, &p, &mut rng);
    assert_eq!(particle, before);
}

#[test]
fn spawn_fills_both_populations_inside_spawn_area() {
    let p = FieldParams {
        particle_count: 64,
        ..FieldParams::default()
    };
    let mut rng = fastrand::Rng::with_seed(21);
    let system = ParticleSystem::spawn(&mut rng, &p);

    assert_eq!(system.primary.len(), 64);
    assert_eq!(system.shadow.len(), 64);
    for particle in &system.primary {
        assert_eq!(particle.variant, Variant::Primary);
        assert!(particle.target.is_none());
    }
    for particle in system.primary.iter().chain(system.shadow.iter()) {
        assert!((0.0..p.spawn_width).contains(&particle.x));
        assert!((0.0..p.spawn_height).contains(&particle.y));
        assert!((-1.0..1.0).contains(&particle.vx));
        assert!((-1.0..1.0).contains(&particle.vy));
    }
    assert!(system.shadow.iter().all(|q| q.variant == Variant::Shadow));
}

#[test]
fn far_band_clamps_speed_instead_of_freezing() {
    let p = params();
    let mut rng = fastrand::Rng::with_seed(4);
    let bands = vec![Band::new(2e21, 0.0, 0.0, 1.0)];
    let mut particle = Particle::new(0.0, 0.0, 0.0, 0.0, Variant::Primary);

    for _ in 0..3 {
        particle.step(&bands, &p, &mut rng);
        assert!((particle.speed() - p.max_speed).abs() < 1e-4, "speed {}", particle.speed());
    }
    assert_eq!(particle.target, Some(0));
    assert!((particle.x - 3.0 * p.max_speed).abs() < 1e-3, "x = {}", particle.x);
    assert_eq!(particle.vy, 0.0);
}
