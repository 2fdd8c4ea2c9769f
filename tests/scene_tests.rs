//! Integration tests for the scene state machine and animation targets.

use glam::Vec3;
use gesture_tree::config::Config;
use gesture_tree::scene::layout;
use gesture_tree::scene::{Mode, Scene};
use gesture_tree::vision::{Gesture, GestureKind};

/// Small registry, deterministic tree (no shimmer jitter).
fn test_config() -> Config {
    let mut config = Config::default();
    config.decoration_count = 40;
    config.dust_count = 16;
    config.tree.radius_jitter = 0.0;
    config
}

fn advance_n(scene: &mut Scene, n: usize) {
    for _ in 0..n {
        scene.advance();
    }
}

#[test]
fn scene_spawns_decorations_and_starts_in_tree_mode() {
    let scene = Scene::new(test_config());
    assert_eq!(scene.entities().len(), 40);
    assert_eq!(scene.mode(), Mode::Tree);
    assert_eq!(scene.photo_count(), 0);
    assert!(scene.focus_target().is_none());
}

#[test]
fn entities_converge_to_tree_spiral() {
    let config = test_config();
    let mut scene = Scene::new(config.clone());

    advance_n(&mut scene, 800);

    let total = scene.entities().len();
    for (i, entity) in scene.entities().iter().enumerate() {
        let expected = layout::tree_target(&config.tree, i, total, 0.0);
        let error = (entity.position - expected).length();
        assert!(
            error < 0.05,
            "entity {} is {} away from its spiral slot",
            i,
            error
        );
    }
}

#[test]
fn scatter_returns_entities_to_their_homes() {
    let mut scene = Scene::new(test_config());

    // Let the tree form first, then scatter.
    advance_n(&mut scene, 300);
    scene.set_mode(Mode::Scatter);
    advance_n(&mut scene, 800);

    for entity in scene.entities() {
        let error = (entity.position - entity.home).length();
        assert!(error < 0.05, "entity is {} away from home", error);
    }
}

#[test]
fn set_mode_is_idempotent_for_focus_selection() {
    let mut scene = Scene::new(test_config());
    scene.add_photo(0);
    scene.add_photo(1);
    scene.add_photo(2);

    scene.set_mode(Mode::Focus);
    let first = scene.focus_target();
    assert!(first.is_some());

    // Re-entering the current mode must not re-roll the selection.
    for _ in 0..20 {
        scene.set_mode(Mode::Focus);
        assert_eq!(scene.focus_target(), first);
    }
}

#[test]
fn focus_with_no_photos_selects_nothing() {
    let mut scene = Scene::new(test_config());
    scene.set_mode(Mode::Focus);
    assert_eq!(scene.mode(), Mode::Focus);
    assert!(scene.focus_target().is_none());
}

#[test]
fn leaving_focus_clears_the_selection() {
    let mut scene = Scene::new(test_config());
    scene.add_photo(0);
    scene.set_mode(Mode::Focus);
    assert!(scene.focus_target().is_some());

    scene.set_mode(Mode::Tree);
    assert!(scene.focus_target().is_none());
}

#[test]
fn focus_always_picks_a_photo_entity() {
    // Repeated entry must never land on a decoration.
    let mut scene = Scene::new(test_config());
    let a = scene.add_photo(0);
    let b = scene.add_photo(1);

    for _ in 0..50 {
        scene.set_mode(Mode::Focus);
        let picked = scene.focus_target().unwrap();
        assert!(picked == a || picked == b);
        scene.set_mode(Mode::Scatter);
    }
}

#[test]
fn focus_selection_is_spread_across_all_photos() {
    let mut scene = Scene::new(test_config());
    let photos = [scene.add_photo(0), scene.add_photo(1), scene.add_photo(2)];

    let trials = 600;
    let mut counts = [0usize; 3];
    for _ in 0..trials {
        scene.set_mode(Mode::Focus);
        let picked = scene.focus_target().unwrap();
        let slot = photos.iter().position(|&p| p == picked).unwrap();
        counts[slot] += 1;
        scene.set_mode(Mode::Scatter);
    }

    // Uniform over 3 photos expects ~200 each; a very loose band still
    // catches a selector stuck on one photo or skipping one.
    let expected = trials / photos.len();
    for (slot, &count) in counts.iter().enumerate() {
        assert!(
            count > expected / 3 && count < expected * 2,
            "photo {} selected {} of {} trials",
            slot,
            count,
            trials
        );
    }
}

#[test]
fn focused_photo_moves_forward_and_grows() {
    let config = test_config();
    let focus_point = Vec3::from(config.focus.focus_point);
    let focus_scale = config.focus.focus_scale;

    let mut scene = Scene::new(config);
    scene.add_photo(0);
    scene.set_mode(Mode::Focus);
    let focused = scene.focus_target().unwrap();

    advance_n(&mut scene, 800);

    // Orientation is untouched, so the local-frame target equals the world
    // focus point.
    let entity = &scene.entities()[focused];
    assert!((entity.position - focus_point).length() < 0.1);
    assert!((entity.scale - Vec3::splat(focus_scale)).length() < 0.05);
}

#[test]
fn unfocused_entities_are_pushed_to_the_repel_shell() {
    let config = test_config();
    let repel_radius = config.focus.repel_radius;

    let mut scene = Scene::new(config);
    scene.add_photo(0);
    scene.set_mode(Mode::Focus);
    let focused = scene.focus_target().unwrap();

    advance_n(&mut scene, 800);

    for (i, entity) in scene.entities().iter().enumerate() {
        if i == focused {
            continue;
        }
        let radius = entity.position.length();
        assert!(
            (radius - repel_radius).abs() < 0.5,
            "entity {} sits at radius {}",
            i,
            radius
        );
    }
}

#[test]
fn gesture_stream_drives_the_mode_machine() {
    let mut scene = Scene::new(test_config());
    scene.add_photo(0);

    let at = |kind| Gesture {
        kind,
        palm: [0.5, 0.5],
    };

    scene.apply_gesture(&at(GestureKind::Open));
    assert_eq!(scene.mode(), Mode::Scatter);

    scene.apply_gesture(&at(GestureKind::Fist));
    assert_eq!(scene.mode(), Mode::Tree);

    scene.apply_gesture(&at(GestureKind::Pinch));
    assert_eq!(scene.mode(), Mode::Focus);
    let selection = scene.focus_target();

    // An unrecognized pose keeps the current mode and selection.
    scene.apply_gesture(&at(GestureKind::None));
    assert_eq!(scene.mode(), Mode::Focus);
    assert_eq!(scene.focus_target(), selection);
}

#[test]
fn palm_position_maps_to_bounded_tilt() {
    let config = test_config();
    let pitch_limit = config.motion.pitch_range / 2.0;
    let yaw_limit = config.motion.yaw_range / 2.0;

    let mut scene = Scene::new(config);

    // Center of the frame means no tilt at all.
    scene.set_tilt_target(0.5, 0.5);
    assert!(scene.tilt_target().length() < 1e-6);

    // Exact linear map at a corner: palm y drives pitch, palm x drives yaw.
    scene.set_tilt_target(1.0, 0.0);
    let target = scene.tilt_target();
    assert!((target.x + pitch_limit).abs() < 1e-6);
    assert!((target.y - yaw_limit).abs() < 1e-6);

    for (x, y) in [(0.0, 0.0), (1.0, 1.0), (0.0, 1.0), (1.0, 0.0)] {
        scene.set_tilt_target(x, y);
        let target = scene.tilt_target();
        assert!(target.x.abs() <= pitch_limit + 1e-6);
        assert!(target.y.abs() <= yaw_limit + 1e-6);
    }
}

#[test]
fn tilt_smoothing_converges_without_overshoot() {
    let mut scene = Scene::new(test_config());
    scene.set_tilt_target(1.0, 1.0);
    let target = scene.tilt_target();

    let mut previous = scene.tilt();
    for _ in 0..600 {
        scene.advance();
        let tilt = scene.tilt();
        // Each component moves toward the target and never past it.
        assert!(tilt.x >= previous.x - 1e-6 && tilt.x <= target.x + 1e-6);
        assert!(tilt.y >= previous.y - 1e-6 && tilt.y <= target.y + 1e-6);
        previous = tilt;
    }
    assert!((scene.tilt() - target).length() < 1e-3);
}

#[test]
fn uploaded_photo_joins_the_registry_on_the_inner_shell() {
    let config = test_config();
    let [min_r, max_r] = config.spawn.photo_shell;

    let mut scene = Scene::new(config);
    let id = scene.add_photo(7);

    assert_eq!(scene.photo_count(), 1);
    let entity = &scene.entities()[id];
    assert!(entity.is_photo());

    let radius = entity.home.length();
    assert!(radius >= min_r - 1e-4 && radius <= max_r + 1e-4);
}

#[test]
fn upload_then_pinch_focuses_the_new_photo() {
    let mut scene = Scene::new(test_config());
    let id = scene.add_photo(0);

    scene.apply_gesture(&Gesture {
        kind: GestureKind::Pinch,
        palm: [0.5, 0.5],
    });

    assert_eq!(scene.mode(), Mode::Focus);
    assert_eq!(scene.focus_target(), Some(id));
}

#[test]
fn dust_advances_with_the_scene() {
    let mut scene = Scene::new(test_config());
    let before: Vec<f32> = scene.dust().points().iter().map(|p| p.y).collect();

    advance_n(&mut scene, 10);

    let after: Vec<f32> = scene.dust().points().iter().map(|p| p.y).collect();
    assert!(before
        .iter()
        .zip(&after)
        .any(|(b, a)| (b - a).abs() > 1e-6));
}
