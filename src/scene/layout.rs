//! Placement functions: the helical tree formation and spherical-shell
//! spawn sampling.

use glam::Vec3;
use rand::Rng;

use crate::config::TreeTuning;

/// Helical tree placement for entity `index` of `total`.
///
/// Height is linear in `index / total` over the configured range; radius
/// shrinks linearly from `base_radius` to 0 at the top; the angle sweeps
/// `turns` full rotations bottom to top. `radius_jitter` is an already
/// sampled offset added to the radius only — callers pass 0.0 for the
/// jitter-free placement.
pub fn tree_target(tuning: &TreeTuning, index: usize, total: usize, radius_jitter: f32) -> Vec3 {
    let t = if total == 0 {
        0.0
    } else {
        index as f32 / total as f32
    };

    let height = tuning.height_min + t * (tuning.height_max - tuning.height_min);
    let radius = tuning.base_radius * (1.0 - t) + radius_jitter;
    let angle = t * tuning.turns * std::f32::consts::TAU;

    Vec3::new(radius * angle.cos(), height, radius * angle.sin())
}

/// Uniform-in-solid-angle random point on a spherical shell between
/// `min_radius` and `max_radius`.
pub fn shell_point<R: Rng>(rng: &mut R, min_radius: f32, max_radius: f32) -> Vec3 {
    let r = min_radius + rng.random_range(0.0..1.0) * (max_radius - min_radius);
    let theta = rng.random_range(0.0..std::f32::consts::TAU);
    let phi = (2.0 * rng.random_range(0.0..1.0f32) - 1.0).acos();

    Vec3::new(
        r * phi.sin() * theta.cos(),
        r * phi.sin() * theta.sin(),
        r * phi.cos(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tree_height_is_linear_in_index() {
        let tuning = TreeTuning::default();
        let total = 200;
        for i in 0..total {
            let t = i as f32 / total as f32;
            let expected = tuning.height_min + t * (tuning.height_max - tuning.height_min);
            let pos = tree_target(&tuning, i, total, 0.0);
            assert!((pos.y - expected).abs() < 1e-4);
        }
    }

    #[test]
    fn tree_radius_shrinks_to_zero() {
        let tuning = TreeTuning::default();
        let total = 100;
        let mut last_radius = f32::INFINITY;
        for i in 0..=total {
            let pos = tree_target(&tuning, i, total, 0.0);
            let radius = (pos.x * pos.x + pos.z * pos.z).sqrt();
            assert!(radius <= last_radius + 1e-4);
            last_radius = radius;
        }
        assert!(last_radius.abs() < 1e-3);
    }

    #[test]
    fn tree_with_zero_total_is_degenerate_but_finite() {
        let tuning = TreeTuning::default();
        let pos = tree_target(&tuning, 0, 0, 0.0);
        assert!(pos.is_finite());
        assert_eq!(pos.y, tuning.height_min);
    }

    #[test]
    fn shell_points_stay_in_radius_band() {
        let mut rng = rand::rng();
        for _ in 0..500 {
            let p = shell_point(&mut rng, 8.0, 20.0);
            let r = p.length();
            assert!(r >= 8.0 - 1e-3 && r <= 20.0 + 1e-3, "radius {} out of band", r);
        }
    }
}
