//! Ambient falling dust field.
//!
//! The dust sits outside the rotating group: it falls at a constant rate,
//! wraps at a floor, and the whole field yaws slowly with elapsed time.

use glam::Vec3;
use rand::Rng;

use crate::config::DustTuning;
use crate::scene::layout::shell_point;

pub struct DustField {
    points: Vec<Vec3>,
    yaw: f32,
}

impl DustField {
    pub fn new<R: Rng>(rng: &mut R, count: usize, spawn_radius: f32) -> Self {
        let points = (0..count)
            .map(|_| shell_point(rng, 0.0, spawn_radius))
            .collect();
        Self { points, yaw: 0.0 }
    }

    /// One frame of dust motion: drop every point, wrap at the floor, and
    /// set the field yaw from elapsed time.
    pub fn advance(&mut self, tuning: &DustTuning, elapsed_secs: f32) {
        for p in &mut self.points {
            p.y -= tuning.fall_step;
            if p.y < tuning.floor {
                p.y = tuning.ceiling;
            }
        }
        self.yaw = elapsed_secs * tuning.yaw_rate;
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    /// Current rotation of the field about the vertical axis, in radians.
    pub fn yaw(&self) -> f32 {
        self.yaw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn points_fall_and_wrap() {
        let mut rng = rand::rng();
        let tuning = DustTuning::default();
        let mut field = DustField::new(&mut rng, 64, tuning.spawn_radius);
        let before: Vec<f32> = field.points().iter().map(|p| p.y).collect();

        field.advance(&tuning, 1.0 / 60.0);

        for (p, y0) in field.points().iter().zip(before) {
            if y0 - tuning.fall_step >= tuning.floor {
                assert!((p.y - (y0 - tuning.fall_step)).abs() < 1e-5);
            } else {
                assert_eq!(p.y, tuning.ceiling);
            }
        }
    }

    #[test]
    fn yaw_tracks_elapsed_time() {
        let mut rng = rand::rng();
        let tuning = DustTuning::default();
        let mut field = DustField::new(&mut rng, 8, tuning.spawn_radius);
        field.advance(&tuning, 10.0);
        assert!((field.yaw() - 10.0 * tuning.yaw_rate).abs() < 1e-6);
    }
}
