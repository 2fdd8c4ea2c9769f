//! Tuning configuration.
//!
//! Every empirically chosen aesthetic constant lives here so the scene can be
//! re-tuned without touching the animation code. A `gesture-tree.json` next
//! to the working directory overrides the defaults; anything missing or
//! malformed falls back silently to the built-in values.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Top-level tuning configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Number of decoration entities created at startup.
    pub decoration_count: usize,
    /// Number of dust points in the ambient field.
    pub dust_count: usize,
    /// Tree formation shape.
    pub tree: TreeTuning,
    /// Interpolation and rotation behavior.
    pub motion: MotionTuning,
    /// Focus mode placement.
    pub focus: FocusTuning,
    /// Entity spawn placement.
    pub spawn: SpawnTuning,
    /// Dust field behavior.
    pub dust: DustTuning,
    /// Gesture classification thresholds.
    pub gesture: GestureTuning,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            decoration_count: 1500,
            dust_count: 2500,
            tree: TreeTuning::default(),
            motion: MotionTuning::default(),
            focus: FocusTuning::default(),
            spawn: SpawnTuning::default(),
            dust: DustTuning::default(),
            gesture: GestureTuning::default(),
        }
    }
}

impl Config {
    /// Load from a JSON file, falling back to defaults if the file is absent
    /// or unreadable.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match std::fs::read_to_string(path.as_ref()) {
            Ok(text) => match serde_json::from_str(&text) {
                Ok(config) => {
                    log::info!("Loaded tuning config from {:?}", path.as_ref());
                    config
                }
                Err(e) => {
                    log::warn!("Ignoring malformed config {:?}: {}", path.as_ref(), e);
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }
}

/// Helical tree placement.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeTuning {
    /// Bottom of the tree.
    pub height_min: f32,
    /// Top of the tree.
    pub height_max: f32,
    /// Radius at the bottom; shrinks linearly to 0 at the top.
    pub base_radius: f32,
    /// Full rotations swept from bottom to top.
    pub turns: f32,
    /// Half-amplitude of the per-frame radius jitter (the shimmer).
    pub radius_jitter: f32,
}

impl Default for TreeTuning {
    fn default() -> Self {
        Self {
            height_min: -15.0,
            height_max: 15.0,
            base_radius: 12.0,
            turns: 25.0,
            radius_jitter: 0.5,
        }
    }
}

/// Smoothing steps and rotation ranges. All steps are per-frame fractions of
/// the remaining delta (first-order exponential smoothing, frame-rate
/// dependent by design).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionTuning {
    /// Fraction of remaining tilt delta applied per frame.
    pub tilt_step: f32,
    /// Fraction of remaining position delta applied per frame.
    pub position_step: f32,
    /// Fraction of remaining scale delta applied per frame.
    pub scale_step: f32,
    /// Slerp fraction for camera-aligning the focused photo.
    pub focus_slerp_step: f32,
    /// Palm y maps to pitch over [-pitch_range/2, pitch_range/2].
    pub pitch_range: f32,
    /// Palm x maps to yaw over [-yaw_range/2, yaw_range/2].
    pub yaw_range: f32,
    /// Spin multiplier applied in Scatter mode.
    pub scatter_spin_multiplier: f32,
}

impl Default for MotionTuning {
    fn default() -> Self {
        Self {
            tilt_step: 0.05,
            position_step: 0.03,
            scale_step: 0.05,
            focus_slerp_step: 0.1,
            pitch_range: 1.5,
            yaw_range: 3.0,
            scatter_spin_multiplier: 5.0,
        }
    }
}

/// Focus mode placement. The camera sits at (0, 2, 50) looking down -Z, so
/// the focus point floats directly in front of it in world space.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FocusTuning {
    /// World-space point the focused photo is pulled to.
    pub focus_point: [f32; 3],
    /// Magnification applied to the focused photo.
    pub focus_scale: f32,
    /// Radius non-focused entities are pushed out to.
    pub repel_radius: f32,
}

impl Default for FocusTuning {
    fn default() -> Self {
        Self {
            focus_point: [0.0, 2.0, 35.0],
            focus_scale: 4.5,
            repel_radius: 60.0,
        }
    }
}

/// Spherical-shell spawn ranges and spin rates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnTuning {
    /// Shell radius range for decorations.
    pub decoration_shell: [f32; 2],
    /// Shell radius range for photos (closer to center).
    pub photo_shell: [f32; 2],
    /// Upper bound for each decoration spin-rate component.
    pub decoration_spin_max: f32,
    /// Fixed spin rate for photos.
    pub photo_spin: [f32; 3],
}

impl Default for SpawnTuning {
    fn default() -> Self {
        Self {
            decoration_shell: [8.0, 20.0],
            photo_shell: [5.0, 15.0],
            decoration_spin_max: 0.02,
            photo_spin: [0.005, 0.005, 0.0],
        }
    }
}

/// Falling dust field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DustTuning {
    /// Points are seeded in a solid sphere of this radius.
    pub spawn_radius: f32,
    /// Vertical drop per frame.
    pub fall_step: f32,
    /// Points below this wrap back to the ceiling.
    pub floor: f32,
    /// Wrap height.
    pub ceiling: f32,
    /// Yaw of the whole field in radians per second.
    pub yaw_rate: f32,
    /// Point sprite size in world units.
    pub point_size: f32,
}

impl Default for DustTuning {
    fn default() -> Self {
        Self {
            spawn_radius: 30.0,
            fall_step: 0.02,
            floor: -20.0,
            ceiling: 20.0,
            yaw_rate: 0.05,
            point_size: 0.15,
        }
    }
}

/// Gesture classification thresholds over normalized landmark coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureTuning {
    /// Thumb-to-index distance below which the pose is a pinch.
    pub pinch_max_distance: f32,
    /// Average fingertip-to-wrist distance below which the pose is a fist.
    pub fist_max_spread: f32,
    /// Average fingertip-to-wrist distance above which the pose is open.
    pub open_min_spread: f32,
    /// Minimum model confidence to report a hand at all.
    pub min_confidence: f32,
}

impl Default for GestureTuning {
    fn default() -> Self {
        Self {
            pinch_max_distance: 0.05,
            fist_max_spread: 0.25,
            open_min_spread: 0.4,
            min_confidence: 0.5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_hold_the_shipped_tuning() {
        let config = Config::default();
        assert_eq!(config.decoration_count, 1500);
        assert_eq!(config.dust_count, 2500);
        assert_eq!(config.tree.turns, 25.0);
        assert_eq!(config.motion.position_step, 0.03);
        assert_eq!(config.focus.focus_point, [0.0, 2.0, 35.0]);
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let config: Config = serde_json::from_str(r#"{ "decoration_count": 7 }"#).unwrap();
        assert_eq!(config.decoration_count, 7);
        assert_eq!(config.dust_count, 2500);
        assert_eq!(config.motion.tilt_step, 0.05);
    }
}
