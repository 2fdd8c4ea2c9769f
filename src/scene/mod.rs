//! Scene animation core.
//!
//! Owns the particle registry, the display-mode state machine, the smoothed
//! scene orientation, and the per-frame update that moves every entity
//! toward its mode-dependent target transform. Nothing in here touches the
//! GPU; the renderer reads the resulting transforms each frame.

pub mod dust;
pub mod entity;
pub mod layout;

use glam::{EulerRot, Quat, Vec2, Vec3};
use rand::rngs::ThreadRng;
use rand::Rng;

use crate::config::Config;
use crate::vision::{Gesture, GestureKind};
use dust::DustField;
use entity::{DecorStyle, Entity, EntityId, EntityKind, PhotoId};

/// Seconds advanced per tick. The loop is paced to 60 FPS and the smoothing
/// steps are tuned against that rate.
pub const FRAME_DT: f32 = 1.0 / 60.0;

/// Display mode. Exactly one is active at a time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Tree,
    Scatter,
    Focus,
}

impl Mode {
    /// Gesture-to-mode mapping. `GestureKind::None` maps to no change.
    pub fn from_gesture(kind: GestureKind) -> Option<Mode> {
        match kind {
            GestureKind::Fist => Some(Mode::Tree),
            GestureKind::Open => Some(Mode::Scatter),
            GestureKind::Pinch => Some(Mode::Focus),
            GestureKind::None => None,
        }
    }
}

/// The animated scene: entity registry plus all per-frame state.
pub struct Scene {
    config: Config,
    entities: Vec<Entity>,
    mode: Mode,
    /// Photo entity under focus; only set while `mode == Focus`.
    focus: Option<EntityId>,
    /// Orientation target as (pitch, yaw), from the latest palm position.
    tilt_target: Vec2,
    /// Rendered orientation, lagging the target via exponential smoothing.
    tilt: Vec2,
    dust: DustField,
    elapsed: f32,
    rng: ThreadRng,
}

impl Scene {
    /// Build the scene and spawn the initial decorations.
    pub fn new(config: Config) -> Self {
        let mut rng = rand::rng();
        let dust = DustField::new(&mut rng, config.dust_count, config.dust.spawn_radius);

        let mut scene = Self {
            entities: Vec::with_capacity(config.decoration_count),
            mode: Mode::Tree,
            focus: None,
            tilt_target: Vec2::ZERO,
            tilt: Vec2::ZERO,
            dust,
            elapsed: 0.0,
            rng,
            config,
        };

        for _ in 0..scene.config.decoration_count {
            scene.spawn_decoration();
        }
        scene
    }

    fn spawn_decoration(&mut self) {
        let style = DecorStyle::ALL[self.rng.random_range(0..DecorStyle::ALL.len())];
        let [min_r, max_r] = self.config.spawn.decoration_shell;
        let home = layout::shell_point(&mut self.rng, min_r, max_r);
        let velocity = Vec3::new(
            self.rng.random_range(-0.05..0.05),
            self.rng.random_range(-0.05..0.05),
            self.rng.random_range(-0.05..0.05),
        );
        let spin_max = self.config.spawn.decoration_spin_max;
        let spin = Vec3::new(
            self.rng.random_range(0.0..spin_max),
            self.rng.random_range(0.0..spin_max),
            self.rng.random_range(0.0..spin_max),
        );
        let rotation = Quat::from_euler(
            EulerRot::XYZ,
            self.rng.random_range(0.0..std::f32::consts::PI),
            self.rng.random_range(0.0..std::f32::consts::PI),
            self.rng.random_range(0.0..std::f32::consts::PI),
        );

        self.entities.push(Entity::new(
            EntityKind::Decoration(style),
            home,
            velocity,
            spin,
            rotation,
        ));
    }

    /// Register an uploaded photo as a new entity on the inner shell.
    pub fn add_photo(&mut self, photo: PhotoId) -> EntityId {
        let [min_r, max_r] = self.config.spawn.photo_shell;
        let home = layout::shell_point(&mut self.rng, min_r, max_r);
        let spin = Vec3::from(self.config.spawn.photo_spin);

        self.entities.push(Entity::new(
            EntityKind::Photo(photo),
            home,
            Vec3::ZERO,
            spin,
            Quat::IDENTITY,
        ));
        self.entities.len() - 1
    }

    /// Switch display mode. Idempotent: re-setting the current mode changes
    /// nothing, including the focus target. Entering Focus picks one photo
    /// uniformly at random (none if no photos exist); leaving Focus clears
    /// the selection.
    pub fn set_mode(&mut self, mode: Mode) {
        if self.mode == mode {
            return;
        }
        self.mode = mode;

        if mode == Mode::Focus {
            let photos: Vec<EntityId> = self
                .entities
                .iter()
                .enumerate()
                .filter(|(_, e)| e.is_photo())
                .map(|(i, _)| i)
                .collect();
            self.focus = if photos.is_empty() {
                None
            } else {
                Some(photos[self.rng.random_range(0..photos.len())])
            };
        } else {
            self.focus = None;
        }
    }

    /// Set the orientation target from a normalized palm position. Palm y
    /// controls pitch and palm x controls yaw; the crossed axes give the
    /// natural "look where the hand points" feel.
    pub fn set_tilt_target(&mut self, x: f32, y: f32) {
        self.tilt_target = Vec2::new(
            (y - 0.5) * self.config.motion.pitch_range,
            (x - 0.5) * self.config.motion.yaw_range,
        );
    }

    /// Feed one classified gesture: palm position always steers the
    /// orientation, and the pose (if mapped) switches mode.
    pub fn apply_gesture(&mut self, gesture: &Gesture) {
        self.set_tilt_target(gesture.palm[0], gesture.palm[1]);
        if let Some(mode) = Mode::from_gesture(gesture.kind) {
            self.set_mode(mode);
        }
    }

    /// One animation tick: advance the smoothed orientation, move every
    /// entity toward its mode-dependent target, and step the dust field.
    pub fn advance(&mut self) {
        self.elapsed += FRAME_DT;

        // Rotation filter: fixed fractional step toward the target.
        self.tilt += (self.tilt_target - self.tilt) * self.config.motion.tilt_step;

        let group = self.group_rotation();
        let inv_group = group.inverse();
        let total = self.entities.len();
        let position_step = self.config.motion.position_step;
        let scale_step = self.config.motion.scale_step;

        for index in 0..total {
            let focused = self.focus == Some(index);
            let jitter_half = self.config.tree.radius_jitter;
            let jitter = if jitter_half > 0.0 {
                self.rng.random_range(-jitter_half..jitter_half)
            } else {
                0.0
            };

            let entity = &mut self.entities[index];
            let mut target_scale = Vec3::ONE;

            let target_pos = match self.mode {
                Mode::Tree => {
                    // Recomputed with fresh jitter every frame: the tree
                    // shimmers rather than settling.
                    let target = layout::tree_target(&self.config.tree, index, total, jitter);
                    spin_entity(entity, 1.0);
                    target
                }
                Mode::Scatter => {
                    spin_entity(entity, self.config.motion.scatter_spin_multiplier);
                    entity.home
                }
                Mode::Focus => {
                    if focused {
                        // The group keeps rotating under hand control, so
                        // "in front of the camera" has to be re-expressed in
                        // the group's local frame each frame.
                        target_scale = Vec3::splat(self.config.focus.focus_scale);
                        entity.rotation = entity
                            .rotation
                            .slerp(inv_group, self.config.motion.focus_slerp_step);
                        inv_group * Vec3::from(self.config.focus.focus_point)
                    } else {
                        entity.home.normalize_or_zero() * self.config.focus.repel_radius
                    }
                }
            };

            entity.position = entity.position.lerp(target_pos, position_step);
            entity.scale = entity.scale.lerp(target_scale, scale_step);
        }

        self.dust.advance(&self.config.dust, self.elapsed);
    }

    /// Current rotation of the whole entity group.
    pub fn group_rotation(&self) -> Quat {
        Quat::from_euler(EulerRot::XYZ, self.tilt.x, self.tilt.y, 0.0)
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn focus_target(&self) -> Option<EntityId> {
        self.focus
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn dust(&self) -> &DustField {
        &self.dust
    }

    pub fn tilt(&self) -> Vec2 {
        self.tilt
    }

    pub fn tilt_target(&self) -> Vec2 {
        self.tilt_target
    }

    pub fn photo_count(&self) -> usize {
        self.entities.iter().filter(|e| e.is_photo()).count()
    }
}

/// Advance an entity's self-rotation about its x and y axes.
fn spin_entity(entity: &mut Entity, multiplier: f32) {
    let step = Quat::from_euler(
        EulerRot::XYZ,
        entity.spin.x * multiplier,
        entity.spin.y * multiplier,
        0.0,
    );
    entity.rotation = (step * entity.rotation).normalize();
}
