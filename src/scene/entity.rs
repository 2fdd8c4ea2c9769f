//! Renderable entity records.

use glam::{Quat, Vec3};

/// Index into the scene's entity registry. Entities are never removed during
/// a session, so indices stay valid for its whole lifetime.
pub type EntityId = usize;

/// Handle to a photo texture owned by the renderer.
pub type PhotoId = u32;

/// Decoration visual styles, matching the ornament set of the scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecorStyle {
    /// Metallic gold cube.
    GoldBox,
    /// Matte deep-green bauble.
    GreenBauble,
    /// Glossy red bauble.
    RedBauble,
    /// Striped candy cane.
    CandyCane,
}

impl DecorStyle {
    pub const ALL: [DecorStyle; 4] = [
        DecorStyle::GoldBox,
        DecorStyle::GreenBauble,
        DecorStyle::RedBauble,
        DecorStyle::CandyCane,
    ];
}

/// What an entity is, which decides its target-computation branch and its
/// spawn placement range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityKind {
    Decoration(DecorStyle),
    Photo(PhotoId),
}

/// One renderable particle of the scene.
///
/// Position, rotation, and scale are mutated every frame by the scene's
/// frame driver; everything else is fixed at creation.
#[derive(Clone, Debug)]
pub struct Entity {
    pub kind: EntityKind,
    /// Current position in the rotating group's local space.
    pub position: Vec3,
    /// Current orientation.
    pub rotation: Quat,
    /// Current scale.
    pub scale: Vec3,
    /// Initial drift velocity. Assigned at spawn and kept by contract;
    /// nothing downstream reads it.
    pub velocity: Vec3,
    /// Spawn position; the Scatter target and the Focus repulsion direction.
    pub home: Vec3,
    /// Per-axis self-rotation rate in radians per frame.
    pub spin: Vec3,
}

impl Entity {
    pub fn new(kind: EntityKind, home: Vec3, velocity: Vec3, spin: Vec3, rotation: Quat) -> Self {
        Self {
            kind,
            position: home,
            rotation,
            scale: Vec3::ONE,
            velocity,
            home,
            spin,
        }
    }

    pub fn is_photo(&self) -> bool {
        matches!(self.kind, EntityKind::Photo(_))
    }
}
