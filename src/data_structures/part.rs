//! Vehicle part data: semantic roles, surface materials, and geometry
//! descriptors.
//!
//! Parts carry their role as an explicit tag assigned at construction.
//! Option changes address parts through the role registry, never by
//! re-deriving the role from shape or material afterwards.

use cgmath::Rad;

use crate::{config::Colour, data_structures::instance::Instance};

/// Semantic role of a part.
///
/// Body colour repaints `Body` and `Roof`, rim colour repaints `Rim`, and
/// the render loop spins `Tire` and `Rim`. Glass shares the "has a colour"
/// trait with the paintable parts but is excluded from repainting by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartRole {
    Body,
    Roof,
    Glass,
    Tire,
    Rim,
    Headlight,
    Taillight,
}

/// Surface appearance of a part.
///
/// Only `colour` changes after construction; the shading parameters are
/// fixed per part.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PartMaterial {
    pub colour: Colour,
    pub metalness: f32,
    pub roughness: f32,
    pub opacity: f32,
    /// Transmissive parts render in the glass pass with alpha blending.
    pub transmissive: bool,
    /// Unlit parts skip the light rig entirely (light markers).
    pub unlit: bool,
}

impl PartMaterial {
    /// Opaque painted surface.
    pub fn painted(colour: Colour, metalness: f32, roughness: f32) -> Self {
        Self {
            colour,
            metalness,
            roughness,
            opacity: 1.0,
            transmissive: false,
            unlit: false,
        }
    }

    /// Tinted window glass.
    pub fn glass() -> Self {
        Self {
            colour: Colour(0x222222),
            metalness: 1.0,
            roughness: 0.0,
            opacity: 0.3,
            transmissive: true,
            unlit: false,
        }
    }

    /// Self-lit marker surface, e.g. head- and taillights.
    pub fn marker(colour: Colour) -> Self {
        Self {
            colour,
            metalness: 0.0,
            roughness: 1.0,
            opacity: 1.0,
            transmissive: false,
            unlit: true,
        }
    }
}

/// Geometry of a part, in exact construction parameters.
///
/// Also serves as the mesh cache key: parts sharing a descriptor share one
/// GPU mesh. Comparison is on the exact constants the part was built with,
/// not on measured thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Geometry {
    Cuboid {
        width: f32,
        height: f32,
        depth: f32,
    },
    /// Upright cylinder along the Y axis. Wheel parts lay it on its side
    /// through their base rotation.
    Cylinder {
        radius: f32,
        height: f32,
        segments: u32,
    },
    Sphere {
        radius: f32,
        segments: u32,
    },
}

/// One part of the vehicle.
///
/// Geometry and base placement are immutable after construction; the
/// material colour and the spin angle are the only post-creation mutations,
/// both flagged through `dirty` for GPU re-upload.
#[derive(Debug, Clone)]
pub struct ScenePart {
    pub role: PartRole,
    pub geometry: Geometry,
    pub material: PartMaterial,
    /// Placement relative to the vehicle root.
    pub local: Instance,
    /// Rotation around the axle, advanced by the render loop for the
    /// rotatable roles.
    pub spin_angle: Rad<f32>,
    /// Set on every visual mutation, cleared when the renderer re-uploads.
    pub dirty: bool,
}

impl ScenePart {
    pub fn new(role: PartRole, geometry: Geometry, material: PartMaterial, local: Instance) -> Self {
        Self {
            role,
            geometry,
            material,
            local,
            spin_angle: Rad(0.0),
            dirty: false,
        }
    }
}
