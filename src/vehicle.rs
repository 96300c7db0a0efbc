//! The vehicle model: part construction, the role registry, and the
//! targeted mutators that option changes run through.
//!
//! [`VehicleModel::build`] produces the fixed 15-part topology (body, roof,
//! glass, four tire/rim pairs, two headlights, two taillights) and indexes
//! every part under its role. Mutators look targets up in that registry and
//! touch nothing outside the matched set.

use std::{collections::HashMap, time::Duration};

use cgmath::{Deg, Quaternion, Rad, Rotation3, Vector3};

use crate::{
    config::{Colour, Configuration},
    data_structures::{
        instance::Instance,
        part::{Geometry, PartMaterial, PartRole, ScenePart},
    },
};

/// Index of a part in the model. Doubles as the part's slot in the shared
/// GPU instance buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PartId(pub usize);

/// The roles a body colour change repaints. Rims, tires, glass, and light
/// markers are bound to other options (or to none) and stay untouched.
pub const PAINT_ROLES: [PartRole; 2] = [PartRole::Body, PartRole::Roof];

/// The roles the render loop spins.
pub const SPIN_ROLES: [PartRole; 2] = [PartRole::Tire, PartRole::Rim];

/// Wheel spin rate in radians per second.
pub const SPIN_RATE: f32 = 0.3;

pub const TIRE_RADIUS: f32 = 0.3;
pub const RIM_RADIUS: f32 = 0.2;

/// Wheel assembly centres, mirrored over both axes.
const WHEEL_POSITIONS: [[f32; 3]; 4] = [
    [-1.2, 0.3, 0.9],
    [1.2, 0.3, 0.9],
    [-1.2, 0.3, -0.9],
    [1.2, 0.3, -0.9],
];

/// The vehicle: a flat list of parts plus the role registry built at
/// construction.
///
/// Every part appears under exactly one role. The registry is the only
/// role lookup in the system; it is rebuilt whenever the model is rebuilt
/// and never re-derived from geometry.
#[derive(Debug)]
pub struct VehicleModel {
    parts: Vec<ScenePart>,
    roles: HashMap<PartRole, Vec<PartId>>,
    root: Instance,
}

impl VehicleModel {
    /// Build the fixed part topology from a configuration snapshot.
    ///
    /// Body and roof take the configured body colour, rims the configured
    /// rim colour; everything else has a fixed material.
    pub fn build(config: &Configuration) -> Self {
        let mut parts = Vec::with_capacity(15);

        parts.push(ScenePart::new(
            PartRole::Body,
            Geometry::Cuboid {
                width: 4.5,
                height: 1.2,
                depth: 1.8,
            },
            PartMaterial::painted(config.body_colour, 0.4, 0.6),
            Instance::from(Vector3::new(0.0, 0.6, 0.0)),
        ));

        parts.push(ScenePart::new(
            PartRole::Roof,
            Geometry::Cuboid {
                width: 2.0,
                height: 0.5,
                depth: 1.5,
            },
            PartMaterial::painted(config.body_colour, 0.3, 0.5),
            Instance::from(Vector3::new(0.0, 1.5, 0.0)),
        ));

        parts.push(ScenePart::new(
            PartRole::Glass,
            Geometry::Cuboid {
                width: 2.0,
                height: 0.8,
                depth: 1.4,
            },
            PartMaterial::glass(),
            Instance::from(Vector3::new(0.0, 1.2, 0.0)),
        ));

        // Wheels lie on their side: the cylinder axis is rolled from Y onto X.
        let axle_roll = Quaternion::from_angle_z(Deg(90.0));
        for [x, y, z] in WHEEL_POSITIONS {
            let placement = Instance {
                position: Vector3::new(x, y, z),
                rotation: axle_roll,
                scale: Vector3::new(1.0, 1.0, 1.0),
            };
            parts.push(ScenePart::new(
                PartRole::Tire,
                Geometry::Cylinder {
                    radius: TIRE_RADIUS,
                    height: 0.2,
                    segments: 16,
                },
                PartMaterial::painted(Colour(0x333333), 0.8, 0.2),
                placement.clone(),
            ));
            parts.push(ScenePart::new(
                PartRole::Rim,
                Geometry::Cylinder {
                    radius: RIM_RADIUS,
                    height: 0.21,
                    segments: 10,
                },
                PartMaterial::painted(config.rim_colour, 0.9, 0.1),
                placement,
            ));
        }

        for x in [-1.8, 1.8] {
            parts.push(ScenePart::new(
                PartRole::Headlight,
                Geometry::Sphere {
                    radius: 0.1,
                    segments: 8,
                },
                PartMaterial::marker(Colour(0xFFFFCC)),
                Instance::from(Vector3::new(x, 0.8, 0.9)),
            ));
        }
        for x in [-1.8, 1.8] {
            parts.push(ScenePart::new(
                PartRole::Taillight,
                Geometry::Cuboid {
                    width: 0.1,
                    height: 0.2,
                    depth: 0.1,
                },
                PartMaterial::marker(Colour(0xFF0000)),
                Instance::from(Vector3::new(x, 0.8, -0.9)),
            ));
        }

        let mut roles: HashMap<PartRole, Vec<PartId>> = HashMap::new();
        for (index, part) in parts.iter().enumerate() {
            roles.entry(part.role).or_default().push(PartId(index));
        }

        let root = Instance {
            position: Vector3::new(0.0, 0.5, 0.0),
            rotation: Quaternion::from_angle_y(Deg(0.0)),
            scale: Vector3::new(0.7, 0.7, 0.7),
        };

        Self { parts, roles, root }
    }

    pub fn parts(&self) -> &[ScenePart] {
        &self.parts
    }

    pub fn part(&self, id: PartId) -> &ScenePart {
        &self.parts[id.0]
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// All parts holding `role`, in construction order.
    pub fn with_role(&self, role: PartRole) -> &[PartId] {
        self.roles.get(&role).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All parts holding any of `roles`, in role order.
    pub fn with_roles(&self, roles: &[PartRole]) -> Vec<PartId> {
        roles
            .iter()
            .flat_map(|role| self.with_role(*role).iter().copied())
            .collect()
    }

    /// Every part a body colour change repaints.
    pub fn paint_targets(&self) -> Vec<PartId> {
        self.with_roles(&PAINT_ROLES)
    }

    /// Every part a rim colour change repaints.
    pub fn rim_targets(&self) -> Vec<PartId> {
        self.with_roles(&[PartRole::Rim])
    }

    /// Every part the render loop rotates.
    pub fn spin_targets(&self) -> Vec<PartId> {
        self.with_roles(&SPIN_ROLES)
    }

    /// Set `colour` on each listed part and flag it for re-upload. Parts
    /// outside the list are untouched.
    pub fn apply_colour(&mut self, targets: &[PartId], colour: Colour) {
        for id in targets {
            let part = &mut self.parts[id.0];
            part.material.colour = colour;
            part.dirty = true;
        }
    }

    /// Advance the axle rotation of every rotatable part.
    pub fn advance_spin(&mut self, dt: Duration) {
        let step = Rad(SPIN_RATE * dt.as_secs_f32());
        for id in self.spin_targets() {
            let part = &mut self.parts[id.0];
            part.spin_angle += step;
            part.dirty = true;
        }
    }

    /// The part's world transform: root, then local placement, with the
    /// spin applied around the part's own origin.
    pub fn world_transform(&self, id: PartId) -> Instance {
        let part = &self.parts[id.0];
        let mut local = part.local.clone();
        local.rotation = Quaternion::from_angle_y(part.spin_angle) * local.rotation;
        &self.root * &local
    }

    /// Collect and clear the dirty flags, yielding the slots the renderer
    /// must re-upload.
    pub fn take_dirty(&mut self) -> Vec<PartId> {
        let mut dirty = Vec::new();
        for (index, part) in self.parts.iter_mut().enumerate() {
            if part.dirty {
                part.dirty = false;
                dirty.push(PartId(index));
            }
        }
        dirty
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BODY_COLOURS, RIM_COLOURS};

    fn model() -> VehicleModel {
        VehicleModel::build(&Configuration::default())
    }

    #[test]
    fn topology_is_fifteen_parts() {
        let model = model();
        assert_eq!(model.len(), 15);
        assert_eq!(model.with_role(PartRole::Body).len(), 1);
        assert_eq!(model.with_role(PartRole::Roof).len(), 1);
        assert_eq!(model.with_role(PartRole::Glass).len(), 1);
        assert_eq!(model.with_role(PartRole::Tire).len(), 4);
        assert_eq!(model.with_role(PartRole::Rim).len(), 4);
        assert_eq!(model.with_role(PartRole::Headlight).len(), 2);
        assert_eq!(model.with_role(PartRole::Taillight).len(), 2);
    }

    #[test]
    fn every_part_has_exactly_one_role() {
        let model = model();
        let mut seen = vec![0usize; model.len()];
        for role in [
            PartRole::Body,
            PartRole::Roof,
            PartRole::Glass,
            PartRole::Tire,
            PartRole::Rim,
            PartRole::Headlight,
            PartRole::Taillight,
        ] {
            for id in model.with_role(role) {
                seen[id.0] += 1;
            }
        }
        assert!(seen.iter().all(|&count| count == 1));
    }

    #[test]
    fn paint_and_rim_targets_are_disjoint() {
        let model = model();
        let paint = model.paint_targets();
        for id in model.rim_targets() {
            assert!(!paint.contains(&id));
        }
    }

    #[test]
    fn build_takes_colours_from_the_configuration() {
        let config = Configuration {
            body_colour: BODY_COLOURS[2].colour,
            rim_colour: RIM_COLOURS[3].colour,
            ..Configuration::default()
        };
        let model = VehicleModel::build(&config);
        for id in model.paint_targets() {
            assert_eq!(model.part(id).material.colour, BODY_COLOURS[2].colour);
        }
        for id in model.rim_targets() {
            assert_eq!(model.part(id).material.colour, RIM_COLOURS[3].colour);
        }
    }

    #[test]
    fn apply_colour_touches_only_the_targets() {
        let mut model = model();
        let before: Vec<_> = model.parts().to_vec();
        let targets = model.paint_targets();
        model.apply_colour(&targets, Colour(0x4682B4));

        for (index, part) in model.parts().iter().enumerate() {
            if targets.contains(&PartId(index)) {
                assert_eq!(part.material.colour, Colour(0x4682B4));
                assert!(part.dirty);
            } else {
                assert_eq!(part.material.colour, before[index].material.colour);
                assert!(!part.dirty);
            }
        }
    }

    #[test]
    fn spin_advances_only_the_rotatable_parts() {
        let mut model = model();
        model.advance_spin(Duration::from_millis(500));
        let expected = Rad(SPIN_RATE * 0.5);
        for id in model.spin_targets() {
            assert!((model.part(id).spin_angle.0 - expected.0).abs() < 1e-6);
        }
        for id in model.with_roles(&[PartRole::Body, PartRole::Glass, PartRole::Headlight]) {
            assert_eq!(model.part(id).spin_angle, Rad(0.0));
        }
    }

    #[test]
    fn take_dirty_drains_the_flags() {
        let mut model = model();
        assert!(model.take_dirty().is_empty());
        let targets = model.rim_targets();
        model.apply_colour(&targets, RIM_COLOURS[1].colour);
        let dirty = model.take_dirty();
        assert_eq!(dirty.len(), 4);
        assert!(model.take_dirty().is_empty());
    }

    #[test]
    fn wheel_assemblies_sit_at_the_mirrored_positions() {
        let model = model();
        let tires = model.with_role(PartRole::Tire);
        let mut positions: Vec<_> = tires
            .iter()
            .map(|id| {
                let p = model.part(*id).local.position;
                ((p.x * 10.0) as i32, (p.z * 10.0) as i32)
            })
            .collect();
        positions.sort();
        // All four quadrant combinations are present.
        assert_eq!(positions.len(), 4);
        positions.dedup();
        assert_eq!(positions.len(), 4);
    }

    #[test]
    fn world_transform_applies_root_scale_and_lift() {
        let model = model();
        let body = model.with_role(PartRole::Body)[0];
        let world = model.world_transform(body);
        // Root scale 0.7 and +0.5 lift: the body centre at local y 0.6 lands
        // at 0.5 + 0.42.
        assert!((world.position.y - 0.92).abs() < 1e-6);
        assert!((world.scale.x - 0.7).abs() < 1e-6);
    }
}
