//! Instance transformation data for GPU rendering.
//!
//! Every part occupies one slot in a shared instance buffer. Besides the
//! transform, the slot carries the part's linear colour and shading
//! parameters so a colour change is a single small buffer write.

use std::ops::Mul;

use cgmath::One;

use crate::data_structures::part::PartMaterial;

/// Transformation of a part or of the vehicle root: position, rotation
/// (as quaternion), and scale.
///
/// Composition is written `parent * local`: the root transform composed
/// with a part's local placement gives the part's world transform.
#[derive(Clone, Debug)]
pub struct Instance {
    pub position: cgmath::Vector3<f32>,
    pub rotation: cgmath::Quaternion<f32>,
    pub scale: cgmath::Vector3<f32>,
}

impl Instance {
    /// Identity transformation (no move, rotate, or scale).
    pub fn new() -> Self {
        Self {
            position: cgmath::Vector3::new(0.0, 0.0, 0.0),
            // `Quaternion::one()` is the identity quaternion (no rotation)
            rotation: cgmath::Quaternion::one(),
            scale: cgmath::Vector3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn to_matrix(&self) -> cgmath::Matrix4<f32> {
        cgmath::Matrix4::from_translation(self.position)
            * cgmath::Matrix4::from(self.rotation)
            * cgmath::Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }

    /// Pack this transform and the part's material into the GPU form.
    pub fn to_raw(&self, material: &PartMaterial) -> InstanceRaw {
        let [r, g, b, _] = material.colour.to_linear_rgba();
        InstanceRaw {
            model: self.to_matrix().into(),
            normal: cgmath::Matrix3::from(self.rotation).into(),
            colour: [r, g, b, material.opacity],
            params: [
                material.metalness,
                material.roughness,
                if material.unlit { 1.0 } else { 0.0 },
                0.0,
            ],
        }
    }
}

impl Mul<Instance> for Instance {
    type Output = Self;

    fn mul(self, rhs: Instance) -> Self::Output {
        &self * &rhs
    }
}

impl<'a, 'b> Mul<&'b Instance> for &'a Instance {
    type Output = Instance;

    fn mul(self, rhs: &'b Instance) -> Self::Output {
        let new_rotation = self.rotation * rhs.rotation;

        let new_scale = cgmath::Vector3::new(
            self.scale.x * rhs.scale.x,
            self.scale.y * rhs.scale.y,
            self.scale.z * rhs.scale.z,
        );
        let scaled_rhs_pos = cgmath::Vector3::new(
            self.scale.x * rhs.position.x,
            self.scale.y * rhs.position.y,
            self.scale.z * rhs.position.z,
        );
        let new_position = self.position + (self.rotation * scaled_rhs_pos);

        Instance {
            position: new_position,
            rotation: new_rotation,
            scale: new_scale,
        }
    }
}

impl From<cgmath::Vector3<f32>> for Instance {
    fn from(position: cgmath::Vector3<f32>) -> Self {
        Instance {
            position,
            ..Default::default()
        }
    }
}

impl Default for Instance {
    fn default() -> Self {
        Self::new()
    }
}

/**
 * The raw instance is the actual data stored on the GPU: the model matrix,
 * the rotation part for normals, and the material lanes.
 */
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceRaw {
    model: [[f32; 4]; 4],
    normal: [[f32; 3]; 3],
    /// Linear RGB plus opacity in the alpha lane.
    colour: [f32; 4],
    /// metalness, roughness, unlit flag, one spare lane.
    params: [f32; 4],
}

impl InstanceRaw {
    /**
     * As instance data lives directly in GPU memory we need to tell what the
     * bytes refer to. A mat4 takes up four vertex slots (it is technically
     * four vec4s), the 3x3 normal matrix three more, then one slot each for
     * colour and shading params. Locations continue behind the mesh vertex
     * attributes.
     */
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<InstanceRaw>() as wgpu::BufferAddress,
            // Step per instance, not per vertex: the shader only advances to
            // the next slot when it starts a new instance.
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 5,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 4]>() as wgpu::BufferAddress,
                    shader_location: 6,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 8]>() as wgpu::BufferAddress,
                    shader_location: 7,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 12]>() as wgpu::BufferAddress,
                    shader_location: 8,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 16]>() as wgpu::BufferAddress,
                    shader_location: 9,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 19]>() as wgpu::BufferAddress,
                    shader_location: 10,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 22]>() as wgpu::BufferAddress,
                    shader_location: 11,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 25]>() as wgpu::BufferAddress,
                    shader_location: 12,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 29]>() as wgpu::BufferAddress,
                    shader_location: 13,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Deg, Quaternion, Rotation3, Vector3};

    #[test]
    fn composition_scales_child_offsets() {
        let parent = Instance {
            position: Vector3::new(0.0, 0.5, 0.0),
            rotation: Quaternion::one(),
            scale: Vector3::new(0.7, 0.7, 0.7),
        };
        let child = Instance::from(Vector3::new(1.2, 0.3, 0.9));
        let world = &parent * &child;
        assert!((world.position.x - 0.84).abs() < 1e-6);
        assert!((world.position.y - 0.71).abs() < 1e-6);
        assert!((world.position.z - 0.63).abs() < 1e-6);
        assert!((world.scale.x - 0.7).abs() < 1e-6);
    }

    #[test]
    fn composition_rotates_child_offsets() {
        let parent = Instance {
            position: Vector3::new(0.0, 0.0, 0.0),
            rotation: Quaternion::from_angle_y(Deg(90.0)),
            scale: Vector3::new(1.0, 1.0, 1.0),
        };
        let child = Instance::from(Vector3::new(1.0, 0.0, 0.0));
        let world = &parent * &child;
        // A 90 degree yaw takes +X to -Z.
        assert!(world.position.x.abs() < 1e-6);
        assert!((world.position.z + 1.0).abs() < 1e-6);
    }
}
