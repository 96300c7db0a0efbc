//! Procedural primitive meshes.
//!
//! The vehicle is assembled from three primitives (cuboid, cylinder,
//! sphere), generated on the CPU as position/normal vertex data plus a
//! `u32` index list. No asset files are involved.

use crate::data_structures::part::Geometry;

/// Vertex format for part meshes: position and normal only. Parts are
/// solid-coloured, so there are no texture coordinates.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PartVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl PartVertex {
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<PartVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// CPU-side mesh data ready for buffer upload.
#[derive(Debug, Clone)]
pub struct MeshData {
    pub vertices: Vec<PartVertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn from_geometry(geometry: &Geometry) -> Self {
        match *geometry {
            Geometry::Cuboid {
                width,
                height,
                depth,
            } => cuboid(width, height, depth),
            Geometry::Cylinder {
                radius,
                height,
                segments,
            } => cylinder(radius, height, segments),
            Geometry::Sphere { radius, segments } => sphere(radius, segments),
        }
    }
}

/// Axis-aligned cuboid centred on the origin. Flat shading: four vertices
/// per face so every face keeps its own normal.
pub fn cuboid(width: f32, height: f32, depth: f32) -> MeshData {
    let (hx, hy, hz) = (width / 2.0, height / 2.0, depth / 2.0);
    // Each face: outward normal plus four corners wound counter-clockwise
    // seen from outside.
    let faces: [([f32; 3], [[f32; 3]; 4]); 6] = [
        (
            [1.0, 0.0, 0.0],
            [
                [hx, -hy, hz],
                [hx, -hy, -hz],
                [hx, hy, -hz],
                [hx, hy, hz],
            ],
        ),
        (
            [-1.0, 0.0, 0.0],
            [
                [-hx, -hy, -hz],
                [-hx, -hy, hz],
                [-hx, hy, hz],
                [-hx, hy, -hz],
            ],
        ),
        (
            [0.0, 1.0, 0.0],
            [
                [-hx, hy, hz],
                [hx, hy, hz],
                [hx, hy, -hz],
                [-hx, hy, -hz],
            ],
        ),
        (
            [0.0, -1.0, 0.0],
            [
                [-hx, -hy, -hz],
                [hx, -hy, -hz],
                [hx, -hy, hz],
                [-hx, -hy, hz],
            ],
        ),
        (
            [0.0, 0.0, 1.0],
            [
                [-hx, -hy, hz],
                [hx, -hy, hz],
                [hx, hy, hz],
                [-hx, hy, hz],
            ],
        ),
        (
            [0.0, 0.0, -1.0],
            [
                [hx, -hy, -hz],
                [-hx, -hy, -hz],
                [-hx, hy, -hz],
                [hx, hy, -hz],
            ],
        ),
    ];

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (normal, corners) in faces {
        let base = vertices.len() as u32;
        for position in corners {
            vertices.push(PartVertex { position, normal });
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    MeshData { vertices, indices }
}

/// Capped cylinder along the Y axis, centred on the origin.
///
/// The side shares smooth radial normals; the caps get their own flat
/// vertices. Vertex count is `4 * segments + 2`, index count `12 * segments`.
pub fn cylinder(radius: f32, height: f32, segments: u32) -> MeshData {
    let hy = height / 2.0;
    let ring: Vec<(f32, f32)> = (0..segments)
        .map(|i| {
            let theta = i as f32 / segments as f32 * std::f32::consts::TAU;
            (theta.cos(), theta.sin())
        })
        .collect();

    let mut vertices = Vec::with_capacity(4 * segments as usize + 2);
    let mut indices = Vec::with_capacity(12 * segments as usize);

    // Side: bottom ring then top ring, radial normals.
    for &(cos, sin) in &ring {
        vertices.push(PartVertex {
            position: [radius * cos, -hy, radius * sin],
            normal: [cos, 0.0, sin],
        });
    }
    for &(cos, sin) in &ring {
        vertices.push(PartVertex {
            position: [radius * cos, hy, radius * sin],
            normal: [cos, 0.0, sin],
        });
    }
    for i in 0..segments {
        let next = (i + 1) % segments;
        let (b, b_next) = (i, next);
        let (t, t_next) = (segments + i, segments + next);
        indices.extend_from_slice(&[b, t, t_next, b, t_next, b_next]);
    }

    // Caps: centre vertex plus a flat-normal copy of the ring each.
    let top_centre = vertices.len() as u32;
    vertices.push(PartVertex {
        position: [0.0, hy, 0.0],
        normal: [0.0, 1.0, 0.0],
    });
    for &(cos, sin) in &ring {
        vertices.push(PartVertex {
            position: [radius * cos, hy, radius * sin],
            normal: [0.0, 1.0, 0.0],
        });
    }
    for i in 0..segments {
        let next = (i + 1) % segments;
        indices.extend_from_slice(&[top_centre, top_centre + 1 + next, top_centre + 1 + i]);
    }

    let bottom_centre = vertices.len() as u32;
    vertices.push(PartVertex {
        position: [0.0, -hy, 0.0],
        normal: [0.0, -1.0, 0.0],
    });
    for &(cos, sin) in &ring {
        vertices.push(PartVertex {
            position: [radius * cos, -hy, radius * sin],
            normal: [0.0, -1.0, 0.0],
        });
    }
    for i in 0..segments {
        let next = (i + 1) % segments;
        indices.extend_from_slice(&[bottom_centre, bottom_centre + 1 + i, bottom_centre + 1 + next]);
    }

    MeshData { vertices, indices }
}

/// UV sphere centred on the origin with `segments` meridians and parallels.
///
/// Pole rows skip their degenerate triangle, matching the usual lat/long
/// construction. Index count is `6 * segments * (segments - 1)`.
pub fn sphere(radius: f32, segments: u32) -> MeshData {
    let mut vertices = Vec::with_capacity(((segments + 1) * (segments + 1)) as usize);
    for iy in 0..=segments {
        let phi = iy as f32 / segments as f32 * std::f32::consts::PI;
        for ix in 0..=segments {
            let theta = ix as f32 / segments as f32 * std::f32::consts::TAU;
            let normal = [
                phi.sin() * theta.cos(),
                phi.cos(),
                phi.sin() * theta.sin(),
            ];
            vertices.push(PartVertex {
                position: [radius * normal[0], radius * normal[1], radius * normal[2]],
                normal,
            });
        }
    }

    let row = segments + 1;
    let mut indices = Vec::with_capacity((6 * segments * (segments - 1)) as usize);
    for iy in 0..segments {
        for ix in 0..segments {
            let a = iy * row + ix;
            let b = (iy + 1) * row + ix;
            let c = (iy + 1) * row + ix + 1;
            let d = iy * row + ix + 1;
            if iy != 0 {
                indices.extend_from_slice(&[a, d, c]);
            }
            if iy != segments - 1 {
                indices.extend_from_slice(&[a, c, b]);
            }
        }
    }
    MeshData { vertices, indices }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_well_formed(mesh: &MeshData) {
        assert_eq!(mesh.indices.len() % 3, 0);
        for &index in &mesh.indices {
            assert!((index as usize) < mesh.vertices.len(), "index out of range");
        }
        for vertex in &mesh.vertices {
            let [x, y, z] = vertex.normal;
            let len = (x * x + y * y + z * z).sqrt();
            assert!((len - 1.0).abs() < 1e-4, "normal not unit length: {}", len);
        }
        // Every triangle must wind counter-clockwise seen from outside, or
        // back-face culling would drop it.
        for triangle in mesh.indices.chunks_exact(3) {
            let [v0, v1, v2] =
                [0, 1, 2].map(|i| mesh.vertices[triangle[i] as usize]);
            let e1 = [
                v1.position[0] - v0.position[0],
                v1.position[1] - v0.position[1],
                v1.position[2] - v0.position[2],
            ];
            let e2 = [
                v2.position[0] - v0.position[0],
                v2.position[1] - v0.position[1],
                v2.position[2] - v0.position[2],
            ];
            let face = [
                e1[1] * e2[2] - e1[2] * e2[1],
                e1[2] * e2[0] - e1[0] * e2[2],
                e1[0] * e2[1] - e1[1] * e2[0],
            ];
            let outward: f32 = (0..3)
                .map(|i| face[i] * (v0.normal[i] + v1.normal[i] + v2.normal[i]))
                .sum();
            assert!(outward > 0.0, "clockwise triangle {:?}", triangle);
        }
    }

    #[test]
    fn cuboid_counts() {
        let mesh = cuboid(4.5, 1.2, 1.8);
        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(mesh.indices.len(), 36);
        assert_well_formed(&mesh);
    }

    #[test]
    fn cylinder_counts() {
        let mesh = cylinder(0.3, 0.2, 16);
        assert_eq!(mesh.vertices.len(), 4 * 16 + 2);
        assert_eq!(mesh.indices.len(), 12 * 16);
        assert_well_formed(&mesh);
    }

    #[test]
    fn sphere_counts() {
        let mesh = sphere(0.1, 8);
        assert_eq!(mesh.vertices.len(), 9 * 9);
        assert_eq!(mesh.indices.len(), 6 * 8 * 7);
        assert_well_formed(&mesh);
    }

    #[test]
    fn cuboid_spans_requested_extents() {
        let mesh = cuboid(2.0, 0.5, 1.5);
        let max_x = mesh.vertices.iter().map(|v| v.position[0]).fold(f32::MIN, f32::max);
        let max_y = mesh.vertices.iter().map(|v| v.position[1]).fold(f32::MIN, f32::max);
        let max_z = mesh.vertices.iter().map(|v| v.position[2]).fold(f32::MIN, f32::max);
        assert_eq!(max_x, 1.0);
        assert_eq!(max_y, 0.25);
        assert_eq!(max_z, 0.75);
    }

    #[test]
    fn sphere_vertices_sit_on_the_radius() {
        let mesh = sphere(0.1, 8);
        for vertex in &mesh.vertices {
            let [x, y, z] = vertex.position;
            let len = (x * x + y * y + z * z).sqrt();
            assert!((len - 0.1).abs() < 1e-5);
        }
    }
}
