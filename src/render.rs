//! Scene rendering: GPU mesh cache, the shared instance buffer, and the
//! draw pass over vehicle, backdrop, and star field.
//!
//! Parts sharing a geometry descriptor share one mesh; each part owns one
//! slot in a single instance buffer, re-uploaded only when its dirty flag
//! says so. The pass order is sky, opaque parts, stars, then glass, so the
//! blend pass sees the finished scene behind it.

use std::mem;

use wgpu::util::DeviceExt;

use crate::{
    context::Context,
    data_structures::{
        geometry::MeshData, instance::InstanceRaw, part::Geometry, texture::Texture,
    },
    environment::{Backdrop, EnvironmentController},
    pipelines::sky,
    vehicle::{PartId, VehicleModel},
};

/// An uploaded mesh.
pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

/// Everything GPU-side the scene needs beyond the context: meshes, the
/// instance buffer, and the optional star and panorama resources.
pub struct SceneRenderer {
    meshes: Vec<(Geometry, GpuMesh)>,
    /// Part slot to mesh index, aligned with the vehicle's part order.
    part_mesh: Vec<usize>,
    instance_buffer: wgpu::Buffer,
    opaque: Vec<PartId>,
    glass: Vec<PartId>,
    stars: Option<(wgpu::Buffer, u32)>,
    panorama: Option<wgpu::BindGroup>,
}

impl SceneRenderer {
    /// Upload the vehicle's meshes and instance slots. Parts with the same
    /// geometry descriptor share a mesh.
    pub fn new(device: &wgpu::Device, vehicle: &VehicleModel) -> Self {
        let mut meshes: Vec<(Geometry, GpuMesh)> = Vec::new();
        let mut part_mesh = Vec::with_capacity(vehicle.len());

        for part in vehicle.parts() {
            let index = match meshes.iter().position(|(key, _)| *key == part.geometry) {
                Some(index) => index,
                None => {
                    let data = MeshData::from_geometry(&part.geometry);
                    meshes.push((part.geometry, upload_mesh(device, &data)));
                    meshes.len() - 1
                }
            };
            part_mesh.push(index);
        }

        let instances: Vec<InstanceRaw> = (0..vehicle.len())
            .map(|index| {
                let id = PartId(index);
                vehicle
                    .world_transform(id)
                    .to_raw(&vehicle.part(id).material)
            })
            .collect();
        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Instance Buffer"),
            contents: bytemuck::cast_slice(&instances),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });

        let mut opaque = Vec::new();
        let mut glass = Vec::new();
        for (index, part) in vehicle.parts().iter().enumerate() {
            if part.material.transmissive {
                glass.push(PartId(index));
            } else {
                opaque.push(PartId(index));
            }
        }

        Self {
            meshes,
            part_mesh,
            instance_buffer,
            opaque,
            glass,
            stars: None,
            panorama: None,
        }
    }

    /// Push pending CPU-side changes to the GPU: dirty instance slots, a
    /// regenerated star field, a newly installed panorama.
    pub fn sync(
        &mut self,
        ctx: &Context,
        vehicle: &mut VehicleModel,
        environment: &mut EnvironmentController,
    ) {
        for id in vehicle.take_dirty() {
            let raw = vehicle
                .world_transform(id)
                .to_raw(&vehicle.part(id).material);
            ctx.queue.write_buffer(
                &self.instance_buffer,
                (id.0 * mem::size_of::<InstanceRaw>()) as wgpu::BufferAddress,
                bytemuck::cast_slice(&[raw]),
            );
        }

        if environment.take_stars_dirty() {
            self.stars = if environment.stars().is_empty() {
                None
            } else {
                let buffer = ctx
                    .device
                    .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some("Star Vertex Buffer"),
                        contents: bytemuck::cast_slice(environment.stars()),
                        usage: wgpu::BufferUsages::VERTEX,
                    });
                Some((buffer, environment.stars().len() as u32))
            };
        }

        if environment.take_backdrop_dirty() {
            self.panorama = match environment.backdrop() {
                Backdrop::Panorama(panorama) => {
                    let texture = Texture::from_rgba8(
                        &ctx.device,
                        &ctx.queue,
                        &panorama.image,
                        "Panorama Texture",
                    );
                    texture.sampler.as_ref().map(|sampler| {
                        ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
                            layout: &sky::panorama_layout(&ctx.device),
                            entries: &[
                                wgpu::BindGroupEntry {
                                    binding: 0,
                                    resource: wgpu::BindingResource::TextureView(&texture.view),
                                },
                                wgpu::BindGroupEntry {
                                    binding: 1,
                                    resource: wgpu::BindingResource::Sampler(sampler),
                                },
                            ],
                            label: Some("panorama_bind_group"),
                        })
                    })
                }
                Backdrop::Flat(_) => None,
            };
        }
    }

    /// Record the full scene into one render pass on `view`.
    pub fn draw(
        &self,
        ctx: &Context,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        depth_view: &wgpu::TextureView,
        clear_colour: wgpu::Color,
    ) {
        let mut render_pass: wgpu::RenderPass<'_> =
            encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

        if let Some(panorama) = &self.panorama {
            render_pass.set_pipeline(&ctx.pipelines.sky);
            render_pass.set_bind_group(0, &ctx.camera.bind_group, &[]);
            render_pass.set_bind_group(1, panorama, &[]);
            render_pass.draw(0..3, 0..1);
        }

        render_pass.set_pipeline(&ctx.pipelines.part);
        render_pass.set_bind_group(0, &ctx.camera.bind_group, &[]);
        render_pass.set_bind_group(1, &ctx.light.bind_group, &[]);
        render_pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
        self.draw_parts(&mut render_pass, &self.opaque);

        if let Some((buffer, count)) = &self.stars {
            render_pass.set_pipeline(&ctx.pipelines.stars);
            render_pass.set_bind_group(0, &ctx.camera.bind_group, &[]);
            render_pass.set_vertex_buffer(0, buffer.slice(..));
            render_pass.draw(0..*count, 0..1);
        }

        render_pass.set_pipeline(&ctx.pipelines.glass);
        render_pass.set_bind_group(0, &ctx.camera.bind_group, &[]);
        render_pass.set_bind_group(1, &ctx.light.bind_group, &[]);
        render_pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
        self.draw_parts(&mut render_pass, &self.glass);
    }

    /// Draw each listed part with its mesh, addressing its instance slot
    /// by range so the shared buffer needs no per-part rebinding.
    fn draw_parts(&self, render_pass: &mut wgpu::RenderPass<'_>, parts: &[PartId]) {
        for id in parts {
            let mesh = &self.meshes[self.part_mesh[id.0]].1;
            render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            render_pass
                .set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            render_pass.draw_indexed(0..mesh.index_count, 0, id.0 as u32..id.0 as u32 + 1);
        }
    }

    /// Number of distinct meshes behind the vehicle's parts.
    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }
}

fn upload_mesh(device: &wgpu::Device, data: &MeshData) -> GpuMesh {
    let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Part Vertex Buffer"),
        contents: bytemuck::cast_slice(&data.vertices),
        usage: wgpu::BufferUsages::VERTEX,
    });
    let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Part Index Buffer"),
        contents: bytemuck::cast_slice(&data.indices),
        usage: wgpu::BufferUsages::INDEX,
    });
    GpuMesh {
        vertex_buffer,
        index_buffer,
        index_count: data.indices.len() as u32,
    }
}
