//! Render pipeline builders and the showroom light rig.

pub mod glass;
pub mod light;
pub mod part;
pub mod sky;
pub mod stars;

/// Every pipeline the showroom draws with. Built once at startup; resizes
/// only touch the surface and depth texture, never the pipelines.
pub struct Pipelines {
    pub part: wgpu::RenderPipeline,
    pub glass: wgpu::RenderPipeline,
    pub stars: wgpu::RenderPipeline,
    pub sky: wgpu::RenderPipeline,
}

impl Pipelines {
    pub fn new(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
        camera_bind_group_layout: &wgpu::BindGroupLayout,
        light_bind_group_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        Self {
            part: part::mk_part_pipeline(
                device,
                config,
                camera_bind_group_layout,
                light_bind_group_layout,
            ),
            glass: glass::mk_glass_pipeline(
                device,
                config,
                camera_bind_group_layout,
                light_bind_group_layout,
            ),
            stars: stars::mk_star_pipeline(device, config, camera_bind_group_layout),
            sky: sky::mk_sky_pipeline(device, config, camera_bind_group_layout),
        }
    }
}
