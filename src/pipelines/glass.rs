use crate::{
    data_structures::{geometry::PartVertex, instance::InstanceRaw, texture::Texture},
    pipelines::part::mk_render_pipeline,
};

/**
The glass pipeline. Shares the part shader, which reads its opacity from
the instance colour alpha; only the blend state differs. Glass parts are
drawn after everything opaque so the blend sees the finished scene.
*/
pub fn mk_glass_pipeline(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    camera_bind_group_layout: &wgpu::BindGroupLayout,
    light_bind_group_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let render_pipeline_layout =
        device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Glass Pipeline Layout"),
            bind_group_layouts: &[Some(camera_bind_group_layout), Some(light_bind_group_layout)],
            immediate_size: 0,
        });
    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Part Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("part.wgsl").into()),
    };
    mk_render_pipeline(
        device,
        &render_pipeline_layout,
        config.format,
        Some(wgpu::BlendState::ALPHA_BLENDING),
        Some(wgpu::DepthStencilState {
            format: Texture::DEPTH_FORMAT,
            depth_write_enabled: Some(true),
            depth_compare: Some(wgpu::CompareFunction::Less),
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        wgpu::PrimitiveTopology::TriangleList,
        &[PartVertex::desc(), InstanceRaw::desc()],
        shader,
    )
}
