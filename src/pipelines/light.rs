use wgpu::util::DeviceExt;

pub struct LightResources {
    pub uniform: LightUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl LightResources {
    pub fn new(device: &wgpu::Device) -> Self {
        let uniform = LightUniform::showroom_rig();
        let buffer = mk_buffer(device, uniform);
        let bind_group_layout = mk_bind_group_layout(device);
        let bind_group = mk_bind_group(device, &bind_group_layout, &buffer);
        Self {
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }
}

/// The fixed two-point rig plus an ambient term the environment drives.
/// Positions are directions from the origin; both lights are directional.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    key_position: [f32; 3],
    // Intensities sit in the vec3 padding slots, keeping 16 byte spacing
    // without dedicated padding fields.
    key_intensity: f32,
    fill_position: [f32; 3],
    fill_intensity: f32,
    colour: [f32; 3],
    ambient: f32,
}

impl LightUniform {
    /// Key light high over the front quarter, a weak fill from behind.
    pub fn showroom_rig() -> Self {
        Self {
            key_position: [10.0, 20.0, 15.0],
            key_intensity: 1.0,
            fill_position: [-10.0, 10.0, -10.0],
            fill_intensity: 0.3,
            colour: [1.0, 1.0, 1.0],
            ambient: 0.5,
        }
    }

    pub fn ambient(&self) -> f32 {
        self.ambient
    }

    pub fn set_ambient(&mut self, ambient: f32) {
        self.ambient = ambient;
    }
}

pub fn mk_buffer(device: &wgpu::Device, light_uniform: LightUniform) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Light Buffer"),
        contents: bytemuck::cast_slice(&[light_uniform]),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}

pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: None,
    })
}

pub fn mk_bind_group(
    device: &wgpu::Device,
    bind_group_layout: &wgpu::BindGroupLayout,
    light_buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout: bind_group_layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: light_buffer.as_entire_binding(),
        }],
        label: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_is_sixteen_byte_blocked() {
        assert_eq!(std::mem::size_of::<LightUniform>(), 48);
    }

    #[test]
    fn ambient_is_adjustable() {
        let mut uniform = LightUniform::showroom_rig();
        assert!((uniform.ambient() - 0.5).abs() < f32::EPSILON);
        uniform.set_ambient(0.15);
        assert!((uniform.ambient() - 0.15).abs() < f32::EPSILON);
    }
}
