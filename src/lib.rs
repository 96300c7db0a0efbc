//! showroom
//!
//! An interactive vehicle configurator rendered with wgpu. A fixed-topology
//! vehicle model stands on a turntable stage; body colour, rim colour, wheel
//! style and environment are switched live from the keyboard, and the current
//! configuration can be exported as a PNG. All geometry is generated
//! procedurally, so the binary needs no model assets.
//!
//! High-level modules
//! - `camera`: orbit camera, controller and uniforms for view/projection
//! - `config`: option catalogs, the configuration record and the configurator
//! - `context`: central GPU and window context that owns device/queue/pipelines
//! - `data_structures`: scene data models (meshes, instances, parts, textures)
//! - `environment`: backdrop presets, star field and the panorama handshake
//! - `flow`: the winit event loop and per-frame update cycle
//! - `pipelines`: definitions for the render pipelines (part, glass, stars, sky)
//! - `render`: GPU mesh cache, instance buffer and the scene draw pass
//! - `snapshot`: offscreen capture and PNG export of the configuration
//! - `vehicle`: part construction and the role registry
//!

pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod environment;
pub mod flow;
pub mod pipelines;
pub mod render;
pub mod snapshot;
pub mod vehicle;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath::*;
pub use winit::event::DeviceEvent;
pub use winit::event::WindowEvent;
pub use wgpu::*;
