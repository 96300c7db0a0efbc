//! Engine data structures: parts, meshes, textures, and instances.
//!
//! This module contains the core data types for scene representation:
//!
//! - `part` holds the vehicle part model (roles, materials, geometry descriptors)
//! - `geometry` generates the procedural primitive meshes
//! - `instance` holds per-part transformation and material lane data
//! - `texture` contains the GPU texture wrapper and creation utilities

pub mod geometry;
pub mod instance;
pub mod part;
pub mod texture;
