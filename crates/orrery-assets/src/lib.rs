//! Loading of the scene's meshes, textures and skybox faces from disk.
//!
//! Everything here runs once at startup; any failure is fatal to the caller.

mod error;
mod image_data;
mod mesh;

pub use error::AssetError;
pub use image_data::{CUBEMAP_FACE_NAMES, CubemapImages, ImageData, load_cubemap_faces, load_image_rgba};
pub use mesh::{MeshData, MeshVertex, load_obj_mesh};
