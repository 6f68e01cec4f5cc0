use std::path::PathBuf;

/// Errors raised while loading scene assets.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("asset not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to load OBJ {path}: {source}")]
    Obj {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },

    #[error("{0} contains no triangles")]
    EmptyMesh(PathBuf),

    #[error("{path}: index {index} out of range for {vertex_count} vertices")]
    BadIndex {
        path: PathBuf,
        index: u32,
        vertex_count: usize,
    },

    #[error("failed to decode image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("cubemap face `{face}` missing in {dir} (tried .png and .jpg)")]
    MissingCubemapFace { dir: PathBuf, face: &'static str },

    #[error("cubemap face {path} is {width}x{height}, expected {expected}x{expected}")]
    CubemapFaceSize {
        path: PathBuf,
        width: u32,
        height: u32,
        expected: u32,
    },
}
