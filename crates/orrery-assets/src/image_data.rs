//! Texture and skybox image decoding.

use std::path::{Path, PathBuf};

use crate::error::AssetError;

/// Face file stems in cube layer order `+X, -X, +Y, -Y, +Z, -Z`.
pub const CUBEMAP_FACE_NAMES: [&str; 6] = ["px", "nx", "py", "ny", "pz", "nz"];

/// Tried in order for each cubemap face.
const CUBEMAP_EXTENSIONS: [&str; 2] = ["png", "jpg"];

/// Decoded 8-bit RGBA pixels, top row first.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl ImageData {
    /// A single opaque pixel, for placeholder textures.
    pub fn solid(rgba: [u8; 4]) -> Self {
        Self {
            width: 1,
            height: 1,
            rgba: rgba.to_vec(),
        }
    }

    pub fn bytes_per_row(&self) -> u32 {
        self.width * 4
    }
}

pub fn load_image_rgba(path: &Path) -> Result<ImageData, AssetError> {
    if !path.is_file() {
        return Err(AssetError::NotFound(path.to_path_buf()));
    }
    let img = image::open(path)
        .map_err(|source| AssetError::Image {
            path: path.to_path_buf(),
            source,
        })?
        .to_rgba8();
    log::debug!("Decoded {} ({}x{})", path.display(), img.width(), img.height());
    Ok(ImageData {
        width: img.width(),
        height: img.height(),
        rgba: img.into_raw(),
    })
}

/// Six square faces of equal size.
#[derive(Clone, Debug, PartialEq)]
pub struct CubemapImages {
    pub size: u32,
    pub faces: [ImageData; 6],
}

/// Load `px, nx, py, ny, pz, nz` from `dir`, each as `.png` or else `.jpg`.
pub fn load_cubemap_faces(dir: &Path) -> Result<CubemapImages, AssetError> {
    let mut faces: [ImageData; 6] = Default::default();
    let mut size = None;

    for (slot, face) in faces.iter_mut().zip(CUBEMAP_FACE_NAMES) {
        let path = find_face(dir, face)?;
        let image = load_image_rgba(&path)?;
        let expected = *size.get_or_insert(image.width);
        if image.width != expected || image.height != expected {
            return Err(AssetError::CubemapFaceSize {
                path,
                width: image.width,
                height: image.height,
                expected,
            });
        }
        *slot = image;
    }

    let size = faces[0].width;
    log::info!("Loaded skybox from {} ({size}x{size} per face)", dir.display());
    Ok(CubemapImages { size, faces })
}

fn find_face(dir: &Path, face: &'static str) -> Result<PathBuf, AssetError> {
    CUBEMAP_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{face}.{ext}")))
        .find(|p| p.is_file())
        .ok_or_else(|| AssetError::MissingCubemapFace {
            dir: dir.to_path_buf(),
            face,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_png(path: &Path, w: u32, h: u32, px: [u8; 4]) {
        image::RgbaImage::from_pixel(w, h, image::Rgba(px))
            .save(path)
            .unwrap();
    }

    #[test]
    fn test_png_decodes_to_rgba() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.png");
        write_png(&path, 3, 2, [10, 20, 30, 255]);
        let img = load_image_rgba(&path).unwrap();
        assert_eq!((img.width, img.height), (3, 2));
        assert_eq!(img.rgba.len(), 3 * 2 * 4);
        assert_eq!(&img.rgba[..4], &[10, 20, 30, 255]);
        assert_eq!(img.bytes_per_row(), 12);
    }

    #[test]
    fn test_missing_image_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_image_rgba(&dir.path().join("x.png")),
            Err(AssetError::NotFound(_))
        ));
    }

    #[test]
    fn test_corrupt_image_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.png");
        std::fs::write(&path, b"definitely not a png").unwrap();
        assert!(matches!(load_image_rgba(&path), Err(AssetError::Image { .. })));
    }

    #[test]
    fn test_cubemap_loads_in_face_order() {
        let dir = tempfile::tempdir().unwrap();
        for (i, face) in CUBEMAP_FACE_NAMES.iter().enumerate() {
            write_png(&dir.path().join(format!("{face}.png")), 4, 4, [i as u8, 0, 0, 255]);
        }
        let cube = load_cubemap_faces(dir.path()).unwrap();
        assert_eq!(cube.size, 4);
        for (i, face) in cube.faces.iter().enumerate() {
            assert_eq!(face.rgba[0], i as u8);
        }
    }

    #[test]
    fn test_cubemap_falls_back_to_jpg() {
        let dir = tempfile::tempdir().unwrap();
        for face in CUBEMAP_FACE_NAMES {
            let name = if face == "ny" {
                "ny.jpg".to_string()
            } else {
                format!("{face}.png")
            };
            let img = image::RgbImage::from_pixel(2, 2, image::Rgb([9, 9, 9]));
            img.save(dir.path().join(name)).unwrap();
        }
        assert_eq!(load_cubemap_faces(dir.path()).unwrap().size, 2);
    }

    #[test]
    fn test_cubemap_missing_face() {
        let dir = tempfile::tempdir().unwrap();
        for face in &CUBEMAP_FACE_NAMES[..5] {
            write_png(&dir.path().join(format!("{face}.png")), 2, 2, [0; 4]);
        }
        match load_cubemap_faces(dir.path()) {
            Err(AssetError::MissingCubemapFace { face, .. }) => assert_eq!(face, "nz"),
            other => panic!("expected missing nz, got {other:?}"),
        }
    }

    #[test]
    fn test_cubemap_rejects_mismatched_faces() {
        let dir = tempfile::tempdir().unwrap();
        for face in CUBEMAP_FACE_NAMES {
            let size = if face == "pz" { 8 } else { 4 };
            write_png(&dir.path().join(format!("{face}.png")), size, size, [0; 4]);
        }
        assert!(matches!(
            load_cubemap_faces(dir.path()),
            Err(AssetError::CubemapFaceSize { expected: 4, width: 8, .. })
        ));
    }
}
