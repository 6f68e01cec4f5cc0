//! Wavefront OBJ loading.

use std::path::Path;

use glam::{Vec2, Vec3};
use orrery_math::Aabb;

use crate::error::AssetError;

/// Interleaved vertex as uploaded to the GPU.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeshVertex {
    pub position: Vec3,
    pub normal: Vec3,
    /// Top-left origin.
    pub uv: Vec2,
}

/// A whole OBJ file merged into one indexed triangle list.
#[derive(Clone, Debug)]
pub struct MeshData {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
    /// Model-space bounds over every vertex of every object in the file.
    pub bounds: Aabb,
}

impl MeshData {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Load and triangulate an OBJ file.
///
/// Objects are merged. Missing normals are rebuilt as area-weighted vertex
/// normals; missing texture coordinates become zero. V is flipped so that
/// textures can be uploaded top row first.
pub fn load_obj_mesh(path: &Path) -> Result<MeshData, AssetError> {
    if !path.is_file() {
        return Err(AssetError::NotFound(path.to_path_buf()));
    }
    let (models, _materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            single_index: true,
            triangulate: true,
            ..Default::default()
        },
    )
    .map_err(|source| AssetError::Obj {
        path: path.to_path_buf(),
        source,
    })?;

    let mut vertices = Vec::new();
    let mut indices = Vec::new();

    for model in models {
        let mesh = model.mesh;
        let base = vertices.len();
        let count = mesh.positions.len() / 3;
        let has_normals = mesh.normals.len() == mesh.positions.len();
        let has_uvs = mesh.texcoords.len() / 2 == count;

        for i in 0..count {
            let p = &mesh.positions[3 * i..3 * i + 3];
            let normal = if has_normals {
                let n = &mesh.normals[3 * i..3 * i + 3];
                Vec3::new(n[0], n[1], n[2])
            } else {
                Vec3::ZERO
            };
            let uv = if has_uvs {
                Vec2::new(mesh.texcoords[2 * i], 1.0 - mesh.texcoords[2 * i + 1])
            } else {
                Vec2::ZERO
            };
            vertices.push(MeshVertex {
                position: Vec3::new(p[0], p[1], p[2]),
                normal,
                uv,
            });
        }

        for &index in &mesh.indices {
            if index as usize >= count {
                return Err(AssetError::BadIndex {
                    path: path.to_path_buf(),
                    index,
                    vertex_count: count,
                });
            }
            indices.push(base as u32 + index);
        }

        if !has_normals {
            let first_index = indices.len() - mesh.indices.len();
            rebuild_normals(&mut vertices[base..], &indices[first_index..], base as u32);
        }
    }

    if indices.len() < 3 {
        return Err(AssetError::EmptyMesh(path.to_path_buf()));
    }

    let bounds = Aabb::from_points(vertices.iter().map(|v| v.position));
    log::info!(
        "Loaded {}: {} vertices, {} triangles, bounds {:?}..{:?}",
        path.display(),
        vertices.len(),
        indices.len() / 3,
        bounds.min,
        bounds.max
    );

    Ok(MeshData {
        vertices,
        indices,
        bounds,
    })
}

/// Area-weighted smooth normals. `indices` are offset by `base`.
fn rebuild_normals(vertices: &mut [MeshVertex], indices: &[u32], base: u32) {
    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| (i - base) as usize);
        let face = (vertices[b].position - vertices[a].position)
            .cross(vertices[c].position - vertices[a].position);
        for i in [a, b, c] {
            vertices[i].normal += face;
        }
    }
    for v in vertices.iter_mut() {
        v.normal = v.normal.try_normalize().unwrap_or(Vec3::Y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_obj(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    const QUAD: &str = "\
v 0 0 0
v 2 0 0
v 2 3 0
v 0 3 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
vn 0 0 1
f 1/1/1 2/2/1 3/3/1 4/4/1
";

    #[test]
    fn test_quad_is_triangulated() {
        let dir = tempfile::tempdir().unwrap();
        let mesh = load_obj_mesh(&write_obj(dir.path(), "quad.obj", QUAD)).unwrap();
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.bounds.min, Vec3::ZERO);
        assert_eq!(mesh.bounds.max, Vec3::new(2.0, 3.0, 0.0));
        assert!(mesh.vertices.iter().all(|v| v.normal == Vec3::Z));
    }

    #[test]
    fn test_v_is_flipped() {
        let dir = tempfile::tempdir().unwrap();
        let mesh = load_obj_mesh(&write_obj(dir.path(), "quad.obj", QUAD)).unwrap();
        let top = mesh
            .vertices
            .iter()
            .find(|v| v.position == Vec3::new(0.0, 3.0, 0.0))
            .unwrap();
        assert_eq!(top.uv, Vec2::new(0.0, 0.0));
        let bottom = mesh.vertices.iter().find(|v| v.position == Vec3::ZERO).unwrap();
        assert_eq!(bottom.uv, Vec2::new(0.0, 1.0));
    }

    #[test]
    fn test_missing_normals_are_rebuilt() {
        let dir = tempfile::tempdir().unwrap();
        let obj = "v 0 0 0\nv 1 0 0\nv 0 0 -1\nf 1 2 3\n";
        let mesh = load_obj_mesh(&write_obj(dir.path(), "tri.obj", obj)).unwrap();
        for v in &mesh.vertices {
            assert!((v.normal - Vec3::Y).length() < 1e-6, "normal {:?}", v.normal);
            assert_eq!(v.uv, Vec2::ZERO);
        }
    }

    #[test]
    fn test_rebuilt_normals_are_smoothed_across_shared_vertices() {
        let dir = tempfile::tempdir().unwrap();
        // Two equal-area faces meeting at a right angle along the X axis.
        let obj = "v 0 0 0\nv 1 0 0\nv 0 1 0\nv 0 0 -1\nf 1 2 3\nf 1 2 4\n";
        let mesh = load_obj_mesh(&write_obj(dir.path(), "hinge.obj", obj)).unwrap();
        assert_eq!(mesh.vertices.len(), 4);
        let shared = Vec3::new(0.0, 1.0, 1.0).normalize();
        for v in &mesh.vertices[..2] {
            assert!((v.normal - shared).length() < 1e-5, "normal {:?}", v.normal);
        }
        assert!((mesh.vertices[2].normal - Vec3::Z).length() < 1e-5);
        assert!((mesh.vertices[3].normal - Vec3::Y).length() < 1e-5);
    }

    #[test]
    fn test_objects_are_merged_into_one_bounds() {
        let dir = tempfile::tempdir().unwrap();
        let obj = "\
o a
v 0 0 0
v 1 0 0
v 0 1 0
f 1 2 3
o b
v 5 5 5
v 6 5 5
v 5 6 5
f 4 5 6
";
        let mesh = load_obj_mesh(&write_obj(dir.path(), "two.obj", obj)).unwrap();
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.bounds.max, Vec3::new(6.0, 6.0, 5.0));
        assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertices.len()));
        assert!(mesh.indices[3..].iter().all(|&i| i >= 3));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_obj_mesh(&dir.path().join("nope.obj")),
            Err(AssetError::NotFound(_))
        ));
    }

    #[test]
    fn test_file_without_faces_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_obj(dir.path(), "points.obj", "v 0 0 0\nv 1 1 1\n");
        assert!(matches!(
            load_obj_mesh(&path),
            Err(AssetError::EmptyMesh(_))
        ));
    }
}
