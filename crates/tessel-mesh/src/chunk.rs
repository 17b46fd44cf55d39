use tessel_geom::{Aabb, Vec2, Vec3, Vec4};

/// The merged chunk mesh: six parallel buffer sets plus a bounding box.
///
/// Built fresh on every rebuild and never mutated after it is handed to a
/// sink. `colors` stays empty unless color merging is enabled.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChunkMesh {
    pub vertices: Vec<Vec3>,
    pub triangles: Vec<u32>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub tangents: Vec<Vec4>,
    pub colors: Vec<[u8; 4]>,
    pub bbox: Aabb,
}

impl ChunkMesh {
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len() / 3
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub(crate) fn reserve(&mut self, vertices: usize, indices: usize, with_colors: bool) {
        self.vertices.reserve(vertices);
        self.normals.reserve(vertices);
        self.uvs.reserve(vertices);
        self.tangents.reserve(vertices);
        self.triangles.reserve(indices);
        if with_colors {
            self.colors.reserve(vertices);
        }
    }
}
