use std::error::Error;
use std::f32::consts::FRAC_PI_2;
use std::fmt;

use log::trace;
use tessel_geom::{Aabb, Quat, Vec3, Vec4};
use tessel_proto::{PrototypeDefect, PrototypeSet, TilePrototype};

use crate::chunk::ChunkMesh;
use crate::config::ChunkConfig;
use crate::grid::TileGrid;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuildError {
    /// A tile's id exceeds the configured `id_bits` width.
    IdOutOfRange { id: u32, max: u32 },
    /// A tile references an id the prototype table does not have.
    UnknownPrototype { id: u32, table_len: usize },
    /// A referenced prototype fails its parallel-array invariant.
    InvalidPrototype { id: u32, defect: PrototypeDefect },
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            BuildError::IdOutOfRange { id, max } => {
                write!(f, "tile id {} exceeds configured width (max {})", id, max)
            }
            BuildError::UnknownPrototype { id, table_len } => {
                write!(f, "prototype {} not in table of {}", id, table_len)
            }
            BuildError::InvalidPrototype { id, defect } => {
                write!(f, "prototype {} invalid: {}", id, defect)
            }
        }
    }
}

impl Error for BuildError {}

/// The four fixed quaternions, one per quarter turn. Clockwise seen from
/// above is a negative angle about +Y, so Cw90 maps (1,0,0) to (0,0,1).
fn rotation_table() -> [Quat; 4] {
    core::array::from_fn(|i| Quat::from_axis_angle(Vec3::UP, -(i as f32) * FRAC_PI_2))
}

const DEFAULT_COLOR: [u8; 4] = [255, 255, 255, 255];

/// Merges every grid cell's prototype into one chunk mesh.
///
/// Cells are processed in row-major order; cell `(row, col)` lands at offset
/// `(col, 0, row)`. Vertices and normals are rotated by the tile's stored
/// rotation; uvs are copied; tangents are copied unrotated unless
/// `cfg.rotate_tangents` is set. Triangle indices are remapped against the
/// running vertex base.
///
/// Every tile id is checked against the configured `id_bits` width and every
/// referenced prototype is resolved and validated before any geometry is
/// emitted, so a failed build produces nothing partial. Output is a pure
/// function of the grid, the table, and the config.
pub fn build_chunk_mesh(
    grid: &TileGrid,
    protos: &PrototypeSet,
    cfg: &ChunkConfig,
) -> Result<ChunkMesh, BuildError> {
    let max_id = cfg.id_capacity() - 1;
    let mut resolved: Vec<&TilePrototype> = Vec::with_capacity(grid.tiles().len());
    for tile in grid.tiles() {
        let id = tile.id();
        if id > max_id {
            return Err(BuildError::IdOutOfRange { id, max: max_id });
        }
        let proto = protos.get(id).ok_or(BuildError::UnknownPrototype {
            id,
            table_len: protos.len(),
        })?;
        proto
            .validate()
            .map_err(|defect| BuildError::InvalidPrototype { id, defect })?;
        resolved.push(proto);
    }

    let total_vertices: usize = resolved.iter().map(|p| p.vertices.len()).sum();
    let total_indices: usize = resolved.iter().map(|p| p.triangles.len()).sum();

    let rotations = rotation_table();
    let mut mesh = ChunkMesh::default();
    mesh.reserve(total_vertices, total_indices, cfg.merge_colors);

    let mut bbox: Option<Aabb> = None;
    let mut base: u32 = 0;
    for (cell, (tile, proto)) in grid.tiles().iter().zip(&resolved).enumerate() {
        let row = cell / grid.cols();
        let col = cell % grid.cols();
        let rotation = rotations[tile.rotation().quarter_turns() as usize];
        let offset = Vec3::new(col as f32, 0.0, row as f32);

        for (i, &vertex) in proto.vertices.iter().enumerate() {
            let p = rotation.rotate(vertex) + offset;
            match bbox.as_mut() {
                Some(bb) => bb.expand(p),
                None => bbox = Some(Aabb::new(p, p)),
            }
            mesh.vertices.push(p);
            mesh.normals.push(rotation.rotate(proto.normals[i]));
            let tangent = proto.tangents[i];
            mesh.tangents.push(if cfg.rotate_tangents {
                let dir = rotation.rotate(tangent.xyz());
                Vec4::new(dir.x, dir.y, dir.z, tangent.w)
            } else {
                tangent
            });
            mesh.uvs.push(proto.uvs[i]);
            if cfg.merge_colors {
                mesh.colors
                    .push(proto.colors.get(i).copied().unwrap_or(DEFAULT_COLOR));
            }
        }

        for &index in &proto.triangles {
            mesh.triangles.push(index + base);
        }
        base += proto.vertices.len() as u32;
    }

    mesh.bbox = bbox.unwrap_or_default();
    trace!(
        "chunk mesh: {} cells, {} vertices, {} triangles",
        grid.tiles().len(),
        mesh.vertex_count(),
        mesh.triangle_count()
    );
    Ok(mesh)
}
