use tessel_geom::{Vec2, Vec3, Vec4};
use tessel_mesh::{BuildError, ChunkConfig, GridError, TileGrid, build_chunk_mesh};
use tessel_proto::{PrototypeDefect, PrototypeSet, TilePrototype};
use tessel_tile::{Tile, TileRotation};

const EPS: f32 = 1e-5;

fn quad() -> TilePrototype {
    TilePrototype {
        name: "quad".into(),
        vertices: vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 1.0),
            Vec3::new(0.0, 0.0, 1.0),
        ],
        triangles: vec![0, 2, 1, 0, 3, 2],
        normals: vec![Vec3::UP; 4],
        uvs: vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ],
        tangents: vec![Vec4::new(1.0, 0.0, 0.0, 1.0); 4],
        colors: Vec::new(),
    }
}

fn tri() -> TilePrototype {
    TilePrototype {
        name: "tri".into(),
        vertices: vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
        ],
        triangles: vec![0, 2, 1],
        normals: vec![Vec3::UP; 3],
        uvs: vec![Vec2::ZERO; 3],
        tangents: vec![Vec4::new(1.0, 0.0, 0.0, 1.0); 3],
        colors: vec![[10, 20, 30, 255]; 3],
    }
}

/// Single-vertex marker prototype for rotation/offset checks.
fn marker() -> TilePrototype {
    TilePrototype {
        name: "marker".into(),
        vertices: vec![Vec3::new(1.0, 0.0, 0.0)],
        triangles: Vec::new(),
        normals: vec![Vec3::new(0.0, 0.0, 1.0)],
        uvs: vec![Vec2::new(0.5, 0.5)],
        tangents: vec![Vec4::new(1.0, 0.0, 0.0, 1.0)],
        colors: Vec::new(),
    }
}

fn set_of(protos: Vec<TilePrototype>) -> PrototypeSet {
    let mut set = PrototypeSet::new();
    for p in protos {
        set.push(p);
    }
    set
}

fn tile(id: u32, rot: TileRotation) -> Tile {
    let mut t = Tile::default();
    t.set_id(id).unwrap();
    t.set_rotation(rot);
    t
}

fn cfg(rows: usize, cols: usize) -> ChunkConfig {
    ChunkConfig {
        rows,
        cols,
        ..ChunkConfig::default()
    }
}

fn assert_close(a: Vec3, b: Vec3) {
    assert!(
        (a - b).length() < EPS,
        "expected {:?} to be close to {:?}",
        a,
        b
    );
}

#[test]
fn two_by_two_scenario_counts_and_bases() {
    let protos = set_of(vec![quad(), tri()]);
    let mut grid = TileGrid::new(2, 2);
    grid.set(0, 0, tile(0, TileRotation::None)).unwrap();
    grid.set(0, 1, tile(1, TileRotation::None)).unwrap();
    grid.set(1, 0, tile(1, TileRotation::None)).unwrap();
    grid.set(1, 1, tile(0, TileRotation::None)).unwrap();

    let mesh = build_chunk_mesh(&grid, &protos, &cfg(2, 2)).expect("build");
    assert_eq!(mesh.vertex_count(), 14);
    assert_eq!(mesh.triangle_count(), 6);

    // per-cell index windows: bases 0, 4, 7, 10
    let windows = [(0usize, 6usize, 0u32, 4u32), (6, 3, 4, 7), (9, 3, 7, 10), (12, 6, 10, 14)];
    for (start, len, lo, hi) in windows {
        for &index in &mesh.triangles[start..start + len] {
            assert!(
                (lo..hi).contains(&index),
                "index {} outside cell window {}..{}",
                index,
                lo,
                hi
            );
        }
    }
}

#[test]
fn vertex_count_is_conserved() {
    let protos = set_of(vec![quad(), tri()]);
    let mut grid = TileGrid::new(3, 3);
    let mut expected = 0usize;
    for row in 0..3 {
        for col in 0..3 {
            let id = ((row + col) % 2) as u32;
            expected += protos.get(id).unwrap().vertex_count();
            grid.set(row, col, tile(id, TileRotation::None)).unwrap();
        }
    }
    let mesh = build_chunk_mesh(&grid, &protos, &cfg(3, 3)).expect("build");
    assert_eq!(mesh.vertex_count(), expected);
    assert_eq!(mesh.normals.len(), expected);
    assert_eq!(mesh.uvs.len(), expected);
    assert_eq!(mesh.tangents.len(), expected);
}

#[test]
fn cw90_rotates_vertices_and_normals_together() {
    let protos = set_of(vec![marker()]);
    let mut grid = TileGrid::new(1, 1);
    grid.set(0, 0, tile(0, TileRotation::Cw90)).unwrap();

    let mesh = build_chunk_mesh(&grid, &protos, &cfg(1, 1)).expect("build");
    assert_close(mesh.vertices[0], Vec3::new(0.0, 0.0, 1.0));
    assert_close(mesh.normals[0], Vec3::new(-1.0, 0.0, 0.0));
    // tangents stay as authored by default
    assert_eq!(mesh.tangents[0], Vec4::new(1.0, 0.0, 0.0, 1.0));
}

#[test]
fn rotate_tangents_flag_rotates_xyz_and_keeps_w() {
    let protos = set_of(vec![marker()]);
    let mut grid = TileGrid::new(1, 1);
    grid.set(0, 0, tile(0, TileRotation::Cw90)).unwrap();

    let mut c = cfg(1, 1);
    c.rotate_tangents = true;
    let mesh = build_chunk_mesh(&grid, &protos, &c).expect("build");
    let t = mesh.tangents[0];
    assert_close(t.xyz(), Vec3::new(0.0, 0.0, 1.0));
    assert!((t.w - 1.0).abs() < EPS);
}

#[test]
fn grid_offset_shifts_every_vertex() {
    let protos = set_of(vec![quad()]);
    let mut grid = TileGrid::new(3, 4);
    for row in 0..3 {
        for col in 0..4 {
            grid.set(row, col, tile(0, TileRotation::None)).unwrap();
        }
    }
    let mesh = build_chunk_mesh(&grid, &protos, &cfg(3, 4)).expect("build");
    let per_cell = 4usize;
    let origin = &mesh.vertices[0..per_cell];
    let cell = grid.idx(2, 3);
    let shifted = &mesh.vertices[cell * per_cell..(cell + 1) * per_cell];
    for (a, b) in origin.iter().zip(shifted) {
        assert_close(*b - *a, Vec3::new(3.0, 0.0, 2.0));
    }
}

#[test]
fn rebuild_is_deterministic() {
    let protos = set_of(vec![quad(), tri(), marker()]);
    let mut grid = TileGrid::new(4, 4);
    for row in 0..4 {
        for col in 0..4 {
            grid.set(
                row,
                col,
                tile(
                    ((row * 4 + col) % 3) as u32,
                    TileRotation::ALL[(row + col) % 4],
                ),
            )
            .unwrap();
        }
    }
    let c = cfg(4, 4);
    let a = build_chunk_mesh(&grid, &protos, &c).expect("first");
    let b = build_chunk_mesh(&grid, &protos, &c).expect("second");
    assert_eq!(a, b);
}

#[test]
fn unknown_prototype_id_fails_lookup() {
    let protos = set_of(vec![quad()]);
    let mut grid = TileGrid::new(1, 2);
    grid.set(0, 1, tile(3, TileRotation::None)).unwrap();
    let err = build_chunk_mesh(&grid, &protos, &cfg(1, 2)).unwrap_err();
    assert_eq!(err, BuildError::UnknownPrototype { id: 3, table_len: 1 });
}

#[test]
fn narrowed_id_width_rejects_wide_ids_even_when_the_table_has_them() {
    // 32-entry table, but only 4 bits of id accepted
    let protos = set_of((0..32).map(|_| quad()).collect());
    let mut grid = TileGrid::new(1, 2);
    grid.set(0, 0, tile(20, TileRotation::None)).unwrap();

    let mut c = cfg(1, 2);
    c.id_bits = 4;
    let err = build_chunk_mesh(&grid, &protos, &c).unwrap_err();
    assert_eq!(err, BuildError::IdOutOfRange { id: 20, max: 15 });

    // the widest id the narrowed config admits still builds
    grid.set(0, 0, tile(15, TileRotation::None)).unwrap();
    assert!(build_chunk_mesh(&grid, &protos, &c).is_ok());

    // the default 12-bit width accepts the same grid unchanged
    grid.set(0, 0, tile(20, TileRotation::None)).unwrap();
    assert!(build_chunk_mesh(&grid, &protos, &cfg(1, 2)).is_ok());
}

#[test]
fn invalid_prototype_fails_before_emitting_anything() {
    let mut bad = quad();
    bad.normals.pop();
    let protos = set_of(vec![quad(), bad]);
    let mut grid = TileGrid::new(2, 2);
    grid.set(1, 1, tile(1, TileRotation::None)).unwrap();

    let err = build_chunk_mesh(&grid, &protos, &cfg(2, 2)).unwrap_err();
    assert_eq!(
        err,
        BuildError::InvalidPrototype {
            id: 1,
            defect: PrototypeDefect::NormalCount {
                expected: 4,
                got: 3
            }
        }
    );
}

#[test]
fn colors_are_skipped_by_default_and_merged_on_request() {
    let protos = set_of(vec![quad(), tri()]);
    let mut grid = TileGrid::new(1, 2);
    grid.set(0, 0, tile(0, TileRotation::None)).unwrap();
    grid.set(0, 1, tile(1, TileRotation::None)).unwrap();

    let plain = build_chunk_mesh(&grid, &protos, &cfg(1, 2)).expect("plain");
    assert!(plain.colors.is_empty());

    let mut c = cfg(1, 2);
    c.merge_colors = true;
    let colored = build_chunk_mesh(&grid, &protos, &c).expect("colored");
    assert_eq!(colored.colors.len(), colored.vertex_count());
    // quad has no colors: filled with opaque white
    assert_eq!(colored.colors[0], [255, 255, 255, 255]);
    // tri carries its own
    assert_eq!(colored.colors[4], [10, 20, 30, 255]);
}

#[test]
fn bbox_covers_all_emitted_vertices() {
    let protos = set_of(vec![quad()]);
    let mut grid = TileGrid::new(2, 3);
    for row in 0..2 {
        for col in 0..3 {
            grid.set(row, col, tile(0, TileRotation::None)).unwrap();
        }
    }
    let mesh = build_chunk_mesh(&grid, &protos, &cfg(2, 3)).expect("build");
    for v in &mesh.vertices {
        assert!(mesh.bbox.min.x <= v.x && v.x <= mesh.bbox.max.x);
        assert!(mesh.bbox.min.y <= v.y && v.y <= mesh.bbox.max.y);
        assert!(mesh.bbox.min.z <= v.z && v.z <= mesh.bbox.max.z);
    }
}

#[test]
fn grid_rejects_out_of_bounds_cells() {
    let mut grid = TileGrid::new(2, 2);
    assert_eq!(
        grid.set(2, 0, Tile::default()),
        Err(GridError::OutOfBounds {
            row: 2,
            col: 0,
            rows: 2,
            cols: 2
        })
    );
    assert!(grid.get(0, 2).is_err());
    assert!(grid.get(1, 1).is_ok());
}
