//! Tile prototype geometry and the prototype registry.
#![forbid(unsafe_code)]

pub mod config;

use std::error::Error;
use std::fmt;
use std::fs;
use std::path::Path;

use hashbrown::HashMap;
use tessel_geom::{Vec2, Vec3, Vec4};

use crate::config::{PrototypeDef, PrototypesConfig};

/// One independently authored mesh fragment covering a single grid cell.
///
/// The five per-vertex arrays are parallel to `vertices`; `colors` may be
/// empty when the prototype carries no vertex colors.
#[derive(Clone, Debug, Default)]
pub struct TilePrototype {
    pub name: String,
    pub vertices: Vec<Vec3>,
    pub triangles: Vec<u32>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub tangents: Vec<Vec4>,
    pub colors: Vec<[u8; 4]>,
}

/// Reason a prototype failed validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrototypeDefect {
    NoVertices,
    NormalCount { expected: usize, got: usize },
    UvCount { expected: usize, got: usize },
    TangentCount { expected: usize, got: usize },
    ColorCount { expected: usize, got: usize },
    TriangleCount { got: usize },
    TriangleIndex { index: u32, vertex_count: usize },
}

impl fmt::Display for PrototypeDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            PrototypeDefect::NoVertices => write!(f, "no vertices"),
            PrototypeDefect::NormalCount { expected, got } => {
                write!(f, "{} normals for {} vertices", got, expected)
            }
            PrototypeDefect::UvCount { expected, got } => {
                write!(f, "{} uvs for {} vertices", got, expected)
            }
            PrototypeDefect::TangentCount { expected, got } => {
                write!(f, "{} tangents for {} vertices", got, expected)
            }
            PrototypeDefect::ColorCount { expected, got } => {
                write!(f, "{} colors for {} vertices (expected 0 or {})", got, expected, expected)
            }
            PrototypeDefect::TriangleCount { got } => {
                write!(f, "triangle list length {} is not a multiple of 3", got)
            }
            PrototypeDefect::TriangleIndex { index, vertex_count } => {
                write!(f, "triangle index {} out of range ({} vertices)", index, vertex_count)
            }
        }
    }
}

impl Error for PrototypeDefect {}

impl TilePrototype {
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len() / 3
    }

    /// Checks the parallel-array invariant and the triangle list. A prototype
    /// that passes can be merged without any further bounds checks.
    pub fn validate(&self) -> Result<(), PrototypeDefect> {
        let n = self.vertices.len();
        if n == 0 {
            return Err(PrototypeDefect::NoVertices);
        }
        if self.normals.len() != n {
            return Err(PrototypeDefect::NormalCount {
                expected: n,
                got: self.normals.len(),
            });
        }
        if self.uvs.len() != n {
            return Err(PrototypeDefect::UvCount {
                expected: n,
                got: self.uvs.len(),
            });
        }
        if self.tangents.len() != n {
            return Err(PrototypeDefect::TangentCount {
                expected: n,
                got: self.tangents.len(),
            });
        }
        if !self.colors.is_empty() && self.colors.len() != n {
            return Err(PrototypeDefect::ColorCount {
                expected: n,
                got: self.colors.len(),
            });
        }
        if self.triangles.len() % 3 != 0 {
            return Err(PrototypeDefect::TriangleCount {
                got: self.triangles.len(),
            });
        }
        for &index in &self.triangles {
            if index as usize >= n {
                return Err(PrototypeDefect::TriangleIndex {
                    index,
                    vertex_count: n,
                });
            }
        }
        Ok(())
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

impl TryFrom<PrototypeDef> for TilePrototype {
    type Error = PrototypeDefect;

    fn try_from(def: PrototypeDef) -> Result<Self, Self::Error> {
        let proto = TilePrototype {
            name: def.name,
            vertices: def
                .vertices
                .into_iter()
                .map(|[x, y, z]| Vec3::new(x, y, z))
                .collect(),
            triangles: def.triangles,
            normals: def
                .normals
                .into_iter()
                .map(|[x, y, z]| Vec3::new(x, y, z))
                .collect(),
            uvs: def.uvs.into_iter().map(|[u, v]| Vec2::new(u, v)).collect(),
            tangents: def
                .tangents
                .into_iter()
                .map(|[x, y, z, w]| Vec4::new(x, y, z, w))
                .collect(),
            colors: def.colors,
        };
        proto.validate()?;
        Ok(proto)
    }
}

/// Registry of prototypes; ids are insertion order.
#[derive(Clone, Debug, Default)]
pub struct PrototypeSet {
    protos: Vec<TilePrototype>,
    by_name: HashMap<String, u32>,
}

impl PrototypeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a prototype and returns its id.
    pub fn push(&mut self, proto: TilePrototype) -> u32 {
        let id = self.protos.len() as u32;
        self.by_name.insert(proto.name.clone(), id);
        self.protos.push(proto);
        id
    }

    #[inline]
    pub fn get(&self, id: u32) -> Option<&TilePrototype> {
        self.protos.get(id as usize)
    }

    pub fn id_by_name(&self, name: &str) -> Option<u32> {
        self.by_name.get(name).copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.protos.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.protos.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TilePrototype> {
        self.protos.iter()
    }

    pub fn from_config(cfg: PrototypesConfig) -> Result<Self, Box<dyn Error>> {
        let mut set = PrototypeSet::new();
        for def in cfg.prototypes {
            let name = def.name.clone();
            let proto = TilePrototype::try_from(def)
                .map_err(|defect| format!("prototype '{}': {}", name, defect))?;
            set.push(proto);
        }
        Ok(set)
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let text = fs::read_to_string(path)?;
        let cfg: PrototypesConfig = toml::from_str(&text)?;
        Self::from_config(cfg)
    }

    /// Small built-in set (flat floor, raised plate, wedge) for demos and
    /// tests that do not want to carry an asset file.
    pub fn starter() -> Self {
        let mut set = PrototypeSet::new();
        set.push(unit_quad("floor", 0.0));
        set.push(unit_quad("plate", 0.4));
        set.push(wedge("wedge"));
        set
    }
}

fn unit_quad(name: &str, height: f32) -> TilePrototype {
    TilePrototype {
        name: name.to_string(),
        vertices: vec![
            Vec3::new(-0.5, height, -0.5),
            Vec3::new(0.5, height, -0.5),
            Vec3::new(0.5, height, 0.5),
            Vec3::new(-0.5, height, 0.5),
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

fn wedge(name: &str) -> TilePrototype {
    let normal = Vec3::new(0.0, 1.0, -1.0).normalized();
    TilePrototype {
        name: name.to_string(),
        vertices: vec![
            Vec3::new(-0.5, 0.0, -0.5),
            Vec3::new(0.5, 0.0, -0.5),
            Vec3::new(0.0, 0.5, 0.5),
        ],
        triangles: vec![0, 2, 1],
        normals: vec![normal; 3],
        uvs: vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(0.5, 1.0),
        ],
        tangents: vec![Vec4::new(1.0, 0.0, 0.0, 1.0); 3],
        colors: Vec::new(),
    }
}
