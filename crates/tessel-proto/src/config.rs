//! Raw serde shapes for prototype TOML files.

use serde::Deserialize;

#[derive(Deserialize, Debug, Default, Clone)]
pub struct PrototypesConfig {
    #[serde(default)]
    pub prototypes: Vec<PrototypeDef>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct PrototypeDef {
    pub name: String,
    pub vertices: Vec<[f32; 3]>,
    pub triangles: Vec<u32>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub tangents: Vec<[f32; 4]>,
    #[serde(default)]
    pub colors: Vec<[u8; 4]>,
}
