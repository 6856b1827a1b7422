use std::f32::consts::FRAC_PI_2;

use glam::{Mat4, Vec3};
use js_sys::{ArrayBuffer, Uint8Array};
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::Response;

use super::geometry::{self, MeshData};
use super::obj;

pub const GLTF_ASSET_PATH: &str = "assets/arrow.gltf";
pub const OBJ_ASSET_PATH: &str = "assets/arrow.obj";

const GLTF_SCALE: f32 = 50.5;
const OBJ_SCALE: f32 = 4.5;
const PROCEDURAL_SCALE: f32 = 1.2;
// Small forward tilt so a freshly installed model never sits perfectly flat.
const MODEL_TILT: f32 = 0.1;

/// Loader progress for one widget. Transitions only move forward; the three
/// terminal states record which tier produced the displayed model.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LoadState {
    NotStarted,
    FetchingGltf,
    FetchingObj,
    Ready,
    FallbackObj,
    FallbackGeometry,
}

impl LoadState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            LoadState::Ready | LoadState::FallbackObj | LoadState::FallbackGeometry
        )
    }
}

/// One attempt in the ordered fallback sequence. Each tier is tried at most
/// once; `Procedural` cannot fail, so the sequence always terminates with a
/// displayable model.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Tier {
    Gltf,
    Obj,
    Procedural,
}

impl Tier {
    pub const FIRST: Tier = Tier::Gltf;

    pub fn next(self) -> Option<Tier> {
        match self {
            Tier::Gltf => Some(Tier::Obj),
            Tier::Obj => Some(Tier::Procedural),
            Tier::Procedural => None,
        }
    }
}

/// State when a tier begins its attempt. Terminal states absorb: a stale
/// continuation can never drag the machine backward.
pub fn on_tier_started(state: LoadState, tier: Tier) -> LoadState {
    if state.is_terminal() {
        return state;
    }
    match tier {
        Tier::Gltf => LoadState::FetchingGltf,
        Tier::Obj => LoadState::FetchingObj,
        Tier::Procedural => state,
    }
}

pub fn on_tier_succeeded(tier: Tier) -> LoadState {
    match tier {
        Tier::Gltf => LoadState::Ready,
        Tier::Obj => LoadState::FallbackObj,
        Tier::Procedural => LoadState::FallbackGeometry,
    }
}

/// How a part is shaded. Most parts share the lit Phong material; `Unlit`
/// draws a flat translucent color, used for the glow sleeve.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum PartStyle {
    Lit,
    Unlit { color: [f32; 3], opacity: f32 },
}

/// One named sub-mesh with its transform inside the model group.
#[derive(Debug)]
pub struct MeshPart {
    pub name: String,
    pub mesh: MeshData,
    pub local: Mat4,
    pub style: PartStyle,
}

/// A displayable arrow model: the sub-meshes plus the group transform
/// (tier-specific scale and the fixed tilt). Shading is resolved at draw
/// time from each part's style.
#[derive(Debug)]
pub struct ArrowModel {
    pub parts: Vec<MeshPart>,
    pub transform: Mat4,
}

fn group_transform(scale: f32) -> Mat4 {
    Mat4::from_rotation_x(MODEL_TILT) * Mat4::from_scale(Vec3::splat(scale))
}

pub fn parse_gltf_model(bytes: &[u8]) -> Result<ArrowModel, String> {
    let (document, buffers, _images) =
        gltf::import_slice(bytes).map_err(|err| format!("glTF parse: {err}"))?;

    let mut parts = Vec::new();
    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .ok_or_else(|| "glTF has no scene".to_string())?;
    for node in scene.nodes() {
        collect_gltf_node(&node, Mat4::IDENTITY, &buffers, &mut parts)?;
    }

    if parts.is_empty() {
        return Err("glTF has no triangle meshes".to_string());
    }

    Ok(ArrowModel {
        parts,
        transform: group_transform(GLTF_SCALE),
    })
}

fn collect_gltf_node(
    node: &gltf::Node,
    parent: Mat4,
    buffers: &[gltf::buffer::Data],
    parts: &mut Vec<MeshPart>,
) -> Result<(), String> {
    let local = Mat4::from_cols_array_2d(&node.transform().matrix());
    let world = parent * local;

    if let Some(mesh) = node.mesh() {
        let name = mesh
            .name()
            .or(node.name())
            .unwrap_or("unnamed")
            .to_string();
        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                continue;
            }
            let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|d| &d.0[..]));

            let positions: Vec<f32> = reader
                .read_positions()
                .ok_or_else(|| format!("mesh '{name}' has no positions"))?
                .flatten()
                .collect();
            let vertex_count = positions.len() / 3;
            if vertex_count > u16::MAX as usize {
                return Err(format!("mesh '{name}' exceeds 16-bit index range"));
            }

            let indices: Vec<u16> = match reader.read_indices() {
                Some(read) => {
                    let mut out = Vec::new();
                    for index in read.into_u32() {
                        // Also caps each index to the 16-bit range, since
                        // vertex_count is already known to fit it.
                        if index as usize >= vertex_count {
                            return Err(format!("mesh '{name}' index {index} out of range"));
                        }
                        out.push(index as u16);
                    }
                    out
                }
                None => (0..vertex_count as u16).collect(),
            };

            let normals: Vec<f32> = match reader.read_normals() {
                Some(read) => read.flatten().collect(),
                None => geometry::flat_normals(&positions, &indices),
            };

            parts.push(MeshPart {
                name: name.clone(),
                mesh: MeshData {
                    positions,
                    normals,
                    indices,
                },
                local: world,
                style: PartStyle::Lit,
            });
        }
    }

    for child in node.children() {
        collect_gltf_node(&child, world, buffers, parts)?;
    }

    Ok(())
}

pub fn parse_obj_model(text: &str) -> Result<ArrowModel, String> {
    let parts = obj::parse(text)?
        .into_iter()
        .map(|object| MeshPart {
            name: object.name,
            mesh: object.mesh,
            local: Mat4::IDENTITY,
            style: PartStyle::Lit,
        })
        .collect();

    Ok(ArrowModel {
        parts,
        transform: group_transform(OBJ_SCALE),
    })
}

/// The guaranteed tier: shaft, head, three fletchings, a nock and a
/// translucent glow sleeve from primitive shapes. No I/O, cannot fail.
pub fn procedural_arrow() -> ArrowModel {
    let mut parts = Vec::new();

    parts.push(MeshPart {
        name: "shaft".to_string(),
        mesh: geometry::cylinder(0.04, 0.04, 1.8, 16),
        local: Mat4::from_rotation_z(FRAC_PI_2),
        style: PartStyle::Lit,
    });

    parts.push(MeshPart {
        name: "head".to_string(),
        mesh: geometry::cone(0.15, 0.5, 16),
        local: Mat4::from_translation(Vec3::new(1.15, 0.0, 0.0)) * Mat4::from_rotation_z(-FRAC_PI_2),
        style: PartStyle::Lit,
    });

    let fletch = geometry::cone(0.06, 0.25, 8);
    let fletch_placements = [
        (Vec3::new(-0.8, 0.08, 0.0), Mat4::from_rotation_z(FRAC_PI_2)),
        (Vec3::new(-0.8, -0.08, 0.0), Mat4::from_rotation_z(FRAC_PI_2)),
        (
            Vec3::new(-0.8, 0.0, 0.08),
            Mat4::from_rotation_x(FRAC_PI_2) * Mat4::from_rotation_z(FRAC_PI_2),
        ),
    ];
    for (offset, rotation) in fletch_placements {
        parts.push(MeshPart {
            name: "fletch".to_string(),
            mesh: fletch.clone(),
            local: Mat4::from_translation(offset) * rotation,
            style: PartStyle::Lit,
        });
    }

    parts.push(MeshPart {
        name: "nock".to_string(),
        mesh: geometry::sphere(0.05, 12, 8),
        local: Mat4::from_translation(Vec3::new(-0.9, 0.0, 0.0)),
        style: PartStyle::Lit,
    });

    // Glow sleeve around the shaft. Last in the list so every lit part is
    // already in the depth buffer when it blends over them.
    parts.push(MeshPart {
        name: "glow".to_string(),
        mesh: geometry::cylinder(0.08, 0.08, 1.8, 16),
        local: Mat4::from_rotation_z(FRAC_PI_2),
        style: PartStyle::Unlit {
            color: [1.0, 1.0, 1.0],
            opacity: 0.2,
        },
    });

    ArrowModel {
        parts,
        transform: group_transform(PROCEDURAL_SCALE),
    }
}

pub async fn fetch_bytes(url: &str) -> Result<Vec<u8>, String> {
    let resp_value = JsFuture::from(crate::window().fetch_with_str(url))
        .await
        .map_err(|err| crate::js_value_to_string(&err))?;
    let resp: Response = resp_value
        .dyn_into()
        .map_err(|_| "fetch did not return a Response".to_string())?;
    if !resp.ok() {
        return Err(format!("HTTP {} for {}", resp.status(), url));
    }

    let buf_value = JsFuture::from(
        resp.array_buffer()
            .map_err(|err| crate::js_value_to_string(&err))?,
    )
    .await
    .map_err(|err| crate::js_value_to_string(&err))?;
    let buffer: ArrayBuffer = buf_value
        .dyn_into()
        .map_err(|_| "response body is not an ArrayBuffer".to_string())?;

    let view = Uint8Array::new(&buffer);
    let mut bytes = vec![0u8; view.length() as usize];
    view.copy_to(&mut bytes);
    Ok(bytes)
}

/// Runs one network tier end to end: fetch, then parse.
pub async fn load_tier(tier: Tier) -> Result<ArrowModel, String> {
    match tier {
        Tier::Gltf => {
            let bytes = fetch_bytes(GLTF_ASSET_PATH).await?;
            parse_gltf_model(&bytes)
        }
        Tier::Obj => {
            let bytes = fetch_bytes(OBJ_ASSET_PATH).await?;
            let text = String::from_utf8(bytes).map_err(|_| "OBJ is not UTF-8".to_string())?;
            parse_obj_model(&text)
        }
        Tier::Procedural => Ok(procedural_arrow()),
    }
}
