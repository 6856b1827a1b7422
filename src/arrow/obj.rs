use super::geometry::{MeshData, flat_normals};

/// One named group of triangles from a Wavefront OBJ document.
pub struct ObjObject {
    pub name: String,
    pub mesh: MeshData,
}

/// Minimal Wavefront OBJ reader: `v`, `vn`, `f`, `o`/`g` records; `vt` and
/// everything else is skipped. Faces are fan-triangulated and emitted
/// unindexed, so vertices are not shared between faces; missing normals are
/// reconstructed per face. Anything malformed fails the whole parse, which
/// the loader treats the same as a fetch failure.
pub fn parse(text: &str) -> Result<Vec<ObjObject>, String> {
    let mut positions: Vec<[f32; 3]> = Vec::new();
    let mut normals: Vec<[f32; 3]> = Vec::new();
    let mut objects: Vec<ObjObject> = Vec::new();
    let mut current: Option<RawObject> = None;

    for (line_no, raw_line) in text.lines().enumerate() {
        let line = raw_line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        let mut fields = line.split_whitespace();
        let keyword = fields.next().unwrap_or("");

        match keyword {
            "v" => positions.push(parse_triple(&mut fields, line_no, "v")?),
            "vn" => normals.push(parse_triple(&mut fields, line_no, "vn")?),
            "o" | "g" => {
                finish_object(&mut objects, current.take())?;
                let name = fields.next().unwrap_or("unnamed").to_string();
                current = Some(RawObject::new(name));
            }
            "f" => {
                let object = current.get_or_insert_with(|| RawObject::new("default".to_string()));
                let mut corners = Vec::new();
                for field in fields {
                    corners.push(parse_corner(field, positions.len(), normals.len(), line_no)?);
                }
                if corners.len() < 3 {
                    return Err(format!("line {}: face with fewer than 3 vertices", line_no + 1));
                }
                for i in 1..corners.len() - 1 {
                    object.emit(&positions, &normals, corners[0]);
                    object.emit(&positions, &normals, corners[i]);
                    object.emit(&positions, &normals, corners[i + 1]);
                }
            }
            _ => {}
        }
    }

    finish_object(&mut objects, current.take())?;

    if objects.iter().all(|o| o.mesh.indices.is_empty()) {
        return Err("no faces found".to_string());
    }

    Ok(objects)
}

struct RawObject {
    name: String,
    positions: Vec<f32>,
    normals: Vec<f32>,
    has_normals: bool,
}

impl RawObject {
    fn new(name: String) -> RawObject {
        RawObject {
            name,
            positions: Vec::new(),
            normals: Vec::new(),
            has_normals: true,
        }
    }

    fn emit(&mut self, positions: &[[f32; 3]], normals: &[[f32; 3]], corner: (usize, Option<usize>)) {
        self.positions.extend_from_slice(&positions[corner.0]);
        match corner.1 {
            Some(n) => self.normals.extend_from_slice(&normals[n]),
            None => {
                self.has_normals = false;
                self.normals.extend_from_slice(&[0.0, 0.0, 0.0]);
            }
        }
    }
}

fn finish_object(objects: &mut Vec<ObjObject>, raw: Option<RawObject>) -> Result<(), String> {
    let Some(raw) = raw else {
        return Ok(());
    };

    let vertex_count = raw.positions.len() / 3;
    if vertex_count == 0 {
        return Ok(());
    }
    if vertex_count > u16::MAX as usize {
        return Err(format!("object '{}' exceeds 16-bit index range", raw.name));
    }

    let indices: Vec<u16> = (0..vertex_count as u16).collect();
    let normals = if raw.has_normals {
        raw.normals
    } else {
        flat_normals(&raw.positions, &indices)
    };

    objects.push(ObjObject {
        name: raw.name,
        mesh: MeshData {
            positions: raw.positions,
            normals,
            indices,
        },
    });

    Ok(())
}

fn parse_triple<'a>(
    fields: &mut impl Iterator<Item = &'a str>,
    line_no: usize,
    keyword: &str,
) -> Result<[f32; 3], String> {
    let mut out = [0.0f32; 3];
    for slot in &mut out {
        let field = fields
            .next()
            .ok_or_else(|| format!("line {}: short {} record", line_no + 1, keyword))?;
        *slot = field
            .parse::<f32>()
            .map_err(|_| format!("line {}: bad number in {} record", line_no + 1, keyword))?;
    }
    Ok(out)
}

/// A face corner is `v`, `v/vt`, `v//vn`, or `v/vt/vn`, with 1-based or
/// negative (relative) indices.
fn parse_corner(
    field: &str,
    position_count: usize,
    normal_count: usize,
    line_no: usize,
) -> Result<(usize, Option<usize>), String> {
    let mut parts = field.split('/');
    let position = resolve_index(parts.next().unwrap_or(""), position_count, line_no)?;
    let _texcoord = parts.next();
    let normal = match parts.next() {
        Some(s) if !s.is_empty() => Some(resolve_index(s, normal_count, line_no)?),
        _ => None,
    };
    Ok((position, normal))
}

fn resolve_index(field: &str, count: usize, line_no: usize) -> Result<usize, String> {
    let value = field
        .parse::<i64>()
        .map_err(|_| format!("line {}: bad face index '{}'", line_no + 1, field))?;
    let resolved = if value > 0 {
        value - 1
    } else if value < 0 {
        count as i64 + value
    } else {
        return Err(format!("line {}: face index 0 is invalid", line_no + 1));
    };
    if resolved < 0 || resolved as usize >= count {
        return Err(format!(
            "line {}: face index {} out of range",
            line_no + 1,
            value
        ));
    }
    Ok(resolved as usize)
}
