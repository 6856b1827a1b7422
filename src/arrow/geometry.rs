use std::f32::consts::TAU;

use glam::Vec3;

/// Triangle mesh in model space. Positions and normals are tightly packed
/// xyz triples; indices are 16-bit, which is plenty for the decorative
/// meshes this widget draws.
#[derive(Clone, Debug, Default)]
pub struct MeshData {
    pub positions: Vec<f32>,
    pub normals: Vec<f32>,
    pub indices: Vec<u16>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    fn push_vertex(&mut self, position: Vec3, normal: Vec3) {
        self.positions
            .extend_from_slice(&[position.x, position.y, position.z]);
        self.normals.extend_from_slice(&[normal.x, normal.y, normal.z]);
    }
}

/// Open-ended tapered tube around the Y axis, capped where the radius is
/// non-zero. `cone` is the degenerate case with a zero top radius.
pub fn cylinder(radius_top: f32, radius_bottom: f32, height: f32, radial_segments: u32) -> MeshData {
    let segments = radial_segments.max(3);
    let half = height * 0.5;
    let slope = (radius_bottom - radius_top) / height;
    let mut mesh = MeshData::default();

    // Side wall: one duplicated seam column so texture-free normals stay clean.
    for i in 0..=segments {
        let theta = i as f32 / segments as f32 * TAU;
        let (sin, cos) = theta.sin_cos();
        let normal = Vec3::new(cos, slope, sin).normalize();
        mesh.push_vertex(Vec3::new(radius_top * cos, half, radius_top * sin), normal);
        mesh.push_vertex(
            Vec3::new(radius_bottom * cos, -half, radius_bottom * sin),
            normal,
        );
    }
    for i in 0..segments {
        let a = (i * 2) as u16;
        let b = a + 1;
        let c = a + 2;
        let d = a + 3;
        mesh.indices.extend_from_slice(&[a, c, b, c, d, b]);
    }

    if radius_top > 0.0 {
        add_cap(&mut mesh, radius_top, half, segments, true);
    }
    if radius_bottom > 0.0 {
        add_cap(&mut mesh, radius_bottom, -half, segments, false);
    }

    mesh
}

/// Cone pointing along +Y, base at -height/2.
pub fn cone(radius: f32, height: f32, radial_segments: u32) -> MeshData {
    cylinder(0.0, radius, height, radial_segments)
}

fn add_cap(mesh: &mut MeshData, radius: f32, y: f32, segments: u32, top: bool) {
    let normal = Vec3::new(0.0, if top { 1.0 } else { -1.0 }, 0.0);
    let center = mesh.vertex_count() as u16;
    mesh.push_vertex(Vec3::new(0.0, y, 0.0), normal);

    for i in 0..=segments {
        let theta = i as f32 / segments as f32 * TAU;
        let (sin, cos) = theta.sin_cos();
        mesh.push_vertex(Vec3::new(radius * cos, y, radius * sin), normal);
    }
    for i in 0..segments {
        let a = center + 1 + i as u16;
        let b = a + 1;
        if top {
            mesh.indices.extend_from_slice(&[center, b, a]);
        } else {
            mesh.indices.extend_from_slice(&[center, a, b]);
        }
    }
}

/// Latitude/longitude sphere centered at the origin.
pub fn sphere(radius: f32, width_segments: u32, height_segments: u32) -> MeshData {
    let w = width_segments.max(3);
    let h = height_segments.max(2);
    let mut mesh = MeshData::default();

    for iy in 0..=h {
        let v = iy as f32 / h as f32;
        let phi = v * std::f32::consts::PI;
        for ix in 0..=w {
            let u = ix as f32 / w as f32;
            let theta = u * TAU;
            let normal = Vec3::new(
                -phi.sin() * theta.cos(),
                phi.cos(),
                phi.sin() * theta.sin(),
            )
            .normalize();
            mesh.push_vertex(normal * radius, normal);
        }
    }

    let stride = (w + 1) as u16;
    for iy in 0..h {
        for ix in 0..w {
            let a = iy as u16 * stride + ix as u16;
            let b = a + stride;
            let c = a + 1;
            let d = b + 1;
            if iy != 0 {
                mesh.indices.extend_from_slice(&[a, b, c]);
            }
            if iy != h - 1 {
                mesh.indices.extend_from_slice(&[c, b, d]);
            }
        }
    }

    mesh
}

/// Per-face normals for meshes that arrive without any (plain-geometry
/// assets commonly omit them). Each face's vertices get the face normal, so
/// the input must already be unshared per face.
pub fn flat_normals(positions: &[f32], indices: &[u16]) -> Vec<f32> {
    let mut normals = vec![0.0f32; positions.len()];

    for tri in indices.chunks_exact(3) {
        let read = |i: u16| {
            let at = i as usize * 3;
            Vec3::new(positions[at], positions[at + 1], positions[at + 2])
        };
        let (a, b, c) = (read(tri[0]), read(tri[1]), read(tri[2]));
        let n = (b - a).cross(c - a).normalize_or_zero();
        for &i in tri {
            let at = i as usize * 3;
            normals[at] += n.x;
            normals[at + 1] += n.y;
            normals[at + 2] += n.z;
        }
    }

    for chunk in normals.chunks_exact_mut(3) {
        let n = Vec3::new(chunk[0], chunk[1], chunk[2]).normalize_or_zero();
        let n = if n == Vec3::ZERO { Vec3::Y } else { n };
        chunk.copy_from_slice(&[n.x, n.y, n.z]);
    }

    normals
}
