#![cfg(not(target_arch = "wasm32"))]

use sitefx::arrow::geometry::{MeshData, cone, cylinder, flat_normals, sphere};

fn assert_well_formed(mesh: &MeshData) {
    assert_eq!(mesh.positions.len(), mesh.normals.len());
    assert_eq!(mesh.positions.len() % 3, 0);
    assert_eq!(mesh.indices.len() % 3, 0);
    assert!(mesh.triangle_count() > 0);

    let vertex_count = mesh.vertex_count();
    for &index in &mesh.indices {
        assert!((index as usize) < vertex_count, "index {index} out of range");
    }
    for normal in mesh.normals.chunks_exact(3) {
        let len = (normal[0] * normal[0] + normal[1] * normal[1] + normal[2] * normal[2]).sqrt();
        assert!((len - 1.0).abs() < 1e-4, "non-unit normal {normal:?}");
    }
}

#[test]
fn straight_cylinder_has_walls_and_both_caps() {
    let segments = 16;
    let mesh = cylinder(0.04, 0.04, 1.8, segments);
    assert_well_formed(&mesh);

    // Side wall: (segments + 1) duplicated seam columns, two rows.
    // Caps: center plus a closed ring each.
    let expected_vertices = (segments + 1) as usize * 2 + 2 * (segments + 2) as usize;
    assert_eq!(mesh.vertex_count(), expected_vertices);
    assert_eq!(mesh.triangle_count(), (segments * 4) as usize);

    // A straight cylinder's wall normals are horizontal.
    for (i, normal) in mesh.normals.chunks_exact(3).enumerate() {
        if i < (segments + 1) as usize * 2 {
            assert!(normal[1].abs() < 1e-6);
        }
    }

    let ys: Vec<f32> = mesh.positions.chunks_exact(3).map(|p| p[1]).collect();
    assert!(ys.iter().all(|&y| (y.abs() - 0.9).abs() < 1e-6));
}

#[test]
fn cone_is_a_capped_degenerate_cylinder() {
    let mesh = cone(0.15, 0.5, 16);
    assert_well_formed(&mesh);

    let max_y = mesh.positions.chunks_exact(3).map(|p| p[1]).fold(f32::MIN, f32::max);
    let min_y = mesh.positions.chunks_exact(3).map(|p| p[1]).fold(f32::MAX, f32::min);
    assert!((max_y - 0.25).abs() < 1e-6, "apex at +height/2");
    assert!((min_y + 0.25).abs() < 1e-6, "base at -height/2");

    // Only the base cap exists: apex ring has zero radius.
    let base_radius = mesh
        .positions
        .chunks_exact(3)
        .filter(|p| p[1] < 0.0)
        .map(|p| (p[0] * p[0] + p[2] * p[2]).sqrt())
        .fold(f32::MIN, f32::max);
    assert!((base_radius - 0.15).abs() < 1e-5);
}

#[test]
fn sphere_vertices_sit_on_the_surface() {
    let radius = 0.05;
    let mesh = sphere(radius, 12, 8);
    assert_well_formed(&mesh);

    for (position, normal) in mesh
        .positions
        .chunks_exact(3)
        .zip(mesh.normals.chunks_exact(3))
    {
        let len = (position[0] * position[0] + position[1] * position[1] + position[2] * position[2])
            .sqrt();
        assert!((len - radius).abs() < 1e-5);
        // Normal points along the radius.
        for axis in 0..3 {
            assert!((position[axis] - normal[axis] * radius).abs() < 1e-5);
        }
    }
}

#[test]
fn flat_normals_reconstruct_the_face_normal() {
    let positions = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
    let indices = [0u16, 1, 2];
    let normals = flat_normals(&positions, &indices);

    for normal in normals.chunks_exact(3) {
        assert!((normal[0]).abs() < 1e-6);
        assert!((normal[1]).abs() < 1e-6);
        assert!((normal[2] - 1.0).abs() < 1e-6);
    }
}
