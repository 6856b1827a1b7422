#![cfg(not(target_arch = "wasm32"))]

use sitefx::arrow::model::{
    LoadState, PartStyle, Tier, on_tier_started, on_tier_succeeded, parse_gltf_model,
    parse_obj_model, procedural_arrow,
};

/// Binary glTF container around a JSON chunk and a binary chunk.
fn glb(json: &str, bin: &[u8]) -> Vec<u8> {
    let mut json_chunk = json.as_bytes().to_vec();
    while json_chunk.len() % 4 != 0 {
        json_chunk.push(b' ');
    }
    let mut bin_chunk = bin.to_vec();
    while bin_chunk.len() % 4 != 0 {
        bin_chunk.push(0);
    }

    let total = 12 + 8 + json_chunk.len() + 8 + bin_chunk.len();
    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(b"glTF");
    out.extend_from_slice(&2u32.to_le_bytes());
    out.extend_from_slice(&(total as u32).to_le_bytes());
    out.extend_from_slice(&(json_chunk.len() as u32).to_le_bytes());
    out.extend_from_slice(b"JSON");
    out.extend_from_slice(&json_chunk);
    out.extend_from_slice(&(bin_chunk.len() as u32).to_le_bytes());
    out.extend_from_slice(b"BIN\0");
    out.extend_from_slice(&bin_chunk);
    out
}

/// One triangle over three vertices in the xy plane, no NORMAL accessor,
/// with the given index values.
fn one_triangle_glb(indices: &[u16]) -> Vec<u8> {
    let mut bin = Vec::new();
    for v in [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0] {
        bin.extend_from_slice(&v.to_le_bytes());
    }
    for &i in indices {
        bin.extend_from_slice(&i.to_le_bytes());
    }

    let index_bytes = indices.len() * 2;
    let json = format!(
        "{{\"asset\":{{\"version\":\"2.0\"}},\
         \"buffers\":[{{\"byteLength\":{}}}],\
         \"bufferViews\":[\
         {{\"buffer\":0,\"byteOffset\":0,\"byteLength\":36}},\
         {{\"buffer\":0,\"byteOffset\":36,\"byteLength\":{}}}],\
         \"accessors\":[\
         {{\"bufferView\":0,\"componentType\":5126,\"count\":3,\"type\":\"VEC3\",\
         \"min\":[0.0,0.0,0.0],\"max\":[1.0,1.0,0.0]}},\
         {{\"bufferView\":1,\"componentType\":5123,\"count\":{},\"type\":\"SCALAR\"}}],\
         \"meshes\":[{{\"primitives\":[{{\"attributes\":{{\"POSITION\":0}},\"indices\":1}}]}}],\
         \"nodes\":[{{\"mesh\":0}}],\
         \"scenes\":[{{\"nodes\":[0]}}],\
         \"scene\":0}}",
        36 + index_bytes,
        index_bytes,
        indices.len()
    );

    glb(&json, &bin)
}

#[test]
fn tier_order_is_fixed_and_finite() {
    let mut order = vec![Tier::FIRST];
    while let Some(next) = order.last().unwrap().next() {
        order.push(next);
    }
    assert_eq!(order, vec![Tier::Gltf, Tier::Obj, Tier::Procedural]);
}

#[test]
fn states_progress_forward_through_the_chain() {
    let state = LoadState::NotStarted;
    let state = on_tier_started(state, Tier::Gltf);
    assert_eq!(state, LoadState::FetchingGltf);

    let state = on_tier_started(state, Tier::Obj);
    assert_eq!(state, LoadState::FetchingObj);

    assert_eq!(on_tier_succeeded(Tier::Gltf), LoadState::Ready);
    assert_eq!(on_tier_succeeded(Tier::Obj), LoadState::FallbackObj);
    assert_eq!(on_tier_succeeded(Tier::Procedural), LoadState::FallbackGeometry);
}

#[test]
fn chain_bookkeeping_ends_terminal_even_when_every_attempt_fails() {
    // Walk the loader's state bookkeeping with every tier failing, including
    // the final upload: the last tier still records a terminal state.
    let mut state = LoadState::NotStarted;
    let mut tier = Some(Tier::FIRST);
    while let Some(t) = tier {
        state = on_tier_started(state, t);
        if t.next().is_none() {
            state = on_tier_succeeded(t);
        }
        tier = t.next();
    }
    assert_eq!(state, LoadState::FallbackGeometry);
    assert!(state.is_terminal());
}

#[test]
fn terminal_states_absorb_stale_transitions() {
    for terminal in [LoadState::Ready, LoadState::FallbackObj, LoadState::FallbackGeometry] {
        assert!(terminal.is_terminal());
        for tier in [Tier::Gltf, Tier::Obj, Tier::Procedural] {
            assert_eq!(on_tier_started(terminal, tier), terminal);
        }
    }
}

#[test]
fn garbage_bytes_are_a_gltf_parse_failure() {
    assert!(parse_gltf_model(b"not a gltf document").is_err());
    assert!(parse_gltf_model(&[]).is_err());
}

#[test]
fn gltf_triangle_without_normals_parses_with_reconstructed_normals() {
    let model = parse_gltf_model(&one_triangle_glb(&[0, 1, 2])).expect("parse");
    assert_eq!(model.parts.len(), 1);
    assert_eq!(model.parts[0].mesh.vertex_count(), 3);
    assert_eq!(model.parts[0].mesh.triangle_count(), 1);
    assert_eq!(&model.parts[0].mesh.normals[0..3], &[0.0, 0.0, 1.0]);
}

#[test]
fn gltf_index_past_the_vertex_count_is_a_parse_failure() {
    // An out-of-range index must surface as an error the loader can recover
    // from, not a crash while reconstructing normals.
    let err = parse_gltf_model(&one_triangle_glb(&[0, 1, 10])).unwrap_err();
    assert!(err.contains("out of range"), "unexpected error: {err}");
}

#[test]
fn obj_with_normals_parses_into_one_part() {
    let source = "\
o arrowhead
v 0 0 0
v 1 0 0
v 0 1 0
vn 0 0 1
f 1//1 2//1 3//1
";
    let model = parse_obj_model(source).expect("parse");
    assert_eq!(model.parts.len(), 1);
    assert_eq!(model.parts[0].name, "arrowhead");
    assert_eq!(model.parts[0].mesh.vertex_count(), 3);
    assert_eq!(model.parts[0].mesh.triangle_count(), 1);
    assert_eq!(&model.parts[0].mesh.normals[0..3], &[0.0, 0.0, 1.0]);
}

#[test]
fn obj_quads_are_triangulated() {
    let source = "\
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
f 1 2 3 4
";
    let model = parse_obj_model(source).expect("parse");
    assert_eq!(model.parts[0].mesh.triangle_count(), 2);
}

#[test]
fn obj_without_normals_gets_unit_face_normals() {
    let source = "\
v 0 0 0
v 1 0 0
v 0 1 0
f 1 2 3
";
    let model = parse_obj_model(source).expect("parse");
    for normal in model.parts[0].mesh.normals.chunks_exact(3) {
        let len = (normal[0] * normal[0] + normal[1] * normal[1] + normal[2] * normal[2]).sqrt();
        assert!((len - 1.0).abs() < 1e-5);
        assert!((normal[2] - 1.0).abs() < 1e-5, "triangle lies in the xy plane");
    }
}

#[test]
fn obj_negative_indices_resolve_relatively() {
    let source = "\
v 0 0 0
v 1 0 0
v 0 1 0
f -3 -2 -1
";
    let model = parse_obj_model(source).expect("parse");
    assert_eq!(model.parts[0].mesh.vertex_count(), 3);
}

#[test]
fn malformed_obj_is_rejected() {
    assert!(parse_obj_model("f 1 2 9").is_err(), "index out of range");
    assert!(parse_obj_model("v 0 0 0\nf 0 0 0").is_err(), "index zero");
    assert!(parse_obj_model("v 1 2\n").is_err(), "short vertex record");
    assert!(parse_obj_model("").is_err(), "no faces");
    assert!(parse_obj_model("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2\n").is_err(), "degenerate face");
}

#[test]
fn procedural_arrow_is_nonempty_and_names_its_parts() {
    let arrow = procedural_arrow();
    assert!(!arrow.parts.is_empty());

    // The guaranteed tier always carries a cylinder-derived shaft and a
    // cone-derived head, plus fletching, a nock and the glow sleeve.
    let count = |name: &str| arrow.parts.iter().filter(|p| p.name == name).count();
    assert_eq!(count("shaft"), 1);
    assert_eq!(count("head"), 1);
    assert_eq!(count("fletch"), 3);
    assert_eq!(count("nock"), 1);
    assert_eq!(count("glow"), 1);

    // The glow draws unlit and translucent, after every lit part.
    let glow = arrow.parts.last().unwrap();
    assert_eq!(glow.name, "glow");
    match glow.style {
        PartStyle::Unlit { opacity, .. } => assert!(opacity < 1.0),
        PartStyle::Lit => panic!("glow must not use the lit material"),
    }

    for part in &arrow.parts {
        assert!(part.mesh.vertex_count() > 0, "part '{}' has no vertices", part.name);
        assert!(part.mesh.triangle_count() > 0, "part '{}' has no triangles", part.name);
        let max_index = *part.mesh.indices.iter().max().unwrap() as usize;
        assert!(max_index < part.mesh.vertex_count());
    }
}
