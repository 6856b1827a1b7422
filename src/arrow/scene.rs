use std::cell::Cell;

use glam::{Mat4, Vec3};
use js_sys::{Float32Array, Object, Reflect, Uint16Array};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    Element, HtmlCanvasElement, WebGlBuffer, WebGlProgram, WebGlRenderingContext as Gl,
    WebGlShader, WebGlUniformLocation,
};

use super::model::{ArrowModel, PartStyle};
use crate::Page;

const VERTEX_SHADER_SOURCE: &str = r#"
attribute vec3 a_position;
attribute vec3 a_normal;
uniform mat4 u_model;
uniform mat4 u_view_proj;
varying vec3 v_normal;
varying vec3 v_world_pos;
void main() {
  vec4 world = u_model * vec4(a_position, 1.0);
  v_world_pos = world.xyz;
  mat3 rotation = mat3(u_model[0].xyz, u_model[1].xyz, u_model[2].xyz);
  v_normal = rotation * a_normal;
  gl_Position = u_view_proj * world;
}
"#;

const FRAGMENT_SHADER_SOURCE: &str = r#"
precision mediump float;
varying vec3 v_normal;
varying vec3 v_world_pos;
uniform vec3 u_base_color;
uniform vec3 u_emissive;
uniform float u_shininess;
uniform float u_opacity;
uniform vec3 u_camera_pos;
uniform vec3 u_ambient;
uniform vec3 u_dir_color;
uniform vec3 u_dir_direction;
uniform vec3 u_point_color;
uniform vec3 u_point_pos;
uniform float u_point_range;
uniform float u_unlit;

vec3 shade(vec3 light_dir, vec3 light_color, vec3 normal, vec3 view_dir) {
  float diffuse = max(dot(normal, light_dir), 0.0);
  vec3 half_dir = normalize(light_dir + view_dir);
  float specular = pow(max(dot(normal, half_dir), 0.0), u_shininess);
  return light_color * (u_base_color * diffuse + specular);
}

void main() {
  if (u_unlit > 0.5) {
    gl_FragColor = vec4(u_base_color, u_opacity);
    return;
  }

  vec3 normal = normalize(v_normal);
  vec3 view_dir = normalize(u_camera_pos - v_world_pos);

  vec3 color = u_ambient * u_base_color + u_emissive;
  color += shade(normalize(u_dir_direction), u_dir_color, normal, view_dir);

  vec3 to_point = u_point_pos - v_world_pos;
  float attenuation = clamp(1.0 - length(to_point) / u_point_range, 0.0, 1.0);
  color += shade(normalize(to_point), u_point_color, normal, view_dir) * attenuation;

  gl_FragColor = vec4(color, u_opacity);
}
"#;

// Camera: fixed square aspect, pulled back far enough for every tier's scale.
const CAMERA_FOV_DEG: f32 = 45.0;
const CAMERA_DISTANCE: f32 = 8.0;
const CAMERA_NEAR: f32 = 0.1;
const CAMERA_FAR: f32 = 1000.0;

// Shared Phong material for every lit part of whichever tier wins.
const MATERIAL_BASE_COLOR: [f32; 3] = [1.0, 1.0, 1.0];
const MATERIAL_EMISSIVE: [f32; 3] = [0.290, 0.451, 1.0]; // #4A73FF
const MATERIAL_EMISSIVE_INTENSITY: f32 = 0.25;
const MATERIAL_SHININESS: f32 = 100.0;
const MATERIAL_OPACITY: f32 = 0.95;

// Fixed lighting rig, all cyan-tinted (#6BFFFA).
const LIGHT_TINT: [f32; 3] = [0.420, 1.0, 0.980];
const AMBIENT_INTENSITY: f32 = 0.4;
const DIRECTIONAL_INTENSITY: f32 = 0.8;
const DIRECTIONAL_POSITION: [f32; 3] = [5.0, 5.0, 5.0];
const POINT_INTENSITY: f32 = 0.6;
const POINT_POSITION: [f32; 3] = [2.0, 2.0, 2.0];
const POINT_RANGE: f32 = 10.0;

const MAX_PIXEL_RATIO: f64 = 2.0;

struct GpuMesh {
    position_buffer: WebGlBuffer,
    normal_buffer: WebGlBuffer,
    index_buffer: WebGlBuffer,
    index_count: i32,
    local: Mat4,
    style: PartStyle,
}

const BUFFERS_PER_MESH: usize = 3;

/// A model resident on the GPU. Created by [`SceneHost::upload`] and released
/// through [`SceneHost::release`]; the widget keeps at most one installed.
pub struct InstalledModel {
    meshes: Vec<GpuMesh>,
    base: Mat4,
}

impl InstalledModel {
    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }
}

/// Render surface, camera and lighting rig for one widget instance.
pub struct SceneHost {
    gl: Gl,
    canvas: HtmlCanvasElement,
    program: WebGlProgram,
    a_position: u32,
    a_normal: u32,
    u_model: WebGlUniformLocation,
    u_base_color: WebGlUniformLocation,
    u_opacity: WebGlUniformLocation,
    u_unlit: WebGlUniformLocation,
    size: u32,
    live_buffers: Cell<usize>,
}

impl SceneHost {
    /// Builds the render surface inside `container`. A missing WebGL
    /// capability is reported as `None` after a logged warning; the caller
    /// skips the widget entirely.
    pub fn create(page: &Page, container: &Element, size: u32) -> Result<Option<SceneHost>, JsValue> {
        let canvas = page
            .document
            .create_element("canvas")?
            .dyn_into::<HtmlCanvasElement>()?;

        let gl = match create_webgl_context(&canvas) {
            Ok(gl) => gl,
            Err(err) => {
                web_sys::console::warn_1(&JsValue::from_str(&format!(
                    "arrow: WebGL unavailable, widget disabled: {}",
                    crate::js_value_to_string(&err)
                )));
                return Ok(None);
            }
        };

        apply_fixed_size(page, &canvas, &gl, size)?;
        container.append_child(&canvas)?;

        let program = create_program(&gl, VERTEX_SHADER_SOURCE, FRAGMENT_SHADER_SOURCE)?;
        gl.use_program(Some(&program));

        let a_position = attrib_location(&gl, &program, "a_position")?;
        let a_normal = attrib_location(&gl, &program, "a_normal")?;
        let u_model = uniform_location(&gl, &program, "u_model")?;
        let u_base_color = uniform_location(&gl, &program, "u_base_color")?;
        let u_opacity = uniform_location(&gl, &program, "u_opacity")?;
        let u_unlit = uniform_location(&gl, &program, "u_unlit")?;

        gl.enable(Gl::DEPTH_TEST);
        gl.enable(Gl::BLEND);
        gl.blend_func(Gl::SRC_ALPHA, Gl::ONE_MINUS_SRC_ALPHA);
        gl.clear_color(0.0, 0.0, 0.0, 0.0);

        let host = SceneHost {
            gl,
            canvas,
            program,
            a_position,
            a_normal,
            u_model,
            u_base_color,
            u_opacity,
            u_unlit,
            size,
            live_buffers: Cell::new(0),
        };
        host.upload_static_uniforms()?;

        Ok(Some(host))
    }

    fn upload_static_uniforms(&self) -> Result<(), JsValue> {
        let gl = &self.gl;
        let p = &self.program;

        let view_proj = Mat4::perspective_rh_gl(
            CAMERA_FOV_DEG.to_radians(),
            1.0,
            CAMERA_NEAR,
            CAMERA_FAR,
        ) * Mat4::look_at_rh(
            Vec3::new(0.0, 0.0, CAMERA_DISTANCE),
            Vec3::ZERO,
            Vec3::Y,
        );
        gl.uniform_matrix4fv_with_f32_array(
            Some(&uniform_location(gl, p, "u_view_proj")?),
            false,
            &view_proj.to_cols_array(),
        );

        set_vec3(
            gl,
            p,
            "u_emissive",
            scale_color(MATERIAL_EMISSIVE, MATERIAL_EMISSIVE_INTENSITY),
        )?;
        gl.uniform1f(Some(&uniform_location(gl, p, "u_shininess")?), MATERIAL_SHININESS);

        set_vec3(gl, p, "u_camera_pos", [0.0, 0.0, CAMERA_DISTANCE])?;
        set_vec3(gl, p, "u_ambient", scale_color(LIGHT_TINT, AMBIENT_INTENSITY))?;
        set_vec3(gl, p, "u_dir_color", scale_color(LIGHT_TINT, DIRECTIONAL_INTENSITY))?;
        set_vec3(gl, p, "u_dir_direction", DIRECTIONAL_POSITION)?;
        set_vec3(gl, p, "u_point_color", scale_color(LIGHT_TINT, POINT_INTENSITY))?;
        set_vec3(gl, p, "u_point_pos", POINT_POSITION)?;
        gl.uniform1f(Some(&uniform_location(gl, p, "u_point_range")?), POINT_RANGE);

        Ok(())
    }

    /// Copies a parsed model into GPU buffers. The result is not drawn until
    /// the widget installs it as the current model.
    pub fn upload(&self, model: &ArrowModel) -> Result<InstalledModel, JsValue> {
        let gl = &self.gl;
        let mut meshes = Vec::with_capacity(model.parts.len());

        for part in &model.parts {
            let position_buffer = create_buffer(gl)?;
            gl.bind_buffer(Gl::ARRAY_BUFFER, Some(&position_buffer));
            gl.buffer_data_with_array_buffer_view(
                Gl::ARRAY_BUFFER,
                &Float32Array::from(part.mesh.positions.as_slice()),
                Gl::STATIC_DRAW,
            );

            let normal_buffer = create_buffer(gl)?;
            gl.bind_buffer(Gl::ARRAY_BUFFER, Some(&normal_buffer));
            gl.buffer_data_with_array_buffer_view(
                Gl::ARRAY_BUFFER,
                &Float32Array::from(part.mesh.normals.as_slice()),
                Gl::STATIC_DRAW,
            );

            let index_buffer = create_buffer(gl)?;
            gl.bind_buffer(Gl::ELEMENT_ARRAY_BUFFER, Some(&index_buffer));
            gl.buffer_data_with_array_buffer_view(
                Gl::ELEMENT_ARRAY_BUFFER,
                &Uint16Array::from(part.mesh.indices.as_slice()),
                Gl::STATIC_DRAW,
            );

            meshes.push(GpuMesh {
                position_buffer,
                normal_buffer,
                index_buffer,
                index_count: part.mesh.indices.len() as i32,
                local: part.local,
                style: part.style,
            });
        }

        self.live_buffers
            .set(self.live_buffers.get() + meshes.len() * BUFFERS_PER_MESH);

        Ok(InstalledModel {
            meshes,
            base: model.transform,
        })
    }

    /// Frees the GPU buffers of a detached model.
    pub fn release(&self, model: InstalledModel) {
        for mesh in &model.meshes {
            self.gl.delete_buffer(Some(&mesh.position_buffer));
            self.gl.delete_buffer(Some(&mesh.normal_buffer));
            self.gl.delete_buffer(Some(&mesh.index_buffer));
        }
        self.live_buffers.set(
            self.live_buffers
                .get()
                .saturating_sub(model.meshes.len() * BUFFERS_PER_MESH),
        );
    }

    /// Number of GPU buffers currently resident across uploads and releases.
    pub fn live_buffers(&self) -> usize {
        self.live_buffers.get()
    }

    /// Draws the current frame. Idempotent: repeated calls with the same
    /// model and group transform produce identical output. Tolerates `None`
    /// while loading is still in flight.
    pub fn render(&self, model: Option<&InstalledModel>, group: Mat4) {
        let gl = &self.gl;
        gl.clear(Gl::COLOR_BUFFER_BIT | Gl::DEPTH_BUFFER_BIT);

        let Some(model) = model else {
            return;
        };

        gl.use_program(Some(&self.program));
        let root = group * model.base;

        for mesh in &model.meshes {
            gl.bind_buffer(Gl::ARRAY_BUFFER, Some(&mesh.position_buffer));
            gl.enable_vertex_attrib_array(self.a_position);
            gl.vertex_attrib_pointer_with_i32(self.a_position, 3, Gl::FLOAT, false, 0, 0);

            gl.bind_buffer(Gl::ARRAY_BUFFER, Some(&mesh.normal_buffer));
            gl.enable_vertex_attrib_array(self.a_normal);
            gl.vertex_attrib_pointer_with_i32(self.a_normal, 3, Gl::FLOAT, false, 0, 0);

            gl.bind_buffer(Gl::ELEMENT_ARRAY_BUFFER, Some(&mesh.index_buffer));
            gl.uniform_matrix4fv_with_f32_array(
                Some(&self.u_model),
                false,
                &(root * mesh.local).to_cols_array(),
            );

            let (unlit, color, opacity) = match mesh.style {
                PartStyle::Lit => (0.0, MATERIAL_BASE_COLOR, MATERIAL_OPACITY),
                PartStyle::Unlit { color, opacity } => (1.0, color, opacity),
            };
            gl.uniform1f(Some(&self.u_unlit), unlit);
            gl.uniform3f(Some(&self.u_base_color), color[0], color[1], color[2]);
            gl.uniform1f(Some(&self.u_opacity), opacity);

            gl.draw_elements_with_i32(Gl::TRIANGLES, mesh.index_count, Gl::UNSIGNED_SHORT, 0);
        }
    }

    /// RGBA snapshot of the backing buffer, row-major from the bottom-left.
    /// Only meaningful in the same task as the draw call it inspects.
    pub fn read_frame(&self) -> Result<Vec<u8>, JsValue> {
        let width = self.canvas.width() as i32;
        let height = self.canvas.height() as i32;
        let mut pixels = vec![0u8; (width * height * 4) as usize];
        self.gl.read_pixels_with_opt_u8_array(
            0,
            0,
            width,
            height,
            Gl::RGBA,
            Gl::UNSIGNED_BYTE,
            Some(&mut pixels),
        )?;
        Ok(pixels)
    }

    /// Restores the fixed logical size after a window resize. The widget's
    /// rendered size never follows the window.
    pub fn restore_size(&self, page: &Page) -> Result<(), JsValue> {
        apply_fixed_size(page, &self.canvas, &self.gl, self.size)
    }

    /// Detaches the render surface from the document.
    pub fn remove(&self) {
        self.canvas.remove();
    }

    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }
}

fn apply_fixed_size(
    page: &Page,
    canvas: &HtmlCanvasElement,
    gl: &Gl,
    size: u32,
) -> Result<(), JsValue> {
    let dpr = page.window.device_pixel_ratio().min(MAX_PIXEL_RATIO).max(1.0);
    let backing = (size as f64 * dpr) as u32;

    if canvas.width() != backing {
        canvas.set_width(backing);
    }
    if canvas.height() != backing {
        canvas.set_height(backing);
    }
    let style = canvas.style();
    style.set_property("width", &format!("{size}px"))?;
    style.set_property("height", &format!("{size}px"))?;

    gl.viewport(0, 0, backing as i32, backing as i32);
    Ok(())
}

fn create_webgl_context(canvas: &HtmlCanvasElement) -> Result<Gl, JsValue> {
    let options = Object::new();
    Reflect::set(&options, &JsValue::from_str("alpha"), &JsValue::TRUE)?;
    Reflect::set(&options, &JsValue::from_str("antialias"), &JsValue::TRUE)?;
    Reflect::set(
        &options,
        &JsValue::from_str("powerPreference"),
        &JsValue::from_str("high-performance"),
    )?;

    let options = JsValue::from(options);
    let ctx = canvas
        .get_context_with_context_options("webgl", &options)?
        .or_else(|| canvas.get_context("webgl").ok().flatten())
        .ok_or_else(|| JsValue::from_str("WebGL unavailable"))?;

    ctx.dyn_into::<Gl>()
        .map_err(|_| JsValue::from_str("WebGL context is not a WebGlRenderingContext"))
}

fn compile_shader(gl: &Gl, shader_type: u32, source: &str) -> Result<WebGlShader, JsValue> {
    let shader = gl
        .create_shader(shader_type)
        .ok_or_else(|| JsValue::from_str("Unable to create shader"))?;
    gl.shader_source(&shader, source);
    gl.compile_shader(&shader);

    if gl
        .get_shader_parameter(&shader, Gl::COMPILE_STATUS)
        .as_bool()
        .unwrap_or(false)
    {
        Ok(shader)
    } else {
        let info = gl
            .get_shader_info_log(&shader)
            .unwrap_or_else(|| "Unknown shader error".to_string());
        Err(JsValue::from_str(&info))
    }
}

fn create_program(
    gl: &Gl,
    vertex_source: &str,
    fragment_source: &str,
) -> Result<WebGlProgram, JsValue> {
    let vertex_shader = compile_shader(gl, Gl::VERTEX_SHADER, vertex_source)?;
    let fragment_shader = compile_shader(gl, Gl::FRAGMENT_SHADER, fragment_source)?;

    let program = gl
        .create_program()
        .ok_or_else(|| JsValue::from_str("Unable to create program"))?;

    gl.attach_shader(&program, &vertex_shader);
    gl.attach_shader(&program, &fragment_shader);
    gl.link_program(&program);

    if gl
        .get_program_parameter(&program, Gl::LINK_STATUS)
        .as_bool()
        .unwrap_or(false)
    {
        Ok(program)
    } else {
        let info = gl
            .get_program_info_log(&program)
            .unwrap_or_else(|| "Unknown program error".to_string());
        Err(JsValue::from_str(&info))
    }
}

fn create_buffer(gl: &Gl) -> Result<WebGlBuffer, JsValue> {
    gl.create_buffer()
        .ok_or_else(|| JsValue::from_str("Unable to create buffer"))
}

fn attrib_location(gl: &Gl, program: &WebGlProgram, name: &str) -> Result<u32, JsValue> {
    let location = gl.get_attrib_location(program, name);
    if location < 0 {
        return Err(JsValue::from_str(&format!("Missing {name} attribute")));
    }
    Ok(location as u32)
}

fn uniform_location(
    gl: &Gl,
    program: &WebGlProgram,
    name: &str,
) -> Result<WebGlUniformLocation, JsValue> {
    gl.get_uniform_location(program, name)
        .ok_or_else(|| JsValue::from_str(&format!("Missing {name} uniform")))
}

fn set_vec3(gl: &Gl, program: &WebGlProgram, name: &str, value: [f32; 3]) -> Result<(), JsValue> {
    gl.uniform3f(
        Some(&uniform_location(gl, program, name)?),
        value[0],
        value[1],
        value[2],
    );
    Ok(())
}

fn scale_color(color: [f32; 3], intensity: f32) -> [f32; 3] {
    [color[0] * intensity, color[1] * intensity, color[2] * intensity]
}
