//! Interactive 3D arrow widget: a small always-on scene that re-orients a
//! loaded (or procedurally built) arrow model toward the pointer.

pub mod geometry;
pub mod model;
pub mod obj;
pub mod scene;

use std::cell::RefCell;
use std::rc::Rc;

use glam::{EulerRot, Mat4, Vec3};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Element, MouseEvent};

use crate::Page;
use crate::raf::RafLoop;
use model::{ArrowModel, LoadState, Tier, load_tier, on_tier_started, on_tier_succeeded};
use scene::{InstalledModel, SceneHost};

/// Fraction of the remaining angular gap closed per animation tick.
pub const EASING_FACTOR: f32 = 0.08;

// Tilt coefficients applied to the viewport-normalized pointer offset.
pub const TILT_PITCH_COEFF: f32 = 0.2;
pub const TILT_YAW_COEFF: f32 = 0.1;

// Idle bob: time in milliseconds scaled down, then two offset sinusoids.
const BOB_CLOCK_SCALE: f64 = 0.002;
const BOB_VERTICAL_AMPLITUDE: f32 = 0.1;
const BOB_HORIZONTAL_RATE: f64 = 0.7;
const BOB_HORIZONTAL_AMPLITUDE: f32 = 0.05;

pub const DEFAULT_CONTAINER_ID: &str = "arrow-container";
pub const DEFAULT_SIZE: u32 = 250;
pub const PAIRED_SIZE: u32 = 180;

#[derive(Clone, Copy)]
pub struct ArrowConfig {
    pub container_id: &'static str,
    pub size: u32,
}

impl Default for ArrowConfig {
    fn default() -> ArrowConfig {
        ArrowConfig {
            container_id: DEFAULT_CONTAINER_ID,
            size: DEFAULT_SIZE,
        }
    }
}

impl ArrowConfig {
    /// Variant used when two smaller arrows flank a section.
    pub fn paired(container_id: &'static str) -> ArrowConfig {
        ArrowConfig {
            container_id,
            size: PAIRED_SIZE,
        }
    }
}

/// Desired vs. displayed facing, one rotation triple each. The tracker
/// overwrites `target` at pointer-event rate; the animator advances
/// `current` at frame rate. Last write wins, no queueing.
#[derive(Clone, Copy, Default, Debug)]
pub struct Bearing {
    pub target: Vec3,
    pub current: Vec3,
}

/// Exponential easing step: closes `EASING_FACTOR` of the remaining gap.
/// Monotone and overshoot-free for factors in (0, 1].
pub fn ease_toward(current: f32, target: f32, factor: f32) -> f32 {
    current + (target - current) * factor
}

/// Target rotation triple for a pointer at `(pointer_x, pointer_y)` given
/// the widget center and the viewport extent. The offset is normalized by
/// the viewport half-extent; the bearing (z) is the two-argument arctangent
/// of that normalized offset, and the x/y tilts are small fixed fractions
/// of it.
pub fn bearing_from_pointer(
    center_x: f64,
    center_y: f64,
    pointer_x: f64,
    pointer_y: f64,
    viewport_width: f64,
    viewport_height: f64,
) -> Vec3 {
    let nx = ((pointer_x - center_x) / (viewport_width * 0.5).max(1.0)) as f32;
    let ny = ((pointer_y - center_y) / (viewport_height * 0.5).max(1.0)) as f32;

    Vec3::new(
        -ny * TILT_PITCH_COEFF,
        nx * TILT_YAW_COEFF,
        ny.atan2(nx),
    )
}

struct WidgetState {
    scene: SceneHost,
    container: Element,
    load_state: LoadState,
    current: Option<InstalledModel>,
    bearing: Bearing,
}

impl WidgetState {
    /// Swaps in a freshly uploaded model. The previous model is detached and
    /// released first, so the scene never holds two arrows at once.
    fn install(&mut self, model: &ArrowModel, tier: Tier) -> Result<(), JsValue> {
        let uploaded = self.scene.upload(model)?;
        if let Some(old) = self.current.take() {
            self.scene.release(old);
        }
        self.current = Some(uploaded);
        self.load_state = on_tier_succeeded(tier);
        Ok(())
    }

    fn tick(&mut self, timestamp: f64) {
        let b = &mut self.bearing;
        b.current.x = ease_toward(b.current.x, b.target.x, EASING_FACTOR);
        b.current.y = ease_toward(b.current.y, b.target.y, EASING_FACTOR);
        b.current.z = ease_toward(b.current.z, b.target.z, EASING_FACTOR);

        let t = timestamp * BOB_CLOCK_SCALE;
        let bob = Vec3::new(
            (t * BOB_HORIZONTAL_RATE).cos() as f32 * BOB_HORIZONTAL_AMPLITUDE,
            t.sin() as f32 * BOB_VERTICAL_AMPLITUDE,
            0.0,
        );

        let group = Mat4::from_translation(bob)
            * Mat4::from_euler(EulerRot::XYZ, b.current.x, b.current.y, b.current.z);
        self.scene.render(self.current.as_ref(), group);
    }
}

/// One mounted arrow widget. Lives for the page lifetime unless the caller
/// explicitly destroys it.
pub struct ArrowWidget {
    state: Rc<RefCell<WidgetState>>,
    animator: RafLoop,
}

impl ArrowWidget {
    /// Wires the widget into the page. Returns `Ok(None)` when the host
    /// container is absent or WebGL is unavailable; both are normal
    /// conditions for this decorative element.
    pub fn mount(page: &Page, config: ArrowConfig) -> Result<Option<ArrowWidget>, JsValue> {
        let Some(container) = page.document.get_element_by_id(config.container_id) else {
            return Ok(None);
        };

        let Some(scene) = SceneHost::create(page, &container, config.size)? else {
            return Ok(None);
        };

        let state = Rc::new(RefCell::new(WidgetState {
            scene,
            container,
            load_state: LoadState::NotStarted,
            current: None,
            bearing: Bearing::default(),
        }));

        // Placeholder so the scene is never empty while tiers are in flight.
        {
            let mut st = state.borrow_mut();
            let placeholder = model::procedural_arrow();
            let uploaded = st.scene.upload(&placeholder)?;
            st.current = Some(uploaded);
        }

        spawn_loader(Rc::clone(&state));

        let state_pointer = Rc::clone(&state);
        let window_pointer = page.window.clone();
        let on_mousemove = Closure::wrap(Box::new(move |event: MouseEvent| {
            let viewport_width = window_pointer
                .inner_width()
                .ok()
                .and_then(|v| v.as_f64())
                .unwrap_or(1.0);
            let viewport_height = window_pointer
                .inner_height()
                .ok()
                .and_then(|v| v.as_f64())
                .unwrap_or(1.0);

            let mut st = state_pointer.borrow_mut();
            let rect = st.container.get_bounding_client_rect();
            let center_x = rect.left() + rect.width() * 0.5;
            let center_y = rect.top() + rect.height() * 0.5;

            st.bearing.target = bearing_from_pointer(
                center_x,
                center_y,
                event.client_x() as f64,
                event.client_y() as f64,
                viewport_width,
                viewport_height,
            );
        }) as Box<dyn FnMut(_)>);
        page.document
            .add_event_listener_with_callback("mousemove", on_mousemove.as_ref().unchecked_ref())?;
        on_mousemove.forget();

        let state_resize = Rc::clone(&state);
        let window_resize = page.window.clone();
        let document_resize = page.document.clone();
        let on_resize = Closure::wrap(Box::new(move |_event: web_sys::Event| {
            let page = Page {
                window: window_resize.clone(),
                document: document_resize.clone(),
            };
            let st = state_resize.borrow();
            if let Err(err) = st.scene.restore_size(&page) {
                web_sys::console::warn_1(&JsValue::from_str(&format!(
                    "arrow: resize restore failed: {}",
                    crate::js_value_to_string(&err)
                )));
            }
        }) as Box<dyn FnMut(_)>);
        page.window
            .add_event_listener_with_callback("resize", on_resize.as_ref().unchecked_ref())?;
        on_resize.forget();

        let state_tick = Rc::clone(&state);
        let animator = RafLoop::start(move |timestamp| {
            state_tick.borrow_mut().tick(timestamp);
        })?;

        Ok(Some(ArrowWidget { state, animator }))
    }

    pub fn load_state(&self) -> LoadState {
        self.state.borrow().load_state
    }

    /// Swaps the displayed model for one the caller parsed elsewhere. The
    /// previous model's buffers are released as part of the swap.
    pub fn install_model(&self, model: &ArrowModel, tier: Tier) -> Result<(), JsValue> {
        self.state.borrow_mut().install(model, tier)
    }

    pub fn live_buffers(&self) -> usize {
        self.state.borrow().scene.live_buffers()
    }

    pub fn mesh_count(&self) -> usize {
        self.state
            .borrow()
            .current
            .as_ref()
            .map(InstalledModel::mesh_count)
            .unwrap_or(0)
    }

    pub fn canvas(&self) -> web_sys::HtmlCanvasElement {
        self.state.borrow().scene.canvas().clone()
    }

    /// Stops the animation loop and releases the render surface. An in-flight
    /// loader continuation may still complete against the detached scene,
    /// which is harmless.
    pub fn destroy(self) {
        self.animator.stop();
        let mut st = self.state.borrow_mut();
        if let Some(old) = st.current.take() {
            st.scene.release(old);
        }
        st.scene.remove();
    }
}

/// Fire-and-forget fallback chain: each network tier is attempted at most
/// once, in order, and the chain ends in a state that names the tier whose
/// model is on screen. The procedural placeholder is already installed, so
/// the final tier only has to record that fact.
fn spawn_loader(state: Rc<RefCell<WidgetState>>) {
    spawn_local(async move {
        let mut tier = Tier::FIRST;
        loop {
            {
                let mut st = state.borrow_mut();
                st.load_state = on_tier_started(st.load_state, tier);
            }

            if tier == Tier::Procedural {
                let mut st = state.borrow_mut();
                if st.current.is_none() {
                    let fallback = model::procedural_arrow();
                    if let Err(err) = st.install(&fallback, Tier::Procedural) {
                        web_sys::console::error_1(&err);
                    }
                }
                // Terminal whether or not the upload worked; the machine
                // must not end on a Fetching state.
                st.load_state = on_tier_succeeded(Tier::Procedural);
                return;
            }

            match load_tier(tier).await {
                Ok(model) => match state.borrow_mut().install(&model, tier) {
                    Ok(()) => return,
                    // A parsed model that fails to upload is treated like a
                    // failed fetch: fall through to the next tier.
                    Err(err) => {
                        web_sys::console::warn_1(&JsValue::from_str(&format!(
                            "arrow: {:?} tier upload failed: {}",
                            tier,
                            crate::js_value_to_string(&err)
                        )));
                    }
                },
                Err(err) => {
                    web_sys::console::warn_1(&JsValue::from_str(&format!(
                        "arrow: {:?} tier failed: {}",
                        tier, err
                    )));
                }
            }

            match tier.next() {
                Some(next) => tier = next,
                None => return,
            }
        }
    });
}
