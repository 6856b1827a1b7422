//! Custom glowing cursor: a body-appended element that trails the pointer
//! with a lerped transform and picks up a `hover` class over interactive
//! elements.

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::{Array, Function};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, Event, HtmlElement, MouseEvent, MutationObserver, MutationObserverInit};

use crate::Page;
use crate::raf::RafLoop;

const LERP_FACTOR: f64 = 0.15;
const INTERACTIVE_SELECTOR: &str =
    "a, button, .nav-link, .showreel-video, [role=\"button\"], input, textarea";
// Marker attribute so rebinding after DOM mutations never attaches the same
// hover listeners twice to one element.
const BOUND_MARKER: &str = "data-cursor-bound";

struct CursorState {
    current: (f64, f64),
    target: (f64, f64),
}

pub fn init(page: &Page) -> Result<(), JsValue> {
    let Some(body) = page.document.body() else {
        return Ok(());
    };

    let cursor = page
        .document
        .create_element("div")?
        .dyn_into::<HtmlElement>()?;
    cursor.set_class_name("custom-cursor");
    body.append_child(&cursor)?;

    let state = Rc::new(RefCell::new(CursorState {
        current: (0.0, 0.0),
        target: (0.0, 0.0),
    }));

    let cursor_anim = cursor.clone();
    let state_anim = Rc::clone(&state);
    let _trail = RafLoop::start(move |_timestamp| {
        let mut st = state_anim.borrow_mut();
        st.current.0 += (st.target.0 - st.current.0) * LERP_FACTOR;
        st.current.1 += (st.target.1 - st.current.1) * LERP_FACTOR;
        let transform = format!(
            "translate3d({}px, {}px, 0) translate(-50%, -50%)",
            st.current.0, st.current.1
        );
        let _ = cursor_anim.style().set_property("transform", &transform);
    })?;

    let state_move = Rc::clone(&state);
    let on_mousemove = Closure::wrap(Box::new(move |event: MouseEvent| {
        let mut st = state_move.borrow_mut();
        st.target = (event.client_x() as f64, event.client_y() as f64);
    }) as Box<dyn FnMut(_)>);
    page.document
        .add_event_listener_with_callback("mousemove", on_mousemove.as_ref().unchecked_ref())?;
    on_mousemove.forget();

    init_hover_targets(page, &cursor)?;
    init_visibility(page, &cursor)?;

    Ok(())
}

fn init_hover_targets(page: &Page, cursor: &HtmlElement) -> Result<(), JsValue> {
    // One shared enter/leave closure pair, reused for every bound element.
    let cursor_enter = cursor.clone();
    let on_enter = Closure::wrap(Box::new(move |_event: Event| {
        let _ = cursor_enter.class_list().add_1("hover");
    }) as Box<dyn FnMut(_)>);

    let cursor_leave = cursor.clone();
    let on_leave = Closure::wrap(Box::new(move |_event: Event| {
        let _ = cursor_leave.class_list().remove_1("hover");
    }) as Box<dyn FnMut(_)>);

    let enter_fn: Function = on_enter.as_ref().unchecked_ref::<Function>().clone();
    let leave_fn: Function = on_leave.as_ref().unchecked_ref::<Function>().clone();
    on_enter.forget();
    on_leave.forget();

    bind_hover_targets(&page.document, &enter_fn, &leave_fn)?;

    // Rebind when the DOM grows; the marker attribute keeps this idempotent.
    let document_observer = page.document.clone();
    let observer_cb = Closure::wrap(Box::new(move |_records: Array, _obs: MutationObserver| {
        if let Err(err) = bind_hover_targets(&document_observer, &enter_fn, &leave_fn) {
            web_sys::console::warn_1(&err);
        }
    }) as Box<dyn FnMut(_, _)>);

    let observer = MutationObserver::new(observer_cb.as_ref().unchecked_ref())?;
    observer_cb.forget();

    if let Some(body) = page.document.body() {
        let options = MutationObserverInit::new();
        options.set_child_list(true);
        options.set_subtree(true);
        observer.observe_with_options(&body, &options)?;
    }

    Ok(())
}

fn bind_hover_targets(
    document: &Document,
    on_enter: &Function,
    on_leave: &Function,
) -> Result<(), JsValue> {
    let targets = document.query_selector_all(INTERACTIVE_SELECTOR)?;
    for element in crate::elements_of(targets) {
        if element.get_attribute(BOUND_MARKER).is_some() {
            continue;
        }
        element.set_attribute(BOUND_MARKER, "1")?;
        bind_pair(&element, on_enter, on_leave)?;
    }
    Ok(())
}

fn bind_pair(element: &Element, on_enter: &Function, on_leave: &Function) -> Result<(), JsValue> {
    element.add_event_listener_with_callback("mouseenter", on_enter)?;
    element.add_event_listener_with_callback("mouseleave", on_leave)?;
    Ok(())
}

fn init_visibility(page: &Page, cursor: &HtmlElement) -> Result<(), JsValue> {
    let set_opacity = |cursor: &HtmlElement, visible: bool| {
        let _ = cursor
            .style()
            .set_property("opacity", if visible { "1" } else { "0" });
    };

    let cursor_leave = cursor.clone();
    let on_leave = Closure::wrap(Box::new(move |_event: Event| {
        set_opacity(&cursor_leave, false);
    }) as Box<dyn FnMut(_)>);
    page.document
        .add_event_listener_with_callback("mouseleave", on_leave.as_ref().unchecked_ref())?;
    on_leave.forget();

    let cursor_enter = cursor.clone();
    let on_enter = Closure::wrap(Box::new(move |_event: Event| {
        set_opacity(&cursor_enter, true);
    }) as Box<dyn FnMut(_)>);
    page.document
        .add_event_listener_with_callback("mouseenter", on_enter.as_ref().unchecked_ref())?;
    on_enter.forget();

    let cursor_visibility = cursor.clone();
    let document_visibility = page.document.clone();
    let on_visibility = Closure::wrap(Box::new(move |_event: Event| {
        set_opacity(&cursor_visibility, !document_visibility.hidden());
    }) as Box<dyn FnMut(_)>);
    page.document.add_event_listener_with_callback(
        "visibilitychange",
        on_visibility.as_ref().unchecked_ref(),
    )?;
    on_visibility.forget();

    Ok(())
}
