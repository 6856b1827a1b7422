#![cfg(target_arch = "wasm32")]

use glam::Mat4;
use sitefx::arrow::model::{LoadState, Tier, parse_obj_model, procedural_arrow};
use sitefx::arrow::scene::SceneHost;
use sitefx::{ArrowConfig, ArrowWidget, Page};
use wasm_bindgen::JsCast;
use wasm_bindgen_test::*;
use web_sys::HtmlElement;

wasm_bindgen_test_configure!(run_in_browser);

fn page() -> Page {
    Page::current().expect("page context")
}

#[wasm_bindgen_test]
fn missing_container_is_a_silent_noop() {
    let page = page();
    let widget = ArrowWidget::mount(
        &page,
        ArrowConfig {
            container_id: "no-such-container",
            size: 250,
        },
    )
    .expect("mount must not error");

    assert!(widget.is_none());
}

#[wasm_bindgen_test]
fn mounted_widget_owns_one_canvas_with_a_placeholder_model() {
    let page = page();
    let document = page.document().clone();
    let body = document.body().expect("body");

    let container = document.create_element("div").expect("create container");
    container.set_id("arrow-container");
    body.append_child(&container).expect("append container");

    let widget = ArrowWidget::mount(&page, ArrowConfig::default()).expect("mount");
    let Some(widget) = widget else {
        // Headless environments without WebGL skip the widget by design.
        container.remove();
        return;
    };

    assert_eq!(container.child_element_count(), 1);
    // The procedural placeholder is installed before any tier resolves.
    assert!(widget.mesh_count() > 0);

    let canvas = widget.canvas();
    assert_eq!(canvas.width(), canvas.height(), "render surface is square");

    widget.destroy();
    assert_eq!(container.child_element_count(), 0, "destroy removes the surface");
    container.remove();
}

#[wasm_bindgen_test]
fn installing_a_new_model_releases_the_previous_one() {
    let page = page();
    let document = page.document().clone();
    let body = document.body().expect("body");

    let container = document.create_element("div").expect("create container");
    container.set_id("arrow-swap");
    body.append_child(&container).expect("append container");

    let widget = ArrowWidget::mount(
        &page,
        ArrowConfig {
            container_id: "arrow-swap",
            size: 250,
        },
    )
    .expect("mount");
    let Some(widget) = widget else {
        container.remove();
        return;
    };

    // Placeholder buffers only: three per mesh.
    let placeholder_meshes = widget.mesh_count();
    assert!(placeholder_meshes > 1);
    assert_eq!(widget.live_buffers(), placeholder_meshes * 3);

    let single = parse_obj_model("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").expect("parse");
    widget.install_model(&single, Tier::Obj).expect("install");

    // Exactly one model is resident after the swap.
    assert_eq!(widget.mesh_count(), 1);
    assert_eq!(widget.live_buffers(), 3);
    assert_eq!(widget.load_state(), LoadState::FallbackObj);

    widget.destroy();
    container.remove();
}

#[wasm_bindgen_test]
fn rendering_twice_with_unchanged_state_draws_the_same_frame() {
    let page = page();
    let document = page.document().clone();
    let body = document.body().expect("body");

    let container = document.create_element("div").expect("create container");
    body.append_child(&container).expect("append container");

    let host = SceneHost::create(&page, &container, 64).expect("create");
    let Some(host) = host else {
        container.remove();
        return;
    };
    let model = host.upload(&procedural_arrow()).expect("upload");

    host.render(Some(&model), Mat4::IDENTITY);
    let first = host.read_frame().expect("read frame");
    host.render(Some(&model), Mat4::IDENTITY);
    let second = host.read_frame().expect("read frame");

    assert!(first.iter().any(|&b| b != 0), "frame is empty");
    assert_eq!(first, second);

    host.release(model);
    host.remove();
    container.remove();
}

#[wasm_bindgen_test]
fn two_widgets_can_share_a_page() {
    let page = page();
    let document = page.document().clone();
    let body = document.body().expect("body");

    for id in ["arrow-left", "arrow-right"] {
        let container = document.create_element("div").expect("create container");
        container.set_id(id);
        body.append_child(&container).expect("append container");
    }

    let left = ArrowWidget::mount(&page, ArrowConfig::paired("arrow-left")).expect("mount left");
    let right = ArrowWidget::mount(&page, ArrowConfig::paired("arrow-right")).expect("mount right");

    if let Some(left) = left {
        left.destroy();
    }
    if let Some(right) = right {
        right.destroy();
    }

    for id in ["arrow-left", "arrow-right"] {
        if let Some(el) = document.get_element_by_id(id) {
            el.remove();
        }
    }
}

#[wasm_bindgen_test]
fn hamburger_click_toggles_the_mobile_menu() {
    let document = page().document().clone();
    let body = document.body().expect("body");

    body.set_inner_html(
        r##"<button id="hamburger"></button>
           <div class="nav-left"></div>
           <div class="nav-right"></div>
           <a class="nav-link" href="#top">Top</a>"##,
    );

    // Re-run page wiring against the fresh DOM.
    sitefx::start();

    let hamburger = document
        .get_element_by_id("hamburger")
        .expect("hamburger")
        .dyn_into::<HtmlElement>()
        .expect("html element");

    hamburger.click();
    assert!(hamburger.class_list().contains("active"));
    let nav_left = document.query_selector(".nav-left").expect("query").expect("nav-left");
    assert!(nav_left.class_list().contains("active"));

    hamburger.click();
    assert!(!hamburger.class_list().contains("active"));

    body.set_inner_html("");
}
