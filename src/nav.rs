//! Mobile navigation toggle, smooth-scroll anchors and the scroll-dependent
//! navbar background.

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    Element, Event, HtmlElement, ScrollBehavior, ScrollIntoViewOptions, ScrollLogicalPosition,
};

use crate::Page;

const NAVBAR_SCROLL_THRESHOLD: f64 = 100.0;
const NAVBAR_SOLID_BACKGROUND: &str = "rgba(14, 15, 18, 0.95)";

pub fn init(page: &Page) -> Result<(), JsValue> {
    init_mobile_nav(page)?;
    init_anchor_scroll(page)?;
    init_navbar_background(page)?;
    Ok(())
}

fn init_mobile_nav(page: &Page) -> Result<(), JsValue> {
    let document = &page.document;
    let (Some(hamburger), Some(nav_left), Some(nav_right)) = (
        document.get_element_by_id("hamburger"),
        document.query_selector(".nav-left")?,
        document.query_selector(".nav-right")?,
    ) else {
        return Ok(());
    };

    let toggle_targets = [hamburger.clone(), nav_left.clone(), nav_right.clone()];
    let on_toggle = Closure::wrap(Box::new(move |_event: Event| {
        for el in &toggle_targets {
            let _ = el.class_list().toggle("active");
        }
    }) as Box<dyn FnMut(_)>);
    hamburger.add_event_listener_with_callback("click", on_toggle.as_ref().unchecked_ref())?;
    on_toggle.forget();

    // Any nav link closes the mobile menu.
    let close_targets = [hamburger, nav_left, nav_right];
    let on_close = Closure::wrap(Box::new(move |_event: Event| {
        for el in &close_targets {
            let _ = el.class_list().remove_1("active");
        }
    }) as Box<dyn FnMut(_)>);
    for link in crate::elements_of(document.query_selector_all(".nav-link")?) {
        link.add_event_listener_with_callback("click", on_close.as_ref().unchecked_ref())?;
    }
    on_close.forget();

    Ok(())
}

fn init_anchor_scroll(page: &Page) -> Result<(), JsValue> {
    let document = page.document.clone();
    let on_click = Closure::wrap(Box::new(move |event: Event| {
        event.prevent_default();

        let Some(anchor) = event
            .current_target()
            .and_then(|t| t.dyn_into::<Element>().ok())
        else {
            return;
        };
        let Some(href) = anchor.get_attribute("href") else {
            return;
        };
        // A bare "#" is not a valid selector; treat it as a no-op.
        let Ok(Some(target)) = document.query_selector(&href) else {
            return;
        };

        let options = ScrollIntoViewOptions::new();
        options.set_behavior(ScrollBehavior::Smooth);
        options.set_block(ScrollLogicalPosition::Start);
        target.scroll_into_view_with_scroll_into_view_options(&options);
    }) as Box<dyn FnMut(_)>);

    for anchor in crate::elements_of(page.document.query_selector_all("a[href^=\"#\"]")?) {
        anchor.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())?;
    }
    on_click.forget();

    Ok(())
}

fn init_navbar_background(page: &Page) -> Result<(), JsValue> {
    let Some(navbar) = page
        .document
        .query_selector(".navbar")?
        .and_then(|el| el.dyn_into::<HtmlElement>().ok())
    else {
        return Ok(());
    };

    let window = page.window.clone();
    let on_scroll = Closure::wrap(Box::new(move |_event: Event| {
        let scrolled = window.scroll_y().unwrap_or(0.0) > NAVBAR_SCROLL_THRESHOLD;
        let background = if scrolled {
            NAVBAR_SOLID_BACKGROUND
        } else {
            "transparent"
        };
        let _ = navbar.style().set_property("background", background);
    }) as Box<dyn FnMut(_)>);
    page.window
        .add_event_listener_with_callback("scroll", on_scroll.as_ref().unchecked_ref())?;
    on_scroll.forget();

    Ok(())
}
