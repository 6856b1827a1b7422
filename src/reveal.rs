//! Scroll-triggered fade-ins: sections start translated and transparent via
//! an injected stylesheet, and an `IntersectionObserver` flips them visible
//! the first time they scroll into view.

use js_sys::Array;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{IntersectionObserver, IntersectionObserverEntry, IntersectionObserverInit};

use crate::Page;

const REVEAL_SELECTOR: &str =
    ".agency-section, .showreel-section, .services-section, .service-card";
const REVEAL_THRESHOLD: f64 = 0.1;
const REVEAL_ROOT_MARGIN: &str = "0px 0px -50px 0px";

const REVEAL_CSS: &str = r#"
.agency-section,
.showreel-section,
.services-section,
.service-card {
    opacity: 0;
    transform: translateY(30px);
    transition: opacity 0.8s ease, transform 0.8s ease;
}

.animate-in {
    opacity: 1 !important;
    transform: translateY(0) !important;
}

.service-card:nth-child(1) { transition-delay: 0.1s; }
.service-card:nth-child(2) { transition-delay: 0.2s; }
.service-card:nth-child(3) { transition-delay: 0.3s; }
"#;

pub fn init(page: &Page) -> Result<(), JsValue> {
    inject_styles(page)?;

    let callback = Closure::wrap(Box::new(
        move |entries: Array, _observer: IntersectionObserver| {
            for entry in entries.iter() {
                let Ok(entry) = entry.dyn_into::<IntersectionObserverEntry>() else {
                    continue;
                };
                if entry.is_intersecting() {
                    let _ = entry.target().class_list().add_1("animate-in");
                }
            }
        },
    ) as Box<dyn FnMut(_, _)>);

    let options = IntersectionObserverInit::new();
    options.set_threshold(&JsValue::from_f64(REVEAL_THRESHOLD));
    options.set_root_margin(REVEAL_ROOT_MARGIN);

    let observer =
        IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &options)?;
    callback.forget();

    for element in crate::elements_of(page.document.query_selector_all(REVEAL_SELECTOR)?) {
        observer.observe(&element);
    }

    Ok(())
}

fn inject_styles(page: &Page) -> Result<(), JsValue> {
    let style = page.document.create_element("style")?;
    style.set_text_content(Some(REVEAL_CSS));

    match page.document.head() {
        Some(head) => {
            head.append_child(&style)?;
        }
        None => {
            if let Some(body) = page.document.body() {
                body.append_child(&style)?;
            }
        }
    }

    Ok(())
}
