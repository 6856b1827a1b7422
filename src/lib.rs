use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, NodeList, Window};

pub mod arrow;
mod cursor;
mod nav;
pub mod raf;
mod reveal;
mod video;

pub use arrow::{ArrowConfig, ArrowWidget};

/// Per-page initialization context. Every feature receives the handles it
/// needs through this struct instead of reaching for module-level globals, so
/// a page is wired exactly once from `start_impl`.
pub struct Page {
    pub(crate) window: Window,
    pub(crate) document: Document,
}

impl Page {
    pub fn current() -> Result<Page, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("missing window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("missing document"))?;
        Ok(Page { window, document })
    }

    pub fn document(&self) -> &Document {
        &self.document
    }
}

pub(crate) fn window() -> Window {
    web_sys::window().expect("missing window")
}

pub(crate) fn js_value_to_string(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}

/// Iterate a `NodeList` as `Element`s, skipping non-element nodes.
pub(crate) fn elements_of(list: NodeList) -> impl Iterator<Item = Element> {
    (0..list.length()).filter_map(move |i| list.item(i).and_then(|n| n.dyn_into::<Element>().ok()))
}

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();

    if let Err(err) = start_impl() {
        web_sys::console::error_1(&JsValue::from_str(&format!(
            "sitefx init failed: {}",
            js_value_to_string(&err)
        )));
    }
}

fn start_impl() -> Result<(), JsValue> {
    let page = Page::current()?;

    set_footer_year(&page);
    cursor::init(&page)?;
    nav::init(&page)?;
    video::init(&page)?;
    reveal::init(&page)?;

    // Decorative 3D arrow. A missing container or missing WebGL support is a
    // normal condition; the rest of the page is wired either way.
    let _ = ArrowWidget::mount(&page, ArrowConfig::default())?;

    Ok(())
}

fn set_footer_year(page: &Page) {
    if let Some(el) = page.document.get_element_by_id("year") {
        let year = js_sys::Date::new_0().get_full_year();
        el.set_text_content(Some(&year.to_string()));
    }
}
