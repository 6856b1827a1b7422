//! Fullscreen showreel overlay: clicking the inline video (or its play
//! button) opens a fullscreen copy seeked to the same position; close via
//! the button, a click outside the video, or Escape.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Element, Event, EventTarget, HtmlElement, HtmlVideoElement, KeyboardEvent};

use crate::Page;

const OVERLAY_MARKUP: &str = r#"
<div class="fullscreen-video-container">
    <video class="fullscreen-video" controls autoplay>
        <source src="./assets/showreel.mp4" type="video/mp4">
    </video>
    <button class="close-fullscreen">&times;</button>
</div>
"#;

pub fn init(page: &Page) -> Result<(), JsValue> {
    let Some(inline_video) = page
        .document
        .query_selector(".showreel-video")?
        .and_then(|el| el.dyn_into::<HtmlVideoElement>().ok())
    else {
        return Ok(());
    };
    let Some(play_button) = page.document.get_element_by_id("play-button") else {
        return Ok(());
    };
    let container = page.document.query_selector(".video-container")?;

    // Open handler shared by the video, the play button and the container.
    let document_open = page.document.clone();
    let inline_open = inline_video.clone();
    let on_open = Closure::wrap(Box::new(move |event: Event| {
        event.prevent_default();
        if let Err(err) = open_overlay(&document_open, &inline_open) {
            web_sys::console::error_1(&err);
        }
    }) as Box<dyn FnMut(_)>);

    inline_video.add_event_listener_with_callback("click", on_open.as_ref().unchecked_ref())?;
    play_button.add_event_listener_with_callback("click", on_open.as_ref().unchecked_ref())?;
    if let Some(container) = &container {
        container.add_event_listener_with_callback("click", on_open.as_ref().unchecked_ref())?;
    }
    on_open.forget();

    init_play_button(&inline_video, &play_button)?;

    inline_video.style().set_property("cursor", "pointer")?;
    if let Some(container) = container.as_ref().and_then(|el| el.dyn_ref::<HtmlElement>()) {
        container.style().set_property("cursor", "pointer")?;
    }

    Ok(())
}

/// The play button hides while the inline video is playing.
fn init_play_button(video: &HtmlVideoElement, play_button: &Element) -> Result<(), JsValue> {
    let update = {
        let video = video.clone();
        let play_button = play_button.clone();
        move || {
            if video.paused() {
                let _ = play_button.class_list().remove_1("hidden");
            } else {
                let _ = play_button.class_list().add_1("hidden");
            }
        }
    };

    update();

    let on_state = Closure::wrap(Box::new(move |_event: Event| update()) as Box<dyn FnMut(_)>);
    for event_name in ["play", "pause", "loadeddata"] {
        video.add_event_listener_with_callback(event_name, on_state.as_ref().unchecked_ref())?;
    }
    on_state.forget();

    Ok(())
}

fn open_overlay(document: &web_sys::Document, inline_video: &HtmlVideoElement) -> Result<(), JsValue> {
    let Some(body) = document.body() else {
        return Ok(());
    };

    let overlay = document
        .create_element("div")?
        .dyn_into::<HtmlElement>()?;
    overlay.set_class_name("fullscreen-video-overlay");
    overlay.set_inner_html(OVERLAY_MARKUP);
    body.append_child(&overlay)?;
    overlay.style().set_property("display", "flex")?;
    body.style().set_property("overflow", "hidden")?;

    let fullscreen_video = overlay
        .query_selector(".fullscreen-video")?
        .and_then(|el| el.dyn_into::<HtmlVideoElement>().ok())
        .ok_or_else(|| JsValue::from_str("overlay video missing"))?;
    fullscreen_video.set_current_time(inline_video.current_time());

    // The Escape handler has to be removable from inside close(), so the
    // closure lives in a shared slot both sides can reach.
    let keydown_slot: Rc<RefCell<Option<Closure<dyn FnMut(KeyboardEvent)>>>> =
        Rc::new(RefCell::new(None));

    let close: Rc<dyn Fn()> = {
        let overlay = overlay.clone();
        let body = body.clone();
        let inline_video = inline_video.clone();
        let fullscreen_video = fullscreen_video.clone();
        let document = document.clone();
        let keydown_slot = Rc::clone(&keydown_slot);
        Rc::new(move || {
            inline_video.set_current_time(fullscreen_video.current_time());
            overlay.remove();
            let _ = body.style().set_property("overflow", "auto");
            if let Some(keydown) = keydown_slot.borrow_mut().take() {
                let _ = document.remove_event_listener_with_callback(
                    "keydown",
                    keydown.as_ref().unchecked_ref(),
                );
            }
        })
    };

    if let Some(close_button) = overlay.query_selector(".close-fullscreen")? {
        let close = Rc::clone(&close);
        let on_close = Closure::wrap(Box::new(move |_event: Event| close()) as Box<dyn FnMut(_)>);
        close_button
            .add_event_listener_with_callback("click", on_close.as_ref().unchecked_ref())?;
        on_close.forget();
    }

    // Click on the backdrop (not the video container) also closes.
    {
        let close = Rc::clone(&close);
        let overlay_target: EventTarget = overlay.clone().into();
        let on_backdrop = Closure::wrap(Box::new(move |event: Event| {
            if event.target().as_ref() == Some(&overlay_target) {
                close();
            }
        }) as Box<dyn FnMut(_)>);
        overlay.add_event_listener_with_callback("click", on_backdrop.as_ref().unchecked_ref())?;
        on_backdrop.forget();
    }

    {
        let close = Rc::clone(&close);
        let keydown = Closure::wrap(Box::new(move |event: KeyboardEvent| {
            if event.key() == "Escape" {
                close();
            }
        }) as Box<dyn FnMut(_)>);
        document
            .add_event_listener_with_callback("keydown", keydown.as_ref().unchecked_ref())?;
        *keydown_slot.borrow_mut() = Some(keydown);
    }

    Ok(())
}
