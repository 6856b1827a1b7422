use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

struct Inner {
    running: bool,
    frame_id: Option<i32>,
}

/// A repeating `requestAnimationFrame` loop with an explicit stop operation.
///
/// The callback receives the timestamp the browser hands to each frame.
/// [`RafLoop::stop`] cancels the pending frame and releases the callback;
/// merely dropping the handle leaves the loop running for the page lifetime,
/// which is the default for decorative widgets.
pub struct RafLoop {
    inner: Rc<RefCell<Inner>>,
    callback: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>,
}

impl RafLoop {
    pub fn start<F>(mut tick: F) -> Result<RafLoop, JsValue>
    where
        F: FnMut(f64) + 'static,
    {
        let inner = Rc::new(RefCell::new(Inner {
            running: true,
            frame_id: None,
        }));
        let callback: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>> = Rc::new(RefCell::new(None));

        let inner_cb = Rc::clone(&inner);
        let callback_cb = Rc::clone(&callback);
        let closure = Closure::wrap(Box::new(move |timestamp: f64| {
            if !inner_cb.borrow().running {
                return;
            }

            tick(timestamp);

            // The tick may have stopped the loop.
            if !inner_cb.borrow().running {
                return;
            }

            let next = {
                let slot = callback_cb.borrow();
                match slot.as_ref() {
                    Some(cb) => crate::window()
                        .request_animation_frame(cb.as_ref().unchecked_ref())
                        .ok(),
                    None => None,
                }
            };
            inner_cb.borrow_mut().frame_id = next;
        }) as Box<dyn FnMut(f64)>);

        *callback.borrow_mut() = Some(closure);

        let first = {
            let slot = callback.borrow();
            let cb = slot.as_ref().ok_or_else(|| JsValue::from_str("raf callback missing"))?;
            crate::window().request_animation_frame(cb.as_ref().unchecked_ref())?
        };
        inner.borrow_mut().frame_id = Some(first);

        Ok(RafLoop { inner, callback })
    }

    pub fn is_running(&self) -> bool {
        self.inner.borrow().running
    }

    /// Stops the loop: no further ticks fire, the pending frame is cancelled,
    /// and the retained closure is released.
    pub fn stop(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.running = false;
        if let Some(id) = inner.frame_id.take() {
            let _ = crate::window().cancel_animation_frame(id);
        }
        drop(inner);

        self.callback.borrow_mut().take();
    }
}
