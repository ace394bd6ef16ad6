//! Browser glue for [`PointerHandler`]: listener registration and a
//! `requestAnimationFrame` backed frame clock.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{AddEventListenerOptions, Document, Event, EventTarget, HtmlElement, MouseEvent, TouchEvent, Window};

use sketchshare_shared::{
    FrameHandle, FrameScheduler, GestureCallbacks, GestureConfig, PointerHandler,
};

use crate::dom::{event_position, is_clickable_element, touch_positions};

pub type SharedHandler = Rc<RefCell<PointerHandler<BrowserFrames>>>;

const SURFACE_CLASS: &str = "gesture-surface";

struct FramesInner {
    next_id: u32,
    pending: HashMap<FrameHandle, i32>,
    target: Weak<RefCell<PointerHandler<BrowserFrames>>>,
}

/// Frame clock for one handler. Each requested frame is delivered back to
/// the handler through `on_frame`.
#[derive(Clone)]
pub struct BrowserFrames {
    window: Window,
    inner: Rc<RefCell<FramesInner>>,
}

impl BrowserFrames {
    pub fn new(window: Window) -> Self {
        Self {
            window,
            inner: Rc::new(RefCell::new(FramesInner {
                next_id: 0,
                pending: HashMap::new(),
                target: Weak::new(),
            })),
        }
    }

    fn bind(&self, handler: &SharedHandler) {
        self.inner.borrow_mut().target = Rc::downgrade(handler);
    }
}

impl FrameScheduler for BrowserFrames {
    fn request_frame(&mut self) -> FrameHandle {
        let handle = {
            let mut inner = self.inner.borrow_mut();
            inner.next_id = inner.next_id.wrapping_add(1);
            FrameHandle(inner.next_id)
        };

        let inner = Rc::downgrade(&self.inner);
        let callback = Closure::once_into_js(move |_timestamp: f64| {
            let Some(inner) = inner.upgrade() else {
                return;
            };
            let target = {
                let mut inner = inner.borrow_mut();
                inner.pending.remove(&handle);
                inner.target.upgrade()
            };
            let Some(handler) = target else {
                return;
            };
            match handler.try_borrow_mut() {
                Ok(mut handler) => handler.on_frame(handle),
                Err(_) => log::warn!("frame {handle:?} dropped: handler busy"),
            };
        });

        match self.window.request_animation_frame(callback.unchecked_ref()) {
            Ok(id) => {
                self.inner.borrow_mut().pending.insert(handle, id);
            }
            Err(err) => log::error!("requestAnimationFrame failed: {err:?}"),
        }
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        let id = self.inner.borrow_mut().pending.remove(&handle);
        if let Some(id) = id {
            let _ = self.window.cancel_animation_frame(id);
        }
    }

    fn now_ms(&self) -> f64 {
        self.window
            .performance()
            .map(|performance| performance.now())
            .unwrap_or_else(js_sys::Date::now)
    }
}

struct Listener {
    target: EventTarget,
    event: &'static str,
    closure: Closure<dyn FnMut(Event)>,
}

impl Listener {
    fn remove(&self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(self.event, self.closure.as_ref().unchecked_ref());
    }
}

/// A [`PointerHandler`] attached to one element. Press-starting events are
/// listened for on the element, moves and releases on the whole document so a
/// drag can leave the element. Dropping the binding detaches it.
pub struct PointerBinding {
    handler: SharedHandler,
    element: HtmlElement,
    element_listeners: Vec<Listener>,
    document_listeners: Vec<Listener>,
}

impl PointerBinding {
    pub fn attach(
        window: &Window,
        document: &Document,
        element: &HtmlElement,
        config: GestureConfig,
        callbacks: GestureCallbacks,
    ) -> Result<Self, JsValue> {
        let frames = BrowserFrames::new(window.clone());
        let handler = Rc::new(RefCell::new(PointerHandler::new(
            config,
            callbacks,
            frames.clone(),
        )));
        frames.bind(&handler);

        let _ = element.class_list().add_1(SURFACE_CLASS);

        let mut binding = Self {
            handler,
            element: element.clone(),
            element_listeners: Vec::new(),
            document_listeners: Vec::new(),
        };
        let element_target: &EventTarget = element.as_ref();
        let document_target: &EventTarget = document.as_ref();

        binding.element_listeners.push(listen_touch_start(element_target, &binding.handler)?);
        binding.element_listeners.push(listen(
            element_target,
            "mousedown",
            &binding.handler,
            |handler, event| {
                let Some(mouse) = event.dyn_ref::<MouseEvent>() else {
                    return;
                };
                if mouse.button() != 0 {
                    return;
                }
                match event_position(&event, 0) {
                    Ok(position) => {
                        if handler.mouse_down(position).prevent_default {
                            event.prevent_default();
                        }
                    }
                    Err(err) => log::warn!("{err}"),
                }
            },
        )?);
        binding.element_listeners.push(listen(
            element_target,
            "click",
            &binding.handler,
            |handler, event| match event_position(&event, 0) {
                Ok(position) => handler.click(position),
                Err(err) => log::warn!("{err}"),
            },
        )?);

        binding.document_listeners.push(listen(
            document_target,
            "touchmove",
            &binding.handler,
            |handler, event| {
                if let Some(touch_event) = event.dyn_ref::<TouchEvent>() {
                    handler.touch_move(&touch_positions(&touch_event.touches()));
                }
            },
        )?);
        binding.document_listeners.push(listen(
            document_target,
            "touchend",
            &binding.handler,
            |handler, event| {
                if let Some(touch_event) = event.dyn_ref::<TouchEvent>() {
                    handler.touch_end(&touch_positions(&touch_event.touches()));
                }
            },
        )?);
        binding.document_listeners.push(listen(
            document_target,
            "touchcancel",
            &binding.handler,
            |handler, _event| handler.touch_cancel(),
        )?);
        binding.document_listeners.push(listen(
            document_target,
            "mousemove",
            &binding.handler,
            |handler, event| {
                if let Ok(position) = event_position(&event, 0) {
                    handler.mouse_move(position);
                }
            },
        )?);
        binding.document_listeners.push(listen(
            document_target,
            "mouseup",
            &binding.handler,
            |handler, _event| handler.mouse_up(),
        )?);

        Ok(binding)
    }

    pub fn is_attached(&self) -> bool {
        !self.element_listeners.is_empty() || !self.document_listeners.is_empty()
    }

    /// Removes every listener and drops any pending long-press frame.
    pub fn detach(&mut self) {
        if !self.is_attached() {
            return;
        }
        for listener in self
            .element_listeners
            .drain(..)
            .chain(self.document_listeners.drain(..))
        {
            listener.remove();
        }
        let _ = self.element.class_list().remove_1(SURFACE_CLASS);
        match self.handler.try_borrow_mut() {
            Ok(mut handler) => handler.reset(),
            Err(_) => log::warn!("detached while handler was busy"),
        }
    }
}

impl Drop for PointerBinding {
    fn drop(&mut self) {
        self.detach();
    }
}

fn listen(
    target: &EventTarget,
    event: &'static str,
    handler: &SharedHandler,
    mut on_event: impl FnMut(&mut PointerHandler<BrowserFrames>, Event) + 'static,
) -> Result<Listener, JsValue> {
    let handler = Rc::downgrade(handler);
    let closure = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
        let Some(handler) = handler.upgrade() else {
            return;
        };
        let Ok(mut handler) = handler.try_borrow_mut() else {
            log::warn!("{} ignored: handler busy", event.type_());
            return;
        };
        on_event(&mut handler, event);
    });
    target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
    Ok(Listener {
        target: target.clone(),
        event,
        closure,
    })
}

/// `touchstart` is registered non-passive so it may cancel scrolling and
/// zooming.
fn listen_touch_start(target: &EventTarget, handler: &SharedHandler) -> Result<Listener, JsValue> {
    let handler = Rc::downgrade(handler);
    let closure = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
        let Some(handler) = handler.upgrade() else {
            return;
        };
        let Some(touch_event) = event.dyn_ref::<TouchEvent>() else {
            return;
        };
        let touches = touch_positions(&touch_event.touches());
        let clickable = is_clickable_element(event.target());
        let response = match handler.try_borrow_mut() {
            Ok(mut handler) => handler.touch_start(&touches, clickable),
            Err(_) => {
                log::warn!("touchstart ignored: handler busy");
                return;
            }
        };
        if response.prevent_default {
            event.prevent_default();
        }
    });
    let options = AddEventListenerOptions::new();
    options.set_passive(false);
    target.add_event_listener_with_callback_and_add_event_listener_options(
        "touchstart",
        closure.as_ref().unchecked_ref(),
        &options,
    )?;
    Ok(Listener {
        target: target.clone(),
        event: "touchstart",
        closure,
    })
}
