use std::cell::{Cell, RefCell};
use std::rc::Rc;

use js_sys::Reflect;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    CanvasRenderingContext2d, ClipboardEvent, Document, DragEvent, Element, Event, File,
    FileList, HtmlButtonElement, HtmlCanvasElement, HtmlElement, KeyboardEvent, TouchEvent,
    Window,
};

use sketchshare_shared::indicator::PressIndicator;
use sketchshare_shared::{GestureCallbacks, GestureConfig};

use crate::binding::PointerBinding;
use crate::canvas::{canvas_png, PaintCanvas};
use crate::dom::{client_rect, get_element, gesture_config, set_status, set_visible};
use crate::gallery::render_gallery;
use crate::launch::PaintSource;
use crate::net;
use crate::palette::{menu_action_from_event, render_brush_menu, MenuAction};
use crate::panels::Panels;
use crate::picture::{is_image_type, load_image, natural_size, read_image_file};
use crate::render::IndicatorView;
use crate::state::{State, Ui};

type SharedState = Rc<RefCell<State>>;

fn document_ready_state(document: &Document) -> Option<String> {
    Reflect::get(document.as_ref(), &JsValue::from_str("readyState"))
        .ok()?
        .as_string()
}

fn page_transition_persisted(event: &Event) -> Option<bool> {
    Reflect::get(event.as_ref(), &JsValue::from_str("persisted"))
        .ok()?
        .as_bool()
}

#[wasm_bindgen(start)]
pub fn run() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Debug).is_err() {
        web_sys::console::warn_1(&"logger already initialised".into());
    }

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("Missing window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("Missing document"))?;
    let started = Rc::new(Cell::new(false));

    if document_ready_state(&document).as_deref() == Some("complete") {
        started.set(true);
        return start_app();
    }

    let onload_started = started.clone();
    let onload = Closure::<dyn FnMut(Event)>::new(move |_| {
        if onload_started.replace(true) {
            return;
        }
        if let Err(err) = start_app() {
            log::error!("failed to start: {err:?}");
        }
    });
    window.add_event_listener_with_callback("load", onload.as_ref().unchecked_ref())?;
    onload.forget();

    Ok(())
}

fn start_app() -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("Missing window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("Missing document"))?;

    let host: HtmlElement = get_element(&document, "paint-host")?;
    let paint_el: HtmlCanvasElement = get_element(&document, "paint-canvas")?;
    let indicator_el: HtmlCanvasElement = get_element(&document, "press-indicator")?;
    let tutorial: HtmlElement = get_element(&document, "tutorial")?;
    let menu_overlay: HtmlElement = get_element(&document, "menu-overlay")?;
    let ui = Ui {
        menu: get_element(&document, "brush-menu")?,
        menu_overlay: menu_overlay.clone(),
        tutorial: tutorial.clone(),
        pinch_label: get_element(&document, "pinch-scale")?,
        history_list: get_element(&document, "history-list")?,
        undo_button: get_element(&document, "undo-button")?,
        redo_button: get_element(&document, "redo-button")?,
        status: get_element(&document, "status")?,
        panels: Panels::find(&document)?,
    };

    let config = gesture_config(&host);
    log::debug!("gesture config: {config:?}");

    let indicator_ctx = indicator_el
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("Missing indicator context"))?
        .dyn_into::<CanvasRenderingContext2d>()?;
    let mut indicator = IndicatorView::new(
        indicator_el,
        indicator_ctx,
        PressIndicator::new(config.size, config.width),
    );
    indicator.resize(&window);

    let search = window.location().search().unwrap_or_default();
    let source = PaintSource::from_search(&search);
    log::debug!("starting from {source:?}");
    let paint = PaintCanvas::new(host.clone(), paint_el, source.fixed_size())?;
    let state: SharedState = Rc::new(RefCell::new(State::new(paint, indicator, ui)));
    {
        let state = state.borrow();
        set_visible(&state.ui.menu, false);
        set_visible(&state.ui.menu_overlay, false);
        set_visible(&state.ui.pinch_label, false);
        state.ui.refresh_history_buttons(&state.paint);
    }

    let bindings: Rc<RefCell<Vec<PointerBinding>>> = Rc::default();
    bindings.borrow_mut().push(PointerBinding::attach(
        &window,
        &document,
        &host,
        config,
        paint_callbacks(&state, &host, config.containing),
    )?);
    bindings.borrow_mut().push(PointerBinding::attach(
        &window,
        &document,
        &tutorial,
        config,
        tutorial_callbacks(&state, &tutorial, config.containing),
    )?);
    bindings.borrow_mut().push(PointerBinding::attach(
        &window,
        &document,
        &menu_overlay,
        GestureConfig::default(),
        GestureCallbacks::new().on_press({
            let state = state.clone();
            move |_| close_menu(&state)
        }),
    )?);

    {
        // Two-finger touches anywhere must not zoom the page.
        let ontouchstart = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            let Some(touch_event) = event.dyn_ref::<TouchEvent>() else {
                return;
            };
            if touch_event.touches().length() >= 2 {
                event.prevent_default();
            }
        });
        let options = web_sys::AddEventListenerOptions::new();
        options.set_passive(false);
        document.add_event_listener_with_callback_and_add_event_listener_options(
            "touchstart",
            ontouchstart.as_ref().unchecked_ref(),
            &options,
        )?;
        ontouchstart.forget();
    }

    {
        let pagehide_bindings = bindings.clone();
        let onpagehide = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            if page_transition_persisted(&event) == Some(true) {
                return;
            }
            log::debug!("page hidden, detaching gesture handlers");
            pagehide_bindings.borrow_mut().clear();
        });
        window.add_event_listener_with_callback("pagehide", onpagehide.as_ref().unchecked_ref())?;
        onpagehide.forget();
    }

    {
        let resize_state = state.clone();
        let window_cb = window.clone();
        let onresize = Closure::<dyn FnMut()>::new(move || {
            let mut guard = resize_state.borrow_mut();
            let state = &mut *guard;
            state.indicator.resize(&window_cb);
            if let Err(err) = state.paint.fit_viewport() {
                log::error!("failed to follow resize: {err:?}");
            }
            state.ui.refresh_history_buttons(&state.paint);
        });
        window.add_event_listener_with_callback("resize", onresize.as_ref().unchecked_ref())?;
        onresize.forget();
    }

    {
        let menu_state = state.clone();
        let menu_window = window.clone();
        let menu_el = state.borrow().ui.menu.clone();
        let onclick = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            let Some(action) = menu_action_from_event(&event) else {
                return;
            };
            apply_menu_action(&menu_window, &menu_state, action);
        });
        menu_el.add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
        onclick.forget();
    }

    {
        let undo_state = state.clone();
        let undo_button: HtmlButtonElement = state.borrow().ui.undo_button.clone();
        let onclick = Closure::<dyn FnMut(Event)>::new(move |_| step_history(&undo_state, false));
        undo_button.add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
        onclick.forget();

        let redo_state = state.clone();
        let redo_button: HtmlButtonElement = state.borrow().ui.redo_button.clone();
        let onclick = Closure::<dyn FnMut(Event)>::new(move |_| step_history(&redo_state, true));
        redo_button.add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
        onclick.forget();
    }

    {
        let key_state = state.clone();
        let onkeydown = Closure::<dyn FnMut(KeyboardEvent)>::new(move |event: KeyboardEvent| {
            if !(event.meta_key() || event.ctrl_key()) {
                return;
            }
            let key = event.key();
            if key.eq_ignore_ascii_case("z") {
                event.prevent_default();
                step_history(&key_state, event.shift_key());
            } else if key.eq_ignore_ascii_case("y") {
                event.prevent_default();
                step_history(&key_state, true);
            }
        });
        window.add_event_listener_with_callback("keydown", onkeydown.as_ref().unchecked_ref())?;
        onkeydown.forget();
    }

    wire_panels(&document, &state)?;

    match source {
        PaintSource::Blank => {}
        PaintSource::Sized(_) => set_visible(&tutorial, false),
        PaintSource::Saved { uid, id } => {
            set_visible(&tutorial, false);
            wasm_bindgen_futures::spawn_local(reopen_image(state.clone(), uid, id));
        }
    }
    wasm_bindgen_futures::spawn_local(sign_in(window, state));

    Ok(())
}

fn wire_panels(document: &Document, state: &SharedState) -> Result<(), JsValue> {
    let (new_panel, open_panel, open_file, open_scale, open_confirm) = {
        let guard = state.borrow();
        let panels = &guard.ui.panels;
        (
            panels.new_panel.clone(),
            panels.open_panel.clone(),
            panels.open_file.clone(),
            panels.open_scale.clone(),
            panels.open_confirm.clone(),
        )
    };

    for panel in [new_panel, open_panel] {
        let dismissed = panel.clone();
        let onclick = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            let dismiss = event
                .target()
                .and_then(|target| target.dyn_into::<Element>().ok())
                .and_then(|element| element.closest("[data-dismiss]").ok().flatten());
            if dismiss.is_some() {
                set_visible(&dismissed, false);
            }
        });
        panel.add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
        onclick.forget();
    }

    {
        let file_state = state.clone();
        let input = open_file.clone();
        let onchange = Closure::<dyn FnMut(Event)>::new(move |_| {
            if let Some(file) = first_file(input.files()) {
                wasm_bindgen_futures::spawn_local(pick_file(file_state.clone(), file));
            }
        });
        open_file.add_event_listener_with_callback("change", onchange.as_ref().unchecked_ref())?;
        onchange.forget();
    }

    {
        let scale_state = state.clone();
        let oninput = Closure::<dyn FnMut(Event)>::new(move |_| {
            let guard = scale_state.borrow();
            if let Some(picked) = guard.picked.as_ref() {
                guard.ui.panels.show_summary(picked.natural);
            }
        });
        open_scale.add_event_listener_with_callback("input", oninput.as_ref().unchecked_ref())?;
        oninput.forget();
    }

    {
        let confirm_state = state.clone();
        let onclick = Closure::<dyn FnMut(Event)>::new(move |_| open_picked(&confirm_state));
        open_confirm.add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
        onclick.forget();
    }

    {
        let ondragover = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            event.prevent_default();
        });
        document.add_event_listener_with_callback("dragover", ondragover.as_ref().unchecked_ref())?;
        ondragover.forget();

        let drop_state = state.clone();
        let ondrop = Closure::<dyn FnMut(DragEvent)>::new(move |event: DragEvent| {
            event.prevent_default();
            let files = event.data_transfer().and_then(|data| data.files());
            match first_file(files) {
                Some(file) => wasm_bindgen_futures::spawn_local(pick_file(drop_state.clone(), file)),
                None => status(&drop_state, "error", "Drop an image file to open it"),
            }
        });
        document.add_event_listener_with_callback("drop", ondrop.as_ref().unchecked_ref())?;
        ondrop.forget();

        let paste_state = state.clone();
        let onpaste = Closure::<dyn FnMut(ClipboardEvent)>::new(move |event: ClipboardEvent| {
            let files = event.clipboard_data().and_then(|data| data.files());
            if let Some(file) = first_file(files) {
                event.prevent_default();
                wasm_bindgen_futures::spawn_local(pick_file(paste_state.clone(), file));
            }
        });
        document.add_event_listener_with_callback("paste", onpaste.as_ref().unchecked_ref())?;
        onpaste.forget();
    }

    Ok(())
}

fn first_file(files: Option<FileList>) -> Option<File> {
    files.and_then(|files| files.get(0))
}

async fn pick_file(state: SharedState, file: File) {
    if !is_image_type(&file.type_()) {
        log::warn!("ignoring {} of type {:?}", file.name(), file.type_());
        status(&state, "error", "That file is not an image");
        return;
    }
    status(&state, "busy", "Reading image…");
    match read_image_file(file).await {
        Ok(picked) => {
            let mut guard = state.borrow_mut();
            guard.ui.panels.show_picked(picked.natural);
            guard.picked = Some(picked);
            set_status(&guard.ui.status, "ready", "Choose a size and open");
        }
        Err(err) => {
            log::error!("cannot read image: {err:?}");
            status(&state, "error", "The image could not be read");
        }
    }
}

fn open_picked(state: &SharedState) {
    let mut guard = state.borrow_mut();
    let state = &mut *guard;
    let Some(picked) = state.picked.take() else {
        return;
    };
    let size = picked.natural.scaled_down(state.ui.panels.chosen_scale());
    match state.paint.open_image(&picked.image, size) {
        Ok(()) => log::info!("opened image at {}x{}", size.width, size.height),
        Err(err) => log::error!("cannot open image: {err:?}"),
    }
    state.ui.refresh_history_buttons(&state.paint);
    state.ui.panels.hide_all();
    set_visible(&state.ui.tutorial, false);
}

fn paint_callbacks(state: &SharedState, host: &HtmlElement, containing: bool) -> GestureCallbacks {
    GestureCallbacks::new()
        .on_point_start({
            let state = state.clone();
            let host = host.clone();
            move |position| {
                let mut guard = state.borrow_mut();
                let state = &mut *guard;
                state
                    .indicator
                    .set_position(position, containing.then(|| client_rect(&host)));
                state.paint.start_stroke(position, &state.brush);
            }
        })
        .on_point_move({
            let state = state.clone();
            move |position, _start| state.borrow_mut().paint.extend_stroke(position)
        })
        .on_point_end({
            let state = state.clone();
            move || {
                let mut guard = state.borrow_mut();
                let state = &mut *guard;
                if let Err(err) = state.paint.finish_stroke() {
                    log::error!("failed to keep stroke: {err:?}");
                }
                state.ui.refresh_history_buttons(&state.paint);
            }
        })
        .on_point_cancel({
            let state = state.clone();
            move || {
                if let Err(err) = state.borrow_mut().paint.discard_stroke() {
                    log::error!("failed to discard stroke: {err:?}");
                }
            }
        })
        .on_long_point({
            let state = state.clone();
            move || open_menu(&state)
        })
        .on_pinch_start({
            let state = state.clone();
            move |_positions| set_visible(&state.borrow().ui.pinch_label, true)
        })
        .on_pinch_move({
            let state = state.clone();
            move |positions, pinch| {
                let mut guard = state.borrow_mut();
                let state = &mut *guard;
                state.paint.update_pinch(positions, pinch);
                let label = format!("x{:.2}", state.paint.pinch_scale());
                state.ui.pinch_label.set_text_content(Some(&label));
            }
        })
        .on_pinch_end({
            let state = state.clone();
            move || {
                let mut guard = state.borrow_mut();
                guard.paint.end_pinch();
                set_visible(&guard.ui.pinch_label, false);
            }
        })
        .on_progress(progress_callback(state))
}

fn tutorial_callbacks(
    state: &SharedState,
    tutorial: &HtmlElement,
    containing: bool,
) -> GestureCallbacks {
    GestureCallbacks::new()
        .on_point_start({
            let state = state.clone();
            let tutorial = tutorial.clone();
            move |position| {
                state
                    .borrow_mut()
                    .indicator
                    .set_position(position, containing.then(|| client_rect(&tutorial)))
            }
        })
        .on_long_point({
            let state = state.clone();
            move || {
                set_visible(&state.borrow().ui.tutorial, false);
                open_menu(&state);
            }
        })
        .on_progress(progress_callback(state))
}

fn progress_callback(state: &SharedState) -> impl FnMut(f64) + 'static {
    let state = state.clone();
    move |progress| {
        state.borrow_mut().indicator.update(progress);
    }
}

fn open_menu(state: &SharedState) {
    let mut state = state.borrow_mut();
    if state.menu_open {
        return;
    }
    state.menu_open = true;
    if let Some(document) = state.ui.menu.owner_document() {
        render_brush_menu(&document, &state.ui.menu, &state.brush);
    }
    set_visible(&state.ui.menu_overlay, true);
    set_visible(&state.ui.menu, true);
}

fn close_menu(state: &SharedState) {
    let mut state = state.borrow_mut();
    if !state.menu_open {
        return;
    }
    state.menu_open = false;
    set_visible(&state.ui.menu, false);
    set_visible(&state.ui.menu_overlay, false);
}

fn apply_menu_action(window: &Window, state: &SharedState, action: MenuAction) {
    match action {
        MenuAction::Color(color) => state.borrow_mut().brush.color = color,
        MenuAction::Width(width) => state.borrow_mut().brush.width = width,
        MenuAction::New => {
            let guard = state.borrow();
            guard.ui.panels.show_new(guard.paint.viewport_size());
        }
        MenuAction::Open => {
            let mut guard = state.borrow_mut();
            guard.picked = None;
            guard.ui.panels.show_open();
        }
        MenuAction::Save => {
            wasm_bindgen_futures::spawn_local(save(window.clone(), state.clone()));
        }
    }
    close_menu(state);
}

fn step_history(state: &SharedState, forward: bool) {
    let mut guard = state.borrow_mut();
    let state = &mut *guard;
    let moved = if forward {
        state.paint.redo()
    } else {
        state.paint.undo()
    };
    match moved {
        Ok(true) => state.ui.refresh_history_buttons(&state.paint),
        Ok(false) => {}
        Err(err) => log::error!("failed to restore snapshot: {err:?}"),
    }
}

fn status(state: &SharedState, kind: &str, text: &str) {
    set_status(&state.borrow().ui.status, kind, text);
}

async fn sign_in(window: Window, state: SharedState) {
    status(&state, "busy", "Signing in…");
    let uid = match net::current_user(&window).await {
        Ok(uid) => uid,
        Err(err) => {
            log::error!("sign in failed: {err}");
            status(&state, "error", "Offline: drawings cannot be saved");
            return;
        }
    };
    state.borrow_mut().uid = Some(uid.clone());
    refresh_gallery(&window, &state, &uid).await;
    status(&state, "ready", "Long tap for the menu");
}

async fn refresh_gallery(window: &Window, state: &SharedState, uid: &str) {
    match net::list_images(uid).await {
        Ok(images) => {
            let guard = state.borrow();
            if let Some(document) = window.document() {
                render_gallery(&document, &guard.ui.history_list, uid, &images);
            }
        }
        Err(err) => log::warn!("could not list images: {err}"),
    }
}

async fn save(window: Window, state: SharedState) {
    let canvas = {
        let mut guard = state.borrow_mut();
        if guard.saving {
            return;
        }
        guard.saving = true;
        guard.paint.canvas().clone()
    };
    status(&state, "busy", "Saving…");

    let result = upload(&window, &state, canvas).await;
    state.borrow_mut().saving = false;
    match result {
        Ok(uid) => {
            refresh_gallery(&window, &state, &uid).await;
            status(&state, "ready", "Saved");
        }
        Err(message) => {
            log::error!("save failed: {message}");
            status(&state, "error", &message);
        }
    }
}

async fn upload(window: &Window, state: &SharedState, canvas: HtmlCanvasElement) -> Result<String, String> {
    let known_uid = state.borrow().uid.clone();
    let uid = match known_uid {
        Some(uid) => uid,
        None => {
            let uid = net::current_user(window).await.map_err(|err| err.to_string())?;
            state.borrow_mut().uid = Some(uid.clone());
            uid
        }
    };
    let png = canvas_png(canvas.clone())
        .await
        .map_err(|err| format!("could not encode canvas: {err:?}"))?;
    let uploaded = net::upload_image(&uid, &png, canvas.width(), canvas.height())
        .await
        .map_err(|err| err.to_string())?;
    log::info!("uploaded {} to {}", uploaded.id, uploaded.url);
    Ok(uid)
}

async fn reopen_image(state: SharedState, uid: String, id: String) {
    let record = match net::get_image(&uid, &id).await {
        Ok(record) => record,
        Err(err) => {
            log::warn!("cannot reopen {uid}/{id}: {err}");
            status(&state, "error", "That drawing could not be found");
            return;
        }
    };
    let opened = match load_image(&record.url).await {
        Ok(image) => natural_size(&image).and_then(|size| {
            let mut guard = state.borrow_mut();
            let state = &mut *guard;
            let opened = state.paint.open_image(&image, size);
            state.ui.refresh_history_buttons(&state.paint);
            opened
        }),
        Err(err) => Err(err),
    };
    if let Err(err) = opened {
        log::error!("cannot draw reopened image: {err:?}");
        status(&state, "error", "That drawing could not be opened");
    }
}
