//! Browser host (wasm32 only)
//!
//! Frames map to `requestAnimationFrame`, timers to `setTimeout`. Repeating
//! timers are chained timeouts so no long-lived closure has to be freed.
//! Every browser callback is a one-shot closure that checks whether its
//! request is still live before dispatching, so a cancelled request that
//! fires anyway is ignored.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use super::{MIN_PERIOD_MS, Scheduler, TaskId, Wakeup};

/// Receives every wakeup with its timestamp
pub type Dispatch = Rc<dyn Fn(Wakeup, f64)>;

#[derive(Debug, Clone, Copy)]
enum Handle {
    Frame(i32),
    Timeout(i32),
}

#[derive(Default)]
struct Shared {
    live: HashMap<TaskId, Handle>,
    dispatch: Option<Dispatch>,
}

pub struct WebScheduler {
    window: web_sys::Window,
    next_id: TaskId,
    shared: Rc<RefCell<Shared>>,
}

impl WebScheduler {
    pub fn new(window: web_sys::Window) -> Self {
        Self {
            window,
            next_id: 1,
            shared: Rc::new(RefCell::new(Shared::default())),
        }
    }

    /// Install the wakeup handler. Requests fired before this are dropped.
    pub fn set_dispatch(&mut self, dispatch: Dispatch) {
        self.shared.borrow_mut().dispatch = Some(dispatch);
    }

    fn allocate(&mut self) -> TaskId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

fn now_ms(window: &web_sys::Window) -> f64 {
    window
        .performance()
        .map(|p| p.now())
        .unwrap_or_else(js_sys::Date::now)
}

fn arm_timeout(
    window: &web_sys::Window,
    shared: &Rc<RefCell<Shared>>,
    id: TaskId,
    delay_ms: f64,
    period_ms: Option<f64>,
    wakeup: Wakeup,
) -> Option<i32> {
    let window_cb = window.clone();
    let shared_cb = shared.clone();
    let callback = Closure::once_into_js(move || {
        on_timeout(&window_cb, &shared_cb, id, period_ms, wakeup);
    });
    window
        .set_timeout_with_callback_and_timeout_and_arguments_0(
            callback.unchecked_ref(),
            delay_ms.max(0.0).round() as i32,
        )
        .map_err(|e| log::warn!("setTimeout failed: {:?}", e))
        .ok()
}

fn on_timeout(
    window: &web_sys::Window,
    shared: &Rc<RefCell<Shared>>,
    id: TaskId,
    period_ms: Option<f64>,
    wakeup: Wakeup,
) {
    let dispatch = {
        let mut state = shared.borrow_mut();
        if !state.live.contains_key(&id) {
            return;
        }
        // Re-arm before dispatching so the handler can cancel the next firing
        let next = period_ms.and_then(|period| arm_timeout(window, shared, id, period, Some(period), wakeup));
        match next {
            Some(handle) => {
                state.live.insert(id, Handle::Timeout(handle));
            }
            None => {
                state.live.remove(&id);
            }
        }
        state.dispatch.clone()
    };
    if let Some(dispatch) = dispatch {
        dispatch(wakeup, now_ms(window));
    }
}

fn on_frame(shared: &Rc<RefCell<Shared>>, id: TaskId, timestamp: f64, wakeup: Wakeup) {
    let dispatch = {
        let mut state = shared.borrow_mut();
        if state.live.remove(&id).is_none() {
            return;
        }
        state.dispatch.clone()
    };
    if let Some(dispatch) = dispatch {
        dispatch(wakeup, timestamp);
    }
}

impl Scheduler for WebScheduler {
    fn now(&self) -> f64 {
        now_ms(&self.window)
    }

    fn request_frame(&mut self, wakeup: Wakeup) -> TaskId {
        let id = self.allocate();
        let shared_cb = self.shared.clone();
        let callback = Closure::once_into_js(move |timestamp: f64| {
            on_frame(&shared_cb, id, timestamp, wakeup);
        });
        match self.window.request_animation_frame(callback.unchecked_ref()) {
            Ok(handle) => {
                self.shared.borrow_mut().live.insert(id, Handle::Frame(handle));
            }
            Err(e) => log::warn!("requestAnimationFrame failed: {:?}", e),
        }
        id
    }

    fn set_timeout(&mut self, delay_ms: f64, wakeup: Wakeup) -> TaskId {
        let id = self.allocate();
        if let Some(handle) = arm_timeout(&self.window, &self.shared, id, delay_ms, None, wakeup) {
            self.shared.borrow_mut().live.insert(id, Handle::Timeout(handle));
        }
        id
    }

    fn set_interval(&mut self, period_ms: f64, wakeup: Wakeup) -> TaskId {
        let id = self.allocate();
        let period = period_ms.max(MIN_PERIOD_MS);
        if let Some(handle) = arm_timeout(&self.window, &self.shared, id, period, Some(period), wakeup) {
            self.shared.borrow_mut().live.insert(id, Handle::Timeout(handle));
        }
        id
    }

    fn cancel(&mut self, id: TaskId) {
        let handle = self.shared.borrow_mut().live.remove(&id);
        match handle {
            Some(Handle::Frame(h)) => {
                let _ = self.window.cancel_animation_frame(h);
            }
            Some(Handle::Timeout(h)) => self.window.clear_timeout_with_handle(h),
            None => {}
        }
    }
}
