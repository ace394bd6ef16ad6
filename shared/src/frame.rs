//! Frame clock used by the long-press timer.
//!
//! The browser host backs this with `requestAnimationFrame`; [`ManualFrames`]
//! lets tests and headless hosts step time by hand.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameHandle(pub u32);

pub trait FrameScheduler {
    /// Ask for one callback before the next repaint. The host must deliver it
    /// back through `PointerHandler::on_frame` with the returned handle.
    fn request_frame(&mut self) -> FrameHandle;
    fn cancel_frame(&mut self, handle: FrameHandle);
    fn now_ms(&self) -> f64;
}

#[derive(Default)]
struct ManualState {
    now_ms: f64,
    next_id: u32,
    pending: BTreeSet<FrameHandle>,
}

/// Scheduler whose clock only moves when told to. Clones share state.
#[derive(Clone, Default)]
pub struct ManualFrames {
    state: Rc<RefCell<ManualState>>,
}

impl ManualFrames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_now(&self, now_ms: f64) {
        self.state.borrow_mut().now_ms = now_ms;
    }

    pub fn advance(&self, delta_ms: f64) {
        self.state.borrow_mut().now_ms += delta_ms;
    }

    pub fn pending(&self) -> Vec<FrameHandle> {
        self.state.borrow().pending.iter().copied().collect()
    }

    /// Removes and returns every requested frame, oldest first.
    pub fn take_pending(&self) -> Vec<FrameHandle> {
        let mut state = self.state.borrow_mut();
        std::mem::take(&mut state.pending).into_iter().collect()
    }
}

impl FrameScheduler for ManualFrames {
    fn request_frame(&mut self) -> FrameHandle {
        let mut state = self.state.borrow_mut();
        state.next_id += 1;
        let handle = FrameHandle(state.next_id);
        state.pending.insert(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        self.state.borrow_mut().pending.remove(&handle);
    }

    fn now_ms(&self) -> f64 {
        self.state.borrow().now_ms
    }
}
