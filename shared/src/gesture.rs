//! Unified pointer/gesture recognizer.
//!
//! [`PointerHandler`] turns normalised mouse and touch input into press, drag,
//! long-press, pinch and tap callbacks. It knows nothing about the DOM: the
//! host feeds it positions and delivers frame callbacks from its
//! [`FrameScheduler`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::frame::{FrameHandle, FrameScheduler};
use crate::geometry::{chebyshev, distance};
use crate::indicator::{DEFAULT_INDICATOR_SIZE, DEFAULT_INDICATOR_WIDTH};
use crate::pinch::{PinchSession, MIN_PINCH_DISTANCE};
use crate::{Point, PointPair};

pub const DEFAULT_DURATION_MS: f64 = 1000.0;
pub const DEFAULT_MOVE_THRESHOLD: f64 = 30.0;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GestureError {
    #[error("unsupported event for position lookup: {0}")]
    UnsupportedEvent(String),
    #[error("expected {expected} touches but got {actual}")]
    TouchCount { expected: usize, actual: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GestureConfig {
    pub duration_ms: f64,
    pub move_threshold: f64,
    pub containing: bool,
    pub size: f64,
    pub width: f64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            duration_ms: DEFAULT_DURATION_MS,
            move_threshold: DEFAULT_MOVE_THRESHOLD,
            containing: true,
            size: DEFAULT_INDICATOR_SIZE,
            width: DEFAULT_INDICATOR_WIDTH,
        }
    }
}

impl GestureConfig {
    /// Replaces zero, negative or non-finite values with the defaults.
    pub fn normalized(self) -> Self {
        fn positive_or(value: f64, fallback: f64) -> f64 {
            if value.is_finite() && value > 0.0 {
                value
            } else {
                fallback
            }
        }
        Self {
            duration_ms: positive_or(self.duration_ms, DEFAULT_DURATION_MS),
            move_threshold: positive_or(self.move_threshold, DEFAULT_MOVE_THRESHOLD),
            containing: self.containing,
            size: positive_or(self.size, DEFAULT_INDICATOR_SIZE),
            width: positive_or(self.width, DEFAULT_INDICATOR_WIDTH),
        }
    }
}

/// Long-press ring progress: blank for the first half of the hold, then
/// linear up to 1 at `duration_ms`.
pub fn long_press_progress(elapsed_ms: f64, duration_ms: f64) -> f64 {
    if duration_ms <= 0.0 {
        return 1.0;
    }
    let half = duration_ms / 2.0;
    (elapsed_ms - half).max(0.0) / half
}

type PointCallback = Box<dyn FnMut(Point)>;
type PointMoveCallback = Box<dyn FnMut(Point, Point)>;
type PairCallback = Box<dyn FnMut(PointPair)>;
type PinchMoveCallback = Box<dyn FnMut(PointPair, &PinchSession)>;
type UnitCallback = Box<dyn FnMut()>;
type ProgressCallback = Box<dyn FnMut(f64)>;

/// Optional gesture callbacks. Anything left unset is simply not called.
#[derive(Default)]
pub struct GestureCallbacks {
    on_point_start: Option<PointCallback>,
    on_point_move: Option<PointMoveCallback>,
    on_point_end: Option<UnitCallback>,
    on_point_cancel: Option<UnitCallback>,
    on_long_point: Option<UnitCallback>,
    on_pinch_start: Option<PairCallback>,
    on_pinch_move: Option<PinchMoveCallback>,
    on_pinch_end: Option<UnitCallback>,
    on_press: Option<PointCallback>,
    on_progress: Option<ProgressCallback>,
}

impl GestureCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_point_start(mut self, callback: impl FnMut(Point) + 'static) -> Self {
        self.on_point_start = Some(Box::new(callback));
        self
    }

    /// Called with the current position and the position the press started at.
    pub fn on_point_move(mut self, callback: impl FnMut(Point, Point) + 'static) -> Self {
        self.on_point_move = Some(Box::new(callback));
        self
    }

    pub fn on_point_end(mut self, callback: impl FnMut() + 'static) -> Self {
        self.on_point_end = Some(Box::new(callback));
        self
    }

    pub fn on_point_cancel(mut self, callback: impl FnMut() + 'static) -> Self {
        self.on_point_cancel = Some(Box::new(callback));
        self
    }

    /// Registering this is what arms the long-press timer.
    pub fn on_long_point(mut self, callback: impl FnMut() + 'static) -> Self {
        self.on_long_point = Some(Box::new(callback));
        self
    }

    pub fn on_pinch_start(mut self, callback: impl FnMut(PointPair) + 'static) -> Self {
        self.on_pinch_start = Some(Box::new(callback));
        self
    }

    pub fn on_pinch_move(
        mut self,
        callback: impl FnMut(PointPair, &PinchSession) + 'static,
    ) -> Self {
        self.on_pinch_move = Some(Box::new(callback));
        self
    }

    pub fn on_pinch_end(mut self, callback: impl FnMut() + 'static) -> Self {
        self.on_pinch_end = Some(Box::new(callback));
        self
    }

    pub fn on_press(mut self, callback: impl FnMut(Point) + 'static) -> Self {
        self.on_press = Some(Box::new(callback));
        self
    }

    pub fn on_progress(mut self, callback: impl FnMut(f64) + 'static) -> Self {
        self.on_progress = Some(Box::new(callback));
        self
    }
}

/// Whether the host should call `preventDefault()` on the native event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InputResponse {
    pub prevent_default: bool,
}

impl InputResponse {
    pub const PREVENT: Self = Self {
        prevent_default: true,
    };
    pub const ALLOW: Self = Self {
        prevent_default: false,
    };
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PointerSession {
    start_position: Point,
    started_at_ms: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum HandlerState {
    Idle,
    Pressing {
        session: PointerSession,
        timer: Option<FrameHandle>,
    },
    Pinching {
        pinch: PinchSession,
    },
}

pub struct PointerHandler<S: FrameScheduler> {
    config: GestureConfig,
    callbacks: GestureCallbacks,
    scheduler: S,
    state: HandlerState,
    progress: f64,
}

impl<S: FrameScheduler> PointerHandler<S> {
    pub fn new(config: GestureConfig, callbacks: GestureCallbacks, scheduler: S) -> Self {
        Self {
            config: config.normalized(),
            callbacks,
            scheduler,
            state: HandlerState::Idle,
            progress: 0.0,
        }
    }

    pub fn is_pressing(&self) -> bool {
        matches!(self.state, HandlerState::Pressing { .. })
    }

    pub fn is_long_pressing(&self) -> bool {
        matches!(
            self.state,
            HandlerState::Pressing {
                timer: Some(_),
                ..
            }
        )
    }

    pub fn is_pinching(&self) -> bool {
        matches!(self.state, HandlerState::Pinching { .. })
    }

    pub fn pinch(&self) -> Option<&PinchSession> {
        match &self.state {
            HandlerState::Pinching { pinch } => Some(pinch),
            _ => None,
        }
    }

    pub fn long_press_progress(&self) -> f64 {
        self.progress
    }

    // Native-ish input. Hosts translate browser events into these calls.

    pub fn mouse_down(&mut self, position: Point) -> InputResponse {
        self.start_pressing(position);
        InputResponse::PREVENT
    }

    pub fn mouse_move(&mut self, position: Point) {
        if self.is_pressing() {
            self.move_pressing(position);
        }
    }

    pub fn mouse_up(&mut self) {
        self.release();
    }

    /// `touches` is every touch currently on the surface, in browser order.
    pub fn touch_start(&mut self, touches: &[Point], target_clickable: bool) -> InputResponse {
        if self.is_pinching() && touches.len() != 2 {
            log::debug!("pinch ended by touch count {}", touches.len());
            self.stop_pinching();
            return InputResponse::ALLOW;
        }
        match touches {
            [position] => {
                if target_clickable {
                    return InputResponse::ALLOW;
                }
                let prevent_default = self.callbacks.on_press.is_none();
                self.start_pressing(*position);
                InputResponse { prevent_default }
            }
            [first, second] if self.is_pressing() => {
                self.start_pinching((*first, *second));
                InputResponse::PREVENT
            }
            _ => InputResponse::ALLOW,
        }
    }

    pub fn touch_move(&mut self, touches: &[Point]) {
        match (self.is_pressing(), self.is_pinching(), touches) {
            (false, false, _) => {}
            (true, _, [position]) => self.move_pressing(*position),
            (_, true, [first, second]) => {
                self.move_pinching((*first, *second));
            }
            (true, _, _) => {
                let error = GestureError::TouchCount {
                    expected: 1,
                    actual: touches.len(),
                };
                log::warn!("press aborted: {error}");
                self.cancel_pressing();
            }
            (_, true, _) => {
                let error = GestureError::TouchCount {
                    expected: 2,
                    actual: touches.len(),
                };
                log::warn!("pinch aborted: {error}");
                self.stop_pinching();
            }
        }
    }

    /// `remaining` is the touches still down after the lift.
    pub fn touch_end(&mut self, remaining: &[Point]) {
        if self.is_pinching() && remaining.len() == 2 {
            return;
        }
        self.release();
    }

    pub fn touch_cancel(&mut self) {
        self.stop_long_pressing();
        self.cancel_pressing();
        self.stop_pinching();
        self.set_progress(0.0);
    }

    pub fn click(&mut self, position: Point) {
        if let Some(callback) = self.callbacks.on_press.as_mut() {
            callback(position);
        }
    }

    /// Delivers a frame requested from the scheduler. Frames that are no
    /// longer the live long-press timer are ignored.
    pub fn on_frame(&mut self, handle: FrameHandle) {
        match &mut self.state {
            HandlerState::Pressing { timer, .. } if *timer == Some(handle) => {
                *timer = None;
            }
            _ => return,
        }
        self.progress_long_pressing();
    }

    /// Drops any gesture and pending frame without notifying callbacks.
    pub fn reset(&mut self) {
        if let HandlerState::Pressing {
            timer: Some(handle),
            ..
        } = self.state
        {
            self.scheduler.cancel_frame(handle);
        }
        self.state = HandlerState::Idle;
        self.progress = 0.0;
    }

    // Semantic transitions.

    pub fn start_pressing(&mut self, position: Point) {
        if !matches!(self.state, HandlerState::Idle) {
            return;
        }
        self.state = HandlerState::Pressing {
            session: PointerSession {
                start_position: position,
                started_at_ms: self.scheduler.now_ms(),
            },
            timer: None,
        };
        self.set_progress(0.0);

        if let Some(callback) = self.callbacks.on_point_start.as_mut() {
            callback(position);
        }

        if self.callbacks.on_long_point.is_some() {
            self.progress_long_pressing();
        }
    }

    pub fn move_pressing(&mut self, position: Point) {
        let HandlerState::Pressing { session, timer } = &self.state else {
            return;
        };
        let start = session.start_position;
        let long_pressing = timer.is_some();

        if let Some(callback) = self.callbacks.on_point_move.as_mut() {
            callback(position, start);
        }

        if long_pressing && chebyshev(start, position) > self.config.move_threshold {
            self.stop_long_pressing();
        }
    }

    pub fn stop_pressing(&mut self) {
        if !self.is_pressing() {
            return;
        }
        self.stop_long_pressing();
        self.state = HandlerState::Idle;
        if let Some(callback) = self.callbacks.on_point_end.as_mut() {
            callback();
        }
    }

    pub fn cancel_pressing(&mut self) {
        if !self.is_pressing() {
            return;
        }
        self.stop_long_pressing();
        self.state = HandlerState::Idle;
        if let Some(callback) = self.callbacks.on_point_cancel.as_mut() {
            callback();
        }
    }

    pub fn start_pinching(&mut self, positions: PointPair) {
        if self.is_pinching() {
            return;
        }
        self.stop_long_pressing();
        self.cancel_pressing();

        self.state = HandlerState::Pinching {
            pinch: PinchSession::new(positions),
        };
        if let Some(callback) = self.callbacks.on_pinch_start.as_mut() {
            callback(positions);
        }
    }

    pub fn move_pinching(&mut self, positions: PointPair) {
        let HandlerState::Pinching { pinch } = &mut self.state else {
            return;
        };
        if pinch.is_degenerate() {
            if distance(positions.0, positions.1) >= MIN_PINCH_DISTANCE {
                log::debug!("pinch re-anchored after degenerate start");
                *pinch = PinchSession::new(positions);
            }
            return;
        }
        let pinch = *pinch;
        if let Some(callback) = self.callbacks.on_pinch_move.as_mut() {
            callback(positions, &pinch);
        }
    }

    pub fn stop_pinching(&mut self) {
        if !self.is_pinching() {
            return;
        }
        self.state = HandlerState::Idle;
        if let Some(callback) = self.callbacks.on_pinch_end.as_mut() {
            callback();
        }
    }

    fn release(&mut self) {
        self.stop_long_pressing();
        self.stop_pressing();
        self.stop_pinching();
        self.set_progress(0.0);
    }

    fn progress_long_pressing(&mut self) {
        let HandlerState::Pressing { session, .. } = &self.state else {
            return;
        };
        let duration = self.config.duration_ms;
        let elapsed = self.scheduler.now_ms() - session.started_at_ms;
        self.set_progress(long_press_progress(elapsed, duration));

        if elapsed / duration < 1.0 {
            let handle = self.scheduler.request_frame();
            if let HandlerState::Pressing { timer, .. } = &mut self.state {
                *timer = Some(handle);
            }
            return;
        }

        log::debug!("long press completed after {elapsed}ms");
        self.cancel_pressing();
        if let Some(callback) = self.callbacks.on_long_point.as_mut() {
            callback();
        }
    }

    /// Kills the long-press timer, if any, and blanks the indicator.
    fn stop_long_pressing(&mut self) {
        let HandlerState::Pressing { timer, .. } = &mut self.state else {
            return;
        };
        let Some(handle) = timer.take() else {
            return;
        };
        self.scheduler.cancel_frame(handle);
        self.set_progress(0.0);
    }

    fn set_progress(&mut self, progress: f64) {
        if self.progress == progress {
            return;
        }
        self.progress = progress;
        if let Some(callback) = self.callbacks.on_progress.as_mut() {
            callback(progress);
        }
    }
}

impl<S: FrameScheduler> Drop for PointerHandler<S> {
    fn drop(&mut self) {
        self.reset();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::frame::ManualFrames;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Start(Point),
        Move(Point, Point),
        End,
        Cancel,
        LongPoint,
        PinchStart(PointPair),
        PinchMove(PointPair),
        PinchEnd,
        Press(Point),
    }

    type Log = Rc<RefCell<Vec<Call>>>;

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    fn recording(log: &Log) -> GestureCallbacks {
        let start = log.clone();
        let moved = log.clone();
        let end = log.clone();
        let cancel = log.clone();
        let long = log.clone();
        let pinch_start = log.clone();
        let pinch_move = log.clone();
        let pinch_end = log.clone();
        let press = log.clone();
        GestureCallbacks::new()
            .on_point_start(move |pos| start.borrow_mut().push(Call::Start(pos)))
            .on_point_move(move |pos, from| moved.borrow_mut().push(Call::Move(pos, from)))
            .on_point_end(move || end.borrow_mut().push(Call::End))
            .on_point_cancel(move || cancel.borrow_mut().push(Call::Cancel))
            .on_long_point(move || long.borrow_mut().push(Call::LongPoint))
            .on_pinch_start(move |pair| pinch_start.borrow_mut().push(Call::PinchStart(pair)))
            .on_pinch_move(move |pair, _| pinch_move.borrow_mut().push(Call::PinchMove(pair)))
            .on_pinch_end(move || pinch_end.borrow_mut().push(Call::PinchEnd))
            .on_press(move |pos| press.borrow_mut().push(Call::Press(pos)))
    }

    fn handler_with(callbacks: GestureCallbacks) -> (PointerHandler<ManualFrames>, ManualFrames) {
        let frames = ManualFrames::new();
        let handler = PointerHandler::new(GestureConfig::default(), callbacks, frames.clone());
        (handler, frames)
    }

    fn recorded() -> (PointerHandler<ManualFrames>, ManualFrames, Log) {
        let log: Log = Rc::default();
        let (handler, frames) = handler_with(recording(&log));
        (handler, frames, log)
    }

    /// Steps the clock in 16ms frames, delivering every pending frame, until
    /// `until_ms` is reached or nothing is pending.
    fn run_frames(handler: &mut PointerHandler<ManualFrames>, frames: &ManualFrames, until_ms: f64) {
        while frames.now_ms() < until_ms {
            let pending = frames.take_pending();
            if pending.is_empty() {
                frames.set_now(until_ms);
                break;
            }
            frames.advance(16.0);
            for handle in pending {
                handler.on_frame(handle);
            }
        }
    }

    #[test]
    fn press_move_release_in_order() {
        let (mut handler, _frames, log) = recorded();
        handler.start_pressing(p(10.0, 20.0));
        handler.move_pressing(p(123.0, 234.0));
        handler.stop_pressing();
        assert_eq!(
            *log.borrow(),
            vec![
                Call::Start(p(10.0, 20.0)),
                Call::Move(p(123.0, 234.0), p(10.0, 20.0)),
                Call::End,
            ]
        );
        assert!(!handler.is_pressing());
    }

    #[test]
    fn mouse_input_reaches_the_same_callbacks() {
        let (mut handler, _frames, log) = recorded();
        assert!(handler.mouse_down(p(10.0, 20.0)).prevent_default);
        handler.mouse_move(p(123.0, 234.0));
        handler.mouse_up();
        handler.mouse_move(p(1.0, 1.0));
        assert_eq!(
            *log.borrow(),
            vec![
                Call::Start(p(10.0, 20.0)),
                Call::Move(p(123.0, 234.0), p(10.0, 20.0)),
                Call::End,
            ]
        );
    }

    #[test]
    fn works_without_any_callbacks() {
        let (mut handler, frames) = handler_with(GestureCallbacks::new());
        handler.start_pressing(p(10.0, 20.0));
        handler.move_pressing(p(123.0, 234.0));
        handler.cancel_pressing();
        handler.touch_start(&[p(0.0, 0.0)], false);
        handler.touch_start(&[p(0.0, 0.0), p(50.0, 0.0)], false);
        handler.touch_move(&[p(0.0, 0.0), p(80.0, 0.0)]);
        handler.touch_end(&[]);
        handler.click(p(1.0, 1.0));
        assert!(frames.pending().is_empty());
    }

    #[test]
    fn long_press_cancels_then_fires_once() {
        let (mut handler, frames, log) = recorded();
        handler.touch_start(&[p(5.0, 5.0)], false);
        assert!(handler.is_long_pressing());
        run_frames(&mut handler, &frames, 1500.0);

        assert_eq!(
            *log.borrow(),
            vec![Call::Start(p(5.0, 5.0)), Call::Cancel, Call::LongPoint]
        );
        assert!(!handler.is_pressing());
        assert!(frames.pending().is_empty());
        assert!(handler.long_press_progress() >= 1.0);

        handler.touch_end(&[]);
        assert_eq!(handler.long_press_progress(), 0.0);
        assert_eq!(log.borrow().len(), 3);
    }

    #[test]
    fn long_press_needs_the_full_duration() {
        let (mut handler, frames, log) = recorded();
        handler.mouse_down(p(0.0, 0.0));
        run_frames(&mut handler, &frames, 990.0);
        assert!(handler.is_long_pressing());
        assert!(!log.borrow().contains(&Call::LongPoint));
        handler.mouse_up();
        assert_eq!(log.borrow().last(), Some(&Call::End));
        assert!(frames.pending().is_empty());
    }

    #[test]
    fn drifting_past_threshold_aborts_long_press() {
        let (mut handler, frames, log) = recorded();
        handler.mouse_down(p(100.0, 100.0));
        run_frames(&mut handler, &frames, 600.0);
        assert!(handler.long_press_progress() > 0.0);

        handler.mouse_move(p(120.0, 131.0));
        assert!(!handler.is_long_pressing());
        assert!(handler.is_pressing());
        assert_eq!(handler.long_press_progress(), 0.0);
        assert!(frames.pending().is_empty());

        frames.set_now(5000.0);
        handler.mouse_up();
        assert!(!log.borrow().contains(&Call::LongPoint));
        assert_eq!(log.borrow().last(), Some(&Call::End));
    }

    #[test]
    fn drift_uses_chebyshev_distance() {
        let (mut handler, _frames, _log) = recorded();
        handler.mouse_down(p(0.0, 0.0));
        // Euclidean ~42, but neither axis exceeds 30.
        handler.mouse_move(p(30.0, 30.0));
        assert!(handler.is_long_pressing());
        handler.mouse_move(p(-30.5, 0.0));
        assert!(!handler.is_long_pressing());
    }

    #[test]
    fn progress_formula() {
        let d = 1000.0;
        assert_eq!(long_press_progress(0.0, d), 0.0);
        assert_eq!(long_press_progress(d / 2.0, d), 0.0);
        assert_eq!(long_press_progress(750.0, d), 0.5);
        assert_eq!(long_press_progress(d, d), 1.0);
        for elapsed in [0.0, 123.0, 499.0, 500.0, 501.0, 900.0, 1000.0] {
            let expected = (elapsed - d / 2.0).max(0.0) / (d / 2.0);
            assert_eq!(long_press_progress(elapsed, d), expected);
        }
    }

    #[test]
    fn progress_is_reported_and_reset() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let (mut handler, frames) = handler_with(
            GestureCallbacks::new()
                .on_long_point(|| {})
                .on_progress(move |value| sink.borrow_mut().push(value)),
        );
        handler.mouse_down(p(0.0, 0.0));
        run_frames(&mut handler, &frames, 800.0);
        handler.mouse_move(p(100.0, 0.0));

        let seen = seen.borrow();
        assert!(seen.iter().any(|value| *value > 0.0 && *value < 1.0));
        assert_eq!(seen.last(), Some(&0.0));
    }

    #[test]
    fn second_touch_cancels_press_before_pinch() {
        let (mut handler, frames, log) = recorded();
        handler.touch_start(&[p(10.0, 10.0)], false);
        let response = handler.touch_start(&[p(10.0, 10.0), p(110.0, 10.0)], false);
        assert!(response.prevent_default);
        assert!(handler.is_pinching());
        assert!(frames.pending().is_empty());
        assert_eq!(
            *log.borrow(),
            vec![
                Call::Start(p(10.0, 10.0)),
                Call::Cancel,
                Call::PinchStart((p(10.0, 10.0), p(110.0, 10.0))),
            ]
        );
        assert!(!log.borrow().contains(&Call::End));
    }

    #[test]
    fn pinch_moves_then_ends_when_a_finger_lifts() {
        let (mut handler, _frames, log) = recorded();
        handler.touch_start(&[p(0.0, 0.0)], false);
        handler.touch_start(&[p(0.0, 0.0), p(100.0, 0.0)], false);
        handler.touch_move(&[p(0.0, 0.0), p(200.0, 0.0)]);
        assert_eq!(
            handler.pinch().map(|pinch| pinch.scale_delta((p(0.0, 0.0), p(200.0, 0.0)))),
            Some(2.0)
        );
        handler.touch_end(&[p(0.0, 0.0)]);
        handler.touch_move(&[p(5.0, 5.0)]);

        let log = log.borrow();
        assert_eq!(log[3], Call::PinchMove((p(0.0, 0.0), p(200.0, 0.0))));
        assert_eq!(log[4], Call::PinchEnd);
        assert_eq!(log.len(), 5);
        assert!(!handler.is_pinching());
        assert!(!handler.is_pressing());
    }

    #[test]
    fn third_touch_ends_pinch() {
        let (mut handler, _frames, log) = recorded();
        handler.touch_start(&[p(0.0, 0.0)], false);
        handler.touch_start(&[p(0.0, 0.0), p(100.0, 0.0)], false);
        handler.touch_start(&[p(0.0, 0.0), p(100.0, 0.0), p(50.0, 50.0)], false);
        assert_eq!(log.borrow().last(), Some(&Call::PinchEnd));
        assert!(!handler.is_pinching());
    }

    #[test]
    fn lifting_a_third_finger_keeps_pinch() {
        let (mut handler, _frames, log) = recorded();
        handler.touch_start(&[p(0.0, 0.0)], false);
        handler.touch_start(&[p(0.0, 0.0), p(100.0, 0.0)], false);
        handler.touch_end(&[p(0.0, 0.0), p(100.0, 0.0)]);
        assert!(handler.is_pinching());
        assert!(!log.borrow().contains(&Call::PinchEnd));
    }

    #[test]
    fn pinch_move_with_wrong_count_ends_pinch() {
        let (mut handler, _frames, log) = recorded();
        handler.touch_start(&[p(0.0, 0.0)], false);
        handler.touch_start(&[p(0.0, 0.0), p(100.0, 0.0)], false);
        handler.touch_move(&[p(0.0, 0.0), p(100.0, 0.0), p(1.0, 1.0)]);
        assert_eq!(log.borrow().last(), Some(&Call::PinchEnd));
        assert!(!handler.is_pinching());
    }

    #[test]
    fn two_touches_from_idle_are_ignored() {
        let (mut handler, _frames, log) = recorded();
        let response = handler.touch_start(&[p(0.0, 0.0), p(100.0, 0.0)], false);
        assert!(!response.prevent_default);
        assert!(!handler.is_pinching());
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn clickable_targets_are_left_alone() {
        let (mut handler, frames, log) = recorded();
        let response = handler.touch_start(&[p(0.0, 0.0)], true);
        assert!(!response.prevent_default);
        assert!(!handler.is_pressing());
        assert!(frames.pending().is_empty());
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn touch_start_prevents_default_only_without_press_callback() {
        let (mut handler, _frames) = handler_with(GestureCallbacks::new().on_point_start(|_| {}));
        assert!(handler.touch_start(&[p(0.0, 0.0)], false).prevent_default);

        let (mut handler, _frames) = handler_with(GestureCallbacks::new().on_press(|_| {}));
        assert!(!handler.touch_start(&[p(0.0, 0.0)], false).prevent_default);
        assert!(handler.is_pressing());
    }

    #[test]
    fn unexpected_touch_count_cancels_press() {
        let (mut handler, frames, log) = recorded();
        handler.touch_start(&[p(0.0, 0.0)], false);
        handler.touch_move(&[]);
        assert!(!handler.is_pressing());
        assert!(frames.pending().is_empty());
        assert_eq!(*log.borrow(), vec![Call::Start(p(0.0, 0.0)), Call::Cancel]);
    }

    #[test]
    fn touch_cancel_is_a_cancel_not_an_end() {
        let (mut handler, _frames, log) = recorded();
        handler.touch_start(&[p(3.0, 4.0)], false);
        handler.touch_cancel();
        assert_eq!(*log.borrow(), vec![Call::Start(p(3.0, 4.0)), Call::Cancel]);
    }

    #[test]
    fn cancel_is_idempotent() {
        let (mut handler, frames, log) = recorded();
        handler.start_pressing(p(10.0, 20.0));
        handler.cancel_pressing();
        handler.cancel_pressing();
        handler.stop_pressing();
        assert_eq!(*log.borrow(), vec![Call::Start(p(10.0, 20.0)), Call::Cancel]);
        assert!(frames.pending().is_empty());
    }

    #[test]
    fn press_callback_is_independent_of_press_machinery() {
        let taps = Rc::new(RefCell::new(Vec::new()));
        let sink = taps.clone();
        let (mut handler, frames) =
            handler_with(GestureCallbacks::new().on_press(move |pos| sink.borrow_mut().push(pos)));
        handler.click(p(7.0, 8.0));
        assert_eq!(*taps.borrow(), vec![p(7.0, 8.0)]);
        handler.mouse_down(p(7.0, 8.0));
        assert!(frames.pending().is_empty());

        let started = Rc::new(RefCell::new(0));
        let count = started.clone();
        let (mut handler, _frames) =
            handler_with(GestureCallbacks::new().on_point_start(move |_| *count.borrow_mut() += 1));
        handler.click(p(1.0, 1.0));
        assert_eq!(*started.borrow(), 0);
        handler.mouse_down(p(1.0, 1.0));
        assert_eq!(*started.borrow(), 1);
    }

    #[test]
    fn stale_frames_are_ignored() {
        let (mut handler, frames, log) = recorded();
        handler.mouse_down(p(0.0, 0.0));
        let stale = frames.pending();
        handler.mouse_up();
        frames.set_now(5000.0);
        for handle in stale.iter().copied() {
            handler.on_frame(handle);
        }
        handler.mouse_down(p(0.0, 0.0));
        frames.set_now(10_000.0);
        for handle in stale {
            handler.on_frame(handle);
        }
        assert!(handler.is_pressing());
        assert!(!log.borrow().contains(&Call::LongPoint));
    }

    #[test]
    fn degenerate_pinch_reanchors_before_moving() {
        let (mut handler, _frames, log) = recorded();
        handler.touch_start(&[p(50.0, 50.0)], false);
        handler.touch_start(&[p(50.0, 50.0), p(50.0, 50.0)], false);
        handler.touch_move(&[p(50.0, 50.0), p(50.2, 50.0)]);
        handler.touch_move(&[p(40.0, 50.0), p(60.0, 50.0)]);
        assert_eq!(handler.pinch().map(PinchSession::start_distance), Some(20.0));
        assert!(!log
            .borrow()
            .iter()
            .any(|call| matches!(call, Call::PinchMove(_))));

        handler.touch_move(&[p(30.0, 50.0), p(70.0, 50.0)]);
        assert_eq!(
            log.borrow().last(),
            Some(&Call::PinchMove((p(30.0, 50.0), p(70.0, 50.0))))
        );
    }

    #[test]
    fn reset_drops_pending_frame_silently() {
        let (mut handler, frames, log) = recorded();
        handler.mouse_down(p(0.0, 0.0));
        handler.reset();
        assert!(frames.pending().is_empty());
        assert!(!handler.is_pressing());
        assert_eq!(*log.borrow(), vec![Call::Start(p(0.0, 0.0))]);
    }

    #[test]
    fn config_falls_back_to_defaults() {
        let config: GestureConfig = serde_json::from_str(r#"{"moveThreshold": 12}"#).unwrap();
        assert_eq!(config.move_threshold, 12.0);
        assert_eq!(config.duration_ms, DEFAULT_DURATION_MS);
        assert!(config.containing);

        let zeroed = GestureConfig {
            duration_ms: 0.0,
            move_threshold: -1.0,
            ..GestureConfig::default()
        }
        .normalized();
        assert_eq!(zeroed.duration_ms, DEFAULT_DURATION_MS);
        assert_eq!(zeroed.move_threshold, DEFAULT_MOVE_THRESHOLD);
    }
}
