//! The image viewer coordinator.
//!
//! Owns one viewer's transform and transition state, turns gesture events
//! into render frames and navigation decisions, and moves the cursor once a
//! transition animation has played out. Time only moves when the host calls
//! [`Viewer::advance`].

#[cfg(test)]
mod tests;

use serde::Serialize;
use std::fmt;
use std::time::Duration;

use crate::cursor::ViewerCursor;
use crate::decision::{CompletedGesture, Direction, NavigationDecision, Neighbors, Thresholds};
use crate::geometry::{Point, Size};
use crate::gesture::{Arbitration, AxisArbiter, GestureEvent, GestureKind, GesturePhase, PanAxis};
use crate::item::{ItemId, ItemSummary};
use crate::source::{DetailState, FeedKey, ItemSource};
use crate::transform::{Feedback, Frame, Timings, TransformState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionState {
    Idle,
    Panning,
    Pinching,
    /// A dismiss or advance animation is running; gestures are ignored.
    Transitioning,
}

impl fmt::Display for TransitionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Panning => "panning",
            Self::Pinching => "pinching",
            Self::Transitioning => "transitioning",
        };
        f.write_str(name)
    }
}

/// Requests for the detail sheet that sits under the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SheetCommand {
    Close,
    SnapToFirst,
}

/// Host callbacks. Dismiss and advance fire at most once per completed gesture.
pub trait ViewerDelegate {
    fn on_dismiss(&mut self) {}

    fn on_advance(&mut self, _direction: Direction, _target: &ItemId) {}

    fn on_sheet(&mut self, _command: SheetCommand) {}
}

impl ViewerDelegate for () {}

/// All tunables for one viewer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewerSettings {
    pub thresholds: Thresholds,
    pub feedback: Feedback,
    pub timings: Timings,
    /// Orthogonal travel that hands a single-finger pan to the other axis.
    pub fail_offset: f32,
    /// Travel before a single-finger pan activates.
    pub min_distance: f32,
    pub prefetch: bool,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            feedback: Feedback::default(),
            timings: Timings::default(),
            fail_offset: 20.0,
            min_distance: 20.0,
            prefetch: true,
        }
    }
}

/// Which image to draw for the current item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageSource {
    /// Full-resolution image from the fetched detail.
    Detail(String),
    /// Low-resolution image the list already had.
    Placeholder(String),
    Missing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PendingSettle {
    Dismiss,
    Advance { direction: Direction, target: ItemId },
}

#[derive(Debug, Clone, Copy)]
struct PanSession {
    arbiter: AxisArbiter,
    axis: Option<PanAxis>,
}

pub struct Viewer<S: ItemSource, D: ViewerDelegate> {
    settings: ViewerSettings,
    source: S,
    delegate: D,
    feed: FeedKey,
    items: Vec<ItemSummary>,
    cursor: ViewerCursor,
    transform: TransformState,
    state: TransitionState,
    pan: Option<PanSession>,
    pinching: bool,
    pending: Option<PendingSettle>,
    dismissed: bool,
}

impl<S: ItemSource, D: ViewerDelegate> Viewer<S, D> {
    /// Open the viewer on `current` within `feed`. Neighbours are resolved
    /// from whatever the source has already loaded and prefetched right away.
    pub fn open(
        settings: ViewerSettings,
        size: Size,
        source: S,
        delegate: D,
        feed: FeedKey,
        current: ItemId,
    ) -> Self {
        let items = viewable_items(&source, &feed);
        let cursor = ViewerCursor::resolve(&items, &current);
        let mut transform = TransformState::new(size, settings.feedback, settings.timings);
        transform.open();

        let viewer = Self {
            settings,
            source,
            delegate,
            feed,
            items,
            cursor,
            transform,
            state: TransitionState::Idle,
            pan: None,
            pinching: false,
            pending: None,
            dismissed: false,
        };
        tracing::debug!("viewer opened at {}", viewer.cursor);
        viewer.prefetch_neighbors();
        viewer
    }

    pub fn state(&self) -> TransitionState {
        self.state
    }

    pub fn cursor(&self) -> &ViewerCursor {
        &self.cursor
    }

    pub fn neighbors(&self) -> Neighbors {
        self.cursor.neighbors()
    }

    pub fn settings(&self) -> &ViewerSettings {
        &self.settings
    }

    pub fn transform(&self) -> &TransformState {
        &self.transform
    }

    pub fn frame(&self) -> Frame {
        self.transform.frame()
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn delegate(&self) -> &D {
        &self.delegate
    }

    pub fn delegate_mut(&mut self) -> &mut D {
        &mut self.delegate
    }

    pub fn feed(&self) -> &FeedKey {
        &self.feed
    }

    pub fn is_dismissed(&self) -> bool {
        self.dismissed
    }

    pub fn resize(&mut self, size: Size) {
        self.transform.resize(size);
    }

    pub fn set_sheet_position(&mut self, position: f32) {
        self.transform.set_sheet_position(position);
    }

    /// The image to draw now: the full detail once fetched, otherwise the
    /// placeholder the list seeded the viewer with.
    pub fn current_image(&self) -> ImageSource {
        if let DetailState::Ready(detail) = self.source.detail(&self.cursor.current) {
            if let Some(url) = detail.image_url {
                return ImageSource::Detail(url);
            }
        }

        self.items
            .iter()
            .find(|item| item.id == self.cursor.current)
            .and_then(|item| item.placeholder_url.clone())
            .map_or(ImageSource::Missing, ImageSource::Placeholder)
    }

    /// Re-read the ordered list, e.g. after another page arrived, and
    /// re-resolve the cursor against it.
    pub fn refresh_list(&mut self) {
        self.items = viewable_items(&self.source, &self.feed);
        let cursor = ViewerCursor::resolve(&self.items, &self.cursor.current);
        self.update_cursor(cursor);
    }

    /// Jump straight to `id`, abandoning any running transition.
    pub fn set_current(&mut self, id: ItemId) {
        self.pending = None;
        self.pan = None;
        self.pinching = false;
        self.dismissed = false;
        self.state = TransitionState::Idle;
        self.transform.reset_pan();
        let cursor = ViewerCursor::resolve(&self.items, &id);
        self.update_cursor(cursor);
    }

    /// Bring a dismissed viewer back, fading in again.
    pub fn reopen(&mut self) {
        let current = self.cursor.current.clone();
        self.set_current(current);
        self.transform.open();
    }

    /// Feed one gesture event. Returns the decision when this event completed
    /// a gesture that was classified.
    pub fn handle(&mut self, event: &GestureEvent) -> Option<NavigationDecision> {
        tracing::trace!("{event} in state {}", self.state);
        match event.kind {
            GestureKind::Pinch => {
                self.handle_pinch(event);
                None
            }
            GestureKind::Pan if event.is_two_finger_pan() => {
                self.handle_two_finger_pan(event);
                None
            }
            GestureKind::Pan => self.handle_pan(event),
            GestureKind::Fling => self.handle_fling(event),
        }
    }

    /// Advance animations by `dt` and complete any transition that finished.
    pub fn advance(&mut self, dt: Duration) {
        self.transform.step(dt);
        self.transform.clear_settled_pinch();

        // A dismissed viewer stays locked until `reopen` or `set_current`.
        if self.state == TransitionState::Transitioning
            && !self.dismissed
            && !self.transform.is_pan_animating()
        {
            self.complete_transition();
        }
    }

    /// Run any in-flight transition to its end immediately.
    pub fn finish_transition(&mut self) {
        if self.state == TransitionState::Transitioning {
            self.advance(Duration::MAX);
        }
    }

    fn handle_pinch(&mut self, event: &GestureEvent) {
        match event.phase {
            GesturePhase::Start => {
                if self.state != TransitionState::Idle {
                    return;
                }
                self.pinching = true;
                self.state = TransitionState::Pinching;
                self.transform.pinch_start(event.focal);
                self.delegate.on_sheet(SheetCommand::Close);
            }
            GesturePhase::Update => {
                if self.pinching {
                    self.transform.pinch_update(event.scale);
                }
            }
            GesturePhase::End => {
                if !self.pinching {
                    return;
                }
                self.pinching = false;
                self.transform.pinch_end();
                self.delegate.on_sheet(SheetCommand::SnapToFirst);
                if self.state == TransitionState::Pinching {
                    self.state = TransitionState::Idle;
                }
            }
        }
    }

    fn handle_two_finger_pan(&mut self, event: &GestureEvent) {
        match event.phase {
            GesturePhase::Start => {}
            GesturePhase::Update => {
                if self.pinching {
                    self.transform.two_finger_pan_update(event.translation);
                }
            }
            GesturePhase::End => self.transform.two_finger_pan_end(),
        }
    }

    fn handle_pan(&mut self, event: &GestureEvent) -> Option<NavigationDecision> {
        if matches!(
            self.state,
            TransitionState::Transitioning | TransitionState::Pinching
        ) {
            return None;
        }

        match event.phase {
            GesturePhase::Start => {
                self.pan = Some(self.new_pan_session());
                self.state = TransitionState::Panning;
                None
            }
            GesturePhase::Update => {
                let mut session = self.pan?;
                self.track_pan(&mut session, event.translation);
                self.pan = Some(session);
                None
            }
            GesturePhase::End => {
                let mut session = self.pan.take().unwrap_or_else(|| self.new_pan_session());
                self.track_pan(&mut session, event.translation);
                self.state = TransitionState::Idle;
                self.finish_pan(session, event)
            }
        }
    }

    fn new_pan_session(&self) -> PanSession {
        PanSession {
            arbiter: AxisArbiter::new(self.settings.fail_offset, self.settings.min_distance),
            axis: None,
        }
    }

    fn track_pan(&mut self, session: &mut PanSession, translation: Point) {
        if session.axis.is_none() {
            match session.arbiter.observe(translation) {
                Arbitration::Locked(axis) => {
                    tracing::trace!("pan locked to {axis:?}");
                    session.axis = Some(axis);
                    match axis {
                        PanAxis::Vertical => {
                            self.transform.vertical_pan_start();
                            self.delegate.on_sheet(SheetCommand::Close);
                        }
                        PanAxis::Horizontal => self.transform.horizontal_pan_start(),
                    }
                }
                Arbitration::Pending | Arbitration::Rejected => return,
            }
        }

        match session.axis {
            Some(PanAxis::Vertical) => self.transform.vertical_pan_update(translation),
            Some(PanAxis::Horizontal) => self.transform.horizontal_pan_update(translation.x),
            None => {}
        }
    }

    fn finish_pan(
        &mut self,
        session: PanSession,
        event: &GestureEvent,
    ) -> Option<NavigationDecision> {
        let gesture = match session.axis? {
            PanAxis::Vertical => CompletedGesture::Vertical {
                translation_y: event.translation.y,
                velocity_y: event.velocity.y,
            },
            PanAxis::Horizontal => CompletedGesture::Horizontal {
                translation_x: self.transform.effective_horizontal(event.translation.x),
                velocity_x: event.velocity.x,
            },
        };

        let decision = self.decide(gesture);
        match decision {
            NavigationDecision::SnapBack => match session.axis {
                Some(PanAxis::Vertical) => {
                    self.transform.vertical_snap_back();
                    self.delegate.on_sheet(SheetCommand::SnapToFirst);
                }
                _ => self.transform.horizontal_snap_back(),
            },
            _ => self.begin_transition(decision, event.position),
        }
        Some(decision)
    }

    fn handle_fling(&mut self, event: &GestureEvent) -> Option<NavigationDecision> {
        if event.phase != GesturePhase::End
            || matches!(
                self.state,
                TransitionState::Transitioning | TransitionState::Pinching
            )
        {
            return None;
        }

        let direction = event.direction?;
        let decision = self.decide(CompletedGesture::Fling(direction));
        if decision.starts_transition() {
            self.begin_transition(decision, event.position);
        }
        Some(decision)
    }

    fn decide(&self, gesture: CompletedGesture) -> NavigationDecision {
        let decision = self.settings.thresholds.decide(
            gesture,
            self.transform.size().width,
            self.cursor.neighbors(),
            self.state == TransitionState::Transitioning,
        );
        tracing::debug!("{gesture:?} -> {decision}");
        decision
    }

    fn begin_transition(&mut self, decision: NavigationDecision, position: Point) {
        match decision {
            NavigationDecision::SnapBack => return,
            NavigationDecision::Dismiss => {
                self.transform.dismiss_out(position);
                self.pending = Some(PendingSettle::Dismiss);
                self.state = TransitionState::Transitioning;
                self.delegate.on_dismiss();
            }
            NavigationDecision::Advance(direction) => {
                let Some(target) = self.cursor.neighbor(direction).cloned() else {
                    return;
                };
                self.transform.slide_out(direction);
                self.state = TransitionState::Transitioning;
                self.delegate.on_advance(direction, &target);
                self.pending = Some(PendingSettle::Advance { direction, target });
            }
        }
    }

    fn complete_transition(&mut self) {
        match self.pending.take() {
            Some(PendingSettle::Advance { direction, target }) => {
                tracing::debug!("advanced {direction} to {target}");
                self.transform.reset_pan();
                self.state = TransitionState::Idle;
                let cursor = ViewerCursor::resolve(&self.items, &target);
                self.update_cursor(cursor);
            }
            Some(PendingSettle::Dismiss) => {
                tracing::debug!("dismissed at {}", self.cursor.current);
                self.dismissed = true;
            }
            None => {
                self.state = TransitionState::Idle;
            }
        }
    }

    fn update_cursor(&mut self, cursor: ViewerCursor) {
        if cursor == self.cursor {
            return;
        }
        tracing::debug!("cursor {} -> {}", self.cursor, cursor);
        self.cursor = cursor;
        self.prefetch_neighbors();
    }

    fn prefetch_neighbors(&self) {
        if !self.settings.prefetch {
            return;
        }
        for id in self.cursor.prefetch_targets() {
            self.source.prefetch_detail(&id);
        }
    }
}

/// The feed with everything the viewer cannot show filtered out.
fn viewable_items<S: ItemSource>(source: &S, feed: &FeedKey) -> Vec<ItemSummary> {
    let mut items = source.ordered_list(feed);
    items.retain(|item| item.kind.is_viewable());
    items
}
