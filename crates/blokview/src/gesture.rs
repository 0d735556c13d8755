//! Gesture events delivered by the presentation layer, and the directional
//! arbitration that splits single-finger pans into swipe-to-dismiss
//! (vertical) and swipe-to-navigate (horizontal).

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::geometry::Point;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GesturePhase {
    Start,
    Update,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureKind {
    /// Two-finger scale about a focal point.
    Pinch,
    /// Continuous pan. One pointer drives dismiss/navigate, two pointers move
    /// the image while pinching.
    Pan,
    /// Discrete directional flick.
    Fling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlingDirection {
    Up,
    Down,
    Left,
    Right,
}

/// One callback from a gesture recognizer.
///
/// `translation` and `scale` are cumulative since the gesture started, not
/// per-tick deltas. `focal` and `position` are relative to the viewed
/// element's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GestureEvent {
    pub kind: GestureKind,
    pub phase: GesturePhase,
    #[serde(default = "default_pointers")]
    pub pointers: u8,
    #[serde(default)]
    pub position: Point,
    #[serde(default)]
    pub translation: Point,
    #[serde(default)]
    pub velocity: Point,
    #[serde(default)]
    pub focal: Point,
    #[serde(default = "default_scale")]
    pub scale: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<FlingDirection>,
}

fn default_pointers() -> u8 {
    1
}

fn default_scale() -> f32 {
    1.0
}

impl GestureEvent {
    fn blank(kind: GestureKind, phase: GesturePhase) -> Self {
        Self {
            kind,
            phase,
            pointers: 1,
            position: Point::ZERO,
            translation: Point::ZERO,
            velocity: Point::ZERO,
            focal: Point::ZERO,
            scale: 1.0,
            direction: None,
        }
    }

    pub fn pan_start() -> Self {
        Self::blank(GestureKind::Pan, GesturePhase::Start)
    }

    pub fn pan_update(dx: f32, dy: f32) -> Self {
        Self {
            translation: Point::new(dx, dy),
            ..Self::blank(GestureKind::Pan, GesturePhase::Update)
        }
    }

    pub fn pan_end(translation: Point, velocity: Point) -> Self {
        Self {
            translation,
            velocity,
            ..Self::blank(GestureKind::Pan, GesturePhase::End)
        }
    }

    /// Two-pointer pan used alongside a pinch.
    pub fn two_finger_pan(phase: GesturePhase, dx: f32, dy: f32) -> Self {
        Self {
            pointers: 2,
            translation: Point::new(dx, dy),
            ..Self::blank(GestureKind::Pan, phase)
        }
    }

    pub fn pinch_start(focal: Point) -> Self {
        Self {
            pointers: 2,
            focal,
            ..Self::blank(GestureKind::Pinch, GesturePhase::Start)
        }
    }

    pub fn pinch_update(scale: f32) -> Self {
        Self {
            pointers: 2,
            scale,
            ..Self::blank(GestureKind::Pinch, GesturePhase::Update)
        }
    }

    pub fn pinch_end() -> Self {
        Self {
            pointers: 2,
            ..Self::blank(GestureKind::Pinch, GesturePhase::End)
        }
    }

    pub fn fling(direction: FlingDirection) -> Self {
        Self {
            direction: Some(direction),
            ..Self::blank(GestureKind::Fling, GesturePhase::End)
        }
    }

    pub fn with_position(mut self, position: Point) -> Self {
        self.position = position;
        self
    }

    pub fn is_two_finger_pan(&self) -> bool {
        self.kind == GestureKind::Pan && self.pointers >= 2
    }
}

impl fmt::Display for GestureEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}/{:?}", self.kind, self.phase)?;
        match self.kind {
            GestureKind::Pinch => write!(f, " scale={:.2} focal={}", self.scale, self.focal),
            GestureKind::Pan => write!(
                f,
                " pointers={} translation={} velocity={}",
                self.pointers, self.translation, self.velocity
            ),
            GestureKind::Fling => match self.direction {
                Some(direction) => write!(f, " {direction:?}"),
                None => Ok(()),
            },
        }
    }
}

/// Axis a single-finger pan was handed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanAxis {
    /// Swipe-to-dismiss.
    Vertical,
    /// Swipe-to-navigate.
    Horizontal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arbitration {
    /// Not enough movement yet to decide.
    Pending,
    Locked(PanAxis),
    /// Both recognizers failed; the rest of the gesture is ignored.
    Rejected,
}

/// Decides which recognizer owns a single-finger pan.
///
/// The vertical recognizer fails once the pan strays more than `fail_offset`
/// horizontally before activation, and vice versa. Activation happens once
/// the pan has travelled `min_distance`. If both are still alive at that
/// point the dominant axis wins; ties go to vertical.
#[derive(Debug, Clone, Copy)]
pub struct AxisArbiter {
    fail_offset: f32,
    min_distance: f32,
    vertical_failed: bool,
    horizontal_failed: bool,
    state: Arbitration,
}

impl AxisArbiter {
    pub fn new(fail_offset: f32, min_distance: f32) -> Self {
        Self {
            fail_offset,
            min_distance,
            vertical_failed: false,
            horizontal_failed: false,
            state: Arbitration::Pending,
        }
    }

    pub fn state(&self) -> Arbitration {
        self.state
    }

    pub fn locked_axis(&self) -> Option<PanAxis> {
        match self.state {
            Arbitration::Locked(axis) => Some(axis),
            _ => None,
        }
    }

    /// Feed the cumulative translation of the pan.
    pub fn observe(&mut self, translation: Point) -> Arbitration {
        if self.state != Arbitration::Pending {
            return self.state;
        }

        if translation.x.abs() > self.fail_offset {
            self.vertical_failed = true;
        }
        if translation.y.abs() > self.fail_offset {
            self.horizontal_failed = true;
        }

        if self.vertical_failed && self.horizontal_failed {
            self.state = Arbitration::Rejected;
            return self.state;
        }

        if translation.length() < self.min_distance {
            return self.state;
        }

        let axis = match (self.vertical_failed, self.horizontal_failed) {
            (false, true) => PanAxis::Vertical,
            (true, false) => PanAxis::Horizontal,
            _ if translation.y.abs() >= translation.x.abs() => PanAxis::Vertical,
            _ => PanAxis::Horizontal,
        };
        self.state = Arbitration::Locked(axis);
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arbiter() -> AxisArbiter {
        AxisArbiter::new(20.0, 20.0)
    }

    #[test]
    fn small_movement_stays_pending() {
        let mut a = arbiter();
        assert_eq!(a.observe(Point::new(3.0, 4.0)), Arbitration::Pending);
        assert_eq!(a.locked_axis(), None);
    }

    #[test]
    fn downward_drag_locks_vertical() {
        let mut a = arbiter();
        a.observe(Point::new(2.0, 10.0));
        assert_eq!(
            a.observe(Point::new(4.0, 30.0)),
            Arbitration::Locked(PanAxis::Vertical)
        );
    }

    #[test]
    fn sideways_drag_locks_horizontal() {
        let mut a = arbiter();
        assert_eq!(
            a.observe(Point::new(-60.0, 5.0)),
            Arbitration::Locked(PanAxis::Horizontal)
        );
    }

    #[test]
    fn orthogonal_drift_hands_over_to_the_other_axis() {
        // Drifts 25px sideways while barely moving down: vertical fails first,
        // even though the pan later turns downward.
        let mut a = arbiter();
        a.observe(Point::new(25.0, 2.0));
        assert_eq!(a.state(), Arbitration::Locked(PanAxis::Horizontal));

        let mut b = arbiter();
        b.observe(Point::new(1.0, 15.0));
        assert_eq!(b.state(), Arbitration::Pending);
        b.observe(Point::new(22.0, 15.0));
        assert_eq!(b.state(), Arbitration::Locked(PanAxis::Horizontal));
    }

    #[test]
    fn diagonal_beyond_both_offsets_is_rejected() {
        let mut a = arbiter();
        assert_eq!(a.observe(Point::new(40.0, 40.0)), Arbitration::Rejected);
        assert_eq!(a.observe(Point::new(0.0, 90.0)), Arbitration::Rejected);
    }

    #[test]
    fn lock_is_sticky() {
        let mut a = arbiter();
        a.observe(Point::new(0.0, 40.0));
        assert_eq!(
            a.observe(Point::new(300.0, 40.0)),
            Arbitration::Locked(PanAxis::Vertical)
        );
    }

    #[test]
    fn events_deserialize_with_defaults() {
        let yaml = "kind: pan\nphase: update\ntranslation: { x: -12.0, y: 3.0 }\n";
        let event: GestureEvent = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(event.pointers, 1);
        assert_eq!(event.scale, 1.0);
        assert_eq!(event.translation, Point::new(-12.0, 3.0));
        assert!(!event.is_two_finger_pan());
    }
}
