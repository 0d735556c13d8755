//! End-of-gesture classification into dismiss / advance / snap-back.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::gesture::FlingDirection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Next,
    Previous,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Next => write!(f, "next"),
            Self::Previous => write!(f, "previous"),
        }
    }
}

/// Outcome of one completed gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationDecision {
    SnapBack,
    Dismiss,
    Advance(Direction),
}

impl NavigationDecision {
    /// Whether this decision starts a transition that blocks further input.
    pub fn starts_transition(self) -> bool {
        !matches!(self, Self::SnapBack)
    }
}

impl fmt::Display for NavigationDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SnapBack => write!(f, "snap-back"),
            Self::Dismiss => write!(f, "dismiss"),
            Self::Advance(direction) => write!(f, "advance {direction}"),
        }
    }
}

/// A gesture as it looked when the finger lifted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CompletedGesture {
    Vertical { translation_y: f32, velocity_y: f32 },
    /// `translation_x` already includes any offset the pan started from.
    Horizontal { translation_x: f32, velocity_x: f32 },
    Fling(FlingDirection),
}

/// Which neighbours exist around the current item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Neighbors {
    pub previous: bool,
    pub next: bool,
}

impl Neighbors {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn allows(self, direction: Direction) -> bool {
        match direction {
            Direction::Next => self.next,
            Direction::Previous => self.previous,
        }
    }
}

/// Distance thresholds are fractions of the viewport width; velocities are
/// in logical pixels per second.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub dismiss_fraction: f32,
    pub advance_fraction: f32,
    pub velocity_threshold: f32,
    pub dismiss_velocity_threshold: f32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            dismiss_fraction: 0.09,
            advance_fraction: 0.07,
            velocity_threshold: 1300.0,
            dismiss_velocity_threshold: 1300.0,
        }
    }
}

impl Thresholds {
    pub fn dismiss_distance(&self, viewport_width: f32) -> f32 {
        viewport_width * self.dismiss_fraction
    }

    pub fn advance_distance(&self, viewport_width: f32) -> f32 {
        viewport_width * self.advance_fraction
    }

    /// Classify a completed gesture. Displacement and velocity are OR-ed so
    /// both slow drags and quick flicks qualify. While `in_flight` every
    /// outcome other than `SnapBack` is disabled, as is any advance toward a
    /// missing neighbour.
    pub fn decide(
        &self,
        gesture: CompletedGesture,
        viewport_width: f32,
        neighbors: Neighbors,
        in_flight: bool,
    ) -> NavigationDecision {
        if in_flight {
            return NavigationDecision::SnapBack;
        }

        match gesture {
            CompletedGesture::Vertical {
                translation_y,
                velocity_y,
            } => {
                if translation_y > self.dismiss_distance(viewport_width)
                    || velocity_y > self.dismiss_velocity_threshold
                {
                    NavigationDecision::Dismiss
                } else {
                    NavigationDecision::SnapBack
                }
            }
            CompletedGesture::Horizontal {
                translation_x,
                velocity_x,
            } => {
                let distance = self.advance_distance(viewport_width);
                let wants_next =
                    translation_x < -distance || velocity_x < -self.velocity_threshold;
                let wants_previous =
                    translation_x > distance || velocity_x > self.velocity_threshold;

                if wants_next && neighbors.next {
                    NavigationDecision::Advance(Direction::Next)
                } else if wants_previous && neighbors.previous {
                    NavigationDecision::Advance(Direction::Previous)
                } else {
                    NavigationDecision::SnapBack
                }
            }
            CompletedGesture::Fling(direction) => match direction {
                FlingDirection::Down => NavigationDecision::Dismiss,
                FlingDirection::Up => NavigationDecision::SnapBack,
                FlingDirection::Left if neighbors.next => {
                    NavigationDecision::Advance(Direction::Next)
                }
                FlingDirection::Right if neighbors.previous => {
                    NavigationDecision::Advance(Direction::Previous)
                }
                FlingDirection::Left | FlingDirection::Right => NavigationDecision::SnapBack,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WIDTH: f32 = 400.0;

    fn both() -> Neighbors {
        Neighbors {
            previous: true,
            next: true,
        }
    }

    fn vertical(translation_y: f32, velocity_y: f32) -> CompletedGesture {
        CompletedGesture::Vertical {
            translation_y,
            velocity_y,
        }
    }

    fn horizontal(translation_x: f32, velocity_x: f32) -> CompletedGesture {
        CompletedGesture::Horizontal {
            translation_x,
            velocity_x,
        }
    }

    #[test]
    fn slow_short_vertical_never_dismisses() {
        let t = Thresholds::default();
        let limit = t.dismiss_distance(WIDTH);
        let mut y = -200.0;
        while y <= limit {
            for vy in [-3000.0, 0.0, 500.0, 1299.0] {
                assert_eq!(
                    t.decide(vertical(y, vy), WIDTH, both(), false),
                    NavigationDecision::SnapBack,
                    "y={y} vy={vy}"
                );
            }
            y += 4.0;
        }
    }

    #[test]
    fn long_or_fast_vertical_dismisses() {
        let t = Thresholds::default();
        assert_eq!(
            t.decide(vertical(0.5 * WIDTH, 0.0), WIDTH, both(), false),
            NavigationDecision::Dismiss
        );
        assert_eq!(
            t.decide(vertical(10.0, 2400.0), WIDTH, Neighbors::none(), false),
            NavigationDecision::Dismiss
        );
    }

    #[test]
    fn dismiss_fraction_is_configurable() {
        let t = Thresholds {
            dismiss_fraction: 0.3,
            ..Thresholds::default()
        };
        assert_eq!(
            t.decide(vertical(100.0, 0.0), WIDTH, both(), false),
            NavigationDecision::SnapBack
        );
        assert_eq!(
            t.decide(vertical(121.0, 0.0), WIDTH, both(), false),
            NavigationDecision::Dismiss
        );
    }

    #[test]
    fn horizontal_past_threshold_advances_next() {
        let t = Thresholds::default();
        let x = -(t.advance_distance(WIDTH) + 1.0);
        assert_eq!(
            t.decide(horizontal(x, 0.0), WIDTH, both(), false),
            NavigationDecision::Advance(Direction::Next)
        );
    }

    #[test]
    fn fast_flick_advances_even_when_short() {
        let t = Thresholds::default();
        assert_eq!(
            t.decide(horizontal(-5.0, -1500.0), WIDTH, both(), false),
            NavigationDecision::Advance(Direction::Next)
        );
        assert_eq!(
            t.decide(horizontal(5.0, 1500.0), WIDTH, both(), false),
            NavigationDecision::Advance(Direction::Previous)
        );
    }

    #[test]
    fn missing_neighbour_disables_direction() {
        let t = Thresholds::default();
        let only_previous = Neighbors {
            previous: true,
            next: false,
        };
        for (x, vx) in [(-300.0, 0.0), (-300.0, -5000.0), (-1.0, -5000.0)] {
            assert_eq!(
                t.decide(horizontal(x, vx), WIDTH, only_previous, false),
                NavigationDecision::SnapBack
            );
        }
        assert_eq!(
            t.decide(horizontal(300.0, 0.0), WIDTH, only_previous, false),
            NavigationDecision::Advance(Direction::Previous)
        );
    }

    #[test]
    fn in_flight_transition_blocks_everything_but_snap_back() {
        let t = Thresholds::default();
        for gesture in [
            vertical(400.0, 3000.0),
            horizontal(-400.0, -3000.0),
            CompletedGesture::Fling(FlingDirection::Down),
        ] {
            assert_eq!(
                t.decide(gesture, WIDTH, both(), true),
                NavigationDecision::SnapBack
            );
        }
    }

    #[test]
    fn flings_map_to_directions() {
        let t = Thresholds::default();
        let fling = |d| t.decide(CompletedGesture::Fling(d), WIDTH, both(), false);
        assert_eq!(fling(FlingDirection::Down), NavigationDecision::Dismiss);
        assert_eq!(fling(FlingDirection::Up), NavigationDecision::SnapBack);
        assert_eq!(
            fling(FlingDirection::Left),
            NavigationDecision::Advance(Direction::Next)
        );
        assert_eq!(
            fling(FlingDirection::Right),
            NavigationDecision::Advance(Direction::Previous)
        );
        assert_eq!(
            t.decide(
                CompletedGesture::Fling(FlingDirection::Left),
                WIDTH,
                Neighbors::none(),
                false
            ),
            NavigationDecision::SnapBack
        );
    }

    #[test]
    fn only_snap_back_leaves_input_open() {
        assert!(!NavigationDecision::SnapBack.starts_transition());
        assert!(NavigationDecision::Dismiss.starts_transition());
        assert!(NavigationDecision::Advance(Direction::Previous).starts_transition());
    }
}
