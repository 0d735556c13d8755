//! Timed values and interpolation curves.
//!
//! Time is advanced explicitly by the caller (`step(dt)`), so every animation
//! is deterministic and testable without a clock.

use std::time::Duration;

/// Linear interpolation of `value` from `input` range onto `output` range,
/// clamped to the output range on both ends.
pub fn interpolate(value: f32, input: [f32; 2], output: [f32; 2]) -> f32 {
    let [in_lo, in_hi] = input;
    let [out_lo, out_hi] = output;
    if (in_hi - in_lo).abs() <= f32::EPSILON {
        return if value < in_lo { out_lo } else { out_hi };
    }

    let t = ((value - in_lo) / (in_hi - in_lo)).clamp(0.0, 1.0);
    out_lo + (out_hi - out_lo) * t
}

/// Cubic ease-in-out on `t` in `[0, 1]`.
pub fn ease_in_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Easing {
    Linear,
    #[default]
    EaseInOut,
}

impl Easing {
    pub fn apply(self, t: f32) -> f32 {
        match self {
            Self::Linear => t.clamp(0.0, 1.0),
            Self::EaseInOut => ease_in_out(t),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Tween {
    from: f32,
    to: f32,
    duration: Duration,
    elapsed: Duration,
    easing: Easing,
}

impl Tween {
    fn progress(&self) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        (self.elapsed.as_secs_f32() / self.duration.as_secs_f32()).clamp(0.0, 1.0)
    }

    fn value(&self) -> f32 {
        let t = self.easing.apply(self.progress());
        self.from + (self.to - self.from) * t
    }

    fn is_complete(&self) -> bool {
        self.elapsed >= self.duration
    }
}

/// A scalar that is either at rest or running a timed animation toward a target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimatedValue {
    value: f32,
    tween: Option<Tween>,
}

impl AnimatedValue {
    pub fn new(value: f32) -> Self {
        Self { value, tween: None }
    }

    pub fn get(&self) -> f32 {
        self.value
    }

    /// Jump to `value`, cancelling any running animation.
    pub fn set(&mut self, value: f32) {
        self.value = value;
        self.tween = None;
    }

    /// Start animating from the current value to `target`. A zero duration
    /// snaps immediately.
    pub fn animate_to(&mut self, target: f32, duration: Duration) {
        self.animate_with(target, duration, Easing::default());
    }

    pub fn animate_with(&mut self, target: f32, duration: Duration, easing: Easing) {
        if duration.is_zero() {
            self.set(target);
            return;
        }
        self.tween = Some(Tween {
            from: self.value,
            to: target,
            duration,
            elapsed: Duration::ZERO,
            easing,
        });
    }

    pub fn is_animating(&self) -> bool {
        self.tween.is_some()
    }

    /// Where the value will come to rest.
    pub fn target(&self) -> f32 {
        self.tween.map_or(self.value, |t| t.to)
    }

    /// Advance by `dt`. Returns `true` when a running animation finished
    /// during this step.
    pub fn step(&mut self, dt: Duration) -> bool {
        let Some(mut tween) = self.tween else {
            return false;
        };

        tween.elapsed = tween.elapsed.saturating_add(dt);
        if tween.is_complete() {
            self.value = tween.to;
            self.tween = None;
            return true;
        }

        self.value = tween.value();
        self.tween = Some(tween);
        false
    }
}

impl Default for AnimatedValue {
    fn default() -> Self {
        Self::new(0.0)
    }
}
