//! Live transform state integrated from gesture updates, and the per-frame
//! values handed to the presentation layer.

use serde::Serialize;
use std::time::Duration;

use crate::animation::{AnimatedValue, interpolate};
use crate::decision::Direction;
use crate::geometry::{self, AffineTransform, Point, Size};

/// Visual feedback curves and limits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Feedback {
    /// Resting opacity of the dimmed background.
    pub backdrop_opacity: f32,
    /// Added to the backdrop while pinching.
    pub pinch_backdrop_boost: f32,
    /// Vertical travel, as a fraction of width, over which the image fades out.
    pub image_fade_fraction: f32,
    /// Vertical travel, as a fraction of width, over which the image shrinks.
    pub shrink_fraction: f32,
    /// Smallest image scale reached while dragging down.
    pub min_drag_scale: f32,
    pub min_scale: f32,
    pub max_scale: f32,
    /// Scale factor when the detail sheet is fully open.
    pub sheet_scale: f32,
    /// How far below the finger the image drops on dismiss.
    pub dismiss_drop: f32,
}

impl Default for Feedback {
    fn default() -> Self {
        Self {
            backdrop_opacity: 0.8,
            pinch_backdrop_boost: 0.1,
            image_fade_fraction: 0.3,
            shrink_fraction: 0.4,
            min_drag_scale: 0.7,
            min_scale: 0.5,
            max_scale: 10.0,
            sheet_scale: 0.9,
            dismiss_drop: 800.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timings {
    pub fade_in: Duration,
    pub pinch_settle: Duration,
    pub pinch_backdrop: Duration,
    pub transition: Duration,
    pub dismiss: Duration,
    pub snap_back: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            fade_in: Duration::from_millis(200),
            pinch_settle: Duration::from_millis(200),
            pinch_backdrop: Duration::from_millis(300),
            transition: Duration::from_millis(190),
            dismiss: Duration::from_millis(120),
            snap_back: Duration::from_millis(100),
        }
    }
}

/// What the presentation layer applies to the image and backdrop this frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Frame {
    /// `pan × pinch`, ready to apply to the image.
    pub transform: AffineTransform,
    /// Pinch zoom about the focal point, with the sheet shrink applied.
    pub pinch: AffineTransform,
    /// Single-finger pan translation and drag shrink.
    pub pan: AffineTransform,
    pub background_opacity: f32,
    pub image_opacity: f32,
}

#[derive(Debug, Clone)]
pub struct TransformState {
    size: Size,
    feedback: Feedback,
    timings: Timings,
    pinch_origin: Option<Point>,
    pinch_scale: AnimatedValue,
    pinch_x: AnimatedValue,
    pinch_y: AnimatedValue,
    pan_x: AnimatedValue,
    pan_y: AnimatedValue,
    pan_scale: AnimatedValue,
    background_opacity: AnimatedValue,
    image_opacity: AnimatedValue,
    begin_offset_x: f32,
    sheet_position: f32,
}

impl TransformState {
    pub fn new(size: Size, feedback: Feedback, timings: Timings) -> Self {
        Self {
            size,
            feedback,
            timings,
            pinch_origin: None,
            pinch_scale: AnimatedValue::new(1.0),
            pinch_x: AnimatedValue::new(0.0),
            pinch_y: AnimatedValue::new(0.0),
            pan_x: AnimatedValue::new(0.0),
            pan_y: AnimatedValue::new(0.0),
            pan_scale: AnimatedValue::new(1.0),
            background_opacity: AnimatedValue::new(0.0),
            image_opacity: AnimatedValue::new(0.0),
            begin_offset_x: 0.0,
            sheet_position: 0.0,
        }
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn resize(&mut self, size: Size) {
        self.size = size;
    }

    /// Fade the backdrop and image in when the viewer appears.
    pub fn open(&mut self) {
        self.background_opacity
            .animate_to(self.feedback.backdrop_opacity, self.timings.fade_in);
        self.image_opacity.animate_to(1.0, self.timings.fade_in);
    }

    pub fn pinch_origin(&self) -> Option<Point> {
        self.pinch_origin
    }

    pub fn pinch_scale(&self) -> f32 {
        self.pinch_scale.get()
    }

    pub fn pinch_translation(&self) -> Point {
        Point::new(self.pinch_x.get(), self.pinch_y.get())
    }

    pub fn pan_translation(&self) -> Point {
        Point::new(self.pan_x.get(), self.pan_y.get())
    }

    pub fn pan_scale(&self) -> f32 {
        self.pan_scale.get()
    }

    pub fn background_opacity(&self) -> f32 {
        self.background_opacity.get()
    }

    pub fn image_opacity(&self) -> f32 {
        self.image_opacity.get()
    }

    pub fn begin_offset_x(&self) -> f32 {
        self.begin_offset_x
    }

    /// Record the focal point relative to the element's center.
    pub fn pinch_start(&mut self, focal: Point) {
        self.pinch_origin = Some(focal - self.size.center());
        self.background_opacity.animate_to(
            self.feedback.backdrop_opacity + self.feedback.pinch_backdrop_boost,
            self.timings.pinch_backdrop,
        );
    }

    /// `scale` is cumulative since the pinch began.
    pub fn pinch_update(&mut self, scale: f32) {
        self.pinch_scale.set(scale);
    }

    pub fn pinch_end(&mut self) {
        self.background_opacity
            .animate_to(self.feedback.backdrop_opacity, self.timings.pinch_settle);
        self.pinch_scale.animate_to(1.0, self.timings.pinch_settle);
    }

    pub fn two_finger_pan_update(&mut self, translation: Point) {
        self.pinch_x.set(translation.x);
        self.pinch_y.set(translation.y);
    }

    pub fn two_finger_pan_end(&mut self) {
        self.pinch_x.animate_to(0.0, self.timings.pinch_settle);
        self.pinch_y.animate_to(0.0, self.timings.pinch_settle);
    }

    pub fn vertical_pan_start(&mut self) {
        self.pan_x.set(0.0);
        self.pan_y.set(0.0);
        self.pan_scale.set(1.0);
    }

    /// Image follows the finger; backdrop, image opacity and scale fall off
    /// with downward travel.
    pub fn vertical_pan_update(&mut self, translation: Point) {
        let width = self.size.width;
        let fb = self.feedback;
        self.pan_x.set(translation.x);
        self.pan_y.set(translation.y);
        self.background_opacity.set(interpolate(
            translation.y,
            [0.0, width],
            [fb.backdrop_opacity, 0.0],
        ));
        self.image_opacity.set(interpolate(
            translation.y,
            [0.0, width * fb.image_fade_fraction],
            [1.0, 0.0],
        ));
        self.pan_scale.set(interpolate(
            translation.y,
            [0.0, width * fb.shrink_fraction],
            [1.0, fb.min_drag_scale],
        ));
    }

    /// Throw the image out below the finger and fade everything.
    pub fn dismiss_out(&mut self, position: Point) {
        let d = self.timings.dismiss;
        self.pan_scale.animate_to(0.0, d);
        self.pan_y
            .animate_to(position.y + self.feedback.dismiss_drop, d);
        self.background_opacity.animate_to(0.0, d);
        self.image_opacity.animate_to(0.0, d);
    }

    pub fn vertical_snap_back(&mut self) {
        let d = self.timings.snap_back;
        self.background_opacity
            .animate_to(self.feedback.backdrop_opacity, d);
        self.image_opacity.animate_to(1.0, d);
        self.pan_x.animate_to(0.0, d);
        self.pan_y.animate_to(0.0, d);
        self.pan_scale.animate_to(1.0, d);
    }

    /// A horizontal pan picks up wherever a previous settle left the image.
    pub fn horizontal_pan_start(&mut self) {
        self.begin_offset_x = self.pan_x.get();
        self.pan_x.set(self.begin_offset_x);
    }

    pub fn horizontal_pan_update(&mut self, translation_x: f32) {
        self.pan_x.set(self.effective_horizontal(translation_x));
    }

    /// Gesture translation plus the offset the pan started from.
    pub fn effective_horizontal(&self, translation_x: f32) -> f32 {
        translation_x + self.begin_offset_x
    }

    /// Slide the image off-screen toward the neighbour being revealed.
    pub fn slide_out(&mut self, direction: Direction) {
        let target = match direction {
            Direction::Next => -self.size.width,
            Direction::Previous => self.size.width,
        };
        self.pan_x.animate_to(target, self.timings.transition);
    }

    pub fn horizontal_snap_back(&mut self) {
        self.pan_x.animate_to(0.0, self.timings.transition);
    }

    /// Re-center for the item that just became current.
    pub fn reset_pan(&mut self) {
        self.pan_x.set(0.0);
        self.pan_y.set(0.0);
        self.pan_scale.set(1.0);
        self.begin_offset_x = 0.0;
    }

    /// Detail sheet position in `[0, 1]`; negative overshoot counts as closed.
    pub fn set_sheet_position(&mut self, position: f32) {
        self.sheet_position = position.max(0.0);
    }

    pub fn sheet_scale_factor(&self) -> f32 {
        interpolate(
            self.sheet_position,
            [0.0, 1.0],
            [1.0, self.feedback.sheet_scale],
        )
    }

    pub fn is_pinch_animating(&self) -> bool {
        self.pinch_scale.is_animating() || self.pinch_x.is_animating() || self.pinch_y.is_animating()
    }

    pub fn is_pan_animating(&self) -> bool {
        self.pan_x.is_animating()
            || self.pan_y.is_animating()
            || self.pan_scale.is_animating()
            || self.image_opacity.is_animating()
    }

    /// Advance every running animation by `dt`.
    pub fn step(&mut self, dt: Duration) {
        for value in [
            &mut self.pinch_scale,
            &mut self.pinch_x,
            &mut self.pinch_y,
            &mut self.pan_x,
            &mut self.pan_y,
            &mut self.pan_scale,
            &mut self.background_opacity,
            &mut self.image_opacity,
        ] {
            value.step(dt);
        }
    }

    /// Forget the focal point once the pinch has fully settled.
    pub fn clear_settled_pinch(&mut self) {
        if self.pinch_origin.is_some()
            && !self.is_pinch_animating()
            && self.pinch_scale.get() == 1.0
            && self.pinch_translation().is_zero()
        {
            self.pinch_origin = None;
        }
    }

    pub fn pinch_matrix(&self) -> AffineTransform {
        let mut matrix = AffineTransform::identity();
        let translation = self.pinch_translation();
        if !translation.is_zero() {
            matrix = geometry::translate(&matrix, translation.x, translation.y);
        }

        let scale = self.pinch_scale.get();
        if scale != 1.0 {
            let origin = self.pinch_origin.unwrap_or(Point::ZERO);
            matrix = geometry::scale_about(&matrix, origin, scale);
        }

        matrix
            .with_scale_factor(self.sheet_scale_factor())
            .with_clamped_scale(self.feedback.min_scale, self.feedback.max_scale)
    }

    pub fn pan_matrix(&self) -> AffineTransform {
        let pan = geometry::translate(
            &AffineTransform::identity(),
            self.pan_x.get(),
            self.pan_y.get(),
        );
        geometry::scale(&pan, self.pan_scale.get())
    }

    pub fn frame(&self) -> Frame {
        let pinch = self.pinch_matrix();
        let pan = self.pan_matrix();
        Frame {
            transform: pan.multiply(&pinch),
            pinch,
            pan,
            background_opacity: self.background_opacity.get(),
            image_opacity: self.image_opacity.get(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::EPSILON;

    const SIZE: Size = Size::new(400.0, 800.0);

    fn state() -> TransformState {
        TransformState::new(SIZE, Feedback::default(), Timings::default())
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn rest_state_renders_identity() {
        let s = state();
        assert!(s.frame().transform.is_identity());
        assert_eq!(s.frame().image_opacity, 0.0);
    }

    #[test]
    fn open_fades_in_to_backdrop() {
        let mut s = state();
        s.open();
        s.step(ms(250));
        assert!((s.background_opacity() - 0.8).abs() < EPSILON);
        assert_eq!(s.image_opacity(), 1.0);
    }

    #[test]
    fn pinch_zooms_about_focal_point() {
        let mut s = state();
        let focal = Point::new(300.0, 500.0);
        s.pinch_start(focal);
        assert_eq!(s.pinch_origin(), Some(Point::new(100.0, 100.0)));

        s.pinch_update(2.0);
        let m = s.frame().pinch;
        let fixed = m.apply(Point::new(100.0, 100.0));
        assert!((fixed.x - 100.0).abs() < EPSILON && (fixed.y - 100.0).abs() < EPSILON);
        assert_eq!(m.scale_x(), 2.0);
    }

    #[test]
    fn pinch_scale_is_cumulative_not_incremental() {
        let mut s = state();
        s.pinch_start(SIZE.center());
        s.pinch_update(1.5);
        s.pinch_update(1.8);
        assert_eq!(s.pinch_scale(), 1.8);
    }

    #[test]
    fn pinch_end_settles_to_one_and_clears_origin() {
        let mut s = state();
        s.pinch_start(Point::new(10.0, 10.0));
        s.pinch_update(3.0);
        s.pinch_end();
        s.step(ms(100));
        assert!(s.pinch_scale() > 1.0 && s.pinch_scale() < 3.0);
        s.clear_settled_pinch();
        assert!(s.pinch_origin().is_some());

        s.step(ms(150));
        assert_eq!(s.pinch_scale(), 1.0);
        s.clear_settled_pinch();
        assert_eq!(s.pinch_origin(), None);
        assert!(s.frame().pinch.is_identity());
    }

    #[test]
    fn two_finger_pan_is_independent_of_zoom() {
        let mut s = state();
        s.pinch_start(SIZE.center());
        s.two_finger_pan_update(Point::new(30.0, -12.0));
        let m = s.frame().pinch;
        assert_eq!(m.translate_x(), 30.0);
        assert_eq!(m.translate_y(), -12.0);
        assert_eq!(m.scale_x(), 1.0);

        s.two_finger_pan_end();
        s.step(ms(200));
        assert!(s.pinch_translation().is_zero());
    }

    #[test]
    fn zoom_is_clamped() {
        let mut s = state();
        s.pinch_start(SIZE.center());
        s.pinch_update(25.0);
        assert_eq!(s.frame().pinch.scale_x(), 10.0);
        s.pinch_update(0.1);
        assert_eq!(s.frame().pinch.scale_x(), 0.5);
    }

    #[test]
    fn open_sheet_shrinks_the_image() {
        let mut s = state();
        s.set_sheet_position(1.0);
        assert!((s.frame().pinch.scale_x() - 0.9).abs() < EPSILON);
        s.set_sheet_position(-0.4);
        assert_eq!(s.sheet_scale_factor(), 1.0);
    }

    #[test]
    fn vertical_feedback_decreases_with_travel_and_clamps() {
        let mut s = state();
        s.open();
        s.step(ms(200));
        s.vertical_pan_start();

        let mut last = (f32::MAX, f32::MAX, f32::MAX);
        let mut y = 0.0;
        while y <= 600.0 {
            s.vertical_pan_update(Point::new(0.0, y));
            let now = (s.background_opacity(), s.image_opacity(), s.pan_scale());
            assert!(now.0 <= last.0 && now.1 <= last.1 && now.2 <= last.2, "y={y}");
            assert!((0.0..=1.0).contains(&now.0));
            assert!((0.0..=1.0).contains(&now.1));
            assert!((0.7..=1.0).contains(&now.2));
            last = now;
            y += 10.0;
        }
        assert_eq!(s.pan_scale(), 0.7);
        assert_eq!(s.image_opacity(), 0.0);
        assert_eq!(s.background_opacity(), 0.0);
    }

    #[test]
    fn dismiss_throws_image_below_finger() {
        let mut s = state();
        s.vertical_pan_start();
        s.vertical_pan_update(Point::new(0.0, 200.0));
        s.dismiss_out(Point::new(150.0, 450.0));
        assert!(s.is_pan_animating());
        s.step(ms(120));
        assert!(!s.is_pan_animating());
        assert_eq!(s.pan_translation().y, 1250.0);
        assert_eq!(s.pan_scale(), 0.0);
        assert_eq!(s.image_opacity(), 0.0);
    }

    #[test]
    fn vertical_snap_back_restores_rest_state() {
        let mut s = state();
        s.vertical_pan_start();
        s.vertical_pan_update(Point::new(5.0, 30.0));
        s.vertical_snap_back();
        s.step(ms(100));
        assert!(s.pan_translation().is_zero());
        assert_eq!(s.pan_scale(), 1.0);
        assert_eq!(s.image_opacity(), 1.0);
        assert!((s.background_opacity() - 0.8).abs() < EPSILON);
    }

    #[test]
    fn horizontal_pan_resumes_from_mid_settle_offset() {
        let mut s = state();
        s.horizontal_pan_start();
        s.horizontal_pan_update(-100.0);
        s.horizontal_snap_back();
        s.step(ms(95));
        let mid = s.pan_translation().x;
        assert!(mid < 0.0 && mid > -100.0);

        s.horizontal_pan_start();
        assert_eq!(s.begin_offset_x(), mid);
        assert!(!s.is_pan_animating());
        s.horizontal_pan_update(-10.0);
        assert_eq!(s.pan_translation().x, mid - 10.0);
    }

    #[test]
    fn slide_out_moves_a_full_width() {
        let mut s = state();
        s.slide_out(Direction::Next);
        s.step(ms(190));
        assert_eq!(s.pan_translation().x, -400.0);

        s.reset_pan();
        s.slide_out(Direction::Previous);
        s.step(ms(190));
        assert_eq!(s.pan_translation().x, 400.0);
    }
}
