use super::*;
use crate::gesture::FlingDirection;

#[test]
fn long_downward_drag_dismisses() {
    let mut viewer = viewer_on(&["A", "B", "C"], "B");
    viewer.handle(&GestureEvent::pan_start());

    let mut last = viewer.frame();
    for step in 1..=10 {
        let y = 20.0 * step as f32;
        viewer.handle(&GestureEvent::pan_update(0.0, y));
        let frame = viewer.frame();
        assert!(frame.background_opacity <= last.background_opacity, "y={y}");
        assert!(frame.image_opacity <= last.image_opacity, "y={y}");
        assert!(frame.pan.scale_x() <= last.pan.scale_x(), "y={y}");
        assert_eq!(frame.pan.translate_y(), y);
        last = frame;
    }

    let end = GestureEvent::pan_end(Point::new(0.0, 200.0), Point::ZERO)
        .with_position(Point::new(200.0, 600.0));
    assert_eq!(viewer.handle(&end), Some(NavigationDecision::Dismiss));
    assert_eq!(viewer.delegate().navigation(), [Call::Dismiss]);
    assert_eq!(viewer.state(), TransitionState::Transitioning);

    settle(&mut viewer);
    assert!(viewer.is_dismissed());
    let frame = viewer.frame();
    assert_eq!(frame.image_opacity, 0.0);
    assert_eq!(frame.background_opacity, 0.0);
    assert_eq!(frame.pan.translate_y(), 1400.0);
    assert_eq!(viewer.cursor().current, id("B"));
}

#[test]
fn short_drag_snaps_back_and_reopens_the_sheet() {
    let mut viewer = viewer_on(&["A"], "A");
    assert_eq!(
        slow_swipe(&mut viewer, 0.0, 30.0),
        Some(NavigationDecision::SnapBack)
    );
    assert_eq!(
        viewer.delegate().sheet(),
        [SheetCommand::Close, SheetCommand::SnapToFirst]
    );

    settle(&mut viewer);
    let frame = viewer.frame();
    assert!(frame.pan.is_identity());
    assert_eq!(frame.image_opacity, 1.0);
    assert!((frame.background_opacity - 0.8).abs() < 1e-4);
    assert!(!viewer.is_dismissed());
}

#[test]
fn fast_downward_flick_dismisses() {
    let mut viewer = viewer_on(&["A"], "A");
    let decision = swipe(&mut viewer, 0.0, 25.0, Point::new(0.0, 1800.0));
    assert_eq!(decision, Some(NavigationDecision::Dismiss));
}

#[test]
fn upward_drag_never_dismisses() {
    let mut viewer = viewer_on(&["A"], "A");
    let decision = swipe(&mut viewer, 0.0, -300.0, Point::new(0.0, -2000.0));
    assert_eq!(decision, Some(NavigationDecision::SnapBack));
}

#[test]
fn dismissed_viewer_stays_locked_until_reopened() {
    let mut viewer = viewer_on(&["A", "B"], "A");
    viewer.handle(&GestureEvent::fling(FlingDirection::Down));
    settle(&mut viewer);
    assert!(viewer.is_dismissed());
    assert_eq!(viewer.state(), TransitionState::Transitioning);
    assert_eq!(slow_swipe(&mut viewer, -200.0, 0.0), None);

    viewer.reopen();
    settle(&mut viewer);
    assert_idle_at(&viewer, "A");
    assert!(!viewer.is_dismissed());
    assert_eq!(viewer.frame().image_opacity, 1.0);
}

#[test]
fn unit_delegate_is_enough() {
    let mut viewer = Viewer::open(
        ViewerSettings::default(),
        SIZE,
        source(&["A"]),
        (),
        feed(),
        id("A"),
    );
    assert_eq!(
        swipe(&mut viewer, 0.0, 300.0, Point::ZERO),
        Some(NavigationDecision::Dismiss)
    );
    settle(&mut viewer);
    assert!(viewer.is_dismissed());
}
