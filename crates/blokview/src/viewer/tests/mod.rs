mod dismiss;

use std::sync::Arc;
use std::time::Duration;

use super::{SheetCommand, TransitionState, Viewer, ViewerDelegate, ViewerSettings};
use crate::decision::{Direction, NavigationDecision};
use crate::geometry::{Point, Size};
use crate::gesture::GestureEvent;
use crate::item::{ItemId, ItemSummary};
use crate::source::{FeedKey, MemorySource};

/// 400 wide: dismiss past 36, advance past 28.
const SIZE: Size = Size::new(400.0, 800.0);

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Dismiss,
    Advance(Direction, ItemId),
    Sheet(SheetCommand),
}

#[derive(Debug, Default)]
struct Recorder {
    calls: Vec<Call>,
}

impl Recorder {
    /// Dismiss and advance callbacks only.
    fn navigation(&self) -> Vec<Call> {
        self.calls
            .iter()
            .filter(|call| !matches!(call, Call::Sheet(_)))
            .cloned()
            .collect()
    }

    fn sheet(&self) -> Vec<SheetCommand> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::Sheet(command) => Some(*command),
                _ => None,
            })
            .collect()
    }
}

impl ViewerDelegate for Recorder {
    fn on_dismiss(&mut self) {
        self.calls.push(Call::Dismiss);
    }

    fn on_advance(&mut self, direction: Direction, target: &ItemId) {
        self.calls.push(Call::Advance(direction, target.clone()));
    }

    fn on_sheet(&mut self, command: SheetCommand) {
        self.calls.push(Call::Sheet(command));
    }
}

type TestViewer = Viewer<Arc<MemorySource>, Recorder>;

fn feed() -> FeedKey {
    FeedKey::new("channel:test")
}

fn summaries(ids: &[&str]) -> Vec<ItemSummary> {
    ids.iter()
        .map(|id| ItemSummary::new(*id).with_placeholder(format!("{id}-small.jpg")))
        .collect()
}

fn source(ids: &[&str]) -> Arc<MemorySource> {
    Arc::new(MemorySource::new().with_feed(feed(), summaries(ids)))
}

fn open_on(source: Arc<MemorySource>, current: &str) -> TestViewer {
    let mut viewer = Viewer::open(
        ViewerSettings::default(),
        SIZE,
        source,
        Recorder::default(),
        feed(),
        ItemId::from(current),
    );
    // Let the fade-in finish.
    viewer.advance(ms(250));
    viewer
}

fn viewer_on(ids: &[&str], current: &str) -> TestViewer {
    open_on(source(ids), current)
}

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn id(s: &str) -> ItemId {
    ItemId::from(s)
}

/// Single-finger pan from rest to `(dx, dy)`, released with `velocity`.
fn swipe<S, D>(viewer: &mut Viewer<S, D>, dx: f32, dy: f32, velocity: Point) -> Option<NavigationDecision>
where
    S: crate::source::ItemSource,
    D: ViewerDelegate,
{
    viewer.handle(&GestureEvent::pan_start());
    viewer.handle(&GestureEvent::pan_update(dx / 2.0, dy / 2.0));
    viewer.handle(&GestureEvent::pan_update(dx, dy));
    viewer.handle(&GestureEvent::pan_end(Point::new(dx, dy), velocity))
}

fn slow_swipe(viewer: &mut TestViewer, dx: f32, dy: f32) -> Option<NavigationDecision> {
    swipe(viewer, dx, dy, Point::ZERO)
}

/// Run every animation to completion.
fn settle<S, D>(viewer: &mut Viewer<S, D>)
where
    S: crate::source::ItemSource,
    D: ViewerDelegate,
{
    viewer.advance(ms(1000));
}

fn assert_idle_at(viewer: &TestViewer, current: &str) {
    assert_eq!(viewer.state(), TransitionState::Idle);
    assert_eq!(viewer.cursor().current, id(current));
}
