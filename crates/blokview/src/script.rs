//! Replayable gesture scripts.
//!
//! A script seeds an in-memory feed, opens a viewer on one item and plays a
//! list of steps against it: gesture events, waits, sheet moves and newly
//! loaded pages. Time only advances on `wait`, in fixed frame ticks.
//!
//! ```yaml
//! viewport: { width: 390, height: 844 }
//! items: [A, B, { id: C, placeholder_url: c-small.jpg }]
//! current: B
//! steps:
//!   - gesture: { kind: pan, phase: end, translation: { x: -200, y: 0 } }
//!   - wait: 250
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::config::ViewerConfig;
use crate::cursor::ViewerCursor;
use crate::decision::{Direction, NavigationDecision};
use crate::geometry::Size;
use crate::gesture::GestureEvent;
use crate::item::{ItemDetail, ItemId, ItemSummary};
use crate::source::{FeedKey, MemorySource};
use crate::transform::Frame;
use crate::viewer::{ImageSource, SheetCommand, TransitionState, Viewer, ViewerDelegate, ViewerSettings};

/// Length of one animation tick while waiting.
pub const FRAME: Duration = Duration::from_millis(16);

const DEFAULT_FEED: &str = "script";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Script {
    #[serde(default)]
    pub viewport: Size,

    #[serde(default = "default_feed")]
    pub feed: FeedKey,

    pub items: Vec<ScriptItem>,

    pub current: ItemId,

    /// Details that are already cached when the viewer opens.
    #[serde(default)]
    pub details: Vec<ItemDetail>,

    /// Overrides applied on top of the configured settings.
    #[serde(default)]
    pub settings: Option<ViewerConfig>,

    #[serde(default, with = "serde_yaml::with::singleton_map_recursive")]
    pub steps: Vec<Step>,
}

fn default_feed() -> FeedKey {
    FeedKey::new(DEFAULT_FEED)
}

/// A bare id or a full summary.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ScriptItem {
    Id(ItemId),
    Summary(ItemSummary),
}

impl ScriptItem {
    fn into_summary(self) -> ItemSummary {
        match self {
            Self::Id(id) => ItemSummary::new(id),
            Self::Summary(summary) => summary,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Gesture(GestureEvent),
    /// Milliseconds to let animations run.
    Wait(u64),
    /// Detail sheet position in `[0, 1]`.
    Sheet(f32),
    /// Another page of the feed arrived.
    Load(Vec<ScriptItem>),
    /// Detail for one item arrived.
    Detail(ItemDetail),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Callback {
    Dismiss,
    Advance { direction: Direction, target: ItemId },
    Sheet { command: SheetCommand },
}

/// Delegate that remembers every callback in order.
#[derive(Debug, Default)]
pub struct Recorder {
    pub callbacks: Vec<Callback>,
}

impl ViewerDelegate for Recorder {
    fn on_dismiss(&mut self) {
        self.callbacks.push(Callback::Dismiss);
    }

    fn on_advance(&mut self, direction: Direction, target: &ItemId) {
        self.callbacks.push(Callback::Advance {
            direction,
            target: target.clone(),
        });
    }

    fn on_sheet(&mut self, command: SheetCommand) {
        self.callbacks.push(Callback::Sheet { command });
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepDecision {
    /// Zero-based index into `steps`.
    pub step: usize,
    pub decision: NavigationDecision,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameRecord {
    pub elapsed_ms: u64,
    pub state: TransitionState,
    pub frame: Frame,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub decisions: Vec<StepDecision>,
    pub callbacks: Vec<Callback>,
    pub cursor: ViewerCursor,
    pub state: TransitionState,
    pub dismissed: bool,
    pub image: ImageSource,
    pub prefetched: Vec<ItemId>,
    pub final_frame: Frame,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub frames: Vec<FrameRecord>,
}

impl Script {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_yaml(&contents).with_context(|| format!("Invalid script {}", path.display()))
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let script: Script = serde_yaml::from_str(yaml)?;
        if script.viewport.width <= 0.0 || script.viewport.height <= 0.0 {
            anyhow::bail!(
                "Viewport must have a positive size, got {}x{}",
                script.viewport.width,
                script.viewport.height
            );
        }
        Ok(script)
    }

    /// `base` with this script's overrides applied.
    pub fn settings(&self, base: ViewerSettings) -> ViewerSettings {
        let mut settings = base;
        if let Some(overrides) = &self.settings {
            overrides.apply(&mut settings);
        }
        settings
    }

    /// Play every step and describe what the viewer did.
    pub fn run(&self, base: ViewerSettings, record_frames: bool) -> Report {
        let items: Vec<ItemSummary> = self
            .items
            .iter()
            .cloned()
            .map(ScriptItem::into_summary)
            .collect();
        let source = Arc::new(MemorySource::new().with_feed(self.feed.clone(), items));
        for detail in &self.details {
            source.insert_detail(detail.clone());
        }

        let mut viewer = Viewer::open(
            self.settings(base),
            self.viewport,
            Arc::clone(&source),
            Recorder::default(),
            self.feed.clone(),
            self.current.clone(),
        );

        let mut decisions = Vec::new();
        let mut frames = Vec::new();
        let mut elapsed = Duration::ZERO;

        for (index, step) in self.steps.iter().enumerate() {
            tracing::trace!("step {index}: {step:?}");
            match step {
                Step::Gesture(event) => {
                    if let Some(decision) = viewer.handle(event) {
                        decisions.push(StepDecision {
                            step: index,
                            decision,
                        });
                    }
                }
                Step::Wait(ms) => {
                    let mut remaining = Duration::from_millis(*ms);
                    while !remaining.is_zero() {
                        let dt = remaining.min(FRAME);
                        viewer.advance(dt);
                        elapsed += dt;
                        remaining -= dt;
                        if record_frames {
                            frames.push(record(&viewer, elapsed));
                        }
                    }
                    continue;
                }
                Step::Sheet(position) => viewer.set_sheet_position(*position),
                Step::Load(page) => {
                    let page = page.iter().cloned().map(ScriptItem::into_summary).collect();
                    source.extend_feed(&self.feed, page);
                    viewer.refresh_list();
                }
                Step::Detail(detail) => source.insert_detail(detail.clone()),
            }
            if record_frames {
                frames.push(record(&viewer, elapsed));
            }
        }

        Report {
            decisions,
            callbacks: viewer.delegate().callbacks.clone(),
            cursor: viewer.cursor().clone(),
            state: viewer.state(),
            dismissed: viewer.is_dismissed(),
            image: viewer.current_image(),
            prefetched: source.prefetch_log(),
            final_frame: viewer.frame(),
            frames,
        }
    }
}

fn record(viewer: &Viewer<Arc<MemorySource>, Recorder>, elapsed: Duration) -> FrameRecord {
    FrameRecord {
        elapsed_ms: elapsed.as_millis() as u64,
        state: viewer.state(),
        frame: viewer.frame(),
    }
}
