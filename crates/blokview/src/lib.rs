//! Gesture-driven image viewer core.
//!
//! Integrates pinch, two-finger pan and single-finger pan gestures into a
//! composed affine transform, classifies completed gestures into dismiss,
//! advance or snap-back decisions, and tracks the previous/current/next
//! position of the viewed item within an already-fetched, paginated list.
//! Rendering, fetching and the surrounding navigation host are collaborators
//! behind [`source::ItemSource`] and [`viewer::ViewerDelegate`].

pub mod animation;
pub mod cli;
pub mod commands;
pub mod config;
pub mod cursor;
pub mod decision;
pub mod geometry;
pub mod gesture;
pub mod item;
pub mod logging;
pub mod script;
pub mod source;
pub mod transform;
pub mod viewer;
