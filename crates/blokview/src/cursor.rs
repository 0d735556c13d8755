//! Previous / current / next resolution over an already-loaded list.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::decision::{Direction, Neighbors};
use crate::item::{ItemId, ItemSummary};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewerCursor {
    pub current: ItemId,
    pub previous: Option<ItemId>,
    pub next: Option<ItemId>,
}

impl ViewerCursor {
    /// Locate `current` in `list` by linear scan. An id that is not in the
    /// list resolves with no neighbours rather than failing.
    pub fn resolve(list: &[ItemSummary], current: &ItemId) -> Self {
        let Some(index) = list.iter().position(|item| &item.id == current) else {
            return Self::unresolved(current.clone());
        };

        let previous = index
            .checked_sub(1)
            .and_then(|i| list.get(i))
            .map(|item| item.id.clone());
        let next = list.get(index + 1).map(|item| item.id.clone());

        Self {
            current: current.clone(),
            previous,
            next,
        }
    }

    /// A cursor with navigation disabled in both directions.
    pub fn unresolved(current: ItemId) -> Self {
        Self {
            current,
            previous: None,
            next: None,
        }
    }

    pub fn neighbors(&self) -> Neighbors {
        Neighbors {
            previous: self.previous.is_some(),
            next: self.next.is_some(),
        }
    }

    pub fn neighbor(&self, direction: Direction) -> Option<&ItemId> {
        match direction {
            Direction::Next => self.next.as_ref(),
            Direction::Previous => self.previous.as_ref(),
        }
    }

    /// Ids worth fetching ahead of time: both neighbours, nearest first.
    pub fn prefetch_targets(&self) -> Vec<ItemId> {
        self.next
            .iter()
            .chain(self.previous.iter())
            .cloned()
            .collect()
    }
}

impl fmt::Display for ViewerCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |id: &Option<ItemId>| {
            id.as_ref()
                .map(|id| id.to_string())
                .unwrap_or_else(|| "-".to_string())
        };
        write!(
            f,
            "{} <- [{}] -> {}",
            show(&self.previous),
            self.current,
            show(&self.next)
        )
    }
}
