//! Fetch/cache collaborators.
//!
//! The viewer never talks to the network itself. It reads an already-fetched
//! ordered list, asks for item details (which may still be pending), and
//! fires prefetch requests that nobody waits on.

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::item::{ItemDetail, ItemId, ItemSummary};

/// Default number of items per list page.
pub const DEFAULT_PER_PAGE: usize = 20;

/// Identifies one paginated list (a channel, the explore feed, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeedKey(pub String);

impl FeedKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }
}

impl fmt::Display for FeedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("item not found: {0}")]
    NotFound(ItemId),

    #[error("network error: {0}")]
    Network(String),

    #[error("request cancelled")]
    Cancelled,
}

/// Cached state of one item's detail record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailState {
    Ready(ItemDetail),
    Pending,
    Failed,
}

impl DetailState {
    pub fn ready(&self) -> Option<&ItemDetail> {
        match self {
            Self::Ready(detail) => Some(detail),
            _ => None,
        }
    }
}

pub trait ItemSource {
    /// Items fetched so far for `feed`, in request order. May be a prefix of
    /// the remote list.
    fn ordered_list(&self, feed: &FeedKey) -> Vec<ItemSummary>;

    /// Detail for `id`, or `Pending` while it is still being fetched.
    fn detail(&self, id: &ItemId) -> DetailState;

    /// Fire-and-forget warm-up of the detail cache. Failures are not reported.
    fn prefetch_detail(&self, id: &ItemId);
}

impl<T: ItemSource + ?Sized> ItemSource for Arc<T> {
    fn ordered_list(&self, feed: &FeedKey) -> Vec<ItemSummary> {
        (**self).ordered_list(feed)
    }

    fn detail(&self, id: &ItemId) -> DetailState {
        (**self).detail(id)
    }

    fn prefetch_detail(&self, id: &ItemId) {
        (**self).prefetch_detail(id)
    }
}

impl<T: ItemSource + ?Sized> ItemSource for &T {
    fn ordered_list(&self, feed: &FeedKey) -> Vec<ItemSummary> {
        (**self).ordered_list(feed)
    }

    fn detail(&self, id: &ItemId) -> DetailState {
        (**self).detail(id)
    }

    fn prefetch_detail(&self, id: &ItemId) {
        (**self).prefetch_detail(id)
    }
}

/// Pages of one feed, merged by page number rather than arrival order.
///
/// Page numbers start at 1. The visible list is the contiguous run of pages
/// starting at page 1, so a later page that lands first stays hidden until
/// the gap before it is filled.
#[derive(Debug, Clone)]
pub struct PagedFeed {
    per_page: usize,
    pages: BTreeMap<u32, Vec<ItemSummary>>,
    last_page: Option<u32>,
}

impl PagedFeed {
    pub fn new(per_page: usize) -> Self {
        Self {
            per_page: per_page.max(1),
            pages: BTreeMap::new(),
            last_page: None,
        }
    }

    pub fn per_page(&self) -> usize {
        self.per_page
    }

    /// Store a fetched page. A short page marks the end of the feed.
    pub fn insert_page(&mut self, page: u32, items: Vec<ItemSummary>) {
        if page == 0 {
            tracing::debug!("ignoring page 0; pages are numbered from 1");
            return;
        }
        if items.len() < self.per_page {
            self.last_page = Some(self.last_page.map_or(page, |last| last.min(page)));
        }
        self.pages.insert(page, items);
    }

    /// Number of pages contiguous from page 1.
    pub fn contiguous_pages(&self) -> u32 {
        let mut expected = 1;
        for &page in self.pages.keys() {
            if page != expected {
                break;
            }
            expected += 1;
        }
        expected - 1
    }

    /// The next page to request, or `None` once the end has been reached.
    pub fn next_page(&self) -> Option<u32> {
        let next = self.contiguous_pages() + 1;
        match self.last_page {
            Some(last) if next > last => None,
            _ => Some(next),
        }
    }

    pub fn has_more(&self) -> bool {
        self.next_page().is_some()
    }

    pub fn items(&self) -> Vec<ItemSummary> {
        let contiguous = self.contiguous_pages();
        if contiguous == 0 {
            return Vec::new();
        }
        self.pages
            .range(1..=contiguous)
            .flat_map(|(_, items)| items.iter().cloned())
            .collect()
    }

    pub fn clear(&mut self) {
        self.pages.clear();
        self.last_page = None;
    }
}

impl Default for PagedFeed {
    fn default() -> Self {
        Self::new(DEFAULT_PER_PAGE)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Synchronous in-memory source: everything is already loaded. Records
/// prefetch requests so callers can inspect them.
#[derive(Debug, Default)]
pub struct MemorySource {
    feeds: Mutex<HashMap<FeedKey, Vec<ItemSummary>>>,
    details: Mutex<HashMap<ItemId, DetailState>>,
    prefetches: Mutex<Vec<ItemId>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_feed(self, feed: FeedKey, items: Vec<ItemSummary>) -> Self {
        self.extend_feed(&feed, items);
        self
    }

    /// Append items to `feed`, as if another page had arrived.
    pub fn extend_feed(&self, feed: &FeedKey, items: Vec<ItemSummary>) {
        lock(&self.feeds).entry(feed.clone()).or_default().extend(items);
    }

    pub fn with_detail(self, detail: ItemDetail) -> Self {
        self.insert_detail(detail);
        self
    }

    pub fn insert_detail(&self, detail: ItemDetail) {
        lock(&self.details).insert(detail.id.clone(), DetailState::Ready(detail));
    }

    pub fn mark_failed(&self, id: &ItemId) {
        lock(&self.details).insert(id.clone(), DetailState::Failed);
    }

    /// Every prefetch request seen so far, in order.
    pub fn prefetch_log(&self) -> Vec<ItemId> {
        lock(&self.prefetches).clone()
    }
}

impl ItemSource for MemorySource {
    fn ordered_list(&self, feed: &FeedKey) -> Vec<ItemSummary> {
        lock(&self.feeds).get(feed).cloned().unwrap_or_default()
    }

    fn detail(&self, id: &ItemId) -> DetailState {
        lock(&self.details)
            .get(id)
            .cloned()
            .unwrap_or(DetailState::Pending)
    }

    fn prefetch_detail(&self, id: &ItemId) {
        lock(&self.prefetches).push(id.clone());
    }
}

/// Remote backend used by [`AsyncSource`].
pub trait Fetcher: Send + Sync + 'static {
    fn fetch_page(
        &self,
        feed: &FeedKey,
        page: u32,
        per_page: usize,
    ) -> BoxFuture<'static, Result<Vec<ItemSummary>, FetchError>>;

    fn fetch_detail(&self, id: &ItemId) -> BoxFuture<'static, Result<ItemDetail, FetchError>>;
}

/// Source backed by a [`Fetcher`] on a tokio runtime.
///
/// Detail requests run as spawned tasks. Dropping the source aborts every
/// task still in flight and their results are discarded.
pub struct AsyncSource<F: Fetcher> {
    fetcher: Arc<F>,
    runtime: Handle,
    per_page: usize,
    feeds: Mutex<HashMap<FeedKey, PagedFeed>>,
    details: Arc<Mutex<HashMap<ItemId, DetailState>>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl<F: Fetcher> AsyncSource<F> {
    pub fn new(fetcher: F, runtime: Handle) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            runtime,
            per_page: DEFAULT_PER_PAGE,
            feeds: Mutex::new(HashMap::new()),
            details: Arc::new(Mutex::new(HashMap::new())),
            tasks: Mutex::new(Vec::new()),
        }
    }

    pub fn with_per_page(mut self, per_page: usize) -> Self {
        self.per_page = per_page.max(1);
        self
    }

    /// Fetch one page of `feed` and merge it by page number.
    pub async fn load_page(&self, feed: &FeedKey, page: u32) -> Result<usize, FetchError> {
        let items = self.fetcher.fetch_page(feed, page, self.per_page).await?;
        let count = items.len();
        lock(&self.feeds)
            .entry(feed.clone())
            .or_insert_with(|| PagedFeed::new(self.per_page))
            .insert_page(page, items);
        tracing::debug!("feed {feed}: page {page} merged ({count} items)");
        Ok(count)
    }

    /// Fetch the first missing page of `feed`. Returns `Ok(None)` once the
    /// feed is exhausted.
    pub async fn load_next_page(&self, feed: &FeedKey) -> Result<Option<u32>, FetchError> {
        let next = lock(&self.feeds)
            .get(feed)
            .map_or(Some(1), |paged| paged.next_page());
        let Some(page) = next else {
            return Ok(None);
        };
        self.load_page(feed, page).await?;
        Ok(Some(page))
    }

    /// Wait for every spawned detail request to finish.
    pub async fn settle(&self) {
        let tasks: Vec<JoinHandle<()>> = lock(&self.tasks).drain(..).collect();
        for task in tasks {
            if let Err(e) = task.await {
                let err = if e.is_cancelled() {
                    FetchError::Cancelled
                } else {
                    FetchError::Network(e.to_string())
                };
                tracing::debug!("detail task ended early: {err}");
            }
        }
    }

    pub fn in_flight(&self) -> usize {
        let mut tasks = lock(&self.tasks);
        tasks.retain(|task| !task.is_finished());
        tasks.len()
    }

    fn spawn_detail(&self, id: &ItemId) {
        {
            let mut details = lock(&self.details);
            if matches!(
                details.get(id),
                Some(DetailState::Ready(_)) | Some(DetailState::Pending)
            ) {
                return;
            }
            details.insert(id.clone(), DetailState::Pending);
        }

        let request = self.fetcher.fetch_detail(id);
        let details = Arc::clone(&self.details);
        let id = id.clone();
        let task = self.runtime.spawn(async move {
            let state = match request.await {
                Ok(detail) => DetailState::Ready(detail),
                Err(e) => {
                    tracing::debug!("prefetch of {id} failed: {e}");
                    DetailState::Failed
                }
            };
            lock(&details).insert(id, state);
        });
        let mut tasks = lock(&self.tasks);
        tasks.retain(|task| !task.is_finished());
        tasks.push(task);
    }
}

impl<F: Fetcher> ItemSource for AsyncSource<F> {
    fn ordered_list(&self, feed: &FeedKey) -> Vec<ItemSummary> {
        lock(&self.feeds)
            .get(feed)
            .map(PagedFeed::items)
            .unwrap_or_default()
    }

    fn detail(&self, id: &ItemId) -> DetailState {
        let state = lock(&self.details).get(id).cloned();
        match state {
            Some(DetailState::Ready(detail)) => DetailState::Ready(detail),
            Some(DetailState::Pending) => DetailState::Pending,
            Some(DetailState::Failed) | None => {
                self.spawn_detail(id);
                DetailState::Pending
            }
        }
    }

    fn prefetch_detail(&self, id: &ItemId) {
        self.spawn_detail(id);
    }
}

impl<F: Fetcher> Drop for AsyncSource<F> {
    fn drop(&mut self) {
        for task in lock(&self.tasks).drain(..) {
            task.abort();
        }
    }
}
