//! Live Search Engine
//!
//! Two tiers of latency smoothing: query edits wait for a quiet period
//! (the debounce), and every recompute then yields to the scheduler once
//! before doing the work. Each input change bumps a generation; a recompute
//! whose generation is no longer current is discarded.

use crate::config::SearchConfig;
use crate::filter::SearchFilters;
use crate::results::SearchResultSet;
use crate::search::{quick_filters, search, QuickFilter};
use parking_lot::Mutex;
use pulse_core::{Clock, CollabBus, SearchEvent, WorkspaceSnapshot};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

struct SearchState {
    query: String,
    filters: SearchFilters,
    snapshot: Arc<WorkspaceSnapshot>,
    results: SearchResultSet,
    generation: u64,
    pending: Option<JoinHandle<()>>,
}

struct Inner {
    config: SearchConfig,
    bus: CollabBus,
    clock: Arc<dyn Clock>,
    state: Mutex<SearchState>,
    recomputes: AtomicU64,
}

impl Inner {
    /// Compute for `generation` and publish unless superseded
    fn recompute(&self, generation: u64) {
        let (query, filters, snapshot) = {
            let state = self.state.lock();
            if state.generation != generation {
                return;
            }
            (state.query.clone(), state.filters.clone(), Arc::clone(&state.snapshot))
        };

        let today = self.clock.today();
        let results = match search(&snapshot, &query, &filters, today, &self.config) {
            Ok(results) => results,
            Err(err) => {
                warn!(error = %err, %query, "search treated as no match");
                SearchResultSet::empty(query.as_str())
            }
        };

        let total = results.total;
        {
            let mut state = self.state.lock();
            if state.generation != generation {
                debug!(generation, "stale search results discarded");
                return;
            }
            state.results = results;
            state.pending = None;
        }
        self.recomputes.fetch_add(1, Ordering::Relaxed);
        debug!(%query, total, "search recomputed");
        self.bus.emit(SearchEvent::ResultsUpdated { query, total });
    }
}

/// Debounced multi-entity search over the current workspace snapshot
///
/// Cloning yields another handle to the same engine. Outside a Tokio
/// runtime, changes recompute immediately.
#[derive(Clone)]
pub struct LiveSearch {
    inner: Arc<Inner>,
}

impl LiveSearch {
    /// Create an engine over an empty workspace
    pub fn new(config: SearchConfig, bus: CollabBus, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                bus,
                clock,
                state: Mutex::new(SearchState {
                    query: String::new(),
                    filters: SearchFilters::default(),
                    snapshot: Arc::new(WorkspaceSnapshot::default()),
                    results: SearchResultSet::empty(""),
                    generation: 0,
                    pending: None,
                }),
                recomputes: AtomicU64::new(0),
            }),
        }
    }

    /// Replace the query; recomputes after the debounce period
    pub fn set_query(&self, text: impl Into<String>) {
        let text = text.into();
        self.change(self.inner.config.debounce(), |state| state.query = text);
    }

    /// Replace the filters
    pub fn set_filters(&self, filters: SearchFilters) {
        self.change(Duration::ZERO, |state| state.filters = filters);
    }

    /// Replace the searched collections
    pub fn set_collections(&self, snapshot: Arc<WorkspaceSnapshot>) {
        self.change(Duration::ZERO, |state| state.snapshot = snapshot);
    }

    /// Install a quick filter, clearing the query
    pub fn apply(&self, quick: &QuickFilter) {
        let filters = quick.filters.clone();
        debug!(label = quick.label, "quick filter applied");
        self.change(Duration::ZERO, |state| {
            state.query.clear();
            state.filters = filters;
        });
    }

    fn change(&self, delay: Duration, mutate: impl FnOnce(&mut SearchState)) {
        let generation = {
            let mut state = self.inner.state.lock();
            mutate(&mut state);
            state.generation += 1;
            if let Some(pending) = state.pending.take() {
                pending.abort();
            }
            state.generation
        };

        let Ok(handle) = Handle::try_current() else {
            self.inner.recompute(generation);
            return;
        };
        let inner = Arc::clone(&self.inner);
        let task = handle.spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            tokio::task::yield_now().await;
            inner.recompute(generation);
        });

        let mut state = self.inner.state.lock();
        if state.generation == generation {
            state.pending = Some(task);
        } else {
            task.abort();
        }
    }

    /// Run any pending recompute now instead of waiting for it
    pub async fn flush(&self) {
        let pending = {
            let mut state = self.inner.state.lock();
            state.pending.take().map(|task| (task, state.generation))
        };
        if let Some((task, generation)) = pending {
            task.abort();
            // Yield so the aborted task is torn down before computing
            tokio::task::yield_now().await;
            self.inner.recompute(generation);
        }
    }

    /// Latest results
    #[must_use]
    pub fn results(&self) -> SearchResultSet {
        self.inner.state.lock().results.clone()
    }

    /// Suggestions of the latest results
    #[must_use]
    pub fn suggestions(&self) -> Vec<String> {
        self.inner.state.lock().results.suggestions.clone()
    }

    /// Current query text
    #[must_use]
    pub fn query(&self) -> String {
        self.inner.state.lock().query.clone()
    }

    /// Current filters
    #[must_use]
    pub fn filters(&self) -> SearchFilters {
        self.inner.state.lock().filters.clone()
    }

    /// Quick filters with counts over the current collections
    #[must_use]
    pub fn quick_filters(&self) -> Vec<QuickFilter> {
        let snapshot = Arc::clone(&self.inner.state.lock().snapshot);
        quick_filters(&snapshot, self.inner.clock.today(), &self.inner.config)
    }

    /// Recomputes published so far
    #[must_use]
    pub fn recompute_count(&self) -> u64 {
        self.inner.recomputes.load(Ordering::Relaxed)
    }

    /// Cancel pending work
    pub fn shutdown(&self) {
        let mut state = self.inner.state.lock();
        state.generation += 1;
        if let Some(pending) = state.pending.take() {
            pending.abort();
        }
    }
}

impl fmt::Debug for LiveSearch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("LiveSearch")
            .field("query", &state.query)
            .field("generation", &state.generation)
            .field("total", &state.results.total)
            .finish_non_exhaustive()
    }
}
