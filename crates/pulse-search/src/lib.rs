//! Pulse Search - live multi-entity search
//!
//! - [`LiveSearch`]: debounced, generation-checked recompute over the
//!   current workspace snapshot
//! - [`search()`]: the pure one-shot search it runs
//! - [`SearchFilters`] / [`QuickFilter`]: category toggles, exact filters and
//!   canned shortcuts
//!
//! Results are grouped projects, tasks, people, clients, and each recompute
//! is announced as a [`SearchEvent`](pulse_core::SearchEvent) on the bus.

#![warn(unreachable_pub)]

pub mod config;
pub mod filter;
pub mod live;
pub mod matcher;
pub mod results;
pub mod search;

pub use config::SearchConfig;
pub use filter::{CategorySet, DueWindow, EntityType, SearchFilters};
pub use live::LiveSearch;
pub use matcher::{Matcher, Rank, Searchable};
pub use results::{ResultGroup, ResultView, SearchHit, SearchResultSet};
pub use search::{quick_filters, search, QuickFilter};
