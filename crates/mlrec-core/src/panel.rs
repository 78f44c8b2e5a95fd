//! Results panel: named output regions with generation tickets.
//!
//! Every operation starts by taking a [`Ticket`] for its region. Starting again
//! on the same region invalidates older tickets, so a slow response that
//! arrives after a newer request was issued is dropped instead of
//! overwriting the newer result.

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Region used by the single-panel operations.
pub const RESULTS_REGION: &str = "ml-results";

/// Claim on a region issued by [`ResultsPanel::begin`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    region: String,
    generation: u64,
}

impl Ticket {
    pub fn region(&self) -> &str {
        &self.region
    }
}

#[derive(Debug)]
struct Region {
    name: String,
    generation: u64,
    html: String,
    loading: bool,
}

#[derive(Debug, Default)]
struct PanelState {
    regions: Vec<Region>,
    alerts: Vec<String>,
}

impl PanelState {
    fn region_mut(&mut self, name: &str) -> Option<&mut Region> {
        self.regions.iter_mut().find(|r| r.name == name)
    }
}

/// Snapshot of one region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionView {
    pub name: String,
    pub html: String,
    /// True while only the loading text has been written.
    pub loading: bool,
}

type LoadingHook = Box<dyn Fn(&str, &str) + Send + Sync>;

#[derive(Default)]
pub struct ResultsPanel {
    state: Mutex<PanelState>,
    on_begin: Option<LoadingHook>,
}

impl fmt::Debug for ResultsPanel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultsPanel")
            .field("state", &self.state)
            .field("on_begin", &self.on_begin.is_some())
            .finish()
    }
}

impl ResultsPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls `hook(region, loading)` each time a region is claimed, so a
    /// front end can show progress while the request is in flight.
    #[must_use]
    pub fn on_begin(mut self, hook: impl Fn(&str, &str) + Send + Sync + 'static) -> Self {
        self.on_begin = Some(Box::new(hook));
        self
    }

    fn lock(&self) -> MutexGuard<'_, PanelState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claims `region`, shows `loading` in it and returns the new ticket.
    pub fn begin(&self, region: &str, loading: &str) -> Ticket {
        let mut state = self.lock();
        let generation = match state.region_mut(region) {
            Some(existing) => {
                existing.generation += 1;
                existing.html = loading.to_string();
                existing.loading = true;
                existing.generation
            }
            None => {
                state.regions.push(Region {
                    name: region.to_string(),
                    generation: 1,
                    html: loading.to_string(),
                    loading: true,
                });
                1
            }
        };

        drop(state);

        if let Some(hook) = &self.on_begin {
            hook(region, loading);
        }

        Ticket {
            region: region.to_string(),
            generation,
        }
    }

    /// Writes `html` into the ticket's region.
    ///
    /// Returns false (and leaves the region untouched) if a newer ticket has
    /// been issued for the region since.
    pub fn commit(&self, ticket: &Ticket, html: String) -> bool {
        let mut state = self.lock();
        let Some(region) = state.region_mut(&ticket.region) else {
            return false;
        };
        if region.generation != ticket.generation {
            tracing::debug!(
                region = %ticket.region,
                stale = ticket.generation,
                current = region.generation,
                "Discarding stale result"
            );
            return false;
        }
        region.html = html;
        region.loading = false;
        true
    }

    /// Records a user-facing alert. Alerts never touch region contents.
    pub fn alert(&self, message: impl Into<String>) {
        self.lock().alerts.push(message.into());
    }

    /// Removes and returns pending alerts.
    pub fn take_alerts(&self) -> Vec<String> {
        std::mem::take(&mut self.lock().alerts)
    }

    pub fn content(&self, region: &str) -> Option<String> {
        self.lock()
            .regions
            .iter()
            .find(|r| r.name == region)
            .map(|r| r.html.clone())
    }

    /// All regions in first-use order.
    pub fn regions(&self) -> Vec<RegionView> {
        self.lock()
            .regions
            .iter()
            .map(|r| RegionView {
                name: r.name.clone(),
                html: r.html.clone(),
                loading: r.loading,
            })
            .collect()
    }
}
