//! Load coordination
//!
//! Collects change notifications between flushes and decides whether the
//! next flush rebuilds the list from scratch or diffs it incrementally.
//!
//! Everything here runs on the list's own thread. Producers on other
//! threads talk to the coordinator through the [`ChangeNotification`]
//! channel; the coordinator drains it at the start of every flush.

mod notifications;

pub use notifications::{ChangeNotification, FlushOutcome};

use flume::{Receiver, Sender};
use std::collections::HashSet;
use tracing::{debug, error, info, warn};

use crate::config::ListConfig;
use crate::mapping::builder::degraded_state;
use crate::mapping::{update_and_calculate_diff, RenderState, StateBuilder};
use crate::source::ItemSource;
use crate::types::{RowChange, ViewMode};

/// Receives the result of every flush that changed the list.
pub trait ListRenderer {
    /// Discard everything on screen and show `state`.
    fn reload(&mut self, state: &RenderState);

    /// Animate `changes`, after which `state` is on screen.
    fn apply(&mut self, state: &RenderState, changes: &[RowChange]);
}

pub struct LoadCoordinator {
    builder: StateBuilder,
    max_incremental_row_changes: usize,
    mode: ViewMode,
    render_state: RenderState,
    reset_all: bool,
    dirty_ids: HashSet<String>,
    eligible: bool,
    notification_tx: Sender<ChangeNotification>,
    notification_rx: Receiver<ChangeNotification>,
}

impl LoadCoordinator {
    /// The first flush always performs a full load.
    pub fn new(config: &ListConfig, mode: ViewMode) -> Self {
        let (tx, rx) = flume::unbounded();
        Self {
            builder: StateBuilder::new(config),
            max_incremental_row_changes: config.max_incremental_row_changes,
            mode,
            render_state: RenderState::default(),
            reset_all: true,
            dirty_ids: HashSet::new(),
            eligible: true,
            notification_tx: tx,
            notification_rx: rx,
        }
    }

    /// Sender for change notifications. Safe to clone and move to other
    /// threads.
    pub fn notifier(&self) -> Sender<ChangeNotification> {
        self.notification_tx.clone()
    }

    pub fn render_state(&self) -> &RenderState {
        &self.render_state
    }

    pub fn view_mode(&self) -> ViewMode {
        self.mode
    }

    pub fn is_eligible(&self) -> bool {
        self.eligible
    }

    /// Flushes while ineligible (e.g. the list is off screen) do nothing and
    /// keep the pending work for later.
    pub fn set_eligible(&mut self, eligible: bool) {
        self.eligible = eligible;
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        if self.mode == mode {
            return;
        }
        info!(
            "Switching chat list from {} to {}",
            self.mode.as_str(),
            mode.as_str()
        );
        self.mode = mode;
        self.schedule_full_reset();
    }

    pub fn has_pending_changes(&self) -> bool {
        self.reset_all || !self.dirty_ids.is_empty()
    }

    pub fn schedule_full_reset(&mut self) {
        self.reset_all = true;
        self.dirty_ids.clear();
    }

    pub fn schedule_incremental<I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = String>,
    {
        if self.reset_all {
            return;
        }
        self.dirty_ids.extend(ids);

        if self.dirty_ids.len() > self.max_incremental_row_changes {
            debug!(
                "{} dirty conversations exceed {}, scheduling full reset",
                self.dirty_ids.len(),
                self.max_incremental_row_changes
            );
            self.schedule_full_reset();
        }
    }

    /// Fold every queued notification into the pending state without
    /// blocking. Returns the number of notifications handled.
    pub fn drain_notifications(&mut self) -> usize {
        let mut handled = 0;
        loop {
            match self.notification_rx.try_recv() {
                Ok(ChangeNotification::ItemsChanged(ids)) => self.schedule_incremental(ids),
                Ok(ChangeNotification::ResetAll) => self.schedule_full_reset(),
                // We hold a sender ourselves, so the channel never disconnects.
                Err(flume::TryRecvError::Empty | flume::TryRecvError::Disconnected) => break,
            }
            handled += 1;
        }
        handled
    }

    /// Bring the render state up to date with `source`, which must be a
    /// consistent snapshot of the store for the duration of the call.
    pub fn flush_if_needed<S, R>(&mut self, source: &S, renderer: &mut R) -> FlushOutcome
    where
        S: ItemSource + ?Sized,
        R: ListRenderer + ?Sized,
    {
        self.drain_notifications();

        if !self.eligible {
            return FlushOutcome::Ineligible;
        }

        let reset_all = std::mem::take(&mut self.reset_all);
        let dirty_ids = std::mem::take(&mut self.dirty_ids);

        if reset_all {
            return self.reload(source, renderer);
        }
        if dirty_ids.is_empty() {
            return FlushOutcome::NothingPending;
        }

        match update_and_calculate_diff(
            &mut self.builder,
            self.mode,
            &self.render_state,
            &dirty_ids,
            source,
        ) {
            Ok(diff) => {
                let changes = diff.row_changes.len();
                self.render_state = diff.render_state;
                renderer.apply(&self.render_state, &diff.row_changes);
                FlushOutcome::Applied { changes }
            }
            Err(e) => {
                if e.is_invariant_violation() {
                    error!("Incremental chat list update failed: {}", e);
                } else {
                    warn!("Incremental chat list update failed: {}", e);
                }
                self.schedule_full_reset();
                FlushOutcome::Escalated
            }
        }
    }

    fn reload<S, R>(&mut self, source: &S, renderer: &mut R) -> FlushOutcome
    where
        S: ItemSource + ?Sized,
        R: ListRenderer + ?Sized,
    {
        self.builder.cache_mut().clear();

        let outcome = match self.builder.build(self.mode, source) {
            Ok(state) => {
                self.render_state = state;
                FlushOutcome::Reloaded
            }
            Err(e) => {
                error!("Failed to reload chat list ({}): {}", self.mode.as_str(), e);
                self.render_state = degraded_state(source);
                FlushOutcome::Degraded
            }
        };
        renderer.reload(&self.render_state);
        outcome
    }
}
