use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Change notification types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeNotification {
    /// These conversations were inserted, changed or removed
    ItemsChanged(HashSet<String>),
    /// Too much changed to track; rebuild everything
    ResetAll,
}

impl ChangeNotification {
    pub fn items<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ChangeNotification::ItemsChanged(ids.into_iter().map(Into::into).collect())
    }
}

/// What a flush did, mostly for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlushOutcome {
    /// The list isn't allowed to update right now. Pending work is kept.
    Ineligible,
    NothingPending,
    /// The render state was replaced and the renderer reloaded.
    Reloaded,
    /// Row changes were handed to the renderer.
    Applied { changes: usize },
    /// The incremental pass failed. The old state stays on screen and a
    /// full reset runs on the next flush.
    Escalated,
    /// The full rebuild failed and an empty state is shown.
    Degraded,
}

impl FlushOutcome {
    pub fn changed_render_state(&self) -> bool {
        matches!(
            self,
            FlushOutcome::Reloaded | FlushOutcome::Applied { .. } | FlushOutcome::Degraded
        )
    }
}
