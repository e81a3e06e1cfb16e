//! Chat list mapping
//!
//! Turns store snapshots into render states and computes the row changes
//! between consecutive states.

pub mod builder;
pub mod cache;
pub mod diff;
pub mod render_state;

pub use builder::StateBuilder;
pub use cache::HydrationCache;
pub use diff::{
    apply_row_changes, calculate_diff, filter_dirty_ids, update_and_calculate_diff, ListDiff,
};
pub use render_state::RenderState;
