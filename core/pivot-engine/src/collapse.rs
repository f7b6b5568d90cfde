//! FILENAME: core/pivot-engine/src/collapse.rs
//! Collapse State - which groups are folded into a single summary line.
//!
//! State is kept per axis and has two layers:
//! - level entries collapse every group of one dimension at once
//! - path entries override the level default for a single group
//!
//! Entries are stored with the axis dimensions they were recorded against so
//! they can be reconciled when dimensions move between axes. All operations
//! return a new state; nothing mutates in place.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::definition::{Axis, DimensionKey, ShowTotals};
use crate::{log_debug, log_warn};
use crate::path::DimensionPath;

// ============================================================================
// PER-AXIS STATE
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisCollapse {
    /// Axis dimensions at the time entries were recorded. Empty means the
    /// state is not bound to any dimensions yet.
    #[serde(default)]
    pub dimensions: Vec<DimensionKey>,

    /// Dimensions whose groups are all collapsed.
    #[serde(default)]
    pub levels: BTreeSet<DimensionKey>,

    /// Per-group overrides keyed by path key: true collapses the group,
    /// false expands it inside a collapsed level.
    #[serde(default)]
    pub paths: BTreeMap<String, bool>,
}

impl AxisCollapse {
    pub fn new(dimensions: &[DimensionKey]) -> Self {
        AxisCollapse {
            dimensions: dimensions.to_vec(),
            ..Default::default()
        }
    }

    /// Dimension of the group at `path`, if the state is bound.
    fn dimension_at(&self, path: &DimensionPath) -> Option<&DimensionKey> {
        if path.is_empty() {
            return None;
        }
        self.dimensions.get(path.len() - 1)
    }

    fn level_default(&self, dimension: Option<&DimensionKey>) -> bool {
        dimension.map(|d| self.levels.contains(d)).unwrap_or(false)
    }

    fn is_collapsed_with(&self, path: &DimensionPath, dimension: Option<&DimensionKey>) -> bool {
        if path.is_empty() {
            return false;
        }
        match self.paths.get(&path.to_key()) {
            Some(collapsed) => *collapsed,
            None => self.level_default(dimension),
        }
    }

    /// Drops overrides that merely restate their level default.
    fn normalize(&mut self) {
        let dimensions = self.dimensions.clone();
        let levels = self.levels.clone();
        self.paths.retain(|key, collapsed| {
            let depth = DimensionPath::parse_key(key).map(|p| p.len()).unwrap_or(0);
            let default = depth > 0
                && dimensions
                    .get(depth - 1)
                    .map(|d| levels.contains(d))
                    .unwrap_or(false);
            *collapsed != default
        });
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty() && self.paths.is_empty()
    }
}

// ============================================================================
// COLLAPSE STATE
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollapseState {
    #[serde(default)]
    pub rows: AxisCollapse,

    #[serde(default)]
    pub columns: AxisCollapse,
}

impl CollapseState {
    /// Empty state bound to the given axis dimensions.
    pub fn new(row_dimensions: &[DimensionKey], column_dimensions: &[DimensionKey]) -> Self {
        CollapseState {
            rows: AxisCollapse::new(row_dimensions),
            columns: AxisCollapse::new(column_dimensions),
        }
    }

    /// Builds a state from persisted parts. Overrides equal to their level
    /// default are discarded.
    pub fn from_parts(rows: AxisCollapse, columns: AxisCollapse) -> Self {
        let mut state = CollapseState { rows, columns };
        state.rows.normalize();
        state.columns.normalize();
        state
    }

    pub fn axis(&self, axis: Axis) -> &AxisCollapse {
        match axis {
            Axis::Row => &self.rows,
            Axis::Column => &self.columns,
        }
    }

    fn axis_mut(&mut self, axis: Axis) -> &mut AxisCollapse {
        match axis {
            Axis::Row => &mut self.rows,
            Axis::Column => &mut self.columns,
        }
    }

    /// Whether the group at `path` is marked collapsed. The axis root is
    /// never collapsed.
    pub fn is_collapsed(&self, axis: Axis, path: &DimensionPath) -> bool {
        let state = self.axis(axis);
        state.is_collapsed_with(path, state.dimension_at(path))
    }

    /// Same as [`is_collapsed`](Self::is_collapsed) with the group's
    /// dimension supplied by the caller, for use while walking a tree.
    pub fn is_collapsed_at(&self, axis: Axis, path: &DimensionPath, dimension: &DimensionKey) -> bool {
        self.axis(axis).is_collapsed_with(path, Some(dimension))
    }

    /// A collapse mark only takes effect when its dimension shows totals;
    /// otherwise there is no summary line to collapse into.
    pub fn is_effectively_collapsed(
        &self,
        axis: Axis,
        path: &DimensionPath,
        show_totals: &ShowTotals,
    ) -> bool {
        let state = self.axis(axis);
        match state.dimension_at(path) {
            Some(dimension) => {
                show_totals.is_enabled(dimension) && state.is_collapsed_with(path, Some(dimension))
            }
            None => false,
        }
    }

    /// Flips the group at `path`. Toggling twice restores the original state.
    /// An unbound axis carrying level entries cannot resolve the group's
    /// level default, so the toggle is ignored there.
    pub fn toggle(&self, axis: Axis, path: &DimensionPath) -> CollapseState {
        let mut next = self.clone();
        if path.is_empty() {
            return next;
        }
        let state = next.axis_mut(axis);
        if state.dimensions.is_empty() && !state.levels.is_empty() {
            log_warn!("COLLAPSE", "toggle {:?} {} ignored: axis is not bound", axis, path);
            return next;
        }
        let dimension = state.dimension_at(path).cloned();
        let current = state.is_collapsed_with(path, dimension.as_ref());
        let default = state.level_default(dimension.as_ref());
        let key = path.to_key();
        if !current == default {
            state.paths.remove(&key);
        } else {
            state.paths.insert(key, !current);
        }
        log_debug!("COLLAPSE", "toggle {:?} {} -> {}", axis, path, !current);
        next
    }

    /// Collapses or expands every group of `dimension` at once. Per-group
    /// overrides at that level are cleared. The axis must be bound (see
    /// [`reconcile`](Self::reconcile)); on an unbound axis this is a no-op.
    pub fn toggle_level(&self, axis: Axis, dimension: &str) -> CollapseState {
        let mut next = self.clone();
        let state = next.axis_mut(axis);
        if state.dimensions.is_empty() {
            log_warn!("COLLAPSE", "toggle level {:?} {} ignored: axis is not bound", axis, dimension);
            return next;
        }
        let depth = state.dimensions.iter().position(|d| d == dimension);
        if !state.levels.remove(dimension) {
            state.levels.insert(dimension.to_string());
        }
        if let Some(depth) = depth {
            state.paths.retain(|key, _| {
                DimensionPath::parse_key(key)
                    .map(|p| p.len() != depth + 1)
                    .unwrap_or(false)
            });
        }
        log_debug!("COLLAPSE", "toggle level {:?} {}", axis, dimension);
        next
    }

    pub fn is_level_collapsed(&self, axis: Axis, dimension: &str) -> bool {
        self.axis(axis).levels.contains(dimension)
    }

    /// Paths explicitly marked collapsed on an axis, in key order.
    pub fn collapsed_paths(&self, axis: Axis) -> Vec<DimensionPath> {
        self.paths_with(axis, true)
    }

    /// Paths explicitly expanded inside a collapsed level.
    pub fn expanded_paths(&self, axis: Axis) -> Vec<DimensionPath> {
        self.paths_with(axis, false)
    }

    fn paths_with(&self, axis: Axis, collapsed: bool) -> Vec<DimensionPath> {
        self.axis(axis)
            .paths
            .iter()
            .filter(|(_, v)| **v == collapsed)
            .filter_map(|(k, _)| DimensionPath::parse_key(k).ok())
            .collect()
    }

    /// Rebinds one axis to a new dimension list. A path entry of length k
    /// survives only when the first k dimensions are unchanged and the path
    /// still names a non-leaf group; a level entry survives while its
    /// dimension is still on the axis and not innermost. An unbound axis
    /// adopts the new dimensions and keeps whatever fits.
    pub fn reconcile(&self, axis: Axis, new_dimensions: &[DimensionKey]) -> CollapseState {
        let mut next = self.clone();
        let state = next.axis_mut(axis);
        let old_dimensions = if state.dimensions.is_empty() {
            new_dimensions.to_vec()
        } else {
            state.dimensions.clone()
        };

        if old_dimensions == new_dimensions && !state.dimensions.is_empty() {
            return next;
        }

        let before = state.paths.len() + state.levels.len();

        state.paths.retain(|key, _| match DimensionPath::parse_key(key) {
            Ok(path) => {
                let k = path.len();
                k > 0
                    && k < new_dimensions.len()
                    && k <= old_dimensions.len()
                    && old_dimensions[..k] == new_dimensions[..k]
            }
            Err(_) => false,
        });

        let inner = new_dimensions.len().saturating_sub(1);
        state
            .levels
            .retain(|level| new_dimensions[..inner].iter().any(|d| d == level));

        state.dimensions = new_dimensions.to_vec();
        state.normalize();

        let after = state.paths.len() + state.levels.len();
        if after < before {
            log_debug!(
                "COLLAPSE",
                "reconcile {:?}: dropped {} stale entries",
                axis,
                before - after
            );
        }
        next
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.columns.is_empty()
    }
}
