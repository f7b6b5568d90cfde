//! FILENAME: core/pivot-engine/src/path.rs
// PURPOSE: Group identity within one axis of the pivot hierarchy.
// CONTEXT: A path is the ordered list of dimension values from the axis root
// down to a group. Persisted collapse entries use the JSON text of the path
// (e.g. `["Affiliate"]`, `[1162]`), so the key format is part of the saved
// settings and must stay stable.

use engine::DimensionValue;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

use crate::error::{PivotError, PivotResult};

/// Most pivots nest three or fewer dimensions per axis.
pub type PathValues = SmallVec<[DimensionValue; 4]>;

/// Ordered dimension values identifying a group on one axis.
/// The empty path is the axis root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DimensionPath(PathValues);

impl DimensionPath {
    pub fn root() -> Self {
        DimensionPath(SmallVec::new())
    }

    pub fn from_values<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<DimensionValue>,
    {
        DimensionPath(values.into_iter().map(Into::into).collect())
    }

    pub fn values(&self) -> &[DimensionValue] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last(&self) -> Option<&DimensionValue> {
        self.0.last()
    }

    /// Returns a new path one level deeper.
    pub fn child(&self, value: DimensionValue) -> Self {
        let mut values = self.0.clone();
        values.push(value);
        DimensionPath(values)
    }

    pub fn parent(&self) -> Option<Self> {
        if self.0.is_empty() {
            None
        } else {
            Some(self.prefix(self.0.len() - 1))
        }
    }

    /// The first `len` values (the whole path if it is shorter).
    pub fn prefix(&self, len: usize) -> Self {
        DimensionPath(self.0.iter().take(len).cloned().collect())
    }

    pub fn starts_with(&self, other: &DimensionPath) -> bool {
        self.0.len() >= other.0.len() && self.0[..other.0.len()] == other.0[..]
    }

    /// True when `self` lies strictly below `ancestor`.
    pub fn is_strict_descendant_of(&self, ancestor: &DimensionPath) -> bool {
        self.0.len() > ancestor.0.len() && self.starts_with(ancestor)
    }

    /// Serialized form used as the persisted collapse key.
    pub fn to_key(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_else(|_| String::from("[]"))
    }

    /// Parses a persisted collapse key. The key must be a JSON array.
    pub fn parse_key(key: &str) -> PivotResult<Self> {
        let values: Vec<DimensionValue> = serde_json::from_str(key.trim())
            .map_err(|e| PivotError::InvalidCollapsedPath(format!("{}: {}", key, e)))?;
        Ok(DimensionPath(values.into_iter().collect()))
    }
}

impl fmt::Display for DimensionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels: Vec<String> = self.0.iter().map(|v| v.display_value()).collect();
        write!(f, "{}", labels.join(" / "))
    }
}

impl From<Vec<DimensionValue>> for DimensionPath {
    fn from(values: Vec<DimensionValue>) -> Self {
        DimensionPath(values.into_iter().collect())
    }
}
