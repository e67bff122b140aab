//! Identifiers for points, grid cells, and pickable entities.

use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;

/// Global string interner for point IDs. The same string always resolves
/// to the same `PointId`, across dataset reloads.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// A lightweight, interned identifier for a data point.
/// Internally a `Spur` index: 4 bytes, `Copy`, O(1) `Eq` and `Hash`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PointId(Spur);

impl PointId {
    /// Intern a string as a PointId, or return the existing one.
    pub fn intern(s: &str) -> Self {
        PointId(INTERNER.get_or_intern(s))
    }

    /// Resolve back to a string slice.
    pub fn as_str(&self) -> &str {
        INTERNER.resolve(&self.0)
    }
}

impl fmt::Debug for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.as_str())
    }
}

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for PointId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for PointId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(PointId::intern(&s))
    }
}

/// Integer coordinates of a clustering grid cell in data space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct CellKey {
    pub cx: i64,
    pub cy: i64,
}

impl CellKey {
    /// The cell containing `(x, y)` for a grid of edge `grid_size`.
    pub fn containing(x: f64, y: f64, grid_size: f64) -> Self {
        Self {
            cx: (x / grid_size).floor() as i64,
            cy: (y / grid_size).floor() as i64,
        }
    }
}

/// Anything the hit tester can resolve a pointer to.
///
/// Selection never stores an `EntityId`: clusters are expanded to their
/// member `PointId`s first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityId {
    Point(PointId),
    Cluster(CellKey),
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Point(id) => f.write_str(id.as_str()),
            EntityId::Cluster(key) => write!(f, "cluster_{}_{}", key.cx, key.cy),
        }
    }
}
