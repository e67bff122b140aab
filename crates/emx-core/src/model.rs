//! Point data model.
//!
//! A dataset is an ordered list of 2-D points, each carrying an open map of
//! text/number attributes. Points are immutable once loaded; a reload
//! replaces the whole `Dataset`.

use crate::id::PointId;
use kurbo::Point as Pos;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

// ─── Attributes ──────────────────────────────────────────────────────────

/// A single attribute value. Used for coloring and filtering only; the
/// geometry never looks at attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Number(f64),
    Text(String),
}

impl AttrValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            AttrValue::Number(n) => Some(*n),
            AttrValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttrValue::Text(s) => Some(s),
            AttrValue::Number(_) => None,
        }
    }
}

// ─── Point ───────────────────────────────────────────────────────────────

/// A data point: stable id, data-space position, and attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "PointRecord", into = "PointRecord")]
pub struct Point {
    pub id: PointId,
    pub position: Pos,
    pub attributes: BTreeMap<String, AttrValue>,
}

impl Point {
    pub fn new(id: &str, x: f64, y: f64) -> Self {
        Self {
            id: PointId::intern(id),
            position: Pos::new(x, y),
            attributes: BTreeMap::new(),
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attr(mut self, key: &str, value: AttrValue) -> Self {
        self.attributes.insert(key.to_string(), value);
        self
    }

    pub fn attr(&self, key: &str) -> Option<&AttrValue> {
        self.attributes.get(key)
    }
}

/// Wire shape of a point: `{ "id": .., "x": .., "y": .., ...attributes }`.
#[derive(Serialize, Deserialize)]
struct PointRecord {
    id: PointId,
    x: f64,
    y: f64,
    #[serde(flatten)]
    attributes: BTreeMap<String, AttrValue>,
}

impl From<PointRecord> for Point {
    fn from(r: PointRecord) -> Self {
        Self {
            id: r.id,
            position: Pos::new(r.x, r.y),
            attributes: r.attributes,
        }
    }
}

impl From<Point> for PointRecord {
    fn from(p: Point) -> Self {
        Self {
            id: p.id,
            x: p.position.x,
            y: p.position.y,
            attributes: p.attributes,
        }
    }
}

// ─── Bounds ──────────────────────────────────────────────────────────────

/// Per-axis extent of a dataset in data space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DataBounds {
    pub min: Pos,
    pub max: Pos,
}

impl DataBounds {
    /// Extent of the given positions, or `None` if there are none.
    pub fn from_positions(positions: impl IntoIterator<Item = Pos>) -> Option<Self> {
        let mut iter = positions.into_iter();
        let first = iter.next()?;
        let mut bounds = DataBounds {
            min: first,
            max: first,
        };
        for p in iter {
            bounds.min.x = bounds.min.x.min(p.x);
            bounds.min.y = bounds.min.y.min(p.y);
            bounds.max.x = bounds.max.x.max(p.x);
            bounds.max.y = bounds.max.y.max(p.y);
        }
        Some(bounds)
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }
}

// ─── Dataset ─────────────────────────────────────────────────────────────

static REVISION: AtomicU64 = AtomicU64::new(1);

/// The loaded point set, in provider order, with an id lookup.
#[derive(Debug, Clone)]
pub struct Dataset {
    points: Vec<Point>,
    index: HashMap<PointId, usize>,
    bounds: Option<DataBounds>,
    revision: u64,
}

impl Default for Dataset {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Dataset {
    /// Build a dataset. A repeated id keeps its first occurrence; later
    /// duplicates are dropped with a warning.
    pub fn new(points: Vec<Point>) -> Self {
        let mut index = HashMap::with_capacity(points.len());
        let mut unique = Vec::with_capacity(points.len());
        for point in points {
            if index.contains_key(&point.id) {
                log::warn!("dropping duplicate point id {}", point.id);
                continue;
            }
            index.insert(point.id, unique.len());
            unique.push(point);
        }
        let bounds = DataBounds::from_positions(unique.iter().map(|p| p.position));

        Self {
            points: unique,
            index,
            bounds,
            revision: REVISION.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Parse a JSON array of point records.
    pub fn from_json(json: &str) -> Result<Self, String> {
        let points: Vec<Point> =
            serde_json::from_str(json).map_err(|e| format!("invalid point data: {e}"))?;
        Ok(Self::new(points))
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, id: PointId) -> Option<&Point> {
        self.index.get(&id).map(|&i| &self.points[i])
    }

    pub fn index_of(&self, id: PointId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    pub fn contains(&self, id: PointId) -> bool {
        self.index.contains_key(&id)
    }

    /// Data-space extent; `None` for an empty dataset.
    pub fn bounds(&self) -> Option<DataBounds> {
        self.bounds
    }

    /// Unique per constructed dataset; changes on every reload.
    pub fn revision(&self) -> u64 {
        self.revision
    }
}
