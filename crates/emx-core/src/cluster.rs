//! Grid clustering for render-time performance.
//!
//! When zoomed far out over a large dataset, points sharing a fixed-size
//! data-space grid cell collapse into one [`Cluster`]. Otherwise every point
//! becomes its own singleton cluster, so hit testing and selection always
//! have a one-to-one mapping when clustering is not needed.
//!
//! Clustering is a pure function of `(points, zoom)`. Cluster ids come from
//! cell coordinates, so a cell keeps its id frame-to-frame at a fixed zoom.

use crate::config::ExplorerConfig;
use crate::geometry::{running_centroid, running_mean};
use crate::id::{CellKey, EntityId, PointId};
use crate::model::Point;
use kurbo::Point as Pos;
use smallvec::{SmallVec, smallvec};
use std::collections::HashMap;

/// A render-time aggregate of one or more points.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    pub id: EntityId,
    /// Running mean of member positions (data space).
    pub centroid: Pos,
    /// Indices into the point slice the cluster was built from.
    pub members: SmallVec<[usize; 1]>,
}

impl Cluster {
    fn singleton(index: usize, point: &Point) -> Self {
        Self {
            id: EntityId::Point(point.id),
            centroid: point.position,
            members: smallvec![index],
        }
    }

    pub fn count(&self) -> usize {
        self.members.len()
    }

    pub fn is_singleton(&self) -> bool {
        self.members.len() == 1
    }

    /// Underlying point ids. Selection expands clusters through this.
    pub fn member_ids<'a>(&'a self, points: &'a [Point]) -> impl Iterator<Item = PointId> + 'a {
        self.members.iter().map(move |&i| points[i].id)
    }

    /// Rendered radius for this cluster, see [`cluster_radius`].
    pub fn radius(&self, base: f64) -> f64 {
        cluster_radius(self.count(), base)
    }

    /// Most common text value of `attribute` among members; ties go to the
    /// value seen first.
    pub fn dominant_category<'a>(&self, points: &'a [Point], attribute: &str) -> Option<&'a str> {
        let mut counts: Vec<(&'a str, usize)> = Vec::new();
        for &i in &self.members {
            let Some(value) = points[i].attr(attribute).and_then(|v| v.as_text()) else {
                continue;
            };
            match counts.iter_mut().find(|(v, _)| *v == value) {
                Some((_, n)) => *n += 1,
                None => counts.push((value, 1)),
            }
        }
        let mut best: Option<(&'a str, usize)> = None;
        for (value, n) in counts {
            if best.is_none_or(|(_, m)| n > m) {
                best = Some((value, n));
            }
        }
        best.map(|(value, _)| value)
    }

    /// Mean of a numeric attribute over the members that have it.
    pub fn mean_attribute(&self, points: &[Point], attribute: &str) -> Option<f64> {
        let mut mean = None;
        let mut n = 0;
        for &i in &self.members {
            if let Some(v) = points[i].attr(attribute).and_then(|v| v.as_number()) {
                n += 1;
                mean = Some(running_mean(mean.unwrap_or(0.0), n, v));
            }
        }
        mean
    }
}

/// Sub-linear size growth: `base * (ln(count) + 1)`, capped at `3 * base`.
pub fn cluster_radius(count: usize, base: f64) -> f64 {
    if count <= 1 {
        return base;
    }
    (base * ((count as f64).ln() + 1.0)).min(base * 3.0)
}

/// Decides whether to cluster and builds the clusters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusteringEngine {
    /// Cell edge in data units. Independent of zoom.
    pub grid_size: f64,
    /// Cluster only when `zoom <= zoom_threshold`.
    pub zoom_threshold: f64,
    /// Cluster only when at least this many points are candidates.
    pub min_points: usize,
}

impl Default for ClusteringEngine {
    fn default() -> Self {
        Self::new(&ExplorerConfig::default())
    }
}

impl ClusteringEngine {
    pub fn new(config: &ExplorerConfig) -> Self {
        Self {
            grid_size: config.cluster_grid_size,
            zoom_threshold: config.cluster_zoom_threshold,
            min_points: config.cluster_min_points,
        }
    }

    pub fn should_cluster(&self, count: usize, zoom: f64) -> bool {
        zoom <= self.zoom_threshold && count >= self.min_points
    }

    /// Cluster every point of `points`.
    pub fn cluster(&self, points: &[Point], zoom: f64) -> Vec<Cluster> {
        let all: Vec<usize> = (0..points.len()).collect();
        self.cluster_indices(points, &all, zoom)
    }

    /// Cluster the subset `candidates` (indices into `points`), e.g. only the
    /// visible points. Output follows first-member order.
    pub fn cluster_indices(&self, points: &[Point], candidates: &[usize], zoom: f64) -> Vec<Cluster> {
        if !self.should_cluster(candidates.len(), zoom) {
            return candidates
                .iter()
                .map(|&i| Cluster::singleton(i, &points[i]))
                .collect();
        }

        let mut clusters: Vec<Cluster> = Vec::new();
        let mut by_cell: HashMap<CellKey, usize> = HashMap::new();

        for &i in candidates {
            let pos = points[i].position;
            let key = CellKey::containing(pos.x, pos.y, self.grid_size);
            match by_cell.get(&key) {
                Some(&slot) => {
                    let cluster = &mut clusters[slot];
                    cluster.members.push(i);
                    cluster.centroid = running_centroid(cluster.centroid, cluster.members.len(), pos);
                }
                None => {
                    by_cell.insert(key, clusters.len());
                    clusters.push(Cluster {
                        id: EntityId::Cluster(key),
                        centroid: pos,
                        members: smallvec![i],
                    });
                }
            }
        }

        log::debug!(
            "clustered {} points into {} cells at zoom {:.2}",
            candidates.len(),
            clusters.len(),
            zoom
        );
        clusters
    }
}
