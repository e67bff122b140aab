//! Hit testing: screen position → entity, and box/lasso queries.
//!
//! All distances and containment tests are evaluated in screen pixels for
//! the current frame, so the effective pick radius does not change with zoom.

use emx_core::cluster::Cluster;
use emx_core::geometry::{point_in_polygon, rect_contains_inclusive};
use emx_core::{CoordinateTransform, EntityId, Point, PointId, PointStyler};
use kurbo::{Point as Pos, Rect};

/// Indices of the points the styler marks visible, in dataset order.
/// Hidden points take part in neither drawing nor any query below.
pub fn visible_candidates(points: &[Point], styler: &dyn PointStyler) -> Vec<usize> {
    points
        .iter()
        .enumerate()
        .filter(|(_, p)| styler.style(p).visible)
        .map(|(i, _)| i)
        .collect()
}

/// Find the entity closest to `screen` within `tolerance` pixels.
///
/// Ties keep the first candidate encountered. No match is `None`, not an
/// error.
pub fn hit_test(
    screen: Pos,
    candidates: &[Cluster],
    transform: &CoordinateTransform,
    tolerance: f64,
) -> Option<EntityId> {
    let data = transform.to_data(screen);
    log::trace!("hit test at screen {screen:?} (data {data:?})");

    let mut best: Option<(EntityId, f64)> = None;
    for cluster in candidates {
        let distance = transform.to_screen(cluster.centroid).distance(screen);
        if distance > tolerance {
            continue;
        }
        if best.is_none_or(|(_, d)| distance < d) {
            best = Some((cluster.id, distance));
        }
    }
    best.map(|(id, _)| id)
}

/// Ids of candidate points whose screen position lies in `rect`, edges
/// included.
pub fn hit_test_rect(
    rect: Rect,
    points: &[Point],
    candidates: &[usize],
    transform: &CoordinateTransform,
) -> Vec<PointId> {
    candidates
        .iter()
        .map(|&i| &points[i])
        .filter(|p| rect_contains_inclusive(rect, transform.to_screen(p.position)))
        .map(|p| p.id)
        .collect()
}

/// Ids of candidate points whose screen position is inside the polygon
/// (even-odd ray casting). Fewer than 3 vertices matches nothing.
pub fn hit_test_polygon(
    vertices: &[Pos],
    points: &[Point],
    candidates: &[usize],
    transform: &CoordinateTransform,
) -> Vec<PointId> {
    if vertices.len() < 3 {
        return Vec::new();
    }
    candidates
        .iter()
        .map(|&i| &points[i])
        .filter(|p| point_in_polygon(transform.to_screen(p.position), vertices))
        .map(|p| p.id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use emx_core::kurbo::{Size, Vec2};
    use emx_core::{AttributeStyler, ClusteringEngine, DataBounds, Dataset};
    use pretty_assertions::assert_eq;

    fn dataset() -> Dataset {
        // Bounds 0..100 on both axes: screen = 50 + 4 * data on a 500px canvas.
        Dataset::new(vec![
            Point::new("a", 0.0, 0.0),
            Point::new("b", 10.0, 0.0),
            Point::new("c", 100.0, 100.0),
            Point::new("d", 50.0, 50.0),
        ])
    }

    fn transform(ds: &Dataset, zoom: f64) -> CoordinateTransform {
        CoordinateTransform::new(ds.bounds(), Size::new(500.0, 500.0), 0.1, zoom, Vec2::ZERO)
    }

    #[test]
    fn picks_closest_within_tolerance() {
        let ds = dataset();
        let t = transform(&ds, 1.0);
        let clusters = ClusteringEngine::default().cluster(ds.points(), 1.0);

        // a at (50,50), b at (90,50)
        let hit = hit_test(Pos::new(55.0, 52.0), &clusters, &t, 9.0);
        assert_eq!(hit, Some(EntityId::Point(PointId::intern("a"))));
        let miss = hit_test(Pos::new(70.0, 50.0), &clusters, &t, 9.0);
        assert_eq!(miss, None);
    }

    #[test]
    fn equidistant_tie_keeps_first() {
        let ds = Dataset::new(vec![Point::new("t1", 0.0, 0.0), Point::new("t2", 2.0, 0.0)]);
        let bounds = DataBounds {
            min: Pos::new(0.0, 0.0),
            max: Pos::new(100.0, 100.0),
        };
        let t = CoordinateTransform::new(Some(bounds), Size::new(500.0, 500.0), 0.1, 1.0, Vec2::ZERO);
        let clusters = ClusteringEngine::default().cluster(ds.points(), 1.0);
        // t1 at x=50, t2 at x=58; query halfway.
        let hit = hit_test(Pos::new(54.0, 50.0), &clusters, &t, 9.0);
        assert_eq!(hit, Some(EntityId::Point(PointId::intern("t1"))));
    }

    #[test]
    fn tolerance_is_in_pixels_regardless_of_zoom() {
        let ds = dataset();
        let clusters = ClusteringEngine::default().cluster(ds.points(), 1.0);
        for zoom in [0.25, 1.0, 4.0] {
            let t = transform(&ds, zoom);
            let d = t.to_screen(Pos::new(50.0, 50.0));
            assert!(hit_test(d + Vec2::new(8.0, 0.0), &clusters, &t, 9.0).is_some(), "zoom {zoom}");
            assert!(hit_test(d + Vec2::new(0.0, 10.0), &clusters, &t, 9.0).is_none(), "zoom {zoom}");
        }
    }

    #[test]
    fn rect_query_is_inclusive() {
        let ds = dataset();
        let t = transform(&ds, 1.0);
        let all: Vec<usize> = (0..ds.len()).collect();
        // b sits exactly on the right edge.
        let ids = hit_test_rect(Rect::new(40.0, 40.0, 90.0, 60.0), ds.points(), &all, &t);
        assert_eq!(ids, vec![PointId::intern("a"), PointId::intern("b")]);
    }

    #[test]
    fn polygon_query_uses_screen_positions() {
        let ds = dataset();
        let t = transform(&ds, 1.0);
        let all: Vec<usize> = (0..ds.len()).collect();
        let quad = [
            Pos::new(400.0, 380.0),
            Pos::new(490.0, 420.0),
            Pos::new(470.0, 490.0),
            Pos::new(390.0, 470.0),
        ];
        let ids = hit_test_polygon(&quad, ds.points(), &all, &t);
        assert_eq!(ids, vec![PointId::intern("c")]);
        assert!(hit_test_polygon(&quad[..2], ds.points(), &all, &t).is_empty());
    }

    #[test]
    fn hidden_points_are_not_candidates() {
        let ds = dataset();
        let styler = AttributeStyler::new(&ds, None).with_filter(|p| p.id.as_str() != "c");
        assert_eq!(visible_candidates(ds.points(), &styler), vec![0, 1, 3]);
    }
}
