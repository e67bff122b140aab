//! Shared screen-space geometry helpers.

use kurbo::{Point, Rect};

/// Axis-aligned rectangle spanned by two opposite corners, in either order.
pub fn normalized_rect(a: Point, b: Point) -> Rect {
    Rect::new(a.x.min(b.x), a.y.min(b.y), a.x.max(b.x), a.y.max(b.y))
}

/// Containment including all four edges.
///
/// `kurbo::Rect::contains` is half-open on the far edges, which would drop
/// points lying exactly on the right/bottom side of a brush.
pub fn rect_contains_inclusive(rect: Rect, p: Point) -> bool {
    p.x >= rect.x0 && p.x <= rect.x1 && p.y >= rect.y0 && p.y <= rect.y1
}

/// Even-odd ray casting. A polygon with fewer than 3 vertices contains
/// nothing.
pub fn point_in_polygon(p: Point, vertices: &[Point]) -> bool {
    if vertices.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = vertices.len() - 1;
    for i in 0..vertices.len() {
        let (vi, vj) = (vertices[i], vertices[j]);
        if (vi.y > p.y) != (vj.y > p.y)
            && p.x < (vj.x - vi.x) * (p.y - vi.y) / (vj.y - vi.y) + vi.x
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Incremental mean: fold `sample` into a mean over `n - 1` samples.
pub fn running_mean(mean: f64, n: usize, sample: f64) -> f64 {
    let n = n as f64;
    (mean * (n - 1.0) + sample) / n
}

/// Incremental centroid, component-wise [`running_mean`].
pub fn running_centroid(centroid: Point, n: usize, sample: Point) -> Point {
    Point::new(
        running_mean(centroid.x, n, sample.x),
        running_mean(centroid.y, n, sample.y),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<Point> {
        vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        ]
    }

    #[test]
    fn normalized_rect_is_order_independent() {
        let a = Point::new(30.0, 5.0);
        let b = Point::new(-10.0, 50.0);
        assert_eq!(normalized_rect(a, b), normalized_rect(b, a));
        assert_eq!(normalized_rect(a, b), Rect::new(-10.0, 5.0, 30.0, 50.0));
    }

    #[test]
    fn inclusive_rect_counts_far_edges() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(rect_contains_inclusive(r, Point::new(10.0, 10.0)));
        assert!(rect_contains_inclusive(r, Point::new(0.0, 5.0)));
        assert!(!rect_contains_inclusive(r, Point::new(10.01, 5.0)));
    }

    #[test]
    fn ray_casting_square_and_concave() {
        assert!(point_in_polygon(Point::new(5.0, 5.0), &square()));
        assert!(!point_in_polygon(Point::new(15.0, 5.0), &square()));

        // U shape: the notch between the arms is outside.
        let u = vec![
            Point::new(0.0, 0.0),
            Point::new(30.0, 0.0),
            Point::new(30.0, 30.0),
            Point::new(20.0, 30.0),
            Point::new(20.0, 10.0),
            Point::new(10.0, 10.0),
            Point::new(10.0, 30.0),
            Point::new(0.0, 30.0),
        ];
        assert!(point_in_polygon(Point::new(5.0, 20.0), &u));
        assert!(!point_in_polygon(Point::new(15.0, 20.0), &u));
    }

    #[test]
    fn degenerate_polygon_contains_nothing() {
        let line = vec![Point::new(0.0, 0.0), Point::new(10.0, 10.0)];
        assert!(!point_in_polygon(Point::new(5.0, 5.0), &line));
    }

    #[test]
    fn running_centroid_matches_mean() {
        let samples = [Point::new(0.0, 0.0), Point::new(4.0, 2.0), Point::new(2.0, 7.0)];
        let mut c = samples[0];
        for (i, s) in samples.iter().enumerate().skip(1) {
            c = running_centroid(c, i + 1, *s);
        }
        assert!((c.x - 2.0).abs() < 1e-12);
        assert!((c.y - 3.0).abs() < 1e-12);
    }
}
