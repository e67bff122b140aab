//! Point color and visibility.
//!
//! The render loop asks a [`PointStyler`] for every point: hidden points are
//! neither drawn nor hit-testable nor matched by box/lasso queries.

use crate::model::{AttrValue, Dataset, Point};
use std::collections::HashMap;
use std::fmt;

/// 8-bit RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// CSS `rgba(...)` string for Canvas2D-style hosts.
    pub fn to_css(&self) -> String {
        format!("rgba({}, {}, {}, {:.3})", self.r, self.g, self.b, self.a as f64 / 255.0)
    }
}

/// Palette for categorical attributes, assigned in first-seen order.
pub const CATEGORY_PALETTE: [Rgba; 10] = [
    Rgba::rgb(0x1f, 0x77, 0xb4),
    Rgba::rgb(0xff, 0x7f, 0x0e),
    Rgba::rgb(0x2c, 0xa0, 0x2c),
    Rgba::rgb(0xd6, 0x27, 0x28),
    Rgba::rgb(0x94, 0x67, 0xbd),
    Rgba::rgb(0x8c, 0x56, 0x4b),
    Rgba::rgb(0xe3, 0x77, 0xc2),
    Rgba::rgb(0x7f, 0x7f, 0x7f),
    Rgba::rgb(0xbc, 0xbd, 0x22),
    Rgba::rgb(0x17, 0xbe, 0xcf),
];

/// Fallback color for points without the color attribute.
pub const DEFAULT_POINT_COLOR: Rgba = Rgba::rgb(0x64, 0x74, 0x8b);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointStyle {
    pub color: Rgba,
    pub visible: bool,
}

/// Attribute color/filter provider.
pub trait PointStyler {
    fn style(&self, point: &Point) -> PointStyle;

    /// Color for an aggregate whose dominant category is `category`.
    fn category_color(&self, _category: &str) -> Option<Rgba> {
        None
    }

    /// Attribute used for category colors, if any.
    fn color_attribute(&self) -> Option<&str> {
        None
    }

    /// Called after a dataset reload so data-derived colors follow it.
    fn rebind(&mut self, _dataset: &Dataset) {}
}

/// Visibility predicate supplied by the host (e.g. a compiled query).
pub type VisibilityFilter = Box<dyn Fn(&Point) -> bool>;

/// Colors by one attribute and hides points rejected by an optional filter.
///
/// Text values get palette colors in first-seen order. Numeric values get a
/// red↔blue gradient over the dataset min/max.
pub struct AttributeStyler {
    attribute: Option<String>,
    categories: HashMap<String, Rgba>,
    numeric_range: Option<(f64, f64)>,
    filter: Option<VisibilityFilter>,
}

impl fmt::Debug for AttributeStyler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeStyler")
            .field("attribute", &self.attribute)
            .field("categories", &self.categories.len())
            .field("numeric_range", &self.numeric_range)
            .field("filtered", &self.filter.is_some())
            .finish()
    }
}

impl Default for AttributeStyler {
    fn default() -> Self {
        Self {
            attribute: None,
            categories: HashMap::new(),
            numeric_range: None,
            filter: None,
        }
    }
}

impl AttributeStyler {
    /// Build a styler coloring by `attribute` over `dataset`.
    pub fn new(dataset: &Dataset, attribute: Option<&str>) -> Self {
        let mut styler = Self {
            attribute: attribute.map(str::to_string),
            ..Self::default()
        };
        styler.rebind(dataset);
        styler
    }

    /// Recompute the palette and numeric range over `dataset`, keeping the
    /// attribute and filter.
    pub fn rebind(&mut self, dataset: &Dataset) {
        self.categories.clear();
        self.numeric_range = None;
        let Some(attr) = self.attribute.as_deref() else {
            return;
        };

        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for point in dataset.points() {
            match point.attr(attr) {
                Some(AttrValue::Text(s)) => {
                    let next = CATEGORY_PALETTE[self.categories.len() % CATEGORY_PALETTE.len()];
                    self.categories.entry(s.clone()).or_insert(next);
                }
                Some(AttrValue::Number(n)) => {
                    min = min.min(*n);
                    max = max.max(*n);
                }
                None => {}
            }
        }
        if min <= max {
            self.numeric_range = Some((min, max));
        }
    }

    /// Hide points for which `filter` returns `false`.
    pub fn with_filter(mut self, filter: impl Fn(&Point) -> bool + 'static) -> Self {
        self.filter = Some(Box::new(filter));
        self
    }

    pub fn set_filter(&mut self, filter: Option<VisibilityFilter>) {
        self.filter = filter;
    }

    fn numeric_color(&self, value: f64) -> Rgba {
        let Some((min, max)) = self.numeric_range else {
            return DEFAULT_POINT_COLOR;
        };
        let t = if max - min > 0.0 {
            ((value - min) / (max - min)).clamp(0.0, 1.0)
        } else {
            0.5
        };
        Rgba::rgb((255.0 * t).round() as u8, 0, (255.0 * (1.0 - t)).round() as u8)
    }
}

impl PointStyler for AttributeStyler {
    fn style(&self, point: &Point) -> PointStyle {
        let visible = self.filter.as_ref().is_none_or(|f| f(point));
        let color = match self.attribute.as_deref().and_then(|a| point.attr(a)) {
            Some(AttrValue::Text(s)) => self.categories.get(s).copied().unwrap_or(DEFAULT_POINT_COLOR),
            Some(AttrValue::Number(n)) => self.numeric_color(*n),
            None => DEFAULT_POINT_COLOR,
        };
        PointStyle { color, visible }
    }

    fn category_color(&self, category: &str) -> Option<Rgba> {
        self.categories.get(category).copied()
    }

    fn color_attribute(&self) -> Option<&str> {
        self.attribute.as_deref()
    }

    fn rebind(&mut self, dataset: &Dataset) {
        AttributeStyler::rebind(self, dataset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn dataset() -> Dataset {
        Dataset::new(vec![
            Point::new("a", 0.0, 0.0)
                .with_attr("category", AttrValue::Text("AI/ML".into()))
                .with_attr("sentiment", AttrValue::Number(-1.0)),
            Point::new("b", 1.0, 0.0)
                .with_attr("category", AttrValue::Text("Cooking".into()))
                .with_attr("sentiment", AttrValue::Number(1.0)),
            Point::new("c", 2.0, 0.0).with_attr("category", AttrValue::Text("AI/ML".into())),
        ])
    }

    #[test]
    fn categories_use_palette_in_first_seen_order() {
        let ds = dataset();
        let styler = AttributeStyler::new(&ds, Some("category"));
        assert_eq!(styler.style(&ds.points()[0]).color, CATEGORY_PALETTE[0]);
        assert_eq!(styler.style(&ds.points()[1]).color, CATEGORY_PALETTE[1]);
        assert_eq!(styler.style(&ds.points()[2]).color, CATEGORY_PALETTE[0]);
        assert_eq!(styler.category_color("Cooking"), Some(CATEGORY_PALETTE[1]));
    }

    #[test]
    fn numeric_gradient_spans_red_to_blue() {
        let ds = dataset();
        let styler = AttributeStyler::new(&ds, Some("sentiment"));
        assert_eq!(styler.style(&ds.points()[0]).color, Rgba::rgb(0, 0, 255));
        assert_eq!(styler.style(&ds.points()[1]).color, Rgba::rgb(255, 0, 0));
        assert_eq!(styler.style(&ds.points()[2]).color, DEFAULT_POINT_COLOR);
    }

    #[test]
    fn filter_controls_visibility() {
        let ds = dataset();
        let styler = AttributeStyler::new(&ds, None).with_filter(|p| p.id.as_str() != "b");
        let visible: Vec<bool> = ds.points().iter().map(|p| styler.style(p).visible).collect();
        assert_eq!(visible, vec![true, false, true]);
    }

    #[test]
    fn rebind_follows_new_categories_and_keeps_filter() {
        let mut styler = AttributeStyler::new(&dataset(), Some("category"))
            .with_filter(|p| p.id.as_str() != "y");
        let reloaded = Dataset::new(vec![
            Point::new("x", 0.0, 0.0).with_attr("category", AttrValue::Text("Travel".into())),
            Point::new("y", 1.0, 0.0).with_attr("category", AttrValue::Text("Health".into())),
        ]);
        PointStyler::rebind(&mut styler, &reloaded);

        assert_eq!(styler.style(&reloaded.points()[0]).color, CATEGORY_PALETTE[0]);
        assert_eq!(styler.style(&reloaded.points()[1]).color, CATEGORY_PALETTE[1]);
        assert_eq!(styler.category_color("AI/ML"), None);
        assert!(!styler.style(&reloaded.points()[1]).visible);
    }

    #[test]
    fn css_color_string() {
        assert_eq!(Rgba::rgb(1, 2, 3).with_alpha(0).to_css(), "rgba(1, 2, 3, 0.000)");
    }
}
