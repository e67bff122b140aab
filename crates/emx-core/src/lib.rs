pub mod cluster;
pub mod config;
pub mod geometry;
pub mod id;
pub mod model;
pub mod style;
pub mod transform;
pub mod viewport;

pub use cluster::{Cluster, ClusteringEngine, cluster_radius};
pub use config::ExplorerConfig;
pub use id::{CellKey, EntityId, PointId};
pub use model::{AttrValue, DataBounds, Dataset, Point};
pub use style::{AttributeStyler, PointStyle, PointStyler, Rgba};
pub use transform::CoordinateTransform;
pub use viewport::{Viewport, ViewportController};

// Re-export kurbo geometry so downstream crates don't need a direct dependency
pub use kurbo;
