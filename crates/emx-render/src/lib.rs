pub mod hit;
pub mod layers;
pub mod paint;
pub mod render_loop;

pub use layers::{Chrome, ChromeUpdate, DrawPoint, Frame, Overlay, Renderer};
pub use render_loop::{FrameInput, RenderLoop};
