pub mod controller;
pub mod input;
pub mod selection;
pub mod session;
pub mod shortcuts;
pub mod tools;

pub use controller::{SelectionContext, SelectionController, SelectionListener};
pub use input::{InputEvent, Modifiers};
pub use selection::SelectionSet;
pub use session::{Explorer, HoverInfo};
pub use shortcuts::{ShortcutAction, ShortcutMap};
pub use tools::{SelectionIntent, SelectionMode, ToolState};
