pub mod batch;
pub mod bus;
pub mod clipboard;
pub mod drag;
pub mod editor;
pub mod error;
pub mod gesture;
pub mod input;
pub mod layers;
pub mod resize;
pub mod selection;
pub mod shortcuts;

pub use bus::{Command, CommandSink, Outbox};
pub use clipboard::{Clipboard, Pasted};
pub use editor::Editor;
pub use error::EditorError;
pub use gesture::{Gesture, GestureKind};
pub use input::{InputEvent, Modifiers, PointerButton, Touch};
pub use selection::Selection;
pub use shortcuts::{HeldMode, ShortcutAction, ShortcutMap};
