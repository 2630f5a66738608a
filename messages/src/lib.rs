// Types shared between the editor core and its clients.
//
// The editor consumes key events produced by an input source and produces
// frames consumed by a display sink. Neither side needs to know anything
// else about the other.

mod frame;
mod key;

pub use frame::{
    EditOverlay, Frame, Geometry, OverlayFrame, Pane, Point, PromptFrame, Size, StatusFrame,
};
pub use key::{Key, KeyEvent, KeyMods};
