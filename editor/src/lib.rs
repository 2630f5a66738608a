pub(crate) mod editor;

pub use editor::{Editor, Effect};
