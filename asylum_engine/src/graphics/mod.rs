pub mod blit;
pub mod compositor;
pub mod masked;
pub mod palette;
pub mod queue;
pub mod surface;

pub use compositor::{Compositor, DrawFlags};
pub use palette::{Palette, PaletteEngine, GREY_STEPS};
pub use queue::{DrawQueue, GraphicItemKind, GraphicQueueItem};
pub use surface::{Point, Rect, Surface, SCREEN_HEIGHT, SCREEN_WIDTH};
