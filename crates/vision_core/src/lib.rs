//! vision_core: overlay drawing for object and grasp detections.

pub mod canvas;
pub mod error;
pub mod overlay;
pub mod palette;
pub mod viewer;

pub use canvas::{Canvas, Typeface};
pub use error::RenderError;
pub use viewer::DataViewer;

pub mod prelude {
    pub use crate::canvas::{Canvas, Typeface};
    pub use crate::error::RenderError;
    pub use crate::palette::*;
    pub use crate::viewer::DataViewer;
}
