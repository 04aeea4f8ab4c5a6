//! Put text *behind* the subject of a photo.
//!
//! The subject is cut out of the photo by a segmentation collaborator. Then
//! every render draws three layers, in order: the photo itself, the text,
//! and the cutout. Text survives only where the cutout is transparent, so
//! the subject appears to stand in front of it.
//!
//! - [`compose::render`]: the stateless three-layer compositor.
//! - [`placement::PlacementController`]: drag-to-position with clamping.
//! - [`editor::Editor`]: the session record tying both to a surface.
//! - [`loader::UploadWorker`]: background decode/segmentation, last write wins.

pub mod compose;
pub mod config;
pub mod draw;
pub mod editor;
pub mod error;
pub mod export;
pub mod font;
pub mod input;
pub mod layer;
pub mod loader;
pub mod logging;
pub mod placement;
pub mod segment;
pub mod surface;
pub mod types;

pub use compose::{render, RenderOutcome};
pub use editor::Editor;
pub use error::{Error, Result};
pub use layer::TextLayer;
pub use placement::{DragSession, PlacementController, PointerEvent};
pub use surface::{RasterSurface, Surface, TextMetrics};
pub use types::{ImagePair, Point};
