//! Drawable widgets built on the graphics layer

pub mod compass;
mod edge_renderer;
mod font;
mod selection_bounds;
mod text_anchor;
mod text_renderer;

pub use compass::{Compass, CompassKind};
pub use edge_renderer::{DirectEdgeRenderer, EdgeParams, EdgeRenderer, IndexedEdgeRenderer};
pub use font::{FontDescriptor, FontFactory, FontManager, FontTexture, Glyph, GridFontFactory, TextureFont};
pub use selection_bounds::SelectionBoundsRenderer;
pub use text_anchor::{PointTextAnchor, TextAlignment, TextAnchor};
pub use text_renderer::TextRenderer;
