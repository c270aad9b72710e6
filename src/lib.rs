//! Entity-relationship diagrams from a hand-laid-out schema: fixed entity
//! positions, authored orthogonal routes with cardinality caps, and
//! free-floating notes, rendered to PNG, SVG or PDF.

pub mod error;
pub mod fonts;
pub mod geometry;
pub mod raster;
pub mod render;
pub mod route;
pub mod schema;
pub mod theme;
pub mod validate;

pub use error::{ErdError, Result};
pub use fonts::{FontContext, FontFiles};
pub use geometry::{Direction, Geometry, Point, Rect, Side};
pub use route::{Coord, Route, Waypoint};
pub use schema::{Attribute, Canvas, Diagram, Entity, Note};
pub use theme::Style;

/// Renders the diagram to an SVG document with labels set in the context's
/// font family.
pub fn render_svg(diagram: &Diagram, style: &Style, fonts: &FontContext) -> Result<String> {
    render::SvgRenderer::new(diagram, style, &fonts.family).render()
}
