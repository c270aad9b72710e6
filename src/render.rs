//! Builds the diagram as an SVG document, painted in a fixed order: route
//! lines, route caps, entities, notes. Later layers cover earlier ones.

use std::fmt::Write as _;

use serde::Serialize;

use crate::error::{ErdError, Result};
use crate::geometry::{Geometry, Point, Rect};
use crate::route::{crow_foot, one_mark, RoutePath};
use crate::schema::{Diagram, Entity, Note};
use crate::theme::Style;

/// Text is positioned by its top edge; SVG wants a baseline.
const ASCENT: f32 = 0.8;

pub fn escape_xml(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            c if (c as u32) < 0x20 && !matches!(c, '\t' | '\n' | '\r') => {}
            c => escaped.push(c),
        }
    }
    escaped
}

pub struct SvgRenderer<'a> {
    geometry: Geometry<'a>,
    style: &'a Style,
    font_family: String,
    svg: String,
}

impl<'a> SvgRenderer<'a> {
    pub fn new(diagram: &'a Diagram, style: &'a Style, font_family: &str) -> Self {
        Self {
            geometry: Geometry::new(diagram, style),
            style,
            font_family: escape_xml(font_family),
            svg: String::new(),
        }
    }

    /// Renders the whole diagram. Fails on the first entity or route that
    /// cannot be placed.
    pub fn render(mut self) -> Result<String> {
        let diagram = self.geometry.diagram();
        let canvas = &diagram.canvas;

        let _ = write!(
            self.svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" shape-rendering="crispEdges">"#,
            w = canvas.width,
            h = canvas.height,
        );
        let _ = write!(
            self.svg,
            r#"<rect class="background" x="0" y="0" width="{}" height="{}" fill="{}"/>"#,
            canvas.width,
            canvas.height,
            escape_xml(&canvas.background)
        );

        let mut paths = Vec::with_capacity(diagram.routes.len());
        for route in &diagram.routes {
            let points = route.resolve(&self.geometry)?;
            tracing::debug!(route = %route.label(), bends = points.len().saturating_sub(2), "route resolved");
            paths.push(points);
        }

        self.svg.push_str(r#"<g class="routes">"#);
        for points in &paths {
            self.render_polyline(points);
        }
        self.svg.push_str("</g>");

        self.svg.push_str(r#"<g class="caps">"#);
        for (route, points) in diagram.routes.iter().zip(&paths) {
            let (Some(start), Some(end)) = (points.first(), points.last()) else {
                continue;
            };
            let (a, b) = one_mark(*start, route.source_direction(), self.style);
            self.render_cap_line(a, b);
            for (a, b) in crow_foot(*end, route.target_direction(), self.style) {
                self.render_cap_line(a, b);
            }
        }
        self.svg.push_str("</g>");

        self.svg.push_str(r#"<g class="entities">"#);
        for entity in &diagram.entities {
            let bounds = self.geometry.entity_box(&entity.name)?;
            self.render_entity(entity, bounds);
        }
        self.svg.push_str("</g>");

        self.svg.push_str(r#"<g class="notes">"#);
        for note in &diagram.notes {
            self.render_note(note);
        }
        self.svg.push_str("</g>");

        self.svg.push_str("</svg>\n");
        Ok(self.svg)
    }

    fn render_polyline(&mut self, points: &[Point]) {
        let mut coords = String::new();
        for (i, p) in points.iter().enumerate() {
            if i > 0 {
                coords.push(' ');
            }
            let _ = write!(coords, "{:.2},{:.2}", p.x, p.y);
        }
        let _ = write!(
            self.svg,
            r#"<polyline points="{}" fill="none" stroke="{}" stroke-width="{:.1}"/>"#,
            coords,
            escape_xml(&self.style.line_color),
            self.style.route_stroke
        );
    }

    fn render_cap_line(&mut self, a: Point, b: Point) {
        let _ = write!(
            self.svg,
            r#"<line x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}" stroke="{}" stroke-width="{:.1}"/>"#,
            a.x,
            a.y,
            b.x,
            b.y,
            escape_xml(&self.style.line_color),
            self.style.cap_stroke
        );
    }

    fn rect(&mut self, x: f32, y: f32, width: f32, height: f32, fill: &str, stroke: Option<&str>) {
        let _ = write!(
            self.svg,
            r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="{}""#,
            x,
            y,
            width,
            height,
            escape_xml(fill)
        );
        if let Some(stroke) = stroke {
            let _ = write!(self.svg, r#" stroke="{}" stroke-width="1""#, escape_xml(stroke));
        }
        self.svg.push_str("/>");
    }

    fn text(&mut self, x: f32, top: f32, content: &str, size: f32, bold: bool, fill: &str) {
        if content.trim().is_empty() {
            return;
        }
        let _ = write!(
            self.svg,
            r#"<text x="{:.2}" y="{:.2}" font-family="{}" font-size="{:.1}"{} fill="{}" xml:space="preserve">{}</text>"#,
            x,
            top + size * ASCENT,
            self.font_family,
            size,
            if bold { r#" font-weight="bold""# } else { "" },
            escape_xml(fill),
            escape_xml(content)
        );
    }

    fn render_entity(&mut self, entity: &Entity, bounds: Rect) {
        let style = self.style;
        let Rect { x1: x, y1: y, .. } = bounds;
        let width = bounds.width();
        let height = bounds.height();

        let _ = write!(
            self.svg,
            r#"<g class="entity" data-name="{}">"#,
            escape_xml(&entity.name)
        );

        let shadow = style.shadow_offset;
        self.rect(x + shadow, y + shadow, width, height, &style.shadow_color, None);

        self.rect(x, y, width, style.header_height, &style.header_fill, Some(style.border_color.as_str()));
        self.text(x + 8.0, y + 5.0, &entity.name, style.header_font_size, true, &style.text_color);

        for (i, attribute) in entity.attributes.iter().enumerate() {
            let row_y = y + style.header_height + i as f32 * style.row_height;
            let fill = if attribute.fk {
                &style.fk_row_fill
            } else {
                &style.row_fill
            };
            self.rect(x, row_y, width, style.row_height, fill, Some(style.border_color.as_str()));

            let divider_x = x + style.name_column_width;
            let _ = write!(
                self.svg,
                r#"<line x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}" stroke="{}" stroke-width="1"/>"#,
                divider_x,
                row_y,
                divider_x,
                row_y + style.row_height,
                escape_xml(&style.border_color)
            );

            self.text(x + 6.0, row_y + 3.0, &attribute.name, style.font_size, false, &style.text_color);
            self.text(
                divider_x + 6.0,
                row_y + 3.0,
                &attribute.type_label,
                style.font_size,
                false,
                &style.text_color,
            );
        }

        let _ = write!(
            self.svg,
            r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="none" stroke="{}" stroke-width="1"/>"#,
            x,
            y,
            width,
            height,
            escape_xml(&style.border_color)
        );
        self.svg.push_str("</g>");
    }

    fn render_note(&mut self, note: &Note) {
        let style = self.style;
        let bounds = self.geometry.note_box(note);

        self.svg.push_str(r#"<g class="note">"#);
        self.rect(
            bounds.x1,
            bounds.y1,
            bounds.width(),
            bounds.height(),
            &style.note_fill,
            Some(style.note_border.as_str()),
        );
        for (i, line) in note.lines.iter().enumerate() {
            let top = note.y + style.note_padding / 2.0 + i as f32 * style.note_line_height;
            let (size, bold) = if note.is_heading(i) {
                (style.header_font_size, true)
            } else {
                (style.note_font_size, false)
            };
            self.text(note.x + 8.0, top, line, size, bold, &style.note_text_color);
        }
        self.svg.push_str("</g>");
    }
}

/// Resolved geometry for every entity and route, for inspection and tooling.
#[derive(Debug, Clone, Serialize)]
pub struct GeometryDump {
    pub canvas: (u32, u32),
    pub entities: Vec<EntityBox>,
    pub routes: Vec<RoutePath>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EntityBox {
    pub name: String,
    #[serde(flatten)]
    pub bounds: Rect,
}

impl GeometryDump {
    pub fn collect(diagram: &Diagram, style: &Style) -> Result<Self> {
        let geometry = Geometry::new(diagram, style);
        let entities = diagram
            .entities
            .iter()
            .map(|e| {
                Ok(EntityBox {
                    name: e.name.clone(),
                    bounds: geometry.entity_box(&e.name)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let routes = diagram
            .routes
            .iter()
            .map(|r| {
                Ok(RoutePath {
                    source: r.source.entity.clone(),
                    target: r.target.entity.clone(),
                    points: r.resolve(&geometry)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            canvas: (diagram.canvas.width, diagram.canvas.height),
            entities,
            routes,
        })
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| ErdError::Render(e.to_string()))
    }
}
