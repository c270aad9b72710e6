//! Checks run before anything is drawn.
//!
//! Routes are authored by hand, so the mistakes a layout engine would
//! prevent (diagonal segments, lines through unrelated tables, boxes off the
//! canvas) are caught here instead of silently showing up in the image.

use std::fmt;

use crate::fonts::TextMeasure;
use crate::geometry::Geometry;
use crate::route::diagonal_segments;
use crate::schema::Diagram;
use crate::theme::Style;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }

    fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.severity {
            Severity::Error => write!(f, "error: {}", self.message),
            Severity::Warning => write!(f, "warning: {}", self.message),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Report {
    pub diagnostics: Vec<Diagnostic>,
}

impl Report {
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.severity == Severity::Warning)
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn extend(&mut self, other: Report) {
        self.diagnostics.extend(other.diagnostics);
    }

    /// Treat every warning as an error.
    pub fn strict(mut self) -> Self {
        for d in &mut self.diagnostics {
            d.severity = Severity::Error;
        }
        self
    }
}

/// Structural checks: referential integrity, route shape, canvas bounds and
/// overlaps.
pub fn validate(diagram: &Diagram, style: &Style) -> Report {
    let mut report = Report::default();

    let integrity = diagram.integrity_errors();
    if !integrity.is_empty() {
        report
            .diagnostics
            .extend(integrity.into_iter().map(|e| Diagnostic::error(e.to_string())));
        // Nothing below can be placed reliably without a consistent schema.
        return report;
    }

    let geometry = Geometry::new(diagram, style);
    let canvas = &diagram.canvas;
    let (canvas_w, canvas_h) = (canvas.width as f32, canvas.height as f32);

    let mut boxes = Vec::with_capacity(diagram.entities.len());
    for entity in &diagram.entities {
        match geometry.entity_box(&entity.name) {
            Ok(b) => {
                if !b.within(canvas_w, canvas_h) {
                    report.diagnostics.push(Diagnostic::error(format!(
                        "entity '{}' at ({}, {})-({}, {}) does not fit the {}x{} canvas",
                        entity.name, b.x1, b.y1, b.x2, b.y2, canvas.width, canvas.height
                    )));
                }
                boxes.push((entity.name.as_str(), b));
            }
            Err(e) => report.diagnostics.push(Diagnostic::error(e.to_string())),
        }
    }

    for route in &diagram.routes {
        let label = route.label();

        for end in [&route.source, &route.target] {
            if !(0.0..=1.0).contains(&end.at) {
                report.diagnostics.push(Diagnostic::warning(format!(
                    "route {label}: anchor fraction {} on {} lies beyond the box corner",
                    end.at, end.entity
                )));
            }
        }

        if route.target_direction() == route.target.side.outward() {
            report.diagnostics.push(Diagnostic::warning(format!(
                "route {label}: crow's foot points out of {} and will be hidden under it",
                route.target.entity
            )));
        }

        let points = match route.resolve(&geometry) {
            Ok(points) => points,
            Err(e) => {
                report.diagnostics.push(Diagnostic::error(format!("route {label}: {e}")));
                continue;
            }
        };

        for i in diagonal_segments(&points) {
            report.diagnostics.push(Diagnostic::error(format!(
                "route {label}: segment {i} from ({}, {}) to ({}, {}) is diagonal",
                points[i].x,
                points[i].y,
                points[i + 1].x,
                points[i + 1].y
            )));
        }

        for (name, b) in &boxes {
            if *name == route.source.entity || *name == route.target.entity {
                continue;
            }
            if points.windows(2).any(|w| b.crossed_by(w[0], w[1])) {
                report.diagnostics.push(Diagnostic::warning(format!(
                    "route {label} passes through entity '{name}'"
                )));
            }
        }

        if points.iter().any(|p| p.x < 0.0 || p.y < 0.0 || p.x > canvas_w || p.y > canvas_h) {
            report.diagnostics.push(Diagnostic::error(format!(
                "route {label} leaves the canvas"
            )));
        }
    }

    for (i, note) in diagram.notes.iter().enumerate() {
        let b = geometry.note_box(note);
        if !b.within(canvas_w, canvas_h) {
            report.diagnostics.push(Diagnostic::error(format!(
                "note {i} at ({}, {}) does not fit the {}x{} canvas",
                note.x, note.y, canvas.width, canvas.height
            )));
        }
        for (name, entity_box) in &boxes {
            if b.intersects(entity_box) {
                report.diagnostics.push(Diagnostic::warning(format!(
                    "note {i} covers part of entity '{name}'"
                )));
            }
        }
    }

    report
}

/// Labels wider than the column or box they are drawn in.
pub fn check_label_widths<T: TextMeasure>(diagram: &Diagram, style: &Style, measure: &mut T) -> Report {
    let mut report = Report::default();
    let name_room = style.name_column_width - 6.0;
    let type_room = style.type_column_width - 6.0;

    for entity in &diagram.entities {
        if measure.measure_width(&entity.name, style.header_font_size, true) > style.box_width() - 8.0 {
            report.diagnostics.push(Diagnostic::warning(format!(
                "entity name '{}' is wider than its box",
                entity.name
            )));
        }
        for attribute in &entity.attributes {
            if measure.measure_width(&attribute.name, style.font_size, false) > name_room {
                report.diagnostics.push(Diagnostic::warning(format!(
                    "{}.{}: name overflows its column",
                    entity.name, attribute.name
                )));
            }
            if measure.measure_width(&attribute.type_label, style.font_size, false) > type_room {
                report.diagnostics.push(Diagnostic::warning(format!(
                    "{}.{}: type '{}' overflows its column",
                    entity.name, attribute.name, attribute.type_label
                )));
            }
        }
    }

    for (i, note) in diagram.notes.iter().enumerate() {
        for (line_no, line) in note.lines.iter().enumerate() {
            let bold = note.is_heading(line_no);
            let size = if bold { style.header_font_size } else { style.note_font_size };
            if measure.measure_width(line, size, bold) > note.width - 8.0 {
                report.diagnostics.push(Diagnostic::warning(format!(
                    "note {i} line {line_no} is wider than the note"
                )));
            }
        }
    }

    report
}
