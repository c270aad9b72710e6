//! Entity boxes and the anchor points routes attach to.
//!
//! Nothing here is cached: every box and anchor is recomputed from the
//! diagram's position table, so editing a position moves everything that
//! hangs off that entity.

use serde::{Deserialize, Serialize};

use crate::error::{ErdError, Result};
use crate::schema::Diagram;
use crate::theme::Style;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "(f32, f32)", into = "(f32, f32)")]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, direction: Direction, distance: f32) -> Self {
        let (dx, dy) = direction.unit();
        Self::new(self.x + dx * distance, self.y + dy * distance)
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}

impl From<Point> for (f32, f32) {
    fn from(p: Point) -> Self {
        (p.x, p.y)
    }
}

/// Axis-aligned box given by its two corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl Rect {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x1 < other.x2 && other.x1 < self.x2 && self.y1 < other.y2 && other.y1 < self.y2
    }

    pub fn within(&self, width: f32, height: f32) -> bool {
        self.x1 >= 0.0 && self.y1 >= 0.0 && self.x2 <= width && self.y2 <= height
    }

    /// True when the axis-aligned segment `a`-`b` passes through the open
    /// interior of the box. Touching an edge does not count.
    pub fn crossed_by(&self, a: Point, b: Point) -> bool {
        let (lo_x, hi_x) = (a.x.min(b.x), a.x.max(b.x));
        let (lo_y, hi_y) = (a.y.min(b.y), a.y.max(b.y));
        if a.y == b.y {
            a.y > self.y1 && a.y < self.y2 && lo_x < self.x2 && hi_x > self.x1
        } else if a.x == b.x {
            a.x > self.x1 && a.x < self.x2 && lo_y < self.y2 && hi_y > self.y1
        } else {
            lo_x < self.x2 && hi_x > self.x1 && lo_y < self.y2 && hi_y > self.y1
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    #[serde(alias = "L")]
    Left,
    #[serde(alias = "R")]
    Right,
    #[serde(alias = "T")]
    Top,
    #[serde(alias = "B")]
    Bottom,
}

impl Side {
    /// Direction pointing away from the box through this side.
    pub fn outward(self) -> Direction {
        match self {
            Side::Left => Direction::Left,
            Side::Right => Direction::Right,
            Side::Top => Direction::Up,
            Side::Bottom => Direction::Down,
        }
    }

    pub fn inward(self) -> Direction {
        self.outward().reverse()
    }
}

/// Compass direction in canvas space (y grows downward).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[serde(alias = "L")]
    Left,
    #[serde(alias = "R")]
    Right,
    #[serde(alias = "U")]
    Up,
    #[serde(alias = "D")]
    Down,
}

impl Direction {
    pub fn unit(self) -> (f32, f32) {
        match self {
            Direction::Left => (-1.0, 0.0),
            Direction::Right => (1.0, 0.0),
            Direction::Up => (0.0, -1.0),
            Direction::Down => (0.0, 1.0),
        }
    }

    pub fn reverse(self) -> Direction {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Direction::Left | Direction::Right)
    }
}

/// Geometry queries over one diagram laid out with one style.
#[derive(Debug, Clone, Copy)]
pub struct Geometry<'a> {
    diagram: &'a Diagram,
    style: &'a Style,
}

impl<'a> Geometry<'a> {
    pub fn new(diagram: &'a Diagram, style: &'a Style) -> Self {
        Self { diagram, style }
    }

    pub fn diagram(&self) -> &'a Diagram {
        self.diagram
    }

    /// Header band, one row per attribute and the bottom margin.
    pub fn entity_height(&self, attribute_count: usize) -> f32 {
        self.style.header_height + attribute_count as f32 * self.style.row_height + self.style.box_margin
    }

    pub fn note_height(&self, line_count: usize) -> f32 {
        line_count as f32 * self.style.note_line_height + self.style.note_padding
    }

    pub fn entity_box(&self, name: &str) -> Result<Rect> {
        let origin = self
            .diagram
            .positions
            .get(name)
            .ok_or_else(|| ErdError::MissingPosition(name.to_string()))?;
        let entity = self
            .diagram
            .entity(name)
            .ok_or_else(|| ErdError::UnknownEntity(name.to_string()))?;

        Ok(Rect::new(
            origin.x,
            origin.y,
            origin.x + self.style.box_width(),
            origin.y + self.entity_height(entity.attributes.len()),
        ))
    }

    /// Point on `side` of the entity box, `fraction` of the way along it
    /// (top to bottom for left/right, left to right for top/bottom).
    ///
    /// Fractions outside `[0, 1]` extrapolate past the corners rather than
    /// clamping; the validation pass reports them.
    pub fn anchor(&self, name: &str, side: Side, fraction: f32) -> Result<Point> {
        let b = self.entity_box(name)?;
        Ok(match side {
            Side::Left => Point::new(b.x1, b.y1 + b.height() * fraction),
            Side::Right => Point::new(b.x2, b.y1 + b.height() * fraction),
            Side::Top => Point::new(b.x1 + b.width() * fraction, b.y1),
            Side::Bottom => Point::new(b.x1 + b.width() * fraction, b.y2),
        })
    }

    pub fn note_box(&self, note: &crate::schema::Note) -> Rect {
        Rect::new(
            note.x,
            note.y,
            note.x + note.width,
            note.y + self.note_height(note.lines.len()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Attribute, Diagram, Entity, Note};
    use proptest::prelude::*;

    fn diagram_with(name: &str, attributes: usize, at: (f32, f32)) -> Diagram {
        let mut diagram = Diagram::default();
        diagram.entities.push(Entity {
            name: name.to_string(),
            attributes: (0..attributes)
                .map(|i| Attribute {
                    name: format!("col{i}"),
                    type_label: "int".to_string(),
                    fk: false,
                })
                .collect(),
        });
        diagram.positions.insert(name.to_string(), at.into());
        diagram
    }

    #[test]
    fn box_height_for_three_attributes() {
        let diagram = diagram_with("Roles", 3, (10.0, 20.0));
        let style = Style::default();
        let b = Geometry::new(&diagram, &style).entity_box("Roles").unwrap();

        assert_eq!(b.height(), 104.0);
        assert_eq!(b, Rect::new(10.0, 20.0, 330.0, 124.0));
    }

    #[test]
    fn left_midpoint_anchor() {
        // 30 + 3 * 24 + 2 would give 104; pick metrics that make the box 100 tall.
        let diagram = diagram_with("E", 3, (40.0, 100.0));
        let style = Style {
            header_height: 26.0,
            ..Style::default()
        };
        let geometry = Geometry::new(&diagram, &style);
        assert_eq!(geometry.entity_box("E").unwrap().y2, 200.0);

        let p = geometry.anchor("E", Side::Left, 0.5).unwrap();
        assert_eq!(p, Point::new(40.0, 150.0));
    }

    #[test]
    fn anchors_follow_position_changes() {
        let mut diagram = diagram_with("E", 2, (0.0, 0.0));
        let style = Style::default();
        let before = Geometry::new(&diagram, &style).anchor("E", Side::Right, 0.25).unwrap();

        diagram.positions.insert("E".to_string(), Point::new(100.0, 50.0));
        let after = Geometry::new(&diagram, &style).anchor("E", Side::Right, 0.25).unwrap();

        assert_eq!(after.x, before.x + 100.0);
        assert_eq!(after.y, before.y + 50.0);
    }

    #[test]
    fn missing_position_is_an_error() {
        let mut diagram = diagram_with("E", 1, (0.0, 0.0));
        diagram.positions.clear();
        let style = Style::default();

        let err = Geometry::new(&diagram, &style).anchor("E", Side::Top, 0.5).unwrap_err();
        assert!(matches!(err, ErdError::MissingPosition(name) if name == "E"));
    }

    #[test]
    fn fractions_outside_unit_range_extrapolate() {
        let diagram = diagram_with("E", 1, (0.0, 0.0));
        let style = Style::default();
        let p = Geometry::new(&diagram, &style).anchor("E", Side::Top, 1.5).unwrap();

        assert_eq!(p, Point::new(480.0, 0.0));
    }

    #[test]
    fn note_with_four_lines_is_92_tall() {
        let diagram = Diagram::default();
        let style = Style::default();
        let note = Note {
            x: 0.0,
            y: 0.0,
            width: 200.0,
            lines: vec!["a".into(), "b".into(), "c".into(), "d".into()],
        };

        assert_eq!(Geometry::new(&diagram, &style).note_box(&note).height(), 92.0);
    }

    #[test]
    fn crossing_ignores_edge_contact() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);

        assert!(r.crossed_by(Point::new(-5.0, 5.0), Point::new(15.0, 5.0)));
        assert!(!r.crossed_by(Point::new(-5.0, 0.0), Point::new(15.0, 0.0)));
        assert!(!r.crossed_by(Point::new(10.0, -5.0), Point::new(10.0, 15.0)));
        assert!(!r.crossed_by(Point::new(12.0, -5.0), Point::new(12.0, 15.0)));
    }

    fn any_side() -> impl Strategy<Value = Side> {
        prop_oneof![
            Just(Side::Left),
            Just(Side::Right),
            Just(Side::Top),
            Just(Side::Bottom),
        ]
    }

    proptest! {
        #[test]
        fn prop_anchor_lies_on_perimeter(
            x in 0i32..2000,
            y in 0i32..2000,
            attributes in 0usize..20,
            side in any_side(),
            fraction in 0.0f32..=1.0,
        ) {
            let diagram = diagram_with("E", attributes, (x as f32, y as f32));
            let style = Style::default();
            let geometry = Geometry::new(&diagram, &style);
            let b = geometry.entity_box("E").unwrap();
            let p = geometry.anchor("E", side, fraction).unwrap();

            match side {
                Side::Left => prop_assert_eq!(p.x, b.x1),
                Side::Right => prop_assert_eq!(p.x, b.x2),
                Side::Top => prop_assert_eq!(p.y, b.y1),
                Side::Bottom => prop_assert_eq!(p.y, b.y2),
            }
            prop_assert!(p.x >= b.x1 - 1e-3 && p.x <= b.x2 + 1e-3);
            prop_assert!(p.y >= b.y1 - 1e-3 && p.y <= b.y2 + 1e-3);
        }

        #[test]
        fn prop_anchor_endpoints_are_corners(
            x in 0i32..2000,
            y in 0i32..2000,
            attributes in 0usize..20,
        ) {
            let diagram = diagram_with("E", attributes, (x as f32, y as f32));
            let style = Style::default();
            let geometry = Geometry::new(&diagram, &style);
            let b = geometry.entity_box("E").unwrap();

            prop_assert_eq!(geometry.anchor("E", Side::Left, 0.0).unwrap(), Point::new(b.x1, b.y1));
            prop_assert_eq!(geometry.anchor("E", Side::Left, 1.0).unwrap(), Point::new(b.x1, b.y2));
            prop_assert_eq!(geometry.anchor("E", Side::Right, 1.0).unwrap(), Point::new(b.x2, b.y2));
            prop_assert_eq!(geometry.anchor("E", Side::Top, 1.0).unwrap(), Point::new(b.x2, b.y1));
            prop_assert_eq!(geometry.anchor("E", Side::Bottom, 0.0).unwrap(), Point::new(b.x1, b.y2));
        }

        #[test]
        fn prop_anchor_is_linear_in_fraction(
            attributes in 1usize..20,
            fraction in 0.0f32..=1.0,
        ) {
            let diagram = diagram_with("E", attributes, (100.0, 100.0));
            let style = Style::default();
            let geometry = Geometry::new(&diagram, &style);
            let start = geometry.anchor("E", Side::Right, 0.0).unwrap();
            let end = geometry.anchor("E", Side::Right, 1.0).unwrap();
            let p = geometry.anchor("E", Side::Right, fraction).unwrap();

            let expected = start.y + (end.y - start.y) * fraction;
            prop_assert!((p.y - expected).abs() < 1e-3);
        }

        #[test]
        fn prop_box_height_matches_metrics(attributes in 0usize..64) {
            let diagram = diagram_with("E", attributes, (0.0, 0.0));
            let style = Style::default();
            let b = Geometry::new(&diagram, &style).entity_box("E").unwrap();

            prop_assert_eq!(b.height(), 30.0 + attributes as f32 * 24.0 + 2.0);
        }
    }
}
