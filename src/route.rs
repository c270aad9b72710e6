//! Hand-authored relationship routes and their end-cap glyphs.
//!
//! Routes are not path-found. Each one lists the anchors it connects and the
//! bends it takes; waypoint coordinates may be written relative to the
//! route's own anchors so they stay attached when entities move.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ErdError, Result};
use crate::geometry::{Direction, Geometry, Point, Side};
use crate::theme::Style;

fn default_fraction() -> f32 {
    0.5
}

/// `(entity, side, fraction)` address of a point on an entity box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorRef {
    pub entity: String,
    pub side: Side,
    #[serde(default = "default_fraction")]
    pub at: f32,
}

impl AnchorRef {
    pub fn resolve(&self, geometry: &Geometry<'_>) -> Result<Point> {
        geometry.anchor(&self.entity, self.side, self.at)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordBase {
    Source,
    Target,
    Mid,
    Min,
    Max,
}

impl CoordBase {
    fn keyword(self) -> &'static str {
        match self {
            CoordBase::Source => "source",
            CoordBase::Target => "target",
            CoordBase::Mid => "mid",
            CoordBase::Min => "min",
            CoordBase::Max => "max",
        }
    }
}

/// One axis of a waypoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CoordRepr", into = "CoordRepr")]
pub enum Coord {
    Absolute(f32),
    Relative { base: CoordBase, offset: f32 },
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum CoordRepr {
    Number(f32),
    Expr(String),
}

impl TryFrom<CoordRepr> for Coord {
    type Error = ErdError;

    fn try_from(repr: CoordRepr) -> Result<Self> {
        match repr {
            CoordRepr::Number(v) => Ok(Coord::Absolute(v)),
            CoordRepr::Expr(s) => s.parse(),
        }
    }
}

impl From<Coord> for CoordRepr {
    fn from(coord: Coord) -> Self {
        match coord {
            Coord::Absolute(v) => CoordRepr::Number(v),
            relative => CoordRepr::Expr(relative.to_string()),
        }
    }
}

impl std::str::FromStr for Coord {
    type Err = ErdError;

    fn from_str(s: &str) -> Result<Self> {
        let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        let invalid = || ErdError::InvalidCoordinate(s.to_string());

        if let Ok(v) = compact.parse::<f32>() {
            return Ok(Coord::Absolute(v));
        }

        let split = compact.find(['+', '-']).unwrap_or(compact.len());
        let (word, rest) = compact.split_at(split);
        let base = match word {
            "source" | "src" => CoordBase::Source,
            "target" | "tgt" => CoordBase::Target,
            "mid" => CoordBase::Mid,
            "min" => CoordBase::Min,
            "max" => CoordBase::Max,
            _ => return Err(invalid()),
        };
        let offset = if rest.is_empty() {
            0.0
        } else {
            let (sign, magnitude) = rest.split_at(1);
            if magnitude.starts_with(['+', '-']) {
                return Err(invalid());
            }
            let magnitude: f32 = magnitude.parse().map_err(|_| invalid())?;
            if !magnitude.is_finite() {
                return Err(invalid());
            }
            if sign == "-" { -magnitude } else { magnitude }
        };

        Ok(Coord::Relative { base, offset })
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Coord::Absolute(v) => write!(f, "{v}"),
            Coord::Relative { base, offset } if offset == 0.0 => f.write_str(base.keyword()),
            Coord::Relative { base, offset } if offset < 0.0 => {
                write!(f, "{}-{}", base.keyword(), -offset)
            }
            Coord::Relative { base, offset } => write!(f, "{}+{}", base.keyword(), offset),
        }
    }
}

impl Coord {
    /// Resolves against the source and target anchor values on this axis.
    pub fn resolve(self, source: f32, target: f32) -> f32 {
        match self {
            Coord::Absolute(v) => v,
            Coord::Relative { base, offset } => {
                let origin = match base {
                    CoordBase::Source => source,
                    CoordBase::Target => target,
                    CoordBase::Mid => (source + target) / 2.0,
                    CoordBase::Min => source.min(target),
                    CoordBase::Max => source.max(target),
                };
                origin + offset
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub x: Coord,
    pub y: Coord,
}

/// A relationship drawn from a "one" end at the source to a "many" end at
/// the target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub source: AnchorRef,
    pub target: AnchorRef,
    #[serde(default)]
    pub waypoints: Vec<Waypoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_cap: Option<Direction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_cap: Option<Direction>,
}

impl Route {
    /// Direction the line leaves the source; defaults to straight out of the
    /// source side.
    pub fn source_direction(&self) -> Direction {
        self.source_cap.unwrap_or(self.source.side.outward())
    }

    /// Direction the line travels as it reaches the target; defaults to
    /// straight into the target side.
    pub fn target_direction(&self) -> Direction {
        self.target_cap.unwrap_or(self.target.side.inward())
    }

    pub fn label(&self) -> String {
        format!("{} -> {}", self.source.entity, self.target.entity)
    }

    /// Source anchor, resolved waypoints, target anchor.
    pub fn resolve(&self, geometry: &Geometry<'_>) -> Result<Vec<Point>> {
        let start = self.source.resolve(geometry)?;
        let end = self.target.resolve(geometry)?;

        let mut points = Vec::with_capacity(self.waypoints.len() + 2);
        points.push(start);
        points.extend(self.waypoints.iter().map(|w| {
            Point::new(w.x.resolve(start.x, end.x), w.y.resolve(start.y, end.y))
        }));
        points.push(end);
        Ok(points)
    }
}

/// Every consecutive pair shares an x or a y coordinate.
pub fn is_orthogonal(points: &[Point]) -> bool {
    points.windows(2).all(|w| w[0].x == w[1].x || w[0].y == w[1].y)
}

/// Indices of segments that are neither horizontal nor vertical.
pub fn diagonal_segments(points: &[Point]) -> Vec<usize> {
    points
        .windows(2)
        .enumerate()
        .filter(|(_, w)| w[0].x != w[1].x && w[0].y != w[1].y)
        .map(|(i, _)| i)
        .collect()
}

/// Tick across the line, `one_mark_offset` out from the anchor.
pub fn one_mark(anchor: Point, direction: Direction, style: &Style) -> (Point, Point) {
    let c = anchor.offset(direction, style.one_mark_offset);
    let half = style.one_mark_half;
    if direction.is_horizontal() {
        (Point::new(c.x, c.y - half), Point::new(c.x, c.y + half))
    } else {
        (Point::new(c.x - half, c.y), Point::new(c.x + half, c.y))
    }
}

/// Three prongs meeting at the anchor and splaying back along the incoming
/// line.
pub fn crow_foot(anchor: Point, direction: Direction, style: &Style) -> [(Point, Point); 3] {
    let base = anchor.offset(direction.reverse(), style.crow_length);
    let spread = style.crow_spread;
    let (left, right) = if direction.is_horizontal() {
        (Point::new(base.x, base.y - spread), Point::new(base.x, base.y + spread))
    } else {
        (Point::new(base.x - spread, base.y), Point::new(base.x + spread, base.y))
    };
    [(anchor, left), (anchor, base), (anchor, right)]
}

/// Resolved polyline for one route, as written to geometry dumps.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutePath {
    pub source: String,
    pub target: String,
    pub points: Vec<Point>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Attribute, Diagram, Entity};
    use proptest::prelude::*;

    fn coord(s: &str) -> Coord {
        s.parse().unwrap()
    }

    #[test]
    fn parses_coordinate_expressions() {
        assert_eq!(coord("12.5"), Coord::Absolute(12.5));
        assert_eq!(coord("source"), Coord::Relative { base: CoordBase::Source, offset: 0.0 });
        assert_eq!(coord("source+10"), Coord::Relative { base: CoordBase::Source, offset: 10.0 });
        assert_eq!(coord("min - 15"), Coord::Relative { base: CoordBase::Min, offset: -15.0 });
        assert_eq!(coord("tgt-10"), Coord::Relative { base: CoordBase::Target, offset: -10.0 });
        assert!("side+3".parse::<Coord>().is_err());
        assert!("source+".parse::<Coord>().is_err());
        assert!("source*2".parse::<Coord>().is_err());
    }

    #[test]
    fn offset_takes_exactly_one_sign() {
        assert!("source+-5".parse::<Coord>().is_err());
        assert!("source++5".parse::<Coord>().is_err());
        assert!("mid--5".parse::<Coord>().is_err());
        assert!("max + -5".parse::<Coord>().is_err());
        assert!("min+inf".parse::<Coord>().is_err());
        assert_eq!(coord("max + 5"), Coord::Relative { base: CoordBase::Max, offset: 5.0 });
    }

    #[test]
    fn coordinate_display_parses_back() {
        for text in ["source", "target-10", "mid+4.5", "max", "-20"] {
            assert_eq!(coord(&coord(text).to_string()), coord(text));
        }
    }

    #[test]
    fn resolves_against_both_anchors() {
        assert_eq!(coord("source+10").resolve(100.0, 300.0), 110.0);
        assert_eq!(coord("target").resolve(100.0, 300.0), 300.0);
        assert_eq!(coord("mid").resolve(100.0, 300.0), 200.0);
        assert_eq!(coord("min-15").resolve(46.0, 653.6), 31.0);
        assert_eq!(coord("max+1").resolve(46.0, 60.0), 61.0);
        assert_eq!(coord("7").resolve(46.0, 60.0), 7.0);
    }

    #[test]
    fn waypoints_deserialize_from_numbers_and_strings() {
        let route: Route = toml::from_str(
            r#"
source = { entity = "A", side = "R", at = 0.05 }
target = { entity = "B", side = "left" }
waypoints = [{ x = "source+10", y = 31 }]
target_cap = "R"
"#,
        )
        .unwrap();

        assert_eq!(route.source.side, Side::Right);
        assert_eq!(route.target.at, 0.5);
        assert_eq!(route.waypoints[0].y, Coord::Absolute(31.0));
        assert_eq!(route.target_direction(), Direction::Right);
        assert!(toml::from_str::<Route>(
            r#"
source = { entity = "A", side = "R" }
target = { entity = "B", side = "L" }
waypoints = [{ x = "left", y = 1 }]
"#
        )
        .is_err());
    }

    #[test]
    fn cap_directions_default_from_sides() {
        let route: Route = toml::from_str(
            r#"
source = { entity = "A", side = "bottom" }
target = { entity = "B", side = "left" }
"#,
        )
        .unwrap();

        assert_eq!(route.source_direction(), Direction::Down);
        assert_eq!(route.target_direction(), Direction::Right);
    }

    #[test]
    fn one_mark_is_perpendicular_to_the_line() {
        let style = Style::default();
        let (a, b) = one_mark(Point::new(790.0, 46.0), Direction::Right, &style);
        assert_eq!((a, b), (Point::new(802.0, 38.0), Point::new(802.0, 54.0)));

        let (a, b) = one_mark(Point::new(566.0, 708.0), Direction::Down, &style);
        assert_eq!((a, b), (Point::new(558.0, 720.0), Point::new(574.0, 720.0)));
    }

    #[test]
    fn crow_foot_splays_against_travel() {
        let style = Style::default();
        let apex = Point::new(566.0, 840.0);
        let prongs = crow_foot(apex, Direction::Down, &style);

        assert_eq!(prongs[0], (apex, Point::new(559.0, 830.0)));
        assert_eq!(prongs[1], (apex, Point::new(566.0, 830.0)));
        assert_eq!(prongs[2], (apex, Point::new(573.0, 830.0)));

        let apex = Point::new(2000.0, 653.6);
        let prongs = crow_foot(apex, Direction::Right, &style);
        assert_eq!(prongs[1].1, Point::new(1990.0, 653.6));
        assert_eq!(prongs[0].1.y, 646.6);
    }

    #[test]
    fn detects_diagonal_segments() {
        let pts = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(20.0, 5.0),
            Point::new(20.0, 9.0),
        ];
        assert!(!is_orthogonal(&pts));
        assert_eq!(diagonal_segments(&pts), vec![1]);
        assert!(is_orthogonal(&pts[2..]));
    }

    fn two_boxes(a: (f32, f32), b: (f32, f32), rows_a: usize, rows_b: usize) -> Diagram {
        let mut diagram = Diagram::default();
        for (name, at, rows) in [("A", a, rows_a), ("B", b, rows_b)] {
            diagram.entities.push(Entity {
                name: name.to_string(),
                attributes: (0..rows)
                    .map(|i| Attribute {
                        name: format!("c{i}"),
                        type_label: "int".to_string(),
                        fk: false,
                    })
                    .collect(),
            });
            diagram.positions.insert(name.to_string(), at.into());
        }
        diagram
    }

    #[test]
    fn builtin_routes_are_orthogonal() {
        let diagram = Diagram::builtin().unwrap();
        let style = Style::default();
        let geometry = Geometry::new(&diagram, &style);

        for route in &diagram.routes {
            let points = route.resolve(&geometry).unwrap();
            assert!(is_orthogonal(&points), "{} bends diagonally: {points:?}", route.label());
        }
    }

    #[test]
    fn route_with_undefined_entity_fails_loudly() {
        let diagram = two_boxes((0.0, 0.0), (500.0, 0.0), 1, 1);
        let style = Style::default();
        let route: Route = toml::from_str(
            r#"
source = { entity = "A", side = "right" }
target = { entity = "Missing", side = "left" }
"#,
        )
        .unwrap();

        let err = route.resolve(&Geometry::new(&diagram, &style)).unwrap_err();
        assert!(matches!(err, ErdError::MissingPosition(n) if n == "Missing"));
    }

    proptest! {
        #[test]
        fn prop_mid_jog_is_always_orthogonal(
            ax in 0i32..1500, ay in 0i32..1500,
            bx in 0i32..1500, by in 0i32..1500,
            rows_a in 0usize..15, rows_b in 0usize..15,
            fa in 0.0f32..=1.0, fb in 0.0f32..=1.0,
        ) {
            let diagram = two_boxes((ax as f32, ay as f32), (bx as f32, by as f32), rows_a, rows_b);
            let style = Style::default();
            let geometry = Geometry::new(&diagram, &style);
            let horizontal: Route = Route {
                source: AnchorRef { entity: "A".into(), side: Side::Right, at: fa },
                target: AnchorRef { entity: "B".into(), side: Side::Left, at: fb },
                waypoints: vec![
                    Waypoint { x: coord("mid"), y: coord("source") },
                    Waypoint { x: coord("mid"), y: coord("target") },
                ],
                source_cap: None,
                target_cap: None,
            };
            let vertical = Route {
                source: AnchorRef { entity: "A".into(), side: Side::Bottom, at: fa },
                target: AnchorRef { entity: "B".into(), side: Side::Top, at: fb },
                waypoints: vec![
                    Waypoint { x: coord("source"), y: coord("mid-5") },
                    Waypoint { x: coord("target"), y: coord("mid-5") },
                ],
                source_cap: None,
                target_cap: None,
            };

            prop_assert!(is_orthogonal(&horizontal.resolve(&geometry).unwrap()));
            prop_assert!(is_orthogonal(&vertical.resolve(&geometry).unwrap()));
        }
    }
}
