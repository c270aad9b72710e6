//! The diagram document: entities, their positions, routes and notes.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{ErdError, Result};
use crate::geometry::Point;
use crate::route::Route;

const BUILTIN_DIAGRAM: &str = include_str!("../diagrams/assistant.toml");

const DEFAULT_CANVAS_WIDTH: u32 = 3200;
const DEFAULT_CANVAS_HEIGHT: u32 = 2500;
const DEFAULT_BACKGROUND: &str = "#ffffff";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Canvas {
    #[serde(default = "default_canvas_width")]
    pub width: u32,
    #[serde(default = "default_canvas_height")]
    pub height: u32,
    #[serde(default = "default_background")]
    pub background: String,
}

fn default_canvas_width() -> u32 {
    DEFAULT_CANVAS_WIDTH
}
fn default_canvas_height() -> u32 {
    DEFAULT_CANVAS_HEIGHT
}
fn default_background() -> String {
    DEFAULT_BACKGROUND.to_string()
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            width: DEFAULT_CANVAS_WIDTH,
            height: DEFAULT_CANVAS_HEIGHT,
            background: default_background(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    #[serde(rename = "type")]
    pub type_label: String,
    #[serde(default)]
    pub fk: bool,
}

/// A table drawn as a titled box with one row per attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
}

/// Free-floating annotation box, not attached to any entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    #[serde(default)]
    pub lines: Vec<String>,
}

impl Note {
    /// Only a plain first line is set in bold. Indented lines and lines with a
    /// colon or bracket read as enumerations or typed annotations.
    pub fn is_heading(&self, index: usize) -> bool {
        let Some(line) = self.lines.get(index) else {
            return false;
        };
        index == 0 && !line.starts_with(' ') && !line.contains(':') && !line.contains('[')
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagram {
    #[serde(default)]
    pub canvas: Canvas,
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub positions: IndexMap<String, Point>,
    #[serde(default)]
    pub routes: Vec<Route>,
    #[serde(default)]
    pub notes: Vec<Note>,
}

impl Diagram {
    /// The schema diagram bundled with the binary.
    pub fn builtin() -> Result<Self> {
        Self::from_toml(BUILTIN_DIAGRAM)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| ErdError::Config {
            what: "diagram TOML",
            message: e.to_string(),
        })
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| ErdError::Config {
            what: "diagram YAML",
            message: e.to_string(),
        })
    }

    /// Parses a diagram file, trying TOML first and then YAML.
    pub fn parse(content: &str) -> Result<Self> {
        match Self::from_toml(content) {
            Ok(diagram) => Ok(diagram),
            Err(toml_err) => Self::from_yaml(content).map_err(|_| toml_err),
        }
    }

    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.name == name)
    }

    /// Every entity named by the schema, the position table or a route must
    /// appear in both the schema and the position table, exactly once.
    pub fn integrity_errors(&self) -> Vec<ErdError> {
        let mut errors = Vec::new();

        for (i, entity) in self.entities.iter().enumerate() {
            if self.entities[..i].iter().any(|e| e.name == entity.name) {
                errors.push(ErdError::DuplicateEntity(entity.name.clone()));
            } else if !self.positions.contains_key(&entity.name) {
                errors.push(ErdError::MissingPosition(entity.name.clone()));
            }
        }

        for name in self.positions.keys() {
            if self.entity(name).is_none() {
                errors.push(ErdError::OrphanPosition(name.clone()));
            }
        }

        for route in &self.routes {
            for end in [&route.source, &route.target] {
                if !self.positions.contains_key(&end.entity) {
                    errors.push(ErdError::MissingPosition(end.entity.clone()));
                } else if self.entity(&end.entity).is_none() {
                    errors.push(ErdError::UnknownEntity(end.entity.clone()));
                }
            }
        }

        errors
    }
}
