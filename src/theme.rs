use serde::{Deserialize, Serialize};

use crate::error::{ErdError, Result};

const HEADER_FILL: &str = "#90ee90";
const FK_ROW_FILL: &str = "#ffcccc";
const ROW_FILL: &str = "#f8fff8";
const BORDER: &str = "#888888";
const SHADOW: &str = "#dddddd";
const NOTE_FILL: &str = "#ffffcc";
const NOTE_BORDER: &str = "#cccc88";
const LINE: &str = "#555555";
const TEXT: &str = "#000000";
const NOTE_TEXT: &str = "#333333";

const FONT_SIZE: f32 = 16.0;
const HEADER_FONT_SIZE: f32 = 18.0;
const NOTE_FONT_SIZE: f32 = 14.0;

const NAME_COLUMN_WIDTH: f32 = 220.0;
const TYPE_COLUMN_WIDTH: f32 = 100.0;
const HEADER_HEIGHT: f32 = 30.0;
const ROW_HEIGHT: f32 = 24.0;
const BOX_MARGIN: f32 = 2.0;
const SHADOW_OFFSET: f32 = 3.0;
const NOTE_LINE_HEIGHT: f32 = 20.0;
const NOTE_PADDING: f32 = 12.0;

const ONE_MARK_OFFSET: f32 = 12.0;
const ONE_MARK_HALF: f32 = 8.0;
const CROW_LENGTH: f32 = 10.0;
const CROW_SPREAD: f32 = 7.0;
const CAP_STROKE: f32 = 2.0;
const ROUTE_STROKE: f32 = 1.0;

/// Colors, font sizes and box metrics shared by geometry and rasterization.
///
/// Every field has a default, so a style file only needs to name the values
/// it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Style {
    #[serde(default = "default_header_fill")]
    pub header_fill: String,
    #[serde(default = "default_fk_row_fill")]
    pub fk_row_fill: String,
    #[serde(default = "default_row_fill")]
    pub row_fill: String,
    #[serde(default = "default_border")]
    pub border_color: String,
    #[serde(default = "default_shadow")]
    pub shadow_color: String,
    #[serde(default = "default_note_fill")]
    pub note_fill: String,
    #[serde(default = "default_note_border")]
    pub note_border: String,
    #[serde(default = "default_line")]
    pub line_color: String,
    #[serde(default = "default_text")]
    pub text_color: String,
    #[serde(default = "default_note_text")]
    pub note_text_color: String,

    #[serde(default = "default_font_size")]
    pub font_size: f32,
    #[serde(default = "default_header_font_size")]
    pub header_font_size: f32,
    #[serde(default = "default_note_font_size")]
    pub note_font_size: f32,

    #[serde(default = "default_name_column_width")]
    pub name_column_width: f32,
    #[serde(default = "default_type_column_width")]
    pub type_column_width: f32,
    #[serde(default = "default_header_height")]
    pub header_height: f32,
    #[serde(default = "default_row_height")]
    pub row_height: f32,
    #[serde(default = "default_box_margin")]
    pub box_margin: f32,
    #[serde(default = "default_shadow_offset")]
    pub shadow_offset: f32,
    #[serde(default = "default_note_line_height")]
    pub note_line_height: f32,
    #[serde(default = "default_note_padding")]
    pub note_padding: f32,

    #[serde(default = "default_one_mark_offset")]
    pub one_mark_offset: f32,
    #[serde(default = "default_one_mark_half")]
    pub one_mark_half: f32,
    #[serde(default = "default_crow_length")]
    pub crow_length: f32,
    #[serde(default = "default_crow_spread")]
    pub crow_spread: f32,
    #[serde(default = "default_cap_stroke")]
    pub cap_stroke: f32,
    #[serde(default = "default_route_stroke")]
    pub route_stroke: f32,
}

fn default_header_fill() -> String {
    HEADER_FILL.to_string()
}
fn default_fk_row_fill() -> String {
    FK_ROW_FILL.to_string()
}
fn default_row_fill() -> String {
    ROW_FILL.to_string()
}
fn default_border() -> String {
    BORDER.to_string()
}
fn default_shadow() -> String {
    SHADOW.to_string()
}
fn default_note_fill() -> String {
    NOTE_FILL.to_string()
}
fn default_note_border() -> String {
    NOTE_BORDER.to_string()
}
fn default_line() -> String {
    LINE.to_string()
}
fn default_text() -> String {
    TEXT.to_string()
}
fn default_note_text() -> String {
    NOTE_TEXT.to_string()
}
fn default_font_size() -> f32 {
    FONT_SIZE
}
fn default_header_font_size() -> f32 {
    HEADER_FONT_SIZE
}
fn default_note_font_size() -> f32 {
    NOTE_FONT_SIZE
}
fn default_name_column_width() -> f32 {
    NAME_COLUMN_WIDTH
}
fn default_type_column_width() -> f32 {
    TYPE_COLUMN_WIDTH
}
fn default_header_height() -> f32 {
    HEADER_HEIGHT
}
fn default_row_height() -> f32 {
    ROW_HEIGHT
}
fn default_box_margin() -> f32 {
    BOX_MARGIN
}
fn default_shadow_offset() -> f32 {
    SHADOW_OFFSET
}
fn default_note_line_height() -> f32 {
    NOTE_LINE_HEIGHT
}
fn default_note_padding() -> f32 {
    NOTE_PADDING
}
fn default_one_mark_offset() -> f32 {
    ONE_MARK_OFFSET
}
fn default_one_mark_half() -> f32 {
    ONE_MARK_HALF
}
fn default_crow_length() -> f32 {
    CROW_LENGTH
}
fn default_crow_spread() -> f32 {
    CROW_SPREAD
}
fn default_cap_stroke() -> f32 {
    CAP_STROKE
}
fn default_route_stroke() -> f32 {
    ROUTE_STROKE
}

impl Default for Style {
    fn default() -> Self {
        Style {
            header_fill: default_header_fill(),
            fk_row_fill: default_fk_row_fill(),
            row_fill: default_row_fill(),
            border_color: default_border(),
            shadow_color: default_shadow(),
            note_fill: default_note_fill(),
            note_border: default_note_border(),
            line_color: default_line(),
            text_color: default_text(),
            note_text_color: default_note_text(),

            font_size: FONT_SIZE,
            header_font_size: HEADER_FONT_SIZE,
            note_font_size: NOTE_FONT_SIZE,

            name_column_width: NAME_COLUMN_WIDTH,
            type_column_width: TYPE_COLUMN_WIDTH,
            header_height: HEADER_HEIGHT,
            row_height: ROW_HEIGHT,
            box_margin: BOX_MARGIN,
            shadow_offset: SHADOW_OFFSET,
            note_line_height: NOTE_LINE_HEIGHT,
            note_padding: NOTE_PADDING,

            one_mark_offset: ONE_MARK_OFFSET,
            one_mark_half: ONE_MARK_HALF,
            crow_length: CROW_LENGTH,
            crow_spread: CROW_SPREAD,
            cap_stroke: CAP_STROKE,
            route_stroke: ROUTE_STROKE,
        }
    }
}

impl Style {
    pub fn box_width(&self) -> f32 {
        self.name_column_width + self.type_column_width
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| ErdError::Config {
            what: "style TOML",
            message: e.to_string(),
        })
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| ErdError::Config {
            what: "style YAML",
            message: e.to_string(),
        })
    }

    /// Parses a style file, trying TOML first and then YAML.
    pub fn parse(content: &str) -> Result<Self> {
        match Self::from_toml(content) {
            Ok(style) => Ok(style),
            Err(toml_err) => Self::from_yaml(content).map_err(|_| toml_err),
        }
    }
}
