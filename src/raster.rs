use std::path::Path;

use resvg::usvg;
use tiny_skia::{Pixmap, Transform};

use crate::error::{ErdError, Result};
use crate::fonts::FontContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Png,
    Svg,
    Pdf,
}

impl OutputFormat {
    /// Picks the format from the file extension; no extension means PNG.
    pub fn from_path(path: &Path) -> Result<Self> {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return Ok(OutputFormat::Png);
        };
        match ext.to_ascii_lowercase().as_str() {
            "png" => Ok(OutputFormat::Png),
            "svg" => Ok(OutputFormat::Svg),
            "pdf" => Ok(OutputFormat::Pdf),
            other => Err(ErdError::Render(format!(
                "unsupported output format: .{other} (use .png, .svg or .pdf)"
            ))),
        }
    }
}

/// Rasterizes at 1:1, so the image is exactly the canvas size.
pub fn svg_to_png(svg: &str, fonts: &FontContext) -> Result<Vec<u8>> {
    let opts = usvg::Options {
        fontdb: fonts.db.clone(),
        ..Default::default()
    };

    let tree = usvg::Tree::from_str(svg, &opts)
        .map_err(|e| ErdError::Render(format!("failed to parse SVG: {e}")))?;

    let width = tree.size().width().ceil() as u32;
    let height = tree.size().height().ceil() as u32;
    let mut pixmap = Pixmap::new(width, height)
        .ok_or_else(|| ErdError::Render(format!("cannot allocate a {width}x{height} canvas")))?;

    resvg::render(&tree, Transform::identity(), &mut pixmap.as_mut());

    pixmap
        .encode_png()
        .map_err(|e| ErdError::Render(format!("failed to encode PNG: {e}")))
}

pub fn svg_to_pdf(svg: &str, fonts: &FontContext) -> Result<Vec<u8>> {
    let opts = svg2pdf::usvg::Options {
        fontdb: std::sync::Arc::new(fonts.pdf_database()),
        ..Default::default()
    };

    let tree = svg2pdf::usvg::Tree::from_str(svg, &opts)
        .map_err(|e| ErdError::Render(format!("failed to parse SVG: {e}")))?;

    // Text as paths, so viewers without the fonts still show labels.
    let options = svg2pdf::ConversionOptions {
        embed_text: false,
        ..Default::default()
    };

    svg2pdf::to_pdf(&tree, options, svg2pdf::PageOptions::default())
        .map_err(|e| ErdError::Render(format!("failed to convert SVG to PDF: {e}")))
}

/// Encodes the document in the format the path asks for and writes it,
/// replacing any existing file.
pub fn write_output(path: &Path, svg: &str, fonts: &FontContext) -> Result<OutputFormat> {
    let format = OutputFormat::from_path(path)?;
    let bytes = match format {
        OutputFormat::Svg => svg.as_bytes().to_vec(),
        OutputFormat::Png => svg_to_png(svg, fonts)?,
        OutputFormat::Pdf => svg_to_pdf(svg, fonts)?,
    };
    std::fs::write(path, bytes).map_err(|e| ErdError::io(path, e))?;
    Ok(format)
}
