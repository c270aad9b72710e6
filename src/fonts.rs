use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cosmic_text::{Attrs, Buffer, Family, FontSystem, Metrics, Shaping, Weight};
use resvg::usvg;

pub const DEFAULT_REGULAR_FONT: &str = "arial.ttf";
pub const DEFAULT_BOLD_FONT: &str = "arialbd.ttf";
const LOCAL_FONT_DIR: &str = "fonts";
const GENERIC_FAMILY: &str = "sans-serif";

/// Regular and bold font files requested for labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontFiles {
    pub regular: PathBuf,
    pub bold: PathBuf,
}

impl FontFiles {
    /// The file as given, or the same name under the local `fonts/` directory.
    pub fn locate(path: &Path) -> Option<PathBuf> {
        if path.is_file() {
            return Some(path.to_path_buf());
        }
        if path.is_relative() {
            let local = Path::new(LOCAL_FONT_DIR).join(path);
            if local.is_file() {
                return Some(local);
            }
        }
        None
    }
}

/// DejaVu Sans, compiled in so labels render on hosts without any fonts.
pub const BUNDLED_FAMILY: &str = "DejaVu Sans";
static BUNDLED_REGULAR: &[u8] = include_bytes!("../assets/fonts/DejaVuSans.ttf");
static BUNDLED_BOLD: &[u8] = include_bytes!("../assets/fonts/DejaVuSans-Bold.ttf");

/// Loads the compiled-in faces into any fontdb flavor and makes them the
/// sans-serif family.
macro_rules! load_bundled_fonts {
    ($db:expr) => {{
        let db = $db;
        db.load_font_data(BUNDLED_REGULAR.to_vec());
        db.load_font_data(BUNDLED_BOLD.to_vec());
        db.set_sans_serif_family(BUNDLED_FAMILY);
        BUNDLED_FAMILY.to_string()
    }};
}

/// Font setup shared by every fontdb flavor we render through: the usvg one
/// resvg uses and the one svg2pdf bundles. Returns the family labels are set
/// in: the regular file's, or the bundled one when that file did not load.
macro_rules! load_font_files {
    ($db:expr, $files:expr) => {{
        let db = $db;
        let files: &FontFiles = $files;
        db.load_system_fonts();
        let local_fonts = Path::new(LOCAL_FONT_DIR);
        if local_fonts.is_dir() {
            db.load_fonts_dir(local_fonts);
        }

        let mut regular_family: Option<String> = None;
        for (path, is_regular) in [(&files.regular, true), (&files.bold, false)] {
            let Some(found) = FontFiles::locate(path) else {
                tracing::warn!(path = %path.display(), "font file not found, using bundled font");
                continue;
            };
            let before = db.len();
            if let Err(err) = db.load_font_file(&found) {
                tracing::warn!(path = %found.display(), %err, "failed to load font file, using bundled font");
                continue;
            }
            if is_regular {
                regular_family = db
                    .faces()
                    .nth(before)
                    .and_then(|face| face.families.first())
                    .map(|(family, _)| family.clone());
            }
        }

        match regular_family {
            Some(family) => {
                db.set_sans_serif_family(family.as_str());
                family
            }
            None => load_bundled_fonts!(db),
        }
    }};
}

/// Font database used for rasterizing, plus the family name labels are set in.
#[derive(Clone)]
pub struct FontContext {
    pub db: Arc<usvg::fontdb::Database>,
    pub family: String,
    /// `None` for the bundled-only context.
    files: Option<FontFiles>,
}

impl FontContext {
    pub fn load(files: &FontFiles) -> Self {
        let mut db = usvg::fontdb::Database::new();
        let family = load_font_files!(&mut db, files);
        tracing::debug!(%family, faces = db.len(), "font database ready");

        Self {
            db: Arc::new(db),
            family: format!("'{family}', {GENERIC_FAMILY}"),
            files: Some(files.clone()),
        }
    }

    /// Only the compiled-in faces, without system fonts, so output does not
    /// depend on the host.
    pub fn bundled() -> Self {
        let mut db = usvg::fontdb::Database::new();
        let family = load_bundled_fonts!(&mut db);

        Self {
            db: Arc::new(db),
            family: format!("'{family}', {GENERIC_FAMILY}"),
            files: None,
        }
    }

    /// Fresh database for the PDF backend, which carries its own fontdb.
    pub fn pdf_database(&self) -> svg2pdf::usvg::fontdb::Database {
        let mut db = svg2pdf::usvg::fontdb::Database::new();
        match &self.files {
            Some(files) => {
                load_font_files!(&mut db, files);
            }
            None => {
                load_bundled_fonts!(&mut db);
            }
        }
        db
    }
}

#[derive(Hash, PartialEq, Eq, Clone)]
struct MeasureKey {
    text: String,
    font_size_bits: u32,
    is_bold: bool,
}

pub trait TextMeasure {
    /// Rendered width of a single line of text.
    fn measure_width(&mut self, text: &str, font_size: f32, is_bold: bool) -> f32;
}

pub struct CosmicTextMeasure {
    font_system: FontSystem,
    family: Option<String>,
    cache: HashMap<MeasureKey, f32>,
}

impl CosmicTextMeasure {
    pub fn new(files: &FontFiles) -> Self {
        let mut font_system = FontSystem::new();
        let db = font_system.db_mut();
        let mut family = None;
        if let Some(found) = FontFiles::locate(&files.regular) {
            let before = db.len();
            match db.load_font_file(&found) {
                Ok(()) => {
                    family = db
                        .faces()
                        .nth(before)
                        .and_then(|face| face.families.first())
                        .map(|(name, _)| name.clone());
                }
                Err(err) => {
                    tracing::warn!(path = %found.display(), %err, "failed to load font file for measuring");
                }
            }
        }
        if let Some(found) = FontFiles::locate(&files.bold) {
            if let Err(err) = db.load_font_file(&found) {
                tracing::warn!(path = %found.display(), %err, "failed to load bold font file for measuring");
            }
        }
        if family.is_none() {
            family = Some(load_bundled_fonts!(db));
        }

        Self {
            font_system,
            family,
            cache: HashMap::new(),
        }
    }
}

impl TextMeasure for CosmicTextMeasure {
    fn measure_width(&mut self, text: &str, font_size: f32, is_bold: bool) -> f32 {
        let key = MeasureKey {
            text: text.to_string(),
            font_size_bits: font_size.to_bits(),
            is_bold,
        };

        if let Some(cached) = self.cache.get(&key) {
            return *cached;
        }

        let mut buffer = Buffer::new(
            &mut self.font_system,
            Metrics {
                font_size,
                line_height: font_size * 1.2,
            },
        );
        buffer.set_size(&mut self.font_system, None, None);

        let attrs = Attrs::new()
            .family(match self.family.as_deref() {
                Some(name) => Family::Name(name),
                None => Family::SansSerif,
            })
            .weight(if is_bold { Weight::BOLD } else { Weight::NORMAL });

        buffer.set_text(&mut self.font_system, text, &attrs, Shaping::Advanced, None);

        let width = buffer
            .layout_runs()
            .fold(0.0f32, |widest, run| widest.max(run.line_w));

        self.cache.insert(key, width);
        width
    }
}
