use clap::{CommandFactory, Parser};
use erdsketch::fonts::{CosmicTextMeasure, DEFAULT_BOLD_FONT, DEFAULT_REGULAR_FONT};
use erdsketch::render::GeometryDump;
use erdsketch::validate::{self, Severity};
use erdsketch::{Diagram, ErdError, FontContext, FontFiles, Style, raster};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Render a hand-laid-out entity-relationship diagram
#[derive(Parser, Debug)]
#[command(name = "erdsketch")]
#[command(version)]
#[command(about = "Render an entity-relationship diagram with authored orthogonal routes to PNG, SVG or PDF", long_about = None)]
struct Args {
    /// Diagram file, TOML or YAML (use "-" for stdin; omit for the bundled schema)
    #[arg(value_name = "DIAGRAM")]
    diagram: Option<PathBuf>,

    /// Output file path (extension determines format: .png, .svg or .pdf)
    #[arg(short, long, value_name = "OUTPUT", default_value = "erd.png")]
    output: PathBuf,

    /// Style overrides, TOML or YAML
    #[arg(short, long, value_name = "STYLE")]
    style: Option<PathBuf>,

    /// Regular font file for attribute and note text
    #[arg(long, value_name = "FONT", default_value = DEFAULT_REGULAR_FONT)]
    font: PathBuf,

    /// Bold font file for entity names and note headings
    #[arg(long, value_name = "FONT", default_value = DEFAULT_BOLD_FONT)]
    bold_font: PathBuf,

    /// Treat validation warnings as errors
    #[arg(long)]
    strict: bool,

    /// Validate the diagram and exit without rendering
    #[arg(long)]
    check: bool,

    /// Also write resolved entity boxes and route polylines as JSON
    #[arg(long, value_name = "FILE")]
    geometry_json: Option<PathBuf>,

    /// Print shell completions and exit
    #[arg(long, value_name = "SHELL")]
    completions: Option<clap_complete::Shell>,
}

fn main() -> Result<(), String> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    if let Some(shell) = args.completions {
        clap_complete::generate(shell, &mut Args::command(), "erdsketch", &mut std::io::stdout());
        return Ok(());
    }

    run(&args).map_err(|e| e.to_string())
}

fn run(args: &Args) -> Result<(), ErdError> {
    let style = match &args.style {
        Some(path) => Style::parse(&read_file(path)?)?,
        None => Style::default(),
    };

    let diagram = match &args.diagram {
        Some(path) if path.to_str() == Some("-") => {
            let mut buffer = String::new();
            std::io::Read::read_to_string(&mut std::io::stdin(), &mut buffer)
                .map_err(|e| ErdError::io("<stdin>", e))?;
            Diagram::parse(&buffer)?
        }
        Some(path) => Diagram::parse(&read_file(path)?)?,
        None => Diagram::builtin()?,
    };

    let font_files = FontFiles {
        regular: args.font.clone(),
        bold: args.bold_font.clone(),
    };

    let mut report = validate::validate(&diagram, &style);
    if report.error_count() == 0 {
        let mut measure = CosmicTextMeasure::new(&font_files);
        report.extend(validate::check_label_widths(&diagram, &style, &mut measure));
    }
    if args.strict {
        report = report.strict();
    }
    for diagnostic in &report.diagnostics {
        match diagnostic.severity {
            Severity::Error => tracing::error!("{}", diagnostic.message),
            Severity::Warning => tracing::warn!("{}", diagnostic.message),
        }
    }
    if report.error_count() > 0 {
        return Err(ErdError::Validation(report.error_count()));
    }

    if args.check {
        tracing::info!(
            entities = diagram.entities.len(),
            routes = diagram.routes.len(),
            notes = diagram.notes.len(),
            "diagram is valid"
        );
        return Ok(());
    }

    let fonts = FontContext::load(&font_files);
    let svg = erdsketch::render_svg(&diagram, &style, &fonts)?;

    if let Some(path) = &args.geometry_json {
        let json = GeometryDump::collect(&diagram, &style)?.to_json()?;
        std::fs::write(path, json).map_err(|e| ErdError::io(path, e))?;
        tracing::info!(path = %path.display(), "geometry written");
    }

    let format = raster::write_output(&args.output, &svg, &fonts)?;
    tracing::info!(
        "saved {} ({}x{}, {:?})",
        args.output.display(),
        diagram.canvas.width,
        diagram.canvas.height,
        format
    );

    Ok(())
}

fn read_file(path: &Path) -> Result<String, ErdError> {
    std::fs::read_to_string(path).map_err(|e| ErdError::io(path, e))
}
