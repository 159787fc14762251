//! Command-line interface for the archgraph utility
//!
//! Renders the built-in deployment diagrams, or diagrams described in JSON
//! files, through Graphviz.

use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

use archgraph::core::logging::init_logging;
use archgraph::{
    presets, write_atomically, Diagram, DiagramDescription, Direction, EdgeRouting,
    GraphvizBackend, OutputFormat, RenderOutput, LOG_FORMAT_ENV, LOG_LEVEL_ENV,
};

/// archgraph - Render architecture diagrams through Graphviz
#[derive(Parser)]
#[command(name = "archgraph")]
#[command(about = "A Rust utility to render architecture diagrams through Graphviz")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = env!("CARGO_PKG_AUTHORS"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Set log level (trace|debug|info|warn|error)
    #[arg(long, value_enum, default_value_t = LogLevel::Warn)]
    pub log_level: LogLevel,

    /// Set log format (compact|pretty|json)
    #[arg(long, value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

/// Log level options
#[derive(Copy, Clone, Debug, clap::ValueEnum, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Log format options
#[derive(Copy, Clone, Debug, clap::ValueEnum, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Compact => "compact",
            LogFormat::Pretty => "pretty",
            LogFormat::Json => "json",
        }
    }
}

/// Where the diagram comes from
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct SourceArgs {
    /// Built-in diagram name (see `archgraph presets`)
    #[arg(long)]
    pub preset: Option<String>,

    /// JSON diagram description file
    #[arg(short, long)]
    pub input: Option<PathBuf>,
}

/// Layout overrides applied on top of the diagram's configuration
#[derive(Args, Debug, Clone, Default)]
pub struct LayoutArgs {
    /// Overall diagram title
    #[arg(long)]
    pub label: Option<String>,

    /// Node label font size in points
    #[arg(long)]
    pub font_size: Option<f64>,

    /// Spacing between nodes of the same rank, in inches
    #[arg(long)]
    pub node_separation: Option<f64>,

    /// Spacing between ranks, in inches
    #[arg(long)]
    pub rank_separation: Option<f64>,

    /// Padding around the drawing, in inches
    #[arg(long)]
    pub padding: Option<f64>,

    /// Edge routing style
    #[arg(long, value_enum)]
    pub routing: Option<RoutingChoice>,

    /// Rank direction
    #[arg(long, value_enum)]
    pub direction: Option<DirectionChoice>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render a diagram to an image
    Render {
        #[command(flatten)]
        source: SourceArgs,

        /// Output file; with several formats, used as the file stem
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format, may be repeated
        #[arg(short, long = "format", value_enum)]
        formats: Vec<FormatChoice>,

        /// Graphviz executable to run instead of `dot`
        #[arg(long)]
        dot_path: Option<PathBuf>,

        #[command(flatten)]
        layout: LayoutArgs,
    },

    /// Print the Graphviz DOT description of a diagram
    Dot {
        #[command(flatten)]
        source: SourceArgs,

        /// Output file for the DOT text (use - for stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        layout: LayoutArgs,
    },

    /// Show built-in diagrams
    Presets {
        /// Show in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Validate a JSON diagram description
    Validate {
        /// Description file to validate
        #[arg(short, long)]
        input: PathBuf,
    },
}

/// Supported output formats
#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq)]
pub enum FormatChoice {
    Png,
    Jpg,
    Svg,
    Pdf,
    Dot,
}

impl From<FormatChoice> for OutputFormat {
    fn from(value: FormatChoice) -> Self {
        match value {
            FormatChoice::Png => OutputFormat::Png,
            FormatChoice::Jpg => OutputFormat::Jpg,
            FormatChoice::Svg => OutputFormat::Svg,
            FormatChoice::Pdf => OutputFormat::Pdf,
            FormatChoice::Dot => OutputFormat::Dot,
        }
    }
}

/// Edge routing styles
#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq)]
pub enum RoutingChoice {
    Straight,
    Spline,
    Polyline,
    Ortho,
    Curved,
}

impl From<RoutingChoice> for EdgeRouting {
    fn from(value: RoutingChoice) -> Self {
        match value {
            RoutingChoice::Straight => EdgeRouting::Straight,
            RoutingChoice::Spline => EdgeRouting::Spline,
            RoutingChoice::Polyline => EdgeRouting::Polyline,
            RoutingChoice::Ortho => EdgeRouting::Ortho,
            RoutingChoice::Curved => EdgeRouting::Curved,
        }
    }
}

/// Rank directions
#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq)]
pub enum DirectionChoice {
    /// Top to bottom
    Tb,
    /// Bottom to top
    Bt,
    /// Left to right
    Lr,
    /// Right to left
    Rl,
}

impl From<DirectionChoice> for Direction {
    fn from(value: DirectionChoice) -> Self {
        match value {
            DirectionChoice::Tb => Direction::TopBottom,
            DirectionChoice::Bt => Direction::BottomTop,
            DirectionChoice::Lr => Direction::LeftRight,
            DirectionChoice::Rl => Direction::RightLeft,
        }
    }
}

/// Main CLI application
#[derive(Default)]
pub struct ArchgraphApp;

impl ArchgraphApp {
    /// Create a new application instance
    pub fn new() -> Self {
        Self
    }

    /// Run the application with the given CLI arguments
    pub fn run(&mut self, cli: Cli) -> Result<()> {
        // Environment variables take precedence over CLI flags
        let log_level_str = std::env::var(LOG_LEVEL_ENV)
            .ok()
            .or_else(|| std::env::var("RUST_LOG").ok())
            .or_else(|| Some(cli.log_level.as_str().to_string()));

        let log_format_str = std::env::var(LOG_FORMAT_ENV)
            .ok()
            .or_else(|| Some(cli.log_format.as_str().to_string()));

        if let Err(e) = init_logging(log_level_str.as_deref(), log_format_str.as_deref()) {
            eprintln!("Warning: Failed to initialize logging: {}", e);
        }

        if cli.verbose {
            eprintln!("archgraph v{}", env!("CARGO_PKG_VERSION"));
        }

        match cli.command {
            Commands::Render {
                source,
                output,
                formats,
                dot_path,
                layout,
            } => self.render_command(source, output, formats, dot_path, layout, cli.verbose),
            Commands::Dot {
                source,
                output,
                layout,
            } => self.dot_command(source, output, layout, cli.verbose),
            Commands::Presets { json } => self.presets_command(json, cli.verbose),
            Commands::Validate { input } => self.validate_command(input, cli.verbose),
        }
    }

    /// Build the diagram named by `source` and apply layout overrides
    pub fn load_diagram(&self, source: &SourceArgs, layout: &LayoutArgs) -> Result<Diagram> {
        let mut diagram = match (&source.preset, &source.input) {
            (Some(name), _) => {
                let preset = presets::by_name(name).ok_or_else(|| {
                    anyhow!(
                        "Unknown preset '{}' (available: {})",
                        name,
                        presets::names().join(", ")
                    )
                })?;
                preset.build()?
            }
            (None, Some(path)) => DiagramDescription::from_file(path)?.build()?,
            (None, None) => return Err(anyhow!("Either --preset or --input is required")),
        };

        let config = diagram.config_mut();
        if let Some(label) = &layout.label {
            config.label = label.clone();
        }
        if let Some(font_size) = layout.font_size {
            config.font_size = font_size;
        }
        if let Some(node_separation) = layout.node_separation {
            config.node_separation = node_separation;
        }
        if let Some(rank_separation) = layout.rank_separation {
            config.rank_separation = rank_separation;
        }
        if let Some(padding) = layout.padding {
            config.padding = padding;
        }
        if let Some(routing) = layout.routing {
            config.edge_routing = routing.into();
        }
        if let Some(direction) = layout.direction {
            config.direction = direction.into();
        }

        debug!(diagram = %diagram.name(), config = ?diagram.config(), "Diagram loaded");
        Ok(diagram)
    }

    /// Handle the render command
    fn render_command(
        &self,
        source: SourceArgs,
        output: Option<PathBuf>,
        formats: Vec<FormatChoice>,
        dot_path: Option<PathBuf>,
        layout: LayoutArgs,
        verbose: bool,
    ) -> Result<()> {
        let diagram = self.load_diagram(&source, &layout)?;
        let formats = resolve_formats(&formats, output.as_deref());

        if verbose {
            eprintln!(
                "Loaded '{}' ({} nodes, {} clusters, {} edges)",
                diagram.name(),
                diagram.node_count(),
                diagram.cluster_count(),
                diagram.edge_count()
            );
        }

        let backend = match dot_path {
            Some(path) => GraphvizBackend::with_executable(path),
            None => GraphvizBackend::new(),
        };

        let outputs: Vec<RenderOutput> = match (output, formats.as_slice()) {
            (Some(path), [format]) => vec![diagram.render(&path, *format, &backend)?],
            (Some(path), _) => {
                let stem = strip_known_extension(&path);
                diagram.render_formats(stem, &formats, &backend)?
            }
            (None, _) => {
                let stem = PathBuf::from(diagram.default_filename());
                diagram.render_formats(stem, &formats, &backend)?
            }
        };

        for rendered in &outputs {
            if verbose {
                eprintln!(
                    "Wrote {} ({} bytes, {})",
                    rendered.path.display(),
                    rendered.bytes,
                    rendered.format
                );
            } else {
                println!("{}", rendered.path.display());
            }
        }
        Ok(())
    }

    /// Handle the dot command
    fn dot_command(
        &self,
        source: SourceArgs,
        output: Option<PathBuf>,
        layout: LayoutArgs,
        verbose: bool,
    ) -> Result<()> {
        let diagram = self.load_diagram(&source, &layout)?;
        let dot = diagram.to_dot();

        if verbose {
            eprintln!("Generated {} bytes of DOT", dot.len());
        }

        self.write_output(output, &dot)
    }

    /// Handle the presets command
    fn presets_command(&self, json: bool, verbose: bool) -> Result<()> {
        if verbose {
            eprintln!("Listing built-in diagrams");
        }

        if json {
            let presets: Vec<_> = presets::all()
                .iter()
                .map(|p| {
                    serde_json::json!({
                        "name": p.name,
                        "description": p.description,
                    })
                })
                .collect();
            let listing = serde_json::json!({
                "presets": presets,
                "total": presets.len(),
            });
            println!("{}", serde_json::to_string_pretty(&listing)?);
        } else {
            println!("Built-in diagrams:");
            for preset in presets::all() {
                println!("  {:<10} - {}", preset.name, preset.description);
            }
            println!();
            println!("Total: {}", presets::all().len());
        }

        Ok(())
    }

    /// Handle the validate command
    fn validate_command(&self, input: PathBuf, verbose: bool) -> Result<()> {
        if verbose {
            eprintln!("Validating {}", input.display());
        }

        let result = DiagramDescription::from_file(&input).and_then(|d| d.build());
        match result {
            Ok(diagram) => {
                println!(
                    "✓ Valid diagram '{}': {} nodes, {} clusters, {} edges",
                    diagram.name(),
                    diagram.node_count(),
                    diagram.cluster_count(),
                    diagram.edge_count()
                );
                Ok(())
            }
            Err(e) => {
                println!("✗ Invalid diagram: {}", e);
                Err(e.into())
            }
        }
    }

    /// Write output to file or stdout
    pub fn write_output(&self, output: Option<PathBuf>, content: &str) -> Result<()> {
        match output {
            Some(path) if path.to_string_lossy() != "-" => {
                write_atomically(&path, content.as_bytes())
                    .map_err(|e| anyhow!("Failed to write output file: {}", e))?;
            }
            _ => {
                print!("{}", content);
                io::stdout().flush()?;
            }
        }
        Ok(())
    }
}

/// Requested formats, falling back to the output extension, then PNG
fn resolve_formats(formats: &[FormatChoice], output: Option<&Path>) -> Vec<OutputFormat> {
    if !formats.is_empty() {
        return formats.iter().map(|&f| f.into()).collect();
    }
    let guessed = output.and_then(OutputFormat::from_path);
    vec![guessed.unwrap_or_default()]
}

/// Drop a trailing image extension so `out.png` can act as a stem
fn strip_known_extension(path: &Path) -> PathBuf {
    match OutputFormat::from_path(path) {
        Some(_) => path.with_extension(""),
        None => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_cli_parsing_render_command() {
        let args = vec![
            "archgraph",
            "render",
            "--preset",
            "federated",
            "--output",
            "out.png",
            "--format",
            "svg",
            "--format",
            "png",
            "--font-size",
            "14",
        ];
        let cli = Cli::try_parse_from(args).unwrap();

        match cli.command {
            Commands::Render {
                source,
                output,
                formats,
                dot_path,
                layout,
            } => {
                assert_eq!(source.preset.as_deref(), Some("federated"));
                assert!(source.input.is_none());
                assert_eq!(output.unwrap().to_string_lossy(), "out.png");
                assert_eq!(formats, vec![FormatChoice::Svg, FormatChoice::Png]);
                assert!(dot_path.is_none());
                assert_eq!(layout.font_size, Some(14.0));
                assert!(layout.routing.is_none());
            }
            _ => panic!("Expected Render command"),
        }
    }

    #[test]
    fn test_cli_source_is_required() {
        let args = vec!["archgraph", "render"];
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn test_cli_source_is_exclusive() {
        let args = vec!["archgraph", "dot", "--preset", "local", "--input", "d.json"];
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn test_cli_parsing_dot_command_layout() {
        let args = vec![
            "archgraph",
            "dot",
            "--input",
            "diagram.json",
            "--routing",
            "ortho",
            "--direction",
            "tb",
        ];
        let cli = Cli::try_parse_from(args).unwrap();

        match cli.command {
            Commands::Dot { source, layout, .. } => {
                assert_eq!(source.input.unwrap().to_string_lossy(), "diagram.json");
                assert_eq!(layout.routing, Some(RoutingChoice::Ortho));
                assert_eq!(layout.direction, Some(DirectionChoice::Tb));
            }
            _ => panic!("Expected Dot command"),
        }
    }

    #[test]
    fn test_cli_parsing_presets_command() {
        let cli = Cli::try_parse_from(vec!["archgraph", "presets", "--json"]).unwrap();
        match cli.command {
            Commands::Presets { json } => assert!(json),
            _ => panic!("Expected Presets command"),
        }
    }

    #[test]
    fn test_verbose_flag() {
        let cli = Cli::try_parse_from(vec!["archgraph", "--verbose", "presets"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.log_level, LogLevel::Warn);
    }

    #[test]
    fn test_resolve_formats() {
        assert_eq!(resolve_formats(&[], None), vec![OutputFormat::Png]);
        assert_eq!(
            resolve_formats(&[], Some(Path::new("diagram.svg"))),
            vec![OutputFormat::Svg]
        );
        assert_eq!(
            resolve_formats(&[FormatChoice::Pdf], Some(Path::new("diagram.svg"))),
            vec![OutputFormat::Pdf]
        );
    }

    #[test]
    fn test_strip_known_extension() {
        assert_eq!(strip_known_extension(Path::new("out.png")), PathBuf::from("out"));
        assert_eq!(strip_known_extension(Path::new("out")), PathBuf::from("out"));
        assert_eq!(
            strip_known_extension(Path::new("v1.final")),
            PathBuf::from("v1.final")
        );
    }

    #[test]
    fn test_load_preset_with_overrides() {
        let app = ArchgraphApp::new();
        let source = SourceArgs {
            preset: Some("local".to_string()),
            input: None,
        };
        let layout = LayoutArgs {
            font_size: Some(16.0),
            routing: Some(RoutingChoice::Ortho),
            ..Default::default()
        };

        let diagram = app.load_diagram(&source, &layout).unwrap();
        assert_eq!(diagram.config().font_size, 16.0);
        assert_eq!(diagram.config().edge_routing, EdgeRouting::Ortho);
        assert_eq!(diagram.config().rank_separation, 0.75);
    }

    #[test]
    fn test_load_unknown_preset() {
        let app = ArchgraphApp::new();
        let source = SourceArgs {
            preset: Some("nope".to_string()),
            input: None,
        };
        let err = app.load_diagram(&source, &LayoutArgs::default()).unwrap_err();
        assert!(err.to_string().contains("Unknown preset"));
    }

    #[test]
    fn test_load_description_file() {
        let app = ArchgraphApp::new();
        let dir = tempdir().unwrap();
        let path = dir.path().join("diagram.json");
        fs::write(
            &path,
            r#"{ "name": "Tiny", "nodes": [{ "id": "a" }, { "id": "b" }], "edges": [{ "from": "a", "to": "b" }] }"#,
        )
        .unwrap();

        let source = SourceArgs {
            preset: None,
            input: Some(path),
        };
        let diagram = app.load_diagram(&source, &LayoutArgs::default()).unwrap();
        assert_eq!(diagram.node_count(), 2);
        assert_eq!(diagram.edge_count(), 1);
    }

    #[test]
    fn test_render_dot_format_to_file() {
        let app = ArchgraphApp::new();
        let dir = tempdir().unwrap();
        let output = dir.path().join("federated.dot");
        let source = SourceArgs {
            preset: Some("federated".to_string()),
            input: None,
        };

        app.render_command(
            source,
            Some(output.clone()),
            vec![FormatChoice::Dot],
            Some(PathBuf::from("/nonexistent/dot")),
            LayoutArgs::default(),
            false,
        )
        .unwrap();

        let content = fs::read_to_string(&output).unwrap();
        assert!(content.contains("Science Platform"));
    }

    #[test]
    fn test_render_missing_backend_fails() {
        let app = ArchgraphApp::new();
        let dir = tempdir().unwrap();
        let output = dir.path().join("out.png");
        let source = SourceArgs {
            preset: Some("local".to_string()),
            input: None,
        };

        let err = app
            .render_command(
                source,
                Some(output.clone()),
                vec![],
                Some(PathBuf::from("/nonexistent/dot")),
                LayoutArgs::default(),
                false,
            )
            .unwrap_err();
        assert!(err.to_string().contains("Render backend unavailable"));
        assert!(!output.exists());
    }

    #[test]
    fn test_write_output_to_file() {
        let app = ArchgraphApp::new();
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("graph.dot");

        app.write_output(Some(file_path.clone()), "digraph {}\n").unwrap();
        assert_eq!(fs::read_to_string(&file_path).unwrap(), "digraph {}\n");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_write_output_failure_leaves_no_file() {
        let app = ArchgraphApp::new();
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("missing").join("graph.dot");

        let err = app
            .write_output(Some(file_path.clone()), "digraph {}\n")
            .unwrap_err();
        assert!(err.to_string().contains("graph.dot"));
        assert!(!file_path.exists());
    }

    #[test]
    fn test_presets_command_formats() {
        let app = ArchgraphApp::new();
        assert!(app.presets_command(true, false).is_ok());
        assert!(app.presets_command(false, false).is_ok());
    }
}
