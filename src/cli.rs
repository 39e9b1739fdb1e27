use crate::config::load_config;
use crate::error::ExportError;
use crate::export::{OutputFormat, export_document, render_svg};
use crate::ir::Document;
use crate::normalize::normalize;
use crate::render::write_output_svg;
use crate::scene_dump::write_scene_dump;
use anyhow::Result;
use clap::Parser;
use log::debug;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "excalidraw-export",
    version,
    about = "Export Excalidraw diagrams to PNG or SVG"
)]
pub struct Args {
    /// Input file (.excalidraw) or '-' for stdin
    pub input: PathBuf,

    /// Output file (svg/png). Defaults to <input>.png in the current directory.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Export as SVG instead of PNG
    #[arg(long = "svg")]
    pub svg: bool,

    /// Scale factor for PNG output [default: 2]
    #[arg(long = "scale")]
    pub scale: Option<f32>,

    /// Transparent background
    #[arg(long = "no-background", conflicts_with = "background")]
    pub no_background: bool,

    /// Background color, overriding the document's
    #[arg(long = "background")]
    pub background: Option<String>,

    /// Config JSON file
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Write computed canvas and element bounds as JSON
    #[arg(long = "dump-geometry")]
    pub dump_geometry: Option<PathBuf>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long = "log-level", default_value = "warn")]
    pub log_level: String,
}

pub fn run(args: &Args) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(scale) = args.scale {
        config.scale = scale;
    }
    if args.no_background {
        config.background = Some("transparent".to_string());
    } else if let Some(background) = &args.background {
        config.background = Some(background.clone());
    }
    debug!(config:? = config; "Resolved configuration");

    let mut options = config.export_options();
    let explicit = args.svg.then_some(OutputFormat::Svg);
    let format = OutputFormat::detect(explicit, args.output.as_deref());
    options.format = Some(format);

    let input = read_input(&args.input)?;
    let document = Document::from_json(&input)?;

    if let Some(path) = &args.dump_geometry {
        write_scene_dump(path, &normalize(&document, &options.render))?;
    }

    let output = match &args.output {
        Some(path) => path.clone(),
        None if is_stdin(&args.input) => {
            if format == OutputFormat::Svg {
                let (svg, _) = render_svg(&document, &options);
                write_output_svg(&svg, None)?;
                return Ok(());
            }
            return Err(anyhow::anyhow!(
                "Output path required for png output when reading from stdin"
            ));
        }
        None => default_output(&args.input, format),
    };

    let summary = export_document(&document, &output, &options)?;
    println!("{summary}");
    Ok(())
}

fn is_stdin(path: &Path) -> bool {
    path == Path::new("-")
}

fn read_input(path: &Path) -> Result<String> {
    if is_stdin(path) {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        return Ok(buf);
    }
    if !path.is_file() {
        return Err(ExportError::NotFound(path.to_path_buf()).into());
    }
    Ok(std::fs::read_to_string(path)?)
}

fn default_output(input: &Path, format: OutputFormat) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("diagram");
    PathBuf::from(format!("{stem}.{}", format.extension()))
}
