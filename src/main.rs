use std::error::Error as StdError;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use serde::Deserialize;

use letterpress::batch::{CertificateBatch, ItemOutcome, package_zip};
use letterpress::{
    Alignment, ContentUnit, ConversionBridge, DocumentKind, EngineOptions, FontSpec, Position,
    Rgb, inspect_template, merge_letterhead_file, render_field_file,
};

type CliResult<T> = Result<T, Box<dyn StdError>>;

#[derive(Parser)]
#[command(name = "letterpress")]
#[command(version)]
#[command(about = "Place names on certificate templates and merge letters onto letterheads", long_about = None)]
struct Cli {
    /// Log progress and timings
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Fail on font families that are not built in instead of using Helvetica
    #[arg(long, global = true)]
    reject_unknown_fonts: bool,

    /// Office-suite executable for DOCX to PDF conversion
    #[arg(long, global = true, value_name = "PATH")]
    soffice: Option<PathBuf>,

    /// Do not fall back to the built-in PDF renderer
    #[arg(long, global = true)]
    no_builtin_renderer: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show page count and size of a PDF template
    Inspect {
        #[arg(value_name = "TEMPLATE")]
        template: PathBuf,
    },

    /// Draw one line of text into a field on a PDF template
    Field {
        #[arg(value_name = "TEMPLATE")]
        template: PathBuf,

        #[arg(long)]
        text: String,

        #[command(flatten)]
        field: FieldArgs,

        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },

    /// Render one certificate per name and pack them into a ZIP archive
    Certificates {
        #[arg(value_name = "TEMPLATE")]
        template: PathBuf,

        /// Text file with one recipient name per line
        #[arg(long, value_name = "FILE")]
        names: PathBuf,

        #[command(flatten)]
        field: FieldArgs,

        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },

    /// Merge a letter body onto a PDF or DOCX letterhead
    Letterhead {
        #[arg(value_name = "TEMPLATE")]
        template: PathBuf,

        /// Authored HTML body
        #[arg(
            long,
            value_name = "FILE",
            conflicts_with = "content",
            required_unless_present = "content"
        )]
        html: Option<PathBuf>,

        /// Uploaded DOCX body
        #[arg(long, value_name = "FILE")]
        content: Option<PathBuf>,

        /// Output kind: pdf or docx
        #[arg(long, default_value = "pdf")]
        format: DocumentKind,

        /// Output file; the extension follows the kind actually produced
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },

    /// Convert a DOCX document to PDF
    Convert {
        #[arg(value_name = "FILE")]
        input: PathBuf,

        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },
}

/// Field box and font, from a JSON config and/or flags. Flags win.
#[derive(Args)]
struct FieldArgs {
    /// JSON file with `position` and `font` objects
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[arg(long)]
    x: Option<f32>,
    #[arg(long)]
    y: Option<f32>,
    #[arg(long)]
    width: Option<f32>,
    #[arg(long)]
    height: Option<f32>,

    /// Font family, e.g. Helvetica, Times-Bold, Courier
    #[arg(long)]
    font: Option<String>,

    #[arg(long)]
    size: Option<f32>,

    /// Text colour as #RRGGBB
    #[arg(long)]
    color: Option<Rgb>,

    /// left, center or right
    #[arg(long)]
    align: Option<Alignment>,
}

#[derive(Deserialize, Default)]
struct FieldConfig {
    position: Option<Position>,
    #[serde(default)]
    font: FontSpec,
}

impl FieldArgs {
    fn resolve(&self) -> CliResult<(Position, FontSpec)> {
        let config: FieldConfig = match &self.config {
            Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
            None => FieldConfig::default(),
        };

        let mut position = match (config.position, self.x, self.y, self.width, self.height) {
            (_, Some(x), Some(y), Some(w), Some(h)) => Position::new(x, y, w, h),
            (Some(p), ..) => p,
            _ => {
                return Err("field position needs --config or all of --x --y --width --height".into());
            }
        };
        position.x = self.x.unwrap_or(position.x);
        position.y = self.y.unwrap_or(position.y);
        position.width = self.width.unwrap_or(position.width);
        position.height = self.height.unwrap_or(position.height);

        let mut font = config.font;
        if let Some(family) = &self.font {
            font.family = family.clone();
        }
        font.size = self.size.unwrap_or(font.size);
        font.color = self.color.unwrap_or(font.color);
        font.alignment = self.align.unwrap_or(font.alignment);

        Ok((position, font))
    }
}

fn engine_options(cli: &Cli) -> EngineOptions {
    let mut options = EngineOptions::from_env();
    if cli.reject_unknown_fonts {
        options = options.reject_unknown_fonts();
    }
    if let Some(program) = &cli.soffice {
        options = options.with_office_program(program);
    }
    if cli.no_builtin_renderer {
        options = options.with_builtin_renderer(false);
    }
    options
}

fn read_names(path: &Path) -> CliResult<Vec<String>> {
    Ok(std::fs::read_to_string(path)?
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect())
}

fn run(cli: Cli) -> CliResult<ExitCode> {
    let options = engine_options(&cli);

    match cli.command {
        Commands::Inspect { template } => {
            let info = inspect_template(&std::fs::read(&template)?)?;
            println!("pages: {}", info.page_count);
            println!("size:  {} x {} pt", info.page_width, info.page_height);
        }

        Commands::Field {
            template,
            text,
            field,
            output,
        } => {
            let (position, font) = field.resolve()?;
            render_field_file(&template, &text, &position, &font, &options, &output)?;
            println!("{}", output.display());
        }

        Commands::Certificates {
            template,
            names,
            field,
            output,
        } => {
            let (position, font) = field.resolve()?;
            let names = read_names(&names)?;
            let template_bytes = std::fs::read(&template)?;
            let report = CertificateBatch::new(&template_bytes, position, font)
                .with_options(options)
                .run(&names, |p| {
                    eprintln!("[{:>3}%] {}/{}", p.percent, p.completed, p.total);
                    ControlFlow::Continue(())
                });

            for item in &report.items {
                match &item.outcome {
                    ItemOutcome::Processed { file_name, .. } => {
                        println!("ok     {:>4}  {}  -> {file_name}", item.index, item.name)
                    }
                    ItemOutcome::Failed { message } => {
                        println!("failed {:>4}  {}  ({message})", item.index, item.name)
                    }
                }
            }

            if report.processed() == 0 {
                eprintln!("error: no certificates were produced");
                return Ok(ExitCode::FAILURE);
            }
            std::fs::write(&output, package_zip(report.files())?)?;
            println!(
                "{}: {} processed, {} failed",
                output.display(),
                report.processed(),
                report.failed()
            );
        }

        Commands::Letterhead {
            template,
            html,
            content,
            format,
            output,
        } => {
            let content = match (html, content) {
                (Some(path), _) => ContentUnit::Markup(std::fs::read_to_string(path)?),
                (None, Some(path)) => ContentUnit::Flowable(std::fs::read(path)?),
                (None, None) => return Err("one of --html or --content is required".into()),
            };
            let bridge = ConversionBridge::from_options(&options);
            let (merged, path) =
                merge_letterhead_file(&template, &content, format, &bridge, &output)?;
            for warning in &merged.warnings {
                eprintln!("warning: {warning}");
            }
            println!("{} ({})", path.display(), merged.kind.extension());
        }

        Commands::Convert { input, output } => {
            let bridge = ConversionBridge::from_options(&options);
            let pdf = bridge.convert(&std::fs::read(&input)?)?;
            std::fs::write(&output, pdf)?;
            println!("{}", output.display());
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let level = if cli.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
