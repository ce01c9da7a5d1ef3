use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use clap::Parser;
use ignore::WalkBuilder;
use pixvec::{
    convert_with_rasterizer, Conversion, NullRasterizer, Options, Palette, Rasterizer,
    ResvgRasterizer,
};
use rayon::prelude::*;

#[derive(Parser)]
#[command(name = "pixvec")]
#[command(about = "Convert SVG documents into pixel-art editor drawings", long_about = None)]
struct Cli {
    /// Input file or directory (use - for stdin)
    #[arg(default_value = "-")]
    input: PathBuf,

    /// Output file (use - for stdout). For directory mode, a .json file is
    /// written next to each .svg.
    #[arg(short, long, default_value = "-")]
    output: PathBuf,

    /// Curve approximation tolerance in drawing units
    #[arg(short, long, default_value = "0.05")]
    tolerance: f64,

    /// Palette override: file with one hex color per line (max 64)
    #[arg(short, long)]
    palette: Option<PathBuf>,

    /// Skip the raster fill layer
    #[arg(long)]
    no_raster: bool,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,

    /// Print per-file segment and warning counts
    #[arg(short, long)]
    stats: bool,

    /// Suppress warnings on stderr
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if !cli.quiet && log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(log::LevelFilter::Warn);
    }

    let options = Options {
        palette: match &cli.palette {
            Some(path) => load_palette(path)?,
            None => Palette::aap64(),
        },
        tolerance: cli.tolerance,
    };

    if cli.input.is_dir() {
        process_directory(&cli, &options)?;
    } else {
        process_single_file(&cli, &options)?;
    }

    Ok(())
}

fn load_palette(path: &PathBuf) -> Result<Palette, Box<dyn std::error::Error>> {
    let text = fs::read_to_string(path)?;
    let entries: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect();
    Ok(Palette::from_hex_list(&entries)?)
}

fn run_conversion(svg: &str, options: &Options, no_raster: bool) -> Result<Conversion, pixvec::PixvecError> {
    let rasterizer: &dyn Rasterizer = if no_raster {
        &NullRasterizer
    } else {
        &ResvgRasterizer
    };
    convert_with_rasterizer(svg, options, rasterizer)
}

fn to_json(conversion: &Conversion, pretty: bool) -> serde_json::Result<String> {
    if pretty {
        serde_json::to_string_pretty(&conversion.document)
    } else {
        serde_json::to_string(&conversion.document)
    }
}

fn process_single_file(cli: &Cli, options: &Options) -> Result<(), Box<dyn std::error::Error>> {
    let input = if cli.input.as_os_str() == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        fs::read_to_string(&cli.input)?
    };

    let conversion = run_conversion(&input, options, cli.no_raster)?;
    let json = to_json(&conversion, cli.pretty)?;

    if cli.output.as_os_str() == "-" {
        io::stdout().write_all(json.as_bytes())?;
    } else {
        fs::write(&cli.output, &json)?;
    }

    if !cli.quiet {
        for warning in &conversion.warnings {
            eprintln!("Warning: {warning}");
        }
    }
    if cli.stats {
        let frame = &conversion.document.layers[0].frames[0];
        eprintln!(
            "{} segments, {} colors mapped, {} warnings",
            frame.path_data_list.len(),
            conversion.mappings.len(),
            conversion.warnings.len()
        );
    }

    Ok(())
}

fn process_directory(cli: &Cli, options: &Options) -> Result<(), Box<dyn std::error::Error>> {
    let files: Vec<PathBuf> = WalkBuilder::new(&cli.input)
        .git_ignore(false)
        .build()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "svg"))
        .map(|e| e.path().to_path_buf())
        .collect();

    let processed = AtomicUsize::new(0);
    let failed = AtomicUsize::new(0);

    files.par_iter().for_each(|path| {
        let outcome = fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|input| {
                run_conversion(&input, options, cli.no_raster).map_err(|e| e.to_string())
            })
            .and_then(|conversion| to_json(&conversion, cli.pretty).map_err(|e| e.to_string()))
            .and_then(|json| {
                fs::write(path.with_extension("json"), json).map_err(|e| e.to_string())
            });

        match outcome {
            Ok(()) => {
                processed.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                if !cli.quiet {
                    eprintln!("Error: {}: {e}", path.display());
                }
                failed.fetch_add(1, Ordering::Relaxed);
            }
        }
    });

    if cli.stats {
        eprintln!(
            "Converted {} files, {} failed",
            processed.load(Ordering::Relaxed),
            failed.load(Ordering::Relaxed)
        );
    }

    Ok(())
}

/// A simple stderr logger.
struct SimpleLogger;

static LOGGER: SimpleLogger = SimpleLogger;

impl log::Log for SimpleLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::LevelFilter::Warn
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            match record.level() {
                log::Level::Error => eprintln!("Error: {}", record.args()),
                log::Level::Warn => eprintln!("Warning: {}", record.args()),
                _ => eprintln!("{}", record.args()),
            }
        }
    }

    fn flush(&self) {}
}
