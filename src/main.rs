//! GeoTIFF Builder - writes tiled, georeferenced TIFF files.
//!
//! This binary plans and assembles a file, then hands it to a file or S3
//! sink. The `inspect` command reads a file back and validates it.

use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use geotiff_builder::{
    config::{Cli, Command, GenerateConfig, InspectConfig, OutputTarget},
    create_s3_client, inspect, validate_file, FileSink, GenerateError, GeoTiffBuilder,
    GeoTiffPlan, InspectReport, S3Sink, TiffSink,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.into_command() {
        Command::Generate(config) => run_generate(config).await,
        Command::Inspect(config) => run_inspect(config).await,
    }
}

/// Initialize the tracing subscriber.
///
/// Logs go to stderr so JSON output on stdout stays machine-readable.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "geotiff_builder=debug"
    } else {
        "geotiff_builder=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

// =============================================================================
// Generate Command
// =============================================================================

async fn run_generate(config: GenerateConfig) -> ExitCode {
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    info!(
        "Generating {}x{} image with {}x{} tiles ({:?} fill)",
        config.width, config.height, config.tile_width, config.tile_length, config.fill
    );

    match generate(&config).await {
        Ok(location) => {
            info!("Wrote {}", location);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Generation failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Plan, build and store the file, returning where it went.
async fn generate(config: &GenerateConfig) -> Result<String, GenerateError> {
    let plan = GeoTiffBuilder::new(config.geometry()).plan()?;
    if config.layout_json {
        print_layout(&plan);
    }

    let mut source = config.fill.source(config.seed);
    let file = plan.build(source.as_mut())?;
    let size = file.len();

    let (sink, name) = open_sink(config).await;
    sink.store(&name, file.into_bytes()).await?;

    info!(size, sink = sink.identifier(), "Stored {}", name);
    Ok(format!("{} ({} bytes)", name, size))
}

async fn open_sink(config: &GenerateConfig) -> (Box<dyn TiffSink>, String) {
    match config.target() {
        OutputTarget::File { dir, name } => {
            let sink: Box<dyn TiffSink> = Box::new(FileSink::new(dir));
            (sink, name)
        }
        OutputTarget::S3 { bucket, key } => {
            let client = create_s3_client(config.s3_endpoint.as_deref(), &config.s3_region).await;
            let sink: Box<dyn TiffSink> = Box::new(S3Sink::new(client, bucket, ""));
            (sink, key)
        }
    }
}

fn print_layout(plan: &GeoTiffPlan) {
    match serde_json::to_string_pretty(&plan.report()) {
        Ok(json) => println!("{}", json),
        Err(e) => error!("Failed to serialize layout: {}", e),
    }
}

// =============================================================================
// Inspect Command
// =============================================================================

async fn run_inspect(config: InspectConfig) -> ExitCode {
    if config.verbose {
        init_logging(true);
    }

    if let Err(e) = config.validate() {
        eprintln!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let bytes = match tokio::fs::read(&config.path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Failed to read {}: {}", config.path.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let file = match inspect(&bytes) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("✗ {}: {}", config.path.display(), e);
            return ExitCode::FAILURE;
        }
    };
    let validation = validate_file(&file);
    let report = InspectReport::new(&file, &validation);

    if config.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Failed to serialize report: {}", e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        print_report(&config, &report);
    }

    if report.valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn print_report(config: &InspectConfig, report: &InspectReport) {
    println!("{}", config.path.display());
    println!("═════════════════════════════════");
    println!("Byte order:       {}", report.byte_order);
    println!("File size:        {} bytes", report.file_len);
    println!("First IFD offset: {}", report.first_ifd_offset);

    if let Some(ref items) = report.ghost_header {
        println!();
        println!("Ghost header:");
        for (key, value) in items {
            println!("  {}={}", key, value);
        }
    }

    println!();
    println!("Directory entries:");
    println!("─────────────────");
    for entry in &report.entries {
        println!(
            "  {:>5} {:<26} {:<6} x{:<5} {} {}",
            entry.tag,
            entry.name.unwrap_or("?"),
            entry.field_type,
            entry.count,
            if entry.inline { "=" } else { "@" },
            if entry.inline {
                entry.value.clone()
            } else {
                format!("{} {}", entry.value_or_offset, entry.value)
            }
        );
    }

    println!();
    for warning in &report.warnings {
        println!("! {}", warning);
    }
    for error in &report.errors {
        println!("✗ {}", error);
    }
    if report.valid {
        println!("✓ valid");
    }
}
