use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;

use image_optimizer::cli::{Cli, Command, OptimizeArgs};
use image_optimizer::io::{collect_files, read_steps, resolve_output, write_file};
use image_optimizer::report::{format_size, FileResult, Report, Written};
use image_optimizer_core::metadata::read_exif;
use image_optimizer_core::{Engine, EngineConfig, ImageAsset, ProcessingResult};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Init logging
    let log_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config = EngineConfig::from_env().context("Invalid engine configuration")?;

    match &cli.command {
        Command::Optimize(args) => handle_optimize(args, config),
        Command::Pipeline {
            input,
            steps,
            output,
        } => handle_pipeline(input, steps, output.as_deref(), config),
        Command::Inspect { input, recursive } => handle_inspect(input, *recursive, &config),
    }
}

fn handle_optimize(args: &OptimizeArgs, config: EngineConfig) -> Result<()> {
    let raw = args.to_raw_options();
    raw.check().context("Invalid options")?;

    let files = collect_files(&args.input, args.recursive).context("Failed to collect input files")?;

    if files.is_empty() {
        println!("No supported files found.");
        return Ok(());
    }

    println!("Found {} file(s) to process.", files.len());

    if args.dry_run {
        println!("[dry-run] Would process:");
        for f in &files {
            println!("  {}", f.display());
        }
        return Ok(());
    }

    let engine = Engine::new(config);

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .context("Invalid progress template")?
            .progress_chars("█▓░"),
    );

    // Process files in parallel
    let results: Vec<FileResult> = files
        .par_iter()
        .map(|input_path| {
            let outcome = (|| -> Result<FileResult> {
                let asset = ImageAsset::from_file(input_path, engine.config())?;
                let result = engine.process_image(&asset, &raw)?;
                let output_path = resolve_output(
                    input_path,
                    &args.input,
                    args.output.as_deref(),
                    &result.suggested_filename,
                );
                write_file(&output_path, &result.encoded_bytes)?;

                pb.set_message(format!(
                    "{} ({})",
                    display_name(input_path),
                    result.compression_ratio()
                ));

                Ok(FileResult::written(
                    input_path.clone(),
                    Written {
                        output: output_path,
                        original_size: result.original_size as u64,
                        processed_size: result.processed_size as u64,
                    },
                ))
            })();

            pb.inc(1);
            outcome.unwrap_or_else(|e| {
                log::error!("Error processing {}: {:#}", input_path.display(), e);
                FileResult::failed(input_path.clone(), format!("{e:#}"))
            })
        })
        .collect();

    pb.finish_with_message("Done!");

    print!("{}", Report::new(results).summary());

    Ok(())
}

fn handle_pipeline(input: &Path, steps_path: &Path, output: Option<&Path>, config: EngineConfig) -> Result<()> {
    let steps = read_steps(steps_path)?;
    let engine = Engine::new(config);

    let asset = ImageAsset::from_file(input, engine.config())
        .with_context(|| format!("Failed to load {}", input.display()))?;
    let result = engine
        .execute(&asset, &steps)
        .with_context(|| format!("Pipeline failed for {}", input.display()))?;

    let output_path = resolve_output(input, input, output, &result.suggested_filename);
    write_file(&output_path, &result.encoded_bytes)?;

    print_result(&result);
    println!("  Output:     {}", output_path.display());
    Ok(())
}

fn handle_inspect(input: &Path, recursive: bool, config: &EngineConfig) -> Result<()> {
    let files = collect_files(input, recursive).context("Failed to collect input files")?;

    if files.is_empty() {
        println!("No supported files found.");
        return Ok(());
    }

    for file_path in &files {
        println!("\nFile: {}", file_path.display());
        match ImageAsset::from_file(file_path, config) {
            Ok(asset) => {
                println!("  Format:      {} ({})", asset.format(), asset.mime_type());
                println!("  Size:        {}", format_size(asset.byte_size() as u64));
                println!("  Dimensions:  {}", asset.dimensions());
                println!("  Color space: {}", asset.color_space());
                let exif = read_exif(asset.bytes()).map(|e| e.len());
                match exif {
                    Some(len) => println!("  EXIF:        {}", format_size(len as u64)),
                    None => println!("  EXIF:        none"),
                }
            }
            Err(e) => println!("  {} ({})", e, e.code()),
        }
    }

    Ok(())
}

fn print_result(result: &ProcessingResult) {
    println!("✓ {} {}x{}", result.format, result.width, result.height);
    println!(
        "  Size:       {} → {} ({})",
        format_size(result.original_size as u64),
        format_size(result.processed_size as u64),
        result.compression_ratio()
    );
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
