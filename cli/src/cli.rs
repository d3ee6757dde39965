use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use image_optimizer_core::RawOptions;

/// Optimize, convert and transform images
#[derive(Debug, Parser)]
#[command(name = "image_optimizer", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Optimize images with one flat option set
    Optimize(OptimizeArgs),

    /// Run an ordered list of steps from a JSON file on one image
    Pipeline {
        /// Input image
        input: PathBuf,

        /// JSON file holding a step array or `{"steps": [...]}`
        steps: PathBuf,

        /// Output file or directory (default: next to the input)
        output: Option<PathBuf>,
    },

    /// Display format, dimensions and color space without decoding pixels
    Inspect {
        /// Input file or directory
        input: PathBuf,

        /// Process directories recursively
        #[arg(short, long)]
        recursive: bool,
    },
}

#[derive(Debug, Args)]
pub struct OptimizeArgs {
    /// Input file or directory
    pub input: PathBuf,

    /// Output file or directory (default: next to each input)
    pub output: Option<PathBuf>,

    /// Compression level: lossless, lossy, glossy (or 0, 1, 2)
    #[arg(short, long)]
    pub compression: Option<String>,

    /// Resize mode: none, contain, cover, smartCrop (or 0, 1, 3, 4)
    #[arg(long)]
    pub resize: Option<String>,

    /// Target width in pixels
    #[arg(long)]
    pub width: Option<u32>,

    /// Target height in pixels
    #[arg(long)]
    pub height: Option<u32>,

    /// Fit inside this width, keeping aspect ratio
    #[arg(long)]
    pub max_width: Option<u32>,

    /// Target format (jpeg, jpg, png, webp, avif, gif)
    #[arg(long, short = 't', value_name = "FORMAT")]
    pub to: Option<String>,

    /// Quality for lossy formats (1-100)
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub quality: Option<u8>,

    /// Copy EXIF from the source into the output
    #[arg(long)]
    pub keep_exif: bool,

    /// Leave CMYK sources unconverted
    #[arg(long)]
    pub keep_cmyk: bool,

    /// Process directories recursively
    #[arg(short, long)]
    pub recursive: bool,

    /// Show what would be done without writing files
    #[arg(long)]
    pub dry_run: bool,
}

impl OptimizeArgs {
    pub fn to_raw_options(&self) -> RawOptions {
        RawOptions {
            compression: self.compression.clone(),
            resize: self.resize.clone(),
            resize_width: self.width.map(|w| w.to_string()),
            resize_height: self.height.map(|h| h.to_string()),
            max_width: self.max_width.map(|w| w.to_string()),
            convert_cmyk_to_rgb: Some(!self.keep_cmyk),
            keep_exif: Some(self.keep_exif),
            target_format: self.to.clone(),
            quality: self.quality.map(|q| q.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optimize_flags_map_to_raw_options() {
        let cli = Cli::try_parse_from([
            "image_optimizer",
            "optimize",
            "in.jpg",
            "out",
            "--compression",
            "glossy",
            "--max-width",
            "800",
            "--to",
            "avif",
            "--keep-cmyk",
        ])
        .unwrap();

        let Command::Optimize(args) = cli.command else {
            panic!("expected optimize");
        };
        let raw = args.to_raw_options();
        assert_eq!(raw.compression.as_deref(), Some("glossy"));
        assert_eq!(raw.max_width.as_deref(), Some("800"));
        assert_eq!(raw.target_format.as_deref(), Some("avif"));
        assert_eq!(raw.convert_cmyk_to_rgb, Some(false));
        assert_eq!(raw.keep_exif, Some(false));
        assert!(raw.check().is_ok());
    }

    #[test]
    fn test_quality_range_is_enforced() {
        assert!(Cli::try_parse_from(["image_optimizer", "optimize", "in.png", "-q", "0"]).is_err());
        assert!(Cli::try_parse_from(["image_optimizer", "optimize", "in.png", "-q", "100"]).is_ok());
    }

    #[test]
    fn test_pipeline_subcommand() {
        let cli = Cli::try_parse_from(["image_optimizer", "-v", "pipeline", "in.png", "steps.json"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Command::Pipeline { output: None, .. }));
    }
}
