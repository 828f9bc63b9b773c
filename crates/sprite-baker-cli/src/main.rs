use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{ArgAction, Parser};
use serde::Deserialize;
use sprite_baker_core::{BuildConfig, BuildError, ContentBuilder};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(
    name = "sprite-baker",
    about = "Incrementally build a game content tree: atlases, sprite animations and plain files",
    version,
    author
)]
struct Cli {
    // Input/Output
    /// Source content root (never written)
    #[arg(help_heading = "Input/Output")]
    source: PathBuf,
    /// Target output root
    #[arg(help_heading = "Input/Output")]
    target: PathBuf,
    /// Subtree (relative to source) where atlas and animation handlers apply; empty = whole tree
    #[arg(long, default_value = "textures", help_heading = "Input/Output")]
    textures: PathBuf,
    /// YAML config file path (values override the command line)
    #[arg(long, help_heading = "Input/Output")]
    config: Option<PathBuf>,
    /// Target-relative path never removed by the sweep (repeatable)
    #[arg(long, help_heading = "Input/Output")]
    preserve: Vec<PathBuf>,

    // Atlas
    /// Maximum atlas side in pixels (power of two)
    #[arg(long, default_value_t = 4096, help_heading = "Atlas")]
    max_sheet_size: u32,
    /// Padding right/below every sprite
    #[arg(long, default_value_t = 1, help_heading = "Atlas")]
    padding: u32,
    /// Trim transparent borders
    #[arg(long, default_value_t = false, action=ArgAction::Set, help_heading = "Atlas")]
    trim: bool,
    /// Premultiply color by alpha when compositing
    #[arg(long, default_value_t = true, action=ArgAction::Set, help_heading = "Atlas")]
    premultiply: bool,

    // Export
    /// Print the merged configuration (after CLI/YAML) and exit
    #[arg(long, default_value_t = false, help_heading = "Export")]
    print_config: bool,
    /// Output format for --print-config: json|yaml
    #[arg(long, default_value = "json", value_parser = ["json", "yaml"], help_heading = "Export")]
    print_config_format: String,

    // Logging
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action=ArgAction::Count, help_heading = "Logging/UX")]
    verbose: u8,
    /// Quiet mode (overrides verbose)
    #[arg(short, long, default_value_t = false, help_heading = "Logging/UX")]
    quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing_with_level(cli.quiet, cli.verbose);
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            let code = e
                .downcast_ref::<BuildError>()
                .map_or(1, BuildError::exit_code);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let cfg = resolve_config(cli)?;

    if cli.print_config {
        match cli.print_config_format.as_str() {
            "yaml" => println!("{}", serde_yaml::to_string(&cfg)?),
            _ => println!("{}", serde_json::to_string_pretty(&cfg)?),
        }
        return Ok(());
    }

    let mut builder = ContentBuilder::new(cfg);
    let report = builder.build()?;
    info!(
        directories = report.directories,
        atlases = report.tally("makeatlas").rebuilt,
        animations = report.tally("spriteanim").rebuilt,
        copied = report.files_copied,
        removed = report.removed,
        "content up to date"
    );
    Ok(())
}

fn resolve_config(cli: &Cli) -> anyhow::Result<BuildConfig> {
    let mut builder = BuildConfig::builder()
        .source_dir(&cli.source)
        .target_dir(&cli.target)
        .textures_dir(&cli.textures)
        .max_sheet_size(cli.max_sheet_size)
        .padding(cli.padding)
        .trim(cli.trim)
        .premultiply_alpha(cli.premultiply);
    for p in &cli.preserve {
        builder = builder.preserve(p);
    }
    let cfg = builder.build();

    match &cli.config {
        Some(path) => Ok(load_yaml(path)?.into_build_config(cfg)),
        None => Ok(cfg),
    }
}

fn load_yaml(path: &Path) -> anyhow::Result<YamlConfig> {
    let file = fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    serde_yaml::from_str(&file).with_context(|| format!("parse config {}", path.display()))
}

fn init_tracing_with_level(quiet: bool, verbose: u8) {
    let level = if quiet {
        "error".to_string()
    } else {
        match verbose {
            0 => "info".into(),
            1 => "debug".into(),
            _ => "trace".into(),
        }
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_target(false)
        .try_init();
}

/// YAML config file; every key is optional and overrides the command line.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct YamlConfig {
    source_dir: Option<PathBuf>,
    target_dir: Option<PathBuf>,
    textures_dir: Option<PathBuf>,
    max_sheet_size: Option<u32>,
    padding: Option<u32>,
    trim: Option<bool>,
    premultiply_alpha: Option<bool>,
    /// Appended to the `--preserve` entries.
    preserve: Option<Vec<PathBuf>>,
}

impl YamlConfig {
    fn into_build_config(self, mut cfg: BuildConfig) -> BuildConfig {
        if let Some(v) = self.source_dir {
            cfg.source_dir = v;
        }
        if let Some(v) = self.target_dir {
            cfg.target_dir = v;
        }
        if let Some(v) = self.textures_dir {
            cfg.textures_dir = v;
        }
        if let Some(v) = self.max_sheet_size {
            cfg.max_sheet_size = v;
        }
        if let Some(v) = self.padding {
            cfg.padding = v;
        }
        if let Some(v) = self.trim {
            cfg.trim = v;
        }
        if let Some(v) = self.premultiply_alpha {
            cfg.premultiply_alpha = v;
        }
        if let Some(v) = self.preserve {
            cfg.preserve.extend(v);
        }
        cfg
    }
}
