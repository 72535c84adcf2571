mod cmd;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cmd::{ProjectContext, cmd_clean, cmd_info, cmd_lifecycle};
use output::OutputFormat;
use partcraft_lib::consts::PROJECT_FILENAME;
use partcraft_lib::step::Step;

/// partcraft - build a project part by part
#[derive(Parser)]
#[command(name = "partcraft")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Path to the project file
  #[arg(short, long, global = true, default_value = PROJECT_FILENAME)]
  project: PathBuf,

  /// Work directory (default: .partcraft next to the project file)
  #[arg(long, global = true)]
  work_dir: Option<PathBuf>,

  /// Cache directory (default: the user cache directory)
  #[arg(long, global = true)]
  cache_dir: Option<PathBuf>,

  /// Target architecture in deb naming (default: the host architecture)
  #[arg(long, global = true)]
  build_for: Option<String>,

  /// Enable the overlay step
  #[arg(long, global = true)]
  enable_overlay: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Args)]
struct PartsArgs {
  /// Parts to process (default: all parts)
  parts: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
  /// Fetch the sources of the parts
  Pull(PartsArgs),

  /// Apply the overlay scripts of the parts
  Overlay(PartsArgs),

  /// Build the parts
  Build(PartsArgs),

  /// Stage the parts into the common stage directory
  Stage(PartsArgs),

  /// Prime the parts into the final payload directory
  Prime(PartsArgs),

  /// Remove the artifacts of the parts
  Clean(PartsArgs),

  /// Show the project and its directories
  Info {
    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "warn" };
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let ctx = ProjectContext {
    project_file: cli.project,
    work_dir: cli.work_dir,
    cache_dir: cli.cache_dir,
    build_for: cli.build_for,
    enable_overlay: cli.enable_overlay,
  };

  match cli.command {
    Commands::Pull(args) => cmd_lifecycle(&ctx, Step::Pull, &args.parts),
    Commands::Overlay(args) => cmd_lifecycle(&ctx, Step::Overlay, &args.parts),
    Commands::Build(args) => cmd_lifecycle(&ctx, Step::Build, &args.parts),
    Commands::Stage(args) => cmd_lifecycle(&ctx, Step::Stage, &args.parts),
    Commands::Prime(args) => cmd_lifecycle(&ctx, Step::Prime, &args.parts),
    Commands::Clean(args) => cmd_clean(&ctx, &args.parts),
    Commands::Info { output } => cmd_info(&ctx, output),
  }
}
