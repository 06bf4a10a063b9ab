//! Release config CLI
//!
//! Entry point for the `release-config` command-line tool.

use clap::Parser;
use release_config::{default_map_paths, Format, ReleaseConfigs, Settings};
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_OUT_DIR: &str = "out/soong/release-config";
const DEFAULT_PRODUCT: &str = "unknown";

#[derive(Parser)]
#[command(name = "release-config")]
#[command(about = "Resolve build flag values for a release config", version)]
struct Cli {
    /// Release config map path (repeatable, lowest precedence first)
    #[arg(long = "map")]
    maps: Vec<PathBuf>,

    /// Target release config name or alias
    #[arg(long, env = "TARGET_RELEASE")]
    release: String,

    /// Product name used in artifact file names
    #[arg(long, env = "TARGET_PRODUCT")]
    product: Option<String>,

    /// Output directory for artifacts
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Artifact format (repeatable: json, binary, text)
    #[arg(long = "format")]
    formats: Vec<Format>,

    /// Use trunk_staging values for an unknown target release
    #[arg(long)]
    allow_missing: bool,

    /// Also write the inheritance graph (DOT) to this path
    #[arg(long)]
    graph: Option<PathBuf>,

    /// Also write per-container build flags
    #[arg(long)]
    partition_flags: bool,

    /// Print every release name as JSON and exit
    #[arg(long)]
    list_releases: bool,

    /// Path to settings file (default: <top>/release_config.toml, if present)
    #[arg(long, short = 's')]
    settings: Option<PathBuf>,

    /// Top of the source tree
    #[arg(long, default_value = ".")]
    top: PathBuf,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn run(cli: Cli) -> release_config::Result<()> {
    let settings = load_settings(cli.settings.as_deref(), &cli.top)?;

    let maps = if !cli.maps.is_empty() {
        cli.maps
    } else if !settings.maps.is_empty() {
        settings.maps.iter().map(|m| cli.top.join(m)).collect()
    } else {
        default_map_paths(&cli.top)
    };
    let allow_missing = cli.allow_missing || settings.allow_missing;

    let configs = ReleaseConfigs::read_release_config_maps(&maps, &cli.release, allow_missing)?;

    if cli.list_releases {
        let names = configs.all_release_names();
        match serde_json::to_string_pretty(&names) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error: failed to encode release names: {}", e);
                process::exit(1);
            }
        }
        return Ok(());
    }

    let product = cli
        .product
        .or(settings.product)
        .unwrap_or_else(|| DEFAULT_PRODUCT.to_string());
    let out_dir = cli
        .out_dir
        .or(settings.out_dir)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUT_DIR));
    let formats = if !cli.formats.is_empty() {
        cli.formats
    } else if !settings.formats.is_empty() {
        settings.formats
    } else {
        Format::ALL.to_vec()
    };

    for format in &formats {
        configs.write_artifact(&out_dir, &product, *format)?;
        if cli.partition_flags {
            configs.write_partition_build_flags(&out_dir, *format)?;
        }
    }

    if let Some(graph) = &cli.graph {
        configs.write_inheritance_graph(graph)?;
    }

    Ok(())
}

fn load_settings(path: Option<&Path>, top: &Path) -> release_config::Result<Settings> {
    match path {
        Some(p) => Ok(Settings::from_file(p)?),
        None => {
            let default = top.join(release_config::settings::SETTINGS_FILE);
            if default.is_file() {
                Ok(Settings::from_file(&default)?)
            } else {
                Ok(Settings::default())
            }
        }
    }
}
