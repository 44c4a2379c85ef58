use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use presetconv_core::config::{default_settings_path, Settings};
use presetconv_core::operations::{convert_file, resolve_file};
use presetconv_core::{generator_for, ParserSet, ProfileRegistry};
use std::path::PathBuf;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(
    name = "presetconv",
    version,
    about = "Convert instrument plugin presets between formats"
)]
struct Cli {
    /// Settings file (JSON). Defaults to <config dir>/presetconv/settings.json
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Directory of profile descriptors (*.json)
    #[arg(long, global = true)]
    profiles: Option<PathBuf>,

    /// Skip the built-in profiles
    #[arg(long, global = true)]
    no_builtin: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert preset files into the target format
    Convert {
        inputs: Vec<PathBuf>,
        /// Output directory
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Target format: unify or raw
        #[arg(short, long)]
        target: Option<String>,
    },
    /// List registered plugin names
    Profiles,
    /// Show how presets parse and which profile they resolve to
    Inspect { inputs: Vec<PathBuf> },
}

fn init_logging() -> Result<()> {
    let log_level = match std::env::var("LOG_LEVEL")
        .unwrap_or_else(|_| "info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install log subscriber")?;
    Ok(())
}

fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = match cli.settings.clone().or_else(default_settings_path) {
        Some(path) => Settings::load(&path)?,
        None => Settings::default(),
    };
    if let Some(dir) = &cli.profiles {
        settings.profiles_dir = dir.clone();
    }
    if cli.no_builtin {
        settings.load_builtin_profiles = false;
    }
    Ok(settings)
}

fn build_registry(settings: &Settings) -> ProfileRegistry {
    let mut registry = if settings.load_builtin_profiles {
        ProfileRegistry::with_builtin_profiles()
    } else {
        ProfileRegistry::new()
    };

    if settings.profiles_dir.is_dir() {
        let loaded = registry.load_profiles_from_directory(&settings.profiles_dir);
        info!("Loaded {} user profile(s) from {:?}", loaded, settings.profiles_dir);
        if let Some(err) = registry.last_error() {
            warn!("Last profile error: {}", err);
        }
    }
    registry
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging()?;

    let settings = load_settings(&cli)?;
    let registry = build_registry(&settings);
    let parsers = ParserSet::default();

    match cli.command {
        Command::Convert { inputs, out, target } => {
            if inputs.is_empty() {
                bail!("No input files given");
            }
            let out_dir = out.unwrap_or(settings.output_dir);
            let generator = generator_for(target.as_deref().unwrap_or(&settings.target))?;

            let mut failures = 0;
            for input in &inputs {
                match convert_file(input, &parsers, &registry, generator.as_ref(), &out_dir) {
                    Ok(written) => {
                        for path in written {
                            println!("{} -> {}", input.display(), path.display());
                        }
                    }
                    Err(e) => {
                        error!("Failed to convert {:?}: {}", input, e);
                        failures += 1;
                    }
                }
            }
            if failures > 0 {
                bail!("{} of {} input(s) failed", failures, inputs.len());
            }
        }
        Command::Profiles => {
            for name in registry.get_registered_plugin_names() {
                println!("{}", name);
            }
        }
        Command::Inspect { inputs } => {
            for input in &inputs {
                let resolved = resolve_file(input, &parsers, &registry)
                    .with_context(|| format!("Failed to inspect {:?}", input))?;
                for item in resolved {
                    let preset = &item.preset;
                    println!("{}", input.display());
                    println!("  preset:  {}", preset.preset_name);
                    println!(
                        "  payload: {} ({} bytes)",
                        if preset.is_text_based() { "text" } else { "chunk" },
                        preset.payload_bytes().len()
                    );
                    println!("  plugin:  {} [{}]", preset.plugin_name, preset.plugin_id);
                    println!("  matched: {:?}", item.stage);
                }
            }
        }
    }

    Ok(())
}
