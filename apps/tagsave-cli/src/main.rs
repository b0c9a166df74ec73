mod demo;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use sha2::{Digest, Sha256};
use tagsave_persist::inspect::{render, summarize, to_json};
use tagsave_persist::{
    CodecConfig, Engine, NAME_HASH_VERSION, SnapshotOrchestrator, SnapshotReport, outline,
};
use tracing_subscriber::EnvFilter;

use crate::demo::{PROFILE, Profile, SETTINGS, Settings};

#[derive(Parser)]
#[command(name = "tagsave-cli", about = "CLI tool for tagsave snapshot streams")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// JSON file with codec limits (max_depth, max_string_len)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version, hash scheme and active limits
    Info,
    /// Save the sample units to a snapshot file
    Demo {
        /// Output file
        #[arg(short, long, default_value = "demo.tsv")]
        out: PathBuf,
    },
    /// Load a snapshot file into fresh sample units and print them
    Load {
        /// Snapshot file
        file: PathBuf,
    },
    /// Print the record outline of any encoded file
    Inspect {
        /// Encoded file
        file: PathBuf,
        /// Emit JSON instead of an indented tree
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Info => {
            println!("tagsave-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("name hash: FNV-1a 32, version {NAME_HASH_VERSION}");
            println!(
                "limits: max_depth={} max_string_len={}",
                config.max_depth, config.max_string_len
            );
        }
        Commands::Demo { out } => {
            let saved = save_demo(&out, config)?;
            println!("Wrote {} bytes to {}", saved.bytes, out.display());
            println!("sha256: {}", saved.sha256);
            println!(
                "Units reset after save: {}",
                if saved.reset { "OK" } else { "NOT RESET" }
            );
        }
        Commands::Load { file } => {
            let loaded = load_demo(&file, config)?;
            println!(
                "Loaded categories {:?}, skipped {:?}",
                loaded.report.loaded, loaded.report.skipped
            );
            println!("{:#?}", loaded.profile);
            println!("{:#?}", loaded.settings);
        }
        Commands::Inspect { file, json } => {
            let bytes = std::fs::read(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let nodes = outline(&bytes, &config)?;
            if json {
                println!("{}", to_json(&nodes)?);
            } else {
                print!("{}", render(&nodes));
                println!("{}", summarize(&nodes));
            }
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<CodecConfig> {
    let Some(path) = path else {
        return Ok(CodecConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config = CodecConfig::from_json(&text)
        .with_context(|| format!("invalid config {}", path.display()))?;
    tracing::debug!(?config, "config loaded");
    Ok(config)
}

fn engine(config: CodecConfig) -> anyhow::Result<Engine> {
    Ok(Engine::new()
        .with_types(demo::registry()?)
        .with_config(config))
}

struct Saved {
    bytes: usize,
    sha256: String,
    reset: bool,
}

fn save_demo(out: &Path, config: CodecConfig) -> anyhow::Result<Saved> {
    let mut profile = demo::sample_profile();
    let mut settings = demo::sample_settings();
    let bytes = {
        let mut orchestrator = SnapshotOrchestrator::new(engine(config)?);
        orchestrator.register(PROFILE, "profile", &mut profile)?;
        orchestrator.register(SETTINGS, "settings", &mut settings)?;
        orchestrator.save()?
    };
    std::fs::write(out, &bytes).with_context(|| format!("failed to write {}", out.display()))?;
    tracing::info!(path = %out.display(), bytes = bytes.len(), "snapshot saved");

    Ok(Saved {
        bytes: bytes.len(),
        sha256: sha256_hex(&bytes),
        reset: profile.inventory.is_empty() && settings == Settings::default(),
    })
}

struct Loaded {
    profile: Profile,
    settings: Settings,
    report: SnapshotReport,
}

fn load_demo(file: &Path, config: CodecConfig) -> anyhow::Result<Loaded> {
    let bytes =
        std::fs::read(file).with_context(|| format!("failed to read {}", file.display()))?;
    let mut profile = Profile::default();
    let mut settings = Settings::default();
    let report = {
        let mut orchestrator = SnapshotOrchestrator::new(engine(config)?);
        orchestrator.register(PROFILE, "profile", &mut profile)?;
        orchestrator.register(SETTINGS, "settings", &mut settings)?;
        orchestrator
            .decode_snapshot(&bytes)
            .with_context(|| format!("failed to decode {}", file.display()))?
    };
    Ok(Loaded {
        profile,
        settings,
        report,
    })
}

fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tagsave_persist::Category;

    #[test]
    fn demo_file_loads_back() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("save.tsv");
        let saved = save_demo(&path, CodecConfig::default()).unwrap();
        assert!(saved.reset);
        assert_eq!(saved.sha256.len(), 64);

        let loaded = load_demo(&path, CodecConfig::default()).unwrap();
        assert_eq!(loaded.report.loaded, [Category(0), Category(1)]);
        assert_eq!(loaded.settings, demo::sample_settings());
        assert_eq!(loaded.profile.inventory, demo::sample_profile().inventory);
    }

    #[test]
    fn demo_output_is_stable() {
        let tmp = tempfile::tempdir().unwrap();
        let a = save_demo(&tmp.path().join("a.tsv"), CodecConfig::default()).unwrap();
        let b = save_demo(&tmp.path().join("b.tsv"), CodecConfig::default()).unwrap();
        assert_eq!(a.sha256, b.sha256);
    }

    #[test]
    fn config_file_overrides_limits() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), r#"{ "max_depth": 2 }"#).unwrap();
        let config = load_config(Some(tmp.path())).unwrap();
        assert_eq!(config.max_depth, 2);

        // the profile nests deeper than two levels
        let out = tempfile::tempdir().unwrap();
        assert!(save_demo(&out.path().join("x.tsv"), config).is_err());
    }

    #[test]
    fn missing_file_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let err = load_demo(&tmp.path().join("absent.tsv"), CodecConfig::default())
            .err()
            .unwrap();
        assert!(err.to_string().contains("failed to read"));
    }

    #[test]
    fn inspect_outline_covers_both_units() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("save.tsv");
        save_demo(&path, CodecConfig::default()).unwrap();
        let nodes = outline(&std::fs::read(&path).unwrap(), &CodecConfig::default()).unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].category, Some(0));
        assert_eq!(nodes[0].children[0].identity.as_deref(), Some("demo::Profile"));
    }
}
