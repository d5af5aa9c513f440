use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{
    cli::{AppContext, InitArgs},
    core::reconstruct::{AmbiguousPolicy, JoinPolicy},
    infra::exclude::ExclusionRules,
};

pub const CONFIG_FILE_NAME: &str = "syncronet.toml";

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config
{
    /// Exclusion lists; a list given here replaces the built-in one
    pub exclude: ExclusionRules,

    /// Default encoding settings
    pub encode: EncodeConfig,

    /// Default reconstruction settings
    pub decode: DecodeConfig,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodeConfig
{
    pub wrap_width: usize,
    pub lines_per_page: usize,
    pub encodings: Vec<String>,
    pub gitignore: bool,
    pub include_hidden: bool,
    pub output_file: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeConfig
{
    pub join_policy: JoinPolicy,
    pub ambiguous_policy: AmbiguousPolicy,
    pub indent_threshold: usize,
    pub trim_trailing: bool,
    pub write_report: bool,
}

impl Default for EncodeConfig
{
    fn default() -> Self
    {
        Self {
            wrap_width: 100,
            lines_per_page: 66,
            encodings: vec!["utf-8".to_string(), "windows-1252".to_string()],
            gitignore: false,
            include_hidden: true,
            output_file: "documentazione_progetto.txt".to_string(),
        }
    }
}

impl Default for DecodeConfig
{
    fn default() -> Self
    {
        Self {
            join_policy: JoinPolicy::default(),
            ambiguous_policy: AmbiguousPolicy::default(),
            indent_threshold: 10,
            trim_trailing: false,
            write_report: true,
        }
    }
}

pub fn load_config() -> Result<Config>
{
    load_config_from(Path::new("."))
}

/// First config file found in `dir` wins, then `SYNCRONET_*` variables
/// (`SYNCRONET_ENCODE__WRAP_WIDTH=120`).
pub fn load_config_from(dir: &Path) -> Result<Config>
{
    let mut builder = config::Config::builder();

    let config_paths = ["syncronet.toml", "syncronet.yaml", "syncronet.json", ".syncronet.toml"];

    for name in &config_paths
    {
        let path = dir.join(name);
        if path.exists()
        {
            tracing::debug!(path = %path.display(), "loading config");
            builder = builder.add_source(config::File::from(path));
            break;
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("SYNCRONET")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let cfg = builder
        .build()
        .context("Failed to load configuration")?;
    let parsed: Config = cfg
        .try_deserialize()
        .context("Failed to parse configuration")?;

    Ok(parsed)
}

pub fn init(
    args: InitArgs,
    ctx: &AppContext,
) -> Result<()>
{
    let config_path = args
        .path
        .join(CONFIG_FILE_NAME);

    if config_path.exists() && !args.force
    {
        anyhow::bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    let config = Config::default();
    let toml_string =
        toml::to_string_pretty(&config).context("Failed to serialize default config")?;

    if ctx.dry_run
    {
        println!("{toml_string}");
        return Ok(());
    }

    std::fs::write(&config_path, toml_string).context("Failed to write config file")?;

    if !ctx.quiet
    {
        println!("Created config file at {}", config_path.display());
    }
    Ok(())
}
