use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

/// Which adapter turns a dataset's raw encoding into triples.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// One edge tensor pair plus train/val/test boolean masks.
    MaskedTensor,
    /// Three independently loaded edge tensor pairs.
    PreSplitTensor,
    /// Three tables of head/relation/tail records.
    Tabular,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatasetConfig {
    pub name: String,
    pub kind: SourceKind,
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PipelineConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Reject datasets whose split masks overlap instead of only logging it.
    #[serde(default = "default_strict_masks")]
    pub strict_masks: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            strict_masks: default_strict_masks(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("data/triples")
}

fn default_strict_masks() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub datasets: Vec<DatasetConfig>,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Reads `<dir>/default`, then `<dir>/<RUN_MODE>` if present, then
    /// `KGPREP_*` environment variables.
    pub fn load_from(dir: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let dir = dir.as_ref();
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            .add_source(File::with_name(&dir.join("default").to_string_lossy()))
            .add_source(
                File::with_name(&dir.join(&run_mode).to_string_lossy()).required(false),
            )
            .add_source(Environment::with_prefix("KGPREP").separator("__"));

        builder.build()?.try_deserialize()
    }
}
