use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "config.yml";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default = "default_script_file")]
    pub script_file: String,

    #[serde(default = "default_output")]
    pub output_folder: String,

    #[serde(default)]
    pub unattended: bool,

    /// Fetch every artifact into `output_folder` once the video is ready.
    #[serde(default = "default_download")]
    pub download: bool,

    #[serde(default = "default_download_concurrency")]
    pub download_concurrency: usize,

    /// Preferred prompt generation level: `true` for AI analysis, `false`
    /// for templates. `None` keeps whatever the backend is set to.
    #[serde(default)]
    pub enhancement: Option<bool>,

    #[serde(skip)]
    path: Option<PathBuf>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BackendConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            script_file: default_script_file(),
            output_folder: default_output(),
            unattended: false,
            download: default_download(),
            download_concurrency: default_download_concurrency(),
            enhancement: None,
            path: None,
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:5000".to_string()
}
fn default_script_file() -> String {
    "script.txt".to_string()
}
fn default_output() -> String {
    "output".to_string()
}
fn default_download() -> bool {
    true
}
fn default_download_concurrency() -> usize {
    4
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(CONFIG_FILE)
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            anyhow::bail!("{} not found. Please create one.", path.display());
        }

        let content = fs::read_to_string(path)
            .context(format!("Failed to read {}", path.display()))?;
        let mut config: Config = serde_yaml_ng::from_str(&content)
            .context(format!("Failed to parse {}", path.display()))?;
        config.path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Writes back to the file the config was loaded from.
    pub fn save(&self) -> Result<()> {
        let path = self
            .path
            .clone()
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE));
        let content = serde_yaml_ng::to_string(self)?;
        fs::write(&path, content).context(format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    pub fn ensure_directories(&self) -> Result<()> {
        fs::create_dir_all(&self.output_folder)?;
        Ok(())
    }
}
