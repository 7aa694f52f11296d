use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub capture: CaptureConfig,
    pub history: HistoryConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// 抓取与拼接的总超时(毫秒)
    pub timeout_ms: u64,
    pub compute_hash: bool,
    pub dhash_resolution: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 5000,
            compute_hash: true,
            dhash_resolution: 8,
        }
    }
}

impl fmt::Display for CaptureConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "timeout={}ms, hash={}, resolution={}",
            self.timeout_ms, self.compute_hash, self.dhash_resolution
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub capacity: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { capacity: 10 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let path = dirs::data_local_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("region-capture");
        Self {
            path: path.to_string_lossy().to_string(),
        }
    }
}

impl StorageConfig {
    pub fn history_file(&self) -> PathBuf {
        Path::new(&self.path).join("history.json")
    }

    pub fn pins_file(&self) -> PathBuf {
        Path::new(&self.path).join("pins.json")
    }

    pub fn pins_dir(&self) -> PathBuf {
        Path::new(&self.path).join("pins")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// 从指定路径加载配置
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).context("Failed to read config file")?;
        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    /// 加载配置，文件不存在时使用默认配置
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load_from(path)
        } else {
            Ok(Self::default())
        }
    }

    /// 获取默认配置文件路径
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("无法获取配置目录")?
            .join("region-capture");
        Ok(config_dir.join("config.toml"))
    }

    pub fn validate(&self) -> Result<()> {
        if self.capture.timeout_ms == 0 {
            anyhow::bail!("capture.timeout_ms 必须大于 0");
        }
        if !(2..=8).contains(&self.capture.dhash_resolution) {
            anyhow::bail!("capture.dhash_resolution 必须在 2-8 之间");
        }
        if self.history.capacity == 0 {
            anyhow::bail!("history.capacity 必须大于 0");
        }
        if self.storage.path.trim().is_empty() {
            anyhow::bail!("storage.path 不能为空");
        }
        Ok(())
    }
}
