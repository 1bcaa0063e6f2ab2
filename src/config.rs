use std::{num::NonZeroUsize, sync::LazyLock, time::Duration};

use anyhow::Result;
use serde::Deserialize;

static CONFIG_FILE: &str = "config";

static ENV_PREFIX: &str = "NOBLEMTL";

pub const DEFAULT_BATCH_SIZE: usize = 3;

pub const DEFAULT_BATCH_DELAY_MS: u64 = 2500;

static CONFIG: LazyLock<Result<Config, String>> =
    LazyLock::new(|| init_config().map_err(|e| format!("{:#}", e)));

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            batch_delay_ms: DEFAULT_BATCH_DELAY_MS,
        }
    }
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_batch_delay_ms() -> u64 {
    DEFAULT_BATCH_DELAY_MS
}

/// 每批并发抓取的章节数和批次之间的等待时间
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPolicy {
    pub size: NonZeroUsize,
    pub delay: Duration,
}

impl BatchPolicy {
    pub fn new(size: NonZeroUsize, delay: Duration) -> Self {
        Self { size, delay }
    }
}

impl Default for BatchPolicy {
    fn default() -> Self {
        Self {
            size: NonZeroUsize::new(DEFAULT_BATCH_SIZE).unwrap_or(NonZeroUsize::MIN),
            delay: Duration::from_millis(DEFAULT_BATCH_DELAY_MS),
        }
    }
}

impl Config {
    pub fn policy(&self) -> Result<BatchPolicy> {
        let size = NonZeroUsize::new(self.batch_size)
            .ok_or_else(|| anyhow::anyhow!("batch_size 必须大于 0"))?;
        Ok(BatchPolicy::new(
            size,
            Duration::from_millis(self.batch_delay_ms),
        ))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        config::Config::builder()
            .add_source(config::File::from_str(content, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
            .map_err(|e| anyhow::anyhow!("配置反序列化失败: {}", e))
    }
}

/// 读取工作目录下可选的 config.toml, 环境变量优先
pub fn init_config() -> Result<Config> {
    config::Config::builder()
        .add_source(
            config::File::with_name(CONFIG_FILE)
                .format(config::FileFormat::Toml)
                .required(false),
        )
        .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
        .build()?
        .try_deserialize()
        .map_err(|e| anyhow::anyhow!("配置文件反序列化失败: {}", e))
}

pub fn get_config() -> Result<&'static Config> {
    CONFIG
        .as_ref()
        .map_err(|e| anyhow::anyhow!("配置初始化失败: {}", e))
}
