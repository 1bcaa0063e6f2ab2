use std::path::PathBuf;

use anyhow::Result;
use async_trait::async_trait;
use tokio::fs;
use tracing::{info, instrument};

pub const TEXT_MIME: &str = "text/plain;charset=utf-8";

pub const TEXT_EXTENSION: &str = "txt";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub bytes: Vec<u8>,
    pub mime: &'static str,
}

impl Blob {
    pub fn text<S: AsRef<str>>(parts: &[S]) -> Self {
        let mut bytes = Vec::with_capacity(parts.iter().map(|p| p.as_ref().len()).sum());
        for part in parts {
            bytes.extend_from_slice(part.as_ref().as_bytes());
        }
        Self {
            bytes,
            mime: TEXT_MIME,
        }
    }
}

/// 生成的文件最终交给谁
#[async_trait]
pub trait DownloadSink: Send + Sync {
    async fn deliver(&self, blob: Blob, filename: &str) -> Result<()>;
}

/// 由小说标题得到实际落盘的文件名
pub fn novel_filename(title: &str) -> String {
    safe_filename(&format!("{}.{}", title, TEXT_EXTENSION))
}

pub async fn save<K, S>(sink: &K, texts: &[S], filename: &str) -> Result<()>
where
    K: DownloadSink + ?Sized,
    S: AsRef<str>,
{
    sink.deliver(Blob::text(texts), filename).await
}

/// 写入本地目录的 sink
pub struct FsSink {
    dir: PathBuf,
}

impl FsSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn current_dir() -> Result<Self> {
        Ok(Self::new(std::env::current_dir()?))
    }
}

#[async_trait]
impl DownloadSink for FsSink {
    #[instrument(skip(self, blob), fields(bytes = blob.bytes.len()))]
    async fn deliver(&self, blob: Blob, filename: &str) -> Result<()> {
        let filename = safe_filename(filename);
        let target = self.dir.join(&filename);
        let staging = self.dir.join(format!("{}.part", filename));

        if let Err(e) = fs::write(&staging, &blob.bytes).await {
            let _ = fs::remove_file(&staging).await;
            return Err(anyhow::anyhow!("写入临时文件失败 {}: {}", staging.display(), e));
        }
        if let Err(e) = fs::rename(&staging, &target).await {
            let _ = fs::remove_file(&staging).await;
            return Err(anyhow::anyhow!("保存文件失败 {}: {}", target.display(), e));
        }

        info!("小说已保存到: {}", target.display());
        Ok(())
    }
}

pub fn safe_filename(name: &str) -> String {
    let cleaned = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect::<String>();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        "_".to_owned()
    } else {
        cleaned.to_owned()
    }
}
