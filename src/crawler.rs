pub mod batch;
pub mod downloader;
pub mod parser;

use async_trait::async_trait;
use tracing::{debug, instrument};

pub use batch::{BatchProgress, Clock, TokioClock, download_all};
pub use downloader::Downloader;
pub use parser::Parser;

use crate::error::FetchError;

/// 抓取并清理单个章节, 返回以空行结尾的正文
#[async_trait]
pub trait ChapterFetcher: Send + Sync {
    async fn fetch_chapter(&self, url: &str) -> Result<String, FetchError>;
}

#[derive(Clone)]
pub struct HttpChapterFetcher {
    downloader: Downloader,
    parser: Parser,
}

impl HttpChapterFetcher {
    pub fn new(downloader: Downloader, parser: Parser) -> Self {
        Self { downloader, parser }
    }
}

#[async_trait]
impl ChapterFetcher for HttpChapterFetcher {
    #[instrument(skip(self))]
    async fn fetch_chapter(&self, url: &str) -> Result<String, FetchError> {
        let chapter_html = self.downloader.html(url).await?;
        let content = self.parser.chapter_content(&chapter_html)?;
        debug!("章节内容提取完成");
        Ok(content)
    }
}
