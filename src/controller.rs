use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info, instrument};

use crate::config::BatchPolicy;
use crate::crawler::{ChapterFetcher, Clock, download_all};
use crate::crawler::batch::estimate_seconds;
use crate::emitter::{self, DownloadSink, novel_filename};
use crate::logger::LOGS_TAG;
use crate::page::{DocumentReader, TRIGGER_ANCHOR_SELECTOR, get_chapter_urls, get_title};

pub const EMPTY_NOVEL_ALERT: &str =
    "Looks like novel is empty, check console for any warnings or errors.";

/// 与用户交互的方式, 命令行下是终端提示
pub trait Prompter: Send + Sync {
    fn confirm(&self, message: &str) -> Result<bool>;

    fn alert(&self, message: &str);
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// 目录为空, 已提示用户
    Empty,
    /// 用户取消
    Declined,
    Saved { filename: String, chapters: usize },
}

pub struct Controller {
    fetcher: Arc<dyn ChapterFetcher>,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn DownloadSink>,
    prompter: Arc<dyn Prompter>,
    policy: BatchPolicy,
}

impl Controller {
    pub fn new(
        fetcher: Arc<dyn ChapterFetcher>,
        clock: Arc<dyn Clock>,
        sink: Arc<dyn DownloadSink>,
        prompter: Arc<dyn Prompter>,
        policy: BatchPolicy,
    ) -> Self {
        Self {
            fetcher,
            clock,
            sink,
            prompter,
            policy,
        }
    }

    /// 页面上没有书签按钮时说明不是小说目录页, 直接忽略
    pub fn mount<'a, D: DocumentReader>(&'a self, page: &'a D) -> Option<DownloadTrigger<'a, D>> {
        if !page.contains(TRIGGER_ANCHOR_SELECTOR) {
            return None;
        }
        Some(DownloadTrigger {
            controller: self,
            page,
        })
    }
}

pub struct DownloadTrigger<'a, D> {
    controller: &'a Controller,
    page: &'a D,
}

impl<D: DocumentReader> DownloadTrigger<'_, D> {
    #[instrument(skip_all)]
    pub async fn activate(&self) -> Result<Outcome> {
        let Controller {
            fetcher,
            clock,
            sink,
            prompter,
            policy,
        } = self.controller;

        let title = get_title(self.page);
        let urls = get_chapter_urls(self.page);
        if urls.is_empty() {
            prompter.alert(EMPTY_NOVEL_ALERT);
            return Ok(Outcome::Empty);
        }

        let total_secs = estimate_seconds(urls.len(), policy);
        let question = format!(
            "Download entire novel? ({} chapters, around {} seconds)",
            urls.len(),
            total_secs
        );
        if !prompter.confirm(&question)? {
            return Ok(Outcome::Declined);
        }

        info!(
            target: LOGS_TAG,
            "开始下载 \"{}\" (batch_size={}, batch_delay={}ms, total_time={}s)",
            title,
            policy.size,
            policy.delay.as_millis(),
            total_secs
        );

        let chapters = download_all(Arc::as_ref(fetcher), Arc::as_ref(clock), &urls, policy, |p| {
            info!(
                target: LOGS_TAG,
                "下载中, 还剩 {} 批 (约 {} 秒)",
                p.batches_left,
                p.seconds_left
            );
        })
        .await?;

        info!(target: LOGS_TAG, "\"{}\" 下载完成", title);

        let filename = novel_filename(&title);
        emitter::save(Arc::as_ref(sink), &chapters, &filename).await?;
        Ok(Outcome::Saved {
            filename,
            chapters: chapters.len(),
        })
    }

    /// 失败时弹出错误提示, 不保存任何内容
    pub async fn activate_and_report(&self) -> Result<Outcome> {
        let result = self.activate().await;
        if let Err(e) = &result {
            error!(target: LOGS_TAG, "下载失败: {:#}", e);
            self.controller
                .prompter
                .alert(&format!("NobleMTL Utilities ended with error:\n  {:#}", e));
        }
        result
    }
}
