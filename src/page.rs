//! 小说目录页的读取
//!
//! 核心逻辑只依赖 [`DocumentReader`], 真实页面由 [`HtmlDocument`] 提供

use scraper::{Html, Selector};
use tracing::warn;
use url::Url;

pub const TITLE_SELECTOR: &str = ".entry-title";

pub const CHAPTER_LIST_SELECTOR: &str = ".eplister.eplisterfull ul li a";

/// 存在该元素时才认为当前页面是小说目录页
pub const TRIGGER_ANCHOR_SELECTOR: &str = ".thumbook > .rt > .bookmark";

pub const UNTITLED: &str = "Untitled";

/// 对页面的只读访问
pub trait DocumentReader {
    /// 第一个匹配元素的文本内容
    fn text(&self, selector: &str) -> Option<String>;

    /// 所有匹配元素的链接目标, 按文档顺序
    fn links(&self, selector: &str) -> Vec<String>;

    fn contains(&self, selector: &str) -> bool;
}

pub fn get_title(reader: &impl DocumentReader) -> String {
    reader
        .text(TITLE_SELECTOR)
        .map(|title| title.trim().to_owned())
        .filter(|title| !title.is_empty())
        .unwrap_or_else(|| UNTITLED.to_owned())
}

/// 目录页按从新到旧排列, 这里翻转为从旧到新
pub fn get_chapter_urls(reader: &impl DocumentReader) -> Vec<String> {
    let mut urls = reader.links(CHAPTER_LIST_SELECTOR);
    urls.reverse();
    urls
}

pub struct HtmlDocument {
    document: Html,
    base: Option<Url>,
}

impl HtmlDocument {
    pub fn parse(html: &str, page_url: Option<&str>) -> Self {
        Self {
            document: Html::parse_document(html),
            base: page_url.and_then(|u| Url::parse(u).ok()),
        }
    }

    fn selector(selector: &str) -> Option<Selector> {
        match Selector::parse(selector) {
            Ok(selector) => Some(selector),
            Err(e) => {
                warn!("无效的选择器 {}: {}", selector, e);
                None
            }
        }
    }

    fn resolve(&self, href: &str) -> String {
        match &self.base {
            Some(base) => base
                .join(href)
                .map(String::from)
                .unwrap_or_else(|_| href.to_owned()),
            None => href.to_owned(),
        }
    }
}

impl DocumentReader for HtmlDocument {
    fn text(&self, selector: &str) -> Option<String> {
        let selector = Self::selector(selector)?;
        self.document
            .select(&selector)
            .next()
            .map(|elem| elem.text().collect::<String>())
    }

    fn links(&self, selector: &str) -> Vec<String> {
        let Some(selector) = Self::selector(selector) else {
            return Vec::new();
        };
        self.document
            .select(&selector)
            .filter_map(|elem| elem.value().attr("href"))
            .map(|href| self.resolve(href))
            .collect()
    }

    fn contains(&self, selector: &str) -> bool {
        Self::selector(selector)
            .is_some_and(|selector| self.document.select(&selector).next().is_some())
    }
}
