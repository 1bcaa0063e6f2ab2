use std::sync::LazyLock;

use scraper::{Html, Selector};
use tracing::{debug, instrument};

use crate::error::FetchError;

pub const WATERMARK: &str = "From Noble mtl dot com";

pub const CHAPTER_SEPARATOR: &str = "\n\n";

static CONTENT_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(".epcontent.entry-content").expect("无法创建正文选择器")
});

// 带 a 类的段落是站点插入的导航
static PARAGRAPH_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p:not(.a)").expect("无法创建段落选择器"));

#[derive(Clone, Copy, Debug, Default)]
pub struct Parser;

impl Parser {
    #[instrument(skip_all)]
    pub fn chapter_content(&self, chapter_html: &str) -> Result<String, FetchError> {
        let document = Html::parse_document(chapter_html);

        let content_elem = document
            .select(&CONTENT_SELECTOR)
            .next()
            .ok_or(FetchError::ContentShape)?;

        let paragraphs = content_elem
            .select(&PARAGRAPH_SELECTOR)
            .map(|p| p.text().collect::<String>().trim().to_owned())
            .collect::<Vec<_>>();
        debug!("提取到 {} 个段落", paragraphs.len());

        let mut content = strip_watermark(&paragraphs.join("\n"));
        content.push_str(CHAPTER_SEPARATOR);
        Ok(content)
    }
}

pub fn strip_watermark(text: &str) -> String {
    text.replace(WATERMARK, "")
}
