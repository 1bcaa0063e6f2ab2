use anyhow::Result;
use reqwest::{Client, StatusCode};
use tracing::{debug, instrument};

use crate::error::FetchError;

static USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// 目录页和章节页共用的 HTTP 客户端
#[derive(Clone)]
pub struct Downloader {
    client: Client,
}

impl Downloader {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .cookie_store(true)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }

    #[instrument(skip(self))]
    pub async fn html(&self, url: &str) -> Result<String, FetchError> {
        let request_error = |source| FetchError::Request {
            url: url.to_owned(),
            source,
        };

        let response = self.client.get(url).send().await.map_err(request_error)?;
        ensure_success(response.status())?;

        let text = response.text().await.map_err(request_error)?;
        debug!("收到 {} 字节", text.len());
        Ok(text)
    }
}

pub fn ensure_success(status: StatusCode) -> Result<(), FetchError> {
    if status.is_success() {
        Ok(())
    } else {
        Err(FetchError::network(status))
    }
}
