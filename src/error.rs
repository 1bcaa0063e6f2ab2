use thiserror::Error;

/// 单章抓取失败的原因
#[derive(Debug, Error)]
pub enum FetchError {
    /// 服务器返回了非成功状态码
    #[error("Error during request: {status} ({status_text})")]
    Network { status: u16, status_text: String },

    /// 请求根本没有得到响应
    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// 页面结构和预期不符
    #[error("Element that should contain chapter text is missing.")]
    ContentShape,
}

impl FetchError {
    pub fn network(status: reqwest::StatusCode) -> Self {
        Self::Network {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_error_carries_status_and_text() {
        let err = FetchError::network(reqwest::StatusCode::NOT_FOUND);
        assert!(matches!(
            &err,
            FetchError::Network { status: 404, status_text } if status_text == "Not Found"
        ));
        assert_eq!(err.to_string(), "Error during request: 404 (Not Found)");
    }
}
