use crate::utils::error::{Result, ScrapeError};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, COOKIE};
use reqwest::Client;
use std::time::Duration;

/// 帶 session cookie 的 HTTP GET 客戶端
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
}

impl PageFetcher {
    pub fn new(cookies: &[(String, String)], timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        if let Some(cookie_header) = cookie_header(cookies) {
            let value = HeaderValue::from_str(&cookie_header).map_err(|e| {
                ScrapeError::ConfigError {
                    message: format!("Invalid cookie value: {}", e),
                }
            })?;
            headers.insert(COOKIE, value);
        }

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self { client })
    }

    /// 非 2xx 狀態碼視為失敗
    pub async fn fetch(&self, url: &str) -> Result<String> {
        tracing::debug!("GET {}", url);
        let response = self.client.get(url).send().await?.error_for_status()?;
        tracing::debug!("Response status: {}", response.status());
        Ok(response.text().await?)
    }
}

fn cookie_header(cookies: &[(String, String)]) -> Option<String> {
    if cookies.is_empty() {
        return None;
    }
    Some(
        cookies
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join("; "),
    )
}
