use super::traits::HttpBackend;
use super::types::{ApiResponse, ClientError};
use crate::config::model::Config;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Client, Method};
use serde_json::Value;
use std::time::Duration;

const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";

/// 基于reqwest的负载均衡服务客户端
#[derive(Clone)]
pub struct RestClient {
    client: Client,
    base_url: String,
    headers: HeaderMap,
}

impl RestClient {
    /// 创建新的客户端，需要提供base_url
    pub fn new(base_url: String) -> Result<Self, ClientError> {
        Self::from_config(&Config::with_base_url(base_url))
    }

    /// 按配置创建客户端，配置先经过 `Config::validate` 校验
    pub fn from_config(config: &Config) -> Result<Self, ClientError> {
        config
            .validate()
            .map_err(|e| ClientError::ConfigError(e.to_string()))?;

        let settings = &config.settings;
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_seconds))
            .connect_timeout(Duration::from_secs(settings.connect_timeout_seconds))
            .build()?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, parse_header_value(&settings.user_agent)?);

        if let Some(token) = &config.endpoint.auth_token {
            headers.insert(
                HeaderName::from_static("x-auth-token"),
                parse_header_value(token).map_err(|_| {
                    ClientError::HeaderParseError(format!("Invalid {AUTH_TOKEN_HEADER} header"))
                })?,
            );
        }

        for (name, value) in &config.endpoint.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                ClientError::HeaderParseError(format!("Invalid header name '{}': {}", name, e))
            })?;
            headers.insert(header_name, parse_header_value(value)?);
        }

        Ok(Self {
            client,
            base_url: config.endpoint.base_url.trim_end_matches('/').to_string(),
            headers,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

fn parse_header_value(value: &str) -> Result<HeaderValue, ClientError> {
    HeaderValue::from_str(value)
        .map_err(|e| ClientError::HeaderParseError(format!("Invalid header value: {}", e)))
}

#[async_trait]
impl HttpBackend for RestClient {
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<ApiResponse, ClientError> {
        tracing::debug!("{} {}", method, path);

        let mut request = self
            .client
            .request(method.clone(), self.url(path))
            .headers(self.headers.clone());
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;

        if !(200..300).contains(&status) {
            tracing::warn!("{} {} failed with status {}", method, path, status);
            return Err(ClientError::UpstreamError { status, body: text });
        }

        // 204 和 202 通常没有响应体
        let body = if text.trim().is_empty() {
            None
        } else {
            Some(serde_json::from_str(&text)?)
        };

        Ok(ApiResponse::new(status, body))
    }
}
