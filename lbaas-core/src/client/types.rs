use reqwest::Method;
use serde_json::Value;
use thiserror::Error;

// 定义客户端错误类型
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("请求头解析失败: {0}")]
    HeaderParseError(String),
    #[error("配置无效: {0}")]
    ConfigError(String),
    #[error("HTTP请求失败: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("JSON解析失败: {0}")]
    JsonParseError(#[from] serde_json::Error),
    #[error("上游API返回错误: 状态码 {status}")]
    UpstreamError { status: u16, body: String },
    #[error("响应信封解析失败: '{key}' {reason}")]
    EnvelopeError { key: String, reason: String },
    #[error("未找到资源: {0}")]
    NotFound(String),
    #[error("匹配到多个资源: {0}")]
    NoUniqueMatch(String),
}

impl ClientError {
    /// 上游返回的HTTP状态码（仅 UpstreamError 有）
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::UpstreamError { status, .. } => Some(*status),
            ClientError::RequestError(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound(_)) || self.status() == Some(404)
    }

    pub fn envelope(key: &str, reason: impl Into<String>) -> Self {
        ClientError::EnvelopeError {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

// 客户端响应类型
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Option<Value>,
    pub is_success: bool,
}

impl ApiResponse {
    pub fn new(status: u16, body: Option<Value>) -> Self {
        Self {
            status,
            body,
            is_success: (200..300).contains(&status),
        }
    }

    /// 取出信封中指定key下的内容
    ///
    /// 响应体为空、不是对象或缺少该key时返回 EnvelopeError
    pub fn take_envelope(self, key: &str) -> Result<Value, ClientError> {
        let body = self
            .body
            .ok_or_else(|| ClientError::envelope(key, "missing: empty response body"))?;

        match body {
            Value::Object(mut map) => map
                .remove(key)
                .ok_or_else(|| ClientError::envelope(key, "missing from response body")),
            other => Err(ClientError::envelope(
                key,
                format!("expected a JSON object, got {other}"),
            )),
        }
    }
}

/// 一次被记录下来的HTTP调用
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

impl RecordedCall {
    pub fn new(method: Method, path: &str, body: Option<&Value>) -> Self {
        Self {
            method,
            path: path.to_string(),
            body: body.cloned(),
        }
    }
}
