use super::types::{ApiResponse, ClientError};
use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;

/// 负载均衡服务的HTTP后端接口
///
/// 资源管理器只通过这个trait访问远端服务，认证头、重试和连接复用都由实现负责。
/// 实现必须把非2xx响应报告为 `ClientError::UpstreamError`。
#[async_trait]
pub trait HttpBackend: Send + Sync {
    /// 发送请求，`path` 相对于服务根路径（例如 `/loadbalancers/71`）
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<ApiResponse, ClientError>;

    async fn get(&self, path: &str) -> Result<ApiResponse, ClientError> {
        self.request(Method::GET, path, None).await
    }

    async fn post(&self, path: &str, body: &Value) -> Result<ApiResponse, ClientError> {
        self.request(Method::POST, path, Some(body)).await
    }

    async fn put(&self, path: &str, body: &Value) -> Result<ApiResponse, ClientError> {
        self.request(Method::PUT, path, Some(body)).await
    }

    async fn delete(&self, path: &str) -> Result<ApiResponse, ClientError> {
        self.request(Method::DELETE, path, None).await
    }
}

#[async_trait]
impl<T: HttpBackend + ?Sized> HttpBackend for Arc<T> {
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<ApiResponse, ClientError> {
        (**self).request(method, path, body).await
    }
}
