use super::traits::HttpBackend;
use super::types::{ApiResponse, ClientError, RecordedCall};
use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::Method;
use serde_json::Value;

/// 记录每一次HTTP调用的后端包装器
///
/// 调用在转发给内部后端之前记录，因此失败的请求同样可见。
pub struct RecordingBackend<B> {
    inner: B,
    calls: Mutex<Vec<RecordedCall>>,
}

impl<B: HttpBackend> RecordingBackend<B> {
    pub fn new(inner: B) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn inner(&self) -> &B {
        &self.inner
    }

    /// 获取所有已记录的调用（按发生顺序）
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    pub fn last_call(&self) -> Option<RecordedCall> {
        self.calls.lock().last().cloned()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }

    /// 断言最近一次调用的方法和路径
    pub fn assert_called(&self, method: Method, path: &str) {
        let last = self.last_call();
        match last {
            Some(call) => {
                assert_eq!(call.method, method, "unexpected method for {}", call.path);
                assert_eq!(call.path, path);
            }
            None => panic!("expected {} {} but no call was made", method, path),
        }
    }
}

#[async_trait]
impl<B: HttpBackend> HttpBackend for RecordingBackend<B> {
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<ApiResponse, ClientError> {
        self.calls
            .lock()
            .push(RecordedCall::new(method.clone(), path, body));
        self.inner.request(method, path, body).await
    }
}
