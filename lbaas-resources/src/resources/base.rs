use lbaas_core::{ApiResponse, ClientError, HttpBackend};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// 服务端分配的资源ID
pub type ResourceId = u64;

pub type Result<T> = std::result::Result<T, ClientError>;

/// 可以解析出资源ID的值：资源实例本身或原始ID
pub trait AsResourceId {
    fn resource_id(&self) -> ResourceId;
}

impl AsResourceId for ResourceId {
    fn resource_id(&self) -> ResourceId {
        *self
    }
}

impl<T: AsResourceId + ?Sized> AsResourceId for &T {
    fn resource_id(&self) -> ResourceId {
        (**self).resource_id()
    }
}

/// 取得资源ID，资源实例和原始ID可以互换使用
pub fn getid(obj: &impl AsResourceId) -> ResourceId {
    obj.resource_id()
}

/// 服务端返回的资源
///
/// `Info` 是资源属性的类型化快照，只有重新获取才会更新。
pub trait Resource {
    type Info: Serialize;

    /// 资源类型名称，用于日志和错误信息
    const KIND: &'static str;

    fn info(&self) -> &Self::Info;

    fn id(&self) -> ResourceId;

    /// 按线上字段名（camelCase）读取属性，包括未建模的扩展字段
    fn attribute(&self, name: &str) -> Option<Value> {
        match serde_json::to_value(self.info()) {
            Ok(Value::Object(mut map)) => map.remove(name),
            _ => None,
        }
    }
}

/// 所有资源管理器共用的请求原语
///
/// 负责发起HTTP调用并拆开响应信封，资源的构造留给具体的管理器。
#[derive(Clone)]
pub struct Manager {
    api: Arc<dyn HttpBackend>,
}

impl fmt::Debug for Manager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Manager").finish_non_exhaustive()
    }
}

impl Manager {
    pub fn new(api: Arc<dyn HttpBackend>) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &Arc<dyn HttpBackend> {
        &self.api
    }

    /// GET 并取出单个资源
    pub async fn get<T: DeserializeOwned>(&self, url: &str, response_key: &str) -> Result<T> {
        let response = self.api.get(url).await?;
        decode(response.take_envelope(response_key)?, response_key)
    }

    /// GET 并取出资源列表
    pub async fn list<T: DeserializeOwned>(&self, url: &str, response_key: &str) -> Result<Vec<T>> {
        let response = self.api.get(url).await?;
        match response.take_envelope(response_key)? {
            items @ Value::Array(_) => decode(items, response_key),
            other => Err(ClientError::envelope(
                response_key,
                format!("expected a list, got {other}"),
            )),
        }
    }

    /// POST 创建单个资源，响应必须带有信封
    pub async fn create<T: DeserializeOwned>(
        &self,
        url: &str,
        body: &Value,
        response_key: &str,
    ) -> Result<T> {
        let response = self.api.post(url, body).await?;
        decode(response.take_envelope(response_key)?, response_key)
    }

    /// POST 创建单个资源，响应可以带信封也可以直接是资源对象
    pub async fn create_unwrapped<T: DeserializeOwned>(
        &self,
        url: &str,
        body: &Value,
        response_key: &str,
    ) -> Result<T> {
        let response = self.api.post(url, body).await?;
        let value = unwrap_optional_envelope(response, response_key)?;
        decode(value, response_key)
    }

    /// POST 批量创建，结果总是列表
    ///
    /// 服务端在信封下返回单个对象时也包装成只有一个元素的列表。
    pub async fn create_many<T: DeserializeOwned>(
        &self,
        url: &str,
        body: &Value,
        response_key: &str,
    ) -> Result<Vec<T>> {
        let response = self.api.post(url, body).await?;
        match response.take_envelope(response_key)? {
            items @ Value::Array(_) => decode(items, response_key),
            single @ Value::Object(_) => Ok(vec![decode(single, response_key)?]),
            other => Err(ClientError::envelope(
                response_key,
                format!("expected a list or an object, got {other}"),
            )),
        }
    }

    /// PUT 更新，不返回更新后的资源，需要重新获取才能看到服务端的变化
    pub async fn update(&self, url: &str, body: &Value) -> Result<()> {
        self.api.put(url, body).await?;
        Ok(())
    }

    pub async fn delete(&self, url: &str) -> Result<()> {
        self.api.delete(url).await?;
        Ok(())
    }
}

fn unwrap_optional_envelope(response: ApiResponse, response_key: &str) -> Result<Value> {
    match response.body {
        Some(Value::Object(mut map)) => match map.remove(response_key) {
            Some(inner) => Ok(inner),
            None => Ok(Value::Object(map)),
        },
        Some(other) => Err(ClientError::envelope(
            response_key,
            format!("expected a JSON object, got {other}"),
        )),
        None => Err(ClientError::envelope(
            response_key,
            "missing: empty response body",
        )),
    }
}

fn decode<T: DeserializeOwned>(value: Value, response_key: &str) -> Result<T> {
    serde_json::from_value(value)
        .map_err(|e| ClientError::envelope(response_key, format!("malformed: {e}")))
}
