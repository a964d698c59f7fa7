use super::base::{Resource, Result};
use async_trait::async_trait;
use lbaas_core::ClientError;
use serde_json::Value;

/// 支持按属性查找的资源管理器
///
/// 查找在客户端进行：先列出全部资源，再按线上字段名逐项比较。
#[async_trait]
pub trait ManagerWithFind: Send + Sync {
    type Item: Resource + Send;

    /// 列出管理器作用域内的全部资源
    async fn list_all(&self) -> Result<Vec<Self::Item>>;

    /// 返回所有属性都匹配的资源
    async fn findall(&self, criteria: &[(&str, Value)]) -> Result<Vec<Self::Item>> {
        let items = self.list_all().await?;
        Ok(items
            .into_iter()
            .filter(|item| matches_criteria(item, criteria))
            .collect())
    }

    /// 返回唯一匹配的资源
    ///
    /// 没有匹配时返回 `NotFound`，匹配多个时返回 `NoUniqueMatch`。
    async fn find(&self, criteria: &[(&str, Value)]) -> Result<Self::Item> {
        let mut matches = self.findall(criteria).await?;
        match matches.len() {
            0 => Err(ClientError::NotFound(format!(
                "No {} matching {}",
                <Self::Item as Resource>::KIND,
                describe_criteria(criteria)
            ))),
            1 => Ok(matches.remove(0)),
            n => Err(ClientError::NoUniqueMatch(format!(
                "{} {}s matching {}",
                n,
                <Self::Item as Resource>::KIND,
                describe_criteria(criteria)
            ))),
        }
    }
}

pub fn matches_criteria<R: Resource + ?Sized>(resource: &R, criteria: &[(&str, Value)]) -> bool {
    criteria
        .iter()
        .all(|(name, expected)| resource.attribute(name).as_ref() == Some(expected))
}

fn describe_criteria(criteria: &[(&str, Value)]) -> String {
    criteria
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join(", ")
}
