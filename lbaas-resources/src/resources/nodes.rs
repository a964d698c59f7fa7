use super::base::{AsResourceId, Manager, Resource, ResourceId, Result};
use super::traits::ManagerWithFind;
use super::types::{NodeCondition, NodeSpec, NodeType};
use async_trait::async_trait;
use lbaas_core::HttpBackend;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;
use std::sync::Arc;

/// 服务端返回的节点属性
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeInfo {
    pub id: ResourceId,
    pub address: String,
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<NodeCondition>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<NodeType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<u32>,
    /// 服务端观测到的状态，例如 ONLINE / OFFLINE
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// 注册在负载均衡器上的后端节点
#[derive(Debug, Clone)]
pub struct Node {
    info: NodeInfo,
    manager: NodeManager,
}

impl Node {
    pub(crate) fn new(manager: NodeManager, info: NodeInfo) -> Self {
        Self { info, manager }
    }

    pub fn address(&self) -> &str {
        &self.info.address
    }

    pub fn port(&self) -> u16 {
        self.info.port
    }

    pub fn condition(&self) -> Option<NodeCondition> {
        self.info.condition
    }

    pub fn node_type(&self) -> Option<NodeType> {
        self.info.node_type
    }

    pub fn weight(&self) -> Option<u32> {
        self.info.weight
    }

    pub fn status(&self) -> Option<&str> {
        self.info.status.as_deref()
    }

    /// 所属负载均衡器的ID
    pub fn load_balancer_id(&self) -> ResourceId {
        self.manager.load_balancer_id()
    }

    /// 更新节点的状态、类型或权重
    pub async fn update(&self, changes: NodeUpdate) -> Result<()> {
        self.manager.update(self, changes).await
    }

    /// 从负载均衡器中移除这个节点
    pub async fn remove(&self) -> Result<()> {
        self.manager.remove(self).await
    }
}

impl Resource for Node {
    type Info = NodeInfo;
    const KIND: &'static str = "node";

    fn info(&self) -> &NodeInfo {
        &self.info
    }

    fn id(&self) -> ResourceId {
        self.info.id
    }
}

impl AsResourceId for Node {
    fn resource_id(&self) -> ResourceId {
        self.info.id
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.info.id == other.info.id
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Node: {}>", self.info.address)
    }
}

/// 节点更新内容，未设置的字段不会发送
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeUpdate {
    pub condition: Option<NodeCondition>,
    pub node_type: Option<NodeType>,
    /// 取值应为 1 到 100
    pub weight: Option<u32>,
}

impl NodeUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn condition(mut self, condition: NodeCondition) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn node_type(mut self, node_type: NodeType) -> Self {
        self.node_type = Some(node_type);
        self
    }

    pub fn weight(mut self, weight: u32) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.condition.is_none() && self.node_type.is_none() && self.weight.is_none()
    }

    /// 转换为 `{"node": {...}}` 请求体，只包含已设置的字段
    pub fn to_json(&self) -> Value {
        let mut node = json!({});

        if let Some(condition) = self.condition {
            node["condition"] = condition.as_str().into();
        }
        if let Some(node_type) = self.node_type {
            node["type"] = node_type.as_str().into();
        }
        if let Some(weight) = self.weight {
            node["weight"] = weight.into();
        }

        json!({ "node": node })
    }
}

/// 某个负载均衡器下的节点管理器
#[derive(Debug, Clone)]
pub struct NodeManager {
    base: Manager,
    load_balancer_id: ResourceId,
}

impl NodeManager {
    pub fn new(api: Arc<dyn HttpBackend>, load_balancer: impl AsResourceId) -> Self {
        Self {
            base: Manager::new(api),
            load_balancer_id: load_balancer.resource_id(),
        }
    }

    pub fn load_balancer_id(&self) -> ResourceId {
        self.load_balancer_id
    }

    /// `/loadbalancers/{lb_id}/nodes`
    pub fn collection_path(&self) -> String {
        format!("/loadbalancers/{}/nodes", self.load_balancer_id)
    }

    pub fn node_path(&self, node: impl AsResourceId) -> String {
        format!("{}/{}", self.collection_path(), node.resource_id())
    }

    fn wrap(&self, info: NodeInfo) -> Node {
        Node::new(self.clone(), info)
    }

    /// 获取负载均衡器上注册的所有节点
    pub async fn list(&self) -> Result<Vec<Node>> {
        let infos: Vec<NodeInfo> = self.base.list(&self.collection_path(), "nodes").await?;
        Ok(infos.into_iter().map(|info| self.wrap(info)).collect())
    }

    pub async fn get(&self, node: impl AsResourceId) -> Result<Node> {
        let info = self.base.get(&self.node_path(node), "node").await?;
        Ok(self.wrap(info))
    }

    /// 添加节点
    ///
    /// 服务端总是在 `nodes` 下返回列表，所以即使只添加一个节点结果也是列表。
    pub async fn add(&self, node: NodeSpec) -> Result<Vec<Node>> {
        let body = json!({ "nodes": serde_json::to_value(&node)? });
        let infos: Vec<NodeInfo> = self
            .base
            .create_many(&self.collection_path(), &body, "nodes")
            .await?;

        tracing::info!(
            "Added {} node(s) to load balancer {}",
            infos.len(),
            self.load_balancer_id
        );
        Ok(infos.into_iter().map(|info| self.wrap(info)).collect())
    }

    /// 更新节点；没有任何字段时不发请求
    pub async fn update(&self, node: impl AsResourceId, changes: NodeUpdate) -> Result<()> {
        let path = self.node_path(node);
        if changes.is_empty() {
            tracing::debug!("Skipping update of {}: nothing to change", path);
            return Ok(());
        }

        self.base.update(&path, &changes.to_json()).await
    }

    pub async fn remove(&self, node: impl AsResourceId) -> Result<()> {
        let path = self.node_path(node);
        self.base.delete(&path).await?;
        tracing::info!("Removed node {}", path);
        Ok(())
    }
}

#[async_trait]
impl ManagerWithFind for NodeManager {
    type Item = Node;

    async fn list_all(&self) -> Result<Vec<Node>> {
        self.list().await
    }
}
