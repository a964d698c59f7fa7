use super::base::{AsResourceId, Manager, Resource, ResourceId, Result};
use super::nodes::{NodeInfo, NodeManager};
use super::traits::ManagerWithFind;
use super::types::{
    Algorithm, ConnectionLogging, ConnectionThrottle, HealthMonitor, MetadataItem, NetworkItem,
    NodeSpec, SessionPersistence, Timestamp, VirtualIpSpec,
};
use super::virtual_ips::{VirtualIpInfo, VirtualIpManager};
use async_trait::async_trait;
use lbaas_core::HttpBackend;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// 服务端返回的负载均衡器属性
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancerInfo {
    pub id: ResourceId,
    pub name: String,
    pub protocol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<Algorithm>,
    /// ACTIVE / BUILD / PENDING_UPDATE / ERROR 等，由服务端维护
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// 按 "public" / "private" 分组的地址
    #[serde(default)]
    pub addresses: HashMap<String, Vec<String>>,
    #[serde(default)]
    pub nodes: Vec<NodeInfo>,
    #[serde(default)]
    pub virtual_ips: Vec<VirtualIpInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<Timestamp>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// 负载均衡器
///
/// 构造时创建绑定到自身ID的节点和虚拟IP管理器，子资源的路径都以该ID为前缀。
#[derive(Debug, Clone)]
pub struct LoadBalancer {
    info: LoadBalancerInfo,
    manager: LoadBalancerManager,
    pub nodes: NodeManager,
    pub virtual_ips: VirtualIpManager,
}

impl LoadBalancer {
    pub(crate) fn new(manager: LoadBalancerManager, info: LoadBalancerInfo) -> Self {
        let nodes = manager.nodes(info.id);
        let virtual_ips = manager.virtual_ips(info.id);
        Self {
            info,
            manager,
            nodes,
            virtual_ips,
        }
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn protocol(&self) -> &str {
        &self.info.protocol
    }

    pub fn port(&self) -> Option<u16> {
        self.info.port
    }

    pub fn algorithm(&self) -> Option<Algorithm> {
        self.info.algorithm
    }

    pub fn status(&self) -> Option<&str> {
        self.info.status.as_deref()
    }

    pub fn addresses(&self) -> &HashMap<String, Vec<String>> {
        &self.info.addresses
    }

    /// 第一个公网地址，没有时返回空字符串
    pub fn public_ip(&self) -> &str {
        self.first_address("public")
    }

    /// 第一个私有地址，没有时返回空字符串
    pub fn private_ip(&self) -> &str {
        self.first_address("private")
    }

    fn first_address(&self, kind: &str) -> &str {
        self.info
            .addresses
            .get(kind)
            .and_then(|addresses| addresses.first())
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// 更新名称、算法、协议或端口
    pub async fn update(&self, changes: LoadBalancerUpdate) -> Result<()> {
        self.manager.update(self, changes).await
    }

    pub async fn delete(&self) -> Result<()> {
        self.manager.delete(self).await
    }

    /// 重新获取最新状态
    ///
    /// 本地快照不会自动更新，更新或删除之后需要调用它才能看到服务端的变化。
    pub async fn refresh(&mut self) -> Result<()> {
        let fresh = self.manager.get(self.info.id).await?;
        *self = fresh;
        Ok(())
    }
}

impl Resource for LoadBalancer {
    type Info = LoadBalancerInfo;
    const KIND: &'static str = "load balancer";

    fn info(&self) -> &LoadBalancerInfo {
        &self.info
    }

    fn id(&self) -> ResourceId {
        self.info.id
    }
}

impl AsResourceId for LoadBalancer {
    fn resource_id(&self) -> ResourceId {
        self.info.id
    }
}

impl PartialEq for LoadBalancer {
    fn eq(&self, other: &Self) -> bool {
        self.info.id == other.info.id
    }
}

impl fmt::Display for LoadBalancer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<LoadBalancer: {}>", self.info.name)
    }
}

/// 负载均衡器更新内容，未设置的字段不会发送
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadBalancerUpdate {
    pub name: Option<String>,
    pub algorithm: Option<Algorithm>,
    pub protocol: Option<String>,
    pub port: Option<u16>,
}

impl LoadBalancerUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = Some(algorithm);
        self
    }

    pub fn protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = Some(protocol.into());
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.algorithm.is_none()
            && self.protocol.is_none()
            && self.port.is_none()
    }

    /// 转换为 `{"loadBalancer": {...}}` 请求体
    pub fn to_json(&self) -> Value {
        let mut load_balancer = json!({});

        if let Some(name) = &self.name {
            load_balancer["name"] = name.as_str().into();
        }
        if let Some(algorithm) = self.algorithm {
            load_balancer["algorithm"] = algorithm.as_str().into();
        }
        if let Some(protocol) = &self.protocol {
            load_balancer["protocol"] = protocol.as_str().into();
        }
        if let Some(port) = self.port {
            load_balancer["port"] = port.into();
        }

        json!({ "loadBalancer": load_balancer })
    }
}

/// 创建负载均衡器的请求
///
/// `name`、`protocol`、`nodes`、`virtual_ips` 是必填项，放在 `loadBalancer` 下；
/// 其余字段只在设置时发送，作为与 `loadBalancer` 并列的顶层字段。
#[derive(Debug, Clone, PartialEq)]
pub struct CreateLoadBalancer {
    pub name: String,
    pub protocol: String,
    pub nodes: Vec<NodeSpec>,
    pub virtual_ips: Vec<VirtualIpSpec>,
    pub access_list: Option<Vec<NetworkItem>>,
    pub algorithm: Option<Algorithm>,
    pub connection_logging: Option<ConnectionLogging>,
    pub connection_throttle: Option<ConnectionThrottle>,
    pub health_monitor: Option<HealthMonitor>,
    pub metadata: Option<Vec<MetadataItem>>,
    pub port: Option<u16>,
    pub session_persistence: Option<SessionPersistence>,
}

impl CreateLoadBalancer {
    pub fn new(
        name: impl Into<String>,
        protocol: impl Into<String>,
        nodes: Vec<NodeSpec>,
        virtual_ips: Vec<VirtualIpSpec>,
    ) -> Self {
        Self {
            name: name.into(),
            protocol: protocol.into(),
            nodes,
            virtual_ips,
            access_list: None,
            algorithm: None,
            connection_logging: None,
            connection_throttle: None,
            health_monitor: None,
            metadata: None,
            port: None,
            session_persistence: None,
        }
    }

    pub fn with_access_list(mut self, access_list: Vec<NetworkItem>) -> Self {
        self.access_list = Some(access_list);
        self
    }

    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = Some(algorithm);
        self
    }

    pub fn with_connection_logging(mut self, enabled: bool) -> Self {
        self.connection_logging = Some(ConnectionLogging { enabled });
        self
    }

    pub fn with_connection_throttle(mut self, throttle: ConnectionThrottle) -> Self {
        self.connection_throttle = Some(throttle);
        self
    }

    pub fn with_health_monitor(mut self, monitor: HealthMonitor) -> Self {
        self.health_monitor = Some(monitor);
        self
    }

    pub fn with_metadata(mut self, metadata: Vec<MetadataItem>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_session_persistence(mut self, persistence: SessionPersistence) -> Self {
        self.session_persistence = Some(persistence);
        self
    }

    /// 转换为请求体：`{"loadBalancer": {必填项}, 可选字段...}`
    pub fn to_json(&self) -> Result<Value> {
        let mut body = json!({
            "loadBalancer": {
                "name": self.name,
                "nodes": serde_json::to_value(&self.nodes)?,
                "protocol": self.protocol,
                "virtualIps": serde_json::to_value(&self.virtual_ips)?,
            }
        });

        if let Some(access_list) = &self.access_list {
            body["accessList"] = serde_json::to_value(access_list)?;
        }
        if let Some(algorithm) = self.algorithm {
            body["algorithm"] = algorithm.as_str().into();
        }
        if let Some(connection_logging) = &self.connection_logging {
            body["connectionLogging"] = serde_json::to_value(connection_logging)?;
        }
        if let Some(connection_throttle) = &self.connection_throttle {
            body["connectionThrottle"] = serde_json::to_value(connection_throttle)?;
        }
        if let Some(health_monitor) = &self.health_monitor {
            body["healthMonitor"] = serde_json::to_value(health_monitor)?;
        }
        if let Some(metadata) = &self.metadata {
            body["metadata"] = serde_json::to_value(metadata)?;
        }
        if let Some(port) = self.port {
            body["port"] = port.into();
        }
        if let Some(session_persistence) = &self.session_persistence {
            body["sessionPersistence"] = serde_json::to_value(session_persistence)?;
        }

        Ok(body)
    }
}

/// 负载均衡器管理器
#[derive(Debug, Clone)]
pub struct LoadBalancerManager {
    base: Manager,
}

impl LoadBalancerManager {
    pub fn new(api: Arc<dyn HttpBackend>) -> Self {
        Self {
            base: Manager::new(api),
        }
    }

    pub fn api(&self) -> &Arc<dyn HttpBackend> {
        self.base.api()
    }

    pub fn load_balancer_path(&self, load_balancer: impl AsResourceId) -> String {
        format!("/loadbalancers/{}", load_balancer.resource_id())
    }

    /// 某个负载均衡器的节点管理器，不需要先获取负载均衡器
    pub fn nodes(&self, load_balancer: impl AsResourceId) -> NodeManager {
        NodeManager::new(self.api().clone(), load_balancer)
    }

    /// 某个负载均衡器的虚拟IP管理器
    pub fn virtual_ips(&self, load_balancer: impl AsResourceId) -> VirtualIpManager {
        VirtualIpManager::new(self.api().clone(), load_balancer)
    }

    fn wrap(&self, info: LoadBalancerInfo) -> LoadBalancer {
        LoadBalancer::new(self.clone(), info)
    }

    pub async fn list(&self) -> Result<Vec<LoadBalancer>> {
        let infos: Vec<LoadBalancerInfo> = self.base.list("/loadbalancers", "loadBalancers").await?;
        Ok(infos.into_iter().map(|info| self.wrap(info)).collect())
    }

    pub async fn get(&self, load_balancer: impl AsResourceId) -> Result<LoadBalancer> {
        let info = self
            .base
            .get(&self.load_balancer_path(load_balancer), "loadBalancer")
            .await?;
        Ok(self.wrap(info))
    }

    /// 创建负载均衡器
    ///
    /// 服务端异步构建，返回的负载均衡器通常处于 BUILD 状态。
    pub async fn create(&self, request: CreateLoadBalancer) -> Result<LoadBalancer> {
        let body = request.to_json()?;
        let info: LoadBalancerInfo = self
            .base
            .create("/loadbalancers", &body, "loadBalancer")
            .await?;

        tracing::info!("Created load balancer {} ({})", info.id, info.name);
        Ok(self.wrap(info))
    }

    /// 更新负载均衡器；没有任何字段时不发请求
    pub async fn update(
        &self,
        load_balancer: impl AsResourceId,
        changes: LoadBalancerUpdate,
    ) -> Result<()> {
        let path = self.load_balancer_path(load_balancer);
        if changes.is_empty() {
            tracing::debug!("Skipping update of {}: nothing to change", path);
            return Ok(());
        }

        self.base.update(&path, &changes.to_json()).await
    }

    pub async fn delete(&self, load_balancer: impl AsResourceId) -> Result<()> {
        let path = self.load_balancer_path(load_balancer);
        self.base.delete(&path).await?;
        tracing::info!("Deleted load balancer {}", path);
        Ok(())
    }
}

#[async_trait]
impl ManagerWithFind for LoadBalancerManager {
    type Item = LoadBalancer;

    async fn list_all(&self) -> Result<Vec<LoadBalancer>> {
        self.list().await
    }
}
